//! Parley Session - identity, room list and notifications
//!
//! These are the collaborators around the message timeline: the phone/OTP
//! login that resolves a [`parley_types::UserId`], the per-user room registry,
//! and the toast-style [`Notifier`]. A successful login yields a
//! [`SessionContext`], the only way to open a timeline.

pub mod context;
pub mod error;
pub mod identity;
pub mod notifier;
pub mod rooms;

pub use context::SessionContext;
pub use error::{Result, SessionError};
pub use identity::{AuthService, AuthStep};
pub use notifier::{Notification, Notifier, RecordingNotifier, TracingNotifier};
pub use rooms::RoomRegistry;
