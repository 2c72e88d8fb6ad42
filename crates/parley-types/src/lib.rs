//! Parley Types - Core types for the Parley chat client
//!
//! This module defines the data model shared by storage, session handling and
//! the message timeline: messages and drafts, users and rooms, and the events a
//! timeline publishes to its subscribers.

pub mod events;
pub mod message;
pub mod room;
pub mod user;

pub use events::TimelineEvent;
pub use message::{Message, MessageDraft, MessageId, Sender};
pub use room::{ChatRoom, RoomId};
pub use user::{User, UserId};
