//! Parley Timeline - the per-room message timeline engine
//!
//! A [`Timeline`] owns the ordered message log for one (user, room) pair. It
//! appends user messages, backfills older pages, mirrors every change to the
//! durable store, and drives a throttled simulated reply through
//! [`ReplyScheduler`]. [`ScrollController`] turns viewport metrics into
//! pagination requests.
//!
//! All timers run on tokio's clock, so tests can pause and advance time
//! instead of sleeping.

pub mod config;
pub mod error;
pub mod history;
pub mod reply;
pub mod scheduler;
pub mod scroll;
pub mod timeline;

pub use config::TimelineConfig;
pub use error::{Result, TimelineError};
pub use history::{HistorySource, SyntheticHistory};
pub use reply::{CannedReplies, ReplyGenerator};
pub use scheduler::{DelayedTask, ReplyPhase, ReplyScheduler};
pub use scroll::{is_at_bottom, should_load_older, ScrollCommand, ScrollController, ScrollMetrics};
pub use timeline::{LoadOutcome, OlderPage, Timeline, TimelineBuilder};
