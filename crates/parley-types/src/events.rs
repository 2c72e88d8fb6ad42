use crate::Message;
use serde::{Deserialize, Serialize};

/// Events published by a timeline after each state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimelineEvent {
    /// State was (re)loaded from storage or seeded
    Hydrated { count: usize },

    /// A message was added at the tail
    Appended(Message),

    /// An older page was added at the head
    Prepended {
        added: Vec<Message>,
        has_more: bool,
    },

    /// An older-page fetch started or finished
    LoadingOlder(bool),

    /// The peer started or stopped "typing"
    Typing(bool),

    /// Reply cooldown started or ended
    Throttled(bool),
}

impl TimelineEvent {
    /// Whether the event changed the message sequence
    pub fn mutates_messages(&self) -> bool {
        matches!(
            self,
            Self::Hydrated { .. } | Self::Appended(_) | Self::Prepended { .. }
        )
    }
}
