//! Sources of older messages for backward pagination

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use parley_persistence::StorageError;
use parley_types::{Message, MessageId, Sender};

/// Backward range query over a room's history
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Up to `count` messages with ids strictly below `cursor`, ascending by id
    async fn older_than(
        &self,
        cursor: MessageId,
        count: usize,
    ) -> Result<Vec<Message>, StorageError>;
}

/// Generated demo history
///
/// Message `#n` sits `n + 1` minutes in the past and senders alternate,
/// starting with the peer just below the cursor. Ids stop at 1, so paging
/// always terminates.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticHistory;

impl SyntheticHistory {
    pub fn page(cursor: MessageId, count: usize, now: DateTime<Utc>) -> Vec<Message> {
        let count = MessageId::try_from(count).unwrap_or(MessageId::MAX);
        let lowest = cursor.saturating_sub(count).max(1);

        (lowest..cursor)
            .map(|id| {
                let depth = cursor - 1 - id;
                let sender = if depth % 2 == 0 {
                    Sender::Peer
                } else {
                    Sender::User
                };
                let age = i64::try_from(id + 1)
                    .ok()
                    .and_then(TimeDelta::try_minutes)
                    .unwrap_or_else(TimeDelta::zero);

                Message {
                    id,
                    sender,
                    text: format!("This is older message #{}", id),
                    image: None,
                    timestamp: now - age,
                }
            })
            .collect()
    }
}

#[async_trait]
impl HistorySource for SyntheticHistory {
    async fn older_than(
        &self,
        cursor: MessageId,
        count: usize,
    ) -> Result<Vec<Message>, StorageError> {
        Ok(Self::page(cursor, count, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_below_cursor() {
        let page = SyntheticHistory::page(81, 20, Utc::now());
        let ids: Vec<_> = page.iter().map(|m| m.id).collect();
        assert_eq!(ids, (61..=80).collect::<Vec<_>>());
        assert_eq!(page[19].text, "This is older message #80");
        assert_eq!(page[19].sender, Sender::Peer);
        assert_eq!(page[18].sender, Sender::User);
    }

    #[test]
    fn test_page_is_older_going_down() {
        let now = Utc::now();
        let page = SyntheticHistory::page(11, 5, now);
        assert!(page.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(page[4].timestamp, now - TimeDelta::minutes(11));
    }

    #[test]
    fn test_page_stops_at_first_id() {
        let page = SyntheticHistory::page(6, 20, Utc::now());
        let ids: Vec<_> = page.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);

        assert!(SyntheticHistory::page(1, 20, Utc::now()).is_empty());
        assert!(SyntheticHistory::page(0, 20, Utc::now()).is_empty());
    }
}
