//! Timeline tuning knobs

use parley_types::MessageId;
use serde::Deserialize;
use std::time::Duration;

fn default_page_size() -> usize {
    20
}

fn default_reply_delay_ms() -> u64 {
    2_000
}

fn default_reply_cooldown_ms() -> u64 {
    3_000
}

fn default_load_latency_ms() -> u64 {
    1_000
}

fn default_seed_newest_id() -> MessageId {
    100
}

fn default_scroll_restore_offset() -> f64 {
    50.0
}

fn default_event_capacity() -> usize {
    64
}

/// Timeline configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimelineConfig {
    /// Messages per backfill page (and in the seed page)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Time the peer spends "typing" before its reply lands
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,

    /// Quiet period after a reply during which new messages get no reply
    #[serde(default = "default_reply_cooldown_ms")]
    pub reply_cooldown_ms: u64,

    /// Simulated fetch latency for older pages
    #[serde(default = "default_load_latency_ms")]
    pub load_latency_ms: u64,

    /// Newest id of the demo page shown when nothing is stored; 0 disables it
    #[serde(default = "default_seed_newest_id")]
    pub seed_newest_id: MessageId,

    /// Scroll offset restored after a page is prepended
    #[serde(default = "default_scroll_restore_offset")]
    pub scroll_restore_offset: f64,

    /// Buffered events per subscriber before the slowest one lags
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            reply_delay_ms: default_reply_delay_ms(),
            reply_cooldown_ms: default_reply_cooldown_ms(),
            load_latency_ms: default_load_latency_ms(),
            seed_newest_id: default_seed_newest_id(),
            scroll_restore_offset: default_scroll_restore_offset(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl TimelineConfig {
    #[must_use]
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    #[must_use]
    pub fn reply_cooldown(&self) -> Duration {
        Duration::from_millis(self.reply_cooldown_ms)
    }

    #[must_use]
    pub fn load_latency(&self) -> Duration {
        Duration::from_millis(self.load_latency_ms)
    }

    /// Start from an empty log instead of the demo page
    #[must_use]
    pub fn without_seed(mut self) -> Self {
        self.seed_newest_id = 0;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TimelineConfig::default();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.reply_delay(), Duration::from_secs(2));
        assert_eq!(config.reply_cooldown(), Duration::from_secs(3));
        assert_eq!(config.load_latency(), Duration::from_secs(1));
        assert_eq!(config.seed_newest_id, 100);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TimelineConfig = toml::from_str(
            r#"
            page_size = 10
            reply_cooldown_ms = 500
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.page_size, 10);
        assert_eq!(config.reply_cooldown(), Duration::from_millis(500));
        assert_eq!(config.reply_delay(), Duration::from_secs(2));
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn test_without_seed() {
        assert_eq!(TimelineConfig::default().without_seed().seed_newest_id, 0);
    }
}
