use parley_types::Message;
use rand::seq::SliceRandom;

/// Produces the simulated peer's reply text
pub trait ReplyGenerator: Send + Sync {
    fn generate(&self, prompt: &Message) -> String;
}

/// Picks a reply at random from a fixed list, ignoring the prompt
#[derive(Debug, Clone)]
pub struct CannedReplies {
    replies: Vec<String>,
}

impl CannedReplies {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
        }
    }

    pub fn replies(&self) -> &[String] {
        &self.replies
    }
}

impl Default for CannedReplies {
    fn default() -> Self {
        Self::new([
            "That's interesting!",
            "Could you tell me more?",
            "I'm thinking about that...",
            "Here's what I found.",
            "Thanks for sharing!",
        ])
    }
}

impl ReplyGenerator for CannedReplies {
    fn generate(&self, _prompt: &Message) -> String {
        self.replies
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_types::MessageDraft;

    #[test]
    fn test_reply_comes_from_list() {
        let replies = CannedReplies::default();
        let prompt = Message::from_draft(1, MessageDraft::text("hi"), Utc::now());
        for _ in 0..20 {
            let reply = replies.generate(&prompt);
            assert!(replies.replies().contains(&reply));
        }
    }

    #[test]
    fn test_empty_list_gives_empty_reply() {
        let replies = CannedReplies::new(Vec::<String>::new());
        let prompt = Message::from_draft(1, MessageDraft::text("hi"), Utc::now());
        assert_eq!(replies.generate(&prompt), "");
    }
}
