use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message ID type
///
/// Ids are unique within one timeline and order messages by send time,
/// independent of where they sit in storage.
pub type MessageId = u64;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The signed-in user
    User,
    /// The simulated counterpart
    Peer,
}

/// A message in a room timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    #[serde(default)]
    pub text: String,
    /// Image payload as a `data:` URI
    #[serde(default)]
    pub image: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Build a user message from an accepted draft
    pub fn from_draft(id: MessageId, draft: MessageDraft, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            sender: Sender::User,
            text: draft.text,
            image: draft.image,
            timestamp,
        }
    }

    /// Build a text-only message from the peer
    pub fn peer(id: MessageId, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            sender: Sender::Peer,
            text: text.into(),
            image: None,
            timestamp,
        }
    }

    pub fn is_from_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Unsent user input: text and an optional image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDraft {
    pub text: String,
    pub image: Option<String>,
}

impl MessageDraft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, data_uri: impl Into<String>) -> Self {
        self.image = Some(data_uri.into());
        self
    }

    /// A draft is blank when its text is whitespace-only and it has no image.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.image.as_deref().map_or(true, str::is_empty)
    }

    /// Trim surrounding whitespace and drop an empty image payload
    pub fn normalized(self) -> Self {
        Self {
            text: self.text.trim().to_string(),
            image: self.image.filter(|uri| !uri.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_drafts() {
        assert!(MessageDraft::default().is_blank());
        assert!(MessageDraft::text("   \n\t").is_blank());
        assert!(MessageDraft::text("").with_image("").is_blank());
        assert!(!MessageDraft::text("hi").is_blank());
        assert!(!MessageDraft::text("").with_image("data:image/png;base64,AAAA").is_blank());
    }

    #[test]
    fn test_normalized_trims_text() {
        let draft = MessageDraft::text("  hello  ").with_image("").normalized();
        assert_eq!(draft.text, "hello");
        assert_eq!(draft.image, None);
    }

    #[test]
    fn test_message_json_shape() {
        let timestamp = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .map(|dt| dt.with_timezone(&Utc))
            .expect("valid timestamp");
        let message = Message::peer(7, "Thanks for sharing!", timestamp);

        let value = serde_json::to_value(&message).expect("serializable");
        assert_eq!(value["id"], 7);
        assert_eq!(value["sender"], "peer");
        assert_eq!(value["text"], "Thanks for sharing!");
        assert!(value["image"].is_null());
        assert_eq!(value["timestamp"], "2024-05-01T10:00:00Z");
    }

    #[test]
    fn test_message_missing_optional_fields() {
        let json = r#"{"id":3,"sender":"user","timestamp":"2024-05-01T10:00:00Z"}"#;
        let message: Message = serde_json::from_str(json).expect("deserializable");
        assert_eq!(message.id, 3);
        assert!(message.is_from_user());
        assert!(message.text.is_empty());
        assert!(message.image.is_none());
    }
}
