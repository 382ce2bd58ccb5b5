//! Conversation turns and their image attachments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(pub Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight characters, for log lines
    pub fn short(&self) -> String {
        self.0.to_string().chars().take(8).collect()
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Pixel dimensions of an attached image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Reference to an image attached to a turn
///
/// Raw image bytes never reach this crate; only the attachment id and, when
/// known, the dimensions recorded at attach time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<ImageDimensions>,
}

impl ImageRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some(ImageDimensions::new(width, height));
        self
    }
}

/// One user/assistant exchange in the transcript
///
/// `created_at` defines chronological order. The allocator never mutates a
/// turn; token memoization lives in [`crate::tokens::TurnTokenCache`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    #[serde(default)]
    pub id: TurnId,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_text: String,
    #[serde(default)]
    pub assistant_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageRef>,
}

impl ConversationTurn {
    /// Create a completed exchange stamped with the current time
    pub fn new(user_text: impl Into<String>, assistant_text: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            created_at: Utc::now(),
            user_text: user_text.into(),
            assistant_text: assistant_text.into(),
            images: Vec::new(),
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.images.push(image);
        self
    }

    /// Replace the user text; the caller drops any memoized estimate
    pub fn edit_user_text(&mut self, text: impl Into<String>) {
        self.user_text = text.into();
    }

    /// Replace the assistant text; the caller drops any memoized estimate
    pub fn edit_assistant_text(&mut self, text: impl Into<String>) {
        self.assistant_text = text.into();
    }

    /// Character lengths used as the memoization key
    pub fn text_lengths(&self) -> (usize, usize) {
        (
            self.user_text.chars().count(),
            self.assistant_text.chars().count(),
        )
    }

    /// Whether the turn carries no text and no images
    pub fn is_empty(&self) -> bool {
        self.user_text.is_empty() && self.assistant_text.is_empty() && self.images.is_empty()
    }
}

/// Sort turns oldest first, breaking timestamp ties by id for determinism
pub fn sort_chronologically(turns: &mut [ConversationTurn]) {
    turns.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_text_lengths_count_chars() {
        let turn = ConversationTurn::new("héllo", "wörld!");
        assert_eq!(turn.text_lengths(), (5, 6));
    }

    #[test]
    fn test_sort_chronologically() {
        let now = Utc::now();
        let newer = ConversationTurn::new("b", "").with_created_at(now);
        let older = ConversationTurn::new("a", "").with_created_at(now - Duration::seconds(5));

        let mut turns = vec![newer.clone(), older.clone()];
        sort_chronologically(&mut turns);

        assert_eq!(turns[0].id, older.id);
        assert_eq!(turns[1].id, newer.id);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let turn: ConversationTurn =
            serde_json::from_str(r#"{"user_text": "hi", "assistant_text": "hello"}"#).unwrap();
        assert_eq!(turn.user_text, "hi");
        assert!(turn.images.is_empty());
    }
}
