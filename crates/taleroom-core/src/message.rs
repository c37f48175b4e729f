//! Transcript messages and their wire shape.

use serde::{Deserialize, Serialize};

/// The author class of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The automated narrator.
    Narrator,
    /// A human participant.
    Participant,
}

/// A single transcript entry. Serializes as `{ "role": ..., "content": ... }`,
/// which is also the payload pushed over participant connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who authored the message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl Message {
    /// Create a narrator-authored message.
    pub fn narrator(content: impl Into<String>) -> Self {
        Self {
            role: Role::Narrator,
            content: content.into(),
        }
    }

    /// Create a participant-authored message.
    pub fn participant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Participant,
            content: content.into(),
        }
    }

    /// Create a participant message attributed to `display_name`, in the
    /// `"<name>: <text>"` form the narrator sees.
    #[must_use]
    pub fn spoken_by(display_name: &str, text: &str) -> Self {
        Self::participant(format!("{display_name}: {text}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_to_role_content_shape() {
        let json = serde_json::to_value(Message::narrator("The gate creaks.")).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "role": "narrator", "content": "The gate creaks." })
        );
    }

    #[test]
    fn test_message_deserializes_participant_role() {
        let message: Message =
            serde_json::from_str(r#"{"role":"participant","content":"hi"}"#).unwrap();

        assert_eq!(message, Message::participant("hi"));
    }

    #[test]
    fn test_spoken_by_prefixes_display_name() {
        let message = Message::spoken_by("Ava", "I open the door");

        assert_eq!(message.role, Role::Participant);
        assert_eq!(message.content, "Ava: I open the door");
    }
}
