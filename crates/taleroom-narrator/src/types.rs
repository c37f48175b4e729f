//! Chat completions request and response types.

use serde::{Deserialize, Serialize};
use taleroom_core::message::{Message, Role};

use crate::preamble::SYSTEM_PREAMBLE;

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatRequest<'a> {
    /// Builds a request with the preamble first, then the transcript with
    /// narrator turns as `assistant` and participant turns as `user`.
    pub fn from_transcript(model: &'a str, transcript: &'a [Message]) -> Self {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(ChatMessage {
            role: "system",
            content: SYSTEM_PREAMBLE,
        });
        messages.extend(transcript.iter().map(|m| ChatMessage {
            role: match m.role {
                Role::Narrator => "assistant",
                Role::Participant => "user",
            },
            content: &m.content,
        }));
        Self { model, messages }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_puts_preamble_first_and_maps_roles() {
        // Arrange
        let transcript = vec![
            Message::narrator("You stand at the gate."),
            Message::participant("Ava: I knock."),
        ];

        // Act
        let request = ChatRequest::from_transcript("gpt-4", &transcript);
        let json = serde_json::to_value(&request).unwrap();

        // Assert
        assert_eq!(json["model"], "gpt-4");
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], SYSTEM_PREAMBLE);
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["content"], "You stand at the gate.");
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[2]["content"], "Ava: I knock.");
    }

    #[test]
    fn test_response_tolerates_extra_fields() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "Hi." } }],
            "usage": { "total_tokens": 3 }
        }"#;

        let response: ChatResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.choices[0].message.content.as_deref(), Some("Hi."));
    }
}
