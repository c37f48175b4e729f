//! Narrator gateway abstraction.
//!
//! The narrator's turns come from an external text-generation backend. The
//! relay only needs one call: given the ordered transcript, produce the next
//! narrator message or fail.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::message::Message;

/// Failures from a narrator backend.
#[derive(Debug, Error)]
pub enum NarratorError {
    /// The backend could not be configured (missing credential, bad URL).
    #[error("narrator configuration error: {0}")]
    Config(String),

    /// The request never produced a response.
    #[error("narrator network error: {0}")]
    Network(String),

    /// The backend rejected the credential.
    #[error("narrator authentication error: {0}")]
    Auth(String),

    /// The backend refused the request for quota or rate reasons.
    #[error("narrator quota exceeded: {0}")]
    Quota(String),

    /// Any other non-success response.
    #[error("narrator api error: {0}")]
    Api(String),

    /// The response arrived but did not contain a usable message.
    #[error("malformed narrator response: {0}")]
    MalformedResponse(String),

    /// The call took longer than the configured limit.
    #[error("narrator timed out after {0:?}")]
    Timeout(Duration),
}

/// Produces the narrator's next message from a room transcript.
#[async_trait]
pub trait NarratorGateway: Send + Sync {
    /// Generate the next narrator message for `transcript`.
    ///
    /// The returned message must have `Role::Narrator`.
    ///
    /// # Errors
    ///
    /// Returns a `NarratorError` describing why no message was produced.
    async fn next_message(&self, transcript: &[Message]) -> Result<Message, NarratorError>;
}
