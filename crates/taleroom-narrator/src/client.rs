//! HTTP narrator gateway.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use taleroom_core::message::Message;
use taleroom_core::narrator::{NarratorError, NarratorGateway};
use tracing::{debug, warn};

use crate::config::NarratorConfig;
use crate::types::{ChatRequest, ChatResponse};

/// `NarratorGateway` backed by an OpenAI-compatible chat completions API.
#[derive(Debug, Clone)]
pub struct OpenAiNarrator {
    http_client: Client,
    config: NarratorConfig,
}

impl OpenAiNarrator {
    /// Create a narrator client from `config`.
    ///
    /// # Errors
    ///
    /// Returns `NarratorError::Config` if the api key is blank or the HTTP
    /// client cannot be built.
    pub fn new(config: NarratorConfig) -> Result<Self, NarratorError> {
        if config.api_key.trim().is_empty() {
            return Err(NarratorError::Config("api key must not be blank".into()));
        }
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NarratorError::Config(e.to_string()))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// Returns the configuration in use.
    #[must_use]
    pub fn config(&self) -> &NarratorConfig {
        &self.config
    }

    fn transport_error(&self, error: &reqwest::Error) -> NarratorError {
        if error.is_timeout() {
            NarratorError::Timeout(self.config.timeout)
        } else {
            NarratorError::Network(error.to_string())
        }
    }
}

/// Maps a non-success status to the matching failure.
fn status_error(status: StatusCode, body: &str) -> NarratorError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            NarratorError::Auth(format!("{status}: {body}"))
        }
        StatusCode::TOO_MANY_REQUESTS => NarratorError::Quota(format!("{status}: {body}")),
        _ => NarratorError::Api(format!("{status}: {body}")),
    }
}

#[async_trait]
impl NarratorGateway for OpenAiNarrator {
    async fn next_message(&self, transcript: &[Message]) -> Result<Message, NarratorError> {
        let start = Instant::now();
        let request = ChatRequest::from_transcript(&self.config.model, transcript);

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "narrator request failed");
                self.transport_error(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %body, "narrator api error");
            return Err(status_error(status, &body));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                NarratorError::Timeout(self.config.timeout)
            } else {
                NarratorError::MalformedResponse(e.to_string())
            }
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_owned())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                NarratorError::MalformedResponse("response contained no message content".into())
            })?;

        debug!(
            model = %self.config.model,
            messages = transcript.len(),
            duration_ms = start.elapsed().as_millis(),
            "narrator reply received"
        );

        Ok(Message::narrator(content))
    }
}
