//! Test narrators — mock `NarratorGateway` implementations for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use taleroom_core::message::Message;
use taleroom_core::narrator::{NarratorError, NarratorGateway};

/// A narrator that answers from a script and records every transcript it
/// was asked to continue. `Err` entries fail with a network error. The last
/// entry repeats once the script runs out.
#[derive(Debug)]
pub struct ScriptedNarrator {
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedNarrator {
    /// Create a narrator that plays `script` in order.
    ///
    /// # Panics
    ///
    /// Panics if `script` is empty.
    #[must_use]
    pub fn new(script: Vec<Result<&str, &str>>) -> Self {
        assert!(!script.is_empty(), "ScriptedNarrator needs at least one entry");
        Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|entry| entry.map(str::to_owned).map_err(str::to_owned))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a narrator that always succeeds, with these replies in order.
    #[must_use]
    pub fn replying<'a>(replies: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(replies.into_iter().map(Ok).collect())
    }

    /// Returns every transcript passed to `next_message`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NarratorGateway for ScriptedNarrator {
    async fn next_message(&self, transcript: &[Message]) -> Result<Message, NarratorError> {
        self.calls.lock().unwrap().push(transcript.to_vec());
        let entry = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        };
        match entry {
            Some(Ok(reply)) => Ok(Message::narrator(reply)),
            Some(Err(reason)) => Err(NarratorError::Network(reason)),
            None => Err(NarratorError::Network("script exhausted".into())),
        }
    }
}

/// A narrator that always fails with a network error.
#[derive(Debug)]
pub struct FailingNarrator;

#[async_trait]
impl NarratorGateway for FailingNarrator {
    async fn next_message(&self, _transcript: &[Message]) -> Result<Message, NarratorError> {
        Err(NarratorError::Network("connection refused".into()))
    }
}

/// A narrator that never answers. Pair it with a short timeout.
#[derive(Debug)]
pub struct StallingNarrator;

#[async_trait]
impl NarratorGateway for StallingNarrator {
    async fn next_message(&self, _transcript: &[Message]) -> Result<Message, NarratorError> {
        std::future::pending().await
    }
}
