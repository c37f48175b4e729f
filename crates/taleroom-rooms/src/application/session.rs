//! Per-connection session loop.
//!
//! One `ConnectionSession` runs for each attached connection. It turns
//! inbound text into participant messages, requests narrator turns, and
//! releases the participant when the connection ends.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use taleroom_core::ids::RoomId;
use taleroom_core::message::Message;
use taleroom_core::narrator::{NarratorError, NarratorGateway};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::room::ParticipantView;
use crate::domain::transcript::AppendOutcome;
use crate::registry::RoomRegistry;

/// Default limit on a single narrator call.
pub const DEFAULT_NARRATOR_TIMEOUT: Duration = Duration::from_secs(60);

/// A frame read from a participant's transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A text payload typed by the participant.
    Text(String),
    /// The peer closed the connection.
    Close,
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer closed or the stream ended.
    Closed,
    /// Reading from the transport failed.
    ReadError,
}

/// Drives one participant's connection.
pub struct ConnectionSession {
    registry: Arc<RoomRegistry>,
    narrator: Arc<dyn NarratorGateway>,
    room_id: RoomId,
    participant: ParticipantView,
    connection_id: Uuid,
    narrator_timeout: Duration,
}

impl ConnectionSession {
    /// Creates a session for `participant`, whose attached connection is
    /// `connection_id`.
    #[must_use]
    pub fn new(
        registry: Arc<RoomRegistry>,
        narrator: Arc<dyn NarratorGateway>,
        room_id: RoomId,
        participant: ParticipantView,
        connection_id: Uuid,
    ) -> Self {
        Self {
            registry,
            narrator,
            room_id,
            participant,
            connection_id,
            narrator_timeout: DEFAULT_NARRATOR_TIMEOUT,
        }
    }

    /// Overrides the narrator call timeout.
    #[must_use]
    pub fn with_narrator_timeout(mut self, timeout: Duration) -> Self {
        self.narrator_timeout = timeout;
        self
    }

    /// Reads `inbound` until it closes or fails, then releases the
    /// participant's connection.
    #[instrument(
        name = "connection_session",
        skip_all,
        fields(
            room_id = %self.room_id,
            participant_id = %self.participant.id,
            connection_id = %self.connection_id,
        )
    )]
    pub async fn run<S, E>(self, mut inbound: S) -> SessionEnd
    where
        S: Stream<Item = Result<Inbound, E>> + Unpin,
        E: Display,
    {
        info!("session started");
        let end = loop {
            match inbound.next().await {
                Some(Ok(Inbound::Text(text))) => self.handle_text(&text).await,
                Some(Ok(Inbound::Close)) | None => {
                    info!("connection closed by peer");
                    break SessionEnd::Closed;
                }
                Some(Err(error)) => {
                    warn!(%error, "connection read failed");
                    break SessionEnd::ReadError;
                }
            }
        };

        self.registry
            .release_connection(&self.room_id, &self.participant.id, self.connection_id)
            .await;
        info!(?end, "session ended");
        end
    }

    /// Appends one typed line and, when the room is waiting on the narrator,
    /// requests its turn.
    pub async fn handle_text(&self, text: &str) {
        let message = Message::spoken_by(&self.participant.name, text);
        match self.registry.append_message(&self.room_id, message).await {
            Ok(AppendOutcome::Accepted) => {}
            Ok(AppendOutcome::RejectedTurnViolation) => {
                debug!("message dropped, the narrator has not replied yet");
            }
            Err(error) => {
                warn!(%error, "could not append participant message");
                return;
            }
        }

        // A rejected message still lands here: if an earlier narrator call
        // failed, this is what retries it.
        self.narrate().await;
    }

    async fn narrate(&self) {
        let transcript = match self.registry.claim_narration(&self.room_id).await {
            Ok(Some(transcript)) => transcript,
            Ok(None) => return,
            Err(error) => {
                warn!(%error, "could not claim narrator turn");
                return;
            }
        };

        debug!(messages = transcript.len(), "requesting narrator turn");
        let reply = tokio::time::timeout(
            self.narrator_timeout,
            self.narrator.next_message(&transcript),
        )
        .await
        .unwrap_or(Err(NarratorError::Timeout(self.narrator_timeout)));

        match reply {
            Ok(message) => match self.registry.append_narration(&self.room_id, message).await {
                Ok(AppendOutcome::Accepted) => debug!("narrator turn appended"),
                Ok(AppendOutcome::RejectedTurnViolation) => {
                    warn!("narrator reply was out of turn and was dropped");
                }
                Err(error) => warn!(%error, "could not append narrator reply"),
            },
            Err(error) => {
                if let Err(release_error) = self.registry.abandon_narration(&self.room_id).await {
                    warn!(error = %release_error, "could not release narrator turn");
                }
                warn!(
                    %error,
                    stalled = true,
                    "narrator turn failed, room is awaiting the narrator"
                );
            }
        }
    }
}
