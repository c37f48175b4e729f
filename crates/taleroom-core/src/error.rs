//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

use crate::ids::{ParticipantId, RoomId};

/// Top-level relay error type.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No room is registered under the identifier.
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// The room exists but has no participant with the identifier.
    #[error("participant {participant_id} not found in room {room_id}")]
    ParticipantNotFound {
        /// The room that was searched.
        room_id: RoomId,
        /// The participant that was missing.
        participant_id: ParticipantId,
    },

    /// A validation error in request input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A write to a participant connection failed because the connection
    /// is gone.
    #[error("connection closed: {0}")]
    ConnectionClosed(Uuid),

    /// A write to a participant connection was refused because its
    /// outbound queue is full.
    #[error("connection backlogged: {0}")]
    ConnectionBacklogged(Uuid),
}
