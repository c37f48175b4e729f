//! Participant connection abstraction.

use std::fmt;

use uuid::Uuid;

use crate::error::RelayError;
use crate::message::Message;

/// The push side of a participant's live transport.
///
/// The registry calls `deliver` while it holds a room lock, so
/// implementations must not block: queue the frame and return.
/// Per-connection delivery order must match call order.
pub trait Connection: Send + Sync + fmt::Debug {
    /// Identifies this connection. A participant that reconnects gets a
    /// connection with a new id.
    fn id(&self) -> Uuid;

    /// Queue a message for delivery.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::ConnectionClosed` if the transport is gone and
    /// `RelayError::ConnectionBacklogged` if it cannot take more frames.
    fn deliver(&self, message: &Message) -> Result<(), RelayError>;

    /// Ask the transport to close. Idempotent.
    fn close(&self);
}
