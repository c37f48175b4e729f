//! Test connections — mock `Connection` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use taleroom_core::connection::Connection;
use taleroom_core::error::RelayError;
use taleroom_core::message::Message;
use uuid::Uuid;

/// A connection that records every delivered message and whether it was
/// closed. Deliveries keep succeeding after close so tests can observe
/// anything sent late.
#[derive(Debug)]
pub struct RecordingConnection {
    id: Uuid,
    received: Mutex<Vec<Message>>,
    closed: AtomicBool,
}

impl RecordingConnection {
    /// Create a new open connection with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            received: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the connection id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns a snapshot of all delivered messages, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn received(&self) -> Vec<Message> {
        self.received.lock().unwrap().clone()
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for RecordingConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for RecordingConnection {
    fn id(&self) -> Uuid {
        self.id
    }

    fn deliver(&self, message: &Message) -> Result<(), RelayError> {
        self.received.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// A connection whose every delivery fails, as if the peer vanished.
#[derive(Debug)]
pub struct FailingConnection {
    id: Uuid,
}

impl FailingConnection {
    /// Create a new failing connection with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }
}

impl Default for FailingConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for FailingConnection {
    fn id(&self) -> Uuid {
        self.id
    }

    fn deliver(&self, _message: &Message) -> Result<(), RelayError> {
        Err(RelayError::ConnectionClosed(self.id))
    }

    fn close(&self) {}
}
