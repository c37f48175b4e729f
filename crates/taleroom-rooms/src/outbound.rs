//! Channel-backed connection handle.
//!
//! The registry pushes frames into a bounded queue while it holds the room
//! lock; a writer task owned by the transport drains the queue into the
//! socket. Queue order is delivery order. A reader that falls too far behind
//! misses messages instead of growing the queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use taleroom_core::connection::Connection;
use taleroom_core::error::RelayError;
use taleroom_core::message::Message;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// Frames a connection may have queued before deliveries are refused.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// A frame waiting to be written to the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// A transcript message.
    Message(Message),
    /// Close the socket and stop writing.
    Close,
}

/// `Connection` that queues frames on a bounded mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelConnection {
    id: Uuid,
    tx: mpsc::Sender<OutboundFrame>,
    close_requested: Arc<AtomicBool>,
}

/// The receiving end drained by the writer task.
#[derive(Debug)]
pub struct OutboundQueue {
    rx: mpsc::Receiver<OutboundFrame>,
    close_requested: Arc<AtomicBool>,
}

impl OutboundQueue {
    /// Waits for the next frame. Returns `None` once every handle is gone.
    ///
    /// A close requested while the queue was full is returned ahead of the
    /// backlog.
    pub async fn recv(&mut self) -> Option<OutboundFrame> {
        if self.close_requested.load(Ordering::Acquire) {
            return Some(OutboundFrame::Close);
        }
        self.rx.recv().await
    }
}

impl ChannelConnection {
    /// Creates a handle with the default capacity and the queue the writer
    /// task drains.
    #[must_use]
    pub fn new() -> (Self, OutboundQueue) {
        Self::with_capacity(DEFAULT_OUTBOUND_CAPACITY)
    }

    /// Creates a handle whose queue holds at most `capacity` frames.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> (Self, OutboundQueue) {
        let (tx, rx) = mpsc::channel(capacity);
        let close_requested = Arc::new(AtomicBool::new(false));
        (
            Self {
                id: Uuid::new_v4(),
                tx,
                close_requested: Arc::clone(&close_requested),
            },
            OutboundQueue {
                rx,
                close_requested,
            },
        )
    }
}

impl Connection for ChannelConnection {
    fn id(&self) -> Uuid {
        self.id
    }

    fn deliver(&self, message: &Message) -> Result<(), RelayError> {
        self.tx
            .try_send(OutboundFrame::Message(message.clone()))
            .map_err(|error| match error {
                TrySendError::Full(_) => RelayError::ConnectionBacklogged(self.id),
                TrySendError::Closed(_) => RelayError::ConnectionClosed(self.id),
            })
    }

    fn close(&self) {
        // A closed channel means the writer is already gone.
        if let Err(TrySendError::Full(_)) = self.tx.try_send(OutboundFrame::Close) {
            self.close_requested.store(true, Ordering::Release);
        }
    }
}
