//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use taleroom_core::narrator::NarratorGateway;
use taleroom_rooms::RoomRegistry;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Every live room.
    pub registry: Arc<RoomRegistry>,
    /// Produces narrator turns.
    pub narrator: Arc<dyn NarratorGateway>,
    /// Limit on a single narrator call made by a connection session.
    pub narrator_timeout: Duration,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        registry: Arc<RoomRegistry>,
        narrator: Arc<dyn NarratorGateway>,
        narrator_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            narrator,
            narrator_timeout,
        }
    }
}
