//! Fan-out of appended messages to attached connections.

use taleroom_core::message::Message;
use tracing::warn;

use crate::domain::room::Participant;

/// Outcome of one fan-out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the message was queued on.
    pub delivered: usize,
    /// Connections that refused the message.
    pub failed: usize,
}

/// Pushes `message` to every participant with an attached connection.
///
/// Delivery is best-effort. A failing connection is logged and skipped; it
/// never stops delivery to the rest of the room.
pub fn broadcast<'a>(
    participants: impl IntoIterator<Item = &'a Participant>,
    message: &Message,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();
    for participant in participants {
        let Some(connection) = participant.connection() else {
            continue;
        };
        match connection.deliver(message) {
            Ok(()) => report.delivered += 1,
            Err(error) => {
                warn!(
                    participant_id = %participant.id,
                    connection_id = %connection.id(),
                    %error,
                    "broadcast delivery failed"
                );
                report.failed += 1;
            }
        }
    }
    report
}
