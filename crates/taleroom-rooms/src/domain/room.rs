//! The room aggregate: roster, transcript, and narrator turn bookkeeping.
//!
//! A `Room` is only ever touched through `RoomRegistry`, which holds the
//! room's lock for the duration of each method call.

use std::sync::Arc;

use serde::Serialize;
use taleroom_core::connection::Connection;
use taleroom_core::ids::{ParticipantId, RoomId};
use taleroom_core::message::Message;
use uuid::Uuid;

use super::transcript::{AppendOutcome, Transcript, Turn};
use crate::broadcast::{self, BroadcastReport};

/// A member of a room's roster.
#[derive(Debug)]
pub struct Participant {
    /// Identifier, unique within the room.
    pub id: ParticipantId,
    /// Name chosen at join time.
    pub display_name: String,
    /// Push handle, present once the participant has connected.
    connection: Option<Arc<dyn Connection>>,
}

impl Participant {
    /// Returns the attached connection, if any.
    #[must_use]
    pub fn connection(&self) -> Option<&Arc<dyn Connection>> {
        self.connection.as_ref()
    }

    fn view(&self) -> ParticipantView {
        ParticipantView {
            id: self.id.clone(),
            name: self.display_name.clone(),
        }
    }
}

/// Read-only view of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantView {
    /// The participant identifier.
    pub id: ParticipantId,
    /// The display name.
    pub name: String,
}

/// Read-only snapshot of a room.
#[derive(Debug, Clone, Serialize)]
pub struct RoomView {
    /// The room identifier.
    pub id: RoomId,
    /// Participants in join order.
    pub players: Vec<ParticipantView>,
    /// The transcript in order.
    pub messages: Vec<Message>,
}

/// An isolated session with its own roster and transcript.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    participants: Vec<Participant>,
    transcript: Transcript,
    /// Set while a narrator call for this room is outstanding.
    narration_in_flight: bool,
}

impl Room {
    /// Creates a room with an empty roster and a seeded transcript.
    #[must_use]
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            participants: Vec::new(),
            transcript: Transcript::seeded(),
            narration_in_flight: false,
        }
    }

    /// Returns the room identifier.
    #[must_use]
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Returns the transcript.
    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the roster in join order.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Returns true if a participant with `id` is on the roster.
    #[must_use]
    pub fn has_participant(&self, id: &ParticipantId) -> bool {
        self.participants.iter().any(|p| &p.id == id)
    }

    /// Looks up a participant.
    #[must_use]
    pub fn participant(&self, id: &ParticipantId) -> Option<ParticipantView> {
        self.participants
            .iter()
            .find(|p| &p.id == id)
            .map(Participant::view)
    }

    /// Adds a participant without a connection. The caller guarantees `id`
    /// is not already on the roster.
    pub fn join(&mut self, id: ParticipantId, display_name: String) -> ParticipantView {
        let participant = Participant {
            id,
            display_name,
            connection: None,
        };
        let view = participant.view();
        self.participants.push(participant);
        view
    }

    /// Binds `connection` to the participant and returns the handle it
    /// replaced. Returns `None` in the outer option if the participant is not
    /// on the roster.
    pub fn attach(
        &mut self,
        id: &ParticipantId,
        connection: Arc<dyn Connection>,
    ) -> Option<Option<Arc<dyn Connection>>> {
        let participant = self.participants.iter_mut().find(|p| &p.id == id)?;
        Some(participant.connection.replace(connection))
    }

    /// Removes the participant. Returns false if it was already gone.
    pub fn remove(&mut self, id: &ParticipantId) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| &p.id != id);
        self.participants.len() != before
    }

    /// Removes the participant only if `connection_id` is its current
    /// connection.
    pub fn release(&mut self, id: &ParticipantId, connection_id: Uuid) -> bool {
        let current = self
            .participants
            .iter()
            .find(|p| &p.id == id)
            .and_then(|p| p.connection.as_ref())
            .is_some_and(|c| c.id() == connection_id);
        current && self.remove(id)
    }

    /// Appends `message` under turn-taking rules and, if accepted, pushes it
    /// to every attached participant.
    pub fn append(&mut self, message: Message) -> (AppendOutcome, BroadcastReport) {
        let outcome = self.transcript.append(message);
        let report = if outcome.is_accepted() {
            let appended = &self.transcript.messages()[self.transcript.len() - 1];
            broadcast::broadcast(&self.participants, appended)
        } else {
            BroadcastReport::default()
        };
        (outcome, report)
    }

    /// Marks a narrator call in flight and returns the transcript to send,
    /// if the room is awaiting the narrator and no call is outstanding.
    pub fn claim_narration(&mut self) -> Option<Vec<Message>> {
        if self.narration_in_flight || self.transcript.turn() != Turn::AwaitingNarrator {
            return None;
        }
        self.narration_in_flight = true;
        Some(self.transcript.messages().to_vec())
    }

    /// Appends the narrator's reply and ends the in-flight call.
    pub fn append_narration(&mut self, message: Message) -> (AppendOutcome, BroadcastReport) {
        self.narration_in_flight = false;
        self.append(message)
    }

    /// Ends the in-flight call without appending.
    pub fn abandon_narration(&mut self) {
        self.narration_in_flight = false;
    }

    /// Returns true while a narrator call is outstanding.
    #[must_use]
    pub fn narration_in_flight(&self) -> bool {
        self.narration_in_flight
    }

    /// Builds a read-only snapshot.
    #[must_use]
    pub fn view(&self) -> RoomView {
        RoomView {
            id: self.id.clone(),
            players: self.participants.iter().map(Participant::view).collect(),
            messages: self.transcript.messages().to_vec(),
        }
    }
}
