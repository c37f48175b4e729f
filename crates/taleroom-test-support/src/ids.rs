//! Test identifiers — deterministic `IdGenerator` for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use taleroom_core::ids::{IdGenerator, ParticipantId, RoomId};

/// An identifier generator that hands out predetermined values in order.
/// Repeat a value to simulate a collision. Panics if a sequence is exhausted.
#[derive(Debug)]
pub struct SequenceIdGenerator {
    room_ids: Mutex<VecDeque<String>>,
    participant_ids: Mutex<VecDeque<String>>,
}

impl SequenceIdGenerator {
    /// Create a generator with the given room and participant identifiers.
    #[must_use]
    pub fn new(room_ids: Vec<&str>, participant_ids: Vec<&str>) -> Self {
        Self {
            room_ids: Mutex::new(room_ids.into_iter().map(str::to_owned).collect()),
            participant_ids: Mutex::new(participant_ids.into_iter().map(str::to_owned).collect()),
        }
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn room_id(&self) -> RoomId {
        let next = self
            .room_ids
            .lock()
            .unwrap()
            .pop_front()
            .expect("SequenceIdGenerator ran out of room ids");
        RoomId::from(next)
    }

    fn participant_id(&self) -> ParticipantId {
        let next = self
            .participant_ids
            .lock()
            .unwrap()
            .pop_front()
            .expect("SequenceIdGenerator ran out of participant ids");
        ParticipantId::from(next)
    }
}
