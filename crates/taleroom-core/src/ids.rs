//! Room and participant identifiers.
//!
//! Generation sits behind [`IdGenerator`] so that tests can inject
//! predetermined sequences, including deliberate collisions.

use std::fmt;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Alphabet for room identifiers.
const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of a room identifier. Short enough to read aloud.
pub const ROOM_ID_LEN: usize = 4;

/// Length of a participant identifier.
pub const PARTICIPANT_ID_LEN: usize = 16;

/// Short, human-shareable room identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identifier has the shape the generator produces.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == ROOM_ID_LEN && self.0.bytes().all(|b| ROOM_ID_ALPHABET.contains(&b))
    }
}

impl From<String> for RoomId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Participant identifier, unique within its room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Abstraction over identifier generation.
///
/// Implementations keep no cross-call state beyond their random source.
/// Uniqueness is not their concern: the registry checks for collisions and
/// draws again.
pub trait IdGenerator: Send + Sync {
    /// Generate a candidate room identifier.
    fn room_id(&self) -> RoomId;

    /// Generate a candidate participant identifier.
    fn participant_id(&self) -> ParticipantId;
}

/// Production generator backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn room_id(&self) -> RoomId {
        let mut rng = rand::rng();
        let id = (0..ROOM_ID_LEN)
            .map(|_| char::from(ROOM_ID_ALPHABET[rng.random_range(0..ROOM_ID_ALPHABET.len())]))
            .collect();
        RoomId(id)
    }

    fn participant_id(&self) -> ParticipantId {
        let id = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(PARTICIPANT_ID_LEN)
            .map(char::from)
            .collect();
        ParticipantId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_room_id_is_four_uppercase_letters() {
        let generator = RandomIdGenerator;

        for _ in 0..100 {
            let id = generator.room_id();
            assert!(id.is_well_formed(), "unexpected room id {id}");
        }
    }

    #[test]
    fn test_random_participant_id_is_sixteen_alphanumerics() {
        let id = RandomIdGenerator.participant_id();

        assert_eq!(id.as_str().len(), PARTICIPANT_ID_LEN);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_room_id_well_formed_rejects_other_shapes() {
        assert!(RoomId::from("ABCD").is_well_formed());
        assert!(!RoomId::from("abcd").is_well_formed());
        assert!(!RoomId::from("ABCDE").is_well_formed());
        assert!(!RoomId::from("AB1D").is_well_formed());
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let json = serde_json::to_value(ParticipantId::from("p1")).unwrap();

        assert_eq!(json, serde_json::json!("p1"));
    }
}
