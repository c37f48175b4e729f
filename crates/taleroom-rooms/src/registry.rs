//! The room registry.
//!
//! Every room sits behind its own mutex; the map of rooms has a separate
//! reader/writer lock that is only held long enough to resolve or insert an
//! entry. Operations on one room are linearized by its mutex, and operations
//! on different rooms never wait on each other. No lock is ever held across
//! a narrator call.

use std::collections::HashMap;
use std::sync::Arc;

use taleroom_core::connection::Connection;
use taleroom_core::error::RelayError;
use taleroom_core::ids::{IdGenerator, ParticipantId, RoomId};
use taleroom_core::message::Message;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::room::{ParticipantView, Room, RoomView};
use crate::domain::transcript::AppendOutcome;

/// Owns all rooms and exposes the atomic operations on them.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<Room>>>>,
    ids: Arc<dyn IdGenerator>,
}

impl std::fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry").finish_non_exhaustive()
    }
}

impl RoomRegistry {
    /// Creates an empty registry drawing identifiers from `ids`.
    #[must_use]
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            ids,
        }
    }

    async fn room(&self, room_id: &RoomId) -> Result<Arc<Mutex<Room>>, RelayError> {
        self.rooms
            .read()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| RelayError::RoomNotFound(room_id.clone()))
    }

    /// Creates a room with a seeded transcript and returns its identifier.
    ///
    /// Identifier collisions are retried until a free one is drawn.
    pub async fn create_room(&self) -> RoomId {
        let mut rooms = self.rooms.write().await;
        let room_id = loop {
            let candidate = self.ids.room_id();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
            debug!(room_id = %candidate, "room id already taken, drawing again");
        };
        rooms.insert(
            room_id.clone(),
            Arc::new(Mutex::new(Room::new(room_id.clone()))),
        );
        info!(room_id = %room_id, rooms = rooms.len(), "room created");
        room_id
    }

    /// Returns a snapshot of the room.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::RoomNotFound` if the identifier is unregistered.
    pub async fn find_room(&self, room_id: &RoomId) -> Result<RoomView, RelayError> {
        let room = self.room(room_id).await?;
        let room = room.lock().await;
        Ok(room.view())
    }

    /// Returns the room's transcript in order.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::RoomNotFound` if the identifier is unregistered.
    pub async fn messages(&self, room_id: &RoomId) -> Result<Vec<Message>, RelayError> {
        let room = self.room(room_id).await?;
        let room = room.lock().await;
        Ok(room.transcript().messages().to_vec())
    }

    /// Adds a participant named `display_name` to the room. No connection is
    /// needed yet.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Validation` if the name is blank and
    /// `RelayError::RoomNotFound` if the room is unregistered.
    pub async fn join(
        &self,
        room_id: &RoomId,
        display_name: &str,
    ) -> Result<ParticipantView, RelayError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(RelayError::Validation("name must not be blank".to_owned()));
        }

        let room = self.room(room_id).await?;
        let mut room = room.lock().await;
        let participant_id = loop {
            let candidate = self.ids.participant_id();
            if !room.has_participant(&candidate) {
                break candidate;
            }
            debug!(%room_id, participant_id = %candidate, "participant id already taken, drawing again");
        };
        let participant = room.join(participant_id, display_name.to_owned());
        info!(%room_id, participant_id = %participant.id, name = %participant.name, "participant joined");
        Ok(participant)
    }

    /// Looks up a participant.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::RoomNotFound` or `RelayError::ParticipantNotFound`.
    pub async fn find_participant(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
    ) -> Result<ParticipantView, RelayError> {
        let room = self.room(room_id).await?;
        let room = room.lock().await;
        room.participant(participant_id)
            .ok_or_else(|| RelayError::ParticipantNotFound {
                room_id: room_id.clone(),
                participant_id: participant_id.clone(),
            })
    }

    /// Binds `connection` to the participant. A previously attached
    /// connection is closed.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::RoomNotFound` or `RelayError::ParticipantNotFound`.
    pub async fn attach_connection(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        connection: Arc<dyn Connection>,
    ) -> Result<(), RelayError> {
        let room = self.room(room_id).await?;
        let mut room = room.lock().await;
        let connection_id = connection.id();
        let replaced = room.attach(participant_id, connection).ok_or_else(|| {
            RelayError::ParticipantNotFound {
                room_id: room_id.clone(),
                participant_id: participant_id.clone(),
            }
        })?;
        if let Some(previous) = replaced {
            info!(%room_id, %participant_id, superseded = %previous.id(), "closing superseded connection");
            previous.close();
        }
        info!(%room_id, %participant_id, %connection_id, "connection attached");
        Ok(())
    }

    /// Removes the participant. Idempotent: returns false if the room or the
    /// participant is already gone.
    pub async fn remove_participant(&self, room_id: &RoomId, participant_id: &ParticipantId) -> bool {
        let Ok(room) = self.room(room_id).await else {
            return false;
        };
        let removed = room.lock().await.remove(participant_id);
        if removed {
            info!(%room_id, %participant_id, "participant removed");
        }
        removed
    }

    /// Removes the participant if `connection_id` is still its current
    /// connection. A session whose connection was superseded leaves the
    /// participant in place.
    pub async fn release_connection(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        connection_id: Uuid,
    ) -> bool {
        let Ok(room) = self.room(room_id).await else {
            return false;
        };
        let released = room.lock().await.release(participant_id, connection_id);
        if released {
            info!(%room_id, %participant_id, %connection_id, "connection released, participant removed");
        } else {
            debug!(%room_id, %participant_id, %connection_id, "connection was already superseded");
        }
        released
    }

    /// Appends `message` under turn-taking rules. An accepted message is
    /// pushed to every attached participant before this returns, so delivery
    /// order matches transcript order.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::RoomNotFound` if the room is unregistered.
    pub async fn append_message(
        &self,
        room_id: &RoomId,
        message: Message,
    ) -> Result<AppendOutcome, RelayError> {
        let room = self.room(room_id).await?;
        let mut room = room.lock().await;
        let role = message.role;
        let (outcome, report) = room.append(message);
        match outcome {
            AppendOutcome::Accepted => debug!(
                %room_id,
                ?role,
                delivered = report.delivered,
                failed = report.failed,
                "message appended"
            ),
            AppendOutcome::RejectedTurnViolation => {
                debug!(%room_id, ?role, "message out of turn, dropped");
            }
        }
        Ok(outcome)
    }

    /// Reserves the room's narrator turn. Returns the transcript to narrate
    /// from if the room is awaiting the narrator and no call is already in
    /// flight, otherwise `None`.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::RoomNotFound` if the room is unregistered.
    pub async fn claim_narration(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<Vec<Message>>, RelayError> {
        let room = self.room(room_id).await?;
        let mut room = room.lock().await;
        Ok(room.claim_narration())
    }

    /// Appends a narrator reply and ends the reserved turn in one step.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::RoomNotFound` if the room is unregistered.
    pub async fn append_narration(
        &self,
        room_id: &RoomId,
        message: Message,
    ) -> Result<AppendOutcome, RelayError> {
        let room = self.room(room_id).await?;
        let mut room = room.lock().await;
        let (outcome, report) = room.append_narration(message);
        debug!(
            %room_id,
            ?outcome,
            delivered = report.delivered,
            failed = report.failed,
            "narration appended"
        );
        Ok(outcome)
    }

    /// Ends the reserved narrator turn without appending. The room keeps
    /// awaiting the narrator.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::RoomNotFound` if the room is unregistered.
    pub async fn abandon_narration(&self, room_id: &RoomId) -> Result<(), RelayError> {
        let room = self.room(room_id).await?;
        room.lock().await.abandon_narration();
        Ok(())
    }

    /// Returns the number of registered rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use taleroom_core::ids::RandomIdGenerator;
    use taleroom_core::message::Role;
    use taleroom_test_support::{FailingConnection, RecordingConnection, SequenceIdGenerator};

    use super::*;

    fn registry() -> RoomRegistry {
        RoomRegistry::new(Arc::new(RandomIdGenerator))
    }

    #[tokio::test]
    async fn test_create_room_seeds_narrator_greeting() {
        // Arrange
        let registry = registry();

        // Act
        let room_id = registry.create_room().await;
        let view = registry.find_room(&room_id).await.unwrap();

        // Assert
        assert!(room_id.is_well_formed());
        assert_eq!(view.id, room_id);
        assert!(view.players.is_empty());
        assert_eq!(view.messages.len(), 1);
        assert_eq!(view.messages[0].role, Role::Narrator);
    }

    #[tokio::test]
    async fn test_find_room_on_empty_registry_is_not_found() {
        let registry = registry();

        let result = registry.find_room(&RoomId::from("ZZZZ")).await;

        match result.unwrap_err() {
            RelayError::RoomNotFound(id) => assert_eq!(id, RoomId::from("ZZZZ")),
            other => panic!("expected RoomNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_room_retries_on_collision() {
        // Arrange
        let ids = SequenceIdGenerator::new(vec!["ABCD", "ABCD", "ABCD", "WXYZ"], vec![]);
        let registry = RoomRegistry::new(Arc::new(ids));

        // Act
        let first = registry.create_room().await;
        let second = registry.create_room().await;

        // Assert
        assert_eq!(first, RoomId::from("ABCD"));
        assert_eq!(second, RoomId::from("WXYZ"));
        assert_eq!(registry.room_count().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_create_room_yields_distinct_resolvable_ids() {
        // Arrange
        let registry = Arc::new(registry());
        let n = 64;

        // Act
        let handles: Vec<_> = (0..n)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.create_room().await })
            })
            .collect();
        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }

        // Assert
        assert_eq!(ids.len(), n);
        for id in &ids {
            assert!(registry.find_room(id).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_join_unknown_room_is_not_found() {
        let registry = registry();

        let result = registry.join(&RoomId::from("NOPE"), "Ava").await;

        assert!(matches!(result, Err(RelayError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn test_join_rejects_blank_name() {
        let registry = registry();
        let room_id = registry.create_room().await;

        let result = registry.join(&room_id, "   ").await;

        assert!(matches!(result, Err(RelayError::Validation(_))));
    }

    #[tokio::test]
    async fn test_join_redraws_colliding_participant_id() {
        // Arrange
        let ids = SequenceIdGenerator::new(vec!["ROOM"], vec!["same", "same", "other"]);
        let registry = RoomRegistry::new(Arc::new(ids));
        let room_id = registry.create_room().await;

        // Act
        let ava = registry.join(&room_id, "Ava").await.unwrap();
        let bram = registry.join(&room_id, "Bram").await.unwrap();

        // Assert
        assert_eq!(ava.id, ParticipantId::from("same"));
        assert_eq!(bram.id, ParticipantId::from("other"));
    }

    #[tokio::test]
    async fn test_concurrent_joins_keep_every_participant() {
        // Arrange
        let registry = Arc::new(registry());
        let room_id = registry.create_room().await;

        // Act
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let room_id = room_id.clone();
                tokio::spawn(async move { registry.join(&room_id, &format!("player {i}")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Assert
        let view = registry.find_room(&room_id).await.unwrap();
        assert_eq!(view.players.len(), 32);
        let unique: HashSet<_> = view.players.iter().map(|p| p.id.clone()).collect();
        assert_eq!(unique.len(), 32);
    }

    #[tokio::test]
    async fn test_attach_connection_unknown_participant_is_not_found() {
        let registry = registry();
        let room_id = registry.create_room().await;

        let result = registry
            .attach_connection(
                &room_id,
                &ParticipantId::from("ghost"),
                Arc::new(RecordingConnection::new()),
            )
            .await;

        assert!(matches!(result, Err(RelayError::ParticipantNotFound { .. })));
    }

    #[tokio::test]
    async fn test_attach_connection_closes_superseded_handle() {
        // Arrange
        let registry = registry();
        let room_id = registry.create_room().await;
        let ava = registry.join(&room_id, "Ava").await.unwrap();
        let first = Arc::new(RecordingConnection::new());
        let second = Arc::new(RecordingConnection::new());

        // Act
        registry
            .attach_connection(&room_id, &ava.id, first.clone())
            .await
            .unwrap();
        registry
            .attach_connection(&room_id, &ava.id, second.clone())
            .await
            .unwrap();

        // Assert
        assert!(first.is_closed());
        assert!(!second.is_closed());
    }

    #[tokio::test]
    async fn test_remove_participant_removes_exactly_one_and_is_idempotent() {
        // Arrange
        let registry = registry();
        let room_id = registry.create_room().await;
        let ava = registry.join(&room_id, "Ava").await.unwrap();
        let bram = registry.join(&room_id, "Bram").await.unwrap();
        registry
            .attach_connection(&room_id, &ava.id, Arc::new(RecordingConnection::new()))
            .await
            .unwrap();

        // Act
        let first = registry.remove_participant(&room_id, &ava.id).await;
        let second = registry.remove_participant(&room_id, &ava.id).await;

        // Assert
        assert!(first);
        assert!(!second);
        let view = registry.find_room(&room_id).await.unwrap();
        assert_eq!(view.players, vec![bram]);
    }

    #[tokio::test]
    async fn test_remove_participant_in_unknown_room_is_noop() {
        let registry = registry();

        let removed = registry
            .remove_participant(&RoomId::from("NOPE"), &ParticipantId::from("p"))
            .await;

        assert!(!removed);
    }

    #[tokio::test]
    async fn test_release_connection_keeps_participant_after_reconnect() {
        // Arrange
        let registry = registry();
        let room_id = registry.create_room().await;
        let ava = registry.join(&room_id, "Ava").await.unwrap();
        let stale = Arc::new(RecordingConnection::new());
        let fresh = Arc::new(RecordingConnection::new());
        registry
            .attach_connection(&room_id, &ava.id, stale.clone())
            .await
            .unwrap();
        registry
            .attach_connection(&room_id, &ava.id, fresh.clone())
            .await
            .unwrap();

        // Act
        let released = registry
            .release_connection(&room_id, &ava.id, stale.id())
            .await;

        // Assert
        assert!(!released);
        assert!(registry.find_participant(&room_id, &ava.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_appended_message_is_listed_unchanged_at_its_position() {
        // Arrange
        let registry = registry();
        let room_id = registry.create_room().await;
        let message = Message::participant("Ava: I light a torch");

        // Act
        let outcome = registry
            .append_message(&room_id, message.clone())
            .await
            .unwrap();

        // Assert
        assert_eq!(outcome, AppendOutcome::Accepted);
        let messages = registry.messages(&room_id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], message);
    }

    #[tokio::test]
    async fn test_append_broadcasts_to_healthy_despite_failing_peer() {
        // Arrange
        let registry = registry();
        let room_id = registry.create_room().await;
        let ava = registry.join(&room_id, "Ava").await.unwrap();
        let bram = registry.join(&room_id, "Bram").await.unwrap();
        let healthy = Arc::new(RecordingConnection::new());
        registry
            .attach_connection(&room_id, &ava.id, healthy.clone())
            .await
            .unwrap();
        registry
            .attach_connection(&room_id, &bram.id, Arc::new(FailingConnection::new()))
            .await
            .unwrap();
        let message = Message::participant("Ava: hello?");

        // Act
        let outcome = registry
            .append_message(&room_id, message.clone())
            .await
            .unwrap();

        // Assert
        assert!(outcome.is_accepted());
        assert_eq!(healthy.received(), vec![message]);
        assert_eq!(registry.messages(&room_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_out_of_turn_append_is_dropped_silently() {
        // Arrange
        let registry = registry();
        let room_id = registry.create_room().await;
        let ava = registry.join(&room_id, "Ava").await.unwrap();
        let recorder = Arc::new(RecordingConnection::new());
        registry
            .attach_connection(&room_id, &ava.id, recorder.clone())
            .await
            .unwrap();
        registry
            .append_message(&room_id, Message::participant("Ava: one"))
            .await
            .unwrap();

        // Act
        let outcome = registry
            .append_message(&room_id, Message::participant("Ava: two"))
            .await
            .unwrap();

        // Assert
        assert_eq!(outcome, AppendOutcome::RejectedTurnViolation);
        assert_eq!(registry.messages(&room_id).await.unwrap().len(), 2);
        assert_eq!(recorder.received().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_participant_appends_accept_exactly_one() {
        // Arrange
        let registry = Arc::new(registry());
        let room_id = registry.create_room().await;

        // Act
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let room_id = room_id.clone();
                tokio::spawn(async move {
                    registry
                        .append_message(&room_id, Message::participant(format!("p{i}: go")))
                        .await
                        .unwrap()
                })
            })
            .collect();
        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_accepted() {
                accepted += 1;
            }
        }

        // Assert
        assert_eq!(accepted, 1);
        assert_eq!(registry.messages(&room_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_narration_claim_append_cycle() {
        // Arrange
        let registry = registry();
        let room_id = registry.create_room().await;
        registry
            .append_message(&room_id, Message::participant("Ava: hi"))
            .await
            .unwrap();

        // Act
        let claimed = registry.claim_narration(&room_id).await.unwrap();
        let duplicate = registry.claim_narration(&room_id).await.unwrap();
        let outcome = registry
            .append_narration(&room_id, Message::narrator("Welcome."))
            .await
            .unwrap();

        // Assert
        assert_eq!(claimed.unwrap().len(), 2);
        assert!(duplicate.is_none());
        assert!(outcome.is_accepted());
        assert!(registry.claim_narration(&room_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_abandoned_narration_can_be_claimed_again() {
        let registry = registry();
        let room_id = registry.create_room().await;
        registry
            .append_message(&room_id, Message::participant("Ava: hi"))
            .await
            .unwrap();
        registry.claim_narration(&room_id).await.unwrap();

        registry.abandon_narration(&room_id).await.unwrap();

        assert!(registry.claim_narration(&room_id).await.unwrap().is_some());
    }
}
