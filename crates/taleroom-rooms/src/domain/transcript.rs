//! Room transcript and the turn-taking state machine.

use taleroom_core::message::{Message, Role};

/// Greeting every room's transcript is seeded with.
pub const OPENING_LINE: &str = "Your group starts out into the city. There are many opportunities \
     for work, adventure, profit and trouble.";

/// Whose turn it is to append next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// The last message is narrator-authored; a participant may speak.
    AwaitingParticipant,
    /// A participant has spoken; only the narrator may append.
    AwaitingNarrator,
}

/// Result of an append attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The message was appended.
    Accepted,
    /// The message was out of turn and was dropped.
    RejectedTurnViolation,
}

impl AppendOutcome {
    /// Returns true if the message was appended.
    #[must_use]
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Ordered message history of a room.
///
/// Roles strictly alternate after the narrator seed, so no two consecutive
/// messages are participant-authored.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Creates a transcript holding only the narrator's opening line.
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            messages: vec![Message::narrator(OPENING_LINE)],
        }
    }

    /// Returns whose turn it is.
    #[must_use]
    pub fn turn(&self) -> Turn {
        match self.messages.last().map(|m| m.role) {
            Some(Role::Participant) => Turn::AwaitingNarrator,
            Some(Role::Narrator) | None => Turn::AwaitingParticipant,
        }
    }

    /// Appends `message` if its role matches the current turn.
    pub fn append(&mut self, message: Message) -> AppendOutcome {
        let allowed = matches!(
            (self.turn(), message.role),
            (Turn::AwaitingParticipant, Role::Participant) | (Turn::AwaitingNarrator, Role::Narrator)
        );
        if !allowed {
            return AppendOutcome::RejectedTurnViolation;
        }
        self.messages.push(message);
        AppendOutcome::Accepted
    }

    /// Returns the messages in order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false for a seeded transcript.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
