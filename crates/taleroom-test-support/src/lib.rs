//! Shared test doubles for the Taleroom chat relay.

mod connection;
mod ids;
mod narrator;

pub use connection::{FailingConnection, RecordingConnection};
pub use ids::SequenceIdGenerator;
pub use narrator::{FailingNarrator, ScriptedNarrator, StallingNarrator};
