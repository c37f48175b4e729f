//! Taleroom — room registry and message pipeline.
//!
//! Owns every room, enforces turn-taking on each room's transcript, fans
//! accepted messages out to attached connections, and runs the per-connection
//! session loop that drives narrator turns.

pub mod application;
pub mod broadcast;
pub mod domain;
pub mod outbound;
pub mod registry;

pub use registry::RoomRegistry;
