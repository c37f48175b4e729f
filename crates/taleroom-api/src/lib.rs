//! Taleroom — HTTP and WebSocket surface for the chat relay.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
