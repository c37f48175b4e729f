//! Taleroom — narrator gateway.
//!
//! Implements `NarratorGateway` against an OpenAI-compatible
//! `/chat/completions` endpoint. The room transcript is sent after a fixed
//! system preamble that sets up the narrator persona.

pub mod client;
pub mod config;
pub mod preamble;
mod types;

pub use client::OpenAiNarrator;
pub use config::NarratorConfig;
