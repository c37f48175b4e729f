//! Taleroom Core — shared domain abstractions.
//!
//! This crate defines the message model, identifiers, and the traits at the
//! seams of the relay (connections and the narrator backend). It contains no
//! infrastructure code.

pub mod connection;
pub mod error;
pub mod ids;
pub mod message;
pub mod narrator;
