//! Room and transcript domain types.

pub mod room;
pub mod transcript;
