//! Application services that drive the registry.

pub mod session;
