//! Backends that live inside the domain crate for convenience.
//!
//! The in-memory store doubles as the test backend and as a real ephemeral
//! one. Persistent backends (SQLite, etc.) live in separate crates.

pub mod memory_store;
