//! Domain library for the typed key-value store.
//!
//! This crate holds the domain types, ports (traits), and error definitions:
//! the [`StringStore`] port over any flat string key-value backend, the
//! [`Validator`] port with its combinator schemas, and [`TypedStore`] binding
//! a fixed set of logical keys to validators. Keep heavyweight backends out
//! of this crate; they live in adapter crates.

use std::sync::Arc;

use thiserror::Error;

pub use schema::{SchemaError, Validator};
pub use store::{SchemaMap, TypedStore};

/// Port over the underlying flat key-value string store.
///
/// Keys and values are both strings; the namespace is shared and persisted
/// beyond the lifetime of any one [`TypedStore`]. Each call is an immediate,
/// synchronous read or write; the backend's per-call atomicity is the only
/// consistency guarantee (a get-then-set sequence is not atomic).
pub trait StringStore: Send + Sync {
    /// Read the raw string stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Write `raw` under `key`, replacing any previous value (last writer wins).
    fn set(&self, key: &str, raw: &str) -> Result<(), StoreError>;
    /// Delete the entry under `key`; no-op if absent.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// Lets callers move an Arc'd backend into a store while keeping a handle to
// it, e.g. to inspect raw contents in tests.
impl<S: StringStore + ?Sized> StringStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, raw: &str) -> Result<(), StoreError> {
        (**self).set(key, raw)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Errors surfaced by the store and its backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key is not declared in the store's [`SchemaMap`]. Key membership
    /// is fixed at construction, so hitting this is a programming error.
    #[error("no schema declared for key \"{0}\"")]
    UndeclaredKey(String),
    /// A value offered to `set` did not conform to the key's schema.
    /// The write is rejected and the backend left untouched.
    #[error("validation failed for key \"{key}\": {source}")]
    Validation {
        key: String,
        #[source]
        source: SchemaError,
    },
    /// A typed value could not be converted to JSON for storage.
    #[error("could not encode value for key \"{key}\": {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// A validated value could not be converted into the requested type.
    /// Means the call-site type disagrees with the declared schema.
    #[error("could not decode value for key \"{key}\": {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// The backend failed (poisoned lock, I/O, ...).
    #[error("backend error: {0}")]
    Backend(String),
}

// Re-export modules when added
pub mod adapters;
pub mod schema;
pub mod store;
