//! The typed store: a schema-validated view over a string key-value backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::{StoreError, StringStore, Validator};

/// Fixed mapping from logical key name to that key's validator.
///
/// Built once, then handed to [`TypedStore::new`]; immutable for the
/// lifetime of the store. Both the write path and the read path resolve
/// through the same validator instance per key, so normalization and
/// re-validation cannot drift.
#[derive(Default)]
pub struct SchemaMap {
    entries: BTreeMap<String, Arc<dyn Validator>>,
}

impl SchemaMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `key` with its validator. Redeclaring a key replaces the
    /// previous validator.
    pub fn with<S, V>(mut self, key: S, validator: V) -> Self
    where
        S: Into<String>,
        V: Validator + 'static,
    {
        self.entries.insert(key.into(), Arc::new(validator));
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn validator(&self, key: &str) -> Result<&Arc<dyn Validator>, StoreError> {
        self.entries
            .get(key)
            .ok_or_else(|| StoreError::UndeclaredKey(key.to_string()))
    }
}

/// Schema-validated wrapper around a [`StringStore`] backend.
///
/// Operates only on the keys declared in its [`SchemaMap`]; everything else
/// in the backend's namespace is left untouched. Holds no cache and no other
/// mutable state: every operation round-trips through the backend
/// immediately.
///
/// Reads degrade rather than crash: a stored value that no longer parses or
/// no longer conforms to its schema is reported as absent and logged, never
/// raised. Writes fail fast: a non-conforming value is a caller bug and is
/// rejected before anything touches the backend.
pub struct TypedStore<S: StringStore> {
    backend: S,
    schemas: SchemaMap,
}

impl<S: StringStore> TypedStore<S> {
    /// Bind `schemas` over `backend`. Performs no I/O.
    pub fn new(backend: S, schemas: SchemaMap) -> Self {
        Self { backend, schemas }
    }

    /// Validate `value` against `key`'s schema and store its normalized form
    /// as compact JSON. Nothing is written when validation fails.
    pub fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let validator = self.schemas.validator(key)?;
        let normalized = validator.parse(value).map_err(|source| StoreError::Validation {
            key: key.to_string(),
            source,
        })?;
        let raw = serde_json::to_string(&normalized).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.backend.set(key, &raw)
    }

    /// Read `key`, returning `None` when it is absent — or when the stored
    /// text is malformed or fails the schema, in which case the failure is
    /// logged and swallowed. Any `Some(v)` conforms to `key`'s validator.
    pub fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let validator = self.schemas.validator(key)?;
        let Some(raw) = self.backend.get(key)? else {
            return Ok(None);
        };
        let decoded: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(err) => {
                error!(key, %err, "stored value is not valid JSON; treating key as absent");
                return Ok(None);
            }
        };
        match validator.parse(&decoded) {
            Ok(normalized) => Ok(Some(normalized)),
            Err(err) => {
                error!(key, %err, "stored value failed schema validation; treating key as absent");
                Ok(None)
            }
        }
    }

    /// Delete `key`'s entry; no-op when absent.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.schemas.validator(key)?;
        self.backend.remove(key)
    }

    /// Remove every declared key, leaving undeclared backend entries alone.
    pub fn clear(&self) -> Result<(), StoreError> {
        for key in self.schemas.keys() {
            self.backend.remove(key)?;
        }
        Ok(())
    }

    /// Typed variant of [`set`](Self::set): serialize `value` to JSON first.
    pub fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.set(key, &value)
    }

    /// Typed variant of [`get`](Self::get): convert the validated value into
    /// `T`. A conversion failure means the call-site type disagrees with the
    /// declared schema and is surfaced as an error, unlike storage
    /// corruption.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(value) => {
                let typed =
                    serde_json::from_value(value).map_err(|source| StoreError::Decode {
                        key: key.to_string(),
                        source,
                    })?;
                Ok(Some(typed))
            }
            None => Ok(None),
        }
    }
}
