//! Host persistence interface.
//!
//! Settings live in a named collection of typed key/value properties. The engine reads and
//! writes them only through [`SettingsStore`], so hosts can back it with a registry hive, a JSON
//! file, or plain memory.

use std::collections::HashMap;
use thiserror::Error;

/// Errors reported by a [`SettingsStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings collection '{0}' does not exist")]
    /// The collection has not been created yet.
    MissingCollection(String),

    #[error("property '{name}' is not a {expected}")]
    /// The stored value has a different type than requested.
    TypeMismatch {
        /// Property name.
        name: String,
        /// The requested type.
        expected: &'static str,
    },

    #[error("I/O error: {0}")]
    /// The backing storage could not be read or written.
    Io(#[from] std::io::Error),

    #[error("settings backend error: {0}")]
    /// Any other backend-specific failure (serialization, access, ...).
    Backend(String),
}

/// A typed key/value settings collection provided by the host.
pub trait SettingsStore {
    /// Returns `true` if `collection` exists.
    fn collection_exists(&self, collection: &str) -> bool;

    /// Create `collection` (no-op if it already exists).
    fn create_collection(&mut self, collection: &str) -> Result<(), StoreError>;

    /// Read a string property. `Ok(None)` means the property is not set.
    fn get_string(&self, collection: &str, name: &str) -> Result<Option<String>, StoreError>;

    /// Read a boolean property. `Ok(None)` means the property is not set.
    fn get_bool(&self, collection: &str, name: &str) -> Result<Option<bool>, StoreError>;

    /// Write a string property.
    fn set_string(&mut self, collection: &str, name: &str, value: &str) -> Result<(), StoreError>;

    /// Write a boolean property.
    fn set_bool(&mut self, collection: &str, name: &str, value: bool) -> Result<(), StoreError>;
}

/// A property value held by [`MemorySettingsStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    /// A string property.
    String(String),
    /// A boolean property.
    Bool(bool),
}

/// In-memory [`SettingsStore`], for tests and hosts without persistent settings.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    collections: HashMap<String, HashMap<String, StoredValue>>,
}

impl MemorySettingsStore {
    /// Create an empty store (no collections).
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a raw property value.
    pub fn value(&self, collection: &str, name: &str) -> Option<&StoredValue> {
        self.collections.get(collection)?.get(name)
    }

    /// Insert a raw property value, creating the collection if needed.
    pub fn insert(&mut self, collection: &str, name: &str, value: StoredValue) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(name.to_string(), value);
    }

    fn collection_mut(
        &mut self,
        collection: &str,
    ) -> Result<&mut HashMap<String, StoredValue>, StoreError> {
        self.collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::MissingCollection(collection.to_string()))
    }
}

impl SettingsStore for MemorySettingsStore {
    fn collection_exists(&self, collection: &str) -> bool {
        self.collections.contains_key(collection)
    }

    fn create_collection(&mut self, collection: &str) -> Result<(), StoreError> {
        self.collections.entry(collection.to_string()).or_default();
        Ok(())
    }

    fn get_string(&self, collection: &str, name: &str) -> Result<Option<String>, StoreError> {
        match self.value(collection, name) {
            None => Ok(None),
            Some(StoredValue::String(value)) => Ok(Some(value.clone())),
            Some(StoredValue::Bool(_)) => Err(StoreError::TypeMismatch {
                name: name.to_string(),
                expected: "string",
            }),
        }
    }

    fn get_bool(&self, collection: &str, name: &str) -> Result<Option<bool>, StoreError> {
        match self.value(collection, name) {
            None => Ok(None),
            Some(StoredValue::Bool(value)) => Ok(Some(*value)),
            Some(StoredValue::String(_)) => Err(StoreError::TypeMismatch {
                name: name.to_string(),
                expected: "bool",
            }),
        }
    }

    fn set_string(&mut self, collection: &str, name: &str, value: &str) -> Result<(), StoreError> {
        self.collection_mut(collection)?
            .insert(name.to_string(), StoredValue::String(value.to_string()));
        Ok(())
    }

    fn set_bool(&mut self, collection: &str, name: &str, value: bool) -> Result<(), StoreError> {
        self.collection_mut(collection)?
            .insert(name.to_string(), StoredValue::Bool(value));
        Ok(())
    }
}
