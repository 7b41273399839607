//! JSON settings file.
//!
//! The file holds one object per collection:
//!
//! ```json
//! {
//!   "BlackSpace": {
//!     "SpacesBackgroundColor": "160, 43, 0, 149",
//!     "DeleteWhiteSpaceWhenSaving": false
//!   }
//! }
//! ```
//!
//! Every write rewrites the whole file.

use blackspace_core::{SettingsStore, StoreError};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A [`SettingsStore`] persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
    collections: Map<String, Value>,
}

impl JsonSettingsStore {
    /// Open the store at `path`.
    ///
    /// A missing or malformed file is an empty store; the file is (re)written on first write.
    /// Only I/O failures other than a missing file are errors.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let collections = match fs::read_to_string(&path) {
            Ok(contents) => parse(&contents).unwrap_or_else(|err| {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "malformed settings file, using defaults"
                );
                Map::new()
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(
            path = %path.display(),
            collections = collections.len(),
            "opened settings file"
        );
        Ok(Self { path, collections })
    }

    /// Location of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn value(&self, collection: &str, name: &str) -> Option<&Value> {
        self.collections.get(collection)?.get(name)
    }

    fn set(&mut self, collection: &str, name: &str, value: Value) -> Result<(), StoreError> {
        let Some(Value::Object(properties)) = self.collections.get_mut(collection) else {
            return Err(StoreError::MissingCollection(collection.to_string()));
        };
        properties.insert(name.to_string(), value);
        self.save()
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.collections)
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

fn parse(contents: &str) -> Result<Map<String, Value>, StoreError> {
    if contents.trim().is_empty() {
        return Ok(Map::new());
    }
    let root: Value =
        serde_json::from_str(contents).map_err(|err| StoreError::Backend(err.to_string()))?;
    let Value::Object(collections) = root else {
        return Err(StoreError::Backend(
            "settings file must contain a JSON object".to_string(),
        ));
    };
    if let Some((name, _)) = collections.iter().find(|(_, value)| !value.is_object()) {
        return Err(StoreError::Backend(format!(
            "settings collection '{name}' is not a JSON object"
        )));
    }
    Ok(collections)
}

impl SettingsStore for JsonSettingsStore {
    fn collection_exists(&self, collection: &str) -> bool {
        self.collections.contains_key(collection)
    }

    fn create_collection(&mut self, collection: &str) -> Result<(), StoreError> {
        if self.collection_exists(collection) {
            return Ok(());
        }
        self.collections
            .insert(collection.to_string(), Value::Object(Map::new()));
        self.save()
    }

    fn get_string(&self, collection: &str, name: &str) -> Result<Option<String>, StoreError> {
        match self.value(collection, name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            // Hand-edited files may hold thicknesses as plain numbers.
            Some(Value::Number(value)) => Ok(Some(value.to_string())),
            Some(_) => Err(StoreError::TypeMismatch {
                name: name.to_string(),
                expected: "string",
            }),
        }
    }

    fn get_bool(&self, collection: &str, name: &str) -> Result<Option<bool>, StoreError> {
        match self.value(collection, name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(*value)),
            Some(_) => Err(StoreError::TypeMismatch {
                name: name.to_string(),
                expected: "bool",
            }),
        }
    }

    fn set_string(&mut self, collection: &str, name: &str, value: &str) -> Result<(), StoreError> {
        self.set(collection, name, Value::String(value.to_string()))
    }

    fn set_bool(&mut self, collection: &str, name: &str, value: bool) -> Result<(), StoreError> {
        self.set(collection, name, Value::Bool(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = JsonSettingsStore::open(dir.path().join("settings.json")).unwrap();
        assert!(!store.collection_exists("BlackSpace"));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_writes_go_to_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut store = JsonSettingsStore::open(&path).unwrap();
        store.create_collection("BlackSpace").unwrap();
        store.set_string("BlackSpace", "Color", "1, 2, 3").unwrap();
        store.set_bool("BlackSpace", "Flag", true).unwrap();

        let reopened = JsonSettingsStore::open(&path).unwrap();
        assert_eq!(
            reopened.get_string("BlackSpace", "Color").unwrap().as_deref(),
            Some("1, 2, 3")
        );
        assert_eq!(reopened.get_bool("BlackSpace", "Flag").unwrap(), Some(true));
    }

    #[test]
    fn test_set_without_collection_fails() {
        let dir = tempdir().unwrap();
        let mut store = JsonSettingsStore::open(dir.path().join("s.json")).unwrap();
        assert!(matches!(
            store.set_bool("BlackSpace", "Flag", true),
            Err(StoreError::MissingCollection(_))
        ));
    }

    #[test]
    fn test_type_mismatch_and_numbers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, r#"{"BlackSpace": {"Flag": "yes", "Thickness": 2.5}}"#).unwrap();

        let store = JsonSettingsStore::open(&path).unwrap();
        assert!(matches!(
            store.get_bool("BlackSpace", "Flag"),
            Err(StoreError::TypeMismatch { .. })
        ));
        assert_eq!(
            store.get_string("BlackSpace", "Thickness").unwrap().as_deref(),
            Some("2.5")
        );
    }

    #[test]
    fn test_malformed_file_opens_empty() {
        let dir = tempdir().unwrap();
        for (name, contents) in [
            ("array.json", "[1, 2]"),
            ("broken.json", "{ not json"),
            ("scalar.json", r#"{"BlackSpace": 3}"#),
        ] {
            let path = dir.path().join(name);
            fs::write(&path, contents).unwrap();
            let store = JsonSettingsStore::open(&path).unwrap();
            assert!(!store.collection_exists("BlackSpace"), "{name}");
        }
    }

    #[test]
    fn test_malformed_file_is_replaced_on_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, "{ not json").unwrap();

        let mut store = JsonSettingsStore::open(&path).unwrap();
        store.create_collection("BlackSpace").unwrap();
        store.set_bool("BlackSpace", "Flag", true).unwrap();

        let reopened = JsonSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get_bool("BlackSpace", "Flag").unwrap(), Some(true));
    }
}
