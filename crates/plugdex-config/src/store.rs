//! The durable settings store.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::loader::{load_values, save_values};
use crate::{
    CONFIG_DELIMITER, ConfigError, ConfigResult, check_value, default_keys, default_value,
    value_type_name,
};

/// Flat key-value store backing every setting.
///
/// Keys are `/`-delimited paths, values are JSON-compatible. Keys without a
/// stored value fall back to the built-in defaults. When the store is bound
/// to a file, every successful write or removal is persisted immediately.
#[derive(Debug, Default)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, Value>,
}

impl ConfigStore {
    /// Creates an in-memory store holding only the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store bound to a settings file.
    ///
    /// The file does not need to exist yet; it is created on the first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        let values = load_values(&path)?;
        debug!(path = %path.display(), entries = values.len(), "opened settings store");
        Ok(Self {
            path: Some(path),
            values,
        })
    }

    /// Returns the settings file path, if the store is file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes the stored values to the settings file.
    ///
    /// Does nothing for in-memory stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the values cannot be serialized or written.
    pub fn save(&self) -> ConfigResult<()> {
        match &self.path {
            Some(path) => save_values(path, &self.values),
            None => Ok(()),
        }
    }

    /// Reads a value, falling back to the key's default.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed or has neither a stored value
    /// nor a default.
    pub fn read(&self, key: &str) -> ConfigResult<Value> {
        validate_key(key)?;
        self.lookup(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
    }

    /// Reads a value, returning `default` if the key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed.
    pub fn get(&self, key: &str, default: Value) -> ConfigResult<Value> {
        validate_key(key)?;
        Ok(self.lookup(key).unwrap_or(default))
    }

    /// Returns `true` if the key has a stored value or a default.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key) || default_value(key).is_some()
    }

    /// Stores a value.
    ///
    /// The value must be JSON-compatible, and if the key already has a value
    /// (stored or default) the new one must have the same JSON type.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or value is invalid, or if persisting fails.
    pub fn write(&mut self, key: &str, value: Value) -> ConfigResult<()> {
        validate_key(key)?;

        if !check_value(&value) {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                reason: "value must be JSON-compatible and must not contain nulls",
            });
        }

        if let Some(existing) = self.lookup(key) {
            let expected = value_type_name(&existing);
            let actual = value_type_name(&value);
            if expected != actual {
                return Err(ConfigError::TypeMismatch {
                    key: key.to_string(),
                    expected,
                    actual,
                });
            }
        }

        debug!(key, "writing setting");
        let previous = self.values.insert(key.to_string(), value);
        if let Err(err) = self.save() {
            match previous {
                Some(previous) => self.values.insert(key.to_string(), previous),
                None => self.values.remove(key),
            };
            return Err(err);
        }

        Ok(())
    }

    /// Removes a stored value, returning it.
    ///
    /// A default for the key, if any, becomes visible again.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed or persisting fails.
    pub fn remove(&mut self, key: &str) -> ConfigResult<Option<Value>> {
        validate_key(key)?;

        let Some(removed) = self.values.remove(key) else {
            return Ok(None);
        };

        debug!(key, "removed setting");
        if let Err(err) = self.save() {
            self.values.insert(key.to_string(), removed);
            return Err(err);
        }

        Ok(Some(removed))
    }

    /// Returns every known key, stored or defaulted, in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: BTreeSet<String> = self.values.keys().cloned().collect();
        keys.extend(default_keys().iter().map(|k| (*k).to_string()));
        keys.into_iter().collect()
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned().or_else(|| default_value(key))
    }
}

pub(crate) fn validate_key(key: &str) -> ConfigResult<()> {
    if key.is_empty() {
        return Err(ConfigError::InvalidKey {
            key: key.to_string(),
            reason: "key must not be empty",
        });
    }
    if key.split(CONFIG_DELIMITER).any(str::is_empty) {
        return Err(ConfigError::InvalidKey {
            key: key.to_string(),
            reason: "key must not contain empty segments",
        });
    }
    Ok(())
}
