//! Persistent visualization parameters.
//!
//! A [`PersistentValue`] carries a stable key of the form
//! `"<type name>#<instance name>#<field>"`. Values the user changed are written
//! to a [`PersistentCache`] and restored when a structure with the same type
//! and name is registered again, possibly in a later session.

use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A length-like value that is either absolute or relative to a length scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaledValue<T> {
    value: T,
    relative: bool,
}

impl<T: Copy + std::ops::Mul<f32, Output = T>> ScaledValue<T> {
    /// A value interpreted relative to the owning structure's length scale.
    pub fn relative(value: T) -> Self {
        Self {
            value,
            relative: true,
        }
    }

    /// A value interpreted in world units.
    pub fn absolute(value: T) -> Self {
        Self {
            value,
            relative: false,
        }
    }

    /// Creates a value with an explicit relative flag.
    pub fn new(value: T, relative: bool) -> Self {
        Self { value, relative }
    }

    /// Resolves to world units against the length scale current at query time.
    pub fn as_absolute(&self, length_scale: f32) -> T {
        if self.relative {
            self.value * length_scale
        } else {
            self.value
        }
    }

    /// The stored raw value.
    pub fn raw(&self) -> T {
        self.value
    }

    /// Whether the stored value is relative.
    pub fn is_relative(&self) -> bool {
        self.relative
    }
}

/// Key/value store of persisted parameters, serialized as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistentCache {
    values: HashMap<String, serde_json::Value>,
}

impl PersistentCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up and deserializes a value.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.values.get(key)?;
        match serde_json::from_value(raw.clone()) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("ignoring persisted value '{key}': {err}");
                None
            }
        }
    }

    /// Serializes and stores a value.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        self.values
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Returns true if the key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes every key starting with `prefix`.
    pub fn remove_prefix(&mut self, prefix: &str) {
        self.values.retain(|key, _| !key.starts_with(prefix));
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Writes the cache to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Reads a cache from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// A visualization parameter with a stable persisted identity.
#[derive(Debug, Clone)]
pub struct PersistentValue<T> {
    key: String,
    value: T,
    manually_changed: bool,
}

impl<T: Clone + Serialize + DeserializeOwned> PersistentValue<T> {
    /// Creates a value holding `default` under `key`.
    pub fn new(key: impl Into<String>, default: T) -> Self {
        Self {
            key: key.into(),
            value: default,
            manually_changed: false,
        }
    }

    /// The persisted key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Sets the value and marks it for persistence.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.manually_changed = true;
    }

    /// Replaces the default without marking the value as user-changed.
    pub fn set_default(&mut self, value: T) {
        if !self.manually_changed {
            self.value = value;
        }
    }

    /// Whether the value was set explicitly.
    pub fn is_manually_changed(&self) -> bool {
        self.manually_changed
    }

    /// Restores the value from the cache if the key is present.
    pub fn load_from(&mut self, cache: &PersistentCache) {
        if let Some(value) = cache.get(&self.key) {
            self.value = value;
            self.manually_changed = true;
        }
    }

    /// Writes the value to the cache if it was explicitly set.
    pub fn save_to(&self, cache: &mut PersistentCache) {
        if !self.manually_changed {
            return;
        }
        if let Err(err) = cache.set(&self.key, &self.value) {
            log::warn!("failed to persist '{}': {err}", self.key);
        }
    }
}
