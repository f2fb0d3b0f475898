//! Typed accessors for the persisted theme and recent-files list.
//!
//! `Preferences` reports every failure to its caller. `PreferenceStore` wraps it
//! for UI code: failures are logged and replaced with a safe default, so a
//! broken preferences file never takes the application down.

use crate::constant::{MAX_RECENT_FILES, RECENT_FILES_KEY, THEME_KEY};
use crate::recent;
use crate::store::{KeyValueStore, StoreError};
use crate::theme::Theme;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("Failed to read preference '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to write preference '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: StoreError,
    },
}

impl PreferenceError {
    fn read(key: &str, source: impl Into<StoreError>) -> Self {
        Self::Read {
            key: key.to_string(),
            source: source.into(),
        }
    }

    fn write(key: &str, source: impl Into<StoreError>) -> Self {
        Self::Write {
            key: key.to_string(),
            source: source.into(),
        }
    }
}

/// Preference accessors that surface store failures
pub struct Preferences<S> {
    store: S,
    /// Held across the read-modify-write of the recent-files list
    mutation_lock: Mutex<()>,
}

impl<S> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            mutation_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: KeyValueStore> Preferences<S> {
    /// `Ok(None)` when the key is unset or explicitly null
    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PreferenceError> {
        match self.store.get(key) {
            Ok(None) | Ok(Some(Value::Null)) => Ok(None),
            Ok(Some(value)) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| PreferenceError::read(key, e)),
            Err(e) => Err(PreferenceError::read(key, e)),
        }
    }

    /// Stage `value` under `key` and flush the store
    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PreferenceError> {
        let value = serde_json::to_value(value).map_err(|e| PreferenceError::write(key, e))?;
        self.store
            .set(key, value)
            .map_err(|e| PreferenceError::write(key, e))?;
        self.store.save().map_err(|e| PreferenceError::write(key, e))
    }

    pub fn theme(&self) -> Result<Option<Theme>, PreferenceError> {
        self.read(THEME_KEY)
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), PreferenceError> {
        self.write(THEME_KEY, &theme)
    }

    /// Most recent first; empty when nothing has been recorded yet
    pub fn recent_files(&self) -> Result<Vec<String>, PreferenceError> {
        Ok(self.read(RECENT_FILES_KEY)?.unwrap_or_default())
    }

    /// Move `path` to the front of the recent-files list and persist the whole
    /// list. An unreadable list is replaced rather than reported, so the new
    /// entry is always recorded.
    ///
    /// Returns the list as written.
    pub fn add_recent_file(&self, path: &str) -> Result<Vec<String>, PreferenceError> {
        let _guard = self
            .mutation_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let files = self.recent_files().unwrap_or_else(|e| {
            warn!("{}, starting a new recent files list", e);
            Vec::new()
        });
        let files = recent::promote(files, path, MAX_RECENT_FILES);
        self.write(RECENT_FILES_KEY, &files)?;
        Ok(files)
    }
}

/// Preference accessors that never fail.
///
/// Reads fall back to `None` or an empty list, writes are best effort. Every
/// failure is logged where it happens.
pub struct PreferenceStore<S> {
    preferences: Preferences<S>,
}

impl<S> PreferenceStore<S> {
    pub fn new(store: S) -> Self {
        Self::from_preferences(Preferences::new(store))
    }

    pub fn from_preferences(preferences: Preferences<S>) -> Self {
        Self { preferences }
    }

    /// The underlying accessors, for callers that need to see failures
    pub fn strict(&self) -> &Preferences<S> {
        &self.preferences
    }

    pub fn into_inner(self) -> S {
        self.preferences.into_inner()
    }
}

impl<S: KeyValueStore> PreferenceStore<S> {
    pub fn theme(&self) -> Option<Theme> {
        self.preferences.theme().unwrap_or_else(|e| {
            error!("{}", e);
            None
        })
    }

    pub fn set_theme(&self, theme: Theme) {
        if let Err(e) = self.preferences.set_theme(theme) {
            error!("{}", e);
        }
    }

    pub fn recent_files(&self) -> Vec<String> {
        self.preferences.recent_files().unwrap_or_else(|e| {
            error!("{}", e);
            Vec::new()
        })
    }

    pub fn add_recent_file(&self, path: &str) {
        if let Err(e) = self.preferences.add_recent_file(path) {
            error!("{}", e);
        }
    }
}
