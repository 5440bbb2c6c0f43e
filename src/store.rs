//! Key/value persistence for tour progress and audio preferences.
//!
//! Values are stored as strings under `<prefix>.<key>` so several tours can
//! share one backing store. The browser build implements [`ProgressStore`]
//! over `localStorage`; tests and native hosts use [`MemoryStore`].
//!
//! Reads never fail. A missing or unparseable value is treated as absent and
//! the caller falls back to defaults.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::HashMap;
use std::str::FromStr;

use crate::consts::{KEY_ACTIVE_ORDINAL, KEY_AUDIO_ON, KEY_COMPLETE, KEY_NARRATION_TIME, KEY_PENDING_ADVANCE};
use crate::error::TourError;
use crate::narration::AudioPreference;
use crate::tour::Progress;

/// String key/value storage that survives page navigation.
pub trait ProgressStore {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns [`TourError::Storage`] when the backing store rejects the write.
    fn set(&mut self, key: &str, value: &str) -> Result<(), TourError>;
}

/// In-process store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ProgressStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), TourError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: ProgressStore + ?Sized> ProgressStore for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), TourError> {
        (**self).set(key, value)
    }
}

/// Full storage key for `suffix` under `prefix` (e.g. `tour.activeOrdinal`).
#[must_use]
pub fn storage_key(prefix: &str, suffix: &str) -> String {
    format!("{prefix}.{suffix}")
}

/// Read persisted progress. `None` when no ordinal was stored or the stored
/// ordinal is not an integer.
///
/// Range checking is left to [`crate::tour::TourState::initialize`], which
/// knows the tour length.
pub fn load_progress<S: ProgressStore + ?Sized>(store: &S, prefix: &str) -> Option<Progress> {
    let active_ordinal = read::<S, i64>(store, prefix, KEY_ACTIVE_ORDINAL)?;
    Some(Progress {
        active_ordinal,
        complete: read(store, prefix, KEY_COMPLETE).unwrap_or(false),
        pending_advance: read(store, prefix, KEY_PENDING_ADVANCE).unwrap_or(false),
    })
}

/// Write every progress field.
///
/// # Errors
///
/// Returns the first [`TourError::Storage`] reported by the store.
pub fn save_progress<S: ProgressStore + ?Sized>(store: &mut S, prefix: &str, progress: &Progress) -> Result<(), TourError> {
    store.set(&storage_key(prefix, KEY_ACTIVE_ORDINAL), &progress.active_ordinal.to_string())?;
    store.set(&storage_key(prefix, KEY_COMPLETE), bool_str(progress.complete))?;
    store.set(&storage_key(prefix, KEY_PENDING_ADVANCE), bool_str(progress.pending_advance))?;
    Ok(())
}

/// Read the audio preference, defaulting to audio on from the start.
pub fn load_audio_preference<S: ProgressStore + ?Sized>(store: &S, prefix: &str) -> AudioPreference {
    let defaults = AudioPreference::default();
    AudioPreference {
        enabled: read(store, prefix, KEY_AUDIO_ON).unwrap_or(defaults.enabled),
        resume_at_secs: read::<S, f64>(store, prefix, KEY_NARRATION_TIME)
            .filter(|t| t.is_finite() && *t >= 0.0)
            .unwrap_or(defaults.resume_at_secs),
    }
}

/// # Errors
///
/// Returns the first [`TourError::Storage`] reported by the store.
pub fn save_audio_preference<S: ProgressStore + ?Sized>(
    store: &mut S,
    prefix: &str,
    preference: &AudioPreference,
) -> Result<(), TourError> {
    store.set(&storage_key(prefix, KEY_AUDIO_ON), bool_str(preference.enabled))?;
    store.set(&storage_key(prefix, KEY_NARRATION_TIME), &preference.resume_at_secs.to_string())?;
    Ok(())
}

fn read<S: ProgressStore + ?Sized, T: FromStr>(store: &S, prefix: &str, suffix: &str) -> Option<T> {
    let key = storage_key(prefix, suffix);
    let raw = store.get(&key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("ignoring unparseable stored value {key}={raw:?}");
            None
        }
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
