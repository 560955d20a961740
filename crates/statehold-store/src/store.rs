/// Single value mirrored into a key-value medium.
///
/// A store moves through `Uninitialized → Loading → Ready` exactly once.
/// Until it is `Ready`, mutations only touch memory: nothing is written to
/// or deleted from the medium, and the load result replaces whatever was
/// set in the meantime. Once `Ready`, every mutation is written through.
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use statehold_core::{Subscribers, SubscriptionId};

use crate::error::{LoadDiagnostic, StoreError};
use crate::medium::KeyValueMedium;

/// Load lifecycle of a [`PersistentStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadState {
    Uninitialized,
    Loading,
    Ready,
}

/// Value used when the medium holds no usable entry.
///
/// `Lazy` is only evaluated if the load actually needs it.
pub enum DefaultValue<T> {
    Value(T),
    Lazy(Box<dyn FnOnce() -> T>),
}

impl<T> DefaultValue<T> {
    pub fn lazy<F>(f: F) -> Self
    where
        F: FnOnce() -> T + 'static,
    {
        Self::Lazy(Box::new(f))
    }

    fn resolve(self) -> T {
        match self {
            Self::Value(v) => v,
            Self::Lazy(f) => f(),
        }
    }
}

impl<T> From<T> for DefaultValue<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for DefaultValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// State passed to subscribers after each change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot<T> {
    pub value: Option<T>,
    pub load_state: LoadState,
}

/// A value kept in sync with one entry of a [`KeyValueMedium`].
pub struct PersistentStore<T> {
    key: String,
    value: Option<T>,
    load_state: LoadState,
    /// Taken by the load; `None` afterwards.
    default: Option<DefaultValue<T>>,
    medium: Arc<dyn KeyValueMedium>,
    diagnostic: Option<LoadDiagnostic>,
    subscribers: Subscribers<StoreSnapshot<T>>,
}

impl<T> std::fmt::Debug for PersistentStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStore")
            .field("key", &self.key)
            .field("has_value", &self.value.is_some())
            .field("load_state", &self.load_state)
            .field("diagnostic", &self.diagnostic)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<T> PersistentStore<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Creates an unloaded store for `key`.
    ///
    /// Nothing is read until [`begin_load`](Self::begin_load) /
    /// [`finish_load`](Self::finish_load) or [`load`](Self::load).
    pub fn new(
        key: impl Into<String>,
        default: impl Into<DefaultValue<T>>,
        medium: Arc<dyn KeyValueMedium>,
    ) -> Self {
        Self {
            key: key.into(),
            value: None,
            load_state: LoadState::Uninitialized,
            default: Some(default.into()),
            medium,
            diagnostic: None,
            subscribers: Subscribers::new(),
        }
    }

    /// Creates a store and loads it in the same turn.
    ///
    /// # Errors
    ///
    /// Returns an error if the default could not be written through.
    /// The store is `Ready` either way.
    pub fn open(
        key: impl Into<String>,
        default: impl Into<DefaultValue<T>>,
        medium: Arc<dyn KeyValueMedium>,
    ) -> Result<Self, StoreError> {
        let mut store = Self::new(key, default, medium);
        store.load()?;
        Ok(store)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current value and load state.
    pub fn get(&self) -> (Option<&T>, LoadState) {
        (self.value.as_ref(), self.load_state)
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn is_ready(&self) -> bool {
        self.load_state == LoadState::Ready
    }

    /// Why the last load fell back to the default, if it did.
    pub fn load_diagnostic(&self) -> Option<&LoadDiagnostic> {
        self.diagnostic.as_ref()
    }

    pub fn snapshot(&self) -> StoreSnapshot<T> {
        StoreSnapshot {
            value: self.value.clone(),
            load_state: self.load_state,
        }
    }

    /// Marks the store as loading. Only valid from `Uninitialized`;
    /// otherwise a no-op.
    pub fn begin_load(&mut self) {
        if self.load_state != LoadState::Uninitialized {
            return;
        }
        tracing::debug!(key = %self.key, "loading persisted value");
        self.load_state = LoadState::Loading;
        self.notify();
    }

    /// Reads the medium and makes the store `Ready`.
    ///
    /// A stored entry that parses becomes the value. With no entry, the
    /// default is resolved and written through. A malformed entry falls back
    /// to the default, which replaces the broken text on the medium. A read
    /// failure also falls back to the default but leaves the medium alone,
    /// since the entry it could not read may still be valid. Both cases are
    /// recorded as a [`LoadDiagnostic`]. Whatever was set before this call
    /// is discarded. Calling this on a `Ready` store does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the default through fails.
    pub fn finish_load(&mut self) -> Result<(), StoreError> {
        match self.load_state {
            LoadState::Ready => return Ok(()),
            LoadState::Uninitialized => self.begin_load(),
            LoadState::Loading => {}
        }

        if self.value.is_some() {
            tracing::debug!(key = %self.key, "discarding value set before load completed");
        }

        let mut write_default = false;
        self.value = match self.medium.read_entry(&self.key) {
            Ok(Some(text)) => match serde_json::from_str::<T>(&text) {
                Ok(stored) => Some(stored),
                Err(e) => {
                    tracing::warn!("Stored entry '{}' is malformed, using default: {e}", self.key);
                    self.diagnostic = Some(LoadDiagnostic::Malformed {
                        key: self.key.clone(),
                        message: e.to_string(),
                    });
                    write_default = true;
                    self.take_default()
                }
            },
            Ok(None) => {
                write_default = true;
                self.take_default()
            }
            Err(e) => {
                tracing::warn!("Failed to read entry '{}', using default: {e}", self.key);
                self.diagnostic = Some(LoadDiagnostic::ReadFailed {
                    key: self.key.clone(),
                    message: e.to_string(),
                });
                self.take_default()
            }
        };
        self.default = None;
        self.load_state = LoadState::Ready;
        tracing::debug!(key = %self.key, "persisted value ready");

        let result = if write_default {
            self.write_through()
        } else {
            Ok(())
        };
        self.notify();
        result
    }

    /// `begin_load` followed by `finish_load` in one turn.
    ///
    /// # Errors
    ///
    /// See [`finish_load`](Self::finish_load).
    pub fn load(&mut self) -> Result<(), StoreError> {
        self.begin_load();
        self.finish_load()
    }

    /// Replaces the value, writing it through once the store is `Ready`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the medium write fails. The new
    /// value is kept in memory regardless.
    pub fn set(&mut self, value: T) -> Result<(), StoreError> {
        self.value = Some(value);
        let result = if self.is_ready() {
            self.write_through()
        } else {
            tracing::debug!(key = %self.key, "value set before load, not written");
            Ok(())
        };
        self.notify();
        result
    }

    /// Computes the new value from the current one, then behaves like `set`.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub fn update<F>(&mut self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(Option<&T>) -> T,
    {
        let next = f(self.value.as_ref());
        self.set(next)
    }

    /// Clears the value and, once `Ready`, deletes the medium entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium rejects the deletion. The value is
    /// cleared in memory regardless.
    pub fn remove(&mut self) -> Result<(), StoreError> {
        self.value = None;
        let result = if self.is_ready() {
            self.medium
                .delete_entry(&self.key)
                .map_err(|source| {
                    tracing::warn!("Failed to delete entry '{}': {source}", self.key);
                    StoreError::DeleteFailure {
                        key: self.key.clone(),
                        source,
                    }
                })
        } else {
            Ok(())
        };
        self.notify();
        result
    }

    /// Registers a callback invoked after every mutation and lifecycle step.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&StoreSnapshot<T>) + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn take_default(&mut self) -> Option<T> {
        self.default.take().map(DefaultValue::resolve)
    }

    fn write_through(&self) -> Result<(), StoreError> {
        let Some(value) = &self.value else {
            return Ok(());
        };
        let text = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: self.key.clone(),
            source,
        })?;
        self.medium
            .write_entry(&self.key, &text)
            .map_err(|source| {
                tracing::warn!("Failed to write entry '{}': {source}", self.key);
                StoreError::WriteFailure {
                    key: self.key.clone(),
                    source,
                }
            })
    }

    fn notify(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        self.subscribers.notify(&snapshot);
    }
}
