/// Persisted dark-mode switch.
///
/// A `PersistentStore<bool>` whose default, when nothing is stored, comes
/// from the system's light/dark preference.
use std::sync::Arc;

use crate::error::StoreError;
use crate::medium::KeyValueMedium;
use crate::store::{DefaultValue, LoadState, PersistentStore, StoreSnapshot};
use statehold_core::SubscriptionId;

/// Key the toggle persists under unless configured otherwise.
pub const DEFAULT_DARK_MODE_KEY: &str = "useDarkMode";

/// Source of the fallback dark-mode value.
pub trait AmbientPreference {
    fn prefers_dark(&self) -> bool;
}

impl<F> AmbientPreference for F
where
    F: Fn() -> bool,
{
    fn prefers_dark(&self) -> bool {
        self()
    }
}

/// Asks the OS via `dark-light`. Anything other than an explicit dark
/// answer (light, unspecified, detection error) counts as light.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPreference;

impl AmbientPreference for SystemPreference {
    fn prefers_dark(&self) -> bool {
        match dark_light::detect() {
            Ok(dark_light::Mode::Dark) => true,
            Ok(_) => false,
            Err(e) => {
                tracing::debug!("dark mode detection failed: {e:?}");
                false
            }
        }
    }
}

/// Dark-mode flag that survives restarts.
pub struct DarkModeToggle {
    store: PersistentStore<bool>,
    ambient: Arc<dyn AmbientPreference>,
}

impl std::fmt::Debug for DarkModeToggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DarkModeToggle")
            .field("store", &self.store)
            .finish()
    }
}

impl DarkModeToggle {
    /// Creates an unloaded toggle.
    ///
    /// `explicit_default` wins over the ambient preference; the ambient
    /// preference is only queried if the load finds nothing usable.
    pub fn new(
        key: impl Into<String>,
        explicit_default: Option<bool>,
        ambient: Arc<dyn AmbientPreference>,
        medium: Arc<dyn KeyValueMedium>,
    ) -> Self {
        let default = match explicit_default {
            Some(value) => DefaultValue::Value(value),
            None => {
                let ambient = Arc::clone(&ambient);
                DefaultValue::lazy(move || ambient.prefers_dark())
            }
        };
        Self {
            store: PersistentStore::new(key, default, medium),
            ambient,
        }
    }

    /// Creates a toggle under [`DEFAULT_DARK_MODE_KEY`] backed by the OS
    /// preference, and loads it.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolved default could not be written.
    pub fn open_system(medium: Arc<dyn KeyValueMedium>) -> Result<Self, StoreError> {
        let mut toggle = Self::new(
            DEFAULT_DARK_MODE_KEY,
            None,
            Arc::new(SystemPreference),
            medium,
        );
        toggle.load()?;
        Ok(toggle)
    }

    /// Loads the stored flag (or resolves the default).
    ///
    /// # Errors
    ///
    /// See [`PersistentStore::finish_load`].
    pub fn load(&mut self) -> Result<(), StoreError> {
        self.store.load()?;
        self.refresh()
    }

    /// Whether dark mode is on. An absent value reads as off.
    pub fn enabled(&self) -> bool {
        self.store.value().copied().unwrap_or(false)
    }

    pub fn load_state(&self) -> LoadState {
        self.store.load_state()
    }

    pub fn store(&self) -> &PersistentStore<bool> {
        &self.store
    }

    /// Flips the flag, or sets it to `explicit` when given.
    /// Returns the new value.
    ///
    /// # Errors
    ///
    /// Returns an error if the new value could not be written. The flag
    /// keeps the new value in memory.
    pub fn toggle(&mut self, explicit: Option<bool>) -> Result<bool, StoreError> {
        let next = match explicit {
            Some(value) => value,
            None => !self.enabled(),
        };
        self.store.set(next)?;
        Ok(next)
    }

    /// Forgets the stored choice and falls back to the ambient preference.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be deleted or the ambient
    /// value could not be written.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.remove()?;
        self.refresh()
    }

    /// Re-resolves the ambient preference if the loaded value is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the ambient value could not be written.
    pub fn refresh(&mut self) -> Result<(), StoreError> {
        if self.store.is_ready() && self.store.value().is_none() {
            let prefers_dark = self.ambient.prefers_dark();
            tracing::debug!(prefers_dark, "no dark mode stored, using ambient preference");
            self.store.set(prefers_dark)?;
        }
        Ok(())
    }

    /// Registers a callback for every change of the flag, e.g. to restyle
    /// the UI.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&StoreSnapshot<bool>) + 'static,
    {
        self.store.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}
