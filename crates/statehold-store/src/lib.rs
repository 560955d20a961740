//! Values kept in sync with a persistent key-value medium.
//!
//! - [`PersistentStore`]: one value, one key, explicit load lifecycle and
//!   write-through once loaded.
//! - [`KeyValueMedium`]: the storage seam, with [`MemoryMedium`] for tests
//!   and [`RedbMedium`] for durable state.
//! - [`DarkModeToggle`]: a persisted boolean defaulting to the system theme.
//!
//! Values are encoded as JSON text. No schema is enforced: a stored entry
//! that does not parse as the expected type is treated as missing.

pub mod error;
pub mod medium;
pub mod redb_medium;
pub mod store;
pub mod toggle;

pub use error::{LoadDiagnostic, MediumError, StoreError};
pub use medium::{KeyValueMedium, MemoryMedium};
pub use redb_medium::RedbMedium;
pub use statehold_core::SubscriptionId;
pub use store::{DefaultValue, LoadState, PersistentStore, StoreSnapshot};
pub use toggle::{AmbientPreference, DarkModeToggle, SystemPreference, DEFAULT_DARK_MODE_KEY};
