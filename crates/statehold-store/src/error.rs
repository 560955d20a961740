//! Error types for the persistent store and its media.
//!
//! - [`MediumError`]: a key-value medium rejected or failed an operation.
//! - [`StoreError`]: what `set`/`update`/`remove` report to the caller.
//! - [`LoadDiagnostic`]: a contained load fault. The store falls back to its
//!   default and keeps the diagnostic for inspection instead of failing.

use thiserror::Error;

/// Failure reported by a [`KeyValueMedium`](crate::KeyValueMedium).
#[derive(Debug, Error)]
pub enum MediumError {
    /// The serialized entry is larger than the medium accepts.
    #[error("entry '{key}' is {size} bytes, medium limit is {limit}")]
    CapacityExceeded {
        key: String,
        size: usize,
        limit: usize,
    },

    /// Underlying storage failure (I/O, database, lock poisoning).
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Failure reported by a [`PersistentStore`](crate::PersistentStore) mutator.
///
/// The in-memory value has already been updated when one of these is
/// returned; it stays the source of truth.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write '{key}' to the medium")]
    WriteFailure {
        key: String,
        #[source]
        source: MediumError,
    },

    #[error("failed to delete '{key}' from the medium")]
    DeleteFailure {
        key: String,
        #[source]
        source: MediumError,
    },

    #[error("failed to serialize value for '{key}'")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a load fell back to the default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadDiagnostic {
    /// A stored entry exists but does not parse as the expected type.
    Malformed { key: String, message: String },
    /// The medium could not be read.
    ReadFailed { key: String, message: String },
}

impl std::fmt::Display for LoadDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed { key, message } => {
                write!(f, "stored entry '{key}' is malformed: {message}")
            }
            Self::ReadFailed { key, message } => {
                write!(f, "could not read entry '{key}': {message}")
            }
        }
    }
}
