/// Key-value media a [`PersistentStore`](crate::PersistentStore) mirrors into.
///
/// Entries are plain strings; the store owns serialization. A medium is a
/// shared resource: several stores may hold the same `Arc` and address
/// different keys (or the same key, in which case the last write wins).
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::MediumError;

/// Synchronous string key-value storage.
pub trait KeyValueMedium {
    /// Returns the stored text for `key`, or `None` if there is no entry.
    fn read_entry(&self, key: &str) -> Result<Option<String>, MediumError>;

    /// Stores `serialized` under `key`, replacing any existing entry.
    fn write_entry(&self, key: &str, serialized: &str) -> Result<(), MediumError>;

    /// Removes the entry for `key`. Removing a missing entry is not an error.
    fn delete_entry(&self, key: &str) -> Result<(), MediumError>;
}

/// In-memory medium, mainly for tests and ephemeral state.
///
/// An optional per-entry byte limit makes writes fail the way a full
/// browser-style storage quota would.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    entries: Mutex<BTreeMap<String, String>>,
    max_entry_bytes: Option<usize>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a medium that rejects entries larger than `limit` bytes.
    pub fn with_entry_limit(limit: usize) -> Self {
        Self {
            entries: Mutex::default(),
            max_entry_bytes: Some(limit),
        }
    }

    /// Returns all stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        match self.entries.lock() {
            Ok(entries) => entries.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, MediumError> {
        self.entries
            .lock()
            .map_err(|_| MediumError::Backend(anyhow::anyhow!("memory medium lock poisoned")))
    }
}

impl KeyValueMedium for MemoryMedium {
    fn read_entry(&self, key: &str) -> Result<Option<String>, MediumError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write_entry(&self, key: &str, serialized: &str) -> Result<(), MediumError> {
        if let Some(limit) = self.max_entry_bytes {
            if serialized.len() > limit {
                return Err(MediumError::CapacityExceeded {
                    key: key.to_string(),
                    size: serialized.len(),
                    limit,
                });
            }
        }
        self.lock()?.insert(key.to_string(), serialized.to_string());
        Ok(())
    }

    fn delete_entry(&self, key: &str) -> Result<(), MediumError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_entry() {
        let medium = MemoryMedium::new();
        assert!(medium.read_entry("nope").expect("read").is_none());
    }

    #[test]
    fn test_write_read_delete() {
        let medium = MemoryMedium::new();
        medium.write_entry("k", "true").expect("write");
        assert_eq!(medium.read_entry("k").expect("read").as_deref(), Some("true"));

        medium.delete_entry("k").expect("delete");
        assert!(medium.read_entry("k").expect("read").is_none());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let medium = MemoryMedium::new();
        medium.delete_entry("ghost").expect("delete");
    }

    #[test]
    fn test_overwrite() {
        let medium = MemoryMedium::new();
        medium.write_entry("k", "1").expect("write");
        medium.write_entry("k", "2").expect("overwrite");
        assert_eq!(medium.read_entry("k").expect("read").as_deref(), Some("2"));
        assert_eq!(medium.len(), 1);
    }

    #[test]
    fn test_entry_limit_rejects_large_values() {
        let medium = MemoryMedium::with_entry_limit(4);
        medium.write_entry("small", "1234").expect("at limit");

        let err = medium.write_entry("big", "12345").unwrap_err();
        match err {
            MediumError::CapacityExceeded { key, size, limit } => {
                assert_eq!(key, "big");
                assert_eq!(size, 5);
                assert_eq!(limit, 4);
            }
            other => panic!("expected CapacityExceeded, got {other:?}"),
        }
        assert!(medium.read_entry("big").expect("read").is_none());
    }

    #[test]
    fn test_keys_sorted() {
        let medium = MemoryMedium::new();
        medium.write_entry("b", "1").expect("write");
        medium.write_entry("a", "1").expect("write");
        assert_eq!(medium.keys(), vec!["a", "b"]);
    }
}
