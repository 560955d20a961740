/// Durable medium backed by redb.
///
/// Uses a single redb database file with one table:
/// - `entries`: store key → serialized (JSON) value, stored as raw `&str`
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::error::MediumError;
use crate::medium::KeyValueMedium;

/// Entries table: key → serialized value text.
const ENTRIES: TableDefinition<&str, &str> = TableDefinition::new("entries");

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "statehold.redb";

/// Persistent key-value medium stored in a redb database file.
///
/// redb supports concurrent readers and serialized writers, so one
/// `Arc<RedbMedium>` can be shared by every store in the process.
pub struct RedbMedium {
    db: Database,
    max_entry_bytes: Option<usize>,
}

impl std::fmt::Debug for RedbMedium {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbMedium")
            .field("max_entry_bytes", &self.max_entry_bytes)
            .finish()
    }
}

impl RedbMedium {
    /// Returns the database path inside `data_dir`.
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join(DATABASE_FILE)
    }

    /// Opens or creates the database in `data_dir`.
    ///
    /// Creates the directory and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened.
    pub fn open_dir(data_dir: &Path, max_entry_bytes: Option<usize>) -> Result<Arc<Self>> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        Self::open(&Self::path_in(data_dir), max_entry_bytes)
    }

    /// Opens or creates the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the entries
    /// table cannot be created.
    pub fn open(path: &Path, max_entry_bytes: Option<usize>) -> Result<Arc<Self>> {
        let db = Database::create(path)
            .with_context(|| format!("Failed to open state database: {}", path.display()))?;

        // Ensure the table exists
        let write_txn = db
            .begin_write()
            .context("Failed to begin initial write transaction")?;
        {
            let _ = write_txn
                .open_table(ENTRIES)
                .context("Failed to create entries table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initial transaction")?;

        tracing::debug!(path = %path.display(), "opened state database");
        Ok(Arc::new(Self {
            db,
            max_entry_bytes,
        }))
    }

    /// Reads the raw text stored under `key`.
    pub fn read(&self, key: &str) -> Result<Option<String>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(ENTRIES)
            .context("Failed to open entries table")?;

        match table.get(key).context("Failed to read entry")? {
            Some(guard) => Ok(Some(guard.value().to_string())),
            None => Ok(None),
        }
    }

    /// Stores `value` under `key` (upsert).
    pub fn write(&self, key: &str, value: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(ENTRIES)
                .context("Failed to open entries table")?;
            table
                .insert(key, value)
                .context("Failed to insert entry")?;
        }
        write_txn.commit().context("Failed to commit entry")?;
        Ok(())
    }

    /// Removes the entry for `key`, if any.
    pub fn delete(&self, key: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(ENTRIES)
                .context("Failed to open entries table")?;
            table.remove(key).context("Failed to remove entry")?;
        }
        write_txn
            .commit()
            .context("Failed to commit entry deletion")?;
        Ok(())
    }

    /// Lists all stored keys in lexicographic order.
    pub fn list_keys(&self) -> Result<Vec<String>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(ENTRIES)
            .context("Failed to open entries table")?;

        let mut keys = Vec::new();
        for entry in table.iter().context("Failed to iterate entries table")? {
            let (key_guard, _) = entry.context("Failed to read entry")?;
            keys.push(key_guard.value().to_string());
        }
        Ok(keys)
    }
}

impl KeyValueMedium for RedbMedium {
    fn read_entry(&self, key: &str) -> Result<Option<String>, MediumError> {
        Ok(self.read(key)?)
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
        Ok(self.write(key, serialized)?)
    }

    fn delete_entry(&self, key: &str) -> Result<(), MediumError> {
        Ok(self.delete(key)?)
    }
}
