//! Persistent key-value tier
//!
//! The loader only ever needs `get`/`set` on string values. Every failure here
//! is recoverable: a failed read is a cache miss and a failed write is dropped.

use crate::error::StorageError;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Key-value table in a SQLite database
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open (creating if missing) the store at `db_path`
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::Unavailable(format!("{:?}: {}", parent, e)))?;
            }
        }
        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    /// Get a new connection (each call creates a new connection)
    fn connection(&self) -> Result<Connection, StorageError> {
        Connection::open(&self.db_path)
            .map_err(|e| StorageError::Unavailable(format!("{:?}: {}", self.db_path, e)))
    }

    fn init(&self) -> Result<(), StorageError> {
        let conn = self.connection()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.connection()?;
        let value = conn
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?1",
                rusqlite::params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value) VALUES (?1, ?2)",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }
}

/// In-process store with an optional byte quota
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes that would push the total of value sizes past `quota_bytes` fail
    /// with [`StorageError::QuotaExceeded`].
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self { entries: Mutex::new(HashMap::new()), quota_bytes: Some(quota_bytes) }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(quota) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let remaining = quota.saturating_sub(used);
            if value.len() > remaining {
                return Err(StorageError::QuotaExceeded { needed: value.len(), remaining });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persistent tier switched off: every read misses, every write is dropped
pub struct NullStore;

impl KeyValueStore for NullStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Ok(())
    }
}
