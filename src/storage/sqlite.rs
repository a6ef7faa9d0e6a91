//! SQLite response cache
//!
//! This module provides a SQLite-based implementation of the ResponseStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CachedResponse, ResponseStore, StorageResult};
use crate::StorageError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite storage backend for fetched responses
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Opens or creates the cache database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteCache)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        initialize_schema(&conn)?;

        tracing::debug!("Opened response cache at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory cache
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Stores a freshly fetched body stamped with the current time
    pub fn store(
        &self,
        fingerprint: &str,
        operation: &str,
        key: &str,
        body: &str,
    ) -> StorageResult<CachedResponse> {
        let response = CachedResponse {
            fingerprint: fingerprint.to_string(),
            operation: operation.to_string(),
            key: key.to_string(),
            body: body.to_string(),
            fetched_at: Utc::now().to_rfc3339(),
        };
        self.put(&response)?;
        Ok(response)
    }

    /// Removes every cached response
    pub fn clear(&self) -> StorageResult<usize> {
        let conn = self.lock()?;
        Ok(conn.execute("DELETE FROM responses", [])?)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Lock)
    }
}

impl ResponseStore for SqliteCache {
    fn get(&self, fingerprint: &str) -> StorageResult<Option<CachedResponse>> {
        let conn = self.lock()?;
        let response = conn
            .query_row(
                "SELECT fingerprint, operation, key, body, fetched_at FROM responses WHERE fingerprint = ?1",
                params![fingerprint],
                |row| {
                    Ok(CachedResponse {
                        fingerprint: row.get(0)?,
                        operation: row.get(1)?,
                        key: row.get(2)?,
                        body: row.get(3)?,
                        fetched_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(response)
    }

    fn put(&self, response: &CachedResponse) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO responses (fingerprint, operation, key, body, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                response.fingerprint,
                response.operation,
                response.key,
                response.body,
                response.fetched_at
            ],
        )?;
        Ok(())
    }

    fn remove(&self, fingerprint: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM responses WHERE fingerprint = ?1",
            params![fingerprint],
        )?;
        Ok(deleted > 0)
    }

    fn len(&self) -> StorageResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }
}
