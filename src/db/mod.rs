// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Persistent key-value stores for classifications and thumbnails

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::{GalleryError, Result};

/// Schema version written to `PRAGMA user_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Minimal get/put contract shared by the caches
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Insert or overwrite; last write wins
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    async fn len(&self) -> Result<u64>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        (**self).put(key, value).await
    }

    async fn len(&self) -> Result<u64> {
        (**self).len().await
    }
}

/// The two namespaces kept in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Classifications,
    Thumbnails,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Classifications => "classifications",
            Table::Thumbnails => "thumbnails",
        }
    }
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub classification_count: i64,
    pub thumbnail_count: i64,
    pub thumbnail_bytes: i64,
}

/// SQLite database holding both cache namespaces (thread-safe wrapper)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize()?;
        Ok(db)
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        lock(&self.conn)
    }

    /// Initialize database schema
    fn initialize(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS classifications (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                accessed_at INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS thumbnails (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                accessed_at INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_classifications_accessed ON classifications(accessed_at);
            CREATE INDEX IF NOT EXISTS idx_thumbnails_accessed ON thumbnails(accessed_at);
        "#)?;

        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version == 0 {
            conn.execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;
        } else if version != SCHEMA_VERSION {
            tracing::warn!("Database schema version {} (expected {})", version, SCHEMA_VERSION);
        }
        Ok(())
    }

    /// Schema version recorded in the file
    pub fn schema_version(&self) -> Result<i64> {
        let conn = self.lock_conn()?;
        conn.query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(Into::into)
    }

    /// Store for classification records, keyed by filename
    pub fn classifications(&self, max_entries: Option<u64>) -> SqliteStore {
        SqliteStore::new(Arc::clone(&self.conn), Table::Classifications, max_entries)
    }

    /// Store for encoded thumbnails, keyed by content identity
    pub fn thumbnails(&self, max_entries: Option<u64>) -> SqliteStore {
        SqliteStore::new(Arc::clone(&self.conn), Table::Thumbnails, max_entries)
    }

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DbStats> {
        let conn = self.lock_conn()?;
        let classification_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM classifications", [], |row| row.get(0))?;
        let (thumbnail_count, thumbnail_bytes): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(LENGTH(value)), 0) FROM thumbnails",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(DbStats { classification_count, thumbnail_count, thumbnail_bytes })
    }

    /// Vacuum database
    pub fn vacuum(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("VACUUM", [])?;
        Ok(())
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<std::sync::MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| GalleryError::Config("Database lock poisoned".to_string()))
}

/// One namespace of the SQLite database
///
/// Queries run on the blocking pool. With `max_entries` set, the least
/// recently read or written rows are evicted once the table grows past it.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    table: Table,
    max_entries: Option<u64>,
}

impl SqliteStore {
    fn new(conn: Arc<Mutex<Connection>>, table: Table, max_entries: Option<u64>) -> Self {
        Self { conn, table, max_entries }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &'static str) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let table = self.table.name();
        tokio::task::spawn_blocking(move || {
            let guard = lock(&conn)?;
            f(&guard, table)
        })
        .await?
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let key = key.to_string();
        self.with_conn(move |conn, table| {
            let value: Option<Vec<u8>> = conn
                .query_row(
                    &format!("SELECT value FROM {table} WHERE key = ?1"),
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            if value.is_some() {
                touch(conn, table, &key)?;
            }
            Ok(value)
        })
        .await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let key = key.to_string();
        let max_entries = self.max_entries;
        self.with_conn(move |conn, table| {
            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO {table} (key, value, accessed_at)
                     VALUES (?1, ?2, (SELECT COALESCE(MAX(accessed_at), 0) + 1 FROM {table}))"
                ),
                params![key, value],
            )?;
            if let Some(max) = max_entries {
                let evicted = conn.execute(
                    &format!(
                        "DELETE FROM {table} WHERE key IN (
                            SELECT key FROM {table} ORDER BY accessed_at DESC LIMIT -1 OFFSET ?1
                        )"
                    ),
                    params![max as i64],
                )?;
                if evicted > 0 {
                    debug!("Evicted {} entries from {}", evicted, table);
                }
            }
            Ok(())
        })
        .await
    }

    async fn len(&self) -> Result<u64> {
        self.with_conn(|conn, table| {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}

fn touch(conn: &Connection, table: &str, key: &str) -> Result<()> {
    conn.execute(
        &format!(
            "UPDATE {table} SET accessed_at = (SELECT COALESCE(MAX(accessed_at), 0) + 1 FROM {table})
             WHERE key = ?1"
        ),
        params![key],
    )?;
    Ok(())
}

/// Process-local store, used for tests and cache-less runs
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| GalleryError::Config("Memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.entries()?.insert(key.to_string(), value);
        Ok(())
    }

    async fn len(&self) -> Result<u64> {
        Ok(self.entries()?.len() as u64)
    }
}
