use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use tokio::runtime::{Builder, Runtime};

use crate::domain::storage::{KeyValueStorage, StorageError};

/// Durable key/value storage in a single SQLite table.
///
/// The stores are synchronous, so each call drives the pool on a private
/// current-thread runtime. Must not be used from inside another tokio runtime.
#[derive(Clone)]
pub struct SqliteStorage {
    inner: Arc<Inner>,
}

struct Inner {
    pool: Pool<Sqlite>,
    runtime: Runtime,
}

impl Inner {
    fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.runtime.block_on(self.pool.close());
    }
}

impl SqliteStorage {
    pub fn connect(database_url: &str) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        // One long-lived connection: an in-memory database lives and dies with it.
        let pool = runtime.block_on(
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect(database_url),
        )?;
        let storage = Self { inner: Arc::new(Inner { pool, runtime }) };
        storage.init()?;
        tracing::debug!(database_url, "sqlite storage ready");
        Ok(storage)
    }

    fn init(&self) -> Result<()> {
        self.inner.block_on(
            sqlx::query(
                "CREATE TABLE IF NOT EXISTS local_storage (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                )",
            )
            .execute(&self.inner.pool),
        )?;
        Ok(())
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = self.inner.block_on(
            sqlx::query("SELECT value FROM local_storage WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.inner.pool),
        )?;
        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.block_on(
            sqlx::query(
                "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )
            .bind(key)
            .bind(value)
            .execute(&self.inner.pool),
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.inner.block_on(
            sqlx::query("DELETE FROM local_storage WHERE key = ?1")
                .bind(key)
                .execute(&self.inner.pool),
        )?;
        Ok(())
    }
}

/// Ensure a file-backed SQLite URL points at an existing file, creating the
/// parent directory and an empty file if needed.
pub fn prepare_sqlite_file(database_url: &str) -> Result<()> {
    if database_url.starts_with("sqlite::memory:") { return Ok(()); }
    if let Some(path) = database_url.strip_prefix("sqlite://") {
        // Windows absolute paths arrive as /C:/...
        let path = if cfg!(windows) && path.len() >= 3 && path.as_bytes()[0] == b'/' && path.as_bytes()[2] == b':' {
            &path[1..]
        } else {
            path
        };
        let path = path.split('?').next().unwrap_or(path);
        use std::{fs, fs::OpenOptions, path::Path};
        let p = Path::new(path);
        if let Some(parent) = p.parent() { if !parent.as_os_str().is_empty() { fs::create_dir_all(parent)?; } }
        if !p.exists() {
            OpenOptions::new().create(true).append(true).open(p)?;
        }
    }
    Ok(())
}
