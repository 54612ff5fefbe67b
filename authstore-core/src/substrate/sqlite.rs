//! SQLite-backed substrate

use super::{migrations, validate_key, Substrate, SubstrateError};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::path::Path;

/// Key-value rows in a single `kv` table
pub struct SqliteSubstrate {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteSubstrate {
    /// Create a new substrate with the given connection pool
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Result<Self, SubstrateError> {
        {
            let mut conn = pool.get()?;
            migrations::migrate(&mut conn)?;
        }

        Ok(Self { pool })
    }

    /// Open (creating if needed) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SubstrateError> {
        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = Pool::new(manager)?;
        Self::new(pool)
    }

    /// Create a new in-memory substrate.
    ///
    /// Every pooled connection to `:memory:` is a separate database, so the
    /// pool is pinned to a single connection.
    pub fn memory() -> Result<Self, SubstrateError> {
        let pool = Pool::builder()
            .max_size(1)
            .build(SqliteConnectionManager::memory())?;
        Self::new(pool)
    }
}

impl Substrate for SqliteSubstrate {
    fn get(&self, key: &str) -> Result<Option<String>, SubstrateError> {
        validate_key(key)?;
        let conn = self.pool.get()?;

        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get(0)
            })
            .optional()?;

        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SubstrateError> {
        validate_key(key)?;
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().timestamp_millis()],
        )?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SubstrateError> {
        validate_key(key)?;
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM kv WHERE key = ?", params![key])?;
        Ok(())
    }
}
