//! Schema migrations for the SQLite substrate
//!
//! Applied versions are recorded in `kv_schema_version`; each step runs in its
//! own transaction together with its bookkeeping row.

use rusqlite::{params, Connection};

use super::SubstrateError;

pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
}

/// Ordered by version
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Key-value table",
    up_sql: "CREATE TABLE IF NOT EXISTS kv (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    );",
}];

pub fn latest_version() -> i32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Highest applied version, 0 for a fresh database
pub fn schema_version(conn: &Connection) -> Result<i32, SubstrateError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        );",
    )?;

    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM kv_schema_version", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

/// Bring `conn` up to [`latest_version`], returning how many steps ran
pub fn migrate(conn: &mut Connection) -> Result<usize, SubstrateError> {
    let current = schema_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn.transaction()?;
        tx.execute_batch(migration.up_sql)?;
        tx.execute(
            "INSERT INTO kv_schema_version (version, applied_at) VALUES (?1, ?2)",
            params![migration.version, chrono::Utc::now().timestamp_millis()],
        )?;
        tx.commit()?;

        tracing::info!(
            version = migration.version,
            description = migration.description,
            "applied substrate migration"
        );
        applied += 1;
    }

    tracing::debug!(version = latest_version(), applied, "substrate schema up to date");
    Ok(applied)
}
