//! Persistent key-value substrate
//!
//! The identity store keeps all of its state in a synchronous string-keyed
//! store with exactly three operations. Implementations must be durable across
//! process restarts (except [`MemorySubstrate`], which exists for tests and
//! ephemeral use).

use thiserror::Error;

use crate::config::{BackendKind, StoreConfig};

pub mod file;
pub mod memory;
mod migrations;
pub mod sqlite;

pub use file::FileSubstrate;
pub use memory::MemorySubstrate;
pub use sqlite::SqliteSubstrate;

/// Substrate errors
#[derive(Debug, Error)]
pub enum SubstrateError {
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// The backend refused the write (quota exceeded, read-only media, ...)
    #[error("Write rejected for key '{key}': {reason}")]
    Rejected { key: String, reason: String },

    #[error("Lock poisoned: a thread panicked while holding the lock")]
    Poisoned,
}

/// Synchronous, durable, string-keyed storage
pub trait Substrate: Send + Sync {
    /// Read the value stored under `key`, `None` when absent
    fn get(&self, key: &str) -> Result<Option<String>, SubstrateError>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), SubstrateError>;

    /// Delete `key`; removing an absent key succeeds
    fn remove(&self, key: &str) -> Result<(), SubstrateError>;
}

impl<S: Substrate + ?Sized> Substrate for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, SubstrateError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SubstrateError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), SubstrateError> {
        (**self).remove(key)
    }
}

impl<S: Substrate + ?Sized> Substrate for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, SubstrateError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SubstrateError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), SubstrateError> {
        (**self).remove(key)
    }
}

/// Check that `key` is usable by every backend.
///
/// Keys double as file names for [`FileSubstrate`], so they are limited to
/// ASCII alphanumerics plus `.`, `_` and `-`, and may not start with a dot.
pub fn validate_key(key: &str) -> Result<(), SubstrateError> {
    let invalid = |reason: &str| SubstrateError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if key.is_empty() {
        return Err(invalid("key is empty"));
    }
    if key.len() > 128 {
        return Err(invalid("key is longer than 128 bytes"));
    }
    if key.starts_with('.') {
        return Err(invalid("key may not start with '.'"));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(invalid("only [A-Za-z0-9._-] are allowed"));
    }

    Ok(())
}

/// Build the substrate selected by `config`
pub fn open_substrate(config: &StoreConfig) -> Result<Box<dyn Substrate>, SubstrateError> {
    validate_key(&config.namespace)?;

    let substrate: Box<dyn Substrate> = match config.backend {
        BackendKind::Memory => Box::new(MemorySubstrate::new()),
        BackendKind::File => Box::new(FileSubstrate::open(&config.data_dir, &config.namespace)?),
        BackendKind::Sqlite => {
            std::fs::create_dir_all(&config.data_dir)?;
            let path = config.data_dir.join(format!("{}.db", config.namespace));
            Box::new(SqliteSubstrate::open(path)?)
        }
    };

    tracing::debug!(
        backend = %config.backend,
        namespace = %config.namespace,
        "opened substrate"
    );

    Ok(substrate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_plain_names() {
        for key in ["users", "currentUser", "shop.example", "a_b-c.1"] {
            assert!(validate_key(key).is_ok(), "{} should be valid", key);
        }
    }

    #[test]
    fn test_validate_key_rejects_unsafe_names() {
        let long = "k".repeat(129);
        for key in ["", ".", "..", ".hidden", "a/b", "a\\b", "white space", long.as_str()] {
            assert!(
                matches!(validate_key(key), Err(SubstrateError::InvalidKey { .. })),
                "{:?} should be rejected",
                key
            );
        }
    }

    #[test]
    fn test_open_substrate_for_each_backend() {
        let dir = tempfile::tempdir().unwrap();

        for backend in [BackendKind::Memory, BackendKind::File, BackendKind::Sqlite] {
            let config = StoreConfig {
                backend,
                data_dir: dir.path().to_path_buf(),
                ..StoreConfig::default()
            };

            let substrate = open_substrate(&config).unwrap();
            substrate.set("backend_check", "1").unwrap();
            assert_eq!(substrate.get("backend_check").unwrap().as_deref(), Some("1"));
            substrate.remove("backend_check").unwrap();
            assert_eq!(substrate.get("backend_check").unwrap(), None);
        }
    }

    #[test]
    fn test_boxed_and_shared_substrates_delegate() {
        let shared = std::sync::Arc::new(MemorySubstrate::new());
        let boxed: Box<dyn Substrate> = Box::new(shared.clone());

        boxed.set("k", "v").unwrap();
        assert_eq!(shared.get("k").unwrap().as_deref(), Some("v"));
    }
}
