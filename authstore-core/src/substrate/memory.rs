//! In-memory substrate for testing

use super::{validate_key, Substrate, SubstrateError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

/// Helper to convert poison errors into SubstrateError
fn handle_poison<T>(_err: PoisonError<T>) -> SubstrateError {
    SubstrateError::Poisoned
}

/// In-memory substrate (non-persistent)
///
/// Clones share the same underlying map, so dropping an identity store and
/// building a new one over a clone behaves like a process restart with the
/// storage retained.
#[derive(Clone, Default)]
pub struct MemorySubstrate {
    entries: Arc<RwLock<HashMap<String, String>>>,
    rejected: Arc<RwLock<HashSet<String>>>,
}

impl MemorySubstrate {
    /// Create an empty memory substrate
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set`/`remove` on `key` fail with
    /// [`SubstrateError::Rejected`], as a full browser quota would.
    pub fn reject_writes(&self, key: &str) -> Result<(), SubstrateError> {
        self.rejected
            .write()
            .map_err(handle_poison)?
            .insert(key.to_string());
        Ok(())
    }

    /// Undo [`MemorySubstrate::reject_writes`]
    pub fn allow_writes(&self, key: &str) -> Result<(), SubstrateError> {
        self.rejected.write().map_err(handle_poison)?.remove(key);
        Ok(())
    }

    /// Number of stored keys
    pub fn len(&self) -> Result<usize, SubstrateError> {
        Ok(self.entries.read().map_err(handle_poison)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, SubstrateError> {
        Ok(self.len()? == 0)
    }

    fn check_writable(&self, key: &str) -> Result<(), SubstrateError> {
        if self.rejected.read().map_err(handle_poison)?.contains(key) {
            return Err(SubstrateError::Rejected {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        Ok(())
    }
}

impl Substrate for MemorySubstrate {
    fn get(&self, key: &str) -> Result<Option<String>, SubstrateError> {
        validate_key(key)?;
        Ok(self.entries.read().map_err(handle_poison)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SubstrateError> {
        validate_key(key)?;
        self.check_writable(key)?;
        self.entries
            .write()
            .map_err(handle_poison)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SubstrateError> {
        validate_key(key)?;
        self.check_writable(key)?;
        self.entries.write().map_err(handle_poison)?.remove(key);
        Ok(())
    }
}
