//! File-backed substrate
//!
//! Layout:
//! ```text
//! <root>/<namespace>/<key>.val
//! ```
//! Writes go to `<key>.tmp`, are synced, then renamed over the live file, so a
//! crash leaves either the old or the new value and never a torn one.

use super::{validate_key, Substrate, SubstrateError};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// One file per key inside a namespace directory
pub struct FileSubstrate {
    /// Directory holding this namespace's keys
    base_path: PathBuf,
}

impl FileSubstrate {
    /// Open (creating if needed) the namespace directory under `root`
    pub fn open(root: impl AsRef<Path>, namespace: &str) -> Result<Self, SubstrateError> {
        validate_key(namespace)?;
        let base_path = root.as_ref().join(namespace);
        fs::create_dir_all(&base_path)?;

        Ok(FileSubstrate { base_path })
    }

    /// Directory holding this namespace's keys
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.val", key))
    }

    /// Write file atomically (write to temp, then rename)
    fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), SubstrateError> {
        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(data)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

impl Substrate for FileSubstrate {
    fn get(&self, key: &str) -> Result<Option<String>, SubstrateError> {
        validate_key(key)?;
        match fs::read_to_string(self.value_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SubstrateError> {
        validate_key(key)?;
        self.write_atomic(&self.value_path(key), value.as_bytes())
    }

    fn remove(&self, key: &str) -> Result<(), SubstrateError> {
        validate_key(key)?;
        match fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
