//! Configuration for authstore
//!
//! Defaults, then a TOML file or `AUTHSTORE_*` environment variables, then
//! [`Config::validate`].

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::identity::StoreKeys;
use crate::logging::{LogFormat, LogLevel};
use crate::substrate::validate_key;

mod error;

pub use error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Substrate and key layout
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which substrate implementation backs the identity store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process memory only, lost on exit
    Memory,
    /// One file per key under `data_dir/namespace`
    #[default]
    File,
    /// SQLite database at `data_dir/namespace.db`
    Sqlite,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::File => "file",
            BackendKind::Sqlite => "sqlite",
        }
    }

    /// Whether data written through this backend outlives the process
    pub fn is_durable(&self) -> bool {
        !matches!(self, BackendKind::Memory)
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [BackendKind::Memory, BackendKind::File, BackendKind::Sqlite]
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown store backend '{}'", s))
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[store]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: BackendKind,

    /// Data directory for durable backends
    pub data_dir: PathBuf,

    /// Origin scope; separates independent stores sharing one data dir
    pub namespace: String,

    /// Substrate key holding the account directory
    pub directory_key: String,

    /// Substrate key holding the current session
    pub session_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let StoreKeys { directory, session } = StoreKeys::default();
        Self {
            backend: BackendKind::default(),
            data_dir: PathBuf::from("./data"),
            namespace: "default".to_string(),
            directory_key: directory,
            session_key: session,
        }
    }
}

impl StoreConfig {
    /// Substrate keys the identity store should use
    pub fn keys(&self) -> StoreKeys {
        StoreKeys {
            directory: self.directory_key.clone(),
            session: self.session_key.clone(),
        }
    }
}

/// `[logging]` section, handed to [`crate::logging::LogConfig::from_settings`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,

    /// full, compact or json
    pub format: String,

    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default().to_string(),
            format: "full".to_string(),
            timestamps: true,
        }
    }
}

/// Read `var` through `lookup` and parse it, naming the variable on failure
fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|raw| {
            raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                var,
                reason: e.to_string(),
            })
        })
        .transpose()
}

impl Config {
    /// Defaults overridden by environment variables.
    ///
    /// Variables are named `AUTHSTORE_<SECTION>_<KEY>`, e.g.
    /// `AUTHSTORE_STORE_BACKEND=sqlite` or `AUTHSTORE_LOG_LEVEL=debug`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Config::from_env`] but reads variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let store = &mut config.store;

        if let Some(backend) = parse_var(&lookup, "AUTHSTORE_STORE_BACKEND")? {
            store.backend = backend;
        }
        if let Some(data_dir) = lookup("AUTHSTORE_STORE_DATA_DIR") {
            store.data_dir = PathBuf::from(data_dir);
        }
        for (var, field) in [
            ("AUTHSTORE_STORE_NAMESPACE", &mut store.namespace),
            ("AUTHSTORE_STORE_DIRECTORY_KEY", &mut store.directory_key),
            ("AUTHSTORE_STORE_SESSION_KEY", &mut store.session_key),
        ] {
            if let Some(value) = lookup(var) {
                *field = value;
            }
        }

        let logging = &mut config.logging;
        if let Some(level) = parse_var::<LogLevel, _>(&lookup, "AUTHSTORE_LOG_LEVEL")? {
            logging.level = level.to_string();
        }
        if let Some(format) = lookup("AUTHSTORE_LOG_FORMAT") {
            logging.format = format;
        }
        if let Some(timestamps) = parse_var(&lookup, "AUTHSTORE_LOG_TIMESTAMPS")? {
            logging.timestamps = timestamps;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject settings the store or the logger could not start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let store = &self.store;
        let invalid = |msg: String| Err(ConfigError::ValidationFailed(msg));

        for (label, key) in [
            ("namespace", &store.namespace),
            ("directory_key", &store.directory_key),
            ("session_key", &store.session_key),
        ] {
            if let Err(e) = validate_key(key) {
                return invalid(format!("{}: {}", label, e));
            }
        }

        if store.directory_key == store.session_key {
            return invalid("directory_key and session_key must differ".to_string());
        }

        if store.backend.is_durable() && store.data_dir.as_os_str().is_empty() {
            return invalid(format!("{} backend requires a data_dir", store.backend));
        }

        if let Err(e) = self.logging.level.parse::<LogLevel>() {
            return invalid(e.to_string());
        }
        if let Err(e) = self.logging.format.parse::<LogFormat>() {
            return invalid(e.to_string());
        }

        Ok(())
    }
}
