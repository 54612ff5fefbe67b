//! Subscriber setup
//!
//! The library only emits `tracing` events. Applications embedding the
//! identity store call [`init_logging`] or [`init_logging_with_config`] once
//! at startup to get them written to stderr.

use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

mod level;

pub use level::{LogFormat, LogLevel};

/// Connection pool internals are noisy at debug level
const QUIET_DEPENDENCIES: &[&str] = &["r2d2=warn"];

#[derive(Debug, Clone, Error)]
pub enum LoggingError {
    #[error("Unknown log level '{0}'")]
    UnknownLevel(String),

    #[error("Unknown log format '{0}'")]
    UnknownFormat(String),

    /// A global subscriber was already installed
    #[error("Failed to install subscriber: {0}")]
    AlreadyInitialized(String),
}

/// Subscriber settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Prefix each line with a timestamp
    pub timestamps: bool,
}

impl LogConfig {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            timestamps: true,
            ..Self::default()
        }
    }

    /// Build from the `[logging]` section of [`crate::Config`]
    pub fn from_settings(settings: &LoggingConfig) -> Result<Self, LoggingError> {
        Ok(Self {
            level: settings.level.parse()?,
            format: settings.format.parse()?,
            timestamps: settings.timestamps,
        })
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    /// Filter used when `RUST_LOG` is unset
    fn default_filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::from(self.level).into())
            .parse_lossy(QUIET_DEPENDENCIES.join(","))
    }
}

/// Install an info-level subscriber with timestamps
pub fn init_logging() -> Result<(), LoggingError> {
    init_logging_with_config(LogConfig::new(LogLevel::Info))
}

/// Install a subscriber built from `config`.
///
/// `RUST_LOG`, when set, replaces the level in `config`.
///
/// # Example
/// ```no_run
/// use authstore_core::logging::{init_logging_with_config, LogConfig, LogFormat, LogLevel};
///
/// let config = LogConfig::new(LogLevel::Debug).format(LogFormat::Json);
/// init_logging_with_config(config).expect("Failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: LogConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| config.default_filter());
    let registry = tracing_subscriber::registry().with(filter);
    let layer = fmt::layer().with_writer(std::io::stderr);

    let installed = match (config.format, config.timestamps) {
        (LogFormat::Full, true) => registry.with(layer).try_init(),
        (LogFormat::Full, false) => registry.with(layer.without_time()).try_init(),
        (LogFormat::Compact, true) => registry.with(layer.compact()).try_init(),
        (LogFormat::Compact, false) => registry.with(layer.compact().without_time()).try_init(),
        (LogFormat::Json, true) => registry.with(layer.json()).try_init(),
        (LogFormat::Json, false) => registry.with(layer.json().without_time()).try_init(),
    };

    installed.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}
