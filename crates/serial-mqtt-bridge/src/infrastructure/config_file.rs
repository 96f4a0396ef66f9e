//! Optional TOML configuration file.
//!
//! Every field is optional; anything missing falls back to the command line,
//! the environment, or the built-in default.  Example:
//!
//! ```toml
//! [serial]
//! device = "/dev/ttyACM0"
//!
//! [broker]
//! host = "mqtt.example.org"
//! publish_timeout_secs = 5
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! The baud rate, broker port and client identifier are fixed and cannot be
//! set here.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Error type for config file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level config file contents.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub serial: SerialSection,
    #[serde(default)]
    pub broker: BrokerSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[serial]` table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SerialSection {
    /// Device path or port name.
    pub device: Option<String>,
}

/// `[broker]` table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BrokerSection {
    /// Broker hostname or IP address.
    pub host: Option<String>,
    /// Upper bound on one publish, in seconds.
    pub publish_timeout_secs: Option<u64>,
}

/// `[logging]` table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// `tracing` filter used when `RUST_LOG` is unset: `"error"`, `"warn"`,
    /// `"info"`, `"debug"`, `"trace"`, or a full filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses config file contents.  `path` is only used for error messages.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed or contains
/// unknown keys.
pub fn parse_config(content: &str, path: &Path) -> Result<FileConfig, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and parses the config file at `path`.
///
/// Unlike a settings store, this file is only read when the user names it,
/// so a missing file is an error rather than an empty config.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, and
/// [`ConfigError::Parse`] if its contents are invalid.
pub fn load_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, path)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
