//! Configuration loading and typed config structures for Wardrobe.
//!
//! The configuration lives in `wardrobe.yaml` (or the file named by
//! `WARDROBE_CONFIG`). Every section and field has a default, so a
//! missing file or an empty document yields a working setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "wardrobe.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WardrobeConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: HttpConfig,

    /// Emote ledger and long-poll settings.
    #[serde(default)]
    pub emotes: EmoteConfig,

    /// Cape ledger settings.
    #[serde(default)]
    pub capes: CapeConfig,

    /// Snapshot persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WardrobeConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `PORT` overrides `server.port`
    /// - `WARDROBE_HOST` overrides `server.host`
    /// - `WARDROBE_DATA_FILE` overrides `storage.data_file`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from `WARDROBE_CONFIG`, else `wardrobe.yaml`, else defaults.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::from_file`] when a file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("WARDROBE_CONFIG")
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
        if path.exists() {
            Self::from_file(&path)
        } else {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            let mut config = Self::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    /// Override values with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var("PORT").ok().and_then(|v| v.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Ok(host) = std::env::var("WARDROBE_HOST") {
            self.server.host = host;
        }
        if let Ok(path) = std::env::var("WARDROBE_DATA_FILE") {
            self.storage.data_file = PathBuf::from(path);
        }
    }

    /// Reject values the service cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (self.emotes.ttl_secs == 0, "emotes.ttl_secs must be at least 1"),
            (
                self.emotes.long_poll_timeout_ms == 0,
                "emotes.long_poll_timeout_ms must be at least 1",
            ),
            (self.capes.ttl_secs == 0, "capes.ttl_secs must be at least 1"),
            (
                self.server.body_limit_bytes == 0,
                "server.body_limit_bytes must be at least 1",
            ),
        ];
        match checks.iter().find(|(bad, _)| *bad) {
            Some((_, reason)) => Err(ConfigError::Invalid {
                reason: (*reason).to_owned(),
            }),
            None => Ok(()),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

/// Emote ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmoteConfig {
    /// Seconds after the last write before a record is evicted. Applies
    /// to active and inactive records alike.
    #[serde(default = "default_emote_ttl_secs")]
    pub ttl_secs: u64,

    /// How long a long-poll request is held before answering with the
    /// unchanged snapshot.
    #[serde(default = "default_long_poll_timeout_ms")]
    pub long_poll_timeout_ms: u64,

    /// When set, a sweep that evicts records advances the revision and
    /// wakes long-poll observers.
    #[serde(default)]
    pub notify_on_eviction: bool,
}

impl EmoteConfig {
    /// Eviction TTL as a [`Duration`].
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Long-poll hold time as a [`Duration`].
    pub const fn long_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.long_poll_timeout_ms)
    }
}

impl Default for EmoteConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_emote_ttl_secs(),
            long_poll_timeout_ms: default_long_poll_timeout_ms(),
            notify_on_eviction: false,
        }
    }
}

/// Cape ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CapeConfig {
    /// Seconds after the last write before a record is evicted.
    #[serde(default = "default_cape_ttl_secs")]
    pub ttl_secs: u64,
}

impl CapeConfig {
    /// Eviction TTL as a [`Duration`].
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CapeConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cape_ttl_secs(),
        }
    }
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON document.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Quiet period before a submitted snapshot is written. Zero writes
    /// after every mutation.
    #[serde(default)]
    pub flush_debounce_ms: u64,
}

impl StorageConfig {
    /// Debounce window as a [`Duration`].
    pub const fn flush_debounce(&self) -> Duration {
        Duration::from_millis(self.flush_debounce_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            flush_debounce_ms: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit one JSON object per event instead of human-readable lines.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    3000
}

const fn default_body_limit_bytes() -> usize {
    256 * 1024
}

const fn default_emote_ttl_secs() -> u64 {
    60
}

const fn default_long_poll_timeout_ms() -> u64 {
    25_000
}

const fn default_cape_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data.json")
}

fn default_log_level() -> String {
    "info".to_owned()
}
