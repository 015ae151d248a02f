//! Configuration for the log store
//!
//! The application decides the initial threshold (verbose while developing,
//! terse in production); the store itself never reads configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::logging::{
    ConsoleSink, LogLevel, LogSink, NoopSink, TracingSink, DEFAULT_CAPACITY, DEFAULT_THRESHOLD,
};

/// Which built-in sink a configured store writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// stdout for debug/info, stderr for warn/error
    #[default]
    Console,
    /// Re-emit through `tracing` macros
    Tracing,
    /// Discard output, keep history only
    None,
}

impl SinkKind {
    /// Instantiate the sink
    pub fn build(&self) -> Arc<dyn LogSink> {
        match self {
            SinkKind::Console => Arc::new(ConsoleSink::new()),
            SinkKind::Tracing => Arc::new(TracingSink),
            SinkKind::None => Arc::new(NoopSink),
        }
    }
}

/// Log store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Minimum level accepted by the store (default: info)
    #[serde(default = "default_level")]
    pub level: LogLevel,

    /// Maximum entries kept in memory (default: 1000)
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Output sink: "console" (default), "tracing", or "none"
    #[serde(default)]
    pub sink: SinkKind,
}

fn default_level() -> LogLevel {
    DEFAULT_THRESHOLD
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: default_level(),
            capacity: default_capacity(),
            sink: SinkKind::default(),
        }
    }
}

impl Config {
    /// Verbose preset for development builds
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            ..Self::default()
        }
    }

    /// Terse preset for production builds
    pub fn production() -> Self {
        Self {
            level: LogLevel::Warn,
            ..Self::default()
        }
    }

    /// Load configuration from the default file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `path`, or return default if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}

/// Get the base configuration directory (~/.logstore)
/// Falls back to ./.logstore if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for config");
        PathBuf::from(".logstore")
    })
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".logstore"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
