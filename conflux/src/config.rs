//! Simulation configuration, read once from `conflux_config.json5`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use conflux_registry::{BlockDefinition, LiquidEntry};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG: &str = include_str!("../../package-content/conflux_config.json5");

/// Location of the configuration file.
#[cfg(feature = "dev-build")]
pub const CONFIG_PATH: &str = "config/conflux_config.json5";

/// Location of the configuration file.
#[cfg(not(feature = "dev-build"))]
pub const CONFIG_PATH: &str = "conflux_config.json5";

/// The configuration of this process and where it came from.
///
/// Loading happens before logging is set up, so the origin is reported by
/// the caller once a logger exists.
///
/// # Panics
/// Dereferencing panics if the configuration file exists but cannot be read,
/// parsed or validated, or if a missing one cannot be written.
pub static CONFLUX_CONFIG: LazyLock<(ConfluxConfig, ConfigOrigin)> = LazyLock::new(|| {
    ConfluxConfig::load_or_create(Path::new(CONFIG_PATH))
        .unwrap_or_else(|err| panic!("Failed to load {CONFIG_PATH}: {err}"))
});

/// How the configuration file was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// An existing file was read.
    Loaded,
    /// No file existed; the default was written and used.
    Created,
}

/// Failure to load the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("config file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON5 for this schema.
    #[error("config file is malformed: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfluxConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Stop after this many ticks; run until interrupted when absent.
    pub run_ticks: Option<u64>,
    /// Ticks between two statistics log lines.
    pub stats_interval: u64,
    /// Default log filter, overridden by `RUST_LOG`.
    pub log_level: String,
    /// Liquids registered after the built-in ones.
    pub liquids: Vec<LiquidEntry>,
    /// Blocks registered after the built-in ones.
    pub blocks: Vec<BlockDefinition>,
    /// Scenario layout file; the built-in demo layout is used when absent.
    pub scenario: Option<PathBuf>,
}

impl ConfluxConfig {
    /// Reads the configuration at `path`, writing the default file first if
    /// there is none.
    pub fn load_or_create(path: &Path) -> Result<(Self, ConfigOrigin), ConfigError> {
        if path.exists() {
            let config = Self::parse(&fs::read_to_string(path)?)?;
            Ok((config, ConfigOrigin::Loaded))
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, DEFAULT_CONFIG)?;
            Ok((Self::parse(DEFAULT_CONFIG)?, ConfigOrigin::Created))
        }
    }

    /// Parses and validates configuration text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json5::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=1000).contains(&self.tick_rate) {
            return Err(ConfigError::Invalid("tick_rate must be in range 1..=1000"));
        }
        if self.stats_interval == 0 {
            return Err(ConfigError::Invalid("stats_interval must be at least 1"));
        }
        if self.run_ticks == Some(0) {
            return Err(ConfigError::Invalid("run_ticks must be at least 1 when set"));
        }
        Ok(())
    }
}

impl Default for ConfluxConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            run_ticks: None,
            stats_interval: 60,
            log_level: "info".to_owned(),
            liquids: Vec::new(),
            blocks: Vec::new(),
            scenario: None,
        }
    }
}
