//! Configuration for kvrestore
//!
//! Two layers, both read-only once the loader starts:
//! - [`RunConfig`]: what to replay and how to react to failures
//! - [`EngineSettings`]: keystore engine defaults, optionally overlaid
//!   by a TOML settings file

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RestoreError, Result};

/// Default verbosity: per-keystore progress is shown
pub const DEFAULT_VERBOSITY: u8 = 1;

/// Resolved settings for one recovery run
#[derive(Debug, Clone)]
pub struct RunConfig {
    // -------------------------------------------------------------------------
    // Input Configuration
    // -------------------------------------------------------------------------
    /// Directory searched for `*.log` dump files
    pub input_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Failure Policy
    // -------------------------------------------------------------------------
    /// Continue past a failed keystore instead of aborting the run
    pub keep_going: bool,

    // -------------------------------------------------------------------------
    // Reporting
    // -------------------------------------------------------------------------
    /// 0 = critical only, 1 = per-keystore progress, 2+ = details
    pub verbosity: u8,

    // -------------------------------------------------------------------------
    // Engine Configuration
    // -------------------------------------------------------------------------
    pub engine: EngineSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            keep_going: false,
            verbosity: DEFAULT_VERBOSITY,
            engine: EngineSettings::default(),
        }
    }
}

impl RunConfig {
    /// Create a new config builder
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }
}

/// Builder for RunConfig
#[derive(Default)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    /// Set the directory holding the dump log files
    pub fn input_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.input_dir = path.into();
        self
    }

    /// Set the keep-going policy
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.config.keep_going = keep_going;
        self
    }

    /// Set the verbosity level
    pub fn verbosity(mut self, level: u8) -> Self {
        self.config.verbosity = level;
        self
    }

    /// Set the engine settings
    pub fn engine(mut self, settings: EngineSettings) -> Self {
        self.config.engine = settings;
        self
    }

    pub fn build(self) -> RunConfig {
        self.config
    }
}

/// Keystore engine settings
///
/// Every field has a default, so a settings file only needs the keys it
/// wants to change:
///
/// ```toml
/// data_dir = "/var/lib/kvstore"
/// memtable_size_limit = 1048576
/// unload_timeout_ms = 2000
/// create_missing_keystores = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Root directory of the engine; one subdirectory per keystore
    pub data_dir: PathBuf,

    /// Buffered bytes per keystore before a segment is written
    pub memtable_size_limit: usize,

    /// Upper bound on the wait for the driver's unload acknowledgement
    pub unload_timeout_ms: u64,

    /// Allow `open_keystore` to create keystores that do not exist yet
    pub create_missing_keystores: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./kvstore"),
            memtable_size_limit: 4 * 1024 * 1024, // 4 MB
            unload_timeout_ms: 5000,
            create_missing_keystores: true,
        }
    }
}

impl EngineSettings {
    /// Load settings from a TOML file, overlaying the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RestoreError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse settings from a TOML string, overlaying the defaults
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RestoreError::Config(e.to_string()))
    }
}
