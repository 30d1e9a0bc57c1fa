//! Publisher configuration loaded from a TOML file

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::codec::Strategy;
use crate::error::{Result, ShmCastError};
use crate::segment::{self, SegmentKey};

/// How walked files are filtered before loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Load everything
    None,
    /// Load only files whose extension is listed
    Whitelist,
    /// Load everything except listed extensions
    Blacklist,
}

impl Default for FilterMode {
    fn default() -> Self {
        Self::None
    }
}

/// The `[settings]` table
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Whole-value serialization strategy
    #[serde(default)]
    pub strategy: Strategy,
    /// One-byte project id mixed into the segment key
    #[serde(default = "defaults::project_id")]
    pub project_id: u8,
    /// File anchoring the segment key; defaults to the config file itself
    #[serde(default)]
    pub anchor_path: Option<PathBuf>,
    /// Whether configured commands are executed
    #[serde(default)]
    pub exec_enabled: bool,
    /// Extension filter applied to walked files
    #[serde(default)]
    pub filter: FilterMode,
    /// Extensions the filter matches against
    #[serde(default)]
    pub file_types: Vec<String>,
    /// Skip unreadable files instead of aborting the load
    #[serde(default)]
    pub ignore_missing: bool,
    /// Idle wait between signal polls, in milliseconds
    #[serde(default = "defaults::poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            project_id: defaults::project_id(),
            anchor_path: None,
            exec_enabled: false,
            filter: FilterMode::default(),
            file_types: Vec::new(),
            ignore_missing: false,
            poll_interval_ms: defaults::poll_interval_ms(),
        }
    }
}

/// The `[data]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataConfig {
    /// Files and directories walked recursively; each regular file becomes
    /// a record keyed by its path
    #[serde(default)]
    pub paths: Vec<PathBuf>,
    /// Named shell commands; each command's stdout becomes a record keyed
    /// by the name, when execution is enabled
    #[serde(default)]
    pub commands: BTreeMap<String, String>,
}

/// Full publisher configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublisherConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub data: DataConfig,
}

mod defaults {
    pub fn project_id() -> u8 {
        // ASCII 'd'
        100
    }

    pub fn poll_interval_ms() -> u64 {
        1000
    }
}

impl PublisherConfig {
    /// Load and validate a configuration file.
    ///
    /// When no explicit anchor is configured, the config file itself
    /// becomes the anchor: it is known to exist, and both sides of the
    /// channel already agree on it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| {
            ShmCastError::io(format!("failed to read config file {}", path.display()), source)
        })?;
        let mut config: PublisherConfig = toml::from_str(&raw)?;
        if config.settings.anchor_path.is_none() {
            config.settings.anchor_path = Some(path.to_path_buf());
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.settings.anchor_path.is_none() {
            return Err(ShmCastError::invalid_parameter(
                "anchor_path",
                "an anchor path is required to derive the segment key",
            ));
        }
        if self.settings.poll_interval_ms == 0 {
            return Err(ShmCastError::invalid_parameter(
                "poll_interval_ms",
                "poll interval must be greater than 0",
            ));
        }
        if self.settings.filter != FilterMode::None && self.settings.file_types.is_empty() {
            return Err(ShmCastError::invalid_parameter(
                "file_types",
                "file_types must not be empty when a filter is active",
            ));
        }
        Ok(())
    }

    /// Derive the segment key from the configured anchor and project id
    pub fn segment_key(&self) -> Result<SegmentKey> {
        let anchor = self.settings.anchor_path.as_ref().ok_or_else(|| {
            ShmCastError::invalid_parameter(
                "anchor_path",
                "an anchor path is required to derive the segment key",
            )
        })?;
        segment::derive(anchor, self.settings.project_id)
    }

    /// Idle wait between signal polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.settings.poll_interval_ms)
    }
}
