//! Engine configuration
//!
//! A single engine covers every comparison flavour; the switches below pick
//! which behaviours are active.

use std::path::Path;

use serde::{Deserialize, Serialize};
use zipdelta_core::{Error, Result};
use zipdelta_parsers::ParseOptions;

/// How entries are compared when a checksum is unavailable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumPolicy {
    /// A missing checksum is unknown content and differs, unless both
    /// sides lack one and the sizes agree
    #[default]
    Strict,
    /// Fall back to comparing sizes when either checksum is missing
    SizeOnlyWhenMissing,
}

/// Behaviour switches for one comparison engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Mark directories with differing descendants as `DirectoryDiff`
    pub propagate_directory_diff: bool,
    /// Draw placeholder nodes on the side lacking an entry
    pub placeholders: bool,
    /// Checksum fallback rule
    pub checksum_policy: ChecksumPolicy,
    /// Mirror selection and expansion between the two views
    pub sync_enabled: bool,
    /// Read both archives concurrently
    pub parallel_read: bool,
    /// Reject entries whose data would lie past the central directory
    pub strict_validation: bool,
    /// Upper bound on entries read from one archive
    pub max_entries: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            propagate_directory_diff: true,
            placeholders: true,
            checksum_policy: ChecksumPolicy::Strict,
            sync_enabled: true,
            parallel_read: false,
            strict_validation: false,
            max_entries: ParseOptions::default().max_entries,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check the values are usable
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(Error::InvalidConfig {
                message: "max_entries must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Reader options derived from this configuration
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            strict_validation: self.strict_validation,
            max_entries: self.max_entries,
        }
    }

    pub fn with_checksum_policy(mut self, policy: ChecksumPolicy) -> Self {
        self.checksum_policy = policy;
        self
    }

    pub fn with_directory_diff(mut self, enabled: bool) -> Self {
        self.propagate_directory_diff = enabled;
        self
    }

    pub fn with_placeholders(mut self, enabled: bool) -> Self {
        self.placeholders = enabled;
        self
    }

    pub fn with_sync(mut self, enabled: bool) -> Self {
        self.sync_enabled = enabled;
        self
    }

    pub fn with_parallel_read(mut self, enabled: bool) -> Self {
        self.parallel_read = enabled;
        self
    }
}
