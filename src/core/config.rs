//! Engine configuration
//!
//! Settings are plain serde structs so an embedding service can keep them in
//! its own TOML configuration. Every field has a default, so an empty
//! document is a valid configuration.

use crate::error::{AclError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default bound on breadth-first traversal depth
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Configuration for an [`Acl`](crate::Acl) instance
///
/// # Examples
///
/// ```
/// use hieracl_rs::AclConfig;
///
/// let config = AclConfig::from_toml_str("max_depth = 16").unwrap();
/// assert_eq!(config.max_depth, 16);
/// assert!(!config.log_decisions);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    /// Maximum number of child-edge hops explored when computing a distance.
    ///
    /// Targets deeper than this are treated as unreachable.
    pub max_depth: usize,

    /// Emit a `debug` event for every access decision
    pub log_decisions: bool,
}

impl AclConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: AclConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Check that all settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(AclError::InvalidConfig(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AclConfig {
    fn default() -> Self {
        AclConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            log_decisions: false,
        }
    }
}
