//! # World Configuration
//!
//! Initial capacity hints for a [`World`](crate::World), loadable from a
//! TOML file so deployments can size the runtime without recompiling.
//!
//! ```toml
//! entity_capacity = 4096
//! component_capacity = 4096
//! filter_entity_range = 8192
//! filter_dense_capacity = 2048
//! ```
//!
//! Every field is optional and defaults to a small-simulation profile. All
//! containers grow on demand; these values only pre-size allocations.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capacity hints applied when a world is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Pre-sized slots in the entity record table.
    pub entity_capacity: usize,
    /// Pre-sized slots per component pool.
    pub component_capacity: usize,
    /// Initial addressable entity-id range per filter.
    pub filter_entity_range: usize,
    /// Pre-sized dense capacity per filter matching set.
    pub filter_dense_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 256,
            component_capacity: 256,
            filter_entity_range: 1024,
            filter_dense_capacity: 1024,
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed TOML or unknown fields.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        tracing::debug!(?config, "parsed world configuration");
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if its contents are malformed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// Failure to load a [`WorldConfig`] from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration text is not valid TOML for [`WorldConfig`].
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
