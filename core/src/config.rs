//! Engine settings loaded from TOML.
//!
//! ```toml
//! max_supersteps = 500
//!
//! [page_rank]
//! reset_prob = 0.15
//! threshold = 0.001
//! ```
//!
//! Every field is optional; missing ones take their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithms::{PageRankConfig, DEFAULT_MAX_SUPERSTEPS};
use crate::error::{GraphError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub max_supersteps: u32,
    pub page_rank: PageRankConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_supersteps: DEFAULT_MAX_SUPERSTEPS,
            page_rank: PageRankConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| GraphError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), ?config, "engine config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_supersteps == 0 {
            return Err(GraphError::Config(
                "max_supersteps must be at least 1".to_string(),
            ));
        }
        self.page_rank
            .validate()
            .map_err(|e| GraphError::Config(e.to_string()))
    }
}
