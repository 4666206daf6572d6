use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::economy::EconomyConfig;
use crate::grid::{CHUNK_HEIGHT, CHUNK_WIDTH};
use crate::islands::PaintPolicy;

/// Settings for a sandbox session. Every field has a default, so a partial
/// JSON object (or `{}`) is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub chunk_width: u32,
    pub chunk_height: u32,
    /// Painting a tile to water also demolishes its structure
    pub clear_structure_on_water: bool,
    /// Treasury of a freshly generated chunk
    pub starting_treasury: u64,
    pub economy: EconomyConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            chunk_width: CHUNK_WIDTH,
            chunk_height: CHUNK_HEIGHT,
            clear_structure_on_water: true,
            starting_treasury: 0,
            economy: EconomyConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("chunk must be at least 1x1, got {width}x{height}")]
    EmptyChunk { width: u32, height: u32 },
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_width == 0 || self.chunk_height == 0 {
            return Err(ConfigError::EmptyChunk {
                width: self.chunk_width,
                height: self.chunk_height,
            });
        }
        Ok(())
    }

    pub fn paint_policy(&self) -> PaintPolicy {
        PaintPolicy {
            clear_structure_on_water: self.clear_structure_on_water,
        }
    }
}
