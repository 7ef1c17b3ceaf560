//! # Placement Configuration
//!
//! The only "protocol" the placement subsystem exposes: how often the scheduler
//! ticks, how much it drains per tick, and where producers start and stop
//! waiting. The host supplies these values; the four scheduling knobs have no
//! defaults and must be present in the document.
//!
//! ```json
//! {
//!     "tick_interval_ms": 50,
//!     "batch_size": 256,
//!     "soft_limit": 2000,
//!     "hard_limit": 8000,
//!     "palette": [
//!         { "texture": "grass", "material": 2, "remap": { "Tint": [145, 189, 89] },
//!           "tags": ["Block", "Statue"] }
//!     ]
//! }
//! ```

use std::{ops::RangeInclusive, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    palette::{Material, OperationTag},
    texture::ColorRemap,
};

/// Errors raised while loading or validating a [`PlacementConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration document is not valid JSON for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The values parsed but are inconsistent with each other.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Scheduling, backpressure and quantization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Interval between scheduler ticks, in milliseconds.
    pub tick_interval_ms: u64,
    /// Maximum number of entries drained per tick across all producers.
    pub batch_size: usize,
    /// Queue length a blocked producer waits for before resuming.
    pub soft_limit: usize,
    /// Queue length above which a producer blocks.
    pub hard_limit: usize,
    /// Sleep between backpressure polls, in milliseconds.
    #[serde(default = "default_backpressure_poll_ms")]
    pub backpressure_poll_ms: u64,
    /// Lowest buildable vertical coordinate (inclusive).
    #[serde(default = "default_min_build_height")]
    pub min_build_height: i32,
    /// Highest buildable vertical coordinate (inclusive).
    #[serde(default = "default_max_build_height")]
    pub max_build_height: i32,
    /// Colors with alpha below this quantize to `Material::EMPTY`.
    #[serde(default = "default_alpha_threshold")]
    pub alpha_threshold: u8,
    /// Capacity of the color cache; `None` disables caching.
    #[serde(default = "default_color_cache_capacity")]
    pub color_cache_capacity: Option<usize>,
    /// Materials the palette is built from; empty leaves the choice to the host.
    #[serde(default)]
    pub palette: Vec<PaletteSource>,
}

/// One palette entry as written in the configuration: the texture whose
/// average color represents `material`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteSource {
    /// Registered texture name
    pub texture: String,
    /// Material placed when this entry is chosen
    pub material: Material,
    /// Remap applied before averaging
    #[serde(default)]
    pub remap: ColorRemap,
    /// Operations allowed to choose this entry
    pub tags: Vec<OperationTag>,
}

fn default_backpressure_poll_ms() -> u64 {
    5
}

fn default_min_build_height() -> i32 {
    -64
}

fn default_max_build_height() -> i32 {
    319
}

fn default_alpha_threshold() -> u8 {
    32
}

fn default_color_cache_capacity() -> Option<usize> {
    Some(4096)
}

impl PlacementConfig {
    /// Builds a configuration from the four required scheduling values,
    /// taking defaults for everything else.
    pub fn new(tick_interval_ms: u64, batch_size: usize, soft_limit: usize, hard_limit: usize) -> Self {
        Self {
            tick_interval_ms,
            batch_size,
            soft_limit,
            hard_limit,
            backpressure_poll_ms: default_backpressure_poll_ms(),
            min_build_height: default_min_build_height(),
            max_build_height: default_max_build_height(),
            alpha_threshold: default_alpha_threshold(),
            color_cache_capacity: default_color_cache_capacity(),
            palette: Vec::new(),
        }
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: PlacementConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Checks the cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if self.soft_limit > self.hard_limit {
            return Err(ConfigError::Invalid(format!(
                "soft_limit {} exceeds hard_limit {}",
                self.soft_limit, self.hard_limit
            )));
        }
        if self.min_build_height > self.max_build_height {
            return Err(ConfigError::Invalid(format!(
                "min_build_height {} exceeds max_build_height {}",
                self.min_build_height, self.max_build_height
            )));
        }
        if let Some(source) = self.palette.iter().find(|source| source.material.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "palette texture {} maps to the empty material",
                source.texture
            )));
        }
        Ok(())
    }

    /// Interval between scheduler ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Sleep between backpressure polls.
    pub fn backpressure_poll(&self) -> Duration {
        Duration::from_millis(self.backpressure_poll_ms)
    }

    /// Vertical coordinates the host accepts placements at.
    pub fn build_range(&self) -> RangeInclusive<i32> {
        self.min_build_height..=self.max_build_height
    }

    /// Whether a vertical coordinate lies inside the host's build range.
    pub fn in_build_range(&self, y: i32) -> bool {
        self.build_range().contains(&y)
    }
}
