//! Engine configuration, read from an optional TOML file and overridden from the command line.
//!
//! ## Example
//! ```toml
//! frames = 1200
//! population = 32
//!
//! [world]
//! initial_capacity = 128
//! growth = "doubling"
//! ```

use crate::cli::Args;
use ember_ecs::WorldConfig;
use ember_utils::{AnyResult, AnyhowResultExt};
use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Amount of frames to simulate before exiting.
    pub frames: u32,
    /// Amount of wanderers kept alive. Expired ones are replaced.
    pub population: u32,
    /// Frames a wanderer lives for.
    pub lifetime: u32,
    /// Simulated seconds per frame.
    pub time_step: f32,
    pub world: WorldConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            population: 64,
            lifetime: 240,
            time_step: 1.0 / 60.0,
            world: WorldConfig::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("the time step must be a positive number of seconds, got {0}")]
    InvalidTimeStep(f32),
    #[error("wanderers need a lifetime of at least one frame")]
    ZeroLifetime,
}

impl EngineConfig {
    /// Reads the configuration out of a TOML file.
    pub fn load(path: &Path) -> AnyResult<Self> {
        let text = fs::read_to_string(path)
            .otherwise(format!("couldn't read config file {}", path.display()))?;
        toml::from_str(&text).otherwise(format!("couldn't parse config file {}", path.display()))
    }

    /// Applies command line overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(frames) = args.frames {
            self.frames = frames;
        }
        if let Some(population) = args.population {
            self.population = population;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.time_step > 0.0 && self.time_step.is_finite()) {
            return Err(ConfigError::InvalidTimeStep(self.time_step));
        }
        if self.lifetime == 0 {
            return Err(ConfigError::ZeroLifetime);
        }
        Ok(())
    }
}
