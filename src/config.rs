//! Pipeline configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! [temperature]
//! min_exclusive = 25.0
//! max_exclusive = 45.0
//! ```

use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Lower plausibility bound for body temperature, in °C
pub const MIN_TEMP_C: f64 = 25.0;

/// Upper plausibility bound for body temperature, in °C
pub const MAX_TEMP_C: f64 = 45.0;

/// Open interval of physiologically plausible body temperatures (°C)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureBounds {
    pub min_exclusive: f64,
    pub max_exclusive: f64,
}

impl Default for TemperatureBounds {
    fn default() -> Self {
        Self {
            min_exclusive: MIN_TEMP_C,
            max_exclusive: MAX_TEMP_C,
        }
    }
}

impl TemperatureBounds {
    pub fn new(min_exclusive: f64, max_exclusive: f64) -> Self {
        Self {
            min_exclusive,
            max_exclusive,
        }
    }

    /// Both ends excluded
    pub fn contains(&self, celsius: f64) -> bool {
        celsius > self.min_exclusive && celsius < self.max_exclusive
    }
}

/// Fixed configuration shared by every record of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub temperature: TemperatureBounds,
}

impl PipelineConfig {
    /// Parse and check a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, IngestError> {
        let config: PipelineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and check a TOML file
    pub fn load(path: &Path) -> Result<Self, IngestError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        let TemperatureBounds {
            min_exclusive,
            max_exclusive,
        } = self.temperature;

        if !min_exclusive.is_finite() || !max_exclusive.is_finite() {
            return Err(IngestError::InvalidConfig(
                "temperature bounds must be finite".to_string(),
            ));
        }
        if min_exclusive >= max_exclusive {
            return Err(IngestError::InvalidConfig(format!(
                "temperature.min_exclusive ({min_exclusive}) must be below temperature.max_exclusive ({max_exclusive})"
            )));
        }
        Ok(())
    }
}
