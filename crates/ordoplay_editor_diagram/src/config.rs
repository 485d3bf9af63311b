// SPDX-License-Identifier: MIT OR Apache-2.0
//! Surface configuration, stored as RON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Current configuration format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON for this format
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Configuration could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Values are out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for a diagram surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Format version
    pub version: u32,
    /// Grid cell size used for snapping and occupancy checks
    pub grid_cell: f32,
    /// Quantize move/resize deltas to whole cells
    pub snap_to_grid: bool,
    /// Draw the background grid
    pub show_grid: bool,
    /// Smallest zoom factor
    pub min_zoom: f32,
    /// Largest zoom factor
    pub max_zoom: f32,
    /// Pick radius of resize handles and link end handles
    pub handle_size: f32,
    /// Pick distance for clicking on a link path
    pub link_hit_tolerance: f32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            grid_cell: 20.0,
            snap_to_grid: true,
            show_grid: true,
            min_zoom: 0.1,
            max_zoom: 4.0,
            handle_size: 6.0,
            link_hit_tolerance: 5.0,
        }
    }
}

impl SurfaceConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.grid_cell.is_finite() || self.grid_cell <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "grid_cell must be positive, got {}",
                self.grid_cell
            )));
        }
        if !self.min_zoom.is_finite()
            || !self.max_zoom.is_finite()
            || self.min_zoom <= 0.0
            || self.max_zoom < self.min_zoom
        {
            return Err(ConfigError::Invalid(format!(
                "zoom range {}..{} is empty",
                self.min_zoom, self.max_zoom
            )));
        }
        for (name, value) in [
            ("handle_size", self.handle_size),
            ("link_hit_tolerance", self.link_hit_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a RON document
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: SurfaceConfig = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize as pretty RON
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Load from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&content)?;
        tracing::debug!("Loaded surface config from {:?}", path);
        Ok(config)
    }

    /// Save to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron_string()?)?;
        tracing::debug!("Saved surface config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SurfaceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.version, CONFIG_FORMAT_VERSION);
    }

    #[test]
    fn test_serialization() {
        let config = SurfaceConfig {
            grid_cell: 10.0,
            snap_to_grid: false,
            ..SurfaceConfig::default()
        };
        let ron_str = config.to_ron_string().unwrap();
        let loaded = SurfaceConfig::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let loaded = SurfaceConfig::from_ron_str("(grid_cell: 32.0)").unwrap();
        assert_eq!(loaded.grid_cell, 32.0);
        assert_eq!(loaded.max_zoom, SurfaceConfig::default().max_zoom);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            SurfaceConfig::from_ron_str("(grid_cell: 0.0)"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SurfaceConfig::from_ron_str("(grid_cell: "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite_and_inverted_zoom() {
        for ron_str in [
            "(max_zoom: NaN)",
            "(min_zoom: NaN)",
            "(min_zoom: 2.0, max_zoom: 1.0)",
            "(handle_size: NaN)",
            "(link_hit_tolerance: -1.0)",
        ] {
            assert!(
                matches!(SurfaceConfig::from_ron_str(ron_str), Err(ConfigError::Invalid(_))),
                "{ron_str} should be rejected"
            );
        }
    }
}
