//! Geometry builder configuration
//!
//! Tunables are read once when a [`GeometryBuilder`](crate::GeometryBuilder) is
//! constructed. They can be built in code or loaded from a TOML document:
//!
//! ```toml
//! allow_antialias = true
//! tess_tolerance = 0.1
//! fringe_width = 1.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CanvasError, Result};

/// Canvas tessellation settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Master switch for fringe anti-aliasing
    pub allow_antialias: bool,
    /// Enable anti-aliasing even when the caller did not ask for it
    pub force_antialias: bool,
    /// Curve flattening tolerance
    pub tess_tolerance: f32,
    /// Distance under which two points are considered equal
    pub dist_tolerance: f32,
    /// Width of the anti-aliasing fringe
    pub fringe_width: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            allow_antialias: false,
            force_antialias: false,
            tess_tolerance: 0.25,
            dist_tolerance: 0.01,
            fringe_width: 1.0,
        }
    }
}

impl CanvasConfig {
    /// Config with anti-aliasing allowed and forced on
    pub fn antialiased() -> Self {
        Self {
            allow_antialias: true,
            force_antialias: true,
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CanvasConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tess_tolerance.is_nan() || self.tess_tolerance <= 0.0 {
            return Err(CanvasError::InvalidValue {
                name: "tess_tolerance",
                value: self.tess_tolerance,
            });
        }
        if self.dist_tolerance.is_nan() || self.dist_tolerance <= 0.0 {
            return Err(CanvasError::InvalidValue {
                name: "dist_tolerance",
                value: self.dist_tolerance,
            });
        }
        if self.fringe_width.is_nan() || self.fringe_width < 0.0 {
            return Err(CanvasError::InvalidValue {
                name: "fringe_width",
                value: self.fringe_width,
            });
        }
        Ok(())
    }

    /// Effective anti-aliasing state for a caller request
    pub fn resolve_antialias(&self, requested: bool) -> bool {
        (requested || self.force_antialias) && self.allow_antialias
    }
}
