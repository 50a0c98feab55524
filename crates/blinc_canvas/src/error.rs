//! Canvas error types

use std::io;
use thiserror::Error;

/// Errors raised outside the tessellation path (configuration loading)
#[derive(Error, Debug)]
pub enum CanvasError {
    /// IO error when reading a configuration file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration parsing error
    #[error("Config parsing error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A configuration value is out of range
    #[error("Invalid value for `{name}`: {value}")]
    InvalidValue { name: &'static str, value: f32 },
}

pub type Result<T> = std::result::Result<T, CanvasError>;
