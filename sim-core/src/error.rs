//! Error types for the particle engine.

use std::io;
use thiserror::Error;

/// Errors surfaced while building an engine or loading its configuration.
///
/// Nothing that happens during a tick is reported through this type: the
/// engine latches recoverable conditions into its own state instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A color string in the configuration is not valid hex
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// The image shape is configured without an image source
    #[error("Image shape configured without an image source")]
    MissingImageSource,

    /// The image asset could not be fetched or decoded
    #[error("Failed to load image asset: {0}")]
    AssetLoad(String),

    /// A configuration document could not be parsed
    #[error("Invalid configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// I/O error while reading a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
