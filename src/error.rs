//! Typed error values shared across the crate.

use thiserror::Error;

/// Errors that can occur when loading, saving, or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the config file to disk.
    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to parse RON content.
    #[error("failed to parse config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// Failed to serialize config to RON.
    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] ron::Error),

    /// A palette entry is not a `#RRGGBB` color.
    #[error("invalid color for {field}: {value:?}")]
    InvalidColor { field: &'static str, value: String },

    /// A numeric setting is outside its allowed range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Failures raised while attaching the backdrop to a host surface.
#[derive(Debug, Error)]
pub enum BackdropError {
    /// The environment cannot host a rendering surface; nothing was built.
    #[error("rendering environment unavailable")]
    EnvironmentUnavailable,

    /// The host window or canvas could not be created or found.
    #[error("failed to initialize {stage}: {message}")]
    HostInit { stage: &'static str, message: String },

    /// The GPU ran out of memory while presenting a frame.
    #[error("GPU is out of memory")]
    OutOfMemory,
}
