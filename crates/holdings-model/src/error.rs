//! Error types for the holdings model
//!
//! Covers:
//! - Marker validation before any remote write
//! - Decoding and encoding of wire records
//! - Configuration loading

use std::path::PathBuf;

/// Model-level error
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Marker name is empty or unset
    #[error("marker name is required")]
    MissingName,

    /// Coordinates are NaN or infinite and cannot be stored
    #[error("invalid marker position ({latitude}, {longitude})")]
    InvalidPosition {
        /// Vertical coordinate as given
        latitude: f64,
        /// Horizontal coordinate as given
        longitude: f64,
    },

    /// Remote value under `key` does not decode as the expected record
    #[error("malformed record at {key}: {source}")]
    MalformedRecord {
        /// Remote key of the offending record
        key: String,
        /// Underlying decode failure
        #[source]
        source: serde_json::Error,
    },

    /// Record could not be encoded for the store
    #[error("record encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Configuration file could not be read
    #[error("failed to read configuration {path}: {source}")]
    ConfigIo {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Configuration text is not valid TOML for [`crate::HoldingsConfig`]
    #[error("invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl ModelError {
    /// Check if this is a validation failure (surfaced to the caller, never to the store)
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingName | Self::InvalidPosition { .. })
    }
}
