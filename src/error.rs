use std::time::Duration;

use thiserror::Error;

/// Failure turning an uploaded buffer into entries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("archive is corrupt: {reason}")]
    Corrupt { reason: String },

    #[error("archive contains no members")]
    Empty,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AggregationError {
    #[error("no objects to group into series")]
    NoContent,
}

/// Soft failure of the pixel decode path; always paired with a placeholder frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("pixel decoder is not available")]
    Unavailable,

    #[error("object is not a decodable image: {reason}")]
    Malformed { reason: String },
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ValidationError {
    #[error("invalid window (level {level}, width {width}): width must be positive")]
    InvalidWindow { level: f64, width: f64 },

    #[error("invalid zoom factor {factor}: must be positive")]
    InvalidZoom { factor: f64 },
}

/// Outcome of a `load` that did not reach `Ready`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error("load did not finish within {deadline:?}")]
    DeadlineExceeded { deadline: Duration },

    /// A newer load was issued; this one's result was discarded.
    #[error("load was superseded by a newer request")]
    Superseded,

    #[error("load worker was interrupted: {reason}")]
    Interrupted { reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
