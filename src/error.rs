//! Error types for geoprox.

use thiserror::Error;

/// Errors raised while encoding, expanding or refining proximity queries.
///
/// Every failure is local to the query being processed. The computations are
/// deterministic, so retrying with the same input reproduces the same error.
#[derive(Debug, Error)]
pub enum GeoproxError {
    /// Geohash contains characters outside the base-32 alphabet, or is empty.
    #[error("invalid geohash '{geohash}': {reason}")]
    InvalidGeohash { geohash: String, reason: String },

    /// Truncation requested beyond the current geohash length.
    #[error("cannot truncate geohash of length {length} to {requested} characters")]
    InvalidTruncationLength { length: usize, requested: usize },

    /// Radius has no geohash length in the error table.
    #[error("unsupported radius: {0} km")]
    UnsupportedRadius(f64),

    /// Location value matched none of the supported shapes.
    #[error("unsupported location shape: {0}")]
    UnsupportedLocation(String),

    /// Coordinates outside the range a geohash can represent.
    #[error("coordinate out of range: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// Geohash precision outside 1..=12.
    #[error("invalid geohash precision {0}, expected 1..=12")]
    InvalidPrecision(usize),

    /// Filter keyword without a known lookup suffix.
    #[error("unknown lookup '{0}'")]
    UnknownLookup(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "toml")]
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GeoproxError {
    pub(crate) fn invalid_geohash(geohash: &str, reason: impl ToString) -> Self {
        Self::InvalidGeohash {
            geohash: geohash.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeoproxError>;
