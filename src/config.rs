//! Configuration for proximity queries.

use crate::distance::DistanceMetric;
use crate::error::{GeoproxError, Result};
use crate::geohash::MAX_PRECISION;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Query configuration.
///
/// Loadable from JSON, or TOML with the `toml` feature. Missing fields take
/// their defaults.
///
/// ```rust
/// use geoprox::{Config, DistanceMetric};
///
/// let config = Config::from_json_str(r#"{ "distance_metric": "geodesic" }"#)?;
/// assert_eq!(config.distance_metric, DistanceMetric::Geodesic);
/// assert_eq!(config.min_precision, 1);
/// # Ok::<(), geoprox::GeoproxError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Metric used for exact refinement
    #[serde(default)]
    pub distance_metric: DistanceMetric,

    /// Coarsest prefix a coarse filter may use (1-12, default: 1).
    /// Radii needing a shorter prefix are rejected.
    #[serde(default = "Config::default_min_precision")]
    pub min_precision: usize,
}

impl Config {
    const fn default_min_precision() -> usize {
        1
    }

    pub fn with_distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.distance_metric = metric;
        self
    }

    pub fn with_min_precision(mut self, precision: usize) -> Self {
        self.min_precision = precision;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_PRECISION).contains(&self.min_precision) {
            return Err(GeoproxError::Config(format!(
                "min_precision must be between 1 and {MAX_PRECISION}, got {}",
                self.min_precision
            )));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json` or (with the `toml` feature) `.toml` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            #[cfg(feature = "toml")]
            Some("toml") => Self::from_toml_str(&contents),
            other => Err(GeoproxError::Config(format!(
                "unsupported config format: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            distance_metric: DistanceMetric::default(),
            min_precision: Self::default_min_precision(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.min_precision, 1);
        assert_eq!(config.distance_metric, DistanceMetric::Haversine);
        assert!(config.validate().is_ok());
        assert_eq!(Config::from_json_str("{}").unwrap(), config);
    }

    #[test]
    fn test_validation() {
        assert!(Config::default().with_min_precision(0).validate().is_err());
        assert!(Config::default().with_min_precision(13).validate().is_err());
        assert!(Config::default().with_min_precision(12).validate().is_ok());
        assert!(Config::from_json_str(r#"{"min_precision": 20}"#).is_err());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"min_precision": 4, "distance_metric": "rhumb"}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.min_precision, 4);
        assert_eq!(config.distance_metric, DistanceMetric::Rhumb);
    }

    #[test]
    fn test_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(GeoproxError::Config(_))
        ));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_from_toml() {
        let config = Config::from_toml_str("min_precision = 3\ndistance_metric = \"geodesic\"").unwrap();
        assert_eq!(config.min_precision, 3);
        assert_eq!(config.distance_metric, DistanceMetric::Geodesic);
    }
}
