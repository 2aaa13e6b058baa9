//! Latitude/longitude points with geohash encoding and great-circle distance.

use crate::distance::{Distance, DistanceMetric};
use crate::error::{GeoproxError, Result};
use crate::geohash::{Geohash, MAX_PRECISION};
use serde::{Deserialize, Serialize};

/// A geographic point in degrees.
///
/// Construction performs no range validation; out-of-range values are kept
/// as given and only rejected when they reach the geohash encoder.
///
/// ```rust
/// use geoprox::Point;
///
/// let brighton = Point::new(50.822482, -0.141449);
/// assert_eq!(brighton.geohash(12)?.as_str(), "gcpchgbyrvrf");
/// # Ok::<(), geoprox::GeoproxError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Encode this point as a geohash of `precision` characters (1..=12).
    ///
    /// # Errors
    ///
    /// `InvalidPrecision` for a precision outside 1..=12 and
    /// `InvalidCoordinate` when the point lies outside the valid
    /// latitude/longitude ranges.
    pub fn geohash(&self, precision: usize) -> Result<Geohash> {
        if !(1..=MAX_PRECISION).contains(&precision) {
            return Err(GeoproxError::InvalidPrecision(precision));
        }
        if !self.is_valid() {
            return Err(GeoproxError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }

        let coord = geohash::Coord {
            x: self.longitude,
            y: self.latitude,
        };
        let encoded = geohash::encode(coord, precision).map_err(|_| {
            GeoproxError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            }
        })?;
        Ok(Geohash::from(encoded))
    }

    /// Geohash at the maximum supported precision.
    pub fn full_geohash(&self) -> Result<Geohash> {
        self.geohash(MAX_PRECISION)
    }

    /// Haversine distance to `other`.
    pub fn distance_from(&self, other: &Point) -> Distance {
        self.distance_with(other, DistanceMetric::Haversine)
    }

    pub fn distance_with(&self, other: &Point, metric: DistanceMetric) -> Distance {
        Distance::from_meters(metric.measure((*self).into(), (*other).into()))
    }

    /// `(latitude, longitude)`
    #[inline]
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Mapping form keyed by `latitude` / `longitude`.
    pub fn as_map(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::with_capacity(2);
        map.insert("latitude".into(), self.latitude.into());
        map.insert("longitude".into(), self.longitude.into());
        map
    }

    fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl From<(f64, f64)> for Point {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<Point> for geo::Point<f64> {
    fn from(point: Point) -> Self {
        geo::Point::new(point.longitude, point.latitude)
    }
}

impl From<geo::Point<f64>> for Point {
    fn from(point: geo::Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}
