//! Distance values and the metrics used to compute them.

use geo::{Distance as _, Geodesic, Haversine, Rhumb};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

const METERS_PER_KILOMETER: f64 = 1_000.0;
const KILOMETERS_PER_MILE: f64 = 1.609_344;

/// Distance metrics for great-circle calculations.
///
/// - **Haversine**: spherical Earth, fast, accurate enough for proximity search
/// - **Geodesic**: ellipsoidal distance (Karney 2013), slower
/// - **Rhumb**: constant bearing distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Haversine,
    Geodesic,
    Rhumb,
}

impl DistanceMetric {
    /// Distance in meters between two `geo` points.
    pub(crate) fn measure(self, a: geo::Point<f64>, b: geo::Point<f64>) -> f64 {
        match self {
            DistanceMetric::Haversine => Haversine.distance(a, b),
            DistanceMetric::Geodesic => Geodesic.distance(a, b),
            DistanceMetric::Rhumb => Rhumb.distance(a, b),
        }
    }
}

/// A derived, never stored, distance. Held internally in kilometers.
///
/// ```rust
/// use geoprox::Distance;
///
/// let radius = Distance::from_meters(500.0);
/// assert_eq!(radius.kilometers(), 0.5);
/// assert!(radius < Distance::from_kilometers(1.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distance {
    km: f64,
}

impl Distance {
    pub const ZERO: Distance = Distance { km: 0.0 };

    #[inline]
    pub const fn from_kilometers(km: f64) -> Self {
        Self { km }
    }

    #[inline]
    pub fn from_meters(meters: f64) -> Self {
        Self::from_kilometers(meters / METERS_PER_KILOMETER)
    }

    #[inline]
    pub fn from_miles(miles: f64) -> Self {
        Self::from_kilometers(miles * KILOMETERS_PER_MILE)
    }

    #[inline]
    pub fn kilometers(&self) -> f64 {
        self.km
    }

    #[inline]
    pub fn meters(&self) -> f64 {
        self.km * METERS_PER_KILOMETER
    }

    #[inline]
    pub fn miles(&self) -> f64 {
        self.km / KILOMETERS_PER_MILE
    }

    /// Total ordering used when sorting refined results. NaN sorts last.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.km.total_cmp(&other.km)
    }
}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.km.partial_cmp(&other.km)
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} km", self.km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversions() {
        let d = Distance::from_meters(2_500.0);
        assert_eq!(d.kilometers(), 2.5);
        assert_eq!(d.meters(), 2_500.0);

        let mile = Distance::from_miles(1.0);
        assert!((mile.kilometers() - 1.609_344).abs() < 1e-12);
        assert!((mile.miles() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ordering() {
        let near = Distance::from_kilometers(0.1);
        let far = Distance::from_kilometers(3.0);
        assert!(near < far);
        assert_eq!(near.total_cmp(&far), Ordering::Less);
        assert_eq!(
            Distance::from_kilometers(f64::NAN).total_cmp(&far),
            Ordering::Greater
        );
    }

    #[test]
    fn test_metric_serde() {
        let metric: DistanceMetric = serde_json::from_str("\"geodesic\"").unwrap();
        assert_eq!(metric, DistanceMetric::Geodesic);
        assert_eq!(DistanceMetric::default(), DistanceMetric::Haversine);
    }

    #[test]
    fn test_display() {
        assert_eq!(Distance::from_kilometers(2.0).to_string(), "2 km");
    }
}
