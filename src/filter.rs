//! Two-phase proximity filtering.
//!
//! Phase 1 ([`PrefixFilter`]) is handed to the storage layer: a set of geohash
//! prefixes, OR'd together, that over-approximates the search circle. Phase 2
//! ([`Refinement`]) runs in process over the fetched candidates, computing the
//! true distance, dropping everything at or beyond the radius and optionally
//! sorting nearest first.

use crate::distance::{Distance, DistanceMetric};
use crate::error::Result;
use crate::geohash::{Geohash, Neighborhood};
use crate::point::Point;
use crate::precision::precision_for_radius;
use serde::Serialize;
use std::collections::BTreeMap;

/// A record fetched by the storage layer.
///
/// The core only needs to read the raw geohash stored under a field name.
pub trait Candidate {
    /// Raw geohash stored under `field`, or `None` if the record has no value.
    fn geohash(&self, field: &str) -> Option<&str>;
}

impl Candidate for serde_json::Value {
    fn geohash(&self, field: &str) -> Option<&str> {
        self.get(field)?.as_str()
    }
}

impl Candidate for BTreeMap<String, String> {
    fn geohash(&self, field: &str) -> Option<&str> {
        self.get(field).map(String::as_str)
    }
}

/// Coarse filter: `field` starts with any of `cells`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixFilter {
    field: String,
    length: usize,
    cells: Neighborhood,
}

impl PrefixFilter {
    /// Build the 3x3 cell neighborhood covering `radius` around `location`.
    ///
    /// ```rust
    /// use geoprox::{Distance, Point, PrefixFilter};
    ///
    /// let filter = PrefixFilter::new("location", Point::new(50.8229, -0.143219), Distance::from_kilometers(0.5))?;
    /// assert_eq!(filter.length(), 6);
    /// assert_eq!(filter.prefixes().count(), 9);
    /// assert!(filter.matches("gcpchu4bc54p"));
    /// # Ok::<(), geoprox::GeoproxError>(())
    /// ```
    pub fn new(field: impl Into<String>, location: Point, radius: Distance) -> Result<Self> {
        let field = field.into();
        let length = precision_for_radius(radius.kilometers())?;
        let cells = location.full_geohash()?.trim(length)?.expand()?;

        log::debug!(
            "coarse filter on '{}': radius {}, prefix length {}, {} cells",
            field,
            radius,
            length,
            cells.len()
        );

        Ok(Self {
            field,
            length,
            cells,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Prefix length chosen for the radius.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn cells(&self) -> &[Geohash] {
        &self.cells
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> + '_ {
        self.cells.iter().map(Geohash::as_str)
    }

    /// Whether a stored geohash passes the disjunction.
    pub fn matches(&self, geohash: &str) -> bool {
        self.cells.iter().any(|cell| cell.is_prefix_of(geohash))
    }

    /// Whether `candidate`'s value for this filter's field passes.
    pub fn accepts<C: Candidate + ?Sized>(&self, candidate: &C) -> bool {
        candidate
            .geohash(&self.field)
            .is_some_and(|geohash| self.matches(geohash))
    }
}

/// A refined record with the distances computed for it, keyed by field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match<R> {
    pub record: R,
    distances: BTreeMap<String, Distance>,
}

impl<R> Match<R> {
    pub fn new(record: R) -> Self {
        Self {
            record,
            distances: BTreeMap::new(),
        }
    }

    /// Distance from the query location for `field`, once refined.
    pub fn distance(&self, field: &str) -> Option<Distance> {
        self.distances.get(field).copied()
    }

    pub fn distances(&self) -> impl Iterator<Item = (&str, Distance)> + '_ {
        self.distances.iter().map(|(field, d)| (field.as_str(), *d))
    }

    pub fn into_record(self) -> R {
        self.record
    }
}

impl<R: Candidate> Candidate for Match<R> {
    fn geohash(&self, field: &str) -> Option<&str> {
        self.record.geohash(field)
    }
}

/// Exact-distance refinement context for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    field: String,
    location: Point,
    radius: Distance,
    sort: bool,
    metric: DistanceMetric,
}

impl Refinement {
    pub fn new(field: impl Into<String>, location: Point, radius: Distance) -> Self {
        Self {
            field: field.into(),
            location,
            radius,
            sort: false,
            metric: DistanceMetric::default(),
        }
    }

    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn radius(&self) -> Distance {
        self.radius
    }

    pub fn sorts(&self) -> bool {
        self.sort
    }

    /// Matching coarse filter for this context.
    pub fn prefix_filter(&self) -> Result<PrefixFilter> {
        PrefixFilter::new(self.field.clone(), self.location, self.radius)
    }

    /// Refine raw candidates.
    pub fn refine<R, I>(&self, candidates: I) -> Result<Vec<Match<R>>>
    where
        R: Candidate,
        I: IntoIterator<Item = R>,
    {
        self.apply(candidates.into_iter().map(Match::new).collect())
    }

    /// Refine already wrapped matches. Re-applying the same refinement to its
    /// own output returns the same matches in the same order.
    ///
    /// Records without a value for the field are dropped. A stored value that
    /// is not a valid geohash fails the whole refinement.
    pub fn apply<R: Candidate>(&self, matches: Vec<Match<R>>) -> Result<Vec<Match<R>>> {
        let mut retained = Vec::with_capacity(matches.len());

        for mut candidate in matches {
            let Some(raw) = candidate.record.geohash(&self.field) else {
                log::warn!("candidate has no '{}' value, skipping", self.field);
                continue;
            };
            let point = Geohash::from(raw).point()?;
            let distance = point.distance_with(&self.location, self.metric);

            log::trace!("'{}' = {} is {} from query", self.field, raw, distance);
            candidate.distances.insert(self.field.clone(), distance);

            if distance < self.radius {
                retained.push(candidate);
            }
        }

        if self.sort {
            self.sort_matches(&mut retained);
        }
        Ok(retained)
    }

    /// Stable ascending sort on this context's distance.
    pub fn sort_matches<R>(&self, matches: &mut [Match<R>]) {
        matches.sort_by(|a, b| {
            let da = a.distance(&self.field).unwrap_or(Distance::from_kilometers(f64::INFINITY));
            let db = b.distance(&self.field).unwrap_or(Distance::from_kilometers(f64::INFINITY));
            da.total_cmp(&db)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeoproxError;
    use serde_json::json;

    fn query() -> Point {
        Point::new(50.8229, -0.143219)
    }

    fn record(name: &str, lat: f64, lon: f64) -> serde_json::Value {
        let hash = Point::new(lat, lon).full_geohash().unwrap();
        json!({"name": name, "location": hash.as_str()})
    }

    fn names(matches: &[Match<serde_json::Value>]) -> Vec<&str> {
        matches
            .iter()
            .map(|m| m.record["name"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_prefix_filter_cells() {
        let filter = PrefixFilter::new("location", query(), Distance::from_kilometers(0.5)).unwrap();
        assert_eq!(filter.field(), "location");
        assert_eq!(filter.length(), 6);
        assert_eq!(filter.cells()[0], "gcpchs");
        assert!(filter.matches("gcpchsn9kjzu"));
        assert!(filter.matches("gcpchu4bc54p"));
        assert!(!filter.matches("gcpck8z8zhwk"));
    }

    #[test]
    fn test_prefix_filter_accepts_candidates() {
        let filter = PrefixFilter::new("location", query(), Distance::from_kilometers(0.5)).unwrap();
        assert!(filter.accepts(&record("near", 50.8230, -0.1447)));
        assert!(!filter.accepts(&record("far", 50.849, -0.1432)));
        assert!(!filter.accepts(&json!({"name": "nowhere"})));
    }

    #[test]
    fn test_prefix_filter_rejects_bad_radius() {
        assert!(PrefixFilter::new("location", query(), Distance::from_kilometers(5_000.0)).is_err());
    }

    #[test]
    fn test_refine_filters_strictly_and_sorts() {
        let candidates = vec![
            record("decoy", 50.8270, -0.1520),
            record("across", 50.8229, -0.1390),
            record("near", 50.8230, -0.1447),
        ];
        let refinement =
            Refinement::new("location", query(), Distance::from_kilometers(0.5)).with_sort(true);

        let matches = refinement.refine(candidates).unwrap();
        assert_eq!(names(&matches), vec!["near", "across"]);

        let near = matches[0].distance("location").unwrap().kilometers();
        assert!((near - 0.1046).abs() < 0.005);
    }

    #[test]
    fn test_refine_without_sort_keeps_input_order() {
        let candidates = vec![
            record("across", 50.8229, -0.1390),
            record("near", 50.8230, -0.1447),
        ];
        let refinement = Refinement::new("location", query(), Distance::from_kilometers(0.5));
        let matches = refinement.refine(candidates).unwrap();
        assert_eq!(names(&matches), vec!["across", "near"]);
    }

    #[test]
    fn test_refine_is_idempotent() {
        let candidates = vec![
            record("across", 50.8229, -0.1390),
            record("decoy", 50.8270, -0.1520),
            record("near", 50.8230, -0.1447),
        ];
        let refinement =
            Refinement::new("location", query(), Distance::from_kilometers(0.5)).with_sort(true);

        let once = refinement.refine(candidates).unwrap();
        let twice = refinement.apply(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_refine_skips_missing_and_fails_on_invalid() {
        let refinement = Refinement::new("location", query(), Distance::from_kilometers(0.5));

        let matches = refinement.refine(vec![json!({"name": "blank"})]).unwrap();
        assert!(matches.is_empty());

        let result = refinement.refine(vec![json!({"location": "gcpa!"})]);
        assert!(matches!(result, Err(GeoproxError::InvalidGeohash { .. })));
    }

    #[test]
    fn test_zero_radius_keeps_nothing() {
        let refinement = Refinement::new("location", query(), Distance::ZERO);
        let matches = refinement
            .refine(vec![record("near", 50.8230, -0.1447)])
            .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_distance_boundary_is_exclusive() {
        let hash = Point::new(50.8230, -0.1447).full_geohash().unwrap();
        let exact = hash.point().unwrap().distance_from(&query());
        let refinement = Refinement::new("location", query(), exact);
        let matches = refinement
            .refine(vec![json!({"location": hash.as_str()})])
            .unwrap();
        assert!(matches.is_empty());
    }
}
