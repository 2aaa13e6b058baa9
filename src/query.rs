//! Proximity query builder.
//!
//! A [`ProximityQuery`] collects distance conditions and produces the coarse
//! prefix filters for the storage layer plus the refinement contexts to run
//! over what it returns. Every builder method returns a new query, so
//! branching a base query never lets one branch see another's conditions.
//!
//! ```rust
//! use geoprox::{Distance, MemoryStore, Point, ProximityQuery};
//! use serde_json::json;
//!
//! let mut store = MemoryStore::new(&["location"]);
//! store.insert(json!({"name": "The Marwood", "location": "gcpchgbyrvrf"}))?;
//!
//! let here = Point::new(50.8229, -0.143219);
//! let nearby = ProximityQuery::new()
//!     .distance_lt("location", &here, Distance::from_kilometers(0.5))?
//!     .order_by_distance("location")
//!     .execute(&store)?;
//! assert_eq!(nearby.len(), 1);
//! # Ok::<(), geoprox::GeoproxError>(())
//! ```

use crate::coerce::to_point;
use crate::config::Config;
use crate::distance::Distance;
use crate::error::{GeoproxError, Result};
use crate::filter::{Candidate, Match, PrefixFilter, Refinement};
use crate::point::Point;
use crate::storage::CandidateSource;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const APPROX_DISTANCE_SUFFIX: &str = "__approx_distance_lt";
pub const EXACT_DISTANCE_SUFFIX: &str = "__distance_lt";

/// Distance lookups a filter keyword can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Coarse prefix filter only; may return records beyond the radius.
    ApproxDistanceLt,
    /// Coarse prefix filter followed by exact refinement.
    DistanceLt,
}

impl Lookup {
    pub fn suffix(self) -> &'static str {
        match self {
            Lookup::ApproxDistanceLt => APPROX_DISTANCE_SUFFIX,
            Lookup::DistanceLt => EXACT_DISTANCE_SUFFIX,
        }
    }

    pub fn is_exact(self) -> bool {
        matches!(self, Lookup::DistanceLt)
    }

    /// Split `"<field>__distance_lt"` style keywords into field and lookup.
    pub fn parse_keyword(keyword: &str) -> Result<(&str, Lookup)> {
        [Lookup::ApproxDistanceLt, Lookup::DistanceLt]
            .into_iter()
            .find_map(|lookup| {
                keyword
                    .strip_suffix(lookup.suffix())
                    .filter(|field| !field.is_empty())
                    .map(|field| (field, lookup))
            })
            .ok_or_else(|| GeoproxError::UnknownLookup(keyword.to_string()))
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix().trim_start_matches('_'))
    }
}

impl FromStr for Lookup {
    type Err = GeoproxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_start_matches('_') {
            "approx_distance_lt" => Ok(Lookup::ApproxDistanceLt),
            "distance_lt" => Ok(Lookup::DistanceLt),
            _ => Err(GeoproxError::UnknownLookup(s.to_string())),
        }
    }
}

/// One `(location, radius)` condition on a geohash field.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityCondition {
    pub field: String,
    pub location: Point,
    pub radius: Distance,
    pub lookup: Lookup,
}

impl ProximityCondition {
    pub fn new(field: impl Into<String>, location: Point, radius: Distance, lookup: Lookup) -> Self {
        Self {
            field: field.into(),
            location,
            radius,
            lookup,
        }
    }
}

/// Immutable proximity query.
#[derive(Debug, Clone, Default)]
pub struct ProximityQuery {
    config: Config,
    filters: Vec<PrefixFilter>,
    refinements: Vec<Refinement>,
    order_by: Option<String>,
}

impl ProximityQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Add a condition named by keyword, e.g. `"location__distance_lt"`.
    /// `location` may be any shape [`to_point`] accepts.
    pub fn filter<L: Serialize + ?Sized>(
        &self,
        keyword: &str,
        location: &L,
        radius: Distance,
    ) -> Result<Self> {
        let (field, lookup) = Lookup::parse_keyword(keyword)?;
        let location = to_point(location)?;
        self.condition(ProximityCondition::new(field, location, radius, lookup))
    }

    /// Records whose geohash falls in the cells around `location`.
    pub fn approx_distance_lt<L: Serialize + ?Sized>(
        &self,
        field: &str,
        location: &L,
        radius: Distance,
    ) -> Result<Self> {
        let location = to_point(location)?;
        self.condition(ProximityCondition::new(
            field,
            location,
            radius,
            Lookup::ApproxDistanceLt,
        ))
    }

    /// Records strictly closer than `radius` to `location`.
    pub fn distance_lt<L: Serialize + ?Sized>(
        &self,
        field: &str,
        location: &L,
        radius: Distance,
    ) -> Result<Self> {
        let location = to_point(location)?;
        self.condition(ProximityCondition::new(
            field,
            location,
            radius,
            Lookup::DistanceLt,
        ))
    }

    pub fn condition(&self, condition: ProximityCondition) -> Result<Self> {
        let filter = PrefixFilter::new(
            condition.field.as_str(),
            condition.location,
            condition.radius,
        )?;
        if filter.length() < self.config.min_precision {
            return Err(GeoproxError::UnsupportedRadius(condition.radius.kilometers()));
        }

        let mut query = self.clone();
        query.filters.push(filter);

        if condition.lookup.is_exact() {
            let refinement = Refinement::new(condition.field, condition.location, condition.radius)
                .with_metric(self.config.distance_metric);
            match query
                .refinements
                .iter_mut()
                .find(|existing| existing.field() == refinement.field())
            {
                Some(existing) => {
                    log::warn!(
                        "replacing exact distance condition on '{}'",
                        refinement.field()
                    );
                    *existing = refinement;
                }
                None => query.refinements.push(refinement),
            }
        }
        Ok(query)
    }

    /// Sort results nearest first by the exact distance on `field`.
    pub fn order_by_distance(&self, field: &str) -> Self {
        let mut query = self.clone();
        query.order_by = Some(field.to_string());
        query
    }

    /// Coarse filters to push down to storage. All must hold.
    pub fn prefix_filters(&self) -> &[PrefixFilter] {
        &self.filters
    }

    /// Refinement contexts, with the sort flag set on the ordering field.
    pub fn refinements(&self) -> Vec<Refinement> {
        self.refinements
            .iter()
            .map(|refinement| {
                let sort = self.order_by.as_deref() == Some(refinement.field());
                refinement.clone().with_sort(sort)
            })
            .collect()
    }

    pub fn is_exact(&self) -> bool {
        !self.refinements.is_empty()
    }

    /// Run every refinement over fetched candidates.
    pub fn refine<R, I>(&self, candidates: I) -> Result<Vec<Match<R>>>
    where
        R: Candidate,
        I: IntoIterator<Item = R>,
    {
        if let Some(field) = &self.order_by {
            if !self.refinements.iter().any(|r| r.field() == field) {
                return Err(GeoproxError::InvalidInput(format!(
                    "ordering by distance on '{field}' needs an exact distance condition on it"
                )));
            }
        }

        let mut matches: Vec<Match<R>> = candidates.into_iter().map(Match::new).collect();
        for refinement in self.refinements() {
            matches = refinement.apply(matches)?;
        }
        Ok(matches)
    }

    /// Fetch candidates from `source` and refine them.
    pub fn execute<S: CandidateSource>(&self, source: &S) -> Result<Vec<Match<S::Record>>> {
        let candidates = source.fetch(&self.filters)?;
        self.refine(candidates)
    }

    /// Number of results. Exact queries count refined matches.
    pub fn count<S: CandidateSource>(&self, source: &S) -> Result<usize> {
        if self.is_exact() {
            Ok(self.execute(source)?.len())
        } else {
            Ok(source.fetch(&self.filters)?.len())
        }
    }
}
