//! Geohash-based proximity search with exact great-circle refinement.
//!
//! ## How a query runs
//! - **Coarse filter**: the radius picks a geohash prefix length, the query
//!   location's geohash is truncated to it and expanded to its 3x3 neighborhood.
//!   Storage matches stored geohashes against those prefixes.
//! - **Refinement**: fetched candidates get their true distance from the query
//!   location; anything at or beyond the radius is dropped, and results can be
//!   sorted nearest first.
//!
//! ```rust
//! use geoprox::{Distance, GeohashField, MemoryStore, Point, ProximityQuery};
//! use serde_json::json;
//!
//! let field = GeohashField::new("location");
//! let mut store = MemoryStore::new(&["location"]);
//! for (name, lat, lon) in [("near", 50.8230, -0.1447), ("far", 50.849, -0.1432)] {
//!     let location = field.to_column(&(lat, lon))?;
//!     store.insert(json!({"name": name, "location": location}))?;
//! }
//!
//! let results = ProximityQuery::new()
//!     .filter("location__distance_lt", &Point::new(50.8229, -0.143219), Distance::from_kilometers(0.5))?
//!     .execute(&store)?;
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].record["name"], "near");
//! # Ok::<(), geoprox::GeoproxError>(())
//! ```

pub mod coerce;
pub mod config;
pub mod distance;
pub mod error;
pub mod filter;
pub mod geohash;
pub mod point;
pub mod precision;
pub mod query;
pub mod storage;

pub use coerce::{coerce_point, to_point};
pub use config::Config;
pub use distance::{Distance, DistanceMetric};
pub use error::{GeoproxError, Result};
pub use filter::{Candidate, Match, PrefixFilter, Refinement};
pub use geohash::{Direction, Geohash};
pub use point::Point;
pub use precision::precision_for_radius;
pub use query::{Lookup, ProximityCondition, ProximityQuery};
pub use storage::{CandidateSource, GeohashField, MemoryStore, StoreStats};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{
        Candidate, CandidateSource, Config, Distance, DistanceMetric, Geohash, GeohashField,
        GeoproxError, Match, MemoryStore, Point, ProximityQuery, Result,
    };
}
