//! Storage-side collaborators.
//!
//! The proximity core never performs I/O. It hands [`PrefixFilter`]s to a
//! [`CandidateSource`] and refines whatever comes back. This module provides
//! the column encoding used to persist locations and an in-memory source
//! that answers prefix filters with ordered range scans.

use crate::coerce::coerce_point;
use crate::error::{GeoproxError, Result};
use crate::filter::{Candidate, PrefixFilter};
use crate::geohash::{Geohash, MAX_PRECISION};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Storage-layer collaborator that answers coarse proximity filters.
pub trait CandidateSource {
    type Record: Candidate;

    /// Records passing every filter. Within one filter the prefixes are OR'd.
    /// An empty filter list returns every record.
    fn fetch(&self, filters: &[PrefixFilter]) -> Result<Vec<Self::Record>>;
}

/// A location column persisted as a full-length geohash string.
///
/// Every stored value has [`GeohashField::max_length`] characters, so any
/// prefix length a coarse filter picks can match it.
///
/// ```rust
/// use geoprox::GeohashField;
///
/// let field = GeohashField::new("location");
/// assert_eq!(field.to_column(&(50.822482, -0.141449))?.as_str(), "gcpchgbyrvrf");
/// assert_eq!(field.to_column("gcpchgbyrvrf")?.as_str(), "gcpchgbyrvrf");
/// # Ok::<(), geoprox::GeoproxError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeohashField {
    name: String,
}

impl GeohashField {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column width.
    pub const fn max_length() -> usize {
        MAX_PRECISION
    }

    /// Prepare a value for storage.
    ///
    /// Strings are taken as geohashes and must already be full length.
    /// Any other value is coerced to a point and encoded at full length.
    pub fn to_column<T: Serialize + ?Sized>(&self, value: &T) -> Result<Geohash> {
        match serde_json::to_value(value)? {
            Value::String(raw) => Self::check_stored(&self.name, &raw),
            other => coerce_point(&other)?.full_geohash(),
        }
    }

    /// Parse a stored value and require the full column width.
    fn check_stored(field: &str, raw: &str) -> Result<Geohash> {
        let geohash = Geohash::parse(raw)?;
        if geohash.len() != Self::max_length() {
            return Err(GeoproxError::InvalidInput(format!(
                "'{}' value '{}' has {} characters, column stores {}",
                field,
                raw,
                geohash.len(),
                Self::max_length()
            )));
        }
        Ok(geohash)
    }

    /// Wrap a stored string. Decoding stays lazy.
    pub fn from_column(&self, raw: &str) -> Geohash {
        Geohash::from(raw)
    }
}

/// Store statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub record_count: usize,
    pub indexed_fields: usize,
    pub indexed_values: usize,
}

/// In-memory candidate source with one ordered geohash index per field.
///
/// Prefix filters become range scans over a `BTreeMap`, the same access
/// pattern a relational index serves for `LIKE 'prefix%'`.
pub struct MemoryStore<R> {
    records: Vec<R>,
    indexes: FxHashMap<String, BTreeMap<String, Vec<usize>>>,
}

impl<R: Candidate> MemoryStore<R> {
    /// Store indexing the given geohash fields.
    pub fn new<S: AsRef<str>>(fields: &[S]) -> Self {
        let indexes = fields
            .iter()
            .map(|field| (field.as_ref().to_string(), BTreeMap::new()))
            .collect();
        Self {
            records: Vec::new(),
            indexes,
        }
    }

    /// Insert a record, returning its id.
    ///
    /// Every indexed field present on the record must hold a valid
    /// full-length geohash. Missing fields are left out of that index.
    pub fn insert(&mut self, record: R) -> Result<usize> {
        let id = self.records.len();

        let mut entries = Vec::with_capacity(self.indexes.len());
        for field in self.indexes.keys() {
            if let Some(raw) = record.geohash(field) {
                let geohash = GeohashField::check_stored(field, raw)?;
                entries.push((field.clone(), geohash.into_string()));
            }
        }

        for (field, geohash) in entries {
            if let Some(index) = self.indexes.get_mut(&field) {
                index.entry(geohash).or_default().push(id);
            }
        }
        self.records.push(record);
        Ok(id)
    }

    pub fn get(&self, id: usize) -> Option<&R> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> + '_ {
        self.records.iter()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            record_count: self.records.len(),
            indexed_fields: self.indexes.len(),
            indexed_values: self
                .indexes
                .values()
                .flat_map(|index| index.values())
                .map(Vec::len)
                .sum(),
        }
    }

    /// Ids whose `field` value starts with `prefix`, if the field is indexed.
    pub fn scan_prefix(&self, field: &str, prefix: &str) -> Option<Vec<usize>> {
        let index = self.indexes.get(field)?;
        let ids = index
            .range(prefix.to_string()..)
            .take_while(|(geohash, _)| geohash.starts_with(prefix))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        Some(ids)
    }

    fn matching_ids(&self, filter: &PrefixFilter) -> FxHashSet<usize> {
        let mut ids = FxHashSet::default();
        for prefix in filter.prefixes() {
            match self.scan_prefix(filter.field(), prefix) {
                Some(found) => ids.extend(found),
                None => {
                    log::warn!(
                        "field '{}' is not indexed, scanning all records",
                        filter.field()
                    );
                    return self
                        .records
                        .iter()
                        .enumerate()
                        .filter(|(_, record)| filter.accepts(*record))
                        .map(|(id, _)| id)
                        .collect();
                }
            }
        }
        ids
    }
}

impl<R: Candidate + Clone> CandidateSource for MemoryStore<R> {
    type Record = R;

    fn fetch(&self, filters: &[PrefixFilter]) -> Result<Vec<R>> {
        let mut selected: Option<FxHashSet<usize>> = None;
        for filter in filters {
            let ids = self.matching_ids(filter);
            selected = Some(match selected {
                Some(current) => current.intersection(&ids).copied().collect(),
                None => ids,
            });
        }

        let records = match selected {
            None => self.records.clone(),
            Some(ids) => {
                let mut ids: Vec<usize> = ids.into_iter().collect();
                ids.sort_unstable();
                ids.into_iter().map(|id| self.records[id].clone()).collect()
            }
        };

        log::debug!(
            "fetched {} of {} records for {} filters",
            records.len(),
            self.records.len(),
            filters.len()
        );
        Ok(records)
    }
}
