//! Geohash value type: decoding, truncation and neighbor expansion.
//!
//! A [`Geohash`] wraps the raw base-32 string that storage layers persist and
//! compare by prefix. Decoding is lazy and memoized, so constructing a value
//! never fails; malformed characters surface on the first decode.

use crate::error::{GeoproxError, Result};
use crate::point::Point;
use once_cell::sync::OnceCell;
use smallvec::SmallVec;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// The standard geohash base-32 alphabet.
pub const BASE32: &str = "0123456789bcdefghjkmnpqrstuvwxyz";

/// Longest geohash the encoder produces.
pub const MAX_PRECISION: usize = 12;

/// Grid directions around a geohash cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// `(latitude step, longitude step)` in cells.
    fn offsets(self) -> (f64, f64) {
        match self {
            Direction::N => (1.0, 0.0),
            Direction::NE => (1.0, 1.0),
            Direction::E => (0.0, 1.0),
            Direction::SE => (-1.0, 1.0),
            Direction::S => (-1.0, 0.0),
            Direction::SW => (-1.0, -1.0),
            Direction::W => (0.0, -1.0),
            Direction::NW => (1.0, -1.0),
        }
    }
}

/// The 3x3 neighborhood of a cell, the cell itself first.
pub type Neighborhood = SmallVec<[Geohash; 9]>;

/// A geohash string with lazy decode to its cell center.
///
/// Equality, ordering and hashing only look at the string, so a `Geohash`
/// can be looked up in sets by `&str`.
///
/// ```rust
/// use geoprox::Geohash;
///
/// let hash = Geohash::from("gcpchgbyrvrf");
/// let center = hash.point()?;
/// assert!((center.latitude - 50.822482).abs() < 1e-5);
///
/// let cell = hash.trim(6)?;
/// assert_eq!(cell.as_str(), "gcpchg");
/// assert_eq!(cell.expand()?.len(), 9);
/// # Ok::<(), geoprox::GeoproxError>(())
/// ```
#[derive(Clone)]
pub struct Geohash {
    hash: String,
    point: OnceCell<Point>,
}

impl Geohash {
    /// Parse and validate every character against [`BASE32`].
    pub fn parse(hash: &str) -> Result<Self> {
        let geohash = Self::from(hash);
        geohash.validate()?;
        Ok(geohash)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.hash
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hash.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hash.is_empty()
    }

    /// Check the string is non-empty and uses only the base-32 alphabet.
    pub fn validate(&self) -> Result<()> {
        if self.hash.is_empty() {
            return Err(GeoproxError::invalid_geohash(&self.hash, "empty geohash"));
        }
        if let Some(c) = self.hash.chars().find(|c| !BASE32.contains(*c)) {
            return Err(GeoproxError::invalid_geohash(
                &self.hash,
                format!("character '{c}' is not in the base-32 alphabet"),
            ));
        }
        Ok(())
    }

    /// Center of the cell, decoded on first access and cached.
    pub fn point(&self) -> Result<Point> {
        self.point
            .get_or_try_init(|| {
                let (center, _, _) = self.decode_raw()?;
                Ok(Point::new(center.y, center.x))
            })
            .copied()
    }

    /// Bounding cell as a `geo::Rect` (x = longitude, y = latitude).
    pub fn bbox(&self) -> Result<geo::Rect<f64>> {
        self.validate()?;
        geohash::decode_bbox(&self.hash).map_err(|e| GeoproxError::invalid_geohash(&self.hash, e))
    }

    /// First `length` characters as a new geohash.
    ///
    /// # Errors
    ///
    /// `InvalidTruncationLength` when `length` is zero or longer than the
    /// current geohash. Truncation never pads.
    pub fn trim(&self, length: usize) -> Result<Geohash> {
        if length == 0 || length > self.len() {
            return Err(GeoproxError::InvalidTruncationLength {
                length: self.len(),
                requested: length,
            });
        }
        self.hash
            .get(..length)
            .map(Geohash::from)
            .ok_or_else(|| GeoproxError::invalid_geohash(&self.hash, "truncation splits a character"))
    }

    /// Whether this geohash's cell contains `other`'s cell.
    pub fn is_prefix_of(&self, other: &str) -> bool {
        other.starts_with(self.as_str())
    }

    /// Adjacent cell of the same length.
    ///
    /// Longitude wraps across the antimeridian. Latitude does not wrap, so
    /// stepping past a pole yields `None`.
    pub fn neighbor(&self, direction: Direction) -> Result<Option<Geohash>> {
        // geohash::neighbor wraps latitude past the poles ("b" north is "0").
        let (center, lon_err, lat_err) = self.decode_raw()?;
        let (dlat, dlon) = direction.offsets();

        let latitude = center.y + 2.0 * lat_err.abs() * dlat;
        if !(-90.0..=90.0).contains(&latitude) {
            return Ok(None);
        }

        let mut longitude = center.x + 2.0 * lon_err.abs() * dlon;
        if longitude > 180.0 {
            longitude -= 360.0;
        } else if longitude < -180.0 {
            longitude += 360.0;
        }

        let coord = geohash::Coord {
            x: longitude,
            y: latitude,
        };
        geohash::encode(coord, self.len())
            .map(|hash| Some(Geohash::from(hash)))
            .map_err(|e| GeoproxError::invalid_geohash(&self.hash, e))
    }

    /// The existing neighbors in [`Direction::ALL`] order.
    pub fn neighbors(&self) -> Result<SmallVec<[Geohash; 8]>> {
        let mut out = SmallVec::new();
        for direction in Direction::ALL {
            if let Some(neighbor) = self.neighbor(direction)? {
                out.push(neighbor);
            }
        }
        Ok(out)
    }

    /// This cell plus its distinct grid neighbors.
    ///
    /// Interior cells give exactly nine hashes. Cells touching a pole give
    /// six, since there is nothing beyond the pole.
    pub fn expand(&self) -> Result<Neighborhood> {
        let mut cells = Neighborhood::new();
        cells.push(self.clone());
        for neighbor in self.neighbors()? {
            if !cells.contains(&neighbor) {
                cells.push(neighbor);
            }
        }
        Ok(cells)
    }

    fn decode_raw(&self) -> Result<(geohash::Coord<f64>, f64, f64)> {
        self.validate()?;
        geohash::decode(&self.hash).map_err(|e| GeoproxError::invalid_geohash(&self.hash, e))
    }
}

impl From<String> for Geohash {
    fn from(hash: String) -> Self {
        Self {
            hash,
            point: OnceCell::new(),
        }
    }
}

impl From<&str> for Geohash {
    fn from(hash: &str) -> Self {
        Self::from(hash.to_string())
    }
}

impl From<Geohash> for String {
    fn from(geohash: Geohash) -> Self {
        geohash.hash
    }
}

impl FromStr for Geohash {
    type Err = GeoproxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for Geohash {
    fn as_ref(&self) -> &str {
        &self.hash
    }
}

impl Borrow<str> for Geohash {
    fn borrow(&self) -> &str {
        &self.hash
    }
}

impl PartialEq for Geohash {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Geohash {}

impl PartialEq<str> for Geohash {
    fn eq(&self, other: &str) -> bool {
        self.hash == other
    }
}

impl PartialEq<&str> for Geohash {
    fn eq(&self, other: &&str) -> bool {
        self.hash == *other
    }
}

impl Hash for Geohash {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl PartialOrd for Geohash {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Geohash {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hash.cmp(&other.hash)
    }
}

impl fmt::Debug for Geohash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Geohash").field(&self.hash).finish()
    }
}

impl fmt::Display for Geohash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hash)
    }
}

impl serde::Serialize for Geohash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hash)
    }
}

impl<'de> serde::Deserialize<'de> for Geohash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Geohash::from)
    }
}
