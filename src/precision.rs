//! Maps a search radius to the geohash prefix length that covers it.

use crate::error::{GeoproxError, Result};

/// Half-cell error in kilometers, indexed by geohash length minus one.
pub const GEOHASH_ERROR_KM: [f64; 8] = [2500.0, 630.0, 78.0, 20.0, 2.4, 0.61, 0.076, 0.019];

/// Finest tabulated geohash length.
pub const MAX_TABULATED_LENGTH: usize = GEOHASH_ERROR_KM.len();

/// Half-cell error for a geohash of `length` characters, if tabulated.
pub fn error_for_length(length: usize) -> Option<f64> {
    length
        .checked_sub(1)
        .and_then(|index| GEOHASH_ERROR_KM.get(index))
        .copied()
}

/// Geohash prefix length to use for a search of `radius_km`.
///
/// Finds the first length whose error is below the radius and steps back one
/// length, so the chosen cell is always at least as coarse as the radius.
/// That single step of over-coverage is what lets a 3x3 neighbor expansion
/// catch every point within the radius.
///
/// Radii at or below the finest tabulated error clamp to that finest length,
/// which still covers them.
///
/// # Errors
///
/// `UnsupportedRadius` for a non-finite or non-positive radius, or one larger
/// than the coarsest cell error.
///
/// ```rust
/// use geoprox::precision::precision_for_radius;
///
/// assert_eq!(precision_for_radius(2.0)?, 5);
/// assert_eq!(precision_for_radius(0.5)?, 6);
/// # Ok::<(), geoprox::GeoproxError>(())
/// ```
pub fn precision_for_radius(radius_km: f64) -> Result<usize> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(GeoproxError::UnsupportedRadius(radius_km));
    }

    match GEOHASH_ERROR_KM.iter().position(|&error| error < radius_km) {
        // Coarsest error already below the radius: no prefix can cover it.
        Some(0) => Err(GeoproxError::UnsupportedRadius(radius_km)),
        // position() is zero-based, so the index is already `n - 1`.
        Some(index) => Ok(index),
        None => Ok(MAX_TABULATED_LENGTH),
    }
}
