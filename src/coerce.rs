//! Flexible conversion of location-like values into a [`Point`].
//!
//! Callers hand in whatever shape they hold: a struct with
//! `latitude`/`longitude` or `lat`/`lon` fields, a map with the same keys, or a
//! `(lat, lon)` pair. Values are viewed through `serde_json`, so a struct and a
//! map with the same keys look identical here. Shapes are tried in a fixed
//! order and the first one that matches wins:
//!
//! 1. `latitude` / `longitude`
//! 2. `lat` / `lon`
//! 3. two-element sequence `[lat, lon]`
//!
//! Anything else fails with `UnsupportedLocation` instead of being passed
//! through.

use crate::error::{GeoproxError, Result};
use crate::point::Point;
use serde::Serialize;
use serde_json::Value;

type Matcher = fn(&Value) -> Option<Point>;

const MATCHERS: [(&str, Matcher); 3] = [
    ("latitude/longitude", match_verbose_keys),
    ("lat/lon", match_short_keys),
    ("pair", match_pair),
];

/// Convert any serializable location shape into a [`Point`].
///
/// ```rust
/// use geoprox::coerce::to_point;
/// use std::collections::HashMap;
///
/// let from_pair = to_point(&(50.822482, -0.141449))?;
/// let from_map = to_point(&HashMap::from([("lat", 50.822482), ("lon", -0.141449)]))?;
/// assert_eq!(from_pair, from_map);
/// # Ok::<(), geoprox::GeoproxError>(())
/// ```
pub fn to_point<T: Serialize + ?Sized>(location: &T) -> Result<Point> {
    let value = serde_json::to_value(location)?;
    coerce_point(&value)
}

/// Match an already-parsed JSON value against the supported shapes.
pub fn coerce_point(value: &Value) -> Result<Point> {
    for (shape, matcher) in MATCHERS {
        if let Some(point) = matcher(value) {
            log::trace!("coerced {} location into {:?}", shape, point);
            return Ok(point);
        }
    }
    Err(GeoproxError::UnsupportedLocation(describe(value)))
}

fn match_verbose_keys(value: &Value) -> Option<Point> {
    keyed(value, "latitude", "longitude")
}

fn match_short_keys(value: &Value) -> Option<Point> {
    keyed(value, "lat", "lon")
}

fn match_pair(value: &Value) -> Option<Point> {
    match value.as_array()?.as_slice() {
        [lat, lon] => Some(Point::new(lat.as_f64()?, lon.as_f64()?)),
        _ => None,
    }
}

fn keyed(value: &Value, lat_key: &str, lon_key: &str) -> Option<Point> {
    let object = value.as_object()?;
    let latitude = object.get(lat_key)?.as_f64()?;
    let longitude = object.get(lon_key)?.as_f64()?;
    Some(Point::new(latitude, longitude))
}

fn describe(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
        Value::Array(items) => format!("sequence of {} items", items.len()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    const LAT: f64 = 50.822482;
    const LON: f64 = -0.141449;

    #[derive(Serialize)]
    struct Verbose {
        latitude: f64,
        longitude: f64,
    }

    #[derive(Serialize)]
    struct Short {
        lat: f64,
        lon: f64,
    }

    fn assert_reference(point: Point) {
        assert_eq!(point.latitude, LAT);
        assert_eq!(point.longitude, LON);
    }

    #[test]
    fn test_tuple() {
        assert_reference(to_point(&(LAT, LON)).unwrap());
        assert_reference(to_point(&[LAT, LON]).unwrap());
    }

    #[test]
    fn test_struct_with_verbose_fields() {
        let location = Verbose {
            latitude: LAT,
            longitude: LON,
        };
        assert_reference(to_point(&location).unwrap());
    }

    #[test]
    fn test_struct_with_short_fields() {
        assert_reference(to_point(&Short { lat: LAT, lon: LON }).unwrap());
    }

    #[test]
    fn test_map_with_verbose_keys() {
        let location = HashMap::from([("latitude", LAT), ("longitude", LON)]);
        assert_reference(to_point(&location).unwrap());
    }

    #[test]
    fn test_map_with_short_keys() {
        let location = HashMap::from([("lat", LAT), ("lon", LON)]);
        assert_reference(to_point(&location).unwrap());
    }

    #[test]
    fn test_point_roundtrips() {
        assert_reference(to_point(&Point::new(LAT, LON)).unwrap());
    }

    // Only maps can mix both key styles; a struct has one fixed field set.
    #[test]
    fn test_map_with_both_key_styles_prefers_verbose() {
        let value = json!({"latitude": LAT, "longitude": LON, "lat": 1.0, "lon": 2.0});
        assert_reference(coerce_point(&value).unwrap());
    }

    #[test]
    fn test_map_with_partial_verbose_keys_uses_short_keys() {
        let value = json!({"latitude": 1.0, "lat": LAT, "lon": LON});
        assert_reference(coerce_point(&value).unwrap());
    }

    #[test]
    fn test_unsupported_shapes() {
        for value in [
            json!("gcpchgbyrvrf"),
            json!([1.0, 2.0, 3.0]),
            json!({"x": 1.0, "y": 2.0}),
            json!({"lat": "north", "lon": 2.0}),
            json!(null),
        ] {
            assert!(matches!(
                coerce_point(&value),
                Err(GeoproxError::UnsupportedLocation(_))
            ));
        }
    }

    #[test]
    fn test_error_describes_shape() {
        let err = coerce_point(&json!({"x": 1.0})).unwrap_err();
        assert!(err.to_string().contains("object with keys [x]"));
    }
}
