//! Great-circle distance.

use crate::{coordinate::Coordinate, error::ProximityError};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two coordinates, in meters.
///
/// # Errors
///
/// Returns [`ProximityError::Validation`] if either coordinate is out of
/// range.
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> Result<f64, ProximityError> {
    a.validate()?;
    b.validate()?;
    Ok(haversine(a, b))
}

/// The formula itself, on already validated coordinates.
pub(crate) fn haversine(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    // absolute deltas keep d(a, b) and d(b, a) bit-identical
    let half_d_lat = (b.latitude - a.latitude).abs().to_radians() / 2.0;
    let half_d_lon = (b.longitude - a.longitude).abs().to_radians() / 2.0;

    let h = half_d_lat.sin().powi(2) + lat_a.cos() * lat_b.cos() * half_d_lon.sin().powi(2);
    // rounding can push h a hair past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate::new(latitude, longitude).unwrap()
    }

    #[test]
    fn it_is_zero_for_the_same_point() {
        assert_eq!(haversine_distance(&at(0.0, 0.0), &at(0.0, 0.0)).unwrap(), 0.0);
    }

    #[test]
    fn it_measures_one_degree_of_latitude() {
        let d = haversine_distance(&at(0.0, 0.0), &at(1.0, 0.0)).unwrap();
        assert!((d - 111_194.93).abs() < 0.01, "{d}");
    }

    #[test]
    fn it_handles_antipodes() {
        let d = haversine_distance(&at(0.0, 0.0), &at(0.0, 180.0)).unwrap();
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1e-6);
    }

    #[test]
    fn it_validates_both_points() {
        let bad = Coordinate {
            latitude: 91.0,
            longitude: 0.0,
        };
        assert!(haversine_distance(&bad, &at(0.0, 0.0)).is_err());
        assert!(haversine_distance(&at(0.0, 0.0), &bad).is_err());
    }
}
