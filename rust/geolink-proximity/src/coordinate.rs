//! Points on the Earth's surface.

use crate::error::ProximityError;
use serde::{Deserialize, Serialize};

/// Largest valid absolute latitude, in degrees.
pub const MAX_LATITUDE: f64 = 90.0;

/// Largest valid absolute longitude, in degrees.
pub const MAX_LONGITUDE: f64 = 180.0;

/// A latitude/longitude pair in decimal degrees.
///
/// The fields are public so positions can be deserialized straight from an
/// API; every operation that consumes a coordinate calls
/// [`Coordinate::validate`] first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Degrees north of the equator, in `[-90, 90]`.
    pub latitude: f64,
    /// Degrees east of Greenwich, in `[-180, 180]`.
    pub longitude: f64,
}

impl Coordinate {
    /// A validated coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`ProximityError::Validation`] if either value is out of
    /// range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ProximityError> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Check the ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ProximityError::Validation`] if `|latitude| > 90`,
    /// `|longitude| > 180`, or either is NaN or infinite.
    pub fn validate(&self) -> Result<(), ProximityError> {
        if !self.latitude.is_finite() || self.latitude.abs() > MAX_LATITUDE {
            return Err(ProximityError::validation(format!(
                "latitude {} is outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || self.longitude.abs() > MAX_LONGITUDE {
            return Err(ProximityError::validation(format!(
                "longitude {} is outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}
