//! Geofence containment.

use crate::{coordinate::Coordinate, distance::haversine, error::ProximityError};
use serde::{Deserialize, Serialize};

/// A circular geofence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeoTargetFields")]
pub struct GeoTarget {
    latitude: f64,
    longitude: f64,
    radius_meters: f64,
}

#[derive(Deserialize)]
struct GeoTargetFields {
    latitude: f64,
    longitude: f64,
    radius_meters: f64,
}

impl TryFrom<GeoTargetFields> for GeoTarget {
    type Error = ProximityError;

    fn try_from(fields: GeoTargetFields) -> Result<Self, Self::Error> {
        Self::new(
            Coordinate::new(fields.latitude, fields.longitude)?,
            fields.radius_meters,
        )
    }
}

impl GeoTarget {
    /// A geofence of `radius_meters` around `center`.
    ///
    /// # Errors
    ///
    /// Returns [`ProximityError::Validation`] if `center` is out of range or
    /// the radius is not positive and finite.
    pub fn new(center: Coordinate, radius_meters: f64) -> Result<Self, ProximityError> {
        center.validate()?;
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(ProximityError::validation(format!(
                "radius {radius_meters} must be a positive number of meters"
            )));
        }
        Ok(Self {
            latitude: center.latitude,
            longitude: center.longitude,
            radius_meters,
        })
    }

    /// The center.
    pub fn center(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// The radius in meters.
    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    /// Shorthand for [`evaluate`]`(user, self)`.
    ///
    /// # Errors
    ///
    /// As [`evaluate`].
    pub fn evaluate(&self, user: &Coordinate) -> Result<ProximityResult, ProximityError> {
        evaluate(user, self)
    }
}

/// The outcome of checking one position against one geofence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityResult {
    /// Distance from the position to the geofence center, in meters.
    pub distance_meters: f64,
    /// `distance_meters <= radius_meters`.
    pub is_within_range: bool,
}

/// Check `user` against `target`. A position exactly on the boundary is in
/// range.
///
/// # Errors
///
/// Returns [`ProximityError::Validation`] if `user` is out of range.
pub fn evaluate(user: &Coordinate, target: &GeoTarget) -> Result<ProximityResult, ProximityError> {
    user.validate()?;
    let distance_meters = haversine(user, &target.center());
    Ok(ProximityResult {
        distance_meters,
        is_within_range: distance_meters <= target.radius_meters,
    })
}
