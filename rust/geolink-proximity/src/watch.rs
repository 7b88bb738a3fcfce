//! Tracking a geofence across successive position updates.

use crate::{
    coordinate::Coordinate,
    error::ProximityError,
    gate::{GeoTarget, ProximityResult, evaluate},
};

/// How the latest position relates to the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Moved from outside the geofence to inside it.
    Entered(ProximityResult),
    /// Moved from inside the geofence to outside it.
    Exited(ProximityResult),
    /// Still on the same side of the boundary.
    Unchanged(ProximityResult),
}

impl Transition {
    /// The evaluation behind this transition.
    pub fn result(&self) -> &ProximityResult {
        match self {
            Self::Entered(result) | Self::Exited(result) | Self::Unchanged(result) => result,
        }
    }
}

/// Feeds positions from a geolocation watch into one geofence and reports
/// boundary crossings. Starts out as outside.
#[derive(Debug, Clone)]
pub struct ProximityWatch {
    target: GeoTarget,
    inside: bool,
    last: Option<ProximityResult>,
}

impl ProximityWatch {
    /// Watch `target`.
    pub fn new(target: GeoTarget) -> Self {
        Self {
            target,
            inside: false,
            last: None,
        }
    }

    /// The watched geofence.
    pub fn target(&self) -> &GeoTarget {
        &self.target
    }

    /// Whether the last accepted position was in range.
    pub fn is_inside(&self) -> bool {
        self.inside
    }

    /// The last accepted evaluation.
    pub fn last(&self) -> Option<&ProximityResult> {
        self.last.as_ref()
    }

    /// Evaluate a new position.
    ///
    /// # Errors
    ///
    /// Returns [`ProximityError::Validation`] for an out-of-range position,
    /// which leaves the watch state untouched.
    pub fn update(&mut self, position: &Coordinate) -> Result<Transition, ProximityError> {
        let result = evaluate(position, &self.target)?;
        let transition = match (self.inside, result.is_within_range) {
            (false, true) => Transition::Entered(result),
            (true, false) => Transition::Exited(result),
            _ => Transition::Unchanged(result),
        };
        if !matches!(transition, Transition::Unchanged(_)) {
            tracing::debug!(
                distance_meters = result.distance_meters,
                inside = result.is_within_range,
                "geofence boundary crossed"
            );
        }
        self.inside = result.is_within_range;
        self.last = Some(result);
        Ok(transition)
    }
}
