//! Location data as it arrives from contracts and browsers.

use crate::{coordinate::Coordinate, error::ProximityError, gate::GeoTarget};
use serde::{Deserialize, Serialize};

/// A geofence as stored by the location NFT contract and by contract
/// execution rules: decimal-string coordinates and a whole-meter radius.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Latitude in decimal degrees, as text.
    pub latitude: String,
    /// Longitude in decimal degrees, as text.
    pub longitude: String,
    /// Radius in meters.
    pub radius: u32,
}

impl LocationRecord {
    /// A record from parsed values.
    pub fn new(latitude: f64, longitude: f64, radius: u32) -> Self {
        Self {
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
            radius,
        }
    }
}

fn parse_degrees(field: &str, value: &str) -> Result<f64, ProximityError> {
    value.trim().parse::<f64>().map_err(|e| {
        ProximityError::validation(format!("{field} {value:?} is not a number: {e}"))
    })
}

impl TryFrom<&LocationRecord> for GeoTarget {
    type Error = ProximityError;

    fn try_from(record: &LocationRecord) -> Result<Self, Self::Error> {
        let center = Coordinate::new(
            parse_degrees("latitude", &record.latitude)?,
            parse_degrees("longitude", &record.longitude)?,
        )?;
        GeoTarget::new(center, f64::from(record.radius))
    }
}

/// A position from the browser's Geolocation API (`GeolocationCoordinates`).
///
/// Fields are optional because reports arrive from JavaScript and may be
/// partial; [`PositionReport::coordinate`] rejects incomplete ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    /// Latitude in decimal degrees.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Accuracy radius in meters.
    #[serde(default)]
    pub accuracy: Option<f64>,
}

impl PositionReport {
    /// The reported position.
    ///
    /// # Errors
    ///
    /// Returns [`ProximityError::Validation`] if latitude or longitude is
    /// missing or out of range.
    pub fn coordinate(&self) -> Result<Coordinate, ProximityError> {
        let latitude = self
            .latitude
            .ok_or_else(|| ProximityError::validation("position report has no latitude"))?;
        let longitude = self
            .longitude
            .ok_or_else(|| ProximityError::validation("position report has no longitude"))?;
        Coordinate::new(latitude, longitude)
    }
}

impl TryFrom<PositionReport> for Coordinate {
    type Error = ProximityError;

    fn try_from(report: PositionReport) -> Result<Self, Self::Error> {
        report.coordinate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_contract_records() {
        let record = LocationRecord {
            latitude: " 40.7580".into(),
            longitude: "-73.9855".into(),
            radius: 100,
        };
        let target = GeoTarget::try_from(&record).unwrap();
        assert_eq!(target.center().latitude, 40.758);
        assert_eq!(target.radius_meters(), 100.0);
    }

    #[test]
    fn it_rejects_unparseable_or_empty_records() {
        let mut record = LocationRecord::new(40.758, -73.9855, 100);
        record.latitude = "north".into();
        assert!(GeoTarget::try_from(&record).is_err());

        let zero_radius = LocationRecord::new(40.758, -73.9855, 0);
        assert!(GeoTarget::try_from(&zero_radius).is_err());
    }

    #[test]
    fn it_requires_both_coordinates_in_a_report() {
        let report: PositionReport = serde_json::from_str(r#"{"latitude":1.5}"#).unwrap();
        assert!(matches!(
            report.coordinate(),
            Err(ProximityError::Validation(_))
        ));

        let report: PositionReport =
            serde_json::from_str(r#"{"latitude":1.5,"longitude":2.5,"accuracy":12}"#).unwrap();
        assert_eq!(
            Coordinate::try_from(report).unwrap(),
            Coordinate::new(1.5, 2.5).unwrap()
        );
    }
}
