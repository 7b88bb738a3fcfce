#![warn(missing_docs)]

//! Geofencing for location-gated contract calls.
//!
//! [`evaluate`] decides whether a position lies within a [`GeoTarget`]
//! using the haversine great-circle distance. Everything here is pure and
//! allocation-free, so it can run on every geolocation update.

mod coordinate;
mod distance;
mod error;
mod gate;
mod record;
mod watch;

pub use coordinate::*;
pub use distance::*;
pub use error::*;
pub use gate::*;
pub use record::*;
pub use watch::*;
