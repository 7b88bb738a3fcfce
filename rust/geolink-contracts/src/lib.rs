#![warn(missing_docs)]

//! The contract-call side of GeoLink.
//!
//! A [`ContractCallIntent`] describes one call a passkey holder wants to
//! make. A digest of its canonical JSON, followed by that JSON, is the
//! signature payload the passkey signs;
//! [`IntentDispatcher`] checks the intent's time window, its nonce and the
//! passkey assertion before the call goes out. Location-gated calls are
//! additionally checked by [`authorize_execution`] against a
//! [`ContractRule`]'s geofence.
//!
//! Known contracts live in a [`ContractRegistry`] that callers construct
//! and pass around.

mod dispatch;
mod error;
mod intent;
mod nonce;
mod params;
mod registry;
mod request;
mod rule;

pub use dispatch::*;
pub use error::*;
pub use intent::*;
pub use nonce::*;
pub use params::*;
pub use registry::*;
pub use request::*;
pub use rule::*;
