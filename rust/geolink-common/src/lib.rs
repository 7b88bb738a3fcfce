#![warn(missing_docs)]

//! Small helpers shared by the GeoLink crates. They exist so that the same
//! code can target both native hosts (backend verifiers, tooling) and
//! `wasm32-unknown-unknown` (the browser, where passkey ceremonies run).

mod sync;
pub use sync::*;

pub mod time;
