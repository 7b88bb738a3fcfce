//! Wall-clock time on native and wasm targets.
//!
//! Intent windows (`iat`/`exp`) are expressed in whole Unix seconds, so
//! besides [`now`] this module offers [`unix_seconds`].

pub use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Returns the current system time.
#[cfg(not(target_arch = "wasm32"))]
pub fn now() -> SystemTime {
    SystemTime::now()
}

/// Returns the current system time.
///
/// `std::time::SystemTime::now()` panics on `wasm32-unknown-unknown`, so
/// this goes through `web_time` and converts back.
#[cfg(target_arch = "wasm32")]
pub fn now() -> SystemTime {
    use web_time::web::SystemTimeExt;
    web_time::SystemTime::now().to_std()
}

/// Seconds since the Unix epoch. A clock set before 1970 reads as `0`.
pub fn unix_seconds() -> u64 {
    now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
