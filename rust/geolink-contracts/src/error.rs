//! Error type for intents, registries and execution rules.

use geolink_passkey::VerifyError;
use geolink_proximity::ProximityError;
use thiserror::Error;

/// Errors from authorizing a contract call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    /// The intent uses a version this crate does not understand.
    #[error("unsupported intent version {0}")]
    UnsupportedVersion(u32),

    /// The current time is past the intent's `exp`.
    #[error("intent expired at {exp} (now {now})")]
    Expired {
        /// Expiry, in Unix seconds.
        exp: u64,
        /// The time of the check.
        now: u64,
    },

    /// The intent's `iat` is further in the future than the allowed skew.
    #[error("intent issued in the future at {iat} (now {now})")]
    IssuedInFuture {
        /// Issue time, in Unix seconds.
        iat: u64,
        /// The time of the check.
        now: u64,
    },

    /// The `(signer, nonce)` pair has already been used.
    #[error("nonce already used by {signer}")]
    NonceReused {
        /// The signer that reused the nonce.
        signer: String,
    },

    /// No random source was available to draw a nonce.
    #[error("no random source: {0}")]
    Random(String),

    /// The contract is not in the registry.
    #[error("unknown contract {0}")]
    UnknownContract(String),

    /// The contract has no function by that name.
    #[error("contract {contract_id} has no function {function}")]
    UnknownFunction {
        /// The contract that was searched.
        contract_id: String,
        /// The missing function.
        function: String,
    },

    /// A parameter description is incomplete, or arguments don't fit the
    /// function's parameters.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The position is outside the rule's geofence.
    #[error("{distance_meters:.1} m from the target, outside its {radius_meters} m radius")]
    OutOfRange {
        /// Distance to the geofence center, in meters.
        distance_meters: f64,
        /// The geofence radius, in meters.
        radius_meters: f64,
    },

    /// A location could not be used.
    #[error(transparent)]
    Proximity(#[from] ProximityError),

    /// The passkey signature over the intent did not verify.
    #[error(transparent)]
    Signature(#[from] VerifyError),

    /// The intent could not be serialized.
    #[error("cannot encode intent: {0}")]
    Encoding(String),
}
