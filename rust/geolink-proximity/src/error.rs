//! Error type for proximity checks.

use thiserror::Error;

/// Errors from building or evaluating a geofence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProximityError {
    /// A coordinate or radius is out of range, not a number, or missing.
    #[error("invalid location: {0}")]
    Validation(String),
}

impl ProximityError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
