//! Error types for the passkey bridge.

use thiserror::Error;

/// Errors from decoding passkey material or running a WebAuthn ceremony.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasskeyError {
    /// Malformed binary input (SPKI, DER signature, authenticator data,
    /// `clientDataJSON`).
    #[error("malformed input: {0}")]
    Format(String),

    /// The WebAuthn API (or the requested algorithm) is not available here.
    #[error("WebAuthn not available: {0}")]
    Unsupported(String),

    /// The user cancelled, the platform rejected the request, or it timed out.
    #[error("passkey ceremony failed: {0}")]
    CeremonyFailed(String),

    /// The authenticator holds no credential matching the requested ID.
    #[error("no passkey matches the requested credential")]
    NotFound,

    /// A text encoding (base64, base64url) could not be decoded.
    #[error("invalid encoding: {0}")]
    Encoding(String),
}

impl PasskeyError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }
}

/// Errors from verifying an assertion against a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// An input could not be decoded.
    #[error(transparent)]
    Malformed(#[from] PasskeyError),

    /// `clientDataJSON` is not an assertion (`type != "webauthn.get"`).
    #[error("invalid clientDataJSON: {0}")]
    InvalidClientData(String),

    /// The challenge echoed in `clientDataJSON` was not derived from the payload.
    #[error("challenge mismatch")]
    ChallengeMismatch,

    /// The authenticator data was produced for a different relying party.
    #[error("relying party ID hash mismatch")]
    RpIdMismatch,

    /// The user-presence or user-verification flag is not set.
    #[error("authenticator did not verify the user")]
    UserNotVerified,

    /// The envelope carries a public key other than the one being verified against.
    #[error("public key does not match the registered passkey")]
    KeyMismatch,

    /// The ECDSA signature does not verify.
    #[error("invalid ECDSA signature: {0}")]
    InvalidSignature(String),
}
