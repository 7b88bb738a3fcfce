//! Challenge derivation and `clientDataJSON`.
//!
//! The challenge handed to the authenticator is the first 32 bytes of the
//! UTF-8 signature payload, zero-padded. The verifying contract repeats the
//! same truncation on the payload it receives and compares the result with
//! the challenge echoed in `clientDataJSON`, which binds the assertion to
//! one transaction intent.
//!
//! This is a truncation, not a digest: two payloads sharing a 32-byte prefix
//! share a challenge, and any change in how an intent serializes changes
//! its challenge. Payloads must be canonical before they reach here.

use crate::error::PasskeyError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Length of a WebAuthn challenge derived from a payload.
pub const CHALLENGE_LENGTH: usize = 32;

/// `clientDataJSON.type` for an assertion.
pub const ASSERTION_TYPE: &str = "webauthn.get";

/// `clientDataJSON.type` for a registration.
pub const CREATION_TYPE: &str = "webauthn.create";

/// A 32-byte WebAuthn challenge.
pub type Challenge = [u8; CHALLENGE_LENGTH];

/// First 32 UTF-8 bytes of `payload`, right-padded with zeros.
pub fn build_challenge(payload: &str) -> Challenge {
    let bytes = payload.as_bytes();
    let len = bytes.len().min(CHALLENGE_LENGTH);
    let mut challenge = [0u8; CHALLENGE_LENGTH];
    challenge[..len].copy_from_slice(&bytes[..len]);
    challenge
}

/// The base64url (unpadded) form browsers write into `clientDataJSON`.
pub fn encode_challenge(challenge: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(challenge)
}

/// The fields of `clientDataJSON` the bridge relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientData {
    /// `webauthn.get` or `webauthn.create`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The challenge, base64url without padding.
    pub challenge: String,
    /// The origin the ceremony ran on.
    #[serde(default)]
    pub origin: String,
    /// Whether the ceremony ran in a cross-origin iframe.
    #[serde(default, rename = "crossOrigin")]
    pub cross_origin: bool,
}

impl ClientData {
    /// Client data for an assertion over `challenge` from `origin`.
    pub fn assertion(challenge: &[u8], origin: impl Into<String>) -> Self {
        Self {
            kind: ASSERTION_TYPE.to_string(),
            challenge: encode_challenge(challenge),
            origin: origin.into(),
            cross_origin: false,
        }
    }

    /// Parse raw `clientDataJSON` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Format`] if the bytes aren't a JSON object
    /// with at least `type` and `challenge`.
    pub fn parse(client_data_json: &[u8]) -> Result<Self, PasskeyError> {
        serde_json::from_slice(client_data_json)
            .map_err(|e| PasskeyError::format(format!("invalid clientDataJSON: {e}")))
    }

    /// Serialize back to `clientDataJSON` bytes.
    pub fn to_json(&self) -> Vec<u8> {
        // Serializing a struct of strings and a bool cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Decode the echoed challenge.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Encoding`] if the challenge isn't base64url.
    pub fn challenge_bytes(&self) -> Result<Vec<u8>, PasskeyError> {
        URL_SAFE_NO_PAD
            .decode(self.challenge.trim_end_matches('='))
            .map_err(|e| PasskeyError::Encoding(format!("challenge is not base64url: {e}")))
    }

    /// Whether the echoed challenge is the one derived from `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Encoding`] if the challenge isn't base64url.
    pub fn is_bound_to(&self, payload: &str) -> Result<bool, PasskeyError> {
        Ok(self.challenge_bytes()? == build_challenge(payload))
    }
}
