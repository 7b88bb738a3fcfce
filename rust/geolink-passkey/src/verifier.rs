//! Assertion verification, as the backend and the on-chain verifier do it.
//!
//! Given a signature payload and an assertion:
//! 1. `clientDataJSON.type` must be `webauthn.get`
//! 2. the echoed challenge must be [`build_challenge`]`(payload)`
//! 3. optionally, the authenticator data must name the expected RP ID
//! 4. the UP flag (and unless disabled, the UV flag) must be set
//! 5. the normalized ECDSA signature must verify over
//!    `authenticatorData || SHA-256(clientDataJSON)`

use crate::{
    assertion::{AssertionEnvelope, WebAuthnAssertion},
    challenge::{ASSERTION_TYPE, build_challenge},
    error::{PasskeyError, VerifyError},
    spki::{RawPublicKey, extract_raw_public_key},
};
use p256::ecdsa::{Signature, VerifyingKey, signature::Verifier as _};
use sha2::{Digest, Sha256};

/// Verifies assertions made by one passkey.
#[derive(Debug, Clone)]
pub struct AssertionVerifier {
    key: VerifyingKey,
    raw_public_key: RawPublicKey,
    rp_id: Option<String>,
    require_user_verification: bool,
}

impl AssertionVerifier {
    /// A verifier for a 65-byte uncompressed point.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Format`] if the point is not on P-256.
    pub fn from_raw_public_key(raw_public_key: &RawPublicKey) -> Result<Self, PasskeyError> {
        let key = VerifyingKey::from_sec1_bytes(raw_public_key)
            .map_err(|_| PasskeyError::format("public key is not a P-256 point"))?;
        Ok(Self {
            key,
            raw_public_key: *raw_public_key,
            rp_id: None,
            require_user_verification: true,
        })
    }

    /// A verifier for the point inside an SPKI blob.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Format`] if no P-256 point can be extracted.
    pub fn from_spki(spki: &[u8]) -> Result<Self, PasskeyError> {
        Self::from_raw_public_key(&extract_raw_public_key(spki)?)
    }

    /// Also require the authenticator data to be bound to `rp_id`.
    pub fn with_rp_id(mut self, rp_id: impl Into<String>) -> Self {
        self.rp_id = Some(rp_id.into());
        self
    }

    /// Whether the UV flag is required (the default) or only UP.
    pub fn require_user_verification(mut self, required: bool) -> Self {
        self.require_user_verification = required;
        self
    }

    /// The uncompressed point being verified against.
    pub fn raw_public_key(&self) -> &RawPublicKey {
        &self.raw_public_key
    }

    /// Verify `assertion` as a signature over `payload`.
    ///
    /// # Errors
    ///
    /// Returns the first [`VerifyError`] in the order listed in the module
    /// docs.
    pub fn verify(&self, payload: &str, assertion: &WebAuthnAssertion) -> Result<(), VerifyError> {
        let client_data = assertion
            .client_data()
            .map_err(|e| VerifyError::InvalidClientData(e.to_string()))?;
        if client_data.kind != ASSERTION_TYPE {
            return Err(VerifyError::InvalidClientData(format!(
                "expected type {ASSERTION_TYPE:?}, got {:?}",
                client_data.kind
            )));
        }
        let echoed = client_data
            .challenge_bytes()
            .map_err(|e| VerifyError::InvalidClientData(e.to_string()))?;
        if echoed != build_challenge(payload) {
            return Err(VerifyError::ChallengeMismatch);
        }

        let authenticator_data = assertion.parsed_authenticator_data()?;
        if let Some(rp_id) = &self.rp_id {
            if !authenticator_data.is_for_rp_id(rp_id) {
                return Err(VerifyError::RpIdMismatch);
            }
        }
        if !authenticator_data.user_present()
            || (self.require_user_verification && !authenticator_data.user_verified())
        {
            return Err(VerifyError::UserNotVerified);
        }

        let raw_signature = assertion.normalized_signature()?;
        let signature = Signature::from_slice(&raw_signature)
            .map_err(|e| VerifyError::InvalidSignature(e.to_string()))?;

        let mut signed_data = Vec::with_capacity(assertion.authenticator_data.len() + 32);
        signed_data.extend_from_slice(&assertion.authenticator_data);
        signed_data.extend_from_slice(&Sha256::digest(&assertion.client_data_json));

        self.key.verify(&signed_data, &signature).map_err(|e| {
            tracing::debug!(error = %e, "passkey signature rejected");
            VerifyError::InvalidSignature(e.to_string())
        })
    }

    /// Verify a backend envelope. Its SPKI must carry this verifier's key.
    ///
    /// # Errors
    ///
    /// [`VerifyError::KeyMismatch`] if the envelope names another key,
    /// otherwise as [`AssertionVerifier::verify`].
    pub fn verify_envelope(&self, envelope: &AssertionEnvelope) -> Result<(), VerifyError> {
        let spki = envelope.public_key_spki()?;
        if extract_raw_public_key(&spki)? != self.raw_public_key {
            return Err(VerifyError::KeyMismatch);
        }
        self.verify(&envelope.signature_payload, &envelope.assertion()?)
    }
}
