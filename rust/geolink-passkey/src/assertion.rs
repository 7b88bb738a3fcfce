//! WebAuthn assertions and their backend encoding.

use crate::{
    authenticator_data::AuthenticatorData,
    challenge::ClientData,
    der::{RAW_SIGNATURE_LENGTH, decode_der_signature},
    error::PasskeyError,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// The output of one authentication ceremony.
///
/// Compact encoding, for storage or for carrying the assertion as a single
/// blob:
/// ```text
/// varint(credential_id.len) | credential_id
/// | varint(client_data_json.len) | client_data_json
/// | varint(authenticator_data.len) | authenticator_data
/// | signature_bytes
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAuthnAssertion {
    /// Which credential produced the assertion.
    pub credential_id: Vec<u8>,
    /// Raw `clientDataJSON`.
    pub client_data_json: Vec<u8>,
    /// Raw authenticator data.
    pub authenticator_data: Vec<u8>,
    /// DER-encoded ECDSA signature over
    /// `authenticator_data || SHA-256(client_data_json)`.
    pub signature: Vec<u8>,
}

impl WebAuthnAssertion {
    /// Create a new assertion.
    #[must_use]
    pub fn new(
        credential_id: Vec<u8>,
        client_data_json: Vec<u8>,
        authenticator_data: Vec<u8>,
        signature: Vec<u8>,
    ) -> Self {
        Self {
            credential_id,
            client_data_json,
            authenticator_data,
            signature,
        }
    }

    /// Parse `clientDataJSON`.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Format`] on malformed JSON.
    pub fn client_data(&self) -> Result<ClientData, PasskeyError> {
        ClientData::parse(&self.client_data_json)
    }

    /// Parse the authenticator data prefix.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Format`] if it is shorter than 37 bytes.
    pub fn parsed_authenticator_data(&self) -> Result<AuthenticatorData, PasskeyError> {
        AuthenticatorData::parse(&self.authenticator_data)
    }

    /// The signature as low-s `r || s`.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Format`] if the signature isn't valid DER.
    pub fn normalized_signature(&self) -> Result<[u8; RAW_SIGNATURE_LENGTH], PasskeyError> {
        decode_der_signature(&self.signature)
    }

    /// Package for the backend alongside the payload and the passkey's SPKI.
    ///
    /// The signature is sent as the authenticator produced it; normalization
    /// is the verifier's job.
    pub fn to_envelope(&self, signature_payload: &str, public_key_spki: &[u8]) -> AssertionEnvelope {
        AssertionEnvelope {
            signature_payload: signature_payload.to_string(),
            passkey_public_key_spki: STANDARD.encode(public_key_spki),
            webauthn_signature: STANDARD.encode(&self.signature),
            webauthn_authenticator_data: STANDARD.encode(&self.authenticator_data),
            webauthn_client_data: STANDARD.encode(&self.client_data_json),
        }
    }

    /// Compact encoding.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            self.credential_id.len()
                + self.client_data_json.len()
                + self.authenticator_data.len()
                + self.signature.len()
                + 6,
        );
        for field in [
            &self.credential_id,
            &self.client_data_json,
            &self.authenticator_data,
        ] {
            // Writing into a Vec is infallible.
            let _ = leb128::write::unsigned(&mut buf, field.len() as u64);
            buf.extend_from_slice(field);
        }
        buf.extend_from_slice(&self.signature);
        buf
    }

    /// Decode the compact encoding.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Format`] if a length prefix is malformed or
    /// overruns the input, or if no signature bytes remain.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PasskeyError> {
        let mut rest = bytes;
        let credential_id = read_prefixed(&mut rest)?;
        let client_data_json = read_prefixed(&mut rest)?;
        let authenticator_data = read_prefixed(&mut rest)?;
        if rest.is_empty() {
            return Err(PasskeyError::format("assertion has no signature bytes"));
        }
        Ok(Self {
            credential_id,
            client_data_json,
            authenticator_data,
            signature: rest.to_vec(),
        })
    }
}

impl TryFrom<&[u8]> for WebAuthnAssertion {
    type Error = PasskeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

fn read_prefixed(rest: &mut &[u8]) -> Result<Vec<u8>, PasskeyError> {
    let len = leb128::read::unsigned(rest)
        .map_err(|e| PasskeyError::format(format!("bad length prefix: {e}")))?;
    let len = usize::try_from(len)
        .map_err(|_| PasskeyError::format("length prefix does not fit in memory"))?;
    if len > rest.len() {
        return Err(PasskeyError::format(format!(
            "field of {len} bytes overruns the {} remaining",
            rest.len()
        )));
    }
    let (field, tail) = rest.split_at(len);
    *rest = tail;
    Ok(field.to_vec())
}

/// The assertion fields as the backend's smart-wallet endpoints expect them.
///
/// Byte fields are standard base64; `signature_payload` is the exact string
/// the challenge was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionEnvelope {
    /// The canonical JSON intent.
    #[serde(rename = "signaturePayload")]
    pub signature_payload: String,
    /// SPKI of the signing passkey.
    #[serde(rename = "passkeyPublicKeySPKI")]
    pub passkey_public_key_spki: String,
    /// DER ECDSA signature.
    #[serde(rename = "webauthnSignature")]
    pub webauthn_signature: String,
    /// Authenticator data.
    #[serde(rename = "webauthnAuthenticatorData")]
    pub webauthn_authenticator_data: String,
    /// `clientDataJSON`.
    #[serde(rename = "webauthnClientData")]
    pub webauthn_client_data: String,
}

impl AssertionEnvelope {
    /// Decoded SPKI bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Encoding`] on invalid base64.
    pub fn public_key_spki(&self) -> Result<Vec<u8>, PasskeyError> {
        decode_base64("passkeyPublicKeySPKI", &self.passkey_public_key_spki)
    }

    /// Rebuild the assertion. The envelope doesn't carry the credential ID,
    /// so the result's `credential_id` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Encoding`] on invalid base64.
    pub fn assertion(&self) -> Result<WebAuthnAssertion, PasskeyError> {
        Ok(WebAuthnAssertion {
            credential_id: Vec::new(),
            client_data_json: decode_base64("webauthnClientData", &self.webauthn_client_data)?,
            authenticator_data: decode_base64(
                "webauthnAuthenticatorData",
                &self.webauthn_authenticator_data,
            )?,
            signature: decode_base64("webauthnSignature", &self.webauthn_signature)?,
        })
    }
}

fn decode_base64(field: &str, value: &str) -> Result<Vec<u8>, PasskeyError> {
    STANDARD
        .decode(value)
        .map_err(|e| PasskeyError::Encoding(format!("{field} is not base64: {e}")))
}
