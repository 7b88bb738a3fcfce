//! A registered passkey.

use crate::{
    error::PasskeyError,
    spki::{RawPublicKey, extract_raw_public_key},
};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A passkey as returned by registration: the credential ID and the public
/// key in SubjectPublicKeyInfo form.
///
/// Serializes with the credential ID as base64url and the SPKI as standard
/// base64, the encodings the backend stores them under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasskeyCredential {
    /// Opaque credential identifier assigned by the authenticator.
    #[serde(
        rename = "credentialId",
        serialize_with = "serialize_base64url",
        deserialize_with = "deserialize_base64url"
    )]
    credential_id: Vec<u8>,

    /// DER-encoded SubjectPublicKeyInfo.
    #[serde(
        rename = "publicKeySpki",
        serialize_with = "serialize_base64",
        deserialize_with = "deserialize_base64"
    )]
    public_key_spki: Vec<u8>,
}

impl PasskeyCredential {
    /// Create a credential from its parts.
    #[must_use]
    pub fn new(credential_id: Vec<u8>, public_key_spki: Vec<u8>) -> Self {
        Self {
            credential_id,
            public_key_spki,
        }
    }

    /// The credential ID.
    #[must_use]
    pub fn credential_id(&self) -> &[u8] {
        &self.credential_id
    }

    /// The SPKI bytes.
    #[must_use]
    pub fn public_key_spki(&self) -> &[u8] {
        &self.public_key_spki
    }

    /// The uncompressed point, derived from the SPKI on every call.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Format`] if the SPKI is shorter than 65 bytes.
    pub fn raw_public_key(&self) -> Result<RawPublicKey, PasskeyError> {
        extract_raw_public_key(&self.public_key_spki)
    }

    /// The credential ID as base64url without padding.
    #[must_use]
    pub fn credential_id_base64url(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.credential_id)
    }

    /// The SPKI as standard base64.
    #[must_use]
    pub fn public_key_spki_base64(&self) -> String {
        STANDARD.encode(&self.public_key_spki)
    }
}

fn serialize_base64url<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&URL_SAFE_NO_PAD.encode(bytes))
}

fn deserialize_base64url<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let s = String::deserialize(deserializer)?;
    URL_SAFE_NO_PAD
        .decode(s.trim_end_matches('='))
        .map_err(serde::de::Error::custom)
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

fn deserialize_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let s = String::deserialize(deserializer)?;
    STANDARD.decode(s).map_err(serde::de::Error::custom)
}
