//! The fixed-size prefix of WebAuthn authenticator data.
//!
//! Layout: `rpIdHash (32) | flags (1) | signCount (4, big-endian) | ...`.
//! Attested credential data and extensions may follow; the bridge does not
//! read them.

use crate::error::PasskeyError;
use sha2::{Digest, Sha256};

/// Minimum length of authenticator data.
pub const AUTHENTICATOR_DATA_MIN_LENGTH: usize = 37;

/// User present.
pub const FLAG_USER_PRESENT: u8 = 0x01;
/// User verified (biometric or PIN).
pub const FLAG_USER_VERIFIED: u8 = 0x04;
/// Attested credential data follows the counter.
pub const FLAG_ATTESTED_CREDENTIAL_DATA: u8 = 0x40;

/// Parsed authenticator data prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatorData {
    /// SHA-256 of the relying party ID.
    pub rp_id_hash: [u8; 32],
    /// Flag bits.
    pub flags: u8,
    /// Signature counter.
    pub sign_count: u32,
}

impl AuthenticatorData {
    /// Authenticator data for `rp_id`.
    pub fn new(rp_id: &str, flags: u8, sign_count: u32) -> Self {
        Self {
            rp_id_hash: rp_id_hash(rp_id),
            flags,
            sign_count,
        }
    }

    /// Parse the 37-byte prefix of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Format`] if `bytes` is shorter than 37 bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, PasskeyError> {
        if bytes.len() < AUTHENTICATOR_DATA_MIN_LENGTH {
            return Err(PasskeyError::format(format!(
                "authenticator data must be at least {AUTHENTICATOR_DATA_MIN_LENGTH} bytes, got {}",
                bytes.len()
            )));
        }
        let mut rp_id_hash = [0u8; 32];
        rp_id_hash.copy_from_slice(&bytes[..32]);
        let sign_count = u32::from_be_bytes([bytes[33], bytes[34], bytes[35], bytes[36]]);
        Ok(Self {
            rp_id_hash,
            flags: bytes[32],
            sign_count,
        })
    }

    /// Encode the prefix.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(AUTHENTICATOR_DATA_MIN_LENGTH);
        bytes.extend_from_slice(&self.rp_id_hash);
        bytes.push(self.flags);
        bytes.extend_from_slice(&self.sign_count.to_be_bytes());
        bytes
    }

    /// UP flag.
    pub fn user_present(&self) -> bool {
        self.flags & FLAG_USER_PRESENT != 0
    }

    /// UV flag.
    pub fn user_verified(&self) -> bool {
        self.flags & FLAG_USER_VERIFIED != 0
    }

    /// Whether this data was produced for `rp_id`.
    pub fn is_for_rp_id(&self, rp_id: &str) -> bool {
        self.rp_id_hash == rp_id_hash(rp_id)
    }
}

/// SHA-256 of a relying party ID, as the authenticator records it.
pub fn rp_id_hash(rp_id: &str) -> [u8; 32] {
    Sha256::digest(rp_id.as_bytes()).into()
}
