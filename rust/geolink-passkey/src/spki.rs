//! Raw P-256 public keys out of SubjectPublicKeyInfo.
//!
//! `AuthenticatorAttestationResponse.getPublicKey()` hands back SPKI DER,
//! while the Soroban verifier wants the bare 65-byte uncompressed point.
//! For ES256 every compliant browser emits the same 91-byte layout:
//!
//! ```text
//! SEQUENCE (89 bytes)
//!   SEQUENCE (19 bytes)
//!     OID 1.2.840.10045.2.1 (ecPublicKey)
//!     OID 1.2.840.10045.3.1.7 (prime256v1 / P-256)
//!   BIT STRING (66 bytes, 0 unused bits)
//!     04 || x || y  (65-byte uncompressed point)
//! ```
//!
//! Extraction is a chain of [`SpkiStrategy`] values tried in order; the
//! later ones are heuristics for blobs that do not follow that layout.

use crate::error::PasskeyError;

/// Length of an uncompressed SEC1 P-256 point.
pub const RAW_PUBLIC_KEY_LENGTH: usize = 65;

/// SEC1 tag for an uncompressed point.
pub const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

/// The 26 bytes preceding the point in a P-256 SPKI.
pub const P256_SPKI_HEADER: [u8; 26] = [
    0x30, 0x59, // SEQUENCE, 89 bytes
    0x30, 0x13, // SEQUENCE, 19 bytes
    0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, // OID ecPublicKey
    0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, // OID prime256v1
    0x03, 0x42, // BIT STRING, 66 bytes
    0x00, // 0 unused bits
];

const BIT_STRING_TAG: u8 = 0x03;
const BIT_STRING_POINT_LENGTH: u8 = 0x42;
/// The algorithm identifier occupies at least this many leading bytes.
const BIT_STRING_SEARCH_OFFSET: usize = 20;

/// A 65-byte uncompressed P-256 point.
pub type RawPublicKey = [u8; RAW_PUBLIC_KEY_LENGTH];

/// One way of locating the point inside an SPKI blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpkiStrategy {
    /// Short name used in logs.
    pub name: &'static str,
    /// Returns the point, or `None` when the blob doesn't fit this strategy.
    pub extract: fn(&[u8]) -> Option<RawPublicKey>,
}

/// Strategies in the order [`extract_raw_public_key`] tries them.
pub const SPKI_STRATEGIES: [SpkiStrategy; 3] = [
    SpkiStrategy {
        name: "bit-string",
        extract: from_bit_string,
    },
    SpkiStrategy {
        name: "trailing-point",
        extract: from_trailing_point,
    },
    SpkiStrategy {
        name: "last-bytes",
        extract: from_last_bytes,
    },
];

/// Extract the uncompressed point from an SPKI blob.
///
/// # Errors
///
/// Returns [`PasskeyError::Format`] if `spki` is shorter than 65 bytes.
pub fn extract_raw_public_key(spki: &[u8]) -> Result<RawPublicKey, PasskeyError> {
    if spki.len() < RAW_PUBLIC_KEY_LENGTH {
        return Err(PasskeyError::format(format!(
            "SPKI must be at least {RAW_PUBLIC_KEY_LENGTH} bytes, got {}",
            spki.len()
        )));
    }

    for (position, strategy) in SPKI_STRATEGIES.iter().enumerate() {
        if let Some(point) = (strategy.extract)(spki) {
            if position + 1 == SPKI_STRATEGIES.len() {
                tracing::warn!(
                    strategy = strategy.name,
                    len = spki.len(),
                    "SPKI did not match a known layout; using trailing bytes as the public key"
                );
            } else if position > 0 {
                tracing::debug!(strategy = strategy.name, "SPKI parsed by fallback strategy");
            }
            return Ok(point);
        }
    }

    Err(PasskeyError::format("no SPKI strategy produced a public key"))
}

/// Wrap a raw uncompressed point in the P-256 SPKI layout.
pub fn encode_spki(point: &RawPublicKey) -> Vec<u8> {
    let mut spki = Vec::with_capacity(P256_SPKI_HEADER.len() + RAW_PUBLIC_KEY_LENGTH);
    spki.extend_from_slice(&P256_SPKI_HEADER);
    spki.extend_from_slice(point);
    spki
}

/// Finds a `BIT STRING` of length `0x42` past the algorithm identifier and
/// reads the point after its unused-bits byte.
pub fn from_bit_string(spki: &[u8]) -> Option<RawPublicKey> {
    let start = BIT_STRING_SEARCH_OFFSET.min(spki.len());
    let tag_at = spki
        .get(start..)?
        .windows(2)
        .position(|pair| *pair == [BIT_STRING_TAG, BIT_STRING_POINT_LENGTH])
        .map(|offset| start + offset)?;
    // tag, length, unused-bits count
    let point_at = tag_at + 3;
    let point = spki.get(point_at..point_at + RAW_PUBLIC_KEY_LENGTH)?;
    if point[0] != UNCOMPRESSED_POINT_TAG {
        return None;
    }
    point.try_into().ok()
}

/// Accepts the final 65 bytes when they begin with the uncompressed tag.
pub fn from_trailing_point(spki: &[u8]) -> Option<RawPublicKey> {
    let start = spki.len().checked_sub(RAW_PUBLIC_KEY_LENGTH)?;
    let point = &spki[start..];
    if point[0] != UNCOMPRESSED_POINT_TAG {
        return None;
    }
    point.try_into().ok()
}

/// Takes the final 65 bytes unconditionally. If they don't start with the
/// uncompressed tag, the tag is forced onto the last 64 bytes instead.
///
/// This is a heuristic: the result is the right shape but nothing checks it
/// is a point on the curve.
pub fn from_last_bytes(spki: &[u8]) -> Option<RawPublicKey> {
    let start = spki.len().checked_sub(RAW_PUBLIC_KEY_LENGTH)?;
    let mut point: RawPublicKey = spki[start..].try_into().ok()?;
    if point[0] != UNCOMPRESSED_POINT_TAG {
        point[0] = UNCOMPRESSED_POINT_TAG;
        point[1..].copy_from_slice(&spki[spki.len() - 64..]);
    }
    Some(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::SigningKey;

    fn point(seed: u8) -> RawPublicKey {
        let sk = SigningKey::from_bytes(&[seed; 32].into()).unwrap();
        let encoded = sk.verifying_key().to_encoded_point(false);
        encoded.as_bytes().try_into().unwrap()
    }

    #[test]
    fn it_reads_the_point_of_a_standard_spki() {
        let expected = point(42);
        let spki = encode_spki(&expected);
        assert_eq!(spki.len(), 91);
        assert_eq!(from_bit_string(&spki), Some(expected));
        assert_eq!(extract_raw_public_key(&spki).unwrap(), expected);
    }

    #[test]
    fn it_skips_the_oid_bytes_that_look_like_a_bit_string_tag() {
        // Offset 20 holds 0x03 (inside the prime256v1 OID) followed by 0x01.
        let spki = encode_spki(&point(1));
        assert_eq!(spki[20], 0x03);
        assert_eq!(from_bit_string(&spki).map(|p| p[0]), Some(0x04));
    }

    #[test]
    fn it_rejects_a_bit_string_point_without_the_uncompressed_tag() {
        let mut spki = encode_spki(&point(3));
        spki[26] = 0x02;
        assert_eq!(from_bit_string(&spki), None);
    }

    #[test]
    fn it_falls_back_to_the_trailing_point() {
        let expected = point(5);
        // Unknown 10-byte prefix, no BIT STRING header at all.
        let mut blob = vec![0xaa; 10];
        blob.extend_from_slice(&expected);
        assert_eq!(from_bit_string(&blob), None);
        assert_eq!(from_trailing_point(&blob), Some(expected));
        assert_eq!(extract_raw_public_key(&blob).unwrap(), expected);
    }

    #[test]
    fn it_synthesizes_the_tag_as_a_last_resort() {
        let blob = [0x11u8; 70];
        assert_eq!(from_trailing_point(&blob), None);

        let point = extract_raw_public_key(&blob).unwrap();
        assert_eq!(point[0], 0x04);
        assert_eq!(&point[1..], &[0x11u8; 64][..]);
    }

    #[test]
    fn it_rejects_short_input() {
        let result = extract_raw_public_key(&[0x04; 64]);
        assert!(matches!(result, Err(PasskeyError::Format(_))));
    }

    #[test]
    fn it_accepts_exactly_one_point_worth_of_bytes() {
        let expected = point(9);
        assert_eq!(extract_raw_public_key(&expected).unwrap(), expected);
    }
}
