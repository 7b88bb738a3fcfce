//! DER ECDSA signatures to the raw `r || s` form Soroban verifies.
//!
//! Authenticators return `SEQUENCE { INTEGER r, INTEGER s }`. The contract
//! takes 64 bytes: both integers left-padded to 32 bytes, with `s` folded
//! into the low half of the group order so each signature has exactly one
//! accepted encoding.

use crate::error::PasskeyError;
use p256::{
    FieldBytes, Scalar,
    ecdsa::Signature,
    elliptic_curve::{PrimeField, scalar::IsHigh},
};

/// Length of a raw `r || s` signature.
pub const RAW_SIGNATURE_LENGTH: usize = 64;

/// Width of one scalar.
pub const SCALAR_LENGTH: usize = 32;

const SEQUENCE_TAG: u8 = 0x30;
const INTEGER_TAG: u8 = 0x02;

/// Decode a DER ECDSA signature into `r(32) || s(32)` with low `s`.
///
/// # Errors
///
/// Returns [`PasskeyError::Format`] if the outer tag isn't `SEQUENCE`, an
/// inner tag isn't `INTEGER`, a length runs past the buffer, an integer is
/// wider than 32 bytes once DER sign padding is stripped, or either scalar
/// is outside `1..n`.
pub fn decode_der_signature(der: &[u8]) -> Result<[u8; RAW_SIGNATURE_LENGTH], PasskeyError> {
    let mut reader = DerReader::new(der);

    if reader.byte()? != SEQUENCE_TAG {
        return Err(PasskeyError::format("DER signature must start with a SEQUENCE"));
    }
    let body_len = reader.length()?;
    let body = reader.take(body_len)?;
    if !reader.is_empty() {
        return Err(PasskeyError::format("trailing bytes after DER signature"));
    }

    let mut body = DerReader::new(body);
    let r = body.integer()?;
    let s = body.integer()?;
    if !body.is_empty() {
        return Err(PasskeyError::format("unexpected data after s in DER signature"));
    }

    let signature = Signature::from_scalars(FieldBytes::from(r), FieldBytes::from(s))
        .map_err(|_| PasskeyError::format("signature scalars must lie in 1..n"))?;
    let signature = signature.normalize_s().unwrap_or(signature);

    let mut raw = [0u8; RAW_SIGNATURE_LENGTH];
    raw.copy_from_slice(&signature.to_bytes());
    Ok(raw)
}

/// Fold `s` into the low half of the order: `min(s, n - s)`.
///
/// Values at or above `n` are returned unchanged; they are not valid
/// scalars and [`decode_der_signature`] rejects them.
pub fn normalize_s(s: &[u8; SCALAR_LENGTH]) -> [u8; SCALAR_LENGTH] {
    match scalar(s) {
        Some(scalar) if bool::from(scalar.is_high()) => {
            let mut low = [0u8; SCALAR_LENGTH];
            low.copy_from_slice(&(-scalar).to_bytes());
            low
        }
        _ => *s,
    }
}

/// Whether `s` is a scalar already in canonical low form.
pub fn is_low_s(s: &[u8; SCALAR_LENGTH]) -> bool {
    scalar(s).is_some_and(|scalar| !bool::from(scalar.is_high()))
}

/// Encode a raw `r || s` pair as DER.
///
/// # Errors
///
/// Returns [`PasskeyError::Format`] if either scalar is outside `1..n`.
pub fn encode_der_signature(raw: &[u8; RAW_SIGNATURE_LENGTH]) -> Result<Vec<u8>, PasskeyError> {
    let signature = Signature::from_slice(raw)
        .map_err(|_| PasskeyError::format("signature scalars must lie in 1..n"))?;
    Ok(signature.to_der().as_bytes().to_vec())
}

fn scalar(bytes: &[u8; SCALAR_LENGTH]) -> Option<Scalar> {
    Scalar::from_repr(FieldBytes::from(*bytes)).into()
}

struct DerReader<'a> {
    bytes: &'a [u8],
}

impl<'a> DerReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn byte(&mut self) -> Result<u8, PasskeyError> {
        let (first, rest) = self
            .bytes
            .split_first()
            .ok_or_else(|| PasskeyError::format("DER signature is truncated"))?;
        self.bytes = rest;
        Ok(*first)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], PasskeyError> {
        if len > self.bytes.len() {
            return Err(PasskeyError::format(format!(
                "DER length {len} exceeds the {} remaining bytes",
                self.bytes.len()
            )));
        }
        let (head, rest) = self.bytes.split_at(len);
        self.bytes = rest;
        Ok(head)
    }

    /// Short form, or the one-byte long form (`0x81 len`).
    fn length(&mut self) -> Result<usize, PasskeyError> {
        match self.byte()? {
            short if short < 0x80 => Ok(short as usize),
            0x81 => Ok(self.byte()? as usize),
            other => Err(PasskeyError::format(format!(
                "unsupported DER length prefix {other:#04x}"
            ))),
        }
    }

    fn integer(&mut self) -> Result<[u8; SCALAR_LENGTH], PasskeyError> {
        if self.byte()? != INTEGER_TAG {
            return Err(PasskeyError::format("expected an INTEGER in DER signature"));
        }
        let len = self.length()?;
        let value = self.take(len)?;
        if value.is_empty() {
            return Err(PasskeyError::format("empty INTEGER in DER signature"));
        }

        let first = value.iter().position(|byte| *byte != 0).unwrap_or(value.len());
        let magnitude = &value[first..];
        if magnitude.len() > SCALAR_LENGTH {
            return Err(PasskeyError::format(format!(
                "INTEGER has {} significant bytes, expected at most {SCALAR_LENGTH}",
                magnitude.len()
            )));
        }

        let mut scalar = [0u8; SCALAR_LENGTH];
        scalar[SCALAR_LENGTH - magnitude.len()..].copy_from_slice(magnitude);
        Ok(scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The secp256r1 group order `n`, big-endian.
    const ORDER: [u8; SCALAR_LENGTH] = [
        0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xbc, 0xe6, 0xfa, 0xad, 0xa7, 0x17, 0x9e, 0x84, 0xf3, 0xb9, 0xca, 0xc2, 0xfc, 0x63,
        0x25, 0x51,
    ];

    /// `floor(n / 2)`, big-endian.
    const HALF_ORDER: [u8; SCALAR_LENGTH] = [
        0x7f, 0xff, 0xff, 0xff, 0x80, 0x00, 0x00, 0x00, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xde, 0x73, 0x7d, 0x56, 0xd3, 0x8b, 0xcf, 0x42, 0x79, 0xdc, 0xe5, 0x61, 0x7e, 0x31,
        0x92, 0xa8,
    ];

    fn scalar(last: u8) -> [u8; SCALAR_LENGTH] {
        let mut out = [0u8; SCALAR_LENGTH];
        out[SCALAR_LENGTH - 1] = last;
        out
    }

    fn der_pair(r: &[u8], s: &[u8]) -> Vec<u8> {
        let mut der = vec![0x30, (4 + r.len() + s.len()) as u8, 0x02, r.len() as u8];
        der.extend_from_slice(r);
        der.extend_from_slice(&[0x02, s.len() as u8]);
        der.extend_from_slice(s);
        der
    }

    #[test]
    fn it_maps_n_minus_one_to_one() {
        let mut n_minus_one = ORDER;
        n_minus_one[SCALAR_LENGTH - 1] -= 1;
        assert_eq!(normalize_s(&n_minus_one), scalar(1));
        assert!(!is_low_s(&n_minus_one));
    }

    #[test]
    fn it_keeps_the_half_order_itself() {
        assert_eq!(normalize_s(&HALF_ORDER), HALF_ORDER);
        assert!(is_low_s(&HALF_ORDER));
    }

    #[test]
    fn it_flips_just_above_the_half_order() {
        let mut above = HALF_ORDER;
        above[SCALAR_LENGTH - 1] += 1;
        // n - (half + 1) == half
        assert_eq!(normalize_s(&above), HALF_ORDER);
    }

    #[test]
    fn it_leaves_non_scalars_alone() {
        assert_eq!(normalize_s(&ORDER), ORDER);
        assert!(!is_low_s(&ORDER));
    }

    #[test]
    fn it_decodes_short_integers_with_left_padding() {
        let raw = decode_der_signature(&der_pair(&[0x07], &[0x09])).unwrap();
        assert_eq!(&raw[..32], &scalar(7));
        assert_eq!(&raw[32..], &scalar(9));
    }

    #[test]
    fn it_strips_the_der_sign_byte() {
        let mut r = vec![0x00];
        r.extend_from_slice(&[0x8a; 32]);
        let mut s = vec![0x00];
        s.extend_from_slice(&[0x01; 32]);
        let raw = decode_der_signature(&der_pair(&r, &s)).unwrap();
        assert_eq!(&raw[..32], &[0x8a; 32]);
        assert_eq!(&raw[32..], &[0x01; 32]);
    }

    #[test]
    fn it_rejects_scalars_outside_the_group() {
        for (r, s) in [
            (&[0x00][..], &[0x01][..]),
            (&[0x01][..], &[0x00][..]),
            (&ORDER[..], &[0x01][..]),
            (&[0x01][..], &ORDER[..]),
        ] {
            let mut padded_r = Vec::new();
            if r[0] & 0x80 != 0 {
                padded_r.push(0x00);
            }
            padded_r.extend_from_slice(r);
            let mut padded_s = Vec::new();
            if s[0] & 0x80 != 0 {
                padded_s.push(0x00);
            }
            padded_s.extend_from_slice(s);
            assert!(
                matches!(
                    decode_der_signature(&der_pair(&padded_r, &padded_s)),
                    Err(PasskeyError::Format(_))
                ),
                "r={r:02x?} s={s:02x?}"
            );
        }
    }

    #[test]
    fn it_rejects_wrong_tags() {
        assert!(decode_der_signature(&[0x31, 0x06, 0x02, 0x01, 0x07, 0x02, 0x01, 0x09]).is_err());
        assert!(decode_der_signature(&[0x30, 0x06, 0x04, 0x01, 0x07, 0x02, 0x01, 0x09]).is_err());
        assert!(decode_der_signature(&[0x30, 0x06, 0x02, 0x01, 0x07, 0x03, 0x01, 0x09]).is_err());
    }

    #[test]
    fn it_rejects_truncated_input() {
        assert!(matches!(
            decode_der_signature(&[0x30, 0x08, 0x02, 0x01, 0x07]),
            Err(PasskeyError::Format(_))
        ));
        assert!(decode_der_signature(&[]).is_err());
    }

    #[test]
    fn it_rejects_oversized_integers() {
        assert!(decode_der_signature(&der_pair(&[0x01; 33], &[0x01])).is_err());
    }

    #[test]
    fn it_encodes_minimal_der() {
        let mut raw = [0u8; 64];
        raw[31] = 0x7f;
        raw[32] = 0x80;
        let der = encode_der_signature(&raw).unwrap();
        assert_eq!(&der[..5], &[0x30, 0x26, 0x02, 0x01, 0x7f]);
        assert_eq!(&der[5..8], &[0x02, 0x21, 0x00]);
        assert_eq!(der.len(), 2 + 3 + 35);
    }

    #[test]
    fn it_refuses_to_encode_a_zero_scalar() {
        assert!(encode_der_signature(&[0u8; 64]).is_err());
    }
}
