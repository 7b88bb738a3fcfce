//! Intents: what a passkey signature authorizes.
//!
//! An intent is signed through its canonical JSON: object keys sorted,
//! no insignificant whitespace. The passkey challenge keeps only the first
//! 32 bytes of a payload, so a contract-call payload opens with
//! `base64url(SHA-256(canonical JSON))` and every field lands in the signed
//! prefix. Two serializations of the same intent must be byte-identical or
//! the assertion will not verify.

use crate::error::ContractError;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use geolink_passkey::{Challenge, build_challenge};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// The only intent version.
pub const INTENT_VERSION: u32 = 1;

/// Length of an intent nonce.
pub const NONCE_LENGTH: usize = 32;

/// Default for [`IntentPolicy::max_clock_skew_secs`].
pub const DEFAULT_MAX_CLOCK_SKEW_SECS: u64 = 60;

/// Default for [`IntentPolicy::ttl_secs`].
pub const DEFAULT_INTENT_TTL_SECS: u64 = 300;

/// A 32-byte single-use value, base64 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nonce([u8; NONCE_LENGTH]);

impl Nonce {
    /// Draw a nonce from the OS random source.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Random`] if no random source is available.
    pub fn random() -> Result<Self, ContractError> {
        let mut bytes = [0u8; NONCE_LENGTH];
        getrandom::getrandom(&mut bytes).map_err(|e| ContractError::Random(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_LENGTH] {
        &self.0
    }
}

impl From<[u8; NONCE_LENGTH]> for Nonce {
    fn from(bytes: [u8; NONCE_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Nonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = STANDARD
            .decode(&encoded)
            .map_err(serde::de::Error::custom)?;
        let bytes: [u8; NONCE_LENGTH] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            serde::de::Error::custom(format!(
                "nonce must be {NONCE_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

/// Time rules applied to intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentPolicy {
    /// How far `iat` may lie in the future, in seconds.
    pub max_clock_skew_secs: u64,
    /// Lifetime given to new intents, in seconds.
    pub ttl_secs: u64,
}

impl IntentPolicy {
    /// Set the allowed clock skew.
    pub fn with_max_clock_skew_secs(mut self, secs: u64) -> Self {
        self.max_clock_skew_secs = secs;
        self
    }

    /// Set the lifetime of new intents.
    pub fn with_ttl_secs(mut self, secs: u64) -> Self {
        self.ttl_secs = secs;
        self
    }
}

impl Default for IntentPolicy {
    fn default() -> Self {
        Self {
            max_clock_skew_secs: DEFAULT_MAX_CLOCK_SKEW_SECS,
            ttl_secs: DEFAULT_INTENT_TTL_SECS,
        }
    }
}

/// A request to call `fn_name` on `contract_id` on behalf of `signer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCallIntent {
    /// Intent version; always [`INTENT_VERSION`].
    pub v: u32,
    /// Target contract address.
    pub contract_id: String,
    /// Function to call.
    pub fn_name: String,
    /// Call arguments.
    pub args: Vec<Value>,
    /// Stellar address of the signer.
    pub signer: String,
    /// Single-use value for replay protection.
    pub nonce: Nonce,
    /// Issued at, in Unix seconds.
    pub iat: u64,
    /// Expires at, in Unix seconds.
    pub exp: u64,
}

impl ContractCallIntent {
    /// A fresh intent issued at `now` with a random nonce.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Random`] if no nonce can be drawn.
    pub fn new(
        contract_id: impl Into<String>,
        fn_name: impl Into<String>,
        args: Vec<Value>,
        signer: impl Into<String>,
        policy: &IntentPolicy,
        now: u64,
    ) -> Result<Self, ContractError> {
        Ok(Self {
            v: INTENT_VERSION,
            contract_id: contract_id.into(),
            fn_name: fn_name.into(),
            args,
            signer: signer.into(),
            nonce: Nonce::random()?,
            iat: now,
            exp: now.saturating_add(policy.ttl_secs),
        })
    }

    /// The string the passkey signs: `<digest>.<canonical JSON>`, where
    /// `digest` is [`ContractCallIntent::digest`].
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Encoding`] if an argument cannot be
    /// serialized.
    pub fn to_signature_payload(&self) -> Result<String, ContractError> {
        let canonical = canonical_json(self)?;
        let digest = URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()));
        Ok(format!("{digest}.{canonical}"))
    }

    /// SHA-256 of the canonical JSON.
    ///
    /// # Errors
    ///
    /// As [`ContractCallIntent::to_signature_payload`].
    pub fn digest(&self) -> Result<[u8; 32], ContractError> {
        Ok(Sha256::digest(canonical_json(self)?.as_bytes()).into())
    }

    /// The WebAuthn challenge for this intent.
    ///
    /// # Errors
    ///
    /// As [`ContractCallIntent::to_signature_payload`].
    pub fn challenge(&self) -> Result<Challenge, ContractError> {
        Ok(build_challenge(&self.to_signature_payload()?))
    }

    /// Check the version and the time window at `now`.
    ///
    /// # Errors
    ///
    /// - [`ContractError::UnsupportedVersion`] if `v` is not 1.
    /// - [`ContractError::Expired`] if `now > exp`.
    /// - [`ContractError::IssuedInFuture`] if `iat > now + max_clock_skew_secs`.
    pub fn check_window(&self, now: u64, policy: &IntentPolicy) -> Result<(), ContractError> {
        if self.v != INTENT_VERSION {
            return Err(ContractError::UnsupportedVersion(self.v));
        }
        if now > self.exp {
            return Err(ContractError::Expired { exp: self.exp, now });
        }
        if self.iat > now.saturating_add(policy.max_clock_skew_secs) {
            return Err(ContractError::IssuedInFuture { iat: self.iat, now });
        }
        Ok(())
    }
}

/// A payment from a smart wallet, signed as its canonical JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Paying smart-wallet address.
    pub source: String,
    /// Receiving address.
    pub destination: String,
    /// Amount as a decimal string.
    pub amount: String,
    /// Asset code.
    pub asset: String,
    /// Optional memo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// Creation time, in Unix seconds.
    pub timestamp: u64,
}

impl PaymentIntent {
    /// The canonical JSON the passkey signs.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Encoding`] if serialization fails.
    pub fn to_signature_payload(&self) -> Result<String, ContractError> {
        canonical_json(self)
    }
}

/// Serialize `value` with every object's keys sorted and no whitespace.
///
/// # Errors
///
/// Returns [`ContractError::Encoding`] if `value` cannot be represented as
/// JSON.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, ContractError> {
    let value = serde_json::to_value(value).map_err(|e| ContractError::Encoding(e.to_string()))?;
    serde_json::to_string(&sort_keys(value)).map_err(|e| ContractError::Encoding(e.to_string()))
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, sort_keys(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
