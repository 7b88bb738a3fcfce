//! An in-memory P-256 [`Authenticator`].
//!
//! Produces the same artifacts a platform authenticator does (SPKI,
//! authenticator data, `clientDataJSON`, DER signatures) so ceremonies and
//! verification can run headless. Signatures are left exactly as the
//! signer produced them, high-s included.

use super::{Authenticator, CreationOptions, ES256, RegistrationResponse, RequestOptions};
use crate::{
    assertion::WebAuthnAssertion,
    authenticator_data::{AuthenticatorData, FLAG_USER_PRESENT, FLAG_USER_VERIFIED},
    challenge::ClientData,
    error::PasskeyError,
    spki::{RawPublicKey, encode_spki},
};
use geolink_common::SharedCell;
use p256::ecdsa::{DerSignature, SigningKey, signature::Signer as _};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};

/// Length of credential IDs minted by [`SoftwareAuthenticator`].
pub const SOFTWARE_CREDENTIAL_ID_LENGTH: usize = 16;

#[derive(Debug, Clone)]
struct StoredCredential {
    credential_id: Vec<u8>,
    rp_id: String,
    key: SigningKey,
    sign_count: u32,
}

/// Holds P-256 keys in memory and answers ceremonies with them.
///
/// ```
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// use geolink_passkey::*;
///
/// let authenticator = SoftwareAuthenticator::new("https://geolink.example");
/// let config = CeremonyConfig::new("geolink.example");
/// let credential = register_passkey(
///     &authenticator,
///     &config,
///     PasskeyUser::new(b"user-1".to_vec(), "user-1"),
/// )
/// .await?;
/// let assertion =
///     authenticate_with_passkey(&authenticator, &config, credential.credential_id(), "{}").await?;
/// AssertionVerifier::from_spki(credential.public_key_spki())?.verify("{}", &assertion)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # }).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct SoftwareAuthenticator {
    origin: String,
    credentials: SharedCell<Vec<StoredCredential>>,
    declining: AtomicBool,
}

impl SoftwareAuthenticator {
    /// An empty authenticator whose `clientDataJSON` reports `origin`.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            credentials: SharedCell::default(),
            declining: AtomicBool::new(false),
        }
    }

    /// Add an existing key under `credential_id` for `rp_id`.
    pub fn import(&self, credential_id: Vec<u8>, rp_id: impl Into<String>, key: SigningKey) {
        self.credentials.write().push(StoredCredential {
            credential_id,
            rp_id: rp_id.into(),
            key,
            sign_count: 0,
        });
    }

    /// Make every following ceremony fail as if the user cancelled it.
    pub fn set_declining(&self, declining: bool) {
        self.declining.store(declining, Ordering::SeqCst);
    }

    /// Number of stored credentials.
    pub fn len(&self) -> usize {
        self.credentials.read().len()
    }

    /// Whether no credentials are stored.
    pub fn is_empty(&self) -> bool {
        self.credentials.read().is_empty()
    }

    fn check_declining(&self) -> Result<(), PasskeyError> {
        if self.declining.load(Ordering::SeqCst) {
            return Err(PasskeyError::CeremonyFailed(
                "NotAllowedError: the user cancelled the request".into(),
            ));
        }
        Ok(())
    }
}

fn random_bytes<const N: usize>() -> Result<[u8; N], PasskeyError> {
    let mut bytes = [0u8; N];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| PasskeyError::Unsupported(format!("no random source: {e}")))?;
    Ok(bytes)
}

fn random_signing_key() -> Result<SigningKey, PasskeyError> {
    // A uniformly random 32-byte string is a valid scalar with overwhelming
    // probability; retry on the rest.
    loop {
        let seed: [u8; 32] = random_bytes()?;
        if let Ok(key) = SigningKey::from_bytes(&seed.into()) {
            return Ok(key);
        }
    }
}

fn raw_public_key(key: &SigningKey) -> Result<RawPublicKey, PasskeyError> {
    key.verifying_key()
        .to_encoded_point(false)
        .as_bytes()
        .try_into()
        .map_err(|_| PasskeyError::format("public key is not an uncompressed point"))
}

impl Authenticator for SoftwareAuthenticator {
    async fn create(&self, options: &CreationOptions) -> Result<RegistrationResponse, PasskeyError> {
        self.check_declining()?;
        if !options.algorithms.contains(&ES256) {
            return Err(PasskeyError::Unsupported(format!(
                "software authenticator only supports ES256, asked for {:?}",
                options.algorithms
            )));
        }

        let key = random_signing_key()?;
        let public_key_spki = encode_spki(&raw_public_key(&key)?);
        let credential_id = random_bytes::<SOFTWARE_CREDENTIAL_ID_LENGTH>()?.to_vec();

        self.import(credential_id.clone(), options.rp_id.clone(), key);

        Ok(RegistrationResponse {
            credential_id,
            public_key_spki,
            algorithm: ES256,
        })
    }

    async fn get(&self, options: &RequestOptions) -> Result<WebAuthnAssertion, PasskeyError> {
        self.check_declining()?;

        let mut credentials = self.credentials.write();
        let stored = credentials
            .iter_mut()
            .find(|stored| {
                stored.rp_id == options.rp_id
                    && (options.allow_credentials.is_empty()
                        || options.allow_credentials.contains(&stored.credential_id))
            })
            .ok_or(PasskeyError::NotFound)?;

        stored.sign_count = stored.sign_count.wrapping_add(1);

        let client_data_json = ClientData::assertion(&options.challenge, &self.origin).to_json();
        let authenticator_data = AuthenticatorData::new(
            &options.rp_id,
            FLAG_USER_PRESENT | FLAG_USER_VERIFIED,
            stored.sign_count,
        )
        .to_bytes();

        let mut signed_data = authenticator_data.clone();
        signed_data.extend_from_slice(&Sha256::digest(&client_data_json));
        let signature: DerSignature = stored.key.sign(&signed_data);

        Ok(WebAuthnAssertion::new(
            stored.credential_id.clone(),
            client_data_json,
            authenticator_data,
            signature.as_bytes().to_vec(),
        ))
    }
}
