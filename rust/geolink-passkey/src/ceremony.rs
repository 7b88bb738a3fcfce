//! Registration and authentication ceremonies.
//!
//! The platform ceremony sits behind [`Authenticator`]. In a browser that is
//! [`BrowserAuthenticator`] (`navigator.credentials`); everywhere else,
//! [`SoftwareAuthenticator`] holds P-256 keys in memory.
//!
//! [`register_passkey`] and [`authenticate_with_passkey`] build the request
//! options, run the ceremony and check what comes back. Neither persists
//! anything, retries, or enforces a timeout beyond the one handed to the
//! platform.

mod browser;
mod software;

pub use browser::*;
pub use software::*;

use crate::{
    assertion::WebAuthnAssertion,
    challenge::{ASSERTION_TYPE, Challenge, build_challenge},
    credential::PasskeyCredential,
    error::PasskeyError,
    spki::extract_raw_public_key,
};
use geolink_common::{ConditionalSend, ConditionalSync};
use serde::{Deserialize, Serialize};

/// COSE algorithm identifier for ES256 (ECDSA P-256 with SHA-256).
pub const ES256: i64 = -7;

/// Default ceremony timeout handed to the platform.
pub const DEFAULT_TIMEOUT_MS: u32 = 60_000;

/// Length of the random challenge used during registration.
pub const REGISTRATION_CHALLENGE_LENGTH: usize = 32;

/// WebAuthn `userVerification` requirement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserVerification {
    /// Biometric or PIN required.
    #[default]
    Required,
    /// Verify if the authenticator can.
    Preferred,
    /// Do not verify.
    Discouraged,
}

impl UserVerification {
    /// The string the WebAuthn API expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Preferred => "preferred",
            Self::Discouraged => "discouraged",
        }
    }
}

/// Relying party settings shared by both ceremonies.
///
/// # Example
///
/// ```
/// use geolink_passkey::CeremonyConfig;
///
/// let config = CeremonyConfig::new("geolink.example")
///     .with_rp_name("GeoLink")
///     .with_timeout_ms(30_000);
/// assert_eq!(config.origin, "https://geolink.example");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeremonyConfig {
    /// Relying party ID (usually the site's registrable domain).
    pub rp_id: String,
    /// Human-readable relying party name.
    pub rp_name: String,
    /// Origin recorded in `clientDataJSON` by software authenticators.
    pub origin: String,
    /// Timeout handed to the platform, in milliseconds.
    pub timeout_ms: u32,
    /// User verification requirement.
    pub user_verification: UserVerification,
}

impl CeremonyConfig {
    /// Config for `rp_id` with the origin `https://{rp_id}`.
    pub fn new(rp_id: impl Into<String>) -> Self {
        let rp_id = rp_id.into();
        Self {
            origin: format!("https://{rp_id}"),
            rp_name: rp_id.clone(),
            rp_id,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_verification: UserVerification::Required,
        }
    }

    /// Set the relying party name.
    pub fn with_rp_name(mut self, rp_name: impl Into<String>) -> Self {
        self.rp_name = rp_name.into();
        self
    }

    /// Set the origin.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Set the timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the user verification requirement.
    pub fn with_user_verification(mut self, user_verification: UserVerification) -> Self {
        self.user_verification = user_verification;
        self
    }
}

impl Default for CeremonyConfig {
    fn default() -> Self {
        Self::new("localhost").with_origin("http://localhost")
    }
}

/// The account a passkey is registered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasskeyUser {
    /// Opaque user handle, unique per user on this relying party.
    pub id: Vec<u8>,
    /// Account name.
    pub name: String,
    /// Display name.
    pub display_name: String,
}

impl PasskeyUser {
    /// A user whose display name is their account name.
    pub fn new(id: impl Into<Vec<u8>>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            display_name: name.clone(),
            name,
        }
    }
}

/// `PublicKeyCredentialCreationOptions`, reduced to what the bridge sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationOptions {
    /// Random registration challenge.
    pub challenge: Vec<u8>,
    /// Relying party ID.
    pub rp_id: String,
    /// Relying party name.
    pub rp_name: String,
    /// The account.
    pub user: PasskeyUser,
    /// Acceptable COSE algorithms, in preference order.
    pub algorithms: Vec<i64>,
    /// Restrict to the platform authenticator.
    pub platform_attachment: bool,
    /// Require a discoverable credential.
    pub resident_key_required: bool,
    /// User verification requirement.
    pub user_verification: UserVerification,
    /// Timeout in milliseconds.
    pub timeout_ms: u32,
}

/// `PublicKeyCredentialRequestOptions`, reduced to what the bridge sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// Challenge derived from the signature payload.
    pub challenge: Challenge,
    /// Relying party ID.
    pub rp_id: String,
    /// Credential IDs the authenticator may use.
    pub allow_credentials: Vec<Vec<u8>>,
    /// User verification requirement.
    pub user_verification: UserVerification,
    /// Timeout in milliseconds.
    pub timeout_ms: u32,
}

/// What an authenticator returns from a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationResponse {
    /// The new credential's ID.
    pub credential_id: Vec<u8>,
    /// DER SubjectPublicKeyInfo of the new key.
    pub public_key_spki: Vec<u8>,
    /// COSE algorithm of the new key.
    pub algorithm: i64,
}

/// A platform that can create passkeys and sign with them.
pub trait Authenticator: ConditionalSync {
    /// Create a credential (`navigator.credentials.create`).
    fn create(
        &self,
        options: &CreationOptions,
    ) -> impl Future<Output = Result<RegistrationResponse, PasskeyError>> + ConditionalSend;

    /// Produce an assertion (`navigator.credentials.get`).
    fn get(
        &self,
        options: &RequestOptions,
    ) -> impl Future<Output = Result<WebAuthnAssertion, PasskeyError>> + ConditionalSend;
}

/// Register a new ES256 passkey for `user`.
///
/// # Errors
///
/// - [`PasskeyError::Unsupported`] if the authenticator cannot run WebAuthn
///   or returns a key that is not ES256.
/// - [`PasskeyError::CeremonyFailed`] if the user cancels or the platform
///   rejects the request.
/// - [`PasskeyError::Format`] if the returned SPKI does not hold a P-256
///   point.
pub async fn register_passkey<A: Authenticator>(
    authenticator: &A,
    config: &CeremonyConfig,
    user: PasskeyUser,
) -> Result<PasskeyCredential, PasskeyError> {
    let mut challenge = vec![0u8; REGISTRATION_CHALLENGE_LENGTH];
    getrandom::getrandom(&mut challenge)
        .map_err(|e| PasskeyError::Unsupported(format!("no random source: {e}")))?;

    let options = CreationOptions {
        challenge,
        rp_id: config.rp_id.clone(),
        rp_name: config.rp_name.clone(),
        user,
        algorithms: vec![ES256],
        platform_attachment: true,
        resident_key_required: true,
        user_verification: config.user_verification,
        timeout_ms: config.timeout_ms,
    };

    tracing::debug!(rp_id = %options.rp_id, "starting passkey registration");
    let response = authenticator.create(&options).await?;

    if response.algorithm != ES256 {
        return Err(PasskeyError::Unsupported(format!(
            "expected ES256 (alg {ES256}), got alg {}",
            response.algorithm
        )));
    }

    let point = extract_raw_public_key(&response.public_key_spki)?;
    p256::ecdsa::VerifyingKey::from_sec1_bytes(&point)
        .map_err(|_| PasskeyError::format("registered public key is not a P-256 point"))?;

    tracing::debug!(
        credential_id_len = response.credential_id.len(),
        "passkey registered"
    );
    Ok(PasskeyCredential::new(
        response.credential_id,
        response.public_key_spki,
    ))
}

/// Sign `payload` with the passkey `credential_id`.
///
/// The challenge is [`build_challenge`]`(payload)`. The returned assertion's
/// `clientDataJSON` is checked to echo exactly that challenge.
///
/// # Errors
///
/// - [`PasskeyError::Unsupported`] if the authenticator cannot run WebAuthn.
/// - [`PasskeyError::NotFound`] if it holds no such credential.
/// - [`PasskeyError::CeremonyFailed`] if the user cancels, the platform
///   rejects the request, or the assertion echoes a different challenge.
/// - [`PasskeyError::Format`] if `clientDataJSON` cannot be parsed.
pub async fn authenticate_with_passkey<A: Authenticator>(
    authenticator: &A,
    config: &CeremonyConfig,
    credential_id: &[u8],
    payload: &str,
) -> Result<WebAuthnAssertion, PasskeyError> {
    let options = RequestOptions {
        challenge: build_challenge(payload),
        rp_id: config.rp_id.clone(),
        allow_credentials: vec![credential_id.to_vec()],
        user_verification: config.user_verification,
        timeout_ms: config.timeout_ms,
    };

    tracing::debug!(
        rp_id = %options.rp_id,
        payload_len = payload.len(),
        "starting passkey assertion"
    );
    let mut assertion = authenticator.get(&options).await?;

    let client_data = assertion.client_data()?;
    if client_data.kind != ASSERTION_TYPE {
        return Err(PasskeyError::CeremonyFailed(format!(
            "authenticator returned clientDataJSON of type {:?}",
            client_data.kind
        )));
    }
    if client_data.challenge_bytes()? != options.challenge {
        return Err(PasskeyError::CeremonyFailed(
            "authenticator echoed a different challenge".into(),
        ));
    }

    if assertion.credential_id.is_empty() {
        assertion.credential_id = credential_id.to_vec();
    }
    tracing::debug!("passkey assertion complete");
    Ok(assertion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{challenge::ClientData, der::encode_der_signature};

    #[test]
    fn it_defaults_to_required_verification_and_sixty_seconds() {
        let config = CeremonyConfig::new("geolink.example");
        assert_eq!(config.timeout_ms, 60_000);
        assert_eq!(config.user_verification, UserVerification::Required);
        assert_eq!(config.rp_name, "geolink.example");
    }

    #[test]
    fn it_serializes_user_verification_in_webauthn_form() {
        let json = serde_json::to_string(&UserVerification::Preferred).unwrap();
        assert_eq!(json, "\"preferred\"");
        assert_eq!(UserVerification::Discouraged.as_str(), "discouraged");
    }

    /// Returns a fixed response regardless of the request.
    struct Canned {
        registration: RegistrationResponse,
        assertion: WebAuthnAssertion,
    }

    impl Authenticator for Canned {
        async fn create(
            &self,
            _options: &CreationOptions,
        ) -> Result<RegistrationResponse, PasskeyError> {
            Ok(self.registration.clone())
        }

        async fn get(&self, _options: &RequestOptions) -> Result<WebAuthnAssertion, PasskeyError> {
            Ok(self.assertion.clone())
        }
    }

    fn canned(algorithm: i64, challenge_payload: &str) -> Canned {
        let client_data =
            ClientData::assertion(&build_challenge(challenge_payload), "https://geolink.example");
        Canned {
            registration: RegistrationResponse {
                credential_id: vec![1, 2, 3],
                public_key_spki: vec![0u8; 91],
                algorithm,
            },
            assertion: WebAuthnAssertion::new(
                Vec::new(),
                client_data.to_json(),
                vec![0u8; 37],
                encode_der_signature(&[1u8; 64]).unwrap(),
            ),
        }
    }

    #[tokio::test]
    async fn it_rejects_non_es256_registrations() {
        let authenticator = canned(-257, "");
        let result = register_passkey(
            &authenticator,
            &CeremonyConfig::default(),
            PasskeyUser::new(b"user".to_vec(), "user"),
        )
        .await;
        assert!(matches!(result, Err(PasskeyError::Unsupported(_))));
    }

    #[tokio::test]
    async fn it_rejects_keys_that_are_not_on_the_curve() {
        let authenticator = canned(ES256, "");
        let result = register_passkey(
            &authenticator,
            &CeremonyConfig::default(),
            PasskeyUser::new(b"user".to_vec(), "user"),
        )
        .await;
        assert!(matches!(result, Err(PasskeyError::Format(_))));
    }

    #[tokio::test]
    async fn it_rejects_an_echoed_challenge_from_another_payload() {
        let authenticator = canned(ES256, "some other payload");
        let result = authenticate_with_passkey(
            &authenticator,
            &CeremonyConfig::default(),
            &[1, 2, 3],
            "the payload",
        )
        .await;
        assert!(matches!(result, Err(PasskeyError::CeremonyFailed(_))));
    }

    #[tokio::test]
    async fn it_fills_in_the_requested_credential_id() {
        let authenticator = canned(ES256, "the payload");
        let assertion = authenticate_with_passkey(
            &authenticator,
            &CeremonyConfig::default(),
            &[1, 2, 3],
            "the payload",
        )
        .await
        .unwrap();
        assert_eq!(assertion.credential_id, vec![1, 2, 3]);
    }
}
