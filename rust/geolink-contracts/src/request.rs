//! Request bodies for the GeoLink backend.

use crate::{error::ContractError, intent::PaymentIntent};
use geolink_passkey::{AssertionEnvelope, PasskeyCredential, WebAuthnAssertion};
use serde::{Deserialize, Serialize};

/// `GET` lists the caller's passkeys.
pub const PASSKEYS_ENDPOINT: &str = "/webauthn/passkeys";
/// `POST` a [`PasskeyRegistrationRequest`].
pub const REGISTER_PASSKEY_ENDPOINT: &str = "/webauthn/register";
/// `POST` a [`SmartWalletPaymentRequest`] to pay from a smart wallet.
pub const EXECUTE_PAYMENT_ENDPOINT: &str = "/smart-wallet/execute-payment";
/// `POST` a [`SmartWalletPaymentRequest`] to fund a smart wallet.
pub const DEPOSIT_ENDPOINT: &str = "/smart-wallet/deposit";

/// `DELETE` path for one passkey.
pub fn passkey_endpoint(passkey_id: &str) -> String {
    format!("{PASSKEYS_ENDPOINT}/{passkey_id}")
}

/// Body of `POST /webauthn/register`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasskeyRegistrationRequest {
    /// SPKI, standard base64.
    #[serde(rename = "passkeyPublicKeySPKI")]
    pub passkey_public_key_spki: String,
    /// Credential ID, base64url.
    #[serde(rename = "credentialId")]
    pub credential_id: String,
    /// The wallet secret the backend binds the passkey to.
    #[serde(rename = "secretKey")]
    pub secret_key: String,
}

impl PasskeyRegistrationRequest {
    /// The body for registering `credential`.
    pub fn new(credential: &PasskeyCredential, secret_key: impl Into<String>) -> Self {
        Self {
            passkey_public_key_spki: credential.public_key_spki_base64(),
            credential_id: credential.credential_id_base64url(),
            secret_key: secret_key.into(),
        }
    }
}

impl std::fmt::Debug for PasskeyRegistrationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasskeyRegistrationRequest")
            .field("passkey_public_key_spki", &self.passkey_public_key_spki)
            .field("credential_id", &self.credential_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Body of the smart-wallet payment and deposit endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartWalletPaymentRequest {
    /// Receiving address.
    pub destination: String,
    /// Amount as a decimal string.
    pub amount: String,
    /// Asset code.
    pub asset: String,
    /// Optional memo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// Payload, passkey and assertion fields.
    #[serde(flatten)]
    pub envelope: AssertionEnvelope,
}

impl SmartWalletPaymentRequest {
    /// The body for `payment`, signed by `assertion` from the passkey with
    /// `public_key_spki`.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Encoding`] if the payment cannot be
    /// serialized.
    pub fn new(
        payment: &PaymentIntent,
        assertion: &WebAuthnAssertion,
        public_key_spki: &[u8],
    ) -> Result<Self, ContractError> {
        let payload = payment.to_signature_payload()?;
        Ok(Self {
            destination: payment.destination.clone(),
            amount: payment.amount.clone(),
            asset: payment.asset.clone(),
            memo: payment.memo.clone(),
            envelope: assertion.to_envelope(&payload, public_key_spki),
        })
    }
}
