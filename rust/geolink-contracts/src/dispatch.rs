//! Authorizing passkey-signed contract calls.

use crate::{
    error::ContractError,
    intent::{ContractCallIntent, IntentPolicy},
    nonce::NonceLedger,
    registry::ContractRegistry,
};
use geolink_common::time::unix_seconds;
use geolink_passkey::{AssertionVerifier, WebAuthnAssertion};

/// Checks signed intents before they are forwarded to a contract: time
/// window, target function, nonce freshness, then the passkey signature.
/// A nonce is consumed only by a call that passes every check.
#[derive(Debug, Default)]
pub struct IntentDispatcher {
    policy: IntentPolicy,
    nonces: NonceLedger,
}

impl IntentDispatcher {
    /// A dispatcher with an empty nonce ledger.
    pub fn new(policy: IntentPolicy) -> Self {
        Self {
            policy,
            nonces: NonceLedger::new(),
        }
    }

    /// The time policy.
    pub fn policy(&self) -> &IntentPolicy {
        &self.policy
    }

    /// The nonces consumed so far.
    pub fn nonces(&self) -> &NonceLedger {
        &self.nonces
    }

    /// Authorize `intent`, signed by the passkey behind `verifier`, at `now`.
    ///
    /// # Errors
    ///
    /// The first failing check, as a [`ContractError`].
    pub fn authorize(
        &self,
        intent: &ContractCallIntent,
        assertion: &WebAuthnAssertion,
        verifier: &AssertionVerifier,
        registry: &ContractRegistry,
        now: u64,
    ) -> Result<(), ContractError> {
        intent.check_window(now, &self.policy)?;
        registry
            .function(&intent.contract_id, &intent.fn_name)?
            .check_arguments(&intent.args)?;

        if self.nonces.is_used(&intent.signer, &intent.nonce) {
            tracing::warn!(signer = %intent.signer, "rejected reused intent nonce");
            return Err(ContractError::NonceReused {
                signer: intent.signer.clone(),
            });
        }

        verifier.verify(&intent.to_signature_payload()?, assertion)?;
        self.nonces.record(&intent.signer, &intent.nonce)?;

        tracing::debug!(
            contract_id = %intent.contract_id,
            function = %intent.fn_name,
            "authorized contract call"
        );
        Ok(())
    }

    /// [`IntentDispatcher::authorize`] against the current wall clock.
    ///
    /// # Errors
    ///
    /// As [`IntentDispatcher::authorize`].
    pub fn authorize_now(
        &self,
        intent: &ContractCallIntent,
        assertion: &WebAuthnAssertion,
        verifier: &AssertionVerifier,
        registry: &ContractRegistry,
    ) -> Result<(), ContractError> {
        self.authorize(intent, assertion, verifier, registry, unix_seconds())
    }
}
