//! Replay protection.

use crate::{error::ContractError, intent::Nonce};
use geolink_common::SharedCell;
use std::collections::HashSet;

/// Remembers every `(signer, nonce)` pair that has authorized a call.
#[derive(Debug, Default)]
pub struct NonceLedger {
    used: SharedCell<HashSet<(String, Nonce)>>,
}

impl NonceLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `signer` has already used `nonce`.
    pub fn is_used(&self, signer: &str, nonce: &Nonce) -> bool {
        self.used.read().contains(&(signer.to_string(), *nonce))
    }

    /// Mark `nonce` as used by `signer`.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::NonceReused`] if the pair was already
    /// recorded.
    pub fn record(&self, signer: &str, nonce: &Nonce) -> Result<(), ContractError> {
        if self.used.write().insert((signer.to_string(), *nonce)) {
            Ok(())
        } else {
            tracing::warn!(%signer, "rejected reused intent nonce");
            Err(ContractError::NonceReused {
                signer: signer.to_string(),
            })
        }
    }

    /// Number of recorded pairs.
    pub fn len(&self) -> usize {
        self.used.read().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.used.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_accepts_a_nonce_once_per_signer() {
        let ledger = NonceLedger::new();
        let nonce = Nonce::from([1u8; 32]);

        assert!(!ledger.is_used("GALICE", &nonce));
        ledger.record("GALICE", &nonce).unwrap();
        assert!(ledger.is_used("GALICE", &nonce));
        assert!(matches!(
            ledger.record("GALICE", &nonce),
            Err(ContractError::NonceReused { .. })
        ));

        // the same nonce from another signer is a different pair
        ledger.record("GBOB", &nonce).unwrap();
        assert_eq!(ledger.len(), 2);
    }
}
