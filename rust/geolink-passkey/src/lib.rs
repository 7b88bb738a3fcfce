#![warn(missing_docs)]

//! Bridges browser passkeys (WebAuthn, ES256) to the signature format a
//! Soroban smart-wallet verifier accepts.
//!
//! - [`extract_raw_public_key`] turns the SPKI a browser returns at
//!   registration into the 65-byte uncompressed point stored on-chain.
//! - [`build_challenge`] derives the 32-byte WebAuthn challenge from a
//!   signature payload.
//! - [`decode_der_signature`] turns the authenticator's DER signature into
//!   64-byte low-s `r || s`.
//! - [`register_passkey`] and [`authenticate_with_passkey`] run the two
//!   ceremonies against any [`Authenticator`].
//! - [`AssertionVerifier`] checks an assertion the way the backend does.

mod assertion;
mod authenticator_data;
mod ceremony;
mod challenge;
mod credential;
mod der;
mod error;
mod spki;
mod verifier;

pub use assertion::*;
pub use authenticator_data::*;
pub use ceremony::*;
pub use challenge::*;
pub use credential::*;
pub use der::*;
pub use error::*;
pub use spki::*;
pub use verifier::*;
