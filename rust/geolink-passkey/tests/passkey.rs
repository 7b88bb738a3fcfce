//! Passkey bridge integration tests.
//!
//! The automated tests run natively: keys come from `p256` or from the
//! in-memory [`SoftwareAuthenticator`], which produces the same artifacts a
//! browser does.
//!
//! With the `web-integration-tests` feature, a browser-only module checks
//! that `navigator.credentials` is reachable:
//!
//! ```sh
//! cargo test -p geolink-passkey
//! wasm-pack test --headless --chrome rust/geolink-passkey -- --features web-integration-tests
//! ```

use geolink_passkey::*;
use p256::ecdsa::{
    DerSignature, Signature, SigningKey, VerifyingKey,
    signature::{Signer as _, Verifier as _},
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use testresult::TestResult;

const RP_ID: &str = "geolink.example";
const ORIGIN: &str = "https://geolink.example";

fn hex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

/// SPKI of the P-256 generator point, laid out exactly as Chrome returns it
/// from `getPublicKey()`.
fn generator_spki() -> Vec<u8> {
    let mut spki = hex("3059301306072a8648ce3d020106082a8648ce3d030107034200");
    spki.push(0x04);
    spki.extend(hex(
        "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296",
    ));
    spki.extend(hex(
        "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5",
    ));
    spki
}

#[test]
fn it_extracts_the_point_from_a_browser_spki() -> TestResult {
    let spki = generator_spki();
    assert_eq!(spki.len(), 91);
    assert_eq!(spki[..26], P256_SPKI_HEADER);

    let point = extract_raw_public_key(&spki)?;
    assert_eq!(point.len(), 65);
    assert_eq!(point[0], 0x04);
    assert_eq!(point[..], spki[26..]);

    // It is the real generator, so p256 accepts it.
    VerifyingKey::from_sec1_bytes(&point)?;
    Ok(())
}

#[test]
fn it_takes_the_challenge_from_the_payload_verbatim() {
    let payload = r#"{"source":"G...","destination":"G...","amount":"100","timestamp":1700000000}"#;
    let challenge = build_challenge(payload);
    assert_eq!(challenge.len(), 32);
    assert_eq!(&challenge[..], &payload.as_bytes()[..32]);
    assert_eq!(&challenge[..], br#"{"source":"G...","destination":"#);
}

#[test]
fn it_normalizes_a_high_s_signature() -> TestResult {
    let key = SigningKey::from_bytes(&[0x42; 32].into())?;
    let message = b"high-s";
    let signature: Signature = key.sign(message);
    let low = signature.normalize_s().unwrap_or(signature);

    let high_s = -*low.s();
    let high = Signature::from_scalars(low.r().to_bytes(), high_s.to_bytes())?;
    assert!(high.normalize_s().is_some(), "fixture must be high-s");

    let decoded = decode_der_signature(high.to_der().as_bytes())?;
    assert_eq!(decoded[..], low.to_bytes()[..]);

    let s: [u8; 32] = decoded[32..].try_into()?;
    assert!(is_low_s(&s));
    Ok(())
}

#[test]
fn it_decodes_signatures_that_verify() -> TestResult {
    let key = SigningKey::from_bytes(&[7; 32].into())?;
    let message = b"round trip through DER";
    let der: DerSignature = key.sign(message);

    let raw = decode_der_signature(der.as_bytes())?;
    let signature = Signature::from_slice(&raw)?;
    key.verifying_key().verify(message, &signature)?;
    Ok(())
}

#[test]
fn it_rejects_malformed_signatures() {
    for der in [
        &[][..],
        &[0x31, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01][..],
        &[0x30, 0x06, 0x04, 0x01, 0x01, 0x02, 0x01, 0x01][..],
        &[0x30, 0x06, 0x02, 0x01, 0x01, 0x03, 0x01, 0x01][..],
        &[0x30, 0x06, 0x02, 0x05, 0x01][..],
        // r = 0
        &[0x30, 0x06, 0x02, 0x01, 0x00, 0x02, 0x01, 0x01][..],
    ] {
        assert!(
            matches!(decode_der_signature(der), Err(PasskeyError::Format(_))),
            "{der:02x?} should be rejected"
        );
    }
}

proptest! {
    #[test]
    fn every_p256_spki_yields_its_uncompressed_point(seed in any::<[u8; 32]>()) {
        // scalars outside 1..n are not keys
        prop_assume!(SigningKey::from_bytes(&seed.into()).is_ok());
        let key = SigningKey::from_bytes(&seed.into()).unwrap();
        let point: RawPublicKey = key
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .try_into()
            .unwrap();

        let extracted = extract_raw_public_key(&encode_spki(&point)).unwrap();
        prop_assert_eq!(extracted.len(), 65);
        prop_assert_eq!(extracted[0], 0x04);
        prop_assert_eq!(extracted, point);
    }

    #[test]
    fn challenges_are_always_32_bytes(payload in ".*") {
        let challenge = build_challenge(&payload);
        prop_assert_eq!(challenge.len(), 32);
        prop_assert_eq!(challenge, build_challenge(&payload));

        let prefix = payload.len().min(32);
        prop_assert_eq!(&challenge[..prefix], &payload.as_bytes()[..prefix]);
        prop_assert!(challenge[prefix..].iter().all(|b| *b == 0));
    }

    #[test]
    fn decoded_signatures_are_64_bytes_low_s_and_stable(
        seed in 1u8..0xff,
        message in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let key = SigningKey::from_bytes(&[seed; 32].into()).unwrap();
        let der: DerSignature = key.sign(&message);

        let decoded = decode_der_signature(der.as_bytes()).unwrap();
        prop_assert_eq!(decoded.len(), 64);

        let s: [u8; 32] = decoded[32..].try_into().unwrap();
        prop_assert!(is_low_s(&s));
        prop_assert_eq!(normalize_s(&s), s);

        let again = decode_der_signature(&encode_der_signature(&decoded).unwrap()).unwrap();
        prop_assert_eq!(again, decoded);
    }
}

#[tokio::test]
async fn it_registers_signs_and_verifies_with_a_software_passkey() -> TestResult {
    let authenticator = SoftwareAuthenticator::new(ORIGIN);
    let config = CeremonyConfig::new(RP_ID).with_rp_name("GeoLink");

    let credential = register_passkey(
        &authenticator,
        &config,
        PasskeyUser::new(b"user-1".to_vec(), "alice"),
    )
    .await?;
    assert_eq!(credential.public_key_spki().len(), 91);
    assert_eq!(authenticator.len(), 1);

    let payload = r#"{"amount":"100","asset":"XLM","destination":"GDEST"}"#;
    let assertion =
        authenticate_with_passkey(&authenticator, &config, credential.credential_id(), payload)
            .await?;
    assert_eq!(assertion.credential_id, credential.credential_id());

    let client_data = assertion.client_data()?;
    assert_eq!(client_data.kind, "webauthn.get");
    assert_eq!(client_data.origin, ORIGIN);
    assert!(client_data.is_bound_to(payload)?);

    let verifier = AssertionVerifier::from_spki(credential.public_key_spki())?.with_rp_id(RP_ID);
    verifier.verify(payload, &assertion)?;

    let envelope = assertion.to_envelope(payload, credential.public_key_spki());
    verifier.verify_envelope(&envelope)?;

    let restored = WebAuthnAssertion::from_bytes(&assertion.to_vec())?;
    verifier.verify(payload, &restored)?;
    Ok(())
}

#[tokio::test]
async fn it_rejects_an_assertion_for_a_different_payload() -> TestResult {
    let authenticator = SoftwareAuthenticator::new(ORIGIN);
    let config = CeremonyConfig::new(RP_ID);
    let credential = register_passkey(
        &authenticator,
        &config,
        PasskeyUser::new(b"user-2".to_vec(), "bob"),
    )
    .await?;

    let assertion = authenticate_with_passkey(
        &authenticator,
        &config,
        credential.credential_id(),
        r#"{"amount":"100","destination":"GDEST"}"#,
    )
    .await?;

    let verifier = AssertionVerifier::from_spki(credential.public_key_spki())?;
    assert_eq!(
        verifier.verify(r#"{"amount":"900","destination":"GDEST"}"#, &assertion),
        Err(VerifyError::ChallengeMismatch)
    );
    Ok(())
}

#[tokio::test]
async fn it_reports_cancelled_ceremonies() {
    let authenticator = SoftwareAuthenticator::new(ORIGIN);
    authenticator.set_declining(true);

    let result = register_passkey(
        &authenticator,
        &CeremonyConfig::new(RP_ID),
        PasskeyUser::new(b"user-3".to_vec(), "carol"),
    )
    .await;
    assert!(matches!(result, Err(PasskeyError::CeremonyFailed(_))));
}

#[tokio::test]
async fn it_reports_unknown_credentials() -> TestResult {
    let authenticator = SoftwareAuthenticator::new(ORIGIN);
    let config = CeremonyConfig::new(RP_ID);
    register_passkey(
        &authenticator,
        &config,
        PasskeyUser::new(b"user-4".to_vec(), "dave"),
    )
    .await?;

    let result = authenticate_with_passkey(&authenticator, &config, b"missing", "{}").await;
    assert_eq!(result, Err(PasskeyError::NotFound));
    Ok(())
}

#[tokio::test]
async fn it_signs_with_an_imported_key() -> TestResult {
    let key = SigningKey::from_bytes(&[0x33; 32].into())?;
    let point: RawPublicKey = key
        .verifying_key()
        .to_encoded_point(false)
        .as_bytes()
        .try_into()?;

    let authenticator = SoftwareAuthenticator::new(ORIGIN);
    authenticator.import(b"imported".to_vec(), RP_ID, key);

    let config = CeremonyConfig::new(RP_ID);
    let assertion = authenticate_with_passkey(&authenticator, &config, b"imported", "hello").await?;
    AssertionVerifier::from_raw_public_key(&point)?.verify("hello", &assertion)?;
    Ok(())
}

#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
#[test]
fn it_has_no_browser_authenticator_natively() {
    assert!(matches!(
        BrowserAuthenticator::new(),
        Err(PasskeyError::Unsupported(_))
    ));
}

#[cfg(all(
    feature = "web-integration-tests",
    target_arch = "wasm32",
    target_os = "unknown"
))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

    wasm_bindgen_test_configure!(run_in_browser);

    /// Creating and using a real passkey needs a user gesture, so only the
    /// availability of the API is checked here.
    #[wasm_bindgen_test]
    fn it_finds_navigator_credentials() {
        BrowserAuthenticator::new().unwrap();
    }

    #[wasm_bindgen_test]
    async fn it_verifies_software_assertions_in_the_browser() {
        let authenticator = SoftwareAuthenticator::new(ORIGIN);
        let config = CeremonyConfig::new(RP_ID);
        let credential = register_passkey(
            &authenticator,
            &config,
            PasskeyUser::new(b"user-5".to_vec(), "erin"),
        )
        .await
        .unwrap();
        let assertion =
            authenticate_with_passkey(&authenticator, &config, credential.credential_id(), "{}")
                .await
                .unwrap();
        AssertionVerifier::from_spki(credential.public_key_spki())
            .unwrap()
            .verify("{}", &assertion)
            .unwrap();
    }
}
