//! [`Authenticator`] over the browser's Web Authentication API.
//!
//! Only `wasm32-unknown-unknown` has a `navigator.credentials`. On every
//! other target [`BrowserAuthenticator::new`] fails with
//! [`PasskeyError::Unsupported`].

use super::{Authenticator, CreationOptions, RegistrationResponse, RequestOptions};
use crate::{assertion::WebAuthnAssertion, error::PasskeyError};

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
use js_sys::{Array, Object, Reflect, Uint8Array};
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
use wasm_bindgen::prelude::*;
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
use wasm_bindgen_futures::JsFuture;

/// The platform authenticator, reached through `navigator.credentials`.
#[derive(Debug, Clone, Copy)]
pub struct BrowserAuthenticator {
    _private: (),
}

#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
impl BrowserAuthenticator {
    /// Always fails: there is no browser here.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Unsupported`].
    pub fn new() -> Result<Self, PasskeyError> {
        Err(unsupported())
    }
}

#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
fn unsupported() -> PasskeyError {
    PasskeyError::Unsupported("WebAuthn requires a browser (wasm32-unknown-unknown)".into())
}

#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
impl Authenticator for BrowserAuthenticator {
    async fn create(
        &self,
        _options: &CreationOptions,
    ) -> Result<RegistrationResponse, PasskeyError> {
        Err(unsupported())
    }

    async fn get(&self, _options: &RequestOptions) -> Result<WebAuthnAssertion, PasskeyError> {
        Err(unsupported())
    }
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
impl BrowserAuthenticator {
    /// Connect to `navigator.credentials`.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Unsupported`] if the page has no
    /// `navigator.credentials` or no `PublicKeyCredential`.
    pub fn new() -> Result<Self, PasskeyError> {
        credentials_container()?;
        let public_key_credential = js_get(&js_sys::global(), "PublicKeyCredential")?;
        if public_key_credential.is_undefined() {
            return Err(PasskeyError::Unsupported(
                "PublicKeyCredential is undefined".into(),
            ));
        }
        Ok(Self { _private: () })
    }
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
impl Authenticator for BrowserAuthenticator {
    async fn create(&self, opts: &CreationOptions) -> Result<RegistrationResponse, PasskeyError> {
        let public_key_opts = Object::new();

        js_set(
            &public_key_opts,
            "challenge",
            &Uint8Array::from(opts.challenge.as_slice()),
        )?;

        let rp = Object::new();
        js_set(&rp, "id", &JsValue::from_str(&opts.rp_id))?;
        js_set(&rp, "name", &JsValue::from_str(&opts.rp_name))?;
        js_set(&public_key_opts, "rp", &rp)?;

        let user = Object::new();
        js_set(&user, "id", &Uint8Array::from(opts.user.id.as_slice()))?;
        js_set(&user, "name", &JsValue::from_str(&opts.user.name))?;
        js_set(
            &user,
            "displayName",
            &JsValue::from_str(&opts.user.display_name),
        )?;
        js_set(&public_key_opts, "user", &user)?;

        let params = Array::new();
        for alg in &opts.algorithms {
            let param = Object::new();
            js_set(&param, "type", &JsValue::from_str("public-key"))?;
            js_set(&param, "alg", &JsValue::from_f64(*alg as f64))?;
            params.push(&param);
        }
        js_set(&public_key_opts, "pubKeyCredParams", &params)?;

        let selection = Object::new();
        if opts.platform_attachment {
            js_set(
                &selection,
                "authenticatorAttachment",
                &JsValue::from_str("platform"),
            )?;
        }
        let resident_key = if opts.resident_key_required {
            "required"
        } else {
            "preferred"
        };
        js_set(&selection, "residentKey", &JsValue::from_str(resident_key))?;
        js_set(
            &selection,
            "userVerification",
            &JsValue::from_str(opts.user_verification.as_str()),
        )?;
        js_set(&public_key_opts, "authenticatorSelection", &selection)?;

        js_set(
            &public_key_opts,
            "timeout",
            &JsValue::from_f64(f64::from(opts.timeout_ms)),
        )?;

        let options = Object::new();
        js_set(&options, "publicKey", &public_key_opts)?;

        let credential = call_credentials("create", &options).await?;
        if credential.is_null() {
            return Err(PasskeyError::CeremonyFailed(
                "navigator.credentials.create returned null".into(),
            ));
        }

        let credential_id = array_buffer_to_vec(&js_get(&credential, "rawId")?);
        let response = js_get(&credential, "response")?;

        let algorithm = call_method(&response, "getPublicKeyAlgorithm")?
            .as_f64()
            .map(|alg| alg as i64)
            .ok_or_else(|| {
                PasskeyError::CeremonyFailed("getPublicKeyAlgorithm returned no number".into())
            })?;

        let spki = call_method(&response, "getPublicKey")?;
        if spki.is_null() || spki.is_undefined() {
            return Err(PasskeyError::CeremonyFailed(
                "authenticator did not return a public key".into(),
            ));
        }

        Ok(RegistrationResponse {
            credential_id,
            public_key_spki: array_buffer_to_vec(&spki),
            algorithm,
        })
    }

    async fn get(&self, opts: &RequestOptions) -> Result<WebAuthnAssertion, PasskeyError> {
        let public_key_opts = Object::new();

        js_set(
            &public_key_opts,
            "challenge",
            &Uint8Array::from(opts.challenge.as_slice()),
        )?;
        js_set(&public_key_opts, "rpId", &JsValue::from_str(&opts.rp_id))?;
        js_set(
            &public_key_opts,
            "userVerification",
            &JsValue::from_str(opts.user_verification.as_str()),
        )?;
        js_set(
            &public_key_opts,
            "timeout",
            &JsValue::from_f64(f64::from(opts.timeout_ms)),
        )?;

        let allow = Array::new();
        for id in &opts.allow_credentials {
            let descriptor = Object::new();
            js_set(&descriptor, "type", &JsValue::from_str("public-key"))?;
            js_set(&descriptor, "id", &Uint8Array::from(id.as_slice()))?;
            allow.push(&descriptor);
        }
        js_set(&public_key_opts, "allowCredentials", &allow)?;

        let options = Object::new();
        js_set(&options, "publicKey", &public_key_opts)?;

        let credential = call_credentials("get", &options).await?;
        if credential.is_null() {
            return Err(PasskeyError::NotFound);
        }

        let credential_id = array_buffer_to_vec(&js_get(&credential, "rawId")?);
        let response = js_get(&credential, "response")?;

        Ok(WebAuthnAssertion::new(
            credential_id,
            response_field(&response, "clientDataJSON")?,
            response_field(&response, "authenticatorData")?,
            response_field(&response, "signature")?,
        ))
    }
}

/// `navigator.credentials`.
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
fn credentials_container() -> Result<JsValue, PasskeyError> {
    let navigator = js_get(&js_sys::global(), "navigator")?;
    if navigator.is_undefined() {
        return Err(PasskeyError::Unsupported("navigator is undefined".into()));
    }
    let credentials = js_get(&navigator, "credentials")?;
    if credentials.is_undefined() {
        return Err(PasskeyError::Unsupported(
            "navigator.credentials is undefined".into(),
        ));
    }
    Ok(credentials)
}

/// Call `navigator.credentials[method](options)` and await the promise.
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
async fn call_credentials(method: &str, options: &Object) -> Result<JsValue, PasskeyError> {
    let credentials = credentials_container()?;
    let function: js_sys::Function = js_get(&credentials, method)?
        .dyn_into()
        .map_err(|_| PasskeyError::Unsupported(format!("navigator.credentials.{method}")))?;
    let promise: js_sys::Promise = function
        .call1(&credentials, options)
        .map_err(dom_exception)?
        .unchecked_into();
    JsFuture::from(promise).await.map_err(dom_exception)
}

/// Map a rejected ceremony onto the error taxonomy by `DOMException.name`.
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
fn dom_exception(error: JsValue) -> PasskeyError {
    let name = Reflect::get(&error, &JsValue::from_str("name"))
        .ok()
        .and_then(|name| name.as_string())
        .unwrap_or_default();
    let message = Reflect::get(&error, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| format!("{error:?}"));
    tracing::debug!(%name, %message, "WebAuthn ceremony rejected");
    match name.as_str() {
        "NotFoundError" | "InvalidStateError" => PasskeyError::NotFound,
        "NotSupportedError" | "SecurityError" => PasskeyError::Unsupported(message),
        _ => PasskeyError::CeremonyFailed(format!("{name}: {message}")),
    }
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
fn call_method(obj: &JsValue, method: &str) -> Result<JsValue, PasskeyError> {
    let function: js_sys::Function = js_get(obj, method)?
        .dyn_into()
        .map_err(|_| PasskeyError::Unsupported(format!("{method} not supported")))?;
    function.call0(obj).map_err(dom_exception)
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
fn js_get(obj: &JsValue, key: &str) -> Result<JsValue, PasskeyError> {
    Reflect::get(obj, &JsValue::from_str(key))
        .map_err(|e| PasskeyError::Unsupported(format!("failed to get '{key}': {e:?}")))
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
fn js_set(obj: &Object, key: &str, value: &JsValue) -> Result<(), PasskeyError> {
    Reflect::set(obj, &JsValue::from_str(key), value)
        .map_err(|e| PasskeyError::CeremonyFailed(format!("failed to set '{key}': {e:?}")))?;
    Ok(())
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
fn response_field(response: &JsValue, key: &str) -> Result<Vec<u8>, PasskeyError> {
    let buffer = js_get(response, key)?;
    if buffer.is_undefined() || buffer.is_null() {
        return Err(PasskeyError::CeremonyFailed(format!(
            "assertion response has no '{key}'"
        )));
    }
    Ok(array_buffer_to_vec(&buffer))
}

/// Copy an `ArrayBuffer` (or typed-array view) into a `Vec<u8>`.
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
fn array_buffer_to_vec(value: &JsValue) -> Vec<u8> {
    let array = Uint8Array::new(value);
    let mut bytes = vec![0u8; array.length() as usize];
    array.copy_to(&mut bytes);
    bytes
}

#[cfg(all(test, not(all(target_arch = "wasm32", target_os = "unknown"))))]
mod tests {
    use super::*;

    #[test]
    fn it_is_unsupported_outside_a_browser() {
        assert!(matches!(
            BrowserAuthenticator::new(),
            Err(PasskeyError::Unsupported(_))
        ));
    }
}
