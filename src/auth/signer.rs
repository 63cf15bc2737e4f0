//! HMAC-SHA256 request signing for the aggregator API.
//!
//! The prehash is `timestamp + METHOD + request_path` where the path includes
//! the query string. The digest is keyed by the shared secret and sent
//! Base64-encoded alongside the access key, timestamp and passphrase.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use sha2::Sha256;
use thiserror::Error;

use crate::config::ApiCredentials;

type HmacSha256 = Hmac<Sha256>;

pub const ACCESS_KEY_HEADER: &str = "OK-ACCESS-KEY";
pub const ACCESS_SIGN_HEADER: &str = "OK-ACCESS-SIGN";
pub const ACCESS_TIMESTAMP_HEADER: &str = "OK-ACCESS-TIMESTAMP";
pub const ACCESS_PASSPHRASE_HEADER: &str = "OK-ACCESS-PASSPHRASE";

/// Errors raised while building authentication headers.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A credential contains bytes that cannot appear in an HTTP header.
    #[error("{0} contains characters not allowed in an HTTP header")]
    InvalidHeaderValue(&'static str),
}

/// Signs outbound aggregator requests.
#[derive(Clone)]
pub struct RequestSigner {
    secret_key: Vec<u8>,
    api_key: HeaderValue,
    passphrase: HeaderValue,
}

impl RequestSigner {
    /// Build a signer, checking up front that credentials are header-safe.
    pub fn new(credentials: &ApiCredentials) -> Result<Self, AuthError> {
        let mut api_key = HeaderValue::from_str(&credentials.api_key)
            .map_err(|_| AuthError::InvalidHeaderValue("api key"))?;
        api_key.set_sensitive(true);
        let mut passphrase = HeaderValue::from_str(&credentials.passphrase)
            .map_err(|_| AuthError::InvalidHeaderValue("passphrase"))?;
        passphrase.set_sensitive(true);

        Ok(Self {
            secret_key: credentials.secret_key.as_bytes().to_vec(),
            api_key,
            passphrase,
        })
    }

    /// Current UTC time in the millisecond ISO-8601 form the API expects.
    pub fn timestamp() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Base64(HMAC-SHA256(secret, timestamp + method + path)).
    pub fn sign(&self, timestamp: &str, method: &Method, request_path: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret_key)
            .expect("HMAC accepts keys of any length");
        mac.update(timestamp.as_bytes());
        mac.update(method.as_str().as_bytes());
        mac.update(request_path.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }

    /// Full authentication header set for one request.
    pub fn headers(
        &self,
        timestamp: &str,
        method: &Method,
        request_path: &str,
    ) -> Result<HeaderMap, AuthError> {
        let signature = self.sign(timestamp, method, request_path);

        let mut sign_value = HeaderValue::from_str(&signature)
            .map_err(|_| AuthError::InvalidHeaderValue("signature"))?;
        sign_value.set_sensitive(true);
        let timestamp_value = HeaderValue::from_str(timestamp)
            .map_err(|_| AuthError::InvalidHeaderValue("timestamp"))?;

        let mut headers = HeaderMap::with_capacity(5);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static("ok-access-key"), self.api_key.clone());
        headers.insert(HeaderName::from_static("ok-access-sign"), sign_value);
        headers.insert(HeaderName::from_static("ok-access-timestamp"), timestamp_value);
        headers.insert(HeaderName::from_static("ok-access-passphrase"), self.passphrase.clone());
        Ok(headers)
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner").finish_non_exhaustive()
    }
}
