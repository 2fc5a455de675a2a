//! VERACODE-HMAC-SHA-256 request signing.
//!
//! The scheme chains four HMAC-SHA-256 computations: the hex-decoded secret
//! keyed over a random nonce, then over the millisecond timestamp, then over
//! a fixed request-version tag, and finally over the per-request signing
//! data (`id=..&host=..&url=..&method=..`).

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;
use time::OffsetDateTime;
use url::Url;

const AUTH_SCHEME: &str = "VERACODE-HMAC-SHA-256";
const REQUEST_VERSION: &[u8] = b"vcode_request_version_1";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("API key secret is not valid hex: {0}")]
    InvalidSecret(#[from] hex::FromHexError),
    #[error("request URL has no host")]
    MissingHost,
}

/// Decode the hex payload of an API key secret.
///
/// Secrets issued for non-default regions carry a prefix (`vera01es-<hex>`);
/// the payload after the last `-` is the signing key.
pub fn decode_secret(secret: &str) -> Result<Vec<u8>, AuthError> {
    let payload = secret.rsplit('-').next().unwrap_or(secret);
    Ok(hex::decode(payload)?)
}

/// Build the `Authorization` header value for one request, drawing a fresh
/// nonce and timestamp.
pub fn authorization_header(
    api_id: &str,
    api_secret: &str,
    method: &str,
    url: &Url,
) -> Result<String, AuthError> {
    let mut nonce = [0u8; 16];
    rand::rng().fill_bytes(&mut nonce);
    let ts_millis = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
    sign(api_id, api_secret, method, url, ts_millis, &nonce)
}

/// Deterministic core of the signing scheme. Timestamp and nonce are passed
/// in so the computation can be exercised in tests.
pub fn sign(
    api_id: &str,
    api_secret: &str,
    method: &str,
    url: &Url,
    ts_millis: i64,
    nonce: &[u8; 16],
) -> Result<String, AuthError> {
    let key = decode_secret(api_secret)?;
    let host = url
        .host_str()
        .ok_or(AuthError::MissingHost)?
        .to_ascii_lowercase();
    let mut path = url.path().to_string();
    if let Some(q) = url.query() {
        path.push('?');
        path.push_str(q);
    }
    let data = format!("id={api_id}&host={host}&url={path}&method={method}");
    let ts = ts_millis.to_string();

    let key_nonce = hmac_sha256(&key, nonce);
    let key_date = hmac_sha256(&key_nonce, ts.as_bytes());
    let key_sig = hmac_sha256(&key_date, REQUEST_VERSION);
    let sig = hex::encode(hmac_sha256(&key_sig, data.as_bytes()));

    Ok(format!(
        "{AUTH_SCHEME} id={api_id},ts={ts},nonce={},sig={sig}",
        hex::encode(nonce)
    ))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(key).expect("HMAC-SHA-256 accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
