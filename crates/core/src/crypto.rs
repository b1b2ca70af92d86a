//! Hashing and HMAC-signed, expiring tokens.
//!
//! Signed tokens carry a payload and an expiry in the clear (hex-encoded, so
//! they are URL-safe) followed by an HMAC-SHA256 signature:
//! `hex(payload|exp).hex(signature)`. Used for OAuth `state` values and
//! script download links.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

type HmacSha256 = Hmac<Sha256>;

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Hex-encoded HMAC-SHA256 of `message` under `secret`.
pub fn hmac_hex(secret: &str, message: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Sign `payload` so that it is valid until `expires_at` (Unix seconds).
///
/// `payload` must not contain `|`.
pub fn sign_token(secret: &str, payload: &str, expires_at: i64) -> String {
    let body = format!("{payload}|{expires_at}");
    let signature = hmac_hex(secret, body.as_bytes());
    format!("{}.{signature}", hex::encode(body))
}

/// Verify a token produced by [`sign_token`] and return its payload.
pub fn verify_token(secret: &str, token: &str, now: i64) -> Result<String, CoreError> {
    let invalid = || CoreError::Unauthorized("Ungültiger oder abgelaufener Link".to_string());

    let (body_hex, signature_hex) = token.split_once('.').ok_or_else(invalid)?;
    let body = hex::decode(body_hex).map_err(|_| invalid())?;
    let signature = hex::decode(signature_hex).map_err(|_| invalid())?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(&body);
    mac.verify_slice(&signature).map_err(|_| invalid())?;

    let body = String::from_utf8(body).map_err(|_| invalid())?;
    let (payload, expires_at) = body.rsplit_once('|').ok_or_else(invalid)?;
    let expires_at: i64 = expires_at.parse().map_err(|_| invalid())?;
    if expires_at <= now {
        return Err(invalid());
    }
    Ok(payload.to_string())
}
