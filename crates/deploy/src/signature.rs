//! Webhook signature verification.
//!
//! A sender proves it holds a repository's shared secret by sending
//! `x-hub-signature-256: sha256=<hex>`, the HMAC-SHA256 of the exact request
//! body bytes. The MAC must be computed over the raw body: re-serializing a
//! parsed payload is not guaranteed to reproduce the same bytes.

use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::Secret;

/// Request header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const ALGORITHM_PREFIX: &str = "sha256=";

type HmacSha256 = Hmac<Sha256>;

fn digest(body: &[u8], secret: &Secret) -> Option<Vec<u8>> {
    // HMAC accepts keys of any length; the error arm is unreachable in practice.
    let mut mac = HmacSha256::new_from_slice(secret.expose()).ok()?;
    mac.update(body);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Produces the header value a sender holding `secret` would attach to `body`.
pub fn sign(body: &[u8], secret: &Secret) -> String {
    let hex_digest = digest(body, secret).map(hex::encode).unwrap_or_default();
    format!("{ALGORITHM_PREFIX}{hex_digest}")
}

/// Checks a signature header against the raw request body.
///
/// Returns `false` when the header is absent, lacks the `sha256=` prefix, is
/// not valid hex, or does not match. The digest comparison is constant-time.
pub fn verify(signature_header: Option<&str>, body: &[u8], secret: &Secret) -> bool {
    let Some(provided_hex) = signature_header.and_then(|h| h.trim().strip_prefix(ALGORITHM_PREFIX))
    else {
        return false;
    };
    let Ok(provided) = hex::decode(provided_hex) else {
        return false;
    };
    let Some(expected) = digest(body, secret) else {
        return false;
    };

    constant_time_eq(&expected, &provided)
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
