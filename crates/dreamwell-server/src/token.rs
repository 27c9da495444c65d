//! Signed bearer tokens.
//!
//! Format: `v1.<user_id>.<expires_unix>.<hex signature>`, where the signature
//! is SHA-256 over `secret . user_id . expires_unix`. Verification recomputes
//! the signature and compares in constant time, then checks expiry.

use chrono::Utc;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const VERSION: &str = "v1";

/// Mints a token for a user, valid for `ttl_days`.
#[must_use]
pub fn mint(secret: &str, user_id: i64, ttl_days: i64) -> String {
    let expires = Utc::now().timestamp() + ttl_days * 24 * 60 * 60;
    let signature = sign(secret, user_id, expires);
    format!("{VERSION}.{user_id}.{expires}.{signature}")
}

/// Verifies a token and returns its user id.
///
/// Returns `None` for malformed, tampered, or expired tokens.
#[must_use]
pub fn verify(secret: &str, token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let version = parts.next()?;
    let user_id = parts.next()?.parse::<i64>().ok()?;
    let expires = parts.next()?.parse::<i64>().ok()?;
    let signature = parts.next()?;
    if version != VERSION || parts.next().is_some() {
        return None;
    }

    let expected = sign(secret, user_id, expires);
    let matches: bool = expected.as_bytes().ct_eq(signature.as_bytes()).into();
    if !matches {
        return None;
    }

    (expires > Utc::now().timestamp()).then_some(user_id)
}

fn sign(secret: &str, user_id: i64, expires: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b".");
    hasher.update(user_id.to_string().as_bytes());
    hasher.update(b".");
    hasher.update(expires.to_string().as_bytes());
    hex(&hasher.finalize())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
