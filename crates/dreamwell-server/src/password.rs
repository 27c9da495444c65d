//! Salted password hashing.
//!
//! Stored form: `<hex salt>$<hex sha-256(salt ‖ password)>`. Verification is
//! a constant-time comparison against the recomputed digest.

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const SALT_BYTES: usize = 16;

/// Hashes a password with a fresh random salt.
#[must_use]
pub fn hash(password: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    rand::rng().fill_bytes(&mut salt);
    let digest = digest_with_salt(&salt, password);
    format!("{}${digest}", hex(&salt))
}

/// Verifies a password against a stored `salt$digest` hash.
#[must_use]
pub fn verify(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Some(salt) = unhex(salt_hex) else {
        return false;
    };
    let expected = digest_with_salt(&salt, password);
    expected.as_bytes().ct_eq(digest_hex.as_bytes()).into()
}

fn digest_with_salt(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex(&hasher.finalize())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn unhex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok())
        .collect()
}
