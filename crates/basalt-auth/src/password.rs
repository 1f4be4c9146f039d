//! Password policy and hashing.
//!
//! The hash is a deterministic, salted, iterated key derivation:
//! PBKDF2-HMAC-SHA1 with a platform-fixed salt and iteration count,
//! hex-encoded. The salt and iteration count are hard coded; changing
//! either invalidates every stored hash, so both must be kept until
//! all passwords hashed this way have been re-hashed another way.
//! There is no unhash operation.

use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;

use basalt_core::error::{BasaltError, BasaltResult};

const SALT: &[u8] = b"wfkzmqhtdaslpgj";
const ITERATIONS: u32 = 1000;
const KEY_LENGTH: usize = 64;

/// Default minimum password length.
pub const DEFAULT_MIN_LENGTH: usize = 6;

/// Hashes a plaintext password. Total and reproducible: the same
/// plaintext always yields the same digest.
pub fn hash(plaintext: &str) -> String {
    let mut key = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha1>(plaintext.as_bytes(), SALT, ITERATIONS, &mut key);
    hex::encode_upper(key)
}

/// Enforces the minimum-length policy before any hashing is
/// attempted.
pub fn check_valid(plaintext: &str, min_length: usize) -> BasaltResult<()> {
    if plaintext.len() < min_length {
        return Err(BasaltError::validation(format!(
            "invalid password: must be at least {min_length} characters long"
        )));
    }
    Ok(())
}

pub fn check_and_hash(plaintext: &str, min_length: usize) -> BasaltResult<String> {
    check_valid(plaintext, min_length)?;
    Ok(hash(plaintext))
}

/// Verifies a plaintext password against a stored digest by
/// re-hashing and comparing in constant time.
pub fn verify(plaintext: &str, stored_digest: &str) -> bool {
    constant_time_eq(hash(plaintext).as_bytes(), stored_digest.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
