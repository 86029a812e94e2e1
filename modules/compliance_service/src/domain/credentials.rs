//! Password and OTP hashing

use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

fn sha256_hex(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

/// `salt$hash` with a random 16-byte salt
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::rng().random();
    let salt = hex::encode(salt);
    let hash = sha256_hex(&[salt.as_bytes(), password.as_bytes()]);
    format!("{}${}", salt, hash)
}

/// Numeric code of `length` digits
pub fn generate_otp(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// SHA-256 over user id and trimmed code
pub fn hash_otp(user_id: Uuid, code: &str) -> String {
    sha256_hex(&[
        user_id.as_bytes().as_slice(),
        b":".as_slice(),
        code.trim().as_bytes(),
    ])
}
