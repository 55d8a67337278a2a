//! Root key generation and secret hashing

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

const HASH_SCHEME: &str = "sha256$";
const DISPLAY_PREFIX_CHARS: usize = 8;
const SECRET_BYTES: usize = 32;

/// Hash a secret for storage and lookup.
///
/// Deterministic: the same secret always produces the same digest, so the
/// digest doubles as the lookup key for credential resolution.
pub fn hash_secret(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    format!("{}{}", HASH_SCHEME, URL_SAFE_NO_PAD.encode(digest))
}

/// Constant-time byte comparison
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Display prefix of a secret, safe to log
pub fn secret_prefix(secret: &str) -> String {
    secret.chars().take(DISPLAY_PREFIX_CHARS).collect()
}

/// Result of generating a new root key
#[derive(Debug, Clone)]
pub struct GeneratedRootKey {
    /// The full secret (only shown once at creation)
    pub key: String,
    /// The key prefix for identification
    pub prefix: String,
    /// The hashed key for storage
    pub hash: String,
}

/// Generator for root key secrets
#[derive(Debug, Clone)]
pub struct RootKeyGenerator {
    /// Prefix for all generated keys
    prefix: String,
}

impl RootKeyGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Generate a new random root key
    pub fn generate(&self) -> GeneratedRootKey {
        let mut random_bytes = [0u8; SECRET_BYTES];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        self.from_secret(&URL_SAFE_NO_PAD.encode(&random_bytes))
    }

    /// Build a key from a known secret, for deterministic fixtures
    pub fn from_secret(&self, secret: &str) -> GeneratedRootKey {
        let key = format!("{}{}", self.prefix, secret);

        GeneratedRootKey {
            prefix: secret_prefix(&key),
            hash: hash_secret(&key),
            key,
        }
    }
}

impl Default for RootKeyGenerator {
    fn default() -> Self {
        Self::new("rk_")
    }
}
