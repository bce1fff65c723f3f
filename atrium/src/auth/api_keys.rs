//! Workspace API key generation and hashing.
//!
//! Keys have the form `ak_<48 hex chars>`. The full key is shown to the
//! creator exactly once; only a SHA-256 digest and a display prefix are
//! stored.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length of the stored display prefix (`ak_` plus four characters)
const PREFIX_LEN: usize = 7;

/// Generate a new API key. Returns `(full_key, prefix, key_hash)`.
pub fn generate_key() -> (String, String, String) {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);

    let mut full_key = String::with_capacity(3 + bytes.len() * 2);
    full_key.push_str("ak_");
    for b in bytes {
        full_key.push_str(&format!("{b:02x}"));
    }

    let prefix = full_key[..PREFIX_LEN].to_string();
    let key_hash = hash_key(&full_key);
    (full_key, prefix, key_hash)
}

/// SHA-256 hex digest of a full key, as stored in the database
pub fn hash_key(full_key: &str) -> String {
    let digest = Sha256::digest(full_key.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
