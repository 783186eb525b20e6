use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::IntegrityHasher;

/// 32-byte commitment, rendered as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntegrityHash(pub [u8; 32]);

impl IntegrityHash {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for IntegrityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// SHA-256 over length-prefixed fields, so `("ab", "c")` and `("a", "bc")`
/// commit to different values.
#[derive(Debug, Clone)]
pub struct Sha256Hasher {
    domain: &'static str,
}

impl Sha256Hasher {
    pub fn new() -> Self {
        Self {
            domain: "validator-merit/v1",
        }
    }

    pub fn with_domain(domain: &'static str) -> Self {
        Self { domain }
    }
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegrityHasher for Sha256Hasher {
    fn commit(&self, fields: &[&[u8]]) -> IntegrityHash {
        let mut hasher = Sha256::new();
        hasher.update(self.domain.as_bytes());
        for field in fields {
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field);
        }
        IntegrityHash(hasher.finalize().into())
    }
}
