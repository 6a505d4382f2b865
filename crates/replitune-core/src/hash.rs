//! Stable content hashing for workload and roster fingerprints.

use blake3::Hasher;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A 256-bit blake3 digest; `Display` renders the 64-char hex form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

pub fn hash_str(s: &str) -> Hash256 {
    Hash256(blake3::hash(s.as_bytes()).into())
}

/// Hash any serde-serializable value deterministically by streaming its
/// JSON encoding straight into the hasher.
pub fn hash_serde<T: Serialize>(v: &T) -> Result<Hash256> {
    let mut hasher = Hasher::new();
    serde_json::to_writer(&mut hasher, v)?;
    Ok(Hash256(hasher.finalize().into()))
}
