//! SHA-256 digests of canonical document bytes.

use sha2::{Digest, Sha256};

/// The size of a SHA-256 digest in bytes.
pub const HASH_SIZE: usize = 32;

/// A SHA-256 digest of a document's canonical bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHash([u8; HASH_SIZE]);

impl DocumentHash {
    /// Create a hash from raw bytes.
    pub fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes of the hash.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Encode the hash as a lowercase hexadecimal string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Compute the SHA-256 hash of a byte slice.
pub fn hash_bytes(data: &[u8]) -> DocumentHash {
    DocumentHash(Sha256::digest(data).into())
}
