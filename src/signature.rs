//! Raw signature bytes and their persisted hex form.

use crate::error::{Result, SignError};
use std::fmt;

/// An RSASSA-PKCS1-v1_5 signature over a document digest.
///
/// Persisted inside documents as a lowercase hex string.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Decode a signature from its hex form (either case is accepted).
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())?;
        if bytes.is_empty() {
            return Err(SignError::InvalidFormat("empty signature".to_string()));
        }
        Ok(Self(bytes))
    }

    /// Encode the signature as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Get the raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the signature in bytes (the RSA modulus size).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the signature has no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signature").field(&self.to_hex()).finish()
    }
}
