//! Signature verification functionality.
//!
//! Verification is total: every failure, including a missing signature or an
//! unparsable key, ends up as a non-valid outcome rather than an error.

use crate::canonical::{canonical_bytes, extract_signature, strip_signature};
use crate::document::Document;
use crate::error::{Result, SignError};
use crate::hash::hash_bytes;
use crate::keys::PublicKey;
use serde::Serialize;
use std::fmt;

/// Result of checking a document's embedded signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// The signature matches the document and the public key.
    Valid,
    /// The document carries no signature.
    MissingSignature,
    /// The signature is malformed, was made by another key, or the content
    /// changed after signing.
    Invalid { reason: String },
}

impl VerificationOutcome {
    /// Whether the signature was accepted.
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationOutcome::Valid)
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationOutcome::Valid => write!(f, "signature is valid"),
            VerificationOutcome::MissingSignature => write!(f, "no signature found"),
            VerificationOutcome::Invalid { reason } => write!(f, "invalid signature: {}", reason),
        }
    }
}

/// Verifies embedded signatures against one public key.
#[derive(Debug)]
pub struct Verifier<'a> {
    public_key: &'a PublicKey,
}

impl<'a> Verifier<'a> {
    /// Create a verifier for `public_key`.
    pub fn new(public_key: &'a PublicKey) -> Self {
        Self { public_key }
    }

    /// Check `doc` and report why it failed, if it did.
    pub fn check(&self, doc: &Document) -> VerificationOutcome {
        let outcome = match self.try_verify(doc) {
            Ok(()) => VerificationOutcome::Valid,
            Err(SignError::MissingSignature) => VerificationOutcome::MissingSignature,
            Err(e) => VerificationOutcome::Invalid {
                reason: e.to_string(),
            },
        };
        if outcome.is_valid() {
            tracing::debug!("signature verified");
        } else {
            tracing::warn!(%outcome, "signature verification failed");
        }
        outcome
    }

    /// Whether `doc` carries a valid signature by this key.
    pub fn verify(&self, doc: &Document) -> bool {
        self.check(doc).is_valid()
    }

    fn try_verify(&self, doc: &Document) -> Result<()> {
        let signature = extract_signature(doc)?;
        let unsigned = strip_signature(doc);
        let digest = hash_bytes(&canonical_bytes(&unsigned)?);
        tracing::debug!(digest = %digest.to_hex(), "verifying document digest");
        self.public_key.verify(digest.as_bytes(), &signature)
    }
}

/// Check `doc` against a SubjectPublicKeyInfo PEM public key.
pub fn check_document(doc: &Document, public_key_pem: &[u8]) -> VerificationOutcome {
    match PublicKey::from_pem(public_key_pem) {
        Ok(public_key) => Verifier::new(&public_key).check(doc),
        Err(e) => {
            tracing::warn!(error = %e, "unusable public key");
            VerificationOutcome::Invalid {
                reason: e.to_string(),
            }
        }
    }
}

/// Whether `doc` carries a valid signature for the PEM public key.
pub fn verify_document(doc: &Document, public_key_pem: &[u8]) -> bool {
    check_document(doc, public_key_pem).is_valid()
}
