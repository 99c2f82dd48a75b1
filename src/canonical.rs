//! Signature-excluded canonical form of a document.
//!
//! Signing and verification both hash the bytes produced here. The reserved
//! [`SIGNATURE_KEY`] entry is always dropped first, so a document hashes the
//! same whether its signature field is absent, current or stale.

use crate::document::{Document, SIGNATURE_KEY};
use crate::error::{Result, SignError};
use crate::signature::Signature;

/// Copy of `doc` without the signature field.
pub fn strip_signature(doc: &Document) -> Document {
    let mut fresh = Document::new();
    for page in doc.pages() {
        fresh.add_page(page.content());
    }
    for (key, value) in doc.metadata() {
        if key != SIGNATURE_KEY {
            fresh.set_metadata(key.as_str(), value.as_str());
        }
    }
    fresh
}

/// Deterministic bytes of `doc` with the signature field removed.
pub fn canonical_bytes(doc: &Document) -> Result<Vec<u8>> {
    let bytes = strip_signature(doc)
        .to_bytes()
        .map_err(|e| SignError::Canonicalization(e.to_string()))?;
    tracing::debug!(
        pages = doc.page_count(),
        len = bytes.len(),
        "computed canonical bytes"
    );
    Ok(bytes)
}

/// Copy of `doc` carrying `signature` as lowercase hex under [`SIGNATURE_KEY`].
pub fn with_signature(doc: &Document, signature: &Signature) -> Document {
    let mut signed = doc.clone();
    signed.set_metadata(SIGNATURE_KEY, signature.to_hex());
    signed
}

/// Read the embedded signature.
pub fn extract_signature(doc: &Document) -> Result<Signature> {
    let value = doc
        .get_metadata(SIGNATURE_KEY)
        .ok_or(SignError::MissingSignature)?;
    Signature::from_hex(value)
}
