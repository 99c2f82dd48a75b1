//! Document signing functionality.

use crate::canonical::{canonical_bytes, with_signature};
use crate::document::Document;
use crate::error::Result;
use crate::hash::{hash_bytes, DocumentHash};
use crate::keys::KeyPair;
use crate::signature::Signature;

/// Signs documents with a private key.
#[derive(Debug)]
pub struct Signer<'a> {
    keypair: &'a KeyPair,
}

impl<'a> Signer<'a> {
    /// Create a new signer with the given keypair.
    pub fn new(keypair: &'a KeyPair) -> Self {
        Self { keypair }
    }

    /// Sign a canonical-bytes digest.
    ///
    /// The digest itself is the message handed to PKCS#1 v1.5 / SHA-256.
    pub fn sign_digest(&self, digest: &DocumentHash) -> Result<Signature> {
        self.keypair.sign(digest.as_bytes())
    }

    /// Compute the signature for `doc` without embedding it.
    pub fn signature_for(&self, doc: &Document) -> Result<Signature> {
        let digest = hash_bytes(&canonical_bytes(doc)?);
        tracing::debug!(digest = %digest.to_hex(), "signing document digest");
        self.sign_digest(&digest)
    }

    /// Return a copy of `doc` with its signature embedded.
    ///
    /// Any signature already present is replaced; it never affects the
    /// signed bytes.
    pub fn sign(&self, doc: &Document) -> Result<Document> {
        let signature = self.signature_for(doc)?;
        tracing::info!(
            pages = doc.page_count(),
            signature_len = signature.len(),
            "signed document"
        );
        Ok(with_signature(doc, &signature))
    }
}

/// Sign `doc` with a PKCS#8 PEM private key.
///
/// Unparsable key bytes fail with [`SignError::KeyFormat`](crate::SignError::KeyFormat).
pub fn sign_document(doc: &Document, private_key_pem: &[u8]) -> Result<Document> {
    let keypair = KeyPair::from_pem(private_key_pem)?;
    Signer::new(&keypair).sign(doc)
}
