//! # docseal
//!
//! Embedded document signatures using SHA-256 and RSA PKCS#1 v1.5, with
//! private keys stored encrypted under a PIN.
//!
//! ## Features
//!
//! - **4096-bit RSA** keypairs with PEM interchange
//! - **scrypt + AES-256-GCM** encryption of private keys at rest
//! - **Canonical hashing** that excludes the signature field, so a signature
//!   can live inside the document it signs
//! - **PDF support** through the `/Info` dictionary
//! - **Key registry** where the most recently added key is active
//!
//! ## Quick Start
//!
//! ### Generate and Protect a Keypair
//!
//! ```rust,no_run
//! use docseal::{KeyCodec, KeyPairGenerator};
//!
//! let keypair = KeyPairGenerator::new().generate().unwrap();
//! let blob = KeyCodec::new().seal_keypair(&keypair, "1234").unwrap();
//! let public_pem = keypair.public_key().to_pem().unwrap();
//! // Store `blob.as_bytes()` on the key medium, publish `public_pem`.
//! ```
//!
//! ### Sign a Document
//!
//! ```rust,no_run
//! use docseal::{Document, KeyCodec, EncryptedKeyBlob, Signer, SIGNATURE_KEY};
//!
//! # let stored: Vec<u8> = Vec::new();
//! let blob = EncryptedKeyBlob::from_bytes(stored);
//! let keypair = KeyCodec::new().unlock_keypair(&blob, "1234").unwrap();
//!
//! let document = Document::new()
//!     .with_page("Page one")
//!     .with_page("Page two")
//!     .with_metadata("/Title", "Contract");
//!
//! let signed = Signer::new(&keypair).sign(&document).unwrap();
//! assert!(signed.get_metadata(SIGNATURE_KEY).is_some());
//! ```
//!
//! ### Verify a Signature
//!
//! ```rust,no_run
//! use docseal::{Document, KeyPairGenerator, Signer, Verifier};
//!
//! let keypair = KeyPairGenerator::new().generate().unwrap();
//! let document = Document::new().with_page("Important document content");
//! let signed = Signer::new(&keypair).sign(&document).unwrap();
//!
//! let public_key = keypair.public_key();
//! assert!(Verifier::new(&public_key).verify(&signed));
//! ```
//!
//! ### Sign a PDF
//!
//! ```rust,no_run
//! use docseal::{sign_pdf, verify_pdf, KeyPairGenerator};
//!
//! let keypair = KeyPairGenerator::new().generate().unwrap();
//! let pdf = std::fs::read("contract.pdf").unwrap();
//! let signed = sign_pdf(&pdf, &keypair).unwrap();
//! assert!(verify_pdf(&signed, &keypair.public_key()));
//! ```

pub mod canonical;
pub mod config;
pub mod document;
pub mod error;
pub mod hash;
pub mod key_codec;
pub mod keys;
pub mod pdf;
pub mod registry;
pub mod signature;
pub mod signer;
pub mod verifier;

// Re-export main types for convenience
pub use canonical::{canonical_bytes, extract_signature, strip_signature, with_signature};
pub use config::Config;
pub use document::{Document, Page, SIGNATURE_KEY};
pub use error::{Result, SignError};
pub use hash::{hash_bytes, DocumentHash};
pub use key_codec::{
    decrypt_private_key, encrypt_private_key, EncryptedKeyBlob, KdfParams, KeyCodec,
};
pub use keys::{KeyPair, KeyPairGenerator, PublicKey};
pub use pdf::{check_pdf, sign_pdf, signed_output_path, verify_pdf, PdfDocument};
pub use registry::{FileKeyRegistry, KeyId, KeyRegistry, MemoryKeyRegistry};
pub use signature::Signature;
pub use signer::{sign_document, Signer};
pub use verifier::{check_document, verify_document, VerificationOutcome, Verifier};
