//! Error types for the docseal library.

use thiserror::Error;

/// The main error type for docseal operations.
#[derive(Error, Debug)]
pub enum SignError {
    /// Error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error with JSON serialization/deserialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error decoding a hex string.
    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Error from the PDF container library.
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// The encrypted key blob failed its authentication check.
    ///
    /// Raised for a wrong PIN, a corrupted or truncated blob, or any
    /// tampering. No plaintext is ever returned alongside it.
    #[error("Authentication failed: wrong PIN or corrupted key blob")]
    Authentication,

    /// Key bytes do not parse as the expected RSA key encoding.
    #[error("Invalid key: {0}")]
    KeyFormat(String),

    /// Key generation failed or was asked for an unsupported size.
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// The document carries no embedded signature.
    #[error("No signature found in document")]
    MissingSignature,

    /// The canonical form of a document could not be produced.
    #[error("Canonicalization failed: {0}")]
    Canonicalization(String),

    /// Invalid signature, container or identifier format.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The key registry has no usable entry.
    #[error("Key registry error: {0}")]
    Registry(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SignError {
    /// Whether this error means the PIN was wrong or the key blob was damaged.
    pub fn is_authentication(&self) -> bool {
        matches!(self, SignError::Authentication)
    }
}

/// Result type alias for docseal operations.
pub type Result<T> = std::result::Result<T, SignError>;
