//! RSA key generation and PEM interchange.

use crate::error::{Result, SignError};
use crate::signature::Signature;
use rand::rngs::OsRng;
use rsa::pkcs1v15::VerifyingKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::signature::Verifier as RsaVerifier;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use zeroize::Zeroizing;

/// Default RSA modulus size.
pub const DEFAULT_KEY_BITS: usize = 4096;

/// Smallest modulus size [`KeyPairGenerator`] accepts.
pub const MIN_KEY_BITS: usize = 2048;

/// Produces fresh RSA keypairs with public exponent 65537.
#[derive(Debug, Clone, Copy)]
pub struct KeyPairGenerator {
    bits: usize,
}

impl Default for KeyPairGenerator {
    fn default() -> Self {
        Self {
            bits: DEFAULT_KEY_BITS,
        }
    }
}

impl KeyPairGenerator {
    /// A generator for 4096-bit keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator for a custom modulus size (at least [`MIN_KEY_BITS`]).
    pub fn with_bits(bits: usize) -> Result<Self> {
        if bits < MIN_KEY_BITS {
            return Err(SignError::KeyGeneration(format!(
                "modulus of {} bits is below the {} bit minimum",
                bits, MIN_KEY_BITS
            )));
        }
        Ok(Self { bits })
    }

    /// The modulus size of generated keys.
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Generate a keypair from the operating system's secure random source.
    ///
    /// Panics if the OS random source is unavailable.
    pub fn generate(&self) -> Result<KeyPair> {
        self.generate_with_rng(&mut OsRng)
    }

    /// Generate a keypair from an explicit cryptographically secure source.
    pub fn generate_with_rng<R: rand::CryptoRng + rand::RngCore>(
        &self,
        rng: &mut R,
    ) -> Result<KeyPair> {
        let private_key = RsaPrivateKey::new(rng, self.bits)
            .map_err(|e| SignError::KeyGeneration(e.to_string()))?;
        tracing::debug!(bits = self.bits, "generated RSA keypair");
        Ok(KeyPair { private_key })
    }
}

/// An RSA keypair for signing documents.
///
/// The private half zeroizes its limbs when dropped.
#[derive(Clone)]
pub struct KeyPair {
    private_key: RsaPrivateKey,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate a new 4096-bit keypair.
    pub fn generate() -> Result<Self> {
        KeyPairGenerator::new().generate()
    }

    /// Parse a PKCS#8 PEM private key.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(pem)
            .map_err(|_| SignError::KeyFormat("private key is not UTF-8 PEM".to_string()))?;
        let private_key = RsaPrivateKey::from_pkcs8_pem(text)
            .map_err(|e| SignError::KeyFormat(e.to_string()))?;
        Ok(Self { private_key })
    }

    /// Export the private key as PKCS#8 PEM.
    pub fn to_pem(&self) -> Result<Zeroizing<String>> {
        self.private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| SignError::KeyFormat(e.to_string()))
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: self.private_key.to_public_key(),
        }
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public_key().bits()
    }

    /// Sign a message with RSASSA-PKCS1-v1_5 over SHA-256.
    pub fn sign(&self, message: &[u8]) -> Result<Signature> {
        let digest = Sha256::digest(message);
        let signature = self
            .private_key
            .sign_with_rng(&mut OsRng, Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|e| SignError::KeyFormat(e.to_string()))?;
        Ok(Signature::from_bytes(signature))
    }
}

/// An RSA public key for verifying signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: RsaPublicKey,
}

impl PublicKey {
    /// Parse a SubjectPublicKeyInfo PEM public key.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(pem)
            .map_err(|_| SignError::KeyFormat("public key is not UTF-8 PEM".to_string()))?;
        let inner = RsaPublicKey::from_public_key_pem(text)
            .map_err(|e| SignError::KeyFormat(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Encode the public key as SubjectPublicKeyInfo PEM.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| SignError::KeyFormat(e.to_string()))
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        use rsa::traits::PublicKeyParts;
        self.inner.n().bits()
    }

    /// Verify a signature on a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        let verifying_key = VerifyingKey::<Sha256>::new(self.inner.clone());
        let signature = rsa::pkcs1v15::Signature::try_from(signature.as_bytes())
            .map_err(|e| SignError::InvalidFormat(e.to_string()))?;
        verifying_key
            .verify(message, &signature)
            .map_err(|_| SignError::InvalidFormat("signature does not match".to_string()))
    }

    /// Save the public key to a PEM file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_pem()?)?;
        Ok(())
    }

    /// Load a public key from a PEM file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read(path)?;
        Self::from_pem(&content)
    }
}
