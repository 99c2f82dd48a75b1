//! Integration tests for the docseal library.

use docseal::{
    canonical_bytes, decrypt_private_key, encrypt_private_key, sign_document, verify_document,
    with_signature, Document, EncryptedKeyBlob, FileKeyRegistry, KeyCodec, KeyPair,
    KeyPairGenerator, KeyRegistry, MemoryKeyRegistry, KeyId, PublicKey, SignError, Signature,
    Signer, VerificationOutcome, Verifier, SIGNATURE_KEY,
};
use std::sync::OnceLock;

fn keypair() -> &'static KeyPair {
    static KEYPAIR: OnceLock<KeyPair> = OnceLock::new();
    KEYPAIR.get_or_init(|| KeyPairGenerator::with_bits(2048).unwrap().generate().unwrap())
}

fn other_keypair() -> &'static KeyPair {
    static KEYPAIR: OnceLock<KeyPair> = OnceLock::new();
    KEYPAIR.get_or_init(|| KeyPairGenerator::with_bits(2048).unwrap().generate().unwrap())
}

fn two_page_document() -> Document {
    Document::new()
        .with_page("This agreement is made between the parties.")
        .with_page("Signed in good faith.")
        .with_metadata("/Title", "Agreement")
        .with_metadata("/Author", "Legal")
}

#[test]
fn test_full_signing_workflow() {
    // Generate a 4096-bit keypair and protect it with a PIN
    let keypair = KeyPairGenerator::new().generate().unwrap();
    let private_pem = keypair.to_pem().unwrap();
    let public_pem = keypair.public_key().to_pem().unwrap();

    let blob = encrypt_private_key(private_pem.as_bytes(), "1234").unwrap();
    let decrypted = decrypt_private_key(&blob, "1234").unwrap();
    assert_eq!(decrypted.as_slice(), private_pem.as_bytes());

    // Sign a two-page document with the recovered key
    let signed = sign_document(&two_page_document(), &decrypted).unwrap();
    let hex = signed.get_metadata(SIGNATURE_KEY).unwrap();
    assert_eq!(hex.len(), 1024);
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));

    // Verify with the matching public key
    assert!(verify_document(&signed, public_pem.as_bytes()));

    // Change one page's text
    let mut tampered = signed.clone();
    tampered.pages_mut()[0].set_content("This agreement is void.");
    assert!(!verify_document(&tampered, public_pem.as_bytes()));
}

#[test]
fn test_persisted_document_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agreement.json");

    let signed = Signer::new(keypair()).sign(&two_page_document()).unwrap();
    signed.save(&path).unwrap();

    let loaded = Document::load(&path).unwrap();
    let public_key = keypair().public_key();
    assert!(Verifier::new(&public_key).verify(&loaded));
}

#[test]
fn test_canonical_bytes_ignore_signature() {
    let doc = two_page_document();
    let stamped = with_signature(&doc, &Signature::from_bytes(vec![0x5a; 256]));

    assert_eq!(canonical_bytes(&doc).unwrap(), canonical_bytes(&doc).unwrap());
    assert_eq!(canonical_bytes(&stamped).unwrap(), canonical_bytes(&doc).unwrap());
}

#[test]
fn test_tamper_detection() {
    let public_key = keypair().public_key();
    let verifier = Verifier::new(&public_key);
    let signed = Signer::new(keypair()).sign(&two_page_document()).unwrap();
    assert!(verifier.verify(&signed));

    let retitled = signed.clone().with_metadata("/Title", "Other");
    assert!(!verifier.verify(&retitled));

    let extended = signed.clone().with_page("Extra clause");
    assert!(!verifier.verify(&extended));

    let mut reordered = Document::new();
    for page in signed.pages().iter().rev() {
        reordered.add_page(page.content());
    }
    for (key, value) in signed.metadata() {
        reordered.set_metadata(key.as_str(), value.as_str());
    }
    assert!(!verifier.verify(&reordered));
}

#[test]
fn test_wrong_key_rejected() {
    let signed = Signer::new(keypair()).sign(&two_page_document()).unwrap();
    let public_key = other_keypair().public_key();

    assert!(matches!(
        Verifier::new(&public_key).check(&signed),
        VerificationOutcome::Invalid { .. }
    ));
}

#[test]
fn test_unsigned_document() {
    let public_key = keypair().public_key();
    assert_eq!(
        Verifier::new(&public_key).check(&two_page_document()),
        VerificationOutcome::MissingSignature
    );
}

#[test]
fn test_verify_never_errors_on_bad_input() {
    let signed = Signer::new(keypair()).sign(&two_page_document()).unwrap();

    assert!(!verify_document(&signed, b""));
    assert!(!verify_document(&signed, b"-----BEGIN PUBLIC KEY-----\n-----END PUBLIC KEY-----\n"));
    let garbled = signed.clone().with_metadata(SIGNATURE_KEY, "xyz");
    let pem = keypair().public_key().to_pem().unwrap();
    assert!(!verify_document(&garbled, pem.as_bytes()));
}

#[test]
fn test_public_key_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("public.pem");

    keypair().public_key().save_to_file(&path).unwrap();
    let loaded = PublicKey::load_from_file(&path).unwrap();
    assert_eq!(loaded, keypair().public_key());
}

#[test]
fn test_key_directory_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let codec = KeyCodec::new();
    let mut registry = FileKeyRegistry::new(dir.path());

    // An older key, then the one that should be used
    registry
        .store_blob(&codec.seal_keypair(other_keypair(), "0000").unwrap())
        .unwrap();
    let active = registry
        .store_blob(&codec.seal_keypair(keypair(), "1234").unwrap())
        .unwrap();

    let (id, blob) = registry.load_latest_blob().unwrap();
    assert_eq!(id, active);

    let unlocked = codec.unlock_keypair(&blob, "1234").unwrap();
    assert_eq!(unlocked.public_key(), keypair().public_key());

    let err = codec.unlock_keypair(&blob, "0000").unwrap_err();
    assert!(matches!(err, SignError::Authentication));
}

#[test]
fn test_corrupted_key_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = FileKeyRegistry::new(dir.path());
    let id = registry
        .store_blob(&KeyCodec::new().seal_keypair(keypair(), "1234").unwrap())
        .unwrap();

    let path = dir.path().join(id.as_str());
    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    std::fs::write(&path, bytes).unwrap();

    let (_, blob) = registry.load_latest_blob().unwrap();
    assert!(KeyCodec::new()
        .unlock_keypair(&blob, "1234")
        .unwrap_err()
        .is_authentication());
}

#[test]
fn test_memory_registry_contract() {
    let mut registry = MemoryKeyRegistry::new();
    assert!(registry.latest().unwrap().is_none());

    for name in ["a.key", "b.key", "c.key"] {
        registry.append(&KeyId::new(name).unwrap()).unwrap();
    }
    assert_eq!(registry.latest().unwrap().unwrap().as_str(), "c.key");
}

#[test]
fn test_blob_layout() {
    let blob = KeyCodec::new().encrypt(b"0123456789", "pin").unwrap();
    let bytes = blob.clone().into_bytes();

    assert_eq!(bytes.len(), 16 + 12 + 10 + 16);
    let (salt, nonce, ciphertext) = blob.parts().unwrap();
    assert_eq!(salt, &bytes[..16]);
    assert_eq!(nonce, &bytes[16..28]);
    assert_eq!(ciphertext, &bytes[28..]);

    let reread = EncryptedKeyBlob::from_bytes(bytes);
    assert_eq!(
        KeyCodec::new().decrypt(&reread, "pin").unwrap().as_slice(),
        b"0123456789"
    );
}
