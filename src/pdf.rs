//! PDF documents signed through their `/Info` dictionary.
//!
//! A PDF is projected into a [`Document`] view before hashing: one page unit
//! per PDF page, in page order, and one metadata entry per `/Info` entry. A
//! page unit is a length-prefixed encoding of the page's whole object graph
//! with references resolved and dictionary keys sorted, so the physical file
//! layout (object numbers, xref form, string syntax) never reaches the hash.
//! `/Parent` links and stream `/Length` entries are structural and left out;
//! attributes a page inherits from the page tree are folded into the page.

use crate::canonical::extract_signature;
use crate::document::{Document, SIGNATURE_KEY};
use crate::error::{Result, SignError};
use crate::keys::{KeyPair, PublicKey};
use crate::signature::Signature;
use crate::signer::Signer;
use crate::verifier::{VerificationOutcome, Verifier};
use lopdf::{Dictionary, Object, ObjectId};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Links that only describe tree structure.
const STRUCTURAL_KEYS: &[&[u8]] = &[b"Parent"];

/// Stream entries recomputed by the writer.
const STREAM_STRUCTURAL_KEYS: &[&[u8]] = &[b"Parent", b"Length"];

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

enum InfoLocation {
    Indirect(ObjectId),
    Inline,
    Missing,
}

/// A loaded PDF file.
#[derive(Debug)]
pub struct PdfDocument {
    inner: lopdf::Document,
}

impl PdfDocument {
    /// Parse PDF bytes.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let inner = lopdf::Document::load_mem(bytes)?;
        Ok(Self { inner })
    }

    /// Read and parse a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::load(&bytes)
    }

    /// Wrap an already parsed document.
    pub fn from_lopdf(inner: lopdf::Document) -> Self {
        Self { inner }
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Project the PDF into the hashable document model.
    pub fn to_document(&self) -> Result<Document> {
        let mut doc = Document::new();
        for (number, page_id) in self.inner.get_pages() {
            let mut encoder = GraphEncoder::new(&self.inner);
            encoder.encode_page(page_id)?;
            tracing::debug!(page = number, len = encoder.out.len(), "encoded PDF page");
            doc.add_page(encoder.out);
        }
        if let Some(info) = self.info() {
            for (key, value) in info.iter() {
                let key = format!("/{}", escape_name(key));
                let value = if key == SIGNATURE_KEY {
                    self.metadata_text(value)?
                } else {
                    self.metadata_value(value)?
                };
                doc.set_metadata(key, value);
            }
        }
        Ok(doc)
    }

    /// Read an `/Info` entry as text. `key` includes the leading slash.
    pub fn metadata(&self, key: &str) -> Option<String> {
        let name = key.strip_prefix('/').unwrap_or(key);
        let value = self.info()?.get(name.as_bytes()).ok()?;
        self.metadata_text(value).ok()
    }

    /// Set an `/Info` entry, creating the dictionary if needed.
    pub fn set_metadata(&mut self, key: &str, value: &str) -> Result<()> {
        let name = key.strip_prefix('/').unwrap_or(key);
        self.info_mut()?.set(name, Object::string_literal(value));
        Ok(())
    }

    /// Remove an `/Info` entry.
    pub fn remove_metadata(&mut self, key: &str) -> Result<Option<String>> {
        let name = key.strip_prefix('/').unwrap_or(key);
        let removed = match self.info_location() {
            InfoLocation::Missing => None,
            _ => self.info_mut()?.remove(name.as_bytes()),
        };
        removed.map(|value| self.metadata_text(&value)).transpose()
    }

    /// The embedded signature, if any.
    pub fn signature(&self) -> Result<Signature> {
        extract_signature(&self.to_document()?)
    }

    /// Sign the PDF in place and return the embedded signature.
    pub fn sign(&mut self, keypair: &KeyPair) -> Result<Signature> {
        let view = self.to_document()?;
        let signature = Signer::new(keypair).signature_for(&view)?;
        self.set_metadata(SIGNATURE_KEY, &signature.to_hex())?;
        tracing::info!(pages = view.page_count(), "signed PDF");
        Ok(signature)
    }

    /// Check the embedded signature against `public_key`.
    pub fn check(&self, public_key: &PublicKey) -> VerificationOutcome {
        match self.to_document() {
            Ok(view) => Verifier::new(public_key).check(&view),
            Err(e) => {
                tracing::warn!(error = %e, "could not canonicalize PDF");
                VerificationOutcome::Invalid {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Whether the embedded signature is valid for `public_key`.
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        self.check(public_key).is_valid()
    }

    /// Serialize the PDF.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.inner.save_to(&mut out)?;
        Ok(out)
    }

    /// Write the PDF to a file.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }

    fn info_location(&self) -> InfoLocation {
        match self.inner.trailer.get(b"Info") {
            Ok(Object::Reference(id)) => InfoLocation::Indirect(*id),
            Ok(Object::Dictionary(_)) => InfoLocation::Inline,
            _ => InfoLocation::Missing,
        }
    }

    fn info(&self) -> Option<&Dictionary> {
        match self.inner.trailer.get(b"Info").ok()? {
            Object::Reference(id) => self.inner.get_dictionary(*id).ok(),
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    fn info_mut(&mut self) -> Result<&mut Dictionary> {
        let id = match self.info_location() {
            InfoLocation::Indirect(id) => id,
            InfoLocation::Inline => {
                return Ok(self.inner.trailer.get_mut(b"Info")?.as_dict_mut()?);
            }
            InfoLocation::Missing => {
                let id = self.inner.add_object(Dictionary::new());
                self.inner.trailer.set("Info", id);
                id
            }
        };
        Ok(self.inner.get_object_mut(id)?.as_dict_mut()?)
    }

    fn resolve_info_value<'v>(&'v self, value: &'v Object) -> Result<&'v Object> {
        match value {
            Object::Reference(id) => self.inner.get_object(*id).map_err(|e| {
                SignError::Canonicalization(format!("/Info entry {:?}: {}", id, e))
            }),
            other => Ok(other),
        }
    }

    fn graph_hex(&self, value: &Object) -> Result<String> {
        let mut encoder = GraphEncoder::new(&self.inner);
        encoder.encode(value)?;
        Ok(hex::encode(encoder.out))
    }

    /// Readable form of an `/Info` value. Strings are decoded (UTF-16BE with
    /// BOM, otherwise byte-per-char); other objects use the graph encoding.
    fn metadata_text(&self, value: &Object) -> Result<String> {
        Ok(match self.resolve_info_value(value)? {
            Object::String(bytes, _) => decode_text(bytes),
            Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
            other => self.graph_hex(other)?,
        })
    }

    /// Hashed form of an `/Info` value: a type tag followed by a payload that
    /// determines the value exactly.
    fn metadata_value(&self, value: &Object) -> Result<String> {
        Ok(match self.resolve_info_value(value)? {
            Object::String(bytes, _) => match bytes.as_slice() {
                [0xFE, 0xFF, rest @ ..] => match decode_utf16_exact(rest) {
                    Some(text) => format!("u:{}", text),
                    None => format!("x:{}", hex::encode(bytes)),
                },
                _ => format!("s:{}", bytes.iter().map(|&b| char::from(b)).collect::<String>()),
            },
            Object::Name(name) => format!("n:{}", escape_name(name)),
            other => format!("o:{}", self.graph_hex(other)?),
        })
    }
}

/// Name bytes as text, with `#XX` for `#` and anything outside printable ASCII.
fn escape_name(name: &[u8]) -> String {
    let mut out = String::with_capacity(name.len());
    for &b in name {
        if b.is_ascii_graphic() && b != b'#' {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("#{:02X}", b));
        }
    }
    out
}

/// UTF-16BE text, or `None` on an odd length or unpaired surrogate.
fn decode_utf16_exact(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

fn decode_text(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Deterministic encoding of a PDF object graph.
///
/// Objects reached a second time are written as a back-reference to their
/// visit index, which keeps cycles finite and the output independent of
/// object numbering.
struct GraphEncoder<'a> {
    doc: &'a lopdf::Document,
    seen: HashMap<ObjectId, usize>,
    out: Vec<u8>,
}

impl<'a> GraphEncoder<'a> {
    fn new(doc: &'a lopdf::Document) -> Self {
        Self {
            doc,
            seen: HashMap::new(),
            out: Vec::new(),
        }
    }

    fn bytes(&mut self, tag: u8, data: &[u8]) {
        self.out.push(tag);
        self.out.extend_from_slice(data.len().to_string().as_bytes());
        self.out.push(b':');
        self.out.extend_from_slice(data);
    }

    fn resolve(&self, id: ObjectId) -> Result<&'a Object> {
        self.doc.get_object(id).map_err(|e| {
            SignError::Canonicalization(format!("object {} {} R: {}", id.0, id.1, e))
        })
    }

    fn resolve_dictionary(&self, id: ObjectId) -> Result<&'a Dictionary> {
        self.resolve(id)?.as_dict().map_err(|e| {
            SignError::Canonicalization(format!("object {} {} R: {}", id.0, id.1, e))
        })
    }

    /// Encode a page dictionary with its inherited attributes filled in.
    fn encode_page(&mut self, page_id: ObjectId) -> Result<()> {
        let mut page = self.resolve_dictionary(page_id)?.clone();

        let mut visited = HashSet::new();
        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        while let Some(id) = parent {
            if !visited.insert(id) {
                break;
            }
            let node = self.resolve_dictionary(id)?;
            for key in INHERITABLE_KEYS {
                if !page.has(key) {
                    if let Ok(value) = node.get(key) {
                        page.set(key.to_vec(), value.clone());
                    }
                }
            }
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        }

        self.seen.insert(page_id, self.seen.len());
        self.encode_dictionary(&page, STRUCTURAL_KEYS)
    }

    fn encode_reference(&mut self, id: ObjectId) -> Result<()> {
        if let Some(index) = self.seen.get(&id) {
            self.out.extend_from_slice(format!("@{};", index).as_bytes());
            return Ok(());
        }
        self.seen.insert(id, self.seen.len());
        let object = self.resolve(id)?;
        self.encode(object)
    }

    fn encode_dictionary(&mut self, dict: &Dictionary, skip: &[&[u8]]) -> Result<()> {
        let mut entries: Vec<(&Vec<u8>, &Object)> = dict
            .iter()
            .filter(|(key, _)| !skip.contains(&key.as_slice()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        self.out.push(b'<');
        for (key, value) in entries {
            self.bytes(b'/', key);
            self.encode(value)?;
        }
        self.out.push(b'>');
        Ok(())
    }

    fn encode(&mut self, object: &Object) -> Result<()> {
        match object {
            Object::Null => self.out.push(b'n'),
            Object::Boolean(true) => self.out.push(b't'),
            Object::Boolean(false) => self.out.push(b'f'),
            Object::Integer(value) => {
                self.out.extend_from_slice(format!("i{};", value).as_bytes());
            }
            Object::Real(value) => {
                self.out.extend_from_slice(format!("r{};", value).as_bytes());
            }
            Object::Name(name) => self.bytes(b'/', name),
            Object::String(bytes, _) => self.bytes(b's', bytes),
            Object::Array(items) => {
                self.out.push(b'[');
                for item in items {
                    self.encode(item)?;
                }
                self.out.push(b']');
            }
            Object::Dictionary(dict) => self.encode_dictionary(dict, STRUCTURAL_KEYS)?,
            Object::Stream(stream) => {
                self.out.push(b'S');
                self.encode_dictionary(&stream.dict, STREAM_STRUCTURAL_KEYS)?;
                self.bytes(b'd', &stream.content);
            }
            Object::Reference(id) => self.encode_reference(*id)?,
        }
        Ok(())
    }
}

/// Sign PDF bytes and return the signed file's bytes.
pub fn sign_pdf(bytes: &[u8], keypair: &KeyPair) -> Result<Vec<u8>> {
    let mut pdf = PdfDocument::load(bytes)?;
    pdf.sign(keypair)?;
    pdf.to_bytes()
}

/// Check the signature embedded in PDF bytes.
pub fn check_pdf(bytes: &[u8], public_key: &PublicKey) -> VerificationOutcome {
    match PdfDocument::load(bytes) {
        Ok(pdf) => pdf.check(public_key),
        Err(e) => VerificationOutcome::Invalid {
            reason: e.to_string(),
        },
    }
}

/// Whether PDF bytes carry a valid signature for `public_key`.
pub fn verify_pdf(bytes: &[u8], public_key: &PublicKey) -> bool {
    check_pdf(bytes, public_key).is_valid()
}

/// Output path for a signed copy: `contract.pdf` becomes `contract<suffix>.pdf`.
pub fn signed_output_path<P: AsRef<Path>>(input: P, suffix: &str) -> PathBuf {
    let input = input.as_ref();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pdf".to_string());
    input.with_file_name(format!("{}{}.{}", stem, suffix, extension))
}
