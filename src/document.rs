//! The native document container: ordered pages plus a metadata map.
//!
//! The persisted form is JSON over ordered types only (pages in order,
//! metadata keys sorted, page bytes hex-encoded), with no generated fields,
//! so writing the same logical document always yields the same bytes.

use crate::error::{Result, SignError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Metadata key reserved for the embedded signature.
pub const SIGNATURE_KEY: &str = "/Signature";

/// One content unit of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(with = "hex::serde")]
    content: Vec<u8>,
}

impl Page {
    /// Create a page from raw content bytes.
    pub fn new<C: Into<Vec<u8>>>(content: C) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// The page's content bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Replace the page's content.
    pub fn set_content<C: Into<Vec<u8>>>(&mut self, content: C) {
        self.content = content.into();
    }
}

/// A structured document of pages and string metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pages: Vec<Page>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page (builder style).
    pub fn with_page<C: Into<Vec<u8>>>(mut self, content: C) -> Self {
        self.add_page(content);
        self
    }

    /// Set a metadata entry (builder style).
    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.set_metadata(key, value);
        self
    }

    /// Append a page.
    pub fn add_page<C: Into<Vec<u8>>>(&mut self, content: C) {
        self.pages.push(Page::new(content));
    }

    /// Pages in order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Mutable access to the pages.
    pub fn pages_mut(&mut self) -> &mut [Page] {
        &mut self.pages
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All metadata entries, sorted by key.
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Look up a metadata value.
    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Insert or replace a metadata entry.
    pub fn set_metadata<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Remove a metadata entry, returning its value.
    pub fn remove_metadata(&mut self, key: &str) -> Option<String> {
        self.metadata.remove(key)
    }

    /// Serialize with the container's standard writer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a serialized document.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| SignError::InvalidFormat(format!("document container: {}", e)))
    }

    /// Save the document to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Load a document from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read(path)?;
        Self::from_bytes(&content)
    }
}
