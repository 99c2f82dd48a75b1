//! Registries of encrypted keys, with the most recently added key active.
//!
//! [`FileKeyRegistry`] keeps an append-only `key_list.txt` index next to the
//! blob files, one key id per line. The last listed id is the active key.

use crate::error::{Result, SignError};
use crate::key_codec::EncryptedKeyBlob;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File name of the key index inside a key directory.
pub const KEY_LIST_FILE: &str = "key_list.txt";

/// Identifier of a stored key (its blob's file name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyId(String);

impl KeyId {
    /// Validate an identifier. Ids are bare file names.
    pub fn new<S: Into<String>>(id: S) -> Result<Self> {
        let id = id.into();
        if id.is_empty()
            || id.contains('/')
            || id.contains('\\')
            || id.contains("..")
            || id.chars().any(char::is_control)
        {
            return Err(SignError::InvalidFormat(format!("illegal key id {:?}", id)));
        }
        Ok(Self(id))
    }

    /// A fresh id of the form `private_<uuid>.key`.
    pub fn generate() -> Self {
        Self(format!("private_{}.key", Uuid::new_v4()))
    }

    /// The id as a file name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered, append-only index of key ids.
pub trait KeyRegistry {
    /// Record `id` as the newest key.
    fn append(&mut self, id: &KeyId) -> Result<()>;

    /// The most recently appended id, if any.
    fn latest(&self) -> Result<Option<KeyId>>;
}

/// In-memory registry.
#[derive(Debug, Default)]
pub struct MemoryKeyRegistry {
    ids: Vec<KeyId>,
}

impl MemoryKeyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// All ids, oldest first.
    pub fn ids(&self) -> &[KeyId] {
        &self.ids
    }
}

impl KeyRegistry for MemoryKeyRegistry {
    fn append(&mut self, id: &KeyId) -> Result<()> {
        self.ids.push(id.clone());
        Ok(())
    }

    fn latest(&self) -> Result<Option<KeyId>> {
        Ok(self.ids.last().cloned())
    }
}

/// Registry backed by a directory, such as a mounted removable drive.
#[derive(Debug, Clone)]
pub struct FileKeyRegistry {
    dir: PathBuf,
}

impl FileKeyRegistry {
    /// A registry rooted at `dir`.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// The key directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn list_path(&self) -> PathBuf {
        self.dir.join(KEY_LIST_FILE)
    }

    /// All listed ids, oldest first. A missing index is an empty registry.
    pub fn ids(&self) -> Result<Vec<KeyId>> {
        let content = match fs::read_to_string(self.list_path()) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(KeyId::new)
            .collect()
    }

    /// Write a blob under a fresh id and register it as the active key.
    pub fn store_blob(&mut self, blob: &EncryptedKeyBlob) -> Result<KeyId> {
        let id = KeyId::generate();
        fs::write(self.dir.join(id.as_str()), blob.as_bytes())?;
        self.append(&id)?;
        tracing::info!(key_id = %id, dir = %self.dir.display(), "stored encrypted key");
        Ok(id)
    }

    /// Read the blob stored under `id`.
    pub fn load_blob(&self, id: &KeyId) -> Result<EncryptedKeyBlob> {
        let bytes = fs::read(self.dir.join(id.as_str()))?;
        Ok(EncryptedKeyBlob::from_bytes(bytes))
    }

    /// Read the blob of the most recently registered key.
    pub fn load_latest_blob(&self) -> Result<(KeyId, EncryptedKeyBlob)> {
        let id = self.latest()?.ok_or_else(|| {
            SignError::Registry(format!(
                "no keys listed in {}",
                self.list_path().display()
            ))
        })?;
        tracing::debug!(key_id = %id, "loading active key");
        let blob = self.load_blob(&id)?;
        Ok((id, blob))
    }
}

impl KeyRegistry for FileKeyRegistry {
    fn append(&mut self, id: &KeyId) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.list_path())?;
        writeln!(file, "{}", id)?;
        Ok(())
    }

    fn latest(&self) -> Result<Option<KeyId>> {
        Ok(self.ids()?.pop())
    }
}
