//! Command-line configuration loaded from TOML.

use crate::error::{Result, SignError};
use crate::keys::{DEFAULT_KEY_BITS, MIN_KEY_BITS};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for the `docseal` binary. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding encrypted keys and `key_list.txt`.
    pub key_dir: Option<PathBuf>,
    /// Suffix inserted before the extension of signed output files.
    pub signed_suffix: String,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// RSA modulus size for newly generated keys.
    pub key_bits: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_dir: None,
            signed_suffix: "_signed".to_string(),
            log_filter: "info".to_string(),
            key_bits: DEFAULT_KEY_BITS,
        }
    }
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| SignError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| SignError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.key_bits < MIN_KEY_BITS {
            return Err(SignError::Config(format!(
                "key_bits must be at least {}, got {}",
                MIN_KEY_BITS, self.key_bits
            )));
        }
        if self.signed_suffix.contains(&['/', '\\'][..]) {
            return Err(SignError::Config(format!(
                "signed_suffix must not contain path separators: {:?}",
                self.signed_suffix
            )));
        }
        Ok(())
    }
}
