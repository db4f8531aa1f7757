use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, AccessResult};

/// Settings of a resolution [`crate::Context`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Hasher used for digests when the caller names none.
    pub default_hash_algorithm: String,
    /// Signature handler used when signing resources.
    pub default_signing_algorithm: String,
    /// Whether component versions stage resource blobs as compose specs.
    pub composition_mode: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            default_hash_algorithm: "SHA-256".to_string(),
            default_signing_algorithm: "ed25519".to_string(),
            composition_mode: true,
        }
    }
}

impl ContextConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> AccessResult<Self> {
        toml::from_str(s).map_err(|e| AccessError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> AccessResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AccessError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> AccessResult<String> {
        toml::to_string(self).map_err(|e| AccessError::Config(e.to_string()))
    }
}
