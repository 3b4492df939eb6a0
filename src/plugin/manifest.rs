//! Plugin Manifest (modlink.json)
//!
//! A plugin declares its exported surface in a small JSON file so the host
//! can verify symbols and signatures at load time instead of trusting an
//! unchecked extern declaration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::types::{SymbolSignature, ABI_VERSION};

/// Manifest errors
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid manifest: {0}")]
    Validation(String),
}

/// Plugin manifest (modlink.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Plugin name
    pub name: String,

    /// Plugin version
    #[serde(default = "default_version")]
    pub version: String,

    /// ABI revision the plugin was built against
    #[serde(default = "default_abi_version")]
    pub abi_version: u32,

    /// Brief description
    #[serde(default)]
    pub description: String,

    /// Declared exports
    #[serde(default)]
    pub exports: Vec<ExportDecl>,

    /// Author information
    #[serde(default)]
    pub authors: Vec<String>,

    /// License (SPDX identifier)
    #[serde(default)]
    pub license: Option<String>,

    /// Repository URL
    #[serde(default)]
    pub repository: Option<String>,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

fn default_abi_version() -> u32 {
    ABI_VERSION
}

impl PluginManifest {
    /// Create a manifest with minimal required fields.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            abi_version: ABI_VERSION,
            description: String::new(),
            exports: Vec::new(),
            authors: Vec::new(),
            license: None,
            repository: None,
        }
    }

    /// Create a manifest for a plugin that exposes only the standard
    /// exports: the ABI probe and the notify entry point.
    pub fn with_standard_exports(name: impl Into<String>) -> Self {
        let mut manifest = Self::new(name, default_version());
        manifest.add_export(ExportDecl::from_signature(&SymbolSignature::abi_probe()));
        manifest.add_export(ExportDecl::from_signature(&SymbolSignature::notify()));
        manifest
    }

    /// Load a manifest from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let file = File::open(path.as_ref())?;
        let manifest = serde_json::from_reader(BufReader::new(file))?;
        Ok(manifest)
    }

    /// Save the manifest to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add an export declaration.
    pub fn add_export(&mut self, export: ExportDecl) {
        self.exports.push(export);
    }

    /// Find a declared export by symbol name.
    pub fn get_export(&self, symbol: &str) -> Option<&ExportDecl> {
        self.exports.iter().find(|e| e.symbol == symbol)
    }

    /// Check structural validity: a non-empty name, parseable signatures
    /// that agree with their symbol names, and no duplicate symbols.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.name.trim().is_empty() {
            return Err(ManifestError::Validation("plugin name is empty".into()));
        }

        let mut seen = HashSet::new();
        for export in &self.exports {
            let sig = export.parsed().ok_or_else(|| {
                ManifestError::Validation(format!(
                    "export '{}' has unparseable signature '{}'",
                    export.symbol, export.signature
                ))
            })?;
            if sig.name != export.symbol {
                return Err(ManifestError::Validation(format!(
                    "export '{}' declares signature for '{}'",
                    export.symbol, sig.name
                )));
            }
            if !seen.insert(export.symbol.as_str()) {
                return Err(ManifestError::Validation(format!(
                    "duplicate export '{}'",
                    export.symbol
                )));
            }
        }
        Ok(())
    }

    /// Locate the manifest belonging to a plugin artifact.
    ///
    /// For a library file, `<stem>.modlink.json` beside it is tried first,
    /// then a sibling `modlink.json`. For a directory, `modlink.json`
    /// inside it. Returns `Ok(None)` when no manifest exists.
    pub fn discover(artifact: impl AsRef<Path>) -> Result<Option<Self>, ManifestError> {
        let artifact = artifact.as_ref();

        let candidates: Vec<PathBuf> = if artifact.is_dir() {
            vec![artifact.join("modlink.json")]
        } else {
            let dir = artifact.parent().unwrap_or_else(|| Path::new("."));
            let mut c = Vec::new();
            if let Some(stem) = artifact.file_stem() {
                let mut name = stem.to_os_string();
                name.push(".modlink.json");
                c.push(dir.join(name));
            }
            c.push(dir.join("modlink.json"));
            c
        };

        for candidate in candidates {
            if candidate.is_file() {
                return Ok(Some(Self::load(candidate)?));
            }
        }
        Ok(None)
    }
}

/// A single declared export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDecl {
    /// Exported symbol name
    pub symbol: String,

    /// C-style declaration string, e.g. `"void notify(i64, ctx)"`
    pub signature: String,

    /// Brief description
    #[serde(default)]
    pub description: String,
}

impl ExportDecl {
    /// Create an export declaration.
    pub fn new(symbol: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            signature: signature.into(),
            description: String::new(),
        }
    }

    /// Declare an export from an already structured signature.
    pub fn from_signature(sig: &SymbolSignature) -> Self {
        Self::new(sig.name.clone(), sig.to_string())
    }

    /// Set the description.
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Parse the declared signature string.
    pub fn parsed(&self) -> Option<SymbolSignature> {
        SymbolSignature::parse(&self.signature)
    }
}
