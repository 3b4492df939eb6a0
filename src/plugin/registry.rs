//! Plugin Registry
//!
//! Central store of verified plugins. Loading a plugin here means its
//! library opened, its ABI revision agrees with the host, and every
//! manifest-declared export resolved with the expected shape. Only then
//! can it be dispatched to.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::loader::PluginLoader;
use super::manifest::{ManifestError, PluginManifest};
use super::types::{HostContext, SymbolSignature, ABI_VERSION, NOTIFY_SYMBOL};

/// Errors surfaced by plugin loading and dispatch
///
/// Both silent failure modes of the extern-symbol idiom appear here as
/// typed variants: a missing export is [`PluginError::SymbolNotFound`]
/// and a declared shape diverging from the host's expectation is
/// [`PluginError::SignatureMismatch`].
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("failed to load plugin library '{path}': {reason}")]
    Load { path: String, reason: String },

    #[error("plugin library '{0}' not found in search paths")]
    LibraryNotFound(String),

    #[error("symbol '{symbol}' not found in '{path}'")]
    SymbolNotFound { symbol: String, path: String },

    #[error("invalid symbol name: {0}")]
    InvalidSymbol(String),

    #[error("plugin '{plugin}' was built against ABI {found}, host expects {expected}")]
    AbiMismatch {
        plugin: String,
        expected: u32,
        found: u32,
    },

    #[error("export '{symbol}' declares '{declared}', host expects '{expected}'")]
    SignatureMismatch {
        symbol: String,
        declared: String,
        expected: String,
    },

    #[error("plugin '{0}' declares no notify entry point")]
    MissingNotify(String),

    #[error("plugin '{0}' is not loaded")]
    NotLoaded(String),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// A plugin that passed load-time verification
#[derive(Debug)]
pub struct VerifiedPlugin {
    /// Name the plugin was loaded under
    pub name: String,
    /// Path of the opened library
    pub path: PathBuf,
    /// ABI revision reported by the plugin's version probe
    pub abi_version: u32,
    /// The manifest the plugin was verified against
    pub manifest: PluginManifest,
    /// Symbol dispatched for notify calls
    notify_symbol: String,
}

/// A manifest found while scanning the search paths
#[derive(Debug)]
pub struct DiscoveredPlugin {
    /// Plugin name from the manifest
    pub name: String,
    /// Where the manifest was found
    pub manifest_path: PathBuf,
    /// The parsed manifest
    pub manifest: PluginManifest,
}

/// Plugin registry: loader plus verified plugin table
pub struct PluginRegistry {
    loader: PluginLoader,
    plugins: HashMap<String, VerifiedPlugin>,
}

impl PluginRegistry {
    /// Create a registry with the platform default search paths.
    pub fn new() -> Self {
        Self {
            loader: PluginLoader::new(),
            plugins: HashMap::new(),
        }
    }

    /// Append a plugin search path.
    pub fn add_search_path(&mut self, path: impl AsRef<Path>) {
        self.loader.add_search_path(path);
    }

    /// Load and verify a plugin by name or artifact path.
    ///
    /// The manifest is discovered next to the artifact; a plugin shipping
    /// none is assumed to expose just the standard exports.
    pub fn load(&mut self, name: &str) -> Result<&VerifiedPlugin, PluginError> {
        let path = self
            .loader
            .find_library(name)
            .ok_or_else(|| PluginError::LibraryNotFound(name.to_string()))?;
        let manifest = PluginManifest::discover(&path)?
            .unwrap_or_else(|| PluginManifest::with_standard_exports(name));
        self.load_with_manifest(name, manifest)
    }

    /// Load a plugin and verify it against an explicit manifest.
    pub fn load_with_manifest(
        &mut self,
        name: &str,
        manifest: PluginManifest,
    ) -> Result<&VerifiedPlugin, PluginError> {
        manifest.validate()?;

        let library = self.loader.open(name)?;
        let path = library.path().to_path_buf();

        let found = library.abi_version()?;
        verify_abi(name, found)?;

        let expected = SymbolSignature::notify();
        let mut notify_symbol = None;
        for export in &manifest.exports {
            if !library.has_symbol(&export.symbol) {
                return Err(PluginError::SymbolNotFound {
                    symbol: export.symbol.clone(),
                    path: path.display().to_string(),
                });
            }
            if export.symbol == NOTIFY_SYMBOL {
                // validate() already guaranteed the declaration parses
                let declared = export.parsed().ok_or_else(|| {
                    ManifestError::Validation(format!(
                        "export '{}' has unparseable signature",
                        export.symbol
                    ))
                })?;
                if !declared.matches(&expected) {
                    return Err(PluginError::SignatureMismatch {
                        symbol: export.symbol.clone(),
                        declared: declared.to_string(),
                        expected: expected.to_string(),
                    });
                }
                notify_symbol = Some(export.symbol.clone());
            }
        }
        let notify_symbol =
            notify_symbol.ok_or_else(|| PluginError::MissingNotify(name.to_string()))?;

        let verified = VerifiedPlugin {
            name: name.to_string(),
            path,
            abi_version: found,
            manifest,
            notify_symbol,
        };
        self.plugins.insert(name.to_string(), verified);
        Ok(&self.plugins[name])
    }

    /// Dispatch a notify call to a verified plugin.
    pub fn notify(&self, name: &str, value: i64, ctx: &HostContext) -> Result<(), PluginError> {
        let plugin = self
            .plugins
            .get(name)
            .ok_or_else(|| PluginError::NotLoaded(name.to_string()))?;
        let library = self
            .loader
            .get(name)
            .ok_or_else(|| PluginError::NotLoaded(name.to_string()))?;
        library.notify(&plugin.notify_symbol, value, ctx)
    }

    /// Get a verified plugin by name.
    pub fn get(&self, name: &str) -> Option<&VerifiedPlugin> {
        self.plugins.get(name)
    }

    /// List verified plugins, sorted by name.
    pub fn list(&self) -> Vec<&VerifiedPlugin> {
        let mut plugins: Vec<_> = self.plugins.values().collect();
        plugins.sort_by(|a, b| a.name.cmp(&b.name));
        plugins
    }

    /// Drop a plugin and close its library. Returns false if it was not
    /// loaded.
    pub fn unload(&mut self, name: &str) -> bool {
        let known = self.plugins.remove(name).is_some();
        self.loader.unload(name) || known
    }

    /// Scan the search paths for plugin manifests.
    ///
    /// Picks up `*.modlink.json` files and directories containing a
    /// `modlink.json`. Unreadable entries are skipped.
    pub fn discover(&self) -> Vec<DiscoveredPlugin> {
        let mut found = Vec::new();
        for dir in self.loader.search_paths() {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                let manifest_path = if path.is_dir() {
                    let inner = path.join("modlink.json");
                    inner.is_file().then_some(inner)
                } else if path
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().ends_with(".modlink.json"))
                {
                    Some(path)
                } else {
                    None
                };
                if let Some(manifest_path) = manifest_path {
                    if let Ok(manifest) = PluginManifest::load(&manifest_path) {
                        found.push(DiscoveredPlugin {
                            name: manifest.name.clone(),
                            manifest_path,
                            manifest,
                        });
                    }
                }
            }
        }
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a plugin's reported ABI revision against the host's.
pub(crate) fn verify_abi(plugin: &str, found: u32) -> Result<(), PluginError> {
    if found != ABI_VERSION {
        return Err(PluginError::AbiMismatch {
            plugin: plugin.to_string(),
            expected: ABI_VERSION,
            found,
        });
    }
    Ok(())
}
