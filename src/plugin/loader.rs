//! Plugin Library Loader
//!
//! Safe wrapper around libloading for opening plugin shared libraries and
//! resolving their exports.

use std::collections::HashMap;
use std::ffi::CString;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};

use super::types::{AbiVersionFn, HostContext, NotifyFn, ABI_PROBE_SYMBOL};
use super::PluginError;

/// An opened plugin shared library
#[derive(Debug)]
pub struct PluginLibrary {
    /// Path the library was opened from
    path: PathBuf,
    /// The loaded library handle
    library: Library,
}

impl PluginLibrary {
    /// Open a plugin library from the given path.
    ///
    /// A missing or unloadable artifact is a defined error, never a
    /// process-level link failure.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PluginError> {
        let path = path.as_ref().to_path_buf();

        // Safety: opening a shared object runs its initializers. The path
        // comes from the caller, who vouches for the artifact.
        let library = unsafe {
            Library::new(&path).map_err(|e| PluginError::Load {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
        };

        Ok(Self { path, library })
    }

    /// Path this library was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether a named export resolves in this library.
    pub fn has_symbol(&self, name: &str) -> bool {
        let Ok(c_name) = CString::new(name) else {
            return false;
        };
        // Safety: resolving a symbol only reads the export table; nothing
        // is called through the resulting pointer here.
        unsafe {
            self.library
                .get::<*const ()>(c_name.as_bytes_with_nul())
                .is_ok()
        }
    }

    /// Resolve the well-known version probe and report the plugin's ABI
    /// revision.
    pub fn abi_version(&self) -> Result<u32, PluginError> {
        let probe: Symbol<AbiVersionFn> = self.resolve(ABI_PROBE_SYMBOL)?;
        // Safety: the probe takes no arguments and returns a u32 by the
        // published contract; a plugin exporting it with another shape is
        // outside the ABI.
        Ok(unsafe { probe() })
    }

    /// Call a notify-shaped export with the injected host context.
    pub fn notify(&self, symbol: &str, value: i64, ctx: &HostContext) -> Result<(), PluginError> {
        let func: Symbol<NotifyFn> = self.resolve(symbol)?;
        // Safety: the registry verified this symbol resolves and that its
        // declared signature is the notify shape before dispatching here;
        // the context pointer is valid for the duration of the call.
        unsafe { func(value, ctx as *const HostContext) };
        Ok(())
    }

    fn resolve<T>(&self, name: &str) -> Result<Symbol<'_, T>, PluginError> {
        let c_name =
            CString::new(name).map_err(|_| PluginError::InvalidSymbol(name.to_string()))?;
        // Safety: the symbol is only transmuted to the caller-chosen type;
        // all call sites pin that type to an ABI-published shape.
        unsafe {
            self.library
                .get(c_name.as_bytes_with_nul())
                .map_err(|_| PluginError::SymbolNotFound {
                    symbol: name.to_string(),
                    path: self.path.display().to_string(),
                })
        }
    }
}

/// Name-to-library resolution with ordered search paths
pub struct PluginLoader {
    /// Ordered directories searched for plugin artifacts
    search_paths: Vec<PathBuf>,
    /// Opened libraries, keyed by the name they were requested under
    libraries: HashMap<String, PluginLibrary>,
}

impl PluginLoader {
    /// Create a loader with the platform default search paths.
    pub fn new() -> Self {
        Self {
            search_paths: default_search_paths(),
            libraries: HashMap::new(),
        }
    }

    /// Append a search path. Later additions are searched after earlier
    /// ones.
    pub fn add_search_path(&mut self, path: impl AsRef<Path>) {
        self.search_paths.push(path.as_ref().to_path_buf());
    }

    /// The current search path list, in order.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Resolve a plugin name to an artifact path.
    ///
    /// A name that is already a path to an existing file wins outright;
    /// otherwise the platform library filename is searched for in order.
    pub fn find_library(&self, name: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }

        let filename = platform_library_name(name);
        self.search_paths
            .iter()
            .map(|dir| dir.join(&filename))
            .find(|candidate| candidate.is_file())
    }

    /// Open a plugin library by name, reusing an already open handle.
    pub fn open(&mut self, name: &str) -> Result<&PluginLibrary, PluginError> {
        if !self.libraries.contains_key(name) {
            let path = self
                .find_library(name)
                .ok_or_else(|| PluginError::LibraryNotFound(name.to_string()))?;
            let library = PluginLibrary::open(path)?;
            self.libraries.insert(name.to_string(), library);
        }
        Ok(&self.libraries[name])
    }

    /// Get an already opened library.
    pub fn get(&self, name: &str) -> Option<&PluginLibrary> {
        self.libraries.get(name)
    }

    /// Close a library handle. Returns false if it was not open.
    pub fn unload(&mut self, name: &str) -> bool {
        self.libraries.remove(name).is_some()
    }

    /// Names of the currently open libraries.
    pub fn loaded(&self) -> Vec<&str> {
        self.libraries.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for PluginLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn env_paths(var: &str, separator: char) -> Vec<PathBuf> {
    std::env::var(var)
        .map(|value| {
            value
                .split(separator)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Platform default plugin search paths: current directory first, then the
/// loader environment variable, then the system library directories.
fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd);
    }

    #[cfg(target_os = "linux")]
    {
        paths.extend(env_paths("LD_LIBRARY_PATH", ':'));
        for dir in ["/usr/local/lib", "/usr/lib", "/usr/lib64", "/lib", "/lib64"] {
            paths.push(PathBuf::from(dir));
        }
    }

    #[cfg(target_os = "macos")]
    {
        paths.extend(env_paths("DYLD_LIBRARY_PATH", ':'));
        for dir in ["/usr/local/lib", "/opt/homebrew/lib", "/usr/lib"] {
            paths.push(PathBuf::from(dir));
        }
    }

    #[cfg(target_os = "windows")]
    {
        paths.extend(env_paths("PATH", ';'));
    }

    paths
}

/// Map a bare plugin name to the platform shared-library filename.
pub(crate) fn platform_library_name(name: &str) -> String {
    #[cfg(target_os = "windows")]
    {
        if name.ends_with(".dll") {
            name.to_string()
        } else {
            format!("{}.dll", name)
        }
    }

    #[cfg(target_os = "macos")]
    {
        if name.starts_with("lib") && name.ends_with(".dylib") {
            name.to_string()
        } else {
            format!("lib{}.dylib", name)
        }
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        if name.starts_with("lib") && name.ends_with(".so") {
            name.to_string()
        } else {
            format!("lib{}.so", name)
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        name.to_string()
    }
}
