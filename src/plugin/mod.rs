//! Plugin Subsystem
//!
//! Loading, verification, and dispatch of native plugin modules.
//!
//! # Architecture
//!
//! ```text
//! Host (owns shared state)
//!       │  HostContext (injected, #[repr(C)])
//!       ▼
//! PluginRegistry (manifest + ABI + signature verification)
//!       │
//!       ▼
//! PluginLoader / PluginLibrary (libloading)
//!       │
//!       ▼
//! notify(value, ctx)  (plugin shared library)
//! ```
//!
//! The classic extern-symbol pairing (library reads a host global by name)
//! is inverted: the host hands its state to the plugin as an explicit
//! context argument, and everything the plugin exports is checked against
//! its manifest when the library is opened. A missing symbol, a diverging
//! signature, or a foreign ABI revision is a typed load error, not
//! undefined behavior.
//!
//! # Example
//!
//! ```no_run
//! use modlink::plugin::{HostContext, PluginRegistry};
//!
//! let mut registry = PluginRegistry::new();
//! registry.load("notify")?;
//! registry.notify("notify", 42, &HostContext::new(100))?;
//! # Ok::<(), modlink::plugin::PluginError>(())
//! ```

mod loader;
mod manifest;
mod registry;
mod types;

pub use loader::{PluginLibrary, PluginLoader};
pub use manifest::{ExportDecl, ManifestError, PluginManifest};
pub use registry::{DiscoveredPlugin, PluginError, PluginRegistry, VerifiedPlugin};
pub use types::{
    AbiType, AbiVersionFn, HostContext, NotifyFn, SymbolSignature, ABI_PROBE_SYMBOL, ABI_VERSION,
    NOTIFY_SYMBOL,
};
