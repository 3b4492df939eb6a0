//! Modlink - Native Plugin Host with Explicit State Injection
//!
//! A small convention for "pluggable native modules": a host program owns a
//! shared integer, a plugin is a shared library exporting a `notify` entry
//! point, and the host passes its state into the call as an explicit
//! `#[repr(C)]` context instead of letting the plugin resolve a host global
//! by extern symbol.
//!
//! The classic extern-symbol pairing has two silent failure modes: a
//! missing export aborts the process at load time, and a mismatched
//! declaration is undefined behavior. Both become typed load-time errors
//! here:
//!
//! - every plugin exports a version probe (`modlink_abi_version`) that is
//!   checked against the host's [`plugin::ABI_VERSION`];
//! - a plugin declares its exports in a `modlink.json` manifest, and the
//!   registry verifies each declared symbol resolves with the expected
//!   shape before the plugin becomes callable;
//! - calling a plugin before the host state exists is a defined
//!   [`HostError::Uninitialized`], enforced by construction.
//!
//! # Example
//!
//! ```
//! use modlink::{Host, HostError};
//!
//! let mut host = Host::new();
//! assert!(matches!(host.context(), Err(HostError::Uninitialized)));
//!
//! host.init(100);
//! let ctx = host.context().unwrap();
//! assert_eq!(ctx.shared, 100);
//! ```
//!
//! Dispatching to a real plugin artifact:
//!
//! ```no_run
//! use modlink::{Host, PluginRegistry};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut registry = PluginRegistry::new();
//! registry.add_search_path("plugins");
//! registry.load("notify")?;
//!
//! let host = Host::with_shared(100);
//! host.notify(&registry, "notify", 42)?;
//! // plugin prints:
//! //   param: 42
//! //   global: 100
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod host;
pub mod plugin;

pub use config::{ConfigError, ModlinkConfig};
pub use host::{Host, HostError};
pub use plugin::{HostContext, PluginError, PluginManifest, PluginRegistry, ABI_VERSION};
