//! Host State and Call Driver
//!
//! The host owns the shared integer plugins may read. It is the only
//! writer, and a plugin call can never observe the value before
//! initialization: building a [`HostContext`] from an uninitialized host
//! is a defined error, not undefined behavior.

use thiserror::Error;

use crate::plugin::{HostContext, PluginError, PluginRegistry};

/// Host-side errors
#[derive(Debug, Error)]
pub enum HostError {
    #[error("host shared state is not initialized")]
    Uninitialized,

    #[error(transparent)]
    Plugin(#[from] PluginError),
}

/// Owner of the shared state injected into plugin calls
///
/// Single-threaded by construction: dispatch goes through `&self` borrows
/// and no plugin ever holds the context past its call.
#[derive(Debug, Default)]
pub struct Host {
    shared: Option<i64>,
}

impl Host {
    /// Create a host with uninitialized shared state.
    pub fn new() -> Self {
        Self { shared: None }
    }

    /// Create a host with the shared value already set.
    pub fn with_shared(value: i64) -> Self {
        Self {
            shared: Some(value),
        }
    }

    /// Set the shared value. Re-initialization is allowed; the last write
    /// wins.
    pub fn init(&mut self, value: i64) {
        self.shared = Some(value);
    }

    /// The current shared value, if initialized.
    pub fn shared(&self) -> Option<i64> {
        self.shared
    }

    /// Build the context injected into plugin calls.
    pub fn context(&self) -> Result<HostContext, HostError> {
        let shared = self.shared.ok_or(HostError::Uninitialized)?;
        Ok(HostContext::new(shared))
    }

    /// Invoke a loaded plugin's notify entry point once with the given
    /// argument and the current shared state.
    pub fn notify(
        &self,
        registry: &PluginRegistry,
        plugin: &str,
        value: i64,
    ) -> Result<(), HostError> {
        let ctx = self.context()?;
        registry.notify(plugin, value, &ctx)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::ABI_VERSION;

    #[test]
    fn test_context_before_init_fails() {
        let host = Host::new();
        assert!(matches!(host.context(), Err(HostError::Uninitialized)));
    }

    #[test]
    fn test_context_after_init() {
        let mut host = Host::new();
        host.init(100);
        let ctx = host.context().unwrap();
        assert_eq!(ctx.shared, 100);
        assert_eq!(ctx.abi_version, ABI_VERSION);
    }

    #[test]
    fn test_reinit_last_write_wins() {
        let mut host = Host::with_shared(1);
        host.init(7);
        assert_eq!(host.shared(), Some(7));
        assert_eq!(host.context().unwrap().shared, 7);
    }

    #[test]
    fn test_context_is_idempotent() {
        let host = Host::with_shared(100);
        assert_eq!(host.context().unwrap(), host.context().unwrap());
    }

    #[test]
    fn test_notify_requires_init_before_lookup() {
        // Uninitialized state must fail before any plugin resolution
        let registry = PluginRegistry::new();
        let host = Host::new();
        let err = host.notify(&registry, "notify", 42).unwrap_err();
        assert!(matches!(err, HostError::Uninitialized));
    }

    #[test]
    fn test_notify_unloaded_plugin() {
        let registry = PluginRegistry::new();
        let host = Host::with_shared(100);
        let err = host.notify(&registry, "notify", 42).unwrap_err();
        assert!(matches!(
            err,
            HostError::Plugin(PluginError::NotLoaded(_))
        ));
    }
}
