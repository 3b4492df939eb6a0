//! Notify Plugin
//!
//! The classic shared-library demonstration under the injected-state
//! convention: the host owns the shared value and hands it in through the
//! context argument; this plugin prints the call parameter and that value.

use modlink::plugin::{HostContext, ABI_VERSION};

/// Reports the ABI contract revision this plugin was built against.
#[no_mangle]
pub extern "C" fn modlink_abi_version() -> u32 {
    ABI_VERSION
}

/// Prints the parameter and the host-owned shared value, one line each.
///
/// # Safety
///
/// `ctx` must be null or a pointer to a valid [`HostContext`] that
/// outlives the call.
#[no_mangle]
pub unsafe extern "C" fn notify(value: i64, ctx: *const HostContext) {
    println!("param: {}", value);
    match ctx.as_ref() {
        Some(ctx) => println!("global: {}", ctx.shared),
        None => println!("global: <no context>"),
    }
}
