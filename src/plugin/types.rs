//! Plugin ABI Surface
//!
//! Defines the types that cross the host/plugin boundary.

use std::fmt;

/// Host/plugin contract revision.
///
/// Bumped on any breaking change to [`HostContext`] or the export
/// signatures. A plugin built against a different revision is rejected
/// at load time.
pub const ABI_VERSION: u32 = 1;

/// Well-known export every plugin must provide to report its ABI revision.
pub const ABI_PROBE_SYMBOL: &str = "modlink_abi_version";

/// Export name of the notify entry point.
pub const NOTIFY_SYMBOL: &str = "notify";

/// Host-owned state passed into plugin calls by const pointer.
///
/// The shared value travels as a field here instead of being resolved out
/// of the host image by symbol name, so a plugin can never observe it
/// uninitialized and the host controls exactly what is visible.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostContext {
    /// ABI revision the host was built against.
    pub abi_version: u32,
    /// The host-owned shared integer, readable by the plugin.
    pub shared: i64,
}

impl HostContext {
    /// Build a context for the current ABI revision.
    pub fn new(shared: i64) -> Self {
        Self {
            abi_version: ABI_VERSION,
            shared,
        }
    }
}

/// Raw type of the ABI version probe export.
pub type AbiVersionFn = unsafe extern "C" fn() -> u32;

/// Raw type of the notify entry point.
pub type NotifyFn = unsafe extern "C" fn(i64, *const HostContext);

/// Value types admitted across the plugin boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiType {
    /// No value
    Void,
    /// 64-bit signed integer
    I64,
    /// 32-bit unsigned integer (ABI probe return)
    U32,
    /// Const pointer to [`HostContext`]
    Ctx,
}

impl AbiType {
    /// Parse from a declaration token.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "void" => Some(AbiType::Void),
            "i64" | "int64" | "int64_t" | "long" | "int" => Some(AbiType::I64),
            "u32" | "uint32" | "uint32_t" => Some(AbiType::U32),
            "ctx" | "context" => Some(AbiType::Ctx),
            _ => None,
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiType::Void => write!(f, "void"),
            AbiType::I64 => write!(f, "i64"),
            AbiType::U32 => write!(f, "u32"),
            AbiType::Ctx => write!(f, "ctx"),
        }
    }
}

/// Declared signature of an exported symbol
///
/// Manifests declare exports as C-style strings, e.g.
/// `"void notify(i64, ctx)"`. The registry parses them and compares the
/// declaration against the shape the host will actually call with, so a
/// divergence is a defined load-time error instead of a bad call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSignature {
    /// Exported symbol name
    pub name: String,
    /// Parameter types
    pub params: Vec<AbiType>,
    /// Return type
    pub return_type: AbiType,
}

impl SymbolSignature {
    /// Create a new signature
    pub fn new(name: impl Into<String>, params: Vec<AbiType>, return_type: AbiType) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
        }
    }

    /// The shape the host expects for the notify entry point.
    pub fn notify() -> Self {
        Self::new(NOTIFY_SYMBOL, vec![AbiType::I64, AbiType::Ctx], AbiType::Void)
    }

    /// The shape the host expects for the ABI version probe.
    pub fn abi_probe() -> Self {
        Self::new(ABI_PROBE_SYMBOL, Vec::new(), AbiType::U32)
    }

    /// Parse a C-style declaration string.
    ///
    /// Format: `"return_type symbol_name(param_type, param_type, ...)"`
    pub fn parse(decl: &str) -> Option<Self> {
        let decl = decl.trim();

        let paren = decl.find('(')?;
        let before = decl[..paren].trim();
        // The parameter list must be properly terminated
        let inside = decl[paren + 1..].trim().strip_suffix(')')?.trim();

        let parts: Vec<&str> = before.rsplitn(2, char::is_whitespace).collect();
        if parts.len() < 2 {
            return None;
        }
        let name = parts[0].trim();
        let return_type = AbiType::parse(parts[1])?;
        if name.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        for token in inside.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            // Ignore an optional parameter name after the type
            let type_str = token.split_whitespace().next()?;
            params.push(AbiType::parse(type_str)?);
        }

        Some(Self::new(name, params, return_type))
    }

    /// Exact comparison against the shape the host expects.
    pub fn matches(&self, expected: &SymbolSignature) -> bool {
        self.name == expected.name
            && self.params == expected.params
            && self.return_type == expected.return_type
    }
}

impl fmt::Display for SymbolSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}
