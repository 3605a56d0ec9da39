//! Names that are never tracked as local variables.
//!
//! Platform and runtime globals are provided by the environment, and a
//! leading underscore marks a binding as intentionally unused.

/// Browser, Node.js and language-level globals.
pub const GLOBAL_IDENTIFIERS: &[&str] = &[
    "window",
    "document",
    "console",
    "process",
    "global",
    "require",
    "module",
    "exports",
    "Buffer",
    "setTimeout",
    "setInterval",
    "clearTimeout",
    "clearInterval",
    "setImmediate",
    "clearImmediate",
    "__dirname",
    "__filename",
    "undefined",
    "null",
    "true",
    "false",
    "NaN",
    "Infinity",
    "eval",
    "parseInt",
    "parseFloat",
    "isNaN",
    "isFinite",
    "decodeURI",
    "decodeURIComponent",
    "encodeURI",
    "encodeURIComponent",
    "escape",
    "unescape",
];

/// Prefix marking a name as private by convention.
pub const PRIVATE_PREFIX: char = '_';

#[inline]
pub fn is_global_identifier(name: &str) -> bool {
    GLOBAL_IDENTIFIERS.contains(&name)
}

#[inline]
pub fn is_private_identifier(name: &str) -> bool {
    name.starts_with(PRIVATE_PREFIX)
}

/// Whether a variable-like declaration with this name is skipped entirely.
#[inline]
pub fn should_skip_identifier(name: &str) -> bool {
    is_global_identifier(name) || is_private_identifier(name)
}
