//! Compiler version information.
//!
//! The value is taken from Cargo metadata at compile time, so the CLI and the IR header comment agree on it.

/// The bascule compiler version string (for example, `0.1.0`).
pub const BASCULE_VERSION: &str = env!("CARGO_PKG_VERSION");
