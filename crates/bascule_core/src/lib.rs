//! Provide shared, pure semantic helpers and canonical language vocabulary for the bascule compiler.
//!
//! This crate is intentionally small and dependency-free. It contains deterministic helpers that the
//! lexer, the expression analyzer and the constant folder all agree on.
//!
//! ## Notes
//!
//! - This is a “semantic core” crate: **no IO**, no global state, and no compiler-specific types.
//! - Current scope: numeric policy (round-half-to-even, integer division), string-literal escape encoding,
//!   and canonical language vocabulary (keywords, operators, punctuation, data types).

pub mod lang;
pub mod numeric;
pub mod strings;
