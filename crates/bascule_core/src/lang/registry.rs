//! Shared helpers for `bascule_core::lang` registries.
//!
//! The registries are **registry-first** vocabularies: keywords, operators, punctuation and data-type
//! names. Each registry is a `const` table of `Copy` info structs plus a handful of lookup functions
//! (`from_str`, `as_str`, `info_for`).
//!
//! ## Notes
//! - Metadata is meant for tooling and diagnostics; enforcement of syntax rules lives in the lexer and the
//!   analyzers.

/// Case-insensitive ASCII match of a candidate spelling against a canonical spelling and its aliases.
///
/// ## Examples
/// ```rust
/// use bascule_core::lang::registry::spelling_matches;
///
/// assert!(spelling_matches("integer", "Integer", &[]));
/// assert!(spelling_matches("ELSEIF", "ElseIf", &[]));
/// assert!(!spelling_matches("Int", "Integer", &[]));
/// ```
pub fn spelling_matches(candidate: &str, canonical: &str, aliases: &[&str]) -> bool {
    candidate.eq_ignore_ascii_case(canonical) || aliases.iter().any(|a| a.eq_ignore_ascii_case(candidate))
}
