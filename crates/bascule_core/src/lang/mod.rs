//! Language vocabulary registries.
//!
//! This module is the “front door” for language-level vocabulary: reserved keywords, operators,
//! punctuation and data-type names.
//!
//! Callers work with **stable IDs** (e.g. `KeywordId`, `OperatorId`) and look up spellings/metadata via
//! registry tables instead of scattering string comparisons across the compiler.
//!
//! ## Notes
//! - Registries are **pure**: no IO, no side effects.
//! - The language is case-insensitive, so every `from_str` lookup here matches ASCII case-insensitively.
//!
//! ## Examples
//! ```rust
//! use bascule_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("dim"), Some(KeywordId::Dim));
//! assert_eq!(keywords::from_str("DIM"), Some(KeywordId::Dim));
//! assert_eq!(keywords::as_str(KeywordId::Dim), "Dim");
//! ```

pub mod keywords;
pub mod operators;
pub mod punctuation;
pub mod registry;
pub mod types;
