//! bascule compiler frontend
//!
//! This module contains the components that turn source text into resolved tokens:
//! - `lexer`: tokenization of source code
//! - `symbols`: scope stack, symbols and temporaries
//! - `diagnostics`: structured error records

pub mod diagnostics;
pub mod lexer;
pub mod symbols;
