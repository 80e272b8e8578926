#![forbid(unsafe_code)]
//! bascule: a compiler front end for a small BASIC dialect
//!
//! The pipeline is a single pass. The [`frontend::lexer`] pulls tokens from a line-oriented reader, the
//! [`driver`] parses statements and control flow, and the [`analyzer`] parses each expression with an
//! operator-precedence table while type checking, folding and emitting stack-machine IR through the
//! [`backend`]. The [`frontend::symbols`] table carries scopes, redefinitions and temporaries across all of
//! them.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `backend` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! ## Examples
//! ```rust
//! use bascule::config::CompilerOptions;
//!
//! let ir = bascule::compile_to_string("Scope\nPrint !\"hi\";\nEnd Scope\n", &CompilerOptions::default()).unwrap();
//! assert!(ir.starts_with(".IRcode\n"));
//! assert!(ir.contains("WRITE string@hi\n"));
//! ```

pub mod analyzer;
pub mod backend;
pub mod cli;
pub mod config;
pub mod driver;
pub mod frontend;
pub mod version;

pub use backend::{IrWriter, Program};
pub use config::{CompilerOptions, FoldingPolicy};
pub use frontend::diagnostics::{CompileError, CompileResult, ErrorKind};

/// Compile a program held in memory.
///
/// ## Errors
/// The first lexical, syntax or semantic error in `source`.
pub fn compile_source(source: &str, options: &CompilerOptions) -> CompileResult<Program> {
    driver::compile(source.as_bytes(), options)
}

/// Compile a program held in memory and render its IR text, header included.
pub fn compile_to_string(source: &str, options: &CompilerOptions) -> CompileResult<String> {
    let program = compile_source(source, options)?;
    Ok(backend::ir::render_program(&program, options.long_string_threshold))
}
