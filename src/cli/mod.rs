//! CLI module for the bascule compiler
//!
//! ## Usage
//!
//! - `bascule [FILE]` - compile `FILE` (stdin when omitted) and write IR to stdout
//! - `-o/--output FILE` - write IR to a file instead
//! - `--fold coercions|always` - constant folding policy
//! - `--tokens` - dump the token stream instead of compiling (debug)
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//! - `report` - Diagnostic rendering with source context
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits, using the exit code of the error class.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;
pub mod report;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use crate::config::{CompilerOptions, FoldingPolicy};
use crate::version::BASCULE_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(99);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. Compile errors have already been rendered by the
/// diagnostic sink when one of these is built, so their message is empty.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create an internal failure (exit code 99).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// A failure that was already reported; only the exit code is left to deliver.
    pub fn reported(code: i32) -> Self {
        Self::new("", ExitCode(code))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Compile a bascule program to stack-machine IR
#[derive(Parser, Debug)]
#[command(name = "bascule")]
#[command(version = BASCULE_VERSION)]
#[command(about = "Compile a bascule program to stack-machine IR", long_about = None)]
pub struct Cli {
    /// Source file (reads stdin when omitted)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Write IR to this file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// When constant operations are evaluated at compile time
    #[arg(long = "fold", value_enum, default_value_t = FoldingPolicy::Coercions)]
    pub fold: FoldingPolicy,

    // Debug/development flags
    /// Tokenize only (debug)
    #[arg(long = "tokens", conflicts_with = "output")]
    pub tokens: bool,
}

impl Cli {
    pub fn options(&self) -> CompilerOptions {
        CompilerOptions::default().with_folding(self.fold)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code != ExitCode::SUCCESS {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let input = commands::read_input(cli.file.as_deref())?;
    if cli.tokens {
        return commands::dump_tokens(&input);
    }
    commands::compile_input(&input, &cli.options(), cli.output.as_deref())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::try_parse_from(["bascule"]).unwrap();
        assert!(cli.file.is_none());
        assert!(cli.output.is_none());
        assert_eq!(cli.fold, FoldingPolicy::Coercions);
        assert!(!cli.tokens);
    }

    #[test]
    fn test_cli_parse_file_and_output() {
        let cli = Cli::try_parse_from(["bascule", "prog.bas", "-o", "prog.ir"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("prog.bas")));
        assert_eq!(cli.output, Some(PathBuf::from("prog.ir")));
    }

    #[test]
    fn test_cli_parse_fold_policy() {
        let cli = Cli::try_parse_from(["bascule", "--fold", "always"]).unwrap();
        assert_eq!(cli.fold, FoldingPolicy::Always);
        assert_eq!(cli.options().constant_folding, FoldingPolicy::Always);

        assert!(Cli::try_parse_from(["bascule", "--fold", "sometimes"]).is_err());
    }

    #[test]
    fn test_cli_tokens_conflicts_with_output() {
        assert!(Cli::try_parse_from(["bascule", "--tokens", "prog.bas"]).unwrap().tokens);
        assert!(Cli::try_parse_from(["bascule", "--tokens", "-o", "x.ir"]).is_err());
    }
}
