//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::backend::{IrWriter, Program};
use crate::config::CompilerOptions;
use crate::driver;
use crate::frontend::diagnostics::{CompileError, DiagnosticSink};
use crate::frontend::lexer;
use crate::frontend::symbols::SymbolTable;

use super::report::ReportSink;
use super::{CliError, CliResult, ExitCode};

/// Raw source bytes plus the name used when reporting on them.
///
/// The bytes are handed to the lexer untouched; only diagnostics decode them (lossily).
#[derive(Debug)]
pub struct Input {
    pub name: String,
    pub source: Vec<u8>,
}

impl Input {
    /// Source text for diagnostics, with invalid UTF-8 replaced.
    pub fn display_text(&self) -> String {
        String::from_utf8_lossy(&self.source).into_owned()
    }
}

/// Read the program from `path`, or from stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> CliResult<Input> {
    match path {
        Some(path) => {
            let source =
                fs::read(path).map_err(|e| CliError::failure(format!("Error reading {}: {}", path.display(), e)))?;
            Ok(Input {
                name: path.display().to_string(),
                source,
            })
        }
        None => {
            let mut source = Vec::new();
            io::stdin()
                .read_to_end(&mut source)
                .map_err(|e| CliError::failure(format!("Error reading stdin: {}", e)))?;
            Ok(Input {
                name: "<stdin>".to_string(),
                source,
            })
        }
    }
}

/// Compile and write the IR to `output` (stdout when `None`).
pub fn compile_input(input: &Input, options: &CompilerOptions, output: Option<&Path>) -> CliResult<ExitCode> {
    let program = match driver::compile(input.source.as_slice(), options) {
        Ok(program) => program,
        Err(err) => return Err(report_error(input, &err)),
    };

    match output {
        Some(path) => {
            let file = fs::File::create(path)
                .map_err(|e| CliError::failure(format!("Error creating {}: {}", path.display(), e)))?;
            write_program(io::BufWriter::new(file), &program, options)
        }
        None => write_program(io::stdout().lock(), &program, options),
    }
}

fn write_program<W: Write>(out: W, program: &Program, options: &CompilerOptions) -> CliResult<ExitCode> {
    IrWriter::new(out, options.long_string_threshold)
        .write_program(program)
        .map_err(|e| CliError::failure(format!("Error writing IR: {}", e)))?;
    Ok(ExitCode::SUCCESS)
}

/// Print every token with its position (debug).
pub fn dump_tokens(input: &Input) -> CliResult<ExitCode> {
    let mut symbols = SymbolTable::default();
    let tokens = lexer::lex(&input.source, &mut symbols).map_err(|err| report_error(input, &err))?;
    let mut out = io::stdout().lock();
    for token in tokens {
        writeln!(out, "{}:{}\t{}", token.span.line, token.span.column, token.describe())
            .map_err(|e| CliError::failure(format!("Error writing tokens: {}", e)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Render `err` on stderr and turn it into the matching exit code.
fn report_error(input: &Input, err: &CompileError) -> CliError {
    let mut sink = ReportSink::new(input.name.clone(), input.display_text(), io::stderr().lock());
    sink.report(err);
    CliError::reported(err.exit_code())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("bascule-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_non_utf8_comment_compiles() {
        let source_path = scratch_path("latin1.bas");
        let output_path = scratch_path("latin1.ir");
        fs::write(&source_path, b"Scope ' caf\xE9\nPrint 1;\nEnd Scope\n").unwrap();

        let input = read_input(Some(&source_path)).unwrap();
        assert_eq!(input.source.len(), 32);
        assert!(input.display_text().contains('\u{FFFD}'));

        let code = compile_input(&input, &CompilerOptions::default(), Some(&output_path)).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        let ir = fs::read_to_string(&output_path).unwrap();
        assert!(ir.contains("WRITE int@1"));

        let _ = fs::remove_file(source_path);
        let _ = fs::remove_file(output_path);
    }

    #[test]
    fn test_missing_file_is_a_cli_failure() {
        let err = read_input(Some(&scratch_path("does-not-exist.bas"))).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.contains("Error reading"));
    }
}
