//! Diagnostics and error reporting for bascule
//!
//! Every failure the compiler can hit is a [`CompileError`]: a structured record carrying the error class,
//! a message, the source position and the offending token text. Components return it through
//! [`CompileResult`]; only the CLI boundary turns it into an exit code.
//!
//! ## Notes
//! - Rendering (colors, rulers, labels) is not done here. A [`DiagnosticSink`] receives the record and decides
//!   how to present it.

use crate::frontend::lexer::tokens::{Span, Token};

/// Error class of a [`CompileError`], which also determines the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed token (bad character, unterminated string, bad escape, bad number).
    Lexical,
    /// Token sequence that does not fit the grammar.
    Syntax,
    /// Undefined or redefined names, invalid assignment targets.
    Semantic,
    /// Operand types that cannot be reconciled.
    TypeCompatibility,
    /// Well-typed but invalid values (division by a constant zero).
    OtherSemantic,
    /// Compiler defect or I/O failure.
    Internal,
}

impl ErrorKind {
    /// Process exit code for this error class.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Lexical => 1,
            ErrorKind::Syntax => 2,
            ErrorKind::Semantic => 3,
            ErrorKind::TypeCompatibility => 4,
            ErrorKind::OtherSemantic => 6,
            ErrorKind::Internal => 99,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Lexical => write!(f, "lexical error"),
            ErrorKind::Syntax => write!(f, "syntax error"),
            ErrorKind::Semantic => write!(f, "semantic error"),
            ErrorKind::TypeCompatibility => write!(f, "type error"),
            ErrorKind::OtherSemantic => write!(f, "semantic error"),
            ErrorKind::Internal => write!(f, "internal error"),
        }
    }
}

/// Where an error happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePosition {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column (byte offset within the line plus one).
    pub column: usize,
    /// Text of the offending line, when the reporter still had it.
    pub source_line: Option<String>,
}

/// A compile-time error with location information
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub position: Option<SourcePosition>,
    pub offending_token: Option<String>,
}

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
            offending_token: None,
        }
    }

    pub fn lexical(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lexical, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn semantic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Semantic, message)
    }

    pub fn type_compat(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeCompatibility, message)
    }

    pub fn other_semantic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OtherSemantic, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attach a source position, keeping an existing one.
    pub fn at(mut self, span: Span) -> Self {
        if self.position.is_none() {
            self.position = Some(SourcePosition {
                line: span.line,
                column: span.column,
                source_line: None,
            });
        }
        self
    }

    /// Attach the offending token (its text and position), keeping existing values.
    pub fn with_token(mut self, token: &Token) -> Self {
        if self.offending_token.is_none() {
            self.offending_token = Some(token.text.clone());
        }
        self.at(token.span)
    }

    /// Fill in the text of the offending line if the error sits on `line`.
    pub fn with_source_line(mut self, line: usize, text: &str) -> Self {
        if let Some(position) = self.position.as_mut() {
            if position.line == line && position.source_line.is_none() {
                position.source_line = Some(text.trim_end_matches(['\r', '\n']).to_string());
            }
        }
        self
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

impl From<std::io::Error> for CompileError {
    fn from(err: std::io::Error) -> Self {
        CompileError::internal(format!("I/O failure: {err}"))
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Receiver of structured error records.
pub trait DiagnosticSink {
    fn report(&mut self, error: &CompileError);
}

/// Sink that keeps every record; used by tests and embedders.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub errors: Vec<CompileError>,
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, error: &CompileError) {
        self.errors.push(error.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_taxonomy() {
        assert_eq!(ErrorKind::Lexical.exit_code(), 1);
        assert_eq!(ErrorKind::Syntax.exit_code(), 2);
        assert_eq!(ErrorKind::Semantic.exit_code(), 3);
        assert_eq!(ErrorKind::TypeCompatibility.exit_code(), 4);
        assert_eq!(ErrorKind::OtherSemantic.exit_code(), 6);
        assert_eq!(ErrorKind::Internal.exit_code(), 99);
    }

    #[test]
    fn test_position_is_kept_once_set() {
        let err = CompileError::syntax("boom")
            .at(Span::new(3, 7))
            .at(Span::new(9, 1))
            .with_source_line(3, "  a = = 1\n");
        let position = err.position.unwrap();
        assert_eq!((position.line, position.column), (3, 7));
        assert_eq!(position.source_line.as_deref(), Some("  a = = 1"));
    }

    #[test]
    fn test_source_line_ignored_for_other_lines() {
        let err = CompileError::lexical("bad").at(Span::new(2, 1)).with_source_line(5, "x");
        assert_eq!(err.position.unwrap().source_line, None);
    }

    #[test]
    fn test_display_includes_kind() {
        let err = CompileError::type_compat("cannot add String and Integer");
        assert_eq!(err.to_string(), "type error: cannot add String and Integer");
    }

    #[test]
    fn test_collecting_sink() {
        let mut sink = CollectingSink::default();
        sink.report(&CompileError::internal("x"));
        assert_eq!(sink.errors.len(), 1);
    }
}
