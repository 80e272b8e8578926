//! Diagnostic rendering for the terminal.
//!
//! Compile errors are structured records; this module turns one into a `miette` report with the source text
//! attached and the offending column labelled.

use std::io::Write;

use miette::{Diagnostic, NamedSource, SourceSpan};

use crate::frontend::diagnostics::{CompileError, DiagnosticSink};

/// A compile error bound to the source it was found in.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct SourceReport {
    message: String,
    #[source_code]
    source_code: NamedSource<String>,
    #[label("here")]
    span: Option<SourceSpan>,
    #[help]
    help: Option<String>,
}

impl SourceReport {
    pub fn new(name: &str, source: &str, error: &CompileError) -> Self {
        let span = error.position.as_ref().map(|position| {
            let length = error.offending_token.as_ref().map_or(0, String::len);
            let offset = byte_offset(source, position.line, position.column);
            let line_end = source[offset..].find('\n').map_or(source.len(), |i| offset + i);
            SourceSpan::from((offset, length.min(line_end - offset)))
        });
        Self {
            message: error.to_string(),
            source_code: NamedSource::new(name, source.to_string()),
            span,
            help: error
                .offending_token
                .as_ref()
                .filter(|token| !token.is_empty())
                .map(|token| format!("offending token: `{token}`")),
        }
    }
}

/// Byte offset of a 1-based line/column pair, clamped to the source.
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source.split_inclusive('\n').take(line.saturating_sub(1)).map(str::len).sum();
    let line_start = line_start.min(source.len());
    let line_len = source[line_start..].find('\n').unwrap_or(source.len() - line_start);
    let mut offset = line_start + column.saturating_sub(1).min(line_len);
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Sink that renders each error as a graphical report.
pub struct ReportSink<W: Write> {
    name: String,
    source: String,
    out: W,
}

impl<W: Write> ReportSink<W> {
    pub fn new(name: impl Into<String>, source: impl Into<String>, out: W) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DiagnosticSink for ReportSink<W> {
    fn report(&mut self, error: &CompileError) {
        let report = miette::Report::new(SourceReport::new(&self.name, &self.source, error));
        // Nothing sensible is left to do if the terminal itself fails.
        let _ = writeln!(self.out, "{report:?}");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Span;

    #[test]
    fn test_byte_offset_counts_previous_lines() {
        let source = "Scope\n  a = 1\nEnd Scope\n";
        assert_eq!(byte_offset(source, 1, 1), 0);
        assert_eq!(byte_offset(source, 2, 3), 8);
        assert_eq!(byte_offset(source, 2, 99), 13);
        assert_eq!(byte_offset(source, 9, 1), source.len());
    }

    #[test]
    fn test_report_labels_offending_token() {
        let source = "Scope\nDim a As Intger\nEnd Scope\n";
        let mut error = CompileError::syntax("expected a type name").at(Span::new(2, 10));
        error.offending_token = Some("intger".to_string());
        let report = SourceReport::new("prog.bas", source, &error);
        assert_eq!(report.span, Some(SourceSpan::from((15, 6))));
        assert_eq!(report.help.as_deref(), Some("offending token: `intger`"));
    }

    #[test]
    fn test_sink_writes_message() {
        let source = "Scope\nReturn 1\nEnd Scope\n";
        let error = CompileError::syntax("'Return' outside a function").at(Span::new(2, 1));
        let mut sink = ReportSink::new("prog.bas", source, Vec::new());
        sink.report(&error);
        let rendered = String::from_utf8(sink.into_inner()).unwrap();
        assert!(rendered.contains("outside a function"));
    }
}
