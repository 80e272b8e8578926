//! String scanning for the bascule lexer
//!
//! String literals are written `!"..."`. The scanned text is stored in IR-escaped form: the escapes `\n`,
//! `\t`, `\"`, `\\` and `\ddd` (decimal, 001-255) all become three-digit numeric escapes, and raw characters
//! the IR cannot carry verbatim (control characters, space, `#`) are rewritten the same way.

use std::io::BufRead;

use bascule_core::lang::types::DataType;
use bascule_core::strings::{needs_escape, push_code_escape};

use super::Lexer;
use super::tokens::{Span, Token};
use crate::frontend::diagnostics::{CompileError, CompileResult};
use crate::frontend::symbols::{SymbolTable, SymbolValue};

impl<R: BufRead> Lexer<R> {
    /// Scan a string literal; `start` points at the `!` and the opening quote is already consumed.
    pub(super) fn scan_string(&mut self, start: usize, symbols: &mut SymbolTable) -> CompileResult<Token> {
        let span = self.span_at(start);
        let mut value: Vec<u8> = Vec::new();

        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    return Err(CompileError::lexical("unterminated string literal").at(span));
                }
                Some(b'"') => {
                    self.cursor += 1;
                    break;
                }
                Some(b'\\') => {
                    self.cursor += 1;
                    let code = self.scan_escape(span)?;
                    push_escape(&mut value, code);
                }
                Some(c) if needs_escape(c as char) => {
                    self.cursor += 1;
                    push_escape(&mut value, c);
                }
                Some(c) => {
                    self.cursor += 1;
                    value.push(c);
                }
            }
        }

        let text = String::from_utf8(value)
            .map_err(|_| CompileError::lexical("string literal is not valid UTF-8").at(span))?;
        let id = symbols.insert_literal(SymbolValue::Str(text));
        Ok(Token::literal(id, DataType::Str, self.text_from(start), span))
    }

    /// Decode the escape after a backslash into its byte value.
    fn scan_escape(&mut self, literal: Span) -> CompileResult<u8> {
        let at = self.span_at(self.cursor);
        let code = match self.peek() {
            Some(b'n') => b'\n',
            Some(b't') => b'\t',
            Some(b'"') => b'"',
            Some(b'\\') => b'\\',
            Some(c) if c.is_ascii_digit() => {
                let digits = self
                    .buffer
                    .get(self.cursor..self.cursor + 3)
                    .filter(|d| d.iter().all(u8::is_ascii_digit))
                    .ok_or_else(|| CompileError::lexical("numeric escape needs exactly three digits").at(at))?;
                let value = digits
                    .iter()
                    .fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0'));
                if !(1..=255).contains(&value) {
                    return Err(CompileError::lexical(format!("escape value {value} is outside 1-255")).at(at));
                }
                self.cursor += 3;
                return Ok(value as u8);
            }
            Some(b'\n') | None => {
                return Err(CompileError::lexical("unterminated string literal").at(literal));
            }
            Some(c) => {
                return Err(CompileError::lexical(format!("invalid escape sequence '\\{}'", c as char)).at(at));
            }
        };
        self.cursor += 1;
        Ok(code)
    }
}

fn push_escape(value: &mut Vec<u8>, code: u8) {
    let mut escape = String::with_capacity(4);
    push_code_escape(&mut escape, code);
    value.extend_from_slice(escape.as_bytes());
}
