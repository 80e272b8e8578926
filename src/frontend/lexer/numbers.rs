//! Number scanning for the bascule lexer
//!
//! Handles integer (`42`) and floating-point (`1.5`, `2e10`, `3.0E-2`) literals.

use std::io::BufRead;

use bascule_core::lang::types::DataType;

use super::Lexer;
use super::tokens::Token;
use crate::frontend::diagnostics::{CompileError, CompileResult};
use crate::frontend::symbols::{SymbolTable, SymbolValue};

impl<R: BufRead> Lexer<R> {
    /// Scan a numeric literal whose first digit sits at `start` (already consumed).
    pub(super) fn scan_number(&mut self, start: usize, symbols: &mut SymbolTable) -> CompileResult<Token> {
        let span = self.span_at(start);
        let mut is_float = false;

        self.eat_digits();

        // Decimal part
        if self.match_byte(b'.') {
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(CompileError::lexical("expected a digit after the decimal point")
                    .at(self.span_at(self.cursor)));
            }
            self.eat_digits();
            is_float = true;
        }

        // Exponent part
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.cursor += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.cursor += 1;
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(CompileError::lexical("expected a digit in the exponent").at(self.span_at(self.cursor)));
            }
            self.eat_digits();
            is_float = true;
        }

        if let Some(next) = self.peek() {
            if next.is_ascii_alphanumeric() || next == b'_' || next == b'.' {
                return Err(CompileError::lexical(format!(
                    "malformed numeric literal '{}{}'",
                    self.text_from(start),
                    next as char
                ))
                .at(span));
            }
        }

        let text = self.text_from(start);
        if is_float {
            let value = text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| CompileError::lexical(format!("float literal '{text}' is out of range")).at(span))?;
            let id = symbols.insert_literal(SymbolValue::Float(value));
            Ok(Token::literal(id, DataType::Float, text, span))
        } else {
            let value = text
                .parse::<i64>()
                .map_err(|_| CompileError::lexical(format!("integer literal '{text}' is out of range")).at(span))?;
            let id = symbols.insert_literal(SymbolValue::Int(value));
            Ok(Token::literal(id, DataType::Int, text, span))
        }
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.cursor += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::diagnostics::ErrorKind;
    use crate::frontend::lexer::{TokenKind, lex};
    use crate::frontend::symbols::{SymbolTable, SymbolValue};

    fn literal(source: &str) -> SymbolValue {
        let mut symbols = SymbolTable::default();
        let tokens = lex(source, &mut symbols).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Literal);
        symbols.get(tokens[0].symbol.unwrap()).unwrap().value.clone().unwrap()
    }

    fn error_kind(source: &str) -> ErrorKind {
        let mut symbols = SymbolTable::default();
        lex(source, &mut symbols).unwrap_err().kind
    }

    #[test]
    fn test_integer_literal() {
        assert_eq!(literal("42"), SymbolValue::Int(42));
        assert_eq!(literal("007"), SymbolValue::Int(7));
    }

    #[test]
    fn test_float_literals() {
        assert_eq!(literal("1.5"), SymbolValue::Float(1.5));
        assert_eq!(literal("2e3"), SymbolValue::Float(2000.0));
        assert_eq!(literal("2.5E-1"), SymbolValue::Float(0.25));
        assert_eq!(literal("1e+2"), SymbolValue::Float(100.0));
    }

    #[test]
    fn test_malformed_numbers() {
        assert_eq!(error_kind("1."), ErrorKind::Lexical);
        assert_eq!(error_kind("1.e5"), ErrorKind::Lexical);
        assert_eq!(error_kind("1e"), ErrorKind::Lexical);
        assert_eq!(error_kind("1e+"), ErrorKind::Lexical);
        assert_eq!(error_kind("12abc"), ErrorKind::Lexical);
        assert_eq!(error_kind("1.2.3"), ErrorKind::Lexical);
    }

    #[test]
    fn test_integer_overflow() {
        assert_eq!(literal("9223372036854775807"), SymbolValue::Int(i64::MAX));
        assert_eq!(error_kind("9223372036854775808"), ErrorKind::Lexical);
    }

    #[test]
    fn test_each_literal_gets_its_own_constant() {
        let mut symbols = SymbolTable::default();
        let tokens = lex("1 1", &mut symbols).unwrap();
        assert_ne!(tokens[0].symbol, tokens[1].symbol);
    }
}
