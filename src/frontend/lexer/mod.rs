//! Lexer for the bascule language
//!
//! The lexer pulls source text one line at a time from a [`BufRead`] into a single growable buffer and hands
//! out one [`Token`] per call to [`Lexer::next_token`].
//!
//! ## Module Structure
//!
//! - `tokens` - Token types (TokenKind, Token, Span)
//! - `strings` - String literal scanning and escape normalization
//! - `numbers` - Numeric literal scanning
//!
//! ## Notes
//! - Identifiers and keywords are case-insensitive; identifier text is lowercased.
//! - Literals are registered in the symbol table as constants as soon as they are scanned.
//! - Consecutive line ends collapse into one [`TokenKind::Eol`]; input that does not end with a newline still
//!   gets a closing `Eol` before [`TokenKind::Eof`].

mod numbers;
mod strings;
pub mod tokens;

use std::io::BufRead;

pub use tokens::{Span, Token, TokenKind};

use bascule_core::lang::keywords::{self, KeywordId};
use bascule_core::lang::operators::OperatorId;
use bascule_core::lang::punctuation::PunctuationId;
use bascule_core::lang::types;

use crate::frontend::diagnostics::{CompileError, CompileResult};
use crate::frontend::symbols::{SymbolTable, SymbolValue};
use bascule_core::lang::types::DataType;

/// Default growth step of the line buffer, in bytes.
pub const DEFAULT_LINE_CHUNK: usize = 128;

// ============================================================================
// LEXER STATE
// ============================================================================

/// Pull-based lexer over a line-oriented reader.
pub struct Lexer<R> {
    reader: R,
    /// Bytes of the current line, newline included.
    buffer: Vec<u8>,
    cursor: usize,
    /// 1-based number of the line held in `buffer` (0 before the first read).
    line: usize,
    line_chunk: usize,
    previous_was_eol: bool,
    exhausted: bool,
}

impl<R: BufRead> Lexer<R> {
    pub fn new(reader: R) -> Self {
        Self::with_line_chunk(reader, DEFAULT_LINE_CHUNK)
    }

    /// Create a lexer whose line buffer grows in steps of `line_chunk` bytes.
    pub fn with_line_chunk(reader: R, line_chunk: usize) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(line_chunk.max(1)),
            cursor: 0,
            line: 0,
            line_chunk: line_chunk.max(1),
            previous_was_eol: true,
            exhausted: false,
        }
    }

    /// Number of the line currently buffered.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Text of the line currently buffered.
    pub fn current_line_text(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }

    /// Produce the next token.
    ///
    /// ## Errors
    /// - `Lexical` for malformed input; the lexer must not be used afterwards.
    /// - `Internal` if reading the input fails.
    pub fn next_token(&mut self, symbols: &mut SymbolTable) -> CompileResult<Token> {
        loop {
            let Some(c) = self.peek() else {
                if self.read_line()? {
                    continue;
                }
                if !self.previous_was_eol {
                    self.previous_was_eol = true;
                    return Ok(Token::new(TokenKind::Eol, "", self.span_at(self.cursor)));
                }
                return Ok(Token::new(TokenKind::Eof, "", self.span_at(self.cursor)));
            };

            let start = self.cursor;
            match c {
                b'\n' => {
                    self.cursor += 1;
                    if self.previous_was_eol {
                        continue;
                    }
                    self.previous_was_eol = true;
                    return Ok(Token::new(TokenKind::Eol, "", self.span_at(start)));
                }
                _ if c.is_ascii_whitespace() => {
                    self.cursor += 1;
                }
                b'\'' => self.skip_line_comment(),
                b'/' if self.peek_next() == Some(b'\'') => self.skip_block_comment()?,
                _ => {
                    let token = self.scan_token(symbols)?;
                    self.previous_was_eol = false;
                    return Ok(token);
                }
            }
        }
    }

    // ========================================================================
    // Input handling
    // ========================================================================

    /// Replace the buffer with the next input line.
    ///
    /// Returns `false` once the input is exhausted.
    fn read_line(&mut self) -> CompileResult<bool> {
        self.buffer.clear();
        self.cursor = 0;
        if self.exhausted {
            return Ok(false);
        }

        loop {
            let available = self.reader.fill_buf()?;
            if available.is_empty() {
                self.exhausted = true;
                break;
            }
            let (take, complete) = match available.iter().position(|&b| b == b'\n') {
                Some(newline) => (newline + 1, true),
                None => (available.len(), false),
            };

            let needed = self.buffer.len() + take;
            if needed > self.buffer.capacity() {
                let missing = needed - self.buffer.capacity();
                let grown = self.buffer.capacity() + missing.div_ceil(self.line_chunk) * self.line_chunk;
                self.buffer.reserve_exact(grown - self.buffer.len());
            }
            self.buffer.extend_from_slice(&available[..take]);
            self.reader.consume(take);

            if complete {
                break;
            }
        }

        if self.buffer.is_empty() {
            return Ok(false);
        }
        self.line += 1;
        Ok(true)
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn peek(&self) -> Option<u8> {
        self.buffer.get(self.cursor).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.buffer.get(self.cursor + 1).copied()
    }

    fn match_byte(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn span_at(&self, offset: usize) -> Span {
        Span::new(self.line.max(1), offset + 1)
    }

    fn text_from(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.buffer[start..self.cursor]).into_owned()
    }

    fn make_token(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, self.text_from(start), self.span_at(start))
    }

    // ========================================================================
    // Comments
    // ========================================================================

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == b'\n' {
                break;
            }
            self.cursor += 1;
        }
    }

    /// Skip `/' ... '/`, reading further lines as needed.
    fn skip_block_comment(&mut self) -> CompileResult<()> {
        let opened_at = self.span_at(self.cursor);
        self.cursor += 2;
        loop {
            match self.peek() {
                Some(b'\'') if self.peek_next() == Some(b'/') => {
                    self.cursor += 2;
                    return Ok(());
                }
                Some(_) => self.cursor += 1,
                None => {
                    if !self.read_line()? {
                        return Err(CompileError::lexical("unterminated block comment").at(opened_at));
                    }
                }
            }
        }
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self, symbols: &mut SymbolTable) -> CompileResult<Token> {
        let start = self.cursor;
        let Some(c) = self.peek() else {
            return Err(CompileError::internal("scan_token called at end of line").at(self.span_at(start)));
        };
        self.cursor += 1;

        let token = match c {
            b'+' => self.operator(start, OperatorId::Plus, OperatorId::PlusEq),
            b'-' => self.operator(start, OperatorId::Minus, OperatorId::MinusEq),
            b'*' => self.operator(start, OperatorId::Star, OperatorId::StarEq),
            b'/' => self.operator(start, OperatorId::Slash, OperatorId::SlashEq),
            b'\\' => self.operator(start, OperatorId::Backslash, OperatorId::BackslashEq),
            b'=' => self.make_token(TokenKind::Operator(OperatorId::Eq), start),
            b'<' => {
                let id = if self.match_byte(b'=') {
                    OperatorId::LtEq
                } else if self.match_byte(b'>') {
                    OperatorId::NotEq
                } else {
                    OperatorId::Lt
                };
                self.make_token(TokenKind::Operator(id), start)
            }
            b'>' => {
                let id = if self.match_byte(b'=') {
                    OperatorId::GtEq
                } else {
                    OperatorId::Gt
                };
                self.make_token(TokenKind::Operator(id), start)
            }
            b'(' => self.make_token(TokenKind::Punctuation(PunctuationId::LParen), start),
            b')' => self.make_token(TokenKind::Punctuation(PunctuationId::RParen), start),
            b',' => self.make_token(TokenKind::Punctuation(PunctuationId::Comma), start),
            b';' => self.make_token(TokenKind::Punctuation(PunctuationId::Semicolon), start),
            b'!' if self.peek() == Some(b'"') => {
                self.cursor += 1;
                self.scan_string(start, symbols)?
            }
            b'0'..=b'9' => self.scan_number(start, symbols)?,
            _ if is_ident_start(c) => self.scan_identifier(start, symbols)?,
            _ => {
                return Err(CompileError::lexical(format!("unexpected character {}", describe_byte(c)))
                    .at(self.span_at(start)));
            }
        };
        Ok(token)
    }

    /// Single-character operator, or its `=`-suffixed compound form.
    fn operator(&mut self, start: usize, simple: OperatorId, compound: OperatorId) -> Token {
        let id = if self.match_byte(b'=') { compound } else { simple };
        self.make_token(TokenKind::Operator(id), start)
    }

    // ========================================================================
    // Identifier scanning
    // ========================================================================

    fn scan_identifier(&mut self, start: usize, symbols: &mut SymbolTable) -> CompileResult<Token> {
        while self.peek().is_some_and(is_ident_continue) {
            self.cursor += 1;
        }
        if let Some(next) = self.peek() {
            if !is_identifier_follower(next) {
                return Err(CompileError::lexical(format!(
                    "invalid character {} in identifier '{}'",
                    describe_byte(next),
                    self.text_from(start)
                ))
                .at(self.span_at(self.cursor)));
            }
        }

        let text = self.text_from(start).to_ascii_lowercase();
        let span = self.span_at(start);
        let kind = match keywords::from_str(&text) {
            Some(KeywordId::True) | Some(KeywordId::False) => {
                let id = symbols.insert_literal(SymbolValue::Bool(text == "true"));
                return Ok(Token::literal(id, DataType::Bool, text, span));
            }
            Some(KeywordId::And) => TokenKind::Operator(OperatorId::And),
            Some(KeywordId::Or) => TokenKind::Operator(OperatorId::Or),
            Some(KeywordId::Not) => TokenKind::Operator(OperatorId::Not),
            Some(keyword) => TokenKind::Keyword(keyword),
            None => match types::from_str(&text) {
                Some(data_type) => TokenKind::DataType(data_type),
                None => TokenKind::Identifier,
            },
        };
        Ok(Token::new(kind, text, span))
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Characters that may directly follow an identifier.
fn is_identifier_follower(c: u8) -> bool {
    c.is_ascii_whitespace() || b"+-*/\\=<>(),;'".contains(&c)
}

fn describe_byte(c: u8) -> String {
    if c.is_ascii_graphic() {
        format!("'{}'", c as char)
    } else {
        format!("0x{c:02x}")
    }
}

/// Lex a whole source text, `Eof` token included.
///
/// The source is taken as bytes; it does not have to be valid UTF-8.
#[tracing::instrument(skip_all, fields(source_len = source.as_ref().len()))]
pub fn lex<S: AsRef<[u8]> + ?Sized>(source: &S, symbols: &mut SymbolTable) -> CompileResult<Vec<Token>> {
    let mut lexer = Lexer::new(source.as_ref());
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token(symbols)?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
