//! Token types for the bascule lexer

use bascule_core::lang::keywords::{self, KeywordId};
use bascule_core::lang::operators::{self, OperatorId};
use bascule_core::lang::punctuation::{self, PunctuationId};
use bascule_core::lang::types::DataType;

use crate::frontend::symbols::SymbolId;

/// Position of the first character of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ============================================================================
// TOKEN TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// User identifier (lowercased). Resolution happens at the use site.
    Identifier,
    /// Numeric, string or boolean literal; the attached symbol is a constant.
    Literal,
    Keyword(KeywordId),
    /// Data-type name (`Integer`, `Double`, `String`, `Boolean`).
    DataType(DataType),
    Operator(OperatorId),
    Punctuation(PunctuationId),
    Eol,
    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Literal => write!(f, "literal"),
            TokenKind::Keyword(id) => write!(f, "'{}'", keywords::as_str(*id)),
            TokenKind::DataType(ty) => write!(f, "'{ty}'"),
            TokenKind::Operator(id) => write!(f, "'{}'", operators::as_str(*id)),
            TokenKind::Punctuation(id) => write!(f, "'{}'", punctuation::as_str(*id)),
            TokenKind::Eol => write!(f, "end of line"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// A lexical unit.
///
/// Literal tokens carry the constant symbol the lexer registered for them. The expression analyzer produces
/// new tokens (pointing at temporaries) instead of mutating the symbols of existing ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub symbol: Option<SymbolId>,
    pub literal_type: Option<DataType>,
    /// Source text (lowercased for identifiers and keywords).
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            symbol: None,
            literal_type: None,
            text: text.into(),
            span,
        }
    }

    pub fn literal(symbol: SymbolId, data_type: DataType, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind: TokenKind::Literal,
            symbol: Some(symbol),
            literal_type: Some(data_type),
            text: text.into(),
            span,
        }
    }

    /// Token standing for an already resolved symbol (variables, temporaries, conversion results).
    pub fn for_symbol(symbol: SymbolId, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind: TokenKind::Identifier,
            symbol: Some(symbol),
            literal_type: None,
            text: text.into(),
            span,
        }
    }

    pub fn is_keyword(&self, id: KeywordId) -> bool {
        self.kind == TokenKind::Keyword(id)
    }

    pub fn is_operator(&self, id: OperatorId) -> bool {
        self.kind == TokenKind::Operator(id)
    }

    pub fn is_punctuation(&self, id: PunctuationId) -> bool {
        self.kind == TokenKind::Punctuation(id)
    }

    /// How the token is named in diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Identifier => format!("identifier '{}'", self.text),
            TokenKind::Literal => format!("literal {}", self.text),
            _ => self.kind.to_string(),
        }
    }
}
