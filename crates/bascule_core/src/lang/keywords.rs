//! Define the reserved keyword vocabulary.
//!
//! This module is the single source of truth for reserved words: a stable identifier ([`KeywordId`]) plus a
//! const metadata table ([`KEYWORDS`]) that records canonical spellings and categories.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-insensitive ASCII**; the language does not distinguish `DIM` from `dim`.
//! - Data-type names (`Integer`, `Double`, ...) are not keywords; see [`crate::lang::types`].
//! - `And`, `Or` and `Not` are reserved words *and* operators. Use [`crate::lang::operators`] for their
//!   precedence.
//!
//! ## Examples
//! ```rust
//! use bascule_core::lang::keywords::{self, KeywordCategory, KeywordId};
//!
//! assert_eq!(keywords::from_str("elseif"), Some(KeywordId::ElseIf));
//! assert_eq!(keywords::category(KeywordId::True), KeywordCategory::Literal);
//! ```

use super::registry::spelling_matches;

/// Stable identifier for every reserved keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    // Declarations
    As,
    Declare,
    Dim,
    Function,
    Scope,
    End,

    // Statements / control flow
    If,
    Then,
    Else,
    ElseIf,
    Do,
    Loop,
    While,
    Until,
    For,
    To,
    Step,
    Next,
    Exit,
    Continue,
    Return,
    Input,
    Print,

    // Word operators
    And,
    Or,
    Not,

    // Literals
    True,
    False,
}

/// High-level grouping for documentation and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    Declaration,
    ControlFlow,
    Statement,
    Operator,
    Literal,
}

/// Metadata for a keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub id: KeywordId,
    pub canonical: &'static str,
    pub category: KeywordCategory,
    pub description: &'static str,
}

/// Registry of all keywords.
pub const KEYWORDS: &[KeywordInfo] = &[
    info(KeywordId::As, "As", KeywordCategory::Declaration, "Introduces a type annotation."),
    info(KeywordId::Declare, "Declare", KeywordCategory::Declaration, "Forward declaration of a function."),
    info(KeywordId::Dim, "Dim", KeywordCategory::Declaration, "Variable declaration."),
    info(KeywordId::Function, "Function", KeywordCategory::Declaration, "Function declaration or definition."),
    info(KeywordId::Scope, "Scope", KeywordCategory::Declaration, "Opens the main body or a nested scope block."),
    info(KeywordId::End, "End", KeywordCategory::Declaration, "Closes a block (`End If`, `End Scope`, ...)."),
    info(KeywordId::If, "If", KeywordCategory::ControlFlow, "Conditional statement."),
    info(KeywordId::Then, "Then", KeywordCategory::ControlFlow, "Terminates an `If`/`ElseIf` condition."),
    info(KeywordId::Else, "Else", KeywordCategory::ControlFlow, "Fallback branch of a conditional."),
    info(KeywordId::ElseIf, "ElseIf", KeywordCategory::ControlFlow, "Chained conditional branch."),
    info(KeywordId::Do, "Do", KeywordCategory::ControlFlow, "Opens a `Do ... Loop` block."),
    info(KeywordId::Loop, "Loop", KeywordCategory::ControlFlow, "Closes a `Do ... Loop` block."),
    info(KeywordId::While, "While", KeywordCategory::ControlFlow, "Loop while the condition holds."),
    info(KeywordId::Until, "Until", KeywordCategory::ControlFlow, "Loop until the condition holds."),
    info(KeywordId::For, "For", KeywordCategory::ControlFlow, "Counted loop."),
    info(KeywordId::To, "To", KeywordCategory::ControlFlow, "Upper bound of a counted loop."),
    info(KeywordId::Step, "Step", KeywordCategory::ControlFlow, "Increment of a counted loop."),
    info(KeywordId::Next, "Next", KeywordCategory::ControlFlow, "Closes a counted loop."),
    info(KeywordId::Exit, "Exit", KeywordCategory::ControlFlow, "Leaves an enclosing loop."),
    info(KeywordId::Continue, "Continue", KeywordCategory::ControlFlow, "Jumps to the next loop iteration."),
    info(KeywordId::Return, "Return", KeywordCategory::Statement, "Returns a value from a function."),
    info(KeywordId::Input, "Input", KeywordCategory::Statement, "Reads a value from standard input."),
    info(KeywordId::Print, "Print", KeywordCategory::Statement, "Writes values to standard output."),
    info(KeywordId::And, "And", KeywordCategory::Operator, "Boolean conjunction."),
    info(KeywordId::Or, "Or", KeywordCategory::Operator, "Boolean disjunction."),
    info(KeywordId::Not, "Not", KeywordCategory::Operator, "Boolean negation."),
    info(KeywordId::True, "True", KeywordCategory::Literal, "Boolean literal."),
    info(KeywordId::False, "False", KeywordCategory::Literal, "Boolean literal."),
];

/// Canonical spelling.
pub fn as_str(id: KeywordId) -> &'static str {
    info_for(id).canonical
}

/// Category of a keyword.
pub fn category(id: KeywordId) -> KeywordCategory {
    info_for(id).category
}

/// Full metadata.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: KeywordId) -> &'static KeywordInfo {
    KEYWORDS.iter().find(|k| k.id == id).expect("keyword info missing")
}

/// Lookup by spelling.
///
/// ## Returns
/// - `Some(KeywordId)` if the spelling matches this registry (ASCII case-insensitive).
/// - `None` otherwise.
pub fn from_str(s: &str) -> Option<KeywordId> {
    KEYWORDS
        .iter()
        .find(|k| spelling_matches(s, k.canonical, &[]))
        .map(|k| k.id)
}

const fn info(
    id: KeywordId,
    canonical: &'static str,
    category: KeywordCategory,
    description: &'static str,
) -> KeywordInfo {
    KeywordInfo {
        id,
        canonical,
        category,
        description,
    }
}
