//! Operator vocabulary.
//!
//! This module defines the canonical operator set (symbol operators like `+` and word operators like `And`)
//! along with precedence, associativity, fixity and the semantic family each operator belongs to.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-insensitive ASCII** (relevant for word operators).
//! - `:=` is the internal spelling of plain assignment. Source text writes `=`; the statement driver decides
//!   from context whether an `=` means assignment or equality.
//! - Precedence is relative: higher binds tighter. The expression analyzer derives its precedence relation
//!   table from these levels.
//!
//! ## Examples
//! ```rust
//! use bascule_core::lang::operators::{self, OperatorFamily, OperatorId};
//!
//! assert_eq!(operators::from_str("<>"), Some(OperatorId::NotEq));
//! assert_eq!(operators::from_str("and"), Some(OperatorId::And));
//! assert!(operators::precedence(OperatorId::Star) > operators::precedence(OperatorId::Plus));
//! assert_eq!(operators::family(OperatorId::BackslashEq), OperatorFamily::Assignment);
//! ```

use super::registry::spelling_matches;

/// Define how operators associate when chained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    /// Chaining is a syntax error.
    None,
}

/// Define whether an operator is infix (binary) or prefix (unary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Infix,
    Prefix,
}

/// Semantic family used by type checking to pick the operand rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorFamily {
    /// `+ - * /`
    Arithmetic,
    /// `\` (integer division)
    IntegerDivision,
    /// `< > <= >= = <>`
    Relational,
    /// `:= += -= *= /= \=`
    Assignment,
    /// `And Or Not`
    Boolean,
}

/// Stable identifier for every operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorId {
    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Backslash,

    // Relational
    Lt,
    Gt,
    LtEq,
    GtEq,
    Eq,
    NotEq,

    // Assignment
    Assign,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    BackslashEq,

    // Word operators
    Not,
    And,
    Or,
}

/// Metadata for an operator.
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    pub id: OperatorId,
    pub spelling: &'static str,
    pub precedence: u8,
    pub associativity: Associativity,
    pub fixity: Fixity,
    pub family: OperatorFamily,
    pub is_keyword_spelling: bool,
}

/// Registry of all operators.
pub const OPERATORS: &[OperatorInfo] = &[
    // Arithmetic
    infix(OperatorId::Plus, "+", 50, OperatorFamily::Arithmetic),
    infix(OperatorId::Minus, "-", 50, OperatorFamily::Arithmetic),
    infix(OperatorId::Star, "*", 70, OperatorFamily::Arithmetic),
    infix(OperatorId::Slash, "/", 70, OperatorFamily::Arithmetic),
    infix(OperatorId::Backslash, "\\", 60, OperatorFamily::IntegerDivision),
    // Relational
    infix(OperatorId::Lt, "<", 40, OperatorFamily::Relational),
    infix(OperatorId::Gt, ">", 40, OperatorFamily::Relational),
    infix(OperatorId::LtEq, "<=", 40, OperatorFamily::Relational),
    infix(OperatorId::GtEq, ">=", 40, OperatorFamily::Relational),
    infix(OperatorId::Eq, "=", 40, OperatorFamily::Relational),
    infix(OperatorId::NotEq, "<>", 40, OperatorFamily::Relational),
    // Assignment
    assignment(OperatorId::Assign, ":="),
    assignment(OperatorId::PlusEq, "+="),
    assignment(OperatorId::MinusEq, "-="),
    assignment(OperatorId::StarEq, "*="),
    assignment(OperatorId::SlashEq, "/="),
    assignment(OperatorId::BackslashEq, "\\="),
    // Word operators
    OperatorInfo {
        id: OperatorId::Not,
        spelling: "Not",
        precedence: 30,
        associativity: Associativity::Left,
        fixity: Fixity::Prefix,
        family: OperatorFamily::Boolean,
        is_keyword_spelling: true,
    },
    word(OperatorId::And, "And", 20),
    word(OperatorId::Or, "Or", 10),
];

/// Canonical spelling.
pub fn as_str(id: OperatorId) -> &'static str {
    info_for(id).spelling
}

/// Precedence level (higher binds tighter).
pub fn precedence(id: OperatorId) -> u8 {
    info_for(id).precedence
}

/// Semantic family.
pub fn family(id: OperatorId) -> OperatorFamily {
    info_for(id).family
}

/// Full metadata.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: OperatorId) -> &'static OperatorInfo {
    OPERATORS.iter().find(|o| o.id == id).expect("operator info missing")
}

/// Lookup by spelling (ASCII case-insensitive).
pub fn from_str(s: &str) -> Option<OperatorId> {
    OPERATORS
        .iter()
        .find(|o| spelling_matches(s, o.spelling, &[]))
        .map(|o| o.id)
}

/// For a compound assignment, the binary operator it applies before storing.
///
/// ## Examples
/// ```rust
/// use bascule_core::lang::operators::{compound_base, OperatorId};
///
/// assert_eq!(compound_base(OperatorId::SlashEq), Some(OperatorId::Slash));
/// assert_eq!(compound_base(OperatorId::Assign), None);
/// ```
pub fn compound_base(id: OperatorId) -> Option<OperatorId> {
    match id {
        OperatorId::PlusEq => Some(OperatorId::Plus),
        OperatorId::MinusEq => Some(OperatorId::Minus),
        OperatorId::StarEq => Some(OperatorId::Star),
        OperatorId::SlashEq => Some(OperatorId::Slash),
        OperatorId::BackslashEq => Some(OperatorId::Backslash),
        _ => None,
    }
}

const fn infix(id: OperatorId, spelling: &'static str, precedence: u8, family: OperatorFamily) -> OperatorInfo {
    OperatorInfo {
        id,
        spelling,
        precedence,
        associativity: Associativity::Left,
        fixity: Fixity::Infix,
        family,
        is_keyword_spelling: false,
    }
}

const fn assignment(id: OperatorId, spelling: &'static str) -> OperatorInfo {
    OperatorInfo {
        id,
        spelling,
        precedence: 0,
        associativity: Associativity::None,
        fixity: Fixity::Infix,
        family: OperatorFamily::Assignment,
        is_keyword_spelling: false,
    }
}

const fn word(id: OperatorId, spelling: &'static str, precedence: u8) -> OperatorInfo {
    OperatorInfo {
        id,
        spelling,
        precedence,
        associativity: Associativity::Left,
        fixity: Fixity::Infix,
        family: OperatorFamily::Boolean,
        is_keyword_spelling: true,
    }
}
