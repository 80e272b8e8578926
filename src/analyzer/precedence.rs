//! Operator-precedence relation table.
//!
//! The expression analyzer is an operator-precedence parser: it compares the terminal nearest the top of its
//! stack with the lookahead terminal and shifts (`Less`/`Equal`), reduces (`Greater`) or fails (`Undefined`).
//! The relation is derived once from the operator registry's precedence levels and never changes afterwards.
//!
//! ## Notes
//! - Binary operators are left-associative: equal levels reduce.
//! - Assignments do not chain (`a := b := c` is undefined).
//! - `Not` is a prefix operator: it binds looser than arithmetic and relational operators and tighter than
//!   `And`/`Or`, so `Not a = b` means `Not (a = b)`.
//! - [`Terminal::End`] doubles as the stack bottom marker.

use std::sync::OnceLock;

use bascule_core::lang::operators::{self, OperatorId};

/// Terminal grammar symbols of expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    Plus,
    Minus,
    Mul,
    Div,
    IntDiv,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Eq,
    NotEq,
    LParen,
    RParen,
    /// Identifier or literal.
    Operand,
    /// Identifier bound to a function.
    FuncId,
    Comma,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    IntDivAssign,
    Not,
    And,
    Or,
    /// End of expression, and the stack bottom.
    End,
}

/// Number of terminals.
pub const TERMINAL_COUNT: usize = 26;

impl Terminal {
    /// Every terminal, in index order.
    pub const ALL: [Terminal; TERMINAL_COUNT] = [
        Terminal::Plus,
        Terminal::Minus,
        Terminal::Mul,
        Terminal::Div,
        Terminal::IntDiv,
        Terminal::Lt,
        Terminal::Gt,
        Terminal::LtEq,
        Terminal::GtEq,
        Terminal::Eq,
        Terminal::NotEq,
        Terminal::LParen,
        Terminal::RParen,
        Terminal::Operand,
        Terminal::FuncId,
        Terminal::Comma,
        Terminal::Assign,
        Terminal::AddAssign,
        Terminal::SubAssign,
        Terminal::MulAssign,
        Terminal::DivAssign,
        Terminal::IntDivAssign,
        Terminal::Not,
        Terminal::And,
        Terminal::Or,
        Terminal::End,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_operator(id: OperatorId) -> Terminal {
        match id {
            OperatorId::Plus => Terminal::Plus,
            OperatorId::Minus => Terminal::Minus,
            OperatorId::Star => Terminal::Mul,
            OperatorId::Slash => Terminal::Div,
            OperatorId::Backslash => Terminal::IntDiv,
            OperatorId::Lt => Terminal::Lt,
            OperatorId::Gt => Terminal::Gt,
            OperatorId::LtEq => Terminal::LtEq,
            OperatorId::GtEq => Terminal::GtEq,
            OperatorId::Eq => Terminal::Eq,
            OperatorId::NotEq => Terminal::NotEq,
            OperatorId::Assign => Terminal::Assign,
            OperatorId::PlusEq => Terminal::AddAssign,
            OperatorId::MinusEq => Terminal::SubAssign,
            OperatorId::StarEq => Terminal::MulAssign,
            OperatorId::SlashEq => Terminal::DivAssign,
            OperatorId::BackslashEq => Terminal::IntDivAssign,
            OperatorId::Not => Terminal::Not,
            OperatorId::And => Terminal::And,
            OperatorId::Or => Terminal::Or,
        }
    }

    /// Operator this terminal stands for, if any.
    pub fn operator(self) -> Option<OperatorId> {
        let id = match self {
            Terminal::Plus => OperatorId::Plus,
            Terminal::Minus => OperatorId::Minus,
            Terminal::Mul => OperatorId::Star,
            Terminal::Div => OperatorId::Slash,
            Terminal::IntDiv => OperatorId::Backslash,
            Terminal::Lt => OperatorId::Lt,
            Terminal::Gt => OperatorId::Gt,
            Terminal::LtEq => OperatorId::LtEq,
            Terminal::GtEq => OperatorId::GtEq,
            Terminal::Eq => OperatorId::Eq,
            Terminal::NotEq => OperatorId::NotEq,
            Terminal::Assign => OperatorId::Assign,
            Terminal::AddAssign => OperatorId::PlusEq,
            Terminal::SubAssign => OperatorId::MinusEq,
            Terminal::MulAssign => OperatorId::StarEq,
            Terminal::DivAssign => OperatorId::SlashEq,
            Terminal::IntDivAssign => OperatorId::BackslashEq,
            Terminal::Not => OperatorId::Not,
            Terminal::And => OperatorId::And,
            Terminal::Or => OperatorId::Or,
            Terminal::LParen
            | Terminal::RParen
            | Terminal::Operand
            | Terminal::FuncId
            | Terminal::Comma
            | Terminal::End => return None,
        };
        Some(id)
    }
}

/// Precedence relation between a stack terminal and a lookahead terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Less,
    Equal,
    Greater,
    Undefined,
}

/// Role a terminal plays in the relation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    /// Ends a value: an operand or `)`.
    Value,
    Binary(u8),
    Prefix(u8),
    Assign,
    Open,
    Separator,
    Call,
    End,
}

fn class(terminal: Terminal) -> Class {
    match terminal {
        Terminal::Operand | Terminal::RParen => Class::Value,
        Terminal::LParen => Class::Open,
        Terminal::Comma => Class::Separator,
        Terminal::FuncId => Class::Call,
        Terminal::End => Class::End,
        Terminal::Not => Class::Prefix(operators::precedence(OperatorId::Not)),
        Terminal::Assign
        | Terminal::AddAssign
        | Terminal::SubAssign
        | Terminal::MulAssign
        | Terminal::DivAssign
        | Terminal::IntDivAssign => Class::Assign,
        other => match other.operator() {
            Some(id) => Class::Binary(operators::precedence(id)),
            None => Class::End,
        },
    }
}

fn derive_relation(top: Terminal, lookahead: Terminal) -> Relation {
    use Relation::*;

    let next = class(lookahead);
    // Lookahead that begins an operand.
    let opens_operand = matches!(next, Class::Value | Class::Call | Class::Open | Class::Prefix(_))
        && lookahead != Terminal::RParen;

    match class(top) {
        Class::Value => match next {
            Class::Binary(_) | Class::Assign | Class::Separator | Class::End => Greater,
            Class::Value if lookahead == Terminal::RParen => Greater,
            _ => Undefined,
        },
        Class::Binary(level) | Class::Prefix(level) => match next {
            _ if opens_operand => Less,
            Class::Binary(other) if other > level => Less,
            Class::Binary(_) | Class::Assign | Class::Value | Class::Separator | Class::End => Greater,
            _ => Undefined,
        },
        Class::Assign => match next {
            _ if opens_operand => Less,
            Class::Binary(_) => Less,
            Class::End => Greater,
            _ => Undefined,
        },
        Class::Open | Class::Separator => match next {
            _ if opens_operand => Less,
            Class::Binary(_) => Less,
            Class::Value | Class::Separator => Equal,
            _ => Undefined,
        },
        Class::Call => match next {
            Class::Open => Equal,
            _ => Undefined,
        },
        Class::End => match next {
            _ if opens_operand => Less,
            Class::Binary(_) | Class::Assign => Less,
            _ => Undefined,
        },
    }
}

type Table = [[Relation; TERMINAL_COUNT]; TERMINAL_COUNT];

fn table() -> &'static Table {
    static TABLE: OnceLock<Table> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [[Relation::Undefined; TERMINAL_COUNT]; TERMINAL_COUNT];
        for top in Terminal::ALL {
            for lookahead in Terminal::ALL {
                table[top.index()][lookahead.index()] = derive_relation(top, lookahead);
            }
        }
        table
    })
}

/// Relation between the topmost stack terminal and the lookahead.
pub fn relation(top: Terminal, lookahead: Terminal) -> Relation {
    table()[top.index()][lookahead.index()]
}

/// Index-based lookup; indices outside the terminal range are `Undefined`.
pub fn relation_at(top: usize, lookahead: usize) -> Relation {
    table()
        .get(top)
        .and_then(|row| row.get(lookahead))
        .copied()
        .unwrap_or(Relation::Undefined)
}

#[cfg(test)]
mod tests {
    use super::Relation::*;
    use super::Terminal::*;
    use super::*;

    #[test]
    fn test_all_is_in_index_order() {
        for (i, terminal) in Terminal::ALL.iter().enumerate() {
            assert_eq!(terminal.index(), i);
        }
    }

    #[test]
    fn test_operator_round_trip() {
        for terminal in Terminal::ALL {
            if let Some(op) = terminal.operator() {
                assert_eq!(Terminal::from_operator(op), terminal);
            }
        }
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        assert_eq!(relation(Plus, Mul), Less);
        assert_eq!(relation(Mul, Plus), Greater);
        assert_eq!(relation(Div, IntDiv), Greater);
        assert_eq!(relation(IntDiv, Div), Less);
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(relation(Minus, Minus), Greater);
        assert_eq!(relation(Lt, Eq), Greater);
        assert_eq!(relation(And, And), Greater);
    }

    #[test]
    fn test_boolean_levels() {
        assert_eq!(relation(Or, And), Less);
        assert_eq!(relation(And, Or), Greater);
        assert_eq!(relation(Not, Eq), Less);
        assert_eq!(relation(Not, And), Greater);
        assert_eq!(relation(And, Not), Less);
        assert_eq!(relation(Not, Not), Less);
    }

    #[test]
    fn test_parentheses_and_calls() {
        assert_eq!(relation(LParen, RParen), Equal);
        assert_eq!(relation(LParen, Comma), Equal);
        assert_eq!(relation(Comma, RParen), Equal);
        assert_eq!(relation(FuncId, LParen), Equal);
        assert_eq!(relation(FuncId, Operand), Undefined);
        assert_eq!(relation(RParen, Plus), Greater);
        assert_eq!(relation(Plus, RParen), Greater);
        assert_eq!(relation(LParen, End), Undefined);
        assert_eq!(relation(End, RParen), Undefined);
    }

    #[test]
    fn test_operand_adjacency_is_undefined() {
        assert_eq!(relation(Operand, Operand), Undefined);
        assert_eq!(relation(Operand, LParen), Undefined);
        assert_eq!(relation(RParen, Operand), Undefined);
    }

    #[test]
    fn test_assignment_does_not_chain() {
        assert_eq!(relation(End, Assign), Less);
        assert_eq!(relation(Assign, Operand), Less);
        assert_eq!(relation(Assign, Plus), Less);
        assert_eq!(relation(Assign, Assign), Undefined);
        assert_eq!(relation(Assign, AddAssign), Undefined);
        assert_eq!(relation(Assign, End), Greater);
        assert_eq!(relation(Plus, Assign), Greater);
    }

    #[test]
    fn test_out_of_range_is_undefined() {
        assert_eq!(relation_at(TERMINAL_COUNT, 0), Undefined);
        assert_eq!(relation_at(0, TERMINAL_COUNT + 3), Undefined);
        assert_eq!(relation_at(Plus.index(), Mul.index()), Less);
    }
}
