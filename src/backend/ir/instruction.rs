//! Instruction model of the target stack machine.
//!
//! Instructions are fully resolved when they are created: variable operands carry their identifier and
//! constants carry their value, so later changes to the symbol table (temporary reuse, frame pops) never alter
//! code that was already emitted.

use std::fmt;

use bascule_core::lang::types::DataType;

/// Operation codes understood by the virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Frames and calls
    Move,
    CreateFrame,
    PushFrame,
    PopFrame,
    DefVar,
    Call,
    Return,
    // Data stack
    PushS,
    PopS,
    // Arithmetic, relational, boolean
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Eq,
    And,
    Or,
    Not,
    // Conversions
    Int2Float,
    Float2Int,
    Float2R2EInt,
    Int2Char,
    StrI2Int,
    // Strings
    Concat,
    StrLen,
    GetChar,
    // I/O
    Read,
    Write,
    // Control flow
    Label,
    Jump,
    JumpIfEq,
    JumpIfNeq,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Move => "MOVE",
            Opcode::CreateFrame => "CREATEFRAME",
            Opcode::PushFrame => "PUSHFRAME",
            Opcode::PopFrame => "POPFRAME",
            Opcode::DefVar => "DEFVAR",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::PushS => "PUSHS",
            Opcode::PopS => "POPS",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Eq => "EQ",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::Int2Float => "INT2FLOAT",
            Opcode::Float2Int => "FLOAT2INT",
            Opcode::Float2R2EInt => "FLOAT2R2EINT",
            Opcode::Int2Char => "INT2CHAR",
            Opcode::StrI2Int => "STRI2INT",
            Opcode::Concat => "CONCAT",
            Opcode::StrLen => "STRLEN",
            Opcode::GetChar => "GETCHAR",
            Opcode::Read => "READ",
            Opcode::Write => "WRITE",
            Opcode::Label => "LABEL",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfEq => "JUMPIFEQ",
            Opcode::JumpIfNeq => "JUMPIFNEQ",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A literal operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// IR-escaped text.
    Str(String),
}

impl Constant {
    pub fn data_type(&self) -> DataType {
        match self {
            Constant::Int(_) => DataType::Int,
            Constant::Float(_) => DataType::Float,
            Constant::Bool(_) => DataType::Bool,
            Constant::Str(_) => DataType::Str,
        }
    }

    /// Zero value of a type (`Unspecified` has none).
    pub fn zero(data_type: DataType) -> Option<Constant> {
        match data_type {
            DataType::Int => Some(Constant::Int(0)),
            DataType::Float => Some(Constant::Float(0.0)),
            DataType::Str => Some(Constant::Str(String::new())),
            DataType::Bool => Some(Constant::Bool(false)),
            DataType::Unspecified => None,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@", self.data_type().ir_name())?;
        match self {
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Float(v) => {
                // Folding and the lexer reject non-finite values.
                debug_assert!(v.is_finite(), "non-finite float constant {v}");
                write!(f, "{v:?}")
            }
            Constant::Bool(v) => write!(f, "{v}"),
            Constant::Str(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Var(String),
    Const(Constant),
    Label(String),
    /// Type argument of `READ`.
    Type(DataType),
}

impl Operand {
    pub fn var(name: impl Into<String>) -> Self {
        Operand::Var(name.into())
    }

    pub fn label(name: impl Into<String>) -> Self {
        Operand::Label(name.into())
    }

    pub fn int(value: i64) -> Self {
        Operand::Const(Constant::Int(value))
    }

    pub fn bool(value: bool) -> Self {
        Operand::Const(Constant::Bool(value))
    }

    pub fn string(escaped: impl Into<String>) -> Self {
        Operand::Const(Constant::Str(escaped.into()))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(name) | Operand::Label(name) => f.write_str(name),
            Operand::Const(constant) => write!(f, "{constant}"),
            Operand::Type(data_type) => f.write_str(data_type.ir_name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
}

impl Instruction {
    pub fn new(opcode: Opcode, operands: impl Into<Vec<Operand>>) -> Self {
        Self {
            opcode,
            operands: operands.into(),
        }
    }

    pub fn bare(opcode: Opcode) -> Self {
        Self::new(opcode, Vec::new())
    }

    pub fn label(name: impl Into<String>) -> Self {
        Self::new(Opcode::Label, [Operand::label(name)])
    }

    pub fn jump(target: impl Into<String>) -> Self {
        Self::new(Opcode::Jump, [Operand::label(target)])
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        for operand in &self.operands {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_rendering() {
        assert_eq!(Constant::Int(-4).to_string(), "int@-4");
        assert_eq!(Constant::Float(3.0).to_string(), "float@3.0");
        assert_eq!(Constant::Float(0.25).to_string(), "float@0.25");
        assert_eq!(Constant::Bool(true).to_string(), "bool@true");
        assert_eq!(Constant::Str("a\\032b".into()).to_string(), "string@a\\032b");
        assert_eq!(Constant::Str(String::new()).to_string(), "string@");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "non-finite float constant")]
    fn test_non_finite_float_constant_is_rejected() {
        let _ = Constant::Float(f64::INFINITY).to_string();
    }

    #[test]
    fn test_instruction_rendering() {
        let add = Instruction::new(
            Opcode::Add,
            [Operand::var("$t0"), Operand::int(1), Operand::int(2)],
        );
        assert_eq!(add.to_string(), "ADD $t0 int@1 int@2");
        assert_eq!(Instruction::bare(Opcode::CreateFrame).to_string(), "CREATEFRAME");
        let read = Instruction::new(Opcode::Read, [Operand::var("x"), Operand::Type(DataType::Float)]);
        assert_eq!(read.to_string(), "READ x float");
    }

    #[test]
    fn test_zero_values() {
        assert_eq!(Constant::zero(DataType::Str), Some(Constant::Str(String::new())));
        assert_eq!(Constant::zero(DataType::Unspecified), None);
    }
}
