//! Builtin functions.
//!
//! Builtins are ordinary functions bound in the global frame; their bodies are written directly in IR and
//! only assembled into a program that calls them. Strings are 1-based at the source level.
//!
//! | Builtin                | Result                                                           |
//! |------------------------|------------------------------------------------------------------|
//! | `Length(s)`            | number of characters in `s`                                      |
//! | `SubStr(s, i, n)`      | `n` characters from position `i` (all remaining if `n` is negative or too large), `""` if `i` is out of range |
//! | `Asc(s, i)`            | character code at position `i`, `0` if out of range              |
//! | `Chr(i)`               | one-character string with code `i`                               |

use bascule_core::lang::types::DataType;

use super::instruction::{Instruction, Opcode, Operand};
use crate::frontend::symbols::{ArgumentList, FunctionMeta, Symbol, SymbolTable};

/// A builtin function.
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    /// Source name (lowercase).
    pub name: &'static str,
    pub label: &'static str,
    pub parameters: &'static [(&'static str, DataType)],
    pub return_type: DataType,
    pub body: fn() -> Vec<Instruction>,
}

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "length",
        label: "$length",
        parameters: &[("s", DataType::Str)],
        return_type: DataType::Int,
        body: length_body,
    },
    Builtin {
        name: "substr",
        label: "$substr",
        parameters: &[("s", DataType::Str), ("i", DataType::Int), ("n", DataType::Int)],
        return_type: DataType::Str,
        body: substr_body,
    },
    Builtin {
        name: "asc",
        label: "$asc",
        parameters: &[("s", DataType::Str), ("i", DataType::Int)],
        return_type: DataType::Int,
        body: asc_body,
    },
    Builtin {
        name: "chr",
        label: "$chr",
        parameters: &[("i", DataType::Int)],
        return_type: DataType::Str,
        body: chr_body,
    },
];

/// Bind every builtin as a defined function in the global frame.
pub fn register_builtins(symbols: &mut SymbolTable) {
    for builtin in BUILTINS {
        let mut arguments = ArgumentList::new();
        for (name, data_type) in builtin.parameters {
            arguments.push(*name, *data_type);
        }
        let meta = FunctionMeta {
            label: builtin.label.to_string(),
            return_type: builtin.return_type,
            is_defined: true,
            arguments,
        };
        symbols.insert_global(Symbol::function(builtin.name, meta));
    }
}

// ============================================================================
// Bodies
// ============================================================================

fn op(opcode: Opcode, operands: impl Into<Vec<Operand>>) -> Instruction {
    Instruction::new(opcode, operands)
}

fn var(name: &str) -> Operand {
    Operand::var(name)
}

fn defvars(names: &[&str]) -> impl Iterator<Item = Instruction> {
    names.iter().map(|name| op(Opcode::DefVar, [var(name)]))
}

/// Jump to `target` when `$cond` holds.
fn jump_if_cond(target: &str) -> Instruction {
    op(
        Opcode::JumpIfEq,
        [Operand::label(target), var("$cond"), Operand::bool(true)],
    )
}

fn epilogue() -> [Instruction; 2] {
    [op(Opcode::PushS, [var("$ret")]), Instruction::bare(Opcode::Return)]
}

fn length_body() -> Vec<Instruction> {
    let mut body = vec![Instruction::label("$length")];
    body.extend(defvars(&["$ret"]));
    body.push(op(Opcode::StrLen, [var("$ret"), var("s")]));
    body.extend(epilogue());
    body
}

fn substr_body() -> Vec<Instruction> {
    let mut body = vec![Instruction::label("$substr")];
    body.extend(defvars(&["$ret", "$len", "$cond", "$max", "$pos", "$char"]));
    body.extend([
        op(Opcode::Move, [var("$ret"), Operand::string("")]),
        op(Opcode::StrLen, [var("$len"), var("s")]),
        op(Opcode::Lt, [var("$cond"), var("i"), Operand::int(1)]),
        jump_if_cond("$substr$done"),
        op(Opcode::Gt, [var("$cond"), var("i"), var("$len")]),
        jump_if_cond("$substr$done"),
        op(Opcode::Sub, [var("$max"), var("$len"), var("i")]),
        op(Opcode::Add, [var("$max"), var("$max"), Operand::int(1)]),
        op(Opcode::Lt, [var("$cond"), var("n"), Operand::int(0)]),
        jump_if_cond("$substr$copy"),
        op(Opcode::Gt, [var("$cond"), var("n"), var("$max")]),
        jump_if_cond("$substr$copy"),
        op(Opcode::Move, [var("$max"), var("n")]),
        Instruction::label("$substr$copy"),
        op(Opcode::Sub, [var("$pos"), var("i"), Operand::int(1)]),
        Instruction::label("$substr$loop"),
        op(
            Opcode::JumpIfEq,
            [Operand::label("$substr$done"), var("$max"), Operand::int(0)],
        ),
        op(Opcode::GetChar, [var("$char"), var("s"), var("$pos")]),
        op(Opcode::Concat, [var("$ret"), var("$ret"), var("$char")]),
        op(Opcode::Add, [var("$pos"), var("$pos"), Operand::int(1)]),
        op(Opcode::Sub, [var("$max"), var("$max"), Operand::int(1)]),
        Instruction::jump("$substr$loop"),
        Instruction::label("$substr$done"),
    ]);
    body.extend(epilogue());
    body
}

fn asc_body() -> Vec<Instruction> {
    let mut body = vec![Instruction::label("$asc")];
    body.extend(defvars(&["$ret", "$len", "$cond", "$pos"]));
    body.extend([
        op(Opcode::Move, [var("$ret"), Operand::int(0)]),
        op(Opcode::StrLen, [var("$len"), var("s")]),
        op(Opcode::Lt, [var("$cond"), var("i"), Operand::int(1)]),
        jump_if_cond("$asc$done"),
        op(Opcode::Gt, [var("$cond"), var("i"), var("$len")]),
        jump_if_cond("$asc$done"),
        op(Opcode::Sub, [var("$pos"), var("i"), Operand::int(1)]),
        op(Opcode::StrI2Int, [var("$ret"), var("s"), var("$pos")]),
        Instruction::label("$asc$done"),
    ]);
    body.extend(epilogue());
    body
}

fn chr_body() -> Vec<Instruction> {
    let mut body = vec![Instruction::label("$chr")];
    body.extend(defvars(&["$ret"]));
    body.push(op(Opcode::Int2Char, [var("$ret"), var("i")]));
    body.extend(epilogue());
    body
}
