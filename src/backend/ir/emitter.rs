//! Instruction emitter with per-function buffering.
//!
//! Code is generated into *sections*, one per function plus one for the main scope. While a section is open
//! its body is buffered and every local variable it needs is recorded once; when the program is assembled the
//! `DEFVAR`s are hoisted to the top of each section, so variables declared inside loops are never re-declared
//! at run time.
//!
//! ## Program layout
//!
//! ```text
//! JUMP $main
//! <user functions>            LABEL f / DEFVARs / body
//! <builtins that were called>
//! LABEL $main
//! CREATEFRAME
//! PUSHFRAME
//! <DEFVARs of the main scope>
//! <main body>
//! POPFRAME
//! ```

use std::collections::{BTreeSet, HashSet};

use super::instruction::{Instruction, Opcode, Operand};
use super::prelude;

/// Label of the main scope section.
pub const MAIN_LABEL: &str = "$main";

#[derive(Debug)]
struct Section {
    label: String,
    declarations: Vec<String>,
    declared: HashSet<String>,
    body: Vec<Instruction>,
}

impl Section {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            declarations: Vec::new(),
            declared: HashSet::new(),
            body: Vec::new(),
        }
    }
}

/// An assembled program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

#[derive(Debug)]
pub struct Emitter {
    current: Section,
    suspended: Vec<Section>,
    functions: Vec<Section>,
    main: Option<Section>,
    called: BTreeSet<String>,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            current: Section::new(MAIN_LABEL),
            suspended: Vec::new(),
            functions: Vec::new(),
            main: None,
            called: BTreeSet::new(),
        }
    }

    /// Open a section. `parameters` are declared by the caller and must not be re-declared.
    pub fn begin_section<I, S>(&mut self, label: impl Into<String>, parameters: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut section = Section::new(label);
        section.declared.extend(parameters.into_iter().map(Into::into));
        let previous = std::mem::replace(&mut self.current, section);
        self.suspended.push(previous);
    }

    /// Close the open section and return to the one it interrupted.
    pub fn end_section(&mut self) {
        let restored = self.suspended.pop().unwrap_or_else(|| Section::new(MAIN_LABEL));
        let finished = std::mem::replace(&mut self.current, restored);
        tracing::debug!(
            label = %finished.label,
            locals = finished.declarations.len(),
            instructions = finished.body.len(),
            "section finished"
        );
        if finished.label == MAIN_LABEL {
            self.main = Some(finished);
        } else {
            self.functions.push(finished);
        }
    }

    /// Label of the open section.
    pub fn section_label(&self) -> &str {
        &self.current.label
    }

    /// Record that the open section needs a local variable.
    pub fn declare_local(&mut self, name: &str) {
        if self.current.declared.insert(name.to_string()) {
            self.current.declarations.push(name.to_string());
        }
    }

    pub fn emit(&mut self, instruction: Instruction) {
        tracing::trace!(%instruction, "emit");
        self.current.body.push(instruction);
    }

    pub fn emit_op(&mut self, opcode: Opcode, operands: impl Into<Vec<Operand>>) {
        self.emit(Instruction::new(opcode, operands));
    }

    /// Remember a call target; builtins are only assembled into the program when called.
    pub fn note_call(&mut self, label: &str) {
        self.called.insert(label.to_string());
    }

    /// Instructions buffered in the open section (body only).
    pub fn current_body(&self) -> &[Instruction] {
        &self.current.body
    }

    /// Locals recorded for the open section.
    pub fn current_declarations(&self) -> &[String] {
        &self.current.declarations
    }

    /// Assemble the program.
    pub fn finish(self) -> Program {
        let Emitter {
            current,
            functions,
            main,
            called,
            ..
        } = self;
        let main = main.unwrap_or(current);

        let mut instructions = vec![Instruction::jump(MAIN_LABEL)];
        for section in functions {
            instructions.push(Instruction::label(section.label));
            push_declarations(&mut instructions, section.declarations);
            instructions.extend(section.body);
        }
        for builtin in prelude::BUILTINS {
            if called.contains(builtin.label) {
                instructions.extend((builtin.body)());
            }
        }
        instructions.push(Instruction::label(MAIN_LABEL));
        instructions.push(Instruction::bare(Opcode::CreateFrame));
        instructions.push(Instruction::bare(Opcode::PushFrame));
        push_declarations(&mut instructions, main.declarations);
        instructions.extend(main.body);
        instructions.push(Instruction::bare(Opcode::PopFrame));

        Program { instructions }
    }
}

fn push_declarations(instructions: &mut Vec<Instruction>, declarations: Vec<String>) {
    instructions.extend(
        declarations
            .into_iter()
            .map(|name| Instruction::new(Opcode::DefVar, [Operand::Var(name)])),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(program: &Program) -> Vec<String> {
        program.instructions.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_empty_program_layout() {
        let program = Emitter::new().finish();
        assert_eq!(
            render(&program),
            vec!["JUMP $main", "LABEL $main", "CREATEFRAME", "PUSHFRAME", "POPFRAME"]
        );
    }

    #[test]
    fn test_declarations_are_hoisted_and_deduplicated() {
        let mut emitter = Emitter::new();
        emitter.begin_section(MAIN_LABEL, Vec::<String>::new());
        emitter.declare_local("a");
        emitter.emit_op(Opcode::Move, [Operand::var("a"), Operand::int(1)]);
        emitter.declare_local("a");
        emitter.declare_local("b");
        emitter.emit_op(Opcode::Move, [Operand::var("b"), Operand::var("a")]);
        emitter.end_section();

        assert_eq!(
            render(&emitter.finish()),
            vec![
                "JUMP $main",
                "LABEL $main",
                "CREATEFRAME",
                "PUSHFRAME",
                "DEFVAR a",
                "DEFVAR b",
                "MOVE a int@1",
                "MOVE b a",
                "POPFRAME"
            ]
        );
    }

    #[test]
    fn test_function_sections_precede_main_and_skip_parameters() {
        let mut emitter = Emitter::new();
        emitter.begin_section("f", ["p"]);
        emitter.declare_local("p");
        emitter.declare_local("r");
        emitter.emit_op(Opcode::PushS, [Operand::var("p")]);
        emitter.emit(Instruction::bare(Opcode::Return));
        emitter.end_section();

        emitter.begin_section(MAIN_LABEL, Vec::<String>::new());
        assert_eq!(emitter.section_label(), MAIN_LABEL);
        emitter.end_section();

        assert_eq!(
            render(&emitter.finish()),
            vec![
                "JUMP $main",
                "LABEL f",
                "DEFVAR r",
                "PUSHS p",
                "RETURN",
                "LABEL $main",
                "CREATEFRAME",
                "PUSHFRAME",
                "POPFRAME"
            ]
        );
    }

    #[test]
    fn test_only_called_builtins_are_assembled() {
        let mut emitter = Emitter::new();
        emitter.note_call("$chr");
        let rendered = render(&emitter.finish());
        assert!(rendered.contains(&"LABEL $chr".to_string()));
        assert!(!rendered.contains(&"LABEL $length".to_string()));
    }
}
