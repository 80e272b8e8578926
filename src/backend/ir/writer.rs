//! Textual IR output.
//!
//! One instruction per line, operands separated by single spaces, preceded by the `.IRcode` header. String
//! constants longer than the configured threshold are copied to the sink with a length-prefixed raw write
//! instead of going through the formatter.

use std::io::{self, Write};

use super::emitter::Program;
use super::instruction::{Constant, Instruction, Operand};

/// First line of every IR program.
pub const IR_HEADER: &str = ".IRcode";

pub struct IrWriter<W: Write> {
    out: W,
    long_string_threshold: usize,
}

impl<W: Write> IrWriter<W> {
    pub fn new(out: W, long_string_threshold: usize) -> Self {
        Self {
            out,
            long_string_threshold,
        }
    }

    #[tracing::instrument(skip_all, fields(instructions = program.instructions.len()))]
    pub fn write_program(&mut self, program: &Program) -> io::Result<()> {
        writeln!(self.out, "{IR_HEADER}")?;
        for instruction in &program.instructions {
            self.write_instruction(instruction)?;
        }
        self.out.flush()
    }

    pub fn write_instruction(&mut self, instruction: &Instruction) -> io::Result<()> {
        write!(self.out, "{}", instruction.opcode)?;
        for operand in &instruction.operands {
            match operand {
                Operand::Const(Constant::Str(text)) if text.len() > self.long_string_threshold => {
                    self.out.write_all(b" string@")?;
                    self.out.write_all(text.as_bytes())?;
                }
                _ => write!(self.out, " {operand}")?,
            }
        }
        writeln!(self.out)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Render a program to a string.
pub fn render_program(program: &Program, long_string_threshold: usize) -> String {
    let mut writer = IrWriter::new(Vec::new(), long_string_threshold);
    // Writing into a Vec cannot fail.
    let _ = writer.write_program(program);
    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ir::instruction::Opcode;

    #[test]
    fn test_header_and_lines() {
        let program = Program {
            instructions: vec![
                Instruction::jump("$main"),
                Instruction::new(Opcode::Write, [Operand::string("hi")]),
            ],
        };
        assert_eq!(render_program(&program, 255), ".IRcode\nJUMP $main\nWRITE string@hi\n");
    }

    #[test]
    fn test_long_strings_render_identically() {
        let text = "x".repeat(40);
        let instruction = Instruction::new(Opcode::Move, [Operand::var("s"), Operand::string(text.clone())]);
        let program = Program {
            instructions: vec![instruction],
        };
        let short_path = render_program(&program, 1000);
        let long_path = render_program(&program, 8);
        assert_eq!(short_path, long_path);
        assert!(long_path.ends_with(&format!("MOVE s string@{text}\n")));
    }
}
