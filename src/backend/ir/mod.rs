//! Stack-machine intermediate representation
//!
//! ## Pipeline
//!
//! ```text
//! analyzer / driver → Emitter (per-function sections) → Program → IrWriter → text
//! ```
//!
//! - `instruction`: opcodes, operands and instructions
//! - `emitter`: section buffering, `DEFVAR` hoisting and program assembly
//! - `prelude`: builtin functions written directly in IR
//! - `writer`: textual output

pub mod emitter;
pub mod instruction;
pub mod prelude;
pub mod writer;

pub use emitter::{Emitter, MAIN_LABEL, Program};
pub use instruction::{Constant, Instruction, Opcode, Operand};
pub use writer::{IR_HEADER, IrWriter, render_program};
