//! bascule compiler backend
//!
//! The backend owns the stack-machine IR: the instruction model, the emitter that buffers generated code per
//! function, the builtin prelude and the textual writer.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod ir;

pub use ir::{Emitter, IrWriter, Program};
