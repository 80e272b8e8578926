//! Compiler options.
//!
//! All knobs live in one [`CompilerOptions`] value that is passed explicitly through the pipeline; the CLI
//! builds it from its flags.

use crate::frontend::lexer::DEFAULT_LINE_CHUNK;

/// When binary operations on two constants are evaluated at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FoldingPolicy {
    /// Fold only when type checking had to coerce an operand (`1 + 2.0`, `6 \ 4`, `5 / 2`).
    #[default]
    Coercions,
    /// Fold every operation whose operands are both constants.
    Always,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    pub constant_folding: FoldingPolicy,
    /// Growth step of the lexer's line buffer, in bytes.
    pub line_chunk: usize,
    /// String constants longer than this are written with a raw write.
    pub long_string_threshold: usize,
}

/// Default for [`CompilerOptions::long_string_threshold`].
pub const DEFAULT_LONG_STRING_THRESHOLD: usize = 255;

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            constant_folding: FoldingPolicy::default(),
            line_chunk: DEFAULT_LINE_CHUNK,
            long_string_threshold: DEFAULT_LONG_STRING_THRESHOLD,
        }
    }
}

impl CompilerOptions {
    pub fn with_folding(mut self, policy: FoldingPolicy) -> Self {
        self.constant_folding = policy;
        self
    }
}
