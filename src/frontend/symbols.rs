//! Symbol table and scope management for bascule
//!
//! The table is a stack of frames. Each frame maps identifiers to symbols stored in one index-stable arena,
//! so tokens can refer to symbols by [`SymbolId`] while frames come and go.
//!
//! ## Notes
//! - The bottom frame is the global frame. It holds functions (builtins included) and literal constants, and
//!   is always consulted last by lookups.
//! - Function bodies are *non-transparent*: lookups stop at them (except for the global frame). Blocks, loop
//!   headers and loop bodies are *transparent*.
//! - Temporaries live in the nearest non-transparent frame and are pooled there for reuse.

use std::collections::HashMap;

use bascule_core::lang::types::DataType;

/// Unique identifier for symbols
pub type SymbolId = usize;

/// Depth of a frame in the stack (0 is the global frame).
pub type FrameDepth = usize;

// ============================================================================
// Symbols
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Function,
    /// Referenced but never declared.
    Unknown,
}

/// One formal parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub identifier: String,
    pub data_type: DataType,
}

/// Ordered formal parameters of a function.
///
/// Equality is structural over the types only: a definition may rename the parameters of its declaration.
#[derive(Debug, Clone, Default)]
pub struct ArgumentList {
    arguments: Vec<Argument>,
}

impl ArgumentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, identifier: impl Into<String>, data_type: DataType) {
        self.arguments.push(Argument {
            identifier: identifier.into(),
            data_type,
        });
    }

    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.arguments.get(index)
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.arguments.iter().any(|a| a.identifier == identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.arguments.iter()
    }
}

impl PartialEq for ArgumentList {
    fn eq(&self, other: &Self) -> bool {
        self.arguments.len() == other.arguments.len()
            && self
                .arguments
                .iter()
                .zip(&other.arguments)
                .all(|(a, b)| a.data_type == b.data_type)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionMeta {
    /// IR label the function body starts at.
    pub label: String,
    pub return_type: DataType,
    pub is_defined: bool,
    pub arguments: ArgumentList,
}

/// Payload of a symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolValue {
    Int(i64),
    Float(f64),
    /// IR-escaped text.
    Str(String),
    Bool(bool),
    Function(FunctionMeta),
}

/// A symbol in the symbol table
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub identifier: String,
    pub kind: SymbolKind,
    pub data_type: DataType,
    pub value: Option<SymbolValue>,
    pub is_temporary: bool,
}

impl Symbol {
    pub fn variable(identifier: impl Into<String>, data_type: DataType) -> Self {
        Self {
            identifier: identifier.into(),
            kind: SymbolKind::Variable,
            data_type,
            value: None,
            is_temporary: false,
        }
    }

    pub fn constant(identifier: impl Into<String>, value: SymbolValue) -> Self {
        let data_type = match &value {
            SymbolValue::Int(_) => DataType::Int,
            SymbolValue::Float(_) => DataType::Float,
            SymbolValue::Str(_) => DataType::Str,
            SymbolValue::Bool(_) => DataType::Bool,
            SymbolValue::Function(meta) => meta.return_type,
        };
        Self {
            identifier: identifier.into(),
            kind: SymbolKind::Constant,
            data_type,
            value: Some(value),
            is_temporary: false,
        }
    }

    pub fn function(identifier: impl Into<String>, meta: FunctionMeta) -> Self {
        Self {
            identifier: identifier.into(),
            kind: SymbolKind::Function,
            data_type: meta.return_type,
            value: Some(SymbolValue::Function(meta)),
            is_temporary: false,
        }
    }

    pub fn unknown(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            kind: SymbolKind::Unknown,
            data_type: DataType::Unspecified,
            value: None,
            is_temporary: false,
        }
    }

    /// Constant payload, if this is a constant.
    pub fn constant_value(&self) -> Option<&SymbolValue> {
        match self.kind {
            SymbolKind::Constant => self.value.as_ref(),
            _ => None,
        }
    }

    pub fn function_meta(&self) -> Option<&FunctionMeta> {
        match &self.value {
            Some(SymbolValue::Function(meta)) if self.kind == SymbolKind::Function => Some(meta),
            _ => None,
        }
    }

    pub fn function_meta_mut(&mut self) -> Option<&mut FunctionMeta> {
        match &mut self.value {
            Some(SymbolValue::Function(meta)) if self.kind == SymbolKind::Function => Some(meta),
            _ => None,
        }
    }
}

// ============================================================================
// Frames
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    For,
    Do,
}

/// One lexical scope.
#[derive(Debug)]
pub struct Frame {
    pub label: String,
    pub transparent: bool,
    pub loop_kind: Option<LoopKind>,
    symbols: HashMap<String, SymbolId>,
    /// Identifiers shadowed while this frame was active, in order.
    redefinitions: Vec<String>,
    /// Released temporaries available for reuse (only used on non-transparent frames).
    free_temporaries: Vec<SymbolId>,
}

impl Frame {
    fn new(label: impl Into<String>, transparent: bool, loop_kind: Option<LoopKind>) -> Self {
        Self {
            label: label.into(),
            transparent,
            loop_kind,
            symbols: HashMap::new(),
            redefinitions: Vec::new(),
            free_temporaries: Vec::new(),
        }
    }

    /// Cleanup targets of this frame: redefined identifiers, most recent first.
    fn cleanup(&self) -> impl Iterator<Item = &String> {
        self.redefinitions.iter().rev()
    }
}

// ============================================================================
// Symbol table
// ============================================================================

/// Symbol table managing all named entities
///
/// Symbols live in an append-only arena indexed by `SymbolId`. Popping a frame empties its slots but never
/// reuses them, so the arena grows with every scope opened during one compilation. The table is built
/// per compilation and dropped with it.
#[derive(Debug)]
pub struct SymbolTable {
    arena: Vec<Option<Symbol>>,
    frames: Vec<Frame>,
    global_label: String,
    next_temporary: usize,
    next_literal: usize,
}

impl SymbolTable {
    /// Create a table whose global frame is labelled `global_label`.
    pub fn new(global_label: impl Into<String>) -> Self {
        let global_label = global_label.into();
        Self {
            arena: Vec::new(),
            frames: vec![Frame::new(global_label.clone(), false, None)],
            global_label,
            next_temporary: 0,
            next_literal: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Frame stack
    // ------------------------------------------------------------------------

    pub fn push_frame(&mut self, label: impl Into<String>, transparent: bool, loop_kind: Option<LoopKind>) {
        let frame = Frame::new(label, transparent, loop_kind);
        tracing::trace!(label = %frame.label, transparent, depth = self.frames.len(), "push frame");
        self.frames.push(frame);
    }

    /// Destroy the top frame and its symbols.
    ///
    /// ## Returns
    /// The identifiers redefined in the popped frame, most recent first: one cleanup action each.
    ///
    /// ## Notes
    /// - Popping the global frame replaces it with a fresh, empty global frame.
    pub fn pop_frame(&mut self) -> Vec<String> {
        let Some(frame) = self.frames.pop() else {
            self.frames.push(Frame::new(self.global_label.clone(), false, None));
            return Vec::new();
        };
        for &id in frame.symbols.values() {
            if let Some(slot) = self.arena.get_mut(id) {
                *slot = None;
            }
        }
        if self.frames.is_empty() {
            self.frames.push(Frame::new(self.global_label.clone(), false, None));
        }
        let cleanup: Vec<String> = frame.cleanup().cloned().collect();
        tracing::trace!(label = %frame.label, cleanup = cleanup.len(), "pop frame");
        cleanup
    }

    /// Number of frames, the global one included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn top(&self) -> FrameDepth {
        self.frames.len() - 1
    }

    // ------------------------------------------------------------------------
    // Lookup and insertion
    // ------------------------------------------------------------------------

    /// Look up an identifier, honouring frame transparency.
    pub fn find_symbol(&self, identifier: &str) -> Option<SymbolId> {
        self.find_symbol_with_depth(identifier).map(|(_, id)| id)
    }

    /// Like [`Self::find_symbol`], also reporting the depth of the frame that binds the identifier.
    pub fn find_symbol_with_depth(&self, identifier: &str) -> Option<(FrameDepth, SymbolId)> {
        let mut depth = self.top();
        loop {
            if let Some(&id) = self.frames[depth].symbols.get(identifier) {
                return Some((depth, id));
            }
            if depth == 0 || !self.frames[depth].transparent {
                break;
            }
            depth -= 1;
        }
        if depth != 0 {
            if let Some(&id) = self.frames[0].symbols.get(identifier) {
                return Some((0, id));
            }
        }
        None
    }

    /// Look up an identifier; on a miss register an `Unknown` symbol in the top frame.
    pub fn find_or_insert_symbol(&mut self, identifier: &str) -> SymbolId {
        if let Some(id) = self.find_symbol(identifier) {
            return id;
        }
        let depth = self.top();
        self.insert_at(depth, Symbol::unknown(identifier))
    }

    /// Insert into the top frame.
    ///
    /// ## Returns
    /// - `Some(id)` for the new symbol.
    /// - `None` if the top frame already binds the identifier; the caller decides whether that is an error.
    pub fn insert_on_top(&mut self, symbol: Symbol) -> Option<SymbolId> {
        let depth = self.top();
        if self.frames[depth].symbols.contains_key(&symbol.identifier) {
            return None;
        }
        Some(self.insert_at(depth, symbol))
    }

    /// Insert into the global frame; `None` if the identifier is taken there.
    pub fn insert_global(&mut self, symbol: Symbol) -> Option<SymbolId> {
        if self.frames[0].symbols.contains_key(&symbol.identifier) {
            return None;
        }
        Some(self.insert_at(0, symbol))
    }

    /// Register a literal constant under a fresh synthetic identifier in the global frame.
    pub fn insert_literal(&mut self, value: SymbolValue) -> SymbolId {
        let identifier = format!("$lit{}", self.next_literal);
        self.next_literal += 1;
        self.insert_at(0, Symbol::constant(identifier, value))
    }

    fn insert_at(&mut self, depth: FrameDepth, symbol: Symbol) -> SymbolId {
        let id = self.arena.len();
        self.frames[depth].symbols.insert(symbol.identifier.clone(), id);
        self.arena.push(Some(symbol));
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.arena.get(id).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.arena.get_mut(id).and_then(Option::as_mut)
    }

    /// Symbols bound in the global frame, sorted by identifier.
    pub fn global_symbols(&self) -> Vec<&Symbol> {
        let mut symbols: Vec<&Symbol> = self.frames[0]
            .symbols
            .values()
            .filter_map(|&id| self.get(id))
            .collect();
        symbols.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        symbols
    }

    // ------------------------------------------------------------------------
    // Redefinitions
    // ------------------------------------------------------------------------

    /// Record that `identifier` is shadowed in the top frame.
    ///
    /// Returns `false` if it was already redefined at this frame level.
    pub fn push_redefinition(&mut self, identifier: &str) -> bool {
        let depth = self.top();
        let frame = &mut self.frames[depth];
        if frame.redefinitions.iter().any(|r| r == identifier) {
            return false;
        }
        frame.redefinitions.push(identifier.to_string());
        true
    }

    /// Cleanup targets of every frame strictly above `depth`, innermost frame first.
    pub fn cleanup_above(&self, depth: FrameDepth) -> Vec<String> {
        self.frames
            .iter()
            .skip(depth + 1)
            .rev()
            .flat_map(|frame| frame.cleanup())
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------------
    // Label queries
    // ------------------------------------------------------------------------

    /// Depth of the nearest non-transparent frame.
    pub fn active_function_depth(&self) -> FrameDepth {
        (0..self.frames.len())
            .rev()
            .find(|&d| !self.frames[d].transparent)
            .unwrap_or(0)
    }

    /// Label of the nearest non-transparent frame.
    pub fn active_function_label(&self) -> &str {
        &self.frames[self.active_function_depth()].label
    }

    /// Depth of the `n`-th (1-based) enclosing loop frame of `kind`, within the active function.
    pub fn nth_loop_depth(&self, kind: LoopKind, n: usize) -> Option<FrameDepth> {
        if n == 0 {
            return None;
        }
        let function = self.active_function_depth();
        (function + 1..self.frames.len())
            .rev()
            .filter(|&d| self.frames[d].loop_kind == Some(kind))
            .nth(n - 1)
    }

    pub fn nth_for_loop_label(&self, n: usize) -> Option<&str> {
        self.nth_loop_depth(LoopKind::For, n)
            .map(|d| self.frames[d].label.as_str())
    }

    pub fn nth_do_loop_label(&self, n: usize) -> Option<&str> {
        self.nth_loop_depth(LoopKind::Do, n)
            .map(|d| self.frames[d].label.as_str())
    }

    pub fn frame_label(&self, depth: FrameDepth) -> Option<&str> {
        self.frames.get(depth).map(|f| f.label.as_str())
    }

    // ------------------------------------------------------------------------
    // Temporaries
    // ------------------------------------------------------------------------

    /// Hand out a temporary owned by the active function frame.
    ///
    /// A released temporary is reused when one is free; otherwise a new `$t{n}` symbol is registered. The
    /// returned symbol is a variable of [`DataType::Unspecified`] type.
    pub fn get_unique_temporary(&mut self) -> SymbolId {
        let depth = self.active_function_depth();
        if let Some(id) = self.frames[depth].free_temporaries.pop() {
            if let Some(symbol) = self.get_mut(id) {
                symbol.kind = SymbolKind::Variable;
                symbol.data_type = DataType::Unspecified;
                symbol.value = None;
                tracing::trace!(temporary = %symbol.identifier, "reuse temporary");
                return id;
            }
        }
        let identifier = format!("$t{}", self.next_temporary);
        self.next_temporary += 1;
        let mut symbol = Symbol::variable(identifier, DataType::Unspecified);
        symbol.is_temporary = true;
        self.insert_at(depth, symbol)
    }

    /// Return a temporary to its pool. Releasing a non-temporary or an already free temporary is a no-op.
    pub fn release_temporary(&mut self, id: SymbolId) {
        if !self.get(id).is_some_and(|s| s.is_temporary) {
            return;
        }
        let depth = self.active_function_depth();
        let frame = &mut self.frames[depth];
        if !frame.free_temporaries.contains(&id) && frame.symbols.values().any(|&owned| owned == id) {
            frame.free_temporaries.push(id);
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new("$global")
    }
}
