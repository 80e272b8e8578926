//! Precedence-driven expression analyzer and code generator.
//!
//! [`ExpressionAnalyzer::analyze`] is an operator-precedence parser fused with semantic actions: every handle
//! it reduces is type checked, folded when both operands are constants, or lowered to IR through the
//! [`Emitter`]. The result of an expression is a [`Token`] naming the symbol that holds its value: the
//! original operand, a constant temporary or a variable temporary.
//!
//! ## Module Structure
//!
//! - `precedence` - the relation table over expression terminals
//! - `typecheck` - operand type rules and implicit numeric conversion
//! - `fold` - compile-time evaluation of constant operations
//! - `codegen` - instruction selection for operators, assignments and calls
//!
//! ## Notes
//! - The analyzer never consumes the token that ends an expression (a keyword, a line end, `;`). The caller
//!   inspects it afterwards.
//! - Temporaries handed back to the caller must be released by the caller once their value is consumed.

mod codegen;
mod fold;
pub mod precedence;
mod typecheck;

pub use fold::fold_values;
pub use precedence::{Relation, Terminal, relation};
pub use typecheck::Checked;

use bascule_core::lang::operators::{self, OperatorFamily, OperatorId};
use bascule_core::lang::punctuation::PunctuationId;
use bascule_core::lang::types::DataType;

use crate::backend::ir::{Constant, Emitter, Operand};
use crate::config::CompilerOptions;
use crate::frontend::diagnostics::{CompileError, CompileResult};
use crate::frontend::lexer::{Span, Token, TokenKind};
use crate::frontend::symbols::{Symbol, SymbolKind, SymbolTable, SymbolValue};

/// Pull-based token supply for the analyzer.
///
/// `peek` must return the same token until `advance` is called.
pub trait TokenSource {
    fn peek(&mut self, symbols: &mut SymbolTable) -> CompileResult<&Token>;
    fn advance(&mut self, symbols: &mut SymbolTable) -> CompileResult<Token>;
}

/// A token stream that is already in memory.
#[derive(Debug)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
    position: usize,
    end: Token,
}

impl TokenBuffer {
    pub fn new(tokens: Vec<Token>) -> Self {
        let span = tokens.last().map(|t| t.span).unwrap_or_default();
        Self {
            tokens,
            position: 0,
            end: Token::new(TokenKind::Eof, "", span),
        }
    }
}

impl TokenSource for TokenBuffer {
    fn peek(&mut self, _symbols: &mut SymbolTable) -> CompileResult<&Token> {
        Ok(self.tokens.get(self.position).unwrap_or(&self.end))
    }

    fn advance(&mut self, _symbols: &mut SymbolTable) -> CompileResult<Token> {
        let token = self.tokens.get(self.position).cloned().unwrap_or_else(|| self.end.clone());
        self.position = (self.position + 1).min(self.tokens.len());
        Ok(token)
    }
}

/// What kind of construct the analyzer is parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionMode {
    /// A value. Assignment operators are rejected and `=` compares.
    Expression,
    /// An assignment statement: the first `=` assigns, and some assignment must be reduced.
    Assignment,
}

#[derive(Debug)]
enum StackItem {
    Terminal(Terminal, Token),
    /// A reduced, already evaluated expression.
    Expr(Token),
    /// Left end of a handle.
    Marker,
}

pub struct ExpressionAnalyzer<'a> {
    symbols: &'a mut SymbolTable,
    emitter: &'a mut Emitter,
    options: &'a CompilerOptions,
    assigned: bool,
}

impl<'a> ExpressionAnalyzer<'a> {
    pub fn new(symbols: &'a mut SymbolTable, emitter: &'a mut Emitter, options: &'a CompilerOptions) -> Self {
        Self {
            symbols,
            emitter,
            options,
            assigned: false,
        }
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    /// Parse and generate one expression (or assignment statement).
    ///
    /// ## Returns
    /// The token holding the value: the assignment target in [`ExpressionMode::Assignment`].
    ///
    /// ## Errors
    /// - `Syntax` when the tokens do not form an expression.
    /// - `Semantic` for undefined identifiers and invalid assignment targets.
    /// - `TypeCompatibility` for operand types that cannot be reconciled.
    /// - `OtherSemantic` for division by a constant zero and integer overflow while folding.
    #[tracing::instrument(level = "trace", skip_all, fields(?mode))]
    pub fn analyze<S: TokenSource>(&mut self, tokens: &mut S, mode: ExpressionMode) -> CompileResult<Token> {
        self.assigned = false;
        let first_span = tokens.peek(self.symbols)?.span;
        let mut stack = vec![StackItem::Terminal(
            Terminal::End,
            Token::new(TokenKind::Eof, "", first_span),
        )];
        let mut assignment_pending = mode == ExpressionMode::Assignment;

        loop {
            let mut lookahead = tokens.peek(self.symbols)?.clone();
            let terminal = self.classify(&mut lookahead, mode, assignment_pending)?;
            let top = topmost_terminal(&stack);

            if terminal == Terminal::End && top == Terminal::End {
                if let [_, StackItem::Expr(_)] = stack.as_slice() {
                    let Some(StackItem::Expr(result)) = stack.pop() else {
                        return Err(CompileError::internal("expression stack lost its result"));
                    };
                    if mode == ExpressionMode::Assignment && !self.assigned {
                        return Err(CompileError::syntax("expected an assignment").with_token(&lookahead));
                    }
                    return Ok(result);
                }
            }

            match relation(top, terminal) {
                Relation::Less => {
                    let position = stack
                        .iter()
                        .rposition(|item| matches!(item, StackItem::Terminal(..)))
                        .unwrap_or(0);
                    stack.insert(position + 1, StackItem::Marker);
                    self.shift(tokens, &mut stack, terminal, lookahead)?;
                    if is_assignment(terminal) {
                        assignment_pending = false;
                    }
                }
                Relation::Equal => self.shift(tokens, &mut stack, terminal, lookahead)?,
                Relation::Greater => self.reduce(&mut stack)?,
                Relation::Undefined => return Err(self.undefined_relation(&stack, &lookahead, terminal)),
            }
        }
    }

    fn shift<S: TokenSource>(
        &mut self,
        tokens: &mut S,
        stack: &mut Vec<StackItem>,
        terminal: Terminal,
        resolved: Token,
    ) -> CompileResult<()> {
        tokens.advance(self.symbols)?;
        stack.push(StackItem::Terminal(terminal, resolved));
        Ok(())
    }

    /// Map a token to its expression terminal, resolving identifiers on the way.
    fn classify(&mut self, token: &mut Token, mode: ExpressionMode, assignment_pending: bool) -> CompileResult<Terminal> {
        let terminal = match token.kind {
            TokenKind::Literal => Terminal::Operand,
            TokenKind::Identifier => {
                let id = match token.symbol {
                    Some(id) => id,
                    None => self.symbols.find_or_insert_symbol(&token.text),
                };
                token.symbol = Some(id);
                match self.symbols.get(id).map(|s| s.kind) {
                    Some(SymbolKind::Function) => Terminal::FuncId,
                    _ => Terminal::Operand,
                }
            }
            TokenKind::Operator(OperatorId::Eq) if assignment_pending => Terminal::Assign,
            TokenKind::Operator(id) => {
                if mode == ExpressionMode::Expression && operators::family(id) == OperatorFamily::Assignment {
                    return Err(CompileError::syntax("assignment is not allowed in an expression").with_token(token));
                }
                Terminal::from_operator(id)
            }
            TokenKind::Punctuation(PunctuationId::LParen) => Terminal::LParen,
            TokenKind::Punctuation(PunctuationId::RParen) => Terminal::RParen,
            TokenKind::Punctuation(PunctuationId::Comma) => Terminal::Comma,
            TokenKind::Punctuation(PunctuationId::Semicolon)
            | TokenKind::Keyword(_)
            | TokenKind::DataType(_)
            | TokenKind::Eol
            | TokenKind::Eof => Terminal::End,
        };
        Ok(terminal)
    }

    /// Pop the handle above the topmost marker and push its reduced expression.
    fn reduce(&mut self, stack: &mut Vec<StackItem>) -> CompileResult<()> {
        let marker = stack
            .iter()
            .rposition(|item| matches!(item, StackItem::Marker))
            .ok_or_else(|| CompileError::internal("reduction without a handle marker"))?;
        let handle: Vec<StackItem> = stack.drain(marker + 1..).collect();
        stack.pop();
        let result = self.reduce_handle(handle)?;
        stack.push(StackItem::Expr(result));
        Ok(())
    }

    fn reduce_handle(&mut self, handle: Vec<StackItem>) -> CompileResult<Token> {
        match handle.as_slice() {
            [StackItem::Terminal(Terminal::Operand, token)] => self.reduce_operand(token),
            [StackItem::Terminal(Terminal::LParen, _), StackItem::Expr(inner), StackItem::Terminal(Terminal::RParen, _)] => {
                Ok(inner.clone())
            }
            [StackItem::Terminal(Terminal::Not, op), StackItem::Expr(operand)] => self.reduce_not(op, operand.clone()),
            [StackItem::Expr(left), StackItem::Terminal(terminal, op), StackItem::Expr(right)] => {
                let id = terminal
                    .operator()
                    .filter(|id| *id != OperatorId::Not)
                    .ok_or_else(|| CompileError::syntax(format!("unexpected {}", op.describe())).with_token(op))?;
                if operators::family(id) == OperatorFamily::Assignment {
                    self.reduce_assignment(id, op, left.clone(), right.clone())
                } else {
                    self.reduce_binary(id, op, left.clone(), right.clone())
                }
            }
            [
                StackItem::Terminal(Terminal::FuncId, function),
                StackItem::Terminal(Terminal::LParen, open),
                rest @ ..,
                StackItem::Terminal(Terminal::RParen, _),
            ] => {
                let arguments = call_arguments(rest, open)?;
                self.reduce_call(function, arguments)
            }
            items => {
                let token = items.iter().find_map(|item| match item {
                    StackItem::Terminal(_, token) | StackItem::Expr(token) => Some(token),
                    StackItem::Marker => None,
                });
                let err = CompileError::syntax("malformed expression");
                Err(match token {
                    Some(token) => err.with_token(token),
                    None => err,
                })
            }
        }
    }

    fn reduce_operand(&mut self, token: &Token) -> CompileResult<Token> {
        let symbol = self.symbol(token)?;
        match symbol.kind {
            SymbolKind::Unknown => {
                Err(CompileError::semantic(format!("undefined identifier '{}'", token.text)).with_token(token))
            }
            SymbolKind::Function => Err(CompileError::syntax(format!(
                "function '{}' must be called with arguments",
                token.text
            ))
            .with_token(token)),
            SymbolKind::Variable | SymbolKind::Constant => Ok(token.clone()),
        }
    }

    fn undefined_relation(&self, stack: &[StackItem], lookahead: &Token, terminal: Terminal) -> CompileError {
        match stack.last() {
            Some(StackItem::Terminal(Terminal::Operand, operand)) => {
                let kind = self.symbol(operand).map(|s| s.kind).ok();
                if kind == Some(SymbolKind::Unknown) {
                    let what = if terminal == Terminal::LParen { "function" } else { "identifier" };
                    return CompileError::semantic(format!("undefined {what} '{}'", operand.text)).with_token(operand);
                }
                if terminal == Terminal::LParen {
                    return CompileError::semantic(format!("'{}' is not a function", operand.text))
                        .with_token(operand);
                }
            }
            Some(StackItem::Terminal(Terminal::FuncId, function)) => {
                return CompileError::syntax(format!("expected '(' after function '{}'", function.text))
                    .with_token(lookahead);
            }
            _ => {}
        }
        let message = if terminal == Terminal::End {
            if stack.len() == 1 {
                "expected an expression".to_string()
            } else {
                format!("incomplete expression before {}", lookahead.describe())
            }
        } else {
            format!("unexpected {} in expression", lookahead.describe())
        };
        CompileError::syntax(message).with_token(lookahead)
    }

    // ========================================================================
    // Symbol access
    // ========================================================================

    fn symbol(&self, token: &Token) -> CompileResult<&Symbol> {
        token
            .symbol
            .and_then(|id| self.symbols.get(id))
            .ok_or_else(|| {
                CompileError::internal(format!("{} does not refer to a live symbol", token.describe())).with_token(token)
            })
    }

    /// Value type of the symbol behind `token`.
    pub fn type_of(&self, token: &Token) -> CompileResult<DataType> {
        Ok(self.symbol(token)?.data_type)
    }

    /// Constant payload behind `token`, if it is a constant.
    fn constant_of(&self, token: &Token) -> CompileResult<Option<SymbolValue>> {
        Ok(self.symbol(token)?.constant_value().cloned())
    }

    /// IR operand for the symbol behind `token`.
    pub fn operand(&self, token: &Token) -> CompileResult<Operand> {
        let symbol = self.symbol(token)?;
        if let Some(value) = symbol.constant_value() {
            return constant_operand(value).map(Operand::Const).ok_or_else(|| {
                CompileError::internal(format!("'{}' has no constant rendering", symbol.identifier))
            });
        }
        match symbol.kind {
            SymbolKind::Variable => Ok(Operand::var(symbol.identifier.clone())),
            SymbolKind::Constant | SymbolKind::Function | SymbolKind::Unknown => Err(CompileError::internal(
                format!("'{}' cannot be used as an operand", symbol.identifier),
            )
            .with_token(token)),
        }
    }

    /// A fresh variable temporary of `data_type`, declared in the open section.
    fn new_temporary(&mut self, data_type: DataType, span: Span) -> CompileResult<Token> {
        let id = self.symbols.get_unique_temporary();
        let symbol = self
            .symbols
            .get_mut(id)
            .ok_or_else(|| CompileError::internal("temporary vanished after allocation"))?;
        symbol.data_type = data_type;
        let identifier = symbol.identifier.clone();
        self.emitter.declare_local(&identifier);
        Ok(Token::for_symbol(id, identifier, span))
    }

    /// A temporary holding a compile-time value; it renders as a literal and needs no declaration.
    fn constant_temporary(&mut self, value: SymbolValue, span: Span) -> CompileResult<Token> {
        let id = self.symbols.get_unique_temporary();
        let symbol = self
            .symbols
            .get_mut(id)
            .ok_or_else(|| CompileError::internal("temporary vanished after allocation"))?;
        let template = Symbol::constant(symbol.identifier.clone(), value);
        symbol.kind = template.kind;
        symbol.data_type = template.data_type;
        symbol.value = template.value;
        Ok(Token::for_symbol(id, template.identifier, span))
    }

    /// Give the temporary behind `token` back to the pool. Non-temporaries are left alone.
    pub fn release(&mut self, token: &Token) {
        if let Some(id) = token.symbol {
            self.symbols.release_temporary(id);
        }
    }
}

fn topmost_terminal(stack: &[StackItem]) -> Terminal {
    stack
        .iter()
        .rev()
        .find_map(|item| match item {
            StackItem::Terminal(terminal, _) => Some(*terminal),
            _ => None,
        })
        .unwrap_or(Terminal::End)
}

fn is_assignment(terminal: Terminal) -> bool {
    terminal
        .operator()
        .is_some_and(|id| operators::family(id) == OperatorFamily::Assignment)
}

/// Split `E , E , ... E` (possibly empty) into its expressions.
fn call_arguments(items: &[StackItem], open: &Token) -> CompileResult<Vec<Token>> {
    let mut arguments = Vec::new();
    let mut expect_expression = true;
    for item in items {
        match (item, expect_expression) {
            (StackItem::Expr(token), true) => {
                arguments.push(token.clone());
                expect_expression = false;
            }
            (StackItem::Terminal(Terminal::Comma, _), false) => expect_expression = true,
            (StackItem::Terminal(_, token), _) => {
                return Err(CompileError::syntax(format!("unexpected {} in argument list", token.describe()))
                    .with_token(token));
            }
            _ => return Err(CompileError::syntax("malformed argument list").with_token(open)),
        }
    }
    if expect_expression && !arguments.is_empty() {
        return Err(CompileError::syntax("expected an argument after ','").with_token(open));
    }
    Ok(arguments)
}

/// IR rendering of a constant payload.
pub fn constant_operand(value: &SymbolValue) -> Option<Constant> {
    match value {
        SymbolValue::Int(v) => Some(Constant::Int(*v)),
        SymbolValue::Float(v) => Some(Constant::Float(*v)),
        SymbolValue::Str(v) => Some(Constant::Str(v.clone())),
        SymbolValue::Bool(v) => Some(Constant::Bool(*v)),
        SymbolValue::Function(_) => None,
    }
}
