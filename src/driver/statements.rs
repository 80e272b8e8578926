//! Statements.
//!
//! ## Loop layout
//!
//! Every loop owns a transparent *header* frame (labelled `$loop{n}`, carrying the loop kind) and a
//! transparent *body* frame. `Exit` and `Continue` restore everything redefined above the header frame before
//! they jump, so the data stack stays balanced on every path.
//!
//! ```text
//! Do:  LABEL $loop{n}                  For: MOVE $loop{n}$to / $loop{n}$step
//!      [top condition jump to $end]         LABEL $loop{n}
//!      body                                 direction test on the sign of the step
//!      LABEL $loop{n}$continue              bound test, jump to $end when passed
//!      [bottom condition] / JUMP top        LABEL $loop{n}$body ... body
//!      LABEL $loop{n}$end                   LABEL $loop{n}$continue
//!                                           ADD i i $loop{n}$step
//!                                           JUMP $loop{n}
//!                                           LABEL $loop{n}$end
//! ```

use std::io::BufRead;

use bascule_core::lang::keywords::KeywordId;
use bascule_core::lang::operators::OperatorId;
use bascule_core::lang::punctuation::PunctuationId;
use bascule_core::lang::types::DataType;

use super::Compiler;
use crate::backend::ir::{Constant, Instruction, Opcode, Operand};
use crate::frontend::diagnostics::{CompileError, CompileResult};
use crate::frontend::lexer::{Token, TokenKind};
use crate::frontend::symbols::{LoopKind, Symbol, SymbolKind};

/// Prompt written before every `Input`.
const INPUT_PROMPT: &str = "?\\032";

impl<R: BufRead> Compiler<R> {
    /// Statements up to (not including) a block terminator keyword.
    pub(super) fn body(&mut self) -> CompileResult<()> {
        loop {
            let token = self.peek()?.clone();
            match token.kind {
                TokenKind::Keyword(
                    KeywordId::End | KeywordId::Else | KeywordId::ElseIf | KeywordId::Loop | KeywordId::Next,
                ) => return Ok(()),
                TokenKind::Eof => {
                    return Err(CompileError::syntax("unexpected end of input inside a block").with_token(&token));
                }
                _ => {
                    self.statement()?;
                    self.expect_eol()?;
                }
            }
        }
    }

    fn statement(&mut self) -> CompileResult<()> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Keyword(KeywordId::Dim) => self.dim(),
            TokenKind::Identifier => {
                let target = self.assignment()?;
                self.analyzer().release(&target);
                Ok(())
            }
            TokenKind::Keyword(KeywordId::Input) => self.input(),
            TokenKind::Keyword(KeywordId::Print) => self.print(),
            TokenKind::Keyword(KeywordId::If) => self.if_statement(),
            TokenKind::Keyword(KeywordId::Do) => self.do_loop(),
            TokenKind::Keyword(KeywordId::For) => self.for_loop(),
            TokenKind::Keyword(KeywordId::Exit) => self.loop_jump(KeywordId::Exit),
            TokenKind::Keyword(KeywordId::Continue) => self.loop_jump(KeywordId::Continue),
            TokenKind::Keyword(KeywordId::Return) => self.return_statement(),
            TokenKind::Keyword(KeywordId::Scope) => self.scope_block(),
            _ => Err(CompileError::syntax(format!("expected a statement, found {}", token.describe())).with_token(&token)),
        }
    }

    // ========================================================================
    // Declarations and assignment
    // ========================================================================

    /// `Dim id As type [= expr]`
    fn dim(&mut self) -> CompileResult<()> {
        self.expect_keyword(KeywordId::Dim)?;
        let name = self.expect_identifier()?;
        self.expect_keyword(KeywordId::As)?;
        let data_type = self.expect_type()?;

        // The initializer still sees the binding this declaration may shadow.
        let initializer = if self.peek()?.is_operator(OperatorId::Eq) {
            self.advance()?;
            Some(self.expression()?)
        } else {
            None
        };

        let target = self.declare_variable(&name, data_type)?;
        match initializer {
            Some(value) => self.analyzer().assign(&target, value),
            None => {
                let zero = Constant::zero(data_type)
                    .ok_or_else(|| CompileError::internal("declared type has no zero value").with_token(&name))?;
                self.emit(Opcode::Move, [Operand::var(target.text.clone()), Operand::Const(zero)]);
                Ok(())
            }
        }
    }

    /// Bind a new variable in the top frame, saving a shadowed binding of the same function first.
    pub(super) fn declare_variable(&mut self, name: &Token, data_type: DataType) -> CompileResult<Token> {
        let identifier = name.text.clone();
        if let Some((depth, id)) = self.symbols.find_symbol_with_depth(&identifier) {
            if self.symbols.get(id).is_some_and(|s| s.kind == SymbolKind::Function) {
                return Err(CompileError::semantic(format!("'{identifier}' is already a function")).with_token(name));
            }
            if depth + 1 == self.symbols.depth() {
                return Err(
                    CompileError::semantic(format!("'{identifier}' is already declared in this scope")).with_token(name),
                );
            }
            if depth != 0 && depth >= self.symbols.active_function_depth() && self.symbols.push_redefinition(&identifier)
            {
                tracing::trace!(variable = %identifier, "redefinition");
                self.emit(Opcode::PushS, [Operand::var(identifier.clone())]);
            }
        }
        let id = self
            .symbols
            .insert_on_top(Symbol::variable(identifier.clone(), data_type))
            .ok_or_else(|| {
                CompileError::semantic(format!("'{identifier}' is already declared in this scope")).with_token(name)
            })?;
        self.emitter.declare_local(&identifier);
        Ok(Token::for_symbol(id, identifier, name.span))
    }

    // ========================================================================
    // I/O
    // ========================================================================

    /// `Input id`
    fn input(&mut self) -> CompileResult<()> {
        self.expect_keyword(KeywordId::Input)?;
        let name = self.expect_identifier()?;
        let symbol = self
            .symbols
            .find_symbol(&name.text)
            .and_then(|id| self.symbols.get(id))
            .filter(|s| s.kind == SymbolKind::Variable && !s.is_temporary)
            .ok_or_else(|| {
                CompileError::semantic(format!("undefined variable '{}'", name.text)).with_token(&name)
            })?;
        let data_type = symbol.data_type;
        self.emit(Opcode::Write, [Operand::string(INPUT_PROMPT)]);
        self.emit(Opcode::Read, [Operand::var(name.text.clone()), Operand::Type(data_type)]);
        Ok(())
    }

    /// `Print expr ; { expr ; }`
    fn print(&mut self) -> CompileResult<()> {
        self.expect_keyword(KeywordId::Print)?;
        loop {
            let value = self.expression()?;
            self.expect_punctuation(PunctuationId::Semicolon)?;
            let operand = self.analyzer().operand(&value)?;
            self.emit(Opcode::Write, [operand]);
            self.analyzer().release(&value);
            if self.peek()?.kind == TokenKind::Eol {
                return Ok(());
            }
        }
    }

    // ========================================================================
    // Control flow
    // ========================================================================

    /// A `Boolean` expression as an operand; its temporary is released right away.
    fn condition(&mut self) -> CompileResult<Operand> {
        let value = self.expression()?;
        let mut analyzer = self.analyzer();
        let data_type = analyzer.type_of(&value)?;
        if data_type != DataType::Bool {
            return Err(CompileError::type_compat(format!("condition must be Boolean, found {data_type}")).with_token(&value));
        }
        let operand = analyzer.operand(&value)?;
        analyzer.release(&value);
        Ok(operand)
    }

    fn jump_if(&mut self, holds: bool, target: &str, condition: Operand) {
        let opcode = if holds { Opcode::JumpIfEq } else { Opcode::JumpIfNeq };
        self.emit(opcode, [Operand::label(target), condition, Operand::bool(true)]);
    }

    /// `If expr Then EOL body { ElseIf expr Then EOL body } [ Else EOL body ] End If`
    fn if_statement(&mut self) -> CompileResult<()> {
        let number = self.next_if;
        self.next_if += 1;
        let end_label = format!("$if{number}$end");

        self.expect_keyword(KeywordId::If)?;
        let mut branch = 0;
        loop {
            let condition = self.condition()?;
            self.expect_keyword(KeywordId::Then)?;
            self.expect_eol()?;
            let else_label = format!("$if{number}$else{branch}");
            self.jump_if(false, &else_label, condition);
            self.block(&format!("$if{number}"))?;
            self.emitter.emit(Instruction::jump(end_label.clone()));
            self.emitter.emit(Instruction::label(else_label));
            branch += 1;

            if self.peek()?.is_keyword(KeywordId::ElseIf) {
                self.advance()?;
                continue;
            }
            if self.peek()?.is_keyword(KeywordId::Else) {
                self.advance()?;
                self.expect_eol()?;
                self.block(&format!("$if{number}"))?;
            }
            break;
        }
        self.expect_end(KeywordId::If)?;
        self.emitter.emit(Instruction::label(end_label));
        Ok(())
    }

    /// `Scope EOL body End Scope`
    fn scope_block(&mut self) -> CompileResult<()> {
        self.expect_keyword(KeywordId::Scope)?;
        self.expect_eol()?;
        self.block("$scope")?;
        self.expect_end(KeywordId::Scope)
    }

    /// A body in its own transparent frame.
    fn block(&mut self, label: &str) -> CompileResult<()> {
        self.symbols.push_frame(label, true, None);
        self.body()?;
        self.close_frame();
        Ok(())
    }

    /// `Do [(While|Until) expr] EOL body Loop [(While|Until) expr]`
    fn do_loop(&mut self) -> CompileResult<()> {
        let label = self.open_loop(LoopKind::Do);
        self.expect_keyword(KeywordId::Do)?;
        self.emitter.emit(Instruction::label(label.clone()));
        if let Some(until) = self.loop_condition_keyword()? {
            let condition = self.condition()?;
            // While: leave when false. Until: leave when true.
            self.jump_if(until, &format!("{label}$end"), condition);
        }
        self.expect_eol()?;

        self.block(&format!("{label}$body"))?;
        self.expect_keyword(KeywordId::Loop)?;
        self.emitter.emit(Instruction::label(format!("{label}$continue")));
        match self.loop_condition_keyword()? {
            Some(until) => {
                let condition = self.condition()?;
                self.jump_if(!until, &label, condition);
            }
            None => self.emitter.emit(Instruction::jump(label.clone())),
        }
        self.emitter.emit(Instruction::label(format!("{label}$end")));
        self.close_frame();
        Ok(())
    }

    /// Consume `While` or `Until` if present; `Some(true)` for `Until`.
    fn loop_condition_keyword(&mut self) -> CompileResult<Option<bool>> {
        let token = self.peek()?;
        let until = if token.is_keyword(KeywordId::While) {
            false
        } else if token.is_keyword(KeywordId::Until) {
            true
        } else {
            return Ok(None);
        };
        self.advance()?;
        Ok(Some(until))
    }

    /// `For id [As type] = expr To expr [Step expr] EOL body Next [id]`
    fn for_loop(&mut self) -> CompileResult<()> {
        let label = self.open_loop(LoopKind::For);
        self.expect_keyword(KeywordId::For)?;
        let name = self.expect_identifier()?;
        let declared_type = if self.peek()?.is_keyword(KeywordId::As) {
            self.advance()?;
            Some(self.expect_type()?)
        } else {
            None
        };
        self.expect_operator(OperatorId::Eq)?;
        let start = self.expression()?;

        let control = match declared_type {
            Some(data_type) => self.declare_variable(&name, data_type)?,
            None => self.existing_variable(&name)?,
        };
        let control_type = self.analyzer().type_of(&control)?;
        if !control_type.is_numeric() {
            return Err(CompileError::type_compat(format!(
                "loop variable '{}' must be numeric, found {control_type}",
                name.text
            ))
            .with_token(&name));
        }
        self.analyzer().assign(&control, start)?;

        let to = format!("{label}$to");
        let step = format!("{label}$step");
        let cond = format!("{label}$cond");
        for hidden in [&to, &step, &cond] {
            self.emitter.declare_local(hidden);
        }

        self.expect_keyword(KeywordId::To)?;
        let bound = self.expression()?;
        self.store_hidden(&to, bound, control_type)?;
        if self.peek()?.is_keyword(KeywordId::Step) {
            self.advance()?;
            let increment = self.expression()?;
            self.store_hidden(&step, increment, control_type)?;
        } else {
            let one = match control_type {
                DataType::Float => Constant::Float(1.0),
                _ => Constant::Int(1),
            };
            self.emit(Opcode::Move, [Operand::var(step.clone()), Operand::Const(one)]);
        }
        self.expect_eol()?;

        let zero = Constant::zero(control_type)
            .ok_or_else(|| CompileError::internal("numeric type without zero").with_token(&name))?;
        let ctrl = Operand::var(control.text.clone());
        let end_label = format!("{label}$end");
        let down_label = format!("{label}$down");
        let body_label = format!("{label}$body");
        self.emitter.emit(Instruction::label(label.clone()));
        self.emit(Opcode::Lt, [Operand::var(cond.clone()), Operand::var(step.clone()), Operand::Const(zero)]);
        self.jump_if(true, &down_label, Operand::var(cond.clone()));
        self.emit(Opcode::Gt, [Operand::var(cond.clone()), ctrl.clone(), Operand::var(to.clone())]);
        self.jump_if(true, &end_label, Operand::var(cond.clone()));
        self.emitter.emit(Instruction::jump(body_label.clone()));
        self.emitter.emit(Instruction::label(down_label));
        self.emit(Opcode::Lt, [Operand::var(cond.clone()), ctrl.clone(), Operand::var(to)]);
        self.jump_if(true, &end_label, Operand::var(cond));
        self.emitter.emit(Instruction::label(body_label.clone()));

        self.block(&body_label)?;
        self.expect_keyword(KeywordId::Next)?;
        if self.peek()?.kind == TokenKind::Identifier {
            let next = self.advance()?;
            if next.text != control.text {
                return Err(CompileError::syntax(format!(
                    "'Next {}' does not match loop variable '{}'",
                    next.text, control.text
                ))
                .with_token(&next));
            }
        }

        self.emitter.emit(Instruction::label(format!("{label}$continue")));
        self.emit(Opcode::Add, [ctrl.clone(), ctrl, Operand::var(step)]);
        self.emitter.emit(Instruction::jump(label));
        self.emitter.emit(Instruction::label(end_label));
        self.close_frame();
        Ok(())
    }

    fn existing_variable(&mut self, name: &Token) -> CompileResult<Token> {
        let id = self
            .symbols
            .find_symbol(&name.text)
            .filter(|&id| self.symbols.get(id).is_some_and(|s| s.kind == SymbolKind::Variable))
            .ok_or_else(|| CompileError::semantic(format!("undefined variable '{}'", name.text)).with_token(name))?;
        Ok(Token::for_symbol(id, name.text.clone(), name.span))
    }

    /// Move a loop bound or step, converted to the loop variable's type, into a hidden variable.
    fn store_hidden(&mut self, hidden: &str, value: Token, data_type: DataType) -> CompileResult<()> {
        let mut analyzer = self.analyzer();
        let converted = analyzer.coerce_to(value, data_type)?;
        let operand = analyzer.operand(&converted)?;
        analyzer.release(&converted);
        self.emit(Opcode::Move, [Operand::var(hidden), operand]);
        Ok(())
    }

    /// Allocate a loop number and push the loop's header frame.
    fn open_loop(&mut self, kind: LoopKind) -> String {
        let label = format!("$loop{}", self.next_loop);
        self.next_loop += 1;
        self.symbols.push_frame(label.clone(), true, Some(kind));
        label
    }

    /// `Exit kind {, kind}` and `Continue kind {, kind}`; `n` kinds target the n-th enclosing loop.
    fn loop_jump(&mut self, keyword: KeywordId) -> CompileResult<()> {
        let statement = self.advance()?;
        let mut kind = None;
        let mut count = 0;
        loop {
            let token = self.advance()?;
            let this = match token.kind {
                TokenKind::Keyword(KeywordId::Do) => LoopKind::Do,
                TokenKind::Keyword(KeywordId::For) => LoopKind::For,
                _ => {
                    return Err(CompileError::syntax(format!("expected 'Do' or 'For', found {}", token.describe()))
                        .with_token(&token));
                }
            };
            if kind.is_some_and(|k| k != this) {
                return Err(CompileError::syntax("cannot mix 'Do' and 'For' in one loop jump").with_token(&token));
            }
            kind = Some(this);
            count += 1;
            if !self.peek()?.is_punctuation(PunctuationId::Comma) {
                break;
            }
            self.advance()?;
        }
        let kind = kind.ok_or_else(|| CompileError::internal("loop jump without a kind"))?;

        let depth = self.symbols.nth_loop_depth(kind, count).ok_or_else(|| {
            CompileError::syntax(format!("no enclosing loop for '{}'", statement.text)).with_token(&statement)
        })?;
        let label = self
            .symbols
            .frame_label(depth)
            .map(str::to_string)
            .ok_or_else(|| CompileError::internal("loop frame vanished"))?;
        let cleanup = self.symbols.cleanup_above(depth);
        self.emit_cleanup(cleanup);
        let target = match keyword {
            KeywordId::Continue => format!("{label}$continue"),
            _ => format!("{label}$end"),
        };
        self.emitter.emit(Instruction::jump(target));
        Ok(())
    }

    /// `Return expr`
    fn return_statement(&mut self) -> CompileResult<()> {
        let statement = self.expect_keyword(KeywordId::Return)?;
        let Some(function) = self.function.clone() else {
            return Err(CompileError::syntax("'Return' outside a function").with_token(&statement));
        };
        let value = self.expression()?;
        let function_depth = self.symbols.active_function_depth();
        let cleanup = self.symbols.cleanup_above(function_depth);

        let mut analyzer = self.analyzer();
        let converted = analyzer.coerce_to(value, function.return_type).map_err(|err| {
            CompileError {
                message: format!("return value of '{}': {}", function.name, err.message),
                ..err
            }
        })?;
        // The cleanup below may overwrite a redefined variable that holds the value.
        let converted = if cleanup.is_empty() {
            converted
        } else {
            analyzer.copy_to_temporary(converted)?
        };
        let operand = analyzer.operand(&converted)?;
        analyzer.release(&converted);

        self.emit_cleanup(cleanup);
        self.emit(Opcode::PushS, [operand]);
        self.emitter.emit(Instruction::bare(Opcode::Return));
        Ok(())
    }
}
