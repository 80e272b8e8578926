//! Instruction selection for reduced handles.

use bascule_core::lang::operators::{self, OperatorId};
use bascule_core::lang::types::DataType;

use super::fold::fold_not;
use super::typecheck::convert_constant;
use super::{Checked, ExpressionAnalyzer};
use crate::backend::ir::{Instruction, Opcode, Operand};
use crate::frontend::diagnostics::{CompileError, CompileResult};
use crate::frontend::lexer::{Span, Token};

impl ExpressionAnalyzer<'_> {
    pub(super) fn reduce_binary(&mut self, op: OperatorId, op_token: &Token, left: Token, right: Token) -> CompileResult<Token> {
        let checked = self
            .check_data_types(op, left, Some(right))
            .map_err(|e| e.at(op_token.span))?;
        if self.should_fold(&checked)? {
            return self.fold_binary(op, checked, op_token.span);
        }
        self.emit_binary(op, checked, None, op_token.span)
    }

    pub(super) fn reduce_not(&mut self, op_token: &Token, operand: Token) -> CompileResult<Token> {
        let checked = self.check_data_types(OperatorId::Not, operand, None)?;
        if let Some(value) = self.constant_of(&checked.left)? {
            let negated = fold_not(&value)?;
            self.release(&checked.left);
            return self.constant_temporary(negated, op_token.span);
        }
        let destination = self.new_temporary(DataType::Bool, op_token.span)?;
        let operands = [self.operand(&destination)?, self.operand(&checked.left)?];
        self.emitter.emit_op(Opcode::Not, operands);
        self.release(&checked.left);
        Ok(destination)
    }

    /// Emit a checked binary operation into `destination`, or into a fresh temporary.
    fn emit_binary(
        &mut self,
        op: OperatorId,
        checked: Checked,
        destination: Option<Token>,
        span: Span,
    ) -> CompileResult<Token> {
        let Checked {
            left,
            right,
            result_type,
            ..
        } = checked;
        let right = right.ok_or_else(|| CompileError::internal("binary operation without a right operand").at(span))?;
        let destination = match destination {
            Some(destination) => destination,
            None => self.new_temporary(result_type, span)?,
        };
        let d = self.operand(&destination)?;
        let l = self.operand(&left)?;
        let r = self.operand(&right)?;

        let three = |opcode: Opcode| Instruction::new(opcode, [d.clone(), l.clone(), r.clone()]);
        let negate = Instruction::new(Opcode::Not, [d.clone(), d.clone()]);
        let instructions = match op {
            OperatorId::Plus if result_type == DataType::Str => vec![three(Opcode::Concat)],
            OperatorId::Plus => vec![three(Opcode::Add)],
            OperatorId::Minus => vec![three(Opcode::Sub)],
            OperatorId::Star => vec![three(Opcode::Mul)],
            OperatorId::Slash => vec![three(Opcode::Div)],
            OperatorId::Backslash => vec![
                three(Opcode::Div),
                Instruction::new(Opcode::Float2Int, [d.clone(), d.clone()]),
            ],
            OperatorId::Lt => vec![three(Opcode::Lt)],
            OperatorId::Gt => vec![three(Opcode::Gt)],
            OperatorId::Eq => vec![three(Opcode::Eq)],
            OperatorId::LtEq => vec![three(Opcode::Gt), negate],
            OperatorId::GtEq => vec![three(Opcode::Lt), negate],
            OperatorId::NotEq => vec![three(Opcode::Eq), negate],
            OperatorId::And => vec![three(Opcode::And)],
            OperatorId::Or => vec![three(Opcode::Or)],
            other => {
                return Err(CompileError::internal(format!(
                    "operator '{}' reached binary code generation",
                    operators::as_str(other)
                ))
                .at(span));
            }
        };
        for instruction in instructions {
            self.emitter.emit(instruction);
        }
        self.release(&left);
        self.release(&right);
        Ok(destination)
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    pub(super) fn reduce_assignment(
        &mut self,
        op: OperatorId,
        op_token: &Token,
        target: Token,
        value: Token,
    ) -> CompileResult<Token> {
        let checked = self
            .check_data_types(op, target.clone(), Some(value))
            .map_err(|e| e.at(op_token.span))?;
        match operators::compound_base(op) {
            None => {
                let value = checked
                    .right
                    .ok_or_else(|| CompileError::internal("assignment without a value").at(op_token.span))?;
                self.store(&target, value)?;
            }
            Some(base) => {
                let target_type = self.type_of(&target)?;
                let in_place = checked.result_type == target_type && checked.left.symbol == target.symbol;
                if in_place {
                    self.emit_binary(base, checked, Some(target.clone()), op_token.span)?;
                } else {
                    let result = self.emit_binary(base, checked, None, op_token.span)?;
                    self.store(&target, result)?;
                }
            }
        }
        self.assigned = true;
        Ok(target)
    }

    /// Store `value` into the variable `target`, converting it to the target's type.
    ///
    /// ## Errors
    /// - `Semantic` if `target` is not an assignable variable.
    /// - `TypeCompatibility` if the value cannot be converted.
    pub fn assign(&mut self, target: &Token, value: Token) -> CompileResult<()> {
        self.check_target(target)?;
        self.store(target, value)
    }

    fn store(&mut self, target: &Token, value: Token) -> CompileResult<()> {
        let target_type = self.type_of(target)?;
        let value_type = self.type_of(&value)?;
        let destination = self.operand(target)?;

        let instruction = if value_type == target_type {
            Instruction::new(Opcode::Move, [destination, self.operand(&value)?])
        } else if let Some(constant) = self.constant_of(&value)? {
            let converted = convert_constant(&constant, target_type)
                .and_then(|v| super::constant_operand(&v))
                .ok_or_else(|| {
                    CompileError::type_compat(format!(
                        "cannot assign a {value_type} value to '{}' of type {target_type}",
                        target.text
                    ))
                    .with_token(&value)
                })?;
            Instruction::new(Opcode::Move, [destination, Operand::Const(converted)])
        } else {
            let opcode = match (value_type, target_type) {
                (DataType::Int, DataType::Float) => Opcode::Int2Float,
                (DataType::Float, DataType::Int) => Opcode::Float2R2EInt,
                _ => {
                    return Err(CompileError::type_compat(format!(
                        "cannot assign a {value_type} value to '{}' of type {target_type}",
                        target.text
                    ))
                    .with_token(&value));
                }
            };
            Instruction::new(opcode, [destination, self.operand(&value)?])
        };
        self.emitter.emit(instruction);
        self.release(&value);
        Ok(())
    }

    /// Make sure `value` lives in a temporary or a literal, copying a named variable if needed.
    pub fn copy_to_temporary(&mut self, value: Token) -> CompileResult<Token> {
        let symbol = self.symbol(&value)?;
        if symbol.is_temporary || symbol.constant_value().is_some() {
            return Ok(value);
        }
        let data_type = symbol.data_type;
        let copy = self.new_temporary(data_type, value.span)?;
        let operands = [self.operand(&copy)?, self.operand(&value)?];
        self.emitter.emit_op(Opcode::Move, operands);
        Ok(copy)
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Emit a call. Arguments are pushed last to first, so the callee pops them in declaration order.
    pub(super) fn reduce_call(&mut self, function: &Token, arguments: Vec<Token>) -> CompileResult<Token> {
        let symbol = self.symbol(function)?;
        let name = symbol.identifier.clone();
        let meta = symbol
            .function_meta()
            .cloned()
            .ok_or_else(|| CompileError::internal(format!("'{name}' is not a function")).with_token(function))?;

        let expected = meta.arguments.len();
        if arguments.len() != expected {
            let amount = if arguments.len() > expected { "too many" } else { "too few" };
            return Err(CompileError::type_compat(format!(
                "{amount} arguments in call to '{name}': expected {expected}, found {}",
                arguments.len()
            ))
            .with_token(function));
        }

        for (index, argument) in arguments.into_iter().enumerate().rev() {
            let parameter = meta
                .arguments
                .get(index)
                .ok_or_else(|| CompileError::internal("argument index out of range"))?;
            let argument_type = self.type_of(&argument)?;
            let converted = self.coerce(argument.clone(), parameter.data_type)?.ok_or_else(|| {
                CompileError::type_compat(format!(
                    "argument {} of '{name}' must be {}, found {argument_type}",
                    index + 1,
                    parameter.data_type
                ))
                .with_token(&argument)
            })?;
            let pushed = self.operand(&converted)?;
            self.emitter.emit_op(Opcode::PushS, [pushed]);
            self.release(&converted);
        }

        self.emitter.emit(Instruction::bare(Opcode::CreateFrame));
        self.emitter.emit(Instruction::bare(Opcode::PushFrame));
        for parameter in meta.arguments.iter() {
            self.emitter.emit_op(Opcode::DefVar, [Operand::var(parameter.identifier.clone())]);
            self.emitter.emit_op(Opcode::PopS, [Operand::var(parameter.identifier.clone())]);
        }
        self.emitter.emit_op(Opcode::Call, [Operand::label(meta.label.clone())]);
        self.emitter.emit(Instruction::bare(Opcode::PopFrame));

        let destination = self.new_temporary(meta.return_type, function.span)?;
        let result = self.operand(&destination)?;
        self.emitter.emit_op(Opcode::PopS, [result]);
        self.emitter.note_call(&meta.label);
        tracing::trace!(function = %name, label = %meta.label, "call");
        Ok(destination)
    }
}
