//! Operand type rules and implicit numeric conversion.
//!
//! Conversions never touch the operand they convert: they return a new token for a new temporary. A
//! constant operand becomes a constant temporary holding the converted value (no instruction); a variable
//! operand becomes a variable temporary filled by `INT2FLOAT` or `FLOAT2R2EINT`.

use bascule_core::lang::operators::{self, OperatorFamily, OperatorId};
use bascule_core::lang::types::DataType;
use bascule_core::numeric::float_to_int_half_even;

use super::ExpressionAnalyzer;
use crate::backend::ir::Opcode;
use crate::frontend::diagnostics::{CompileError, CompileResult};
use crate::frontend::lexer::Token;
use crate::frontend::symbols::{SymbolKind, SymbolValue};

/// Operands of an operator after type checking.
#[derive(Debug, Clone, PartialEq)]
pub struct Checked {
    pub left: Token,
    /// `None` only for `Not`.
    pub right: Option<Token>,
    /// Type both operands share.
    pub operand_type: DataType,
    /// Type of the operation's value.
    pub result_type: DataType,
    /// Whether an operand had to be converted.
    pub coerced: bool,
}

impl ExpressionAnalyzer<'_> {
    /// Check the operands of `op` and convert them to their common type.
    ///
    /// ## Notes
    /// - For `:=` the value is only validated here; it is converted while it is stored.
    /// - Compound assignments are checked as their base operator applied to the target and the value.
    ///
    /// ## Errors
    /// - `TypeCompatibility` when the operand types cannot be reconciled.
    /// - `OtherSemantic` when the divisor of `/` or `\` is a constant zero.
    /// - `Semantic` for invalid assignment targets.
    pub fn check_data_types(&mut self, op: OperatorId, left: Token, right: Option<Token>) -> CompileResult<Checked> {
        match operators::family(op) {
            OperatorFamily::Arithmetic | OperatorFamily::Relational => {
                let right = require_right(op, &left, right)?;
                self.check_arithmetic(op, left, right)
            }
            OperatorFamily::IntegerDivision => {
                let right = require_right(op, &left, right)?;
                self.check_integer_division(op, left, right)
            }
            OperatorFamily::Boolean => self.check_boolean(op, left, right),
            OperatorFamily::Assignment => {
                let value = require_right(op, &left, right)?;
                self.check_assignment(op, left, value)
            }
        }
    }

    fn check_arithmetic(&mut self, op: OperatorId, left: Token, right: Token) -> CompileResult<Checked> {
        let left_type = self.type_of(&left)?;
        let right_type = self.type_of(&right)?;
        let allowed = match (left_type, right_type) {
            (DataType::Int | DataType::Float, DataType::Int | DataType::Float) => true,
            (DataType::Str, DataType::Str) => matches!(op, OperatorId::Plus | OperatorId::Eq | OperatorId::NotEq),
            (DataType::Bool, DataType::Bool) => matches!(op, OperatorId::Eq | OperatorId::NotEq),
            _ => false,
        };
        if !allowed {
            return Err(incompatible(op, left_type, right_type, &left));
        }

        let common = if left_type.is_numeric()
            && (op == OperatorId::Slash || left_type == DataType::Float || right_type == DataType::Float)
        {
            DataType::Float
        } else {
            left_type
        };
        let left = self.coerce_checked(left, common)?;
        let right = self.coerce_checked(right, common)?;
        if op == OperatorId::Slash {
            self.reject_zero_divisor(&right)?;
        }

        let result_type = match operators::family(op) {
            OperatorFamily::Relational => DataType::Bool,
            _ => common,
        };
        Ok(Checked {
            left,
            right: Some(right),
            operand_type: common,
            result_type,
            coerced: left_type != common || right_type != common,
        })
    }

    /// `\` divides as floats: integers are promoted, floats are first rounded to integers.
    fn check_integer_division(&mut self, op: OperatorId, left: Token, right: Token) -> CompileResult<Checked> {
        let left_type = self.type_of(&left)?;
        let right_type = self.type_of(&right)?;
        if !left_type.is_numeric() || !right_type.is_numeric() {
            return Err(incompatible(op, left_type, right_type, &left));
        }
        self.reject_zero_divisor(&right)?;
        let left = self.integral_float(left)?;
        let right = self.integral_float(right)?;
        // Rounding can turn a nonzero divisor into zero.
        self.reject_zero_divisor(&right)?;
        Ok(Checked {
            left,
            right: Some(right),
            operand_type: DataType::Float,
            result_type: DataType::Int,
            coerced: true,
        })
    }

    fn integral_float(&mut self, token: Token) -> CompileResult<Token> {
        let token = match self.type_of(&token)? {
            DataType::Float => self.coerce_checked(token, DataType::Int)?,
            _ => token,
        };
        self.coerce_checked(token, DataType::Float)
    }

    fn check_boolean(&mut self, op: OperatorId, left: Token, right: Option<Token>) -> CompileResult<Checked> {
        let left_type = self.type_of(&left)?;
        if op == OperatorId::Not {
            if right.is_some() {
                return Err(CompileError::internal("'Not' received a second operand").with_token(&left));
            }
            if left_type != DataType::Bool {
                return Err(CompileError::type_compat(format!(
                    "operator 'Not' requires a Boolean operand, found {left_type}"
                ))
                .with_token(&left));
            }
            return Ok(Checked {
                left,
                right: None,
                operand_type: DataType::Bool,
                result_type: DataType::Bool,
                coerced: false,
            });
        }

        let right = require_right(op, &left, right)?;
        let right_type = self.type_of(&right)?;
        if left_type != DataType::Bool || right_type != DataType::Bool {
            return Err(incompatible(op, left_type, right_type, &left));
        }
        Ok(Checked {
            left,
            right: Some(right),
            operand_type: DataType::Bool,
            result_type: DataType::Bool,
            coerced: false,
        })
    }

    fn check_assignment(&mut self, op: OperatorId, target: Token, value: Token) -> CompileResult<Checked> {
        self.check_target(&target)?;
        let target_type = self.type_of(&target)?;
        let value_type = self.type_of(&value)?;

        let Some(base) = operators::compound_base(op) else {
            if value_type != target_type && !(value_type.is_numeric() && target_type.is_numeric()) {
                return Err(CompileError::type_compat(format!(
                    "cannot assign a {value_type} value to '{}' of type {target_type}",
                    target.text
                ))
                .with_token(&value));
            }
            return Ok(Checked {
                left: target,
                right: Some(value),
                operand_type: target_type,
                result_type: target_type,
                coerced: value_type != target_type,
            });
        };

        if target_type == DataType::Str && base != OperatorId::Plus {
            return Err(incompatible(op, target_type, value_type, &target));
        }
        self.check_data_types(base, target, Some(value))
    }

    /// An assignment target must be a declared, non-temporary variable.
    pub(super) fn check_target(&self, target: &Token) -> CompileResult<()> {
        let symbol = self.symbol(target)?;
        let message = match symbol.kind {
            SymbolKind::Constant => "cannot assign to a constant".to_string(),
            SymbolKind::Function => format!("cannot assign to function '{}'", symbol.identifier),
            SymbolKind::Unknown => format!("assignment to undeclared variable '{}'", symbol.identifier),
            SymbolKind::Variable if symbol.is_temporary => {
                "left side of an assignment must be a variable".to_string()
            }
            SymbolKind::Variable if symbol.data_type == DataType::Unspecified => {
                format!("assignment to undeclared variable '{}'", symbol.identifier)
            }
            SymbolKind::Variable => return Ok(()),
        };
        Err(CompileError::semantic(message).with_token(target))
    }

    fn reject_zero_divisor(&self, divisor: &Token) -> CompileResult<()> {
        let zero = match self.constant_of(divisor)? {
            Some(SymbolValue::Int(v)) => v == 0,
            Some(SymbolValue::Float(v)) => v == 0.0,
            _ => false,
        };
        if zero {
            return Err(CompileError::other_semantic("division by zero").with_token(divisor));
        }
        Ok(())
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// Convert `token` to `target` when the language allows it implicitly.
    ///
    /// ## Returns
    /// - `Some(token)` unchanged when the types already match.
    /// - `Some(converted)` for `Integer`/`Double` conversions.
    /// - `None` when no implicit conversion exists.
    pub fn coerce(&mut self, token: Token, target: DataType) -> CompileResult<Option<Token>> {
        let source = self.type_of(&token)?;
        if source == target {
            return Ok(Some(token));
        }
        let opcode = match (source, target) {
            (DataType::Int, DataType::Float) => Opcode::Int2Float,
            (DataType::Float, DataType::Int) => Opcode::Float2R2EInt,
            _ => return Ok(None),
        };
        self.convert(token, opcode, target).map(Some)
    }

    /// Like [`Self::coerce`], failing with `TypeCompatibility` when there is no conversion.
    pub fn coerce_to(&mut self, token: Token, target: DataType) -> CompileResult<Token> {
        let source = self.type_of(&token)?;
        let message = format!("expected {target}, found {source}");
        self.coerce(token.clone(), target)?
            .ok_or_else(|| CompileError::type_compat(message).with_token(&token))
    }

    fn coerce_checked(&mut self, token: Token, target: DataType) -> CompileResult<Token> {
        let source = self.type_of(&token)?;
        self.coerce(token.clone(), target)?.ok_or_else(|| {
            CompileError::internal(format!("no conversion from {source} to {target} after type check"))
                .with_token(&token)
        })
    }

    fn convert(&mut self, token: Token, opcode: Opcode, target: DataType) -> CompileResult<Token> {
        if let Some(value) = self.constant_of(&token)? {
            let converted = convert_constant(&value, target).ok_or_else(|| {
                CompileError::other_semantic(format!("constant {} does not fit in {target}", token.text))
                    .with_token(&token)
            })?;
            self.release(&token);
            return self.constant_temporary(converted, token.span);
        }
        let destination = self.new_temporary(target, token.span)?;
        let operands = [self.operand(&destination)?, self.operand(&token)?];
        self.emitter.emit_op(opcode, operands);
        self.release(&token);
        Ok(destination)
    }
}

/// Compile-time counterpart of `INT2FLOAT` and `FLOAT2R2EINT`.
pub(super) fn convert_constant(value: &SymbolValue, target: DataType) -> Option<SymbolValue> {
    match (value, target) {
        (SymbolValue::Int(v), DataType::Float) => Some(SymbolValue::Float(*v as f64)),
        (SymbolValue::Float(v), DataType::Int) => float_to_int_half_even(*v).map(SymbolValue::Int),
        (SymbolValue::Int(_), DataType::Int)
        | (SymbolValue::Float(_), DataType::Float)
        | (SymbolValue::Str(_), DataType::Str)
        | (SymbolValue::Bool(_), DataType::Bool) => Some(value.clone()),
        _ => None,
    }
}

fn require_right(op: OperatorId, left: &Token, right: Option<Token>) -> CompileResult<Token> {
    right.ok_or_else(|| {
        CompileError::internal(format!("operator '{}' is missing its right operand", operators::as_str(op)))
            .with_token(left)
    })
}

fn incompatible(op: OperatorId, left: DataType, right: DataType, at: &Token) -> CompileError {
    CompileError::type_compat(format!(
        "operator '{}' cannot be applied to {left} and {right}",
        operators::as_str(op)
    ))
    .with_token(at)
}
