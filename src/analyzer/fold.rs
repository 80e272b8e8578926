//! Constant folding.
//!
//! Folded values must equal what the emitted instructions would compute at run time, so the comparison
//! operators are evaluated the way they are lowered (`a <= b` is `Not (a > b)`), and `\` uses the shared
//! truncating integer division.

use std::cmp::Ordering;

use bascule_core::lang::operators::{self, OperatorId};
use bascule_core::numeric::integer_division;
use bascule_core::strings::unescape;

use super::{Checked, ExpressionAnalyzer};
use crate::config::FoldingPolicy;
use crate::frontend::diagnostics::{CompileError, CompileResult};
use crate::frontend::lexer::{Span, Token};
use crate::frontend::symbols::SymbolValue;

impl ExpressionAnalyzer<'_> {
    /// Whether a checked binary operation is evaluated at compile time.
    pub(super) fn should_fold(&self, checked: &Checked) -> CompileResult<bool> {
        let Some(right) = checked.right.as_ref() else {
            return Ok(false);
        };
        let constants = self.constant_of(&checked.left)?.is_some() && self.constant_of(right)?.is_some();
        Ok(constants
            && match self.options.constant_folding {
                FoldingPolicy::Always => true,
                FoldingPolicy::Coercions => checked.coerced,
            })
    }

    pub(super) fn fold_binary(&mut self, op: OperatorId, checked: Checked, span: Span) -> CompileResult<Token> {
        let right = checked
            .right
            .ok_or_else(|| CompileError::internal("binary fold without a right operand"))?;
        let (Some(left_value), Some(right_value)) = (self.constant_of(&checked.left)?, self.constant_of(&right)?)
        else {
            return Err(CompileError::internal("fold of a non-constant operand").at(span));
        };
        let value = fold_values(op, &left_value, &right_value).map_err(|e| e.with_token(&right))?;
        tracing::debug!(operator = operators::as_str(op), ?value, "folded constant operation");
        self.release(&checked.left);
        self.release(&right);
        self.constant_temporary(value, span)
    }
}

/// Evaluate `left op right` on constants that already share the operator's operand type.
///
/// ## Errors
/// - `OtherSemantic` for division by zero and integer overflow.
/// - `Internal` for operand combinations type checking never produces.
///
/// ## Examples
/// ```rust
/// use bascule::analyzer::fold_values;
/// use bascule::frontend::symbols::SymbolValue;
/// use bascule_core::lang::operators::OperatorId;
///
/// let quotient = fold_values(OperatorId::Backslash, &SymbolValue::Float(6.0), &SymbolValue::Float(4.0));
/// assert_eq!(quotient, Ok(SymbolValue::Int(1)));
/// ```
pub fn fold_values(op: OperatorId, left: &SymbolValue, right: &SymbolValue) -> CompileResult<SymbolValue> {
    use SymbolValue::{Bool, Float, Int, Str};

    let value = match (op, left, right) {
        (OperatorId::Plus, Int(a), Int(b)) => Int(a.checked_add(*b).ok_or_else(overflow)?),
        (OperatorId::Minus, Int(a), Int(b)) => Int(a.checked_sub(*b).ok_or_else(overflow)?),
        (OperatorId::Star, Int(a), Int(b)) => Int(a.checked_mul(*b).ok_or_else(overflow)?),
        (OperatorId::Plus, Float(a), Float(b)) => Float(a + b),
        (OperatorId::Minus, Float(a), Float(b)) => Float(a - b),
        (OperatorId::Star, Float(a), Float(b)) => Float(a * b),
        (OperatorId::Slash, Float(_), Float(b)) if *b == 0.0 => return Err(division_by_zero()),
        (OperatorId::Slash, Float(a), Float(b)) => Float(a / b),
        (OperatorId::Backslash, Float(_), Float(b)) if *b == 0.0 => return Err(division_by_zero()),
        (OperatorId::Backslash, Float(a), Float(b)) => Int(integer_division(*a, *b).ok_or_else(overflow)?),
        (OperatorId::Plus, Str(a), Str(b)) => Str(format!("{a}{b}")),
        (OperatorId::And, Bool(a), Bool(b)) => Bool(*a && *b),
        (OperatorId::Or, Bool(a), Bool(b)) => Bool(*a || *b),
        (OperatorId::Lt | OperatorId::Gt | OperatorId::LtEq | OperatorId::GtEq | OperatorId::Eq | OperatorId::NotEq, _, _) => {
            let ordering = compare(left, right).ok_or_else(|| cannot_fold(op, left))?;
            let less = ordering == Some(Ordering::Less);
            let greater = ordering == Some(Ordering::Greater);
            let equal = ordering == Some(Ordering::Equal);
            Bool(match op {
                OperatorId::Lt => less,
                OperatorId::Gt => greater,
                OperatorId::LtEq => !greater,
                OperatorId::GtEq => !less,
                OperatorId::Eq => equal,
                _ => !equal,
            })
        }
        _ => return Err(cannot_fold(op, left)),
    };
    if matches!(value, Float(result) if !result.is_finite()) {
        return Err(float_overflow());
    }
    Ok(value)
}

/// `Not` on a constant.
pub(super) fn fold_not(value: &SymbolValue) -> CompileResult<SymbolValue> {
    match value {
        SymbolValue::Bool(b) => Ok(SymbolValue::Bool(!b)),
        other => Err(cannot_fold(OperatorId::Not, other)),
    }
}

/// Outer `None`: the values are not comparable. Inner `None`: unordered floats.
fn compare(left: &SymbolValue, right: &SymbolValue) -> Option<Option<Ordering>> {
    match (left, right) {
        (SymbolValue::Int(a), SymbolValue::Int(b)) => Some(Some(a.cmp(b))),
        (SymbolValue::Float(a), SymbolValue::Float(b)) => Some(a.partial_cmp(b)),
        (SymbolValue::Str(a), SymbolValue::Str(b)) => Some(Some(unescape(a).cmp(&unescape(b)))),
        (SymbolValue::Bool(a), SymbolValue::Bool(b)) => Some(Some(a.cmp(b))),
        _ => None,
    }
}

fn overflow() -> CompileError {
    CompileError::other_semantic("integer overflow in constant expression")
}

fn float_overflow() -> CompileError {
    CompileError::other_semantic("floating-point overflow in constant expression")
}

fn division_by_zero() -> CompileError {
    CompileError::other_semantic("division by zero")
}

fn cannot_fold(op: OperatorId, operand: &SymbolValue) -> CompileError {
    CompileError::internal(format!(
        "cannot fold '{}' on {operand:?}",
        operators::as_str(op)
    ))
}
