//! Numeric policy: the single source of truth for float→int conversion and integer division.
//!
//! Both the constant folder and the instruction selector use these helpers so that a folded constant is
//! bit-for-bit what the emitted instruction sequence would compute at run time.
//!
//! ## Rules
//! - Implicit float→int conversion rounds half to even (`2.5 → 2`, `3.5 → 4`).
//! - Integer division `a \ b` divides as floats and truncates toward zero (`-7 \ 2 = -3`).

/// Round to the nearest integer, ties to even.
///
/// ## Examples
/// ```rust
/// use bascule_core::numeric::round_half_even;
///
/// assert_eq!(round_half_even(2.5), 2.0);
/// assert_eq!(round_half_even(3.5), 4.0);
/// assert_eq!(round_half_even(-2.5), -2.0);
/// assert_eq!(round_half_even(2.6), 3.0);
/// ```
pub fn round_half_even(value: f64) -> f64 {
    let floor = value.floor();
    let diff = value - floor;
    if diff > 0.5 {
        floor + 1.0
    } else if diff < 0.5 {
        floor
    } else if floor % 2.0 == 0.0 {
        floor
    } else {
        floor + 1.0
    }
}

/// Convert a float to an integer with round-half-to-even.
///
/// ## Returns
/// - `None` when the value is not finite or does not fit in an `i64`.
pub fn float_to_int_half_even(value: f64) -> Option<i64> {
    to_i64(round_half_even(value))
}

/// Integer division on already float-promoted operands, truncating toward zero.
///
/// ## Returns
/// - `None` when the divisor is zero or the quotient does not fit in an `i64`.
///
/// ## Examples
/// ```rust
/// use bascule_core::numeric::integer_division;
///
/// assert_eq!(integer_division(6.0, 4.0), Some(1));
/// assert_eq!(integer_division(-7.0, 2.0), Some(-3));
/// assert_eq!(integer_division(1.0, 0.0), None);
/// ```
pub fn integer_division(lhs: f64, rhs: f64) -> Option<i64> {
    if rhs == 0.0 {
        return None;
    }
    to_i64((lhs / rhs).trunc())
}

fn to_i64(value: f64) -> Option<i64> {
    // `i64::MAX as f64` rounds up to 2^63, which is itself out of range.
    if value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_even_ties() {
        assert_eq!(round_half_even(0.5), 0.0);
        assert_eq!(round_half_even(1.5), 2.0);
        assert_eq!(round_half_even(2.5), 2.0);
        assert_eq!(round_half_even(3.5), 4.0);
        assert_eq!(round_half_even(-0.5), 0.0);
        assert_eq!(round_half_even(-1.5), -2.0);
    }

    #[test]
    fn test_round_half_even_non_ties() {
        assert_eq!(round_half_even(2.4), 2.0);
        assert_eq!(round_half_even(2.6), 3.0);
        assert_eq!(round_half_even(-2.4), -2.0);
        assert_eq!(round_half_even(-2.6), -3.0);
        assert_eq!(round_half_even(7.0), 7.0);
    }

    #[test]
    fn test_float_to_int_rejects_out_of_range() {
        assert_eq!(float_to_int_half_even(f64::NAN), None);
        assert_eq!(float_to_int_half_even(f64::INFINITY), None);
        assert_eq!(float_to_int_half_even(1e300), None);
        assert_eq!(float_to_int_half_even(41.5), Some(42));
    }

    #[test]
    fn test_integer_division_truncates() {
        assert_eq!(integer_division(6.0, 4.0), Some(1));
        assert_eq!(integer_division(7.0, -2.0), Some(-3));
        assert_eq!(integer_division(0.0, 5.0), Some(0));
        assert_eq!(integer_division(5.0, 0.0), None);
    }
}
