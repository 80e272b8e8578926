//! Property-based tests for the bascule compiler
//!
//! These tests use proptest to verify invariants across many randomly
//! generated inputs, catching edge cases that hand-written tests might miss.

use bascule::analyzer::precedence::TERMINAL_COUNT;
use bascule::analyzer::{Relation, Terminal, fold_values, relation};
use bascule::frontend::symbols::SymbolValue;
use bascule::{CompilerOptions, ErrorKind, FoldingPolicy, compile_source, compile_to_string};
use bascule_core::lang::operators::OperatorId;
use bascule_core::numeric::round_half_even;
use proptest::prelude::*;

// =============================================================================
// Precedence table
// =============================================================================

#[test]
fn test_relation_is_total_and_deterministic() {
    assert_eq!(Terminal::ALL.len(), TERMINAL_COUNT);
    for top in Terminal::ALL {
        for lookahead in Terminal::ALL {
            let first = relation(top, lookahead);
            assert_eq!(first, relation(top, lookahead));
        }
    }
    assert_eq!(relation(Terminal::End, Terminal::End), Relation::Undefined);
}

// =============================================================================
// Numeric policy
// =============================================================================

proptest! {
    /// Round-half-to-even lands within half a unit and ties go to the even neighbour.
    #[test]
    fn round_half_even_is_nearest_with_even_ties(whole in -1_000_000i64..1_000_000, frac in 0u32..100) {
        let value = whole as f64 + f64::from(frac) / 100.0;
        let rounded = round_half_even(value);
        prop_assert!((rounded - value).abs() <= 0.5);
        prop_assert_eq!(rounded.fract(), 0.0);
        if frac == 50 {
            prop_assert_eq!(rounded % 2.0, 0.0);
        }
    }

    /// Folding `\` truncates exactly like the emitted `DIV` + `FLOAT2INT` sequence.
    #[test]
    fn integer_division_fold_truncates(x in -100_000i64..100_000, y in -1_000i64..1_000) {
        prop_assume!(y != 0);
        let folded = fold_values(OperatorId::Backslash, &SymbolValue::Float(x as f64), &SymbolValue::Float(y as f64));
        prop_assert_eq!(folded, Ok(SymbolValue::Int((x as f64 / y as f64).trunc() as i64)));
    }

    /// Compiling the same source twice yields identical IR.
    #[test]
    fn compilation_is_deterministic(a in 0i64..1000, b in 1i64..1000, always in any::<bool>()) {
        let source = format!("Scope\nDim x As Double = {a} / {b} + {a} * 2\nPrint x;\nEnd Scope\n");
        let policy = if always { FoldingPolicy::Always } else { FoldingPolicy::Coercions };
        let options = CompilerOptions::default().with_folding(policy);
        let first = compile_to_string(&source, &options);
        let second = compile_to_string(&source, &options);
        prop_assert!(first.is_ok());
        prop_assert_eq!(first, second);
    }

    /// Arbitrary input never panics; it compiles or fails with a classified error.
    #[test]
    fn arbitrary_source_never_panics(source in "[ -~\n]{0,120}") {
        if let Err(err) = compile_source(&source, &CompilerOptions::default()) {
            prop_assert_ne!(err.kind, ErrorKind::Internal, "{}", err);
        }
    }
}

// =============================================================================
// Type-check closure
// =============================================================================

const TYPES: [&str; 4] = ["Integer", "Double", "String", "Boolean"];
const BINARY: [&str; 12] = ["+", "-", "*", "/", "\\", "<", ">", "<=", ">=", "=", "<>", "And"];

proptest! {
    /// Any operator on any pair of declared variables either compiles or is a type error.
    #[test]
    fn binary_operation_is_typed_or_rejected(left in 0usize..4, right in 0usize..4, op in 0usize..12) {
        let source = format!(
            "Scope\nDim a As {}\nDim b As {}\nPrint a {} b;\nEnd Scope\n",
            TYPES[left], TYPES[right], BINARY[op]
        );
        match compile_source(&source, &CompilerOptions::default()) {
            Ok(_) => {}
            Err(err) => prop_assert_eq!(err.kind, ErrorKind::TypeCompatibility, "{}: {}", source, err),
        }
    }

    /// Assigning any declared type to any other compiles exactly when both are equal or both numeric.
    #[test]
    fn assignment_follows_conversion_rules(target in 0usize..4, value in 0usize..4) {
        let source = format!(
            "Scope\nDim a As {}\nDim b As {}\na = b\nEnd Scope\n",
            TYPES[target], TYPES[value]
        );
        let numeric = |i: usize| i < 2;
        let allowed = target == value || (numeric(target) && numeric(value));
        let result = compile_source(&source, &CompilerOptions::default());
        prop_assert_eq!(result.is_ok(), allowed);
        if let Err(err) = result {
            prop_assert_eq!(err.kind, ErrorKind::TypeCompatibility);
        }
    }
}
