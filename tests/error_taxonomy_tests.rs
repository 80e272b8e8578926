//! Error classification tests
//!
//! Every failure is reported as exactly one error class, and the class decides the process exit code.

use bascule::{CompileError, CompilerOptions, ErrorKind, FoldingPolicy, compile_source};

fn compile_err(source: &str) -> CompileError {
    compile_source(source, &CompilerOptions::default()).expect_err("program should be rejected")
}

fn in_main(statements: &str) -> String {
    format!("Scope\n{statements}\nEnd Scope\n")
}

fn assert_kind(source: &str, kind: ErrorKind) {
    let err = compile_err(source);
    assert_eq!(err.kind, kind, "unexpected error for {source:?}: {err}");
}

// ============================================================================
// Lexical
// ============================================================================

#[test]
fn test_lexical_errors() {
    assert_kind(&in_main("Print !\"abc;"), ErrorKind::Lexical);
    assert_kind(&in_main("Print !\"\\q\";"), ErrorKind::Lexical);
    assert_kind(&in_main("Print 1 @ 2;"), ErrorKind::Lexical);
    assert_kind("Scope\n/' never closed\nEnd Scope\n", ErrorKind::Lexical);
}

// ============================================================================
// Syntax
// ============================================================================

#[test]
fn test_syntax_errors() {
    assert_kind(&in_main("Print ;"), ErrorKind::Syntax);
    assert_kind(&in_main("Dim a As Integer\na + 1"), ErrorKind::Syntax);
    assert_kind(&in_main("Dim a As Integer = (1 + 2"), ErrorKind::Syntax);
    assert_kind(&in_main("Dim a As Integer\nIf a = 1\nEnd If"), ErrorKind::Syntax);
    assert_kind(&in_main("Loop"), ErrorKind::Syntax);
    assert_kind("Print 1;\n", ErrorKind::Syntax);
}

// ============================================================================
// Semantic
// ============================================================================

#[test]
fn test_semantic_errors() {
    assert_kind(&in_main("Print b;"), ErrorKind::Semantic);
    assert_kind(&in_main("Print nope(1);"), ErrorKind::Semantic);
    assert_kind(&in_main("Dim a As Integer\nPrint a(1);"), ErrorKind::Semantic);
    assert_kind(&in_main("Dim x As Integer\nDim x As Integer"), ErrorKind::Semantic);
    assert_kind("Declare Function f() As Integer\nScope\nEnd Scope\n", ErrorKind::Semantic);
    assert_kind(
        "Function f() As Integer\nEnd Function\nFunction f() As Integer\nEnd Function\nScope\nEnd Scope\n",
        ErrorKind::Semantic,
    );
}

// ============================================================================
// Type compatibility
// ============================================================================

#[test]
fn test_type_compatibility_errors() {
    assert_kind(&in_main("Print !\"a\" - 1;"), ErrorKind::TypeCompatibility);
    assert_kind(&in_main("Print True + 1;"), ErrorKind::TypeCompatibility);
    assert_kind(&in_main("Print Length();"), ErrorKind::TypeCompatibility);
    assert_kind(&in_main("Print Length(1);"), ErrorKind::TypeCompatibility);
    assert_kind(&in_main("Dim s As String\ns = 1"), ErrorKind::TypeCompatibility);
    assert_kind(&in_main("Dim s As String\ns -= !\"a\""), ErrorKind::TypeCompatibility);
    assert_kind(&in_main("Do While 1\nLoop"), ErrorKind::TypeCompatibility);
}

// ============================================================================
// Other semantic
// ============================================================================

#[test]
fn test_division_by_constant_zero() {
    assert_kind(&in_main("Print 1 / 0;"), ErrorKind::OtherSemantic);
    assert_kind(&in_main("Print 1 \\ 0;"), ErrorKind::OtherSemantic);
    assert_kind(&in_main("Print 5 \\ 0.4;"), ErrorKind::OtherSemantic);
    assert_kind(&in_main("Dim d As Double\nd /= 0"), ErrorKind::OtherSemantic);
}

#[test]
fn test_overflow_while_folding() {
    let options = CompilerOptions::default().with_folding(FoldingPolicy::Always);
    let err = compile_source(&in_main("Print 9223372036854775807 + 1;"), &options).unwrap_err();
    assert_eq!(err.kind, ErrorKind::OtherSemantic);
}

// ============================================================================
// Exit codes and records
// ============================================================================

#[test]
fn test_exit_code_matches_error_class() {
    let cases = [
        (in_main("Print !\"abc;"), 1),
        (in_main("Print ;"), 2),
        (in_main("Print b;"), 3),
        (in_main("Print !\"a\" - 1;"), 4),
        (in_main("Print 1 / 0;"), 6),
    ];
    for (source, code) in cases {
        assert_eq!(compile_err(&source).exit_code(), code, "{source:?}");
    }
}

#[test]
fn test_error_record_has_position_and_token() {
    let err = compile_err("Scope\nDim a As Integer\nPrint a + b;\nEnd Scope\n");
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert_eq!(err.offending_token.as_deref(), Some("b"));
    let position = err.position.expect("position recorded");
    assert_eq!((position.line, position.column), (3, 11));
}
