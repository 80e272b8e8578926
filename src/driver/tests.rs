//! Statement driver unit tests.

use super::*;
use crate::frontend::diagnostics::ErrorKind;

fn compile_str(source: &str) -> CompileResult<Program> {
    compile(source.as_bytes(), &CompilerOptions::default())
}

fn lines(source: &str) -> Vec<String> {
    compile_str(source)
        .unwrap()
        .instructions
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn error_kind(source: &str) -> ErrorKind {
    compile_str(source).unwrap_err().kind
}

/// The main section between its `DEFVAR`s and the closing `POPFRAME`.
fn main_body(source: &str) -> Vec<String> {
    let all = lines(source);
    let start = all.iter().position(|l| l == "PUSHFRAME").unwrap() + 1;
    all[start..all.len() - 1]
        .iter()
        .filter(|l| !l.starts_with("DEFVAR"))
        .cloned()
        .collect()
}

// ========================================
// Program structure
// ========================================

#[test]
fn test_empty_main_scope() {
    assert_eq!(
        lines("Scope\nEnd Scope\n"),
        vec!["JUMP $main", "LABEL $main", "CREATEFRAME", "PUSHFRAME", "POPFRAME"]
    );
}

#[test]
fn test_blank_lines_and_comments_between_statements() {
    let source = "\n' header\nScope\n\n  Dim a As Integer = 5 ' five\n\nEnd Scope\n\n";
    assert_eq!(main_body(source), vec!["MOVE a int@5"]);
}

#[test]
fn test_dim_and_print() {
    let source = "Scope\nDim a As Integer = 5\nPrint a + 1;\nEnd Scope\n";
    assert_eq!(
        lines(source),
        vec![
            "JUMP $main",
            "LABEL $main",
            "CREATEFRAME",
            "PUSHFRAME",
            "DEFVAR a",
            "DEFVAR $t0",
            "MOVE a int@5",
            "ADD $t0 a int@1",
            "WRITE $t0",
            "POPFRAME",
        ]
    );
}

#[test]
fn test_dim_without_initializer_moves_zero_value() {
    let source = "Scope\nDim i As Integer\nDim d As Double\nDim s As String\nDim b As Boolean\nEnd Scope\n";
    assert_eq!(
        main_body(source),
        vec!["MOVE i int@0", "MOVE d float@0.0", "MOVE s string@", "MOVE b bool@false"]
    );
}

#[test]
fn test_dim_initializer_is_converted() {
    let source = "Scope\nDim d As Double = 2\nEnd Scope\n";
    assert_eq!(main_body(source), vec!["MOVE d float@2.0"]);
}

#[test]
fn test_print_writes_each_expression() {
    let source = "Scope\nPrint 1; !\"a\";\nEnd Scope\n";
    assert_eq!(main_body(source), vec!["WRITE int@1", "WRITE string@a"]);
}

#[test]
fn test_input_prompts_then_reads() {
    let source = "Scope\nDim s As String\nInput s\nEnd Scope\n";
    assert_eq!(
        main_body(source),
        vec!["MOVE s string@", "WRITE string@?\\032", "READ s string"]
    );
}

// ========================================
// Conditionals
// ========================================

#[test]
fn test_if_else_layout() {
    let source = "Scope\nDim a As Integer\nIf a < 1 Then\nPrint !\"lt\";\nElse\nPrint !\"ge\";\nEnd If\nEnd Scope\n";
    assert_eq!(
        main_body(source),
        vec![
            "MOVE a int@0",
            "LT $t0 a int@1",
            "JUMPIFNEQ $if0$else0 $t0 bool@true",
            "WRITE string@lt",
            "JUMP $if0$end",
            "LABEL $if0$else0",
            "WRITE string@ge",
            "LABEL $if0$end",
        ]
    );
}

#[test]
fn test_elseif_chain_gets_one_else_label_per_branch() {
    let source = "Scope\nDim p As Boolean\nDim q As Boolean\nIf p Then\nPrint !\"p\";\nElseIf q Then\nPrint !\"q\";\nEnd If\nEnd Scope\n";
    assert_eq!(
        main_body(source),
        vec![
            "MOVE p bool@false",
            "MOVE q bool@false",
            "JUMPIFNEQ $if0$else0 p bool@true",
            "WRITE string@p",
            "JUMP $if0$end",
            "LABEL $if0$else0",
            "JUMPIFNEQ $if0$else1 q bool@true",
            "WRITE string@q",
            "JUMP $if0$end",
            "LABEL $if0$else1",
            "LABEL $if0$end",
        ]
    );
}

#[test]
fn test_non_boolean_condition_is_type_error() {
    let source = "Scope\nDim a As Integer\nIf a Then\nEnd If\nEnd Scope\n";
    assert_eq!(error_kind(source), ErrorKind::TypeCompatibility);
}

// ========================================
// Loops
// ========================================

#[test]
fn test_do_while_loop_layout() {
    let source = "Scope\nDim i As Integer\nDo While i < 3\ni += 1\nLoop\nEnd Scope\n";
    assert_eq!(
        main_body(source),
        vec![
            "MOVE i int@0",
            "LABEL $loop0",
            "LT $t0 i int@3",
            "JUMPIFNEQ $loop0$end $t0 bool@true",
            "ADD i i int@1",
            "LABEL $loop0$continue",
            "JUMP $loop0",
            "LABEL $loop0$end",
        ]
    );
}

#[test]
fn test_do_loop_until_at_bottom() {
    let source = "Scope\nDim i As Integer\nDo\ni += 1\nLoop Until i = 3\nEnd Scope\n";
    assert_eq!(
        main_body(source),
        vec![
            "MOVE i int@0",
            "LABEL $loop0",
            "ADD i i int@1",
            "LABEL $loop0$continue",
            "EQ $t0 i int@3",
            "JUMPIFNEQ $loop0 $t0 bool@true",
            "LABEL $loop0$end",
        ]
    );
}

#[test]
fn test_for_loop_layout() {
    let source = "Scope\nFor i As Integer = 1 To 3\nPrint i;\nNext\nEnd Scope\n";
    assert_eq!(
        lines(source),
        vec![
            "JUMP $main",
            "LABEL $main",
            "CREATEFRAME",
            "PUSHFRAME",
            "DEFVAR i",
            "DEFVAR $loop0$to",
            "DEFVAR $loop0$step",
            "DEFVAR $loop0$cond",
            "MOVE i int@1",
            "MOVE $loop0$to int@3",
            "MOVE $loop0$step int@1",
            "LABEL $loop0",
            "LT $loop0$cond $loop0$step int@0",
            "JUMPIFEQ $loop0$down $loop0$cond bool@true",
            "GT $loop0$cond i $loop0$to",
            "JUMPIFEQ $loop0$end $loop0$cond bool@true",
            "JUMP $loop0$body",
            "LABEL $loop0$down",
            "LT $loop0$cond i $loop0$to",
            "JUMPIFEQ $loop0$end $loop0$cond bool@true",
            "LABEL $loop0$body",
            "WRITE i",
            "LABEL $loop0$continue",
            "ADD i i $loop0$step",
            "JUMP $loop0",
            "LABEL $loop0$end",
            "POPFRAME",
        ]
    );
}

#[test]
fn test_for_loop_step_is_converted_to_control_type() {
    let source = "Scope\nFor x As Double = 0 To 1 Step 1\nNext x\nEnd Scope\n";
    let body = main_body(source);
    assert_eq!(body[0..3], ["MOVE x float@0.0", "MOVE $loop0$to float@1.0", "MOVE $loop0$step float@1.0"]);
}

#[test]
fn test_next_with_other_variable_is_syntax_error() {
    let source = "Scope\nFor i As Integer = 1 To 3\nNext j\nEnd Scope\n";
    assert_eq!(error_kind(source), ErrorKind::Syntax);
}

#[test]
fn test_for_without_as_needs_existing_variable() {
    let source = "Scope\nFor i = 1 To 3\nNext\nEnd Scope\n";
    assert_eq!(error_kind(source), ErrorKind::Semantic);
}

#[test]
fn test_exit_do_jumps_to_loop_end() {
    let source = "Scope\nDo\nExit Do\nLoop\nEnd Scope\n";
    assert_eq!(
        main_body(source),
        vec!["LABEL $loop0", "JUMP $loop0$end", "LABEL $loop0$continue", "JUMP $loop0", "LABEL $loop0$end"]
    );
}

#[test]
fn test_exit_counts_enclosing_loops_of_one_kind() {
    let source = "Scope\nDo\nDo\nExit Do, Do\nLoop\nLoop\nEnd Scope\n";
    assert!(main_body(source).contains(&"JUMP $loop0$end".to_string()));
}

#[test]
fn test_exit_without_enclosing_loop_is_syntax_error() {
    assert_eq!(error_kind("Scope\nExit For\nEnd Scope\n"), ErrorKind::Syntax);
    assert_eq!(error_kind("Scope\nDo\nExit Do, Do\nLoop\nEnd Scope\n"), ErrorKind::Syntax);
}

#[test]
fn test_mixed_loop_kinds_are_syntax_error() {
    let source = "Scope\nDo\nFor i As Integer = 1 To 2\nExit For, Do\nNext\nLoop\nEnd Scope\n";
    assert_eq!(error_kind(source), ErrorKind::Syntax);
}

#[test]
fn test_continue_restores_redefined_variables_first() {
    let source = "Scope\nDim x As Integer\nFor i As Integer = 1 To 2\nDim x As Double\nContinue For\nNext\nEnd Scope\n";
    let body = main_body(source);
    let start = body.iter().position(|l| l == "LABEL $loop0$body").unwrap();
    assert_eq!(
        body[start..start + 7],
        [
            "LABEL $loop0$body",
            "PUSHS x",
            "MOVE x float@0.0",
            "POPS x",
            "JUMP $loop0$continue",
            "POPS x",
            "LABEL $loop0$continue",
        ]
    );
}

// ========================================
// Scopes and redefinition
// ========================================

#[test]
fn test_nested_scope_saves_and_restores_shadowed_variable() {
    let source = "Scope\nDim a As Integer = 1\nScope\nDim a As String\nEnd Scope\nEnd Scope\n";
    assert_eq!(
        lines(source),
        vec![
            "JUMP $main",
            "LABEL $main",
            "CREATEFRAME",
            "PUSHFRAME",
            "DEFVAR a",
            "MOVE a int@1",
            "PUSHS a",
            "MOVE a string@",
            "POPS a",
            "POPFRAME",
        ]
    );
}

#[test]
fn test_redeclaration_in_same_scope_is_semantic_error() {
    let source = "Scope\nDim a As Integer\nDim a As Double\nEnd Scope\n";
    assert_eq!(error_kind(source), ErrorKind::Semantic);
}

#[test]
fn test_variable_named_like_function_is_semantic_error() {
    let source = "Scope\nDim length As Integer\nEnd Scope\n";
    assert_eq!(error_kind(source), ErrorKind::Semantic);
}

#[test]
fn test_variable_is_not_visible_after_its_scope() {
    let source = "Scope\nScope\nDim a As Integer\nEnd Scope\nPrint a;\nEnd Scope\n";
    assert_eq!(error_kind(source), ErrorKind::Semantic);
}

#[test]
fn test_input_into_undeclared_variable_is_semantic_error() {
    assert_eq!(error_kind("Scope\nInput nope\nEnd Scope\n"), ErrorKind::Semantic);
}

// ========================================
// Functions
// ========================================

#[test]
fn test_function_definition_and_call() {
    let source = "Declare Function twice(x As Integer) As Integer\n\
                  Function twice(x As Integer) As Integer\n\
                  Return x * 2\n\
                  End Function\n\
                  Scope\n\
                  Dim a As Integer = twice(4)\n\
                  End Scope\n";
    assert_eq!(
        lines(source),
        vec![
            "JUMP $main",
            "LABEL twice",
            "DEFVAR $t0",
            "MUL $t0 x int@2",
            "PUSHS $t0",
            "RETURN",
            "PUSHS int@0",
            "RETURN",
            "LABEL $main",
            "CREATEFRAME",
            "PUSHFRAME",
            "DEFVAR $t1",
            "DEFVAR a",
            "PUSHS int@4",
            "CREATEFRAME",
            "PUSHFRAME",
            "DEFVAR x",
            "POPS x",
            "CALL twice",
            "POPFRAME",
            "POPS $t1",
            "MOVE a $t1",
            "POPFRAME",
        ]
    );
}

#[test]
fn test_renamed_parameters_are_rebound_through_the_stack() {
    let source = "Declare Function f(a As Integer, b As Integer) As Integer\n\
                  Function f(b As Integer, a As Integer) As Integer\n\
                  Return a\n\
                  End Function\n\
                  Scope\n\
                  End Scope\n";
    let all = lines(source);
    assert_eq!(
        all[1..11],
        [
            "LABEL f",
            "PUSHS a",
            "PUSHS b",
            "POPS a",
            "POPS b",
            "PUSHS a",
            "RETURN",
            "PUSHS int@0",
            "RETURN",
            "LABEL $main",
        ]
    );
}

#[test]
fn test_return_copies_shadowing_value_before_restoring() {
    let source = "Function f(x As Integer) As Integer\n\
                  Scope\n\
                  Dim x As Integer = 2\n\
                  Return x\n\
                  End Scope\n\
                  End Function\n\
                  Scope\n\
                  End Scope\n";
    let all = lines(source);
    assert_eq!(
        all[1..13],
        [
            "LABEL f",
            "DEFVAR $t0",
            "PUSHS x",
            "MOVE x int@2",
            "MOVE $t0 x",
            "POPS x",
            "PUSHS $t0",
            "RETURN",
            "POPS x",
            "PUSHS int@0",
            "RETURN",
            "LABEL $main",
        ]
    );
}

#[test]
fn test_return_outside_function_is_syntax_error() {
    assert_eq!(error_kind("Scope\nReturn 1\nEnd Scope\n"), ErrorKind::Syntax);
}

#[test]
fn test_return_value_must_convert_to_return_type() {
    let source = "Function f() As Integer\nReturn !\"x\"\nEnd Function\nScope\nEnd Scope\n";
    assert_eq!(error_kind(source), ErrorKind::TypeCompatibility);
}

#[test]
fn test_declared_but_undefined_function_is_semantic_error() {
    let source = "Declare Function f() As Integer\nScope\nEnd Scope\n";
    assert_eq!(error_kind(source), ErrorKind::Semantic);
}

#[test]
fn test_definition_must_match_declaration() {
    let source = "Declare Function f(a As Integer) As Integer\nFunction f(a As Double) As Integer\nEnd Function\nScope\nEnd Scope\n";
    assert_eq!(error_kind(source), ErrorKind::Semantic);
}

#[test]
fn test_duplicate_parameter_is_semantic_error() {
    let source = "Function f(a As Integer, a As Integer) As Integer\nEnd Function\nScope\nEnd Scope\n";
    assert_eq!(error_kind(source), ErrorKind::Semantic);
}

#[test]
fn test_builtin_body_is_assembled_only_when_called() {
    let uncalled = lines("Scope\nEnd Scope\n");
    assert!(!uncalled.iter().any(|l| l == "LABEL $length"));
    let called = lines("Scope\nDim n As Integer = Length(!\"abc\")\nEnd Scope\n");
    assert!(called.iter().any(|l| l == "LABEL $length"));
}

// ========================================
// Errors
// ========================================

#[test]
fn test_missing_end_scope_is_syntax_error() {
    assert_eq!(error_kind("Scope\nDim a As Integer\n"), ErrorKind::Syntax);
}

#[test]
fn test_code_after_main_scope_is_syntax_error() {
    assert_eq!(error_kind("Scope\nEnd Scope\nPrint 1;\n"), ErrorKind::Syntax);
}

#[test]
fn test_error_carries_offending_line() {
    let err = compile_str("Scope\nDim a As Integer\na = !\"x\"\nEnd Scope\n").unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeCompatibility);
    let position = err.position.unwrap();
    assert_eq!(position.line, 3);
    assert_eq!(position.source_line.as_deref(), Some("a = !\"x\""));
}
