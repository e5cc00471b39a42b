//! Tests for the semantic validation system

use super::*;
use crate::parser::diagnostics::{DiagnosticCode, Severity};
use crate::parser::{parse, ParseOptions};

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse source and validate, returning warnings
fn validate(source: &str) -> Vec<Diagnostic> {
    let output = parse(source, ParseOptions::default());
    assert!(output.errors.is_empty(), "Parse should succeed: {:?}", output.errors);
    validate_ast(&output.ast, source)
}

/// Check if warnings contain a specific code
fn has_code(warnings: &[Diagnostic], code: DiagnosticCode) -> bool {
    warnings.iter().any(|w| w.code == code)
}

/// Get warnings for a specific code
fn for_code(warnings: &[Diagnostic], code: DiagnosticCode) -> Vec<&Diagnostic> {
    warnings.iter().filter(|w| w.code == code).collect()
}

// ============================================================================
// Undeclared Variable Tests
// ============================================================================

#[test]
fn test_undeclared_read() {
    let warnings = validate("let y = x + 1; y;");
    let undeclared = for_code(&warnings, DiagnosticCode::UndeclaredVariable);
    assert_eq!(undeclared.len(), 1);
    assert!(undeclared[0].message.contains("'x'"));
    assert_eq!(undeclared[0].severity, Severity::Warning);
}

#[test]
fn test_undeclared_assignment() {
    let warnings = validate("x = 1;");
    let undeclared = for_code(&warnings, DiagnosticCode::UndeclaredVariable);
    assert_eq!(undeclared.len(), 1);
    assert!(undeclared[0].message.contains("Assignment"));
}

#[test]
fn test_block_binding_out_of_scope() {
    let warnings = validate("{ let z = 1; z; } z = 2;");
    let undeclared = for_code(&warnings, DiagnosticCode::UndeclaredVariable);
    assert_eq!(undeclared.len(), 1);
    assert_eq!(undeclared[0].loc.start.column, 19);
}

#[test]
fn test_self_reference_in_initializer() {
    let warnings = validate("let x = x;");
    let undeclared = for_code(&warnings, DiagnosticCode::UndeclaredVariable);
    assert_eq!(undeclared.len(), 1);
    assert!(undeclared[0].message.contains("'x'"));
    // The initializer's read does not count as a use either
    assert!(has_code(&warnings, DiagnosticCode::UnusedVariable));
}

#[test]
fn test_earlier_declarator_visible_to_later_initializer() {
    let warnings = validate("let a = 1, b = a; b;");
    assert!(warnings.is_empty(), "{:?}", warnings);
}

#[test]
fn test_use_before_declaration() {
    let warnings = validate("x; let x = 1; x;");
    assert_eq!(for_code(&warnings, DiagnosticCode::UndeclaredVariable).len(), 1);
}

#[test]
fn test_for_header_binding_visible_in_body() {
    let warnings = validate("let total = 0; for (let i = 0; i < 3; i++) { total += i; } total;");
    assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
}

#[test]
fn test_for_binding_not_visible_after_loop() {
    let warnings = validate("for (let i = 0; i < 3; i++) { } i;");
    assert!(has_code(&warnings, DiagnosticCode::UndeclaredVariable));
}

#[test]
fn test_outer_binding_visible_in_nested_blocks() {
    let warnings = validate("let a = 1; { { if (a) { a = 2; } } }");
    assert!(!has_code(&warnings, DiagnosticCode::UndeclaredVariable));
}

// ============================================================================
// Unused Variable Tests
// ============================================================================

#[test]
fn test_unused_variable() {
    let warnings = validate("let x = 5;");
    let unused = for_code(&warnings, DiagnosticCode::UnusedVariable);
    assert_eq!(unused.len(), 1);
    assert!(unused[0].message.contains("'x'"));
}

#[test]
fn test_write_only_variable_is_unused() {
    let warnings = validate("let x = 5; x = 6;");
    assert_eq!(for_code(&warnings, DiagnosticCode::UnusedVariable).len(), 1);
}

#[test]
fn test_compound_assignment_counts_as_read() {
    let warnings = validate("let x = 5; x += 1;");
    assert!(!has_code(&warnings, DiagnosticCode::UnusedVariable));
}

#[test]
fn test_underscore_exempt() {
    let warnings = validate("let _ignored = 1;");
    assert!(warnings.is_empty());
}

#[test]
fn test_shadowed_inner_unused() {
    let warnings = validate("let x = 1; { let x = 2; } x;");
    let unused = for_code(&warnings, DiagnosticCode::UnusedVariable);
    assert_eq!(unused.len(), 1);
    assert_eq!(unused[0].loc.start.column, 18);
}

#[test]
fn test_multiple_declarators() {
    let warnings = validate("let a = 1, b = a;");
    let unused = for_code(&warnings, DiagnosticCode::UnusedVariable);
    assert_eq!(unused.len(), 1);
    assert!(unused[0].message.contains("'b'"));
}

// ============================================================================
// Validator Tests
// ============================================================================

#[test]
fn test_validator_lists_rules() {
    let validator = Validator::new();
    let ids: Vec<&str> = validator.rules().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["undeclared-variable", "unused-variable"]);
}

#[test]
fn test_warnings_sorted_by_position() {
    let warnings = validate("let a = 1; b; let c = 2; d;");
    let starts: Vec<usize> = warnings.iter().map(|w| w.span.start).collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
    assert_eq!(warnings.len(), 4);
}

#[test]
fn test_clean_program() {
    let warnings = validate("let n = 3; let acc = 1; while (n > 0) { acc *= n; n -= 1; } acc;");
    assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
}
