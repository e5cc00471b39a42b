//! Tests for declarations, assignment statements and assignment expressions

use super::super::*;
use super::helpers::*;
use crate::parser::ast::{DeclarationKind, NodeType};
use crate::parser::{parse, ParseOptions};
use maplit::hashmap;

/// Run source that carries parse errors but still yields a usable tree
fn run_lenient(source: &str) -> ExecutionState {
    let output = parse(source, ParseOptions::default());
    assert!(!output.errors.is_empty());
    let mut state = start(output.ast, ExecutionOptions::default());
    run_until_done(&mut state);
    state
}

#[test]
fn test_assignment_statement() {
    let state = run("let x = 1; x = 2;");
    assert_eq!(state.status(), Status::Done);
    assert_eq!(
        assignments(&state),
        vec![("x".to_string(), num(1.0)), ("x".to_string(), num(2.0))]
    );

    // The assign event of a statement carries the statement's node and old value
    let (node_id, old) = state
        .trace()
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::Assign {
                node_id, old_value, ..
            } => Some((*node_id, old_value.clone())),
            _ => None,
        })
        .last()
        .unwrap();
    assert_eq!(old, num(1.0));
    assert_eq!(state.ast().get(node_id).unwrap().node_type(), NodeType::AssignmentStatement);
}

#[test]
fn test_compound_assignment() {
    let state = run("let x = 10; x += 5; x -= 3; x *= 2; x /= 4;");
    assert_eq!(value_of(&state, "x"), Some(num(6.0)));
    let values: Vec<Value> = assignments(&state).into_iter().map(|(_, v)| v).collect();
    assert_eq!(values, vec![num(10.0), num(15.0), num(12.0), num(24.0), num(6.0)]);
}

#[test]
fn test_compound_assignment_concatenates_strings() {
    let state = run("let s = 'a'; s += 1; s += 'b';");
    assert_eq!(value_of(&state, "s"), Some(string("a1b")));
}

#[test]
fn test_compound_division_by_zero() {
    let state = run("let x = 1; x /= 0;");
    assert_eq!(fault_code(&state), Some(FaultCode::DivByZero));
    assert_eq!(value_of(&state, "x"), Some(num(1.0)));
}

#[test]
fn test_increment_and_decrement() {
    let state = run("let i = 0; i++; ++i; i--;");
    assert_eq!(value_of(&state, "i"), Some(num(1.0)));
}

#[test]
fn test_increment_expression_yields_new_value() {
    let state = run("let i = 5; let j = i++;");
    assert_eq!(value_of(&state, "i"), Some(num(6.0)));
    assert_eq!(value_of(&state, "j"), Some(num(6.0)));
}

#[test]
fn test_postfix_increment_inside_binary() {
    let state = run("let x = 1; let y = x++ * 2; let z = x-- + 1;");
    assert_eq!(state.status(), Status::Done);
    assert_eq!(
        globals(&state),
        hashmap! {
            "x".to_string() => num(1.0),
            "y".to_string() => num(4.0),
            "z".to_string() => num(2.0),
        }
    );
}

#[test]
fn test_chained_assignment_expression() {
    let state = run("let a = 0; let b = 0; a = b = 3;");
    assert_eq!(value_of(&state, "a"), Some(num(3.0)));
    assert_eq!(value_of(&state, "b"), Some(num(3.0)));

    // Inner assignment is written first
    let order: Vec<String> = assignments(&state)
        .into_iter()
        .skip(2)
        .map(|(name, _)| name)
        .collect();
    assert_eq!(order, vec!["b", "a"]);
}

#[test]
fn test_assignment_expression_in_condition() {
    let state = run("let n = 0; let hit = 0; if ((n = 4) > 3) { hit = 1; }");
    assert_eq!(value_of(&state, "n"), Some(num(4.0)));
    assert_eq!(value_of(&state, "hit"), Some(num(1.0)));
}

#[test]
fn test_const_reassign() {
    let state = run("const c = 1; c = 2;");
    assert_eq!(state.status(), Status::Error);
    assert_eq!(fault_code(&state), Some(FaultCode::ConstReassign));
    assert_eq!(value_of(&state, "c"), Some(num(1.0)));
    assert_eq!(assignments(&state).len(), 1);
}

#[test]
fn test_const_compound_reassign() {
    let state = run("const c = 1; c += 1;");
    assert_eq!(fault_code(&state), Some(FaultCode::ConstReassign));
    assert_eq!(value_of(&state, "c"), Some(num(1.0)));
}

#[test]
fn test_const_without_initializer_reads_fault() {
    let state = run_lenient("const c; let d = c;");
    assert_eq!(fault_code(&state), Some(FaultCode::UninitializedVar));
}

#[test]
fn test_const_without_initializer_accepts_first_write() {
    let state = run_lenient("const c; c = 7;");
    assert_eq!(state.status(), Status::Done);
    assert_eq!(value_of(&state, "c"), Some(num(7.0)));
}

#[test]
fn test_assign_to_undeclared() {
    let state = run("let a = 1; b = a;");
    assert_eq!(fault_code(&state), Some(FaultCode::UndeclaredVar));
    assert!(state.find_binding("b").is_none());
    assert_eq!(assignments(&state).len(), 1);
}

#[test]
fn test_self_referencing_initializer() {
    let state = run("let a = a;");
    assert_eq!(fault_code(&state), Some(FaultCode::UninitializedVar));
}

#[test]
fn test_compound_on_uninitialized() {
    let state = run("let a = (a += 1);");
    assert_eq!(fault_code(&state), Some(FaultCode::UninitializedVar));
}

#[test]
fn test_let_without_initializer_is_null() {
    let state = run("let x; let y = x;");
    assert_eq!(state.status(), Status::Done);
    assert_eq!(value_of(&state, "x"), Some(Value::Null));
    assert_eq!(value_of(&state, "y"), Some(Value::Null));
    // Only the initialized declarator emits an assign event
    assert_eq!(assignments(&state), vec![("y".to_string(), Value::Null)]);
}

#[test]
fn test_multiple_declarators() {
    let state = run("let a = 1, b, c = a + 1;");
    assert_eq!(
        globals(&state),
        hashmap! {
            "a".to_string() => num(1.0),
            "b".to_string() => Value::Null,
            "c".to_string() => num(2.0),
        }
    );
    assert_eq!(
        assignments(&state),
        vec![("a".to_string(), num(1.0)), ("c".to_string(), num(2.0))]
    );
}

#[test]
fn test_later_declarator_visible_early() {
    // Every declarator is bound before any initializer runs
    let state = run("let a = b, b = 1;");
    assert_eq!(fault_code(&state), Some(FaultCode::UninitializedVar));
}

#[test]
fn test_assign_event_kind() {
    let state = run("const k = 1;");
    let kind = state
        .trace()
        .iter()
        .find_map(|e| match e.kind {
            EventKind::Assign { kind, .. } => Some(kind),
            _ => None,
        })
        .unwrap();
    assert_eq!(kind, DeclarationKind::Const);
}
