//! Tests for faults: the single terminal error event and malformed trees

use super::super::*;
use super::helpers::*;
use crate::parser::ast::{Loc, NodeAllocator, NodeId, NodeKind, NodeType, Span};
use crate::parser::Ast;

fn literal(nodes: &mut NodeAllocator, n: f64) -> NodeId {
    let kind = NodeKind::Literal {
        value: Value::Number(n),
        raw: n.to_string(),
    };
    nodes.alloc(kind, Span::default(), Loc::default())
}

fn program(nodes: &mut NodeAllocator, body: Vec<NodeId>) -> NodeId {
    nodes.alloc(NodeKind::Program { body }, Span::default(), Loc::default())
}

fn run_ast(ast: Ast) -> ExecutionState {
    let mut state = start(ast, ExecutionOptions::default());
    run_until_done(&mut state);
    state
}

#[test]
fn test_undeclared_assignment_trace() {
    let state = run("x = 1;");
    assert_eq!(
        event_types(&state),
        vec!["enter-statement", "enter-statement", "eval-literal", "error"]
    );
    assert_eq!(state.status(), Status::Error);

    let error = state.last_error().unwrap();
    assert_eq!(error.code, FaultCode::UndeclaredVar);
    let node = state.ast().get(error.node_id.unwrap()).unwrap();
    assert_eq!(node.node_type(), NodeType::AssignmentStatement);
}

#[test]
fn test_error_event_matches_last_error() {
    let state = run("let a = 1; let b = a / 0;");
    match &last_event(&state).kind {
        EventKind::Error {
            code,
            message,
            node_id,
        } => {
            let error = state.last_error().unwrap();
            assert_eq!(*code, error.code);
            assert_eq!(message, &error.message);
            assert_eq!(*node_id, error.node_id);
            let node = state.ast().get(node_id.unwrap()).unwrap();
            assert_eq!(node.node_type(), NodeType::BinaryExpression);
        }
        other => panic!("expected error event, got {:?}", other),
    }
}

#[test]
fn test_no_events_after_error() {
    let mut state = run("let a = missing;");
    let len = state.trace().len();
    let steps = state.step_counter();
    for _ in 0..5 {
        assert!(state.step().is_none());
    }
    assert_eq!(state.trace().len(), len);
    assert_eq!(state.step_counter(), steps);
    assert_eq!(
        state.trace().iter().filter(|e| e.kind.type_name() == "error").count(),
        1
    );
}

#[test]
fn test_faulted_state_keeps_frames() {
    let state = run("{ let a = missing; }");
    assert_eq!(state.status(), Status::Error);
    assert!(!state.frames().is_empty());
    // The failed block's scope was never closed
    assert_eq!(state.scope_stack().depth(), 2);
}

#[test]
fn test_declare_conflict() {
    let state = run("let a = 1; let a = 2;");
    assert_eq!(fault_code(&state), Some(FaultCode::DeclareConflict));
    assert_eq!(value_of(&state, "a"), Some(num(1.0)));
}

#[test]
fn test_expression_in_statement_position() {
    let mut nodes = NodeAllocator::new();
    let one = literal(&mut nodes, 1.0);
    let root = program(&mut nodes, vec![one]);
    let state = run_ast(nodes.finish(root));

    assert_eq!(event_types(&state), vec!["enter-statement", "error"]);
    assert_eq!(fault_code(&state), Some(FaultCode::UnsupportedNode));
    assert_eq!(state.last_error().unwrap().node_id, Some(root));
}

#[test]
fn test_statement_in_expression_position() {
    let mut nodes = NodeAllocator::new();
    let block = nodes.alloc(
        NodeKind::BlockStatement { body: vec![] },
        Span::default(),
        Loc::default(),
    );
    let statement = nodes.alloc(
        NodeKind::ExpressionStatement { expression: block },
        Span::default(),
        Loc::default(),
    );
    let root = program(&mut nodes, vec![statement]);
    let state = run_ast(nodes.finish(root));

    assert_eq!(fault_code(&state), Some(FaultCode::UnsupportedNode));
    assert_eq!(state.last_error().unwrap().node_id, Some(statement));
}

#[test]
fn test_missing_child() {
    let mut nodes = NodeAllocator::new();
    let root = program(&mut nodes, vec![NodeId(42)]);
    let state = run_ast(nodes.finish(root));
    assert_eq!(fault_code(&state), Some(FaultCode::UnsupportedNode));
}

#[test]
fn test_root_is_not_a_program() {
    let mut nodes = NodeAllocator::new();
    let root = literal(&mut nodes, 3.0);
    let state = run_ast(nodes.finish(root));

    assert_eq!(event_types(&state), vec!["error"]);
    assert_eq!(fault_code(&state), Some(FaultCode::UnsupportedNode));
}

#[test]
fn test_missing_root() {
    let state = run_ast(NodeAllocator::new().finish(NodeId(1)));
    assert_eq!(event_types(&state), vec!["error"]);
    assert_eq!(fault_code(&state), Some(FaultCode::UnsupportedNode));
}

#[test]
fn test_value_stack_underflow() {
    let mut state = start_program("let a = 1;");
    let error = state.pop_value().unwrap_err();
    assert_eq!(error.code, FaultCode::EvalStackCorruption);
}

#[test]
fn test_fault_code_wire_names() {
    let state = run("let a = 1 % 0;");
    let json = serde_json::to_value(last_event(&state)).unwrap();
    assert_eq!(json["type"], "error");
    assert_eq!(json["code"], "mod-by-zero");
    assert!(json["nodeId"].is_number());
}

#[test]
fn test_only_last_event_is_terminal() {
    for source in ["let a = 1; a + 2;", "let a = 1; a / 0;"] {
        let state = run(source);
        let (last, rest) = state.trace().split_last().unwrap();
        assert!(last.kind.is_terminal(), "{}", source);
        assert!(rest.iter().all(|e| !e.kind.is_terminal()), "{}", source);
    }
}
