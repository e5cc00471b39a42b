//! Basic execution tests: trace shape, stepping contract, determinism

use super::super::*;
use super::helpers::*;
use crate::parser::ast::{DeclarationKind, NodeId, NodeType};
use serde_json::json;

#[test]
fn test_let_declaration_trace() {
    let state = run("let x = 5;");

    assert_eq!(state.status(), Status::Done);
    assert_eq!(
        event_types(&state),
        vec![
            "enter-statement",
            "enter-statement",
            "eval-literal",
            "assign",
            "exit-statement",
            "exit-statement",
            "halt",
        ]
    );

    let trace = state.trace();
    assert_eq!(
        trace[0].kind,
        EventKind::EnterStatement {
            node_id: NodeId(3),
            node_type: NodeType::Program,
            scope_id: 0,
        }
    );
    assert_eq!(
        trace[1].kind,
        EventKind::EnterStatement {
            node_id: NodeId(2),
            node_type: NodeType::VariableDeclaration,
            scope_id: 0,
        }
    );
    assert_eq!(
        trace[2].kind,
        EventKind::EvalLiteral {
            node_id: NodeId(1),
            value: num(5.0),
        }
    );
    assert_eq!(
        trace[3].kind,
        EventKind::Assign {
            node_id: NodeId(2),
            name: "x".to_string(),
            old_value: Value::Null,
            new_value: num(5.0),
            kind: DeclarationKind::Let,
            scope_id: 0,
        }
    );
    assert_eq!(value_of(&state, "x"), Some(num(5.0)));
}

#[test]
fn test_binary_initializer_trace() {
    let state = run("let y = 1 + 2;");

    let evaluated: Vec<EventKind> = state
        .trace()
        .iter()
        .map(|e| e.kind.clone())
        .filter(|k| matches!(k, EventKind::EvalLiteral { .. } | EventKind::EvalBinary { .. }))
        .collect();
    assert_eq!(evaluated.len(), 3);
    assert!(matches!(&evaluated[0], EventKind::EvalLiteral { value, .. } if *value == num(1.0)));
    assert!(matches!(&evaluated[1], EventKind::EvalLiteral { value, .. } if *value == num(2.0)));
    assert!(matches!(
        &evaluated[2],
        EventKind::EvalBinary { left, right, value, .. }
            if *left == num(1.0) && *right == num(2.0) && *value == num(3.0)
    ));
    assert_eq!(assignments(&state), vec![("y".to_string(), num(3.0))]);
}

#[test]
fn test_event_json_shape() {
    let state = run("let x = 5;");
    let events: Vec<serde_json::Value> = state
        .trace()
        .iter()
        .map(|e| serde_json::to_value(e).unwrap())
        .collect();

    assert_eq!(
        events[0],
        json!({"type": "enter-statement", "step": 0, "nodeId": 3, "nodeType": "Program", "scopeId": 0})
    );
    assert_eq!(
        events[3],
        json!({
            "type": "assign",
            "step": 3,
            "nodeId": 2,
            "name": "x",
            "oldValue": null,
            "newValue": 5,
            "kind": "let",
            "scopeId": 0
        })
    );
    assert_eq!(events[6], json!({"type": "halt", "step": 6}));
}

#[test]
fn test_step_indexes_match_trace_positions() {
    let state = run("let a = 1; { let b = a * 2; } a = a + 1;");
    for (index, event) in state.trace().iter().enumerate() {
        assert_eq!(event.step, index);
    }
    assert_eq!(state.step_counter(), state.trace().len());
}

#[test]
fn test_step_count_equals_trace_length() {
    let mut state = start_program("let a = 1; if (a) { a = 2; } else { a = 3; }");
    let mut emitted = 0;
    let mut calls = 0;

    while state.status() == Status::Running {
        if state.step().is_some() {
            emitted += 1;
        }
        calls += 1;
        assert_eq!(emitted, state.trace().len());
        assert_eq!(emitted, state.step_counter());
    }

    // Pushing child frames records nothing
    assert!(calls > emitted);
}

#[test]
fn test_step_returns_emitted_event() {
    let mut state = start_program("let x = 5;");
    while state.status() == Status::Running {
        if let Some(event) = state.step() {
            assert_eq!(Some(&event), state.trace().last());
        }
    }
}

#[test]
fn test_ready_state_does_not_step() {
    let ast = parse_program("let x = 5;");
    let mut state = ExecutionState::new(ast, ExecutionOptions::default());

    assert_eq!(state.status(), Status::Ready);
    assert_eq!(state.frames().len(), 1);
    assert_eq!(state.step(), None);
    assert!(state.trace().is_empty());

    state.begin();
    assert_eq!(state.status(), Status::Running);
    assert!(state.step().is_some());
}

#[test]
fn test_done_state_does_not_step() {
    let mut state = run("let x = 5;");
    let length = state.trace().len();

    assert_eq!(state.step(), None);
    assert_eq!(state.step(), None);
    assert_eq!(state.trace().len(), length);

    state.begin();
    assert_eq!(state.status(), Status::Done);
}

#[test]
fn test_frames_empty_only_when_done() {
    let mut state = start_program("let a = 1; while (a < 3) { a = a + 1; }");
    while state.status() == Status::Running {
        assert!(!state.frames().is_empty());
        state.step();
    }
    assert_eq!(state.status(), Status::Done);
    assert!(state.frames().is_empty());
    assert!(state.eval_stack().is_empty());
}

#[test]
fn test_empty_program() {
    let state = run("");
    assert_eq!(event_types(&state), vec!["enter-statement", "exit-statement", "halt"]);
}

#[test]
fn test_expression_statement_discards_value() {
    let state = run("1 + 2; let z = 3;");
    assert_eq!(state.status(), Status::Done);
    assert!(state.eval_stack().is_empty());
    assert_eq!(assignments(&state), vec![("z".to_string(), num(3.0))]);
}

#[test]
fn test_determinism() {
    let source = "let n = 5; let acc = 1; while (n > 1) { acc *= n; n -= 1; } let s = 'x' + acc;";
    let first = run(source);
    let second = run(source);

    assert_eq!(first.trace(), second.trace());
    assert_eq!(
        serde_json::to_string(first.trace()).unwrap(),
        serde_json::to_string(second.trace()).unwrap()
    );
    assert_eq!(
        trace_digest(first.trace()).unwrap(),
        trace_digest(second.trace()).unwrap()
    );
    assert_eq!(value_of(&first, "s"), Some(string("x120")));
}

#[test]
fn test_digest_differs_between_programs() {
    let a = trace_digest(run("let x = 1;").trace()).unwrap();
    let b = trace_digest(run("let x = 2;").trace()).unwrap();

    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
}

#[test]
fn test_find_binding_reports_scope() {
    let mut state = start_program("let a = 1; { let b = 2; b; }");

    // Stop while the block is still open
    while value_of(&state, "b").is_none() || state.scope_stack().depth() < 2 {
        state.step();
    }
    while !matches!(state.trace().last().map(|e| &e.kind), Some(EventKind::Assign { .. })) {
        state.step();
    }

    let (b, b_scope) = state.find_binding("b").expect("b visible");
    assert_eq!(b.value, num(2.0));
    assert_eq!(b_scope, 1);
    let (_, a_scope) = state.find_binding("a").expect("a visible");
    assert_eq!(a_scope, 0);

    run_until_done(&mut state);
    assert!(state.find_binding("b").is_none());
}

#[test]
fn test_resource_stats() {
    let state = run("{ { let x = 1 + 2; } }");
    let stats = state.stats();

    assert_eq!(stats.max_scope_depth, 3);
    assert_eq!(stats.max_eval_depth, 2);
    // Program, Block, Block, Declaration, Binary, Literal
    assert_eq!(stats.max_frame_depth, 6);
    assert_eq!(stats.events, state.trace().len());
    assert!(stats.transitions > stats.events);
}
