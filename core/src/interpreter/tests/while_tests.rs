//! Tests for WhileStatement execution

use super::super::*;
use super::helpers::*;
use maplit::hashmap;

fn iterations(state: &ExecutionState) -> Vec<usize> {
    state
        .trace()
        .iter()
        .filter_map(|e| match e.kind {
            EventKind::LoopIteration { iteration, .. } => Some(iteration),
            _ => None,
        })
        .collect()
}

fn directions(state: &ExecutionState) -> Vec<BranchDirection> {
    state
        .trace()
        .iter()
        .filter_map(|e| match e.kind {
            EventKind::Branch { direction, .. } => Some(direction),
            _ => None,
        })
        .collect()
}

#[test]
fn test_counting_loop() {
    let state = run("let i = 0; while (i < 3) { i = i + 1; }");
    assert_eq!(state.status(), Status::Done);
    assert_eq!(value_of(&state, "i"), Some(num(3.0)));
    assert_eq!(iterations(&state), vec![1, 2, 3]);
    assert_eq!(
        directions(&state),
        vec![
            BranchDirection::Loop,
            BranchDirection::Loop,
            BranchDirection::Loop,
            BranchDirection::Exit
        ]
    );
}

#[test]
fn test_loop_never_entered() {
    let state = run("let i = 5; while (i < 3) { i = i + 1; }");
    assert_eq!(value_of(&state, "i"), Some(num(5.0)));
    assert!(iterations(&state).is_empty());
    assert_eq!(directions(&state), vec![BranchDirection::Exit]);
}

#[test]
fn test_fresh_scope_per_iteration() {
    // Re-declaring in the body is fine because each pass gets its own scope
    let state = run("let i = 0; let total = 0; while (i < 3) { let sq = i * i; total += sq; i++; }");
    assert_eq!(state.status(), Status::Done);
    assert_eq!(value_of(&state, "total"), Some(num(5.0)));
    assert!(state.find_binding("sq").is_none());

    let enters = event_types(&state)
        .into_iter()
        .filter(|t| *t == "enter-scope")
        .count();
    assert_eq!(enters, 3);
}

#[test]
fn test_loop_opens_no_scope_of_its_own() {
    let state = run("let i = 0; while (i < 1) i++;");
    assert_eq!(value_of(&state, "i"), Some(num(1.0)));
    assert!(!event_types(&state).contains(&"enter-scope"));
}

#[test]
fn test_iteration_event_follows_branch() {
    let state = run("let go = true; while (go) { go = false; }");
    let types = event_types(&state);
    let branch = types.iter().position(|t| *t == "branch").unwrap();
    assert_eq!(types[branch + 1], "loop-iteration");
    assert_eq!(types[branch + 2], "enter-scope");
}

#[test]
fn test_nested_loops_count_separately() {
    let source = "let i = 0; let n = 0;
        while (i < 2) { let j = 0; while (j < 2) { j++; n++; } i++; }";
    let state = run(source);
    assert_eq!(
        globals(&state),
        hashmap! {
            "i".to_string() => num(2.0),
            "n".to_string() => num(4.0),
        }
    );

    // Outer 1, inner 1 2, outer 2, inner 1 2
    assert_eq!(iterations(&state), vec![1, 1, 2, 2, 1, 2]);
}

#[test]
fn test_fault_inside_body_stops_loop() {
    let state = run("let i = 0; while (i < 10) { i++; if (i == 3) { i = i / 0; } }");
    assert_eq!(fault_code(&state), Some(FaultCode::DivByZero));
    assert_eq!(value_of(&state, "i"), Some(num(3.0)));
    assert_eq!(last_event(&state).kind.type_name(), "error");
}
