//! Test helpers for interpreter tests
//!
//! Common utilities for parsing programs and building execution states

use crate::interpreter::{
    run_until_done, start, Event, EventKind, ExecutionOptions, ExecutionState, FaultCode, Value,
};
use crate::parser::{parse, Ast, ParseOptions};
use std::collections::HashMap;

/// Parse source, asserting it has no parse errors, and round-trip the tree
/// through JSON so every run also exercises `Ast::from_json`
pub fn parse_program(source: &str) -> Ast {
    let output = parse(source, ParseOptions::default());
    assert!(
        output.errors.is_empty(),
        "Parse failed for {:?}: {:?}",
        source,
        output.errors
    );
    let json = output.ast.to_json().expect("AST serialization failed");
    Ast::from_json(&json).expect("AST deserialization failed")
}

/// Parse source and create a running state with default options
pub fn start_program(source: &str) -> ExecutionState {
    start(parse_program(source), ExecutionOptions::default())
}

/// Parse and run to completion with default options
pub fn run(source: &str) -> ExecutionState {
    run_with(source, ExecutionOptions::default())
}

/// Parse and run to completion with custom options
pub fn run_with(source: &str, options: ExecutionOptions) -> ExecutionState {
    let mut state = start(parse_program(source), options);
    run_until_done(&mut state);
    state
}

/// Event type names of the whole trace
pub fn event_types(state: &ExecutionState) -> Vec<&'static str> {
    state.trace().iter().map(|e| e.kind.type_name()).collect()
}

/// Current value of the innermost visible binding for `name`
pub fn value_of(state: &ExecutionState, name: &str) -> Option<Value> {
    state.find_binding(name).map(|(binding, _)| binding.value.clone())
}

/// Values of every global binding, by name
pub fn globals(state: &ExecutionState) -> HashMap<String, Value> {
    state
        .scope_stack()
        .global()
        .bindings
        .iter()
        .map(|(name, binding)| (name.clone(), binding.value.clone()))
        .collect()
}

/// Code of the fault that stopped the run, if any
pub fn fault_code(state: &ExecutionState) -> Option<FaultCode> {
    state.last_error().map(|e| e.code)
}

/// Last event of the trace
pub fn last_event(state: &ExecutionState) -> &Event {
    state.trace().last().expect("trace is empty")
}

/// All `assign` events as `(name, new value)` pairs
pub fn assignments(state: &ExecutionState) -> Vec<(String, Value)> {
    state
        .trace()
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::Assign {
                name, new_value, ..
            } => Some((name.clone(), new_value.clone())),
            _ => None,
        })
        .collect()
}

pub fn num(n: f64) -> Value {
    Value::Number(n)
}

pub fn string(s: &str) -> Value {
    Value::String(s.to_string())
}
