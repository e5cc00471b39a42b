//! Core execution loop
//!
//! `step()` is the heart of the interpreter. It looks at the top frame,
//! dispatches on (frame kind, node) to a handler and records whatever event
//! the handler produced. Handlers never recurse; nesting lives on the frame
//! stack.
//!
//! ## Function Organization
//! 1. run_until_done() - Top-level driver (calls step repeatedly)
//! 2. step() - One transition, limits and fault handling
//! 3. dispatch() - Routes the top frame to its statement/expression handler

use std::sync::Arc;
use tracing::trace;

use super::errors::ExecutionError;
use super::expressions::{
    execute_assignment_expression, execute_binary, execute_identifier, execute_literal,
    execute_unary,
};
use super::statements::{
    execute_assignment_statement, execute_block, execute_declaration,
    execute_expression_statement, execute_for, execute_if, execute_program, execute_while,
};
use super::types::{Event, EventKind, FrameKind};
use super::vm::{ExecutionState, Status};
use crate::parser::ast::NodeKind;

/// What a handler did: `Some` when its transition produced an event
pub(crate) type StepResult = Result<Option<EventKind>, ExecutionError>;

/* ===================== Public API ===================== */

/// Step until the run is done or faulted and return the final status
pub fn run_until_done(state: &mut ExecutionState) -> Status {
    while state.status() == Status::Running {
        step(state);
    }
    state.status()
}

/// Execute one transition of the state machine
///
/// Returns the event recorded by this transition, if any. Does nothing and
/// returns `None` unless the state is `running`. A fault of any kind stops the
/// run: status becomes `error` and exactly one `error` event is recorded.
pub fn step(state: &mut ExecutionState) -> Option<Event> {
    if state.status != Status::Running {
        return None;
    }

    if let Some(error) = state.exhausted_limit() {
        return Some(state.fault(error));
    }

    state.note_transition();
    match dispatch(state) {
        Ok(Some(kind)) => Some(state.emit(kind)),
        Ok(None) => None,
        Err(error) => Some(state.fault(error)),
    }
}

/* ===================== Dispatch ===================== */

fn dispatch(state: &mut ExecutionState) -> StepResult {
    let frame = state
        .frames
        .last()
        .cloned()
        .ok_or_else(|| ExecutionError::stack_corruption("running with an empty frame stack"))?;

    // The tree is shared and never mutated; hold our own handle so handlers
    // can borrow node fields while mutating the state.
    let ast = Arc::clone(&state.ast);
    let node = ast.get(frame.node).ok_or_else(|| {
        ExecutionError::unsupported(format!("node {} does not exist", frame.node))
    })?;

    trace!(
        node = %frame.node,
        node_type = %frame.node_type,
        kind = ?frame.kind,
        cursor = frame.cursor,
        depth = state.frames.len(),
        "step"
    );

    let result = match (frame.kind, &node.kind) {
        (FrameKind::Program(phase), NodeKind::Program { body }) => {
            execute_program(state, &frame, phase, body)
        }

        (FrameKind::Block(phase), NodeKind::BlockStatement { body }) => {
            execute_block(state, &frame, phase, body)
        }

        (FrameKind::Declaration(phase), NodeKind::VariableDeclaration { kind, declarations }) => {
            execute_declaration(state, &frame, phase, *kind, declarations)
        }

        (FrameKind::ExpressionStatement(phase), NodeKind::ExpressionStatement { expression }) => {
            execute_expression_statement(state, &frame, phase, *expression)
        }

        (FrameKind::Assignment(phase), NodeKind::AssignmentStatement { expression }) => {
            match ast.get(*expression).map(|n| &n.kind) {
                Some(NodeKind::AssignmentExpression {
                    operator,
                    name,
                    value,
                }) => execute_assignment_statement(state, &frame, phase, *operator, name, *value),
                _ => Err(ExecutionError::unsupported(format!(
                    "AssignmentStatement {} does not wrap an AssignmentExpression",
                    frame.node
                ))),
            }
        }

        (
            FrameKind::If(phase),
            NodeKind::IfStatement {
                test,
                consequent,
                alternate,
            },
        ) => execute_if(state, &frame, phase, *test, *consequent, *alternate),

        (FrameKind::While(phase), NodeKind::WhileStatement { test, body }) => {
            execute_while(state, &frame, phase, *test, *body)
        }

        (
            FrameKind::For(phase),
            NodeKind::ForStatement {
                init,
                test,
                update,
                body,
            },
        ) => execute_for(state, &frame, phase, *init, *test, *update, *body),

        (FrameKind::Literal(_), NodeKind::Literal { value, .. }) => {
            execute_literal(state, &frame, value)
        }

        (FrameKind::Identifier(_), NodeKind::Identifier { name }) => {
            execute_identifier(state, &frame, name)
        }

        (
            FrameKind::Binary(phase),
            NodeKind::BinaryExpression {
                operator,
                left,
                right,
            },
        ) => execute_binary(state, &frame, phase, *operator, *left, *right),

        (FrameKind::Unary(phase), NodeKind::UnaryExpression { operator, argument }) => {
            execute_unary(state, &frame, phase, *operator, *argument)
        }

        (
            FrameKind::Assignment(phase),
            NodeKind::AssignmentExpression {
                operator,
                name,
                value,
            },
        ) => execute_assignment_expression(state, &frame, phase, *operator, name, *value),

        (kind, node_kind) => Err(ExecutionError::unsupported(format!(
            "{:?} frame cannot execute {} {}",
            kind,
            node_kind.node_type(),
            frame.node
        ))),
    };

    result.map_err(|error| match error.node_id {
        Some(_) => error,
        None => error.at(frame.node),
    })
}
