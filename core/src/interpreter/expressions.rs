//! Expression evaluation
//!
//! Expression frames leave exactly one value on the value stack when they pop.
//! Operands are evaluated by pushed child frames, left before right, and
//! consumed in reverse.

use super::errors::{ExecutionError, FaultCode};
use super::exec_loop::StepResult;
use super::operators::{apply_binary, apply_unary};
use super::statements::write_binding;
use super::types::{AssignmentPhase, BinaryPhase, EventKind, Frame, FrameKind, UnaryPhase, Value};
use super::vm::ExecutionState;
use crate::parser::ast::{AssignmentOperator, BinaryOperator, NodeId, UnaryOperator};

/// Push the result, pop the frame and hand back the event to record
fn produce(state: &mut ExecutionState, value: Value, event: EventKind) -> StepResult {
    state.push_value(value);
    state.pop_frame()?;
    Ok(Some(event))
}

/// Evaluate Literal
pub fn execute_literal(state: &mut ExecutionState, frame: &Frame, value: &Value) -> StepResult {
    let event = EventKind::EvalLiteral {
        node_id: frame.node,
        value: value.clone(),
    };
    produce(state, value.clone(), event)
}

/// Evaluate Identifier (innermost binding wins)
pub fn execute_identifier(state: &mut ExecutionState, frame: &Frame, name: &str) -> StepResult {
    let (binding, found_in_scope_id) = state
        .scopes
        .lookup(name)
        .ok_or_else(|| ExecutionError::undeclared(name))?;
    if !binding.initialized {
        return Err(ExecutionError::uninitialized(name));
    }
    let value = binding.value.clone();

    let event = EventKind::EvalIdentifier {
        node_id: frame.node,
        name: name.to_string(),
        value: value.clone(),
        found_in_scope_id,
    };
    produce(state, value, event)
}

/// Evaluate BinaryExpression
///
/// Both operands are always evaluated, including for `&&` and `||`.
pub fn execute_binary(
    state: &mut ExecutionState,
    frame: &Frame,
    phase: BinaryPhase,
    operator: BinaryOperator,
    left: NodeId,
    right: NodeId,
) -> StepResult {
    match phase {
        BinaryPhase::Left => {
            state.set_phase(FrameKind::Binary(BinaryPhase::Right))?;
            state.push_expression(left)?;
            Ok(None)
        }

        BinaryPhase::Right => {
            state.set_phase(FrameKind::Binary(BinaryPhase::Apply))?;
            state.push_expression(right)?;
            Ok(None)
        }

        BinaryPhase::Apply => {
            state.expect_operands(2)?;
            let right = state.pop_value()?;
            let left = state.pop_value()?;
            let value = apply_binary(operator, &left, &right)?;

            let event = EventKind::EvalBinary {
                node_id: frame.node,
                operator,
                left,
                right,
                value: value.clone(),
            };
            produce(state, value, event)
        }
    }
}

/// Evaluate UnaryExpression
pub fn execute_unary(
    state: &mut ExecutionState,
    frame: &Frame,
    phase: UnaryPhase,
    operator: UnaryOperator,
    argument: NodeId,
) -> StepResult {
    match phase {
        UnaryPhase::Argument => {
            state.set_phase(FrameKind::Unary(UnaryPhase::Apply))?;
            state.push_expression(argument)?;
            Ok(None)
        }

        UnaryPhase::Apply => {
            state.expect_operands(1)?;
            let argument = state.pop_value()?;
            let value = apply_unary(operator, &argument);

            let event = EventKind::EvalUnary {
                node_id: frame.node,
                operator,
                argument,
                value: value.clone(),
            };
            produce(state, value, event)
        }
    }
}

/// Evaluate AssignmentExpression; its value is the value just stored
pub fn execute_assignment_expression(
    state: &mut ExecutionState,
    frame: &Frame,
    phase: AssignmentPhase,
    operator: AssignmentOperator,
    name: &str,
    value: NodeId,
) -> StepResult {
    match phase {
        AssignmentPhase::Eval => {
            state.set_phase(FrameKind::Assignment(AssignmentPhase::Store))?;
            state.push_expression(value)?;
            Ok(None)
        }

        AssignmentPhase::Store => {
            state.expect_operands(1)?;
            let rhs = state.pop_value()?;
            let (event, stored) = write_binding(state, frame.node, operator, name, rhs)?;
            produce(state, stored, event)
        }

        AssignmentPhase::Enter | AssignmentPhase::Done => Err(ExecutionError::new(
            FaultCode::UnsupportedNode,
            format!("AssignmentExpression {} has no {:?} phase", frame.node, phase),
        )),
    }
}
