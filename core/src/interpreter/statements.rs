//! Statement execution handlers
//!
//! Each statement type has its own handler that advances its frame by one
//! phase. A handler either pushes a child frame (no event), or records one
//! event, possibly popping its own frame in the same transition.

use super::errors::{ExecutionError, FaultCode};
use super::exec_loop::StepResult;
use super::operators::apply_binary;
use super::types::{
    AssignmentPhase, Binding, BlockPhase, BranchDirection, DeclarationPhase, EventKind,
    ExpressionStatementPhase, ForPhase, Frame, FrameKind, IfPhase, ProgramPhase, ScopeReason,
    Value, WhilePhase,
};
use super::vm::ExecutionState;
use crate::parser::ast::{AssignmentOperator, DeclarationKind, Declarator, NodeId};

/* ===================== Shared Helpers ===================== */

fn enter_statement(state: &ExecutionState, frame: &Frame) -> EventKind {
    EventKind::EnterStatement {
        node_id: frame.node,
        node_type: frame.node_type,
        scope_id: state.scopes.current_id(),
    }
}

fn exit_statement(state: &ExecutionState, frame: &Frame) -> EventKind {
    EventKind::ExitStatement {
        node_id: frame.node,
        node_type: frame.node_type,
        scope_id: state.scopes.current_id(),
    }
}

/// Pop the frame and report `exit-statement`
fn leave(state: &mut ExecutionState, frame: &Frame) -> StepResult {
    state.pop_frame()?;
    Ok(Some(exit_statement(state, frame)))
}

/// Pop the single pending child result
fn take_result(state: &mut ExecutionState) -> Result<Value, ExecutionError> {
    state.expect_operands(1)?;
    state.pop_value()
}

/// Write `rhs` (combined with the current value for compound operators) to the
/// innermost binding named `name`. Nothing is mutated when a check fails.
pub(super) fn write_binding(
    state: &mut ExecutionState,
    node_id: NodeId,
    operator: AssignmentOperator,
    name: &str,
    rhs: Value,
) -> Result<(EventKind, Value), ExecutionError> {
    let (binding, scope_id) = state
        .scopes
        .lookup_mut(name)
        .ok_or_else(|| ExecutionError::undeclared(name))?;

    if binding.kind == DeclarationKind::Const && binding.initialized {
        return Err(ExecutionError::new(
            FaultCode::ConstReassign,
            format!("Cannot assign to const '{}'", name),
        ));
    }

    let new_value = match operator.binary() {
        None => rhs,
        Some(_) if !binding.initialized => return Err(ExecutionError::uninitialized(name)),
        Some(op) => apply_binary(op, &binding.value, &rhs)?,
    };

    let old_value = std::mem::replace(&mut binding.value, new_value.clone());
    binding.initialized = true;

    let event = EventKind::Assign {
        node_id,
        name: name.to_string(),
        old_value,
        new_value: new_value.clone(),
        kind: binding.kind,
        scope_id,
    };
    Ok((event, new_value))
}

/// Push statement `cursor` of a body, or return `false` when the body is done
fn push_next(state: &mut ExecutionState, frame: &Frame, body: &[NodeId]) -> Result<bool, ExecutionError> {
    match body.get(frame.cursor) {
        Some(&child) => {
            state.set_cursor(frame.cursor + 1)?;
            state.push_statement(child)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/* ===================== Statement Handlers ===================== */

/// Execute the Program (root) frame
pub fn execute_program(
    state: &mut ExecutionState,
    frame: &Frame,
    phase: ProgramPhase,
    body: &[NodeId],
) -> StepResult {
    match phase {
        ProgramPhase::Enter => {
            state.set_phase(FrameKind::Program(ProgramPhase::EvaluateBody))?;
            Ok(Some(enter_statement(state, frame)))
        }

        ProgramPhase::EvaluateBody => {
            if push_next(state, frame, body)? {
                return Ok(None);
            }
            state.set_phase(FrameKind::Program(ProgramPhase::Halt))?;
            Ok(Some(exit_statement(state, frame)))
        }

        ProgramPhase::Halt => {
            state.pop_frame()?;
            if !state.frames.is_empty() {
                return Err(ExecutionError::stack_corruption(format!(
                    "{} frames left after the program finished",
                    state.frames.len()
                )));
            }
            state.halt();
            Ok(Some(EventKind::Halt {}))
        }
    }
}

/// Execute Block statement
///
/// The block scope is opened before `enter-statement` and closed after
/// `exit-statement`.
pub fn execute_block(
    state: &mut ExecutionState,
    frame: &Frame,
    phase: BlockPhase,
    body: &[NodeId],
) -> StepResult {
    match phase {
        BlockPhase::OpenScope => {
            let event = state.open_scope(ScopeReason::Block)?;
            state.set_phase(FrameKind::Block(BlockPhase::Enter))?;
            Ok(Some(event))
        }

        BlockPhase::Enter => {
            state.set_phase(FrameKind::Block(BlockPhase::EvaluateBody))?;
            Ok(Some(enter_statement(state, frame)))
        }

        BlockPhase::EvaluateBody => {
            if push_next(state, frame, body)? {
                return Ok(None);
            }
            state.set_phase(FrameKind::Block(BlockPhase::CloseScope))?;
            Ok(Some(exit_statement(state, frame)))
        }

        BlockPhase::CloseScope => {
            state.pop_frame()?;
            state.close_scope().map(Some)
        }
    }
}

/// Execute VariableDeclaration
pub fn execute_declaration(
    state: &mut ExecutionState,
    frame: &Frame,
    phase: DeclarationPhase,
    kind: DeclarationKind,
    declarations: &[Declarator],
) -> StepResult {
    match phase {
        DeclarationPhase::Declare => {
            for declarator in declarations {
                // `let x;` holds null right away; everything else waits for its
                // initializer.
                let initialized = declarator.init.is_none() && kind == DeclarationKind::Let;
                let binding = Binding {
                    name: declarator.name.clone(),
                    kind,
                    value: Value::Null,
                    declared_by: frame.node,
                    initialized,
                };
                if !state.scopes.declare(binding) {
                    return Err(ExecutionError::new(
                        FaultCode::DeclareConflict,
                        format!(
                            "'{}' is already declared in scope {}",
                            declarator.name,
                            state.scopes.current_id()
                        ),
                    ));
                }
            }
            state.set_phase(FrameKind::Declaration(DeclarationPhase::Init))?;
            Ok(Some(enter_statement(state, frame)))
        }

        DeclarationPhase::Init => {
            let next = declarations
                .iter()
                .enumerate()
                .skip(frame.cursor)
                .find_map(|(index, d)| d.init.map(|init| (index, init)));

            match next {
                Some((index, init)) => {
                    state.set_cursor(index)?;
                    state.set_phase(FrameKind::Declaration(DeclarationPhase::Assign))?;
                    state.push_expression(init)?;
                    Ok(None)
                }
                None => leave(state, frame),
            }
        }

        DeclarationPhase::Assign => {
            let value = take_result(state)?;
            let declarator = declarations.get(frame.cursor).ok_or_else(|| {
                ExecutionError::stack_corruption(format!(
                    "declarator {} out of range",
                    frame.cursor
                ))
            })?;

            let (binding, scope_id) = state
                .scopes
                .lookup_mut(&declarator.name)
                .ok_or_else(|| ExecutionError::undeclared(&declarator.name))?;
            let old_value = std::mem::replace(&mut binding.value, value.clone());
            binding.initialized = true;
            let event = EventKind::Assign {
                node_id: frame.node,
                name: declarator.name.clone(),
                old_value,
                new_value: value,
                kind: binding.kind,
                scope_id,
            };

            state.set_cursor(frame.cursor + 1)?;
            state.set_phase(FrameKind::Declaration(DeclarationPhase::Init))?;
            Ok(Some(event))
        }
    }
}

/// Execute ExpressionStatement: evaluate, then drop the value
pub fn execute_expression_statement(
    state: &mut ExecutionState,
    frame: &Frame,
    phase: ExpressionStatementPhase,
    expression: NodeId,
) -> StepResult {
    match phase {
        ExpressionStatementPhase::Enter => {
            state.set_phase(FrameKind::ExpressionStatement(ExpressionStatementPhase::Eval))?;
            Ok(Some(enter_statement(state, frame)))
        }

        ExpressionStatementPhase::Eval => {
            state.set_phase(FrameKind::ExpressionStatement(ExpressionStatementPhase::Discard))?;
            state.push_expression(expression)?;
            Ok(None)
        }

        ExpressionStatementPhase::Discard => {
            take_result(state)?;
            leave(state, frame)
        }
    }
}

/// Execute AssignmentStatement
///
/// The wrapped assignment is performed by this frame directly, so no value is
/// left behind to discard.
pub fn execute_assignment_statement(
    state: &mut ExecutionState,
    frame: &Frame,
    phase: AssignmentPhase,
    operator: AssignmentOperator,
    name: &str,
    value: NodeId,
) -> StepResult {
    match phase {
        AssignmentPhase::Enter => {
            state.set_phase(FrameKind::Assignment(AssignmentPhase::Eval))?;
            Ok(Some(enter_statement(state, frame)))
        }

        AssignmentPhase::Eval => {
            state.set_phase(FrameKind::Assignment(AssignmentPhase::Store))?;
            state.push_expression(value)?;
            Ok(None)
        }

        AssignmentPhase::Store => {
            let rhs = take_result(state)?;
            let (event, _) = write_binding(state, frame.node, operator, name, rhs)?;
            state.set_phase(FrameKind::Assignment(AssignmentPhase::Done))?;
            Ok(Some(event))
        }

        AssignmentPhase::Done => leave(state, frame),
    }
}

/// Execute IfStatement
pub fn execute_if(
    state: &mut ExecutionState,
    frame: &Frame,
    phase: IfPhase,
    test: NodeId,
    consequent: NodeId,
    alternate: Option<NodeId>,
) -> StepResult {
    match phase {
        IfPhase::Enter => {
            state.set_phase(FrameKind::If(IfPhase::Test))?;
            Ok(Some(enter_statement(state, frame)))
        }

        IfPhase::Test => {
            state.set_phase(FrameKind::If(IfPhase::Branch))?;
            state.push_expression(test)?;
            Ok(None)
        }

        IfPhase::Branch => {
            let test_value = take_result(state)?.is_truthy();
            let (direction, cursor) = match (test_value, alternate) {
                (true, _) => (BranchDirection::Then, 1),
                (false, Some(_)) => (BranchDirection::Else, 2),
                (false, None) => (BranchDirection::Skip, 0),
            };
            state.set_cursor(cursor)?;
            state.set_phase(FrameKind::If(IfPhase::RunBranch))?;
            Ok(Some(EventKind::Branch {
                node_id: frame.node,
                test_value,
                direction,
            }))
        }

        IfPhase::RunBranch => {
            let chosen = match frame.cursor {
                1 => Some(consequent),
                2 => alternate,
                _ => None,
            };
            match chosen {
                Some(branch) => {
                    state.set_phase(FrameKind::If(IfPhase::Done))?;
                    state.push_statement(branch)?;
                    Ok(None)
                }
                None => leave(state, frame),
            }
        }

        IfPhase::Done => leave(state, frame),
    }
}

/// Execute WhileStatement
///
/// The loop itself opens no scope; a block body opens a fresh one per pass.
pub fn execute_while(
    state: &mut ExecutionState,
    frame: &Frame,
    phase: WhilePhase,
    test: NodeId,
    body: NodeId,
) -> StepResult {
    match phase {
        WhilePhase::Enter => {
            state.set_phase(FrameKind::While(WhilePhase::Test))?;
            Ok(Some(enter_statement(state, frame)))
        }

        WhilePhase::Test => {
            state.set_phase(FrameKind::While(WhilePhase::Decide))?;
            state.push_expression(test)?;
            Ok(None)
        }

        WhilePhase::Decide => {
            let test_value = take_result(state)?.is_truthy();
            let (direction, next) = if test_value {
                (BranchDirection::Loop, WhilePhase::Iterate)
            } else {
                (BranchDirection::Exit, WhilePhase::Done)
            };
            state.set_phase(FrameKind::While(next))?;
            Ok(Some(EventKind::Branch {
                node_id: frame.node,
                test_value,
                direction,
            }))
        }

        WhilePhase::Iterate => {
            let iteration = frame.cursor + 1;
            state.set_cursor(iteration)?;
            state.set_phase(FrameKind::While(WhilePhase::Body))?;
            Ok(Some(EventKind::LoopIteration {
                node_id: frame.node,
                iteration,
            }))
        }

        WhilePhase::Body => {
            state.set_phase(FrameKind::While(WhilePhase::Test))?;
            state.push_statement(body)?;
            Ok(None)
        }

        WhilePhase::Done => leave(state, frame),
    }
}

/// Execute ForStatement
///
/// One loop scope wraps the whole loop: the init clause declares into it and
/// test, update and body all see the same bindings on every pass.
#[allow(clippy::too_many_arguments)]
pub fn execute_for(
    state: &mut ExecutionState,
    frame: &Frame,
    phase: ForPhase,
    init: Option<NodeId>,
    test: Option<NodeId>,
    update: Option<NodeId>,
    body: NodeId,
) -> StepResult {
    match phase {
        ForPhase::Enter => {
            state.set_phase(FrameKind::For(ForPhase::OpenScope))?;
            Ok(Some(enter_statement(state, frame)))
        }

        ForPhase::OpenScope => {
            let event = state.open_scope(ScopeReason::ForLoop)?;
            state.set_phase(FrameKind::For(ForPhase::Init))?;
            Ok(Some(event))
        }

        ForPhase::Init => {
            let Some(init) = init else {
                state.set_phase(FrameKind::For(ForPhase::Test))?;
                return Ok(None);
            };
            if state.node(init)?.node_type().is_expression() {
                state.set_phase(FrameKind::For(ForPhase::DiscardInit))?;
                state.push_expression(init)?;
            } else {
                state.set_phase(FrameKind::For(ForPhase::Test))?;
                state.push_statement(init)?;
            }
            Ok(None)
        }

        ForPhase::DiscardInit => {
            take_result(state)?;
            state.set_phase(FrameKind::For(ForPhase::Test))?;
            Ok(None)
        }

        ForPhase::Test => {
            state.set_phase(FrameKind::For(ForPhase::Decide))?;
            if let Some(test) = test {
                state.push_expression(test)?;
            }
            Ok(None)
        }

        ForPhase::Decide => {
            // A missing test loops forever (until a limit stops it).
            let test_value = match test {
                Some(_) => take_result(state)?.is_truthy(),
                None => true,
            };
            let (direction, next) = if test_value {
                (BranchDirection::Loop, ForPhase::Iterate)
            } else {
                (BranchDirection::Exit, ForPhase::CloseScope)
            };
            state.set_phase(FrameKind::For(next))?;
            Ok(Some(EventKind::Branch {
                node_id: frame.node,
                test_value,
                direction,
            }))
        }

        ForPhase::Iterate => {
            let iteration = frame.cursor + 1;
            state.set_cursor(iteration)?;
            state.set_phase(FrameKind::For(ForPhase::Body))?;
            Ok(Some(EventKind::LoopIteration {
                node_id: frame.node,
                iteration,
            }))
        }

        ForPhase::Body => {
            state.set_phase(FrameKind::For(ForPhase::Update))?;
            state.push_statement(body)?;
            Ok(None)
        }

        ForPhase::Update => {
            match update {
                Some(update) => {
                    state.set_phase(FrameKind::For(ForPhase::DiscardUpdate))?;
                    state.push_expression(update)?;
                }
                None => state.set_phase(FrameKind::For(ForPhase::Test))?,
            }
            Ok(None)
        }

        ForPhase::DiscardUpdate => {
            take_result(state)?;
            state.set_phase(FrameKind::For(ForPhase::Test))?;
            Ok(None)
        }

        ForPhase::CloseScope => {
            state.expect_operands(0)?;
            let event = state.close_scope()?;
            state.set_phase(FrameKind::For(ForPhase::Done))?;
            Ok(Some(event))
        }

        ForPhase::Done => leave(state, frame),
    }
}
