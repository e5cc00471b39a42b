//! Execution events
//!
//! The trace of events is the only externally observable record of a run.
//! Events are appended once and never modified.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::scope::ScopeId;
use super::values::Value;
use crate::interpreter::errors::FaultCode;
use crate::parser::ast::{BinaryOperator, DeclarationKind, NodeId, NodeType, UnaryOperator};

/// Which way a conditional or loop test went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchDirection {
    Then,
    Else,
    /// `if` without `else` whose test was false
    Skip,
    /// Loop test was true
    Loop,
    /// Loop test was false
    Exit,
}

/// Why a scope was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeReason {
    Block,
    ForLoop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EventKind {
    #[serde(rename_all = "camelCase")]
    EnterStatement {
        node_id: NodeId,
        node_type: NodeType,
        scope_id: ScopeId,
    },
    #[serde(rename_all = "camelCase")]
    ExitStatement {
        node_id: NodeId,
        node_type: NodeType,
        scope_id: ScopeId,
    },
    #[serde(rename_all = "camelCase")]
    EvalLiteral { node_id: NodeId, value: Value },
    #[serde(rename_all = "camelCase")]
    EvalIdentifier {
        node_id: NodeId,
        name: String,
        value: Value,
        found_in_scope_id: ScopeId,
    },
    #[serde(rename_all = "camelCase")]
    EvalBinary {
        node_id: NodeId,
        operator: BinaryOperator,
        left: Value,
        right: Value,
        value: Value,
    },
    #[serde(rename_all = "camelCase")]
    EvalUnary {
        node_id: NodeId,
        operator: UnaryOperator,
        argument: Value,
        value: Value,
    },
    #[serde(rename_all = "camelCase")]
    Assign {
        node_id: NodeId,
        name: String,
        old_value: Value,
        new_value: Value,
        kind: DeclarationKind,
        scope_id: ScopeId,
    },
    #[serde(rename_all = "camelCase")]
    Branch {
        node_id: NodeId,
        test_value: bool,
        direction: BranchDirection,
    },
    #[serde(rename_all = "camelCase")]
    LoopIteration { node_id: NodeId, iteration: usize },
    #[serde(rename_all = "camelCase")]
    EnterScope {
        scope_id: ScopeId,
        parent_scope_id: ScopeId,
        reason: ScopeReason,
    },
    #[serde(rename_all = "camelCase")]
    ExitScope { scope_id: ScopeId },
    #[serde(rename_all = "camelCase")]
    Error {
        code: FaultCode,
        message: String,
        node_id: Option<NodeId>,
    },
    Halt {},
}

impl EventKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::EnterStatement { .. } => "enter-statement",
            EventKind::ExitStatement { .. } => "exit-statement",
            EventKind::EvalLiteral { .. } => "eval-literal",
            EventKind::EvalIdentifier { .. } => "eval-identifier",
            EventKind::EvalBinary { .. } => "eval-binary",
            EventKind::EvalUnary { .. } => "eval-unary",
            EventKind::Assign { .. } => "assign",
            EventKind::Branch { .. } => "branch",
            EventKind::LoopIteration { .. } => "loop-iteration",
            EventKind::EnterScope { .. } => "enter-scope",
            EventKind::ExitScope { .. } => "exit-scope",
            EventKind::Error { .. } => "error",
            EventKind::Halt {} => "halt",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::Error { .. } | EventKind::Halt {})
    }
}

/// One entry of the trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Position of this event in the trace
    pub step: usize,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Literal values inside events print quoted so `"1"` and `1` stay distinct
struct Shown<'a>(&'a Value);

impl fmt::Display for Shown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.step, self.kind.type_name())?;
        match &self.kind {
            EventKind::EnterStatement {
                node_id, node_type, scope_id,
            }
            | EventKind::ExitStatement {
                node_id, node_type, scope_id,
            } => write!(f, " {}{} scope={}", node_type, node_id, scope_id),
            EventKind::EvalLiteral { value, .. } => write!(f, " {}", Shown(value)),
            EventKind::EvalIdentifier {
                name,
                value,
                found_in_scope_id,
                ..
            } => write!(f, " {} = {} (scope {})", name, Shown(value), found_in_scope_id),
            EventKind::EvalBinary {
                operator,
                left,
                right,
                value,
                ..
            } => write!(f, " {} {} {} => {}", Shown(left), operator, Shown(right), Shown(value)),
            EventKind::EvalUnary {
                operator,
                argument,
                value,
                ..
            } => write!(f, " {}{} => {}", operator, Shown(argument), Shown(value)),
            EventKind::Assign {
                name,
                old_value,
                new_value,
                kind,
                scope_id,
                ..
            } => write!(
                f,
                " {} {}: {} -> {} (scope {})",
                kind.as_str(),
                name,
                Shown(old_value),
                Shown(new_value),
                scope_id
            ),
            EventKind::Branch {
                test_value,
                direction,
                ..
            } => write!(f, " test={} direction={:?}", test_value, direction),
            EventKind::LoopIteration { iteration, .. } => write!(f, " #{}", iteration),
            EventKind::EnterScope {
                scope_id,
                parent_scope_id,
                reason,
            } => write!(f, " {} (parent {}, {:?})", scope_id, parent_scope_id, reason),
            EventKind::ExitScope { scope_id } => write!(f, " {}", scope_id),
            EventKind::Error { code, message, .. } => write!(f, " {}: {}", code, message),
            EventKind::Halt {} => Ok(()),
        }
    }
}
