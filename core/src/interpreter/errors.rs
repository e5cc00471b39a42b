//! Execution faults
//!
//! A fault ends a run: the interpreter records exactly one `error` event,
//! moves to `Status::Error` and never steps again.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::parser::ast::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultCode {
    UndeclaredVar,
    UninitializedVar,
    ConstReassign,
    DeclareConflict,
    DivByZero,
    ModByZero,
    MaxSteps,
    MaxScopeDepth,
    TraceOverflow,
    /// Internal invariant violation; never caused by user code on a
    /// well-formed tree
    EvalStackCorruption,
    UnsupportedNode,
}

impl FaultCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultCode::UndeclaredVar => "undeclared-var",
            FaultCode::UninitializedVar => "uninitialized-var",
            FaultCode::ConstReassign => "const-reassign",
            FaultCode::DeclareConflict => "declare-conflict",
            FaultCode::DivByZero => "div-by-zero",
            FaultCode::ModByZero => "mod-by-zero",
            FaultCode::MaxSteps => "max-steps",
            FaultCode::MaxScopeDepth => "max-scope-depth",
            FaultCode::TraceOverflow => "trace-overflow",
            FaultCode::EvalStackCorruption => "eval-stack-corruption",
            FaultCode::UnsupportedNode => "unsupported-node",
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fault that stopped a run
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{code}: {message}")]
pub struct ExecutionError {
    pub code: FaultCode,
    pub message: String,
    /// Node being executed when the fault happened
    pub node_id: Option<NodeId>,
}

impl ExecutionError {
    pub fn new(code: FaultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            node_id: None,
        }
    }

    pub fn at(mut self, node: NodeId) -> Self {
        self.node_id = Some(node);
        self
    }

    pub fn undeclared(name: &str) -> Self {
        Self::new(
            FaultCode::UndeclaredVar,
            format!("'{}' is not declared", name),
        )
    }

    pub fn uninitialized(name: &str) -> Self {
        Self::new(
            FaultCode::UninitializedVar,
            format!("'{}' is used before it is initialized", name),
        )
    }

    pub fn stack_corruption(message: impl Into<String>) -> Self {
        Self::new(FaultCode::EvalStackCorruption, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(FaultCode::UnsupportedNode, message)
    }
}
