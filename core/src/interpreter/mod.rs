//! # Interpreter - Resumable Stack-Driven Execution
//!
//! ## Core Principles
//!
//! 1. **Stack-driven execution**: progress lives in `frames: Vec<Frame>`, never
//!    in host recursion
//! 2. **One transition per step**: `step()` pushes a frame, pops a frame or
//!    records one event
//! 3. **Trace as output**: the ordered event trace is the only record of what a
//!    run did
//! 4. **Pure executor**: no I/O, no threads; the caller decides when to step

pub mod errors;
pub mod exec_loop;
pub mod expressions;
pub mod operators;
pub mod statements;
pub mod types;
pub mod vm;

#[cfg(test)]
mod tests;

use sha2::{Digest, Sha256};

use crate::error::Result;

// Re-export commonly used items
pub use errors::{ExecutionError, FaultCode};
pub use exec_loop::{run_until_done, step};
pub use types::{
    Binding, BranchDirection, Event, EventKind, Frame, Scope, ScopeId, ScopeReason, ScopeStack,
    Value,
};
pub use vm::{start, ExecutionOptions, ExecutionState, ResourceStats, Snapshot, Status};

/// Hex SHA-256 of the JSON form of a trace
///
/// Two runs of the same tree with the same options always yield the same digest.
pub fn trace_digest(trace: &[Event]) -> Result<String> {
    let json = serde_json::to_vec(trace)?;
    let mut hasher = Sha256::new();
    hasher.update(&json);
    Ok(format!("{:x}", hasher.finalize()))
}
