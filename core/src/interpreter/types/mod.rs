//! Type definitions for the interpreter
//!
//! - Runtime values (Value)
//! - Scopes and bindings (Scope, ScopeStack, Binding)
//! - Frames and their per-node phases (Frame, FrameKind, *Phase)
//! - Trace events (Event, EventKind)

pub mod control;
pub mod events;
pub mod phase;
pub mod scope;
pub mod values;

// Re-export all types for convenient access
pub use control::{Frame, FrameKind};
pub use events::{BranchDirection, Event, EventKind, ScopeReason};
pub use phase::*;
pub use scope::{Binding, Scope, ScopeId, ScopeStack};
pub use values::Value;
