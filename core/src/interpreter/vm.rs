//! Virtual Machine state
//!
//! [`ExecutionState`] holds everything a run needs: the frame stack, the value
//! stack, the scope stack and the trace. It only changes inside
//! [`ExecutionState::step`], one transition at a time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::errors::{ExecutionError, FaultCode};
use super::exec_loop;
use super::types::{
    Binding, Event, EventKind, Frame, FrameKind, ScopeId, ScopeReason, ScopeStack, Value,
};
use crate::error::{Error, Result};
use crate::parser::ast::{Ast, Node, NodeId, NodeType};

/* ===================== Options and Status ===================== */

/// Resource limits for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOptions {
    /// Most events a run may emit before `max-steps`
    pub max_steps: usize,
    /// Most live scopes, global scope included
    pub max_scope_depth: usize,
    /// Most events the trace may hold before `trace-overflow`
    pub max_trace_length: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            max_scope_depth: 100,
            max_trace_length: 50_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ready,
    Running,
    Done,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ready => "ready",
            Status::Running => "running",
            Status::Done => "done",
            Status::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Peak resource usage of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStats {
    pub max_frame_depth: usize,
    pub max_eval_depth: usize,
    pub max_scope_depth: usize,
    /// `step()` calls that did work
    pub transitions: usize,
    pub events: usize,
}

/// Copy of everything that mutates during a run, except the trace itself.
/// Restoring truncates the trace back to `trace_len`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    frames: Vec<Frame>,
    eval_stack: Vec<Value>,
    scopes: ScopeStack,
    trace_len: usize,
    step_counter: usize,
    status: Status,
    last_error: Option<ExecutionError>,
    stats: ResourceStats,
}

impl Snapshot {
    pub fn step_counter(&self) -> usize {
        self.step_counter
    }

    pub fn status(&self) -> Status {
        self.status
    }
}

/* ===================== ExecutionState ===================== */

/// One run of one program. Not shared between runs.
#[derive(Debug, Clone)]
pub struct ExecutionState {
    pub(crate) ast: Arc<Ast>,
    options: ExecutionOptions,
    pub(crate) frames: Vec<Frame>,
    pub(crate) eval_stack: Vec<Value>,
    pub(crate) scopes: ScopeStack,
    trace: Vec<Event>,
    step_counter: usize,
    pub(crate) status: Status,
    last_error: Option<ExecutionError>,
    stats: ResourceStats,
}

/// Create a state for `ast` and start it running
pub fn start(ast: impl Into<Arc<Ast>>, options: ExecutionOptions) -> ExecutionState {
    let mut state = ExecutionState::new(ast, options);
    state.begin();
    state
}

impl ExecutionState {
    /// Create a `ready` state with the root frame pushed over the program node
    pub fn new(ast: impl Into<Arc<Ast>>, options: ExecutionOptions) -> Self {
        let ast = ast.into();
        let root = ast.root();
        let mut state = Self {
            ast,
            options,
            frames: Vec::new(),
            eval_stack: Vec::new(),
            scopes: ScopeStack::new(),
            trace: Vec::new(),
            step_counter: 0,
            status: Status::Ready,
            last_error: None,
            stats: ResourceStats::default(),
        };
        // A root that is not a Program faults as unsupported-node on the first step.
        state.push_frame(Frame::new(root, NodeType::Program, 0, 0));
        state.stats.max_scope_depth = 1;
        state
    }

    /// Move from `ready` to `running`. No effect in any other status.
    pub fn begin(&mut self) {
        if self.status == Status::Ready {
            self.status = Status::Running;
        }
    }

    /// Perform exactly one transition. Returns the event it emitted, if any;
    /// always `None` unless the state is `running`.
    pub fn step(&mut self) -> Option<Event> {
        exec_loop::step(self)
    }

    /* ----- introspection ----- */

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn trace(&self) -> &[Event] {
        &self.trace
    }

    pub fn step_counter(&self) -> usize {
        self.step_counter
    }

    pub fn scope_stack(&self) -> &ScopeStack {
        &self.scopes
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn eval_stack(&self) -> &[Value] {
        &self.eval_stack
    }

    pub fn last_error(&self) -> Option<&ExecutionError> {
        self.last_error.as_ref()
    }

    pub fn stats(&self) -> &ResourceStats {
        &self.stats
    }

    /// Innermost visible binding for `name` and the scope that holds it
    pub fn find_binding(&self, name: &str) -> Option<(&Binding, ScopeId)> {
        self.scopes.lookup(name)
    }

    /* ----- snapshots ----- */

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            frames: self.frames.clone(),
            eval_stack: self.eval_stack.clone(),
            scopes: self.scopes.clone(),
            trace_len: self.trace.len(),
            step_counter: self.step_counter,
            status: self.status,
            last_error: self.last_error.clone(),
            stats: self.stats,
        }
    }

    /// Rewind to `snapshot`, dropping every event recorded after it
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.trace_len > self.trace.len() {
            return Err(Error::SnapshotAhead {
                snapshot: snapshot.trace_len,
                trace: self.trace.len(),
            });
        }
        self.frames = snapshot.frames.clone();
        self.eval_stack = snapshot.eval_stack.clone();
        self.scopes = snapshot.scopes.clone();
        self.trace.truncate(snapshot.trace_len);
        self.step_counter = snapshot.step_counter;
        self.status = snapshot.status;
        self.last_error = snapshot.last_error.clone();
        self.stats = snapshot.stats;
        Ok(())
    }

    /* ===================== Internal API used by the handlers ===================== */

    pub(crate) fn note_transition(&mut self) {
        self.stats.transitions += 1;
    }

    /// Fault to report before attempting another transition, if a limit is spent
    pub(crate) fn exhausted_limit(&self) -> Option<ExecutionError> {
        if self.step_counter >= self.options.max_steps {
            return Some(ExecutionError::new(
                FaultCode::MaxSteps,
                format!("Step limit of {} reached", self.options.max_steps),
            ));
        }
        if self.trace.len() >= self.options.max_trace_length {
            return Some(ExecutionError::new(
                FaultCode::TraceOverflow,
                format!("Trace limit of {} events reached", self.options.max_trace_length),
            ));
        }
        None
    }

    /// Append an event to the trace
    pub(crate) fn emit(&mut self, kind: EventKind) -> Event {
        let event = Event {
            step: self.step_counter,
            kind,
        };
        self.step_counter += 1;
        self.stats.events = self.step_counter;
        self.trace.push(event.clone());
        event
    }

    /// Stop the run with `error` and record its event
    pub(crate) fn fault(&mut self, mut error: ExecutionError) -> Event {
        if error.node_id.is_none() {
            error.node_id = self.frames.last().map(|f| f.node);
        }
        warn!(code = %error.code, message = %error.message, "execution faulted");
        self.status = Status::Error;
        self.last_error = Some(error.clone());
        self.emit(EventKind::Error {
            code: error.code,
            message: error.message,
            node_id: error.node_id,
        })
    }

    /// Finish the run; called by the program frame after its last event
    pub(crate) fn halt(&mut self) {
        self.status = Status::Done;
        info!(events = self.step_counter + 1, "execution finished");
    }

    /* ----- frames ----- */

    fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
        self.stats.max_frame_depth = self.stats.max_frame_depth.max(self.frames.len());
    }

    pub(crate) fn top_mut(&mut self) -> Result<&mut Frame, ExecutionError> {
        self.frames
            .last_mut()
            .ok_or_else(|| ExecutionError::stack_corruption("frame stack is empty"))
    }

    /// Node `id` of the shared tree, or `unsupported-node` if it does not exist
    pub(crate) fn node(&self, id: NodeId) -> Result<&Node, ExecutionError> {
        self.ast
            .get(id)
            .ok_or_else(|| ExecutionError::unsupported(format!("node {} does not exist", id)))
    }

    /// Push a frame for a statement node
    pub(crate) fn push_statement(&mut self, id: NodeId) -> Result<(), ExecutionError> {
        let node_type = self.node(id)?.node_type();
        if node_type.is_expression() || node_type == NodeType::Program {
            return Err(ExecutionError::unsupported(format!(
                "{} {} cannot be executed as a statement",
                node_type, id
            )));
        }
        self.push_node(id, node_type);
        Ok(())
    }

    /// Push a frame for an expression node
    pub(crate) fn push_expression(&mut self, id: NodeId) -> Result<(), ExecutionError> {
        let node_type = self.node(id)?.node_type();
        if !node_type.is_expression() {
            return Err(ExecutionError::unsupported(format!(
                "{} {} cannot be evaluated as an expression",
                node_type, id
            )));
        }
        self.push_node(id, node_type);
        Ok(())
    }

    fn push_node(&mut self, id: NodeId, node_type: NodeType) {
        let frame = Frame::new(
            id,
            node_type,
            self.scopes.current_id(),
            self.eval_stack.len(),
        );
        self.push_frame(frame);
    }

    /// Pop the top frame, checking it leaves exactly its own results behind
    pub(crate) fn pop_frame(&mut self) -> Result<Frame, ExecutionError> {
        let frame = self
            .frames
            .last()
            .ok_or_else(|| ExecutionError::stack_corruption("frame stack is empty"))?;
        let expected = frame.stack_base + frame.results();
        if self.eval_stack.len() != expected {
            return Err(ExecutionError::stack_corruption(format!(
                "{} {} left {} values on the stack, expected {}",
                frame.node_type,
                frame.node,
                self.eval_stack.len(),
                expected
            )));
        }
        self.frames
            .pop()
            .ok_or_else(|| ExecutionError::stack_corruption("frame stack is empty"))
    }

    pub(crate) fn set_phase(&mut self, kind: FrameKind) -> Result<(), ExecutionError> {
        self.top_mut()?.kind = kind;
        Ok(())
    }

    pub(crate) fn set_cursor(&mut self, cursor: usize) -> Result<(), ExecutionError> {
        self.top_mut()?.cursor = cursor;
        Ok(())
    }

    /* ----- value stack ----- */

    /// Check the top frame has exactly `count` pending child results
    pub(crate) fn expect_operands(&self, count: usize) -> Result<(), ExecutionError> {
        let base = self.frames.last().map(|f| f.stack_base).unwrap_or(0);
        if self.eval_stack.len() != base + count {
            return Err(ExecutionError::stack_corruption(format!(
                "expected {} pending values above depth {}, found {}",
                count,
                base,
                self.eval_stack.len().saturating_sub(base)
            )));
        }
        Ok(())
    }

    pub(crate) fn push_value(&mut self, value: Value) {
        self.eval_stack.push(value);
        self.stats.max_eval_depth = self.stats.max_eval_depth.max(self.eval_stack.len());
    }

    /// Pop a value produced by a child of the top frame
    pub(crate) fn pop_value(&mut self) -> Result<Value, ExecutionError> {
        let base = self.frames.last().map(|f| f.stack_base).unwrap_or(0);
        if self.eval_stack.len() <= base {
            return Err(ExecutionError::stack_corruption(format!(
                "value stack underflow (depth {}, frame base {})",
                self.eval_stack.len(),
                base
            )));
        }
        self.eval_stack
            .pop()
            .ok_or_else(|| ExecutionError::stack_corruption("value stack underflow"))
    }

    /* ----- scopes ----- */

    /// Open a child scope of the current one
    pub(crate) fn open_scope(&mut self, reason: ScopeReason) -> Result<EventKind, ExecutionError> {
        if self.scopes.depth() >= self.options.max_scope_depth {
            return Err(ExecutionError::new(
                FaultCode::MaxScopeDepth,
                format!("Scope depth limit of {} reached", self.options.max_scope_depth),
            ));
        }
        let (scope_id, parent_scope_id) = self.scopes.push();
        self.stats.max_scope_depth = self.stats.max_scope_depth.max(self.scopes.depth());
        debug!(scope_id, parent_scope_id, ?reason, "opened scope");
        Ok(EventKind::EnterScope {
            scope_id,
            parent_scope_id,
            reason,
        })
    }

    /// Close the innermost scope, discarding its bindings
    pub(crate) fn close_scope(&mut self) -> Result<EventKind, ExecutionError> {
        let scope = self
            .scopes
            .pop()
            .ok_or_else(|| ExecutionError::stack_corruption("attempted to close the global scope"))?;
        debug!(scope_id = scope.id, bindings = scope.bindings.len(), "closed scope");
        Ok(EventKind::ExitScope { scope_id: scope.id })
    }
}
