//! Execution phase enums for each node type
//!
//! Each node type has its own Phase enum that tracks which micro-step its
//! frame is at. A frame advances through its phases one `step()` at a time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum ProgramPhase {
    Enter = 0,
    /// Push body statements one by one (cursor = next index), then emit
    /// `exit-statement`
    EvaluateBody = 1,
    /// Pop the root frame and emit `halt`
    Halt = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum BlockPhase {
    OpenScope = 0,
    Enter = 1,
    /// Push statements in turn, then emit `exit-statement`
    EvaluateBody = 2,
    CloseScope = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum DeclarationPhase {
    /// Create every binding of the declaration
    Declare = 0,
    /// Push the next initializer at or after `cursor`; leave when none is left
    Init = 1,
    /// Store the evaluated initializer of declarator `cursor`
    Assign = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum ExpressionStatementPhase {
    Enter = 0,
    Eval = 1,
    /// Drop the value and leave
    Discard = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum AssignmentPhase {
    Enter = 0,
    Eval = 1,
    Store = 2,
    Done = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum IfPhase {
    Enter = 0,
    Test = 1,
    Branch = 2,
    /// Push the branch chosen in `Branch` (cursor: 0 none, 1 then, 2 else)
    RunBranch = 3,
    Done = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum WhilePhase {
    Enter = 0,
    Test = 1,
    Decide = 2,
    Iterate = 3,
    Body = 4,
    Done = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum ForPhase {
    Enter = 0,
    OpenScope = 1,
    Init = 2,
    /// Drop the value of an expression initializer
    DiscardInit = 3,
    Test = 4,
    Decide = 5,
    Iterate = 6,
    Body = 7,
    Update = 8,
    /// Drop the value of the update expression
    DiscardUpdate = 9,
    CloseScope = 10,
    Done = 11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum LiteralPhase {
    Eval = 0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum IdentifierPhase {
    Resolve = 0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum BinaryPhase {
    Left = 0,
    Right = 1,
    Apply = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum UnaryPhase {
    Argument = 0,
    Apply = 1,
}
