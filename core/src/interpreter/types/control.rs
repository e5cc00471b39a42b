//! Execution frame types

use serde::{Deserialize, Serialize};

use super::phase::{
    AssignmentPhase, BinaryPhase, BlockPhase, DeclarationPhase, ExpressionStatementPhase,
    ForPhase, IdentifierPhase, IfPhase, LiteralPhase, ProgramPhase, UnaryPhase, WhilePhase,
};
use super::scope::ScopeId;
use crate::parser::ast::{NodeId, NodeType};

/// Frame kind - which stage machine a frame runs and where it is in it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", content = "phase")]
pub enum FrameKind {
    Program(ProgramPhase),
    Block(BlockPhase),
    Declaration(DeclarationPhase),
    ExpressionStatement(ExpressionStatementPhase),
    /// Shared by `AssignmentStatement` and `AssignmentExpression`
    Assignment(AssignmentPhase),
    If(IfPhase),
    While(WhilePhase),
    For(ForPhase),
    Literal(LiteralPhase),
    Identifier(IdentifierPhase),
    Binary(BinaryPhase),
    Unary(UnaryPhase),
}

impl FrameKind {
    /// Initial frame kind for a node type
    pub fn initial(node_type: NodeType) -> FrameKind {
        match node_type {
            NodeType::Program => FrameKind::Program(ProgramPhase::Enter),
            NodeType::BlockStatement => FrameKind::Block(BlockPhase::OpenScope),
            NodeType::VariableDeclaration => FrameKind::Declaration(DeclarationPhase::Declare),
            NodeType::ExpressionStatement => {
                FrameKind::ExpressionStatement(ExpressionStatementPhase::Enter)
            }
            NodeType::AssignmentStatement => FrameKind::Assignment(AssignmentPhase::Enter),
            NodeType::AssignmentExpression => FrameKind::Assignment(AssignmentPhase::Eval),
            NodeType::IfStatement => FrameKind::If(IfPhase::Enter),
            NodeType::WhileStatement => FrameKind::While(WhilePhase::Enter),
            NodeType::ForStatement => FrameKind::For(ForPhase::Enter),
            NodeType::Literal => FrameKind::Literal(LiteralPhase::Eval),
            NodeType::Identifier => FrameKind::Identifier(IdentifierPhase::Resolve),
            NodeType::BinaryExpression => FrameKind::Binary(BinaryPhase::Left),
            NodeType::UnaryExpression => FrameKind::Unary(UnaryPhase::Argument),
        }
    }
}

/// Execution frame - one per AST node being worked on
///
/// The frame stack replaces the host call stack, so the interpreter state is
/// plain data that can be inspected, copied and resumed between steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub node: NodeId,
    pub node_type: NodeType,
    pub kind: FrameKind,
    /// Child index (statement lists, declarators, loop iterations)
    pub cursor: usize,
    /// Scope that was current when the frame was pushed
    pub scope_id: ScopeId,
    /// Value-stack depth when the frame was pushed
    pub stack_base: usize,
}

impl Frame {
    pub fn new(node: NodeId, node_type: NodeType, scope_id: ScopeId, stack_base: usize) -> Self {
        Self {
            node,
            node_type,
            kind: FrameKind::initial(node_type),
            cursor: 0,
            scope_id,
            stack_base,
        }
    }

    /// Values this frame leaves behind when it pops
    pub fn results(&self) -> usize {
        if self.node_type.is_expression() {
            1
        } else {
            0
        }
    }
}
