//! Abstract Syntax Tree
//!
//! The tree is stored as an arena: every node lives in `Ast::nodes` and refers
//! to its children by [`NodeId`]. Ids are handed out by the per-parse
//! [`NodeAllocator`], start at 1 and follow creation order, so parsing the same
//! source twice yields identical ids. Children are always created before their
//! parent, which means a child id is strictly smaller than its parent's id and
//! the tree can never contain a cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::interpreter::types::Value;

/* ===================== Ids and Locations ===================== */

/// Unique identifier of a node within one [`Ast`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Half-open byte range `[start, end)` in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// 1-based line and column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Line/column location of a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Loc {
    pub start: Position,
    pub end: Position,
}

/// Converts byte offsets into 1-based line/column positions.
///
/// Columns are counted in characters so multi-byte text highlights correctly.
#[derive(Debug, Clone)]
pub struct LineIndex<'s> {
    source: &'s str,
    line_starts: Vec<usize>,
}

impl<'s> LineIndex<'s> {
    pub fn new(source: &'s str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            source,
            line_starts,
        }
    }

    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = self
            .source
            .get(line_start..offset)
            .map(|text| text.chars().count())
            .unwrap_or(offset - line_start);
        Position {
            line: line + 1,
            column: column + 1,
        }
    }

    pub fn loc(&self, span: Span) -> Loc {
        Loc {
            start: self.position(span.start),
            end: self.position(span.end),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/* ===================== Operators ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "===")]
    StrictEq,
    #[serde(rename = "!==")]
    StrictNotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Rem,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "||" => Self::Or,
            "&&" => Self::And,
            "==" => Self::Eq,
            "!=" => Self::NotEq,
            "===" => Self::StrictEq,
            "!==" => Self::StrictNotEq,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "<=" => Self::LtEq,
            ">=" => Self::GtEq,
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Rem,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::StrictEq => "===",
            Self::StrictNotEq => "!==",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }

    /// Binding power used by the precedence climber (higher binds tighter)
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::NotEq | Self::StrictEq | Self::StrictNotEq => 3,
            Self::Lt | Self::Gt | Self::LtEq | Self::GtEq => 4,
            Self::Add | Self::Sub => 5,
            Self::Mul | Self::Div | Self::Rem => 6,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "+")]
    Plus,
}

impl UnaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "!" => Some(Self::Not),
            "-" => Some(Self::Minus),
            "+" => Some(Self::Plus),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Minus => "-",
            Self::Plus => "+",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentOperator {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    SubAssign,
    #[serde(rename = "*=")]
    MulAssign,
    #[serde(rename = "/=")]
    DivAssign,
}

impl AssignmentOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "=" => Self::Assign,
            "+=" => Self::AddAssign,
            "-=" => Self::SubAssign,
            "*=" => Self::MulAssign,
            "/=" => Self::DivAssign,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::DivAssign => "/=",
        }
    }

    /// The binary operator a compound assignment applies, `None` for plain `=`
    pub fn binary(&self) -> Option<BinaryOperator> {
        match self {
            Self::Assign => None,
            Self::AddAssign => Some(BinaryOperator::Add),
            Self::SubAssign => Some(BinaryOperator::Sub),
            Self::MulAssign => Some(BinaryOperator::Mul),
            Self::DivAssign => Some(BinaryOperator::Div),
        }
    }
}

impl fmt::Display for AssignmentOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration keyword of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Let,
    Const,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Let => "let",
            Self::Const => "const",
        }
    }
}

/* ===================== Nodes ===================== */

/// One `name [= init]` entry of a variable declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declarator {
    pub name: String,
    pub span: Span,
    pub init: Option<NodeId>,
}

/// Variant-specific payload of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    Program {
        body: Vec<NodeId>,
    },
    BlockStatement {
        body: Vec<NodeId>,
    },
    VariableDeclaration {
        kind: DeclarationKind,
        declarations: Vec<Declarator>,
    },
    ExpressionStatement {
        expression: NodeId,
    },
    /// Statement-level `name = value;`, wrapping an `AssignmentExpression`
    AssignmentStatement {
        expression: NodeId,
    },
    IfStatement {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    WhileStatement {
        test: NodeId,
        body: NodeId,
    },
    /// `init` is either a `VariableDeclaration` or an expression
    ForStatement {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    Literal {
        value: Value,
        raw: String,
    },
    Identifier {
        name: String,
    },
    BinaryExpression {
        operator: BinaryOperator,
        left: NodeId,
        right: NodeId,
    },
    UnaryExpression {
        operator: UnaryOperator,
        argument: NodeId,
    },
    AssignmentExpression {
        operator: AssignmentOperator,
        name: String,
        value: NodeId,
    },
}

/// Discriminant of [`NodeKind`], used as the frame's node type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Program,
    BlockStatement,
    VariableDeclaration,
    ExpressionStatement,
    AssignmentStatement,
    IfStatement,
    WhileStatement,
    ForStatement,
    Literal,
    Identifier,
    BinaryExpression,
    UnaryExpression,
    AssignmentExpression,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Program => "Program",
            Self::BlockStatement => "BlockStatement",
            Self::VariableDeclaration => "VariableDeclaration",
            Self::ExpressionStatement => "ExpressionStatement",
            Self::AssignmentStatement => "AssignmentStatement",
            Self::IfStatement => "IfStatement",
            Self::WhileStatement => "WhileStatement",
            Self::ForStatement => "ForStatement",
            Self::Literal => "Literal",
            Self::Identifier => "Identifier",
            Self::BinaryExpression => "BinaryExpression",
            Self::UnaryExpression => "UnaryExpression",
            Self::AssignmentExpression => "AssignmentExpression",
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            Self::Literal
                | Self::Identifier
                | Self::BinaryExpression
                | Self::UnaryExpression
                | Self::AssignmentExpression
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Program { .. } => NodeType::Program,
            Self::BlockStatement { .. } => NodeType::BlockStatement,
            Self::VariableDeclaration { .. } => NodeType::VariableDeclaration,
            Self::ExpressionStatement { .. } => NodeType::ExpressionStatement,
            Self::AssignmentStatement { .. } => NodeType::AssignmentStatement,
            Self::IfStatement { .. } => NodeType::IfStatement,
            Self::WhileStatement { .. } => NodeType::WhileStatement,
            Self::ForStatement { .. } => NodeType::ForStatement,
            Self::Literal { .. } => NodeType::Literal,
            Self::Identifier { .. } => NodeType::Identifier,
            Self::BinaryExpression { .. } => NodeType::BinaryExpression,
            Self::UnaryExpression { .. } => NodeType::UnaryExpression,
            Self::AssignmentExpression { .. } => NodeType::AssignmentExpression,
        }
    }

    /// Direct children in source order
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Self::Program { body } | Self::BlockStatement { body } => body.clone(),
            Self::VariableDeclaration { declarations, .. } => {
                declarations.iter().filter_map(|d| d.init).collect()
            }
            Self::ExpressionStatement { expression } | Self::AssignmentStatement { expression } => {
                vec![*expression]
            }
            Self::IfStatement {
                test,
                consequent,
                alternate,
            } => {
                let mut children = vec![*test, *consequent];
                children.extend(alternate);
                children
            }
            Self::WhileStatement { test, body } => vec![*test, *body],
            Self::ForStatement {
                init,
                test,
                update,
                body,
            } => init
                .iter()
                .chain(test)
                .chain(update)
                .copied()
                .chain(std::iter::once(*body))
                .collect(),
            Self::Literal { .. } | Self::Identifier { .. } => Vec::new(),
            Self::BinaryExpression { left, right, .. } => vec![*left, *right],
            Self::UnaryExpression { argument, .. } => vec![*argument],
            Self::AssignmentExpression { value, .. } => vec![*value],
        }
    }
}

/// A node of the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub span: Span,
    pub loc: Loc,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }
}

/* ===================== Arena ===================== */

/// Hands out node ids for one parse. Never shared between parses.
#[derive(Debug, Default)]
pub struct NodeAllocator {
    nodes: Vec<Node>,
}

impl NodeAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: NodeKind, span: Span, loc: Loc) -> NodeId {
        let id = NodeId(self.nodes.len() as u32 + 1);
        self.nodes.push(Node {
            id,
            span,
            loc,
            kind,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        index_of(id).and_then(|i| self.nodes.get(i))
    }

    pub fn finish(self, root: NodeId) -> Ast {
        Ast {
            nodes: self.nodes,
            root,
        }
    }
}

fn index_of(id: NodeId) -> Option<usize> {
    (id.0 as usize).checked_sub(1)
}

/// Immutable parsed program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        index_of(id).and_then(|i| self.nodes.get(i))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of `id`, empty if the id is unknown
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id).map(|n| n.kind.children()).unwrap_or_default()
    }

    /// Pre-order ids of every node reachable from the root
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut pending = vec![self.root];
        while let Some(id) = pending.pop() {
            if self.get(id).is_none() {
                continue;
            }
            order.push(id);
            pending.extend(self.children(id).into_iter().rev());
        }
        order
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a tree serialized by [`Ast::to_json`].
    ///
    /// Ids must be dense and in creation order, and every child id must be
    /// smaller than its parent's. Dangling child ids are accepted here; the
    /// interpreter reports them when it reaches them.
    pub fn from_json(json: &str) -> Result<Ast> {
        let ast: Ast = serde_json::from_str(json)?;
        for (i, node) in ast.nodes.iter().enumerate() {
            if index_of(node.id) != Some(i) {
                return Err(Error::InvalidAst(format!(
                    "node at position {} has id {}",
                    i + 1,
                    node.id.0
                )));
            }
            if let Some(child) = node.kind.children().into_iter().find(|c| *c >= node.id) {
                return Err(Error::InvalidAst(format!(
                    "node {} refers to child {} which is not older than its parent",
                    node.id, child
                )));
            }
        }
        if ast.get(ast.root).is_none() {
            return Err(Error::InvalidAst(format!("root {} does not exist", ast.root)));
        }
        Ok(ast)
    }
}
