//! Parser
//!
//! Hand-written recursive-descent statement parser with a precedence-climbing
//! expression parser (see `expressions.rs`). Parsing never fails: malformed
//! input becomes a [`Diagnostic`] and the parser recovers at the next
//! statement boundary, so callers always receive a best-effort [`Ast`].

pub mod ast;
pub mod diagnostics;
mod expressions;
pub mod lexer;
pub mod semantic_validator;


use serde::{Deserialize, Serialize};
use tracing::debug;

pub use ast::{
    AssignmentOperator, Ast, BinaryOperator, DeclarationKind, Declarator, LineIndex, Loc, Node,
    NodeAllocator, NodeId, NodeKind, NodeType, Position, Span, UnaryOperator,
};
pub use diagnostics::{Diagnostic, DiagnosticCode, Severity};
pub use lexer::{tokenize, LexLimits, Token, TokenKind};

/* ===================== Options and Output ===================== */

/// Limits applied while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Largest accepted input, in bytes
    pub max_file_size: usize,
    /// Deepest statement/expression nesting before `max-parse-depth`
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_file_size: 20_000,
            max_depth: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParseStats {
    pub source_bytes: usize,
    pub lines: usize,
    pub tokens: usize,
    pub nodes: usize,
    pub max_depth: usize,
}

/// Result of [`parse`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseOutput {
    pub ast: Ast,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub stats: ParseStats,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/* ===================== Public API ===================== */

/// Parse `source` into an AST.
///
/// Node ids are allocated per call, so two parses of the same text produce
/// identical trees.
pub fn parse(source: &str, options: ParseOptions) -> ParseOutput {
    let lexed = tokenize(
        source,
        LexLimits {
            max_file_size: options.max_file_size,
        },
    );
    let token_count = lexed.tokens.len();

    let mut parser = Parser::new(source, lexed.tokens, options.max_depth);
    parser.errors = lexed.errors;
    let root = parser.parse_program();

    let lines = parser.lines.line_count();
    let max_depth = parser.max_depth_seen;
    let errors = parser.errors;
    let ast = parser.nodes.finish(root);
    let warnings = semantic_validator::validate_ast(&ast, source);

    let stats = ParseStats {
        source_bytes: source.len(),
        lines,
        tokens: token_count,
        nodes: ast.len(),
        max_depth,
    };
    debug!(
        tokens = stats.tokens,
        nodes = stats.nodes,
        errors = errors.len(),
        warnings = warnings.len(),
        "parsed source"
    );

    ParseOutput {
        ast,
        errors,
        warnings,
        stats,
    }
}

/* ===================== Parser State ===================== */

/// Why a parse function gave up. The diagnostic has already been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Abort {
    /// Recover at the next statement boundary
    Syntax,
    /// Nesting limit hit; abandon the whole top-level statement
    Depth,
}

type PResult<T> = std::result::Result<T, Abort>;

struct Parser<'s> {
    tokens: Vec<Token>,
    pos: usize,
    /// End offset of the most recently consumed token
    prev_end: usize,
    lines: LineIndex<'s>,
    nodes: NodeAllocator,
    errors: Vec<Diagnostic>,
    depth: usize,
    max_depth: usize,
    max_depth_seen: usize,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str, tokens: Vec<Token>, max_depth: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            prev_end: 0,
            lines: LineIndex::new(source),
            nodes: NodeAllocator::new(),
            errors: Vec::new(),
            depth: 0,
            max_depth,
            max_depth_seen: 0,
        }
    }

    /* ----- token cursor ----- */

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn at(&self, text: &str) -> bool {
        self.peek().is_some_and(|t| t.is(text))
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        self.prev_end = token.span.end;
        Some(token)
    }

    /// Start offset of the next token (end of input if none)
    fn next_start(&self) -> usize {
        self.peek().map(|t| t.span.start).unwrap_or(self.prev_end)
    }

    fn describe_next(&self) -> String {
        match self.peek() {
            Some(t) => format!("'{}'", t.text),
            None => "end of input".to_string(),
        }
    }

    fn next_span(&self) -> Span {
        self.peek()
            .map(|t| t.span)
            .unwrap_or_else(|| Span::new(self.prev_end, self.prev_end))
    }

    fn expect(&mut self, text: &str) -> PResult<Token> {
        if self.at(text) {
            if let Some(token) = self.advance() {
                return Ok(token);
            }
        }
        let message = format!("Expected '{}' but found {}", text, self.describe_next());
        self.error(DiagnosticCode::ExpectedToken, message, self.next_span());
        Err(Abort::Syntax)
    }

    fn expect_identifier(&mut self) -> PResult<Token> {
        if self.peek().is_some_and(|t| t.kind == TokenKind::Identifier) {
            if let Some(token) = self.advance() {
                return Ok(token);
            }
        }
        let message = format!("Expected identifier but found {}", self.describe_next());
        self.error(DiagnosticCode::ExpectedToken, message, self.next_span());
        Err(Abort::Syntax)
    }

    fn error(&mut self, code: DiagnosticCode, message: impl Into<String>, span: Span) {
        let loc = self.lines.loc(span);
        self.errors.push(Diagnostic::error(code, message, span, loc));
    }

    /// Allocate a node spanning from `start` to the last consumed token
    fn node(&mut self, kind: NodeKind, start: usize) -> NodeId {
        let span = Span::new(start, self.prev_end.max(start));
        self.node_at(kind, span)
    }

    fn node_at(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let loc = self.lines.loc(span);
        self.nodes.alloc(kind, span, loc)
    }

    /// Run `f` one nesting level deeper
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= self.max_depth {
            let message = format!("Maximum nesting depth of {} exceeded", self.max_depth);
            self.error(DiagnosticCode::MaxParseDepth, message, self.next_span());
            return Err(Abort::Depth);
        }
        self.depth += 1;
        self.max_depth_seen = self.max_depth_seen.max(self.depth);
        let result = f(self);
        self.depth -= 1;
        result
    }

    /* ----- recovery ----- */

    /// Skip past the next `;`, or up to the next `}` or end of input
    fn synchronize(&mut self) {
        while let Some(token) = self.peek() {
            if token.is("}") {
                return;
            }
            let done = token.is(";");
            self.advance();
            if done {
                return;
            }
        }
    }

    /// Skip the statement that began at token index `start`, balancing
    /// brackets so nested blocks are skipped whole
    fn skip_statement_from(&mut self, start: usize) {
        self.pos = start;
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            let text = token.text.clone();
            let is_punct = token.kind == TokenKind::Punct;
            if !is_punct {
                self.advance();
                continue;
            }
            match text.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" => depth = depth.saturating_sub(1),
                "}" => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        if !self.at("else") {
                            return;
                        }
                        continue;
                    }
                }
                ";" if depth == 0 => {
                    self.advance();
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /* ===================== Statements ===================== */

    fn parse_program(&mut self) -> NodeId {
        let mut body = Vec::new();
        while !self.at_end() {
            if self.at("}") {
                let span = self.next_span();
                self.error(DiagnosticCode::ExpectedToken, "Unexpected '}'", span);
                self.advance();
                continue;
            }
            let start = self.pos;
            match self.parse_statement() {
                Ok(Some(stmt)) => body.push(stmt),
                Ok(None) => {}
                Err(Abort::Syntax) => self.synchronize(),
                Err(Abort::Depth) => self.skip_statement_from(start),
            }
        }
        let span = match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => Span::new(first.span.start, last.span.end),
            _ => Span::default(),
        };
        self.node_at(NodeKind::Program { body }, span)
    }

    /// Statements up to the closing `}` of a block (the `}` is left unread)
    fn parse_block_body(&mut self) -> PResult<Vec<NodeId>> {
        let mut body = Vec::new();
        while !self.at_end() && !self.at("}") {
            match self.parse_statement() {
                Ok(Some(stmt)) => body.push(stmt),
                Ok(None) => {}
                Err(Abort::Syntax) => self.synchronize(),
                Err(Abort::Depth) => return Err(Abort::Depth),
            }
        }
        Ok(body)
    }

    /// Parse one statement. `Ok(None)` means an empty `;` was skipped.
    fn parse_statement(&mut self) -> PResult<Option<NodeId>> {
        self.nested(|p| {
            let Some(token) = p.peek().cloned() else {
                let span = p.next_span();
                p.error(
                    DiagnosticCode::ExpectedToken,
                    "Expected statement but found end of input",
                    span,
                );
                return Err(Abort::Syntax);
            };

            if token.kind == TokenKind::Keyword {
                match token.text.as_str() {
                    "let" | "const" => {
                        let start = token.span.start;
                        let kind = p.variable_declaration_kind();
                        let declarations = p.declarators(kind)?;
                        p.expect(";")?;
                        let node = NodeKind::VariableDeclaration { kind, declarations };
                        return Ok(Some(p.node(node, start)));
                    }
                    "if" => return p.if_statement().map(Some),
                    "while" => return p.while_statement().map(Some),
                    "for" => return p.for_statement().map(Some),
                    _ => {}
                }
            }
            if token.is("{") {
                return p.block_statement().map(Some);
            }
            if token.is(";") {
                let span = token.span;
                p.error(
                    DiagnosticCode::ExpectedToken,
                    "Expected statement but found ';'",
                    span,
                );
                p.advance();
                return Ok(None);
            }

            p.expression_statement().map(Some)
        })
    }

    fn variable_declaration_kind(&mut self) -> DeclarationKind {
        match self.advance() {
            Some(t) if t.text == "const" => DeclarationKind::Const,
            _ => DeclarationKind::Let,
        }
    }

    /// `name [= init] (, name [= init])*` after the `let`/`const` keyword
    fn declarators(&mut self, kind: DeclarationKind) -> PResult<Vec<Declarator>> {
        let mut declarations = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let init = if self.at("=") {
                self.advance();
                Some(self.parse_expression()?)
            } else {
                if kind == DeclarationKind::Const {
                    let message = format!("Missing initializer in const declaration of '{}'", name.text);
                    self.error(DiagnosticCode::ExpectedToken, message, name.span);
                }
                None
            };
            declarations.push(Declarator {
                name: name.text,
                span: Span::new(name.span.start, self.prev_end),
                init,
            });
            if !self.at(",") {
                return Ok(declarations);
            }
            self.advance();
        }
    }

    fn expression_statement(&mut self) -> PResult<NodeId> {
        let start = self.next_start();
        let expression = self.parse_expression()?;
        self.expect(";")?;
        let is_assignment = matches!(
            self.nodes.get(expression).map(|n| n.node_type()),
            Some(NodeType::AssignmentExpression)
        );
        let kind = if is_assignment {
            NodeKind::AssignmentStatement { expression }
        } else {
            NodeKind::ExpressionStatement { expression }
        };
        Ok(self.node(kind, start))
    }

    fn block_statement(&mut self) -> PResult<NodeId> {
        let start = self.next_start();
        self.expect("{")?;
        let body = self.parse_block_body()?;
        self.expect("}")?;
        Ok(self.node(NodeKind::BlockStatement { body }, start))
    }

    /// A nested statement that must exist (loop/branch bodies). A lone `;`
    /// has already been reported and consumed, so it becomes an empty block
    /// and parsing carries on with the next statement.
    fn required_statement(&mut self) -> PResult<NodeId> {
        let start = self.next_start();
        match self.parse_statement()? {
            Some(stmt) => Ok(stmt),
            None => Ok(self.node(NodeKind::BlockStatement { body: Vec::new() }, start)),
        }
    }

    fn parenthesized(&mut self) -> PResult<NodeId> {
        self.expect("(")?;
        let expr = self.parse_expression()?;
        self.expect(")")?;
        Ok(expr)
    }

    fn if_statement(&mut self) -> PResult<NodeId> {
        let start = self.next_start();
        self.expect("if")?;
        let test = self.parenthesized()?;
        let consequent = self.required_statement()?;
        let alternate = if self.at("else") {
            self.advance();
            Some(self.required_statement()?)
        } else {
            None
        };
        let kind = NodeKind::IfStatement {
            test,
            consequent,
            alternate,
        };
        Ok(self.node(kind, start))
    }

    fn while_statement(&mut self) -> PResult<NodeId> {
        let start = self.next_start();
        self.expect("while")?;
        let test = self.parenthesized()?;
        let body = self.required_statement()?;
        Ok(self.node(NodeKind::WhileStatement { test, body }, start))
    }

    fn for_statement(&mut self) -> PResult<NodeId> {
        let start = self.next_start();
        self.expect("for")?;
        self.expect("(")?;

        let init = if self.at(";") {
            None
        } else if self.at("let") || self.at("const") {
            let decl_start = self.next_start();
            let kind = self.variable_declaration_kind();
            let declarations = self.declarators(kind)?;
            let node = NodeKind::VariableDeclaration { kind, declarations };
            Some(self.node(node, decl_start))
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(";")?;

        let test = if self.at(";") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(";")?;

        let update = if self.at(")") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(")")?;

        let body = self.required_statement()?;
        let kind = NodeKind::ForStatement {
            init,
            test,
            update,
            body,
        };
        Ok(self.node(kind, start))
    }
}
