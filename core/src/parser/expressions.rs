//! Expression parsing by precedence climbing
//!
//! Binary levels, loosest first: `||`, `&&`, equality, relational, additive,
//! multiplicative. Prefix `!`, `-` and `+` bind tighter than any binary
//! operator and parentheses restart at the loosest level.

use super::ast::{AssignmentOperator, BinaryOperator, NodeId, NodeKind, Span, UnaryOperator};
use super::diagnostics::DiagnosticCode;
use super::lexer::{Token, TokenKind};
use super::{Abort, PResult, Parser};
use crate::interpreter::types::Value;

impl<'s> Parser<'s> {
    /// Parse a full expression, including assignment
    pub(super) fn parse_expression(&mut self) -> PResult<NodeId> {
        self.nested(|p| p.assignment())
    }

    /// `name = value`, `name op= value`, or a binary chain
    fn assignment(&mut self) -> PResult<NodeId> {
        let is_identifier = self
            .peek()
            .is_some_and(|t| t.kind == TokenKind::Identifier);
        let next = self
            .peek_at(1)
            .filter(|t| t.kind == TokenKind::Punct)
            .map(|t| t.text.clone());
        if !is_identifier {
            return self.binary(1);
        }

        if let Some(operator) = next.as_deref().and_then(AssignmentOperator::from_symbol) {
            let name = self.take()?;
            self.advance();
            let value = self.parse_expression()?;
            let start = name.span.start;
            let kind = NodeKind::AssignmentExpression {
                operator,
                name: name.text,
                value,
            };
            return Ok(self.node(kind, start));
        }

        self.binary(1)
    }

    /// Left-associative binary operators binding at least as tight as `min_precedence`
    fn binary(&mut self, min_precedence: u8) -> PResult<NodeId> {
        let start = self.next_start();
        let mut left = self.unary()?;
        while let Some(operator) = self.peek_binary_operator() {
            let precedence = operator.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.binary(precedence + 1)?;
            left = self.node(
                NodeKind::BinaryExpression {
                    operator,
                    left,
                    right,
                },
                start,
            );
        }
        Ok(left)
    }

    fn peek_binary_operator(&self) -> Option<BinaryOperator> {
        self.peek()
            .filter(|t| t.kind == TokenKind::Punct)
            .and_then(|t| BinaryOperator::from_symbol(&t.text))
    }

    fn unary(&mut self) -> PResult<NodeId> {
        let Some(token) = self.peek().cloned() else {
            return self.primary();
        };
        if token.kind != TokenKind::Punct {
            return self.primary();
        }

        if let Some(operator) = UnaryOperator::from_symbol(&token.text) {
            return self.nested(|p| {
                p.advance();
                let argument = p.unary()?;
                let kind = NodeKind::UnaryExpression { operator, argument };
                Ok(p.node(kind, token.span.start))
            });
        }

        if token.text == "++" || token.text == "--" {
            self.advance();
            let name = self.expect_identifier()?;
            return Ok(self.increment(name, token.text == "++", token.span, token.span.start));
        }

        self.primary()
    }

    fn primary(&mut self) -> PResult<NodeId> {
        let Some(token) = self.peek().cloned() else {
            let span = self.next_span();
            self.error(
                DiagnosticCode::UnexpectedTokenInExpression,
                "Unexpected end of input in expression",
                span,
            );
            return Err(Abort::Syntax);
        };

        let kind = match token.kind {
            TokenKind::Number => {
                let value = token.text.parse::<f64>().unwrap_or(f64::NAN);
                literal(Value::Number(value), &token)
            }
            TokenKind::String => literal(Value::String(string_contents(&token.text)), &token),
            TokenKind::Keyword if token.text == "true" => literal(Value::Boolean(true), &token),
            TokenKind::Keyword if token.text == "false" => literal(Value::Boolean(false), &token),
            TokenKind::Keyword if token.text == "null" => literal(Value::Null, &token),
            TokenKind::Identifier => NodeKind::Identifier {
                name: token.text.clone(),
            },
            TokenKind::Punct if token.text == "(" => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(")")?;
                return Ok(inner);
            }
            _ => {
                let message = format!("Unexpected '{}' in expression", token.text);
                self.error(DiagnosticCode::UnexpectedTokenInExpression, message, token.span);
                return Err(Abort::Syntax);
            }
        };
        self.advance();

        // Postfix `name++` / `name--` is an operand like any other
        if token.kind == TokenKind::Identifier {
            if let Some(op) = self.peek().filter(|t| t.is("++") || t.is("--")).cloned() {
                self.advance();
                let start = token.span.start;
                return Ok(self.increment(token, op.text == "++", op.span, start));
            }
        }
        Ok(self.node(kind, token.span.start))
    }

    /// Consume the next token, which the caller has already inspected
    fn take(&mut self) -> PResult<Token> {
        self.advance().ok_or(Abort::Syntax)
    }

    /// `++name` / `name++` become `name += 1` (and `--` becomes `-= 1`)
    fn increment(&mut self, name: Token, increment: bool, op_span: Span, start: usize) -> NodeId {
        let one = NodeKind::Literal {
            value: Value::Number(1.0),
            raw: "1".to_string(),
        };
        let value = self.node_at(one, op_span);
        let operator = if increment {
            AssignmentOperator::AddAssign
        } else {
            AssignmentOperator::SubAssign
        };
        let kind = NodeKind::AssignmentExpression {
            operator,
            name: name.text,
            value,
        };
        self.node(kind, start)
    }
}

fn literal(value: Value, token: &Token) -> NodeKind {
    NodeKind::Literal {
        value,
        raw: token.text.clone(),
    }
}

/// Text between the quotes, escapes left as written
fn string_contents(raw: &str) -> String {
    let mut chars = raw.chars();
    let quote = chars.next();
    let body = chars.as_str();
    if let Some(inner) = quote.and_then(|q| body.strip_suffix(q)) {
        if !ends_with_escape(inner) {
            return inner.to_string();
        }
    }
    body.to_string()
}

/// True if `text` ends in an odd run of backslashes
fn ends_with_escape(text: &str) -> bool {
    text.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}
