//! Semantic Validation
//!
//! Rule-based checks that run on the parsed tree and produce warnings. They
//! never block execution: the interpreter reports the same problems as faults
//! when (and if) it reaches them.
//!
//! # Adding a New Rule
//!
//! 1. Create a new file in `semantic_validator/rules/`
//! 2. Implement `ValidationRule` for your struct
//! 3. Add it to the `Validator::new()` constructor

pub mod rules;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use super::ast::{Ast, LineIndex, NodeId, NodeKind, Span};
use super::diagnostics::Diagnostic;

// ============================================================================
// ValidationRule Trait
// ============================================================================

/// Trait that all validation rules must implement.
pub trait ValidationRule: Send + Sync {
    /// Unique identifier for this rule (e.g., "unused-variable")
    fn id(&self) -> &'static str;

    /// Human-readable description of what this rule checks
    fn description(&self) -> &'static str;

    /// Run the validation and return any diagnostics found.
    fn validate(&self, ast: &Ast, resolution: &Resolution, lines: &LineIndex) -> Vec<Diagnostic>;
}

// ============================================================================
// Validator - Runs All Rules
// ============================================================================

pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Create a new validator with all built-in rules.
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(rules::UndeclaredVariableRule),
                Box::new(rules::UnusedVariableRule),
            ],
        }
    }

    /// Run all validation rules and collect diagnostics.
    pub fn validate(&self, ast: &Ast, source: &str) -> Vec<Diagnostic> {
        let lines = LineIndex::new(source);
        let resolution = Resolution::of(ast);
        let mut diagnostics: Vec<Diagnostic> = self
            .rules
            .iter()
            .flat_map(|rule| rule.validate(ast, &resolution, &lines))
            .collect();
        diagnostics.sort_by_key(|d| (d.span.start, d.span.end));
        diagnostics
    }

    /// Registered rules as `(id, description)` pairs
    pub fn rules(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.rules.iter().map(|r| (r.id(), r.description()))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a tree with every built-in rule
pub fn validate_ast(ast: &Ast, source: &str) -> Vec<Diagnostic> {
    Validator::new().validate(ast, source)
}

// ============================================================================
// Name Resolution
// ============================================================================

/// One `let`/`const` declarator
#[derive(Debug, Clone)]
pub struct DeclarationSite {
    pub name: String,
    pub span: Span,
    /// Read at least once (plain `=` writes do not count)
    pub used: bool,
}

/// Static name resolution shared by the rules.
///
/// Scoping mirrors the interpreter: the program and every block open a
/// scope, a `for` opens one scope for its whole header and body, and a name
/// becomes visible at its declaration.
#[derive(Debug, Default)]
pub struct Resolution {
    pub declarations: Vec<DeclarationSite>,
    /// Identifier and assignment nodes whose name has no visible declaration
    pub unresolved: Vec<NodeId>,
}

impl Resolution {
    pub fn of(ast: &Ast) -> Self {
        let mut resolver = Resolver {
            ast,
            scopes: Vec::new(),
            resolution: Resolution::default(),
        };
        resolver.visit(ast.root());
        resolver.resolution
    }
}

struct Resolver<'a> {
    ast: &'a Ast,
    scopes: Vec<HashMap<String, usize>>,
    resolution: Resolution,
}

impl<'a> Resolver<'a> {
    fn scoped(&mut self, f: impl FnOnce(&mut Self)) {
        self.scopes.push(HashMap::new());
        f(self);
        self.scopes.pop();
    }

    /// Resolve `name` at `node`; only reads mark the declaration as used
    fn reference(&mut self, name: &str, node: NodeId, reads: bool) {
        let found = self.scopes.iter().rev().find_map(|scope| scope.get(name).copied());
        match found {
            Some(index) if reads => self.resolution.declarations[index].used = true,
            Some(_) => {}
            None => self.resolution.unresolved.push(node),
        }
    }

    fn visit_all(&mut self, ids: &[NodeId]) {
        for id in ids {
            self.visit(*id);
        }
    }

    fn visit(&mut self, id: NodeId) {
        let ast = self.ast;
        let Some(node) = ast.get(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Program { body } | NodeKind::BlockStatement { body } => {
                self.scoped(|r| r.visit_all(body));
            }
            NodeKind::VariableDeclaration { declarations, .. } => {
                // A declarator is not in scope for its own initializer
                for declarator in declarations {
                    if let Some(init) = declarator.init {
                        self.visit(init);
                    }
                    let index = self.resolution.declarations.len();
                    self.resolution.declarations.push(DeclarationSite {
                        name: declarator.name.clone(),
                        span: declarator.span,
                        used: false,
                    });
                    if let Some(scope) = self.scopes.last_mut() {
                        scope.insert(declarator.name.clone(), index);
                    }
                }
            }
            NodeKind::ForStatement {
                init,
                test,
                update,
                body,
            } => {
                let header: Vec<NodeId> = init.iter().chain(test).chain(update).copied().collect();
                let body = *body;
                self.scoped(|r| {
                    r.visit_all(&header);
                    r.visit(body);
                });
            }
            NodeKind::Identifier { name } => self.reference(name, id, true),
            NodeKind::AssignmentExpression {
                operator,
                name,
                value,
            } => {
                self.visit(*value);
                self.reference(name, id, operator.binary().is_some());
            }
            other => {
                for child in other.children() {
                    self.visit(child);
                }
            }
        }
    }
}
