//! Rule: Undeclared Variable
//!
//! Warns when a name is read or assigned without a `let`/`const` declaration
//! visible at that point. Running such code fails with `undeclared-var`.
//!
//! ```text
//! let y = x + 1;   // 'x' is not declared
//! { let z = 1; }
//! z = 2;           // 'z' went out of scope with its block
//! ```

use crate::parser::ast::{Ast, LineIndex, NodeKind};
use crate::parser::diagnostics::{Diagnostic, DiagnosticCode};

use super::super::{Resolution, ValidationRule};

pub struct UndeclaredVariableRule;

impl ValidationRule for UndeclaredVariableRule {
    fn id(&self) -> &'static str {
        "undeclared-variable"
    }

    fn description(&self) -> &'static str {
        "Variables must be declared before they are used"
    }

    fn validate(&self, ast: &Ast, resolution: &Resolution, _lines: &LineIndex) -> Vec<Diagnostic> {
        resolution
            .unresolved
            .iter()
            .filter_map(|id| ast.get(*id))
            .filter_map(|node| {
                let message = match &node.kind {
                    NodeKind::Identifier { name } => format!("'{}' is not declared", name),
                    NodeKind::AssignmentExpression { name, .. } => {
                        format!("Assignment to undeclared variable '{}'", name)
                    }
                    _ => return None,
                };
                Some(Diagnostic::warning(
                    DiagnosticCode::UndeclaredVariable,
                    message,
                    node.span,
                    node.loc,
                ))
            })
            .collect()
    }
}
