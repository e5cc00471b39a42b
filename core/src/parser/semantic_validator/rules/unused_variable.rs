//! Rule: Unused Variable
//!
//! Reports a warning when a variable is declared but never read. Plain
//! assignments do not count as reads; compound ones (`+=`, `++`) do.
//! Variables starting with `_` are exempt.

use crate::parser::ast::{Ast, LineIndex};
use crate::parser::diagnostics::{Diagnostic, DiagnosticCode};

use super::super::{Resolution, ValidationRule};

pub struct UnusedVariableRule;

impl ValidationRule for UnusedVariableRule {
    fn id(&self) -> &'static str {
        "unused-variable"
    }

    fn description(&self) -> &'static str {
        "Variables should be used after declaration"
    }

    fn validate(&self, _ast: &Ast, resolution: &Resolution, lines: &LineIndex) -> Vec<Diagnostic> {
        resolution
            .declarations
            .iter()
            .filter(|site| !site.used && !site.name.starts_with('_'))
            .map(|site| {
                Diagnostic::warning(
                    DiagnosticCode::UnusedVariable,
                    format!("Variable '{}' is declared but never read", site.name),
                    site.span,
                    lines.loc(site.span),
                )
            })
            .collect()
    }
}
