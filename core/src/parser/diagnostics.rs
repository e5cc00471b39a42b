//! Parse diagnostics
//!
//! Diagnostics are plain data: the parser accumulates them instead of
//! returning early, so a caller always gets a best-effort tree back.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ast::{Loc, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    UnknownToken,
    UnterminatedString,
    MaxFileSize,
    ExpectedToken,
    MaxParseDepth,
    UnexpectedTokenInExpression,
    UndeclaredVariable,
    UnusedVariable,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownToken => "unknown-token",
            Self::UnterminatedString => "unterminated-string",
            Self::MaxFileSize => "max-file-size",
            Self::ExpectedToken => "expected-token",
            Self::MaxParseDepth => "max-parse-depth",
            Self::UnexpectedTokenInExpression => "unexpected-token-in-expression",
            Self::UndeclaredVariable => "undeclared-variable",
            Self::UnusedVariable => "unused-variable",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity levels for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The tree is incomplete or wrong where this points
    Error,
    /// Valid code that probably does not do what was meant
    Warning,
}

/// A problem found while lexing, parsing or validating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
    pub severity: Severity,
    pub span: Span,
    pub loc: Loc,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span, loc: Loc) -> Self {
        Self {
            code,
            message: message.into(),
            severity: Severity::Error,
            span,
            loc,
        }
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span, loc: Loc) -> Self {
        Self {
            code,
            message: message.into(),
            severity: Severity::Warning,
            span,
            loc,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{} at line {}, col {}: {} [{}]",
            severity, self.loc.start.line, self.loc.start.column, self.message, self.code
        )
    }
}
