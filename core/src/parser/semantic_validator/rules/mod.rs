//! Validation Rules
//!
//! Each file in this module contains one validation rule:
//!
//! - `undeclared_variable.rs` - Names used without a visible declaration
//! - `unused_variable.rs` - Variables declared but never read

mod undeclared_variable;
mod unused_variable;

pub use undeclared_variable::UndeclaredVariableRule;
pub use unused_variable::UnusedVariableRule;
