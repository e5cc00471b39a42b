//! Tests for the interpreter
//!
//! Organized by feature area

mod assign_tests;
mod basic_tests;
mod error_tests;
mod helpers;
mod while_tests;
