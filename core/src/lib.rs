pub mod cli;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod parser;

// Re-export main types
pub use config::Settings;
pub use error::{Error, Result};
pub use interpreter::{
    run_until_done, start, trace_digest, Event, EventKind, ExecutionOptions, ExecutionState,
    Status,
};
pub use parser::{parse, Ast, Diagnostic, ParseOptions, ParseOutput};
