//! Library error type
//!
//! Parse problems are reported as diagnostics and execution faults as
//! `error` events; this type covers everything around them (files, JSON,
//! configuration).

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Failed to render configuration: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Failed to parse configuration: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
    #[error("Config file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },
    #[error("Invalid setting `{key}`: {message}")]
    InvalidSetting { key: &'static str, message: String },
    #[error("Invalid AST: {0}")]
    InvalidAst(String),
    #[error("Snapshot is ahead of the trace ({snapshot} events recorded, trace holds {trace})")]
    SnapshotAhead { snapshot: usize, trace: usize },
}
