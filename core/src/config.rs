//! Configuration management for steplang
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags (--max-steps, etc.)
//! 2. Environment variables (STEPLANG_INTERPRETER__MAX_STEPS, etc.), with a
//!    `.env` file loaded first if present
//! 3. Config file (`--config <path>`, or steplang.toml in the working directory)
//! 4. Built-in defaults
//!
//! # Example Config File (steplang.toml)
//!
//! ```toml
//! [parser]
//! max_file_size = 20000
//! max_depth = 200
//!
//! [interpreter]
//! max_steps = 10000
//! max_scope_depth = 100
//! max_trace_length = 50000
//! ```

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::error::{Error, Result};
use crate::interpreter::ExecutionOptions;
use crate::parser::ParseOptions;

const DEFAULT_CONFIG_FILE: &str = "steplang.toml";
const ENV_PREFIX: &str = "STEPLANG";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub parser: ParserSettings,
    pub interpreter: InterpreterSettings,
}

/// Parser limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Largest accepted source file, in bytes
    pub max_file_size: usize,
    /// Deepest nesting the parser follows
    pub max_depth: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        let defaults = ParseOptions::default();
        Self {
            max_file_size: defaults.max_file_size,
            max_depth: defaults.max_depth,
        }
    }
}

/// Interpreter resource limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterSettings {
    pub max_steps: usize,
    pub max_scope_depth: usize,
    pub max_trace_length: usize,
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        let defaults = ExecutionOptions::default();
        Self {
            max_steps: defaults.max_steps,
            max_scope_depth: defaults.max_scope_depth,
            max_trace_length: defaults.max_trace_length,
        }
    }
}

impl Settings {
    /// Create a builder for constructing settings with overrides
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_file_size: self.parser.max_file_size,
            max_depth: self.parser.max_depth,
        }
    }

    pub fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions {
            max_steps: self.interpreter.max_steps,
            max_scope_depth: self.interpreter.max_scope_depth,
            max_trace_length: self.interpreter.max_trace_length,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.parser.max_depth == 0 {
            return Err(Error::InvalidSetting {
                key: "parser.max_depth",
                message: "must be at least 1".to_string(),
            });
        }
        // The global scope always counts toward the limit.
        if self.interpreter.max_scope_depth == 0 {
            return Err(Error::InvalidSetting {
                key: "interpreter.max_scope_depth",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for constructing Settings with optional overrides
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    config_path: Option<PathBuf>,
    skip_environment: bool,
    max_steps: Option<usize>,
    max_scope_depth: Option<usize>,
    max_trace_length: Option<usize>,
}

impl SettingsBuilder {
    /// Override the config file path
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Ignore `.env` and `STEPLANG_*` variables
    pub fn without_environment(mut self) -> Self {
        self.skip_environment = true;
        self
    }

    pub fn max_steps(mut self, max: Option<usize>) -> Self {
        self.max_steps = max;
        self
    }

    pub fn max_scope_depth(mut self, max: Option<usize>) -> Self {
        self.max_scope_depth = max;
        self
    }

    pub fn max_trace_length(mut self, max: Option<usize>) -> Self {
        self.max_trace_length = max;
        self
    }

    /// Build the final settings by applying the priority chain
    pub fn build(self) -> Result<Settings> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        match &self.config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::ConfigNotFound { path: path.clone() });
                }
                debug!(path = %path.display(), "loading config file");
                builder = builder.add_source(File::from(path.as_path()));
            }
            None => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));
            }
        }

        if !self.skip_environment {
            // Ignore errors if .env doesn't exist
            let _ = dotenvy::dotenv();
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        self.apply_overrides(&mut settings);
        settings.validate()?;
        Ok(settings)
    }

    /// Apply CLI overrides (highest priority)
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(max) = self.max_steps {
            settings.interpreter.max_steps = max;
        }
        if let Some(max) = self.max_scope_depth {
            settings.interpreter.max_scope_depth = max;
        }
        if let Some(max) = self.max_trace_length {
            settings.interpreter.max_trace_length = max;
        }
    }
}
