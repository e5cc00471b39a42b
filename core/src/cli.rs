use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::interpreter::{start, trace_digest, ExecutionState, Status, Value};
use crate::parser::{parse, ParseOutput};

#[derive(Parser)]
#[command(name = "steplang")]
#[command(about = "steplang - parse and single-step a minimal imperative language", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a source file and report diagnostics
    Parse {
        /// Source file to parse
        file: PathBuf,

        /// Print the AST as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse and run a source file, printing its event trace
    Run {
        /// Source file to run
        file: PathBuf,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,

        /// Print the SHA-256 digest of the trace
        #[arg(long)]
        digest: bool,

        /// Maximum number of events
        #[arg(long)]
        max_steps: Option<usize>,

        /// Maximum number of live scopes
        #[arg(long)]
        max_scope_depth: Option<usize>,

        /// Maximum trace length
        #[arg(long)]
        max_trace_length: Option<usize>,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Run the CLI by parsing process arguments
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli)
}

fn run_cli_with_args(cli: Cli) -> Result<()> {
    let builder = Settings::builder().config_path(cli.config.clone());

    match cli.command {
        Commands::Parse { file, json } => {
            let settings = builder.build().context("Failed to load configuration")?;
            let output = parse_file(&file, &settings)?;

            if json {
                println!("{}", output.ast.to_json()?);
            }
            println!(
                "{} bytes, {} lines, {} tokens, {} nodes, depth {}",
                output.stats.source_bytes,
                output.stats.lines,
                output.stats.tokens,
                output.stats.nodes,
                output.stats.max_depth
            );

            if output.has_errors() {
                bail!("{} parse error(s) in {}", output.errors.len(), file.display());
            }
        }

        Commands::Run {
            file,
            json,
            digest,
            max_steps,
            max_scope_depth,
            max_trace_length,
        } => {
            let settings = builder
                .max_steps(max_steps)
                .max_scope_depth(max_scope_depth)
                .max_trace_length(max_trace_length)
                .build()
                .context("Failed to load configuration")?;
            let output = parse_file(&file, &settings)?;
            if output.has_errors() {
                bail!(
                    "Refusing to run {}: {} parse error(s)",
                    file.display(),
                    output.errors.len()
                );
            }

            let mut state = start(output.ast, settings.execution_options());
            loop {
                let Some(event) = state.step() else {
                    if state.status() != Status::Running {
                        break;
                    }
                    continue;
                };
                if json {
                    println!("{}", serde_json::to_string(&event)?);
                } else {
                    println!("{}", event);
                }
                if event.kind.is_terminal() {
                    break;
                }
            }

            print_globals(&state);
            println!("status: {}", state.status());
            if digest {
                println!("digest: {}", trace_digest(state.trace())?);
            }

            if let Some(error) = state.last_error() {
                eprintln!("Error: {}", error);
                std::process::exit(1);
            }
        }

        Commands::Config => {
            let settings = builder.build().context("Failed to load configuration")?;
            print!("{}", settings.to_toml()?);
        }
    }

    Ok(())
}

/// Read and parse `file`, printing every diagnostic to stderr
fn parse_file(file: &Path, settings: &Settings) -> Result<ParseOutput> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("Failed to read source file: {}", file.display()))?;
    let output = parse(&source, settings.parse_options());

    for diagnostic in output.errors.iter().chain(&output.warnings) {
        eprintln!("{}: {}", file.display(), diagnostic);
    }
    Ok(output)
}

fn print_globals(state: &ExecutionState) {
    let global = state.scope_stack().global();
    if global.bindings.is_empty() {
        return;
    }
    println!("globals:");
    for binding in global.bindings.values() {
        let shown = match &binding.value {
            Value::String(s) => format!("{:?}", s),
            other => other.to_string(),
        };
        println!("  {} {} = {}", binding.kind.as_str(), binding.name, shown);
    }
}
