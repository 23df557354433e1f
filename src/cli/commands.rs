//! CLI command definitions using clap
//!
//! Defines all CLI subcommands and their arguments.

use clap::{Parser, Subcommand, ValueEnum};

/// Detect a project's framework and run its validation stages.
///
/// Runs type-check, lint, build and test in order and reports a
/// PASSED / PARTIAL / FAILED / UNKNOWN verdict. Can be used as a standalone
/// CLI or as an MCP server.
#[derive(Parser, Debug)]
#[command(name = "ea-validate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (full stage output, debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (highest-priority config file)
    #[arg(short, long, global = true, env = "EA_VALIDATE_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a project (type-check, lint, build, test)
    Validate(ValidateArgs),

    /// Detect which framework a project uses
    Detect(DetectArgs),

    /// List framework rules in priority order
    Frameworks(FrameworksArgs),

    /// Show the merged configuration
    Config(ConfigArgs),

    /// Start MCP server over stdio
    Mcp,
}

/// Arguments for the `validate` subcommand
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Project directory (defaults to current directory)
    pub path: Option<String>,

    /// Run the lint stage's auto-fix command
    #[arg(long)]
    pub fix: bool,

    /// Only type-check and lint; skip build and test
    #[arg(short, long)]
    pub quick: bool,

    /// Per-stage timeout in seconds (0 disables; defaults to config)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Text,
    /// JSON output
    Json,
}

/// Arguments for the `detect` subcommand
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Project directory (defaults to current directory)
    pub path: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the `frameworks` subcommand
#[derive(Parser, Debug)]
pub struct FrameworksArgs {
    /// Project directory whose .ea-validate.toml is applied
    #[arg(short, long)]
    pub project: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the `config` subcommand
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Project directory whose .ea-validate.toml is applied
    #[arg(short, long)]
    pub project: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}
