//! ea-validate - Project Validation CLI and MCP Server
//!
//! Detects a project's framework from marker files and runs its validation
//! stages in a fixed order:
//! - **Type Check** - e.g. `npx tsc --noEmit`, `cargo check`, `mypy .`
//! - **Lint** - e.g. `npx eslint .`, `cargo clippy`, `ruff check .`
//! - **Build** - e.g. `npm run build`, `go build ./...`
//! - **Test** - e.g. `npx vitest run`, `cargo test`, `pytest`
//!
//! ## Features
//!
//! - Priority-ordered framework detection with glob markers
//! - Custom and disabled framework rules via layered configuration
//! - Quick mode (type-check and lint only) and lint auto-fix mode
//! - Per-stage timeouts and output truncation
//! - PASSED / PARTIAL / FAILED / UNKNOWN verdict with exit codes 0 / 0 / 1 / 2
//!
//! ## MCP Tools
//!
//! - `validate_project` - Run the validation stages for a project
//! - `detect_framework` - Detect which framework a project uses
//! - `list_frameworks` - List framework rules in priority order

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod framework;
pub mod mcp;
pub mod validate;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{ErrorInfo, ValidateError};
pub use executor::{
    exec_command, CommandExecutor, CommandLine, ExecOptions, ExecResult, ProcessExecutor,
};
pub use framework::{builtin_rules, detect_framework, DetectionResult, FrameworkRule};
pub use mcp::ValidateServer;
pub use validate::{
    CheckResult, CheckStatus, OverallStatus, Report, StageKind, StageReason, ValidateOptions,
    ValidationRun, Validator,
};
