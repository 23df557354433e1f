//! Error types for ea-validate
//!
//! Stage-level errors (missing tools, nonzero exits, timeouts) are recorded in
//! the validation run instead of aborting it. The remaining variants cover the
//! plumbing around a run: configuration, project resolution and IO.

use serde::Serialize;
use thiserror::Error;

/// Main error type for validation operations
#[derive(Error, Debug)]
pub enum ValidateError {
    /// No framework rule matched the project root
    #[error("Unknown project type: no recognized marker files in {path}")]
    DetectionFailure { path: String },

    /// The program a stage needs is not installed or not runnable
    #[error("Tool not found: {tool}")]
    ToolMissing { tool: String, command: String },

    /// A stage command exited unsuccessfully
    #[error("{stage} failed: {command}")]
    StageFailure {
        stage: String,
        command: String,
        exit_code: Option<i32>,
    },

    /// Failed to spawn the command
    #[error("Failed to spawn command: {command}")]
    SpawnFailed {
        command: String,
        kind: std::io::ErrorKind,
        error: String,
    },

    /// Command timed out
    #[error("Command timed out after {timeout_secs}s: {command}")]
    Timeout { command: String, timeout_secs: u64 },

    /// Project directory not found
    #[error("Project not found: {path}")]
    ProjectNotFound {
        path: String,
        suggestion: Option<String>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ValidateError {
    /// Whether this error means the tool itself could not be run.
    ///
    /// Such errors downgrade a stage to SKIPPED rather than FAILED.
    pub fn is_tool_unavailable(&self) -> bool {
        match self {
            ValidateError::ToolMissing { .. } => true,
            ValidateError::SpawnFailed { kind, .. } => matches!(
                kind,
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
            ),
            _ => false,
        }
    }
}

/// Serializable error info for JSON and MCP responses
#[derive(Debug, Serialize, Clone)]
pub struct ErrorInfo {
    pub message: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl From<&ValidateError> for ErrorInfo {
    fn from(err: &ValidateError) -> Self {
        let (error_type, suggestion, exit_code) = match err {
            ValidateError::DetectionFailure { .. } => (
                "detection_failure",
                Some(
                    "Add a manifest such as package.json, Cargo.toml or go.mod, \
                     or define a [[frameworks]] rule in .ea-validate.toml"
                        .to_string(),
                ),
                None,
            ),
            ValidateError::ToolMissing { tool, command } => (
                "tool_missing",
                suggest_fix(command, &format!("{}: command not found", tool)),
                None,
            ),
            ValidateError::StageFailure { exit_code, .. } => ("stage_failure", None, *exit_code),
            ValidateError::SpawnFailed { error, .. } => (
                "spawn_failed",
                Some(format!("Check if the command exists: {}", error)),
                None,
            ),
            ValidateError::Timeout { .. } => (
                "timeout",
                Some(
                    "Try increasing the timeout or checking if the command hangs".to_string(),
                ),
                None,
            ),
            ValidateError::ProjectNotFound { suggestion, .. } => {
                ("project_not_found", suggestion.clone(), None)
            }
            ValidateError::Config(_) => (
                "config_error",
                Some("Check your ea-validate configuration file".to_string()),
                None,
            ),
            ValidateError::Io(_) => ("io_error", None, None),
        };

        ErrorInfo {
            message: err.to_string(),
            error_type: error_type.to_string(),
            suggestion,
            exit_code,
        }
    }
}

/// Suggest fixes for common stage failures
pub fn suggest_fix(command: &str, output: &str) -> Option<String> {
    let program = command.split_whitespace().next().unwrap_or_default();

    if output.contains("command not found") || output.contains("not found") {
        let hint = match program {
            "npx" | "npm" => "Install Node.js (https://nodejs.org) to get npm and npx.",
            "bun" | "bunx" => "Install Bun: curl -fsSL https://bun.sh/install | bash",
            "deno" => "Install Deno: curl -fsSL https://deno.land/install.sh | sh",
            "cargo" => "Install Rust via rustup: https://rustup.rs",
            "go" => "Install Go: https://go.dev/dl",
            "ruff" => "Install ruff: pip install ruff",
            "mypy" => "Install mypy: pip install mypy",
            "pytest" => "Install pytest: pip install pytest",
            "mvn" => "Install Apache Maven and make sure mvn is on PATH.",
            "make" => "'make' command not found. Install build-essential or make.",
            _ => "Required command not found. Check PATH and dependencies.",
        };
        return Some(hint.to_string());
    }

    if output.contains("Permission denied") {
        if program.starts_with("./") {
            return Some(format!("{} is not executable. Try: chmod +x {}", program, program));
        }
        return Some(
            "Permission denied. Check file permissions or run with appropriate access.".to_string(),
        );
    }

    if command.contains("clippy") && output.contains("warning") {
        return Some("Run with --fix to apply clippy's automatic suggestions.".to_string());
    }

    if command.contains("eslint") && output.contains("problem") {
        return Some("Run with --fix to apply eslint's automatic fixes.".to_string());
    }

    if command.starts_with("ruff") && output.contains("fixable") {
        return Some("Run with --fix to apply ruff's automatic fixes.".to_string());
    }

    if output.contains("Missing script") {
        return Some("Add the missing script to package.json or disable the stage.".to_string());
    }

    if output.contains("No rule to make target") {
        return Some("Add the missing target to the Makefile.".to_string());
    }

    None
}
