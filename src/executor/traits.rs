//! Command line parsing and the executor seam
//!
//! Stage commands are plain strings such as `npx vitest run`. They are split
//! on whitespace into a program and its arguments; no shell is involved.

use std::future::Future;

use serde::Serialize;

use super::process::{ExecOptions, ExecResult};
use crate::error::ValidateError;

/// A stage command split into program and arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandLine {
    /// Program name or path
    pub program: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
}

impl CommandLine {
    /// Split a command string on whitespace.
    ///
    /// Returns `None` for a blank command.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs a stage command to completion
///
/// The validator calls this once per stage and awaits it before starting the
/// next one.
pub trait CommandExecutor: Send + Sync {
    /// Execute a command
    ///
    /// # Errors
    /// * `ValidateError::ToolMissing` - If the program cannot be found
    /// * `ValidateError::SpawnFailed` - If the process cannot be started
    /// * `ValidateError::Timeout` - If the command exceeds `options.timeout`
    fn execute(
        &self,
        command: &CommandLine,
        options: &ExecOptions,
    ) -> impl Future<Output = Result<ExecResult, ValidateError>> + Send;
}
