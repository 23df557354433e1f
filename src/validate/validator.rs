//! Stage dispatcher
//!
//! Detects the framework for a project root and runs its stage commands in
//! order. Stages are independent: a failing or unrunnable stage is recorded
//! and the next stage still runs.

use std::path::{Path, PathBuf};
use std::time::Instant;

use super::types::{
    aggregate, CheckResult, StageKind, StageReason, ValidateOptions, ValidationRun,
};
use crate::config::Config;
use crate::error::ValidateError;
use crate::executor::{
    CommandExecutor, CommandLine, ExecOptions, ProcessExecutor, MAX_OUTPUT_SIZE,
};
use crate::framework::{
    check_unique_priorities, detect_framework, project_name, DetectionResult, FrameworkRule,
};

/// Resolve the project root to validate
///
/// `None` means the current directory. `~` and environment variables are
/// expanded, and the result is canonicalized so manifest lookup can walk
/// parent directories.
pub fn resolve_project_root(project: Option<&str>) -> Result<PathBuf, ValidateError> {
    let path = match project {
        None => std::env::current_dir()?,
        Some(p) => {
            let expanded = shellexpand::full(p)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| p.to_string());
            PathBuf::from(expanded)
        }
    };

    match std::fs::canonicalize(&path) {
        Ok(root) if root.is_dir() => Ok(root),
        Ok(root) => Err(ValidateError::ProjectNotFound {
            path: root.display().to_string(),
            suggestion: Some("Pass a project directory, not a file".to_string()),
        }),
        Err(_) => Err(ValidateError::ProjectNotFound {
            path: path.display().to_string(),
            suggestion: Some("Check that the directory exists".to_string()),
        }),
    }
}

/// Progress callbacks for a running validation
pub trait StageObserver: Send {
    /// Called just before a stage command is spawned
    fn stage_started(&mut self, _stage: StageKind, _command: &str) {}

    /// Called once per stage with its final result, including skipped stages
    fn stage_finished(&mut self, _result: &CheckResult) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {}

/// Runs validation stages for a project using a set of framework rules
#[derive(Debug, Clone)]
pub struct Validator<E = ProcessExecutor> {
    rules: Vec<FrameworkRule>,
    executor: E,
    max_output: usize,
}

impl Validator<ProcessExecutor> {
    /// Create a validator that spawns real processes
    pub fn new(rules: Vec<FrameworkRule>) -> Result<Self, ValidateError> {
        Self::with_executor(rules, ProcessExecutor::new())
    }

    /// Create a validator from merged configuration
    pub fn from_config(config: &Config) -> Result<Self, ValidateError> {
        Ok(Self::new(config.rules()?)?.with_max_output(config.defaults.max_output))
    }
}

impl<E: CommandExecutor> Validator<E> {
    /// Create a validator with a custom command executor
    ///
    /// Rules are sorted by priority. Two rules with the same priority are a
    /// configuration error.
    pub fn with_executor(
        rules: Vec<FrameworkRule>,
        executor: E,
    ) -> Result<Self, ValidateError> {
        let mut rules = rules;
        rules.sort_by_key(|r| r.priority);
        check_unique_priorities(&rules)?;
        Ok(Self {
            rules,
            executor,
            max_output: MAX_OUTPUT_SIZE,
        })
    }

    /// Cap captured output per stream
    pub fn with_max_output(mut self, max_output: usize) -> Self {
        self.max_output = max_output;
        self
    }

    /// Rules in priority order
    pub fn rules(&self) -> &[FrameworkRule] {
        &self.rules
    }

    /// Detect the framework for a project root without running anything
    pub fn detect(&self, root: &Path) -> DetectionResult {
        detect_framework(root, &self.rules)
    }

    /// Validate a project root
    pub async fn validate(&self, root: &Path, options: &ValidateOptions) -> ValidationRun {
        self.validate_with_observer(root, options, &mut NoopObserver)
            .await
    }

    /// Validate a project root, reporting progress to `observer`
    pub async fn validate_with_observer(
        &self,
        root: &Path,
        options: &ValidateOptions,
        observer: &mut dyn StageObserver,
    ) -> ValidationRun {
        let started = Instant::now();
        let detection = self.detect(root);
        let project_name = project_name(root);

        let Some(rule) = detection.detected else {
            let err = ValidateError::DetectionFailure {
                path: root.display().to_string(),
            };
            tracing::info!("{}", err);
            return ValidationRun::undetected(
                project_name,
                root.to_path_buf(),
                started.elapsed().as_millis() as u64,
            );
        };

        if detection.matching.len() > 1 {
            tracing::debug!(
                "Multiple frameworks matched {:?}; using {}",
                detection.matching,
                rule.name
            );
        }
        tracing::info!("Detected {} in {}", rule.name, root.display());

        let mut checks = Vec::with_capacity(StageKind::ALL.len());
        for stage in StageKind::ALL {
            let result = match rule.command_for(stage, options.fix) {
                None => CheckResult::skipped(
                    stage,
                    StageReason::NotConfigured,
                    None,
                    format!("No {} command for {}", stage.label().to_lowercase(), rule.name),
                ),
                Some(command) if options.quick && stage.skipped_in_quick_mode() => {
                    CheckResult::skipped(
                        stage,
                        StageReason::QuickMode,
                        Some(command.to_string()),
                        "Skipped in quick mode",
                    )
                }
                Some(command) => self.run_stage(stage, command, root, options, observer).await,
            };

            tracing::debug!("{} -> {}", stage, result.status);
            observer.stage_finished(&result);
            checks.push(result);
        }

        let overall_status = aggregate(true, &checks);
        ValidationRun {
            project_name,
            root: root.to_path_buf(),
            framework: Some(rule),
            checks,
            overall_status,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn run_stage(
        &self,
        stage: StageKind,
        command: &str,
        root: &Path,
        options: &ValidateOptions,
        observer: &mut dyn StageObserver,
    ) -> CheckResult {
        let Some(line) = CommandLine::parse(command) else {
            return CheckResult::skipped(stage, StageReason::NotConfigured, None, "Empty command");
        };

        observer.stage_started(stage, command);

        let mut exec_options = ExecOptions::in_dir(root).with_max_output(self.max_output);
        exec_options.timeout = options.timeout;

        let started = Instant::now();
        match self.executor.execute(&line, &exec_options).await {
            Ok(result) if result.success => {
                CheckResult::passed(stage, command, result.combined_output(), result.duration)
            }
            Ok(result) => {
                let err = ValidateError::StageFailure {
                    stage: stage.to_string(),
                    command: command.to_string(),
                    exit_code: result.exit_code,
                };
                tracing::info!("{} (exit code {:?})", err, result.exit_code);
                let reason = match result.exit_code {
                    Some(_) => StageReason::ExitCode,
                    None => StageReason::Terminated,
                };
                CheckResult::failed(
                    stage,
                    command,
                    reason,
                    result.exit_code,
                    result.combined_output(),
                    result.duration,
                )
            }
            Err(ValidateError::Timeout { timeout_secs, .. }) => {
                tracing::info!("{} timed out after {}s: {}", stage, timeout_secs, command);
                CheckResult::failed(
                    stage,
                    command,
                    StageReason::Timeout,
                    None,
                    format!("Timed out after {}s", timeout_secs),
                    started.elapsed(),
                )
            }
            Err(e) if e.is_tool_unavailable() => {
                tracing::info!("{} skipped: {}", stage, e);
                CheckResult::skipped(
                    stage,
                    StageReason::ToolMissing,
                    Some(command.to_string()),
                    e.to_string(),
                )
            }
            Err(e) => {
                tracing::warn!("{} could not run: {}", stage, e);
                let note = match &e {
                    ValidateError::SpawnFailed { error, .. } => format!("{}: {}", e, error),
                    _ => e.to_string(),
                };
                CheckResult::skipped(
                    stage,
                    StageReason::SpawnFailed,
                    Some(command.to_string()),
                    note,
                )
            }
        }
    }
}
