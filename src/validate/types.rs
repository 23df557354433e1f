//! Validation run data model
//!
//! A [`ValidationRun`] is created fresh for each invocation and holds one
//! [`CheckResult`] per stage, in the fixed order type-check, lint, build, test.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::framework::FrameworkRule;

/// One validation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageKind {
    TypeCheck,
    Lint,
    Build,
    Test,
}

impl StageKind {
    /// Every stage, in execution order
    pub const ALL: [StageKind; 4] = [
        StageKind::TypeCheck,
        StageKind::Lint,
        StageKind::Build,
        StageKind::Test,
    ];

    /// Human-readable stage name
    pub fn label(&self) -> &'static str {
        match self {
            StageKind::TypeCheck => "Type Check",
            StageKind::Lint => "Lint",
            StageKind::Build => "Build",
            StageKind::Test => "Test",
        }
    }

    /// A failure in a critical stage fails the whole run
    pub fn is_critical(&self) -> bool {
        matches!(self, StageKind::TypeCheck | StageKind::Test)
    }

    /// Stages omitted in quick mode
    pub fn skipped_in_quick_mode(&self) -> bool {
        matches!(self, StageKind::Build | StageKind::Test)
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a single stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Passed,
    Failed,
    Skipped,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Passed => f.write_str("PASSED"),
            CheckStatus::Failed => f.write_str("FAILED"),
            CheckStatus::Skipped => f.write_str("SKIPPED"),
        }
    }
}

/// Why a stage did not pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageReason {
    /// The framework defines no command for the stage
    NotConfigured,
    /// Quick mode omitted the stage
    QuickMode,
    /// The command's program is not installed or not runnable
    ToolMissing,
    /// The process could not be started or waited on for another reason
    SpawnFailed,
    /// The command exited with a nonzero code
    ExitCode,
    /// The command exceeded the stage timeout and was killed
    Timeout,
    /// The process was terminated by a signal
    Terminated,
}

impl StageReason {
    /// Skips that do not make a run incomplete
    pub fn is_neutral(&self) -> bool {
        matches!(self, StageReason::NotConfigured)
    }

    /// Short description for reports
    pub fn describe(&self) -> &'static str {
        match self {
            StageReason::NotConfigured => "no command configured",
            StageReason::QuickMode => "skipped in quick mode",
            StageReason::ToolMissing => "tool not found",
            StageReason::SpawnFailed => "could not start command",
            StageReason::ExitCode => "nonzero exit code",
            StageReason::Timeout => "timed out",
            StageReason::Terminated => "terminated by signal",
        }
    }
}

/// Result of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// Which stage this is
    pub name: StageKind,
    /// Pass/fail/skip outcome
    pub status: CheckStatus,
    /// Command that was (or would have been) run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Captured stdout and stderr, or a note explaining a skip
    pub output: String,
    /// Exit code when the command ran to completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Reason code for non-passing results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<StageReason>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl CheckResult {
    /// Create a passing result
    pub fn passed(
        name: StageKind,
        command: impl Into<String>,
        output: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            name,
            status: CheckStatus::Passed,
            command: Some(command.into()),
            output: output.into(),
            exit_code: Some(0),
            reason: None,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Create a failed result
    pub fn failed(
        name: StageKind,
        command: impl Into<String>,
        reason: StageReason,
        exit_code: Option<i32>,
        output: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            name,
            status: CheckStatus::Failed,
            command: Some(command.into()),
            output: output.into(),
            exit_code,
            reason: Some(reason),
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Create a skipped result
    pub fn skipped(
        name: StageKind,
        reason: StageReason,
        command: Option<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            command,
            output: note.into(),
            exit_code: None,
            reason: Some(reason),
            duration_ms: 0,
        }
    }

    /// Whether the stage actually ran a command to completion or timeout
    pub fn ran(&self) -> bool {
        self.status != CheckStatus::Skipped
    }
}

/// Aggregate status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Passed,
    Partial,
    Failed,
    Unknown,
}

impl OverallStatus {
    /// Process exit code for this status
    pub fn exit_code(&self) -> u8 {
        match self {
            OverallStatus::Passed | OverallStatus::Partial => 0,
            OverallStatus::Failed => 1,
            OverallStatus::Unknown => 2,
        }
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverallStatus::Passed => f.write_str("PASSED"),
            OverallStatus::Partial => f.write_str("PARTIAL"),
            OverallStatus::Failed => f.write_str("FAILED"),
            OverallStatus::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// Combine stage results into an overall status
///
/// - `UNKNOWN` when no framework was detected
/// - `FAILED` when a critical stage (type-check or test) failed
/// - `PASSED` when at least one stage ran, every stage that ran passed, and
///   every skip was a neutral one (no command configured)
/// - `PARTIAL` otherwise
pub fn aggregate(framework_detected: bool, checks: &[CheckResult]) -> OverallStatus {
    if !framework_detected {
        return OverallStatus::Unknown;
    }

    if checks
        .iter()
        .any(|c| c.name.is_critical() && c.status == CheckStatus::Failed)
    {
        return OverallStatus::Failed;
    }

    let any_ran = checks.iter().any(CheckResult::ran);
    let all_ran_passed = checks
        .iter()
        .filter(|c| c.ran())
        .all(|c| c.status == CheckStatus::Passed);
    let incomplete = checks.iter().any(|c| {
        c.status == CheckStatus::Skipped && !c.reason.map(|r| r.is_neutral()).unwrap_or(false)
    });

    if any_ran && all_ran_passed && !incomplete {
        OverallStatus::Passed
    } else {
        OverallStatus::Partial
    }
}

/// Options for a validation run
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Use the lint stage's auto-fix command when one exists
    pub fix: bool,
    /// Skip the build and test stages
    pub quick: bool,
    /// Report full captured output instead of a summary
    pub verbose: bool,
    /// Per-stage timeout
    pub timeout: Option<Duration>,
}

impl ValidateOptions {
    /// Enable fix mode
    pub fn with_fix(mut self) -> Self {
        self.fix = true;
        self
    }

    /// Enable quick mode
    pub fn with_quick(mut self) -> Self {
        self.quick = true;
        self
    }

    /// Set the per-stage timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Stage counts for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// The outcome of validating one project
#[derive(Debug, Clone, Serialize)]
pub struct ValidationRun {
    /// Name from the nearest manifest, or the directory name
    pub project_name: String,
    /// Project root that was validated
    pub root: PathBuf,
    /// Selected framework rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<FrameworkRule>,
    /// One result per stage, in execution order
    pub checks: Vec<CheckResult>,
    /// Aggregate status
    pub overall_status: OverallStatus,
    /// Total wall time in milliseconds
    pub duration_ms: u64,
}

impl ValidationRun {
    /// Run for a root where no framework was detected
    pub fn undetected(project_name: String, root: PathBuf, duration_ms: u64) -> Self {
        Self {
            project_name,
            root,
            framework: None,
            checks: Vec::new(),
            overall_status: aggregate(false, &[]),
            duration_ms,
        }
    }

    /// Stage counts
    pub fn summary(&self) -> Summary {
        let count = |status| self.checks.iter().filter(|c| c.status == status).count();
        Summary {
            total: self.checks.len(),
            passed: count(CheckStatus::Passed),
            failed: count(CheckStatus::Failed),
            skipped: count(CheckStatus::Skipped),
        }
    }

    /// Result for a given stage
    pub fn check(&self, stage: StageKind) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == stage)
    }

    /// Process exit code: 0 passed/partial, 1 failed, 2 unknown
    pub fn exit_code(&self) -> u8 {
        self.overall_status.exit_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(stage: StageKind) -> CheckResult {
        CheckResult::passed(stage, "true", "", Duration::ZERO)
    }

    fn fail(stage: StageKind) -> CheckResult {
        CheckResult::failed(
            stage,
            "false",
            StageReason::ExitCode,
            Some(1),
            "",
            Duration::ZERO,
        )
    }

    fn skip(stage: StageKind, reason: StageReason) -> CheckResult {
        CheckResult::skipped(stage, reason, None, "")
    }

    #[test]
    fn test_all_passed() {
        let checks: Vec<_> = StageKind::ALL.iter().map(|s| pass(*s)).collect();
        assert_eq!(aggregate(true, &checks), OverallStatus::Passed);
    }

    #[test]
    fn test_unknown_without_framework() {
        assert_eq!(aggregate(false, &[]), OverallStatus::Unknown);
    }

    #[test]
    fn test_type_check_failure_is_fatal() {
        let checks = vec![
            fail(StageKind::TypeCheck),
            pass(StageKind::Lint),
            pass(StageKind::Build),
            pass(StageKind::Test),
        ];
        assert_eq!(aggregate(true, &checks), OverallStatus::Failed);
    }

    #[test]
    fn test_test_failure_is_fatal() {
        let checks = vec![
            pass(StageKind::TypeCheck),
            pass(StageKind::Lint),
            pass(StageKind::Build),
            fail(StageKind::Test),
        ];
        assert_eq!(aggregate(true, &checks), OverallStatus::Failed);
    }

    #[test]
    fn test_lint_failure_is_partial() {
        let checks = vec![
            pass(StageKind::TypeCheck),
            fail(StageKind::Lint),
            pass(StageKind::Build),
            pass(StageKind::Test),
        ];
        assert_eq!(aggregate(true, &checks), OverallStatus::Partial);
    }

    #[test]
    fn test_not_configured_skips_are_neutral() {
        let checks = vec![
            skip(StageKind::TypeCheck, StageReason::NotConfigured),
            skip(StageKind::Lint, StageReason::NotConfigured),
            pass(StageKind::Build),
            pass(StageKind::Test),
        ];
        assert_eq!(aggregate(true, &checks), OverallStatus::Passed);
    }

    #[test]
    fn test_quick_mode_skips_are_partial() {
        let checks = vec![
            pass(StageKind::TypeCheck),
            pass(StageKind::Lint),
            skip(StageKind::Build, StageReason::QuickMode),
            skip(StageKind::Test, StageReason::QuickMode),
        ];
        assert_eq!(aggregate(true, &checks), OverallStatus::Partial);
    }

    #[test]
    fn test_missing_tool_is_partial_not_failed() {
        let checks = vec![
            skip(StageKind::TypeCheck, StageReason::ToolMissing),
            pass(StageKind::Lint),
            pass(StageKind::Build),
            pass(StageKind::Test),
        ];
        assert_eq!(aggregate(true, &checks), OverallStatus::Partial);
    }

    #[test]
    fn test_nothing_ran_is_partial() {
        let checks: Vec<_> = StageKind::ALL
            .iter()
            .map(|s| skip(*s, StageReason::NotConfigured))
            .collect();
        assert_eq!(aggregate(true, &checks), OverallStatus::Partial);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(OverallStatus::Passed.exit_code(), 0);
        assert_eq!(OverallStatus::Partial.exit_code(), 0);
        assert_eq!(OverallStatus::Failed.exit_code(), 1);
        assert_eq!(OverallStatus::Unknown.exit_code(), 2);
    }

    #[test]
    fn test_summary_counts() {
        let run = ValidationRun {
            project_name: "demo".to_string(),
            root: PathBuf::from("/demo"),
            framework: None,
            checks: vec![
                pass(StageKind::TypeCheck),
                fail(StageKind::Lint),
                skip(StageKind::Build, StageReason::QuickMode),
                skip(StageKind::Test, StageReason::QuickMode),
            ],
            overall_status: OverallStatus::Partial,
            duration_ms: 0,
        };

        assert_eq!(
            run.summary(),
            Summary {
                total: 4,
                passed: 1,
                failed: 1,
                skipped: 2
            }
        );
        assert_eq!(run.check(StageKind::Lint).unwrap().status, CheckStatus::Failed);
    }

    #[test]
    fn test_check_result_serialization() {
        let result = CheckResult::skipped(
            StageKind::TypeCheck,
            StageReason::ToolMissing,
            Some("npx tsc --noEmit".to_string()),
            "Tool not found: npx",
        );

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"name\":\"TYPE_CHECK\""));
        assert!(json.contains("\"status\":\"SKIPPED\""));
        assert!(json.contains("\"reason\":\"tool_missing\""));
        assert!(!json.contains("exit_code"));
    }
}
