//! Human-readable and JSON reports for a validation run

use colored::Colorize;
use serde::Serialize;

use super::types::{
    CheckResult, CheckStatus, OverallStatus, StageKind, StageReason, Summary, ValidationRun,
};
use crate::error::suggest_fix;

/// Report for a single stage
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub name: StageKind,
    pub label: &'static str,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<StageReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    /// Captured output, possibly cut down to its last lines
    pub output: String,
    /// Number of leading lines dropped from `output`
    #[serde(skip_serializing_if = "is_zero")]
    pub omitted_lines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// Report for a whole run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub project: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    pub status: OverallStatus,
    pub exit_code: u8,
    pub summary: Summary,
    pub stages: Vec<StageReport>,
    pub duration_ms: u64,
}

impl Report {
    /// Build a report from a finished run
    ///
    /// Unless `verbose` is set, each stage's output is cut to its last
    /// `summary_lines` lines.
    pub fn from_run(run: &ValidationRun, verbose: bool, summary_lines: usize) -> Self {
        let stages = run
            .checks
            .iter()
            .map(|check| stage_report(check, verbose, summary_lines))
            .collect();

        Self {
            project: run.project_name.clone(),
            path: run.root.display().to_string(),
            framework: run.framework.as_ref().map(|f| f.name.clone()),
            status: run.overall_status,
            exit_code: run.exit_code(),
            summary: run.summary(),
            stages,
            duration_ms: run.duration_ms,
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Render the report as text
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "{}: {}\n",
            "Validation Report".bold(),
            self.project
        ));
        out.push_str(&format!("{}: {}\n", "Status".cyan(), colorize_overall(self.status)));
        out.push_str(&format!(
            "{}: {}\n",
            "Framework".cyan(),
            self.framework.as_deref().unwrap_or("none")
        ));
        out.push_str(&format!("{}: {}\n", "Path".cyan(), self.path));

        if self.status == OverallStatus::Unknown {
            out.push('\n');
            out.push_str("Unknown project type.\n");
            out.push_str(&format!(
                "No recognized marker files were found in {}.\n",
                self.path
            ));
            return out;
        }

        out.push('\n');
        out.push_str(&format!(
            "{}: {} total, {} passed, {} failed, {} skipped\n",
            "Summary".cyan(),
            self.summary.total,
            self.summary.passed,
            self.summary.failed,
            self.summary.skipped
        ));

        for stage in &self.stages {
            out.push('\n');
            out.push_str(&format!("{} {}\n", colorize_check(stage.status), stage.label));

            if let Some(ref command) = stage.command {
                if stage.status != CheckStatus::Skipped {
                    out.push_str(&format!(
                        "  Command: {} ({})\n",
                        command,
                        format_duration(stage.duration_ms)
                    ));
                } else {
                    out.push_str(&format!("  Command: {}\n", command));
                }
            }

            if let Some(reason) = stage.reason {
                match (reason, stage.exit_code) {
                    (StageReason::ExitCode, Some(code)) => {
                        out.push_str(&format!("  Reason: exited with code {}\n", code))
                    }
                    _ => out.push_str(&format!("  Reason: {}\n", reason.describe())),
                }
            }

            if stage.omitted_lines > 0 {
                out.push_str(&format!(
                    "  {}\n",
                    format!(
                        "... {} earlier lines omitted (use --verbose for full output)",
                        stage.omitted_lines
                    )
                    .dimmed()
                ));
            }

            for line in stage.output.lines() {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }

            if let Some(ref suggestion) = stage.suggestion {
                out.push_str(&format!("  {}: {}\n", "Hint".yellow(), suggestion));
            }
        }

        out
    }
}

fn stage_report(check: &CheckResult, verbose: bool, summary_lines: usize) -> StageReport {
    let (output, omitted_lines) = if verbose {
        (check.output.trim_end().to_string(), 0)
    } else {
        tail_lines(&check.output, summary_lines)
    };

    let suggestion = match (check.status, &check.command) {
        (CheckStatus::Passed, _) | (_, None) => None,
        (_, Some(command)) => suggest_fix(command, &check.output),
    };

    StageReport {
        name: check.name,
        label: check.name.label(),
        status: check.status,
        command: check.command.clone(),
        reason: check.reason,
        exit_code: check.exit_code,
        duration_ms: check.duration_ms,
        output,
        omitted_lines,
        suggestion,
    }
}

/// Keep the last `max_lines` non-trailing lines of `output`
///
/// Returns the kept text and the number of lines dropped.
pub fn tail_lines(output: &str, max_lines: usize) -> (String, usize) {
    let lines: Vec<&str> = output.trim_end().lines().collect();
    if lines.len() <= max_lines {
        return (lines.join("\n"), 0);
    }
    let omitted = lines.len() - max_lines;
    (lines[omitted..].join("\n"), omitted)
}

fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}

fn colorize_overall(status: OverallStatus) -> String {
    let text = status.to_string();
    match status {
        OverallStatus::Passed => text.green().bold().to_string(),
        OverallStatus::Partial => text.yellow().bold().to_string(),
        OverallStatus::Failed => text.red().bold().to_string(),
        OverallStatus::Unknown => text.magenta().bold().to_string(),
    }
}

fn colorize_check(status: CheckStatus) -> String {
    let text = format!("[{}]", status);
    match status {
        CheckStatus::Passed => text.green().to_string(),
        CheckStatus::Failed => text.red().to_string(),
        CheckStatus::Skipped => text.yellow().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::FrameworkRule;
    use std::path::PathBuf;
    use std::time::Duration;

    fn sample_run() -> ValidationRun {
        let long_output: String = (1..=30).map(|i| format!("line {}\n", i)).collect();
        ValidationRun {
            project_name: "web-app".to_string(),
            root: PathBuf::from("/work/web-app"),
            framework: Some(FrameworkRule::new("Vitest", 10, &["package.json"], "npx vitest run")),
            checks: vec![
                CheckResult::failed(
                    StageKind::TypeCheck,
                    "npx tsc --noEmit",
                    StageReason::ExitCode,
                    Some(2),
                    long_output,
                    Duration::from_millis(1500),
                ),
                CheckResult::passed(StageKind::Lint, "npx eslint .", "", Duration::from_millis(20)),
                CheckResult::skipped(
                    StageKind::Build,
                    StageReason::QuickMode,
                    Some("npm run build".to_string()),
                    "Skipped in quick mode",
                ),
                CheckResult::skipped(
                    StageKind::Test,
                    StageReason::ToolMissing,
                    Some("npx vitest run".to_string()),
                    "Tool not found: npx",
                ),
            ],
            overall_status: OverallStatus::Failed,
            duration_ms: 1520,
        }
    }

    #[test]
    fn test_tail_lines() {
        assert_eq!(tail_lines("a\nb\nc\n", 5), ("a\nb\nc".to_string(), 0));
        assert_eq!(tail_lines("a\nb\nc\n", 2), ("b\nc".to_string(), 1));
        assert_eq!(tail_lines("", 2), (String::new(), 0));
    }

    #[test]
    fn test_report_summary_truncates_output() {
        let report = Report::from_run(&sample_run(), false, 5);

        let tc = &report.stages[0];
        assert_eq!(tc.omitted_lines, 25);
        assert!(tc.output.starts_with("line 26"));
        assert!(tc.output.ends_with("line 30"));
    }

    #[test]
    fn test_report_verbose_keeps_full_output() {
        let report = Report::from_run(&sample_run(), true, 5);

        let tc = &report.stages[0];
        assert_eq!(tc.omitted_lines, 0);
        assert!(tc.output.starts_with("line 1\n"));
    }

    #[test]
    fn test_report_suggestion_for_missing_tool() {
        let report = Report::from_run(&sample_run(), false, 20);

        let test = &report.stages[3];
        assert!(test.suggestion.as_deref().unwrap().contains("Node.js"));
        assert!(report.stages[1].suggestion.is_none());
    }

    #[test]
    fn test_render_text() {
        let text = Report::from_run(&sample_run(), false, 3).render_text();

        assert!(text.contains("Validation Report"));
        assert!(text.contains("web-app"));
        assert!(text.contains("FAILED"));
        assert!(text.contains("Framework"));
        assert!(text.contains("Vitest"));
        assert!(text.contains("4 total, 1 passed, 1 failed, 2 skipped"));
        assert!(text.contains("Type Check"));
        assert!(text.contains("exited with code 2"));
        assert!(text.contains("27 earlier lines omitted"));
        assert!(text.contains("line 30"));
        assert!(!text.contains("line 27\n"));
        assert!(text.contains("skipped in quick mode"));
        assert!(text.contains("tool not found"));
    }

    #[test]
    fn test_render_unknown() {
        let run = ValidationRun {
            project_name: "empty".to_string(),
            root: PathBuf::from("/tmp/empty"),
            framework: None,
            checks: vec![],
            overall_status: OverallStatus::Unknown,
            duration_ms: 0,
        };

        let text = Report::from_run(&run, false, 20).render_text();

        assert!(text.contains("UNKNOWN"));
        assert!(text.contains("Unknown project type."));
        assert!(text.contains("/tmp/empty"));
        assert!(!text.contains("Summary"));
    }

    #[test]
    fn test_report_json() {
        let json = Report::from_run(&sample_run(), false, 20).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["status"], "FAILED");
        assert_eq!(value["exit_code"], 1);
        assert_eq!(value["framework"], "Vitest");
        assert_eq!(value["summary"]["skipped"], 2);
        assert_eq!(value["stages"][0]["name"], "TYPE_CHECK");
        assert_eq!(value["stages"][0]["omitted_lines"], 10);
        assert_eq!(value["stages"][2]["reason"], "quick_mode");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(250), "250ms");
        assert_eq!(format_duration(1500), "1.5s");
    }
}
