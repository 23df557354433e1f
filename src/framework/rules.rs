//! Framework rule table
//!
//! A [`FrameworkRule`] ties a set of marker files to the commands used to
//! validate a project of that kind. The built-in table is ordered by priority
//! (lower number wins); user rules from configuration are merged into it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidateError;
use crate::validate::StageKind;

/// Detection rule and stage commands for one framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkRule {
    /// Display name, e.g. "Vitest"
    pub name: String,
    /// Detection precedence; lower numbers are checked first
    pub priority: u32,
    /// Marker file names or glob patterns that must all be present
    pub markers: Vec<String>,
    /// Type-check command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_check: Option<String>,
    /// Lint command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lint: Option<String>,
    /// Auto-fix variant of the lint command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lint_fix: Option<String>,
    /// Build command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    /// Test command
    pub test: String,
}

impl FrameworkRule {
    /// Create a rule with only a test command
    pub fn new(
        name: impl Into<String>,
        priority: u32,
        markers: &[&str],
        test: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            markers: markers.iter().map(|m| m.to_string()).collect(),
            type_check: None,
            lint: None,
            lint_fix: None,
            build: None,
            test: test.into(),
        }
    }

    /// Set the type-check command
    pub fn with_type_check(mut self, cmd: impl Into<String>) -> Self {
        self.type_check = Some(cmd.into());
        self
    }

    /// Set the lint command and its optional auto-fix variant
    pub fn with_lint(mut self, cmd: impl Into<String>, fix: Option<&str>) -> Self {
        self.lint = Some(cmd.into());
        self.lint_fix = fix.map(str::to_string);
        self
    }

    /// Set the build command
    pub fn with_build(mut self, cmd: impl Into<String>) -> Self {
        self.build = Some(cmd.into());
        self
    }

    /// Command for a stage, if the rule defines one.
    ///
    /// With `fix` set, the lint stage uses the auto-fix variant when present.
    pub fn command_for(&self, stage: StageKind, fix: bool) -> Option<&str> {
        match stage {
            StageKind::TypeCheck => self.type_check.as_deref(),
            StageKind::Lint => {
                if fix {
                    self.lint_fix.as_deref().or(self.lint.as_deref())
                } else {
                    self.lint.as_deref()
                }
            }
            StageKind::Build => self.build.as_deref(),
            StageKind::Test => Some(self.test.as_str()),
        }
    }

    /// Check that the rule is usable
    pub fn validate(&self) -> Result<(), ValidateError> {
        if self.name.trim().is_empty() {
            return Err(ValidateError::Config(
                "framework rule has an empty name".to_string(),
            ));
        }
        if self.markers.is_empty() {
            return Err(ValidateError::Config(format!(
                "framework '{}' has no marker files",
                self.name
            )));
        }
        for marker in &self.markers {
            glob::Pattern::new(marker).map_err(|e| {
                ValidateError::Config(format!(
                    "framework '{}' has invalid marker '{}': {}",
                    self.name, marker, e
                ))
            })?;
        }
        if self.test.trim().is_empty() {
            return Err(ValidateError::Config(format!(
                "framework '{}' has an empty test command",
                self.name
            )));
        }
        Ok(())
    }
}

/// The built-in framework table, in priority order
pub fn builtin_rules() -> Vec<FrameworkRule> {
    vec![
        FrameworkRule::new("Vitest", 10, &["package.json", "vitest.config.*"], "npx vitest run")
            .with_type_check("npx tsc --noEmit")
            .with_lint("npx eslint .", Some("npx eslint . --fix"))
            .with_build("npm run build"),
        FrameworkRule::new("Jest", 20, &["package.json", "jest.config.*"], "npx jest")
            .with_type_check("npx tsc --noEmit")
            .with_lint("npx eslint .", Some("npx eslint . --fix"))
            .with_build("npm run build"),
        FrameworkRule::new("Bun", 30, &["package.json", "bun.lock*"], "bun test")
            .with_type_check("bunx tsc --noEmit")
            .with_build("bun run build"),
        FrameworkRule::new("Deno", 40, &["deno.json*"], "deno test")
            .with_type_check("deno check .")
            .with_lint("deno lint", Some("deno lint --fix")),
        FrameworkRule::new("Node", 50, &["package.json"], "npm test")
            .with_lint("npm run lint", Some("npm run lint -- --fix"))
            .with_build("npm run build"),
        FrameworkRule::new("Cargo", 60, &["Cargo.toml"], "cargo test")
            .with_type_check("cargo check")
            .with_lint(
                "cargo clippy -- -D warnings",
                Some("cargo clippy --fix --allow-dirty"),
            )
            .with_build("cargo build"),
        FrameworkRule::new("Go", 70, &["go.mod"], "go test ./...").with_build("go build ./..."),
        FrameworkRule::new("Pytest", 80, &["pytest.ini"], "pytest")
            .with_type_check("mypy .")
            .with_lint("ruff check .", Some("ruff check . --fix")),
        FrameworkRule::new("Python", 90, &["pyproject.toml"], "pytest")
            .with_type_check("mypy .")
            .with_lint("ruff check .", Some("ruff check . --fix")),
        FrameworkRule::new("Maven", 100, &["pom.xml"], "mvn -q test").with_build("mvn -q compile"),
        FrameworkRule::new("Gradle", 110, &["build.gradle*"], "./gradlew test")
            .with_build("./gradlew build -x test"),
        FrameworkRule::new("Make", 120, &["Makefile"], "make test").with_build("make build"),
    ]
}

/// Merge user rules into the built-in table.
///
/// A user rule replaces a built-in rule of the same name (case-insensitive).
/// Rules named in `disabled` are dropped. The result is sorted by priority and
/// must not contain two rules with the same priority.
pub fn merge_rules(
    builtin: Vec<FrameworkRule>,
    custom: &[FrameworkRule],
    disabled: &[String],
) -> Result<Vec<FrameworkRule>, ValidateError> {
    let is_disabled = |name: &str| disabled.iter().any(|d| d.eq_ignore_ascii_case(name));

    for name in disabled {
        let known = builtin
            .iter()
            .chain(custom.iter())
            .any(|r| r.name.eq_ignore_ascii_case(name));
        if !known {
            tracing::warn!("Unknown framework in disabled_frameworks: {}", name);
        }
    }

    let mut rules: Vec<FrameworkRule> = builtin
        .into_iter()
        .filter(|b| !custom.iter().any(|c| c.name.eq_ignore_ascii_case(&b.name)))
        .collect();

    for rule in custom {
        rule.validate()?;
        rules.push(rule.clone());
    }

    rules.retain(|r| {
        let keep = !is_disabled(&r.name);
        if !keep {
            tracing::debug!("Framework '{}' disabled by configuration", r.name);
        }
        keep
    });

    rules.sort_by_key(|r| r.priority);
    check_unique_priorities(&rules)?;

    Ok(rules)
}

/// Reject rule sets where two frameworks share a priority
///
/// Detection picks the lowest priority number, so a tie would make the
/// selected framework depend on list order.
pub fn check_unique_priorities(rules: &[FrameworkRule]) -> Result<(), ValidateError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule.priority) {
            return Err(ValidateError::Config(format!(
                "duplicate framework priority {} (framework '{}')",
                rule.priority, rule.name
            )));
        }
    }
    Ok(())
}
