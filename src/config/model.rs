//! Configuration model for ea-validate
//!
//! Defines the structure for XDG-compliant layered configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidateError;
use crate::framework::{builtin_rules, merge_rules, FrameworkRule};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Built-in or custom frameworks to leave out of detection
    #[serde(default)]
    pub disabled_frameworks: Vec<String>,

    /// Default settings applied to every run
    #[serde(default)]
    pub defaults: Defaults,

    /// User-defined framework rules, merged into the built-in table
    #[serde(default)]
    pub frameworks: Vec<FrameworkRule>,
}

/// Default settings applied to every run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    /// Per-stage timeout in seconds (0 = no timeout)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Maximum bytes captured per output stream
    #[serde(default = "default_max_output")]
    pub max_output: usize,

    /// Output lines kept per stage when not running verbose
    #[serde(default = "default_summary_lines")]
    pub summary_lines: usize,
}

fn default_timeout() -> u64 {
    300
}

fn default_max_output() -> usize {
    100_000
}

fn default_summary_lines() -> usize {
    20
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_output: default_max_output(),
            summary_lines: default_summary_lines(),
        }
    }
}

impl Config {
    /// Per-stage timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        match self.defaults.timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Effective rule table: built-ins merged with user rules, sorted by priority
    ///
    /// # Errors
    /// * `ValidateError::Config` - If a user rule is invalid or priorities collide
    pub fn rules(&self) -> Result<Vec<FrameworkRule>, ValidateError> {
        let custom: Vec<FrameworkRule> = self.frameworks.iter().map(expand_rule).collect();
        merge_rules(builtin_rules(), &custom, &self.disabled_frameworks)
    }
}

/// Expand `~` and environment variables in a user rule's commands
fn expand_rule(rule: &FrameworkRule) -> FrameworkRule {
    let expand = |cmd: &String| -> String {
        match shellexpand::full(cmd) {
            Ok(expanded) => expanded.into_owned(),
            Err(e) => {
                tracing::warn!("Cannot expand command '{}': {}", cmd, e);
                cmd.clone()
            }
        }
    };

    FrameworkRule {
        type_check: rule.type_check.as_ref().map(expand),
        lint: rule.lint.as_ref().map(expand),
        lint_fix: rule.lint_fix.as_ref().map(expand),
        build: rule.build.as_ref().map(expand),
        test: expand(&rule.test),
        ..rule.clone()
    }
}
