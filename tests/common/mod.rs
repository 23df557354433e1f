//! Common test utilities for ea-validate tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Marker file that selects the `Shell` test framework
pub const SHELL_MARKER: &str = "shell.marker";

/// Stage commands for a generated `Shell` framework rule
#[derive(Default)]
pub struct ShellRule<'a> {
    pub type_check: Option<&'a str>,
    pub lint: Option<&'a str>,
    pub lint_fix: Option<&'a str>,
    pub build: Option<&'a str>,
    pub test: &'a str,
}

impl ShellRule<'_> {
    fn to_toml(&self) -> String {
        let mut toml = format!(
            "[[frameworks]]\nname = \"Shell\"\npriority = 1\nmarkers = [\"{}\"]\n",
            SHELL_MARKER
        );
        for (key, value) in [
            ("type_check", self.type_check),
            ("lint", self.lint),
            ("lint_fix", self.lint_fix),
            ("build", self.build),
        ] {
            if let Some(cmd) = value {
                toml.push_str(&format!("{} = \"{}\"\n", key, cmd));
            }
        }
        toml.push_str(&format!("test = \"{}\"\n", self.test));
        toml
    }
}

/// Creates a project whose framework is a `Shell` rule from `.ea-validate.toml`
pub fn create_rule_project(rule: &ShellRule) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(dir.path().join(SHELL_MARKER), "").expect("Failed to write marker");
    std::fs::write(dir.path().join(".ea-validate.toml"), rule.to_toml())
        .expect("Failed to write config");
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Creates a project with the given files
pub fn create_project(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).expect("Failed to write file");
    }
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Creates a temporary directory with no marker files
pub fn create_empty_project() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// The ea-validate binary, isolated from the user's own config files
pub fn ea_validate(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ea-validate").expect("Binary not built");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("EA_VALIDATE_CONFIG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .current_dir(home);
    cmd
}

/// Sample package.json content for testing
pub const SAMPLE_PACKAGE_JSON: &str = r#"{
  "name": "sample-web-app",
  "version": "1.0.0",
  "scripts": {
    "build": "tsc",
    "test": "vitest run"
  }
}
"#;
