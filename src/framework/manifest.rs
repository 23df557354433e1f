//! Project name lookup from manifest files
//!
//! Checks the project root and then each ancestor for a manifest that
//! declares a name. Only the name field is read; nothing else in the
//! manifest is interpreted.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches the module directive in go.mod: "module example.com/app"
static GO_MODULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*module\s+(\S+)").unwrap());

/// Matches the first artifactId in pom.xml
static POM_ARTIFACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<artifactId>\s*([^<\s]+)\s*</artifactId>").unwrap());

/// Manifests checked in each directory, in order
const MANIFESTS: &[&str] = &[
    "package.json",
    "Cargo.toml",
    "pyproject.toml",
    "go.mod",
    "deno.json",
    "pom.xml",
];

/// Resolve the display name for a project
///
/// Returns the first name found in a manifest in `root` or its ancestors,
/// falling back to the root directory's own name.
pub fn project_name(root: &Path) -> String {
    for dir in root.ancestors() {
        if let Some(name) = name_in_dir(dir) {
            return name;
        }
    }

    root.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .or_else(|| {
            root.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        })
        .unwrap_or_else(|| root.display().to_string())
}

/// Name declared by the first manifest in `dir` that has one
fn name_in_dir(dir: &Path) -> Option<String> {
    MANIFESTS.iter().find_map(|manifest| {
        let path = dir.join(manifest);
        if !path.is_file() {
            return None;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!("Cannot read {}: {}", path.display(), e);
                return None;
            }
        };
        let name = read_name(manifest, &content);
        if name.is_none() {
            tracing::debug!("No project name in {}", path.display());
        }
        name
    })
}

/// Extract the project name from manifest content
fn read_name(manifest: &str, content: &str) -> Option<String> {
    let name = match manifest {
        "package.json" | "deno.json" => serde_json::from_str::<serde_json::Value>(content)
            .ok()?
            .get("name")?
            .as_str()
            .map(str::to_string),
        "Cargo.toml" => {
            let value: toml::Value = toml::from_str(content).ok()?;
            value
                .get("package")?
                .get("name")?
                .as_str()
                .map(str::to_string)
        }
        "pyproject.toml" => {
            let value: toml::Value = toml::from_str(content).ok()?;
            value
                .get("project")
                .and_then(|p| p.get("name"))
                .or_else(|| {
                    value
                        .get("tool")
                        .and_then(|t| t.get("poetry"))
                        .and_then(|p| p.get("name"))
                })?
                .as_str()
                .map(str::to_string)
        }
        "go.mod" => GO_MODULE_RE
            .captures(content)
            .map(|caps| caps[1].to_string()),
        "pom.xml" => POM_ARTIFACT_RE
            .captures(content)
            .map(|caps| caps[1].to_string()),
        _ => None,
    };

    name.filter(|n| !n.trim().is_empty())
}
