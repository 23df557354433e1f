//! Project-type auto-detection
//!
//! Walks the rule table in priority order and selects the first rule whose
//! marker files are all present in the project root. Markers containing glob
//! metacharacters (`*`, `?`, `[`) are matched against the root's entries;
//! plain markers are checked with a direct path lookup.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use super::rules::FrameworkRule;

/// Result of framework detection
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectionResult {
    /// The selected rule (lowest priority number whose markers all exist)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected: Option<FrameworkRule>,
    /// Names of every rule whose markers are satisfied, in priority order
    pub matching: Vec<String>,
    /// Marker files found in the root, sorted
    pub markers_found: Vec<String>,
}

impl DetectionResult {
    /// Name of the selected framework, if any
    pub fn framework_name(&self) -> Option<&str> {
        self.detected.as_ref().map(|r| r.name.as_str())
    }
}

/// Detect which framework a project uses
///
/// # Arguments
/// * `dir` - Project root to inspect
/// * `rules` - Rule table; checked in ascending priority regardless of order
///
/// # Returns
/// * `DetectionResult` with the selected rule and every satisfied rule
pub fn detect_framework(dir: &Path, rules: &[FrameworkRule]) -> DetectionResult {
    let entries = list_entries(dir);
    let mut result = DetectionResult::default();
    let mut found: BTreeSet<String> = BTreeSet::new();

    let mut ordered: Vec<&FrameworkRule> = rules.iter().collect();
    ordered.sort_by_key(|r| r.priority);

    for rule in ordered {
        let mut all_present = true;
        for marker in &rule.markers {
            let hits = find_marker(dir, &entries, marker);
            if hits.is_empty() {
                all_present = false;
            }
            found.extend(hits);
        }

        if all_present {
            tracing::debug!("Framework '{}' matches {}", rule.name, dir.display());
            result.matching.push(rule.name.clone());
            if result.detected.is_none() {
                result.detected = Some(rule.clone());
            }
        }
    }

    result.markers_found = found.into_iter().collect();
    result
}

/// Check whether a single marker is present in a directory
pub fn marker_present(dir: &Path, marker: &str) -> bool {
    !find_marker(dir, &list_entries(dir), marker).is_empty()
}

/// Whether a marker uses glob syntax
fn is_pattern(marker: &str) -> bool {
    marker.contains(&['*', '?', '['][..])
}

/// Resolve a marker to the file names it matches in `dir`
fn find_marker(dir: &Path, entries: &[String], marker: &str) -> Vec<String> {
    if !is_pattern(marker) {
        return if dir.join(marker).exists() {
            vec![marker.to_string()]
        } else {
            vec![]
        };
    }

    match glob::Pattern::new(marker) {
        Ok(pattern) => entries
            .iter()
            .filter(|name| pattern.matches(name))
            .cloned()
            .collect(),
        Err(e) => {
            tracing::warn!("Invalid marker pattern '{}': {}", marker, e);
            vec![]
        }
    }
}

/// File names directly under `dir`
fn list_entries(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(read_dir) => read_dir
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect(),
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", dir.display(), e);
            vec![]
        }
    }
}
