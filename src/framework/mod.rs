//! Framework detection
//!
//! Provides the rule table and detection logic:
//! - [`rules`] - Built-in framework rules and merging with user rules
//! - [`detect`] - Marker-file detection by priority
//! - [`manifest`] - Project name lookup

pub mod detect;
pub mod manifest;
pub mod rules;

pub use detect::{detect_framework, marker_present, DetectionResult};
pub use manifest::project_name;
pub use rules::{builtin_rules, check_unique_priorities, merge_rules, FrameworkRule};
