//! Configuration module for ea-validate
//!
//! Provides XDG-compliant layered configuration loading, with per-project
//! overrides from `.ea-validate.toml` in the validated root.

pub mod loader;
pub mod model;

pub use loader::{config_paths, find_config_files, load_config, PROJECT_CONFIG_FILE};
pub use model::*;
