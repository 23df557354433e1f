//! Configuration loader with XDG-compliant path resolution
//!
//! Loads configuration from multiple locations with layered priority:
//! 1. `/etc/ea-validate/config.toml` (lowest priority)
//! 2. `~/.config/ea-validate/config.toml`
//! 3. `~/.ea-validate.toml`
//! 4. `./.ea-validate.toml`
//! 5. `<project root>/.ea-validate.toml`
//! 6. `--config` override file
//! 7. `EA_VALIDATE_*` environment variables (highest priority)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use super::model::Config;

/// Application name used for XDG directories
const APP_NAME: &str = "ea-validate";

/// Project-local config file name
pub const PROJECT_CONFIG_FILE: &str = ".ea-validate.toml";

/// Get XDG config search paths in priority order (lowest to highest)
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. System-wide config (lowest priority)
    paths.push(PathBuf::from(format!("/etc/{}/config.toml", APP_NAME)));

    // 2. XDG config home
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(APP_NAME).join("config.toml"));
    }

    // 3. Home directory
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(PROJECT_CONFIG_FILE));
    }

    // 4. Current directory (highest file priority)
    paths.push(PathBuf::from(PROJECT_CONFIG_FILE));

    paths
}

/// Load configuration with XDG layering
///
/// Configurations are merged in priority order, with later files
/// overriding earlier ones. Environment variables with prefix
/// `EA_VALIDATE_` override all file-based configuration.
///
/// # Arguments
/// * `override_path` - Optional path to a config file that takes highest file priority
/// * `project_root` - Optional project root whose `.ea-validate.toml` is layered in
///
/// # Returns
/// * `Result<Config>` - The merged configuration
pub fn load_config(override_path: Option<&str>, project_root: Option<&Path>) -> Result<Config> {
    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

    let mut paths = config_paths();
    if let Some(root) = project_root {
        let project_config = root.join(PROJECT_CONFIG_FILE);
        if !paths.contains(&project_config) {
            paths.push(project_config);
        }
    }

    for path in paths {
        if path.exists() {
            tracing::debug!("Loading config from: {}", path.display());
            figment = figment.merge(Toml::file(&path));
        }
    }

    if let Some(path) = override_path {
        let path = PathBuf::from(shellexpand::tilde(path).as_ref());
        if path.exists() {
            tracing::debug!("Loading override config from: {}", path.display());
            figment = figment.merge(Toml::file(&path));
        } else {
            tracing::warn!("Override config not found: {}", path.display());
        }
    }

    // Format: EA_VALIDATE_DEFAULTS__TIMEOUT=600
    // Maps to: defaults.timeout = 600
    figment = figment.merge(Env::prefixed("EA_VALIDATE_").split("__"));

    figment.extract().context("Failed to load configuration")
}

/// Find all existing config files (for debugging/introspection)
pub fn find_config_files(project_root: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = config_paths();
    if let Some(root) = project_root {
        paths.push(root.join(PROJECT_CONFIG_FILE));
    }
    paths.into_iter().filter(|p| p.exists()).collect()
}
