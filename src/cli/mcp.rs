//! MCP server launcher
//!
//! Starts the MCP server over stdio.

use anyhow::{Context, Result};
use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};

use crate::config::load_config;
use crate::error::ValidateError;
use crate::mcp::ValidateServer;

/// Run the MCP server over stdio.
///
/// Configuration is loaded once here. Project-local `.ea-validate.toml`
/// files are layered in per request by the server.
///
/// # Arguments
/// * `config_path` - Optional path to a config file override
pub async fn run_mcp_server(config_path: Option<&str>) -> Result<()> {
    // Fail fast on a broken global config
    let config = load_config(config_path, None)
        .map_err(|e| ValidateError::Config(format!("{:#}", e)))?;
    config.rules().context("Invalid framework rules")?;

    let server = ValidateServer::new(config_path.map(str::to_string));
    tracing::info!("Starting MCP server over stdio");

    let service = server.serve((stdin(), stdout())).await?;
    service.waiting().await?;

    Ok(())
}
