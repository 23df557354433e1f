//! MCP Server implementation
//!
//! Implements the MCP tools for ea-validate using rmcp SDK.

use std::path::Path;
use std::time::Duration;

use rmcp::model::{Implementation, ServerCapabilities, ServerInfo, ToolsCapability};
use rmcp::{tool, ServerHandler};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{load_config, Config};
use crate::error::{ErrorInfo, ValidateError};
use crate::framework::FrameworkRule;
use crate::validate::{resolve_project_root, Report, ValidateOptions, Validator};

/// MCP Server for ea-validate
///
/// Configuration is reloaded for every request so a project's own
/// `.ea-validate.toml` is always applied.
#[derive(Debug, Clone, Default)]
pub struct ValidateServer {
    /// Config file override passed on the command line
    config_path: Option<String>,
}

impl ValidateServer {
    /// Create a new MCP server
    pub fn new(config_path: Option<String>) -> Self {
        Self { config_path }
    }

    /// Load configuration layered with the project's own config file
    fn load_for(&self, root: Option<&Path>) -> Result<Config, ValidateError> {
        load_config(self.config_path.as_deref(), root)
            .map_err(|e| ValidateError::Config(format!("{:#}", e)))
    }

    fn resolve(
        &self,
        project: Option<&str>,
    ) -> Result<(std::path::PathBuf, Config, Validator), ValidateError> {
        let root = resolve_project_root(project)?;
        let config = self.load_for(Some(&root))?;
        let validator = Validator::from_config(&config)?;
        Ok((root, config, validator))
    }
}

// === Tool Parameter Types ===

/// Parameters for validate_project tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ValidateProjectParams {
    /// Project directory (defaults to the server's current directory)
    #[serde(default)]
    pub project: Option<String>,

    /// Run the lint stage's auto-fix command
    #[serde(default)]
    pub fix: bool,

    /// Only type-check and lint; skip build and test
    #[serde(default)]
    pub quick: bool,

    /// Return full stage output instead of the last lines
    #[serde(default)]
    pub verbose: bool,

    /// Per-stage timeout in seconds (0 disables; defaults to config)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Parameters for detect_framework tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DetectFrameworkParams {
    /// Project directory (defaults to the server's current directory)
    #[serde(default)]
    pub project: Option<String>,
}

/// Response from detect_framework tool
#[derive(Debug, Serialize)]
pub struct DetectFrameworkResponse {
    /// Project name from the nearest manifest
    pub project: String,
    /// Resolved project root
    pub path: String,
    /// Selected framework (highest priority match)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected: Option<String>,
    /// Every framework whose markers matched, in priority order
    pub matching: Vec<String>,
    /// Marker files found in the project root
    pub markers_found: Vec<String>,
}

/// Parameters for list_frameworks tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListFrameworksParams {
    /// Project directory whose .ea-validate.toml is applied
    #[serde(default)]
    pub project: Option<String>,
}

/// Response from list_frameworks tool
#[derive(Debug, Serialize)]
pub struct ListFrameworksResponse {
    /// Rules in priority order
    pub frameworks: Vec<FrameworkRule>,
}

/// Error response for tools
#[derive(Debug, Serialize)]
struct ToolError {
    success: bool,
    error: String,
    error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
}

impl ToolError {
    fn new(error: &ValidateError) -> String {
        let info = ErrorInfo::from(error);
        serde_json::to_string_pretty(&ToolError {
            success: false,
            error: info.message,
            error_type: info.error_type,
            suggestion: info.suggestion,
        })
        .unwrap_or_else(|_| format!("{{\"success\":false,\"error\":\"{}\"}}", error))
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        ToolError::new(&ValidateError::Config(format!("Serialization error: {}", e)))
    })
}

// === MCP Tool Implementations ===

#[tool(tool_box)]
impl ValidateServer {
    /// Validate a project
    ///
    /// Detects the framework and runs type-check, lint, build and test.
    #[tool(
        description = "Validate a project: detect its framework and run type-check, lint, build and test. Returns PASSED, PARTIAL, FAILED or UNKNOWN with per-stage results."
    )]
    pub async fn validate_project(&self, #[tool(aggr)] params: ValidateProjectParams) -> String {
        let (root, config, validator) = match self.resolve(params.project.as_deref()) {
            Ok(r) => r,
            Err(e) => return ToolError::new(&e),
        };

        let timeout = match params.timeout_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => config.timeout(),
        };
        let options = ValidateOptions {
            fix: params.fix,
            quick: params.quick,
            verbose: params.verbose,
            timeout,
        };

        let run = validator.validate(&root, &options).await;
        let report = Report::from_run(&run, options.verbose, config.defaults.summary_lines);

        to_json(&report)
    }

    /// Detect which framework a project uses
    #[tool(
        description = "Detect which framework a project uses from its marker files, without running any commands."
    )]
    pub async fn detect_framework(&self, #[tool(aggr)] params: DetectFrameworkParams) -> String {
        let (root, _config, validator) = match self.resolve(params.project.as_deref()) {
            Ok(r) => r,
            Err(e) => return ToolError::new(&e),
        };

        let detection = validator.detect(&root);
        let response = DetectFrameworkResponse {
            project: crate::framework::project_name(&root),
            path: root.display().to_string(),
            detected: detection.framework_name().map(str::to_string),
            matching: detection.matching,
            markers_found: detection.markers_found,
        };

        to_json(&response)
    }

    /// List framework rules in priority order
    #[tool(
        description = "List the framework rules (markers and stage commands) in priority order, including custom rules from configuration."
    )]
    pub async fn list_frameworks(&self, #[tool(aggr)] params: ListFrameworksParams) -> String {
        let (_root, _config, validator) = match self.resolve(params.project.as_deref()) {
            Ok(r) => r,
            Err(e) => return ToolError::new(&e),
        };

        to_json(&ListFrameworksResponse {
            frameworks: validator.rules().to_vec(),
        })
    }
}

#[tool(tool_box)]
impl ServerHandler for ValidateServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "ea-validate".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(
                "MCP server that validates projects. Detects the framework from marker files \
                 and runs its type-check, lint, build and test commands."
                    .to_string(),
            ),
        }
    }
}
