//! MCP Server module
//!
//! Provides MCP tools for project validation:
//! - `validate_project` - Run the validation stages for a project
//! - `detect_framework` - Detect which framework a project uses
//! - `list_frameworks` - List framework rules in priority order

pub mod server;

pub use server::ValidateServer;
