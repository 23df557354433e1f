//! CLI module for ea-validate
//!
//! Provides command-line interface with the following subcommands:
//! - `validate` - Run the validation stages for a project
//! - `detect` - Detect a project's framework
//! - `frameworks` - List framework rules
//! - `config` - Show merged configuration
//! - `mcp` - Start MCP server over stdio

pub mod commands;
pub mod mcp;

pub use commands::{Cli, Commands};
pub use mcp::run_mcp_server;
