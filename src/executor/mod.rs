//! Command execution module
//!
//! Provides async command execution with:
//! - Timeout support
//! - Output capture and truncation
//! - Tool lookup on PATH before spawning
//! - Working directory control

pub mod process;
pub mod traits;

pub use process::*;
pub use traits::{CommandExecutor, CommandLine};
