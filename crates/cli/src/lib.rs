//! Operator tool for the cache-node sidecar.
//!
//! Provides commands for:
//! - Resolving and printing the node identity
//! - Looking up individual settings
//! - Listing the settings catalog
//! - Inspecting rack membership

pub mod commands;
pub mod config;
pub mod logging;

pub use commands::{Command, CommandResult};
pub use config::{CliConfig, CliEnvironment};
pub use logging::log_filter;
