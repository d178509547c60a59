//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.
//! Each handler implements the business logic for a specific CLI subcommand.

mod generate;

pub use generate::{emit_report, exit_code_for, generate_report, run_generate};

// Re-export config types used by handlers
pub use crate::config::{GenerateConfig, GeneratePaths};
