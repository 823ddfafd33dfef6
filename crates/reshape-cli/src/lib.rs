//! Reshape CLI - Command-line front end for reshape templates
//!
//! Reads data and JSON-notation templates from files and runs match and
//! format passes over them.

pub mod commands;

// Re-export commonly used types for convenience
pub use commands::{read_json, read_template, run_command, ReshapeCommand};
