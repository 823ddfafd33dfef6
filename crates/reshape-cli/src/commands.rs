//! Command definitions and execution
//!
//! Each command reads its inputs from disk and produces one JSON value for
//! the binary to print.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use reshape_core::{ShapeConfig, ShapeRuntime, Template, Value};
use tracing::debug;

/// Available commands
#[derive(Debug, Clone)]
pub enum ReshapeCommand {
    /// Match the data, then format the result
    Transform {
        data: PathBuf,
        match_template: PathBuf,
        format_template: PathBuf,
    },
    /// Match the data and report the scope tree
    Match {
        data: PathBuf,
        match_template: PathBuf,
    },
}

/// Read a JSON document
pub fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Read a template written in JSON notation
pub fn read_template(path: &Path) -> Result<Template> {
    let value = read_json(path)?;
    Template::from_json(&value)
        .with_context(|| format!("Invalid template in {}", path.display()))
}

/// Run `command` with `config`, returning the value to print
pub fn run_command(command: &ReshapeCommand, config: ShapeConfig) -> Result<Value> {
    let runtime = ShapeRuntime::new(config);

    match command {
        ReshapeCommand::Transform {
            data,
            match_template,
            format_template,
        } => {
            let data = read_json(data)?;
            let match_template = read_template(match_template)?;
            let format_template = read_template(format_template)?;
            debug!(config = ?runtime.config(), "running transform");

            runtime
                .transform(&data, &match_template, &format_template)
                .context("Transform failed")
        }
        ReshapeCommand::Match {
            data,
            match_template,
        } => {
            let data = read_json(data)?;
            let match_template = read_template(match_template)?;
            debug!(config = ?runtime.config(), "running match");

            let tree = runtime
                .match_data(&match_template, &data)
                .context("Match failed")?;
            Ok(tree.to_json())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_missing_file_reports_path() {
        let err = read_json(Path::new("/nonexistent/data.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/data.json"));
    }

    #[test]
    fn test_bad_notation_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "$"}}"#).unwrap();

        let err = read_template(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid template in"));
        assert!(format!("{err:#}").contains("root.name"));
    }
}
