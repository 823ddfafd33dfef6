//! Reshape Runtime - High-level interface for match and format passes
//!
//! Wraps the matcher and the formatter behind one configuration, for use by
//! external components like the CLI.

use serde_json::Value;

use crate::{
    access::FieldAccessor, Formatter, Matcher, Result, ScopeTree, ShapeConfig, Template,
};

/// Runs match and format passes with a shared configuration
#[derive(Debug, Clone, Default)]
pub struct ShapeRuntime {
    config: ShapeConfig,
}

impl ShapeRuntime {
    /// Create a new runtime with the given configuration
    pub fn new(config: ShapeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShapeConfig {
        &self.config
    }

    /// Match `template` against `data`, producing a fresh scope tree
    pub fn match_data<D: FieldAccessor>(&self, template: &Template, data: &D) -> Result<ScopeTree> {
        Matcher::new(self.config.clone()).run(template, data)
    }

    /// Format `template` from a previously matched tree
    pub fn format(&self, template: &Template, tree: &ScopeTree) -> Result<Value> {
        Formatter::new(tree, self.config.clone()).format(template)
    }

    /// Match then format in one go
    pub fn transform<D: FieldAccessor>(
        &self,
        data: &D,
        match_template: &Template,
        format_template: &Template,
    ) -> Result<Value> {
        let tree = self.match_data(match_template, data)?;
        self.format(format_template, &tree)
    }
}

/// Match with the default configuration
pub fn match_data<D: FieldAccessor>(template: &Template, data: &D) -> Result<ScopeTree> {
    ShapeRuntime::default().match_data(template, data)
}

/// Format with the default configuration
pub fn format_data(template: &Template, tree: &ScopeTree) -> Result<Value> {
    ShapeRuntime::default().format(template, tree)
}

/// Match then format with the default configuration
pub fn transform<D: FieldAccessor>(
    data: &D,
    match_template: &Template,
    format_template: &Template,
) -> Result<Value> {
    ShapeRuntime::default().transform(data, match_template, format_template)
}
