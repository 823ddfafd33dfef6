//! Template vocabulary shared by the matcher and the formatter

pub mod notation;

use indexmap::IndexMap;
use serde_json::Value;

use crate::{CombinedHook, FormatHook, MatchHook, Signal};

/// A node of a match or format template
#[derive(Debug, Clone)]
pub enum Template {
    /// Named slot
    Signal(Signal),
    /// Fixed value: a filter condition when matching, echoed when formatting
    Literal(Value),
    /// Object of sub-templates, in key order
    Object(IndexMap<String, Template>),
    /// List of sub-templates; each one applies to every element
    Sequence(Vec<Template>),
    /// Match-side function around a signal or an object of signals
    Match(MatchHook),
    /// Format-side function around any sub-template
    Format(FormatHook),
    /// Optional function on each side around one sub-template
    Combined(CombinedHook),
}

impl Template {
    /// Object template from `(key, sub-template)` pairs
    pub fn object<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<Template>,
    {
        Template::Object(
            entries
                .into_iter()
                .map(|(key, template)| (key.into(), template.into()))
                .collect(),
        )
    }

    /// Sequence template from its element templates
    pub fn sequence<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Template>,
    {
        Template::Sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Template::Literal(value.into())
    }

    /// Insert or replace one field of an object template. Other templates are
    /// returned unchanged.
    pub fn with_field(mut self, key: impl Into<String>, template: impl Into<Template>) -> Self {
        if let Template::Object(fields) = &mut self {
            fields.insert(key.into(), template.into());
        }
        self
    }

    /// Short name of the node kind, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Template::Signal(_) => "signal",
            Template::Literal(_) => "literal",
            Template::Object(_) => "object",
            Template::Sequence(_) => "sequence",
            Template::Match(_) => "match hook",
            Template::Format(_) => "format hook",
            Template::Combined(_) => "combined hook",
        }
    }
}

impl From<Signal> for Template {
    fn from(signal: Signal) -> Self {
        Template::Signal(signal)
    }
}

impl From<MatchHook> for Template {
    fn from(hook: MatchHook) -> Self {
        Template::Match(hook)
    }
}

impl From<FormatHook> for Template {
    fn from(hook: FormatHook) -> Self {
        Template::Format(hook)
    }
}

impl From<CombinedHook> for Template {
    fn from(hook: CombinedHook) -> Self {
        Template::Combined(hook)
    }
}

impl From<Value> for Template {
    fn from(value: Value) -> Self {
        Template::Literal(value)
    }
}

impl From<&str> for Template {
    fn from(value: &str) -> Self {
        Template::Literal(Value::String(value.to_string()))
    }
}
