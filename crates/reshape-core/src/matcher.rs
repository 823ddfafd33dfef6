//! Matcher: fills a scope tree from a match template and input data
//!
//! Object templates read fields of the data into the current scope; sequence
//! templates open one child scope per data element. Literal entries of an
//! object template act as filters for the whole object.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use crate::{
    access::FieldAccessor, hooks::MatchHook, next_path, walk_event, Result, ScopeId, ScopeTree,
    ShapeConfig, Template,
};

/// Runs match passes
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: ShapeConfig,
}

impl Matcher {
    pub fn new(config: ShapeConfig) -> Self {
        Self { config }
    }

    /// Match `template` against `data` into a fresh scope tree
    pub fn run<D: FieldAccessor>(&self, template: &Template, data: &D) -> Result<ScopeTree> {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        self.match_node(&mut tree, template, Some(data), "root", root)?;
        Ok(tree)
    }

    fn match_node<D: FieldAccessor>(
        &self,
        tree: &mut ScopeTree,
        template: &Template,
        data: Option<&D>,
        path: &str,
        scope: ScopeId,
    ) -> Result<()> {
        // Match hooks see absent data too; the function decides what it means.
        let match_hook = match template {
            Template::Match(hook) => Some(hook),
            Template::Combined(hook) => hook.match_side(),
            _ => None,
        };
        if let Some(hook) = match_hook {
            return self.apply_hook(tree, hook, data, path, scope);
        }

        let Some(data) = data.filter(|data| !data.is_absent()) else {
            walk_event!(self.config, path = path, "no data to match");
            return Ok(());
        };

        match template {
            Template::Signal(signal) => {
                let value = data.to_value();
                walk_event!(self.config, path = path, signal = signal.key(), %value, "matched signal");
                tree.add(scope, signal.key(), value);
                Ok(())
            }
            Template::Object(fields) => self.match_object(tree, fields, data, path, scope),
            Template::Sequence(items) => self.match_sequence(tree, items, data, path, scope),
            Template::Format(hook) => {
                walk_event!(self.config, path = path, "format hook, matching its template");
                self.match_node(tree, hook.template(), Some(data), path, scope)
            }
            Template::Combined(hook) => {
                self.match_node(tree, hook.template(), Some(data), path, scope)
            }
            Template::Match(_) | Template::Literal(_) => {
                walk_event!(self.config, path = path, kind = template.kind(), "nothing to match");
                Ok(())
            }
        }
    }

    fn apply_hook<D: FieldAccessor>(
        &self,
        tree: &mut ScopeTree,
        hook: &MatchHook,
        data: Option<&D>,
        path: &str,
        scope: ScopeId,
    ) -> Result<()> {
        let input = data.map_or(Value::Null, |data| data.to_value());
        walk_event!(self.config, path = path, %input, "running match hook");

        let strict = hook.is_strict() || self.config.strict_hooks;
        if let Some(writes) = hook.run(input, path).settle(strict, path)? {
            for (key, value) in writes {
                tree.add(scope, key, value);
            }
        }
        Ok(())
    }

    fn match_object<D: FieldAccessor>(
        &self,
        tree: &mut ScopeTree,
        fields: &IndexMap<String, Template>,
        data: &D,
        path: &str,
        scope: ScopeId,
    ) -> Result<()> {
        for (key, field) in fields {
            if let Template::Literal(expected) = field {
                let actual = field_of(data, key, path).map_or(Value::Null, |v| v.to_value());
                if &actual != expected {
                    walk_event!(
                        self.config,
                        path = path,
                        key = key.as_str(),
                        %expected,
                        %actual,
                        "filter rejected object"
                    );
                    return Ok(());
                }
            }
        }

        for (key, field) in fields {
            let value = field_of(data, key, path);
            self.match_node(tree, field, value.as_deref(), &next_path(path, key), scope)?;
        }
        Ok(())
    }

    fn match_sequence<D: FieldAccessor>(
        &self,
        tree: &mut ScopeTree,
        items: &[Template],
        data: &D,
        path: &str,
        scope: ScopeId,
    ) -> Result<()> {
        // A single element where a list was expected is a list of one.
        let elements = if data.is_sequence() {
            data.elements()
        } else {
            vec![Cow::Borrowed(data)]
        };

        for (idx, item) in items.iter().enumerate() {
            let item_path = next_path(path, &idx.to_string());
            for element in &elements {
                let child = tree.new_child(scope);
                self.match_node(tree, item, Some(element.as_ref()), &item_path, child)?;
            }
        }

        tree.prune_empty_children(scope);
        Ok(())
    }
}

/// Field `key` of `data`. On sequence-like data the first element is used.
fn field_of<'a, D: FieldAccessor>(data: &'a D, key: &str, path: &str) -> Option<Cow<'a, D>> {
    if !data.is_sequence() {
        return data.field(key);
    }

    warn!(path = path, key = key, "object template met a list, using its first element");
    match data.elements().into_iter().next()? {
        Cow::Borrowed(first) => field_of(first, key, path),
        Cow::Owned(first) => field_of(&first, key, path).map(|field| Cow::Owned(field.into_owned())),
    }
}
