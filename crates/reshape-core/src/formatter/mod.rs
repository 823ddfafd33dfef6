//! Formatter: rebuilds data from a scope tree
//!
//! Each node is formatted under a state that says where in the tree it is
//! resolved, whether lookups may search below that scope, and whether the
//! caller wants one value or a list.
//!
//! Object templates transpose: the signals they name pick the deepest scopes
//! holding them, and a list-wanting caller gets one object per such scope.
//! Sequence templates accumulate: every child scope contributes, whatever its
//! depth, and results are flattened into one list.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{
    hooks::FormatHook, next_path, walk_event, Lookup, Result, ScopeId, ScopeTree, ShapeConfig,
    ShapeError, Signal, Template,
};


/// Shape the caller expects back from a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Want {
    Single,
    List,
}

#[derive(Debug, Clone)]
struct State {
    path: String,
    search_deep: bool,
    want: Want,
    scope: ScopeId,
}

impl State {
    fn new(path: String, search_deep: bool, want: Want, scope: ScopeId) -> Self {
        Self {
            path,
            search_deep,
            want,
            scope,
        }
    }
}

/// Runs format passes over a matched scope tree. The tree is only read, so
/// any number of formatters may share it.
#[derive(Debug, Clone)]
pub struct Formatter<'t> {
    tree: &'t ScopeTree,
    config: ShapeConfig,
}

impl<'t> Formatter<'t> {
    pub fn new(tree: &'t ScopeTree, config: ShapeConfig) -> Self {
        Self { tree, config }
    }

    /// Format `template` from the root scope. Absent entries are stripped
    /// from the result; with `deep_clean`, so are containers left empty.
    pub fn format(&self, template: &Template) -> Result<Value> {
        let state = State::new("root".to_string(), true, Want::Single, self.tree.root());

        let result = self.format_node(template, &state)?;
        Ok(result
            .and_then(|value| clean(value, self.config.deep_clean))
            .unwrap_or(Value::Null))
    }

    fn format_node(&self, template: &Template, state: &State) -> Result<Option<Value>> {
        walk_event!(
            self.config,
            path = state.path.as_str(),
            kind = template.kind(),
            search_deep = state.search_deep,
            want = ?state.want,
            "formatting"
        );

        match template {
            Template::Signal(signal) => self.format_signal(signal, state),
            Template::Object(fields) => self.format_object(fields, state),
            Template::Sequence(items) => self.format_sequence(items, state).map(Some),
            Template::Format(hook) => self.apply_hook(hook, state),
            Template::Combined(hook) => match hook.format_side() {
                Some(format) => self.apply_hook(format, state),
                None => self.format_node(hook.template(), state),
            },
            Template::Match(hook) => self.format_node(hook.template(), state),
            Template::Literal(value) => Ok(Some(value.clone())),
        }
    }

    fn format_signal(&self, signal: &Signal, state: &State) -> Result<Option<Value>> {
        match self.tree.lookup(state.scope, signal, state.search_deep) {
            Lookup::Missing => Ok(None),
            Lookup::Found(value) => Ok(Some(value.clone())),
            Lookup::Aggregated(values) if state.want == Want::Single => {
                Err(ShapeError::incorrect_type(
                    &state.path,
                    format!(
                        "{signal} holds {} values here but a single value was requested",
                        values.len()
                    ),
                ))
            }
            Lookup::Aggregated(values) => Ok(Some(Value::Array(values))),
        }
    }

    fn apply_hook(&self, hook: &FormatHook, state: &State) -> Result<Option<Value>> {
        let inner = State::new(state.path.clone(), true, Want::Single, state.scope);
        let partial = self
            .format_node(hook.template(), &inner)?
            .unwrap_or(Value::Null);

        let strict = hook.is_strict() || self.config.strict_hooks;
        let result = hook.run(partial).settle(strict, &state.path)?;
        Ok(result.filter(|value| !value.is_null()))
    }

    fn format_object(
        &self,
        fields: &IndexMap<String, Template>,
        state: &State,
    ) -> Result<Option<Value>> {
        let mut signals = Vec::new();
        collect_signals(fields, &mut signals);
        let scopes = self.tree.deepest_scopes_for(state.scope, &signals);

        match state.want {
            Want::Single => {
                if scopes.len() > 1 || scopes.first().is_some_and(|&scope| scope != state.scope) {
                    let keys: Vec<&str> = signals.iter().map(Signal::key).collect();
                    return Err(ShapeError::incorrect_type(
                        &state.path,
                        format!(
                            "an object was requested but one of the signals {keys:?} holds a list here"
                        ),
                    ));
                }
                let row = self.resolve_row(fields, state.scope, &state.path)?;
                Ok(Some(Value::Object(row)))
            }
            Want::List => {
                let mut rows = Vec::with_capacity(scopes.len());
                for scope in scopes {
                    let row = self.resolve_row(fields, scope, &state.path)?;
                    if !row.is_empty() {
                        rows.push(Value::Object(row));
                    }
                }
                Ok((!rows.is_empty()).then_some(Value::Array(rows)))
            }
        }
    }

    /// Resolve every field of an object template against one scope, as single
    /// values. Nested objects share the scope.
    fn resolve_row(
        &self,
        fields: &IndexMap<String, Template>,
        scope: ScopeId,
        path: &str,
    ) -> Result<Map<String, Value>> {
        let mut row = Map::new();
        for (key, field) in fields {
            let field_path = next_path(path, key);
            let value = match format_view(field) {
                Template::Object(nested) => {
                    Some(Value::Object(self.resolve_row(nested, scope, &field_path)?))
                }
                other => {
                    let state = State::new(field_path, false, Want::Single, scope);
                    self.format_node(other, &state)?
                }
            };

            if let Some(value) = value {
                row.insert(key.clone(), value);
            }
        }
        Ok(row)
    }

    fn format_sequence(&self, items: &[Template], state: &State) -> Result<Value> {
        let mut accumulated = Vec::new();
        for (idx, item) in items.iter().enumerate() {
            let item_path = next_path(&state.path, &idx.to_string());
            for &child in self.tree.children(state.scope) {
                let child_state = State::new(item_path.clone(), true, Want::List, child);
                accumulate(&mut accumulated, self.format_node(item, &child_state)?);
            }
        }

        // Nothing below this scope: the sequence has nothing to transpose, so
        // its items are resolved here instead.
        if accumulated.is_empty() {
            walk_event!(
                self.config,
                path = state.path.as_str(),
                "no child scope contributed, formatting sequence in place"
            );
            for (idx, item) in items.iter().enumerate() {
                let item_state = State::new(
                    next_path(&state.path, &idx.to_string()),
                    true,
                    Want::List,
                    state.scope,
                );
                accumulate(&mut accumulated, self.format_node(item, &item_state)?);
            }
        }

        Ok(Value::Array(accumulated))
    }
}

/// The template a format pass actually resolves: match-only hooks are
/// transparent.
fn format_view(template: &Template) -> &Template {
    match template {
        Template::Match(hook) => hook.template(),
        Template::Combined(hook) if hook.format_side().is_none() => hook.template(),
        other => other,
    }
}

/// Signals named directly by an object template, through nested objects and
/// hook sub-templates but never into sequences.
fn collect_signals(fields: &IndexMap<String, Template>, signals: &mut Vec<Signal>) {
    for field in fields.values() {
        let field = match field {
            Template::Match(hook) => hook.template(),
            Template::Format(hook) => hook.template(),
            Template::Combined(hook) => hook.template(),
            other => other,
        };

        match field {
            Template::Signal(signal) => signals.push(signal.clone()),
            Template::Object(nested) => collect_signals(nested, signals),
            _ => {}
        }
    }
}

fn accumulate(accumulated: &mut Vec<Value>, value: Option<Value>) {
    match value {
        Some(Value::Array(items)) => accumulated.extend(items),
        Some(value) => accumulated.push(value),
        None => {}
    }
}

/// Drop `null` entries from objects and arrays, recursively. With `deep`,
/// objects and arrays left empty are dropped too.
fn clean(value: Value, deep: bool) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Array(items) => {
            let items: Vec<Value> = items
                .into_iter()
                .filter_map(|item| clean(item, deep))
                .collect();
            if deep && items.is_empty() {
                None
            } else {
                Some(Value::Array(items))
            }
        }
        Value::Object(fields) => {
            let fields: Map<String, Value> = fields
                .into_iter()
                .filter_map(|(key, field)| clean(field, deep).map(|field| (key, field)))
                .collect();
            if deep && fields.is_empty() {
                None
            } else {
                Some(Value::Object(fields))
            }
        }
        other => Some(other),
    }
}
