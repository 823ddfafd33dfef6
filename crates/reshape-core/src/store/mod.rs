//! Scope tree storage for matched values
//!
//! A scope is created once at the root and once per element every time a
//! match template asks for a sequence. Values matched at one level of list
//! nesting land in the same scope, so the tree mirrors the list structure of
//! the data rather than its object structure.
//!
//! Scopes live in an arena owned by [`ScopeTree`] and refer to each other by
//! [`ScopeId`]; the parent link is a plain index used for upward lookups.

use indexmap::IndexMap;
use serde_json::{json, Value};


/// Index of a scope inside its [`ScopeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

#[derive(Debug, Clone)]
struct ScopeNode {
    values: IndexMap<String, Value>,
    children: Vec<ScopeId>,
    parent: Option<ScopeId>,
    depth: usize,
}

impl ScopeNode {
    fn new(parent: Option<ScopeId>, depth: usize) -> Self {
        Self {
            values: IndexMap::new(),
            children: Vec::new(),
            parent,
            depth,
        }
    }
}

/// Result of looking a signal up in the tree
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'t> {
    /// No scope on the searched path holds the signal
    Missing,
    /// A single scope holds the signal
    Found(&'t Value),
    /// Values gathered from several descendant scopes, in tree order.
    /// Always list-shaped, even when only one descendant matched.
    Aggregated(Vec<Value>),
}

impl Lookup<'_> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Lookup::Missing)
    }
}

/// Arena of scopes produced by one match pass
#[derive(Debug, Clone)]
pub struct ScopeTree {
    nodes: Vec<ScopeNode>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// Create a tree holding only an empty root scope
    pub fn new() -> Self {
        Self {
            nodes: vec![ScopeNode::new(None, 0)],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    fn node(&self, id: ScopeId) -> &ScopeNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: ScopeId) -> &mut ScopeNode {
        &mut self.nodes[id.0]
    }

    /// Append a new child scope under `parent`
    pub fn new_child(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.nodes.len());
        let depth = self.node(parent).depth + 1;
        self.nodes.push(ScopeNode::new(Some(parent), depth));
        self.node_mut(parent).children.push(id);
        id
    }

    /// Store `value` under `key` in scope `id`. A second write for the same
    /// key overwrites the first.
    pub fn add(&mut self, id: ScopeId, key: impl Into<String>, value: Value) {
        self.node_mut(id).values.insert(key.into(), value);
    }

    pub fn values(&self, id: ScopeId) -> &IndexMap<String, Value> {
        &self.node(id).values
    }

    pub fn children(&self, id: ScopeId) -> &[ScopeId] {
        &self.node(id).children
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.node(id).parent
    }

    pub fn depth(&self, id: ScopeId) -> usize {
        self.node(id).depth
    }

    /// Whether `id` or any scope below it holds a value
    pub fn subtree_has_values(&self, id: ScopeId) -> bool {
        let node = self.node(id);
        !node.values.is_empty()
            || node
                .children
                .iter()
                .any(|&child| self.subtree_has_values(child))
    }

    /// Detach the children of `id` whose subtree ended up holding nothing.
    /// Detached scopes stay in the arena but are no longer reachable.
    pub fn prune_empty_children(&mut self, id: ScopeId) {
        let keep: Vec<ScopeId> = self
            .node(id)
            .children
            .iter()
            .copied()
            .filter(|&child| self.subtree_has_values(child))
            .collect();
        self.node_mut(id).children = keep;
    }

    fn search_current(&self, id: ScopeId, key: &str) -> Option<&Value> {
        self.node(id).values.get(key).filter(|value| !value.is_null())
    }

    fn search_deep(&self, id: ScopeId, key: &str) -> Option<Lookup<'_>> {
        if let Some(value) = self.search_current(id, key) {
            return Some(Lookup::Found(value));
        }

        let mut gathered = Vec::new();
        for &child in &self.node(id).children {
            match self.search_deep(child, key) {
                Some(Lookup::Found(Value::Array(items))) => gathered.extend(items.iter().cloned()),
                Some(Lookup::Found(value)) => gathered.push(value.clone()),
                Some(Lookup::Aggregated(values)) => gathered.extend(values),
                _ => {}
            }
        }

        if gathered.is_empty() {
            None
        } else {
            Some(Lookup::Aggregated(gathered))
        }
    }

    fn search_ancestors(&self, mut id: ScopeId, key: &str) -> Option<&Value> {
        loop {
            if let Some(value) = self.search_current(id, key) {
                return Some(value);
            }
            id = self.node(id).parent?;
        }
    }

    /// Look `signal` up starting at scope `id`.
    ///
    /// Without `search_deep` only `id` and then its ancestors are consulted.
    /// With `search_deep` the subtree below `id` is searched first, and every
    /// value found there is gathered into [`Lookup::Aggregated`]; the
    /// ancestor chain is the fallback when the subtree holds nothing.
    /// Arrays held by descendant scopes are flattened into the gathered list,
    /// whatever their depth.
    pub fn lookup(&self, id: ScopeId, signal: &crate::Signal, search_deep: bool) -> Lookup<'_> {
        let key = signal.key();
        if search_deep {
            if let Some(found) = self.search_deep(id, key) {
                return found;
            }
        } else if let Some(value) = self.search_current(id, key) {
            return Lookup::Found(value);
        }

        self.node(id)
            .parent
            .and_then(|parent| self.search_ancestors(parent, key))
            .map_or(Lookup::Missing, Lookup::Found)
    }

    /// Find, along every branch below `id`, the deepest scope that still holds
    /// one of `signals` directly.
    ///
    /// Descent stops at a scope once every signal requested of it is found
    /// there. A scope is returned as a fallback when nothing below it helps
    /// but it satisfied at least one of the signals it was asked for.
    pub fn deepest_scopes_for(&self, id: ScopeId, signals: &[crate::Signal]) -> Vec<ScopeId> {
        let keys: Vec<&str> = signals.iter().map(|signal| signal.key()).collect();
        self.deepest_for_keys(id, &keys)
    }

    fn deepest_for_keys(&self, id: ScopeId, keys: &[&str]) -> Vec<ScopeId> {
        let missing: Vec<&str> = keys
            .iter()
            .copied()
            .filter(|key| self.search_current(id, key).is_none())
            .collect();

        if missing.is_empty() {
            return vec![id];
        }

        let found: Vec<ScopeId> = self
            .node(id)
            .children
            .iter()
            .flat_map(|&child| self.deepest_for_keys(child, &missing))
            .collect();

        if found.is_empty() && missing.len() < keys.len() {
            vec![id]
        } else {
            found
        }
    }

    /// Snapshot of the reachable tree as `{values, depth, children}` objects
    pub fn to_json(&self) -> Value {
        self.scope_to_json(self.root())
    }

    fn scope_to_json(&self, id: ScopeId) -> Value {
        let node = self.node(id);
        let values: serde_json::Map<String, Value> = node
            .values
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let children: Vec<Value> = node
            .children
            .iter()
            .map(|&child| self.scope_to_json(child))
            .collect();

        json!({
            "values": values,
            "depth": node.depth,
            "children": children,
        })
    }
}
