//! Transform hooks
//!
//! A hook wraps a sub-template and routes it through a user function: on the
//! match side the function turns raw data into signal values, on the format
//! side it turns the resolved sub-template into the output value.
//!
//! Hook functions may fail. A lenient hook (the default) logs the failure and
//! leaves its slot empty; a strict hook aborts the whole pass.

use std::{fmt, sync::Arc};

use anyhow::anyhow;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use crate::{Result, ShapeError, Signal, Template};

/// User transform function: `data -> data`, fallible
pub type HookFn = Arc<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>;

/// Wrap a closure as a [`HookFn`]
pub fn hook_fn<F>(func: F) -> HookFn
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    Arc::new(func)
}

/// What running a hook function produced
#[derive(Debug)]
pub enum HookOutcome<T> {
    /// The function ran and its result fits the hook
    Ok(T),
    /// The function failed on this data; lenient hooks skip the slot
    Skipped(anyhow::Error),
    /// The function broke its contract; never recoverable
    Fatal(ShapeError),
}

impl<T> HookOutcome<T> {
    /// Apply the failure policy: `Skipped` becomes an error under `strict`,
    /// and absence otherwise.
    pub fn settle(self, strict: bool, path: &str) -> Result<Option<T>> {
        match self {
            HookOutcome::Ok(value) => Ok(Some(value)),
            HookOutcome::Skipped(source) if strict => Err(ShapeError::Hook {
                path: path.to_string(),
                source,
            }),
            HookOutcome::Skipped(source) => {
                warn!(path, error = %source, "hook function failed, leaving slot empty");
                Ok(None)
            }
            HookOutcome::Fatal(err) => Err(err),
        }
    }
}

#[derive(Debug, Clone)]
enum MatchTarget {
    Signal(Signal),
    Fields(IndexMap<String, Signal>),
}

impl MatchTarget {
    fn from_template(template: &Template) -> Result<Self> {
        match template {
            Template::Signal(signal) => Ok(MatchTarget::Signal(signal.clone())),
            Template::Object(fields) => fields
                .iter()
                .map(|(key, field)| match field {
                    Template::Signal(signal) => Ok((key.clone(), signal.clone())),
                    other => Err(ShapeError::invalid_hook_template(format!(
                        "field '{key}' is a {} template, expected a signal",
                        other.kind()
                    ))),
                })
                .collect::<Result<IndexMap<_, _>>>()
                .map(MatchTarget::Fields),
            other => Err(ShapeError::invalid_hook_template(format!(
                "expected a signal or an object of signals, got a {} template",
                other.kind()
            ))),
        }
    }
}

/// Hook applied while matching
#[derive(Clone)]
pub struct MatchHook {
    template: Box<Template>,
    target: MatchTarget,
    func: HookFn,
    strict: bool,
}

impl MatchHook {
    /// Build a match hook. `template` must be a signal, which receives the
    /// function's result, or an object of signals, in which case the function
    /// returns an object whose keys pick the signals to write.
    pub fn new<F>(template: impl Into<Template>, func: F) -> Result<Self>
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::with_fn(template.into(), Arc::new(func))
    }

    fn with_fn(template: Template, func: HookFn) -> Result<Self> {
        let target = MatchTarget::from_template(&template)?;
        Ok(Self {
            template: Box::new(template),
            target,
            func,
            strict: false,
        })
    }

    /// Abort the pass when the function fails
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Run the function on `data` and work out which signals to write.
    pub fn run(&self, data: Value, path: &str) -> HookOutcome<Vec<(String, Value)>> {
        let result = match (self.func)(data) {
            Ok(result) => result,
            Err(err) => return HookOutcome::Skipped(err),
        };

        match &self.target {
            MatchTarget::Signal(signal) => {
                if result.is_null() {
                    HookOutcome::Ok(Vec::new())
                } else {
                    HookOutcome::Ok(vec![(signal.key().to_string(), result)])
                }
            }
            MatchTarget::Fields(fields) => {
                let returned = match result {
                    Value::Object(returned) => returned,
                    other => {
                        return HookOutcome::Skipped(anyhow!(
                            "expected an object from the hook function, got {other}"
                        ))
                    }
                };

                let mut writes = Vec::with_capacity(returned.len());
                for (key, value) in returned {
                    let Some(signal) = fields.get(&key) else {
                        return HookOutcome::Fatal(ShapeError::HookContract {
                            path: path.to_string(),
                            key,
                        });
                    };
                    if !value.is_null() {
                        writes.push((signal.key().to_string(), value));
                    }
                }
                HookOutcome::Ok(writes)
            }
        }
    }
}

impl fmt::Debug for MatchHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchHook")
            .field("template", &self.template)
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

/// Hook applied while formatting
#[derive(Clone)]
pub struct FormatHook {
    template: Box<Template>,
    func: HookFn,
    strict: bool,
}

impl FormatHook {
    /// Build a format hook. `template` is resolved first and its value is
    /// handed to `func`.
    pub fn new<F>(template: impl Into<Template>, func: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::with_fn(template.into(), Arc::new(func))
    }

    fn with_fn(template: Template, func: HookFn) -> Self {
        Self {
            template: Box::new(template),
            func,
            strict: false,
        }
    }

    /// Abort the pass when the function fails
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Run the function on the resolved sub-template
    pub fn run(&self, partial: Value) -> HookOutcome<Value> {
        match (self.func)(partial) {
            Ok(result) => HookOutcome::Ok(result),
            Err(err) => HookOutcome::Skipped(err),
        }
    }
}

impl fmt::Debug for FormatHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatHook")
            .field("template", &self.template)
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

/// A hook with an optional function for each side sharing one sub-template.
/// A side without a function treats the sub-template as a plain template.
#[derive(Debug, Clone)]
pub struct CombinedHook {
    template: Box<Template>,
    format: Option<FormatHook>,
    matching: Option<MatchHook>,
}

impl CombinedHook {
    pub fn new(
        template: impl Into<Template>,
        format: Option<HookFn>,
        matching: Option<HookFn>,
    ) -> Result<Self> {
        if format.is_none() && matching.is_none() {
            return Err(ShapeError::MissingHookFunction);
        }

        let template = template.into();
        let matching = matching
            .map(|func| MatchHook::with_fn(template.clone(), func))
            .transpose()?;
        let format = format.map(|func| FormatHook::with_fn(template.clone(), func));

        Ok(Self {
            template: Box::new(template),
            format,
            matching,
        })
    }

    /// Hook with only a format function
    pub fn format_only<F>(template: impl Into<Template>, func: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let template = template.into();
        Self {
            format: Some(FormatHook::with_fn(template.clone(), Arc::new(func))),
            template: Box::new(template),
            matching: None,
        }
    }

    /// Abort the pass when either function fails
    pub fn strict(mut self) -> Self {
        self.format = self.format.map(FormatHook::strict);
        self.matching = self.matching.map(MatchHook::strict);
        self
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn format_side(&self) -> Option<&FormatHook> {
        self.format.as_ref()
    }

    pub fn match_side(&self) -> Option<&MatchHook> {
        self.matching.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::S;

    #[test]
    fn test_match_hook_rejects_sequence_template() {
        let template = Template::sequence([Template::object([("first_name", S("first_name"))])]);
        let err = MatchHook::new(template, Ok).unwrap_err();
        assert!(matches!(err, ShapeError::InvalidHookTemplate { .. }));

        let template = Template::object([("name", Template::literal("x"))]);
        assert!(MatchHook::new(template, Ok).is_err());
    }

    #[test]
    fn test_match_hook_signal_target() {
        let hook = MatchHook::new(S("name"), |v| {
            Ok(json!(format!("Name is {}", v.as_str().unwrap_or_default())))
        })
        .unwrap();
        match hook.run(json!("Marc"), "root") {
            HookOutcome::Ok(writes) => {
                assert_eq!(writes, vec![("name".to_string(), json!("Name is Marc"))])
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_match_hook_unknown_key_is_fatal() {
        let hook = MatchHook::new(
            Template::object([("first", S("first_name"))]),
            |_| Ok(json!({"first": "Marc", "last": "Simon"})),
        )
        .unwrap();

        let err = hook
            .run(json!("Marc Simon"), "root.name")
            .settle(false, "root.name")
            .unwrap_err();
        match err {
            ShapeError::HookContract { key, path } => {
                assert_eq!(key, "last");
                assert_eq!(path, "root.name");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_settle_policy() {
        let lenient: HookOutcome<Value> = HookOutcome::Skipped(anyhow!("boom"));
        assert!(lenient.settle(false, "root").unwrap().is_none());

        let strict: HookOutcome<Value> = HookOutcome::Skipped(anyhow!("boom"));
        assert!(matches!(strict.settle(true, "root"), Err(ShapeError::Hook { .. })));
    }

    #[test]
    fn test_combined_hook_needs_a_function() {
        assert!(matches!(
            CombinedHook::new(S("state"), None, None),
            Err(ShapeError::MissingHookFunction)
        ));

        let hook = CombinedHook::new(S("state"), Some(hook_fn(Ok)), None).unwrap();
        assert!(hook.format_side().is_some());
        assert!(hook.match_side().is_none());
    }

    #[test]
    fn test_combined_hook_validates_match_side() {
        let template = Template::sequence([S("state")]);
        assert!(CombinedHook::new(template.clone(), None, Some(hook_fn(Ok))).is_err());
        // format side accepts any template
        assert!(CombinedHook::new(template, Some(hook_fn(Ok)), None).is_ok());
    }
}
