//! JSON notation for hook-free templates
//!
//! - `"$name"` is the signal `name`
//! - `"$$text"` is the literal string `"$text"`
//! - objects and arrays become object and sequence templates
//! - every other value is a literal
//!
//! Hooks carry functions and have no JSON form; attach them afterwards with
//! [`Template::with_field`].

use serde_json::Value;

use super::Template;
use crate::{next_path, Result, ShapeError, Signal};

const SIGNAL_PREFIX: char = '$';

impl Template {
    /// Read a template written in JSON notation
    pub fn from_json(value: &Value) -> Result<Self> {
        parse(value, "root")
    }

    /// Parse JSON text written in template notation
    pub fn from_json_str(source: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(source)
            .map_err(|err| ShapeError::notation("root", err.to_string()))?;
        Self::from_json(&value)
    }
}

fn parse(value: &Value, path: &str) -> Result<Template> {
    match value {
        Value::String(text) => parse_string(text, path),
        Value::Object(fields) => fields
            .iter()
            .map(|(key, field)| Ok((key.clone(), parse(field, &next_path(path, key))?)))
            .collect::<Result<_>>()
            .map(Template::Object),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| parse(item, &next_path(path, &idx.to_string())))
            .collect::<Result<_>>()
            .map(Template::Sequence),
        other => Ok(Template::Literal(other.clone())),
    }
}

fn parse_string(text: &str, path: &str) -> Result<Template> {
    let Some(rest) = text.strip_prefix(SIGNAL_PREFIX) else {
        return Ok(Template::Literal(Value::String(text.to_string())));
    };

    if rest.starts_with(SIGNAL_PREFIX) {
        return Ok(Template::Literal(Value::String(rest.to_string())));
    }
    if rest.is_empty() {
        return Err(ShapeError::notation(path, "signal name is empty"));
    }
    Ok(Template::Signal(Signal::new(rest)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_signals_and_literals() {
        let template = Template::from_json(&json!({
            "users": [{"name": "$name", "role": "admin", "price": "$$5", "age": 3}]
        }))
        .unwrap();

        let Template::Object(fields) = template else {
            panic!("expected object template");
        };
        let Template::Sequence(items) = &fields["users"] else {
            panic!("expected sequence template");
        };
        let Template::Object(user) = &items[0] else {
            panic!("expected object template");
        };

        assert!(matches!(&user["name"], Template::Signal(s) if s.key() == "name"));
        assert!(matches!(&user["role"], Template::Literal(v) if v == &json!("admin")));
        assert!(matches!(&user["price"], Template::Literal(v) if v == &json!("$5")));
        assert!(matches!(&user["age"], Template::Literal(v) if v == &json!(3)));
    }

    #[test]
    fn test_empty_signal_name_is_rejected() {
        let err = Template::from_json(&json!({"a": ["$"]})).unwrap_err();
        match err {
            ShapeError::Notation { path, .. } => assert_eq!(path, "root.a.0"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_invalid_json_text() {
        assert!(Template::from_json_str("{not json").is_err());
        assert!(Template::from_json_str(r#"["$id"]"#).is_ok());
    }
}
