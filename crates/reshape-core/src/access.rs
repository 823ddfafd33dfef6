//! Host data access
//!
//! The matcher never assumes a concrete object model. It reads data through
//! [`FieldAccessor`], which is implemented for plain JSON values and for
//! [`HostValue`], a small model of opaque host objects whose attributes may be
//! computed on access or may expand to lazily loaded collections.

use std::{borrow::Cow, fmt, rc::Rc};

use serde_json::Value;

/// Read access to data being matched
pub trait FieldAccessor: Clone {
    /// Whether this is a missing value; matching stops on absent data
    fn is_absent(&self) -> bool;

    /// Whether this behaves like a list of items
    fn is_sequence(&self) -> bool;

    /// The items of a sequence-like value, in order. Empty for anything else.
    fn elements(&self) -> Vec<Cow<'_, Self>>;

    /// Field `key` of an object-like value
    fn field(&self, key: &str) -> Option<Cow<'_, Self>>;

    /// Materialize this value so it can be stored under a signal
    fn to_value(&self) -> Value;
}

impl FieldAccessor for Value {
    fn is_absent(&self) -> bool {
        self.is_null()
    }

    fn is_sequence(&self) -> bool {
        self.is_array()
    }

    fn elements(&self) -> Vec<Cow<'_, Self>> {
        match self {
            Value::Array(items) => items.iter().map(Cow::Borrowed).collect(),
            _ => Vec::new(),
        }
    }

    fn field(&self, key: &str) -> Option<Cow<'_, Self>> {
        match self {
            Value::Object(map) => map.get(key).map(Cow::Borrowed),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        self.clone()
    }
}

/// An object from the host application, read attribute by attribute
pub trait Record {
    /// Look up an attribute; `None` when the record has no such attribute
    fn attribute(&self, name: &str) -> Option<Attribute>;

    /// Value stored when a signal captures the whole record
    fn snapshot(&self) -> Value;
}

/// Result of reading an attribute from a [`Record`]
#[derive(Clone)]
pub enum Attribute {
    /// A stored attribute
    Value(HostValue),
    /// A zero-argument method, invoked when the attribute is read
    Method(Rc<dyn Fn() -> HostValue>),
    /// A lazy relation, expanded to its full collection when read
    Relation(Rc<dyn Fn() -> Vec<HostValue>>),
}

impl Attribute {
    fn resolve(self) -> HostValue {
        match self {
            Attribute::Value(value) => value,
            Attribute::Method(method) => method(),
            Attribute::Relation(relation) => HostValue::List(relation()),
        }
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Attribute::Method(_) => f.write_str("Method(..)"),
            Attribute::Relation(_) => f.write_str("Relation(..)"),
        }
    }
}

/// Data made of JSON values, host records, and lists of either
#[derive(Clone)]
pub enum HostValue {
    Json(Value),
    List(Vec<HostValue>),
    Record(Rc<dyn Record>),
}

impl HostValue {
    pub fn record(record: impl Record + 'static) -> Self {
        HostValue::Record(Rc::new(record))
    }
}

impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        HostValue::Json(value)
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Json(value) => f.debug_tuple("Json").field(value).finish(),
            HostValue::List(items) => f.debug_tuple("List").field(items).finish(),
            HostValue::Record(record) => f.debug_tuple("Record").field(&record.snapshot()).finish(),
        }
    }
}

impl FieldAccessor for HostValue {
    fn is_absent(&self) -> bool {
        matches!(self, HostValue::Json(Value::Null))
    }

    fn is_sequence(&self) -> bool {
        match self {
            HostValue::List(_) => true,
            HostValue::Json(value) => value.is_array(),
            HostValue::Record(_) => false,
        }
    }

    fn elements(&self) -> Vec<Cow<'_, Self>> {
        match self {
            HostValue::List(items) => items.iter().map(Cow::Borrowed).collect(),
            HostValue::Json(Value::Array(items)) => items
                .iter()
                .map(|item| Cow::Owned(HostValue::Json(item.clone())))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn field(&self, key: &str) -> Option<Cow<'_, Self>> {
        match self {
            HostValue::Json(value) => value
                .field(key)
                .map(|field| Cow::Owned(HostValue::Json(field.into_owned()))),
            HostValue::Record(record) => record
                .attribute(key)
                .map(|attribute| Cow::Owned(attribute.resolve())),
            HostValue::List(_) => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            HostValue::Json(value) => value.clone(),
            HostValue::List(items) => Value::Array(items.iter().map(|item| item.to_value()).collect()),
            HostValue::Record(record) => record.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;

    struct Profile {
        fico_calls: Rc<Cell<usize>>,
    }

    impl Record for Profile {
        fn attribute(&self, name: &str) -> Option<Attribute> {
            match name {
                "name" => Some(Attribute::Value(json!("marc").into())),
                "get_fico" => {
                    let calls = self.fico_calls.clone();
                    Some(Attribute::Method(Rc::new(move || {
                        calls.set(calls.get() + 1);
                        HostValue::from(json!(750))
                    })))
                }
                "applications" => Some(Attribute::Relation(Rc::new(|| {
                    vec![HostValue::from(json!({"id": 1})), json!({"id": 2}).into()]
                }))),
                _ => None,
            }
        }

        fn snapshot(&self) -> Value {
            json!({"name": "marc"})
        }
    }

    #[test]
    fn test_json_field_access() {
        let data = json!({"a": {"b": 1}, "list": [1, 2]});
        assert_eq!(data.field("a").map(|v| v.into_owned()), Some(json!({"b": 1})));
        assert!(data.field("missing").is_none());
        assert!(json!("scalar").field("a").is_none());
        assert_eq!(data["list"].elements().len(), 2);
        assert!(data["list"].is_sequence());
    }

    #[test]
    fn test_record_method_invoked_on_access() {
        let calls = Rc::new(Cell::new(0));
        let profile = HostValue::record(Profile {
            fico_calls: calls.clone(),
        });

        let fico = profile.field("get_fico").map(|v| v.to_value());
        assert_eq!(fico, Some(json!(750)));
        assert_eq!(calls.get(), 1);
        assert!(profile.field("unknown").is_none());
        assert_eq!(profile.to_value(), json!({"name": "marc"}));
    }

    #[test]
    fn test_record_relation_expands_to_collection() {
        let profile = HostValue::record(Profile {
            fico_calls: Rc::new(Cell::new(0)),
        });

        let applications = profile.field("applications").map(|v| v.into_owned());
        let applications = applications.expect("relation should resolve");
        assert!(applications.is_sequence());
        assert_eq!(applications.to_value(), json!([{"id": 1}, {"id": 2}]));
    }
}
