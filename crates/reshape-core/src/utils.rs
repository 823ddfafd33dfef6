//! Helpers for format hooks

use serde_json::Value;

/// Merge objects that share the same value for `on`.
///
/// Rows are visited in order; the first row with a given `on` value is kept
/// and every later row with the same value overwrites its fields, except for
/// `null` ones. Rows that are not objects are kept as they are.
pub fn dict_join(rows: Vec<Value>, on: &str) -> Vec<Value> {
    let mut joined: Vec<Value> = Vec::with_capacity(rows.len());

    for row in rows {
        let fields = match row {
            Value::Object(fields) => fields,
            other => {
                joined.push(other);
                continue;
            }
        };

        let key = fields.get(on).cloned().unwrap_or(Value::Null);
        let existing = joined.iter_mut().find_map(|candidate| match candidate {
            Value::Object(candidate) if candidate.get(on).unwrap_or(&Value::Null) == &key => {
                Some(candidate)
            }
            _ => None,
        });

        match existing {
            Some(existing) => {
                for (field, value) in fields {
                    if !value.is_null() {
                        existing.insert(field, value);
                    }
                }
            }
            None => joined.push(Value::Object(fields)),
        }
    }

    joined
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_dict_join_merges_on_key() {
        let rows = vec![
            json!({"ssn": 1, "name": "mario"}),
            json!({"ssn": 2, "name": "luigi"}),
            json!({"ssn": 1, "color": "red", "name": null}),
            json!({"ssn": 2, "color": "green"}),
        ];

        assert_eq!(
            dict_join(rows, "ssn"),
            vec![
                json!({"ssn": 1, "name": "mario", "color": "red"}),
                json!({"ssn": 2, "name": "luigi", "color": "green"}),
            ]
        );
    }

    #[test]
    fn test_dict_join_keeps_non_objects() {
        assert_eq!(dict_join(vec![json!(1), json!(1)], "id"), vec![json!(1), json!(1)]);
    }
}
