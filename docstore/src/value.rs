//! Typed document values.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Field name → value map making up a document body (or a nested map value).
pub type Document = BTreeMap<String, Value>;

/// A single field value as the store models it.
///
/// `Null` is the explicit absent-value marker; it is distinct from zero, an
/// empty string or an empty array.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(DateTime<Utc>),
    String(String),
    Array(Vec<Value>),
    Map(Document),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                // u64 above i64::MAX and fractional numbers
                None => n.as_f64().map(Value::Double).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        Value::from(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(Value::from(json!(null)), Value::Null);
        assert_eq!(Value::from(json!(true)), Value::Boolean(true));
        assert_eq!(Value::from(json!(20)), Value::Integer(20));
        assert_eq!(Value::from(json!(19.5)), Value::Double(19.5));
        assert_eq!(Value::from(json!("pending")), Value::from("pending"));
    }

    #[test]
    fn test_from_json_keeps_nested_values() {
        let value = Value::from(json!({
            "links": ["a.pdf", "b.pdf"],
            "zoom": { "id": 7, "host": null }
        }));

        let Value::Map(fields) = value else {
            panic!("Expected map value");
        };
        assert_eq!(
            fields["links"],
            Value::Array(vec![Value::from("a.pdf"), Value::from("b.pdf")])
        );
        let Value::Map(zoom) = &fields["zoom"] else {
            panic!("Expected nested map");
        };
        assert_eq!(zoom["id"], Value::Integer(7));
        assert!(zoom["host"].is_null());
    }

    #[test]
    fn test_from_option() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(Value::from(Some(ts)), Value::Timestamp(ts));
        assert_eq!(Value::from(None::<DateTime<Utc>>), Value::Null);
        assert_eq!(Value::from(None::<String>), Value::Null);
    }

    #[test]
    fn test_large_unsigned_becomes_double() {
        let value = Value::from(json!(u64::MAX));
        assert!(matches!(value, Value::Double(_)));
    }
}
