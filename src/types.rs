use serde::Serialize;
use std::collections::HashMap;

/// An attribute value attached to a [`Span`].
///
/// [`Span`]: crate::Span
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// Signed integer value
    I64(i64),
    /// Unsigned integer value
    U64(u64),
    /// Boolean value
    Bool(bool),
    /// String value
    String(String),
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::I64(i)
    }
}

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        Value::U64(i)
    }
}

impl From<bool> for Value {
    fn from(i: bool) -> Self {
        Value::Bool(i)
    }
}

impl From<String> for Value {
    fn from(i: String) -> Self {
        Value::String(i)
    }
}

impl From<&str> for Value {
    fn from(i: &str) -> Self {
        Value::String(i.to_string())
    }
}

/// Key/value pairs attached to a span.
#[derive(Serialize, Default, Clone, Debug, PartialEq)]
pub struct Attributes(pub HashMap<String, Value>);

impl Attributes {
    /// Insert an attribute, replacing any previous value for the key.
    pub fn insert<V: Into<Value>>(&mut self, key: &str, val: V) {
        self.0.insert(key.into(), val.into());
    }

    /// Copy attributes from `other` without overwriting existing keys.
    pub fn append(&mut self, other: &Self) {
        for (key, val) in &other.0 {
            self.0.entry(key.into()).or_insert_with(|| val.clone());
        }
    }

    /// Look up an attribute by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Completion status of a span.
///
/// A span stays [`Unset`] unless the operation it brackets failed, in which
/// case it carries the error message as its description.
///
/// [`Unset`]: SpanStatus::Unset
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "code", content = "description")]
pub enum SpanStatus {
    /// The operation completed without error.
    Unset,
    /// The operation failed; the payload is the error message.
    Error(String),
}

impl Default for SpanStatus {
    fn default() -> Self {
        SpanStatus::Unset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_existing_keys() {
        let mut a = Attributes::default();
        a.insert("transport", "grpc");

        let mut b = Attributes::default();
        b.insert("transport", "http");
        b.insert("format", "otlp");

        a.append(&b);

        assert_eq!(a.get("transport"), Some(&Value::String("grpc".into())));
        assert_eq!(a.get("format"), Some(&Value::String("otlp".into())));
    }

    #[test]
    fn value_serializes_untagged() {
        let mut attrs = Attributes::default();
        attrs.insert("accepted_spans", 42i64);
        attrs.insert("ok", true);

        let json = serde_json::to_value(&attrs).unwrap();
        assert_eq!(json["accepted_spans"], 42);
        assert_eq!(json["ok"], true);
    }
}
