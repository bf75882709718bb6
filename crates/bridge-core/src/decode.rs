//! Strict decoding of untyped JSON documents.
//!
//! Every accessor either returns the field with the requested shape or a
//! [`DecodeError`] naming the field path. Nothing is defaulted: a missing
//! required field is an error, and optional accessors only accept an absent
//! key or an explicit `null`.

use crate::DecodeError;
use serde_json::{Map, Value};

/// Types that can be decoded from an untyped document.
pub trait Decode: Sized {
    fn decode(value: &Value) -> Result<Self, DecodeError>;
}

/// Short name of a JSON value's kind, used in error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

const MISSING: &str = "nothing";

/// Borrowed view over a JSON object with a path used for error reporting.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    fields: &'a Map<String, Value>,
    path: String,
}

impl<'a> Document<'a> {
    pub fn new(value: &'a Value) -> Result<Self, DecodeError> {
        Self::at(value, "$")
    }

    pub fn at(value: &'a Value, path: impl Into<String>) -> Result<Self, DecodeError> {
        let path = path.into();
        match value {
            Value::Object(fields) => Ok(Self { fields, path }),
            other => Err(DecodeError::new(path, "object", value_kind(other))),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn child_path(&self, key: &str) -> String {
        format!("{}.{key}", self.path)
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn require(&self, key: &str, expected: &str) -> Result<&'a Value, DecodeError> {
        self.fields
            .get(key)
            .ok_or_else(|| DecodeError::new(self.child_path(key), expected, MISSING))
    }

    fn mismatch(&self, key: &str, expected: &str, found: &Value) -> DecodeError {
        DecodeError::new(self.child_path(key), expected, value_kind(found))
    }

    pub fn require_str(&self, key: &str) -> Result<&'a str, DecodeError> {
        match self.require(key, "string")? {
            Value::String(value) => Ok(value),
            other => Err(self.mismatch(key, "string", other)),
        }
    }

    pub fn optional_str(&self, key: &str) -> Result<Option<&'a str>, DecodeError> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value)),
            Some(other) => Err(self.mismatch(key, "string or null", other)),
        }
    }

    pub fn require_bool(&self, key: &str) -> Result<bool, DecodeError> {
        match self.require(key, "boolean")? {
            Value::Bool(value) => Ok(*value),
            other => Err(self.mismatch(key, "boolean", other)),
        }
    }

    pub fn require_i64(&self, key: &str) -> Result<i64, DecodeError> {
        let value = self.require(key, "integer")?;
        value
            .as_i64()
            .ok_or_else(|| self.mismatch(key, "integer", value))
    }

    pub fn require_array(&self, key: &str) -> Result<&'a [Value], DecodeError> {
        match self.require(key, "array")? {
            Value::Array(items) => Ok(items),
            other => Err(self.mismatch(key, "array", other)),
        }
    }

    pub fn require_object(&self, key: &str) -> Result<Document<'a>, DecodeError> {
        let value = self.require(key, "object")?;
        Document::at(value, self.child_path(key))
    }

    pub fn optional_object(&self, key: &str) -> Result<Option<Document<'a>>, DecodeError> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Document::at(value, self.child_path(key)).map(Some),
        }
    }

    /// Array of strings, e.g. a role list.
    pub fn require_str_list(&self, key: &str) -> Result<Vec<&'a str>, DecodeError> {
        let items = self.require_array(key)?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(value) => Ok(value.as_str()),
                other => Err(DecodeError::new(
                    format!("{}[{index}]", self.child_path(key)),
                    "string",
                    value_kind(other),
                )),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Document;
    use serde_json::json;

    #[test]
    fn reports_path_of_missing_field() {
        let value = json!({ "outer": { "inner": 1 } });
        let doc = Document::new(&value).expect("object");
        let outer = doc.require_object("outer").expect("outer");
        let err = outer.require_str("name").expect_err("missing");
        assert_eq!(err.path, "$.outer.name");
        assert_eq!(err.found, "nothing");
    }

    #[test]
    fn rejects_mistyped_fields() {
        let value = json!({ "title": 7, "flag": "yes", "items": ["a", 2] });
        let doc = Document::new(&value).expect("object");
        assert_eq!(doc.require_str("title").expect_err("number").found, "number");
        assert_eq!(doc.require_bool("flag").expect_err("string").expected, "boolean");
        assert_eq!(doc.require_str_list("items").expect_err("mixed").path, "$.items[1]");
    }

    #[test]
    fn optional_accepts_absent_and_null_only() {
        let value = json!({ "doc": null, "bad": 3 });
        let doc = Document::new(&value).expect("object");
        assert_eq!(doc.optional_str("doc").expect("null"), None);
        assert_eq!(doc.optional_str("absent").expect("absent"), None);
        assert!(doc.optional_str("bad").is_err());
    }

    #[test]
    fn root_must_be_object() {
        let err = Document::new(&json!([1, 2])).expect_err("array root");
        assert_eq!(err.path, "$");
        assert_eq!(err.found, "array");
    }
}
