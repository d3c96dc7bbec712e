//! Input values and the loose comparison rules shared by predicates.

use regex::Regex;
use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;

pub(crate) static NULL: Value = Value::Null;

static NUMERIC_REGEX: OnceLock<Regex> = OnceLock::new();

fn numeric_regex() -> &'static Regex {
    NUMERIC_REGEX.get_or_init(|| {
        Regex::new(r"^\s*[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?\s*$")
            .expect("numeric pattern is valid")
    })
}

/// Named input values for one validation run.
///
/// A missing key reads as `null`; it is never an error at this layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs {
    values: HashMap<String, Value>,
}

impl Inputs {
    /// Create an empty input set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// The raw entry for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The value for `name`, or `null` when absent.
    pub fn value(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&NULL)
    }

    /// True when `name` is present with a non-null value.
    pub fn is_set(&self, name: &str) -> bool {
        !self.value(name).is_null()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Map<String, Value>> for Inputs {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            values: map.into_iter().collect(),
        }
    }
}

/// Anything but a JSON object yields an empty input set.
impl From<Value> for Inputs {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => map.into(),
            _ => Self::default(),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Inputs
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Text form of a scalar value, as used by the textual predicates.
///
/// `null` and `false` read as `""`, `true` as `"1"`. Arrays and objects have
/// no text form.
pub fn text_form(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null | Value::Bool(false) => Some(Cow::Borrowed("")),
        Value::Bool(true) => Some(Cow::Borrowed("1")),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parse a numeric string (decimal or scientific notation, optional sign,
/// surrounding whitespace allowed).
pub fn parse_numeric(text: &str) -> Option<f64> {
    if numeric_regex().is_match(text) {
        text.trim().parse::<f64>().ok()
    } else {
        None
    }
}

/// Truthiness used when a boolean or `null` is compared loosely.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn numbers_eq(a: &Number, b: &Number) -> bool {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x == y,
        _ => match (a.as_u64(), b.as_u64()) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_f64() == b.as_f64(),
        },
    }
}

/// Loose equality across value types.
///
/// Numeric strings compare numerically with numbers and with each other,
/// `null` only equals `null`, `""` and falsy values, and booleans compare by
/// truthiness. Arrays and objects compare element-wise.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, Value::String(s)) | (Value::String(s), Value::Null) => s.is_empty(),
        (Value::Null, other) | (other, Value::Null) => !truthy(other),
        (Value::Bool(x), other) | (other, Value::Bool(x)) => *x == truthy(other),
        (Value::Number(x), Value::Number(y)) => numbers_eq(x, y),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match parse_numeric(s) {
                Some(parsed) => n.as_f64() == Some(parsed),
                None => n.to_string() == *s,
            }
        }
        (Value::String(x), Value::String(y)) => match (parse_numeric(x), parse_numeric(y)) {
            (Some(l), Some(r)) => l == r,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| loose_eq(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, l)| y.get(k).map_or(false, |r| loose_eq(l, r)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_input_reads_as_null() {
        let inputs = Inputs::new().with("name", "Ada");
        assert_eq!(inputs.value("name"), &json!("Ada"));
        assert!(inputs.value("age").is_null());
        assert!(inputs.get("age").is_none());
    }

    #[test]
    fn null_input_is_not_set() {
        let inputs = Inputs::from(json!({"a": null, "b": ""}));
        assert!(!inputs.is_set("a"));
        assert!(inputs.is_set("b"));
        assert!(!inputs.is_set("c"));
    }

    #[test]
    fn non_object_json_gives_empty_inputs() {
        assert!(Inputs::from(Value::Null).is_empty());
        assert!(Inputs::from(json!([1, 2])).is_empty());
    }

    #[test]
    fn text_form_of_scalars() {
        assert_eq!(text_form(&json!(null)).as_deref(), Some(""));
        assert_eq!(text_form(&json!(true)).as_deref(), Some("1"));
        assert_eq!(text_form(&json!(42)).as_deref(), Some("42"));
        assert_eq!(text_form(&json!("x")).as_deref(), Some("x"));
        assert!(text_form(&json!([1])).is_none());
    }

    #[test]
    fn numeric_strings() {
        assert_eq!(parse_numeric("15"), Some(15.0));
        assert_eq!(parse_numeric(" -1.5e3 "), Some(-1500.0));
        assert_eq!(parse_numeric(".5"), Some(0.5));
        assert_eq!(parse_numeric("0x1A"), None);
        assert_eq!(parse_numeric("inf"), None);
        assert_eq!(parse_numeric(""), None);
    }

    #[test]
    fn loose_equality() {
        assert!(loose_eq(&json!("foo"), &json!("foo")));
        assert!(!loose_eq(&json!("foo"), &json!("")));
        assert!(!loose_eq(&json!("foo"), &json!(null)));
        assert!(loose_eq(&json!(""), &json!(null)));
        assert!(loose_eq(&json!("3"), &json!(3)));
        assert!(loose_eq(&json!("1.0"), &json!("1")));
        assert!(loose_eq(&json!(15.0), &json!(15)));
        assert!(loose_eq(&json!(true), &json!("yes")));
        assert!(!loose_eq(&json!(false), &json!("yes")));
        assert!(loose_eq(&json!([1, "2"]), &json!(["1", 2])));
        assert!(!loose_eq(&json!({"a": 1}), &json!({"b": 1})));
    }
}
