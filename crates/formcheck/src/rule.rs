//! Rule-spec parsing, parameter resolution and per-field rule tables.
//!
//! A rule spec is either a bare id (`required`) or an id followed by a
//! comma-separated argument list (`max_length(10)`, `equals(:password)`).
//! Arguments of the form `:name` refer to another input and are resolved
//! against the input set at evaluation time. Commas cannot be escaped.

use crate::error::{Error, Result};
use crate::value::Inputs;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Rule id that makes a field optional instead of naming a predicate.
pub const ONLY_IF_SET: &str = "onlyifset";

static RULE_CALL_REGEX: OnceLock<Regex> = OnceLock::new();
static FIELD_REF_REGEX: OnceLock<Regex> = OnceLock::new();

fn rule_call_regex() -> &'static Regex {
    RULE_CALL_REGEX
        .get_or_init(|| Regex::new(r"^([A-Za-z0-9_]+)\((.+?)\)$").expect("rule pattern is valid"))
}

fn field_ref_regex() -> &'static Regex {
    FIELD_REF_REGEX
        .get_or_init(|| Regex::new(r"^:([A-Za-z0-9_]+)$").expect("reference pattern is valid"))
}

/// A predicate callable.
///
/// Argument 0 is the field's own value, followed by the resolved rule
/// parameters in order.
pub type Predicate = Arc<dyn Fn(&[Value]) -> bool + Send + Sync>;

/// One parsed rule application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleToken {
    pub rule_id: String,
    pub raw_params: Vec<String>,
}

impl RuleToken {
    /// Parse a rule spec. Never fails: a string that is not `id(args)` is
    /// taken whole as a parameterless rule id.
    pub fn parse(spec: &str) -> Self {
        match rule_call_regex().captures(spec) {
            Some(caps) => Self {
                rule_id: caps[1].to_string(),
                raw_params: caps[2].split(',').map(str::to_string).collect(),
            },
            None => Self {
                rule_id: spec.to_string(),
                raw_params: Vec::new(),
            },
        }
    }

    pub fn is_only_if_set(&self) -> bool {
        self.rule_id == ONLY_IF_SET
    }
}

impl fmt::Display for RuleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw_params.is_empty() {
            write!(f, "{}", self.rule_id)
        } else {
            write!(f, "{}({})", self.rule_id, self.raw_params.join(","))
        }
    }
}

/// The input name a `:name` parameter refers to, if it is one.
pub fn field_reference(param: &str) -> Option<&str> {
    field_ref_regex()
        .captures(param)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Resolve raw parameters against the inputs.
///
/// `:name` becomes the current value of input `name` (`null` when absent);
/// anything else passes through as a string literal.
pub fn resolve_params(raw_params: &[String], inputs: &Inputs) -> Vec<Value> {
    raw_params
        .iter()
        .map(|param| match field_reference(param) {
            Some(name) => inputs.value(name).clone(),
            None => Value::String(param.clone()),
        })
        .collect()
}

/// A rule applied to a field: either looked up by id in the registry or
/// carrying its own predicate.
#[derive(Clone)]
pub enum RuleEntry {
    Named(RuleToken),
    Inline {
        token: RuleToken,
        predicate: Predicate,
    },
}

impl RuleEntry {
    /// A registry-dispatched rule.
    pub fn named(spec: &str) -> Self {
        Self::Named(RuleToken::parse(spec))
    }

    /// A rule carrying its own predicate. The registry is never consulted
    /// for it; `spec` only names the rule and supplies its parameters.
    pub fn inline<F>(spec: &str, predicate: F) -> Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        Self::Inline {
            token: RuleToken::parse(spec),
            predicate: Arc::new(predicate),
        }
    }

    pub fn token(&self) -> &RuleToken {
        match self {
            Self::Named(token) | Self::Inline { token, .. } => token,
        }
    }
}

impl fmt::Debug for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(token) => f.debug_tuple("Named").field(token).finish(),
            Self::Inline { token, .. } => f
                .debug_struct("Inline")
                .field("token", token)
                .finish_non_exhaustive(),
        }
    }
}

impl From<&str> for RuleEntry {
    fn from(spec: &str) -> Self {
        Self::named(spec)
    }
}

impl From<String> for RuleEntry {
    fn from(spec: String) -> Self {
        Self::named(&spec)
    }
}

impl From<RuleToken> for RuleEntry {
    fn from(token: RuleToken) -> Self {
        Self::Named(token)
    }
}

/// Split a `|`-separated rule string into entries.
pub fn parse_rule_list(specs: &str) -> Vec<RuleEntry> {
    specs.split('|').map(RuleEntry::named).collect()
}

/// Rules per field, in the order fields were added.
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    fields: IndexMap<String, Vec<RuleEntry>>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rules for a field, replacing any earlier list.
    ///
    /// ```rust,ignore
    /// let rules = FieldRules::new()
    ///     .field("name", ["required", "max_length(40)"])
    ///     .field("confirm", ["equals(:password)"]);
    /// ```
    pub fn field<I, R>(mut self, name: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RuleEntry>,
    {
        self.insert(name, rules.into_iter().map(Into::into).collect());
        self
    }

    /// Set the rules for a field from a `|`-separated string.
    pub fn field_spec(mut self, name: impl Into<String>, specs: &str) -> Self {
        self.insert(name, parse_rule_list(specs));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, rules: Vec<RuleEntry>) {
        self.fields.insert(name.into(), rules);
    }

    /// Append one rule to a field, creating the field if needed.
    pub fn push(&mut self, name: impl Into<String>, rule: impl Into<RuleEntry>) {
        self.fields.entry(name.into()).or_default().push(rule.into());
    }

    pub fn get(&self, name: &str) -> Option<&[RuleEntry]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RuleEntry])> {
        self.fields
            .iter()
            .map(|(name, rules)| (name.as_str(), rules.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a rule table from a JSON document.
    ///
    /// Each field maps to an array of rule specs or a single `|`-separated
    /// string. Any other shape fails with [`Error::ArrayExpected`].
    pub fn from_json(document: &Value) -> Result<Self> {
        let fields: IndexMap<String, Value> = serde_json::from_value(document.clone())?;
        let mut rules = Self::new();
        for (name, spec) in fields {
            let entries = match &spec {
                Value::String(specs) => parse_rule_list(specs),
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(RuleEntry::named(s)),
                        _ => Err(Error::ArrayExpected {
                            field: name.clone(),
                        }),
                    })
                    .collect::<Result<Vec<_>>>()?,
                _ => return Err(Error::ArrayExpected { field: name }),
            };
            rules.insert(name, entries);
        }
        Ok(rules)
    }

    pub fn from_json_str(document: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(document)?;
        Self::from_json(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_bare_rule() {
        let token = RuleToken::parse("required");
        assert_eq!(token.rule_id, "required");
        assert!(token.raw_params.is_empty());
    }

    #[test]
    fn parse_rule_with_params() {
        let token = RuleToken::parse("rule1(:test2,3,:test3)");
        assert_eq!(token.rule_id, "rule1");
        assert_eq!(token.raw_params, vec![":test2", "3", ":test3"]);
    }

    #[test]
    fn parse_keeps_literal_commas_split() {
        let token = RuleToken::parse("equals(a,b)");
        assert_eq!(token.raw_params, vec!["a", "b"]);
    }

    #[test]
    fn parse_non_call_is_whole_id() {
        assert_eq!(RuleToken::parse("max-length(3)").rule_id, "max-length(3)");
        assert_eq!(RuleToken::parse("empty()").rule_id, "empty()");
        assert_eq!(RuleToken::parse("").rule_id, "");
    }

    #[test]
    fn display_round_trips_spec() {
        assert_eq!(RuleToken::parse("max_length(10)").to_string(), "max_length(10)");
        assert_eq!(RuleToken::parse("email").to_string(), "email");
    }

    #[test]
    fn field_reference_requires_exact_shape() {
        assert_eq!(field_reference(":other"), Some("other"));
        assert_eq!(field_reference("other"), None);
        assert_eq!(field_reference(":other field"), None);
        assert_eq!(field_reference("::x"), None);
    }

    #[test]
    fn resolve_substitutes_references() {
        let inputs = Inputs::new().with("test2", "foo");
        let raw = vec![":test2".to_string(), "3".to_string(), ":missing".to_string()];
        assert_eq!(
            resolve_params(&raw, &inputs),
            vec![json!("foo"), json!("3"), Value::Null]
        );
    }

    #[test]
    fn rule_list_splits_on_pipe() {
        let entries = parse_rule_list("required|max_length(5)");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].token().raw_params, vec!["5"]);
    }

    #[test]
    fn field_rules_keep_insertion_order() {
        let rules = FieldRules::new()
            .field("b", ["required"])
            .field_spec("a", "required|email");
        let names: Vec<_> = rules.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(rules.get("a").map(<[RuleEntry]>::len), Some(2));
    }

    #[test]
    fn from_json_accepts_lists_and_strings() {
        let rules = FieldRules::from_json(&json!({
            "name": ["required", "max_length(10)"],
            "email": "required|email"
        }))
        .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get("email").unwrap()[1].token().rule_id, "email");
    }

    #[test]
    fn from_json_rejects_other_shapes() {
        let err = FieldRules::from_json(&json!({"name": 5})).unwrap_err();
        assert!(matches!(err, Error::ArrayExpected { ref field } if field == "name"));

        let err = FieldRules::from_json(&json!({"name": ["required", {"x": 1}]})).unwrap_err();
        assert!(matches!(err, Error::ArrayExpected { .. }));

        let err = FieldRules::from_json(&json!(["required"])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
