//! The outcome of one validation run.

use crate::error::Result;
use crate::locale::LocaleProvider;
use crate::render::{MessageRenderer, ValidationReport};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

static SCOPED_KEY_REGEX: OnceLock<Regex> = OnceLock::new();

fn scoped_key_regex() -> &'static Regex {
    SCOPED_KEY_REGEX
        .get_or_init(|| Regex::new(r"^(.+?)\.(.+?)$").expect("scoped key pattern is valid"))
}

/// Field name to human-readable label.
pub type DisplayNames = HashMap<String, String>;

/// Failures keyed by field, then rule id, in the order first recorded.
pub type Failures = IndexMap<String, IndexMap<String, FailureEntry>>;

/// One field/rule pair whose predicate returned `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub field: String,
    pub rule_id: String,
    /// Parameters as written in the rule spec; `:name` references are kept.
    pub raw_params: Vec<String>,
    /// Parameters after `:name` references were replaced by input values.
    pub resolved_params: Vec<Value>,
}

/// Result of [`Validator::validate`](crate::Validator::validate).
///
/// The failure set is fixed when the run ends. Custom messages can be added
/// afterwards through `&mut self`; they only affect rendering.
#[derive(Clone, Serialize)]
pub struct Validation {
    failures: Failures,
    display_names: DisplayNames,
    #[serde(skip)]
    field_messages: HashMap<String, HashMap<String, String>>,
    #[serde(skip)]
    rule_messages: HashMap<String, String>,
    #[serde(skip)]
    locales: Arc<dyn LocaleProvider>,
    #[serde(skip)]
    default_locale: String,
}

impl Validation {
    pub(crate) fn new(
        failures: Failures,
        display_names: DisplayNames,
        locales: Arc<dyn LocaleProvider>,
        default_locale: String,
    ) -> Self {
        Self {
            failures,
            display_names,
            field_messages: HashMap::new(),
            rule_messages: HashMap::new(),
            locales,
            default_locale,
        }
    }

    /// True when no rule failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether `field` failed any rule, or the given rule when one is named.
    pub fn has(&self, field: &str, rule_id: Option<&str>) -> bool {
        match (self.failures.get(field), rule_id) {
            (Some(rules), Some(rule_id)) => rules.contains_key(rule_id),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// All failures.
    pub fn results(&self) -> &Failures {
        &self.failures
    }

    pub fn failure(&self, field: &str, rule_id: &str) -> Option<&FailureEntry> {
        self.failures.get(field).and_then(|rules| rules.get(rule_id))
    }

    /// Total number of failed field/rule pairs.
    pub fn failure_count(&self) -> usize {
        self.failures.values().map(IndexMap::len).sum()
    }

    pub fn display_names(&self) -> &DisplayNames {
        &self.display_names
    }

    /// Label for a field, falling back to the field name.
    pub fn display_name<'a>(&'a self, field: &'a str) -> &'a str {
        self.display_names
            .get(field)
            .map(String::as_str)
            .unwrap_or(field)
    }

    /// Register message overrides.
    ///
    /// A key of the form `field.rule` (split at the first dot) applies to that
    /// field only; any other key applies to the rule everywhere. Later calls
    /// replace earlier templates with the same key.
    pub fn custom_messages<I, K, V>(&mut self, overrides: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, template) in overrides {
            let key = key.as_ref();
            match scoped_key_regex().captures(key) {
                Some(caps) => {
                    self.field_messages
                        .entry(caps[1].to_string())
                        .or_default()
                        .insert(caps[2].to_string(), template.into());
                }
                None => {
                    self.rule_messages.insert(key.to_string(), template.into());
                }
            }
        }
        self
    }

    /// Custom template for a field/rule pair, field-scoped first.
    pub fn custom_message(&self, field: &str, rule_id: &str) -> Option<&str> {
        self.field_messages
            .get(field)
            .and_then(|rules| rules.get(rule_id))
            .or_else(|| self.rule_messages.get(rule_id))
            .map(String::as_str)
    }

    /// Render messages with the locale tables of the validator that produced
    /// this result. `None` selects its default locale.
    pub fn errors(&self, locale: Option<&str>) -> Result<Vec<String>> {
        self.renderer().render(self, locale)
    }

    /// Render a structured report with the validator's locale tables.
    pub fn to_report(&self, locale: Option<&str>) -> Result<ValidationReport> {
        self.renderer().report(self, locale)
    }

    fn renderer(&self) -> MessageRenderer<Arc<dyn LocaleProvider>> {
        MessageRenderer::new(Arc::clone(&self.locales)).with_default_locale(&self.default_locale)
    }
}

impl fmt::Debug for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validation")
            .field("failures", &self.failures)
            .field("display_names", &self.display_names)
            .field("field_messages", &self.field_messages)
            .field("rule_messages", &self.rule_messages)
            .field("default_locale", &self.default_locale)
            .finish_non_exhaustive()
    }
}
