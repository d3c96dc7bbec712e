//! Locale message tables.
//!
//! Templates use `:attribute` for the field's display name and `:params(i)`
//! for the i-th rule parameter, e.g. `:attribute can be maximum :params(0)
//! character long`.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Locale used when a render call names none.
pub const DEFAULT_LOCALE: &str = "en";

const EN: &[(&str, &str)] = &[
    ("required", ":attribute field is required"),
    ("integer", ":attribute field must be an integer"),
    ("float", ":attribute field must be a float"),
    ("numeric", ":attribute field must be numeric"),
    ("email", ":attribute is not a valid email"),
    ("alpha", ":attribute field must be an alpha value"),
    ("alpha_numeric", ":attribute field must be alphanumeric"),
    ("ip", ":attribute must contain a valid IP"),
    ("url", ":attribute must contain a valid URL"),
    ("max_length", ":attribute can be maximum :params(0) character long"),
    ("min_length", ":attribute must be minimum :params(0) character long"),
    ("exact_length", ":attribute field must be :params(0) character long"),
    ("equals", ":attribute field should be same as :params(0)"),
    ("is_filename", ":attribute must be a valid file name"),
    ("is_path", ":attribute must be an existing directory"),
    ("isdir", ":attribute must be an existing directory"),
    ("isarray", ":attribute must be a list"),
];

const IT: &[(&str, &str)] = &[
    ("required", ":attribute field is required"),
    ("integer", ":attribute deve essere un intero"),
    ("float", ":attribute deve essere un float"),
    ("numeric", ":attribute deve essere numerico"),
    ("email", ":attribute deve essere un email valida"),
    ("alpha", ":attribute field must be an alpha value"),
    ("alpha_numeric", ":attribute field must be alphanumeric"),
    ("ip", ":attribute must contain a valid IP"),
    ("url", ":attribute must contain a valid URL"),
    ("max_length", ":attribute can be maximum :params(0) character long"),
    ("min_length", ":attribute must be minimum :params(0) character long"),
    ("exact_length", ":attribute field must :params(0) character long"),
    ("equals", ":attribute field should be same as :params(0)"),
];

/// Message templates for one locale, keyed by rule id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleTable {
    messages: HashMap<String, String>,
}

impl LocaleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a table from a JSON object of `rule id -> template`.
    pub fn from_json_str(document: &str) -> Result<Self> {
        Ok(serde_json::from_str(document)?)
    }

    pub fn insert(&mut self, rule_id: impl Into<String>, template: impl Into<String>) {
        self.messages.insert(rule_id.into(), template.into());
    }

    pub fn with(mut self, rule_id: impl Into<String>, template: impl Into<String>) -> Self {
        self.insert(rule_id, template);
        self
    }

    pub fn get(&self, rule_id: &str) -> Option<&str> {
        self.messages.get(rule_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Copy every entry of `overlay` over this table.
    pub fn merge(&mut self, overlay: &LocaleTable) {
        for (rule_id, template) in &overlay.messages {
            self.messages.insert(rule_id.clone(), template.clone());
        }
    }
}

impl<K, V> FromIterator<(K, V)> for LocaleTable
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            messages: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Source of locale tables.
///
/// Returning `None` is not an error: rendering falls back to an empty table
/// and only fails if a failure has no template anywhere.
pub trait LocaleProvider: Send + Sync {
    fn lookup(&self, locale: &str) -> Option<Cow<'_, LocaleTable>>;
}

impl<P: LocaleProvider + ?Sized> LocaleProvider for Arc<P> {
    fn lookup(&self, locale: &str) -> Option<Cow<'_, LocaleTable>> {
        (**self).lookup(locale)
    }
}

impl<P: LocaleProvider + ?Sized> LocaleProvider for &P {
    fn lookup(&self, locale: &str) -> Option<Cow<'_, LocaleTable>> {
        (**self).lookup(locale)
    }
}

static BUILTIN_TABLES: OnceLock<HashMap<&'static str, LocaleTable>> = OnceLock::new();

fn builtin_tables() -> &'static HashMap<&'static str, LocaleTable> {
    BUILTIN_TABLES.get_or_init(|| {
        HashMap::from([
            ("en", EN.iter().copied().collect::<LocaleTable>()),
            ("it", IT.iter().copied().collect::<LocaleTable>()),
        ])
    })
}

/// The bundled tables: `en` (complete) and a sample `it`, only partly
/// translated.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLocales;

impl BuiltinLocales {
    /// Codes of the bundled locales, sorted.
    pub fn locales() -> Vec<&'static str> {
        let mut codes: Vec<_> = builtin_tables().keys().copied().collect();
        codes.sort_unstable();
        codes
    }
}

impl LocaleProvider for BuiltinLocales {
    fn lookup(&self, locale: &str) -> Option<Cow<'_, LocaleTable>> {
        builtin_tables().get(locale).map(Cow::Borrowed)
    }
}

/// Caller-supplied tables keyed by locale code.
#[derive(Debug, Clone, Default)]
pub struct StaticLocales {
    tables: HashMap<String, LocaleTable>,
}

impl StaticLocales {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locale: impl Into<String>, table: LocaleTable) {
        self.tables.insert(locale.into(), table);
    }

    pub fn with_locale(mut self, locale: impl Into<String>, table: LocaleTable) -> Self {
        self.insert(locale, table);
        self
    }
}

impl LocaleProvider for StaticLocales {
    fn lookup(&self, locale: &str) -> Option<Cow<'_, LocaleTable>> {
        self.tables.get(locale).map(Cow::Borrowed)
    }
}

/// Two providers stacked: entries from `overlay` win over `base`.
///
/// Useful for shipping messages for custom rules next to the bundled ones.
#[derive(Debug, Clone, Default)]
pub struct Layered<A, B> {
    overlay: A,
    base: B,
}

impl<A, B> Layered<A, B> {
    pub fn new(overlay: A, base: B) -> Self {
        Self { overlay, base }
    }
}

impl<A: LocaleProvider, B: LocaleProvider> LocaleProvider for Layered<A, B> {
    fn lookup(&self, locale: &str) -> Option<Cow<'_, LocaleTable>> {
        match (self.overlay.lookup(locale), self.base.lookup(locale)) {
            (Some(overlay), Some(base)) => {
                let mut merged = base.into_owned();
                merged.merge(&overlay);
                Some(Cow::Owned(merged))
            }
            (Some(table), None) | (None, Some(table)) => Some(table),
            (None, None) => None,
        }
    }
}
