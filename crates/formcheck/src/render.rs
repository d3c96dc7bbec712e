//! Turning failures into human-readable messages.
//!
//! For each failure the template is chosen in this order:
//!
//! 1. a custom message registered for `field.rule`
//! 2. a custom message registered for `rule`
//! 3. the locale table entry for `rule`
//!
//! `:params(i)` is then replaced by the i-th rule parameter (with `:name`
//! references shown as that input's display name) and `:attribute` by the
//! field's display name.

use crate::error::{Error, Result};
use crate::locale::{LocaleProvider, LocaleTable, DEFAULT_LOCALE};
use crate::result::{FailureEntry, Validation};
use crate::rule::field_reference;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::OnceLock;

static PARAMS_PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn params_placeholder_regex() -> &'static Regex {
    PARAMS_PLACEHOLDER_REGEX
        .get_or_init(|| Regex::new(r":params\((.+?)\)").expect("placeholder pattern is valid"))
}

/// Structured form of the rendered messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub success: bool,
    pub locale: String,
    pub fields: Vec<FieldReport>,
}

/// One rendered failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReport {
    pub field: String,
    pub rule: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

/// Renders a [`Validation`] with locale tables from a [`LocaleProvider`].
///
/// ## Example
///
/// ```rust,ignore
/// let renderer = MessageRenderer::new(BuiltinLocales);
/// let messages = renderer.render(&validation, Some("it"))?;
/// ```
#[derive(Debug, Clone)]
pub struct MessageRenderer<P> {
    locales: P,
    default_locale: String,
}

impl<P: LocaleProvider> MessageRenderer<P> {
    pub fn new(locales: P) -> Self {
        Self {
            locales,
            default_locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// Locale used when a render call passes `None`.
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Render every failure, in the order the failures were recorded.
    pub fn render(&self, validation: &Validation, locale: Option<&str>) -> Result<Vec<String>> {
        Ok(self
            .report(validation, locale)?
            .fields
            .into_iter()
            .map(|field| field.message)
            .collect())
    }

    /// Render every failure into a [`ValidationReport`].
    pub fn report(&self, validation: &Validation, locale: Option<&str>) -> Result<ValidationReport> {
        let locale = locale.unwrap_or(&self.default_locale);
        let table = self
            .locales
            .lookup(locale)
            .unwrap_or_else(|| {
                tracing::debug!(locale, "No locale table, using custom messages only");
                Cow::Owned(LocaleTable::default())
            });

        let mut fields = Vec::with_capacity(validation.failure_count());
        for rules in validation.results().values() {
            for entry in rules.values() {
                fields.push(render_entry(validation, &table, entry)?);
            }
        }

        Ok(ValidationReport {
            success: validation.is_success(),
            locale: locale.to_string(),
            fields,
        })
    }
}

fn render_entry(
    validation: &Validation,
    table: &LocaleTable,
    entry: &FailureEntry,
) -> Result<FieldReport> {
    let attribute = validation.display_name(&entry.field);
    let params = display_params(validation, &entry.raw_params);

    let template = validation
        .custom_message(&entry.field, &entry.rule_id)
        .or_else(|| table.get(&entry.rule_id))
        .ok_or_else(|| Error::NoErrorText(entry.rule_id.clone()))?;

    let message = substitute_params(template, &params, entry).replace(":attribute", attribute);

    Ok(FieldReport {
        field: entry.field.clone(),
        rule: entry.rule_id.clone(),
        message,
        params,
    })
}

/// Parameters as shown to users: `:name` becomes that input's display name,
/// or the bare name when it has none.
fn display_params(validation: &Validation, raw_params: &[String]) -> Vec<String> {
    raw_params
        .iter()
        .map(|param| match field_reference(param) {
            Some(name) => validation.display_name(name).to_string(),
            None => param.clone(),
        })
        .collect()
}

/// Replace `:params(i)`. An index with no parameter is left as written.
fn substitute_params(template: &str, params: &[String], entry: &FailureEntry) -> String {
    params_placeholder_regex()
        .replace_all(template, |caps: &Captures<'_>| {
            let index = caps[1].trim().parse::<usize>().ok();
            match index.and_then(|i| params.get(i)) {
                Some(param) => param.clone(),
                None => {
                    tracing::warn!(
                        field = %entry.field,
                        rule = %entry.rule_id,
                        placeholder = &caps[0],
                        "Message placeholder has no matching rule parameter"
                    );
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}
