//! The evaluation engine.

use crate::error::Result;
use crate::locale::{BuiltinLocales, LocaleProvider, DEFAULT_LOCALE};
use crate::predicates::DirectoryProbe;
use crate::registry::PredicateRegistry;
use crate::result::{DisplayNames, FailureEntry, Failures, Validation};
use crate::rule::{resolve_params, FieldRules, Predicate, RuleEntry};
use crate::value::Inputs;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Evaluates rule tables against inputs.
///
/// A `Validator` is read-only once built and can be shared across threads;
/// each call to [`validate`](Self::validate) produces an independent
/// [`Validation`].
///
/// ## Example
///
/// ```rust,ignore
/// use formcheck::prelude::*;
///
/// let validator = Validator::builder()
///     .rule("even", |args| args[0].as_i64().map_or(false, |n| n % 2 == 0))
///     .build();
///
/// let inputs = Inputs::new().with("count", 3);
/// let rules = FieldRules::new().field("count", ["required", "even"]);
///
/// let validation = validator.validate(&inputs, &rules, None)?;
/// assert!(validation.has("count", Some("even")));
/// ```
#[derive(Clone)]
pub struct Validator {
    registry: PredicateRegistry,
    locales: Arc<dyn LocaleProvider>,
    default_locale: String,
}

impl Validator {
    /// A validator with the built-in rules and bundled locales.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    pub fn registry(&self) -> &PredicateRegistry {
        &self.registry
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Evaluate every rule of every field.
    ///
    /// Fails without a result if a named rule is unknown or not usable as a
    /// predicate. Rules that merely return `false` are recorded in the
    /// returned [`Validation`].
    pub fn validate(
        &self,
        inputs: &Inputs,
        rules: &FieldRules,
        display_names: Option<DisplayNames>,
    ) -> Result<Validation> {
        let mut failures = Failures::new();

        for (field, entries) in rules.iter() {
            if entries.iter().any(|e| e.token().is_only_if_set()) && !inputs.is_set(field) {
                tracing::debug!(field, "Field not set, skipping optional rules");
                continue;
            }

            let value = inputs.value(field);
            for entry in entries {
                let token = entry.token();
                if token.is_only_if_set() {
                    continue;
                }

                let mut args = Vec::with_capacity(token.raw_params.len() + 1);
                args.push(value.clone());
                args.extend(resolve_params(&token.raw_params, inputs));

                if self.dispatch(entry, &args)? {
                    continue;
                }

                tracing::debug!(field, rule = %token.rule_id, "Rule failed");
                // A repeated rule id replaces the earlier failure in place.
                failures.entry(field.to_string()).or_default().insert(
                    token.rule_id.clone(),
                    FailureEntry {
                        field: field.to_string(),
                        rule_id: token.rule_id.clone(),
                        raw_params: token.raw_params.clone(),
                        resolved_params: args.split_off(1),
                    },
                );
            }
        }

        tracing::debug!(
            fields = rules.len(),
            failures = failures.values().map(|r| r.len()).sum::<usize>(),
            "Validation run complete"
        );

        Ok(Validation::new(
            failures,
            display_names.unwrap_or_default(),
            Arc::clone(&self.locales),
            self.default_locale.clone(),
        ))
    }

    /// Parse a JSON rule document and validate a JSON object of inputs.
    ///
    /// Rule documents map each field to a list of rule specs or to a single
    /// `|`-separated string; anything else fails with
    /// [`Error::ArrayExpected`](crate::Error::ArrayExpected).
    pub fn validate_json(
        &self,
        inputs: &Value,
        rules: &Value,
        display_names: Option<DisplayNames>,
    ) -> Result<Validation> {
        let rules = FieldRules::from_json(rules)?;
        self.validate(&Inputs::from(inputs.clone()), &rules, display_names)
    }

    fn dispatch(&self, entry: &RuleEntry, args: &[Value]) -> Result<bool> {
        match entry {
            RuleEntry::Inline { predicate, .. } => Ok(predicate(args)),
            RuleEntry::Named(token) => {
                let predicate = self.registry.lookup(&token.rule_id)?;
                Ok(predicate(args))
            }
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        ValidatorBuilder::new().build()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("registry", &self.registry)
            .field("default_locale", &self.default_locale)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Validator`].
pub struct ValidatorBuilder {
    registry: Option<PredicateRegistry>,
    probe: Option<Arc<dyn DirectoryProbe>>,
    custom: Vec<(String, Predicate)>,
    locales: Option<Arc<dyn LocaleProvider>>,
    default_locale: String,
}

impl ValidatorBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            probe: None,
            custom: Vec::new(),
            locales: None,
            default_locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// Start from an existing registry instead of the built-ins.
    pub fn registry(mut self, registry: PredicateRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Answer `isdir` / `is_path` with `probe` instead of the filesystem.
    /// Ignored when a registry is supplied.
    pub fn directory_probe(mut self, probe: impl DirectoryProbe + 'static) -> Self {
        self.probe = Some(Arc::new(probe));
        self
    }

    /// Add a custom predicate.
    pub fn rule<F>(mut self, rule_id: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate = Arc::new(predicate);
        self.custom.push((rule_id.into(), predicate));
        self
    }

    /// Locale tables used by [`Validation::errors`].
    pub fn locales(mut self, locales: impl LocaleProvider + 'static) -> Self {
        self.locales = Some(Arc::new(locales));
        self
    }

    pub fn default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    pub fn build(self) -> Validator {
        let mut registry = match (self.registry, self.probe) {
            (Some(registry), _) => registry,
            (None, Some(probe)) => PredicateRegistry::with_probe(probe),
            (None, None) => PredicateRegistry::with_builtins(),
        };
        for (rule_id, predicate) in self.custom {
            registry.register_predicate(rule_id, predicate);
        }

        Validator {
            registry,
            locales: self
                .locales
                .unwrap_or_else(|| Arc::new(BuiltinLocales) as Arc<dyn LocaleProvider>),
            default_locale: self.default_locale,
        }
    }
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_VALIDATOR: OnceLock<Validator> = OnceLock::new();

/// Validate with the built-in rules and bundled locales.
pub fn validate(
    inputs: &Inputs,
    rules: &FieldRules,
    display_names: Option<DisplayNames>,
) -> Result<Validation> {
    DEFAULT_VALIDATOR
        .get_or_init(Validator::new)
        .validate(inputs, rules, display_names)
}
