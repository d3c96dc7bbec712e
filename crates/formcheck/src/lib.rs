//! # formcheck
//!
//! Declarative field validation. Rules are short strings attached to named
//! inputs; every rule of every field is evaluated and the failures are kept
//! in a [`Validation`] that can be queried or rendered into localized
//! messages.
//!
//! ## Example
//!
//! ```rust,ignore
//! use formcheck::prelude::*;
//!
//! let inputs = Inputs::new()
//!     .with("name", "")
//!     .with("password", "hunter2")
//!     .with("confirm", "hunter3");
//!
//! let rules = FieldRules::new()
//!     .field("name", ["required", "max_length(40)"])
//!     .field("confirm", ["equals(:password)"])
//!     .field_spec("nickname", "onlyifset|alpha");
//!
//! let mut validation = validate(&inputs, &rules, None)?;
//! validation.custom_messages([("confirm.equals", "Passwords do not match")]);
//!
//! assert_eq!(
//!     validation.errors(None)?,
//!     vec!["name field is required", "Passwords do not match"],
//! );
//! ```
//!
//! ## Rule Syntax
//!
//! - `rule` - a rule without parameters, e.g. `required`
//! - `rule(a,b,...)` - a rule with literal parameters, e.g. `max_length(10)`
//! - `rule(:field)` - a parameter taken from another input, e.g. `equals(:password)`
//! - `onlyifset` - skip the field entirely when it has no value
//!
//! ## Built-in Rules
//!
//! `required`, `numeric`, `integer`, `float`, `alpha`, `alpha_numeric`,
//! `email`, `ip`, `url`, `max_length(n)`, `min_length(n)`, `exact_length(n)`,
//! `equals(x)`, `is_filename`, `is_path` / `isdir`, `isarray`.
//!
//! ## Messages
//!
//! Templates use `:attribute` for the field's display name and `:params(i)`
//! for the i-th rule parameter. Custom messages registered for `field.rule`
//! win over ones registered for `rule`, which win over the locale table.

mod engine;
mod error;
mod locale;
mod predicates;
mod registry;
mod render;
mod result;
mod rule;
mod value;


pub use engine::{validate, Validator, ValidatorBuilder};
pub use error::{Error, Result};
pub use locale::{
    BuiltinLocales, Layered, LocaleProvider, LocaleTable, StaticLocales, DEFAULT_LOCALE,
};
pub use predicates::{DirectoryProbe, FsProbe};
pub use registry::{PredicateRegistry, INSTANCE_BOUND_RULES};
pub use render::{FieldReport, MessageRenderer, ValidationReport};
pub use result::{DisplayNames, FailureEntry, Failures, Validation};
pub use rule::{
    field_reference, parse_rule_list, resolve_params, FieldRules, Predicate, RuleEntry, RuleToken,
    ONLY_IF_SET,
};
pub use value::{loose_eq, parse_numeric, text_form, truthy, Inputs};

/// The built-in predicates, callable directly.
pub mod rules {
    pub use crate::predicates::{
        alpha, alpha_numeric, email, equals, exact_length, float, integer, ip, is_filename,
        isarray, max_length, min_length, numeric, required, url,
    };
}

/// Prelude module for validation
pub mod prelude {
    pub use crate::engine::{validate, Validator, ValidatorBuilder};
    pub use crate::error::{Error, Result};
    pub use crate::locale::{BuiltinLocales, LocaleProvider, LocaleTable, StaticLocales};
    pub use crate::render::MessageRenderer;
    pub use crate::result::{DisplayNames, Validation};
    pub use crate::rule::{FieldRules, RuleEntry};
    pub use crate::value::{loose_eq, Inputs};
}
