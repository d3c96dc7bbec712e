//! Error types for rule configuration and message rendering.
//!
//! None of these describe a field failing validation. A predicate returning
//! `false` is recorded in [`Validation`](crate::Validation); the variants below
//! abort the whole call because the rules or messages themselves are broken.

use thiserror::Error;

/// Configuration error raised by validation or rendering.
#[derive(Debug, Error)]
pub enum Error {
    /// The rules for a field were neither a rule list nor a `|`-separated string.
    #[error("Rules for field '{field}' must be a list of rule entries")]
    ArrayExpected { field: String },

    /// No inline predicate was supplied and the registry has no such rule.
    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    /// The rule id names an operation bound to validation state.
    #[error("Rule '{0}' is bound to validation state and cannot be used as a predicate")]
    PredicateNotStatic(String),

    /// No custom message and no locale entry exists for the rule.
    #[error("No error text for rule: {0}")]
    NoErrorText(String),

    /// A rule or locale document could not be decoded.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
