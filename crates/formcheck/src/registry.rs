//! Rule id to predicate lookup.

use crate::error::{Error, Result};
use crate::predicates::{builtins, DirectoryProbe, FsProbe};
use crate::rule::Predicate;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Ids of operations that read a validation's own state. They can never act
/// as predicates unless a static predicate is registered under the same id.
pub const INSTANCE_BOUND_RULES: &[&str] = &[
    "is_success",
    "has",
    "results",
    "errors",
    "custom_messages",
    "to_report",
];

#[derive(Clone)]
enum Entry {
    Static(Predicate),
    InstanceBound,
}

/// Registry of predicates available to named rules.
///
/// Register custom predicates while setting up, then share the registry
/// read-only; lookups take `&self`.
///
/// ```rust,ignore
/// let mut registry = PredicateRegistry::with_builtins();
/// registry.register("even", |args| args[0].as_i64().map_or(false, |n| n % 2 == 0));
/// ```
#[derive(Clone)]
pub struct PredicateRegistry {
    entries: HashMap<String, Entry>,
}

impl PredicateRegistry {
    /// A registry with no predicates at all.
    pub fn empty() -> Self {
        let entries = INSTANCE_BOUND_RULES
            .iter()
            .map(|id| (id.to_string(), Entry::InstanceBound))
            .collect();
        Self { entries }
    }

    /// The built-in rules, with `isdir` reading the local filesystem.
    pub fn with_builtins() -> Self {
        Self::with_probe(Arc::new(FsProbe))
    }

    /// The built-in rules, with `isdir` and `is_path` answered by `probe`.
    pub fn with_probe(probe: Arc<dyn DirectoryProbe>) -> Self {
        let mut registry = Self::empty();
        for (id, predicate) in builtins(probe) {
            registry.register_predicate(id, predicate);
        }
        registry
    }

    /// Register a predicate, replacing any rule with the same id.
    pub fn register<F>(&mut self, rule_id: impl Into<String>, predicate: F) -> &mut Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        self.register_predicate(rule_id, Arc::new(predicate))
    }

    pub fn register_predicate(
        &mut self,
        rule_id: impl Into<String>,
        predicate: Predicate,
    ) -> &mut Self {
        self.entries.insert(rule_id.into(), Entry::Static(predicate));
        self
    }

    /// Find the predicate for `rule_id`.
    pub fn lookup(&self, rule_id: &str) -> Result<&Predicate> {
        match self.entries.get(rule_id) {
            Some(Entry::Static(predicate)) => Ok(predicate),
            Some(Entry::InstanceBound) => Err(Error::PredicateNotStatic(rule_id.to_string())),
            None => Err(Error::UnknownRule(rule_id.to_string())),
        }
    }

    /// True when `rule_id` resolves to a usable predicate.
    pub fn contains(&self, rule_id: &str) -> bool {
        matches!(self.entries.get(rule_id), Some(Entry::Static(_)))
    }

    /// Ids of all usable predicates, sorted.
    pub fn rule_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Static(_)))
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("rules", &self.rule_ids())
            .finish()
    }
}
