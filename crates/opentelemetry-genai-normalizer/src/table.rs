//! Mapping table construction.

use crate::defaults::DEFAULT_MAPPINGS;
use std::collections::HashMap;

/// A single `source -> destination` rename rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappingRule {
    /// Attribute key emitted by an instrumentation library.
    pub source: String,
    /// Canonical attribute key.
    pub destination: String,
}

impl MappingRule {
    /// Creates a rule.
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Returns `true` if the rule maps a key onto itself.
    pub fn is_identity(&self) -> bool {
        self.source == self.destination
    }
}

impl<S: Into<String>, D: Into<String>> From<(S, D)> for MappingRule {
    fn from((source, destination): (S, D)) -> Self {
        Self::new(source, destination)
    }
}

/// Resolved set of mapping rules, keyed by source.
///
/// Immutable once built. Share it between threads behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    rules: HashMap<String, String>,
}

impl MappingTable {
    /// Builds a table from the optional default set plus user rules.
    ///
    /// Defaults are seeded first and user rules are overlaid, so a user rule
    /// replaces the default for the same source key. Keys are compared
    /// exactly; no case or whitespace folding.
    pub fn build<I, R>(enable_defaults: bool, user_rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<MappingRule>,
    {
        let mut rules = HashMap::new();

        if enable_defaults {
            rules.extend(
                DEFAULT_MAPPINGS
                    .iter()
                    .map(|(source, destination)| (source.to_string(), destination.to_string())),
            );
        }

        for rule in user_rules {
            let rule = rule.into();
            rules.insert(rule.source, rule.destination);
        }

        Self { rules }
    }

    /// Builds a table holding only the built-in defaults.
    pub fn with_defaults() -> Self {
        Self::build(true, std::iter::empty::<MappingRule>())
    }

    /// Returns the destination for `source`, if a rule exists.
    pub fn destination(&self, source: &str) -> Option<&str> {
        self.rules.get(source).map(String::as_str)
    }

    /// Returns whether a rule exists for `source`.
    pub fn contains(&self, source: &str) -> bool {
        self.rules.contains_key(source)
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates the rules in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(s, d)| (s.as_str(), d.as_str()))
    }
}
