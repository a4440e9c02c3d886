//! Provider inference from attribute key prefixes.
//!
//! Some instrumentations never emit a provider attribute but namespace their
//! own keys (`openai.model`, `anthropic.stop_reason`, ...). The inferencer
//! turns the first recognised namespace into a `gen_ai.system` value.

use crate::attributes::AttributeMap;
use crate::defaults::{DEFAULT_SYSTEM_PREFIXES, semconv};
use crate::value::AttributeValue;
use serde::{Deserialize, Serialize};

/// A `prefix -> system` rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRule {
    /// Attribute key prefix, usually ending in a dot.
    pub prefix: String,
    /// System value written when the prefix matches.
    pub system: String,
}

impl PrefixRule {
    /// Creates a rule.
    pub fn new(prefix: impl Into<String>, system: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            system: system.into(),
        }
    }
}

/// Returns the built-in prefix rules in priority order.
pub fn default_prefix_rules() -> Vec<PrefixRule> {
    DEFAULT_SYSTEM_PREFIXES
        .iter()
        .map(|(prefix, system)| PrefixRule::new(*prefix, *system))
        .collect()
}

/// Derives a system attribute from key prefixes.
///
/// Rules are checked in list order and the first rule whose prefix starts any
/// key wins, independent of the order attributes are stored in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInferencer {
    rules: Vec<PrefixRule>,
    attribute: String,
}

impl Default for SystemInferencer {
    fn default() -> Self {
        Self::new(default_prefix_rules(), semconv::GEN_AI_SYSTEM)
    }
}

impl SystemInferencer {
    /// Creates an inferencer writing to `attribute`.
    pub fn new(rules: Vec<PrefixRule>, attribute: impl Into<String>) -> Self {
        Self {
            rules,
            attribute: attribute.into(),
        }
    }

    /// Returns the key written by [`SystemInferencer::apply`].
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Returns the rules in priority order.
    pub fn rules(&self) -> &[PrefixRule] {
        &self.rules
    }

    /// Returns the inferred system, if any rule matches.
    pub fn infer<M>(&self, attrs: &M) -> Option<&str>
    where
        M: AttributeMap + ?Sized,
    {
        self.rules
            .iter()
            .find(|rule| attrs.keys().any(|key| key.starts_with(rule.prefix.as_str())))
            .map(|rule| rule.system.as_str())
    }

    /// Writes the inferred system when the attribute is absent.
    ///
    /// Returns `true` if an attribute was written.
    pub fn apply<M>(&self, attrs: &mut M) -> bool
    where
        M: AttributeMap + ?Sized,
    {
        if attrs.contains_key(&self.attribute) {
            return false;
        }

        let Some(system) = self.infer(attrs) else {
            return false;
        };

        let system = AttributeValue::Str(system.to_string());
        attrs.put(&self.attribute, system);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{kv, kv_string};
    use proptest::prelude::*;

    #[test]
    fn test_infers_openai() {
        let inferencer = SystemInferencer::default();
        let mut attrs = vec![kv_string("openai.model", "gpt-4o")];

        assert!(inferencer.apply(&mut attrs));
        assert_eq!(attrs.get(semconv::GEN_AI_SYSTEM), Some("openai".into()));
        assert_eq!(attrs.get("openai.model"), Some("gpt-4o".into()));
    }

    #[test]
    fn test_existing_system_is_kept() {
        let inferencer = SystemInferencer::default();
        let mut attrs = vec![
            kv_string(semconv::GEN_AI_SYSTEM, "anthropic"),
            kv_string("openai.model", "gpt-4o"),
        ];

        assert!(!inferencer.apply(&mut attrs));
        assert_eq!(attrs.get(semconv::GEN_AI_SYSTEM), Some("anthropic".into()));
    }

    #[test]
    fn test_no_match_writes_nothing() {
        let inferencer = SystemInferencer::default();
        let original = vec![kv_string("http.method", "POST"), kv("openai", 1_i64)];
        let mut attrs = original.clone();

        assert_eq!(inferencer.infer(&attrs), None);
        assert!(!inferencer.apply(&mut attrs));
        assert_eq!(attrs, original);
    }

    #[test]
    fn test_rule_order_decides_between_prefixes() {
        let inferencer = SystemInferencer::default();
        let forward = vec![kv_string("anthropic.x", "a"), kv_string("openai.y", "b")];
        let reverse = vec![kv_string("openai.y", "b"), kv_string("anthropic.x", "a")];

        assert_eq!(inferencer.infer(&forward), Some("openai"));
        assert_eq!(inferencer.infer(&reverse), Some("openai"));
    }

    #[test]
    fn test_aliases_map_to_same_system() {
        let inferencer = SystemInferencer::default();
        assert_eq!(
            inferencer.infer(&vec![kv_string("bedrock.model_id", "x")]),
            Some("aws.bedrock")
        );
        assert_eq!(
            inferencer.infer(&vec![kv_string("aws.bedrock.model_id", "x")]),
            Some("aws.bedrock")
        );
    }

    #[test]
    fn test_custom_attribute_and_rules() {
        let inferencer =
            SystemInferencer::new(vec![PrefixRule::new("acme.", "acme-llm")], "llm.system");
        let mut attrs = vec![kv_string("acme.model", "m1"), kv_string("openai.x", "y")];

        assert!(inferencer.apply(&mut attrs));
        assert_eq!(attrs.get("llm.system"), Some("acme-llm".into()));
        assert!(!attrs.contains_key(semconv::GEN_AI_SYSTEM));
    }

    #[test]
    fn test_empty_rules_never_infer() {
        let inferencer = SystemInferencer::new(Vec::new(), semconv::GEN_AI_SYSTEM);
        assert_eq!(inferencer.infer(&vec![kv_string("openai.model", "x")]), None);
    }

    proptest! {
        #[test]
        fn inferred_system_comes_from_a_matching_rule(
            picks in proptest::collection::vec(0..DEFAULT_SYSTEM_PREFIXES.len(), 1..5),
            suffix in "[a-z_]{1,10}",
        ) {
            let inferencer = SystemInferencer::default();
            let attrs: Vec<_> = picks
                .iter()
                .map(|&i| kv_string(&format!("{}{suffix}", DEFAULT_SYSTEM_PREFIXES[i].0), "v"))
                .collect();

            let expected = DEFAULT_SYSTEM_PREFIXES[*picks.iter().min().unwrap()].1;
            prop_assert_eq!(inferencer.infer(&attrs), Some(expected));
        }
    }
}
