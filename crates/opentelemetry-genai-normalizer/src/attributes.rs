//! Key/value attribute collections.
//!
//! The normaliser never touches OTLP attribute vectors directly; it goes
//! through [`AttributeMap`], which gives it get/put/delete/enumerate with
//! unique-key semantics.

use crate::value::AttributeValue;
use opentelemetry_proto::tonic::common::v1::KeyValue;

/// A key-unique attribute collection that can be rewritten in place.
pub trait AttributeMap {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<AttributeValue>;

    /// Returns whether `key` is present.
    fn contains_key(&self, key: &str) -> bool;

    /// Inserts `value` under `key`, replacing any existing value.
    fn put(&mut self, key: &str, value: AttributeValue);

    /// Removes `key`, returning whether it was present.
    fn delete(&mut self, key: &str) -> bool;

    /// Enumerates entries in stored order.
    fn entries(&self) -> impl Iterator<Item = (&str, AttributeValue)> + '_;

    /// Enumerates keys in stored order.
    fn keys(&self) -> impl Iterator<Item = &str> + '_;

    /// Returns the number of entries.
    fn len(&self) -> usize;

    /// Returns `true` if there are no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// OTLP attribute lists.
///
/// OTLP does not forbid repeated keys on the wire. Reads and in-place
/// replacement act on the first occurrence; deletion drops every occurrence.
impl AttributeMap for Vec<KeyValue> {
    fn get(&self, key: &str) -> Option<AttributeValue> {
        self.iter()
            .find(|kv| kv.key == key)
            .map(|kv| AttributeValue::from_any(kv.value.as_ref()))
    }

    fn contains_key(&self, key: &str) -> bool {
        self.iter().any(|kv| kv.key == key)
    }

    fn put(&mut self, key: &str, value: AttributeValue) {
        let value = Some(value.into_any());
        match self.iter_mut().find(|kv| kv.key == key) {
            Some(existing) => existing.value = value,
            None => self.push(KeyValue {
                key: key.to_string(),
                value,
            }),
        }
    }

    fn delete(&mut self, key: &str) -> bool {
        let before = Vec::len(self);
        self.retain(|kv| kv.key != key);
        Vec::len(self) != before
    }

    fn entries(&self) -> impl Iterator<Item = (&str, AttributeValue)> + '_ {
        self.iter()
            .map(|kv| (kv.key.as_str(), AttributeValue::from_any(kv.value.as_ref())))
    }

    fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|kv| kv.key.as_str())
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// Builds a string attribute.
pub fn kv_string(key: &str, value: &str) -> KeyValue {
    kv(key, AttributeValue::Str(value.to_string()))
}

/// Builds an attribute from any [`AttributeValue`].
pub fn kv(key: &str, value: impl Into<AttributeValue>) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(value.into().into_any()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<KeyValue> {
        vec![
            kv_string("llm.model", "gpt-4o"),
            kv("llm.max_tokens", 4096_i64),
            kv("llm.top_p", 0.95),
        ]
    }

    #[test]
    fn test_get_and_contains() {
        let attrs = sample();
        assert_eq!(attrs.get("llm.model"), Some(AttributeValue::Str("gpt-4o".into())));
        assert_eq!(attrs.get("llm.max_tokens"), Some(AttributeValue::Int(4096)));
        assert!(attrs.contains_key("llm.top_p"));
        assert!(!attrs.contains_key("missing"));
        assert_eq!(attrs.get("missing"), None);
    }

    #[test]
    fn test_put_replaces_in_place() {
        let mut attrs = sample();
        attrs.put("llm.max_tokens", AttributeValue::Int(10));

        assert_eq!(AttributeMap::len(&attrs), 3);
        assert_eq!(attrs[1].key, "llm.max_tokens");
        assert_eq!(attrs.get("llm.max_tokens"), Some(AttributeValue::Int(10)));
    }

    #[test]
    fn test_put_appends_new_key() {
        let mut attrs = sample();
        attrs.put("gen_ai.request.model", AttributeValue::Str("gpt-4o".into()));

        assert_eq!(AttributeMap::len(&attrs), 4);
        assert_eq!(attrs[3].key, "gen_ai.request.model");
    }

    #[test]
    fn test_delete() {
        let mut attrs = sample();
        assert!(attrs.delete("llm.model"));
        assert!(!attrs.delete("llm.model"));
        assert_eq!(
            attrs.keys().collect::<Vec<_>>(),
            vec!["llm.max_tokens", "llm.top_p"]
        );
    }

    #[test]
    fn test_delete_drops_repeated_keys() {
        let mut attrs = vec![kv_string("a", "1"), kv_string("b", "2"), kv_string("a", "3")];
        assert!(attrs.delete("a"));
        assert_eq!(attrs.keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_entries_in_stored_order() {
        let attrs = sample();
        let keys: Vec<_> = attrs.entries().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["llm.model", "llm.max_tokens", "llm.top_p"]);
        assert!(!AttributeMap::is_empty(&attrs));
    }
}
