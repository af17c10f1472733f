//! Response accumulator for one wizard session.

use indexmap::IndexMap;
use serde::Serialize;

/// Step id → recorded value, in first-recorded order.
///
/// Re-recording an id replaces its value without moving it. Serializes as a
/// JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResponseMap {
    entries: IndexMap<String, String>,
}

impl ResponseMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step_id: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(step_id.into(), value.into());
    }

    pub fn get(&self, step_id: &str) -> Option<&str> {
        self.entries.get(step_id).map(String::as_str)
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.entries.contains_key(step_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_recorded_order() {
        let mut responses = ResponseMap::new();
        responses.record("b", "2");
        responses.record("a", "1");
        responses.record("b", "3");

        let items: Vec<_> = responses.iter().collect();
        assert_eq!(items, vec![("b", "3"), ("a", "1")]);
        assert_eq!(responses.len(), 2);
    }

    #[test]
    fn serializes_as_ordered_object() {
        let mut responses = ResponseMap::new();
        responses.record("zeta", "z");
        responses.record("alpha", "a");
        let json = serde_json::to_string(&responses).unwrap();
        assert_eq!(json, r#"{"zeta":"z","alpha":"a"}"#);
    }

    #[test]
    fn lookup() {
        let mut responses = ResponseMap::new();
        assert!(responses.is_empty());
        responses.record("a", "y");
        assert_eq!(responses.get("a"), Some("y"));
        assert!(responses.contains("a"));
        assert_eq!(responses.get("b"), None);
    }
}
