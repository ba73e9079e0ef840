//! Accumulated form answers and commit payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StepError;

/// Field name → value mapping accumulated across the steps of a wizard.
///
/// Backed by a sorted JSON map, so [`FormData::canonical_json`] is stable for
/// equal contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(Map<String, Value>);

impl FormData {
    /// Create empty form data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Merge a commit payload. Payload fields overwrite existing ones.
    pub fn merge(&mut self, payload: StepPayload) {
        for (key, value) in payload.0 {
            self.0.insert(key, value);
        }
    }

    /// Returns true if the field is present and not null.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_null())
    }

    /// Get a string field.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Get a trimmed, non-empty string field.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.str(key).map(str::trim).filter(|s| !s.is_empty())
    }

    /// Get a boolean field.
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Get a numeric field. Numeric strings are accepted, since form inputs
    /// often arrive as text.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get an array field.
    pub fn array(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no field has been set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize with sorted keys.
    pub fn canonical_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for FormData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Data produced by a successful commit, merged into [`FormData`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepPayload(Map<String, Value>);

impl StepPayload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Build a payload from any serializable record. The record must
    /// serialize to a JSON object.
    pub fn from_serialize<T: Serialize>(record: &T) -> Result<Self, StepError> {
        let value = serde_json::to_value(record)
            .map_err(|e| StepError::commit(format!("Malformed response: {e}")))?;
        Self::try_from(value)
    }

    /// Get a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns true if the payload carries no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Value> for StepPayload {
    type Error = StepError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StepError::commit(format!(
                "Malformed response: expected an object, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_overwrites_payload_fields() {
        let mut data = FormData::new();
        data.set("vinImage", json!("data:image/png;base64,AAAA"));
        data.set("vin", json!("STALE"));

        data.merge(
            StepPayload::new()
                .with("vin", json!("WP0AF2A95RS123456"))
                .with("factorySpecs", json!({"make": "Porsche"})),
        );

        assert_eq!(data.str("vin"), Some("WP0AF2A95RS123456"));
        assert_eq!(data.get("factorySpecs").unwrap()["make"], "Porsche");
        assert!(data.contains("vinImage"));
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn test_typed_accessors() {
        let mut data = FormData::new();
        data.set("mileage", json!("12500"));
        data.set("agreeToTerms", json!(true));
        data.set("ownerName", json!("   "));
        data.set("cleared", Value::Null);

        assert_eq!(data.number("mileage"), Some(12500.0));
        assert_eq!(data.bool("agreeToTerms"), Some(true));
        assert_eq!(data.text("ownerName"), None);
        assert!(!data.contains("cleared"));
    }

    #[test]
    fn test_canonical_json_is_order_independent() {
        let mut a = FormData::new();
        a.set("b", json!(2));
        a.set("a", json!(1));

        let mut b = FormData::new();
        b.set("a", json!(1));
        b.set("b", json!(2));

        assert_eq!(a.canonical_json(), b.canonical_json());
    }

    #[test]
    fn test_payload_requires_object() {
        assert!(StepPayload::try_from(json!({"tokenId": 7})).is_ok());

        let err = StepPayload::try_from(json!([1, 2])).unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Commit);
    }
}
