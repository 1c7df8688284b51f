use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A schemaless record, kept as raw JSON from the data file all the way to
/// the store boundary. Field access is soft: missing or mistyped fields
/// read as `None` instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns the field's text when it is a non-empty string. Empty strings
    /// count as absent, matching how eligibility for embedding is decided.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn vector(&self, field: &str) -> Option<Vec<f32>> {
        self.0
            .get(field)?
            .as_array()?
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect()
    }

    pub fn set_vector(&mut self, field: &str, vector: Vec<f32>) {
        self.0.insert(field.to_string(), Value::from(vector));
    }

    /// Identifier for skip reports and previews. Falls back to "unknown"
    /// when the id field is missing or not a scalar.
    pub fn display_id(&self, id_field: &str) -> String {
        match self.0.get(id_field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "unknown".to_string(),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_requires_non_empty_string() {
        let d = doc(json!({"Description": "A quiet inn."}));
        assert_eq!(d.text("Description"), Some("A quiet inn."));

        let empty = doc(json!({"Description": ""}));
        assert_eq!(empty.text("Description"), None);

        let missing = doc(json!({"HotelName": "Arcadia"}));
        assert_eq!(missing.text("Description"), None);

        let mistyped = doc(json!({"Description": 42}));
        assert_eq!(mistyped.text("Description"), None);
    }

    #[test]
    fn test_vector_roundtrip() {
        let mut d = Document::new();
        assert_eq!(d.vector("DescriptionVector"), None);

        d.set_vector("DescriptionVector", vec![0.25, -1.5, 3.0]);
        assert_eq!(d.vector("DescriptionVector"), Some(vec![0.25, -1.5, 3.0]));
    }

    #[test]
    fn test_vector_rejects_mixed_arrays() {
        let d = doc(json!({"DescriptionVector": [0.1, "oops", 0.3]}));
        assert_eq!(d.vector("DescriptionVector"), None);
    }

    #[test]
    fn test_display_id() {
        let named = doc(json!({"HotelId": "12"}));
        assert_eq!(named.display_id("HotelId"), "12");

        let numeric = doc(json!({"HotelId": 12}));
        assert_eq!(numeric.display_id("HotelId"), "12");

        let missing = doc(json!({"HotelName": "Arcadia"}));
        assert_eq!(missing.display_id("HotelId"), "unknown");
    }

    #[test]
    fn test_serde_transparent() {
        let d = doc(json!({"HotelId": "1", "Rating": 4.5}));
        assert!(d.contains("Rating"));

        let back = serde_json::to_value(&d).unwrap();
        assert_eq!(back, json!({"HotelId": "1", "Rating": 4.5}));
    }
}
