//! JSON serialization support for Hazelcast.
//!
//! Also the last resort of dispatch: any value with a JSON form and no
//! better serializer is written as its JSON text.

use crate::error::{HazelcastError, Result};
use crate::serialization::constants::JAVASCRIPT_JSON_SERIALIZATION_TYPE;
use crate::serialization::registry::Serializer;
use crate::serialization::{DataInput, DataOutput, ObjectDataInput, ObjectDataOutput, Value};

/// A wrapper type for storing JSON documents in Hazelcast.
///
/// The JSON is stored as a string and can be queried using Hazelcast's
/// JSON query capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HazelcastJsonValue {
    json: String,
}

impl HazelcastJsonValue {
    /// Creates a new `HazelcastJsonValue` from a JSON string.
    ///
    /// Note: This does not validate that the string is valid JSON.
    pub fn from_string(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }

    /// Creates a new `HazelcastJsonValue` from a serde_json `Value`.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let json =
            serde_json::to_string(value).map_err(|e| HazelcastError::Serialization(e.to_string()))?;
        Ok(Self { json })
    }

    /// Parses the JSON string into a serde_json `Value`.
    pub fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::from_str(&self.json).map_err(|e| HazelcastError::Serialization(e.to_string()))
    }

    /// Returns the JSON string as a reference.
    pub fn as_str(&self) -> &str {
        &self.json
    }

    /// Consumes the wrapper and returns the inner JSON string.
    pub fn into_string(self) -> String {
        self.json
    }
}

impl std::fmt::Display for HazelcastJsonValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.json)
    }
}

impl From<String> for HazelcastJsonValue {
    fn from(json: String) -> Self {
        Self::from_string(json)
    }
}

impl From<&str> for HazelcastJsonValue {
    fn from(json: &str) -> Self {
        Self::from_string(json)
    }
}

/// Writes JSON documents and JSON-compatible values as a string; reads
/// them back as [`HazelcastJsonValue`].
#[derive(Debug, Default)]
pub(crate) struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn id(&self) -> i32 {
        JAVASCRIPT_JSON_SERIALIZATION_TYPE
    }

    fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
        if let Value::Json(json) = value {
            return output.write_string(json.as_str());
        }
        let document = value.to_json().ok_or_else(|| {
            HazelcastError::Serialization(format!("{} has no JSON form", value.type_name()))
        })?;
        output.write_string(&document.to_string())
    }

    fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
        let json = input.read_string()?;
        Ok(Value::Json(HazelcastJsonValue::from_string(json)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_string() {
        let json = HazelcastJsonValue::from_string(r#"{"key": "value"}"#);
        assert_eq!(json.as_str(), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_into_string() {
        let json = HazelcastJsonValue::from_string(r#"{"key": "value"}"#);
        let s = json.into_string();
        assert_eq!(s, r#"{"key": "value"}"#);
    }

    #[test]
    fn test_display() {
        let json = HazelcastJsonValue::from_string(r#"{"key": "value"}"#);
        assert_eq!(format!("{}", json), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_from_str_trait() {
        let json: HazelcastJsonValue = r#"{"key": "value"}"#.into();
        assert_eq!(json.as_str(), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_round_trip() {
        let original = HazelcastJsonValue::from_string(r#"{"name":"John","age":30}"#);

        let mut output = ObjectDataOutput::new();
        JsonSerializer
            .write(&mut output, &Value::Json(original.clone()))
            .unwrap();

        let bytes = output.as_bytes();
        let mut input = ObjectDataInput::new(bytes);
        let deserialized = JsonSerializer.read(&mut input).unwrap();

        assert_eq!(deserialized, Value::Json(original));
    }

    #[test]
    fn test_plain_values_written_as_json_text() {
        let mut output = ObjectDataOutput::new();
        let value = Value::Array(vec![Value::Null, Value::Bool(true)]);
        JsonSerializer.write(&mut output, &value).unwrap();

        let mut input = ObjectDataInput::new(output.as_bytes());
        assert_eq!(input.read_string().unwrap(), "[null,true]");
    }

    #[test]
    fn test_value_without_json_form_fails() {
        let mut output = ObjectDataOutput::new();
        assert!(JsonSerializer
            .write(&mut output, &Value::Undefined)
            .is_err());
    }

    #[test]
    fn test_equality() {
        let json1 = HazelcastJsonValue::from_string(r#"{"key": "value"}"#);
        let json2 = HazelcastJsonValue::from_string(r#"{"key": "value"}"#);
        let json3 = HazelcastJsonValue::from_string(r#"{"key": "other"}"#);

        assert_eq!(json1, json2);
        assert_ne!(json1, json3);
    }

    #[test]
    fn test_from_value() {
        let value = serde_json::json!({"key": "value"});
        let json = HazelcastJsonValue::from_value(&value).unwrap();
        assert_eq!(json.as_str(), r#"{"key":"value"}"#);
    }

    #[test]
    fn test_to_value() {
        let json = HazelcastJsonValue::from_string(r#"{"key":"value"}"#);
        let value = json.to_value().unwrap();
        assert_eq!(value, serde_json::json!({"key": "value"}));
    }

    #[test]
    fn test_to_value_invalid_json() {
        let json = HazelcastJsonValue::from_string("not valid json");
        assert!(json.to_value().is_err());
    }
}
