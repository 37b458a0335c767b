//! Error types for serialization operations.

use std::io;
use thiserror::Error;

use crate::serialization::compact::Schema;

/// The main error type for serialization and deserialization.
#[derive(Debug, Error)]
pub enum HazelcastError {
    /// Generic serialization/deserialization errors (malformed input, type mismatches).
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration errors (invalid settings, rejected registrations at startup).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Dispatch exhausted every candidate without finding a serializer.
    #[error("no suitable serializer for {0}")]
    NoSerializer(String),

    /// A container carried a type id nothing is registered for.
    #[error("no suitable deserializer for type id {0}")]
    NoDeserializer(i32),

    /// Two serializers claimed the same type key or the same serializer id.
    #[error("duplicate registration: {0}")]
    DuplicateRegistration(String),

    /// An array handed to dispatch contained an undefined element.
    #[error("undefined value in array cannot be serialized")]
    UndefinedInArray,

    /// A Portable field was written with a kind the reader cannot coerce.
    #[error("incompatible class change: {0}")]
    IncompatibleClassChange(String),

    /// No factory is registered for a factory id / class id pair.
    #[error("unknown factory: {0}")]
    UnknownFactory(String),

    /// A Compact schema was built locally but is not known to the schema service yet.
    #[error("schema {} of type {} is not replicated yet", .0.schema_id(), .0.type_name())]
    SchemaNotReplicated(Box<Schema>),

    /// A Compact payload referenced a fingerprint with no known schema.
    #[error("schema not found for id {0}")]
    SchemaNotFound(i64),

    /// A field name was written twice in one Portable or Compact write pass.
    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    /// A read went past the end of the input buffer.
    #[error("insufficient data: need {needed} bytes, have {remaining}")]
    BufferUnderflow {
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// I/O errors from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl HazelcastError {
    /// Returns true if the operation may succeed after an out-of-band schema
    /// replication round trip.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HazelcastError::SchemaNotReplicated(_) | HazelcastError::SchemaNotFound(_)
        )
    }
}

/// A specialized `Result` type for serialization operations.
pub type Result<T> = std::result::Result<T, HazelcastError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::compact::{FieldKind, Schema};

    #[test]
    fn test_serialization_error_display() {
        let err = HazelcastError::Serialization("failed to deserialize response".to_string());
        assert_eq!(
            err.to_string(),
            "serialization error: failed to deserialize response"
        );
    }

    #[test]
    fn test_configuration_error_display() {
        let err = HazelcastError::Configuration("custom serializer id must be >= 1".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: custom serializer id must be >= 1"
        );
    }

    #[test]
    fn test_no_deserializer_display() {
        let err = HazelcastError::NoDeserializer(-99);
        assert_eq!(err.to_string(), "no suitable deserializer for type id -99");
    }

    #[test]
    fn test_buffer_underflow_display() {
        let err = HazelcastError::BufferUnderflow {
            needed: 4,
            remaining: 1,
        };
        assert_eq!(err.to_string(), "insufficient data: need 4 bytes, have 1");
    }

    #[test]
    fn test_schema_not_replicated_is_retryable() {
        let schema = Schema::new("Point", vec![("x".to_string(), FieldKind::Int32)]).unwrap();
        let err = HazelcastError::SchemaNotReplicated(Box::new(schema));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("Point"));
        assert!(HazelcastError::SchemaNotFound(42).is_retryable());
    }

    #[test]
    fn test_fatal_errors_are_not_retryable() {
        assert!(!HazelcastError::UndefinedInArray.is_retryable());
        assert!(!HazelcastError::IncompatibleClassChange("x".into()).is_retryable());
        assert!(!HazelcastError::UnknownFactory("1".into()).is_retryable());
        assert!(!HazelcastError::NoDeserializer(7).is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        let err: HazelcastError = io_err.into();
        assert!(matches!(err, HazelcastError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HazelcastError>();
    }
}
