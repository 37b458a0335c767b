//! Wire-compatible serialization engine for Hazelcast clients.
//!
//! Values are dispatched to a serializer by a fixed precedence order and
//! framed in a [`Data`] container the cluster understands: built-in kinds,
//! identified data serializables, versioned portables, schema-described
//! Compact records, custom and global serializers, and a JSON fallback.
//!
//! # Example
//!
//! ```
//! use hazelcast_serialization::{SerializationConfig, SerializationService, Value};
//!
//! let config = SerializationConfig::builder().build()?;
//! let service = SerializationService::new(config)?;
//!
//! let data = service.to_data(&Value::IntArray(vec![1, 2, 3]))?;
//! assert_eq!(service.to_object(&data)?, Value::IntArray(vec![1, 2, 3]));
//! # Ok::<(), hazelcast_serialization::HazelcastError>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod partition;
pub mod serialization;

pub use config::{ConfigError, SerializationConfig, SerializationConfigBuilder};
pub use error::{HazelcastError, Result};
pub use partition::{PartitionAware, PartitioningStrategy};
pub use serialization::{
    ByteOrder, Data, DataInput, DataOutput, NumberType, Object, ObjectDataInput, ObjectDataOutput,
    SerializationService, Value,
};
