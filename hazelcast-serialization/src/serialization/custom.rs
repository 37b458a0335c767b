//! Application supplied serializers.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::serialization::registry::Serializer;
use crate::serialization::{DataInput, DataOutput, ObjectDataInput, ObjectDataOutput, Value};

/// A serializer the application registers under its own type id.
///
/// The same trait backs the global serializer, which receives every value no
/// earlier dispatch step claimed.
///
/// # Example
///
/// ```
/// use hazelcast_serialization::serialization::{CustomSerializer, DataInput, DataOutput, Value};
/// use hazelcast_serialization::{HazelcastError, Result};
///
/// struct Celsius(f64);
///
/// struct CelsiusSerializer;
///
/// impl CustomSerializer for CelsiusSerializer {
///     fn id(&self) -> i32 {
///         10
///     }
///
///     fn write(&self, output: &mut dyn DataOutput, value: &Value) -> Result<()> {
///         let celsius = value
///             .downcast_ref::<Celsius>()
///             .ok_or_else(|| HazelcastError::Serialization("expected Celsius".into()))?;
///         output.write_double(celsius.0)
///     }
///
///     fn read(&self, input: &mut dyn DataInput) -> Result<Value> {
///         Ok(Value::object(Celsius(input.read_double()?)))
///     }
/// }
/// ```
pub trait CustomSerializer: Send + Sync {
    /// The wire type id; must be at least 1.
    fn id(&self) -> i32;

    /// Writes `value` to `output`.
    fn write(&self, output: &mut dyn DataOutput, value: &Value) -> Result<()>;

    /// Reads one value from `input`.
    fn read(&self, input: &mut dyn DataInput) -> Result<Value>;
}

/// Marks a type that names the custom serializer it is written with.
///
/// Wrap instances with [`Object::custom`](crate::serialization::Object::custom).
pub trait CustomSerializable: Any + Send + Sync {
    /// The id of the custom serializer for this value.
    fn custom_id(&self) -> i32;
}

/// Adapts an application serializer to the registry's serializer trait.
pub(crate) struct CustomSerializerAdapter {
    inner: Arc<dyn CustomSerializer>,
}

impl CustomSerializerAdapter {
    pub(crate) fn new(inner: Arc<dyn CustomSerializer>) -> Self {
        Self { inner }
    }
}

impl fmt::Debug for CustomSerializerAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomSerializerAdapter")
            .field("id", &self.inner.id())
            .finish()
    }
}

impl Serializer for CustomSerializerAdapter {
    fn id(&self) -> i32 {
        self.inner.id()
    }

    fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
        self.inner.write(output, value)
    }

    fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
        self.inner.read(input)
    }
}
