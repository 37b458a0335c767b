//! Compact serialization: schema-described records with a fingerprinted schema id.
//!
//! A Compact payload is the schema id followed by a body laid out by the
//! [`Schema`]. Schemas are not carried in the payload; they are shared out of
//! band through a [`SchemaService`].

mod generic_record;
mod reader;
mod schema;
mod serializer;
mod service;
mod writer;

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::{HazelcastError, Result};
use crate::serialization::Value;

pub use generic_record::{FieldValue, GenericRecord, GenericRecordBuilder};
pub use reader::DefaultCompactReader;
pub use schema::{FieldDescriptor, FieldKind, FieldPosition, Schema};
pub(crate) use serializer::CompactStreamSerializer;
pub use service::{InMemorySchemaService, SchemaService};
pub use writer::{DefaultCompactWriter, SchemaWriter};

/// Trait for reading Compact fields during deserialization.
///
/// Typed reads of an absent field fail; use [`field_kind`](Self::field_kind)
/// or the `*_or` variants to handle fields added by newer writers.
pub trait CompactReader {
    /// Returns the schema of the payload being read.
    fn schema(&self) -> &Schema;

    /// Returns the kind of the named field, or `None` if it is absent.
    fn field_kind(&self, name: &str) -> Option<FieldKind>;

    /// Returns true if the payload has the named field.
    fn has_field(&self, name: &str) -> bool {
        self.field_kind(name).is_some()
    }

    /// Reads a `BOOLEAN` field, also accepting a non-null `NULLABLE_BOOLEAN`.
    fn read_boolean(&mut self, name: &str) -> Result<bool>;

    /// Reads an `INT8` field.
    fn read_int8(&mut self, name: &str) -> Result<i8>;

    /// Reads an `INT16` field.
    fn read_int16(&mut self, name: &str) -> Result<i16>;

    /// Reads an `INT32` field.
    fn read_int32(&mut self, name: &str) -> Result<i32>;

    /// Reads an `INT64` field.
    fn read_int64(&mut self, name: &str) -> Result<i64>;

    /// Reads a `FLOAT32` field.
    fn read_float32(&mut self, name: &str) -> Result<f32>;

    /// Reads a `FLOAT64` field.
    fn read_float64(&mut self, name: &str) -> Result<f64>;

    /// Reads a `STRING` field.
    fn read_string(&mut self, name: &str) -> Result<Option<String>>;

    /// Reads a `DECIMAL` field.
    fn read_decimal(&mut self, name: &str) -> Result<Option<Decimal>>;

    /// Reads a `TIME` field.
    fn read_time(&mut self, name: &str) -> Result<Option<NaiveTime>>;

    /// Reads a `DATE` field.
    fn read_date(&mut self, name: &str) -> Result<Option<NaiveDate>>;

    /// Reads a `TIMESTAMP` field.
    fn read_timestamp(&mut self, name: &str) -> Result<Option<NaiveDateTime>>;

    /// Reads a `TIMESTAMP_WITH_TIMEZONE` field.
    fn read_timestamp_with_timezone(&mut self, name: &str) -> Result<Option<DateTime<FixedOffset>>>;

    /// Reads a `COMPACT` field.
    ///
    /// Registered types come back as [`Value::Object`], anything else as
    /// [`Value::Compact`].
    fn read_compact_value(&mut self, name: &str) -> Result<Option<Value>>;

    /// Reads an `ARRAY_OF_BOOLEAN` field.
    fn read_array_of_boolean(&mut self, name: &str) -> Result<Option<Vec<bool>>>;

    /// Reads an `ARRAY_OF_INT8` field.
    fn read_array_of_int8(&mut self, name: &str) -> Result<Option<Vec<i8>>>;

    /// Reads an `ARRAY_OF_INT16` field.
    fn read_array_of_int16(&mut self, name: &str) -> Result<Option<Vec<i16>>>;

    /// Reads an `ARRAY_OF_INT32` field.
    fn read_array_of_int32(&mut self, name: &str) -> Result<Option<Vec<i32>>>;

    /// Reads an `ARRAY_OF_INT64` field.
    fn read_array_of_int64(&mut self, name: &str) -> Result<Option<Vec<i64>>>;

    /// Reads an `ARRAY_OF_FLOAT32` field.
    fn read_array_of_float32(&mut self, name: &str) -> Result<Option<Vec<f32>>>;

    /// Reads an `ARRAY_OF_FLOAT64` field.
    fn read_array_of_float64(&mut self, name: &str) -> Result<Option<Vec<f64>>>;

    /// Reads an `ARRAY_OF_STRING` field.
    fn read_array_of_string(&mut self, name: &str) -> Result<Option<Vec<Option<String>>>>;

    /// Reads an `ARRAY_OF_COMPACT` field.
    fn read_array_of_compact_values(&mut self, name: &str) -> Result<Option<Vec<Option<Value>>>>;

    /// Reads a `NULLABLE_BOOLEAN` field, also accepting `BOOLEAN`.
    fn read_nullable_boolean(&mut self, name: &str) -> Result<Option<bool>>;

    /// Reads a `NULLABLE_INT8` field.
    fn read_nullable_int8(&mut self, name: &str) -> Result<Option<i8>>;

    /// Reads a `NULLABLE_INT16` field.
    fn read_nullable_int16(&mut self, name: &str) -> Result<Option<i16>>;

    /// Reads a `NULLABLE_INT32` field.
    fn read_nullable_int32(&mut self, name: &str) -> Result<Option<i32>>;

    /// Reads a `NULLABLE_INT64` field.
    fn read_nullable_int64(&mut self, name: &str) -> Result<Option<i64>>;

    /// Reads a `NULLABLE_FLOAT32` field.
    fn read_nullable_float32(&mut self, name: &str) -> Result<Option<f32>>;

    /// Reads a `NULLABLE_FLOAT64` field.
    fn read_nullable_float64(&mut self, name: &str) -> Result<Option<f64>>;

    /// Reads a boolean, or returns `default` if the field is absent or of another kind.
    fn read_boolean_or(&mut self, name: &str, default: bool) -> Result<bool> {
        match self.field_kind(name) {
            Some(FieldKind::Boolean) => self.read_boolean(name),
            _ => Ok(default),
        }
    }

    /// Reads an `INT8`, or returns `default`.
    fn read_int8_or(&mut self, name: &str, default: i8) -> Result<i8> {
        match self.field_kind(name) {
            Some(FieldKind::Int8) => self.read_int8(name),
            _ => Ok(default),
        }
    }

    /// Reads an `INT16`, or returns `default`.
    fn read_int16_or(&mut self, name: &str, default: i16) -> Result<i16> {
        match self.field_kind(name) {
            Some(FieldKind::Int16) => self.read_int16(name),
            _ => Ok(default),
        }
    }

    /// Reads an `INT32`, or returns `default`.
    fn read_int32_or(&mut self, name: &str, default: i32) -> Result<i32> {
        match self.field_kind(name) {
            Some(FieldKind::Int32) => self.read_int32(name),
            _ => Ok(default),
        }
    }

    /// Reads an `INT64`, or returns `default`.
    fn read_int64_or(&mut self, name: &str, default: i64) -> Result<i64> {
        match self.field_kind(name) {
            Some(FieldKind::Int64) => self.read_int64(name),
            _ => Ok(default),
        }
    }

    /// Reads a `FLOAT32`, or returns `default`.
    fn read_float32_or(&mut self, name: &str, default: f32) -> Result<f32> {
        match self.field_kind(name) {
            Some(FieldKind::Float32) => self.read_float32(name),
            _ => Ok(default),
        }
    }

    /// Reads a `FLOAT64`, or returns `default`.
    fn read_float64_or(&mut self, name: &str, default: f64) -> Result<f64> {
        match self.field_kind(name) {
            Some(FieldKind::Float64) => self.read_float64(name),
            _ => Ok(default),
        }
    }

    /// Reads a `STRING`, or returns `default`.
    fn read_string_or(&mut self, name: &str, default: Option<String>) -> Result<Option<String>> {
        match self.field_kind(name) {
            Some(FieldKind::String) => self.read_string(name),
            _ => Ok(default),
        }
    }
}

impl dyn CompactReader + '_ {
    /// Reads a nested object of a registered Compact type.
    pub fn read_compact<T: Compact>(&mut self, name: &str) -> Result<Option<T>> {
        self.read_compact_value(name)?.map(into_compact).transpose()
    }

    /// Reads an array of nested objects of a registered Compact type.
    pub fn read_array_of_compact<T: Compact>(&mut self, name: &str) -> Result<Option<Vec<Option<T>>>> {
        let Some(items) = self.read_array_of_compact_values(name)? else {
            return Ok(None);
        };
        items
            .into_iter()
            .map(|item| item.map(into_compact).transpose())
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}

fn into_compact<T: Compact>(value: Value) -> Result<T> {
    let mismatch = |found: &str| {
        HazelcastError::Serialization(format!(
            "expected a compact {}, found {}",
            T::type_name(),
            found
        ))
    };
    match value {
        Value::Object(object) => {
            let found = object.type_name();
            let shared = object
                .into_arc()
                .downcast::<T>()
                .map_err(|_| mismatch(found))?;
            Arc::try_unwrap(shared).map_err(|_| mismatch(found))
        }
        Value::Compact(record) => Err(HazelcastError::NoSerializer(format!(
            "compact type {} (read as a generic record)",
            record.type_name()
        ))),
        other => Err(mismatch(other.type_name())),
    }
}

/// Trait for writing Compact fields during serialization.
///
/// Every call adds one named field; a serializer must write the same fields
/// with the same kinds for every value of its type.
pub trait CompactWriter {
    /// Writes a `BOOLEAN` field.
    fn write_boolean(&mut self, name: &str, value: bool) -> Result<()>;

    /// Writes an `INT8` field.
    fn write_int8(&mut self, name: &str, value: i8) -> Result<()>;

    /// Writes an `INT16` field.
    fn write_int16(&mut self, name: &str, value: i16) -> Result<()>;

    /// Writes an `INT32` field.
    fn write_int32(&mut self, name: &str, value: i32) -> Result<()>;

    /// Writes an `INT64` field.
    fn write_int64(&mut self, name: &str, value: i64) -> Result<()>;

    /// Writes a `FLOAT32` field.
    fn write_float32(&mut self, name: &str, value: f32) -> Result<()>;

    /// Writes a `FLOAT64` field.
    fn write_float64(&mut self, name: &str, value: f64) -> Result<()>;

    /// Writes a `STRING` field.
    fn write_string(&mut self, name: &str, value: Option<&str>) -> Result<()>;

    /// Writes a `DECIMAL` field.
    fn write_decimal(&mut self, name: &str, value: Option<&Decimal>) -> Result<()>;

    /// Writes a `TIME` field.
    fn write_time(&mut self, name: &str, value: Option<&NaiveTime>) -> Result<()>;

    /// Writes a `DATE` field.
    fn write_date(&mut self, name: &str, value: Option<&NaiveDate>) -> Result<()>;

    /// Writes a `TIMESTAMP` field.
    fn write_timestamp(&mut self, name: &str, value: Option<&NaiveDateTime>) -> Result<()>;

    /// Writes a `TIMESTAMP_WITH_TIMEZONE` field.
    fn write_timestamp_with_timezone(
        &mut self,
        name: &str,
        value: Option<&DateTime<FixedOffset>>,
    ) -> Result<()>;

    /// Writes a `COMPACT` field holding a registered type or a [`GenericRecord`].
    fn write_compact_any(&mut self, name: &str, value: Option<&dyn Any>) -> Result<()>;

    /// Writes an `ARRAY_OF_BOOLEAN` field.
    fn write_array_of_boolean(&mut self, name: &str, value: Option<&[bool]>) -> Result<()>;

    /// Writes an `ARRAY_OF_INT8` field.
    fn write_array_of_int8(&mut self, name: &str, value: Option<&[i8]>) -> Result<()>;

    /// Writes an `ARRAY_OF_INT16` field.
    fn write_array_of_int16(&mut self, name: &str, value: Option<&[i16]>) -> Result<()>;

    /// Writes an `ARRAY_OF_INT32` field.
    fn write_array_of_int32(&mut self, name: &str, value: Option<&[i32]>) -> Result<()>;

    /// Writes an `ARRAY_OF_INT64` field.
    fn write_array_of_int64(&mut self, name: &str, value: Option<&[i64]>) -> Result<()>;

    /// Writes an `ARRAY_OF_FLOAT32` field.
    fn write_array_of_float32(&mut self, name: &str, value: Option<&[f32]>) -> Result<()>;

    /// Writes an `ARRAY_OF_FLOAT64` field.
    fn write_array_of_float64(&mut self, name: &str, value: Option<&[f64]>) -> Result<()>;

    /// Writes an `ARRAY_OF_STRING` field.
    fn write_array_of_string(&mut self, name: &str, value: Option<&[Option<String>]>) -> Result<()>;

    /// Writes an `ARRAY_OF_COMPACT` field. Items must all share one type.
    fn write_array_of_compact_any(
        &mut self,
        name: &str,
        value: Option<&[Option<&dyn Any>]>,
    ) -> Result<()>;

    /// Writes a `NULLABLE_BOOLEAN` field.
    fn write_nullable_boolean(&mut self, name: &str, value: Option<bool>) -> Result<()>;

    /// Writes a `NULLABLE_INT8` field.
    fn write_nullable_int8(&mut self, name: &str, value: Option<i8>) -> Result<()>;

    /// Writes a `NULLABLE_INT16` field.
    fn write_nullable_int16(&mut self, name: &str, value: Option<i16>) -> Result<()>;

    /// Writes a `NULLABLE_INT32` field.
    fn write_nullable_int32(&mut self, name: &str, value: Option<i32>) -> Result<()>;

    /// Writes a `NULLABLE_INT64` field.
    fn write_nullable_int64(&mut self, name: &str, value: Option<i64>) -> Result<()>;

    /// Writes a `NULLABLE_FLOAT32` field.
    fn write_nullable_float32(&mut self, name: &str, value: Option<f32>) -> Result<()>;

    /// Writes a `NULLABLE_FLOAT64` field.
    fn write_nullable_float64(&mut self, name: &str, value: Option<f64>) -> Result<()>;
}

impl dyn CompactWriter + '_ {
    /// Writes a nested object of a registered Compact type.
    pub fn write_compact<T: Compact>(&mut self, name: &str, value: Option<&T>) -> Result<()> {
        self.write_compact_any(name, value.map(|v| v as &dyn Any))
    }

    /// Writes an array of nested objects of a registered Compact type.
    pub fn write_array_of_compact<T: Compact>(&mut self, name: &str, value: Option<&[T]>) -> Result<()> {
        match value {
            Some(items) => {
                let items: Vec<Option<&dyn Any>> =
                    items.iter().map(|item| Some(item as &dyn Any)).collect();
                self.write_array_of_compact_any(name, Some(items.as_slice()))
            }
            None => self.write_array_of_compact_any(name, None),
        }
    }
}

/// A Rust type with a Compact representation.
///
/// ```
/// use hazelcast_serialization::serialization::compact::{Compact, CompactReader, CompactWriter};
/// use hazelcast_serialization::Result;
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Compact for Point {
///     fn type_name() -> &'static str {
///         "Point"
///     }
///
///     fn write(&self, writer: &mut dyn CompactWriter) -> Result<()> {
///         writer.write_int32("x", self.x)?;
///         writer.write_int32("y", self.y)
///     }
///
///     fn read(reader: &mut dyn CompactReader) -> Result<Self> {
///         Ok(Point {
///             x: reader.read_int32("x")?,
///             y: reader.read_int32("y")?,
///         })
///     }
/// }
/// ```
pub trait Compact: Sized + Send + Sync + 'static {
    /// The Compact type name, shared with other clients and the cluster.
    fn type_name() -> &'static str;

    /// Writes the fields of `self`.
    fn write(&self, writer: &mut dyn CompactWriter) -> Result<()>;

    /// Reads a value from its fields.
    fn read(reader: &mut dyn CompactReader) -> Result<Self>;
}

/// A type-erased Compact serializer, registered per Rust type.
pub trait CompactSerializer: Send + Sync {
    /// The Compact type name.
    fn type_name(&self) -> &str;

    /// The Rust type this serializer handles.
    fn rust_type(&self) -> TypeId;

    /// The Rust type's name, for diagnostics.
    fn rust_type_name(&self) -> &'static str;

    /// Writes `value`, which must be of [`rust_type`](Self::rust_type).
    fn write(&self, value: &dyn Any, writer: &mut dyn CompactWriter) -> Result<()>;

    /// Reads a value of [`rust_type`](Self::rust_type).
    fn read(&self, reader: &mut dyn CompactReader) -> Result<Arc<dyn Any + Send + Sync>>;
}

/// Adapts a [`Compact`] implementation to [`CompactSerializer`].
pub struct TypedCompactSerializer<T>(PhantomData<fn() -> T>);

impl<T: Compact> TypedCompactSerializer<T> {
    /// Creates the adapter.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Compact> Default for TypedCompactSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TypedCompactSerializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedCompactSerializer")
            .field(&std::any::type_name::<T>())
            .finish()
    }
}

impl<T: Compact> CompactSerializer for TypedCompactSerializer<T> {
    fn type_name(&self) -> &str {
        T::type_name()
    }

    fn rust_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn rust_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn write(&self, value: &dyn Any, writer: &mut dyn CompactWriter) -> Result<()> {
        let value = value.downcast_ref::<T>().ok_or_else(|| {
            HazelcastError::Serialization(format!(
                "compact serializer for {} cannot write another type",
                T::type_name()
            ))
        })?;
        value.write(writer)
    }

    fn read(&self, reader: &mut dyn CompactReader) -> Result<Arc<dyn Any + Send + Sync>> {
        Ok(Arc::new(T::read(reader)?))
    }
}

/// Returns the type-erased serializer for `T`.
pub fn compact_serializer<T: Compact>() -> Arc<dyn CompactSerializer> {
    Arc::new(TypedCompactSerializer::<T>::new())
}
