//! GenericRecord for schema-driven Compact access without a Rust type.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use super::schema::{FieldKind, Schema};
use super::{CompactReader, CompactWriter};
use crate::error::{HazelcastError, Result};
use crate::serialization::Value;

/// The value of one field of a [`GenericRecord`], tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum FieldValue {
    Boolean(bool),
    ArrayOfBoolean(Option<Vec<bool>>),
    Int8(i8),
    ArrayOfInt8(Option<Vec<i8>>),
    Int16(i16),
    ArrayOfInt16(Option<Vec<i16>>),
    Int32(i32),
    ArrayOfInt32(Option<Vec<i32>>),
    Int64(i64),
    ArrayOfInt64(Option<Vec<i64>>),
    Float32(f32),
    ArrayOfFloat32(Option<Vec<f32>>),
    Float64(f64),
    ArrayOfFloat64(Option<Vec<f64>>),
    String(Option<String>),
    ArrayOfString(Option<Vec<Option<String>>>),
    Decimal(Option<Decimal>),
    Time(Option<NaiveTime>),
    Date(Option<NaiveDate>),
    Timestamp(Option<NaiveDateTime>),
    TimestampWithTimezone(Option<DateTime<FixedOffset>>),
    /// A nested record, or a registered type read back as [`Value::Object`].
    Compact(Option<Value>),
    ArrayOfCompact(Option<Vec<Option<Value>>>),
    NullableBoolean(Option<bool>),
    NullableInt8(Option<i8>),
    NullableInt16(Option<i16>),
    NullableInt32(Option<i32>),
    NullableInt64(Option<i64>),
    NullableFloat32(Option<f32>),
    NullableFloat64(Option<f64>),
}

impl FieldValue {
    /// Returns the schema kind this value is stored as.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Boolean(_) => FieldKind::Boolean,
            FieldValue::ArrayOfBoolean(_) => FieldKind::ArrayOfBoolean,
            FieldValue::Int8(_) => FieldKind::Int8,
            FieldValue::ArrayOfInt8(_) => FieldKind::ArrayOfInt8,
            FieldValue::Int16(_) => FieldKind::Int16,
            FieldValue::ArrayOfInt16(_) => FieldKind::ArrayOfInt16,
            FieldValue::Int32(_) => FieldKind::Int32,
            FieldValue::ArrayOfInt32(_) => FieldKind::ArrayOfInt32,
            FieldValue::Int64(_) => FieldKind::Int64,
            FieldValue::ArrayOfInt64(_) => FieldKind::ArrayOfInt64,
            FieldValue::Float32(_) => FieldKind::Float32,
            FieldValue::ArrayOfFloat32(_) => FieldKind::ArrayOfFloat32,
            FieldValue::Float64(_) => FieldKind::Float64,
            FieldValue::ArrayOfFloat64(_) => FieldKind::ArrayOfFloat64,
            FieldValue::String(_) => FieldKind::String,
            FieldValue::ArrayOfString(_) => FieldKind::ArrayOfString,
            FieldValue::Decimal(_) => FieldKind::Decimal,
            FieldValue::Time(_) => FieldKind::Time,
            FieldValue::Date(_) => FieldKind::Date,
            FieldValue::Timestamp(_) => FieldKind::Timestamp,
            FieldValue::TimestampWithTimezone(_) => FieldKind::TimestampWithTimezone,
            FieldValue::Compact(_) => FieldKind::Compact,
            FieldValue::ArrayOfCompact(_) => FieldKind::ArrayOfCompact,
            FieldValue::NullableBoolean(_) => FieldKind::NullableBoolean,
            FieldValue::NullableInt8(_) => FieldKind::NullableInt8,
            FieldValue::NullableInt16(_) => FieldKind::NullableInt16,
            FieldValue::NullableInt32(_) => FieldKind::NullableInt32,
            FieldValue::NullableInt64(_) => FieldKind::NullableInt64,
            FieldValue::NullableFloat32(_) => FieldKind::NullableFloat32,
            FieldValue::NullableFloat64(_) => FieldKind::NullableFloat64,
        }
    }
}

fn compact_as_any(value: &Value) -> Result<&dyn Any> {
    match value {
        Value::Compact(record) => Ok(&**record as &dyn Any),
        Value::Object(object) => Ok(object.as_any() as &dyn Any),
        other => Err(HazelcastError::Serialization(format!(
            "{} cannot be written as a nested compact value",
            other.type_name()
        ))),
    }
}

/// A Compact record held as its schema plus typed field values.
///
/// Payloads whose type name has no registered serializer are read into a
/// `GenericRecord`; records built with [`GenericRecordBuilder`] serialize
/// without any registration.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericRecord {
    schema: Arc<Schema>,
    values: HashMap<String, FieldValue>,
}

macro_rules! typed_getters {
    ($($(#[$doc:meta])* $method:ident => $variant:ident, $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $method(&self, name: &str) -> Result<$ty> {
                match self.field(name)? {
                    FieldValue::$variant(v) => Ok(v.clone()),
                    other => Err(self.kind_mismatch(name, FieldKind::$variant, other.kind())),
                }
            }
        )*
    };
}

impl GenericRecord {
    /// Starts building a record of `type_name`.
    pub fn builder(type_name: impl Into<String>) -> GenericRecordBuilder {
        GenericRecordBuilder::new(type_name)
    }

    /// Returns the record's schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn schema_arc(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// Returns the Compact type name.
    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    /// Returns the field names in schema order.
    pub fn field_names(&self) -> Vec<&str> {
        self.schema.fields().iter().map(|f| f.name()).collect()
    }

    /// Returns the kind of the named field, or `None` if it is absent.
    pub fn field_kind(&self, name: &str) -> Option<FieldKind> {
        self.schema.field(name).map(|f| f.kind())
    }

    /// Returns true if the record has the named field.
    pub fn has_field(&self, name: &str) -> bool {
        self.schema.has_field(name)
    }

    /// Returns the value of the named field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    typed_getters! {
        /// Returns a `BOOLEAN` field.
        get_boolean => Boolean, bool;
        /// Returns an `INT8` field.
        get_int8 => Int8, i8;
        /// Returns an `INT16` field.
        get_int16 => Int16, i16;
        /// Returns an `INT32` field.
        get_int32 => Int32, i32;
        /// Returns an `INT64` field.
        get_int64 => Int64, i64;
        /// Returns a `FLOAT32` field.
        get_float32 => Float32, f32;
        /// Returns a `FLOAT64` field.
        get_float64 => Float64, f64;
        /// Returns a `STRING` field.
        get_string => String, Option<String>;
        /// Returns a `NULLABLE_INT32` field.
        get_nullable_int32 => NullableInt32, Option<i32>;
        /// Returns a `NULLABLE_INT64` field.
        get_nullable_int64 => NullableInt64, Option<i64>;
        /// Returns a `COMPACT` field.
        get_compact => Compact, Option<Value>;
    }

    fn field(&self, name: &str) -> Result<&FieldValue> {
        self.values.get(name).ok_or_else(|| {
            HazelcastError::Serialization(format!(
                "unknown field name '{}' for {}",
                name,
                self.schema.type_name()
            ))
        })
    }

    fn kind_mismatch(&self, name: &str, expected: FieldKind, actual: FieldKind) -> HazelcastError {
        HazelcastError::Serialization(format!(
            "field '{}' of {} is {}, not {}",
            name,
            self.schema.type_name(),
            actual,
            expected
        ))
    }

    /// Writes every field through `writer`, in schema order.
    pub(crate) fn write_fields(&self, writer: &mut dyn CompactWriter) -> Result<()> {
        for field in self.schema.fields() {
            let name = field.name();
            match self.field(name)? {
                FieldValue::Boolean(v) => writer.write_boolean(name, *v)?,
                FieldValue::ArrayOfBoolean(v) => writer.write_array_of_boolean(name, v.as_deref())?,
                FieldValue::Int8(v) => writer.write_int8(name, *v)?,
                FieldValue::ArrayOfInt8(v) => writer.write_array_of_int8(name, v.as_deref())?,
                FieldValue::Int16(v) => writer.write_int16(name, *v)?,
                FieldValue::ArrayOfInt16(v) => writer.write_array_of_int16(name, v.as_deref())?,
                FieldValue::Int32(v) => writer.write_int32(name, *v)?,
                FieldValue::ArrayOfInt32(v) => writer.write_array_of_int32(name, v.as_deref())?,
                FieldValue::Int64(v) => writer.write_int64(name, *v)?,
                FieldValue::ArrayOfInt64(v) => writer.write_array_of_int64(name, v.as_deref())?,
                FieldValue::Float32(v) => writer.write_float32(name, *v)?,
                FieldValue::ArrayOfFloat32(v) => writer.write_array_of_float32(name, v.as_deref())?,
                FieldValue::Float64(v) => writer.write_float64(name, *v)?,
                FieldValue::ArrayOfFloat64(v) => writer.write_array_of_float64(name, v.as_deref())?,
                FieldValue::String(v) => writer.write_string(name, v.as_deref())?,
                FieldValue::ArrayOfString(v) => writer.write_array_of_string(name, v.as_deref())?,
                FieldValue::Decimal(v) => writer.write_decimal(name, v.as_ref())?,
                FieldValue::Time(v) => writer.write_time(name, v.as_ref())?,
                FieldValue::Date(v) => writer.write_date(name, v.as_ref())?,
                FieldValue::Timestamp(v) => writer.write_timestamp(name, v.as_ref())?,
                FieldValue::TimestampWithTimezone(v) => {
                    writer.write_timestamp_with_timezone(name, v.as_ref())?
                }
                FieldValue::Compact(v) => {
                    let nested = v.as_ref().map(compact_as_any).transpose()?;
                    writer.write_compact_any(name, nested)?
                }
                FieldValue::ArrayOfCompact(None) => writer.write_array_of_compact_any(name, None)?,
                FieldValue::ArrayOfCompact(Some(items)) => {
                    let items = items
                        .iter()
                        .map(|item| item.as_ref().map(compact_as_any).transpose())
                        .collect::<Result<Vec<_>>>()?;
                    writer.write_array_of_compact_any(name, Some(items.as_slice()))?
                }
                FieldValue::NullableBoolean(v) => writer.write_nullable_boolean(name, *v)?,
                FieldValue::NullableInt8(v) => writer.write_nullable_int8(name, *v)?,
                FieldValue::NullableInt16(v) => writer.write_nullable_int16(name, *v)?,
                FieldValue::NullableInt32(v) => writer.write_nullable_int32(name, *v)?,
                FieldValue::NullableInt64(v) => writer.write_nullable_int64(name, *v)?,
                FieldValue::NullableFloat32(v) => writer.write_nullable_float32(name, *v)?,
                FieldValue::NullableFloat64(v) => writer.write_nullable_float64(name, *v)?,
            }
        }
        Ok(())
    }

    /// Reads every field of `schema` through `reader`.
    pub(crate) fn read_from(schema: Arc<Schema>, reader: &mut dyn CompactReader) -> Result<Self> {
        let mut values = HashMap::with_capacity(schema.field_count());
        for field in schema.fields() {
            let name = field.name();
            let value = match field.kind() {
                FieldKind::Boolean => FieldValue::Boolean(reader.read_boolean(name)?),
                FieldKind::ArrayOfBoolean => FieldValue::ArrayOfBoolean(reader.read_array_of_boolean(name)?),
                FieldKind::Int8 => FieldValue::Int8(reader.read_int8(name)?),
                FieldKind::ArrayOfInt8 => FieldValue::ArrayOfInt8(reader.read_array_of_int8(name)?),
                FieldKind::Int16 => FieldValue::Int16(reader.read_int16(name)?),
                FieldKind::ArrayOfInt16 => FieldValue::ArrayOfInt16(reader.read_array_of_int16(name)?),
                FieldKind::Int32 => FieldValue::Int32(reader.read_int32(name)?),
                FieldKind::ArrayOfInt32 => FieldValue::ArrayOfInt32(reader.read_array_of_int32(name)?),
                FieldKind::Int64 => FieldValue::Int64(reader.read_int64(name)?),
                FieldKind::ArrayOfInt64 => FieldValue::ArrayOfInt64(reader.read_array_of_int64(name)?),
                FieldKind::Float32 => FieldValue::Float32(reader.read_float32(name)?),
                FieldKind::ArrayOfFloat32 => FieldValue::ArrayOfFloat32(reader.read_array_of_float32(name)?),
                FieldKind::Float64 => FieldValue::Float64(reader.read_float64(name)?),
                FieldKind::ArrayOfFloat64 => FieldValue::ArrayOfFloat64(reader.read_array_of_float64(name)?),
                FieldKind::String => FieldValue::String(reader.read_string(name)?),
                FieldKind::ArrayOfString => FieldValue::ArrayOfString(reader.read_array_of_string(name)?),
                FieldKind::Decimal => FieldValue::Decimal(reader.read_decimal(name)?),
                FieldKind::Time => FieldValue::Time(reader.read_time(name)?),
                FieldKind::Date => FieldValue::Date(reader.read_date(name)?),
                FieldKind::Timestamp => FieldValue::Timestamp(reader.read_timestamp(name)?),
                FieldKind::TimestampWithTimezone => {
                    FieldValue::TimestampWithTimezone(reader.read_timestamp_with_timezone(name)?)
                }
                FieldKind::Compact => FieldValue::Compact(reader.read_compact_value(name)?),
                FieldKind::ArrayOfCompact => {
                    FieldValue::ArrayOfCompact(reader.read_array_of_compact_values(name)?)
                }
                FieldKind::NullableBoolean => FieldValue::NullableBoolean(reader.read_nullable_boolean(name)?),
                FieldKind::NullableInt8 => FieldValue::NullableInt8(reader.read_nullable_int8(name)?),
                FieldKind::NullableInt16 => FieldValue::NullableInt16(reader.read_nullable_int16(name)?),
                FieldKind::NullableInt32 => FieldValue::NullableInt32(reader.read_nullable_int32(name)?),
                FieldKind::NullableInt64 => FieldValue::NullableInt64(reader.read_nullable_int64(name)?),
                FieldKind::NullableFloat32 => FieldValue::NullableFloat32(reader.read_nullable_float32(name)?),
                FieldKind::NullableFloat64 => FieldValue::NullableFloat64(reader.read_nullable_float64(name)?),
            };
            values.insert(name.to_string(), value);
        }
        Ok(Self { schema, values })
    }
}

macro_rules! builder_setters {
    ($($(#[$doc:meta])* $method:ident => $variant:ident, $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $method(self, name: impl Into<String>, value: $ty) -> Self {
                self.set(name, FieldValue::$variant(value))
            }
        )*
    };
}

/// Assembles a [`GenericRecord`] field by field.
///
/// ```
/// use hazelcast_serialization::serialization::compact::GenericRecord;
///
/// let record = GenericRecord::builder("Point")
///     .set_int32("x", 3)
///     .set_int32("y", 4)
///     .build()
///     .unwrap();
/// assert_eq!(record.get_int32("y").unwrap(), 4);
/// ```
#[derive(Debug)]
pub struct GenericRecordBuilder {
    type_name: String,
    fields: Vec<(String, FieldValue)>,
    error: Option<HazelcastError>,
}

impl GenericRecordBuilder {
    /// Creates an empty builder for `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
            error: None,
        }
    }

    /// Sets a field to an arbitrary value. Repeated names fail at [`build`](Self::build).
    pub fn set(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        let name = name.into();
        if self.fields.iter().any(|(existing, _)| *existing == name) {
            self.error
                .get_or_insert(HazelcastError::DuplicateField(name));
        } else {
            self.fields.push((name, value));
        }
        self
    }

    builder_setters! {
        /// Sets a `BOOLEAN` field.
        set_boolean => Boolean, bool;
        /// Sets an `INT8` field.
        set_int8 => Int8, i8;
        /// Sets an `INT16` field.
        set_int16 => Int16, i16;
        /// Sets an `INT32` field.
        set_int32 => Int32, i32;
        /// Sets an `INT64` field.
        set_int64 => Int64, i64;
        /// Sets a `FLOAT32` field.
        set_float32 => Float32, f32;
        /// Sets a `FLOAT64` field.
        set_float64 => Float64, f64;
        /// Sets a `DECIMAL` field.
        set_decimal => Decimal, Option<Decimal>;
        /// Sets a `TIMESTAMP` field.
        set_timestamp => Timestamp, Option<NaiveDateTime>;
        /// Sets a `NULLABLE_INT32` field.
        set_nullable_int32 => NullableInt32, Option<i32>;
        /// Sets a `NULLABLE_INT64` field.
        set_nullable_int64 => NullableInt64, Option<i64>;
        /// Sets an `ARRAY_OF_INT32` field.
        set_array_of_int32 => ArrayOfInt32, Option<Vec<i32>>;
        /// Sets an `ARRAY_OF_STRING` field.
        set_array_of_string => ArrayOfString, Option<Vec<Option<String>>>;
    }

    /// Sets a `STRING` field.
    pub fn set_string(self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.set(name, FieldValue::String(value.map(str::to_string)))
    }

    /// Sets a `COMPACT` field to a nested record.
    pub fn set_generic_record(self, name: impl Into<String>, value: Option<GenericRecord>) -> Self {
        self.set(
            name,
            FieldValue::Compact(value.map(|record| Value::Compact(Arc::new(record)))),
        )
    }

    /// Sets an `ARRAY_OF_COMPACT` field to nested records.
    pub fn set_array_of_generic_record(
        self,
        name: impl Into<String>,
        value: Option<Vec<Option<GenericRecord>>>,
    ) -> Self {
        let items = value.map(|items| {
            items
                .into_iter()
                .map(|item| item.map(|record| Value::Compact(Arc::new(record))))
                .collect()
        });
        self.set(name, FieldValue::ArrayOfCompact(items))
    }

    /// Builds the record, computing its schema from the fields set.
    pub fn build(self) -> Result<GenericRecord> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let schema = Schema::new(
            self.type_name,
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), value.kind()))
                .collect(),
        )?;
        Ok(GenericRecord {
            schema: Arc::new(schema),
            values: self.fields.into_iter().collect(),
        })
    }
}
