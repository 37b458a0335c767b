//! Compact writers: the payload writer and the schema recorder.

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use super::schema::{FieldDescriptor, FieldKind, FieldPosition, Schema};
use super::serializer::CompactStreamSerializer;
use super::{CompactWriter, GenericRecord};
use crate::error::{HazelcastError, Result};
use crate::serialization::data_output::length_prefix;
use crate::serialization::defaults::{
    write_big_decimal, write_local_date, write_local_date_time, write_local_time,
    write_offset_date_time,
};
use crate::serialization::{DataOutput, ObjectDataOutput};

/// Offset table entry marking a null variable-size value.
pub(super) const NULL_OFFSET: i32 = -1;

/// Width of the entries of a variable-size offset table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum OffsetWidth {
    Byte,
    Short,
    Int,
}

impl OffsetWidth {
    /// Picks the narrowest width able to address `data_length` bytes.
    pub(super) fn for_data_length(data_length: usize) -> Self {
        if data_length < u8::MAX as usize {
            OffsetWidth::Byte
        } else if data_length < u16::MAX as usize {
            OffsetWidth::Short
        } else {
            OffsetWidth::Int
        }
    }

    pub(super) fn size(self) -> usize {
        match self {
            OffsetWidth::Byte => 1,
            OffsetWidth::Short => 2,
            OffsetWidth::Int => 4,
        }
    }
}

fn write_offsets(output: &mut ObjectDataOutput<'_>, data_length: i32, offsets: &[i32]) -> Result<()> {
    match OffsetWidth::for_data_length(data_length as usize) {
        OffsetWidth::Byte => offsets.iter().try_for_each(|o| output.write_byte(*o as i8)),
        OffsetWidth::Short => offsets.iter().try_for_each(|o| output.write_short(*o as i16)),
        OffsetWidth::Int => offsets.iter().try_for_each(|o| output.write_int(*o)),
    }
}

fn relative_offset(position: usize, start: usize) -> Result<i32> {
    i32::try_from(position - start).map_err(|_| {
        HazelcastError::Serialization("compact payload exceeds the maximum offset".to_string())
    })
}

/// Writes an array whose items have no fixed width: a placeholder for the
/// data length, the item count, the items, then an offset table.
fn write_array_of_variable<'s, T>(
    output: &mut ObjectDataOutput<'s>,
    items: &[Option<T>],
    mut write_item: impl FnMut(&mut ObjectDataOutput<'s>, &T) -> Result<()>,
) -> Result<()> {
    let data_length_position = output.position();
    output.write_zero_bytes(4);
    output.write_int(length_prefix(items.len())?)?;
    let data_start = output.position();
    let mut offsets = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Some(item) => {
                offsets.push(relative_offset(output.position(), data_start)?);
                write_item(output, item)?;
            }
            None => offsets.push(NULL_OFFSET),
        }
    }
    let data_length = relative_offset(output.position(), data_start)?;
    output.pwrite_int(data_length_position, data_length)?;
    write_offsets(output, data_length, &offsets)
}

fn write_boolean_bits(output: &mut ObjectDataOutput<'_>, values: &[bool]) -> Result<()> {
    output.write_int(length_prefix(values.len())?)?;
    let mut packed = vec![0u8; values.len().div_ceil(8)];
    for (i, value) in values.iter().enumerate() {
        if *value {
            packed[i / 8] |= 1 << (i % 8);
        }
    }
    output.write_bytes(&packed)
}

fn ensure_single_type(items: &[Option<&dyn Any>]) -> Result<()> {
    let mut first: Option<(TypeId, Option<i64>)> = None;
    for item in items.iter().flatten() {
        let key = (
            Any::type_id(*item),
            item.downcast_ref::<GenericRecord>()
                .map(|r| r.schema().schema_id()),
        );
        match first {
            None => first = Some(key),
            Some(expected) if expected != key => {
                return Err(HazelcastError::Serialization(
                    "an array of compact objects must not mix item types".to_string(),
                ))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn lookup<'a>(schema: &'a Schema, name: &str, kind: FieldKind) -> Result<&'a FieldDescriptor> {
    let field = schema.field(name).ok_or_else(|| {
        HazelcastError::Serialization(format!("invalid field name: '{}' for {}", name, schema))
    })?;
    if field.kind() != kind {
        return Err(HazelcastError::Serialization(format!(
            "invalid field type: '{}' is {} in {}, written as {}",
            name,
            field.kind(),
            schema.type_name(),
            kind
        )));
    }
    Ok(field)
}

fn layout_error(name: &str, position: FieldPosition) -> HazelcastError {
    HazelcastError::Serialization(format!(
        "field '{}' has an unexpected layout: {:?}",
        name, position
    ))
}

/// Writes Compact fields into the layout of a [`Schema`].
///
/// The fixed-size region is reserved on construction and patched in place;
/// variable-size values are appended and their offsets recorded for
/// [`end`](Self::end).
pub struct DefaultCompactWriter<'w, 's> {
    serializer: &'w CompactStreamSerializer,
    output: &'w mut ObjectDataOutput<'s>,
    schema: Arc<Schema>,
    data_start: usize,
    field_offsets: Vec<i32>,
    written: HashSet<String>,
}

impl<'w, 's> DefaultCompactWriter<'w, 's> {
    pub(crate) fn new(
        serializer: &'w CompactStreamSerializer,
        output: &'w mut ObjectDataOutput<'s>,
        schema: Arc<Schema>,
    ) -> Self {
        let data_start = if schema.number_var_size_fields() > 0 {
            let data_start = output.position() + 4;
            output.write_zero_bytes(schema.fixed_size_fields_length() + 4);
            data_start
        } else {
            let data_start = output.position();
            output.write_zero_bytes(schema.fixed_size_fields_length());
            data_start
        };
        let field_offsets = vec![NULL_OFFSET; schema.number_var_size_fields()];
        Self {
            serializer,
            output,
            schema,
            data_start,
            field_offsets,
            written: HashSet::new(),
        }
    }

    /// Returns the schema being written.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Writes the offset table and patches the data length.
    pub fn end(&mut self) -> Result<()> {
        if self.schema.number_var_size_fields() == 0 {
            return Ok(());
        }
        let data_length = relative_offset(self.output.position(), self.data_start)?;
        write_offsets(&mut *self.output, data_length, &self.field_offsets)?;
        self.output.pwrite_int(self.data_start - 4, data_length)
    }

    /// Resolves a field's layout, rejecting a second write of the same field.
    fn field_position(&mut self, name: &str, kind: FieldKind) -> Result<FieldPosition> {
        let position = lookup(&self.schema, name, kind)?.position();
        if !self.written.insert(name.to_string()) {
            return Err(HazelcastError::DuplicateField(format!(
                "{} in compact type {}",
                name,
                self.schema.type_name()
            )));
        }
        Ok(position)
    }

    fn fixed_position(&mut self, name: &str, kind: FieldKind) -> Result<usize> {
        match self.field_position(name, kind)? {
            FieldPosition::Fixed { offset } => Ok(self.data_start + offset),
            other => Err(layout_error(name, other)),
        }
    }

    fn write_variable<T>(
        &mut self,
        name: &str,
        kind: FieldKind,
        value: Option<T>,
        write: impl FnOnce(&mut ObjectDataOutput<'s>, T) -> Result<()>,
    ) -> Result<()> {
        let index = match self.field_position(name, kind)? {
            FieldPosition::Variable { index } => index,
            other => return Err(layout_error(name, other)),
        };
        match value {
            None => self.field_offsets[index] = NULL_OFFSET,
            Some(value) => {
                self.field_offsets[index] = relative_offset(self.output.position(), self.data_start)?;
                write(&mut *self.output, value)?;
            }
        }
        Ok(())
    }
}

impl CompactWriter for DefaultCompactWriter<'_, '_> {
    fn write_boolean(&mut self, name: &str, value: bool) -> Result<()> {
        match self.field_position(name, FieldKind::Boolean)? {
            FieldPosition::Bit { offset, bit } => {
                self.output.pwrite_bool_bit(self.data_start + offset, bit, value)
            }
            other => Err(layout_error(name, other)),
        }
    }

    fn write_int8(&mut self, name: &str, value: i8) -> Result<()> {
        let position = self.fixed_position(name, FieldKind::Int8)?;
        self.output.pwrite_byte(position, value)
    }

    fn write_int16(&mut self, name: &str, value: i16) -> Result<()> {
        let position = self.fixed_position(name, FieldKind::Int16)?;
        self.output.pwrite_short(position, value)
    }

    fn write_int32(&mut self, name: &str, value: i32) -> Result<()> {
        let position = self.fixed_position(name, FieldKind::Int32)?;
        self.output.pwrite_int(position, value)
    }

    fn write_int64(&mut self, name: &str, value: i64) -> Result<()> {
        let position = self.fixed_position(name, FieldKind::Int64)?;
        self.output.pwrite_long(position, value)
    }

    fn write_float32(&mut self, name: &str, value: f32) -> Result<()> {
        let position = self.fixed_position(name, FieldKind::Float32)?;
        self.output.pwrite_float(position, value)
    }

    fn write_float64(&mut self, name: &str, value: f64) -> Result<()> {
        let position = self.fixed_position(name, FieldKind::Float64)?;
        self.output.pwrite_double(position, value)
    }

    fn write_string(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        self.write_variable(name, FieldKind::String, value, |out, v| out.write_string(v))
    }

    fn write_decimal(&mut self, name: &str, value: Option<&Decimal>) -> Result<()> {
        self.write_variable(name, FieldKind::Decimal, value, |out, v| write_big_decimal(out, v))
    }

    fn write_time(&mut self, name: &str, value: Option<&NaiveTime>) -> Result<()> {
        self.write_variable(name, FieldKind::Time, value, |out, v| write_local_time(out, v))
    }

    fn write_date(&mut self, name: &str, value: Option<&NaiveDate>) -> Result<()> {
        self.write_variable(name, FieldKind::Date, value, |out, v| write_local_date(out, v))
    }

    fn write_timestamp(&mut self, name: &str, value: Option<&NaiveDateTime>) -> Result<()> {
        self.write_variable(name, FieldKind::Timestamp, value, |out, v| {
            write_local_date_time(out, v)
        })
    }

    fn write_timestamp_with_timezone(
        &mut self,
        name: &str,
        value: Option<&DateTime<FixedOffset>>,
    ) -> Result<()> {
        self.write_variable(name, FieldKind::TimestampWithTimezone, value, |out, v| {
            write_offset_date_time(out, v)
        })
    }

    fn write_compact_any(&mut self, name: &str, value: Option<&dyn Any>) -> Result<()> {
        let serializer = self.serializer;
        self.write_variable(name, FieldKind::Compact, value, |out, v| {
            serializer.write_value(out, v)
        })
    }

    fn write_array_of_boolean(&mut self, name: &str, value: Option<&[bool]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfBoolean, value, |out, v| {
            write_boolean_bits(out, v)
        })
    }

    fn write_array_of_int8(&mut self, name: &str, value: Option<&[i8]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfInt8, value, |out, v| {
            let bytes: Vec<u8> = v.iter().map(|b| *b as u8).collect();
            out.write_byte_array(Some(bytes.as_slice()))
        })
    }

    fn write_array_of_int16(&mut self, name: &str, value: Option<&[i16]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfInt16, value, |out, v| {
            out.write_short_array(Some(v))
        })
    }

    fn write_array_of_int32(&mut self, name: &str, value: Option<&[i32]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfInt32, value, |out, v| {
            out.write_int_array(Some(v))
        })
    }

    fn write_array_of_int64(&mut self, name: &str, value: Option<&[i64]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfInt64, value, |out, v| {
            out.write_long_array(Some(v))
        })
    }

    fn write_array_of_float32(&mut self, name: &str, value: Option<&[f32]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfFloat32, value, |out, v| {
            out.write_float_array(Some(v))
        })
    }

    fn write_array_of_float64(&mut self, name: &str, value: Option<&[f64]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfFloat64, value, |out, v| {
            out.write_double_array(Some(v))
        })
    }

    fn write_array_of_string(&mut self, name: &str, value: Option<&[Option<String>]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfString, value, |out, items| {
            write_array_of_variable(out, items, |out, item| out.write_string(item))
        })
    }

    fn write_array_of_compact_any(
        &mut self,
        name: &str,
        value: Option<&[Option<&dyn Any>]>,
    ) -> Result<()> {
        let serializer = self.serializer;
        self.write_variable(name, FieldKind::ArrayOfCompact, value, |out, items| {
            ensure_single_type(items)?;
            write_array_of_variable(out, items, |out, item| serializer.write_value(out, *item))
        })
    }

    fn write_nullable_boolean(&mut self, name: &str, value: Option<bool>) -> Result<()> {
        self.write_variable(name, FieldKind::NullableBoolean, value, |out, v| out.write_bool(v))
    }

    fn write_nullable_int8(&mut self, name: &str, value: Option<i8>) -> Result<()> {
        self.write_variable(name, FieldKind::NullableInt8, value, |out, v| out.write_byte(v))
    }

    fn write_nullable_int16(&mut self, name: &str, value: Option<i16>) -> Result<()> {
        self.write_variable(name, FieldKind::NullableInt16, value, |out, v| out.write_short(v))
    }

    fn write_nullable_int32(&mut self, name: &str, value: Option<i32>) -> Result<()> {
        self.write_variable(name, FieldKind::NullableInt32, value, |out, v| out.write_int(v))
    }

    fn write_nullable_int64(&mut self, name: &str, value: Option<i64>) -> Result<()> {
        self.write_variable(name, FieldKind::NullableInt64, value, |out, v| out.write_long(v))
    }

    fn write_nullable_float32(&mut self, name: &str, value: Option<f32>) -> Result<()> {
        self.write_variable(name, FieldKind::NullableFloat32, value, |out, v| out.write_float(v))
    }

    fn write_nullable_float64(&mut self, name: &str, value: Option<f64>) -> Result<()> {
        self.write_variable(name, FieldKind::NullableFloat64, value, |out, v| out.write_double(v))
    }
}

/// Records the field names and kinds a serializer writes, producing its [`Schema`].
#[derive(Debug)]
pub struct SchemaWriter {
    type_name: String,
    fields: Vec<(String, FieldKind)>,
    names: HashSet<String>,
}

impl SchemaWriter {
    /// Creates a recorder for `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Builds the schema of everything recorded so far.
    pub fn build(self) -> Result<Schema> {
        Schema::new(self.type_name, self.fields)
    }

    fn add_field(&mut self, name: &str, kind: FieldKind) -> Result<()> {
        if !self.names.insert(name.to_string()) {
            return Err(HazelcastError::DuplicateField(format!(
                "{} in compact type {}",
                name, self.type_name
            )));
        }
        self.fields.push((name.to_string(), kind));
        Ok(())
    }
}

impl CompactWriter for SchemaWriter {
    fn write_boolean(&mut self, name: &str, _value: bool) -> Result<()> {
        self.add_field(name, FieldKind::Boolean)
    }

    fn write_int8(&mut self, name: &str, _value: i8) -> Result<()> {
        self.add_field(name, FieldKind::Int8)
    }

    fn write_int16(&mut self, name: &str, _value: i16) -> Result<()> {
        self.add_field(name, FieldKind::Int16)
    }

    fn write_int32(&mut self, name: &str, _value: i32) -> Result<()> {
        self.add_field(name, FieldKind::Int32)
    }

    fn write_int64(&mut self, name: &str, _value: i64) -> Result<()> {
        self.add_field(name, FieldKind::Int64)
    }

    fn write_float32(&mut self, name: &str, _value: f32) -> Result<()> {
        self.add_field(name, FieldKind::Float32)
    }

    fn write_float64(&mut self, name: &str, _value: f64) -> Result<()> {
        self.add_field(name, FieldKind::Float64)
    }

    fn write_string(&mut self, name: &str, _value: Option<&str>) -> Result<()> {
        self.add_field(name, FieldKind::String)
    }

    fn write_decimal(&mut self, name: &str, _value: Option<&Decimal>) -> Result<()> {
        self.add_field(name, FieldKind::Decimal)
    }

    fn write_time(&mut self, name: &str, _value: Option<&NaiveTime>) -> Result<()> {
        self.add_field(name, FieldKind::Time)
    }

    fn write_date(&mut self, name: &str, _value: Option<&NaiveDate>) -> Result<()> {
        self.add_field(name, FieldKind::Date)
    }

    fn write_timestamp(&mut self, name: &str, _value: Option<&NaiveDateTime>) -> Result<()> {
        self.add_field(name, FieldKind::Timestamp)
    }

    fn write_timestamp_with_timezone(
        &mut self,
        name: &str,
        _value: Option<&DateTime<FixedOffset>>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::TimestampWithTimezone)
    }

    fn write_compact_any(&mut self, name: &str, _value: Option<&dyn Any>) -> Result<()> {
        self.add_field(name, FieldKind::Compact)
    }

    fn write_array_of_boolean(&mut self, name: &str, _value: Option<&[bool]>) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfBoolean)
    }

    fn write_array_of_int8(&mut self, name: &str, _value: Option<&[i8]>) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfInt8)
    }

    fn write_array_of_int16(&mut self, name: &str, _value: Option<&[i16]>) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfInt16)
    }

    fn write_array_of_int32(&mut self, name: &str, _value: Option<&[i32]>) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfInt32)
    }

    fn write_array_of_int64(&mut self, name: &str, _value: Option<&[i64]>) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfInt64)
    }

    fn write_array_of_float32(&mut self, name: &str, _value: Option<&[f32]>) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfFloat32)
    }

    fn write_array_of_float64(&mut self, name: &str, _value: Option<&[f64]>) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfFloat64)
    }

    fn write_array_of_string(&mut self, name: &str, _value: Option<&[Option<String>]>) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfString)
    }

    fn write_array_of_compact_any(
        &mut self,
        name: &str,
        _value: Option<&[Option<&dyn Any>]>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfCompact)
    }

    fn write_nullable_boolean(&mut self, name: &str, _value: Option<bool>) -> Result<()> {
        self.add_field(name, FieldKind::NullableBoolean)
    }

    fn write_nullable_int8(&mut self, name: &str, _value: Option<i8>) -> Result<()> {
        self.add_field(name, FieldKind::NullableInt8)
    }

    fn write_nullable_int16(&mut self, name: &str, _value: Option<i16>) -> Result<()> {
        self.add_field(name, FieldKind::NullableInt16)
    }

    fn write_nullable_int32(&mut self, name: &str, _value: Option<i32>) -> Result<()> {
        self.add_field(name, FieldKind::NullableInt32)
    }

    fn write_nullable_int64(&mut self, name: &str, _value: Option<i64>) -> Result<()> {
        self.add_field(name, FieldKind::NullableInt64)
    }

    fn write_nullable_float32(&mut self, name: &str, _value: Option<f32>) -> Result<()> {
        self.add_field(name, FieldKind::NullableFloat32)
    }

    fn write_nullable_float64(&mut self, name: &str, _value: Option<f64>) -> Result<()> {
        self.add_field(name, FieldKind::NullableFloat64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_width_thresholds() {
        assert_eq!(OffsetWidth::for_data_length(0), OffsetWidth::Byte);
        assert_eq!(OffsetWidth::for_data_length(254), OffsetWidth::Byte);
        assert_eq!(OffsetWidth::for_data_length(255), OffsetWidth::Short);
        assert_eq!(OffsetWidth::for_data_length(65534), OffsetWidth::Short);
        assert_eq!(OffsetWidth::for_data_length(65535), OffsetWidth::Int);
    }

    #[test]
    fn test_schema_writer_records_fields() {
        let mut writer = SchemaWriter::new("Employee");
        writer.write_int64("id", 1).unwrap();
        writer.write_string("name", None).unwrap();
        writer.write_nullable_boolean("active", Some(true)).unwrap();
        let schema = writer.build().unwrap();

        assert_eq!(schema.type_name(), "Employee");
        assert_eq!(schema.field("id").unwrap().kind(), FieldKind::Int64);
        assert_eq!(schema.field("name").unwrap().kind(), FieldKind::String);
        assert_eq!(
            schema.field("active").unwrap().kind(),
            FieldKind::NullableBoolean
        );
    }

    #[test]
    fn test_schema_writer_rejects_duplicates() {
        let mut writer = SchemaWriter::new("Employee");
        writer.write_int32("id", 1).unwrap();
        assert!(matches!(
            writer.write_int64("id", 1),
            Err(HazelcastError::DuplicateField(_))
        ));
    }

    #[test]
    fn test_boolean_bits() {
        let mut output = ObjectDataOutput::new();
        write_boolean_bits(&mut output, &[true, false, true, false, false, false, false, false, true])
            .unwrap();
        assert_eq!(output.as_bytes(), &[0, 0, 0, 9, 0b0000_0101, 0b0000_0001]);
    }

    #[test]
    fn test_array_of_variable_layout() {
        let mut output = ObjectDataOutput::new();
        let items = vec![Some("ab".to_string()), None, Some(String::new())];
        write_array_of_variable(&mut output, &items, |out, item| out.write_string(item)).unwrap();
        assert_eq!(
            output.as_bytes(),
            &[
                0, 0, 0, 10, // data length
                0, 0, 0, 3, // item count
                0, 0, 0, 2, b'a', b'b', // "ab"
                0, 0, 0, 0, // ""
                0, 0xff, 6, // byte offsets, null in the middle
            ]
        );
    }

    #[test]
    fn test_mixed_item_types_rejected() {
        let a = 1i32;
        let b = "x".to_string();
        let items = [Some(&a as &dyn Any), None, Some(&b as &dyn Any)];
        assert!(ensure_single_type(&items).is_err());
        let same = [Some(&a as &dyn Any), Some(&a as &dyn Any)];
        assert!(ensure_single_type(&same).is_ok());
    }
}
