//! Reads Compact fields out of a payload laid out by a [`Schema`].

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use super::schema::{FieldKind, FieldPosition, Schema};
use super::serializer::CompactStreamSerializer;
use super::writer::{OffsetWidth, NULL_OFFSET};
use super::CompactReader;
use crate::error::{HazelcastError, Result};
use crate::serialization::defaults::{
    read_big_decimal, read_local_date, read_local_date_time, read_local_time,
    read_offset_date_time,
};
use crate::serialization::{DataInput, ObjectDataInput, Value};

fn to_length(v: i32, what: &str) -> Result<usize> {
    usize::try_from(v)
        .map_err(|_| HazelcastError::Serialization(format!("negative compact {}: {}", what, v)))
}

fn read_offset(
    input: &mut ObjectDataInput<'_>,
    offsets_position: usize,
    index: usize,
    width: OffsetWidth,
) -> Result<Option<usize>> {
    let position = offsets_position + index * width.size();
    let offset = match width {
        OffsetWidth::Byte => {
            let v = input.read_byte_at(position)?;
            if i32::from(v) == NULL_OFFSET {
                return Ok(None);
            }
            usize::from(v as u8)
        }
        OffsetWidth::Short => {
            let v = input.read_short_at(position)?;
            if i32::from(v) == NULL_OFFSET {
                return Ok(None);
            }
            usize::from(v as u16)
        }
        OffsetWidth::Int => {
            let v = input.read_int_at(position)?;
            if v == NULL_OFFSET {
                return Ok(None);
            }
            to_length(v, "offset")?
        }
    };
    Ok(Some(offset))
}

fn read_array_of_variable<'a, T>(
    input: &mut ObjectDataInput<'a>,
    mut read_item: impl FnMut(&mut ObjectDataInput<'a>) -> Result<T>,
) -> Result<Vec<Option<T>>> {
    let data_length = to_length(input.read_int()?, "data length")?;
    let count = to_length(input.read_int()?, "item count")?;
    let data_start = input.position();
    let width = OffsetWidth::for_data_length(data_length);
    let offsets_position = data_start.saturating_add(data_length);
    let table_size = count.saturating_mul(width.size());
    let available = input.len().saturating_sub(offsets_position);
    if table_size > available {
        return Err(HazelcastError::BufferUnderflow {
            needed: table_size,
            remaining: available,
        });
    }

    let mut items = Vec::with_capacity(count);
    for index in 0..count {
        match read_offset(input, offsets_position, index, width)? {
            Some(offset) => {
                input.set_position(data_start + offset)?;
                items.push(Some(read_item(input)?));
            }
            None => items.push(None),
        }
    }
    Ok(items)
}

fn read_boolean_bits(input: &mut ObjectDataInput<'_>) -> Result<Vec<bool>> {
    let len = to_length(input.read_int()?, "array length")?;
    let packed = input.read_bytes(len.div_ceil(8))?;
    Ok((0..len).map(|i| ((packed[i / 8] >> (i % 8)) & 1) != 0).collect())
}

fn unexpected_kind(name: &str, expected: FieldKind, actual: FieldKind) -> HazelcastError {
    HazelcastError::Serialization(format!(
        "unexpected field kind '{}' for field '{}', expected {}",
        actual, name, expected
    ))
}

fn layout_error(name: &str, position: FieldPosition) -> HazelcastError {
    HazelcastError::Serialization(format!(
        "field '{}' has an unexpected layout: {:?}",
        name, position
    ))
}

fn null_value_error(name: &str, kind: FieldKind) -> HazelcastError {
    HazelcastError::Serialization(format!(
        "field '{}' of kind {} is null and cannot be read as a non-nullable value",
        name, kind
    ))
}

/// Reads Compact fields by name.
///
/// Construction parses the body header and leaves the input positioned past
/// the whole body; each field read seeks to the field and restores the
/// position.
pub struct DefaultCompactReader<'r, 'a> {
    serializer: &'r CompactStreamSerializer,
    input: &'r mut ObjectDataInput<'a>,
    schema: Arc<Schema>,
    data_start: usize,
    offsets_position: usize,
    offset_width: OffsetWidth,
    depth: usize,
}

impl<'r, 'a> DefaultCompactReader<'r, 'a> {
    pub(crate) fn new(
        serializer: &'r CompactStreamSerializer,
        input: &'r mut ObjectDataInput<'a>,
        schema: Arc<Schema>,
        depth: usize,
    ) -> Result<Self> {
        let var_fields = schema.number_var_size_fields();
        let (data_start, offsets_position, offset_width, final_position) = if var_fields > 0 {
            let data_length = to_length(input.read_int()?, "data length")?;
            let data_start = input.position();
            let offsets_position = data_start.saturating_add(data_length);
            let width = OffsetWidth::for_data_length(data_length);
            let final_position = offsets_position.saturating_add(var_fields * width.size());
            (data_start, offsets_position, width, final_position)
        } else {
            let data_start = input.position();
            let final_position = data_start + schema.fixed_size_fields_length();
            (data_start, data_start, OffsetWidth::Int, final_position)
        };
        input.set_position(final_position)?;
        Ok(Self {
            serializer,
            input,
            schema,
            data_start,
            offsets_position,
            offset_width,
            depth,
        })
    }

    fn describe(&self, name: &str) -> Result<(FieldKind, FieldPosition)> {
        self.schema
            .field(name)
            .map(|field| (field.kind(), field.position()))
            .ok_or_else(|| {
                HazelcastError::Serialization(format!(
                    "unknown field name '{}' for {}",
                    name, self.schema
                ))
            })
    }

    fn read_at<T>(
        &mut self,
        position: usize,
        read: impl FnOnce(&mut ObjectDataInput<'a>) -> Result<T>,
    ) -> Result<T> {
        let saved = self.input.position();
        self.input.set_position(position)?;
        let value = read(&mut *self.input);
        self.input.set_position(saved)?;
        value
    }

    fn read_fixed<T>(
        &mut self,
        name: &str,
        position: FieldPosition,
        read: impl FnOnce(&mut ObjectDataInput<'a>) -> Result<T>,
    ) -> Result<T> {
        match position {
            FieldPosition::Fixed { offset } => self.read_at(self.data_start + offset, read),
            other => Err(layout_error(name, other)),
        }
    }

    fn read_variable<T>(
        &mut self,
        name: &str,
        position: FieldPosition,
        read: impl FnOnce(&mut ObjectDataInput<'a>) -> Result<T>,
    ) -> Result<Option<T>> {
        let FieldPosition::Variable { index } = position else {
            return Err(layout_error(name, position));
        };
        match read_offset(self.input, self.offsets_position, index, self.offset_width)? {
            Some(offset) => self.read_at(self.data_start + offset, read).map(Some),
            None => Ok(None),
        }
    }

    fn read_checked<T>(
        &mut self,
        name: &str,
        expected: FieldKind,
        read: impl FnOnce(&mut ObjectDataInput<'a>) -> Result<T>,
    ) -> Result<Option<T>> {
        let (kind, position) = self.describe(name)?;
        if kind != expected {
            return Err(unexpected_kind(name, expected, kind));
        }
        self.read_variable(name, position, read)
    }

    fn read_bit(&mut self, name: &str, position: FieldPosition) -> Result<bool> {
        match position {
            FieldPosition::Bit { offset, bit } => {
                let byte = self.read_at(self.data_start + offset, |input| input.read_byte())?;
                Ok((((byte as u8) >> bit) & 1) != 0)
            }
            other => Err(layout_error(name, other)),
        }
    }
}

macro_rules! fixed_size_reads {
    ($($read:ident, $read_nullable:ident, $ty:ty, $kind:ident, $nullable:ident, $method:ident;)*) => {
        $(
            fn $read(&mut self, name: &str) -> Result<$ty> {
                let (kind, position) = self.describe(name)?;
                match kind {
                    FieldKind::$kind => self.read_fixed(name, position, |input| input.$method()),
                    FieldKind::$nullable => self
                        .read_variable(name, position, |input| input.$method())?
                        .ok_or_else(|| null_value_error(name, kind)),
                    other => Err(unexpected_kind(name, FieldKind::$kind, other)),
                }
            }

            fn $read_nullable(&mut self, name: &str) -> Result<Option<$ty>> {
                let (kind, position) = self.describe(name)?;
                match kind {
                    FieldKind::$kind => self
                        .read_fixed(name, position, |input| input.$method())
                        .map(Some),
                    FieldKind::$nullable => self.read_variable(name, position, |input| input.$method()),
                    other => Err(unexpected_kind(name, FieldKind::$nullable, other)),
                }
            }
        )*
    };
}

impl CompactReader for DefaultCompactReader<'_, '_> {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn field_kind(&self, name: &str) -> Option<FieldKind> {
        self.schema.field(name).map(|field| field.kind())
    }

    fn read_boolean(&mut self, name: &str) -> Result<bool> {
        let (kind, position) = self.describe(name)?;
        match kind {
            FieldKind::Boolean => self.read_bit(name, position),
            FieldKind::NullableBoolean => self
                .read_variable(name, position, |input| input.read_bool())?
                .ok_or_else(|| null_value_error(name, kind)),
            other => Err(unexpected_kind(name, FieldKind::Boolean, other)),
        }
    }

    fn read_nullable_boolean(&mut self, name: &str) -> Result<Option<bool>> {
        let (kind, position) = self.describe(name)?;
        match kind {
            FieldKind::Boolean => self.read_bit(name, position).map(Some),
            FieldKind::NullableBoolean => {
                self.read_variable(name, position, |input| input.read_bool())
            }
            other => Err(unexpected_kind(name, FieldKind::NullableBoolean, other)),
        }
    }

    fixed_size_reads! {
        read_int8, read_nullable_int8, i8, Int8, NullableInt8, read_byte;
        read_int16, read_nullable_int16, i16, Int16, NullableInt16, read_short;
        read_int32, read_nullable_int32, i32, Int32, NullableInt32, read_int;
        read_int64, read_nullable_int64, i64, Int64, NullableInt64, read_long;
        read_float32, read_nullable_float32, f32, Float32, NullableFloat32, read_float;
        read_float64, read_nullable_float64, f64, Float64, NullableFloat64, read_double;
    }

    fn read_string(&mut self, name: &str) -> Result<Option<String>> {
        self.read_checked(name, FieldKind::String, |input| input.read_string())
    }

    fn read_decimal(&mut self, name: &str) -> Result<Option<Decimal>> {
        self.read_checked(name, FieldKind::Decimal, |input| read_big_decimal(input))
    }

    fn read_time(&mut self, name: &str) -> Result<Option<NaiveTime>> {
        self.read_checked(name, FieldKind::Time, |input| read_local_time(input))
    }

    fn read_date(&mut self, name: &str) -> Result<Option<NaiveDate>> {
        self.read_checked(name, FieldKind::Date, |input| read_local_date(input))
    }

    fn read_timestamp(&mut self, name: &str) -> Result<Option<NaiveDateTime>> {
        self.read_checked(name, FieldKind::Timestamp, |input| read_local_date_time(input))
    }

    fn read_timestamp_with_timezone(&mut self, name: &str) -> Result<Option<DateTime<FixedOffset>>> {
        self.read_checked(name, FieldKind::TimestampWithTimezone, |input| {
            read_offset_date_time(input)
        })
    }

    fn read_compact_value(&mut self, name: &str) -> Result<Option<Value>> {
        let serializer = self.serializer;
        let depth = self.depth + 1;
        self.read_checked(name, FieldKind::Compact, |input| serializer.read_value(input, depth))
    }

    fn read_array_of_boolean(&mut self, name: &str) -> Result<Option<Vec<bool>>> {
        self.read_checked(name, FieldKind::ArrayOfBoolean, |input| read_boolean_bits(input))
    }

    fn read_array_of_int8(&mut self, name: &str) -> Result<Option<Vec<i8>>> {
        self.read_checked(name, FieldKind::ArrayOfInt8, |input| {
            input
                .read_byte_array()
                .map(|bytes| bytes.map(|bytes| bytes.into_iter().map(|b| b as i8).collect()))
        })
        .map(Option::flatten)
    }

    fn read_array_of_int16(&mut self, name: &str) -> Result<Option<Vec<i16>>> {
        self.read_checked(name, FieldKind::ArrayOfInt16, |input| input.read_short_array())
            .map(Option::flatten)
    }

    fn read_array_of_int32(&mut self, name: &str) -> Result<Option<Vec<i32>>> {
        self.read_checked(name, FieldKind::ArrayOfInt32, |input| input.read_int_array())
            .map(Option::flatten)
    }

    fn read_array_of_int64(&mut self, name: &str) -> Result<Option<Vec<i64>>> {
        self.read_checked(name, FieldKind::ArrayOfInt64, |input| input.read_long_array())
            .map(Option::flatten)
    }

    fn read_array_of_float32(&mut self, name: &str) -> Result<Option<Vec<f32>>> {
        self.read_checked(name, FieldKind::ArrayOfFloat32, |input| input.read_float_array())
            .map(Option::flatten)
    }

    fn read_array_of_float64(&mut self, name: &str) -> Result<Option<Vec<f64>>> {
        self.read_checked(name, FieldKind::ArrayOfFloat64, |input| input.read_double_array())
            .map(Option::flatten)
    }

    fn read_array_of_string(&mut self, name: &str) -> Result<Option<Vec<Option<String>>>> {
        self.read_checked(name, FieldKind::ArrayOfString, |input| {
            read_array_of_variable(input, |input| input.read_string())
        })
    }

    fn read_array_of_compact_values(&mut self, name: &str) -> Result<Option<Vec<Option<Value>>>> {
        let serializer = self.serializer;
        let depth = self.depth + 1;
        self.read_checked(name, FieldKind::ArrayOfCompact, |input| {
            read_array_of_variable(input, |input| serializer.read_value(input, depth))
        })
    }
}
