//! Built-in serializers for primitives, arrays, date/time and big numbers.

use std::sync::Arc;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{HazelcastError, Result};
use crate::serialization::constants::*;
use crate::serialization::registry::{BuiltinKind, Serializer, SerializerRegistry, TypeKey};
use crate::serialization::{DataInput, DataOutput, ObjectDataInput, ObjectDataOutput, Value};

/// Largest scale a decimal can carry.
const MAX_DECIMAL_SCALE: i32 = 28;

fn mismatch(expected: &str, value: &Value) -> HazelcastError {
    HazelcastError::Serialization(format!("expected {}, got {}", expected, value.type_name()))
}

fn invalid(what: &str) -> HazelcastError {
    HazelcastError::Serialization(format!("invalid {}", what))
}

/// Serializer for the null value; writes nothing.
#[derive(Debug)]
pub(crate) struct NullSerializer;

impl Serializer for NullSerializer {
    fn id(&self) -> i32 {
        CONSTANT_TYPE_NULL
    }

    fn write(&self, _output: &mut ObjectDataOutput<'_>, _value: &Value) -> Result<()> {
        Ok(())
    }

    fn read(&self, _input: &mut ObjectDataInput<'_>) -> Result<Value> {
        Ok(Value::Null)
    }
}

macro_rules! scalar_serializer {
    ($name:ident, $id:expr, $variant:ident, $accessor:ident, $write:ident, $read:ident) => {
        #[derive(Debug)]
        pub(crate) struct $name;

        impl Serializer for $name {
            fn id(&self) -> i32 {
                $id
            }

            fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
                let v = value
                    .$accessor()
                    .ok_or_else(|| mismatch(stringify!($variant), value))?;
                output.$write(v)
            }

            fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
                Ok(Value::$variant(input.$read()?))
            }
        }
    };
}

scalar_serializer!(BooleanSerializer, CONSTANT_TYPE_BOOLEAN, Bool, as_bool, write_bool, read_bool);
scalar_serializer!(ByteSerializer, CONSTANT_TYPE_BYTE, Byte, as_byte, write_byte, read_byte);
scalar_serializer!(CharSerializer, CONSTANT_TYPE_CHAR, Char, as_char, write_char, read_char);
scalar_serializer!(ShortSerializer, CONSTANT_TYPE_SHORT, Short, as_short, write_short, read_short);
scalar_serializer!(IntegerSerializer, CONSTANT_TYPE_INTEGER, Int, as_int, write_int, read_int);
scalar_serializer!(LongSerializer, CONSTANT_TYPE_LONG, Long, as_long, write_long, read_long);
scalar_serializer!(FloatSerializer, CONSTANT_TYPE_FLOAT, Float, as_float, write_float, read_float);
scalar_serializer!(DoubleSerializer, CONSTANT_TYPE_DOUBLE, Double, as_double, write_double, read_double);

/// Serializer for strings; a null string reads back as [`Value::Null`].
#[derive(Debug)]
pub(crate) struct StringSerializer;

impl Serializer for StringSerializer {
    fn id(&self) -> i32 {
        CONSTANT_TYPE_STRING
    }

    fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
        let s = value.as_str().ok_or_else(|| mismatch("String", value))?;
        output.write_string(s)
    }

    fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
        Ok(input
            .read_nullable_string()?
            .map_or(Value::Null, Value::String))
    }
}

macro_rules! array_serializer {
    ($name:ident, $id:expr, $variant:ident, $elem:ty, $convert:expr, $write:ident, $read:ident) => {
        #[derive(Debug)]
        pub(crate) struct $name;

        impl Serializer for $name {
            fn id(&self) -> i32 {
                $id
            }

            fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
                match value {
                    Value::$variant(items) => output.$write(Some(&items[..])),
                    Value::Array(items) => {
                        let convert: fn(&Value) -> Option<$elem> = $convert;
                        let converted = items
                            .iter()
                            .map(|item| {
                                convert(item).ok_or_else(|| mismatch(stringify!($elem), item))
                            })
                            .collect::<Result<Vec<$elem>>>()?;
                        output.$write(Some(&converted[..]))
                    }
                    other => Err(mismatch(stringify!($variant), other)),
                }
            }

            fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
                Ok(input.$read()?.map_or(Value::Null, Value::$variant))
            }
        }
    };
}

array_serializer!(BooleanArraySerializer, CONSTANT_TYPE_BOOLEAN_ARRAY, BoolArray, bool, |v| v.as_bool(), write_bool_array, read_bool_array);
array_serializer!(ByteArraySerializer, CONSTANT_TYPE_BYTE_ARRAY, ByteArray, u8, |v| v.as_byte().map(|b| b as u8), write_byte_array, read_byte_array);
array_serializer!(CharArraySerializer, CONSTANT_TYPE_CHAR_ARRAY, CharArray, char, |v| v.as_char(), write_char_array, read_char_array);
array_serializer!(ShortArraySerializer, CONSTANT_TYPE_SHORT_ARRAY, ShortArray, i16, |v| v.as_short(), write_short_array, read_short_array);
array_serializer!(IntegerArraySerializer, CONSTANT_TYPE_INTEGER_ARRAY, IntArray, i32, |v| v.as_int(), write_int_array, read_int_array);
array_serializer!(LongArraySerializer, CONSTANT_TYPE_LONG_ARRAY, LongArray, i64, |v| v.as_long(), write_long_array, read_long_array);
array_serializer!(FloatArraySerializer, CONSTANT_TYPE_FLOAT_ARRAY, FloatArray, f32, |v| v.as_float(), write_float_array, read_float_array);
array_serializer!(DoubleArraySerializer, CONSTANT_TYPE_DOUBLE_ARRAY, DoubleArray, f64, |v| v.as_double(), write_double_array, read_double_array);
array_serializer!(StringArraySerializer, CONSTANT_TYPE_STRING_ARRAY, StringArray, String, |v| v.as_str().map(str::to_owned), write_string_array, read_string_array);

#[derive(Debug)]
pub(crate) struct UuidSerializer;

impl Serializer for UuidSerializer {
    fn id(&self) -> i32 {
        CONSTANT_TYPE_UUID
    }

    fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
        let Value::Uuid(uuid) = value else {
            return Err(mismatch("Uuid", value));
        };
        let (msb, lsb) = uuid.as_u64_pair();
        output.write_long(msb as i64)?;
        output.write_long(lsb as i64)
    }

    fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
        let msb = input.read_long()? as u64;
        let lsb = input.read_long()? as u64;
        Ok(Value::Uuid(Uuid::from_u64_pair(msb, lsb)))
    }
}

#[derive(Debug)]
pub(crate) struct DateSerializer;

impl Serializer for DateSerializer {
    fn id(&self) -> i32 {
        JAVA_DEFAULT_TYPE_DATE
    }

    fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
        let Value::Date(date) = value else {
            return Err(mismatch("Date", value));
        };
        output.write_long(date.timestamp_millis())
    }

    fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
        let millis = input.read_long()?;
        let date = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| invalid("epoch millis"))?;
        Ok(Value::Date(date))
    }
}

pub(crate) fn write_local_date(output: &mut dyn DataOutput, date: &NaiveDate) -> Result<()> {
    output.write_int(date.year())?;
    output.write_byte(date.month() as i8)?;
    output.write_byte(date.day() as i8)
}

pub(crate) fn read_local_date(input: &mut dyn DataInput) -> Result<NaiveDate> {
    let year = input.read_int()?;
    let month = input.read_byte()?;
    let day = input.read_byte()?;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32).ok_or_else(|| invalid("local date"))
}

pub(crate) fn write_local_time(output: &mut dyn DataOutput, time: &NaiveTime) -> Result<()> {
    output.write_byte(time.hour() as i8)?;
    output.write_byte(time.minute() as i8)?;
    output.write_byte(time.second() as i8)?;
    output.write_int(time.nanosecond() as i32)
}

pub(crate) fn read_local_time(input: &mut dyn DataInput) -> Result<NaiveTime> {
    let hour = input.read_byte()?;
    let minute = input.read_byte()?;
    let second = input.read_byte()?;
    let nano = input.read_int()?;
    NaiveTime::from_hms_nano_opt(hour as u32, minute as u32, second as u32, nano as u32)
        .ok_or_else(|| invalid("local time"))
}

pub(crate) fn write_local_date_time(
    output: &mut dyn DataOutput,
    date_time: &NaiveDateTime,
) -> Result<()> {
    write_local_date(output, &date_time.date())?;
    write_local_time(output, &date_time.time())
}

pub(crate) fn read_local_date_time(input: &mut dyn DataInput) -> Result<NaiveDateTime> {
    let date = read_local_date(input)?;
    let time = read_local_time(input)?;
    Ok(date.and_time(time))
}

pub(crate) fn write_offset_date_time(
    output: &mut dyn DataOutput,
    date_time: &DateTime<FixedOffset>,
) -> Result<()> {
    write_local_date_time(output, &date_time.naive_local())?;
    output.write_int(date_time.offset().local_minus_utc())
}

pub(crate) fn read_offset_date_time(input: &mut dyn DataInput) -> Result<DateTime<FixedOffset>> {
    let local = read_local_date_time(input)?;
    let offset_seconds = input.read_int()?;
    let offset = FixedOffset::east_opt(offset_seconds).ok_or_else(|| invalid("zone offset"))?;
    offset
        .from_local_datetime(&local)
        .single()
        .ok_or_else(|| invalid("offset date-time"))
}

macro_rules! temporal_serializer {
    ($name:ident, $id:expr, $variant:ident, $write:ident, $read:ident) => {
        #[derive(Debug)]
        pub(crate) struct $name;

        impl Serializer for $name {
            fn id(&self) -> i32 {
                $id
            }

            fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
                let Value::$variant(v) = value else {
                    return Err(mismatch(stringify!($variant), value));
                };
                $write(output, v)
            }

            fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
                Ok(Value::$variant($read(input)?))
            }
        }
    };
}

temporal_serializer!(LocalDateSerializer, JAVA_DEFAULT_TYPE_LOCAL_DATE, LocalDate, write_local_date, read_local_date);
temporal_serializer!(LocalTimeSerializer, JAVA_DEFAULT_TYPE_LOCAL_TIME, LocalTime, write_local_time, read_local_time);
temporal_serializer!(LocalDateTimeSerializer, JAVA_DEFAULT_TYPE_LOCAL_DATE_TIME, LocalDateTime, write_local_date_time, read_local_date_time);
temporal_serializer!(OffsetDateTimeSerializer, JAVA_DEFAULT_TYPE_OFFSET_DATE_TIME, OffsetDateTime, write_offset_date_time, read_offset_date_time);

/// Minimal two's-complement big-endian bytes, as a big integer is written.
pub(crate) fn big_integer_to_bytes(v: i128) -> Vec<u8> {
    let bytes = v.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let (head, next) = (bytes[start], bytes[start + 1]);
        let redundant = (head == 0x00 && next & 0x80 == 0) || (head == 0xFF && next & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

pub(crate) fn big_integer_from_bytes(bytes: &[u8]) -> Result<i128> {
    if bytes.is_empty() {
        return Err(invalid("big integer: zero length"));
    }
    if bytes.len() > 16 {
        return Err(HazelcastError::Serialization(format!(
            "big integer of {} bytes does not fit in 128 bits",
            bytes.len()
        )));
    }
    let fill = if bytes[0] & 0x80 != 0 { 0xFF } else { 0x00 };
    let mut buf = [fill; 16];
    buf[16 - bytes.len()..].copy_from_slice(bytes);
    Ok(i128::from_be_bytes(buf))
}

pub(crate) fn write_big_decimal(output: &mut dyn DataOutput, v: &Decimal) -> Result<()> {
    output.write_byte_array(Some(big_integer_to_bytes(v.mantissa()).as_slice()))?;
    output.write_int(v.scale() as i32)
}

pub(crate) fn read_big_decimal(input: &mut dyn DataInput) -> Result<Decimal> {
    let bytes = input
        .read_byte_array()?
        .ok_or_else(|| invalid("big decimal: null unscaled value"))?;
    let unscaled = big_integer_from_bytes(&bytes)?;
    let scale = input.read_int()?;
    if !(0..=MAX_DECIMAL_SCALE).contains(&scale) {
        return Err(HazelcastError::Serialization(format!(
            "big decimal scale {} is outside 0..={}",
            scale, MAX_DECIMAL_SCALE
        )));
    }
    Decimal::try_from_i128_with_scale(unscaled, scale as u32)
        .map_err(|e| HazelcastError::Serialization(format!("big decimal out of range: {}", e)))
}

#[derive(Debug)]
pub(crate) struct BigIntegerSerializer;

impl Serializer for BigIntegerSerializer {
    fn id(&self) -> i32 {
        JAVA_DEFAULT_TYPE_BIG_INTEGER
    }

    fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
        let Value::BigInteger(v) = value else {
            return Err(mismatch("BigInteger", value));
        };
        output.write_byte_array(Some(big_integer_to_bytes(*v).as_slice()))
    }

    fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
        let bytes = input
            .read_byte_array()?
            .ok_or_else(|| invalid("big integer: null"))?;
        Ok(Value::BigInteger(big_integer_from_bytes(&bytes)?))
    }
}

#[derive(Debug)]
pub(crate) struct BigDecimalSerializer;

impl Serializer for BigDecimalSerializer {
    fn id(&self) -> i32 {
        JAVA_DEFAULT_TYPE_BIG_DECIMAL
    }

    fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
        let Value::BigDecimal(v) = value else {
            return Err(mismatch("BigDecimal", value));
        };
        write_big_decimal(output, v)
    }

    fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
        Ok(Value::BigDecimal(read_big_decimal(input)?))
    }
}

#[derive(Debug)]
pub(crate) struct JavaClassSerializer;

impl Serializer for JavaClassSerializer {
    fn id(&self) -> i32 {
        JAVA_DEFAULT_TYPE_CLASS
    }

    fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
        let Value::JavaClass(name) = value else {
            return Err(mismatch("JavaClass", value));
        };
        output.write_string(name)
    }

    fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
        Ok(Value::JavaClass(input.read_string()?))
    }
}

/// Size-prefixed sequence of nested objects.
///
/// Array lists, linked lists and object arrays share the layout and differ
/// only in type id and in the variant they read into.
#[derive(Debug)]
pub(crate) struct ObjectListSerializer {
    id: i32,
    as_array: bool,
}

impl ObjectListSerializer {
    pub(crate) fn java_array() -> Self {
        Self {
            id: JAVA_DEFAULT_TYPE_ARRAY,
            as_array: true,
        }
    }

    pub(crate) fn array_list() -> Self {
        Self {
            id: JAVA_DEFAULT_TYPE_ARRAY_LIST,
            as_array: false,
        }
    }

    pub(crate) fn linked_list() -> Self {
        Self {
            id: JAVA_DEFAULT_TYPE_LINKED_LIST,
            as_array: false,
        }
    }
}

impl Serializer for ObjectListSerializer {
    fn id(&self) -> i32 {
        self.id
    }

    fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
        let items = match value {
            Value::List(items) | Value::Array(items) => items,
            other => return Err(mismatch("List", other)),
        };
        output.write_int(crate::serialization::data_output::length_prefix(items.len())?)?;
        for item in items {
            output.write_object(item)?;
        }
        Ok(())
    }

    fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
        let size = input.read_int()?;
        if size == NULL_ARRAY_LENGTH {
            return Ok(Value::Null);
        }
        if size < 0 {
            return Err(invalid("list size"));
        }
        let mut items = Vec::with_capacity((size as usize).min(input.remaining()));
        for _ in 0..size {
            items.push(input.read_object()?);
        }
        Ok(if self.as_array {
            Value::Array(items)
        } else {
            Value::List(items)
        })
    }
}

/// Registers every built-in serializer pair.
pub(crate) fn register_defaults(registry: &mut SerializerRegistry) -> Result<()> {
    fn pair(
        registry: &mut SerializerRegistry,
        kind: BuiltinKind,
        scalar: impl Serializer + 'static,
        array: Option<Arc<dyn Serializer>>,
    ) -> Result<()> {
        registry.register(TypeKey::Builtin(kind), Arc::new(scalar), array)
    }

    pair(registry, BuiltinKind::Null, NullSerializer, None)?;
    pair(registry, BuiltinKind::Bool, BooleanSerializer, Some(Arc::new(BooleanArraySerializer)))?;
    pair(registry, BuiltinKind::Byte, ByteSerializer, Some(Arc::new(ByteArraySerializer)))?;
    pair(registry, BuiltinKind::Char, CharSerializer, Some(Arc::new(CharArraySerializer)))?;
    pair(registry, BuiltinKind::Short, ShortSerializer, Some(Arc::new(ShortArraySerializer)))?;
    pair(registry, BuiltinKind::Int, IntegerSerializer, Some(Arc::new(IntegerArraySerializer)))?;
    pair(registry, BuiltinKind::Long, LongSerializer, Some(Arc::new(LongArraySerializer)))?;
    pair(registry, BuiltinKind::Float, FloatSerializer, Some(Arc::new(FloatArraySerializer)))?;
    pair(registry, BuiltinKind::Double, DoubleSerializer, Some(Arc::new(DoubleArraySerializer)))?;
    pair(registry, BuiltinKind::String, StringSerializer, Some(Arc::new(StringArraySerializer)))?;
    pair(registry, BuiltinKind::Uuid, UuidSerializer, None)?;
    pair(registry, BuiltinKind::Date, DateSerializer, None)?;
    pair(registry, BuiltinKind::LocalDate, LocalDateSerializer, None)?;
    pair(registry, BuiltinKind::LocalTime, LocalTimeSerializer, None)?;
    pair(registry, BuiltinKind::LocalDateTime, LocalDateTimeSerializer, None)?;
    pair(registry, BuiltinKind::OffsetDateTime, OffsetDateTimeSerializer, None)?;
    pair(registry, BuiltinKind::BigInteger, BigIntegerSerializer, None)?;
    pair(registry, BuiltinKind::BigDecimal, BigDecimalSerializer, None)?;
    pair(registry, BuiltinKind::JavaClass, JavaClassSerializer, None)?;
    pair(registry, BuiltinKind::JavaArray, ObjectListSerializer::java_array(), None)?;
    pair(registry, BuiltinKind::ArrayList, ObjectListSerializer::array_list(), None)?;
    pair(registry, BuiltinKind::LinkedList, ObjectListSerializer::linked_list(), None)
}

/// The built-in kind a value is written as, ignoring the untyped number and
/// array variants which depend on configuration.
pub(crate) fn builtin_kind(value: &Value) -> Option<BuiltinKind> {
    Some(match value {
        Value::Null => BuiltinKind::Null,
        Value::Bool(_) => BuiltinKind::Bool,
        Value::Byte(_) => BuiltinKind::Byte,
        Value::Char(_) => BuiltinKind::Char,
        Value::Short(_) => BuiltinKind::Short,
        Value::Int(_) => BuiltinKind::Int,
        Value::Long(_) => BuiltinKind::Long,
        Value::Float(_) => BuiltinKind::Float,
        Value::Double(_) => BuiltinKind::Double,
        Value::String(_) => BuiltinKind::String,
        Value::Uuid(_) => BuiltinKind::Uuid,
        Value::Date(_) => BuiltinKind::Date,
        Value::LocalDate(_) => BuiltinKind::LocalDate,
        Value::LocalTime(_) => BuiltinKind::LocalTime,
        Value::LocalDateTime(_) => BuiltinKind::LocalDateTime,
        Value::OffsetDateTime(_) => BuiltinKind::OffsetDateTime,
        Value::BigInteger(_) => BuiltinKind::BigInteger,
        Value::BigDecimal(_) => BuiltinKind::BigDecimal,
        Value::JavaClass(_) => BuiltinKind::JavaClass,
        Value::List(_) => BuiltinKind::ArrayList,
        _ => return None,
    })
}

/// The element kind of a typed array variant.
pub(crate) fn typed_array_kind(value: &Value) -> Option<BuiltinKind> {
    Some(match value {
        Value::BoolArray(_) => BuiltinKind::Bool,
        Value::ByteArray(_) => BuiltinKind::Byte,
        Value::CharArray(_) => BuiltinKind::Char,
        Value::ShortArray(_) => BuiltinKind::Short,
        Value::IntArray(_) => BuiltinKind::Int,
        Value::LongArray(_) => BuiltinKind::Long,
        Value::FloatArray(_) => BuiltinKind::Float,
        Value::DoubleArray(_) => BuiltinKind::Double,
        Value::StringArray(_) => BuiltinKind::String,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(serializer: &dyn Serializer, value: &Value) -> Value {
        let mut output = ObjectDataOutput::new();
        serializer.write(&mut output, value).unwrap();
        let mut input = ObjectDataInput::new(output.as_bytes());
        let read = serializer.read(&mut input).unwrap();
        assert_eq!(input.remaining(), 0);
        read
    }

    #[test]
    fn test_big_integer_minimal_bytes() {
        assert_eq!(big_integer_to_bytes(0), vec![0x00]);
        assert_eq!(big_integer_to_bytes(127), vec![0x7F]);
        assert_eq!(big_integer_to_bytes(128), vec![0x00, 0x80]);
        assert_eq!(big_integer_to_bytes(-1), vec![0xFF]);
        assert_eq!(big_integer_to_bytes(-128), vec![0x80]);
        assert_eq!(big_integer_to_bytes(-129), vec![0xFF, 0x7F]);
    }

    #[test]
    fn test_big_integer_from_bytes() {
        assert_eq!(big_integer_from_bytes(&[0x00, 0x80]).unwrap(), 128);
        assert_eq!(big_integer_from_bytes(&[0xFF, 0x7F]).unwrap(), -129);
        assert_eq!(
            big_integer_from_bytes(&big_integer_to_bytes(i128::MIN)).unwrap(),
            i128::MIN
        );
        assert!(big_integer_from_bytes(&[]).is_err());
        assert!(big_integer_from_bytes(&[1; 17]).is_err());
    }

    #[test]
    fn test_big_decimal_layout() {
        let value = Value::BigDecimal(Decimal::new(-12345, 2));
        let mut output = ObjectDataOutput::new();
        BigDecimalSerializer.write(&mut output, &value).unwrap();
        assert_eq!(output.as_bytes(), &[0, 0, 0, 2, 0xCF, 0xC7, 0, 0, 0, 2]);
        assert_eq!(round_trip(&BigDecimalSerializer, &value), value);
    }

    #[test]
    fn test_big_decimal_rejects_large_scale() {
        let mut output = ObjectDataOutput::new();
        output.write_byte_array(Some(&[1])).unwrap();
        output.write_int(40).unwrap();
        let mut input = ObjectDataInput::new(output.as_bytes());
        assert!(BigDecimalSerializer.read(&mut input).is_err());
    }

    #[test]
    fn test_uuid_layout() {
        let uuid = Uuid::from_u64_pair(1, 2);
        let mut output = ObjectDataOutput::new();
        UuidSerializer.write(&mut output, &Value::Uuid(uuid)).unwrap();
        assert_eq!(
            output.as_bytes(),
            &[0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 2]
        );
    }

    #[test]
    fn test_local_date_time_layout() {
        let value = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_nano_opt(13, 5, 9, 7)
            .unwrap();
        let mut output = ObjectDataOutput::new();
        LocalDateTimeSerializer
            .write(&mut output, &Value::LocalDateTime(value))
            .unwrap();
        assert_eq!(
            output.as_bytes(),
            &[0, 0, 0x07, 0xE8, 2, 29, 13, 5, 9, 0, 0, 0, 7]
        );
    }

    #[test]
    fn test_offset_date_time_round_trip() {
        let offset = FixedOffset::east_opt(-5 * 3600).unwrap();
        let value = offset.with_ymd_and_hms(2021, 6, 1, 8, 30, 0).unwrap();
        assert_eq!(
            round_trip(&OffsetDateTimeSerializer, &Value::OffsetDateTime(value)),
            Value::OffsetDateTime(value)
        );
    }

    #[test]
    fn test_date_round_trip() {
        let date = Utc.timestamp_millis_opt(1_600_000_000_123).unwrap();
        assert_eq!(
            round_trip(&DateSerializer, &Value::Date(date)),
            Value::Date(date)
        );
    }

    #[test]
    fn test_untyped_array_converts_elements() {
        let value = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(
            round_trip(&IntegerArraySerializer, &value),
            Value::IntArray(vec![1, 2])
        );
    }

    #[test]
    fn test_untyped_array_mismatch_fails() {
        let value = Value::Array(vec![Value::Int(1), Value::String("x".into())]);
        let mut output = ObjectDataOutput::new();
        assert!(IntegerArraySerializer.write(&mut output, &value).is_err());
    }

    #[test]
    fn test_scalar_accepts_untyped_number() {
        assert_eq!(
            round_trip(&ShortSerializer, &Value::Number(12.0)),
            Value::Short(12)
        );
    }

    #[test]
    fn test_null_string_reads_as_null() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(StringSerializer.read(&mut input).unwrap(), Value::Null);
    }

    #[test]
    fn test_register_defaults_is_complete() {
        let mut registry = SerializerRegistry::new();
        register_defaults(&mut registry).unwrap();
        for id in [0, -3, -12, -11, -20, -21, -24, -25, -26, -27, -28, -29, -30, -51, -54] {
            assert!(registry.by_id(id).is_some(), "missing serializer {}", id);
        }
        assert!(registry.array(TypeKey::Builtin(BuiltinKind::Null)).is_none());
        assert!(register_defaults(&mut registry).is_err());
    }
}
