//! Round trips of the built-in types through the data container, in both
//! byte orders.

mod common;

use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use common::{hex, round_trip, service, service_for};
use hazelcast_serialization::serialization::constants::*;
use hazelcast_serialization::serialization::HazelcastJsonValue;
use hazelcast_serialization::{ByteOrder, Data, Value};

fn builtin_values() -> Vec<Value> {
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let time = NaiveTime::from_hms_nano_opt(23, 59, 58, 123_456_789).unwrap();
    let offset = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();

    vec![
        Value::Bool(true),
        Value::Byte(-7),
        Value::Char('\u{e9}'),
        Value::Short(i16::MIN),
        Value::Int(-123_456),
        Value::Long(i64::MAX),
        Value::Float(1.5),
        Value::Double(-2.25),
        Value::String("hazelcast \u{1F680}".to_string()),
        Value::BoolArray(vec![true, false, true]),
        Value::ByteArray(vec![0, 1, 255]),
        Value::CharArray(vec!['a', '\u{3b1}']),
        Value::ShortArray(vec![1, -1]),
        Value::IntArray(vec![i32::MIN, 0, i32::MAX]),
        Value::LongArray(vec![42]),
        Value::FloatArray(vec![0.5, -0.5]),
        Value::DoubleArray(vec![]),
        Value::StringArray(vec!["x".to_string(), String::new()]),
        Value::Uuid(Uuid::from_u64_pair(0x0123_4567_89ab_cdef, 0xfedc_ba98_7654_3210)),
        Value::Date(Utc.timestamp_millis_opt(1_700_000_000_123).unwrap()),
        Value::LocalDate(date),
        Value::LocalTime(time),
        Value::LocalDateTime(date.and_time(time)),
        Value::OffsetDateTime(offset.from_local_datetime(&date.and_time(time)).unwrap()),
        Value::BigInteger(i128::MIN),
        Value::BigInteger(255),
        Value::BigDecimal(Decimal::new(-1_234_567, 3)),
        Value::JavaClass("java.lang.String".to_string()),
        Value::List(vec![Value::Int(1), Value::String("two".to_string()), Value::Null]),
        Value::Json(HazelcastJsonValue::from_string(r#"{"a":[1,2,3]}"#)),
    ]
}

#[test]
fn test_builtin_round_trip_big_endian() {
    let service = service_for(ByteOrder::BigEndian);
    for value in builtin_values() {
        assert_eq!(round_trip(&service, &value), value, "value {:?}", value);
    }
}

#[test]
fn test_builtin_round_trip_little_endian() {
    let service = service_for(ByteOrder::LittleEndian);
    for value in builtin_values() {
        assert_eq!(round_trip(&service, &value), value, "value {:?}", value);
    }
}

#[test]
fn test_type_ids_on_the_wire() {
    let service = service();
    let cases = [
        (Value::Null, CONSTANT_TYPE_NULL),
        (Value::Bool(false), CONSTANT_TYPE_BOOLEAN),
        (Value::Byte(0), CONSTANT_TYPE_BYTE),
        (Value::Char('a'), CONSTANT_TYPE_CHAR),
        (Value::Short(0), CONSTANT_TYPE_SHORT),
        (Value::Int(0), CONSTANT_TYPE_INTEGER),
        (Value::Long(0), CONSTANT_TYPE_LONG),
        (Value::Float(0.0), CONSTANT_TYPE_FLOAT),
        (Value::Double(0.0), CONSTANT_TYPE_DOUBLE),
        (Value::String(String::new()), CONSTANT_TYPE_STRING),
        (Value::IntArray(vec![]), CONSTANT_TYPE_INTEGER_ARRAY),
        (Value::StringArray(vec![]), CONSTANT_TYPE_STRING_ARRAY),
        (Value::Uuid(Uuid::nil()), CONSTANT_TYPE_UUID),
        (Value::List(vec![]), JAVA_DEFAULT_TYPE_ARRAY_LIST),
        (
            Value::Json(HazelcastJsonValue::from_string("1")),
            JAVASCRIPT_JSON_SERIALIZATION_TYPE,
        ),
    ];
    for (value, expected) in cases {
        let data = service.to_data(&value).unwrap();
        assert_eq!(data.type_id(), expected, "value {:?}: {}", value, hex(&data));
    }
}

#[test]
fn test_int_layout_follows_byte_order() {
    let be = service_for(ByteOrder::BigEndian)
        .to_data(&Value::Int(1))
        .unwrap();
    let le = service_for(ByteOrder::LittleEndian)
        .to_data(&Value::Int(1))
        .unwrap();

    // the header is big-endian either way
    assert_eq!(&be.to_bytes()[..8], &le.to_bytes()[..8]);
    assert_eq!(be.payload(), &[0, 0, 0, 1]);
    assert_eq!(le.payload(), &[1, 0, 0, 0]);
}

#[test]
fn test_string_payload_is_length_prefixed_utf8() {
    let service = service();
    let data = service
        .to_data(&Value::String("h\u{e9}".to_string()))
        .unwrap();
    assert_eq!(data.payload(), &[0, 0, 0, 3, b'h', 0xc3, 0xa9], "{}", hex(&data));
}

#[test]
fn test_container_survives_byte_transport() {
    let service = service();
    let value = Value::LongArray(vec![1, 2, 3]);
    let data = service.to_data(&value).unwrap();

    let copied = Data::wrap(data.to_bytes().to_vec()).unwrap();
    assert_eq!(copied, data);
    assert_eq!(service.to_object(&copied).unwrap(), value);
}

#[test]
fn test_null_and_empty_container() {
    let service = service();
    let data = service.to_data(&Value::Null).unwrap();
    assert_eq!(data.type_id(), CONSTANT_TYPE_NULL);
    assert!(data.payload().is_empty());
    assert_eq!(service.to_object(&data).unwrap(), Value::Null);
    assert_eq!(service.to_object(&Data::empty()).unwrap(), Value::Null);
}

#[test]
fn test_truncated_container_is_rejected() {
    assert!(Data::wrap(vec![0u8, 0, 0, 0, 0, 0, 0]).is_err());

    let service = service();
    let data = service.to_data(&Value::Long(7)).unwrap();
    let truncated = Data::wrap(data.to_bytes()[..12].to_vec()).unwrap();
    assert!(service.to_object(&truncated).is_err());
}
