//! The closed set of values the serialization service can dispatch on.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::serialization::compact::GenericRecord;
use crate::serialization::custom::CustomSerializable;
use crate::serialization::identified::IdentifiedDataSerializable;
use crate::serialization::json::HazelcastJsonValue;
use crate::serialization::portable::Portable;

/// Upcast to `&dyn Any`, implemented for every `'static` type.
///
/// Used as a supertrait so trait objects can be downcast to their concrete type.
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Numeric width used for values that carry no width of their own.
///
/// [`Value::Number`] and empty untyped arrays are encoded with this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NumberType {
    /// Signed 8-bit.
    Byte,
    /// Signed 16-bit.
    Short,
    /// Signed 32-bit.
    Integer,
    /// Signed 64-bit.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    #[default]
    Double,
}

/// An application object with no dedicated variant.
///
/// Objects are routed to a Compact serializer registered for their Rust type,
/// or to a custom serializer when built with [`Object::custom`].
#[derive(Clone)]
pub struct Object {
    inner: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
    custom_id: Option<i32>,
    partition_key: Option<Box<Value>>,
}

impl Object {
    /// Wraps a value of any `'static` type.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            custom_id: None,
            partition_key: None,
        }
    }

    /// Wraps a value that names the custom serializer it is written with.
    pub fn custom<T: CustomSerializable>(value: T) -> Self {
        let custom_id = value.custom_id();
        let mut object = Self::new(value);
        object.custom_id = Some(custom_id);
        object
    }

    /// Wraps an already shared value whose concrete type is only known at runtime.
    pub(crate) fn from_arc(inner: Arc<dyn Any + Send + Sync>, type_name: &'static str) -> Self {
        let type_id = Any::type_id(&*inner);
        Self {
            inner,
            type_id,
            type_name,
            custom_id: None,
            partition_key: None,
        }
    }

    /// Attaches a partition key; the object is routed by the key's hash.
    pub fn with_partition_key(mut self, key: impl Into<Value>) -> Self {
        self.partition_key = Some(Box::new(key.into()));
        self
    }

    /// Returns a reference to the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Returns the wrapped value as `&dyn Any`.
    pub fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &*self.inner
    }

    pub(crate) fn into_arc(self) -> Arc<dyn Any + Send + Sync> {
        self.inner
    }

    /// Returns the `TypeId` of the wrapped value.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the Rust type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the custom serializer id this object asked for.
    pub fn custom_id(&self) -> Option<i32> {
        self.custom_id
    }

    /// Returns the partition key attached with [`Object::with_partition_key`].
    pub fn partition_key(&self) -> Option<&Value> {
        self.partition_key.as_deref()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type_name", &self.type_name)
            .field("custom_id", &self.custom_id)
            .field("partition_key", &self.partition_key)
            .finish()
    }
}

/// A value the serialization service can write or has read.
///
/// Every variant maps to exactly one serializer; see
/// [`SerializationService::find_serializer_for`] for the dispatch order.
///
/// [`SerializationService::find_serializer_for`]: crate::serialization::SerializationService::find_serializer_for
#[derive(Debug, Clone)]
pub enum Value {
    /// The unassigned value. Never serializable.
    Undefined,
    /// The null value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed byte.
    Byte(i8),
    /// A UTF-16 code unit.
    Char(char),
    /// A 16-bit integer.
    Short(i16),
    /// A 32-bit integer.
    Int(i32),
    /// A 64-bit integer.
    Long(i64),
    /// A 32-bit float.
    Float(f32),
    /// A 64-bit float.
    Double(f64),
    /// A number without a width, written as the configured [`NumberType`].
    Number(f64),
    /// A string.
    String(String),
    /// An array of booleans.
    BoolArray(Vec<bool>),
    /// An array of bytes.
    ByteArray(Vec<u8>),
    /// An array of chars.
    CharArray(Vec<char>),
    /// An array of shorts.
    ShortArray(Vec<i16>),
    /// An array of ints.
    IntArray(Vec<i32>),
    /// An array of longs.
    LongArray(Vec<i64>),
    /// An array of floats.
    FloatArray(Vec<f32>),
    /// An array of doubles.
    DoubleArray(Vec<f64>),
    /// An array of strings.
    StringArray(Vec<String>),
    /// An untyped array whose first element decides the array serializer.
    Array(Vec<Value>),
    /// An ordered list of nested values.
    List(Vec<Value>),
    /// A UUID.
    Uuid(Uuid),
    /// A point in time with millisecond precision.
    Date(DateTime<Utc>),
    /// A calendar date.
    LocalDate(NaiveDate),
    /// A wall-clock time.
    LocalTime(NaiveTime),
    /// A date and time without offset.
    LocalDateTime(NaiveDateTime),
    /// A date and time with a fixed UTC offset.
    OffsetDateTime(DateTime<FixedOffset>),
    /// An arbitrary precision integer, bounded to 128 bits.
    BigInteger(i128),
    /// An arbitrary precision decimal.
    BigDecimal(Decimal),
    /// A class name placeholder.
    JavaClass(String),
    /// A JSON document kept as its string form.
    Json(HazelcastJsonValue),
    /// An identified data serializable object.
    Identified(Arc<dyn IdentifiedDataSerializable>),
    /// A portable object.
    Portable(Arc<dyn Portable>),
    /// A schema-described record with no registered Rust type.
    Compact(Arc<GenericRecord>),
    /// Any other application object.
    Object(Object),
}

impl Value {
    /// Wraps an identified data serializable object.
    pub fn identified<T: IdentifiedDataSerializable>(value: T) -> Self {
        Value::Identified(Arc::new(value))
    }

    /// Wraps a portable object.
    pub fn portable<T: Portable>(value: T) -> Self {
        Value::Portable(Arc::new(value))
    }

    /// Wraps an application object, e.g. a type registered for Compact.
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Value::Object(Object::new(value))
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short description of the value's kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Char(_) => "char",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::BoolArray(_) => "boolean[]",
            Value::ByteArray(_) => "byte[]",
            Value::CharArray(_) => "char[]",
            Value::ShortArray(_) => "short[]",
            Value::IntArray(_) => "int[]",
            Value::LongArray(_) => "long[]",
            Value::FloatArray(_) => "float[]",
            Value::DoubleArray(_) => "double[]",
            Value::StringArray(_) => "string[]",
            Value::Array(_) => "array",
            Value::List(_) => "list",
            Value::Uuid(_) => "uuid",
            Value::Date(_) => "date",
            Value::LocalDate(_) => "local date",
            Value::LocalTime(_) => "local time",
            Value::LocalDateTime(_) => "local date-time",
            Value::OffsetDateTime(_) => "offset date-time",
            Value::BigInteger(_) => "big integer",
            Value::BigDecimal(_) => "big decimal",
            Value::JavaClass(_) => "class",
            Value::Json(_) => "json",
            Value::Identified(_) => "identified data serializable",
            Value::Portable(_) => "portable",
            Value::Compact(_) => "compact record",
            Value::Object(o) => o.type_name(),
        }
    }

    /// Returns the partition key the value routes by, if it carries one.
    pub fn partition_key(&self) -> Option<Value> {
        match self {
            Value::Identified(v) => v.partition_key(),
            Value::Portable(v) => v.partition_key(),
            Value::Object(o) => o.partition_key().cloned(),
            _ => None,
        }
    }

    /// Downcasts an application object to its concrete type.
    ///
    /// Works for identified, portable, compact and plain object values.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Identified(v) => AsAny::as_any(&**v).downcast_ref::<T>(),
            Value::Portable(v) => AsAny::as_any(&**v).downcast_ref::<T>(),
            Value::Compact(record) => (&**record as &dyn Any).downcast_ref::<T>(),
            Value::Object(o) => o.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Returns the boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the byte, accepting integral numbers in range.
    pub fn as_byte(&self) -> Option<i8> {
        match self {
            Value::Byte(v) => Some(*v),
            Value::Number(n) => integral(*n, i8::MIN as f64, i8::MAX as f64 + 1.0).map(|v| v as i8),
            _ => None,
        }
    }

    /// Returns the char, if this is one.
    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the short, accepting integral numbers in range.
    pub fn as_short(&self) -> Option<i16> {
        match self {
            Value::Short(v) => Some(*v),
            Value::Number(n) => integral(*n, i16::MIN as f64, i16::MAX as f64 + 1.0).map(|v| v as i16),
            _ => None,
        }
    }

    /// Returns the int, accepting integral numbers in range.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Number(n) => integral(*n, i32::MIN as f64, i32::MAX as f64 + 1.0).map(|v| v as i32),
            _ => None,
        }
    }

    /// Returns the long, accepting integral numbers in range.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            Value::Number(n) => integral(*n, i64::MIN as f64, I64_UPPER_BOUND).map(|v| v as i64),
            _ => None,
        }
    }

    /// Returns the float, accepting any number.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Number(n) => Some(*n as f32),
            _ => None,
        }
    }

    /// Returns the double, accepting any number.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) | Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the value to a JSON document, or `None` if it has no JSON form.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value as Json;

        fn number(n: f64) -> Option<Json> {
            serde_json::Number::from_f64(n).map(Json::Number)
        }

        fn list<T>(items: &[T], each: impl Fn(&T) -> Option<Json>) -> Option<Json> {
            items.iter().map(each).collect::<Option<Vec<_>>>().map(Json::Array)
        }

        match self {
            Value::Null => Some(Json::Null),
            Value::Bool(v) => Some(Json::Bool(*v)),
            Value::Byte(v) => Some(Json::from(*v)),
            Value::Short(v) => Some(Json::from(*v)),
            Value::Int(v) => Some(Json::from(*v)),
            Value::Long(v) => Some(Json::from(*v)),
            Value::Float(v) => number(f64::from(*v)),
            Value::Double(v) | Value::Number(v) => number(*v),
            Value::Char(c) => Some(Json::String(c.to_string())),
            Value::String(s) => Some(Json::String(s.clone())),
            Value::BoolArray(v) => list(v, |b| Some(Json::Bool(*b))),
            Value::ByteArray(v) => list(v, |b| Some(Json::from(*b))),
            Value::CharArray(v) => list(v, |c| Some(Json::String(c.to_string()))),
            Value::ShortArray(v) => list(v, |n| Some(Json::from(*n))),
            Value::IntArray(v) => list(v, |n| Some(Json::from(*n))),
            Value::LongArray(v) => list(v, |n| Some(Json::from(*n))),
            Value::FloatArray(v) => list(v, |n| number(f64::from(*n))),
            Value::DoubleArray(v) => list(v, |n| number(*n)),
            Value::StringArray(v) => list(v, |s| Some(Json::String(s.clone()))),
            Value::Array(v) | Value::List(v) => list(v, Value::to_json),
            Value::Json(json) => serde_json::from_str(json.as_str()).ok(),
            _ => None,
        }
    }
}

/// 2^63; `i64::MAX as f64` rounds up to this value.
const I64_UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Accepts whole numbers in `[min, end)`.
fn integral(n: f64, min: f64, end: f64) -> Option<f64> {
    (n.fract() == 0.0 && n >= min && n < end).then_some(n)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Undefined, Undefined) | (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Double(a), Double(b)) | (Number(a), Number(b)) => a == b,
            (String(a), String(b)) | (JavaClass(a), JavaClass(b)) => a == b,
            (BoolArray(a), BoolArray(b)) => a == b,
            (ByteArray(a), ByteArray(b)) => a == b,
            (CharArray(a), CharArray(b)) => a == b,
            (ShortArray(a), ShortArray(b)) => a == b,
            (IntArray(a), IntArray(b)) => a == b,
            (LongArray(a), LongArray(b)) => a == b,
            (FloatArray(a), FloatArray(b)) => a == b,
            (DoubleArray(a), DoubleArray(b)) => a == b,
            (StringArray(a), StringArray(b)) => a == b,
            (Array(a), Array(b)) | (List(a), List(b)) => a == b,
            (Uuid(a), Uuid(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (LocalDate(a), LocalDate(b)) => a == b,
            (LocalTime(a), LocalTime(b)) => a == b,
            (LocalDateTime(a), LocalDateTime(b)) => a == b,
            (OffsetDateTime(a), OffsetDateTime(b)) => a == b && a.offset() == b.offset(),
            (BigInteger(a), BigInteger(b)) => a == b,
            (BigDecimal(a), BigDecimal(b)) => a == b,
            (Json(a), Json(b)) => a == b,
            (Identified(a), Identified(b)) => Arc::ptr_eq(a, b),
            (Portable(a), Portable(b)) => Arc::ptr_eq(a, b),
            (Compact(a), Compact(b)) => a == b,
            (Object(a), Object(b)) => Arc::ptr_eq(&a.inner, &b.inner),
            _ => false,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => Byte,
    char => Char,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => String,
    Vec<bool> => BoolArray,
    Vec<u8> => ByteArray,
    Vec<char> => CharArray,
    Vec<i16> => ShortArray,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
    Vec<f32> => FloatArray,
    Vec<f64> => DoubleArray,
    Vec<String> => StringArray,
    Vec<Value> => Array,
    Uuid => Uuid,
    DateTime<Utc> => Date,
    NaiveDate => LocalDate,
    NaiveTime => LocalTime,
    NaiveDateTime => LocalDateTime,
    DateTime<FixedOffset> => OffsetDateTime,
    i128 => BigInteger,
    Decimal => BigDecimal,
    HazelcastJsonValue => Json,
    Object => Object,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<GenericRecord> for Value {
    fn from(v: GenericRecord) -> Self {
        Value::Compact(Arc::new(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Employee {
        name: String,
    }

    #[test]
    fn test_number_accessors_accept_untyped_numbers() {
        assert_eq!(Value::Number(42.0).as_int(), Some(42));
        assert_eq!(Value::Number(42.5).as_int(), None);
        assert_eq!(Value::Number(300.0).as_byte(), None);
        assert_eq!(Value::Number(1.5).as_double(), Some(1.5));
        assert_eq!(Value::Int(7).as_long(), None);
    }

    #[test]
    fn test_number_range_upper_bound_is_exclusive() {
        assert_eq!(Value::Number(127.0).as_byte(), Some(127));
        assert_eq!(Value::Number(128.0).as_byte(), None);
        assert_eq!(Value::Number(2_147_483_647.0).as_int(), Some(i32::MAX));
        assert_eq!(Value::Number(2_147_483_648.0).as_int(), None);
        assert_eq!(Value::Number(9.223372036854775807e18).as_long(), None);
        assert_eq!(Value::Number(-9.223372036854775808e18).as_long(), Some(i64::MIN));
        assert_eq!(
            Value::Number(9_223_372_036_854_774_784.0).as_long(),
            Some(9_223_372_036_854_774_784)
        );
    }

    #[test]
    fn test_object_downcast() {
        let value = Value::object(Employee {
            name: "ada".to_string(),
        });
        let employee = value.downcast_ref::<Employee>().unwrap();
        assert_eq!(employee.name, "ada");
        assert!(value.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_object_partition_key() {
        let object = Object::new(Employee {
            name: "ada".to_string(),
        })
        .with_partition_key("key-1");
        assert_eq!(
            Value::Object(object).partition_key(),
            Some(Value::String("key-1".to_string()))
        );
    }

    #[test]
    fn test_object_equality_is_identity() {
        let a = Object::new(Employee {
            name: "ada".to_string(),
        });
        let b = Object::new(Employee {
            name: "ada".to_string(),
        });
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn test_object_type_id_is_concrete() {
        let object = Object::new(Employee {
            name: String::new(),
        });
        assert_eq!(object.type_id(), TypeId::of::<Employee>());
        let shared = Object::from_arc(object.inner.clone(), object.type_name());
        assert_eq!(shared.type_id(), TypeId::of::<Employee>());
    }

    #[test]
    fn test_to_json() {
        let value = Value::Array(vec![Value::Null, Value::Number(1.0), "a".into()]);
        assert_eq!(value.to_json().unwrap().to_string(), "[null,1.0,\"a\"]");
        assert!(Value::Undefined.to_json().is_none());
        assert!(Value::Double(f64::NAN).to_json().is_none());
        assert!(Value::object(Employee {
            name: String::new()
        })
        .to_json()
        .is_none());
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(5)), Value::Int(5));
    }
}
