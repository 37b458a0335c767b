//! Wire constants shared with the cluster.

#![allow(missing_docs)]

/// Size of the container header: partition hash followed by type id.
pub const DATA_OFFSET: usize = 8;
/// Offset of the partition hash inside the container header.
pub const PARTITION_HASH_OFFSET: usize = 0;
/// Offset of the type id inside the container header.
pub const TYPE_OFFSET: usize = 4;

/// Length prefix denoting a null array or string.
pub const NULL_ARRAY_LENGTH: i32 = -1;

/// Seed used when hashing container payloads for partitioning.
pub const PARTITION_HASH_SEED: u32 = 0x0100_0193;

pub const CONSTANT_TYPE_NULL: i32 = 0;
pub const CONSTANT_TYPE_PORTABLE: i32 = -1;
pub const CONSTANT_TYPE_DATA_SERIALIZABLE: i32 = -2;
pub const CONSTANT_TYPE_BYTE: i32 = -3;
pub const CONSTANT_TYPE_BOOLEAN: i32 = -4;
pub const CONSTANT_TYPE_CHAR: i32 = -5;
pub const CONSTANT_TYPE_SHORT: i32 = -6;
pub const CONSTANT_TYPE_INTEGER: i32 = -7;
pub const CONSTANT_TYPE_LONG: i32 = -8;
pub const CONSTANT_TYPE_FLOAT: i32 = -9;
pub const CONSTANT_TYPE_DOUBLE: i32 = -10;
pub const CONSTANT_TYPE_STRING: i32 = -11;
pub const CONSTANT_TYPE_BYTE_ARRAY: i32 = -12;
pub const CONSTANT_TYPE_BOOLEAN_ARRAY: i32 = -13;
pub const CONSTANT_TYPE_CHAR_ARRAY: i32 = -14;
pub const CONSTANT_TYPE_SHORT_ARRAY: i32 = -15;
pub const CONSTANT_TYPE_INTEGER_ARRAY: i32 = -16;
pub const CONSTANT_TYPE_LONG_ARRAY: i32 = -17;
pub const CONSTANT_TYPE_FLOAT_ARRAY: i32 = -18;
pub const CONSTANT_TYPE_DOUBLE_ARRAY: i32 = -19;
pub const CONSTANT_TYPE_STRING_ARRAY: i32 = -20;
pub const CONSTANT_TYPE_UUID: i32 = -21;
pub const JAVA_DEFAULT_TYPE_CLASS: i32 = -24;
pub const JAVA_DEFAULT_TYPE_DATE: i32 = -25;
pub const JAVA_DEFAULT_TYPE_BIG_INTEGER: i32 = -26;
pub const JAVA_DEFAULT_TYPE_BIG_DECIMAL: i32 = -27;
pub const JAVA_DEFAULT_TYPE_ARRAY: i32 = -28;
pub const JAVA_DEFAULT_TYPE_ARRAY_LIST: i32 = -29;
pub const JAVA_DEFAULT_TYPE_LINKED_LIST: i32 = -30;
pub const JAVA_DEFAULT_TYPE_LOCAL_DATE: i32 = -51;
pub const JAVA_DEFAULT_TYPE_LOCAL_TIME: i32 = -52;
pub const JAVA_DEFAULT_TYPE_LOCAL_DATE_TIME: i32 = -53;
pub const JAVA_DEFAULT_TYPE_OFFSET_DATE_TIME: i32 = -54;
pub const TYPE_COMPACT: i32 = -55;
pub const JAVASCRIPT_JSON_SERIALIZATION_TYPE: i32 = -130;
