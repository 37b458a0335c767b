//! Portable serialization framework for cross-language compatibility.
//!
//! A portable payload carries its own field table, so a reader whose class
//! definition differs from the writer's can still pick out the fields it
//! knows about.

mod context;
mod reader;
mod serializer;
mod writer;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{HazelcastError, Result};
use crate::serialization::value::AsAny;
use crate::serialization::{DataInput, DataOutput, Value};

pub use context::PortableContext;
pub use reader::{DefaultPortableReader, MorphingPortableReader};
pub(crate) use serializer::PortableSerializer;
pub use writer::{ClassDefinitionWriter, DefaultPortableWriter};

/// Supported field types in Portable serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum FieldType {
    /// Nested Portable object.
    Portable = 0,
    /// Signed 8-bit integer.
    Byte = 1,
    /// Boolean value.
    Bool = 2,
    /// 16-bit Unicode character.
    Char = 3,
    /// Signed 16-bit integer.
    Short = 4,
    /// Signed 32-bit integer.
    Int = 5,
    /// Signed 64-bit integer.
    Long = 6,
    /// 32-bit floating point.
    Float = 7,
    /// 64-bit floating point.
    Double = 8,
    /// UTF-8 string.
    Utf8 = 9,
    /// Array of Portable objects.
    PortableArray = 10,
    /// Array of bytes.
    ByteArray = 11,
    /// Array of booleans.
    BoolArray = 12,
    /// Array of chars.
    CharArray = 13,
    /// Array of shorts.
    ShortArray = 14,
    /// Array of ints.
    IntArray = 15,
    /// Array of longs.
    LongArray = 16,
    /// Array of floats.
    FloatArray = 17,
    /// Array of doubles.
    DoubleArray = 18,
    /// Array of strings.
    Utf8Array = 19,
}

impl FieldType {
    /// Creates a FieldType from its wire representation.
    pub fn from_id(id: i32) -> Result<Self> {
        match id {
            0 => Ok(Self::Portable),
            1 => Ok(Self::Byte),
            2 => Ok(Self::Bool),
            3 => Ok(Self::Char),
            4 => Ok(Self::Short),
            5 => Ok(Self::Int),
            6 => Ok(Self::Long),
            7 => Ok(Self::Float),
            8 => Ok(Self::Double),
            9 => Ok(Self::Utf8),
            10 => Ok(Self::PortableArray),
            11 => Ok(Self::ByteArray),
            12 => Ok(Self::BoolArray),
            13 => Ok(Self::CharArray),
            14 => Ok(Self::ShortArray),
            15 => Ok(Self::IntArray),
            16 => Ok(Self::LongArray),
            17 => Ok(Self::FloatArray),
            18 => Ok(Self::DoubleArray),
            19 => Ok(Self::Utf8Array),
            _ => Err(HazelcastError::Serialization(format!(
                "unknown portable field type id: {}",
                id
            ))),
        }
    }

    /// Returns the wire representation of this field type.
    pub fn id(&self) -> i32 {
        *self as i32
    }

    /// Returns true if this is an array type.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            Self::ByteArray
                | Self::BoolArray
                | Self::CharArray
                | Self::ShortArray
                | Self::IntArray
                | Self::LongArray
                | Self::FloatArray
                | Self::DoubleArray
                | Self::Utf8Array
                | Self::PortableArray
        )
    }

    fn wire_name(&self) -> &'static str {
        match self {
            Self::Portable => "PORTABLE",
            Self::Byte => "BYTE",
            Self::Bool => "BOOLEAN",
            Self::Char => "CHAR",
            Self::Short => "SHORT",
            Self::Int => "INT",
            Self::Long => "LONG",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Utf8 => "UTF",
            Self::PortableArray => "PORTABLE_ARRAY",
            Self::ByteArray => "BYTE_ARRAY",
            Self::BoolArray => "BOOLEAN_ARRAY",
            Self::CharArray => "CHAR_ARRAY",
            Self::ShortArray => "SHORT_ARRAY",
            Self::IntArray => "INT_ARRAY",
            Self::LongArray => "LONG_ARRAY",
            Self::FloatArray => "FLOAT_ARRAY",
            Self::DoubleArray => "DOUBLE_ARRAY",
            Self::Utf8Array => "UTF_ARRAY",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Definition of a single field within a Portable class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    name: String,
    field_type: FieldType,
    index: i32,
    factory_id: i32,
    class_id: i32,
    version: i32,
}

impl FieldDefinition {
    /// Creates a new field definition for a primitive, string or array field.
    pub fn new(name: impl Into<String>, field_type: FieldType, index: i32) -> Self {
        Self {
            name: name.into(),
            field_type,
            index,
            factory_id: 0,
            class_id: 0,
            version: 0,
        }
    }

    /// Creates a new field definition for a nested Portable field.
    pub fn new_portable(
        name: impl Into<String>,
        index: i32,
        factory_id: i32,
        class_id: i32,
        version: i32,
    ) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Portable,
            index,
            factory_id,
            class_id,
            version,
        }
    }

    /// Creates a new field definition for a Portable array field.
    pub fn new_portable_array(
        name: impl Into<String>,
        index: i32,
        factory_id: i32,
        class_id: i32,
        version: i32,
    ) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::PortableArray,
            index,
            factory_id,
            class_id,
            version,
        }
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field type.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns the field index within the class.
    pub fn index(&self) -> i32 {
        self.index
    }

    /// Returns the factory ID for nested Portable fields.
    pub fn factory_id(&self) -> i32 {
        self.factory_id
    }

    /// Returns the class ID for nested Portable fields.
    pub fn class_id(&self) -> i32 {
        self.class_id
    }

    /// Returns the version for nested Portable fields.
    pub fn version(&self) -> i32 {
        self.version
    }
}

/// Definition of a Portable class schema.
///
/// Identified by the `(factory_id, class_id, version)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDefinition {
    factory_id: i32,
    class_id: i32,
    version: i32,
    fields: Vec<FieldDefinition>,
    field_indices: HashMap<String, usize>,
}

impl ClassDefinition {
    /// Creates a new class definition.
    pub fn new(factory_id: i32, class_id: i32, version: i32) -> Self {
        Self {
            factory_id,
            class_id,
            version,
            fields: Vec::new(),
            field_indices: HashMap::new(),
        }
    }

    /// Creates a new class definition with the given fields.
    pub fn with_fields(
        factory_id: i32,
        class_id: i32,
        version: i32,
        fields: Vec<FieldDefinition>,
    ) -> Self {
        let field_indices = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self {
            factory_id,
            class_id,
            version,
            fields,
            field_indices,
        }
    }

    /// Returns the factory ID.
    pub fn factory_id(&self) -> i32 {
        self.factory_id
    }

    /// Returns the class ID.
    pub fn class_id(&self) -> i32 {
        self.class_id
    }

    /// Returns the schema version.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Returns the cache key of this definition.
    pub fn key(&self) -> (i32, i32, i32) {
        (self.factory_id, self.class_id, self.version)
    }

    /// Returns the number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns all field definitions in declaration order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Returns the field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name()).collect()
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.field_indices.get(name).map(|&i| &self.fields[i])
    }

    /// Returns the type of the named field.
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.field(name).map(FieldDefinition::field_type)
    }

    /// Returns true if a field with the given name exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.field_indices.contains_key(name)
    }

    /// Adds a field to this class definition.
    pub fn add_field(&mut self, field: FieldDefinition) {
        self.field_indices.insert(field.name.clone(), self.fields.len());
        self.fields.push(field);
    }
}

macro_rules! builder_fields {
    ($($(#[$doc:meta])* $method:ident => $field_type:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $method(self, name: impl Into<String>) -> Self {
                self.push(name.into(), FieldType::$field_type)
            }
        )*
    };
}

/// Assembles a [`ClassDefinition`] field by field.
///
/// Field indexes follow the order of the `add_*` calls. Errors such as a
/// repeated name surface from [`build`](Self::build).
///
/// ```
/// use hazelcast_serialization::serialization::portable::ClassDefinitionBuilder;
///
/// let definition = ClassDefinitionBuilder::new(10, 111, 1)
///     .add_string_field("a_string")
///     .add_int_field("an_integer")
///     .build()
///     .unwrap();
/// assert_eq!(definition.field_count(), 2);
/// ```
#[derive(Debug)]
pub struct ClassDefinitionBuilder {
    definition: ClassDefinition,
    error: Option<HazelcastError>,
}

impl ClassDefinitionBuilder {
    /// Starts a definition for the given class.
    pub fn new(factory_id: i32, class_id: i32, version: i32) -> Self {
        Self {
            definition: ClassDefinition::new(factory_id, class_id, version),
            error: None,
        }
    }

    /// Returns the factory id of the definition being built.
    pub fn factory_id(&self) -> i32 {
        self.definition.factory_id
    }

    /// Returns the class id of the definition being built.
    pub fn class_id(&self) -> i32 {
        self.definition.class_id
    }

    /// Returns the version of the definition being built.
    pub fn version(&self) -> i32 {
        self.definition.version
    }

    builder_fields! {
        /// Adds a byte field.
        add_byte_field => Byte;
        /// Adds a boolean field.
        add_bool_field => Bool;
        /// Adds a char field.
        add_char_field => Char;
        /// Adds a short field.
        add_short_field => Short;
        /// Adds an int field.
        add_int_field => Int;
        /// Adds a long field.
        add_long_field => Long;
        /// Adds a float field.
        add_float_field => Float;
        /// Adds a double field.
        add_double_field => Double;
        /// Adds a string field.
        add_string_field => Utf8;
        /// Adds a byte array field.
        add_byte_array_field => ByteArray;
        /// Adds a boolean array field.
        add_bool_array_field => BoolArray;
        /// Adds a char array field.
        add_char_array_field => CharArray;
        /// Adds a short array field.
        add_short_array_field => ShortArray;
        /// Adds an int array field.
        add_int_array_field => IntArray;
        /// Adds a long array field.
        add_long_array_field => LongArray;
        /// Adds a float array field.
        add_float_array_field => FloatArray;
        /// Adds a double array field.
        add_double_array_field => DoubleArray;
        /// Adds a string array field.
        add_string_array_field => Utf8Array;
    }

    /// Adds a nested Portable field described by `nested`.
    pub fn add_portable_field(mut self, name: impl Into<String>, nested: &ClassDefinition) -> Self {
        let field = FieldDefinition::new_portable(
            name,
            self.next_index(),
            nested.factory_id,
            nested.class_id,
            nested.version,
        );
        self.record(field);
        self
    }

    /// Adds a Portable array field whose items are described by `nested`.
    pub fn add_portable_array_field(
        mut self,
        name: impl Into<String>,
        nested: &ClassDefinition,
    ) -> Self {
        let field = FieldDefinition::new_portable_array(
            name,
            self.next_index(),
            nested.factory_id,
            nested.class_id,
            nested.version,
        );
        self.record(field);
        self
    }

    /// Finishes the definition.
    pub fn build(self) -> Result<ClassDefinition> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.definition),
        }
    }

    /// Adds a field, failing immediately on a repeated name.
    pub(crate) fn try_add(&mut self, field: FieldDefinition) -> Result<()> {
        if self.definition.has_field(field.name()) {
            return Err(HazelcastError::DuplicateField(field.name().to_string()));
        }
        if matches!(
            field.field_type(),
            FieldType::Portable | FieldType::PortableArray
        ) && field.class_id() == 0
        {
            return Err(HazelcastError::Serialization(format!(
                "portable class id cannot be zero for field '{}'",
                field.name()
            )));
        }
        self.definition.add_field(field);
        Ok(())
    }

    pub(crate) fn next_index(&self) -> i32 {
        self.definition.fields.len() as i32
    }

    fn push(mut self, name: String, field_type: FieldType) -> Self {
        let field = FieldDefinition::new(name, field_type, self.next_index());
        self.record(field);
        self
    }

    fn record(&mut self, field: FieldDefinition) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.try_add(field) {
            self.error = Some(err);
        }
    }
}

/// Factory for creating Portable instances.
pub trait PortableFactory: Send + Sync {
    /// Creates a new blank instance for the given class ID.
    fn create(&self, class_id: i32) -> Option<Box<dyn Portable>>;
}

/// Trait for reading Portable fields during deserialization.
///
/// Absent nullable fields read as `None`.
pub trait PortableReader {
    /// Returns the version of the class definition the data was written with.
    fn version(&self) -> i32;

    /// Returns true if a field with the given name exists.
    fn has_field(&self, name: &str) -> bool;

    /// Returns the field names of the data's class definition.
    fn field_names(&self) -> Vec<String>;

    /// Returns the type of the named field, if present.
    fn field_type(&self, name: &str) -> Option<FieldType>;

    /// Reads a byte field.
    fn read_byte(&mut self, name: &str) -> Result<i8>;

    /// Reads a boolean field.
    fn read_bool(&mut self, name: &str) -> Result<bool>;

    /// Reads a char field.
    fn read_char(&mut self, name: &str) -> Result<char>;

    /// Reads a short field.
    fn read_short(&mut self, name: &str) -> Result<i16>;

    /// Reads an int field.
    fn read_int(&mut self, name: &str) -> Result<i32>;

    /// Reads a long field.
    fn read_long(&mut self, name: &str) -> Result<i64>;

    /// Reads a float field.
    fn read_float(&mut self, name: &str) -> Result<f32>;

    /// Reads a double field.
    fn read_double(&mut self, name: &str) -> Result<f64>;

    /// Reads a string field.
    fn read_string(&mut self, name: &str) -> Result<Option<String>>;

    /// Reads a nested Portable field.
    fn read_portable(&mut self, name: &str) -> Result<Option<Arc<dyn Portable>>>;

    /// Reads a byte array field.
    fn read_byte_array(&mut self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Reads a boolean array field.
    fn read_bool_array(&mut self, name: &str) -> Result<Option<Vec<bool>>>;

    /// Reads a char array field.
    fn read_char_array(&mut self, name: &str) -> Result<Option<Vec<char>>>;

    /// Reads a short array field.
    fn read_short_array(&mut self, name: &str) -> Result<Option<Vec<i16>>>;

    /// Reads an int array field.
    fn read_int_array(&mut self, name: &str) -> Result<Option<Vec<i32>>>;

    /// Reads a long array field.
    fn read_long_array(&mut self, name: &str) -> Result<Option<Vec<i64>>>;

    /// Reads a float array field.
    fn read_float_array(&mut self, name: &str) -> Result<Option<Vec<f32>>>;

    /// Reads a double array field.
    fn read_double_array(&mut self, name: &str) -> Result<Option<Vec<f64>>>;

    /// Reads a string array field.
    fn read_string_array(&mut self, name: &str) -> Result<Option<Vec<String>>>;

    /// Reads a Portable array field.
    fn read_portable_array(&mut self, name: &str) -> Result<Option<Vec<Arc<dyn Portable>>>>;

    /// Switches to the unnamed tail written after the fields.
    ///
    /// Named reads fail once this has been called.
    fn raw_data_input(&mut self) -> Result<&mut dyn DataInput>;
}

impl dyn PortableReader + '_ {
    /// Reads a nested Portable field as a concrete type.
    pub fn read_portable_as<T: Portable + Clone>(&mut self, name: &str) -> Result<Option<T>> {
        self.read_portable(name)?
            .map(|p| downcast_portable::<T>(name, &p))
            .transpose()
    }

    /// Reads a Portable array field as a vector of a concrete type.
    pub fn read_portable_array_as<T: Portable + Clone>(
        &mut self,
        name: &str,
    ) -> Result<Option<Vec<T>>> {
        self.read_portable_array(name)?
            .map(|items| {
                items
                    .iter()
                    .map(|p| downcast_portable::<T>(name, p))
                    .collect()
            })
            .transpose()
    }
}

fn downcast_portable<T: Portable + Clone>(name: &str, portable: &Arc<dyn Portable>) -> Result<T> {
    portable
        .as_any()
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| {
            HazelcastError::Serialization(format!(
                "field '{}' holds a different portable type than {}",
                name,
                std::any::type_name::<T>()
            ))
        })
}

/// Trait for writing Portable fields during serialization.
pub trait PortableWriter {
    /// Writes a byte field.
    fn write_byte(&mut self, name: &str, value: i8) -> Result<()>;

    /// Writes a boolean field.
    fn write_bool(&mut self, name: &str, value: bool) -> Result<()>;

    /// Writes a char field.
    fn write_char(&mut self, name: &str, value: char) -> Result<()>;

    /// Writes a short field.
    fn write_short(&mut self, name: &str, value: i16) -> Result<()>;

    /// Writes an int field.
    fn write_int(&mut self, name: &str, value: i32) -> Result<()>;

    /// Writes a long field.
    fn write_long(&mut self, name: &str, value: i64) -> Result<()>;

    /// Writes a float field.
    fn write_float(&mut self, name: &str, value: f32) -> Result<()>;

    /// Writes a double field.
    fn write_double(&mut self, name: &str, value: f64) -> Result<()>;

    /// Writes a string field.
    fn write_string(&mut self, name: &str, value: Option<&str>) -> Result<()>;

    /// Writes a nested Portable field.
    ///
    /// A `None` value needs the nested class definition to be known already;
    /// prefer [`write_null_portable`](Self::write_null_portable) for nulls.
    fn write_portable(&mut self, name: &str, value: Option<&dyn Portable>) -> Result<()>;

    /// Writes a null nested Portable of the given class.
    fn write_null_portable(&mut self, name: &str, factory_id: i32, class_id: i32) -> Result<()>;

    /// Writes a byte array field.
    fn write_byte_array(&mut self, name: &str, value: Option<&[u8]>) -> Result<()>;

    /// Writes a boolean array field.
    fn write_bool_array(&mut self, name: &str, value: Option<&[bool]>) -> Result<()>;

    /// Writes a char array field.
    fn write_char_array(&mut self, name: &str, value: Option<&[char]>) -> Result<()>;

    /// Writes a short array field.
    fn write_short_array(&mut self, name: &str, value: Option<&[i16]>) -> Result<()>;

    /// Writes an int array field.
    fn write_int_array(&mut self, name: &str, value: Option<&[i32]>) -> Result<()>;

    /// Writes a long array field.
    fn write_long_array(&mut self, name: &str, value: Option<&[i64]>) -> Result<()>;

    /// Writes a float array field.
    fn write_float_array(&mut self, name: &str, value: Option<&[f32]>) -> Result<()>;

    /// Writes a double array field.
    fn write_double_array(&mut self, name: &str, value: Option<&[f64]>) -> Result<()>;

    /// Writes a string array field.
    fn write_string_array(&mut self, name: &str, value: Option<&[String]>) -> Result<()>;

    /// Writes a Portable array field. Every item must share one class.
    fn write_portable_array(&mut self, name: &str, value: Option<&[&dyn Portable]>) -> Result<()>;

    /// Returns a stream for unnamed data after the fields.
    ///
    /// Named writes fail once this has been called.
    fn raw_data_output(&mut self) -> Result<&mut dyn DataOutput>;
}

/// Trait for types that can be serialized using Portable serialization.
pub trait Portable: AsAny + Send + Sync + fmt::Debug {
    /// Returns the factory ID for this type.
    fn factory_id(&self) -> i32;

    /// Returns the class ID for this type.
    fn class_id(&self) -> i32;

    /// Writes this object's fields to the given writer.
    fn write_portable(&self, writer: &mut dyn PortableWriter) -> Result<()>;

    /// Reads this object's fields from the given reader.
    fn read_portable(&mut self, reader: &mut dyn PortableReader) -> Result<()>;

    /// Class version overriding the configured portable version.
    fn version(&self) -> Option<i32> {
        None
    }

    /// Returns the key this object is routed by, if it overrides its own hash.
    fn partition_key(&self) -> Option<Value> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_round_trip() {
        for id in 0..=19 {
            let ft = FieldType::from_id(id).unwrap();
            assert_eq!(ft.id(), id);
        }
    }

    #[test]
    fn field_type_wire_ids() {
        assert_eq!(FieldType::Portable.id(), 0);
        assert_eq!(FieldType::Utf8.id(), 9);
        assert_eq!(FieldType::PortableArray.id(), 10);
        assert_eq!(FieldType::Utf8Array.id(), 19);
    }

    #[test]
    fn field_type_invalid_id() {
        assert!(FieldType::from_id(20).is_err());
        assert!(FieldType::from_id(-1).is_err());
    }

    #[test]
    fn field_type_is_array() {
        assert!(!FieldType::Byte.is_array());
        assert!(!FieldType::Int.is_array());
        assert!(!FieldType::Portable.is_array());
        assert!(FieldType::ByteArray.is_array());
        assert!(FieldType::IntArray.is_array());
        assert!(FieldType::PortableArray.is_array());
    }

    #[test]
    fn field_type_display() {
        assert_eq!(FieldType::Utf8.to_string(), "UTF");
        assert_eq!(FieldType::BoolArray.to_string(), "BOOLEAN_ARRAY");
    }

    #[test]
    fn field_definition_portable() {
        let field = FieldDefinition::new_portable("address", 1, 100, 200, 1);
        assert_eq!(field.name(), "address");
        assert_eq!(field.field_type(), FieldType::Portable);
        assert_eq!(field.index(), 1);
        assert_eq!(field.factory_id(), 100);
        assert_eq!(field.class_id(), 200);
        assert_eq!(field.version(), 1);
    }

    #[test]
    fn class_definition_with_fields() {
        let fields = vec![
            FieldDefinition::new("name", FieldType::Utf8, 0),
            FieldDefinition::new("age", FieldType::Int, 1),
        ];
        let def = ClassDefinition::with_fields(1, 2, 1, fields);

        assert_eq!(def.field_count(), 2);
        assert!(def.has_field("name"));
        assert!(!def.has_field("unknown"));
        assert_eq!(def.field_type("age"), Some(FieldType::Int));
        assert_eq!(def.field_names(), vec!["name", "age"]);
        assert_eq!(def.key(), (1, 2, 1));
    }

    #[test]
    fn builder_assigns_indexes_in_call_order() {
        let nested = ClassDefinition::new(1, 5, 0);
        let def = ClassDefinitionBuilder::new(1, 2, 3)
            .add_long_field("id")
            .add_bool_field("active")
            .add_portable_field("child", &nested)
            .add_portable_array_field("children", &nested)
            .build()
            .unwrap();

        assert_eq!(def.key(), (1, 2, 3));
        assert_eq!(def.field("id").unwrap().index(), 0);
        assert_eq!(def.field("active").unwrap().index(), 1);
        let child = def.field("child").unwrap();
        assert_eq!(child.index(), 2);
        assert_eq!(child.class_id(), 5);
        assert_eq!(
            def.field("children").unwrap().field_type(),
            FieldType::PortableArray
        );
    }

    #[test]
    fn builder_rejects_duplicate_names() {
        let result = ClassDefinitionBuilder::new(1, 2, 0)
            .add_int_field("x")
            .add_string_field("x")
            .build();
        assert!(matches!(result, Err(HazelcastError::DuplicateField(name)) if name == "x"));
    }

    #[test]
    fn builder_rejects_zero_nested_class_id() {
        let nested = ClassDefinition::new(1, 0, 0);
        let result = ClassDefinitionBuilder::new(1, 2, 0)
            .add_portable_field("child", &nested)
            .build();
        assert!(result.is_err());
    }
}
