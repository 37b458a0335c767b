//! Portable writers: the one that emits bytes and the one that only records
//! a class definition.

use std::collections::HashSet;
use std::sync::Arc;

use super::context::PortableContext;
use super::serializer::PortableSerializer;
use super::{
    ClassDefinition, ClassDefinitionBuilder, FieldDefinition, FieldType, Portable,
    PortableWriter,
};
use crate::error::{HazelcastError, Result};
use crate::serialization::data_output::length_prefix;
use crate::serialization::{DataOutput, ObjectDataOutput};

/// Writes portable fields against a known class definition.
///
/// Layout: an `int` end position, an `int` field count, a table of
/// `field_count + 1` offsets (the last pointing at the raw tail), then each
/// field as name length, name, type byte and value.
pub struct DefaultPortableWriter<'w, 's> {
    serializer: &'w PortableSerializer,
    output: &'w mut ObjectDataOutput<'s>,
    definition: Arc<ClassDefinition>,
    begin: usize,
    offset: usize,
    written: HashSet<String>,
    raw: bool,
}

impl<'w, 's> DefaultPortableWriter<'w, 's> {
    pub(crate) fn new(
        serializer: &'w PortableSerializer,
        output: &'w mut ObjectDataOutput<'s>,
        definition: Arc<ClassDefinition>,
    ) -> Result<Self> {
        let begin = output.position();
        output.write_int(0)?;
        output.write_int(length_prefix(definition.field_count())?)?;
        let offset = output.position();
        output.write_zero_bytes((definition.field_count() + 1) * 4);
        Ok(Self {
            serializer,
            output,
            definition,
            begin,
            offset,
            written: HashSet::new(),
            raw: false,
        })
    }

    /// Patches the end position into the header.
    pub(crate) fn end(self) -> Result<()> {
        let end = length_prefix(self.output.position())?;
        self.output.pwrite_int(self.begin, end)
    }

    fn set_position(&mut self, name: &str, field_type: FieldType) -> Result<FieldDefinition> {
        if self.raw {
            return Err(HazelcastError::Serialization(format!(
                "cannot write portable field '{}' after raw_data_output()",
                name
            )));
        }
        let field = self.definition.field(name).cloned().ok_or_else(|| {
            HazelcastError::Serialization(format!(
                "invalid field name: '{}' for class definition {{factory_id: {}, class_id: {}, version: {}}}",
                name,
                self.definition.factory_id(),
                self.definition.class_id(),
                self.definition.version()
            ))
        })?;
        if field.field_type() != field_type {
            return Err(HazelcastError::Serialization(format!(
                "field '{}' is declared as {}, not {}",
                name,
                field.field_type(),
                field_type
            )));
        }
        if !self.written.insert(name.to_string()) {
            return Err(HazelcastError::DuplicateField(name.to_string()));
        }

        let position = length_prefix(self.output.position())?;
        self.output
            .pwrite_int(self.offset + field.index() as usize * 4, position)?;
        self.output.write_short(name.len() as i16)?;
        self.output.write_bytes(name.as_bytes())?;
        self.output.write_byte(field_type.id() as i8)?;
        Ok(field)
    }

    fn write_field(
        &mut self,
        name: &str,
        field_type: FieldType,
        write: impl FnOnce(&mut ObjectDataOutput<'s>) -> Result<()>,
    ) -> Result<()> {
        self.set_position(name, field_type)?;
        write(&mut *self.output)
    }
}

fn check_nested(field: &FieldDefinition, portable: &dyn Portable) -> Result<()> {
    if portable.factory_id() != field.factory_id() || portable.class_id() != field.class_id() {
        return Err(HazelcastError::Serialization(format!(
            "field '{}' expects portable ({}, {}) but got ({}, {})",
            field.name(),
            field.factory_id(),
            field.class_id(),
            portable.factory_id(),
            portable.class_id()
        )));
    }
    Ok(())
}

impl PortableWriter for DefaultPortableWriter<'_, '_> {
    fn write_byte(&mut self, name: &str, value: i8) -> Result<()> {
        self.write_field(name, FieldType::Byte, |o| o.write_byte(value))
    }

    fn write_bool(&mut self, name: &str, value: bool) -> Result<()> {
        self.write_field(name, FieldType::Bool, |o| o.write_bool(value))
    }

    fn write_char(&mut self, name: &str, value: char) -> Result<()> {
        self.write_field(name, FieldType::Char, |o| o.write_char(value))
    }

    fn write_short(&mut self, name: &str, value: i16) -> Result<()> {
        self.write_field(name, FieldType::Short, |o| o.write_short(value))
    }

    fn write_int(&mut self, name: &str, value: i32) -> Result<()> {
        self.write_field(name, FieldType::Int, |o| o.write_int(value))
    }

    fn write_long(&mut self, name: &str, value: i64) -> Result<()> {
        self.write_field(name, FieldType::Long, |o| o.write_long(value))
    }

    fn write_float(&mut self, name: &str, value: f32) -> Result<()> {
        self.write_field(name, FieldType::Float, |o| o.write_float(value))
    }

    fn write_double(&mut self, name: &str, value: f64) -> Result<()> {
        self.write_field(name, FieldType::Double, |o| o.write_double(value))
    }

    fn write_string(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        self.write_field(name, FieldType::Utf8, |o| o.write_nullable_string(value))
    }

    fn write_portable(&mut self, name: &str, value: Option<&dyn Portable>) -> Result<()> {
        let field = self.set_position(name, FieldType::Portable)?;
        self.output.write_bool(value.is_none())?;
        self.output.write_int(field.factory_id())?;
        self.output.write_int(field.class_id())?;
        if let Some(portable) = value {
            check_nested(&field, portable)?;
            self.serializer.write_body(self.output, portable)?;
        }
        Ok(())
    }

    fn write_null_portable(&mut self, name: &str, factory_id: i32, class_id: i32) -> Result<()> {
        self.set_position(name, FieldType::Portable)?;
        self.output.write_bool(true)?;
        self.output.write_int(factory_id)?;
        self.output.write_int(class_id)
    }

    fn write_byte_array(&mut self, name: &str, value: Option<&[u8]>) -> Result<()> {
        self.write_field(name, FieldType::ByteArray, |o| o.write_byte_array(value))
    }

    fn write_bool_array(&mut self, name: &str, value: Option<&[bool]>) -> Result<()> {
        self.write_field(name, FieldType::BoolArray, |o| o.write_bool_array(value))
    }

    fn write_char_array(&mut self, name: &str, value: Option<&[char]>) -> Result<()> {
        self.write_field(name, FieldType::CharArray, |o| o.write_char_array(value))
    }

    fn write_short_array(&mut self, name: &str, value: Option<&[i16]>) -> Result<()> {
        self.write_field(name, FieldType::ShortArray, |o| o.write_short_array(value))
    }

    fn write_int_array(&mut self, name: &str, value: Option<&[i32]>) -> Result<()> {
        self.write_field(name, FieldType::IntArray, |o| o.write_int_array(value))
    }

    fn write_long_array(&mut self, name: &str, value: Option<&[i64]>) -> Result<()> {
        self.write_field(name, FieldType::LongArray, |o| o.write_long_array(value))
    }

    fn write_float_array(&mut self, name: &str, value: Option<&[f32]>) -> Result<()> {
        self.write_field(name, FieldType::FloatArray, |o| o.write_float_array(value))
    }

    fn write_double_array(&mut self, name: &str, value: Option<&[f64]>) -> Result<()> {
        self.write_field(name, FieldType::DoubleArray, |o| o.write_double_array(value))
    }

    fn write_string_array(&mut self, name: &str, value: Option<&[String]>) -> Result<()> {
        self.write_field(name, FieldType::Utf8Array, |o| o.write_string_array(value))
    }

    fn write_portable_array(&mut self, name: &str, value: Option<&[&dyn Portable]>) -> Result<()> {
        let field = self.set_position(name, FieldType::PortableArray)?;
        let len = match value {
            Some(items) => length_prefix(items.len())?,
            None => -1,
        };
        self.output.write_int(len)?;
        self.output.write_int(field.factory_id())?;
        self.output.write_int(field.class_id())?;

        let Some(items) = value else {
            return Ok(());
        };
        let table = self.output.position();
        self.output.write_zero_bytes(items.len() * 4);
        for (i, portable) in items.iter().enumerate() {
            check_nested(&field, *portable)?;
            let position = length_prefix(self.output.position())?;
            self.output.pwrite_int(table + i * 4, position)?;
            self.serializer.write_body(self.output, *portable)?;
        }
        Ok(())
    }

    fn raw_data_output(&mut self) -> Result<&mut dyn DataOutput> {
        if !self.raw {
            let position = length_prefix(self.output.position())?;
            let slot = self.offset + self.definition.field_count() * 4;
            self.output.pwrite_int(slot, position)?;
            self.raw = true;
        }
        Ok(&mut *self.output)
    }
}

/// Records the fields a portable writes, producing its class definition.
///
/// Nested portables register their own definitions on the way.
pub struct ClassDefinitionWriter<'c> {
    context: &'c PortableContext,
    builder: ClassDefinitionBuilder,
    sink: ObjectDataOutput<'static>,
}

impl<'c> ClassDefinitionWriter<'c> {
    /// Creates a writer that records into `builder`.
    pub fn new(context: &'c PortableContext, builder: ClassDefinitionBuilder) -> Self {
        Self {
            context,
            builder,
            sink: ObjectDataOutput::new(),
        }
    }

    /// Returns the recorded definition.
    pub fn finish(self) -> Result<ClassDefinition> {
        self.builder.build()
    }

    fn add(&mut self, name: &str, field_type: FieldType) -> Result<()> {
        let index = self.builder.next_index();
        self.builder
            .try_add(FieldDefinition::new(name, field_type, index))
    }

    fn add_nested(&mut self, name: &str, field_type: FieldType, nested: &ClassDefinition) -> Result<()> {
        let index = self.builder.next_index();
        let field = match field_type {
            FieldType::PortableArray => FieldDefinition::new_portable_array(
                name,
                index,
                nested.factory_id(),
                nested.class_id(),
                nested.version(),
            ),
            _ => FieldDefinition::new_portable(
                name,
                index,
                nested.factory_id(),
                nested.class_id(),
                nested.version(),
            ),
        };
        self.builder.try_add(field)
    }
}

impl PortableWriter for ClassDefinitionWriter<'_> {
    fn write_byte(&mut self, name: &str, _value: i8) -> Result<()> {
        self.add(name, FieldType::Byte)
    }

    fn write_bool(&mut self, name: &str, _value: bool) -> Result<()> {
        self.add(name, FieldType::Bool)
    }

    fn write_char(&mut self, name: &str, _value: char) -> Result<()> {
        self.add(name, FieldType::Char)
    }

    fn write_short(&mut self, name: &str, _value: i16) -> Result<()> {
        self.add(name, FieldType::Short)
    }

    fn write_int(&mut self, name: &str, _value: i32) -> Result<()> {
        self.add(name, FieldType::Int)
    }

    fn write_long(&mut self, name: &str, _value: i64) -> Result<()> {
        self.add(name, FieldType::Long)
    }

    fn write_float(&mut self, name: &str, _value: f32) -> Result<()> {
        self.add(name, FieldType::Float)
    }

    fn write_double(&mut self, name: &str, _value: f64) -> Result<()> {
        self.add(name, FieldType::Double)
    }

    fn write_string(&mut self, name: &str, _value: Option<&str>) -> Result<()> {
        self.add(name, FieldType::Utf8)
    }

    fn write_portable(&mut self, name: &str, value: Option<&dyn Portable>) -> Result<()> {
        let portable = value.ok_or_else(|| {
            HazelcastError::Serialization(format!(
                "cannot write null portable field '{}' without a registered class definition; use write_null_portable",
                name
            ))
        })?;
        let nested = self.context.lookup_or_register(portable)?;
        self.add_nested(name, FieldType::Portable, &nested)
    }

    fn write_null_portable(&mut self, name: &str, factory_id: i32, class_id: i32) -> Result<()> {
        let nested = self
            .context
            .lookup_nested(factory_id, class_id)
            .ok_or_else(|| {
                HazelcastError::Serialization(format!(
                    "cannot write null portable field '{}': class definition ({}, {}) is not registered",
                    name, factory_id, class_id
                ))
            })?;
        self.add_nested(name, FieldType::Portable, &nested)
    }

    fn write_byte_array(&mut self, name: &str, _value: Option<&[u8]>) -> Result<()> {
        self.add(name, FieldType::ByteArray)
    }

    fn write_bool_array(&mut self, name: &str, _value: Option<&[bool]>) -> Result<()> {
        self.add(name, FieldType::BoolArray)
    }

    fn write_char_array(&mut self, name: &str, _value: Option<&[char]>) -> Result<()> {
        self.add(name, FieldType::CharArray)
    }

    fn write_short_array(&mut self, name: &str, _value: Option<&[i16]>) -> Result<()> {
        self.add(name, FieldType::ShortArray)
    }

    fn write_int_array(&mut self, name: &str, _value: Option<&[i32]>) -> Result<()> {
        self.add(name, FieldType::IntArray)
    }

    fn write_long_array(&mut self, name: &str, _value: Option<&[i64]>) -> Result<()> {
        self.add(name, FieldType::LongArray)
    }

    fn write_float_array(&mut self, name: &str, _value: Option<&[f32]>) -> Result<()> {
        self.add(name, FieldType::FloatArray)
    }

    fn write_double_array(&mut self, name: &str, _value: Option<&[f64]>) -> Result<()> {
        self.add(name, FieldType::DoubleArray)
    }

    fn write_string_array(&mut self, name: &str, _value: Option<&[String]>) -> Result<()> {
        self.add(name, FieldType::Utf8Array)
    }

    fn write_portable_array(&mut self, name: &str, value: Option<&[&dyn Portable]>) -> Result<()> {
        let items = value.filter(|items| !items.is_empty()).ok_or_else(|| {
            HazelcastError::Serialization(format!(
                "cannot write empty portable array field '{}' without a registered class definition",
                name
            ))
        })?;
        let first = items[0];
        if items.iter().any(|p| p.class_id() != first.class_id()) {
            return Err(HazelcastError::Serialization(format!(
                "portable array field '{}' mixes class ids",
                name
            )));
        }
        let nested = self.context.lookup_or_register(first)?;
        self.add_nested(name, FieldType::PortableArray, &nested)
    }

    fn raw_data_output(&mut self) -> Result<&mut dyn DataOutput> {
        Ok(&mut self.sink)
    }
}
