//! Portable readers for payloads written with the local class version and
//! for payloads written with a different one.

use std::sync::Arc;

use super::context::to_position;
use super::serializer::PortableSerializer;
use super::{ClassDefinition, FieldDefinition, FieldType, Portable, PortableReader};
use crate::error::{HazelcastError, Result};
use crate::serialization::{DataInput, ObjectDataInput};

/// Reads portable fields through the payload's offset table.
///
/// Every named read must match the field type recorded in the payload's
/// class definition exactly.
pub struct DefaultPortableReader<'r, 'a> {
    serializer: &'r PortableSerializer,
    input: &'r mut ObjectDataInput<'a>,
    definition: Arc<ClassDefinition>,
    offset: usize,
    final_position: usize,
    raw: bool,
    depth: usize,
}

impl<'r, 'a> DefaultPortableReader<'r, 'a> {
    pub(crate) fn new(
        serializer: &'r PortableSerializer,
        input: &'r mut ObjectDataInput<'a>,
        definition: Arc<ClassDefinition>,
        depth: usize,
    ) -> Result<Self> {
        let final_position = to_position(input.read_int()?)?;
        let field_count = input.read_int()?;
        if usize::try_from(field_count).ok() != Some(definition.field_count()) {
            return Err(HazelcastError::Serialization(format!(
                "field count mismatch: payload has {} fields, class definition ({}, {}, {}) has {}",
                field_count,
                definition.factory_id(),
                definition.class_id(),
                definition.version(),
                definition.field_count()
            )));
        }
        let offset = input.position();
        Ok(Self {
            serializer,
            input,
            definition,
            offset,
            final_position,
            raw: false,
            depth,
        })
    }

    /// Leaves the stream at the end of this portable.
    pub(crate) fn end(self) -> Result<()> {
        self.input.set_position(self.final_position)
    }

    pub(crate) fn definition(&self) -> &ClassDefinition {
        &self.definition
    }

    fn position_of(&mut self, name: &str, field_type: FieldType) -> Result<usize> {
        if self.raw {
            return Err(HazelcastError::Serialization(format!(
                "cannot read portable field '{}' after raw_data_input()",
                name
            )));
        }
        let field = self.definition.field(name).ok_or_else(|| {
            HazelcastError::Serialization(format!(
                "unknown field name: '{}' for class definition {{factory_id: {}, class_id: {}, version: {}}}",
                name,
                self.definition.factory_id(),
                self.definition.class_id(),
                self.definition.version()
            ))
        })?;
        if field.field_type() != field_type {
            return Err(incompatible(field, field_type));
        }
        let index = field.index() as usize;

        let position = to_position(self.input.read_int_at(self.offset + index * 4)?)?;
        let name_len = self.input.read_short_at(position)?;
        let name_len = usize::try_from(name_len).map_err(|_| {
            HazelcastError::Serialization(format!("negative field name length: {}", name_len))
        })?;
        Ok(position + 2 + name_len + 1)
    }

    fn read_field<T>(
        &mut self,
        name: &str,
        field_type: FieldType,
        read: impl FnOnce(&mut ObjectDataInput<'a>) -> Result<T>,
    ) -> Result<T> {
        let position = self.position_of(name, field_type)?;
        self.input.set_position(position)?;
        read(&mut *self.input)
    }

    fn check_nested(&self, name: &str, factory_id: i32, class_id: i32) -> Result<()> {
        if let Some(field) = self.definition.field(name) {
            if field.factory_id() != factory_id || field.class_id() != class_id {
                return Err(HazelcastError::Serialization(format!(
                    "field '{}' declares portable ({}, {}) but the payload holds ({}, {})",
                    name,
                    field.factory_id(),
                    field.class_id(),
                    factory_id,
                    class_id
                )));
            }
        }
        Ok(())
    }
}

fn incompatible(field: &FieldDefinition, expected: FieldType) -> HazelcastError {
    HazelcastError::IncompatibleClassChange(format!(
        "Incompatible to read {} from {} while reading field: {}",
        expected,
        field.field_type(),
        field.name()
    ))
}

impl PortableReader for DefaultPortableReader<'_, '_> {
    fn version(&self) -> i32 {
        self.definition.version()
    }

    fn has_field(&self, name: &str) -> bool {
        self.definition.has_field(name)
    }

    fn field_names(&self) -> Vec<String> {
        self.definition
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    fn field_type(&self, name: &str) -> Option<FieldType> {
        self.definition.field_type(name)
    }

    fn read_byte(&mut self, name: &str) -> Result<i8> {
        self.read_field(name, FieldType::Byte, |i| i.read_byte())
    }

    fn read_bool(&mut self, name: &str) -> Result<bool> {
        self.read_field(name, FieldType::Bool, |i| i.read_bool())
    }

    fn read_char(&mut self, name: &str) -> Result<char> {
        self.read_field(name, FieldType::Char, |i| i.read_char())
    }

    fn read_short(&mut self, name: &str) -> Result<i16> {
        self.read_field(name, FieldType::Short, |i| i.read_short())
    }

    fn read_int(&mut self, name: &str) -> Result<i32> {
        self.read_field(name, FieldType::Int, |i| i.read_int())
    }

    fn read_long(&mut self, name: &str) -> Result<i64> {
        self.read_field(name, FieldType::Long, |i| i.read_long())
    }

    fn read_float(&mut self, name: &str) -> Result<f32> {
        self.read_field(name, FieldType::Float, |i| i.read_float())
    }

    fn read_double(&mut self, name: &str) -> Result<f64> {
        self.read_field(name, FieldType::Double, |i| i.read_double())
    }

    fn read_string(&mut self, name: &str) -> Result<Option<String>> {
        self.read_field(name, FieldType::Utf8, |i| i.read_nullable_string())
    }

    fn read_portable(&mut self, name: &str) -> Result<Option<Arc<dyn Portable>>> {
        let position = self.position_of(name, FieldType::Portable)?;
        self.input.set_position(position)?;
        let is_null = self.input.read_bool()?;
        let factory_id = self.input.read_int()?;
        let class_id = self.input.read_int()?;
        self.check_nested(name, factory_id, class_id)?;
        if is_null {
            return Ok(None);
        }
        let portable =
            self.serializer
                .read_body(self.input, factory_id, class_id, self.depth + 1)?;
        Ok(Some(Arc::from(portable)))
    }

    fn read_byte_array(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        self.read_field(name, FieldType::ByteArray, |i| i.read_byte_array())
    }

    fn read_bool_array(&mut self, name: &str) -> Result<Option<Vec<bool>>> {
        self.read_field(name, FieldType::BoolArray, |i| i.read_bool_array())
    }

    fn read_char_array(&mut self, name: &str) -> Result<Option<Vec<char>>> {
        self.read_field(name, FieldType::CharArray, |i| i.read_char_array())
    }

    fn read_short_array(&mut self, name: &str) -> Result<Option<Vec<i16>>> {
        self.read_field(name, FieldType::ShortArray, |i| i.read_short_array())
    }

    fn read_int_array(&mut self, name: &str) -> Result<Option<Vec<i32>>> {
        self.read_field(name, FieldType::IntArray, |i| i.read_int_array())
    }

    fn read_long_array(&mut self, name: &str) -> Result<Option<Vec<i64>>> {
        self.read_field(name, FieldType::LongArray, |i| i.read_long_array())
    }

    fn read_float_array(&mut self, name: &str) -> Result<Option<Vec<f32>>> {
        self.read_field(name, FieldType::FloatArray, |i| i.read_float_array())
    }

    fn read_double_array(&mut self, name: &str) -> Result<Option<Vec<f64>>> {
        self.read_field(name, FieldType::DoubleArray, |i| i.read_double_array())
    }

    fn read_string_array(&mut self, name: &str) -> Result<Option<Vec<String>>> {
        self.read_field(name, FieldType::Utf8Array, |i| i.read_string_array())
    }

    fn read_portable_array(&mut self, name: &str) -> Result<Option<Vec<Arc<dyn Portable>>>> {
        let position = self.position_of(name, FieldType::PortableArray)?;
        self.input.set_position(position)?;
        let len = self.input.read_int()?;
        let factory_id = self.input.read_int()?;
        let class_id = self.input.read_int()?;
        if len < 0 {
            return Ok(None);
        }
        self.check_nested(name, factory_id, class_id)?;

        let table = self.input.position();
        let len = len as usize;
        if len.saturating_mul(4) > self.input.remaining() {
            return Err(HazelcastError::BufferUnderflow {
                needed: len.saturating_mul(4),
                remaining: self.input.remaining(),
            });
        }
        let mut items = Vec::with_capacity(len);
        for i in 0..len {
            let item_position = to_position(self.input.read_int_at(table + i * 4)?)?;
            self.input.set_position(item_position)?;
            let portable =
                self.serializer
                    .read_body(self.input, factory_id, class_id, self.depth + 1)?;
            items.push(Arc::from(portable));
        }
        Ok(Some(items))
    }

    fn raw_data_input(&mut self) -> Result<&mut dyn DataInput> {
        if !self.raw {
            let slot = self.offset + self.definition.field_count() * 4;
            let position = to_position(self.input.read_int_at(slot)?)?;
            self.input.set_position(position)?;
            self.raw = true;
        }
        Ok(&mut *self.input)
    }
}

/// Reads a payload written with a different class version than the local
/// one.
///
/// Fields missing from the payload read as their zero value, and numeric
/// fields widen the way Java primitives do. Any other type mismatch is an
/// [`IncompatibleClassChange`](HazelcastError::IncompatibleClassChange).
pub struct MorphingPortableReader<'r, 'a> {
    inner: DefaultPortableReader<'r, 'a>,
}

impl<'r, 'a> MorphingPortableReader<'r, 'a> {
    pub(crate) fn new(inner: DefaultPortableReader<'r, 'a>) -> Self {
        Self { inner }
    }

    pub(crate) fn end(self) -> Result<()> {
        self.inner.end()
    }

    /// Returns the payload's type for `name`, `None` if absent, or an error
    /// when the type is not among `accepted`.
    fn source_type(&self, name: &str, expected: FieldType, accepted: &[FieldType]) -> Result<Option<FieldType>> {
        let Some(field) = self.inner.definition().field(name) else {
            return Ok(None);
        };
        if field.field_type() == expected || accepted.contains(&field.field_type()) {
            Ok(Some(field.field_type()))
        } else {
            Err(incompatible(field, expected))
        }
    }

    fn read_exact<T: Default>(
        &mut self,
        name: &str,
        expected: FieldType,
        read: impl FnOnce(&mut DefaultPortableReader<'r, 'a>) -> Result<T>,
    ) -> Result<T> {
        match self.source_type(name, expected, &[])? {
            Some(_) => read(&mut self.inner),
            None => Ok(T::default()),
        }
    }
}

impl PortableReader for MorphingPortableReader<'_, '_> {
    fn version(&self) -> i32 {
        self.inner.version()
    }

    fn has_field(&self, name: &str) -> bool {
        self.inner.has_field(name)
    }

    fn field_names(&self) -> Vec<String> {
        self.inner.field_names()
    }

    fn field_type(&self, name: &str) -> Option<FieldType> {
        self.inner.field_type(name)
    }

    fn read_byte(&mut self, name: &str) -> Result<i8> {
        self.read_exact(name, FieldType::Byte, |r| r.read_byte(name))
    }

    fn read_bool(&mut self, name: &str) -> Result<bool> {
        self.read_exact(name, FieldType::Bool, |r| r.read_bool(name))
    }

    fn read_char(&mut self, name: &str) -> Result<char> {
        self.read_exact(name, FieldType::Char, |r| r.read_char(name))
    }

    fn read_short(&mut self, name: &str) -> Result<i16> {
        match self.source_type(name, FieldType::Short, &[FieldType::Byte])? {
            Some(FieldType::Byte) => Ok(self.inner.read_byte(name)? as i16),
            Some(_) => self.inner.read_short(name),
            None => Ok(0),
        }
    }

    fn read_int(&mut self, name: &str) -> Result<i32> {
        let accepted = [FieldType::Byte, FieldType::Char, FieldType::Short];
        match self.source_type(name, FieldType::Int, &accepted)? {
            Some(FieldType::Byte) => Ok(self.inner.read_byte(name)? as i32),
            Some(FieldType::Char) => Ok(self.inner.read_char(name)? as i32),
            Some(FieldType::Short) => Ok(self.inner.read_short(name)? as i32),
            Some(_) => self.inner.read_int(name),
            None => Ok(0),
        }
    }

    fn read_long(&mut self, name: &str) -> Result<i64> {
        let accepted = [
            FieldType::Byte,
            FieldType::Char,
            FieldType::Short,
            FieldType::Int,
        ];
        match self.source_type(name, FieldType::Long, &accepted)? {
            Some(FieldType::Byte) => Ok(self.inner.read_byte(name)? as i64),
            Some(FieldType::Char) => Ok(self.inner.read_char(name)? as i64),
            Some(FieldType::Short) => Ok(self.inner.read_short(name)? as i64),
            Some(FieldType::Int) => Ok(self.inner.read_int(name)? as i64),
            Some(_) => self.inner.read_long(name),
            None => Ok(0),
        }
    }

    fn read_float(&mut self, name: &str) -> Result<f32> {
        let accepted = [
            FieldType::Byte,
            FieldType::Char,
            FieldType::Short,
            FieldType::Int,
        ];
        match self.source_type(name, FieldType::Float, &accepted)? {
            Some(FieldType::Byte) => Ok(self.inner.read_byte(name)? as f32),
            Some(FieldType::Char) => Ok(self.inner.read_char(name)? as u32 as f32),
            Some(FieldType::Short) => Ok(self.inner.read_short(name)? as f32),
            Some(FieldType::Int) => Ok(self.inner.read_int(name)? as f32),
            Some(_) => self.inner.read_float(name),
            None => Ok(0.0),
        }
    }

    fn read_double(&mut self, name: &str) -> Result<f64> {
        let accepted = [
            FieldType::Byte,
            FieldType::Char,
            FieldType::Short,
            FieldType::Int,
            FieldType::Long,
            FieldType::Float,
        ];
        match self.source_type(name, FieldType::Double, &accepted)? {
            Some(FieldType::Byte) => Ok(self.inner.read_byte(name)? as f64),
            Some(FieldType::Char) => Ok(self.inner.read_char(name)? as u32 as f64),
            Some(FieldType::Short) => Ok(self.inner.read_short(name)? as f64),
            Some(FieldType::Int) => Ok(self.inner.read_int(name)? as f64),
            Some(FieldType::Long) => Ok(self.inner.read_long(name)? as f64),
            Some(FieldType::Float) => Ok(self.inner.read_float(name)? as f64),
            Some(_) => self.inner.read_double(name),
            None => Ok(0.0),
        }
    }

    fn read_string(&mut self, name: &str) -> Result<Option<String>> {
        self.read_exact(name, FieldType::Utf8, |r| r.read_string(name))
    }

    fn read_portable(&mut self, name: &str) -> Result<Option<Arc<dyn Portable>>> {
        self.read_exact(name, FieldType::Portable, |r| r.read_portable(name))
    }

    fn read_byte_array(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        self.read_exact(name, FieldType::ByteArray, |r| r.read_byte_array(name))
    }

    fn read_bool_array(&mut self, name: &str) -> Result<Option<Vec<bool>>> {
        self.read_exact(name, FieldType::BoolArray, |r| r.read_bool_array(name))
    }

    fn read_char_array(&mut self, name: &str) -> Result<Option<Vec<char>>> {
        self.read_exact(name, FieldType::CharArray, |r| r.read_char_array(name))
    }

    fn read_short_array(&mut self, name: &str) -> Result<Option<Vec<i16>>> {
        self.read_exact(name, FieldType::ShortArray, |r| r.read_short_array(name))
    }

    fn read_int_array(&mut self, name: &str) -> Result<Option<Vec<i32>>> {
        self.read_exact(name, FieldType::IntArray, |r| r.read_int_array(name))
    }

    fn read_long_array(&mut self, name: &str) -> Result<Option<Vec<i64>>> {
        self.read_exact(name, FieldType::LongArray, |r| r.read_long_array(name))
    }

    fn read_float_array(&mut self, name: &str) -> Result<Option<Vec<f32>>> {
        self.read_exact(name, FieldType::FloatArray, |r| r.read_float_array(name))
    }

    fn read_double_array(&mut self, name: &str) -> Result<Option<Vec<f64>>> {
        self.read_exact(name, FieldType::DoubleArray, |r| r.read_double_array(name))
    }

    fn read_string_array(&mut self, name: &str) -> Result<Option<Vec<String>>> {
        self.read_exact(name, FieldType::Utf8Array, |r| r.read_string_array(name))
    }

    fn read_portable_array(&mut self, name: &str) -> Result<Option<Vec<Arc<dyn Portable>>>> {
        self.read_exact(name, FieldType::PortableArray, |r| r.read_portable_array(name))
    }

    fn raw_data_input(&mut self) -> Result<&mut dyn DataInput> {
        self.inner.raw_data_input()
    }
}
