//! Data input traits and implementations for Hazelcast serialization.

use std::io::Cursor;

use bytes::Buf;

use crate::error::{HazelcastError, Result};
use crate::serialization::{ByteOrder, SerializationService, Value};

/// Trait for reading primitive values from Hazelcast's binary format.
///
/// Multi-byte values are read in the byte order the input was created with.
/// Array reads return `None` for the `-1` null length.
pub trait DataInput {
    /// Reads a single byte (i8).
    fn read_byte(&mut self) -> Result<i8>;

    /// Reads a boolean from a single byte.
    fn read_bool(&mut self) -> Result<bool>;

    /// Reads a 16-bit signed integer.
    fn read_short(&mut self) -> Result<i16>;

    /// Reads a 32-bit signed integer.
    fn read_int(&mut self) -> Result<i32>;

    /// Reads a 64-bit signed integer.
    fn read_long(&mut self) -> Result<i64>;

    /// Reads a 32-bit floating point.
    fn read_float(&mut self) -> Result<f32>;

    /// Reads a 64-bit floating point.
    fn read_double(&mut self) -> Result<f64>;

    /// Reads the specified number of raw bytes.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Returns the number of bytes left to read.
    fn remaining(&self) -> usize;

    /// Reads a nested value written by [`DataOutput::write_object`].
    ///
    /// [`DataOutput::write_object`]: crate::serialization::DataOutput::write_object
    fn read_object(&mut self) -> Result<Value>;

    /// Reads a char stored as a single UTF-16 code unit.
    fn read_char(&mut self) -> Result<char> {
        let unit = self.read_short()? as u16;
        char::from_u32(u32::from(unit)).ok_or_else(|| {
            HazelcastError::Serialization(format!("unpaired surrogate 0x{:04x} in char", unit))
        })
    }

    /// Reads a length-prefixed string. A null string is an error here.
    fn read_string(&mut self) -> Result<String> {
        self.read_nullable_string()?.ok_or_else(|| {
            HazelcastError::Serialization("unexpected null string".to_string())
        })
    }

    /// Reads a length-prefixed string, returning `None` for length `-1`.
    fn read_nullable_string(&mut self) -> Result<Option<String>> {
        let Some(len) = read_length(self, 1)? else {
            return Ok(None);
        };
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| HazelcastError::Serialization(format!("invalid UTF-8 string: {}", e)))
    }

    /// Reads a length-prefixed byte array.
    fn read_byte_array(&mut self) -> Result<Option<Vec<u8>>> {
        match read_length(self, 1)? {
            Some(len) => self.read_bytes(len).map(Some),
            None => Ok(None),
        }
    }

    /// Reads a length-prefixed boolean array.
    fn read_bool_array(&mut self) -> Result<Option<Vec<bool>>> {
        read_array(self, 1, |input| input.read_bool())
    }

    /// Reads a length-prefixed char array.
    fn read_char_array(&mut self) -> Result<Option<Vec<char>>> {
        read_array(self, 2, |input| input.read_char())
    }

    /// Reads a length-prefixed short array.
    fn read_short_array(&mut self) -> Result<Option<Vec<i16>>> {
        read_array(self, 2, |input| input.read_short())
    }

    /// Reads a length-prefixed int array.
    fn read_int_array(&mut self) -> Result<Option<Vec<i32>>> {
        read_array(self, 4, |input| input.read_int())
    }

    /// Reads a length-prefixed long array.
    fn read_long_array(&mut self) -> Result<Option<Vec<i64>>> {
        read_array(self, 8, |input| input.read_long())
    }

    /// Reads a length-prefixed float array.
    fn read_float_array(&mut self) -> Result<Option<Vec<f32>>> {
        read_array(self, 4, |input| input.read_float())
    }

    /// Reads a length-prefixed double array.
    fn read_double_array(&mut self) -> Result<Option<Vec<f64>>> {
        read_array(self, 8, |input| input.read_double())
    }

    /// Reads a length-prefixed string array.
    fn read_string_array(&mut self) -> Result<Option<Vec<String>>> {
        read_array(self, 4, |input| input.read_string())
    }
}

/// Reads an array length prefix and checks that `len * min_width` bytes remain.
fn read_length<I: DataInput + ?Sized>(input: &mut I, min_width: usize) -> Result<Option<usize>> {
    let len = input.read_int()?;
    if len == -1 {
        return Ok(None);
    }
    if len < 0 {
        return Err(HazelcastError::Serialization(format!(
            "invalid array length: {}",
            len
        )));
    }
    let len = len as usize;
    let needed = len.saturating_mul(min_width);
    if needed > input.remaining() {
        return Err(HazelcastError::BufferUnderflow {
            needed,
            remaining: input.remaining(),
        });
    }
    Ok(Some(len))
}

fn read_array<I, T>(
    input: &mut I,
    min_width: usize,
    mut each: impl FnMut(&mut I) -> Result<T>,
) -> Result<Option<Vec<T>>>
where
    I: DataInput + ?Sized,
{
    let Some(len) = read_length(input, min_width)? else {
        return Ok(None);
    };
    let mut items = Vec::with_capacity(len);
    for _ in 0..len {
        items.push(each(input)?);
    }
    Ok(Some(items))
}

/// A buffer-based implementation of `DataInput`.
#[derive(Debug)]
pub struct ObjectDataInput<'a> {
    cursor: Cursor<&'a [u8]>,
    order: ByteOrder,
    service: Option<&'a SerializationService>,
}

impl<'a> ObjectDataInput<'a> {
    /// Creates a new big-endian `ObjectDataInput` from the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_order(data, ByteOrder::BigEndian)
    }

    /// Creates an input reading multi-byte values in the given byte order.
    pub fn with_order(data: &'a [u8], order: ByteOrder) -> Self {
        Self {
            cursor: Cursor::new(data),
            order,
            service: None,
        }
    }

    /// Creates an input bound to a service, enabling nested object reads.
    pub fn with_service(
        data: &'a [u8],
        order: ByteOrder,
        service: &'a SerializationService,
    ) -> Self {
        Self {
            cursor: Cursor::new(data),
            order,
            service: Some(service),
        }
    }

    /// Returns the service nested reads dispatch through, if any.
    pub fn service(&self) -> Option<&'a SerializationService> {
        self.service
    }

    /// Returns the byte order multi-byte values are read in.
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Returns the current position in the buffer.
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    /// Moves the read position. Positions past the end fail.
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        let len = self.cursor.get_ref().len();
        if position > len {
            return Err(HazelcastError::BufferUnderflow {
                needed: position,
                remaining: len,
            });
        }
        self.cursor.set_position(position as u64);
        Ok(())
    }

    /// Returns the total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    /// Returns true if the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.cursor.get_ref().is_empty()
    }

    /// Reads an int at `position` and leaves the current position unchanged.
    pub fn read_int_at(&mut self, position: usize) -> Result<i32> {
        self.peek_at(position, |input| input.read_int())
    }

    /// Reads a short at `position` and leaves the current position unchanged.
    pub fn read_short_at(&mut self, position: usize) -> Result<i16> {
        self.peek_at(position, |input| input.read_short())
    }

    /// Reads a byte at `position` and leaves the current position unchanged.
    pub fn read_byte_at(&mut self, position: usize) -> Result<i8> {
        self.peek_at(position, |input| input.read_byte())
    }

    /// Reads a big-endian int regardless of the configured order.
    pub fn read_int_be(&mut self) -> Result<i32> {
        self.ensure_remaining(4)?;
        Ok(self.cursor.get_i32())
    }

    fn peek_at<T>(&mut self, position: usize, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = self.position();
        self.set_position(position)?;
        let result = read(self);
        self.cursor.set_position(saved as u64);
        result
    }

    fn ensure_remaining(&self, n: usize) -> Result<()> {
        if self.cursor.remaining() < n {
            Err(HazelcastError::BufferUnderflow {
                needed: n,
                remaining: self.cursor.remaining(),
            })
        } else {
            Ok(())
        }
    }
}

impl DataInput for ObjectDataInput<'_> {
    fn read_byte(&mut self) -> Result<i8> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_i8())
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_u8() != 0)
    }

    fn read_short(&mut self) -> Result<i16> {
        self.ensure_remaining(2)?;
        Ok(match self.order {
            ByteOrder::BigEndian => self.cursor.get_i16(),
            ByteOrder::LittleEndian => self.cursor.get_i16_le(),
        })
    }

    fn read_int(&mut self) -> Result<i32> {
        self.ensure_remaining(4)?;
        Ok(match self.order {
            ByteOrder::BigEndian => self.cursor.get_i32(),
            ByteOrder::LittleEndian => self.cursor.get_i32_le(),
        })
    }

    fn read_long(&mut self) -> Result<i64> {
        self.ensure_remaining(8)?;
        Ok(match self.order {
            ByteOrder::BigEndian => self.cursor.get_i64(),
            ByteOrder::LittleEndian => self.cursor.get_i64_le(),
        })
    }

    fn read_float(&mut self) -> Result<f32> {
        self.ensure_remaining(4)?;
        Ok(match self.order {
            ByteOrder::BigEndian => self.cursor.get_f32(),
            ByteOrder::LittleEndian => self.cursor.get_f32_le(),
        })
    }

    fn read_double(&mut self) -> Result<f64> {
        self.ensure_remaining(8)?;
        Ok(match self.order {
            ByteOrder::BigEndian => self.cursor.get_f64(),
            ByteOrder::LittleEndian => self.cursor.get_f64_le(),
        })
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure_remaining(len)?;
        let mut buf = vec![0u8; len];
        self.cursor.copy_to_slice(&mut buf);
        Ok(buf)
    }

    fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    fn read_object(&mut self) -> Result<Value> {
        let service = self.service.ok_or_else(|| {
            HazelcastError::Serialization(
                "nested objects require an input bound to a serialization service".to_string(),
            )
        })?;
        service.read_object(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_input() {
        let data = [1, 2, 3, 4];
        let input = ObjectDataInput::new(&data);
        assert_eq!(input.remaining(), 4);
        assert_eq!(input.position(), 0);
    }

    #[test]
    fn test_read_byte_negative() {
        let data = [0xFFu8];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_byte().unwrap(), -1);
    }

    #[test]
    fn test_read_bool_nonzero_is_true() {
        let data = [42u8, 0];
        let mut input = ObjectDataInput::new(&data);
        assert!(input.read_bool().unwrap());
        assert!(!input.read_bool().unwrap());
    }

    #[test]
    fn test_read_int_big_endian() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_int().unwrap(), 0x01020304);
    }

    #[test]
    fn test_read_int_little_endian() {
        let data = [0x04, 0x03, 0x02, 0x01];
        let mut input = ObjectDataInput::with_order(&data, ByteOrder::LittleEndian);
        assert_eq!(input.read_int().unwrap(), 0x01020304);
    }

    #[test]
    fn test_read_long_big_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_long().unwrap(), 0x0102030405060708);
    }

    #[test]
    fn test_read_float_and_double() {
        let data = [
            0x3F, 0x80, 0x00, 0x00, 0x3F, 0xF0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_float().unwrap(), 1.0f32);
        assert_eq!(input.read_double().unwrap(), 1.0f64);
    }

    #[test]
    fn test_read_string() {
        let data = [0, 0, 0, 4, b't', b'e', b's', b't'];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_string().unwrap(), "test");
    }

    #[test]
    fn test_read_nullable_string_null() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_nullable_string().unwrap(), None);
    }

    #[test]
    fn test_read_string_rejects_null() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        let mut input = ObjectDataInput::new(&data);
        assert!(input.read_string().is_err());
    }

    #[test]
    fn test_invalid_utf8_string() {
        let data = [0, 0, 0, 2, 0xFF, 0xFE];
        let mut input = ObjectDataInput::new(&data);
        assert!(input.read_string().is_err());
    }

    #[test]
    fn test_read_char() {
        let data = [0x00, 0x41];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_char().unwrap(), 'A');
    }

    #[test]
    fn test_null_array_is_distinct_from_empty() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_int_array().unwrap(), None);
        assert_eq!(input.read_int_array().unwrap(), Some(vec![]));
    }

    #[test]
    fn test_array_length_past_end_is_underflow() {
        let data = [0, 0, 0, 3, 0, 0, 0, 1];
        let mut input = ObjectDataInput::new(&data);
        let err = input.read_int_array().unwrap_err();
        assert!(matches!(
            err,
            HazelcastError::BufferUnderflow {
                needed: 12,
                remaining: 4
            }
        ));
    }

    #[test]
    fn test_insufficient_data_is_underflow() {
        let data = [0x01, 0x02, 0x03];
        let mut input = ObjectDataInput::new(&data);
        assert!(matches!(
            input.read_int(),
            Err(HazelcastError::BufferUnderflow { needed: 4, remaining: 3 })
        ));
    }

    #[test]
    fn test_read_int_at_restores_position() {
        let data = [0, 0, 0, 7, 0, 0, 0, 9];
        let mut input = ObjectDataInput::new(&data);
        input.read_byte().unwrap();
        assert_eq!(input.read_int_at(4).unwrap(), 9);
        assert_eq!(input.position(), 1);
    }

    #[test]
    fn test_read_at_out_of_bounds_restores_position() {
        let data = [0, 0, 0, 7];
        let mut input = ObjectDataInput::new(&data);
        input.read_short().unwrap();
        assert!(input.read_int_at(2).is_err());
        assert_eq!(input.position(), 2);
    }

    #[test]
    fn test_set_position_past_end_fails() {
        let data = [1, 2];
        let mut input = ObjectDataInput::new(&data);
        assert!(input.set_position(3).is_err());
        assert!(input.set_position(2).is_ok());
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn test_read_int_be_ignores_order() {
        let data = [0, 0, 0, 1];
        let mut input = ObjectDataInput::with_order(&data, ByteOrder::LittleEndian);
        assert_eq!(input.read_int_be().unwrap(), 1);
    }

    #[test]
    fn test_position_advances() {
        let data = [0, 0, 0, 42, 1, 2, 3, 4];
        let mut input = ObjectDataInput::new(&data);
        input.read_int().unwrap();
        assert_eq!(input.position(), 4);
        input.read_int().unwrap();
        assert_eq!(input.position(), 8);
    }

    #[test]
    fn test_read_object_without_service_fails() {
        let data = [0, 0, 0, 0];
        let mut input = ObjectDataInput::new(&data);
        assert!(input.read_object().is_err());
    }
}
