//! Data output traits and implementations for Hazelcast serialization.

use bytes::{BufMut, BytesMut};

use crate::error::{HazelcastError, Result};
use crate::serialization::constants::NULL_ARRAY_LENGTH;
use crate::serialization::{ByteOrder, SerializationService, Value};

/// Trait for writing primitive values in Hazelcast's binary format.
///
/// Multi-byte values honour the byte order the output was created with.
/// Arrays are prefixed with their length, `-1` marking a null array.
pub trait DataOutput {
    /// Writes a single byte (i8).
    fn write_byte(&mut self, v: i8) -> Result<()>;

    /// Writes a boolean as a single byte (0 for false, 1 for true).
    fn write_bool(&mut self, v: bool) -> Result<()>;

    /// Writes a 16-bit signed integer.
    fn write_short(&mut self, v: i16) -> Result<()>;

    /// Writes a 32-bit signed integer.
    fn write_int(&mut self, v: i32) -> Result<()>;

    /// Writes a 64-bit signed integer.
    fn write_long(&mut self, v: i64) -> Result<()>;

    /// Writes a 32-bit floating point.
    fn write_float(&mut self, v: f32) -> Result<()>;

    /// Writes a 64-bit floating point.
    fn write_double(&mut self, v: f64) -> Result<()>;

    /// Writes raw bytes without length prefix.
    fn write_bytes(&mut self, v: &[u8]) -> Result<()>;

    /// Writes a nested value as its type id followed by its serialized form.
    fn write_object(&mut self, v: &Value) -> Result<()>;

    /// Writes a char as a single UTF-16 code unit.
    fn write_char(&mut self, v: char) -> Result<()> {
        let unit = u16::try_from(u32::from(v)).map_err(|_| {
            HazelcastError::Serialization(format!(
                "char {:?} does not fit in a single UTF-16 code unit",
                v
            ))
        })?;
        self.write_short(unit as i16)
    }

    /// Writes a string with its UTF-8 byte length prefix.
    fn write_string(&mut self, v: &str) -> Result<()> {
        let bytes = v.as_bytes();
        self.write_int(length_prefix(bytes.len())?)?;
        self.write_bytes(bytes)
    }

    /// Writes an optional string, `None` encoded as length `-1`.
    fn write_nullable_string(&mut self, v: Option<&str>) -> Result<()> {
        match v {
            Some(s) => self.write_string(s),
            None => self.write_int(NULL_ARRAY_LENGTH),
        }
    }

    /// Writes a length-prefixed byte array.
    fn write_byte_array(&mut self, v: Option<&[u8]>) -> Result<()> {
        match v {
            Some(bytes) => {
                self.write_int(length_prefix(bytes.len())?)?;
                self.write_bytes(bytes)
            }
            None => self.write_int(NULL_ARRAY_LENGTH),
        }
    }

    /// Writes a length-prefixed boolean array.
    fn write_bool_array(&mut self, v: Option<&[bool]>) -> Result<()> {
        write_array(self, v, |out, b| out.write_bool(*b))
    }

    /// Writes a length-prefixed char array.
    fn write_char_array(&mut self, v: Option<&[char]>) -> Result<()> {
        write_array(self, v, |out, c| out.write_char(*c))
    }

    /// Writes a length-prefixed short array.
    fn write_short_array(&mut self, v: Option<&[i16]>) -> Result<()> {
        write_array(self, v, |out, n| out.write_short(*n))
    }

    /// Writes a length-prefixed int array.
    fn write_int_array(&mut self, v: Option<&[i32]>) -> Result<()> {
        write_array(self, v, |out, n| out.write_int(*n))
    }

    /// Writes a length-prefixed long array.
    fn write_long_array(&mut self, v: Option<&[i64]>) -> Result<()> {
        write_array(self, v, |out, n| out.write_long(*n))
    }

    /// Writes a length-prefixed float array.
    fn write_float_array(&mut self, v: Option<&[f32]>) -> Result<()> {
        write_array(self, v, |out, n| out.write_float(*n))
    }

    /// Writes a length-prefixed double array.
    fn write_double_array(&mut self, v: Option<&[f64]>) -> Result<()> {
        write_array(self, v, |out, n| out.write_double(*n))
    }

    /// Writes a length-prefixed string array.
    fn write_string_array(&mut self, v: Option<&[String]>) -> Result<()> {
        write_array(self, v, |out, s| out.write_string(s))
    }
}

/// Converts a collection length to the signed 32-bit prefix used on the wire.
pub(crate) fn length_prefix(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| {
        HazelcastError::Serialization(format!("length {} exceeds the maximum array size", len))
    })
}

fn write_array<O, T>(
    out: &mut O,
    items: Option<&[T]>,
    mut each: impl FnMut(&mut O, &T) -> Result<()>,
) -> Result<()>
where
    O: DataOutput + ?Sized,
{
    let Some(items) = items else {
        return out.write_int(NULL_ARRAY_LENGTH);
    };
    out.write_int(length_prefix(items.len())?)?;
    for item in items {
        each(out, item)?;
    }
    Ok(())
}

/// A growable buffer implementing [`DataOutput`].
///
/// Writes always append; the `pwrite_*` family patches bytes that were already
/// written without moving the write position.
#[derive(Debug)]
pub struct ObjectDataOutput<'s> {
    buffer: BytesMut,
    order: ByteOrder,
    service: Option<&'s SerializationService>,
}

impl ObjectDataOutput<'static> {
    /// Creates a new big-endian `ObjectDataOutput` with default capacity.
    pub fn new() -> Self {
        Self::with_order(ByteOrder::BigEndian)
    }

    /// Creates a new `ObjectDataOutput` writing in the given byte order.
    pub fn with_order(order: ByteOrder) -> Self {
        Self {
            buffer: BytesMut::with_capacity(256),
            order,
            service: None,
        }
    }

    /// Creates a new big-endian `ObjectDataOutput` with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            order: ByteOrder::BigEndian,
            service: None,
        }
    }
}

impl<'s> ObjectDataOutput<'s> {
    /// Creates an output bound to a service, enabling nested object writes.
    pub fn with_service(order: ByteOrder, service: &'s SerializationService) -> Self {
        Self {
            buffer: BytesMut::with_capacity(256),
            order,
            service: Some(service),
        }
    }

    /// Returns the service nested writes dispatch through, if any.
    pub fn service(&self) -> Option<&'s SerializationService> {
        self.service
    }

    /// Returns the byte order multi-byte values are written in.
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Returns the written bytes as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the output and returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the position the next write lands at.
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the buffer, removing all written data.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Appends `n` zero bytes, typically reserving room patched later.
    pub fn write_zero_bytes(&mut self, n: usize) {
        self.buffer.put_bytes(0, n);
    }

    /// Writes a 32-bit integer big-endian regardless of the configured order.
    pub fn write_int_be(&mut self, v: i32) -> Result<()> {
        self.buffer.put_i32(v);
        Ok(())
    }

    /// Overwrites one byte at `position`.
    pub fn pwrite_byte(&mut self, position: usize, v: i8) -> Result<()> {
        self.patch(position, &[v as u8])
    }

    /// Overwrites a boolean at `position`.
    pub fn pwrite_bool(&mut self, position: usize, v: bool) -> Result<()> {
        self.patch(position, &[u8::from(v)])
    }

    /// Sets or clears bit `bit` of the byte at `position`.
    pub fn pwrite_bool_bit(&mut self, position: usize, bit: u8, v: bool) -> Result<()> {
        let current = *self.buffer.get(position).ok_or_else(|| out_of_bounds(position, 1, self.len()))?;
        let mask = 1u8 << bit;
        let updated = if v { current | mask } else { current & !mask };
        self.patch(position, &[updated])
    }

    /// Overwrites a 16-bit integer at `position`.
    pub fn pwrite_short(&mut self, position: usize, v: i16) -> Result<()> {
        let bytes = match self.order {
            ByteOrder::BigEndian => v.to_be_bytes(),
            ByteOrder::LittleEndian => v.to_le_bytes(),
        };
        self.patch(position, &bytes)
    }

    /// Overwrites a 32-bit integer at `position` without moving the write position.
    pub fn pwrite_int(&mut self, position: usize, v: i32) -> Result<()> {
        let bytes = match self.order {
            ByteOrder::BigEndian => v.to_be_bytes(),
            ByteOrder::LittleEndian => v.to_le_bytes(),
        };
        self.patch(position, &bytes)
    }

    /// Overwrites a 64-bit integer at `position`.
    pub fn pwrite_long(&mut self, position: usize, v: i64) -> Result<()> {
        let bytes = match self.order {
            ByteOrder::BigEndian => v.to_be_bytes(),
            ByteOrder::LittleEndian => v.to_le_bytes(),
        };
        self.patch(position, &bytes)
    }

    /// Overwrites a 32-bit float at `position`.
    pub fn pwrite_float(&mut self, position: usize, v: f32) -> Result<()> {
        self.pwrite_int(position, v.to_bits() as i32)
    }

    /// Overwrites a 64-bit float at `position`.
    pub fn pwrite_double(&mut self, position: usize, v: f64) -> Result<()> {
        self.pwrite_long(position, v.to_bits() as i64)
    }

    /// Overwrites a 32-bit integer big-endian regardless of the configured order.
    pub fn pwrite_int_be(&mut self, position: usize, v: i32) -> Result<()> {
        self.patch(position, &v.to_be_bytes())
    }

    fn patch(&mut self, position: usize, bytes: &[u8]) -> Result<()> {
        let end = position
            .checked_add(bytes.len())
            .filter(|end| *end <= self.buffer.len())
            .ok_or_else(|| out_of_bounds(position, bytes.len(), self.buffer.len()))?;
        self.buffer[position..end].copy_from_slice(bytes);
        Ok(())
    }
}

fn out_of_bounds(position: usize, width: usize, len: usize) -> HazelcastError {
    HazelcastError::Serialization(format!(
        "positional write of {} bytes at {} is outside the {} bytes written",
        width, position, len
    ))
}

impl Default for ObjectDataOutput<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl DataOutput for ObjectDataOutput<'_> {
    fn write_byte(&mut self, v: i8) -> Result<()> {
        self.buffer.put_i8(v);
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.buffer.put_u8(u8::from(v));
        Ok(())
    }

    fn write_short(&mut self, v: i16) -> Result<()> {
        match self.order {
            ByteOrder::BigEndian => self.buffer.put_i16(v),
            ByteOrder::LittleEndian => self.buffer.put_i16_le(v),
        }
        Ok(())
    }

    fn write_int(&mut self, v: i32) -> Result<()> {
        match self.order {
            ByteOrder::BigEndian => self.buffer.put_i32(v),
            ByteOrder::LittleEndian => self.buffer.put_i32_le(v),
        }
        Ok(())
    }

    fn write_long(&mut self, v: i64) -> Result<()> {
        match self.order {
            ByteOrder::BigEndian => self.buffer.put_i64(v),
            ByteOrder::LittleEndian => self.buffer.put_i64_le(v),
        }
        Ok(())
    }

    fn write_float(&mut self, v: f32) -> Result<()> {
        match self.order {
            ByteOrder::BigEndian => self.buffer.put_f32(v),
            ByteOrder::LittleEndian => self.buffer.put_f32_le(v),
        }
        Ok(())
    }

    fn write_double(&mut self, v: f64) -> Result<()> {
        match self.order {
            ByteOrder::BigEndian => self.buffer.put_f64(v),
            ByteOrder::LittleEndian => self.buffer.put_f64_le(v),
        }
        Ok(())
    }

    fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.buffer.put_slice(v);
        Ok(())
    }

    fn write_object(&mut self, v: &Value) -> Result<()> {
        let service = self.service.ok_or_else(|| {
            HazelcastError::Serialization(
                "nested objects require an output bound to a serialization service".to_string(),
            )
        })?;
        service.write_object(self, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_output_is_empty() {
        let output = ObjectDataOutput::new();
        assert!(output.is_empty());
        assert_eq!(output.len(), 0);
        assert_eq!(output.byte_order(), ByteOrder::BigEndian);
    }

    #[test]
    fn test_write_byte_negative() {
        let mut output = ObjectDataOutput::new();
        output.write_byte(-1).unwrap();
        assert_eq!(output.as_bytes(), &[0xFF]);
    }

    #[test]
    fn test_write_bool() {
        let mut output = ObjectDataOutput::new();
        output.write_bool(true).unwrap();
        output.write_bool(false).unwrap();
        assert_eq!(output.as_bytes(), &[1, 0]);
    }

    #[test]
    fn test_write_int_big_endian() {
        let mut output = ObjectDataOutput::new();
        output.write_int(0x01020304).unwrap();
        assert_eq!(output.as_bytes(), &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_write_int_little_endian() {
        let mut output = ObjectDataOutput::with_order(ByteOrder::LittleEndian);
        output.write_int(0x01020304).unwrap();
        assert_eq!(output.as_bytes(), &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_write_long_both_orders() {
        let mut be = ObjectDataOutput::new();
        be.write_long(0x0102030405060708).unwrap();
        assert_eq!(be.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);

        let mut le = ObjectDataOutput::with_order(ByteOrder::LittleEndian);
        le.write_long(0x0102030405060708).unwrap();
        assert_eq!(le.as_bytes(), &[8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_write_string_uses_byte_length() {
        let mut output = ObjectDataOutput::new();
        output.write_string("aé").unwrap();
        assert_eq!(output.as_bytes(), &[0, 0, 0, 3, b'a', 0xC3, 0xA9]);
    }

    #[test]
    fn test_write_nullable_string_none() {
        let mut output = ObjectDataOutput::new();
        output.write_nullable_string(None).unwrap();
        assert_eq!(output.as_bytes(), &[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_write_char_as_utf16_unit() {
        let mut output = ObjectDataOutput::new();
        output.write_char('A').unwrap();
        assert_eq!(output.as_bytes(), &[0x00, 0x41]);
    }

    #[test]
    fn test_write_char_outside_bmp_fails() {
        let mut output = ObjectDataOutput::new();
        assert!(output.write_char('\u{1F600}').is_err());
    }

    #[test]
    fn test_null_and_empty_arrays_differ() {
        let mut output = ObjectDataOutput::new();
        output.write_int_array(None).unwrap();
        output.write_int_array(Some(&[])).unwrap();
        assert_eq!(output.as_bytes(), &[0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0]);
    }

    #[test]
    fn test_write_short_array() {
        let mut output = ObjectDataOutput::new();
        output.write_short_array(Some(&[1, -1])).unwrap();
        assert_eq!(output.as_bytes(), &[0, 0, 0, 2, 0, 1, 0xFF, 0xFF]);
    }

    #[test]
    fn test_pwrite_int_keeps_position() {
        let mut output = ObjectDataOutput::new();
        output.write_zero_bytes(4);
        output.write_byte(9).unwrap();
        output.pwrite_int(0, 0x0A0B0C0D).unwrap();
        assert_eq!(output.position(), 5);
        assert_eq!(output.as_bytes(), &[0x0A, 0x0B, 0x0C, 0x0D, 9]);
    }

    #[test]
    fn test_pwrite_respects_little_endian() {
        let mut output = ObjectDataOutput::with_order(ByteOrder::LittleEndian);
        output.write_zero_bytes(4);
        output.pwrite_int(0, 1).unwrap();
        assert_eq!(output.as_bytes(), &[1, 0, 0, 0]);
    }

    #[test]
    fn test_pwrite_int_be_ignores_order() {
        let mut output = ObjectDataOutput::with_order(ByteOrder::LittleEndian);
        output.write_zero_bytes(4);
        output.pwrite_int_be(0, 1).unwrap();
        assert_eq!(output.as_bytes(), &[0, 0, 0, 1]);
    }

    #[test]
    fn test_pwrite_past_end_fails() {
        let mut output = ObjectDataOutput::new();
        output.write_zero_bytes(2);
        assert!(output.pwrite_int(0, 1).is_err());
    }

    #[test]
    fn test_pwrite_bool_bit() {
        let mut output = ObjectDataOutput::new();
        output.write_zero_bytes(1);
        output.pwrite_bool_bit(0, 0, true).unwrap();
        output.pwrite_bool_bit(0, 3, true).unwrap();
        output.pwrite_bool_bit(0, 0, false).unwrap();
        assert_eq!(output.as_bytes(), &[0b0000_1000]);
    }

    #[test]
    fn test_growth_preserves_written_bytes() {
        let mut output = ObjectDataOutput::with_capacity(2);
        for i in 0..100 {
            output.write_int(i).unwrap();
        }
        assert_eq!(output.len(), 400);
        assert_eq!(&output.as_bytes()[396..], &[0, 0, 0, 99]);
    }

    #[test]
    fn test_write_object_without_service_fails() {
        let mut output = ObjectDataOutput::new();
        assert!(output.write_object(&Value::Int(1)).is_err());
    }

    #[test]
    fn test_clear() {
        let mut output = ObjectDataOutput::new();
        output.write_int(42).unwrap();
        output.clear();
        assert!(output.is_empty());
    }
}
