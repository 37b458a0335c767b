//! Compact field kinds, schemas and the schema fingerprint.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{HazelcastError, Result};

/// Rabin fingerprint initial value (matches the server implementation).
const RABIN_FINGERPRINT_INIT: u64 = 0xc15d_213a_a4d7_a795;

const RABIN_FINGERPRINT_TABLE: [u64; 256] = build_fingerprint_table();

const fn build_fingerprint_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut i = 0;
    while i < 256 {
        let mut fp = i as u64;
        let mut j = 0;
        while j < 8 {
            fp = (fp >> 1) ^ (RABIN_FINGERPRINT_INIT & (fp & 1).wrapping_neg());
            j += 1;
        }
        table[i] = fp;
        i += 1;
    }
    table
}

fn fingerprint_byte(fp: u64, b: u8) -> u64 {
    (fp >> 8) ^ RABIN_FINGERPRINT_TABLE[((fp ^ u64::from(b)) & 0xff) as usize]
}

fn fingerprint_int(fp: u64, v: i32) -> u64 {
    v.to_le_bytes().iter().fold(fp, |fp, b| fingerprint_byte(fp, *b))
}

fn fingerprint_str(fp: u64, s: &str) -> u64 {
    let bytes = s.as_bytes();
    let fp = fingerprint_int(fp, bytes.len() as i32);
    bytes.iter().fold(fp, |fp, b| fingerprint_byte(fp, *b))
}

/// Field kind identifiers for Compact serialization.
///
/// The discriminants are the ids the cluster uses on the wire and in schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum FieldKind {
    /// `bool`, packed as a single bit.
    Boolean = 1,
    /// `Option<Vec<bool>>`.
    ArrayOfBoolean = 2,
    /// `i8`.
    Int8 = 3,
    /// `Option<Vec<i8>>`.
    ArrayOfInt8 = 4,
    /// `i16`.
    Int16 = 7,
    /// `Option<Vec<i16>>`.
    ArrayOfInt16 = 8,
    /// `i32`.
    Int32 = 9,
    /// `Option<Vec<i32>>`.
    ArrayOfInt32 = 10,
    /// `i64`.
    Int64 = 11,
    /// `Option<Vec<i64>>`.
    ArrayOfInt64 = 12,
    /// `f32`.
    Float32 = 13,
    /// `Option<Vec<f32>>`.
    ArrayOfFloat32 = 14,
    /// `f64`.
    Float64 = 15,
    /// `Option<Vec<f64>>`.
    ArrayOfFloat64 = 16,
    /// `Option<String>`.
    String = 17,
    /// `Option<Vec<Option<String>>>`.
    ArrayOfString = 18,
    /// `Option<Decimal>`.
    Decimal = 19,
    /// `Option<NaiveTime>`.
    Time = 21,
    /// `Option<NaiveDate>`.
    Date = 23,
    /// `Option<NaiveDateTime>`.
    Timestamp = 25,
    /// `Option<DateTime<FixedOffset>>`.
    TimestampWithTimezone = 27,
    /// A nested Compact object.
    Compact = 29,
    /// An array of nested Compact objects.
    ArrayOfCompact = 30,
    /// `Option<bool>`.
    NullableBoolean = 33,
    /// `Option<i8>`.
    NullableInt8 = 35,
    /// `Option<i16>`.
    NullableInt16 = 37,
    /// `Option<i32>`.
    NullableInt32 = 39,
    /// `Option<i64>`.
    NullableInt64 = 41,
    /// `Option<f32>`.
    NullableFloat32 = 43,
    /// `Option<f64>`.
    NullableFloat64 = 45,
}

impl FieldKind {
    const ALL: [FieldKind; 30] = [
        FieldKind::Boolean,
        FieldKind::ArrayOfBoolean,
        FieldKind::Int8,
        FieldKind::ArrayOfInt8,
        FieldKind::Int16,
        FieldKind::ArrayOfInt16,
        FieldKind::Int32,
        FieldKind::ArrayOfInt32,
        FieldKind::Int64,
        FieldKind::ArrayOfInt64,
        FieldKind::Float32,
        FieldKind::ArrayOfFloat32,
        FieldKind::Float64,
        FieldKind::ArrayOfFloat64,
        FieldKind::String,
        FieldKind::ArrayOfString,
        FieldKind::Decimal,
        FieldKind::Time,
        FieldKind::Date,
        FieldKind::Timestamp,
        FieldKind::TimestampWithTimezone,
        FieldKind::Compact,
        FieldKind::ArrayOfCompact,
        FieldKind::NullableBoolean,
        FieldKind::NullableInt8,
        FieldKind::NullableInt16,
        FieldKind::NullableInt32,
        FieldKind::NullableInt64,
        FieldKind::NullableFloat32,
        FieldKind::NullableFloat64,
    ];

    /// Creates a `FieldKind` from its numeric id.
    pub fn from_id(id: i32) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.id() == id)
            .ok_or_else(|| HazelcastError::Serialization(format!("unknown compact field kind id: {}", id)))
    }

    /// Returns the numeric id of this field kind.
    pub fn id(&self) -> i32 {
        *self as i32
    }

    /// Returns the width of fields stored in the fixed-size region.
    ///
    /// Booleans are packed as bits and report `None`, as do all
    /// variable-size kinds.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            Self::Int8 => Some(1),
            Self::Int16 => Some(2),
            Self::Int32 | Self::Float32 => Some(4),
            Self::Int64 | Self::Float64 => Some(8),
            _ => None,
        }
    }

    /// Returns true for kinds stored in the variable-size region.
    pub fn is_variable_size(&self) -> bool {
        *self != Self::Boolean && self.fixed_size().is_none()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "BOOLEAN",
            Self::ArrayOfBoolean => "ARRAY_OF_BOOLEAN",
            Self::Int8 => "INT8",
            Self::ArrayOfInt8 => "ARRAY_OF_INT8",
            Self::Int16 => "INT16",
            Self::ArrayOfInt16 => "ARRAY_OF_INT16",
            Self::Int32 => "INT32",
            Self::ArrayOfInt32 => "ARRAY_OF_INT32",
            Self::Int64 => "INT64",
            Self::ArrayOfInt64 => "ARRAY_OF_INT64",
            Self::Float32 => "FLOAT32",
            Self::ArrayOfFloat32 => "ARRAY_OF_FLOAT32",
            Self::Float64 => "FLOAT64",
            Self::ArrayOfFloat64 => "ARRAY_OF_FLOAT64",
            Self::String => "STRING",
            Self::ArrayOfString => "ARRAY_OF_STRING",
            Self::Decimal => "DECIMAL",
            Self::Time => "TIME",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP",
            Self::TimestampWithTimezone => "TIMESTAMP_WITH_TIMEZONE",
            Self::Compact => "COMPACT",
            Self::ArrayOfCompact => "ARRAY_OF_COMPACT",
            Self::NullableBoolean => "NULLABLE_BOOLEAN",
            Self::NullableInt8 => "NULLABLE_INT8",
            Self::NullableInt16 => "NULLABLE_INT16",
            Self::NullableInt32 => "NULLABLE_INT32",
            Self::NullableInt64 => "NULLABLE_INT64",
            Self::NullableFloat32 => "NULLABLE_FLOAT32",
            Self::NullableFloat64 => "NULLABLE_FLOAT64",
        };
        f.write_str(name)
    }
}

/// Where a field's value lives inside a Compact body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPosition {
    /// Byte offset into the fixed-size region.
    Fixed {
        /// Offset from the start of the fixed-size region.
        offset: usize,
    },
    /// A single bit of a byte in the fixed-size region.
    Bit {
        /// Offset of the byte holding the bit.
        offset: usize,
        /// Bit within that byte, 0 being the least significant.
        bit: u8,
    },
    /// Slot in the variable-size offset table.
    Variable {
        /// Index into the offset table.
        index: usize,
    },
}

/// Descriptor for a field within a Compact schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    position: FieldPosition,
}

impl FieldDescriptor {
    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns where the field is stored.
    pub fn position(&self) -> FieldPosition {
        self.position
    }
}

/// Schema definition for Compact serialization.
///
/// Fields are kept sorted by name. Fixed-size fields are laid out largest
/// first, booleans are packed as bits after them, and variable-size fields
/// are numbered in name order. The schema id is the Rabin fingerprint of the
/// type name and the sorted `(name, kind)` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    type_name: String,
    fields: Vec<FieldDescriptor>,
    field_indices: HashMap<String, usize>,
    fixed_size_fields_length: usize,
    number_var_size_fields: usize,
    schema_id: i64,
}

impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.schema_id.hash(state);
    }
}

impl Schema {
    /// Creates a schema for `type_name` with the given fields.
    ///
    /// Fails with [`HazelcastError::DuplicateField`] if a name repeats.
    pub fn new(type_name: impl Into<String>, fields: Vec<(String, FieldKind)>) -> Result<Self> {
        let type_name = type_name.into();
        let mut sorted: BTreeMap<String, FieldKind> = BTreeMap::new();
        for (name, kind) in fields {
            if sorted.contains_key(&name) {
                return Err(HazelcastError::DuplicateField(format!(
                    "{} in compact type {}",
                    name, type_name
                )));
            }
            sorted.insert(name, kind);
        }

        let mut fixed: Vec<(&String, FieldKind, usize)> = sorted
            .iter()
            .filter_map(|(name, kind)| kind.fixed_size().map(|size| (name, *kind, size)))
            .collect();
        fixed.sort_by(|a, b| b.2.cmp(&a.2));

        let mut positions: HashMap<&String, FieldPosition> = HashMap::with_capacity(sorted.len());
        let mut offset = 0;
        for (name, _, size) in &fixed {
            positions.insert(name, FieldPosition::Fixed { offset });
            offset += size;
        }

        let mut bits = 0usize;
        for (name, _) in sorted.iter().filter(|(_, kind)| **kind == FieldKind::Boolean) {
            positions.insert(
                name,
                FieldPosition::Bit {
                    offset,
                    bit: (bits % 8) as u8,
                },
            );
            bits += 1;
            if bits % 8 == 0 {
                offset += 1;
            }
        }
        if bits % 8 != 0 {
            offset += 1;
        }

        let mut index = 0;
        for (name, _) in sorted.iter().filter(|(_, kind)| kind.is_variable_size()) {
            positions.insert(name, FieldPosition::Variable { index });
            index += 1;
        }

        let fields: Vec<FieldDescriptor> = sorted
            .iter()
            .map(|(name, kind)| FieldDescriptor {
                name: name.clone(),
                kind: *kind,
                position: positions[name],
            })
            .collect();
        let field_indices = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        let schema_id = Self::compute_schema_id(&type_name, &fields);

        Ok(Self {
            type_name,
            fields,
            field_indices,
            fixed_size_fields_length: offset,
            number_var_size_fields: index,
            schema_id,
        })
    }

    fn compute_schema_id(type_name: &str, fields: &[FieldDescriptor]) -> i64 {
        let mut fp = fingerprint_str(RABIN_FINGERPRINT_INIT, type_name);
        fp = fingerprint_int(fp, fields.len() as i32);
        for field in fields {
            fp = fingerprint_str(fp, &field.name);
            fp = fingerprint_int(fp, field.kind.id());
        }
        fp as i64
    }

    /// Returns the type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the schema ID (fingerprint).
    pub fn schema_id(&self) -> i64 {
        self.schema_id
    }

    /// Returns the number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns the fields sorted by name.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Returns the field with the given name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.field_indices.get(name).map(|&i| &self.fields[i])
    }

    /// Returns true if the schema has a field with the given name.
    pub fn has_field(&self, name: &str) -> bool {
        self.field_indices.contains_key(name)
    }

    /// Bytes taken by fixed-size fields and packed booleans.
    pub fn fixed_size_fields_length(&self) -> usize {
        self.fixed_size_fields_length
    }

    /// Number of entries in the variable-size offset table.
    pub fn number_var_size_fields(&self) -> usize {
        self.number_var_size_fields
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema {{ type_name: {}, schema_id: {}, fields: [", self.type_name, self.schema_id)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", field.name, field.kind)?;
        }
        f.write_str("] }")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(fields: &[(&str, FieldKind)]) -> Schema {
        Schema::new(
            "Sample",
            fields.iter().map(|(n, k)| (n.to_string(), *k)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_field_kind_round_trip() {
        for kind in FieldKind::ALL {
            assert_eq!(FieldKind::from_id(kind.id()).unwrap(), kind);
        }
        assert_eq!(FieldKind::Int32.id(), 9);
        assert_eq!(FieldKind::NullableFloat64.id(), 45);
    }

    #[test]
    fn test_field_kind_invalid_id() {
        assert!(FieldKind::from_id(5).is_err());
        assert!(FieldKind::from_id(-1).is_err());
    }

    #[test]
    fn test_field_kind_sizes() {
        assert_eq!(FieldKind::Int64.fixed_size(), Some(8));
        assert_eq!(FieldKind::Boolean.fixed_size(), None);
        assert!(!FieldKind::Boolean.is_variable_size());
        assert!(FieldKind::NullableInt32.is_variable_size());
        assert!(FieldKind::String.is_variable_size());
    }

    #[test]
    fn test_fields_sorted_by_name() {
        let s = schema(&[("z", FieldKind::Int32), ("a", FieldKind::String)]);
        let names: Vec<_> = s.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["a", "z"]);
    }

    #[test]
    fn test_fixed_layout_largest_first() {
        let s = schema(&[
            ("a", FieldKind::Int8),
            ("b", FieldKind::Int64),
            ("c", FieldKind::Int32),
            ("d", FieldKind::Float64),
        ]);
        assert_eq!(s.field("b").unwrap().position(), FieldPosition::Fixed { offset: 0 });
        assert_eq!(s.field("d").unwrap().position(), FieldPosition::Fixed { offset: 8 });
        assert_eq!(s.field("c").unwrap().position(), FieldPosition::Fixed { offset: 16 });
        assert_eq!(s.field("a").unwrap().position(), FieldPosition::Fixed { offset: 20 });
        assert_eq!(s.fixed_size_fields_length(), 21);
        assert_eq!(s.number_var_size_fields(), 0);
    }

    #[test]
    fn test_booleans_packed_after_fixed_fields() {
        let mut fields = vec![("n".to_string(), FieldKind::Int16)];
        for i in 0..9 {
            fields.push((format!("b{}", i), FieldKind::Boolean));
        }
        let s = Schema::new("Flags", fields).unwrap();
        assert_eq!(s.field("b0").unwrap().position(), FieldPosition::Bit { offset: 2, bit: 0 });
        assert_eq!(s.field("b7").unwrap().position(), FieldPosition::Bit { offset: 2, bit: 7 });
        assert_eq!(s.field("b8").unwrap().position(), FieldPosition::Bit { offset: 3, bit: 0 });
        assert_eq!(s.fixed_size_fields_length(), 4);
    }

    #[test]
    fn test_variable_fields_indexed_by_name() {
        let s = schema(&[
            ("name", FieldKind::String),
            ("age", FieldKind::NullableInt32),
            ("id", FieldKind::Int32),
        ]);
        assert_eq!(s.field("age").unwrap().position(), FieldPosition::Variable { index: 0 });
        assert_eq!(s.field("name").unwrap().position(), FieldPosition::Variable { index: 1 });
        assert_eq!(s.number_var_size_fields(), 2);
        assert_eq!(s.fixed_size_fields_length(), 4);
    }

    #[test]
    fn test_schema_id_ignores_declaration_order() {
        let a = schema(&[("x", FieldKind::Int32), ("y", FieldKind::String)]);
        let b = schema(&[("y", FieldKind::String), ("x", FieldKind::Int32)]);
        assert_eq!(a.schema_id(), b.schema_id());
        assert_eq!(a, b);
    }

    #[test]
    fn test_schema_id_depends_on_names_kinds_and_type() {
        let base = schema(&[("x", FieldKind::Int32)]);
        assert_ne!(base.schema_id(), schema(&[("x", FieldKind::Int64)]).schema_id());
        assert_ne!(base.schema_id(), schema(&[("w", FieldKind::Int32)]).schema_id());
        assert_ne!(
            base.schema_id(),
            Schema::new("Other", vec![("x".to_string(), FieldKind::Int32)])
                .unwrap()
                .schema_id()
        );
        assert_ne!(base.schema_id(), schema(&[]).schema_id());
    }

    #[test]
    fn test_fingerprint_table_first_entries() {
        assert_eq!(RABIN_FINGERPRINT_TABLE[0], 0);
        // the single set bit is shifted out on the last round
        assert_eq!(RABIN_FINGERPRINT_TABLE[128], RABIN_FINGERPRINT_INIT);
    }
}
