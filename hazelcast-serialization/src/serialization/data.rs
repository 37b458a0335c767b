//! The binary container every serialized value travels in.

use std::hash::{Hash, Hasher};

use bytes::Bytes;

use crate::error::{HazelcastError, Result};
use crate::partition::murmur_hash3_x86_32;
use crate::serialization::constants::{
    DATA_OFFSET, PARTITION_HASH_OFFSET, PARTITION_HASH_SEED, TYPE_OFFSET,
};

/// A serialized value: an 8-byte header followed by the payload.
///
/// The header holds the partition hash at offset 0 and the type id at
/// offset 4, both big-endian. An empty container stands for "no value".
///
/// Equality and hashing cover the payload only.
#[derive(Debug, Clone, Default)]
pub struct Data {
    bytes: Bytes,
}

impl Data {
    /// Wraps a buffer produced by a serialization service or received from
    /// the cluster.
    ///
    /// Fails unless the buffer is empty or at least as long as the header.
    pub fn wrap(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        if !bytes.is_empty() && bytes.len() < DATA_OFFSET {
            return Err(HazelcastError::BufferUnderflow {
                needed: DATA_OFFSET,
                remaining: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }

    /// Returns the container representing "no value".
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the whole container, header included.
    pub fn to_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the container and returns its buffer.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Returns the payload after the header.
    pub fn payload(&self) -> &[u8] {
        self.bytes.get(DATA_OFFSET..).unwrap_or_default()
    }

    /// Returns the serializer type id, or 0 for an empty container.
    pub fn type_id(&self) -> i32 {
        self.header_int(TYPE_OFFSET)
    }

    /// Returns the partition hash.
    ///
    /// The cached header hash wins when non-zero; otherwise the payload is
    /// hashed.
    pub fn partition_hash(&self) -> u32 {
        if self.has_partition_hash() {
            self.header_int(PARTITION_HASH_OFFSET) as u32
        } else {
            murmur_hash3_x86_32(self.payload(), PARTITION_HASH_SEED)
        }
    }

    /// Returns true if the header carries a non-zero partition hash.
    pub fn has_partition_hash(&self) -> bool {
        self.header_int(PARTITION_HASH_OFFSET) != 0
    }

    /// Total size in bytes, header included.
    pub fn total_size(&self) -> usize {
        self.bytes.len()
    }

    /// Size of the payload in bytes.
    pub fn data_size(&self) -> usize {
        self.total_size().saturating_sub(DATA_OFFSET)
    }

    /// Returns true for the "no value" container.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn header_int(&self, offset: usize) -> i32 {
        self.bytes
            .get(offset..offset + 4)
            .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .unwrap_or(0)
    }
}

impl PartialEq for Data {
    fn eq(&self, other: &Self) -> bool {
        self.payload() == other.payload()
    }
}

impl Eq for Data {}

impl Hash for Data {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.payload().hash(state);
    }
}
