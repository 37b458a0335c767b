//! Partition hashing and partition-key routing.
//!
//! A serialized value is routed to the partition its hash selects. Values
//! may route by a different key so that related entries are co-located on
//! the same cluster member.
//!
//! # Example
//!
//! ```
//! use hazelcast_serialization::partition::PartitionAware;
//! use hazelcast_serialization::serialization::Value;
//!
//! struct OrderKey {
//!     order_id: String,
//!     customer_id: String,
//! }
//!
//! impl PartitionAware for OrderKey {
//!     fn partition_key(&self) -> Value {
//!         // Route all orders for the same customer to the same partition
//!         Value::String(self.customer_id.clone())
//!     }
//! }
//! ```

use crate::serialization::Value;

/// Seed the cluster hashes container payloads with.
pub use crate::serialization::constants::PARTITION_HASH_SEED;

/// Types that route by a partition key different from themselves.
///
/// Implement this on identified or portable types and forward their
/// `partition_key` method to it, or attach the key to a plain object with
/// [`Object::with_partition_key`](crate::serialization::Object::with_partition_key).
pub trait PartitionAware: Send + Sync {
    /// Returns the key whose serialized form decides the partition.
    fn partition_key(&self) -> Value;
}

/// Chooses the partition key for a value about to be serialized.
pub trait PartitioningStrategy: Send + Sync {
    /// Returns the key to route `value` by, or `None` to use its own payload.
    fn partition_key(&self, value: &Value) -> Option<Value>;
}

/// Routes by the key a value carries, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPartitioningStrategy;

impl PartitioningStrategy for DefaultPartitioningStrategy {
    fn partition_key(&self, value: &Value) -> Option<Value> {
        value.partition_key()
    }
}

/// Never overrides; every value routes by its own payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPartitioningStrategy;

impl PartitioningStrategy for NullPartitioningStrategy {
    fn partition_key(&self, _value: &Value) -> Option<Value> {
        None
    }
}

/// MurmurHash3 x86 32-bit.
pub fn murmur_hash3_x86_32(data: &[u8], seed: u32) -> u32 {
    const C1: u32 = 0xcc9e2d51;
    const C2: u32 = 0x1b873593;

    let len = data.len();
    let mut h1 = seed;

    let mut blocks = data.chunks_exact(4);
    for block in &mut blocks {
        let k1 = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);

        let k1 = k1.wrapping_mul(C1);
        let k1 = k1.rotate_left(15);
        let k1 = k1.wrapping_mul(C2);

        h1 ^= k1;
        h1 = h1.rotate_left(13);
        h1 = h1.wrapping_mul(5).wrapping_add(0xe6546b64);
    }

    let tail = blocks.remainder();
    let mut k1: u32 = 0;
    if tail.len() >= 3 {
        k1 ^= (tail[2] as u32) << 16;
    }
    if tail.len() >= 2 {
        k1 ^= (tail[1] as u32) << 8;
    }
    if !tail.is_empty() {
        k1 ^= tail[0] as u32;
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(15);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;
    }

    h1 ^= len as u32;
    fmix32(h1)
}

fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Maps a partition hash to a partition index in `0..partition_count`.
///
/// The hash is read as a signed int and its absolute value taken, with
/// `i32::MIN` mapping to partition 0.
pub fn partition_id(hash: u32, partition_count: u32) -> u32 {
    if partition_count == 0 {
        return 0;
    }
    let signed = hash as i32;
    if signed == i32::MIN {
        return 0;
    }
    signed.unsigned_abs() % partition_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::Object;

    #[test]
    fn test_murmur_reference_vectors() {
        assert_eq!(murmur_hash3_x86_32(b"", 0), 0);
        assert_eq!(murmur_hash3_x86_32(b"", 1), 0x514E28B7);
        assert_eq!(murmur_hash3_x86_32(b"hello", 0), 0x248bfa47);
        assert_eq!(
            murmur_hash3_x86_32(b"The quick brown fox jumps over the lazy dog", 0),
            0x2e4ff723
        );
    }

    #[test]
    fn test_murmur_tail_lengths_differ() {
        let hashes: Vec<u32> = [&b"a"[..], b"ab", b"abc", b"abcd", b"abcde"]
            .iter()
            .map(|d| murmur_hash3_x86_32(d, PARTITION_HASH_SEED))
            .collect();
        for (i, a) in hashes.iter().enumerate() {
            for b in &hashes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_partition_id_range() {
        assert_eq!(partition_id(0, 271), 0);
        assert_eq!(partition_id(i32::MIN as u32, 271), 0);
        assert_eq!(partition_id((-5i32) as u32, 271), 5);
        assert_eq!(partition_id(u32::MAX, 271), 1);
        assert_eq!(partition_id(42, 0), 0);
    }

    struct CustomerOrderKey {
        customer_id: String,
    }

    impl PartitionAware for CustomerOrderKey {
        fn partition_key(&self) -> Value {
            Value::String(self.customer_id.clone())
        }
    }

    #[test]
    fn test_partition_aware_same_customer_same_key() {
        let key1 = CustomerOrderKey {
            customer_id: "cust-42".into(),
        };
        let key2 = CustomerOrderKey {
            customer_id: "cust-42".into(),
        };
        assert_eq!(key1.partition_key(), key2.partition_key());
    }

    #[test]
    fn test_default_strategy_uses_attached_key() {
        let value = Value::Object(Object::new(1u64).with_partition_key("cust-42"));
        assert_eq!(
            DefaultPartitioningStrategy.partition_key(&value),
            Some(Value::String("cust-42".into()))
        );
        assert_eq!(NullPartitioningStrategy.partition_key(&value), None);
        assert_eq!(DefaultPartitioningStrategy.partition_key(&Value::Int(1)), None);
    }
}
