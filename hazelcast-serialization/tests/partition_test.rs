//! Partition hashes and partition-key routing.

mod common;

use common::{service, service_with};
use hazelcast_serialization::partition::{
    murmur_hash3_x86_32, partition_id, NullPartitioningStrategy, PARTITION_HASH_SEED,
};
use hazelcast_serialization::serialization::{DataSerializableFactory, IdentifiedDataSerializable};
use hazelcast_serialization::{
    ByteOrder, DataInput, DataOutput, Object, PartitionAware, PartitioningStrategy, Result,
    SerializationConfig, Value,
};

#[derive(Debug, Default, Clone)]
struct OrderKey {
    order_id: i64,
    customer_id: String,
}

impl PartitionAware for OrderKey {
    fn partition_key(&self) -> Value {
        Value::String(self.customer_id.clone())
    }
}

impl IdentifiedDataSerializable for OrderKey {
    fn factory_id(&self) -> i32 {
        5
    }

    fn class_id(&self) -> i32 {
        1
    }

    fn write_data(&self, output: &mut dyn DataOutput) -> Result<()> {
        output.write_long(self.order_id)?;
        output.write_string(&self.customer_id)
    }

    fn read_data(&mut self, input: &mut dyn DataInput) -> Result<()> {
        self.order_id = input.read_long()?;
        self.customer_id = input.read_string()?;
        Ok(())
    }

    fn partition_key(&self) -> Option<Value> {
        Some(PartitionAware::partition_key(self))
    }
}

struct OrderKeyFactory;

impl DataSerializableFactory for OrderKeyFactory {
    fn create(&self, class_id: i32) -> Option<Box<dyn IdentifiedDataSerializable>> {
        (class_id == 1).then(|| Box::new(OrderKey::default()) as Box<dyn IdentifiedDataSerializable>)
    }
}

/// Routes every string by its first character.
struct FirstCharStrategy;

impl PartitioningStrategy for FirstCharStrategy {
    fn partition_key(&self, value: &Value) -> Option<Value> {
        value.as_str().and_then(|s| s.chars().next()).map(Value::Char)
    }
}

#[test]
fn test_murmur_vectors() {
    assert_eq!(murmur_hash3_x86_32(b"", 0xffff_ffff), 0x81f1_6f39);
    assert_eq!(murmur_hash3_x86_32(&[0, 0, 0, 0], 0), 0x2362_f9de);
    assert_eq!(murmur_hash3_x86_32(b"aaaa", 0x9747_b28c), 0x5a97_808a);
    assert_eq!(murmur_hash3_x86_32(b"Hello, world!", 0x9747_b28c), 0x2488_4cba);
}

#[test]
fn test_hash_covers_payload_only() {
    let service = service();
    let data = service.to_data(&Value::Long(1)).unwrap();
    assert!(!data.has_partition_hash());
    assert_eq!(
        data.partition_hash(),
        murmur_hash3_x86_32(data.payload(), PARTITION_HASH_SEED)
    );
}

#[test]
fn test_equal_values_share_a_partition() {
    let be = service_with(SerializationConfig::builder().byte_order(ByteOrder::BigEndian));
    let a = be.partition_hash(&Value::String("user-1".into())).unwrap();
    let b = be.partition_hash(&Value::String("user-1".into())).unwrap();
    let c = be.partition_hash(&Value::String("user-2".into())).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(partition_id(a, 271) < 271);
}

#[test]
fn test_identified_partition_key_routes_by_customer() {
    let service = service_with(
        SerializationConfig::builder().add_data_serializable_factory(5, OrderKeyFactory),
    );
    let first = OrderKey {
        order_id: 1,
        customer_id: "cust-42".to_string(),
    };
    let second = OrderKey {
        order_id: 2,
        customer_id: "cust-42".to_string(),
    };

    let key_hash = service.partition_hash(&Value::String("cust-42".into())).unwrap();
    let a = service.to_data(&Value::identified(first)).unwrap();
    let b = service.to_data(&Value::identified(second)).unwrap();

    assert!(a.has_partition_hash());
    assert_eq!(a.partition_hash(), key_hash);
    assert_eq!(b.partition_hash(), key_hash);
    assert_ne!(a, b);

    let back = service.to_object(&a).unwrap();
    assert_eq!(back.downcast_ref::<OrderKey>().map(|k| k.order_id), Some(1));
}

#[test]
fn test_object_partition_key() {
    let service = service_with(SerializationConfig::builder().global_serializer(NoopGlobal));
    let keyed = Value::Object(Object::new(99u32).with_partition_key("cust-7"));

    let data = service.to_data(&keyed).unwrap();
    assert_eq!(
        data.partition_hash(),
        service.partition_hash(&Value::String("cust-7".into())).unwrap()
    );
}

#[test]
fn test_strategy_overrides_and_null_strategy_ignores_keys() {
    let service = service_with(
        SerializationConfig::builder().add_data_serializable_factory(5, OrderKeyFactory),
    );

    let apple = service
        .to_data_with_strategy(&Value::String("apple".into()), &FirstCharStrategy)
        .unwrap();
    let avocado = service
        .to_data_with_strategy(&Value::String("avocado".into()), &FirstCharStrategy)
        .unwrap();
    assert_eq!(apple.partition_hash(), avocado.partition_hash());
    assert_eq!(
        apple.partition_hash(),
        service.partition_hash(&Value::Char('a')).unwrap()
    );

    let key = Value::identified(OrderKey {
        order_id: 3,
        customer_id: "cust-1".into(),
    });
    let unrouted = service
        .to_data_with_strategy(&key, &NullPartitioningStrategy)
        .unwrap();
    assert!(!unrouted.has_partition_hash());
}

struct NoopGlobal;

impl hazelcast_serialization::serialization::CustomSerializer for NoopGlobal {
    fn id(&self) -> i32 {
        1000
    }

    fn write(&self, _output: &mut dyn DataOutput, _value: &Value) -> Result<()> {
        Ok(())
    }

    fn read(&self, _input: &mut dyn DataInput) -> Result<Value> {
        Ok(Value::Null)
    }
}
