#![no_main]

use libfuzzer_sys::fuzz_target;

use hazelcast_serialization::{ByteOrder, Data, SerializationConfig, SerializationService};

fuzz_target!(|data: &[u8]| {
    let Ok(container) = Data::wrap(data.to_vec()) else {
        return;
    };
    let _ = container.partition_hash();

    for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
        let Ok(config) = SerializationConfig::builder().byte_order(order).build() else {
            return;
        };
        let Ok(service) = SerializationService::new(config) else {
            return;
        };
        let _ = service.to_object(&container);
    }
});
