//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::sync::Once;

use hazelcast_serialization::{
    ByteOrder, Data, SerializationConfig, SerializationConfigBuilder, SerializationService, Value,
};

static TRACING: Once = Once::new();

/// Routes `tracing` output through the test harness; `RUST_LOG` is not read.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

pub fn default_config() -> SerializationConfig {
    SerializationConfig::builder()
        .build()
        .expect("failed to build config")
}

pub fn service() -> SerializationService {
    service_with(SerializationConfig::builder())
}

pub fn service_with(builder: SerializationConfigBuilder) -> SerializationService {
    init_tracing();
    let config = builder.build().expect("failed to build config");
    SerializationService::new(config).expect("failed to create service")
}

pub fn service_for(order: ByteOrder) -> SerializationService {
    service_with(SerializationConfig::builder().byte_order(order))
}

/// Serializes and reads back `value`.
pub fn round_trip(service: &SerializationService, value: &Value) -> Value {
    let data = service.to_data(value).expect("to_data failed");
    service.to_object(&data).expect("to_object failed")
}

/// Hex dump of a container, for readable assertion failures.
pub fn hex(data: &Data) -> String {
    data.to_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
