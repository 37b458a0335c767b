#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;

use hazelcast_serialization::serialization::compact::{
    Compact, CompactReader, CompactWriter, FieldKind, InMemorySchemaService, Schema, SchemaService,
};
use hazelcast_serialization::serialization::constants::TYPE_COMPACT;
use hazelcast_serialization::{Data, Result, SerializationConfig, SerializationService};

#[derive(Debug, Default)]
struct FuzzCompact {
    bool_val: bool,
    int32_val: i32,
    int64_val: i64,
    float64_val: f64,
    string_val: Option<String>,
    nullable_int32: Option<i32>,
    ints: Option<Vec<i32>>,
}

impl Compact for FuzzCompact {
    fn type_name() -> &'static str {
        "FuzzCompact"
    }

    fn write(&self, writer: &mut dyn CompactWriter) -> Result<()> {
        writer.write_boolean("bool", self.bool_val)?;
        writer.write_int32("int32", self.int32_val)?;
        writer.write_int64("int64", self.int64_val)?;
        writer.write_float64("float64", self.float64_val)?;
        writer.write_string("string", self.string_val.as_deref())?;
        writer.write_nullable_int32("nullable_int32", self.nullable_int32)?;
        writer.write_array_of_int32("ints", self.ints.as_deref())
    }

    fn read(reader: &mut dyn CompactReader) -> Result<Self> {
        Ok(FuzzCompact {
            bool_val: reader.read_boolean("bool")?,
            int32_val: reader.read_int32("int32")?,
            int64_val: reader.read_int64("int64")?,
            float64_val: reader.read_float64("float64")?,
            string_val: reader.read_string("string")?,
            nullable_int32: reader.read_nullable_int32("nullable_int32")?,
            ints: reader.read_array_of_int32("ints")?,
        })
    }
}

fn schema() -> Schema {
    Schema::new(
        "FuzzCompact",
        vec![
            ("bool".to_string(), FieldKind::Boolean),
            ("int32".to_string(), FieldKind::Int32),
            ("int64".to_string(), FieldKind::Int64),
            ("float64".to_string(), FieldKind::Float64),
            ("string".to_string(), FieldKind::String),
            ("nullable_int32".to_string(), FieldKind::NullableInt32),
            ("ints".to_string(), FieldKind::ArrayOfInt32),
        ],
    )
    .unwrap()
}

fuzz_target!(|data: &[u8]| {
    let schema = schema();
    let schema_id = schema.schema_id();
    let schemas = Arc::new(InMemorySchemaService::new());
    if schemas.put(schema).is_err() {
        return;
    }

    let Ok(config) = SerializationConfig::builder()
        .add_compact::<FuzzCompact>()
        .build()
    else {
        return;
    };
    let Ok(typed) = SerializationService::with_schema_service(config, schemas.clone()) else {
        return;
    };
    let Ok(generic) = SerializationService::with_schema_service(SerializationConfig::default(), schemas)
    else {
        return;
    };

    // the input is a compact body under a known schema id
    let mut bytes = Vec::with_capacity(data.len() + 16);
    bytes.extend_from_slice(&0i32.to_be_bytes());
    bytes.extend_from_slice(&TYPE_COMPACT.to_be_bytes());
    bytes.extend_from_slice(&schema_id.to_be_bytes());
    bytes.extend_from_slice(data);

    if let Ok(container) = Data::wrap(bytes) {
        let _ = typed.to_object(&container);
        let _ = generic.to_object(&container);
    }
});
