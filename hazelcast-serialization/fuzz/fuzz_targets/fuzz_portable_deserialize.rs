#![no_main]

use libfuzzer_sys::fuzz_target;

use hazelcast_serialization::serialization::constants::CONSTANT_TYPE_PORTABLE;
use hazelcast_serialization::serialization::portable::ClassDefinitionBuilder;
use hazelcast_serialization::serialization::{
    Portable, PortableFactory, PortableReader, PortableWriter,
};
use hazelcast_serialization::{Data, Result, SerializationConfig, SerializationService};

#[derive(Debug, Default)]
struct FuzzPortable {
    byte_val: i8,
    bool_val: bool,
    int_val: i32,
    long_val: i64,
    double_val: f64,
    string_val: Option<String>,
    ints: Option<Vec<i32>>,
}

impl Portable for FuzzPortable {
    fn factory_id(&self) -> i32 {
        1
    }

    fn class_id(&self) -> i32 {
        1
    }

    fn write_portable(&self, writer: &mut dyn PortableWriter) -> Result<()> {
        writer.write_byte("byte", self.byte_val)?;
        writer.write_bool("bool", self.bool_val)?;
        writer.write_int("int", self.int_val)?;
        writer.write_long("long", self.long_val)?;
        writer.write_double("double", self.double_val)?;
        writer.write_string("string", self.string_val.as_deref())?;
        writer.write_int_array("ints", self.ints.as_deref())
    }

    fn read_portable(&mut self, reader: &mut dyn PortableReader) -> Result<()> {
        self.byte_val = reader.read_byte("byte")?;
        self.bool_val = reader.read_bool("bool")?;
        self.int_val = reader.read_int("int")?;
        self.long_val = reader.read_long("long")?;
        self.double_val = reader.read_double("double")?;
        self.string_val = reader.read_string("string")?;
        self.ints = reader.read_int_array("ints")?;
        Ok(())
    }
}

struct FuzzFactory;

impl PortableFactory for FuzzFactory {
    fn create(&self, class_id: i32) -> Option<Box<dyn Portable>> {
        match class_id {
            1 => Some(Box::new(FuzzPortable::default())),
            _ => None,
        }
    }
}

fn service() -> Option<SerializationService> {
    let definition = ClassDefinitionBuilder::new(1, 1, 0)
        .add_byte_field("byte")
        .add_bool_field("bool")
        .add_int_field("int")
        .add_long_field("long")
        .add_double_field("double")
        .add_string_field("string")
        .add_int_array_field("ints")
        .build()
        .ok()?;
    let config = SerializationConfig::builder()
        .add_portable_factory(1, FuzzFactory)
        .add_class_definition(definition)
        .build()
        .ok()?;
    SerializationService::new(config).ok()
}

fuzz_target!(|data: &[u8]| {
    let Some(service) = service() else {
        return;
    };

    // the input is a portable payload; the header is fixed
    let mut bytes = Vec::with_capacity(data.len() + 8);
    bytes.extend_from_slice(&0i32.to_be_bytes());
    bytes.extend_from_slice(&CONSTANT_TYPE_PORTABLE.to_be_bytes());
    bytes.extend_from_slice(data);

    if let Ok(container) = Data::wrap(bytes) {
        let _ = service.to_object(&container);
    }
});
