//! Portable serializer implementation.

use std::sync::Arc;

use tracing::debug;

use super::context::PortableContext;
use super::reader::{DefaultPortableReader, MorphingPortableReader};
use super::writer::DefaultPortableWriter;
use super::Portable;
use crate::error::{HazelcastError, Result};
use crate::serialization::constants::CONSTANT_TYPE_PORTABLE;
use crate::serialization::registry::Serializer;
use crate::serialization::{DataInput, DataOutput, ObjectDataInput, ObjectDataOutput, Value};

/// Nesting limit for portables inside portables.
const MAX_PORTABLE_DEPTH: usize = 64;

/// Codec for [`Value::Portable`].
///
/// The payload is the factory and class ids, the class version, then the
/// field table and fields written by [`DefaultPortableWriter`].
#[derive(Debug)]
pub(crate) struct PortableSerializer {
    context: Arc<PortableContext>,
}

impl PortableSerializer {
    pub(crate) fn new(context: Arc<PortableContext>) -> Self {
        Self { context }
    }

    /// Writes the class version followed by the portable's fields.
    pub(crate) fn write_body(
        &self,
        output: &mut ObjectDataOutput<'_>,
        portable: &dyn Portable,
    ) -> Result<()> {
        let definition = self.context.lookup_or_register(portable)?;
        output.write_int(definition.version())?;
        let mut writer = DefaultPortableWriter::new(self, output, definition)?;
        portable.write_portable(&mut writer)?;
        writer.end()
    }

    /// Reads the class version and fields into a fresh instance of
    /// `(factory_id, class_id)`.
    pub(crate) fn read_body(
        &self,
        input: &mut ObjectDataInput<'_>,
        factory_id: i32,
        class_id: i32,
        depth: usize,
    ) -> Result<Box<dyn Portable>> {
        if depth > MAX_PORTABLE_DEPTH {
            return Err(HazelcastError::Serialization(
                "portable objects nested too deeply".to_string(),
            ));
        }
        let version = input.read_int()?;
        let mut portable = self.context.create(factory_id, class_id)?;
        let definition = match self.context.lookup(factory_id, class_id, version) {
            Some(definition) => definition,
            None => self
                .context
                .read_class_definition(input, factory_id, class_id, version)?,
        };

        let reader = DefaultPortableReader::new(self, input, definition, depth)?;
        let local_version = self.context.class_version(portable.as_ref());
        if local_version == version {
            let mut reader = reader;
            portable.read_portable(&mut reader)?;
            reader.end()?;
        } else {
            debug!(
                factory_id,
                class_id,
                payload_version = version,
                local_version,
                "reading portable with morphing reader"
            );
            let mut reader = MorphingPortableReader::new(reader);
            portable.read_portable(&mut reader)?;
            reader.end()?;
        }
        Ok(portable)
    }
}

impl Serializer for PortableSerializer {
    fn id(&self) -> i32 {
        CONSTANT_TYPE_PORTABLE
    }

    fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
        let Value::Portable(portable) = value else {
            return Err(HazelcastError::Serialization(format!(
                "expected a portable, got {}",
                value.type_name()
            )));
        };
        output.write_int(portable.factory_id())?;
        output.write_int(portable.class_id())?;
        self.write_body(output, portable.as_ref())
    }

    fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
        let factory_id = input.read_int()?;
        let class_id = input.read_int()?;
        let portable = self.read_body(input, factory_id, class_id, 0)?;
        Ok(Value::Portable(Arc::from(portable)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::serialization::portable::{
        ClassDefinitionBuilder, PortableFactory, PortableReader, PortableWriter,
    };

    const FACTORY_ID: i32 = 1;
    const PERSON_CLASS_ID: i32 = 1;
    const ADDRESS_CLASS_ID: i32 = 2;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Address {
        street: String,
        number: i32,
    }

    impl Portable for Address {
        fn factory_id(&self) -> i32 {
            FACTORY_ID
        }

        fn class_id(&self) -> i32 {
            ADDRESS_CLASS_ID
        }

        fn write_portable(&self, writer: &mut dyn PortableWriter) -> Result<()> {
            writer.write_string("street", Some(self.street.as_str()))?;
            writer.write_int("number", self.number)
        }

        fn read_portable(&mut self, reader: &mut dyn PortableReader) -> Result<()> {
            self.street = reader.read_string("street")?.unwrap_or_default();
            self.number = reader.read_int("number")?;
            Ok(())
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Person {
        name: Option<String>,
        age: i32,
        scores: Vec<i64>,
        home: Option<Address>,
        previous: Vec<Address>,
        notes: Vec<u8>,
    }

    impl Portable for Person {
        fn factory_id(&self) -> i32 {
            FACTORY_ID
        }

        fn class_id(&self) -> i32 {
            PERSON_CLASS_ID
        }

        fn write_portable(&self, writer: &mut dyn PortableWriter) -> Result<()> {
            writer.write_string("name", self.name.as_deref())?;
            writer.write_int("age", self.age)?;
            writer.write_long_array("scores", Some(self.scores.as_slice()))?;
            match &self.home {
                Some(home) => writer.write_portable("home", Some(home as &dyn Portable))?,
                None => writer.write_null_portable("home", FACTORY_ID, ADDRESS_CLASS_ID)?,
            }
            let previous: Vec<&dyn Portable> =
                self.previous.iter().map(|a| a as &dyn Portable).collect();
            writer.write_portable_array("previous", Some(previous.as_slice()))?;
            writer.raw_data_output()?.write_byte_array(Some(self.notes.as_slice()))
        }

        fn read_portable(&mut self, reader: &mut dyn PortableReader) -> Result<()> {
            self.name = reader.read_string("name")?;
            self.age = reader.read_int("age")?;
            self.scores = reader.read_long_array("scores")?.unwrap_or_default();
            self.home = reader.read_portable_as::<Address>("home")?;
            self.previous = reader
                .read_portable_array_as::<Address>("previous")?
                .unwrap_or_default();
            self.notes = reader.raw_data_input()?.read_byte_array()?.unwrap_or_default();
            Ok(())
        }
    }

    struct TestFactory;

    impl PortableFactory for TestFactory {
        fn create(&self, class_id: i32) -> Option<Box<dyn Portable>> {
            match class_id {
                PERSON_CLASS_ID => Some(Box::new(Person::default())),
                ADDRESS_CLASS_ID => Some(Box::new(Address::default())),
                _ => None,
            }
        }
    }

    fn serializer() -> PortableSerializer {
        let mut factories: HashMap<i32, Arc<dyn PortableFactory>> = HashMap::new();
        factories.insert(FACTORY_ID, Arc::new(TestFactory));
        PortableSerializer::new(Arc::new(PortableContext::new(0, factories)))
    }

    // Null nested fields and empty arrays cannot be recorded from a value.
    fn register_definitions(serializer: &PortableSerializer) {
        let address = serializer.context.register(
            ClassDefinitionBuilder::new(FACTORY_ID, ADDRESS_CLASS_ID, 0)
                .add_string_field("street")
                .add_int_field("number")
                .build()
                .unwrap(),
        );
        serializer.context.register(
            ClassDefinitionBuilder::new(FACTORY_ID, PERSON_CLASS_ID, 0)
                .add_string_field("name")
                .add_int_field("age")
                .add_long_array_field("scores")
                .add_portable_field("home", &address)
                .add_portable_array_field("previous", &address)
                .build()
                .unwrap(),
        );
    }

    fn round_trip(serializer: &PortableSerializer, person: Person) -> Person {
        let mut output = ObjectDataOutput::new();
        serializer
            .write(&mut output, &Value::portable(person))
            .unwrap();
        let mut input = ObjectDataInput::new(output.as_bytes());
        let value = serializer.read(&mut input).unwrap();
        assert_eq!(input.remaining(), 0);
        value.downcast_ref::<Person>().unwrap().clone()
    }

    #[test]
    fn test_round_trip_with_nested_and_raw_data() {
        let person = Person {
            name: Some("Ada".to_string()),
            age: 36,
            scores: vec![1, 2, 3],
            home: Some(Address {
                street: "Main".to_string(),
                number: 7,
            }),
            previous: vec![
                Address {
                    street: "Old".to_string(),
                    number: 1,
                },
                Address {
                    street: "Older".to_string(),
                    number: 2,
                },
            ],
            notes: vec![9, 8, 7],
        };
        let serializer = serializer();
        register_definitions(&serializer);
        assert_eq!(round_trip(&serializer, person.clone()), person);
    }

    #[test]
    fn test_null_fields() {
        let serializer = serializer();
        register_definitions(&serializer);
        let person = Person::default();
        assert_eq!(round_trip(&serializer, person.clone()), person);
    }

    #[test]
    fn test_header_layout() {
        let serializer = serializer();
        let address = Address {
            street: "x".to_string(),
            number: 5,
        };
        let mut output = ObjectDataOutput::new();
        serializer
            .write(&mut output, &Value::portable(address))
            .unwrap();
        let bytes = output.as_bytes();

        let mut input = ObjectDataInput::new(bytes);
        assert_eq!(input.read_int().unwrap(), FACTORY_ID);
        assert_eq!(input.read_int().unwrap(), ADDRESS_CLASS_ID);
        assert_eq!(input.read_int().unwrap(), 0);
        let end = input.read_int().unwrap();
        assert_eq!(end as usize, bytes.len());
        assert_eq!(input.read_int().unwrap(), 2);
        let first_field = input.read_int().unwrap() as usize;
        // ids, version, end and field count, then three offset slots
        assert_eq!(first_field, 5 * 4 + 3 * 4);
        input.set_position(first_field).unwrap();
        assert_eq!(input.read_short().unwrap(), 6);
        assert_eq!(input.read_bytes(6).unwrap(), b"street");
        assert_eq!(input.read_byte().unwrap(), 9);
    }

    #[test]
    fn test_unknown_definition_is_read_from_payload() {
        let writer_side = serializer();
        let mut output = ObjectDataOutput::new();
        writer_side
            .write(
                &mut output,
                &Value::portable(Address {
                    street: "Elm".to_string(),
                    number: 3,
                }),
            )
            .unwrap();

        let reader_side = serializer();
        let mut input = ObjectDataInput::new(output.as_bytes());
        let value = reader_side.read(&mut input).unwrap();
        assert_eq!(value.downcast_ref::<Address>().unwrap().street, "Elm");
        assert!(reader_side.context.lookup(FACTORY_ID, ADDRESS_CLASS_ID, 0).is_some());
    }

    #[test]
    fn test_unknown_factory() {
        let mut output = ObjectDataOutput::new();
        output.write_int(99).unwrap();
        output.write_int(1).unwrap();
        output.write_int(0).unwrap();
        let mut input = ObjectDataInput::new(output.as_bytes());
        assert!(matches!(
            serializer().read(&mut input),
            Err(HazelcastError::UnknownFactory(_))
        ));
    }
}
