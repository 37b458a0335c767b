//! Class definition cache and factory lookup shared by portable readers and writers.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::writer::ClassDefinitionWriter;
use super::{
    ClassDefinition, ClassDefinitionBuilder, FieldDefinition, FieldType, Portable,
    PortableFactory,
};
use crate::error::{HazelcastError, Result};
use crate::serialization::{DataInput, ObjectDataInput};

/// Nesting limit when parsing class definitions out of a payload.
const MAX_DEFINITION_DEPTH: usize = 64;

type DefinitionKey = (i32, i32, i32);

/// Holds the configured portable factories and every class definition seen
/// so far, keyed by `(factory_id, class_id, version)`.
///
/// Definitions are immutable once cached; the first registration of a key
/// wins and later ones receive the cached instance.
pub struct PortableContext {
    portable_version: i32,
    factories: HashMap<i32, Arc<dyn PortableFactory>>,
    definitions: RwLock<HashMap<DefinitionKey, Arc<ClassDefinition>>>,
}

impl PortableContext {
    /// Creates a context with the given default version and factories.
    pub fn new(
        portable_version: i32,
        factories: HashMap<i32, Arc<dyn PortableFactory>>,
    ) -> Self {
        Self {
            portable_version,
            factories,
            definitions: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the configured portable version.
    pub fn version(&self) -> i32 {
        self.portable_version
    }

    /// Returns the version `portable` is written with.
    pub fn class_version(&self, portable: &dyn Portable) -> i32 {
        portable.version().unwrap_or(self.portable_version)
    }

    /// Returns the cached definition for the given key.
    pub fn lookup(&self, factory_id: i32, class_id: i32, version: i32) -> Option<Arc<ClassDefinition>> {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(factory_id, class_id, version))
            .cloned()
    }

    /// Returns the definition to describe a null nested `(factory_id,
    /// class_id)` field with: the one at the configured version, or else the
    /// newest cached version of that class.
    pub fn lookup_nested(&self, factory_id: i32, class_id: i32) -> Option<Arc<ClassDefinition>> {
        let definitions = self
            .definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(definition) = definitions.get(&(factory_id, class_id, self.portable_version)) {
            return Some(Arc::clone(definition));
        }
        definitions
            .iter()
            .filter(|((f, c, _), _)| *f == factory_id && *c == class_id)
            .max_by_key(|((_, _, version), _)| *version)
            .map(|(_, definition)| Arc::clone(definition))
    }

    /// Caches `definition` unless its key is already present, and returns
    /// the cached instance.
    pub fn register(&self, definition: ClassDefinition) -> Arc<ClassDefinition> {
        let key = definition.key();
        let mut definitions = self
            .definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = definitions.entry(key).or_insert_with(|| {
            debug!(
                factory_id = key.0,
                class_id = key.1,
                version = key.2,
                fields = definition.field_count(),
                "registered portable class definition"
            );
            Arc::new(definition)
        });
        Arc::clone(entry)
    }

    /// Returns the definition of `portable`, recording it from a dry run of
    /// its writer on first use.
    pub fn lookup_or_register(&self, portable: &dyn Portable) -> Result<Arc<ClassDefinition>> {
        let version = self.class_version(portable);
        if let Some(definition) = self.lookup(portable.factory_id(), portable.class_id(), version) {
            return Ok(definition);
        }
        let builder = ClassDefinitionBuilder::new(portable.factory_id(), portable.class_id(), version);
        let mut writer = ClassDefinitionWriter::new(self, builder);
        portable.write_portable(&mut writer)?;
        Ok(self.register(writer.finish()?))
    }

    /// Creates a blank instance through the registered factory.
    pub fn create(&self, factory_id: i32, class_id: i32) -> Result<Box<dyn Portable>> {
        let factory = self.factories.get(&factory_id).ok_or_else(|| {
            HazelcastError::UnknownFactory(format!(
                "no PortableFactory registered for factory id {}",
                factory_id
            ))
        })?;
        factory.create(class_id).ok_or_else(|| {
            HazelcastError::UnknownFactory(format!(
                "portable factory {} cannot create an instance of class id {}",
                factory_id, class_id
            ))
        })
    }

    /// Returns the number of cached class definitions.
    pub fn definition_count(&self) -> usize {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Recovers the class definition of a payload whose definition is not
    /// cached, by walking its field table.
    ///
    /// `input` must be positioned just after the version, at the start of
    /// the portable header; the position is restored afterwards.
    pub fn read_class_definition(
        &self,
        input: &mut ObjectDataInput<'_>,
        factory_id: i32,
        class_id: i32,
        version: i32,
    ) -> Result<Arc<ClassDefinition>> {
        self.read_nested_definition(input, factory_id, class_id, version, 0)
    }

    fn read_nested_definition(
        &self,
        input: &mut ObjectDataInput<'_>,
        factory_id: i32,
        class_id: i32,
        version: i32,
        depth: usize,
    ) -> Result<Arc<ClassDefinition>> {
        if depth > MAX_DEFINITION_DEPTH {
            return Err(HazelcastError::Serialization(
                "portable class definitions nested too deeply".to_string(),
            ));
        }
        if let Some(definition) = self.lookup(factory_id, class_id, version) {
            return Ok(definition);
        }
        let start = input.position();
        let parsed = self.parse_definition(input, factory_id, class_id, version, depth);
        input.set_position(start)?;
        let (definition, complete) = parsed?;
        if complete {
            Ok(self.register(definition))
        } else {
            // a null nested portable or an empty portable array carries no
            // nested version, so the guessed definition is not cached
            Ok(Arc::new(definition))
        }
    }

    fn parse_definition(
        &self,
        input: &mut ObjectDataInput<'_>,
        factory_id: i32,
        class_id: i32,
        version: i32,
        depth: usize,
    ) -> Result<(ClassDefinition, bool)> {
        let mut complete = true;
        let mut builder = ClassDefinitionBuilder::new(factory_id, class_id, version);
        let _end = input.read_int()?;
        let field_count = input.read_int()?;
        if field_count < 0 {
            return Err(HazelcastError::Serialization(format!(
                "negative portable field count: {}",
                field_count
            )));
        }
        let offset = input.position();

        for index in 0..field_count {
            let table_slot = offset + index as usize * 4;
            let field_position = to_position(input.read_int_at(table_slot)?)?;
            input.set_position(field_position)?;
            let name_len = input.read_short()?;
            if name_len < 0 {
                return Err(HazelcastError::Serialization(format!(
                    "negative portable field name length: {}",
                    name_len
                )));
            }
            let name = String::from_utf8(input.read_bytes(name_len as usize)?)
                .map_err(|e| HazelcastError::Serialization(e.to_string()))?;
            let field_type = FieldType::from_id(input.read_byte()? as i32)?;

            let field = match field_type {
                FieldType::Portable => {
                    let is_null = input.read_bool()?;
                    let nested_factory = input.read_int()?;
                    let nested_class = input.read_int()?;
                    let nested_version = if is_null {
                        complete = false;
                        self.portable_version
                    } else {
                        let nested_version = input.read_int()?;
                        self.read_nested_definition(
                            input,
                            nested_factory,
                            nested_class,
                            nested_version,
                            depth + 1,
                        )?;
                        nested_version
                    };
                    FieldDefinition::new_portable(name, index, nested_factory, nested_class, nested_version)
                }
                FieldType::PortableArray => {
                    let len = input.read_int()?;
                    let nested_factory = input.read_int()?;
                    let nested_class = input.read_int()?;
                    let nested_version = if len > 0 {
                        let first = to_position(input.read_int()?)?;
                        input.set_position(first)?;
                        let nested_version = input.read_int()?;
                        self.read_nested_definition(
                            input,
                            nested_factory,
                            nested_class,
                            nested_version,
                            depth + 1,
                        )?;
                        nested_version
                    } else {
                        complete = false;
                        self.portable_version
                    };
                    FieldDefinition::new_portable_array(
                        name,
                        index,
                        nested_factory,
                        nested_class,
                        nested_version,
                    )
                }
                other => FieldDefinition::new(name, other, index),
            };
            builder.try_add(field)?;
        }
        Ok((builder.build()?, complete))
    }
}

impl fmt::Debug for PortableContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut factory_ids: Vec<_> = self.factories.keys().copied().collect();
        factory_ids.sort_unstable();
        f.debug_struct("PortableContext")
            .field("portable_version", &self.portable_version)
            .field("factory_ids", &factory_ids)
            .field("definitions", &self.definition_count())
            .finish()
    }
}

/// Converts a stored offset into a stream position.
pub(super) fn to_position(offset: i32) -> Result<usize> {
    usize::try_from(offset).map_err(|_| {
        HazelcastError::Serialization(format!("invalid portable offset: {}", offset))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::portable::{PortableReader, PortableWriter};

    #[derive(Debug, Default)]
    struct Sample {
        id: i32,
    }

    impl Portable for Sample {
        fn factory_id(&self) -> i32 {
            1
        }

        fn class_id(&self) -> i32 {
            2
        }

        fn write_portable(&self, writer: &mut dyn PortableWriter) -> Result<()> {
            writer.write_int("id", self.id)
        }

        fn read_portable(&mut self, reader: &mut dyn PortableReader) -> Result<()> {
            self.id = reader.read_int("id")?;
            Ok(())
        }
    }

    struct SampleFactory;

    impl PortableFactory for SampleFactory {
        fn create(&self, class_id: i32) -> Option<Box<dyn Portable>> {
            (class_id == 2).then(|| Box::new(Sample::default()) as Box<dyn Portable>)
        }
    }

    fn context() -> PortableContext {
        let mut factories: HashMap<i32, Arc<dyn PortableFactory>> = HashMap::new();
        factories.insert(1, Arc::new(SampleFactory));
        PortableContext::new(3, factories)
    }

    #[test]
    fn test_first_registration_wins() {
        let ctx = context();
        let first = ctx.register(ClassDefinition::new(1, 2, 0));
        let mut other = ClassDefinition::new(1, 2, 0);
        other.add_field(FieldDefinition::new("x", FieldType::Int, 0));
        let second = ctx.register(other);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.field_count(), 0);
        assert_eq!(ctx.definition_count(), 1);
    }

    #[test]
    fn test_lookup_or_register_records_fields() {
        let ctx = context();
        let definition = ctx.lookup_or_register(&Sample { id: 4 }).unwrap();
        assert_eq!(definition.key(), (1, 2, 3));
        assert_eq!(definition.field_type("id"), Some(FieldType::Int));

        let again = ctx.lookup_or_register(&Sample { id: 5 }).unwrap();
        assert!(Arc::ptr_eq(&definition, &again));
    }

    #[test]
    fn test_create_unknown_factory_or_class() {
        let ctx = context();
        assert!(ctx.create(1, 2).is_ok());
        assert!(matches!(ctx.create(9, 2), Err(HazelcastError::UnknownFactory(_))));
        assert!(matches!(ctx.create(1, 9), Err(HazelcastError::UnknownFactory(_))));
    }
}
