//! Identified data serializable support for Hazelcast serialization.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{HazelcastError, Result};
use crate::serialization::constants::CONSTANT_TYPE_DATA_SERIALIZABLE;
use crate::serialization::registry::Serializer;
use crate::serialization::value::AsAny;
use crate::serialization::{DataInput, DataOutput, ObjectDataInput, ObjectDataOutput, Value};

/// Trait for types that can be serialized using Hazelcast's identified data serializable format.
///
/// Types implementing this trait are identified by a factory ID and class ID combination,
/// which allows efficient type lookup during deserialization.
pub trait IdentifiedDataSerializable: AsAny + Send + Sync + fmt::Debug {
    /// Returns the factory ID for this type.
    fn factory_id(&self) -> i32;

    /// Returns the class ID for this type within its factory.
    fn class_id(&self) -> i32;

    /// Writes the object's data to the output.
    fn write_data(&self, output: &mut dyn DataOutput) -> Result<()>;

    /// Reads the object's data from the input, populating this instance.
    fn read_data(&mut self, input: &mut dyn DataInput) -> Result<()>;

    /// Returns the key this object is routed by, if it overrides its own hash.
    fn partition_key(&self) -> Option<Value> {
        None
    }
}

/// Factory for creating instances of `IdentifiedDataSerializable` types.
///
/// Each factory is responsible for creating instances of types that share the same factory ID.
pub trait DataSerializableFactory: Send + Sync {
    /// Creates a default/empty instance of the type with the given class ID.
    ///
    /// Returns `None` if the class ID is not recognized by this factory.
    fn create(&self, class_id: i32) -> Option<Box<dyn IdentifiedDataSerializable>>;
}

/// Registry for `DataSerializableFactory` instances.
///
/// This registry maps factory IDs to their corresponding factories, enabling
/// type lookup during deserialization.
#[derive(Clone, Default)]
pub struct FactoryRegistry {
    factories: HashMap<i32, Arc<dyn DataSerializableFactory>>,
}

impl FactoryRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory with its factory ID.
    ///
    /// If a factory with the same ID was previously registered, it is replaced.
    pub fn register(&mut self, factory_id: i32, factory: Arc<dyn DataSerializableFactory>) {
        self.factories.insert(factory_id, factory);
    }

    /// Returns the factory for the given factory ID, if registered.
    pub fn get(&self, factory_id: i32) -> Option<&dyn DataSerializableFactory> {
        self.factories.get(&factory_id).map(|f| f.as_ref())
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.factories.keys().copied().collect();
        ids.sort_unstable();
        f.debug_struct("FactoryRegistry").field("factory_ids", &ids).finish()
    }
}

/// Codec for [`Value::Identified`].
///
/// The payload is a `true` marker, the factory and class ids, then the
/// object's own fields.
#[derive(Debug)]
pub(crate) struct IdentifiedSerializer {
    factories: FactoryRegistry,
}

impl IdentifiedSerializer {
    pub(crate) fn new(factories: FactoryRegistry) -> Self {
        Self { factories }
    }
}

impl Serializer for IdentifiedSerializer {
    fn id(&self) -> i32 {
        CONSTANT_TYPE_DATA_SERIALIZABLE
    }

    fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
        let Value::Identified(object) = value else {
            return Err(HazelcastError::Serialization(format!(
                "expected an identified data serializable, got {}",
                value.type_name()
            )));
        };
        output.write_bool(true)?;
        output.write_int(object.factory_id())?;
        output.write_int(object.class_id())?;
        object.write_data(output)
    }

    fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
        if !input.read_bool()? {
            return Err(HazelcastError::Serialization(
                "native DataSerializable is not supported".to_string(),
            ));
        }
        let factory_id = input.read_int()?;
        let class_id = input.read_int()?;
        let factory = self.factories.get(factory_id).ok_or_else(|| {
            HazelcastError::UnknownFactory(format!(
                "no DataSerializerFactory registered for factory id {}",
                factory_id
            ))
        })?;
        let mut object = factory.create(class_id).ok_or_else(|| {
            HazelcastError::UnknownFactory(format!(
                "factory {} cannot create an instance of class id {}",
                factory_id, class_id
            ))
        })?;
        object.read_data(input)?;
        Ok(Value::Identified(Arc::from(object)))
    }
}
