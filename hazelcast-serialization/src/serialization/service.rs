//! The serialization service: dispatch, container framing and nested objects.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::config::SerializationConfig;
use crate::error::{HazelcastError, Result};
use crate::partition::{DefaultPartitioningStrategy, NullPartitioningStrategy, PartitioningStrategy};
use crate::serialization::compact::{CompactStreamSerializer, InMemorySchemaService, SchemaService};
use crate::serialization::constants::DATA_OFFSET;
use crate::serialization::custom::CustomSerializerAdapter;
use crate::serialization::defaults::{builtin_kind, register_defaults, typed_array_kind};
use crate::serialization::identified::{FactoryRegistry, IdentifiedSerializer};
use crate::serialization::json::JsonSerializer;
use crate::serialization::portable::{PortableContext, PortableSerializer};
use crate::serialization::registry::{BuiltinKind, Serializer, SerializerRegistry, TypeKey};
use crate::serialization::{
    ByteOrder, Data, DataInput, DataOutput, NumberType, ObjectDataInput, ObjectDataOutput, Value,
};

/// Upper bound on schema replication round trips for one value; each nested
/// Compact type may need its own.
const MAX_REPLICATION_ATTEMPTS: usize = 64;

/// Converts values to [`Data`] containers and back.
///
/// Built once from a validated [`SerializationConfig`]; the registry is
/// read-only afterwards and the service can be shared across threads.
///
/// # Example
///
/// ```
/// use hazelcast_serialization::config::SerializationConfig;
/// use hazelcast_serialization::serialization::{SerializationService, Value};
///
/// let service = SerializationService::new(SerializationConfig::default())?;
/// let data = service.to_data(&Value::String("hazelcast".into()))?;
/// assert_eq!(service.to_object(&data)?, Value::String("hazelcast".into()));
/// # Ok::<(), hazelcast_serialization::HazelcastError>(())
/// ```
pub struct SerializationService {
    registry: SerializerRegistry,
    byte_order: ByteOrder,
    default_number_type: NumberType,
    compact: Arc<CompactStreamSerializer>,
    portable_context: Arc<PortableContext>,
    schema_service: Arc<dyn SchemaService>,
}

impl SerializationService {
    /// Builds a service with a process-local schema service.
    pub fn new(config: SerializationConfig) -> Result<Self> {
        Self::with_schema_service(config, Arc::new(InMemorySchemaService::new()))
    }

    /// Builds a service that resolves and replicates Compact schemas through
    /// `schema_service`.
    pub fn with_schema_service(
        config: SerializationConfig,
        schema_service: Arc<dyn SchemaService>,
    ) -> Result<Self> {
        let mut registry = SerializerRegistry::new();
        register_defaults(&mut registry)?;

        let compact = Arc::new(CompactStreamSerializer::new(
            Arc::clone(&schema_service),
            config.compact_serializers(),
        ));
        registry.register(TypeKey::Compact, Arc::clone(&compact) as Arc<dyn Serializer>, None)?;

        let mut factories = FactoryRegistry::new();
        for (factory_id, factory) in config.data_serializable_factories() {
            factories.register(*factory_id, Arc::clone(factory));
        }
        registry.register(
            TypeKey::Identified,
            Arc::new(IdentifiedSerializer::new(factories)),
            None,
        )?;

        let portable_factories: HashMap<_, _> = config
            .portable_factories()
            .iter()
            .map(|(factory_id, factory)| (*factory_id, Arc::clone(factory)))
            .collect();
        let portable_context = Arc::new(PortableContext::new(
            config.portable_version(),
            portable_factories,
        ));
        for definition in config.class_definitions() {
            portable_context.register(definition.clone());
        }
        registry.register(
            TypeKey::Portable,
            Arc::new(PortableSerializer::new(Arc::clone(&portable_context))),
            None,
        )?;

        registry.register(TypeKey::Json, Arc::new(JsonSerializer), None)?;

        for serializer in config.custom_serializers() {
            registry.register(
                TypeKey::Custom(serializer.id()),
                Arc::new(CustomSerializerAdapter::new(Arc::clone(serializer))),
                None,
            )?;
        }
        if let Some(global) = config.global_serializer() {
            registry.register(
                TypeKey::Global,
                Arc::new(CustomSerializerAdapter::new(Arc::clone(global))),
                None,
            )?;
        }

        info!(
            byte_order = ?config.byte_order(),
            default_number_type = ?config.default_number_type(),
            serializers = registry.len(),
            "serialization service built"
        );

        Ok(Self {
            registry,
            byte_order: config.byte_order(),
            default_number_type: config.default_number_type(),
            compact,
            portable_context,
            schema_service,
        })
    }

    /// Returns the payload byte order.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Returns the width untyped numbers are written with.
    pub fn default_number_type(&self) -> NumberType {
        self.default_number_type
    }

    /// Returns the portable class definition cache.
    pub fn portable_context(&self) -> &PortableContext {
        &self.portable_context
    }

    /// Returns the schema service Compact schemas are resolved through.
    pub fn schema_service(&self) -> &Arc<dyn SchemaService> {
        &self.schema_service
    }

    /// Serializes `value`, routing by the key it carries, if any.
    pub fn to_data(&self, value: &Value) -> Result<Data> {
        self.to_data_with_strategy(value, &DefaultPartitioningStrategy)
    }

    /// Serializes `value`, asking `strategy` for its partition key.
    ///
    /// The key, when present, is serialized without a strategy and its hash
    /// stored in the header.
    pub fn to_data_with_strategy(
        &self,
        value: &Value,
        strategy: &dyn PartitioningStrategy,
    ) -> Result<Data> {
        let serializer = self.find_serializer_for(value)?;
        let partition_hash = match strategy.partition_key(value) {
            Some(key) => self
                .to_data_with_strategy(&key, &NullPartitioningStrategy)?
                .partition_hash(),
            None => 0,
        };

        let mut output = ObjectDataOutput::with_service(self.byte_order, self);
        output.write_int_be(partition_hash as i32)?;
        output.write_int_be(serializer.id())?;
        serializer.write(&mut output, value)?;
        Data::wrap(output.into_bytes())
    }

    /// Serializes `value`, replicating each Compact schema the schema service
    /// reports missing and retrying.
    ///
    /// Stands in for a client's invocation layer, which does the same round
    /// trip against the cluster.
    pub fn to_data_with_replication(&self, value: &Value) -> Result<Data> {
        let mut attempts = 0;
        loop {
            match self.to_data(value) {
                Err(HazelcastError::SchemaNotReplicated(schema)) if attempts < MAX_REPLICATION_ATTEMPTS => {
                    debug!(
                        schema_id = schema.schema_id(),
                        type_name = schema.type_name(),
                        "replicating compact schema"
                    );
                    self.schema_service.put(*schema)?;
                    attempts += 1;
                }
                result => return result,
            }
        }
    }

    /// Deserializes a container. The empty container reads as [`Value::Null`].
    pub fn to_object(&self, data: &Data) -> Result<Value> {
        if data.is_empty() {
            return Ok(Value::Null);
        }
        let serializer = self.find_serializer_by_id(data.type_id())?;
        let mut input = ObjectDataInput::with_service(data.to_bytes(), self.byte_order, self);
        input.set_position(DATA_OFFSET)?;
        serializer.read(&mut input)
    }

    /// Returns the partition hash `value` would be stored with.
    pub fn partition_hash(&self, value: &Value) -> Result<u32> {
        Ok(self.to_data(value)?.partition_hash())
    }

    /// Writes a nested value: its serializer id followed by its payload.
    pub fn write_object(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
        let serializer = self.find_serializer_for(value)?;
        output.write_int(serializer.id())?;
        serializer.write(output, value)
    }

    /// Reads a nested value written by [`write_object`](Self::write_object).
    pub fn read_object(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
        let id = input.read_int()?;
        self.find_serializer_by_id(id)?.read(input)
    }

    /// Resolves the serializer for `value`. The first matching rule wins:
    ///
    /// 1. null
    /// 2. a Compact record or registered Compact type
    /// 3. identified data serializable
    /// 4. portable
    /// 5. a built-in kind; untyped numbers use the default number type and
    ///    untyped arrays their first element's array serializer
    /// 6. the custom serializer an object names
    /// 7. the global serializer
    /// 8. JSON, for values with a JSON form
    pub fn find_serializer_for(&self, value: &Value) -> Result<Arc<dyn Serializer>> {
        if let Value::Undefined = value {
            return Err(HazelcastError::NoSerializer("undefined".to_string()));
        }
        if let Some(serializer) = self.lookup_default(value)? {
            trace!(value = value.type_name(), id = serializer.id(), "dispatched to default");
            return Ok(Arc::clone(serializer));
        }
        if let Some(serializer) = self.lookup_custom(value) {
            trace!(value = value.type_name(), id = serializer.id(), "dispatched to custom");
            return Ok(Arc::clone(serializer));
        }
        if let Some(serializer) = self.registry.scalar(TypeKey::Global) {
            trace!(value = value.type_name(), "dispatched to global");
            return Ok(Arc::clone(serializer));
        }
        if value.to_json().is_some() {
            if let Some(serializer) = self.registry.scalar(TypeKey::Json) {
                warn!(value = value.type_name(), "no serializer matched, falling back to JSON");
                return Ok(Arc::clone(serializer));
            }
        }
        Err(HazelcastError::NoSerializer(value.type_name().to_string()))
    }

    /// Resolves the serializer bound to a wire type id.
    pub fn find_serializer_by_id(&self, id: i32) -> Result<Arc<dyn Serializer>> {
        self.registry
            .by_id(id)
            .cloned()
            .ok_or(HazelcastError::NoDeserializer(id))
    }

    fn lookup_default(&self, value: &Value) -> Result<Option<&Arc<dyn Serializer>>> {
        let key = match value {
            Value::Null => TypeKey::Builtin(BuiltinKind::Null),
            Value::Compact(_) => TypeKey::Compact,
            Value::Object(object) if self.compact.is_registered(object.type_id()) => {
                TypeKey::Compact
            }
            Value::Identified(_) => TypeKey::Identified,
            Value::Portable(_) => TypeKey::Portable,
            Value::Json(_) => TypeKey::Json,
            Value::Number(_) => TypeKey::Builtin(number_kind(self.default_number_type)),
            Value::Array(items) => return self.lookup_array(items),
            other => match builtin_kind(other) {
                Some(kind) => TypeKey::Builtin(kind),
                None => match typed_array_kind(other) {
                    Some(kind) => return Ok(self.registry.array(TypeKey::Builtin(kind))),
                    None => return Ok(None),
                },
            },
        };
        Ok(self.registry.scalar(key))
    }

    /// The first element of an untyped array decides its serializer; an empty
    /// array is written as an array of the default number type.
    fn lookup_array(&self, items: &[Value]) -> Result<Option<&Arc<dyn Serializer>>> {
        let kind = match items.first() {
            None => number_kind(self.default_number_type),
            Some(Value::Undefined) => return Err(HazelcastError::UndefinedInArray),
            Some(Value::Number(_)) => number_kind(self.default_number_type),
            Some(first) => match builtin_kind(first) {
                Some(kind) => kind,
                None => return Ok(None),
            },
        };
        Ok(self.registry.array(TypeKey::Builtin(kind)))
    }

    fn lookup_custom(&self, value: &Value) -> Option<&Arc<dyn Serializer>> {
        match value {
            Value::Object(object) => object
                .custom_id()
                .and_then(|id| self.registry.scalar(TypeKey::Custom(id))),
            _ => None,
        }
    }
}

fn number_kind(number_type: NumberType) -> BuiltinKind {
    match number_type {
        NumberType::Byte => BuiltinKind::Byte,
        NumberType::Short => BuiltinKind::Short,
        NumberType::Integer => BuiltinKind::Int,
        NumberType::Long => BuiltinKind::Long,
        NumberType::Float => BuiltinKind::Float,
        NumberType::Double => BuiltinKind::Double,
    }
}

impl fmt::Debug for SerializationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationService")
            .field("byte_order", &self.byte_order)
            .field("default_number_type", &self.default_number_type)
            .field("registry", &self.registry)
            .field("compact", &self.compact)
            .finish_non_exhaustive()
    }
}
