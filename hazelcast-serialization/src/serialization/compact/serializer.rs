//! Compact stream serializer: schema id plus schema-laid-out body.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, trace};

use super::reader::DefaultCompactReader;
use super::schema::Schema;
use super::service::SchemaService;
use super::writer::{DefaultCompactWriter, SchemaWriter};
use super::{CompactSerializer, GenericRecord};
use crate::error::{HazelcastError, Result};
use crate::serialization::constants::TYPE_COMPACT;
use crate::serialization::registry::Serializer;
use crate::serialization::value::Object;
use crate::serialization::{DataInput, DataOutput, ObjectDataInput, ObjectDataOutput, Value};

/// Nesting limit for compact records inside compact records.
const MAX_COMPACT_DEPTH: usize = 64;

/// Codec for [`Value::Compact`] records and objects of registered Compact types.
///
/// Writing a value whose schema the [`SchemaService`] does not know yet fails
/// with [`HazelcastError::SchemaNotReplicated`]; the caller replicates the
/// schema and retries.
pub(crate) struct CompactStreamSerializer {
    schema_service: Arc<dyn SchemaService>,
    by_type: HashMap<TypeId, Arc<dyn CompactSerializer>>,
    by_type_name: HashMap<String, Arc<dyn CompactSerializer>>,
    schemas: RwLock<HashMap<TypeId, Arc<Schema>>>,
}

impl CompactStreamSerializer {
    pub(crate) fn new(
        schema_service: Arc<dyn SchemaService>,
        serializers: &[Arc<dyn CompactSerializer>],
    ) -> Self {
        let mut by_type = HashMap::new();
        let mut by_type_name = HashMap::new();
        for serializer in serializers {
            by_type.insert(serializer.rust_type(), Arc::clone(serializer));
            by_type_name.insert(serializer.type_name().to_string(), Arc::clone(serializer));
        }
        Self {
            schema_service,
            by_type,
            by_type_name,
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// Returns true if a Compact serializer is registered for `type_id`.
    pub(crate) fn is_registered(&self, type_id: TypeId) -> bool {
        self.by_type.contains_key(&type_id)
    }

    /// Writes the schema id of `value` followed by its fields.
    pub(crate) fn write_value(&self, output: &mut ObjectDataOutput<'_>, value: &dyn Any) -> Result<()> {
        if let Some(record) = value.downcast_ref::<GenericRecord>() {
            let schema = record.schema_arc();
            self.ensure_replicated(&schema)?;
            output.write_long(schema.schema_id())?;
            let mut writer = DefaultCompactWriter::new(self, output, schema);
            record.write_fields(&mut writer)?;
            return writer.end();
        }

        let type_id = value.type_id();
        let serializer = self.by_type.get(&type_id).ok_or_else(|| {
            HazelcastError::NoSerializer(format!(
                "no compact serializer registered for type id {:?}",
                type_id
            ))
        })?;
        let schema = self.schema_for(serializer.as_ref(), value)?;
        output.write_long(schema.schema_id())?;
        let mut writer = DefaultCompactWriter::new(self, output, schema);
        serializer.write(value, &mut writer)?;
        writer.end()
    }

    /// Reads a schema id and the record it describes.
    ///
    /// Records of registered types are materialized through their serializer;
    /// all others come back as generic records.
    pub(crate) fn read_value(&self, input: &mut ObjectDataInput<'_>, depth: usize) -> Result<Value> {
        if depth > MAX_COMPACT_DEPTH {
            return Err(HazelcastError::Serialization(
                "compact records nested too deeply".to_string(),
            ));
        }
        let schema_id = input.read_long()?;
        let schema = self
            .schema_service
            .get(schema_id)
            .ok_or(HazelcastError::SchemaNotFound(schema_id))?;
        trace!(schema_id, type_name = schema.type_name(), "reading compact record");

        let mut reader = DefaultCompactReader::new(self, input, Arc::clone(&schema), depth)?;
        match self.by_type_name.get(schema.type_name()) {
            Some(serializer) => {
                let object = serializer.read(&mut reader)?;
                Ok(Value::Object(Object::from_arc(object, serializer.rust_type_name())))
            }
            None => Ok(Value::Compact(Arc::new(GenericRecord::read_from(
                schema,
                &mut reader,
            )?))),
        }
    }

    /// Returns the replicated schema of a registered type, deriving it on first use.
    fn schema_for(&self, serializer: &dyn CompactSerializer, value: &dyn Any) -> Result<Arc<Schema>> {
        let type_id = serializer.rust_type();
        if let Some(schema) = self
            .schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
        {
            return Ok(Arc::clone(schema));
        }

        let mut schema_writer = SchemaWriter::new(serializer.type_name());
        serializer.write(value, &mut schema_writer)?;
        let schema = Arc::new(schema_writer.build()?);
        let schema = self.ensure_replicated(&schema)?;
        debug!(
            schema_id = schema.schema_id(),
            type_name = schema.type_name(),
            rust_type = serializer.rust_type_name(),
            "compact schema cached"
        );
        self.schemas
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(type_id, Arc::clone(&schema));
        Ok(schema)
    }

    fn ensure_replicated(&self, schema: &Arc<Schema>) -> Result<Arc<Schema>> {
        match self.schema_service.get(schema.schema_id()) {
            Some(known) => Ok(known),
            None => Err(HazelcastError::SchemaNotReplicated(Box::new(
                schema.as_ref().clone(),
            ))),
        }
    }
}

impl fmt::Debug for CompactStreamSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.by_type_name.keys().collect();
        names.sort_unstable();
        f.debug_struct("CompactStreamSerializer")
            .field("types", &names)
            .finish_non_exhaustive()
    }
}

impl Serializer for CompactStreamSerializer {
    fn id(&self) -> i32 {
        TYPE_COMPACT
    }

    fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()> {
        match value {
            Value::Compact(record) => self.write_value(output, &**record as &dyn Any),
            Value::Object(object) => self.write_value(output, object.as_any() as &dyn Any),
            other => Err(HazelcastError::Serialization(format!(
                "expected a compact value, got {}",
                other.type_name()
            ))),
        }
    }

    fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value> {
        self.read_value(input, 0)
    }
}
