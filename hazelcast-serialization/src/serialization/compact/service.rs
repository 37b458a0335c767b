//! Schema lookup and replication seam for Compact serialization.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::schema::Schema;
use crate::error::{HazelcastError, Result};

/// Shares Compact schemas between writers and readers.
///
/// A client backs this with the cluster: `put` replicates a schema before any
/// payload referencing it is sent, `get` resolves ids seen in received payloads.
pub trait SchemaService: Send + Sync {
    /// Returns the schema with the given id, if known.
    fn get(&self, schema_id: i64) -> Option<Arc<Schema>>;

    /// Makes `schema` known under its id.
    fn put(&self, schema: Schema) -> Result<()>;
}

/// A process-local [`SchemaService`].
#[derive(Default)]
pub struct InMemorySchemaService {
    schemas: RwLock<HashMap<i64, Arc<Schema>>>,
}

impl InMemorySchemaService {
    /// Creates an empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of known schemas.
    pub fn len(&self) -> usize {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no schema is known.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SchemaService for InMemorySchemaService {
    fn get(&self, schema_id: i64) -> Option<Arc<Schema>> {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&schema_id)
            .cloned()
    }

    fn put(&self, schema: Schema) -> Result<()> {
        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = schemas.get(&schema.schema_id()) {
            if existing.as_ref() != &schema {
                return Err(HazelcastError::Serialization(format!(
                    "schema id {} already names a different schema ({} vs {})",
                    schema.schema_id(),
                    existing,
                    schema
                )));
            }
            return Ok(());
        }
        debug!(
            schema_id = schema.schema_id(),
            type_name = schema.type_name(),
            "schema registered"
        );
        schemas.insert(schema.schema_id(), Arc::new(schema));
        Ok(())
    }
}

impl fmt::Debug for InMemorySchemaService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemorySchemaService")
            .field("schemas", &self.len())
            .finish()
    }
}
