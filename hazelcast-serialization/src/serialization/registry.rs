//! Serializer registry keyed by type and by wire id.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{HazelcastError, Result};
use crate::serialization::{ObjectDataInput, ObjectDataOutput, Value};

/// A codec for one wire type id.
///
/// Implementations write the payload only; the container header and the
/// nested type id are written by the service.
pub trait Serializer: Send + Sync {
    /// The wire type id this serializer owns.
    fn id(&self) -> i32;

    /// Writes `value` to `output`.
    fn write(&self, output: &mut ObjectDataOutput<'_>, value: &Value) -> Result<()>;

    /// Reads one value from `input`.
    fn read(&self, input: &mut ObjectDataInput<'_>) -> Result<Value>;
}

/// Built-in value kinds with a default serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    /// The null value. Has no array serializer.
    Null,
    /// Boolean.
    Bool,
    /// Signed byte.
    Byte,
    /// UTF-16 code unit.
    Char,
    /// 16-bit integer.
    Short,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// UTF-8 string.
    String,
    /// UUID.
    Uuid,
    /// Epoch-millisecond date.
    Date,
    /// Calendar date.
    LocalDate,
    /// Wall-clock time.
    LocalTime,
    /// Date and time.
    LocalDateTime,
    /// Date and time with offset.
    OffsetDateTime,
    /// Big integer.
    BigInteger,
    /// Big decimal.
    BigDecimal,
    /// Class name placeholder.
    JavaClass,
    /// Read-only array of nested objects.
    JavaArray,
    /// Ordered list of nested objects.
    ArrayList,
    /// Linked list of nested objects; reads as a list.
    LinkedList,
}

/// Key under which a serializer pair is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKey {
    /// A built-in kind.
    Builtin(BuiltinKind),
    /// An application serializer, by its custom id.
    Custom(i32),
    /// The identified data serializable codec.
    Identified,
    /// The portable codec.
    Portable,
    /// The compact codec.
    Compact,
    /// The JSON codec.
    Json,
    /// The global fallback serializer.
    Global,
}

/// The scalar serializer for a key plus its optional array serializer.
#[derive(Clone)]
pub struct SerializerPair {
    /// Serializer for single values.
    pub scalar: Arc<dyn Serializer>,
    /// Serializer for arrays of the same kind, if one exists.
    pub array: Option<Arc<dyn Serializer>>,
}

/// Maps type keys to serializer pairs and wire ids to serializers.
///
/// Built once by the serialization service and read-only afterwards.
#[derive(Default)]
pub struct SerializerRegistry {
    by_key: HashMap<TypeKey, SerializerPair>,
    by_id: HashMap<i32, Arc<dyn Serializer>>,
}

impl SerializerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a serializer pair under `key`.
    ///
    /// Fails if `key` is already registered or if either serializer's id is
    /// already bound.
    pub fn register(
        &mut self,
        key: TypeKey,
        scalar: Arc<dyn Serializer>,
        array: Option<Arc<dyn Serializer>>,
    ) -> Result<()> {
        if self.by_key.contains_key(&key) {
            return Err(HazelcastError::DuplicateRegistration(format!(
                "{:?} is already in the registry",
                key
            )));
        }
        let ids = std::iter::once(scalar.id()).chain(array.as_ref().map(|a| a.id()));
        for id in ids {
            if self.by_id.contains_key(&id) {
                return Err(HazelcastError::DuplicateRegistration(format!(
                    "serializer id {} is already in the registry",
                    id
                )));
            }
        }
        if let Some(array) = &array {
            if array.id() == scalar.id() {
                return Err(HazelcastError::DuplicateRegistration(format!(
                    "scalar and array serializers share id {}",
                    scalar.id()
                )));
            }
            self.by_id.insert(array.id(), Arc::clone(array));
        }
        self.by_id.insert(scalar.id(), Arc::clone(&scalar));
        self.by_key.insert(key, SerializerPair { scalar, array });
        Ok(())
    }

    /// Returns the scalar serializer registered under `key`.
    pub fn scalar(&self, key: TypeKey) -> Option<&Arc<dyn Serializer>> {
        self.by_key.get(&key).map(|pair| &pair.scalar)
    }

    /// Returns the array serializer registered under `key`.
    pub fn array(&self, key: TypeKey) -> Option<&Arc<dyn Serializer>> {
        self.by_key.get(&key).and_then(|pair| pair.array.as_ref())
    }

    /// Returns the serializer bound to wire id `id`.
    pub fn by_id(&self, id: i32) -> Option<&Arc<dyn Serializer>> {
        self.by_id.get(&id)
    }

    /// Returns true if `key` has a registration.
    pub fn contains_key(&self, key: TypeKey) -> bool {
        self.by_key.contains_key(&key)
    }

    /// Returns the number of wire ids bound.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        f.debug_struct("SerializerRegistry")
            .field("keys", &self.by_key.len())
            .field("ids", &ids)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(i32);

    impl Serializer for Fixed {
        fn id(&self) -> i32 {
            self.0
        }

        fn write(&self, _output: &mut ObjectDataOutput<'_>, _value: &Value) -> Result<()> {
            Ok(())
        }

        fn read(&self, _input: &mut ObjectDataInput<'_>) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = SerializerRegistry::new();
        registry
            .register(
                TypeKey::Builtin(BuiltinKind::Int),
                Arc::new(Fixed(-7)),
                Some(Arc::new(Fixed(-16))),
            )
            .unwrap();
        let key = TypeKey::Builtin(BuiltinKind::Int);
        assert_eq!(registry.scalar(key).unwrap().id(), -7);
        assert_eq!(registry.array(key).unwrap().id(), -16);
        assert_eq!(registry.by_id(-16).unwrap().id(), -16);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut registry = SerializerRegistry::new();
        registry
            .register(TypeKey::Global, Arc::new(Fixed(5)), None)
            .unwrap();
        let err = registry
            .register(TypeKey::Global, Arc::new(Fixed(6)), None)
            .unwrap_err();
        assert!(matches!(err, HazelcastError::DuplicateRegistration(_)));
        assert!(registry.by_id(6).is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = SerializerRegistry::new();
        registry
            .register(TypeKey::Custom(5), Arc::new(Fixed(5)), None)
            .unwrap();
        let err = registry
            .register(TypeKey::Global, Arc::new(Fixed(5)), None)
            .unwrap_err();
        assert!(matches!(err, HazelcastError::DuplicateRegistration(_)));
        assert!(!registry.contains_key(TypeKey::Global));
    }

    #[test]
    fn test_null_kind_has_no_array() {
        let mut registry = SerializerRegistry::new();
        registry
            .register(TypeKey::Builtin(BuiltinKind::Null), Arc::new(Fixed(0)), None)
            .unwrap();
        assert!(registry.array(TypeKey::Builtin(BuiltinKind::Null)).is_none());
    }
}
