//! Serialization configuration and its builder.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::HazelcastError;
use crate::serialization::compact::{compact_serializer, Compact, CompactSerializer, GenericRecord};
use crate::serialization::portable::{ClassDefinition, PortableFactory};
use crate::serialization::{
    ByteOrder, CustomSerializer, DataSerializableFactory, HazelcastJsonValue, NumberType, Value,
};

/// Default payload byte order.
pub const DEFAULT_BYTE_ORDER: ByteOrder = ByteOrder::BigEndian;
/// Default width of untyped numbers.
pub const DEFAULT_NUMBER_TYPE: NumberType = NumberType::Double;
/// Default portable class version.
pub const DEFAULT_PORTABLE_VERSION: i32 = 0;

/// Configuration error returned when validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for HazelcastError {
    fn from(err: ConfigError) -> Self {
        HazelcastError::Configuration(err.message)
    }
}

/// Validated settings a [`SerializationService`](crate::serialization::SerializationService)
/// is built from.
#[derive(Clone)]
pub struct SerializationConfig {
    byte_order: ByteOrder,
    default_number_type: NumberType,
    portable_version: i32,
    data_serializable_factories: Vec<(i32, Arc<dyn DataSerializableFactory>)>,
    portable_factories: Vec<(i32, Arc<dyn PortableFactory>)>,
    class_definitions: Vec<ClassDefinition>,
    custom_serializers: Vec<Arc<dyn CustomSerializer>>,
    global_serializer: Option<Arc<dyn CustomSerializer>>,
    compact_serializers: Vec<Arc<dyn CompactSerializer>>,
}

impl SerializationConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> SerializationConfigBuilder {
        SerializationConfigBuilder::new()
    }

    /// Returns the payload byte order.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Returns the width untyped numbers are written with.
    pub fn default_number_type(&self) -> NumberType {
        self.default_number_type
    }

    /// Returns the default portable class version.
    pub fn portable_version(&self) -> i32 {
        self.portable_version
    }

    /// Returns the identified data serializable factories, keyed by factory id.
    pub fn data_serializable_factories(&self) -> &[(i32, Arc<dyn DataSerializableFactory>)] {
        &self.data_serializable_factories
    }

    /// Returns the portable factories, keyed by factory id.
    pub fn portable_factories(&self) -> &[(i32, Arc<dyn PortableFactory>)] {
        &self.portable_factories
    }

    /// Returns the explicitly registered class definitions.
    pub fn class_definitions(&self) -> &[ClassDefinition] {
        &self.class_definitions
    }

    /// Returns the custom serializers.
    pub fn custom_serializers(&self) -> &[Arc<dyn CustomSerializer>] {
        &self.custom_serializers
    }

    /// Returns the global serializer, if configured.
    pub fn global_serializer(&self) -> Option<&Arc<dyn CustomSerializer>> {
        self.global_serializer.as_ref()
    }

    /// Returns the Compact serializers.
    pub fn compact_serializers(&self) -> &[Arc<dyn CompactSerializer>] {
        &self.compact_serializers
    }
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self {
            byte_order: DEFAULT_BYTE_ORDER,
            default_number_type: DEFAULT_NUMBER_TYPE,
            portable_version: DEFAULT_PORTABLE_VERSION,
            data_serializable_factories: Vec::new(),
            portable_factories: Vec::new(),
            class_definitions: Vec::new(),
            custom_serializers: Vec::new(),
            global_serializer: None,
            compact_serializers: Vec::new(),
        }
    }
}

impl fmt::Debug for SerializationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationConfig")
            .field("byte_order", &self.byte_order)
            .field("default_number_type", &self.default_number_type)
            .field("portable_version", &self.portable_version)
            .field(
                "data_serializable_factories",
                &self
                    .data_serializable_factories
                    .iter()
                    .map(|(id, _)| *id)
                    .collect::<Vec<_>>(),
            )
            .field(
                "portable_factories",
                &self.portable_factories.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
            )
            .field("class_definitions", &self.class_definitions.len())
            .field(
                "custom_serializers",
                &self.custom_serializers.iter().map(|s| s.id()).collect::<Vec<_>>(),
            )
            .field("global_serializer", &self.global_serializer.as_ref().map(|s| s.id()))
            .field(
                "compact_serializers",
                &self
                    .compact_serializers
                    .iter()
                    .map(|s| s.type_name().to_string())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for [`SerializationConfig`].
#[derive(Default)]
pub struct SerializationConfigBuilder {
    byte_order: Option<ByteOrder>,
    default_number_type: Option<NumberType>,
    portable_version: Option<i32>,
    data_serializable_factories: Vec<(i32, Arc<dyn DataSerializableFactory>)>,
    portable_factories: Vec<(i32, Arc<dyn PortableFactory>)>,
    class_definitions: Vec<ClassDefinition>,
    custom_serializers: Vec<Arc<dyn CustomSerializer>>,
    global_serializer: Option<Arc<dyn CustomSerializer>>,
    compact_serializers: Vec<Arc<dyn CompactSerializer>>,
}

impl SerializationConfigBuilder {
    /// Creates a new serialization configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the payload byte order.
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = Some(order);
        self
    }

    /// Sets the width untyped numbers and empty arrays are written with.
    pub fn default_number_type(mut self, number_type: NumberType) -> Self {
        self.default_number_type = Some(number_type);
        self
    }

    /// Sets the version portables without their own version are written with.
    pub fn portable_version(mut self, version: i32) -> Self {
        self.portable_version = Some(version);
        self
    }

    /// Registers an identified data serializable factory.
    pub fn add_data_serializable_factory(
        mut self,
        factory_id: i32,
        factory: impl DataSerializableFactory + 'static,
    ) -> Self {
        self.data_serializable_factories
            .push((factory_id, Arc::new(factory)));
        self
    }

    /// Registers a portable factory.
    pub fn add_portable_factory(
        mut self,
        factory_id: i32,
        factory: impl PortableFactory + 'static,
    ) -> Self {
        self.portable_factories.push((factory_id, Arc::new(factory)));
        self
    }

    /// Registers a class definition up front, so payloads written by other
    /// versions of the class can be read without carrying it inline.
    pub fn add_class_definition(mut self, definition: ClassDefinition) -> Self {
        self.class_definitions.push(definition);
        self
    }

    /// Registers a custom serializer under its own id.
    pub fn add_custom_serializer(mut self, serializer: impl CustomSerializer + 'static) -> Self {
        self.custom_serializers.push(Arc::new(serializer));
        self
    }

    /// Sets the serializer for values no other serializer handles.
    pub fn global_serializer(mut self, serializer: impl CustomSerializer + 'static) -> Self {
        self.global_serializer = Some(Arc::new(serializer));
        self
    }

    /// Registers a type-erased Compact serializer.
    pub fn add_compact_serializer(mut self, serializer: Arc<dyn CompactSerializer>) -> Self {
        self.compact_serializers.push(serializer);
        self
    }

    /// Registers the Compact serializer of `T`.
    pub fn add_compact<T: Compact>(self) -> Self {
        self.add_compact_serializer(compact_serializer::<T>())
    }

    /// Builds the serialization configuration.
    pub fn build(self) -> Result<SerializationConfig, ConfigError> {
        let portable_version = self.portable_version.unwrap_or(DEFAULT_PORTABLE_VERSION);
        if portable_version < 0 {
            return Err(ConfigError::new(format!(
                "portable_version must be >= 0, got {}",
                portable_version
            )));
        }

        unique_ids(
            "data serializable factory",
            self.data_serializable_factories.iter().map(|(id, _)| *id),
        )?;
        unique_ids(
            "portable factory",
            self.portable_factories.iter().map(|(id, _)| *id),
        )?;

        for serializer in &self.custom_serializers {
            if serializer.id() < 1 {
                return Err(ConfigError::new(format!(
                    "custom serializer id must be >= 1, got {}",
                    serializer.id()
                )));
            }
        }
        unique_ids(
            "custom serializer",
            self.custom_serializers
                .iter()
                .chain(self.global_serializer.iter())
                .map(|s| s.id()),
        )?;

        let mut definitions = HashSet::new();
        for definition in &self.class_definitions {
            if !definitions.insert(definition.key()) {
                return Err(ConfigError::new(format!(
                    "duplicate class definition {:?}",
                    definition.key()
                )));
            }
        }

        validate_compact(&self.compact_serializers)?;

        Ok(SerializationConfig {
            byte_order: self.byte_order.unwrap_or(DEFAULT_BYTE_ORDER),
            default_number_type: self.default_number_type.unwrap_or(DEFAULT_NUMBER_TYPE),
            portable_version,
            data_serializable_factories: self.data_serializable_factories,
            portable_factories: self.portable_factories,
            class_definitions: self.class_definitions,
            custom_serializers: self.custom_serializers,
            global_serializer: self.global_serializer,
            compact_serializers: self.compact_serializers,
        })
    }
}

impl fmt::Debug for SerializationConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationConfigBuilder")
            .field("byte_order", &self.byte_order)
            .field("default_number_type", &self.default_number_type)
            .field("portable_version", &self.portable_version)
            .finish_non_exhaustive()
    }
}

fn unique_ids(what: &str, ids: impl Iterator<Item = i32>) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ConfigError::new(format!("duplicate {} id {}", what, id)));
        }
    }
    Ok(())
}

/// Rust types with a built-in encoding; a Compact serializer may not claim them.
fn builtin_types() -> [TypeId; 21] {
    [
        TypeId::of::<i8>(),
        TypeId::of::<i16>(),
        TypeId::of::<i32>(),
        TypeId::of::<i64>(),
        TypeId::of::<f32>(),
        TypeId::of::<f64>(),
        TypeId::of::<bool>(),
        TypeId::of::<char>(),
        TypeId::of::<String>(),
        TypeId::of::<Uuid>(),
        TypeId::of::<DateTime<Utc>>(),
        TypeId::of::<NaiveDate>(),
        TypeId::of::<NaiveTime>(),
        TypeId::of::<NaiveDateTime>(),
        TypeId::of::<DateTime<FixedOffset>>(),
        TypeId::of::<i128>(),
        TypeId::of::<Decimal>(),
        TypeId::of::<HazelcastJsonValue>(),
        TypeId::of::<Vec<u8>>(),
        TypeId::of::<Value>(),
        TypeId::of::<GenericRecord>(),
    ]
}

fn validate_compact(serializers: &[Arc<dyn CompactSerializer>]) -> Result<(), ConfigError> {
    let builtins = builtin_types();
    let mut type_names: HashMap<&str, &'static str> = HashMap::new();
    let mut rust_types = HashSet::new();
    for serializer in serializers {
        if builtins.contains(&serializer.rust_type()) {
            return Err(ConfigError::new(format!(
                "compact serializer cannot be registered for built-in type {}",
                serializer.rust_type_name()
            )));
        }
        if let Some(previous) = type_names.insert(serializer.type_name(), serializer.rust_type_name()) {
            return Err(ConfigError::new(format!(
                "duplicate compact type name '{}' ({} and {})",
                serializer.type_name(),
                previous,
                serializer.rust_type_name()
            )));
        }
        if !rust_types.insert(serializer.rust_type()) {
            return Err(ConfigError::new(format!(
                "duplicate compact serializer for {}",
                serializer.rust_type_name()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::serialization::compact::{CompactReader, CompactWriter};
    use crate::serialization::{DataInput, DataOutput};

    struct Tagged(i32);

    impl CustomSerializer for Tagged {
        fn id(&self) -> i32 {
            self.0
        }

        fn write(&self, _output: &mut dyn DataOutput, _value: &Value) -> Result<()> {
            Ok(())
        }

        fn read(&self, _input: &mut dyn DataInput) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    struct Point;

    impl Compact for Point {
        fn type_name() -> &'static str {
            "Point"
        }

        fn write(&self, _writer: &mut dyn CompactWriter) -> Result<()> {
            Ok(())
        }

        fn read(_reader: &mut dyn CompactReader) -> Result<Self> {
            Ok(Point)
        }
    }

    struct OtherPoint;

    impl Compact for OtherPoint {
        fn type_name() -> &'static str {
            "Point"
        }

        fn write(&self, _writer: &mut dyn CompactWriter) -> Result<()> {
            Ok(())
        }

        fn read(_reader: &mut dyn CompactReader) -> Result<Self> {
            Ok(OtherPoint)
        }
    }

    struct NoFactory;

    impl DataSerializableFactory for NoFactory {
        fn create(
            &self,
            _class_id: i32,
        ) -> Option<Box<dyn crate::serialization::IdentifiedDataSerializable>> {
            None
        }
    }

    #[test]
    fn test_defaults() {
        let config = SerializationConfig::builder().build().unwrap();
        assert_eq!(config.byte_order(), ByteOrder::BigEndian);
        assert_eq!(config.default_number_type(), NumberType::Double);
        assert_eq!(config.portable_version(), 0);
        assert!(config.custom_serializers().is_empty());
        assert!(config.global_serializer().is_none());
    }

    #[test]
    fn test_builder_settings() {
        let config = SerializationConfig::builder()
            .byte_order(ByteOrder::LittleEndian)
            .default_number_type(NumberType::Integer)
            .portable_version(3)
            .add_custom_serializer(Tagged(10))
            .global_serializer(Tagged(20))
            .add_compact::<Point>()
            .build()
            .unwrap();
        assert_eq!(config.byte_order(), ByteOrder::LittleEndian);
        assert_eq!(config.default_number_type(), NumberType::Integer);
        assert_eq!(config.portable_version(), 3);
        assert_eq!(config.custom_serializers().len(), 1);
        assert_eq!(config.global_serializer().map(|s| s.id()), Some(20));
        assert_eq!(config.compact_serializers()[0].type_name(), "Point");
    }

    #[test]
    fn test_negative_portable_version_fails() {
        let result = SerializationConfig::builder().portable_version(-1).build();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("portable_version must be >= 0"));
    }

    #[test]
    fn test_duplicate_factory_id_fails() {
        let result = SerializationConfig::builder()
            .add_data_serializable_factory(1, NoFactory)
            .add_data_serializable_factory(1, NoFactory)
            .build();
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_custom_id_below_one_fails() {
        let result = SerializationConfig::builder()
            .add_custom_serializer(Tagged(0))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_global_id_collides_with_custom() {
        let result = SerializationConfig::builder()
            .add_custom_serializer(Tagged(5))
            .global_serializer(Tagged(5))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_compact_type_name_fails() {
        let result = SerializationConfig::builder()
            .add_compact::<Point>()
            .add_compact::<OtherPoint>()
            .build();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("duplicate compact type name 'Point'"));
    }

    #[test]
    fn test_duplicate_compact_rust_type_fails() {
        let result = SerializationConfig::builder()
            .add_compact::<Point>()
            .add_compact::<Point>()
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_class_definition_fails() {
        let result = SerializationConfig::builder()
            .add_class_definition(ClassDefinition::new(1, 2, 0))
            .add_class_definition(ClassDefinition::new(1, 2, 0))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_error_converts() {
        let err: HazelcastError = ConfigError::new("bad").into();
        assert!(matches!(err, HazelcastError::Configuration(ref m) if m == "bad"));
        assert_eq!(err.to_string(), "configuration error: bad");
    }
}
