//! Serialization framework for Hazelcast's binary format.
//!
//! Values are framed in a [`Data`] container: an 8-byte header holding the
//! partition hash and serializer type id, followed by the payload written by
//! the serializer [`SerializationService`] dispatches the value to.

pub mod compact;
pub mod constants;
mod custom;
mod data;
mod data_input;
mod data_output;
mod defaults;
mod identified;
mod json;
pub mod portable;
mod registry;
mod service;
mod value;

pub use custom::{CustomSerializable, CustomSerializer};
pub use data::Data;
pub use data_input::{DataInput, ObjectDataInput};
pub use data_output::{DataOutput, ObjectDataOutput};
pub use identified::{DataSerializableFactory, FactoryRegistry, IdentifiedDataSerializable};
pub use json::HazelcastJsonValue;
pub use registry::{BuiltinKind, Serializer, SerializerRegistry, TypeKey};
pub use service::SerializationService;
pub use value::{AsAny, NumberType, Object, Value};

pub use compact::{Compact, CompactReader, CompactWriter, GenericRecord};
pub use portable::{ClassDefinition, Portable, PortableFactory, PortableReader, PortableWriter};

/// Byte order of payload primitives.
///
/// The container header is always big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// Most significant byte first.
    #[default]
    BigEndian,
    /// Least significant byte first.
    LittleEndian,
}
