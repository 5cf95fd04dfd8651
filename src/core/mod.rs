//! Core type system: type handles, descriptors, the registry and its builders.

pub mod builder;
pub mod enumeration;
pub mod registry;
pub mod types;

pub use builder::{ClassBuilder, EnumBuilder, RegistryBuilder};
pub use enumeration::Enumeration;
pub use registry::{configure, freeze, is_frozen, register, registry, MetadataWindow, Registry, Settings};
pub use types::{AccessLevel, Metadata, Type, TypeFlags};
