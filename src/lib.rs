//! rtreflect - runtime type reflection
//!
//! Types are registered once at startup, the registry is frozen, and from then
//! on registered values can be inspected and driven generically: look up a
//! value's type, enumerate and invoke its members, read and write properties,
//! walk containers of unknown element type, and cast through base hierarchies.
//!
//! ```ignore
//! rtreflect::register(|r| {
//!     r.class::<Point>("Point")
//!         .default_constructor()
//!         .property("x", |p| &p.x, |p| &mut p.x)
//!         .method("length", Point::length);
//! })?;
//! rtreflect::freeze()?;
//!
//! let point = Point { x: 3.0, y: 4.0 };
//! let ty = Type::of_value(&point);
//! let len = ty.get_method("length").unwrap().invoke(Instance::new(&point), ());
//! ```

// Type system
pub mod core;
pub mod relations;
pub mod variant;

// Dynamic access
pub mod dispatch;
pub mod views;

pub mod errors;

// Logging and configuration
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
pub use crate::core::{
    configure, freeze, is_frozen, register, registry, AccessLevel, ClassBuilder, EnumBuilder,
    Enumeration, Metadata, MetadataWindow, Registry, RegistryBuilder, Settings, Type, TypeFlags,
};
pub use dispatch::{
    ArgList, Argument, Constructor, Instance, IntoArgs, Method, ParameterInfo, Property,
    Receiver, ReceiverKind, Signature,
};
pub use errors::{ConfigError, InvokeError, RegistrationError, RegistrationErrors, ViewError};
pub use infrastructure::{
    init_dev_logging, init_logging, init_prod_logging, LogConfig, LogFormat, LogOutput,
    ReflectConfig,
};
pub use relations::{EdgeKind, RelationGraph};
pub use variant::{ConversionMode, TypeKey, Value, Variant, Wrapper};
pub use views::{AssociativeView, Mapping, Sequence, SequentialView};
