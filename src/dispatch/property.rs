//! Property descriptors and their accessors.

use super::{coerce, log_failures, Instance};
use crate::core::types::{AccessLevel, Metadata, Type};
use crate::errors::InvokeError;
use crate::variant::{TypeKey, Value, Variant};
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Erased read/write access to one property.
pub(crate) trait PropertyAccess: Send + Sync {
    /// `object` is `None` for static properties.
    fn get(&self, object: Option<&dyn Value>) -> Option<Variant<'static>>;
    fn set(&self, object: Option<&mut dyn Value>, value: &dyn Value) -> bool;
    fn is_readonly(&self) -> bool;
    fn is_static(&self) -> bool;
}

/// A field reached through a pair of projections.
pub(crate) struct FieldAccess<C, V> {
    get: fn(&C) -> &V,
    get_mut: fn(&mut C) -> &mut V,
}

impl<C, V> FieldAccess<C, V> {
    pub(crate) fn new(get: fn(&C) -> &V, get_mut: fn(&mut C) -> &mut V) -> Self {
        Self { get, get_mut }
    }
}

impl<C: Value, V: Value> PropertyAccess for FieldAccess<C, V> {
    fn get(&self, object: Option<&dyn Value>) -> Option<Variant<'static>> {
        let object = object?.downcast_ref::<C>()?;
        Some(Variant::from_boxed((self.get)(object).clone_value()))
    }

    fn set(&self, object: Option<&mut dyn Value>, value: &dyn Value) -> bool {
        let (Some(object), Some(value)) = (object.and_then(|o| o.downcast_mut::<C>()), value.clone_value().downcast_box::<V>()) else {
            return false;
        };
        *(self.get_mut)(object) = value;
        true
    }

    fn is_readonly(&self) -> bool {
        false
    }

    fn is_static(&self) -> bool {
        false
    }
}

/// A computed, read-only property.
pub(crate) struct GetterAccess<C, V, G> {
    get: G,
    _marker: PhantomData<fn(&C) -> V>,
}

impl<C, V, G> GetterAccess<C, V, G> {
    pub(crate) fn new(get: G) -> Self {
        Self { get, _marker: PhantomData }
    }
}

impl<C, V, G> PropertyAccess for GetterAccess<C, V, G>
where
    C: Value,
    V: Value,
    G: Fn(&C) -> V + Send + Sync,
{
    fn get(&self, object: Option<&dyn Value>) -> Option<Variant<'static>> {
        let object = object?.downcast_ref::<C>()?;
        Some(Variant::new((self.get)(object)))
    }

    fn set(&self, _object: Option<&mut dyn Value>, _value: &dyn Value) -> bool {
        false
    }

    fn is_readonly(&self) -> bool {
        true
    }

    fn is_static(&self) -> bool {
        false
    }
}

/// A getter/setter pair.
pub(crate) struct GetSetAccess<C, V, G, S> {
    get: G,
    set: S,
    _marker: PhantomData<fn(&C) -> V>,
}

impl<C, V, G, S> GetSetAccess<C, V, G, S> {
    pub(crate) fn new(get: G, set: S) -> Self {
        Self { get, set, _marker: PhantomData }
    }
}

impl<C, V, G, S> PropertyAccess for GetSetAccess<C, V, G, S>
where
    C: Value,
    V: Value,
    G: Fn(&C) -> V + Send + Sync,
    S: Fn(&mut C, V) + Send + Sync,
{
    fn get(&self, object: Option<&dyn Value>) -> Option<Variant<'static>> {
        let object = object?.downcast_ref::<C>()?;
        Some(Variant::new((self.get)(object)))
    }

    fn set(&self, object: Option<&mut dyn Value>, value: &dyn Value) -> bool {
        let (Some(object), Some(value)) = (object.and_then(|o| o.downcast_mut::<C>()), value.clone_value().downcast_box::<V>()) else {
            return false;
        };
        (self.set)(object, value);
        true
    }

    fn is_readonly(&self) -> bool {
        false
    }

    fn is_static(&self) -> bool {
        false
    }
}

/// A property not tied to an instance. Read-only when `set` is absent.
pub(crate) struct StaticAccess<V, G, S> {
    get: G,
    set: Option<S>,
    _marker: PhantomData<fn() -> V>,
}

impl<V, G, S> StaticAccess<V, G, S> {
    pub(crate) fn new(get: G, set: Option<S>) -> Self {
        Self { get, set, _marker: PhantomData }
    }
}

impl<V, G, S> PropertyAccess for StaticAccess<V, G, S>
where
    V: Value,
    G: Fn() -> V + Send + Sync,
    S: Fn(V) + Send + Sync,
{
    fn get(&self, _object: Option<&dyn Value>) -> Option<Variant<'static>> {
        Some(Variant::new((self.get)()))
    }

    fn set(&self, _object: Option<&mut dyn Value>, value: &dyn Value) -> bool {
        let (Some(set), Some(value)) = (&self.set, value.clone_value().downcast_box::<V>()) else {
            return false;
        };
        set(value);
        true
    }

    fn is_readonly(&self) -> bool {
        self.set.is_none()
    }

    fn is_static(&self) -> bool {
        true
    }
}

/// A named value exposed by a type.
pub struct Property {
    pub(crate) name: String,
    pub(crate) declaring: Type,
    pub(crate) value_key: TypeKey,
    pub(crate) value_type: Type,
    pub(crate) access: AccessLevel,
    pub(crate) metadata: Metadata,
    pub(crate) accessor: Box<dyn PropertyAccess>,
}

impl Property {
    pub(crate) fn new(name: &str, value_key: TypeKey, accessor: Box<dyn PropertyAccess>) -> Self {
        Self {
            name: name.to_string(),
            declaring: Type::invalid(),
            value_key,
            value_type: Type::invalid(),
            access: AccessLevel::default(),
            metadata: Metadata::default(),
            accessor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_declaring_type(&self) -> Type {
        self.declaring
    }

    /// The value type of the property.
    pub fn get_type(&self) -> Type {
        self.value_type
    }

    pub fn is_readonly(&self) -> bool {
        self.accessor.is_readonly()
    }

    pub fn is_static(&self) -> bool {
        self.accessor.is_static()
    }

    pub fn get_access_level(&self) -> AccessLevel {
        self.access
    }

    pub fn get_metadata(&self, key: &str) -> Option<&Variant<'static>> {
        self.metadata.get(key)
    }

    /// Read the property. Invalid when the instance cannot be viewed as the
    /// declaring type.
    pub fn get_value(&self, instance: Instance<'_>) -> Variant<'static> {
        if self.is_static() {
            return self.accessor.get(None).unwrap_or_default();
        }
        match instance.view_as(self.declaring) {
            Ok(object) => self.accessor.get(Some(object)).unwrap_or_default(),
            Err(error) => {
                if log_failures() {
                    debug!(target: "rtreflect::dispatch", property = %self.name, %error, "property read failed");
                }
                Variant::invalid()
            }
        }
    }

    /// Write the property, converting `value` when its type differs.
    pub fn set_value(&self, instance: Instance<'_>, value: &Variant<'_>) -> bool {
        match self.try_set_value(instance, value) {
            Ok(()) => {
                trace!(target: "rtreflect::dispatch", property = %self.name, "property written");
                true
            }
            Err(reason) => {
                if log_failures() {
                    debug!(target: "rtreflect::dispatch", property = %self.name, reason, "property write failed");
                }
                false
            }
        }
    }

    fn try_set_value(&self, mut instance: Instance<'_>, value: &Variant<'_>) -> Result<(), &'static str> {
        if self.is_readonly() {
            return Err("read-only");
        }
        let value = value.as_value().ok_or("invalid value")?;
        let bound = coerce(value, self.value_key, self.value_type).ok_or("no conversion to the property type")?;
        let written = if self.is_static() {
            self.accessor.set(None, bound.as_value())
        } else {
            let object = instance.view_as_mut(self.declaring).map_err(|error| match error {
                InvokeError::MissingInstance => "missing instance",
                InvokeError::ReadOnlyInstance => "read-only instance",
                _ => "instance is not of the declaring type",
            })?;
            self.accessor.set(Some(object), bound.as_value())
        };
        if written {
            Ok(())
        } else {
            Err("accessor rejected the value")
        }
    }
}

impl std::fmt::Debug for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("declaring", &self.declaring)
            .field("type", &self.value_type)
            .field("readonly", &self.is_readonly())
            .field("static", &self.is_static())
            .finish()
    }
}
