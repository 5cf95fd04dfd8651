//! The object a member is invoked on.

use crate::core::registry::registry;
use crate::core::types::Type;
use crate::errors::InvokeError;
use crate::variant::{Target, Value, Variant};
use std::any::Any;

/// A borrowed object viewed as one of its types.
///
/// The instance always remembers its origin, the most-derived object it was
/// created from. Casting re-projects from the origin, so a cast to a sibling
/// base of the same object succeeds even though the two bases are unrelated.
pub struct Instance<'a> {
    origin: Target<'a>,
    view: Type,
}

impl<'a> Instance<'a> {
    /// The absent instance used for static members.
    pub fn empty() -> Self {
        Self { origin: Target::Empty, view: Type::invalid() }
    }

    /// Read-only instance. A `Variant` is looked through to its content.
    pub fn new<T: Value>(object: &'a T) -> Self {
        let any: &dyn Any = object;
        match any.downcast_ref::<Variant<'static>>() {
            Some(variant) => Self::from_variant(variant),
            None => Self::from_dyn(object),
        }
    }

    /// Writable instance. A `Variant` is looked through to its content.
    pub fn new_mut<T: Value>(object: &'a mut T) -> Self {
        if <dyn Any>::is::<Variant<'static>>(&*object) {
            let any: &'a mut dyn Any = object;
            return any
                .downcast_mut::<Variant<'static>>()
                .map_or_else(Self::empty, Self::from_variant_mut);
        }
        Self::from_dyn_mut(object)
    }

    pub fn from_dyn(object: &'a dyn Value) -> Self {
        Self { view: Type::of_dyn(object), origin: Target::Shared(object) }
    }

    pub fn from_dyn_mut(object: &'a mut dyn Value) -> Self {
        let view = Type::of_dyn(&*object);
        Self { origin: Target::Unique(object), view }
    }

    /// Instance over the content of `variant`, unwrapping wrapper layers.
    pub fn from_variant(variant: &'a Variant<'_>) -> Self {
        let Some(mut object) = variant.as_value() else {
            return Self::empty();
        };
        if let Some(registry) = registry() {
            while let Some(ops) = registry.data_of_key(object.type_key()).and_then(|d| d.wrapper.as_deref()) {
                match ops.inner(object) {
                    Some(inner) => object = inner,
                    None => return Self::empty(),
                }
            }
        }
        Self::from_dyn(object)
    }

    /// Writable instance over owned variant storage. Aliases stay read-only.
    pub fn from_variant_mut(variant: &'a mut Variant<'_>) -> Self {
        if variant.is_borrowed() {
            return Self::from_variant(&*variant);
        }
        match variant.as_value_mut() {
            Some(object) => Self::from_dyn_mut(object),
            None => Self::empty(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.origin.get().is_some()
    }

    pub fn is_mutable(&self) -> bool {
        self.origin.is_mutable()
    }

    /// The type this instance is currently viewed as.
    pub fn get_type(&self) -> Type {
        self.view
    }

    /// The dynamic type of the origin.
    pub fn get_derived_type(&self) -> Type {
        self.origin.get().map_or(Type::invalid(), Type::of_dyn)
    }

    pub fn reborrow(&mut self) -> Instance<'_> {
        Instance { origin: self.origin.reborrow(), view: self.view }
    }

    /// View the same origin as `to`.
    ///
    /// Succeeds when the origin's type is `to` or derives from it; this
    /// covers upcasts, downcasts back towards the origin and cross-casts.
    pub fn cast(self, to: Type) -> Option<Instance<'a>> {
        let registry = registry()?;
        let derived = Type::of_dyn(self.origin.get()?);
        if !registry.is_related(derived, to) {
            return None;
        }
        Some(Instance { origin: self.origin, view: to })
    }

    /// The origin projected to `T`.
    pub fn try_convert<T: Value>(&self) -> Option<&T> {
        let object = self.origin.get()?;
        if let Some(exact) = object.downcast_ref::<T>() {
            return Some(exact);
        }
        registry()?.upcast(object, Type::get::<T>())?.downcast_ref::<T>()
    }

    pub fn try_convert_mut<T: Value>(&mut self) -> Option<&mut T> {
        let registry = registry();
        let object = self.origin.get_mut()?;
        if object.is::<T>() {
            return object.downcast_mut::<T>();
        }
        registry?.upcast_mut(object, Type::get::<T>())?.downcast_mut::<T>()
    }

    pub(crate) fn view_as(&self, ty: Type) -> Result<&dyn Value, InvokeError> {
        let object = self.origin.get().ok_or(InvokeError::MissingInstance)?;
        registry()
            .and_then(|r| r.upcast(object, ty))
            .ok_or_else(|| InvokeError::WrongInstanceType {
                expected: ty.name().to_string(),
                found: Self::describe(object),
            })
    }

    pub(crate) fn view_as_mut(&mut self, ty: Type) -> Result<&mut dyn Value, InvokeError> {
        match &mut self.origin {
            Target::Empty => Err(InvokeError::MissingInstance),
            Target::Shared(_) => Err(InvokeError::ReadOnlyInstance),
            Target::Unique(object) => {
                let found = Self::describe(&**object);
                registry()
                    .and_then(|r| r.upcast_mut(&mut **object, ty))
                    .ok_or(InvokeError::WrongInstanceType { expected: ty.name().to_string(), found })
            }
        }
    }

    fn describe(object: &dyn Value) -> String {
        let ty = Type::of_dyn(object);
        if ty.is_valid() {
            ty.name().to_string()
        } else {
            object.type_key().rust_name().to_string()
        }
    }
}

impl<'a, T: Value> From<&'a T> for Instance<'a> {
    fn from(object: &'a T) -> Self {
        Self::new(object)
    }
}

impl<'a, T: Value> From<&'a mut T> for Instance<'a> {
    fn from(object: &'a mut T) -> Self {
        Self::new_mut(object)
    }
}

impl std::fmt::Debug for Instance<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("view", &self.view)
            .field("origin", &self.get_derived_type())
            .field("mutable", &self.is_mutable())
            .finish()
    }
}
