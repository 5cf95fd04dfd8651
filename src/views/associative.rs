//! Key-based view over an associative container held by a variant.

use super::bind_value;
use super::containers::Mapping;
use crate::core::registry::registry;
use crate::core::types::Type;
use crate::errors::ViewError;
use crate::variant::{Target, TypeKey, Value, Variant};
use std::marker::PhantomData;

type Entries<'a> = Box<dyn Iterator<Item = (&'a dyn Value, Option<&'a dyn Value>)> + 'a>;

/// Erased [`Mapping`] stored on the container's descriptor.
pub(crate) trait AssociativeOps: Send + Sync {
    fn key_key(&self) -> TypeKey;
    fn value_key(&self) -> Option<TypeKey>;
    fn size(&self, container: &dyn Value) -> Option<usize>;
    fn entries<'a>(&self, container: &'a dyn Value) -> Option<Entries<'a>>;
    fn find<'a>(&self, container: &'a dyn Value, key: &dyn Value) -> Option<(&'a dyn Value, Option<&'a dyn Value>)>;
    /// `key` and `value` must already be of the declared types.
    fn insert(&self, container: &mut dyn Value, key: &dyn Value, value: Option<&dyn Value>) -> bool;
    fn erase(&self, container: &mut dyn Value, key: &dyn Value) -> usize;
    fn clear(&self, container: &mut dyn Value) -> bool;
}

pub(crate) struct MappingAdapter<C>(PhantomData<fn() -> C>);

impl<C> MappingAdapter<C> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

impl<C: Mapping> AssociativeOps for MappingAdapter<C> {
    fn key_key(&self) -> TypeKey {
        TypeKey::of::<C::Key>()
    }

    fn value_key(&self) -> Option<TypeKey> {
        (!C::KEY_ONLY).then(TypeKey::of::<C::Item>)
    }

    fn size(&self, container: &dyn Value) -> Option<usize> {
        Some(container.downcast_ref::<C>()?.length())
    }

    fn entries<'a>(&self, container: &'a dyn Value) -> Option<Entries<'a>> {
        let container = container.downcast_ref::<C>()?;
        Some(Box::new(
            container
                .entries()
                .map(|(k, v)| (k as &dyn Value, v.map(|v| v as &dyn Value))),
        ))
    }

    fn find<'a>(&self, container: &'a dyn Value, key: &dyn Value) -> Option<(&'a dyn Value, Option<&'a dyn Value>)> {
        let container = container.downcast_ref::<C>()?;
        let (k, v) = container.find_entry(key.downcast_ref::<C::Key>()?)?;
        Some((k as &dyn Value, v.map(|v| v as &dyn Value)))
    }

    fn insert(&self, container: &mut dyn Value, key: &dyn Value, value: Option<&dyn Value>) -> bool {
        let (Some(container), Some(key)) = (container.downcast_mut::<C>(), key.clone_value().downcast_box::<C::Key>()) else {
            return false;
        };
        let item = match value {
            Some(value) => match value.clone_value().downcast_box::<C::Item>() {
                Some(item) => Some(item),
                None => return false,
            },
            None => None,
        };
        container.insert_entry(key, item)
    }

    fn erase(&self, container: &mut dyn Value, key: &dyn Value) -> usize {
        match (container.downcast_mut::<C>(), key.downcast_ref::<C::Key>()) {
            (Some(container), Some(key)) => container.erase_entry(key),
            _ => 0,
        }
    }

    fn clear(&self, container: &mut dyn Value) -> bool {
        match container.downcast_mut::<C>() {
            Some(container) => {
                container.clear_entries();
                true
            }
            None => false,
        }
    }
}

/// A live view into an associative container.
pub struct AssociativeView<'a> {
    target: Target<'a>,
    ops: Option<&'static dyn AssociativeOps>,
    ty: Type,
    key_type: Type,
    value_type: Type,
}

impl<'a> AssociativeView<'a> {
    pub(crate) fn new(target: Target<'a>) -> Self {
        let Some(key) = target.get().map(|v| v.type_key()) else {
            return Self::invalid();
        };
        let Some(ops) = registry()
            .and_then(|r| r.data_of_key(key))
            .and_then(|d| d.associative.as_deref())
        else {
            return Self::invalid();
        };
        Self {
            target,
            ops: Some(ops),
            ty: Type::from_key(key),
            key_type: Type::from_key(ops.key_key()),
            value_type: ops.value_key().map_or(Type::invalid(), Type::from_key),
        }
    }

    pub fn invalid() -> Self {
        Self {
            target: Target::Empty,
            ops: None,
            ty: Type::invalid(),
            key_type: Type::invalid(),
            value_type: Type::invalid(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.ops.is_some()
    }

    pub fn is_mutable(&self) -> bool {
        self.is_valid() && self.target.is_mutable()
    }

    pub fn get_type(&self) -> Type {
        self.ty
    }

    /// True for sets.
    pub fn is_key_only_type(&self) -> bool {
        self.ops.map_or(false, |ops| ops.value_key().is_none())
    }

    pub fn get_key_type(&self) -> Type {
        self.key_type
    }

    /// Invalid for key-only containers.
    pub fn get_value_type(&self) -> Type {
        self.value_type
    }

    pub fn size(&self) -> usize {
        self.parts().ok().and_then(|(ops, c)| ops.size(c)).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// `(key, value)` aliases in the container's native order. Values of
    /// key-only containers are invalid.
    pub fn iter(&self) -> AssociativeIter<'_> {
        let entries = self.parts().ok().and_then(|(ops, c)| ops.entries(c));
        AssociativeIter { entries }
    }

    /// The entry stored under `key`, converting `key` when needed.
    pub fn find(&self, key: &Variant<'_>) -> Option<(Variant<'_>, Variant<'_>)> {
        let (ops, container) = self.parts().ok()?;
        let key = bind_value(ops.key_key(), self.key_type, key).ok()?;
        let (k, v) = ops.find(container, key.as_value())?;
        Some(entry(k, v))
    }

    /// Insert into a key-only container. `false` when the key is present.
    pub fn insert(&mut self, key: &Variant<'_>) -> Result<bool, ViewError> {
        let ops = self.ops.ok_or(ViewError::InvalidView)?;
        if ops.value_key().is_some() {
            return Err(ViewError::Unsupported("inserting a key without a value"));
        }
        let key_type = self.key_type;
        let container = self.target.get_mut().ok_or(ViewError::ReadOnly)?;
        let key = bind_value(ops.key_key(), key_type, key)?;
        Ok(ops.insert(container, key.as_value(), None))
    }

    /// Insert `key` mapped to `value`. `false` when the key is present.
    pub fn insert_pair(&mut self, key: &Variant<'_>, value: &Variant<'_>) -> Result<bool, ViewError> {
        let ops = self.ops.ok_or(ViewError::InvalidView)?;
        let Some(value_key) = ops.value_key() else {
            return Err(ViewError::Unsupported("inserting a value into a key-only container"));
        };
        let (key_type, value_type) = (self.key_type, self.value_type);
        let container = self.target.get_mut().ok_or(ViewError::ReadOnly)?;
        let key = bind_value(ops.key_key(), key_type, key)?;
        let value = bind_value(value_key, value_type, value)?;
        Ok(ops.insert(container, key.as_value(), Some(value.as_value())))
    }

    /// Number of entries removed under `key`.
    pub fn erase(&mut self, key: &Variant<'_>) -> Result<usize, ViewError> {
        let ops = self.ops.ok_or(ViewError::InvalidView)?;
        let key_type = self.key_type;
        let container = self.target.get_mut().ok_or(ViewError::ReadOnly)?;
        let key = bind_value(ops.key_key(), key_type, key)?;
        Ok(ops.erase(container, key.as_value()))
    }

    pub fn clear(&mut self) -> Result<(), ViewError> {
        let ops = self.ops.ok_or(ViewError::InvalidView)?;
        let container = self.target.get_mut().ok_or(ViewError::ReadOnly)?;
        if ops.clear(container) {
            Ok(())
        } else {
            Err(ViewError::Unsupported("clearing"))
        }
    }

    fn parts(&self) -> Result<(&'static dyn AssociativeOps, &dyn Value), ViewError> {
        let ops = self.ops.ok_or(ViewError::InvalidView)?;
        let container = self.target.get().ok_or(ViewError::InvalidView)?;
        Ok((ops, container))
    }
}

fn entry<'a>(key: &'a dyn Value, value: Option<&'a dyn Value>) -> (Variant<'a>, Variant<'a>) {
    (Variant::from_dyn(key), value.map_or_else(Variant::invalid, Variant::from_dyn))
}

impl std::fmt::Debug for AssociativeView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssociativeView")
            .field("type", &self.ty)
            .field("key_type", &self.key_type)
            .field("value_type", &self.value_type)
            .field("size", &self.size())
            .finish()
    }
}

pub struct AssociativeIter<'v> {
    entries: Option<Entries<'v>>,
}

impl<'v> Iterator for AssociativeIter<'v> {
    type Item = (Variant<'v>, Variant<'v>);

    fn next(&mut self) -> Option<Self::Item> {
        let (k, v) = self.entries.as_mut()?.next()?;
        Some(entry(k, v))
    }
}
