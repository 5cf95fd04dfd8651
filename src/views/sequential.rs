//! Index-based view over a sequential container held by a variant.

use super::bind_value;
use super::containers::Sequence;
use crate::core::registry::registry;
use crate::core::types::Type;
use crate::errors::ViewError;
use crate::variant::{Target, TypeKey, Value, Variant};
use std::marker::PhantomData;
use tracing::trace;

/// Erased [`Sequence`] stored on the container's descriptor.
pub(crate) trait SequentialOps: Send + Sync {
    fn value_key(&self) -> TypeKey;
    fn is_dynamic(&self) -> bool;
    fn size(&self, container: &dyn Value) -> Option<usize>;
    fn get<'a>(&self, container: &'a dyn Value, index: usize) -> Option<&'a dyn Value>;
    /// `value` must already be of the element type.
    fn set(&self, container: &mut dyn Value, index: usize, value: &dyn Value) -> bool;
    fn set_size(&self, container: &mut dyn Value, len: usize) -> bool;
    fn insert(&self, container: &mut dyn Value, index: usize, value: &dyn Value) -> bool;
    fn erase(&self, container: &mut dyn Value, index: usize) -> bool;
    fn clear(&self, container: &mut dyn Value) -> bool;
}

pub(crate) struct SequenceAdapter<C>(PhantomData<fn() -> C>);

impl<C> SequenceAdapter<C> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

impl<C: Sequence> SequentialOps for SequenceAdapter<C> {
    fn value_key(&self) -> TypeKey {
        TypeKey::of::<C::Item>()
    }

    fn is_dynamic(&self) -> bool {
        C::DYNAMIC
    }

    fn size(&self, container: &dyn Value) -> Option<usize> {
        Some(container.downcast_ref::<C>()?.length())
    }

    fn get<'a>(&self, container: &'a dyn Value, index: usize) -> Option<&'a dyn Value> {
        let item = container.downcast_ref::<C>()?.item(index)?;
        Some(item as &dyn Value)
    }

    fn set(&self, container: &mut dyn Value, index: usize, value: &dyn Value) -> bool {
        let (Some(container), Some(value)) = (container.downcast_mut::<C>(), value.clone_value().downcast_box::<C::Item>()) else {
            return false;
        };
        match container.item_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn set_size(&self, container: &mut dyn Value, len: usize) -> bool {
        container.downcast_mut::<C>().map_or(false, |c| c.set_length(len))
    }

    fn insert(&self, container: &mut dyn Value, index: usize, value: &dyn Value) -> bool {
        let (Some(container), Some(value)) = (container.downcast_mut::<C>(), value.clone_value().downcast_box::<C::Item>()) else {
            return false;
        };
        container.insert_item(index, value)
    }

    fn erase(&self, container: &mut dyn Value, index: usize) -> bool {
        container.downcast_mut::<C>().map_or(false, |c| c.remove_item(index))
    }

    fn clear(&self, container: &mut dyn Value) -> bool {
        container.downcast_mut::<C>().map_or(false, |c| c.clear_items())
    }
}

/// A live view into a sequential container.
///
/// Element access aliases the container; writes require a view created from
/// owned storage with `create_sequential_view_mut`.
pub struct SequentialView<'a> {
    target: Target<'a>,
    ops: Option<&'static dyn SequentialOps>,
    ty: Type,
    value_type: Type,
}

impl<'a> SequentialView<'a> {
    pub(crate) fn new(target: Target<'a>) -> Self {
        let Some(key) = target.get().map(|v| v.type_key()) else {
            return Self::invalid();
        };
        let Some(ops) = registry()
            .and_then(|r| r.data_of_key(key))
            .and_then(|d| d.sequential.as_deref())
        else {
            return Self::invalid();
        };
        Self {
            target,
            ops: Some(ops),
            ty: Type::from_key(key),
            value_type: Type::from_key(ops.value_key()),
        }
    }

    pub fn invalid() -> Self {
        Self { target: Target::Empty, ops: None, ty: Type::invalid(), value_type: Type::invalid() }
    }

    pub fn is_valid(&self) -> bool {
        self.ops.is_some()
    }

    pub fn is_mutable(&self) -> bool {
        self.is_valid() && self.target.is_mutable()
    }

    /// The container type.
    pub fn get_type(&self) -> Type {
        self.ty
    }

    pub fn get_value_type(&self) -> Type {
        self.value_type
    }

    /// `false` for fixed-size containers and invalid views.
    pub fn is_dynamic(&self) -> bool {
        self.ops.map_or(false, |ops| ops.is_dynamic())
    }

    pub fn size(&self) -> usize {
        self.parts().ok().and_then(|(ops, c)| ops.size(c)).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Alias of the element at `index`.
    pub fn get_value(&self, index: usize) -> Result<Variant<'_>, ViewError> {
        let (ops, container) = self.parts()?;
        let len = ops.size(container).unwrap_or(0);
        ops.get(container, index)
            .map(Variant::from_dyn)
            .ok_or(ViewError::IndexOutOfRange { index, len })
    }

    /// Replace the element at `index`, converting `value` to the element type.
    pub fn set_value(&mut self, index: usize, value: &Variant<'_>) -> Result<(), ViewError> {
        let ops = self.ops.ok_or(ViewError::InvalidView)?;
        let value_type = self.value_type;
        let container = self.target.get_mut().ok_or(ViewError::ReadOnly)?;
        let len = ops.size(container).unwrap_or(0);
        if index >= len {
            return Err(ViewError::IndexOutOfRange { index, len });
        }
        let bound = bind_value(ops.value_key(), value_type, value)?;
        if ops.set(container, index, bound.as_value()) {
            Ok(())
        } else {
            Err(ViewError::Unsupported("element assignment"))
        }
    }

    /// Resize. Growing appends default elements; fixed containers accept only
    /// their own length.
    pub fn set_size(&mut self, len: usize) -> Result<(), ViewError> {
        let ops = self.ops.ok_or(ViewError::InvalidView)?;
        let container = self.target.get_mut().ok_or(ViewError::ReadOnly)?;
        if ops.set_size(container, len) {
            trace!(target: "rtreflect::views", len, "sequence resized");
            Ok(())
        } else {
            Err(ViewError::Unsupported("resizing a fixed-size sequence"))
        }
    }

    /// Insert before `index`; `index == size()` appends.
    pub fn insert(&mut self, index: usize, value: &Variant<'_>) -> Result<(), ViewError> {
        let ops = self.ops.ok_or(ViewError::InvalidView)?;
        if !ops.is_dynamic() {
            return Err(ViewError::Unsupported("insertion into a fixed-size sequence"));
        }
        let value_type = self.value_type;
        let container = self.target.get_mut().ok_or(ViewError::ReadOnly)?;
        let len = ops.size(container).unwrap_or(0);
        if index > len {
            return Err(ViewError::IndexOutOfRange { index, len });
        }
        let bound = bind_value(ops.value_key(), value_type, value)?;
        if ops.insert(container, index, bound.as_value()) {
            Ok(())
        } else {
            Err(ViewError::Unsupported("insertion"))
        }
    }

    pub fn erase(&mut self, index: usize) -> Result<(), ViewError> {
        let ops = self.ops.ok_or(ViewError::InvalidView)?;
        if !ops.is_dynamic() {
            return Err(ViewError::Unsupported("erasing from a fixed-size sequence"));
        }
        let container = self.target.get_mut().ok_or(ViewError::ReadOnly)?;
        let len = ops.size(container).unwrap_or(0);
        if ops.erase(container, index) {
            Ok(())
        } else {
            Err(ViewError::IndexOutOfRange { index, len })
        }
    }

    pub fn clear(&mut self) -> Result<(), ViewError> {
        let ops = self.ops.ok_or(ViewError::InvalidView)?;
        let container = self.target.get_mut().ok_or(ViewError::ReadOnly)?;
        if ops.clear(container) {
            Ok(())
        } else {
            Err(ViewError::Unsupported("clearing a fixed-size sequence"))
        }
    }

    /// Elements in ascending index order. Each call starts from the front.
    pub fn iter(&self) -> SequentialIter<'_> {
        SequentialIter { view: self, next: 0, len: self.size() }
    }

    fn parts(&self) -> Result<(&'static dyn SequentialOps, &dyn Value), ViewError> {
        let ops = self.ops.ok_or(ViewError::InvalidView)?;
        let container = self.target.get().ok_or(ViewError::InvalidView)?;
        Ok((ops, container))
    }
}

impl std::fmt::Debug for SequentialView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequentialView")
            .field("type", &self.ty)
            .field("value_type", &self.value_type)
            .field("size", &self.size())
            .finish()
    }
}

pub struct SequentialIter<'v> {
    view: &'v SequentialView<'v>,
    next: usize,
    len: usize,
}

impl<'v> Iterator for SequentialIter<'v> {
    type Item = Variant<'v>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let item = self.view.get_value(self.next).ok()?;
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<'v> IntoIterator for &'v SequentialView<'v> {
    type Item = Variant<'v>;
    type IntoIter = SequentialIter<'v>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
