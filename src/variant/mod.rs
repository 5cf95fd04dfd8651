//! Type-erased value container.
//!
//! Design:
//! - Storage is tagged by ownership: inline scalars, owned heap values,
//!   borrowed aliases, the distinguished void value, and empty
//! - The alias lifetime is the `'a` of `Variant<'a>`; owned variants are `Variant<'static>`
//! - Conversions never mutate the source unless they succeed

mod convert;
mod scalar;
mod value;
mod wrapper;


pub use convert::ConversionMode;
pub(crate) use convert::{convert_value, ConvertOptions};
pub use scalar::{Scalar, ScalarKind};
pub use value::{TypeKey, Value};
pub use wrapper::Wrapper;
pub(crate) use wrapper::{WrapperAdapter, WrapperOps};

use crate::core::registry::registry;
use crate::core::types::Type;
use crate::views::{AssociativeView, SequentialView};
use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

/// A value of any registered type, owned or borrowed.
pub struct Variant<'a> {
    storage: Storage<'a>,
}

enum Storage<'a> {
    Empty,
    Void,
    Inline(Scalar),
    Heap(Box<dyn Value>),
    Borrowed(&'a dyn Value),
}

impl<'a> Variant<'a> {
    pub const fn invalid() -> Self {
        Self { storage: Storage::Empty }
    }

    /// The result of a call that returns nothing.
    pub const fn void() -> Self {
        Self { storage: Storage::Void }
    }

    /// Erase `value`. Wrapping a `Variant` returns it unchanged instead of nesting.
    pub fn new<T: Value>(value: T) -> Self {
        let mut slot = Some(value);
        let any: &mut dyn Any = &mut slot;
        if let Some(variant) = any.downcast_mut::<Option<Variant<'static>>>() {
            return variant.take().unwrap_or_default();
        }
        match slot {
            Some(value) => Self::from_owned(value),
            None => Self::invalid(),
        }
    }

    fn from_owned<T: Value>(value: T) -> Self {
        if let Some(scalar) = Scalar::from_value(&value) {
            return Self { storage: Storage::Inline(scalar) };
        }
        if TypeKey::of::<T>().is::<()>() {
            return Self::void();
        }
        Self { storage: Storage::Heap(Box::new(value)) }
    }

    pub fn from_boxed(value: Box<dyn Value>) -> Self {
        if let Some(scalar) = Scalar::from_value(&*value) {
            return Self { storage: Storage::Inline(scalar) };
        }
        if value.is::<()>() {
            return Self::void();
        }
        if value.is::<Variant<'static>>() {
            return value.downcast_box::<Variant<'static>>().unwrap_or_default();
        }
        Self { storage: Storage::Heap(value) }
    }

    /// Alias `value` without copying it.
    pub fn from_ref<T: Value>(value: &'a T) -> Self {
        let any: &dyn Any = value;
        if let Some(variant) = any.downcast_ref::<Variant<'static>>() {
            return variant.alias();
        }
        Self::from_dyn(value)
    }

    pub fn from_dyn(value: &'a dyn Value) -> Self {
        Self { storage: Storage::Borrowed(value) }
    }

    /// A borrowed variant aliasing the same value as `self`.
    pub fn alias(&self) -> Variant<'_> {
        match &self.storage {
            Storage::Empty => Variant::invalid(),
            Storage::Void => Variant::void(),
            _ => self.as_value().map_or_else(Variant::invalid, Variant::from_dyn),
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.storage, Storage::Empty)
    }

    pub fn is_void(&self) -> bool {
        matches!(self.storage, Storage::Void)
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self.storage, Storage::Borrowed(_))
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.storage, Storage::Inline(_))
    }

    pub fn type_key(&self) -> Option<TypeKey> {
        match &self.storage {
            Storage::Empty => None,
            Storage::Void => Some(TypeKey::of::<()>()),
            _ => self.as_value().map(|v| v.type_key()),
        }
    }

    /// The registered type of the held value, or invalid when empty.
    pub fn get_type(&self) -> Type {
        self.type_key().map_or(Type::invalid(), Type::from_key)
    }

    pub fn is_type<T: Value>(&self) -> bool {
        self.type_key() == Some(TypeKey::of::<T>())
    }

    pub fn as_value(&self) -> Option<&dyn Value> {
        match &self.storage {
            Storage::Empty => None,
            Storage::Void => Some(&() as &dyn Value),
            Storage::Inline(scalar) => Some(scalar.as_value()),
            Storage::Heap(value) => Some(&**value),
            Storage::Borrowed(value) => Some(*value),
        }
    }

    /// Mutable access to owned storage. Aliases and void are not writable.
    pub fn as_value_mut(&mut self) -> Option<&mut dyn Value> {
        match &mut self.storage {
            Storage::Inline(scalar) => Some(scalar.as_value_mut()),
            Storage::Heap(value) => Some(&mut **value),
            Storage::Empty | Storage::Void | Storage::Borrowed(_) => None,
        }
    }

    /// Exact-type access, no conversion.
    pub fn get_value<T: Value>(&self) -> Option<&T> {
        self.as_value()?.downcast_ref::<T>()
    }

    pub fn get_value_mut<T: Value>(&mut self) -> Option<&mut T> {
        self.as_value_mut()?.downcast_mut::<T>()
    }

    /// Move the value out as `T`. Borrowed variants clone their referent.
    pub fn take_value<T: Value>(self) -> Option<T> {
        self.into_boxed()?.downcast_box::<T>()
    }

    pub fn into_boxed(self) -> Option<Box<dyn Value>> {
        match self.storage {
            Storage::Empty => None,
            Storage::Void => Some(Box::new(())),
            Storage::Inline(scalar) => Some(scalar.into_boxed()),
            Storage::Heap(value) => Some(value),
            Storage::Borrowed(value) => Some(value.clone_value()),
        }
    }

    /// Detach from any borrowed referent by cloning it.
    pub fn into_owned(self) -> Variant<'static> {
        match self.storage {
            Storage::Empty => Variant::invalid(),
            Storage::Void => Variant::void(),
            Storage::Inline(scalar) => Variant { storage: Storage::Inline(scalar) },
            Storage::Heap(value) => Variant { storage: Storage::Heap(value) },
            Storage::Borrowed(value) => Variant::from_boxed(value.clone_value()),
        }
    }

    /// Move the content out, leaving `self` invalid.
    pub fn take(&mut self) -> Variant<'a> {
        std::mem::take(self)
    }

    pub fn clear(&mut self) {
        self.storage = Storage::Empty;
    }

    pub fn can_convert(&self, target: Type) -> bool {
        self.try_convert(target, ConvertOptions::current().mode).is_some()
    }

    /// Convert into a new owned variant; `self` is left untouched.
    pub fn try_convert(&self, target: Type, mode: ConversionMode) -> Option<Variant<'static>> {
        self.try_convert_key(target.type_key()?, mode)
    }

    pub(crate) fn try_convert_key(&self, target: TypeKey, mode: ConversionMode) -> Option<Variant<'static>> {
        let value = self.as_value()?;
        convert_value(value, target, ConvertOptions::with_mode(mode)).map(Variant::from_boxed)
    }

    /// Convert in place with the configured mode. Returns `false` and leaves
    /// `self` unchanged on failure.
    pub fn convert(&mut self, target: Type) -> bool {
        self.convert_with(target, ConvertOptions::current().mode)
    }

    pub fn convert_with(&mut self, target: Type, mode: ConversionMode) -> bool {
        match self.try_convert(target, mode) {
            Some(converted) => {
                *self = converted;
                true
            }
            None => false,
        }
    }

    pub fn convert_to<T: Value>(&self) -> Option<T> {
        self.convert_to_with(ConvertOptions::current().mode)
    }

    pub fn convert_to_with<T: Value>(&self, mode: ConversionMode) -> Option<T> {
        let value = self.as_value()?;
        convert_value(value, TypeKey::of::<T>(), ConvertOptions::with_mode(mode))?.downcast_box::<T>()
    }

    pub fn to_bool(&self) -> Option<bool> {
        self.convert_to()
    }

    pub fn to_char(&self) -> Option<char> {
        self.convert_to()
    }

    pub fn to_i8(&self) -> Option<i8> {
        self.convert_to()
    }

    pub fn to_i16(&self) -> Option<i16> {
        self.convert_to()
    }

    pub fn to_i32(&self) -> Option<i32> {
        self.convert_to()
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.convert_to()
    }

    pub fn to_u8(&self) -> Option<u8> {
        self.convert_to()
    }

    pub fn to_u16(&self) -> Option<u16> {
        self.convert_to()
    }

    pub fn to_u32(&self) -> Option<u32> {
        self.convert_to()
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.convert_to()
    }

    pub fn to_f32(&self) -> Option<f32> {
        self.convert_to()
    }

    pub fn to_f64(&self) -> Option<f64> {
        self.convert_to()
    }

    pub fn to_string_value(&self) -> Option<String> {
        self.convert_to()
    }

    /// Unwrap one wrapper layer into an alias of the wrapped value.
    ///
    /// Non-wrapper values alias themselves; an empty wrapper yields invalid.
    pub fn extract_wrapped_value(&self) -> Variant<'_> {
        if self.is_void() {
            return Variant::void();
        }
        let Some(value) = self.as_value() else {
            return Variant::invalid();
        };
        let ops = registry()
            .and_then(|r| r.data_of_key(value.type_key()))
            .and_then(|d| d.wrapper.as_deref());
        match ops {
            Some(ops) => ops.inner(value).map_or_else(Variant::invalid, Variant::from_dyn),
            None => Variant::from_dyn(value),
        }
    }

    pub fn is_sequential_container(&self) -> bool {
        self.container_value().map_or(false, |v| Type::of_dyn(v).is_sequential_container())
    }

    pub fn is_associative_container(&self) -> bool {
        self.container_value().map_or(false, |v| Type::of_dyn(v).is_associative_container())
    }

    /// The held value, or the first container found by unwrapping wrappers.
    fn container_value(&self) -> Option<&dyn Value> {
        let registry = registry()?;
        let mut value = self.as_value()?;
        loop {
            let data = registry.data_of_key(value.type_key())?;
            if data.sequential.is_some() || data.associative.is_some() {
                return Some(value);
            }
            value = data.wrapper.as_deref()?.inner(value)?;
        }
    }

    /// Read-only view over a sequential container, looking through wrappers.
    pub fn create_sequential_view(&self) -> SequentialView<'_> {
        match self.container_value() {
            Some(value) => SequentialView::new(Target::Shared(value)),
            None => SequentialView::invalid(),
        }
    }

    /// Writable view over owned storage. Borrowed variants give a read-only view.
    pub fn create_sequential_view_mut(&mut self) -> SequentialView<'_> {
        SequentialView::new(self.target_mut())
    }

    pub fn create_associative_view(&self) -> AssociativeView<'_> {
        match self.container_value() {
            Some(value) => AssociativeView::new(Target::Shared(value)),
            None => AssociativeView::invalid(),
        }
    }

    pub fn create_associative_view_mut(&mut self) -> AssociativeView<'_> {
        AssociativeView::new(self.target_mut())
    }

    fn target_mut(&mut self) -> Target<'_> {
        match &mut self.storage {
            Storage::Heap(value) => Target::Unique(&mut **value),
            Storage::Borrowed(value) => Target::Shared(*value),
            Storage::Inline(scalar) => Target::Unique(scalar.as_value_mut()),
            Storage::Empty | Storage::Void => Target::Empty,
        }
    }

    fn equals(&self, other: &Variant<'_>) -> bool {
        match (&self.storage, &other.storage) {
            (Storage::Empty, Storage::Empty) | (Storage::Void, Storage::Void) => return true,
            (Storage::Empty, _) | (_, Storage::Empty) | (Storage::Void, _) | (_, Storage::Void) => return false,
            _ => {}
        }
        let (Some(lhs), Some(rhs)) = (self.as_value(), other.as_value()) else {
            return false;
        };
        if let (Some(a), Some(b)) = (Scalar::from_value(lhs), Scalar::from_value(rhs)) {
            return a.numeric_eq(b);
        }
        if lhs.type_key() == rhs.type_key() {
            return equal_values(lhs, rhs);
        }
        match convert_value(rhs, lhs.type_key(), ConvertOptions::with_mode(ConversionMode::Lossy)) {
            Some(converted) => equal_values(lhs, converted.as_ref()),
            None => false,
        }
    }

    fn compare(&self, other: &Variant<'_>) -> Option<Ordering> {
        match (&self.storage, &other.storage) {
            (Storage::Empty, Storage::Empty) | (Storage::Void, Storage::Void) => return Some(Ordering::Equal),
            (Storage::Empty, _) | (_, Storage::Empty) | (Storage::Void, _) | (_, Storage::Void) => return None,
            _ => {}
        }
        let lhs = self.as_value()?;
        let rhs = other.as_value()?;
        if let (Some(a), Some(b)) = (Scalar::from_value(lhs), Scalar::from_value(rhs)) {
            return a.numeric_cmp(b);
        }
        if lhs.type_key() == rhs.type_key() {
            return compare_values(lhs, rhs);
        }
        let converted = convert_value(rhs, lhs.type_key(), ConvertOptions::with_mode(ConversionMode::Lossy))?;
        compare_values(lhs, converted.as_ref())
    }
}

fn equal_values(lhs: &dyn Value, rhs: &dyn Value) -> bool {
    if let (Some(a), Some(b)) = (lhs.downcast_ref::<String>(), rhs.downcast_ref::<String>()) {
        return a == b;
    }
    let Some(data) = registry().and_then(|r| r.data_of_key(lhs.type_key())) else {
        return false;
    };
    if let Some(eq) = data.eq {
        return eq(lhs, rhs);
    }
    match &data.enumeration {
        Some(table) => table.underlying_of(lhs).is_some() && table.underlying_of(lhs) == table.underlying_of(rhs),
        None => false,
    }
}

fn compare_values(lhs: &dyn Value, rhs: &dyn Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (lhs.downcast_ref::<String>(), rhs.downcast_ref::<String>()) {
        return Some(a.cmp(b));
    }
    let data = registry()?.data_of_key(lhs.type_key())?;
    if let Some(cmp) = data.cmp {
        return cmp(lhs, rhs);
    }
    let table = data.enumeration.as_ref()?;
    Some(table.underlying_of(lhs)?.cmp(&table.underlying_of(rhs)?))
}

impl Default for Variant<'_> {
    fn default() -> Self {
        Self::invalid()
    }
}

impl Clone for Variant<'_> {
    fn clone(&self) -> Self {
        let storage = match &self.storage {
            Storage::Empty => Storage::Empty,
            Storage::Void => Storage::Void,
            Storage::Inline(scalar) => Storage::Inline(*scalar),
            Storage::Heap(value) => Storage::Heap((**value).clone_value()),
            Storage::Borrowed(value) => Storage::Borrowed(*value),
        };
        Self { storage }
    }
}

impl<'b> PartialEq<Variant<'b>> for Variant<'_> {
    fn eq(&self, other: &Variant<'b>) -> bool {
        self.equals(other)
    }
}

impl<'b> PartialOrd<Variant<'b>> for Variant<'_> {
    fn partial_cmp(&self, other: &Variant<'b>) -> Option<Ordering> {
        self.compare(other)
    }
}

impl fmt::Debug for Variant<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |value: &dyn Value| {
            let ty = Type::of_dyn(value);
            if ty.is_valid() {
                ty.name().to_string()
            } else {
                value.type_key().rust_name().to_string()
            }
        };
        match &self.storage {
            Storage::Empty => f.write_str("Variant(<invalid>)"),
            Storage::Void => f.write_str("Variant(void)"),
            Storage::Inline(scalar) => write!(f, "Variant({:?})", scalar),
            Storage::Heap(value) => write!(f, "Variant({})", name(&**value)),
            Storage::Borrowed(value) => write!(f, "Variant(&{})", name(*value)),
        }
    }
}

/// Shared or exclusive access to an erased object.
pub(crate) enum Target<'a> {
    Empty,
    Shared(&'a dyn Value),
    Unique(&'a mut dyn Value),
}

impl<'a> Target<'a> {
    pub(crate) fn get(&self) -> Option<&dyn Value> {
        match self {
            Target::Empty => None,
            Target::Shared(value) => Some(*value),
            Target::Unique(value) => Some(&**value),
        }
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut dyn Value> {
        match self {
            Target::Unique(value) => Some(&mut **value),
            Target::Empty | Target::Shared(_) => None,
        }
    }

    pub(crate) fn is_mutable(&self) -> bool {
        matches!(self, Target::Unique(_))
    }

    pub(crate) fn reborrow(&mut self) -> Target<'_> {
        match self {
            Target::Empty => Target::Empty,
            Target::Shared(value) => Target::Shared(*value),
            Target::Unique(value) => Target::Unique(&mut **value),
        }
    }
}
