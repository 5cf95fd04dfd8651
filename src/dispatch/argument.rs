//! Call arguments: borrowed, type-erased references to caller storage.

use super::signature::MAX_FAST_ARITY;
use crate::core::types::Type;
use crate::variant::{TypeKey, Value, Variant};
use smallvec::SmallVec;
use std::any::Any;

/// Arguments collected for one call; the fast arities never allocate.
pub type ArgList<'a> = SmallVec<[Argument<'a>; MAX_FAST_ARITY]>;

/// One argument of a call.
///
/// An argument built from a [`Variant`] forwards to the variant's content, so
/// passing `&Variant` and passing the value it holds are interchangeable.
#[derive(Clone, Copy)]
pub struct Argument<'a> {
    inner: Inner<'a>,
}

#[derive(Clone, Copy)]
enum Inner<'a> {
    Value(&'a dyn Value),
    Variant(&'a Variant<'a>),
}

impl<'a> Argument<'a> {
    pub fn new<T: Value>(value: &'a T) -> Self {
        let any: &dyn Any = value;
        match any.downcast_ref::<Variant<'static>>() {
            Some(variant) => Self::from_variant(variant),
            None => Self::from_dyn(value),
        }
    }

    pub fn from_dyn(value: &'a dyn Value) -> Self {
        Self { inner: Inner::Value(value) }
    }

    pub fn from_variant(variant: &'a Variant<'a>) -> Self {
        Self { inner: Inner::Variant(variant) }
    }

    /// `false` for an argument made from an invalid variant.
    pub fn is_valid(&self) -> bool {
        self.as_value().is_some()
    }

    pub fn as_value(&self) -> Option<&'a dyn Value> {
        match self.inner {
            Inner::Value(value) => Some(value),
            Inner::Variant(variant) => variant.as_value(),
        }
    }

    pub fn type_key(&self) -> Option<TypeKey> {
        self.as_value().map(|v| v.type_key())
    }

    pub fn get_type(&self) -> Type {
        self.type_key().map_or(Type::invalid(), Type::from_key)
    }

    pub fn is_type<T: Value>(&self) -> bool {
        self.type_key() == Some(TypeKey::of::<T>())
    }

    pub fn get_value<T: Value>(&self) -> Option<&'a T> {
        self.as_value()?.downcast_ref::<T>()
    }

    /// Registered name, falling back to the Rust type name.
    pub(crate) fn type_name(&self) -> String {
        match self.type_key() {
            Some(key) => {
                let ty = Type::from_key(key);
                if ty.is_valid() {
                    ty.name().to_string()
                } else {
                    key.rust_name().to_string()
                }
            }
            None => "<invalid>".to_string(),
        }
    }
}

impl<'a, 'b: 'a> From<&'a Variant<'b>> for Argument<'a> {
    fn from(variant: &'a Variant<'b>) -> Self {
        Self::from_variant(variant)
    }
}

impl std::fmt::Debug for Argument<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Argument({})", self.type_name())
    }
}

/// Things that can be turned into an argument list.
///
/// Tuples of up to six references, slices, arrays and vectors of
/// [`Argument`] are supported.
pub trait IntoArgs<'a> {
    fn into_args(self) -> ArgList<'a>;
}

impl<'a> IntoArgs<'a> for () {
    fn into_args(self) -> ArgList<'a> {
        ArgList::new()
    }
}

impl<'a, 's> IntoArgs<'a> for &'s [Argument<'a>] {
    fn into_args(self) -> ArgList<'a> {
        self.iter().copied().collect()
    }
}

impl<'a, const N: usize> IntoArgs<'a> for [Argument<'a>; N] {
    fn into_args(self) -> ArgList<'a> {
        self.into_iter().collect()
    }
}

impl<'a> IntoArgs<'a> for Vec<Argument<'a>> {
    fn into_args(self) -> ArgList<'a> {
        self.into_iter().collect()
    }
}

macro_rules! impl_into_args {
    ($($arg:ident => $idx:tt),+) => {
        impl<'a, $($arg: Value),+> IntoArgs<'a> for ($(&'a $arg,)+) {
            fn into_args(self) -> ArgList<'a> {
                let mut list = ArgList::new();
                $( list.push(Argument::new(self.$idx)); )+
                list
            }
        }
    };
}

impl_into_args!(A1 => 0);
impl_into_args!(A1 => 0, A2 => 1);
impl_into_args!(A1 => 0, A2 => 1, A3 => 2);
impl_into_args!(A1 => 0, A2 => 1, A3 => 2, A4 => 3);
impl_into_args!(A1 => 0, A2 => 1, A3 => 2, A4 => 3, A5 => 4);
impl_into_args!(A1 => 0, A2 => 1, A3 => 2, A4 => 3, A5 => 4, A6 => 5);
