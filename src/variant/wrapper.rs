//! Wrapper and pointer-like types that hold exactly one inner value.

use super::value::{TypeKey, Value};
use std::marker::PhantomData;
use std::sync::Arc;

/// A type that wraps one value of `Inner`, possibly absent.
pub trait Wrapper: Value + Sized {
    type Inner: Value;

    /// Pointer-like wrappers (`Box`, `Arc`) report `true`.
    const IS_POINTER: bool;

    fn inner(&self) -> Option<&Self::Inner>;
    fn wrap(inner: Self::Inner) -> Self;
}

impl<T: Value + Clone> Wrapper for Box<T> {
    type Inner = T;
    const IS_POINTER: bool = true;

    fn inner(&self) -> Option<&T> {
        Some(self.as_ref())
    }

    fn wrap(inner: T) -> Self {
        Box::new(inner)
    }
}

impl<T: Value> Wrapper for Arc<T> {
    type Inner = T;
    const IS_POINTER: bool = true;

    fn inner(&self) -> Option<&T> {
        Some(self.as_ref())
    }

    fn wrap(inner: T) -> Self {
        Arc::new(inner)
    }
}

impl<T: Value + Clone> Wrapper for Option<T> {
    type Inner = T;
    const IS_POINTER: bool = false;

    fn inner(&self) -> Option<&T> {
        self.as_ref()
    }

    fn wrap(inner: T) -> Self {
        Some(inner)
    }
}

/// Erased [`Wrapper`] stored on the wrapper's descriptor.
pub(crate) trait WrapperOps: Send + Sync {
    fn inner_key(&self) -> TypeKey;
    fn inner<'a>(&self, wrapper: &'a dyn Value) -> Option<&'a dyn Value>;
    fn wrap(&self, inner: Box<dyn Value>) -> Option<Box<dyn Value>>;
}

pub(crate) struct WrapperAdapter<W>(PhantomData<fn() -> W>);

impl<W> WrapperAdapter<W> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

impl<W: Wrapper> WrapperOps for WrapperAdapter<W> {
    fn inner_key(&self) -> TypeKey {
        TypeKey::of::<W::Inner>()
    }

    fn inner<'a>(&self, wrapper: &'a dyn Value) -> Option<&'a dyn Value> {
        let inner = wrapper.downcast_ref::<W>()?.inner()?;
        Some(inner as &dyn Value)
    }

    fn wrap(&self, inner: Box<dyn Value>) -> Option<Box<dyn Value>> {
        let inner = inner.downcast_box::<W::Inner>()?;
        Some(Box::new(W::wrap(inner)))
    }
}
