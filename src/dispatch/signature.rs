//! Erasure of typed closures into one uniform invoke contract.
//!
//! Closures of arity 0..=6 are erased by the impls generated below; each
//! impl downcasts the receiver and every argument to the exact declared type
//! and forwards references, so binding never copies. Methods and static
//! functions use separate wrappers: `fn(&C, &A)` and `fn(&A1, &A2)` have the
//! same shape.

use crate::variant::{TypeKey, Value, Variant};
use std::marker::PhantomData;

/// Largest arity handled by the typed fast path.
pub const MAX_FAST_ARITY: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiverKind {
    Static,
    Shared,
    Unique,
}

/// The bound `self` of a call.
pub enum Receiver<'a> {
    Static,
    Shared(&'a dyn Value),
    Unique(&'a mut dyn Value),
}

impl<'a> Receiver<'a> {
    pub fn kind(&self) -> ReceiverKind {
        match self {
            Receiver::Static => ReceiverKind::Static,
            Receiver::Shared(_) => ReceiverKind::Shared,
            Receiver::Unique(_) => ReceiverKind::Unique,
        }
    }

    pub fn downcast_ref<C: Value>(self) -> Option<&'a C> {
        match self {
            Receiver::Static => None,
            Receiver::Shared(object) => object.downcast_ref::<C>(),
            Receiver::Unique(object) => object.downcast_ref::<C>(),
        }
    }

    pub fn downcast_mut<C: Value>(self) -> Option<&'a mut C> {
        match self {
            Receiver::Unique(object) => object.downcast_mut::<C>(),
            Receiver::Static | Receiver::Shared(_) => None,
        }
    }
}

/// Receiver kind, parameter keys and return key of a callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub receiver: ReceiverKind,
    pub params: Vec<TypeKey>,
    pub ret: TypeKey,
}

impl Signature {
    pub fn new(receiver: ReceiverKind, params: Vec<TypeKey>, ret: TypeKey) -> Self {
        Self { receiver, params, ret }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// A callable with its signature erased.
///
/// `args` are already bound to the exact parameter types. Returns `None` if
/// the receiver or an argument does not downcast.
pub trait Invoker: Send + Sync {
    fn call(&self, receiver: Receiver<'_>, args: &[&dyn Value]) -> Option<Variant<'static>>;
}

/// Closures usable as methods of `C`.
pub trait IntoMethod<C, Marker>: Sized {
    fn signature() -> Signature;
    fn into_invoker(self) -> Box<dyn Invoker>;
}

/// Closures usable as static methods and constructors.
pub trait IntoFunction<Marker>: Sized {
    fn signature() -> Signature;
    fn into_invoker(self) -> Box<dyn Invoker>;
}

pub(crate) struct MethodFn<F, Marker> {
    f: F,
    _marker: PhantomData<fn() -> Marker>,
}

impl<F, Marker> MethodFn<F, Marker> {
    fn new(f: F) -> Self {
        Self { f, _marker: PhantomData }
    }
}

pub(crate) struct FunctionFn<F, Marker> {
    f: F,
    _marker: PhantomData<fn() -> Marker>,
}

impl<F, Marker> FunctionFn<F, Marker> {
    fn new(f: F) -> Self {
        Self { f, _marker: PhantomData }
    }
}

/// Explicitly registered callables of any arity.
pub(crate) struct VariadicFn<F>(pub(crate) F);

impl<F> Invoker for VariadicFn<F>
where
    F: Fn(Receiver<'_>, &[&dyn Value]) -> Option<Variant<'static>> + Send + Sync,
{
    fn call(&self, receiver: Receiver<'_>, args: &[&dyn Value]) -> Option<Variant<'static>> {
        (self.0)(receiver, args)
    }
}

macro_rules! impl_signatures {
    ($($arg:ident),*) => {
        #[allow(non_snake_case, unused_variables, unused_mut)]
        impl<C, R, F, $($arg,)*> Invoker for MethodFn<F, fn(&C, $(&$arg),*) -> R>
        where
            C: Value,
            R: Value,
            $($arg: Value,)*
            F: Fn(&C, $(&$arg),*) -> R + Send + Sync + 'static,
        {
            fn call(&self, receiver: Receiver<'_>, args: &[&dyn Value]) -> Option<Variant<'static>> {
                let this = receiver.downcast_ref::<C>()?;
                let mut args = args.iter();
                $( let $arg = args.next()?.downcast_ref::<$arg>()?; )*
                Some(Variant::new((self.f)(this, $($arg),*)))
            }
        }

        #[allow(non_snake_case, unused_variables, unused_mut)]
        impl<C, R, F, $($arg,)*> Invoker for MethodFn<F, fn(&mut C, $(&$arg),*) -> R>
        where
            C: Value,
            R: Value,
            $($arg: Value,)*
            F: Fn(&mut C, $(&$arg),*) -> R + Send + Sync + 'static,
        {
            fn call(&self, receiver: Receiver<'_>, args: &[&dyn Value]) -> Option<Variant<'static>> {
                let this = receiver.downcast_mut::<C>()?;
                let mut args = args.iter();
                $( let $arg = args.next()?.downcast_ref::<$arg>()?; )*
                Some(Variant::new((self.f)(this, $($arg),*)))
            }
        }

        #[allow(non_snake_case, unused_variables, unused_mut)]
        impl<R, F, $($arg,)*> Invoker for FunctionFn<F, fn($(&$arg),*) -> R>
        where
            R: Value,
            $($arg: Value,)*
            F: Fn($(&$arg),*) -> R + Send + Sync + 'static,
        {
            fn call(&self, _receiver: Receiver<'_>, args: &[&dyn Value]) -> Option<Variant<'static>> {
                let mut args = args.iter();
                $( let $arg = args.next()?.downcast_ref::<$arg>()?; )*
                Some(Variant::new((self.f)($($arg),*)))
            }
        }

        impl<C, R, F, $($arg,)*> IntoMethod<C, fn(&C, $(&$arg),*) -> R> for F
        where
            C: Value,
            R: Value,
            $($arg: Value,)*
            F: Fn(&C, $(&$arg),*) -> R + Send + Sync + 'static,
        {
            fn signature() -> Signature {
                Signature::new(ReceiverKind::Shared, vec![$(TypeKey::of::<$arg>()),*], TypeKey::of::<R>())
            }

            fn into_invoker(self) -> Box<dyn Invoker> {
                Box::new(MethodFn::<F, fn(&C, $(&$arg),*) -> R>::new(self))
            }
        }

        impl<C, R, F, $($arg,)*> IntoMethod<C, fn(&mut C, $(&$arg),*) -> R> for F
        where
            C: Value,
            R: Value,
            $($arg: Value,)*
            F: Fn(&mut C, $(&$arg),*) -> R + Send + Sync + 'static,
        {
            fn signature() -> Signature {
                Signature::new(ReceiverKind::Unique, vec![$(TypeKey::of::<$arg>()),*], TypeKey::of::<R>())
            }

            fn into_invoker(self) -> Box<dyn Invoker> {
                Box::new(MethodFn::<F, fn(&mut C, $(&$arg),*) -> R>::new(self))
            }
        }

        impl<R, F, $($arg,)*> IntoFunction<fn($(&$arg),*) -> R> for F
        where
            R: Value,
            $($arg: Value,)*
            F: Fn($(&$arg),*) -> R + Send + Sync + 'static,
        {
            fn signature() -> Signature {
                Signature::new(ReceiverKind::Static, vec![$(TypeKey::of::<$arg>()),*], TypeKey::of::<R>())
            }

            fn into_invoker(self) -> Box<dyn Invoker> {
                Box::new(FunctionFn::<F, fn($(&$arg),*) -> R>::new(self))
            }
        }
    };
}

impl_signatures!();
impl_signatures!(A1);
impl_signatures!(A1, A2);
impl_signatures!(A1, A2, A3);
impl_signatures!(A1, A2, A3, A4);
impl_signatures!(A1, A2, A3, A4, A5);
impl_signatures!(A1, A2, A3, A4, A5, A6);

#[cfg(test)]
mod tests {
    use super::*;

    fn erase_method<C, M, F: IntoMethod<C, M>>(f: F) -> (Signature, Box<dyn Invoker>) {
        (F::signature(), f.into_invoker())
    }

    fn erase_function<M, F: IntoFunction<M>>(f: F) -> (Signature, Box<dyn Invoker>) {
        (F::signature(), f.into_invoker())
    }

    #[derive(Clone)]
    struct Counter {
        hits: u32,
    }

    #[test]
    fn test_shared_method_signature() {
        let (sig, invoker) = erase_method(|c: &Counter, step: &u32| c.hits + step);
        assert_eq!(sig.receiver, ReceiverKind::Shared);
        assert_eq!(sig.params, vec![TypeKey::of::<u32>()]);
        assert_eq!(sig.ret, TypeKey::of::<u32>());

        let counter = Counter { hits: 2 };
        let result = invoker.call(Receiver::Shared(&counter), &[&3u32]);
        assert_eq!(result.and_then(|v| v.get_value::<u32>().copied()), Some(5));
    }

    #[test]
    fn test_unique_method_mutates() {
        let (sig, invoker) = erase_method(|c: &mut Counter| c.hits += 1);
        assert_eq!(sig.receiver, ReceiverKind::Unique);
        assert_eq!(sig.ret, TypeKey::of::<()>());

        let mut counter = Counter { hits: 0 };
        let result = invoker.call(Receiver::Unique(&mut counter), &[]);
        assert!(result.map_or(false, |v| v.is_void()));
        assert_eq!(counter.hits, 1);

        let shared = Counter { hits: 0 };
        assert!(invoker.call(Receiver::Shared(&shared), &[]).is_none());
    }

    #[test]
    fn test_static_function_rejects_wrong_argument() {
        let (sig, invoker) = erase_function(|a: &i32, b: &i32| a * b);
        assert_eq!(sig.receiver, ReceiverKind::Static);
        assert_eq!(sig.arity(), 2);
        assert!(invoker.call(Receiver::Static, &[&2i32, &3i64]).is_none());
        assert!(invoker.call(Receiver::Static, &[&2i32]).is_none());
        let result = invoker.call(Receiver::Static, &[&2i32, &3i32]);
        assert_eq!(result.and_then(|v| v.to_i32()), Some(6));
    }

    #[test]
    fn test_six_arguments() {
        let (sig, invoker) = erase_function(
            |a: &u8, b: &u8, c: &u8, d: &u8, e: &u8, f: &u8| {
                u32::from(*a) + u32::from(*b) + u32::from(*c) + u32::from(*d) + u32::from(*e) + u32::from(*f)
            },
        );
        assert_eq!(sig.arity(), MAX_FAST_ARITY);
        let args: [&dyn Value; 6] = [&1u8, &2u8, &3u8, &4u8, &5u8, &6u8];
        let result = invoker.call(Receiver::Static, &args);
        assert_eq!(result.and_then(|v| v.get_value::<u32>().copied()), Some(21));
    }
}
