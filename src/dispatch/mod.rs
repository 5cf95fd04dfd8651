//! Invocation dispatcher for methods, properties and constructors.
//!
//! Design:
//! - Every callable owns an erased [`Invoker`] built at registration time
//! - Arguments bind by reference: exact type first, then a base-class
//!   projection, then a conversion in the configured mode
//! - Nothing reaches the target unless every argument bound; failures are
//!   reported as [`InvokeError`] and never panic

mod argument;
mod constructor;
mod instance;
mod method;
mod property;
mod signature;

#[cfg(test)]
mod tests;

pub use argument::{ArgList, Argument, IntoArgs};
pub use constructor::Constructor;
pub use instance::Instance;
pub use method::Method;
pub use property::Property;
pub(crate) use property::{FieldAccess, GetSetAccess, GetterAccess, PropertyAccess, StaticAccess};
pub use signature::{IntoFunction, IntoMethod, Invoker, Receiver, ReceiverKind, Signature, MAX_FAST_ARITY};
pub(crate) use signature::VariadicFn;

use crate::core::registry::{registry, Registry};
use crate::core::types::Type;
use crate::errors::InvokeError;
use crate::variant::{convert_value, ConversionMode, ConvertOptions, TypeKey, Value, Variant};
use smallvec::SmallVec;

/// One declared parameter of a method or constructor.
#[derive(Debug, Clone)]
pub struct ParameterInfo {
    pub(crate) index: usize,
    pub(crate) name: Option<String>,
    pub(crate) key: TypeKey,
    pub(crate) ty: Type,
    pub(crate) default: Option<Variant<'static>>,
}

impl ParameterInfo {
    pub(crate) fn new(index: usize, key: TypeKey) -> Self {
        Self { index, name: None, key, ty: Type::invalid(), default: None }
    }

    pub fn get_index(&self) -> usize {
        self.index
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn get_type(&self) -> Type {
        self.ty
    }

    pub fn has_default_value(&self) -> bool {
        self.default.is_some()
    }

    pub fn get_default_value(&self) -> Option<&Variant<'static>> {
        self.default.as_ref()
    }

    fn type_name(&self) -> String {
        if self.ty.is_valid() {
            self.ty.name().to_string()
        } else {
            self.key.rust_name().to_string()
        }
    }
}

/// Signature plus erased target shared by methods and constructors.
pub(crate) struct Callable {
    pub(crate) receiver: ReceiverKind,
    pub(crate) params: Vec<ParameterInfo>,
    pub(crate) ret_key: TypeKey,
    pub(crate) ret: Type,
    pub(crate) invoker: Box<dyn Invoker>,
}

impl Callable {
    pub(crate) fn new(signature: Signature, invoker: Box<dyn Invoker>) -> Self {
        let params = signature
            .params
            .into_iter()
            .enumerate()
            .map(|(index, key)| ParameterInfo::new(index, key))
            .collect();
        Self {
            receiver: signature.receiver,
            params,
            ret_key: signature.ret,
            ret: Type::invalid(),
            invoker,
        }
    }

    pub(crate) fn parameter_types(&self) -> impl Iterator<Item = Type> + '_ {
        self.params.iter().map(|p| p.ty)
    }

    /// Arguments that must be supplied; trailing defaulted parameters may be omitted.
    pub(crate) fn required(&self) -> usize {
        self.params.len() - self.params.iter().rev().take_while(|p| p.default.is_some()).count()
    }

    /// Parameter keys must match exactly.
    pub(crate) fn same_parameters(&self, other: &Callable) -> bool {
        self.params.len() == other.params.len() && self.params.iter().zip(&other.params).all(|(a, b)| a.key == b.key)
    }

    pub(crate) fn call(
        &self,
        declaring: Type,
        mut instance: Instance<'_>,
        args: &[Argument<'_>],
    ) -> Result<Variant<'static>, InvokeError> {
        let registry = registry().ok_or(InvokeError::NotFrozen)?;
        let receiver = match self.receiver {
            ReceiverKind::Static => Receiver::Static,
            ReceiverKind::Shared => Receiver::Shared(instance.view_as(declaring)?),
            ReceiverKind::Unique => Receiver::Unique(instance.view_as_mut(declaring)?),
        };

        let (min, max) = (self.required(), self.params.len());
        if args.len() < min || args.len() > max {
            return Err(InvokeError::ArgumentCount { min, max, found: args.len() });
        }

        let mode = registry.settings.conversion_mode;
        let mut bound: SmallVec<[Bound<'_>; MAX_FAST_ARITY]> = SmallVec::with_capacity(max);
        for param in &self.params {
            let slot = match args.get(param.index) {
                Some(arg) => bind(registry, param, arg, mode).ok_or_else(|| InvokeError::ArgumentType {
                    index: param.index,
                    expected: param.type_name(),
                    found: arg.type_name(),
                })?,
                None => param
                    .default
                    .as_ref()
                    .and_then(Variant::as_value)
                    .map(Bound::Borrowed)
                    .ok_or(InvokeError::ArgumentCount { min, max, found: args.len() })?,
            };
            bound.push(slot);
        }

        let values: SmallVec<[&dyn Value; MAX_FAST_ARITY]> = bound.iter().map(Bound::as_value).collect();
        self.invoker.call(receiver, &values).ok_or(InvokeError::TargetRejected)
    }
}

/// An argument after binding: borrowed from the caller, or converted.
pub(crate) enum Bound<'a> {
    Borrowed(&'a dyn Value),
    Owned(Box<dyn Value>),
}

impl Bound<'_> {
    pub(crate) fn as_value(&self) -> &dyn Value {
        match self {
            Bound::Borrowed(value) => *value,
            Bound::Owned(value) => &**value,
        }
    }
}

fn bind<'a>(registry: &Registry, param: &ParameterInfo, arg: &Argument<'a>, mode: ConversionMode) -> Option<Bound<'a>> {
    let value = arg.as_value()?;
    if value.type_key() == param.key {
        return Some(Bound::Borrowed(value));
    }
    if let Some(base) = registry.upcast(value, param.ty) {
        return Some(Bound::Borrowed(base));
    }
    let options = ConvertOptions { mode, trim_whitespace: registry.settings.trim_whitespace };
    convert_value(value, param.key, options).map(Bound::Owned)
}

/// Whether dispatch failures are logged. On until a frozen registry says otherwise.
pub(crate) fn log_failures() -> bool {
    failures_logged(registry())
}

pub(crate) fn failures_logged(registry: Option<&Registry>) -> bool {
    registry.map_or(true, |r| r.settings.log_failures)
}

/// Resolve `value` to a value of type `key`/`ty`, converting if needed.
pub(crate) fn coerce<'v>(value: &'v dyn Value, key: TypeKey, ty: Type) -> Option<Bound<'v>> {
    let registry = registry()?;
    let param = ParameterInfo { index: 0, name: None, key, ty, default: None };
    bind(registry, &param, &Argument::from_dyn(value), registry.settings.conversion_mode)
}
