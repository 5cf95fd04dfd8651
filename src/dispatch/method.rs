//! Method descriptors.

use super::{log_failures, Argument, Callable, Instance, IntoArgs, ParameterInfo, ReceiverKind};
use crate::core::types::{AccessLevel, Metadata, Type};
use crate::errors::InvokeError;
use crate::variant::Variant;
use tracing::{debug, trace};

/// A callable member of a type, possibly static.
pub struct Method {
    pub(crate) name: String,
    pub(crate) declaring: Type,
    pub(crate) callable: Callable,
    pub(crate) access: AccessLevel,
    pub(crate) metadata: Metadata,
}

impl Method {
    pub(crate) fn new(name: &str, callable: Callable) -> Self {
        Self {
            name: name.to_string(),
            declaring: Type::invalid(),
            callable,
            access: AccessLevel::default(),
            metadata: Metadata::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_declaring_type(&self) -> Type {
        self.declaring
    }

    /// The return type; the void type for methods returning `()`.
    pub fn get_return_type(&self) -> Type {
        self.callable.ret
    }

    pub fn is_static(&self) -> bool {
        self.callable.receiver == ReceiverKind::Static
    }

    /// True for methods that take `&mut self`.
    pub fn is_mutating(&self) -> bool {
        self.callable.receiver == ReceiverKind::Unique
    }

    pub fn get_access_level(&self) -> AccessLevel {
        self.access
    }

    pub fn arity(&self) -> usize {
        self.callable.params.len()
    }

    pub fn parameter_infos(&self) -> &[ParameterInfo] {
        &self.callable.params
    }

    pub fn parameter_types(&self) -> impl Iterator<Item = Type> + '_ {
        self.callable.parameter_types()
    }

    pub fn get_metadata(&self, key: &str) -> Option<&Variant<'static>> {
        self.metadata.get(key)
    }

    /// Call with up to six arguments given as a tuple of references.
    pub fn invoke<'a>(&self, instance: Instance<'_>, args: impl IntoArgs<'a>) -> Variant<'static> {
        let args = args.into_args();
        self.invoke_variadic(instance, &args)
    }

    /// Call with any number of arguments. Invalid on failure.
    pub fn invoke_variadic(&self, instance: Instance<'_>, args: &[Argument<'_>]) -> Variant<'static> {
        match self.try_invoke(instance, args) {
            Ok(result) => result,
            Err(error) => {
                if log_failures() {
                    debug!(
                        target: "rtreflect::dispatch",
                        ty = %self.declaring,
                        method = %self.name,
                        %error,
                        "invoke failed"
                    );
                }
                Variant::invalid()
            }
        }
    }

    pub fn try_invoke(&self, instance: Instance<'_>, args: &[Argument<'_>]) -> Result<Variant<'static>, InvokeError> {
        let result = self.callable.call(self.declaring, instance, args)?;
        trace!(target: "rtreflect::dispatch", ty = %self.declaring, method = %self.name, "invoked");
        Ok(result)
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<Type> = self.parameter_types().collect();
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("declaring", &self.declaring)
            .field("params", &params)
            .field("returns", &self.callable.ret)
            .field("static", &self.is_static())
            .finish()
    }
}
