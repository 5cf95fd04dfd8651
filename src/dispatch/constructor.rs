//! Constructor descriptors.

use super::{log_failures, Argument, Callable, Instance, IntoArgs, ParameterInfo};
use crate::core::types::{AccessLevel, Metadata, Type};
use crate::errors::InvokeError;
use crate::variant::Variant;
use tracing::debug;

/// Creates owned values of its declaring type.
pub struct Constructor {
    pub(crate) declaring: Type,
    pub(crate) callable: Callable,
    pub(crate) access: AccessLevel,
    pub(crate) metadata: Metadata,
}

impl Constructor {
    pub(crate) fn new(callable: Callable) -> Self {
        Self {
            declaring: Type::invalid(),
            callable,
            access: AccessLevel::default(),
            metadata: Metadata::default(),
        }
    }

    pub fn get_declaring_type(&self) -> Type {
        self.declaring
    }

    pub fn get_instantiated_type(&self) -> Type {
        self.callable.ret
    }

    pub fn get_access_level(&self) -> AccessLevel {
        self.access
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

    pub fn invoke<'a>(&self, args: impl IntoArgs<'a>) -> Variant<'static> {
        let args = args.into_args();
        self.invoke_variadic(&args)
    }

    pub fn invoke_variadic(&self, args: &[Argument<'_>]) -> Variant<'static> {
        match self.try_invoke(args) {
            Ok(value) => value,
            Err(error) => {
                if log_failures() {
                    debug!(target: "rtreflect::dispatch", ty = %self.declaring, %error, "construction failed");
                }
                Variant::invalid()
            }
        }
    }

    pub fn try_invoke(&self, args: &[Argument<'_>]) -> Result<Variant<'static>, InvokeError> {
        self.callable.call(self.declaring, Instance::empty(), args)
    }
}

impl std::fmt::Debug for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<Type> = self.parameter_types().collect();
        f.debug_struct("Constructor")
            .field("declaring", &self.declaring)
            .field("params", &params)
            .finish()
    }
}
