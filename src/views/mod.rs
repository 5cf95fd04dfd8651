//! Container views: uniform access to sequential and associative containers
//! held by a variant, without knowing their concrete types.

mod associative;
mod containers;
mod sequential;


pub use associative::{AssociativeIter, AssociativeView};
pub(crate) use associative::{AssociativeOps, MappingAdapter};
pub use containers::{Mapping, Sequence};
pub use sequential::{SequentialIter, SequentialView};
pub(crate) use sequential::{SequenceAdapter, SequentialOps};

use crate::core::types::Type;
use crate::dispatch::{coerce, Bound};
use crate::errors::ViewError;
use crate::variant::{TypeKey, Variant};

/// Bring `value` to the element type `key`, borrowing when it already matches.
fn bind_value<'v>(key: TypeKey, ty: Type, value: &'v Variant<'_>) -> Result<Bound<'v>, ViewError> {
    let mismatch = || ViewError::TypeMismatch {
        expected: if ty.is_valid() { ty.name().to_string() } else { key.rust_name().to_string() },
        found: value.get_type().to_string(),
    };
    let raw = value.as_value().ok_or_else(mismatch)?;
    coerce(raw, key, ty).ok_or_else(mismatch)
}
