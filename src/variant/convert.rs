//! The conversion graph between registered types.
//!
//! Conversions are tried in a fixed order: identity, a function registered on
//! the source type, arithmetic casts, text parsing and formatting, enumeration
//! names and underlying values, and finally wrapper unwrapping or wrapping.

use super::scalar::{Scalar, ScalarKind};
use super::value::{TypeKey, Value};
use crate::core::registry::{registry, Registry};
use crate::core::types::TypeData;
use serde::{Deserialize, Serialize};

/// Strictness of arithmetic conversions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMode {
    /// Succeed when the value is in range of the target; floats truncate.
    #[default]
    Lossy,
    /// Succeed only when the value survives a round trip unchanged.
    Strict,
}

/// Parameters of one conversion request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConvertOptions {
    pub(crate) mode: ConversionMode,
    pub(crate) trim_whitespace: bool,
}

impl ConvertOptions {
    pub(crate) fn with_mode(mode: ConversionMode) -> Self {
        let trim_whitespace = registry().map_or(true, |r| r.settings().trim_whitespace);
        Self { mode, trim_whitespace }
    }

    pub(crate) fn current() -> Self {
        Self::with_mode(registry().map_or(ConversionMode::default(), |r| r.settings().conversion_mode))
    }
}

/// Convert `value` into a fresh value of type `target`.
pub(crate) fn convert_value(value: &dyn Value, target: TypeKey, options: ConvertOptions) -> Option<Box<dyn Value>> {
    let source = value.type_key();
    if source == target {
        return Some(value.clone_value());
    }

    let registry = registry();
    let source_data = registry.and_then(|r| r.data_of_key(source));
    let target_data = registry.and_then(|r| r.data_of_key(target));

    if let Some(converter) = source_data.and_then(|d| d.converter_to(target)) {
        if let Some(converted) = (converter.func)(value) {
            return Some(converted);
        }
    }

    if let Some(converted) = convert_builtin(value, target, options) {
        return Some(converted);
    }

    if let Some(converted) = convert_enum(value, source_data, target, target_data, options) {
        return Some(converted);
    }

    convert_wrapper(value, source_data, target, target_data, options, registry)
}

fn convert_builtin(value: &dyn Value, target: TypeKey, options: ConvertOptions) -> Option<Box<dyn Value>> {
    let target_kind = ScalarKind::of_key(target);
    if let Some(scalar) = Scalar::from_value(value) {
        if let Some(kind) = target_kind {
            return scalar.cast(kind, options.mode).map(Scalar::into_boxed);
        }
        if target.is::<String>() {
            return Some(Box::new(scalar.to_text()));
        }
        return None;
    }

    let text = text_of(value)?;
    match target_kind {
        Some(kind) => Scalar::parse(text, kind, options.trim_whitespace).map(Scalar::into_boxed),
        None if target.is::<String>() => Some(Box::new(text.to_string())),
        None => None,
    }
}

fn text_of(value: &dyn Value) -> Option<&str> {
    if let Some(text) = value.downcast_ref::<String>() {
        return Some(text.as_str());
    }
    value.downcast_ref::<&'static str>().copied()
}

fn convert_enum(
    value: &dyn Value,
    source: Option<&TypeData>,
    target: TypeKey,
    target_data: Option<&TypeData>,
    options: ConvertOptions,
) -> Option<Box<dyn Value>> {
    if let Some(table) = source.and_then(|d| d.enumeration.as_ref()) {
        let underlying = table.underlying_of(value)?;
        if target.is::<String>() {
            let entry = table.by_underlying(underlying)?;
            return Some(Box::new(entry.name.clone()));
        }
        let kind = ScalarKind::of_key(target)?;
        return Scalar::I64(underlying).cast(kind, options.mode).map(Scalar::into_boxed);
    }

    let table = target_data.and_then(|d| d.enumeration.as_ref())?;
    if let Some(text) = text_of(value) {
        let name = if options.trim_whitespace { text.trim() } else { text };
        return table.by_name(name).and_then(|e| e.value.as_value()).map(|v| v.clone_value());
    }
    let underlying = match Scalar::from_value(value)?.cast(ScalarKind::I64, options.mode)? {
        Scalar::I64(v) => v,
        _ => return None,
    };
    table
        .by_underlying(underlying)
        .and_then(|e| e.value.as_value())
        .map(|v| v.clone_value())
}

fn convert_wrapper(
    value: &dyn Value,
    source: Option<&TypeData>,
    target: TypeKey,
    target_data: Option<&TypeData>,
    options: ConvertOptions,
    registry: Option<&Registry>,
) -> Option<Box<dyn Value>> {
    if let Some(ops) = source.and_then(|d| d.wrapper.as_deref()) {
        let inner = ops.inner(value)?;
        return convert_value(inner, target, options);
    }

    let ops = target_data.and_then(|d| d.wrapper.as_deref())?;
    let inner_key = ops.inner_key();
    let inner = if value.type_key() == inner_key {
        value.clone_value()
    } else {
        let inner_type = registry?.type_of_key(inner_key);
        let upcast = registry?.upcast(value, inner_type);
        match upcast {
            Some(base) => base.clone_value(),
            None => convert_value(value, inner_key, options)?,
        }
    };
    ops.wrap(inner)
}
