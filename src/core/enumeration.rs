//! Enumeration tables: named entries with an integral underlying value.

use crate::core::types::Type;
use crate::variant::{Value, Variant};

pub(crate) type UnderlyingFn = Box<dyn Fn(&dyn Value) -> Option<i64> + Send + Sync>;

pub(crate) struct EnumEntry {
    pub(crate) name: String,
    pub(crate) value: Variant<'static>,
    pub(crate) underlying: i64,
}

pub(crate) struct EnumData {
    pub(crate) entries: Vec<EnumEntry>,
    pub(crate) underlying: UnderlyingFn,
}

impl EnumData {
    pub(crate) fn underlying_of(&self, value: &dyn Value) -> Option<i64> {
        (self.underlying)(value)
    }

    pub(crate) fn by_name(&self, name: &str) -> Option<&EnumEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub(crate) fn by_underlying(&self, underlying: i64) -> Option<&EnumEntry> {
        self.entries.iter().find(|e| e.underlying == underlying)
    }
}

/// Read access to the entries of a registered enumeration.
#[derive(Clone, Copy)]
pub struct Enumeration {
    ty: Type,
    data: &'static EnumData,
}

impl Enumeration {
    pub(crate) fn new(ty: Type, data: &'static EnumData) -> Self {
        Self { ty, data }
    }

    pub fn get_type(&self) -> Type {
        self.ty
    }

    /// Entry names in registration order.
    pub fn get_names(&self) -> Vec<&'static str> {
        self.data.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn get_values(&self) -> Vec<&'static Variant<'static>> {
        self.data.entries.iter().map(|e| &e.value).collect()
    }

    pub fn name_to_value(&self, name: &str) -> Option<Variant<'static>> {
        self.data.by_name(name).map(|e| e.value.clone())
    }

    /// Name of the entry equal to `value`. Integers match by underlying value.
    pub fn value_to_name(&self, value: &Variant<'_>) -> Option<&'static str> {
        let value = value.as_value()?;
        let underlying = match self.data.underlying_of(value) {
            Some(underlying) => underlying,
            None => Variant::from_dyn(value).convert_to::<i64>()?,
        };
        self.data.by_underlying(underlying).map(|e| e.name.as_str())
    }

    pub fn underlying_value(&self, name: &str) -> Option<i64> {
        self.data.by_name(name).map(|e| e.underlying)
    }
}
