//! Inline arithmetic storage and the numeric conversion rules.

use super::convert::ConversionMode;
use super::value::{TypeKey, Value};
use num_traits::{cast, ToPrimitive};
use std::cmp::Ordering;

/// An arithmetic value small enough to live inside a `Variant` without allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 14] = [
        Self::Bool,
        Self::Char,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::Isize,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::Usize,
        Self::F32,
        Self::F64,
    ];

    pub fn of_key(key: TypeKey) -> Option<Self> {
        Self::ALL.into_iter().find(|&kind| kind.type_key() == key)
    }

    pub fn type_key(self) -> TypeKey {
        match self {
            Self::Bool => TypeKey::of::<bool>(),
            Self::Char => TypeKey::of::<char>(),
            Self::I8 => TypeKey::of::<i8>(),
            Self::I16 => TypeKey::of::<i16>(),
            Self::I32 => TypeKey::of::<i32>(),
            Self::I64 => TypeKey::of::<i64>(),
            Self::Isize => TypeKey::of::<isize>(),
            Self::U8 => TypeKey::of::<u8>(),
            Self::U16 => TypeKey::of::<u16>(),
            Self::U32 => TypeKey::of::<u32>(),
            Self::U64 => TypeKey::of::<u64>(),
            Self::Usize => TypeKey::of::<usize>(),
            Self::F32 => TypeKey::of::<f32>(),
            Self::F64 => TypeKey::of::<f64>(),
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    pub fn is_integral(self) -> bool {
        !self.is_float() && !matches!(self, Self::Bool | Self::Char)
    }
}

impl Scalar {
    /// Read a scalar out of an erased value, if it holds one.
    pub fn from_value(value: &dyn Value) -> Option<Self> {
        let any = value.as_any();
        let scalar = match ScalarKind::of_key(value.type_key())? {
            ScalarKind::Bool => Self::Bool(*any.downcast_ref::<bool>()?),
            ScalarKind::Char => Self::Char(*any.downcast_ref::<char>()?),
            ScalarKind::I8 => Self::I8(*any.downcast_ref::<i8>()?),
            ScalarKind::I16 => Self::I16(*any.downcast_ref::<i16>()?),
            ScalarKind::I32 => Self::I32(*any.downcast_ref::<i32>()?),
            ScalarKind::I64 => Self::I64(*any.downcast_ref::<i64>()?),
            ScalarKind::Isize => Self::Isize(*any.downcast_ref::<isize>()?),
            ScalarKind::U8 => Self::U8(*any.downcast_ref::<u8>()?),
            ScalarKind::U16 => Self::U16(*any.downcast_ref::<u16>()?),
            ScalarKind::U32 => Self::U32(*any.downcast_ref::<u32>()?),
            ScalarKind::U64 => Self::U64(*any.downcast_ref::<u64>()?),
            ScalarKind::Usize => Self::Usize(*any.downcast_ref::<usize>()?),
            ScalarKind::F32 => Self::F32(*any.downcast_ref::<f32>()?),
            ScalarKind::F64 => Self::F64(*any.downcast_ref::<f64>()?),
        };
        Some(scalar)
    }

    pub fn kind(self) -> ScalarKind {
        match self {
            Self::Bool(_) => ScalarKind::Bool,
            Self::Char(_) => ScalarKind::Char,
            Self::I8(_) => ScalarKind::I8,
            Self::I16(_) => ScalarKind::I16,
            Self::I32(_) => ScalarKind::I32,
            Self::I64(_) => ScalarKind::I64,
            Self::Isize(_) => ScalarKind::Isize,
            Self::U8(_) => ScalarKind::U8,
            Self::U16(_) => ScalarKind::U16,
            Self::U32(_) => ScalarKind::U32,
            Self::U64(_) => ScalarKind::U64,
            Self::Usize(_) => ScalarKind::Usize,
            Self::F32(_) => ScalarKind::F32,
            Self::F64(_) => ScalarKind::F64,
        }
    }

    pub fn as_value(&self) -> &dyn Value {
        match self {
            Self::Bool(v) => v as &dyn Value,
            Self::Char(v) => v as &dyn Value,
            Self::I8(v) => v as &dyn Value,
            Self::I16(v) => v as &dyn Value,
            Self::I32(v) => v as &dyn Value,
            Self::I64(v) => v as &dyn Value,
            Self::Isize(v) => v as &dyn Value,
            Self::U8(v) => v as &dyn Value,
            Self::U16(v) => v as &dyn Value,
            Self::U32(v) => v as &dyn Value,
            Self::U64(v) => v as &dyn Value,
            Self::Usize(v) => v as &dyn Value,
            Self::F32(v) => v as &dyn Value,
            Self::F64(v) => v as &dyn Value,
        }
    }

    pub fn as_value_mut(&mut self) -> &mut dyn Value {
        match self {
            Self::Bool(v) => v as &mut dyn Value,
            Self::Char(v) => v as &mut dyn Value,
            Self::I8(v) => v as &mut dyn Value,
            Self::I16(v) => v as &mut dyn Value,
            Self::I32(v) => v as &mut dyn Value,
            Self::I64(v) => v as &mut dyn Value,
            Self::Isize(v) => v as &mut dyn Value,
            Self::U8(v) => v as &mut dyn Value,
            Self::U16(v) => v as &mut dyn Value,
            Self::U32(v) => v as &mut dyn Value,
            Self::U64(v) => v as &mut dyn Value,
            Self::Usize(v) => v as &mut dyn Value,
            Self::F32(v) => v as &mut dyn Value,
            Self::F64(v) => v as &mut dyn Value,
        }
    }

    pub fn into_boxed(self) -> Box<dyn Value> {
        self.as_value().clone_value()
    }

    /// Convert to another arithmetic kind.
    ///
    /// Strict mode only succeeds when converting back yields the original value
    /// (NaN counts as preserved). Lossy mode succeeds whenever the value is in
    /// range of the target; floats truncate toward zero.
    pub fn cast(self, kind: ScalarKind, mode: ConversionMode) -> Option<Scalar> {
        if self.kind() == kind {
            return Some(self);
        }
        let scalar = match kind {
            ScalarKind::Bool => Self::Bool(self.to_bool(mode)?),
            ScalarKind::Char => Self::Char(self.to_char(mode)?),
            ScalarKind::I8 => Self::I8(self.to_num(mode)?),
            ScalarKind::I16 => Self::I16(self.to_num(mode)?),
            ScalarKind::I32 => Self::I32(self.to_num(mode)?),
            ScalarKind::I64 => Self::I64(self.to_num(mode)?),
            ScalarKind::Isize => Self::Isize(self.to_num(mode)?),
            ScalarKind::U8 => Self::U8(self.to_num(mode)?),
            ScalarKind::U16 => Self::U16(self.to_num(mode)?),
            ScalarKind::U32 => Self::U32(self.to_num(mode)?),
            ScalarKind::U64 => Self::U64(self.to_num(mode)?),
            ScalarKind::Usize => Self::Usize(self.to_num(mode)?),
            ScalarKind::F32 => Self::F32(self.to_num(mode)?),
            ScalarKind::F64 => Self::F64(self.to_num(mode)?),
        };
        Some(scalar)
    }

    fn to_num<U>(self, mode: ConversionMode) -> Option<U>
    where
        U: num_traits::NumCast + ToPrimitive + Copy,
    {
        match self {
            Self::Bool(v) => cast(u8::from(v)),
            Self::Char(v) => round_trip(u32::from(v), mode),
            Self::I8(v) => round_trip(v, mode),
            Self::I16(v) => round_trip(v, mode),
            Self::I32(v) => round_trip(v, mode),
            Self::I64(v) => round_trip(v, mode),
            Self::Isize(v) => round_trip(v, mode),
            Self::U8(v) => round_trip(v, mode),
            Self::U16(v) => round_trip(v, mode),
            Self::U32(v) => round_trip(v, mode),
            Self::U64(v) => round_trip(v, mode),
            Self::Usize(v) => round_trip(v, mode),
            Self::F32(v) => round_trip(v, mode),
            Self::F64(v) => round_trip(v, mode),
        }
    }

    fn to_bool(self, mode: ConversionMode) -> Option<bool> {
        if let Self::Bool(v) = self {
            return Some(v);
        }
        let value = self.to_f64_lossy()?;
        if value.is_nan() {
            return None;
        }
        match mode {
            ConversionMode::Lossy => Some(value != 0.0),
            ConversionMode::Strict if value == 0.0 => Some(false),
            ConversionMode::Strict if value == 1.0 => Some(true),
            ConversionMode::Strict => None,
        }
    }

    fn to_char(self, mode: ConversionMode) -> Option<char> {
        match self {
            Self::Bool(_) => None,
            other => char::from_u32(other.to_num::<u32>(mode)?),
        }
    }

    fn to_f64_lossy(self) -> Option<f64> {
        match self {
            Self::Bool(v) => Some(f64::from(u8::from(v))),
            Self::Char(v) => Some(f64::from(u32::from(v))),
            Self::F32(v) => Some(f64::from(v)),
            Self::F64(v) => Some(v),
            other => other.to_i128().and_then(|v| v.to_f64()),
        }
    }

    fn to_i128(self) -> Option<i128> {
        match self {
            Self::Bool(v) => Some(i128::from(v)),
            Self::Char(v) => Some(i128::from(u32::from(v))),
            Self::I8(v) => Some(v.into()),
            Self::I16(v) => Some(v.into()),
            Self::I32(v) => Some(v.into()),
            Self::I64(v) => Some(v.into()),
            Self::Isize(v) => v.to_i128(),
            Self::U8(v) => Some(v.into()),
            Self::U16(v) => Some(v.into()),
            Self::U32(v) => Some(v.into()),
            Self::U64(v) => Some(v.into()),
            Self::Usize(v) => v.to_i128(),
            Self::F32(_) | Self::F64(_) => None,
        }
    }

    /// Compare by numeric value across kinds: integers exactly, anything
    /// involving a float as `f64`.
    pub fn numeric_cmp(self, other: Scalar) -> Option<Ordering> {
        match (self.to_i128(), other.to_i128()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => self.to_f64_lossy()?.partial_cmp(&other.to_f64_lossy()?),
        }
    }

    pub fn numeric_eq(self, other: Scalar) -> bool {
        self.numeric_cmp(other) == Some(Ordering::Equal)
    }

    /// Locale-independent text form; floats use the shortest representation
    /// that parses back to the same value.
    pub fn to_text(self) -> String {
        match self {
            Self::Bool(v) => v.to_string(),
            Self::Char(v) => v.to_string(),
            Self::I8(v) => v.to_string(),
            Self::I16(v) => v.to_string(),
            Self::I32(v) => v.to_string(),
            Self::I64(v) => v.to_string(),
            Self::Isize(v) => v.to_string(),
            Self::U8(v) => v.to_string(),
            Self::U16(v) => v.to_string(),
            Self::U32(v) => v.to_string(),
            Self::U64(v) => v.to_string(),
            Self::Usize(v) => v.to_string(),
            Self::F32(v) => v.to_string(),
            Self::F64(v) => v.to_string(),
        }
    }

    /// Parse text as the given kind.
    ///
    /// Booleans accept any token: empty, `"false"` and `"0"` are false,
    /// everything else is true.
    pub fn parse(text: &str, kind: ScalarKind, trim: bool) -> Option<Scalar> {
        let text = if trim || kind == ScalarKind::Bool { text.trim() } else { text };
        let scalar = match kind {
            ScalarKind::Bool => Self::Bool(parse_bool(text)),
            ScalarKind::Char => {
                let mut chars = text.chars();
                let c = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                Self::Char(c)
            }
            ScalarKind::I8 => Self::I8(text.parse().ok()?),
            ScalarKind::I16 => Self::I16(text.parse().ok()?),
            ScalarKind::I32 => Self::I32(text.parse().ok()?),
            ScalarKind::I64 => Self::I64(text.parse().ok()?),
            ScalarKind::Isize => Self::Isize(text.parse().ok()?),
            ScalarKind::U8 => Self::U8(text.parse().ok()?),
            ScalarKind::U16 => Self::U16(text.parse().ok()?),
            ScalarKind::U32 => Self::U32(text.parse().ok()?),
            ScalarKind::U64 => Self::U64(text.parse().ok()?),
            ScalarKind::Usize => Self::Usize(text.parse().ok()?),
            ScalarKind::F32 => Self::F32(text.parse().ok()?),
            ScalarKind::F64 => Self::F64(text.parse().ok()?),
        };
        Some(scalar)
    }
}

fn parse_bool(text: &str) -> bool {
    !(text.is_empty() || text.eq_ignore_ascii_case("false") || text == "0")
}

fn round_trip<T, U>(value: T, mode: ConversionMode) -> Option<U>
where
    T: num_traits::NumCast + ToPrimitive + Copy + PartialEq,
    U: num_traits::NumCast + ToPrimitive + Copy,
{
    let out: U = cast(value)?;
    if mode == ConversionMode::Strict {
        let back: T = cast(out)?;
        if back != value && !(is_nan(value) && is_nan(out)) {
            return None;
        }
    }
    Some(out)
}

fn is_nan<T: ToPrimitive>(value: T) -> bool {
    value.to_f64().map_or(false, f64::is_nan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_lookup() {
        assert_eq!(ScalarKind::of_key(TypeKey::of::<u16>()), Some(ScalarKind::U16));
        assert_eq!(ScalarKind::of_key(TypeKey::of::<String>()), None);
        assert!(ScalarKind::F32.is_float());
        assert!(!ScalarKind::Char.is_integral());
    }

    #[test]
    fn test_strict_rejects_out_of_range() {
        assert_eq!(Scalar::I32(300).cast(ScalarKind::U8, ConversionMode::Strict), None);
        assert_eq!(Scalar::I32(-1).cast(ScalarKind::U32, ConversionMode::Lossy), None);
        assert_eq!(
            Scalar::I32(200).cast(ScalarKind::U8, ConversionMode::Strict),
            Some(Scalar::U8(200))
        );
    }

    #[test]
    fn test_float_to_int() {
        assert_eq!(Scalar::F64(2.5).cast(ScalarKind::I32, ConversionMode::Strict), None);
        assert_eq!(
            Scalar::F64(-2.9).cast(ScalarKind::I32, ConversionMode::Lossy),
            Some(Scalar::I32(-2))
        );
        assert_eq!(Scalar::F64(f64::NAN).cast(ScalarKind::I64, ConversionMode::Lossy), None);
    }

    #[test]
    fn test_nan_survives_strict_narrowing() {
        let narrowed = Scalar::F64(f64::NAN).cast(ScalarKind::F32, ConversionMode::Strict);
        assert!(matches!(narrowed, Some(Scalar::F32(v)) if v.is_nan()));
    }

    #[test]
    fn test_bool_rules() {
        assert_eq!(Scalar::I32(7).cast(ScalarKind::Bool, ConversionMode::Lossy), Some(Scalar::Bool(true)));
        assert_eq!(Scalar::I32(7).cast(ScalarKind::Bool, ConversionMode::Strict), None);
        assert_eq!(Scalar::Bool(true).cast(ScalarKind::F64, ConversionMode::Strict), Some(Scalar::F64(1.0)));
    }

    #[test]
    fn test_char_codes() {
        assert_eq!(Scalar::Char('A').cast(ScalarKind::U8, ConversionMode::Strict), Some(Scalar::U8(65)));
        assert_eq!(Scalar::U32(0x1F600).cast(ScalarKind::Char, ConversionMode::Strict), Some(Scalar::Char('😀')));
        assert_eq!(Scalar::U32(0xD800).cast(ScalarKind::Char, ConversionMode::Lossy), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!(Scalar::parse(" 42 ", ScalarKind::I32, true), Some(Scalar::I32(42)));
        assert_eq!(Scalar::parse(" 42 ", ScalarKind::I32, false), None);
        assert_eq!(Scalar::parse("1e3", ScalarKind::F64, true), Some(Scalar::F64(1000.0)));
        assert_eq!(Scalar::parse("abc", ScalarKind::U8, true), None);
        assert_eq!(Scalar::parse("FALSE", ScalarKind::Bool, false), Some(Scalar::Bool(false)));
        assert_eq!(Scalar::parse("yes", ScalarKind::Bool, false), Some(Scalar::Bool(true)));
        assert_eq!(Scalar::parse("", ScalarKind::Bool, false), Some(Scalar::Bool(false)));
    }

    #[test]
    fn test_numeric_compare_across_kinds() {
        assert!(Scalar::I32(5).numeric_eq(Scalar::U64(5)));
        assert!(!Scalar::I32(1).numeric_eq(Scalar::F64(1.5)));
        assert_eq!(Scalar::I64(-1).numeric_cmp(Scalar::U64(u64::MAX)), Some(Ordering::Less));
        assert_eq!(Scalar::F64(f64::NAN).numeric_cmp(Scalar::F64(1.0)), None);
    }
}
