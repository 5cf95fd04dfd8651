//! Property tests for the builtin conversion rules.

use once_cell::sync::Lazy;
use proptest::prelude::*;
use rtreflect::{freeze, ConversionMode, Registry, Variant};
use std::cmp::Ordering;

// Builtin types only.
static REGISTRY: Lazy<&'static Registry> = Lazy::new(|| freeze().expect("builtins are valid"));

fn finite_f64() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("finite", |v| v.is_finite())
}

fn finite_f32() -> impl Strategy<Value = f32> {
    any::<f32>().prop_filter("finite", |v| v.is_finite())
}

proptest! {
    #[test]
    fn integer_narrowing_is_range_checked(v in any::<i64>()) {
        Lazy::force(&REGISTRY);
        let variant = Variant::new(v);
        let expected = i32::try_from(v).ok();
        prop_assert_eq!(variant.convert_to_with::<i32>(ConversionMode::Strict), expected);
        prop_assert_eq!(variant.convert_to_with::<i32>(ConversionMode::Lossy), expected);
    }

    #[test]
    fn strict_int_to_float_needs_exact_representation(v in any::<i32>()) {
        Lazy::force(&REGISTRY);
        let nearest = v as f32;
        let exact = f64::from(nearest) == f64::from(v);
        let converted = Variant::new(v).convert_to_with::<f32>(ConversionMode::Strict);
        prop_assert_eq!(converted.is_some(), exact);
        prop_assert_eq!(Variant::new(v).convert_to_with::<f32>(ConversionMode::Lossy), Some(nearest));
    }

    #[test]
    fn lossy_float_to_int_truncates(v in -1.0e9f64..1.0e9f64) {
        Lazy::force(&REGISTRY);
        let variant = Variant::new(v);
        prop_assert_eq!(variant.convert_to_with::<i32>(ConversionMode::Lossy), Some(v.trunc() as i32));
        let strict = variant.convert_to_with::<i32>(ConversionMode::Strict);
        prop_assert_eq!(strict.is_some(), v.fract() == 0.0);
    }

    #[test]
    fn widening_round_trip_i8_i16(v in any::<i8>()) {
        Lazy::force(&REGISTRY);
        for mode in [ConversionMode::Strict, ConversionMode::Lossy] {
            let wide = Variant::new(v).convert_to_with::<i16>(mode);
            prop_assert_eq!(wide, Some(i16::from(v)));
            let back = Variant::new(wide.unwrap_or_default()).convert_to_with::<i8>(mode);
            prop_assert_eq!(back, Some(v));
        }
    }

    #[test]
    fn widening_round_trip_i32_i64(v in any::<i32>()) {
        Lazy::force(&REGISTRY);
        for mode in [ConversionMode::Strict, ConversionMode::Lossy] {
            let wide = Variant::new(v).convert_to_with::<i64>(mode);
            prop_assert_eq!(wide, Some(i64::from(v)));
            let back = Variant::new(wide.unwrap_or_default()).convert_to_with::<i32>(mode);
            prop_assert_eq!(back, Some(v));
        }
    }

    #[test]
    fn widening_round_trip_u16_u64(v in any::<u16>()) {
        Lazy::force(&REGISTRY);
        for mode in [ConversionMode::Strict, ConversionMode::Lossy] {
            let wide = Variant::new(v).convert_to_with::<u64>(mode);
            prop_assert_eq!(wide, Some(u64::from(v)));
            let back = Variant::new(wide.unwrap_or_default()).convert_to_with::<u16>(mode);
            prop_assert_eq!(back, Some(v));
        }
    }

    #[test]
    fn widening_round_trip_f32_f64(v in finite_f32()) {
        Lazy::force(&REGISTRY);
        for mode in [ConversionMode::Strict, ConversionMode::Lossy] {
            let wide = Variant::new(v).convert_to_with::<f64>(mode);
            prop_assert_eq!(wide, Some(f64::from(v)));
            let back = Variant::new(wide.unwrap_or_default()).convert_to_with::<f32>(mode);
            prop_assert_eq!(back, Some(v));
        }
    }

    #[test]
    fn i32_text_round_trip(v in any::<i32>()) {
        Lazy::force(&REGISTRY);
        let text = Variant::new(v).to_string_value();
        let expected = v.to_string();
        prop_assert_eq!(text.as_deref(), Some(expected.as_str()));
        prop_assert_eq!(Variant::new(text.unwrap_or_default()).to_i32(), Some(v));
    }

    #[test]
    fn f64_text_round_trip(v in finite_f64()) {
        Lazy::force(&REGISTRY);
        let text = Variant::new(v).to_string_value().unwrap_or_default();
        prop_assert_eq!(Variant::new(text).to_f64(), Some(v));
    }

    #[test]
    fn f32_text_round_trip(v in finite_f32()) {
        Lazy::force(&REGISTRY);
        let text = Variant::new(v).to_string_value().unwrap_or_default();
        prop_assert_eq!(Variant::new(text).to_f32(), Some(v));
    }

    #[test]
    fn bool_text_round_trip(v in any::<bool>()) {
        Lazy::force(&REGISTRY);
        let text = Variant::new(v).to_string_value().unwrap_or_default();
        prop_assert_eq!(Variant::new(text).to_bool(), Some(v));
    }

    #[test]
    fn bool_parsing_accepts_any_token(text in "[ a-zA-Z0-9]{0,8}") {
        Lazy::force(&REGISTRY);
        let token = text.trim();
        let expected = !(token.is_empty() || token.eq_ignore_ascii_case("false") || token == "0");
        prop_assert_eq!(Variant::new(text.clone()).to_bool(), Some(expected));
    }

    #[test]
    fn numeric_equality_ignores_representation(v in any::<i32>()) {
        Lazy::force(&REGISTRY);
        prop_assert_eq!(Variant::new(v), Variant::new(f64::from(v)));
        prop_assert_eq!(Variant::new(v), Variant::new(i64::from(v)));
    }

    #[test]
    fn numeric_ordering_matches_values(a in any::<i32>(), b in any::<i64>()) {
        Lazy::force(&REGISTRY);
        let ordering = Variant::new(a).partial_cmp(&Variant::new(b));
        prop_assert_eq!(ordering, Some(i64::from(a).cmp(&b)));
        prop_assert_eq!(ordering == Some(Ordering::Equal), Variant::new(a) == Variant::new(b));
    }
}

#[test]
fn test_unparseable_text_fails_in_both_modes() {
    Lazy::force(&REGISTRY);
    let text = Variant::new(String::from("12abc"));
    assert_eq!(text.convert_to_with::<i32>(ConversionMode::Strict), None);
    assert_eq!(text.convert_to_with::<i32>(ConversionMode::Lossy), None);
    assert_eq!(Variant::new(String::from(" 42 ")).to_i32(), Some(42));
}
