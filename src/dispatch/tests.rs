use super::*;
use crate::testing::{fixture, Animal, Copier, Device, Dog, Point, Printer, Scanner};

fn point_method(name: &str) -> &'static Method {
    fixture();
    Type::get::<Point>().get_method(name).unwrap()
}

#[test]
fn test_invoke_shared_method() {
    let length = point_method("length");
    let point = Point::new(3.0, 4.0);
    let result = length.invoke(Instance::new(&point), ());
    assert_eq!(result.to_f64(), Some(5.0));
    assert_eq!(length.get_return_type(), Type::get::<f64>());
    assert_eq!(length.get_declaring_type(), Type::get::<Point>());
    assert!(!length.is_static());
    assert!(!length.is_mutating());
}

#[test]
fn test_invoke_mutating_method() {
    let translate = point_method("translate");
    assert!(translate.is_mutating());
    let mut point = Point::new(1.0, 1.0);
    let result = translate.invoke(Instance::new_mut(&mut point), (&2.0f64, &-1.0f64));
    assert!(result.is_void());
    assert_eq!(point, Point::new(3.0, 0.0));
}

#[test]
fn test_mutating_method_needs_mutable_instance() {
    let translate = point_method("translate");
    let point = Point::new(1.0, 1.0);
    let args = [Argument::new(&1.0f64), Argument::new(&1.0f64)];
    assert_eq!(
        translate.try_invoke(Instance::new(&point), &args),
        Err(InvokeError::ReadOnlyInstance)
    );
    assert!(!translate.invoke(Instance::new(&point), args).is_valid());
}

#[test]
fn test_wrong_arity_has_no_side_effect() {
    let translate = point_method("translate");
    let mut point = Point::new(1.0, 1.0);
    let result = translate.try_invoke(Instance::new_mut(&mut point), &[Argument::new(&5.0f64)]);
    assert_eq!(result, Err(InvokeError::ArgumentCount { min: 2, max: 2, found: 1 }));
    assert_eq!(point, Point::new(1.0, 1.0));
}

#[test]
fn test_arguments_convert_to_parameter_types() {
    let translate = point_method("translate");
    let mut point = Point::default();
    let dx = 2i32;
    let dy = String::from("0.5");
    let result = translate.invoke(Instance::new_mut(&mut point), (&dx, &dy));
    assert!(result.is_valid());
    assert_eq!(point, Point::new(2.0, 0.5));
}

#[test]
fn test_unconvertible_argument_is_rejected() {
    let translate = point_method("translate");
    let mut point = Point::default();
    let dy = String::from("north");
    let args = [Argument::new(&1.0f64), Argument::new(&dy)];
    let error = translate.try_invoke(Instance::new_mut(&mut point), &args).unwrap_err();
    assert!(matches!(error, InvokeError::ArgumentType { index: 1, .. }));
    assert_eq!(point, Point::default());
}

#[test]
fn test_invalid_variant_argument_is_rejected() {
    let scaled = point_method("scaled");
    let point = Point::new(1.0, 1.0);
    let missing = Variant::invalid();
    let args = [Argument::from(&missing)];
    assert!(matches!(
        scaled.try_invoke(Instance::new(&point), &args),
        Err(InvokeError::ArgumentType { index: 0, .. })
    ));
}

#[test]
fn test_default_arguments_fill_missing_trailing_parameters() {
    let scaled = point_method("scaled");
    let info = &scaled.parameter_infos()[0];
    assert!(info.has_default_value());
    assert_eq!(info.get_default_value().and_then(|v| v.to_f64()), Some(2.0));

    let point = Point::new(1.0, 2.0);
    let doubled = scaled.invoke(Instance::new(&point), ());
    assert_eq!(doubled.get_value::<Point>(), Some(&Point::new(2.0, 4.0)));
    let tripled = scaled.invoke(Instance::new(&point), (&3.0f64,));
    assert_eq!(tripled.get_value::<Point>(), Some(&Point::new(3.0, 6.0)));
}

#[test]
fn test_static_method_without_instance() {
    let distance = point_method("distance");
    assert!(distance.is_static());
    let (a, b) = (Point::new(0.0, 0.0), Point::new(6.0, 8.0));
    let result = distance.invoke(Instance::empty(), (&a, &b));
    assert_eq!(result.to_f64(), Some(10.0));
}

#[test]
fn test_variadic_method_beyond_fast_arity() {
    let sum = point_method("sum");
    assert_eq!(sum.arity(), 7);
    let values: Vec<i32> = (1..=7).collect();
    let args: Vec<Argument<'_>> = values.iter().map(Argument::new).collect();
    assert_eq!(sum.invoke_variadic(Instance::empty(), &args).to_i64(), Some(28));

    let short: Vec<Argument<'_>> = values[..6].iter().map(Argument::new).collect();
    assert!(!sum.invoke_variadic(Instance::empty(), &short).is_valid());
}

#[test]
fn test_instance_of_wrong_type() {
    let length = point_method("length");
    let dog = Dog::new("Rex", "collie");
    assert!(matches!(
        length.try_invoke(Instance::new(&dog), &[]),
        Err(InvokeError::WrongInstanceType { .. })
    ));
    assert_eq!(length.try_invoke(Instance::empty(), &[]), Err(InvokeError::MissingInstance));
}

#[test]
fn test_inherited_method_runs_on_base_subobject() {
    fixture();
    let dog = Dog::new("Rex", "collie");
    let dog_type = Type::get::<Dog>();

    let own = dog_type.get_method("describe").unwrap();
    assert_eq!(own.get_declaring_type(), dog_type);
    assert_eq!(own.invoke(Instance::new(&dog), ()).to_string_value(), Some("Rex the collie".to_string()));

    let inherited = Type::get::<Animal>().get_method("describe").unwrap();
    let text = inherited.invoke(Instance::new(&dog), ()).to_string_value();
    assert_eq!(text, Some("Rex with 4 legs".to_string()));
}

#[test]
fn test_inherited_mutating_method() {
    fixture();
    let mut dog = Dog::new("Rex", "collie");
    let rename = Type::get::<Dog>().get_method("rename").unwrap();
    let name = String::from("Max");
    assert!(rename.invoke(Instance::new_mut(&mut dog), (&name,)).is_void());
    assert_eq!(dog.mammal.animal.name, "Max");
}

#[test]
fn test_derived_arguments_bind_to_base_parameters() {
    fixture();
    let same_legs = Type::get::<Animal>().get_method("same_legs").unwrap();
    let dog = Dog::new("Rex", "collie");
    let cat = Animal { name: "Tom".into(), legs: 4 };
    assert_eq!(same_legs.invoke(Instance::empty(), (&dog, &cat)).to_bool(), Some(true));
}

#[test]
fn test_invoke_by_name_and_suggestions() {
    fixture();
    let point = Point::new(3.0, 4.0);
    let ty = Type::get::<Point>();
    assert_eq!(ty.invoke("length", Instance::new(&point), &[]).to_f64(), Some(5.0));

    match ty.try_invoke("lenght", Instance::new(&point), &[]) {
        Err(InvokeError::UnknownMethod { suggestions, .. }) => {
            assert!(suggestions.contains(&"length".to_string()));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

fn offset(point: &Point, args: &[Argument<'_>]) -> Result<Variant<'static>, InvokeError> {
    Type::get::<Point>().try_invoke("offset", Instance::new(point), args)
}

#[test]
fn test_invoke_by_name_picks_matching_overload() {
    fixture();
    let point = Point::new(1.0, 2.0);
    let ty = Type::get::<Point>();

    let one = offset(&point, &[Argument::new(&1.0f64)]).unwrap();
    assert_eq!(one.get_value::<Point>(), Some(&Point::new(2.0, 3.0)));

    let two = offset(&point, &[Argument::new(&2.0f64), Argument::new(&3.0f64)]).unwrap();
    assert_eq!(two.get_value::<Point>(), Some(&Point::new(3.0, 5.0)));

    let by = Point::new(10.0, 20.0);
    let shifted = offset(&point, &[Argument::new(&by)]).unwrap();
    assert_eq!(shifted.get_value::<Point>(), Some(&Point::new(11.0, 22.0)));

    let (a, b, c) = (1.0f64, 2.0f64, 3.0f64);
    assert_eq!(
        offset(&point, &[Argument::new(&a), Argument::new(&b), Argument::new(&c)]).err(),
        Some(InvokeError::ArgumentCount { min: 1, max: 1, found: 3 })
    );
    assert_eq!(ty.get_method_with("offset", &[Type::get::<f64>(), Type::get::<f64>()]).map(|m| m.arity()), Some(2));
}

#[test]
fn test_arguments_from_variants() {
    let translate = point_method("translate");
    let mut point = Point::default();
    let dx = Variant::new(1u8);
    let dy = Variant::new(String::from("2"));
    let args = [Argument::from(&dx), Argument::from(&dy)];
    assert!(translate.invoke_variadic(Instance::new_mut(&mut point), &args).is_valid());
    assert_eq!(point, Point::new(1.0, 2.0));
}

#[test]
fn test_instance_from_wrapped_variant() {
    let length = point_method("length");
    let boxed = Variant::new(Box::new(Point::new(6.0, 8.0)));
    let instance = Instance::from_variant(&boxed);
    assert_eq!(instance.get_type(), Type::get::<Point>());
    assert_eq!(length.invoke(instance, ()).to_f64(), Some(10.0));

    let empty = Variant::new(None::<i32>);
    assert!(!Instance::from_variant(&empty).is_valid());
}

#[test]
fn test_instance_over_owned_variant_is_mutable() {
    let translate = point_method("translate");
    let mut owned = Variant::new(Point::default());
    assert!(Instance::from_variant_mut(&mut owned).is_mutable());
    translate.invoke(Instance::new_mut(&mut owned), (&1.0f64, &1.0f64));
    assert_eq!(owned.get_value::<Point>(), Some(&Point::new(1.0, 1.0)));

    let point = Point::default();
    let mut alias = Variant::from_ref(&point);
    assert!(!Instance::from_variant_mut(&mut alias).is_mutable());
}

#[test]
fn test_constructors() {
    fixture();
    let ty = Type::get::<Point>();
    let f64_type = Type::get::<f64>();

    let ctor = ty.get_constructor(&[f64_type, f64_type]).unwrap();
    assert_eq!(ctor.get_instantiated_type(), ty);
    assert_eq!(ctor.get_declaring_type(), ty);
    let names: Vec<_> = ctor.parameter_infos().iter().map(|p| p.get_name()).collect();
    assert_eq!(names, vec![Some("x"), Some("y")]);

    let made = ctor.invoke((&1.0f64, &2.0f64));
    assert_eq!(made.get_value::<Point>(), Some(&Point::new(1.0, 2.0)));

    assert_eq!(ty.create_default().get_value::<Point>(), Some(&Point::default()));
    let x = Variant::new(5i32);
    let y = Variant::new(6i32);
    let created = ty.create(&[Argument::from(&x), Argument::from(&y)]);
    assert_eq!(created.get_value::<Point>(), Some(&Point::new(5.0, 6.0)));

    assert!(!ctor.invoke((&1.0f64,)).is_valid());
}

#[test]
fn test_constructor_with_string_arguments() {
    fixture();
    let (name, breed) = (String::from("Rex"), String::from("beagle"));
    let dog = Type::get::<Dog>().create(&[Argument::new(&name), Argument::new(&breed)]);
    let dog = dog.take_value::<Dog>().unwrap();
    assert_eq!(dog, Dog::new("Rex", "beagle"));
    assert!(!Type::get::<Dog>().create_default().is_valid());
}

#[test]
fn test_property_read_and_write() {
    fixture();
    let x = Type::get::<Point>().get_property("x").unwrap();
    assert_eq!(x.get_type(), Type::get::<f64>());
    assert_eq!(x.get_metadata("unit").and_then(|v| v.to_string_value()), Some("px".to_string()));

    let mut point = Point::new(1.0, 2.0);
    assert_eq!(x.get_value(Instance::new(&point)).to_f64(), Some(1.0));

    assert!(x.set_value(Instance::new_mut(&mut point), &Variant::new(7i32)));
    assert_eq!(point.x, 7.0);

    assert!(!x.set_value(Instance::new(&point), &Variant::new(8.0f64)));
    assert!(!x.set_value(Instance::new_mut(&mut point), &Variant::new(String::from("wide"))));
    assert!(!x.set_value(Instance::new_mut(&mut point), &Variant::invalid()));
    assert_eq!(point.x, 7.0);
}

#[test]
fn test_readonly_and_static_properties() {
    fixture();
    let ty = Type::get::<Point>();
    let length = ty.get_property("length").unwrap();
    assert!(length.is_readonly());
    let mut point = Point::new(3.0, 4.0);
    assert_eq!(length.get_value(Instance::new(&point)).to_f64(), Some(5.0));
    assert!(!length.set_value(Instance::new_mut(&mut point), &Variant::new(1.0f64)));

    let origin = ty.get_property("origin").unwrap();
    assert!(origin.is_static());
    assert_eq!(origin.get_value(Instance::empty()).get_value::<Point>(), Some(&Point::default()));
}

#[test]
fn test_inherited_properties() {
    fixture();
    let dog_type = Type::get::<Dog>();
    let names: Vec<&str> = dog_type.get_properties().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["breed", "fur", "name", "legs"]);

    let mut dog = Dog::new("Rex", "collie");
    let legs = dog_type.get_property("legs").unwrap();
    assert_eq!(legs.get_declaring_type(), Type::get::<Animal>());
    assert_eq!(legs.get_value(Instance::new(&dog)).to_u32(), Some(4));
    assert!(legs.set_value(Instance::new_mut(&mut dog), &Variant::new(3u64)));
    assert_eq!(dog.mammal.animal.legs, 3);
}

#[test]
fn test_property_through_virtual_base() {
    fixture();
    let serial = Type::get::<Device>().get_property("serial").unwrap();
    let copier = Copier::new(42);
    assert_eq!(serial.get_value(Instance::new(&copier)).to_u32(), Some(42));

    let mut copier = copier;
    assert!(!serial.set_value(Instance::new_mut(&mut copier), &Variant::new(1u32)));
}

#[test]
fn test_cast_preserves_origin() {
    fixture();
    let copier = Copier::new(9);
    let instance = Instance::new(&copier);
    assert_eq!(instance.get_derived_type(), Type::get::<Copier>());

    let as_scanner = instance.cast(Type::get::<Scanner>()).unwrap();
    assert_eq!(as_scanner.get_type(), Type::get::<Scanner>());
    assert_eq!(as_scanner.get_derived_type(), Type::get::<Copier>());

    let as_printer = as_scanner.cast(Type::get::<Printer>()).unwrap();
    assert_eq!(as_printer.try_convert::<Printer>().map(|p| p.pages_per_minute), Some(30));
    assert_eq!(as_printer.try_convert::<Device>().map(|d| d.serial), Some(9));

    let scanner = Scanner::default();
    assert!(Instance::new(&scanner).cast(Type::get::<Printer>()).is_none());
    assert!(Instance::empty().cast(Type::get::<Scanner>()).is_none());
}

#[test]
fn test_try_convert_mut_through_chain() {
    fixture();
    let mut dog = Dog::new("Rex", "collie");
    let mut instance = Instance::new_mut(&mut dog);
    if let Some(animal) = instance.try_convert_mut::<Animal>() {
        animal.legs = 5;
    }
    assert!(instance.try_convert_mut::<Point>().is_none());
    assert_eq!(dog.mammal.animal.legs, 5);
}

#[test]
fn test_argument_queries() {
    fixture();
    let value = 3u16;
    let arg = Argument::new(&value);
    assert!(arg.is_type::<u16>());
    assert_eq!(arg.get_type(), Type::get::<u16>());
    assert_eq!(arg.get_value::<u16>(), Some(&3));

    let wrapped = Variant::new(4u16);
    let through = Argument::new(&wrapped);
    assert!(through.is_type::<u16>());

    let list = (&value, &wrapped).into_args();
    assert_eq!(list.len(), 2);
    assert!(list[1].is_type::<u16>());
}

#[test]
fn test_failure_logging_follows_settings() {
    use crate::core::builder::RegistryBuilder;
    use crate::core::registry::Settings;

    let mut builder = RegistryBuilder::new();
    builder.set_settings(Settings { log_failures: false, ..Settings::default() });
    let quiet = builder.build().unwrap();
    assert!(!failures_logged(Some(&quiet)));
    assert!(failures_logged(None));

    fixture();
    assert!(log_failures());
}
