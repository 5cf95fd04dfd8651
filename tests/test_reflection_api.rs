//! End-to-end use of the public reflection API: register, freeze, then drive
//! values through types, members, enumerations and container views.

use once_cell::sync::Lazy;
use rtreflect::{freeze, is_frozen, register, Argument, Instance, RegistrationError, Registry, Type, Variant};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq)]
struct Thermostat {
    label: String,
    target: f32,
    history: Vec<f32>,
}

impl Thermostat {
    fn labelled(label: &String) -> Self {
        Self { label: label.clone(), target: 20.0, history: Vec::new() }
    }

    fn average(&self) -> f32 {
        if self.history.is_empty() {
            return self.target;
        }
        self.history.iter().sum::<f32>() / self.history.len() as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Off = 0,
    Heat = 1,
    Cool = 2,
}

static REGISTRY: Lazy<&'static Registry> = Lazy::new(|| {
    register(|r| {
        r.class::<Thermostat>("Thermostat")
            .default_constructor()
            .constructor(Thermostat::labelled)
            .parameter_names(&["label"])
            .property("label", |t: &Thermostat| &t.label, |t: &mut Thermostat| &mut t.label)
            .property("target", |t: &Thermostat| &t.target, |t: &mut Thermostat| &mut t.target)
            .metadata("unit", String::from("celsius"))
            .property("history", |t: &Thermostat| &t.history, |t: &mut Thermostat| &mut t.history)
            .method("raise", |t: &mut Thermostat, by: &f32| {
                t.target += by;
                t.history.push(t.target);
            })
            .method("average", Thermostat::average)
            .comparable();

        r.enumeration::<Mode>("Mode", |m| *m as i64)
            .value("Off", Mode::Off)
            .value("Heat", Mode::Heat)
            .value("Cool", Mode::Cool);

        r.associative::<BTreeMap<String, Mode>>("BTreeMap<String, Mode>");
    })
    .expect("registration open");
    freeze().expect("valid registrations")
});

fn registry() -> &'static Registry {
    *REGISTRY
}

#[test]
fn test_type_lookup() {
    registry();
    assert!(is_frozen());
    let ty = Type::get::<Thermostat>();
    assert!(ty.is_valid());
    assert!(ty.is_class());
    assert!(ty.has_equality());
    assert_eq!(ty, Type::get_by_name("Thermostat"));
    assert_eq!(ty.to_string(), "Thermostat");
    assert_eq!(Type::of_value(&Thermostat::default()), ty);
    assert!(Type::get_types().contains(&ty));

    assert!(Type::get::<Mode>().is_enumeration());
    assert!(Type::get::<f32>().is_arithmetic());
    assert!(Type::get::<Vec<f32>>().is_sequential_container());
    assert!(!Type::get::<Duration>().is_valid());
    assert!(!Type::get_by_name("Duration").is_valid());
}

#[test]
fn test_registration_closes_after_freeze() {
    registry();
    let late = register(|r| {
        r.class::<Duration>("Duration");
    });
    assert_eq!(late, Err(RegistrationError::AlreadyFrozen));
    assert!(freeze().is_err());
    assert!(!Type::get::<Duration>().is_valid());
}

#[test]
fn test_create_and_drive_an_object() {
    registry();
    let ty = Type::get::<Thermostat>();
    let label = String::from("hall");
    let mut object = ty.create(&[Argument::new(&label)]);
    assert!(object.is_type::<Thermostat>());

    let target = ty.get_property("target").unwrap();
    assert_eq!(target.get_metadata("unit").and_then(|v| v.to_string_value()), Some("celsius".to_string()));
    assert!(target.set_value(Instance::from_variant_mut(&mut object), &Variant::new(18i32)));

    let raise = ty.get_method("raise").unwrap();
    raise.invoke(Instance::from_variant_mut(&mut object), (&2.0f32,));
    raise.invoke(Instance::from_variant_mut(&mut object), (&String::from("2"),));

    let average = ty.invoke("average", Instance::from_variant(&object), &[]);
    assert_eq!(average.to_f32(), Some(21.0));

    let history = ty.get_property("history").unwrap().get_value(Instance::from_variant(&object));
    let view = history.create_sequential_view();
    assert_eq!(view.get_value_type(), Type::get::<f32>());
    let values: Vec<f32> = view.iter().filter_map(|v| v.to_f32()).collect();
    assert_eq!(values, vec![20.0, 22.0]);

    let thermostat = object.take_value::<Thermostat>().unwrap();
    assert_eq!(thermostat.label, "hall");
    assert_eq!(thermostat.target, 22.0);
}

#[test]
fn test_member_listing() {
    registry();
    let ty = Type::get::<Thermostat>();
    let properties: Vec<&str> = ty.get_properties().iter().map(|p| p.name()).collect();
    assert_eq!(properties, vec!["label", "target", "history"]);
    let methods: Vec<&str> = ty.get_methods().iter().map(|m| m.name()).collect();
    assert_eq!(methods, vec!["raise", "average"]);
    assert_eq!(ty.get_constructors().len(), 2);

    let ctor = ty.get_constructor(&[Type::get::<String>()]).unwrap();
    assert_eq!(ctor.parameter_infos()[0].get_name(), Some("label"));
    assert!(ty.get_method_with("raise", &[Type::get::<f32>()]).is_some());
    assert!(ty.get_method_with("raise", &[Type::get::<f64>()]).is_none());
}

#[test]
fn test_enumeration_metadata() {
    registry();
    let mode = Type::get::<Mode>().get_enumeration().unwrap();
    assert_eq!(mode.get_type(), Type::get::<Mode>());
    assert_eq!(mode.get_names(), vec!["Off", "Heat", "Cool"]);
    assert_eq!(mode.get_values().len(), 3);
    assert_eq!(mode.name_to_value("Cool").and_then(|v| v.take_value::<Mode>()), Some(Mode::Cool));
    assert_eq!(mode.value_to_name(&Variant::new(Mode::Heat)), Some("Heat"));
    assert_eq!(mode.value_to_name(&Variant::new(2u8)), Some("Cool"));
    assert_eq!(mode.value_to_name(&Variant::new(7i32)), None);
    assert_eq!(mode.underlying_value("Heat"), Some(1));
    assert!(mode.name_to_value("Auto").is_none());
}

#[test]
fn test_map_of_enumerations() {
    registry();
    let mut zones = Variant::new(BTreeMap::<String, Mode>::new());
    let mut view = zones.create_associative_view_mut();
    assert_eq!(view.insert_pair(&Variant::new("kitchen"), &Variant::new(String::from("Heat"))), Ok(true));
    assert_eq!(view.insert_pair(&Variant::new("attic"), &Variant::new(2i32)), Ok(true));
    assert!(view.insert_pair(&Variant::new("cellar"), &Variant::new(String::from("Auto"))).is_err());

    let (_, kitchen) = view.find(&Variant::new("kitchen")).unwrap();
    assert_eq!(kitchen.get_value::<Mode>(), Some(&Mode::Heat));

    let keys: Vec<String> = view.iter().filter_map(|(k, _)| k.to_string_value()).collect();
    assert_eq!(keys, vec!["attic", "kitchen"]);

    let stored = zones.get_value::<BTreeMap<String, Mode>>().unwrap();
    assert_eq!(stored.get("attic"), Some(&Mode::Cool));
}

#[test]
fn test_runtime_metadata_window() {
    let registry = registry();
    let ty = Type::get::<Thermostat>();
    assert!(ty.get_metadata("owner").is_none());

    let added = registry.metadata_window(|w| w.add(ty, "owner", Variant::new(String::from("facilities"))));
    assert!(added);
    assert_eq!(ty.get_metadata("owner").and_then(|v| v.to_string_value()), Some("facilities".to_string()));

    let removed = registry.metadata_window(|w| w.remove(ty, "owner"));
    assert!(removed.is_some());
    assert!(ty.get_metadata("owner").is_none());
}

#[test]
fn test_object_equality_through_variants() {
    registry();
    let a = Variant::new(Thermostat::labelled(&String::from("a")));
    let b = Variant::new(Thermostat::labelled(&String::from("a")));
    let c = Variant::new(Thermostat::labelled(&String::from("c")));
    assert_eq!(a, b);
    assert_ne!(a, c);
}
