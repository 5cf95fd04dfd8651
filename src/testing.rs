//! Shared registry for unit tests.
//!
//! The registry is process-wide, so every unit test registers through
//! [`fixture`], which installs the types below once and freezes.

use crate::core::registry::{freeze, register, Registry};
use crate::core::builder::RegistryBuilder;
use crate::dispatch::{ReceiverKind, Signature};
use crate::variant::{TypeKey, Variant};
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Point {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl Point {
    pub(crate) fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Animal {
    pub(crate) name: String,
    pub(crate) legs: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Mammal {
    pub(crate) animal: Animal,
    pub(crate) fur: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Dog {
    pub(crate) mammal: Mammal,
    pub(crate) breed: String,
}

impl Dog {
    pub(crate) fn new(name: &str, breed: &str) -> Self {
        Self {
            mammal: Mammal { animal: Animal { name: name.to_string(), legs: 4 }, fur: true },
            breed: breed.to_string(),
        }
    }
}

/// Shared base of the office-machine diamond.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Device {
    pub(crate) serial: u32,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Scanner {
    pub(crate) device: Arc<Device>,
    pub(crate) dpi: u32,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Printer {
    pub(crate) device: Arc<Device>,
    pub(crate) pages_per_minute: u32,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Copier {
    pub(crate) scanner: Scanner,
    pub(crate) printer: Printer,
}

impl Copier {
    pub(crate) fn new(serial: u32) -> Self {
        let device = Arc::new(Device { serial });
        Self {
            scanner: Scanner { device: Arc::clone(&device), dpi: 600 },
            printer: Printer { device, pages_per_minute: 30 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Color {
    Red = 1,
    Green = 2,
    Blue = 4,
}

/// Registered without any capability: no equality, no ordering.
#[derive(Debug, Clone, Default)]
pub(crate) struct Opaque {
    pub(crate) tag: u8,
}

pub(crate) fn register_fixture(r: &mut RegistryBuilder) {
    r.class::<Point>("Point")
        .default_constructor()
        .constructor(|x: &f64, y: &f64| Point::new(*x, *y))
        .parameter_names(&["x", "y"])
        .property("x", |p: &Point| &p.x, |p: &mut Point| &mut p.x)
        .metadata("unit", String::from("px"))
        .property("y", |p: &Point| &p.y, |p: &mut Point| &mut p.y)
        .property_readonly("length", Point::length)
        .static_property_readonly("origin", Point::default)
        .method("length", Point::length)
        .method("translate", |p: &mut Point, dx: &f64, dy: &f64| {
            p.x += dx;
            p.y += dy;
        })
        .method("scaled", |p: &Point, by: &f64| Point::new(p.x * by, p.y * by))
        .default_arguments(vec![Variant::new(2.0f64)])
        .method("offset", |p: &Point, by: &f64| Point::new(p.x + by, p.y + by))
        .method("offset", |p: &Point, dx: &f64, dy: &f64| Point::new(p.x + dx, p.y + dy))
        .method("offset", |p: &Point, by: &Point| Point::new(p.x + by.x, p.y + by.y))
        .static_method("distance", |a: &Point, b: &Point| (a.x - b.x).hypot(a.y - b.y))
        .method_variadic(
            "sum",
            Signature::new(ReceiverKind::Static, vec![TypeKey::of::<i32>(); 7], TypeKey::of::<i64>()),
            |_, args| {
                let total = args
                    .iter()
                    .map(|a| a.downcast_ref::<i32>().map(|v| i64::from(*v)))
                    .sum::<Option<i64>>()?;
                Some(Variant::new(total))
            },
        )
        .comparable()
        .conversion(|p: &Point| Some(format!("({}, {})", p.x, p.y)))
        .class_metadata("description", String::from("2D point"));

    r.class::<Animal>("Animal")
        .default_constructor()
        .property("name", |a: &Animal| &a.name, |a: &mut Animal| &mut a.name)
        .property("legs", |a: &Animal| &a.legs, |a: &mut Animal| &mut a.legs)
        .method("describe", |a: &Animal| format!("{} with {} legs", a.name, a.legs))
        .method("rename", |a: &mut Animal, name: &String| a.name = name.clone())
        .static_method("same_legs", |a: &Animal, b: &Animal| a.legs == b.legs)
        .comparable();

    r.class::<Mammal>("Mammal")
        .base(|m: &Mammal| &m.animal, |m: &mut Mammal| &mut m.animal)
        .property("fur", |m: &Mammal| &m.fur, |m: &mut Mammal| &mut m.fur);

    r.class::<Dog>("Dog")
        .constructor(|name: &String, breed: &String| Dog::new(name, breed))
        .base(|d: &Dog| &d.mammal, |d: &mut Dog| &mut d.mammal)
        .property("breed", |d: &Dog| &d.breed, |d: &mut Dog| &mut d.breed)
        .method("bark", |d: &Dog| format!("{} says woof", d.mammal.animal.name))
        .method("describe", |d: &Dog| format!("{} the {}", d.mammal.animal.name, d.breed));

    r.class::<Device>("Device")
        .property("serial", |d: &Device| &d.serial, |d: &mut Device| &mut d.serial)
        .method("serial_number", |d: &Device| d.serial);

    r.class::<Scanner>("Scanner")
        .virtual_base_mut(|s: &Scanner| &*s.device, |s: &mut Scanner| Arc::get_mut(&mut s.device))
        .property("dpi", |s: &Scanner| &s.dpi, |s: &mut Scanner| &mut s.dpi);

    r.class::<Printer>("Printer")
        .virtual_base(|p: &Printer| &*p.device)
        .property("pages_per_minute", |p: &Printer| &p.pages_per_minute, |p: &mut Printer| &mut p.pages_per_minute);

    r.class::<Copier>("Copier")
        .base(|c: &Copier| &c.scanner, |c: &mut Copier| &mut c.scanner)
        .base(|c: &Copier| &c.printer, |c: &mut Copier| &mut c.printer);

    r.class::<Opaque>("Opaque")
        .property("tag", |o: &Opaque| &o.tag, |o: &mut Opaque| &mut o.tag);

    r.enumeration::<Color>("Color", |c| *c as i64)
        .value("Red", Color::Red)
        .value("Green", Color::Green)
        .value("Blue", Color::Blue);

    r.sequential::<VecDeque<i32>>("VecDeque<i32>")
        .sequential::<[u8; 4]>("[u8; 4]")
        .sequential::<Vec<Point>>("Vec<Point>")
        .associative::<HashMap<String, i32>>("HashMap<String, i32>")
        .associative::<BTreeMap<i32, String>>("BTreeMap<i32, String>")
        .associative::<HashSet<i64>>("HashSet<i64>")
        .associative::<BTreeSet<String>>("BTreeSet<String>")
        .wrapper::<Box<Point>>("Box<Point>")
        .wrapper::<Arc<Point>>("Arc<Point>")
        .wrapper::<Option<i32>>("Option<i32>")
        .wrapper::<Box<Vec<i32>>>("Box<Vec<i32>>");
}

static FIXTURE: Lazy<&'static Registry> = Lazy::new(|| {
    register(register_fixture).expect("registration is open before the fixture freezes");
    freeze().expect("fixture registrations are valid")
});

/// The frozen fixture registry.
pub(crate) fn fixture() -> &'static Registry {
    *FIXTURE
}
