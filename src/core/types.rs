//! Type handles and the per-type descriptor.
//!
//! Design:
//! - `Type` is a `Copy` index into the frozen registry, never a pointer
//! - `TypeData` is built during registration and immutable after freeze
//! - Capabilities are flag bits plus optional adapter slots, computed once

use crate::core::enumeration::{EnumData, Enumeration};
use crate::core::registry::registry;
use crate::dispatch::{log_failures, Argument, Constructor, Instance, Method, Property};
use crate::errors::{find_similar_names, InvokeError};
use crate::relations::BaseEdge;
use crate::variant::{Value, TypeKey, Variant, WrapperOps};
use crate::views::{AssociativeOps, SequentialOps};
use std::cmp::Ordering;
use std::fmt;
use std::ops::BitOr;
use tracing::debug;

/// Handle to a registered type.
///
/// The reserved invalid handle answers `false`/empty to every query.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Type {
    index: u32,
}

impl Type {
    const INVALID: u32 = u32::MAX;

    pub const fn invalid() -> Self {
        Self { index: Self::INVALID }
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self { index: index as u32 }
    }

    pub(crate) fn index(self) -> Option<usize> {
        (self.index != Self::INVALID).then_some(self.index as usize)
    }

    /// The registered type for `T`, or invalid when `T` was never registered.
    pub fn get<T: ?Sized + 'static>() -> Type {
        Self::from_key(TypeKey::of::<T>())
    }

    pub fn from_key(key: TypeKey) -> Type {
        registry().map_or(Type::invalid(), |r| r.type_of_key(key))
    }

    /// Static type of a value.
    pub fn of_value<T: Value>(_value: &T) -> Type {
        Self::get::<T>()
    }

    /// Dynamic type of an erased value.
    pub fn of_dyn(value: &dyn Value) -> Type {
        Self::from_key(value.type_key())
    }

    pub fn get_by_name(name: &str) -> Type {
        registry().map_or(Type::invalid(), |r| r.get_by_name(name))
    }

    pub fn get_types() -> Vec<Type> {
        registry().map(|r| r.get_types().collect()).unwrap_or_default()
    }

    pub(crate) fn data(self) -> Option<&'static TypeData> {
        registry()?.data(self)
    }

    pub fn is_valid(self) -> bool {
        self.data().is_some()
    }

    /// Registered name, or the empty string for the invalid type.
    pub fn name(self) -> &'static str {
        self.data().map_or("", |d| d.name.as_str())
    }

    pub fn type_key(self) -> Option<TypeKey> {
        self.data().map(|d| d.key)
    }

    pub fn size_of(self) -> usize {
        self.data().map_or(0, |d| d.size)
    }

    pub fn align_of(self) -> usize {
        self.data().map_or(0, |d| d.align)
    }

    pub fn flags(self) -> TypeFlags {
        self.data().map_or(TypeFlags::empty(), |d| d.flags)
    }

    pub fn is_class(self) -> bool {
        self.flags().contains(TypeFlags::CLASS)
    }

    pub fn is_arithmetic(self) -> bool {
        self.flags().contains(TypeFlags::ARITHMETIC)
    }

    pub fn is_enumeration(self) -> bool {
        self.flags().contains(TypeFlags::ENUM)
    }

    pub fn is_wrapper(self) -> bool {
        self.flags().contains(TypeFlags::WRAPPER)
    }

    pub fn is_pointer(self) -> bool {
        self.flags().contains(TypeFlags::POINTER)
    }

    pub fn is_sequential_container(self) -> bool {
        self.flags().contains(TypeFlags::SEQUENTIAL)
    }

    pub fn is_associative_container(self) -> bool {
        self.flags().contains(TypeFlags::ASSOCIATIVE)
    }

    pub fn is_void(self) -> bool {
        self.flags().contains(TypeFlags::VOID)
    }

    pub fn has_equality(self) -> bool {
        self.flags().contains(TypeFlags::EQUALITY)
    }

    pub fn has_ordering(self) -> bool {
        self.flags().contains(TypeFlags::ORDERING)
    }

    /// The type with every wrapper layer removed. Non-wrappers return themselves.
    pub fn raw_type(self) -> Type {
        self.data().map_or(Type::invalid(), |d| d.raw)
    }

    /// The type one wrapper layer down, or invalid for non-wrappers.
    pub fn wrapped_type(self) -> Type {
        self.data().map_or(Type::invalid(), |d| d.wrapped)
    }

    /// Direct bases in declaration order.
    pub fn get_base_classes(self) -> Vec<Type> {
        self.data()
            .map(|d| d.bases.iter().map(|b| b.base).collect())
            .unwrap_or_default()
    }

    /// Direct derived types in registration order.
    pub fn get_derived_classes(self) -> Vec<Type> {
        self.data().map(|d| d.derived.clone()).unwrap_or_default()
    }

    /// True when `self` is `other` or reaches it through base edges.
    pub fn is_derived_from(self, other: Type) -> bool {
        registry().map_or(false, |r| r.is_related(self, other))
    }

    /// `self` followed by every ancestor, depth-first in base declaration
    /// order, each type listed once.
    pub fn hierarchy(self) -> Vec<Type> {
        fn visit(ty: Type, order: &mut Vec<Type>) {
            if order.contains(&ty) {
                return;
            }
            let Some(data) = ty.data() else { return };
            order.push(ty);
            for base in &data.bases {
                visit(base.base, order);
            }
        }

        let mut order = Vec::new();
        visit(self, &mut order);
        order
    }

    /// Own properties in declaration order, then inherited ones.
    pub fn get_properties(self) -> Vec<&'static Property> {
        self.hierarchy()
            .into_iter()
            .filter_map(Type::data)
            .flat_map(|d| d.properties.iter())
            .collect()
    }

    pub fn get_property(self, name: &str) -> Option<&'static Property> {
        self.get_properties().into_iter().find(|p| p.name() == name)
    }

    pub fn get_methods(self) -> Vec<&'static Method> {
        self.hierarchy()
            .into_iter()
            .filter_map(Type::data)
            .flat_map(|d| d.methods.iter())
            .collect()
    }

    /// First method called `name`, searching own methods before bases.
    pub fn get_method(self, name: &str) -> Option<&'static Method> {
        self.get_methods().into_iter().find(|m| m.name() == name)
    }

    /// Overload selection by exact parameter types.
    pub fn get_method_with(self, name: &str, params: &[Type]) -> Option<&'static Method> {
        self.get_methods()
            .into_iter()
            .find(|m| m.name() == name && m.parameter_types().eq(params.iter().copied()))
    }

    pub fn get_constructors(self) -> &'static [Constructor] {
        self.data().map_or(&[], |d| d.constructors.as_slice())
    }

    pub fn get_constructor(self, params: &[Type]) -> Option<&'static Constructor> {
        self.get_constructors()
            .iter()
            .find(|c| c.parameter_types().eq(params.iter().copied()))
    }

    /// Construct through the first constructor that accepts `args`.
    pub fn create(self, args: &[Argument<'_>]) -> Variant<'static> {
        self.get_constructors()
            .iter()
            .find_map(|ctor| ctor.try_invoke(args).ok())
            .unwrap_or_default()
    }

    pub fn create_default(self) -> Variant<'static> {
        self.create(&[])
    }

    pub fn get_enumeration(self) -> Option<Enumeration> {
        let data = self.data()?;
        data.enumeration.as_ref().map(|e| Enumeration::new(self, e))
    }

    /// Static metadata first, then entries added through the metadata window.
    pub fn get_metadata(self, key: &str) -> Option<Variant<'static>> {
        let data = self.data()?;
        if let Some(value) = data.metadata.get(key) {
            return Some(value.clone());
        }
        registry()?.overlay_metadata(self, key)
    }

    /// Invoke the named method. See [`Type::try_invoke`] for overload selection.
    pub fn invoke(self, name: &str, instance: Instance<'_>, args: &[Argument<'_>]) -> Variant<'static> {
        match self.try_invoke(name, instance, args) {
            Ok(result) => result,
            Err(error) => {
                if log_failures() {
                    debug!(target: "rtreflect::dispatch", ty = self.name(), method = name, %error, "invoke by name failed");
                }
                Variant::invalid()
            }
        }
    }

    /// Invoke the first method called `name` that accepts `args`.
    ///
    /// Candidates are tried most-derived first. Argument count and argument
    /// type mismatches move on to the next overload; they are detected before
    /// the target runs. When no overload binds, the first candidate's error
    /// is returned.
    pub fn try_invoke(
        self,
        name: &str,
        mut instance: Instance<'_>,
        args: &[Argument<'_>],
    ) -> Result<Variant<'static>, InvokeError> {
        let mut first_error = None;
        for method in self.get_methods().into_iter().filter(|m| m.name() == name) {
            match method.try_invoke(instance.reborrow(), args) {
                Err(error @ (InvokeError::ArgumentCount { .. } | InvokeError::ArgumentType { .. })) => {
                    first_error.get_or_insert(error);
                }
                result => return result,
            }
        }
        Err(first_error.unwrap_or_else(|| InvokeError::UnknownMethod {
            ty: self.name().to_string(),
            name: name.to_string(),
            suggestions: self.suggest_members(name),
        }))
    }

    /// Member names within a small edit distance of `name`.
    pub fn suggest_members(self, name: &str) -> Vec<String> {
        let methods = self.get_methods();
        let properties = self.get_properties();
        let candidates = methods
            .iter()
            .map(|m| m.name())
            .chain(properties.iter().map(|p| p.name()));
        find_similar_names(name, candidates, 2)
    }
}

impl Default for Type {
    fn default() -> Self {
        Self::invalid()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data() {
            Some(data) => f.write_str(&data.name),
            None => f.write_str("<invalid>"),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(index) => write!(f, "Type({}, {})", index, self),
            None => f.write_str("Type(<invalid>)"),
        }
    }
}

/// Capability bits of a registered type.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TypeFlags(u16);

impl TypeFlags {
    pub const CLASS: Self = Self(1 << 0);
    pub const ARITHMETIC: Self = Self(1 << 1);
    pub const ENUM: Self = Self(1 << 2);
    pub const WRAPPER: Self = Self(1 << 3);
    pub const POINTER: Self = Self(1 << 4);
    pub const SEQUENTIAL: Self = Self(1 << 5);
    pub const ASSOCIATIVE: Self = Self(1 << 6);
    pub const EQUALITY: Self = Self(1 << 7);
    pub const ORDERING: Self = Self(1 << 8);
    pub const VOID: Self = Self(1 << 9);
    pub const STRING: Self = Self(1 << 10);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl BitOr for TypeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for TypeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(TypeFlags, &str); 11] = [
            (TypeFlags::CLASS, "CLASS"),
            (TypeFlags::ARITHMETIC, "ARITHMETIC"),
            (TypeFlags::ENUM, "ENUM"),
            (TypeFlags::WRAPPER, "WRAPPER"),
            (TypeFlags::POINTER, "POINTER"),
            (TypeFlags::SEQUENTIAL, "SEQUENTIAL"),
            (TypeFlags::ASSOCIATIVE, "ASSOCIATIVE"),
            (TypeFlags::EQUALITY, "EQUALITY"),
            (TypeFlags::ORDERING, "ORDERING"),
            (TypeFlags::VOID, "VOID"),
            (TypeFlags::STRING, "STRING"),
        ];
        let set: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "TypeFlags({})", set.join(" | "))
    }
}

/// Visibility recorded for a member. Informational only; dispatch does not enforce it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AccessLevel {
    #[default]
    Public,
    Protected,
    Private,
}

/// Ordered key/value annotations attached to types and members.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    entries: Vec<(String, Variant<'static>)>,
}

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&Variant<'static>> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, key: String, value: Variant<'static>) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }
}

pub(crate) type EqFn = fn(&dyn Value, &dyn Value) -> bool;
pub(crate) type CmpFn = fn(&dyn Value, &dyn Value) -> Option<Ordering>;
pub(crate) type ConvertFn = Box<dyn Fn(&dyn Value) -> Option<Box<dyn Value>> + Send + Sync>;

pub(crate) fn eq_by<T: Value + PartialEq>(a: &dyn Value, b: &dyn Value) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

pub(crate) fn cmp_by<T: Value + PartialOrd>(a: &dyn Value, b: &dyn Value) -> Option<Ordering> {
    a.downcast_ref::<T>()?.partial_cmp(b.downcast_ref::<T>()?)
}

/// A registered conversion from the owning type to `target`.
pub(crate) struct Converter {
    pub(crate) target: TypeKey,
    pub(crate) func: ConvertFn,
}

/// Everything the registry knows about one type.
pub(crate) struct TypeData {
    pub(crate) name: String,
    pub(crate) key: TypeKey,
    pub(crate) size: usize,
    pub(crate) align: usize,
    pub(crate) flags: TypeFlags,
    pub(crate) raw: Type,
    pub(crate) wrapped: Type,
    pub(crate) bases: Vec<BaseEdge>,
    pub(crate) derived: Vec<Type>,
    pub(crate) constructors: Vec<Constructor>,
    pub(crate) methods: Vec<Method>,
    pub(crate) properties: Vec<Property>,
    pub(crate) converters: Vec<Converter>,
    pub(crate) enumeration: Option<EnumData>,
    pub(crate) sequential: Option<Box<dyn SequentialOps>>,
    pub(crate) associative: Option<Box<dyn AssociativeOps>>,
    pub(crate) wrapper: Option<Box<dyn WrapperOps>>,
    pub(crate) eq: Option<EqFn>,
    pub(crate) cmp: Option<CmpFn>,
    pub(crate) metadata: Metadata,
}

impl TypeData {
    pub(crate) fn new<T: Value>(name: &str, flags: TypeFlags) -> Self {
        Self {
            name: name.to_string(),
            key: TypeKey::of::<T>(),
            size: std::mem::size_of::<T>(),
            align: std::mem::align_of::<T>(),
            flags,
            raw: Type::invalid(),
            wrapped: Type::invalid(),
            bases: Vec::new(),
            derived: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            converters: Vec::new(),
            enumeration: None,
            sequential: None,
            associative: None,
            wrapper: None,
            eq: None,
            cmp: None,
            metadata: Metadata::default(),
        }
    }

    pub(crate) fn converter_to(&self, target: TypeKey) -> Option<&Converter> {
        self.converters.iter().find(|c| c.target == target)
    }
}
