//! Registration API.
//!
//! Registration collects descriptors into a [`RegistryBuilder`]. Problems are
//! recorded and registration continues, so `freeze()` reports every
//! misconfiguration at once. Member types are resolved leniently at build
//! time; base classes must be registered.

use crate::core::enumeration::{EnumData, EnumEntry};
use crate::core::registry::{Registry, Settings};
use crate::core::types::{cmp_by, eq_by, AccessLevel, Converter, Type, TypeData, TypeFlags};
use crate::dispatch::{
    Callable, Constructor, FieldAccess, GetSetAccess, GetterAccess, IntoFunction, IntoMethod, Method, Property,
    PropertyAccess, Receiver, Signature, StaticAccess, VariadicFn,
};
use crate::errors::{RegistrationError, RegistrationErrors};
use crate::relations::{BaseEdge, RelationGraph};
use crate::variant::{TypeKey, Value, Variant, Wrapper, WrapperAdapter};
use crate::views::{Mapping, MappingAdapter, Sequence, SequenceAdapter};
use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;
use tracing::{debug, error};

/// Pending type descriptors, turned into a [`Registry`] by `freeze()`.
pub struct RegistryBuilder {
    types: Vec<TypeData>,
    by_key: HashMap<TypeId, usize>,
    by_name: HashMap<String, usize>,
    errors: RegistrationErrors,
    settings: Settings,
}

impl RegistryBuilder {
    /// A builder preloaded with the unit type, the arithmetic types, strings
    /// and vectors of those.
    pub fn new() -> Self {
        let mut builder = Self {
            types: Vec::new(),
            by_key: HashMap::new(),
            by_name: HashMap::new(),
            errors: RegistrationErrors::new(),
            settings: Settings::default(),
        };
        builder.register_builtins();
        builder
    }

    fn register_builtins(&mut self) {
        let mut unit = TypeData::new::<()>("()", TypeFlags::VOID | TypeFlags::EQUALITY);
        unit.eq = Some(eq_by::<()>);
        self.add_type(unit);

        self.arithmetic::<bool>("bool");
        self.arithmetic::<char>("char");
        self.arithmetic::<i8>("i8");
        self.arithmetic::<i16>("i16");
        self.arithmetic::<i32>("i32");
        self.arithmetic::<i64>("i64");
        self.arithmetic::<isize>("isize");
        self.arithmetic::<u8>("u8");
        self.arithmetic::<u16>("u16");
        self.arithmetic::<u32>("u32");
        self.arithmetic::<u64>("u64");
        self.arithmetic::<usize>("usize");
        self.arithmetic::<f32>("f32");
        self.arithmetic::<f64>("f64");

        self.builtin::<String>("String", TypeFlags::STRING);
        self.builtin::<&'static str>("&str", TypeFlags::STRING);
        self.sequential::<Vec<String>>("Vec<String>");
    }

    fn arithmetic<T: Value + Clone + Default + PartialOrd>(&mut self, name: &str) {
        self.builtin::<T>(name, TypeFlags::ARITHMETIC);
        self.sequential::<Vec<T>>(&format!("Vec<{}>", name));
    }

    fn builtin<T: Value + Default + PartialOrd>(&mut self, name: &str, flags: TypeFlags) {
        let mut data = TypeData::new::<T>(name, flags | TypeFlags::EQUALITY | TypeFlags::ORDERING);
        data.eq = Some(eq_by::<T>);
        data.cmp = Some(cmp_by::<T>);
        data.constructors.push(Constructor::new(function(T::default)));
        self.add_type(data);
    }

    pub(crate) fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Problems recorded so far.
    pub fn errors(&self) -> &RegistrationErrors {
        &self.errors
    }

    /// Number of types registered so far, builtins included.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    fn add_type(&mut self, data: TypeData) -> usize {
        let index = self.types.len();
        self.by_key.insert(data.key.id(), index);
        self.by_name.insert(data.name.clone(), index);
        self.types.push(data);
        index
    }

    /// The slot for `T` under `name`, created on first use.
    ///
    /// Registering the same type again under the same name reopens it; any
    /// other clash of type or name is a duplicate.
    fn slot<T: Value>(&mut self, name: &str, flags: TypeFlags) -> Option<usize> {
        let key = TypeKey::of::<T>();
        if let Some(&index) = self.by_key.get(&key.id()) {
            if let Some(data) = self.types.get_mut(index).filter(|d| d.name == name) {
                data.flags.insert(flags);
                return Some(index);
            }
        } else if !self.by_name.contains_key(name) {
            return Some(self.add_type(TypeData::new::<T>(name, flags)));
        }
        self.errors.add(RegistrationError::DuplicateType { name: name.to_string() });
        None
    }

    /// Register or reopen a class.
    pub fn class<T: Value>(&mut self, name: &str) -> ClassBuilder<'_, T> {
        let index = self.slot::<T>(name, TypeFlags::CLASS);
        ClassBuilder { builder: self, index, last: Member::Type, _marker: PhantomData }
    }

    /// Register an enumeration whose entries map to integers through `underlying`.
    pub fn enumeration<E: Value + PartialEq>(&mut self, name: &str, underlying: fn(&E) -> i64) -> EnumBuilder<'_, E> {
        let flags = TypeFlags::ENUM | TypeFlags::EQUALITY | TypeFlags::ORDERING;
        let index = self.slot::<E>(name, flags);
        if let Some(data) = index.and_then(|i| self.types.get_mut(i)) {
            data.eq = Some(eq_by::<E>);
            if data.enumeration.is_none() {
                data.enumeration = Some(EnumData {
                    entries: Vec::new(),
                    underlying: Box::new(move |value| value.downcast_ref::<E>().map(underlying)),
                });
            }
        }
        EnumBuilder { builder: self, index, underlying }
    }

    /// Register a sequential container.
    pub fn sequential<C: Sequence>(&mut self, name: &str) -> &mut Self {
        if let Some(data) = self.slot::<C>(name, TypeFlags::SEQUENTIAL).and_then(|i| self.types.get_mut(i)) {
            data.sequential = Some(Box::new(SequenceAdapter::<C>::new()));
        }
        self
    }

    /// Register an associative container. Sets are registered here too.
    pub fn associative<C: Mapping>(&mut self, name: &str) -> &mut Self {
        if let Some(data) = self.slot::<C>(name, TypeFlags::ASSOCIATIVE).and_then(|i| self.types.get_mut(i)) {
            data.associative = Some(Box::new(MappingAdapter::<C>::new()));
        }
        self
    }

    /// Register a wrapper such as `Box<T>`, `Arc<T>` or `Option<T>`.
    pub fn wrapper<W: Wrapper>(&mut self, name: &str) -> &mut Self {
        let mut flags = TypeFlags::WRAPPER;
        if W::IS_POINTER {
            flags.insert(TypeFlags::POINTER);
        }
        if let Some(data) = self.slot::<W>(name, flags).and_then(|i| self.types.get_mut(i)) {
            data.wrapper = Some(Box::new(WrapperAdapter::<W>::new()));
        }
        self
    }

    /// Resolve references between descriptors, validate the hierarchy and
    /// produce the frozen table.
    pub(crate) fn build(mut self) -> Result<Registry, RegistrationErrors> {
        let mut errors = std::mem::take(&mut self.errors);
        let by_key = &self.by_key;
        let resolve = |key: TypeKey| by_key.get(&key.id()).map_or(Type::invalid(), |&i| Type::from_index(i));

        for (index, data) in self.types.iter_mut().enumerate() {
            let ty = Type::from_index(index);
            for edge in &mut data.bases {
                edge.base = resolve(edge.key);
                if edge.base.index().is_none() {
                    errors.add(RegistrationError::UnregisteredType {
                        context: format!("base list of {}", data.name),
                        name: edge.key.rust_name().to_string(),
                    });
                }
            }
            if let Some(ops) = &data.wrapper {
                data.wrapped = resolve(ops.inner_key());
                note_unresolved(&data.name, "wrapped type", ops.inner_key(), data.wrapped);
            }
            for property in &mut data.properties {
                property.declaring = ty;
                property.value_type = resolve(property.value_key);
                note_unresolved(&data.name, &property.name, property.value_key, property.value_type);
            }
            for method in &mut data.methods {
                method.declaring = ty;
                resolve_callable(&data.name, &method.name, &mut method.callable, &resolve);
            }
            for ctor in &mut data.constructors {
                ctor.declaring = ty;
                resolve_callable(&data.name, "constructor", &mut ctor.callable, &resolve);
            }
        }

        let wrapped: Vec<Type> = self.types.iter().map(|d| d.wrapped).collect();
        for (index, data) in self.types.iter_mut().enumerate() {
            let mut raw = Type::from_index(index);
            for _ in 0..wrapped.len() {
                match raw.index().and_then(|i| wrapped.get(i)).copied() {
                    Some(next) if next.index().is_some() => raw = next,
                    _ => break,
                }
            }
            data.raw = raw;
        }

        let relations = match RelationGraph::build(&self.types) {
            Ok(relations) => Some(relations),
            Err(found) => {
                errors.extend(found);
                None
            }
        };
        let relations = match relations {
            Some(relations) if !errors.has_errors() => relations,
            _ => {
                for problem in errors.errors() {
                    error!(target: "rtreflect::registry", %problem, "registration error");
                }
                return Err(errors);
            }
        };

        let edges: Vec<(usize, Type)> = self
            .types
            .iter()
            .enumerate()
            .flat_map(|(index, data)| data.bases.iter().map(move |edge| (index, edge.base)))
            .collect();
        for (derived, base) in edges {
            if let Some(data) = base.index().and_then(|i| self.types.get_mut(i)) {
                data.derived.push(Type::from_index(derived));
            }
        }

        Ok(Registry::new(self.types, relations, self.settings))
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn function<M, F: IntoFunction<M>>(f: F) -> Callable {
    Callable::new(F::signature(), f.into_invoker())
}

fn resolve_callable(owner: &str, member: &str, callable: &mut Callable, resolve: &impl Fn(TypeKey) -> Type) {
    callable.ret = resolve(callable.ret_key);
    note_unresolved(owner, member, callable.ret_key, callable.ret);
    for param in &mut callable.params {
        param.ty = resolve(param.key);
        note_unresolved(owner, member, param.key, param.ty);
    }
}

fn note_unresolved(owner: &str, member: &str, key: TypeKey, resolved: Type) {
    if resolved.index().is_none() {
        debug!(
            target: "rtreflect::registry",
            ty = owner,
            member,
            referenced = key.rust_name(),
            "member refers to an unregistered type"
        );
    }
}

/// The member that follows-up calls such as `metadata` apply to.
#[derive(Debug, Clone, Copy)]
enum Member {
    Type,
    Property(usize),
    Method(usize),
    Constructor(usize),
}

/// Adds members, bases and capabilities to one class.
///
/// Annotation calls (`metadata`, `access`, `parameter_names`,
/// `default_arguments`) apply to the member registered just before them.
pub struct ClassBuilder<'r, T> {
    builder: &'r mut RegistryBuilder,
    index: Option<usize>,
    last: Member,
    _marker: PhantomData<fn() -> T>,
}

impl<'r, T: Value> ClassBuilder<'r, T> {
    fn data(&mut self) -> Option<&mut TypeData> {
        self.index.and_then(|i| self.builder.types.get_mut(i))
    }

    fn type_name(&self) -> String {
        self.index
            .and_then(|i| self.builder.types.get(i))
            .map_or_else(|| TypeKey::of::<T>().rust_name().to_string(), |d| d.name.clone())
    }

    fn fail(&mut self, error: RegistrationError) {
        self.builder.errors.add(error);
    }

    pub fn constructor<M, F: IntoFunction<M>>(mut self, f: F) -> Self {
        let signature = F::signature();
        if signature.ret != TypeKey::of::<T>() {
            let error = RegistrationError::ConstructorType {
                ty: self.type_name(),
                found: signature.ret.rust_name().to_string(),
            };
            self.fail(error);
            return self;
        }
        let ctor = Constructor::new(Callable::new(signature, f.into_invoker()));
        if let Some(data) = self.data() {
            data.constructors.push(ctor);
            let slot = data.constructors.len() - 1;
            self.last = Member::Constructor(slot);
        }
        self
    }

    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(T::default)
    }

    /// A stored field, reached through a pair of projections.
    pub fn property<V: Value>(self, name: &str, get: fn(&T) -> &V, get_mut: fn(&mut T) -> &mut V) -> Self {
        self.add_property(name, TypeKey::of::<V>(), Box::new(FieldAccess::new(get, get_mut)))
    }

    /// A computed, read-only property.
    pub fn property_readonly<V, G>(self, name: &str, get: G) -> Self
    where
        V: Value,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.add_property(name, TypeKey::of::<V>(), Box::new(GetterAccess::<T, V, G>::new(get)))
    }

    /// A property backed by getter and setter functions.
    pub fn property_with<V, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        V: Value,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.add_property(name, TypeKey::of::<V>(), Box::new(GetSetAccess::<T, V, G, S>::new(get, set)))
    }

    pub fn static_property<V, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        V: Value,
        G: Fn() -> V + Send + Sync + 'static,
        S: Fn(V) + Send + Sync + 'static,
    {
        self.add_property(name, TypeKey::of::<V>(), Box::new(StaticAccess::<V, G, S>::new(get, Some(set))))
    }

    pub fn static_property_readonly<V, G>(self, name: &str, get: G) -> Self
    where
        V: Value,
        G: Fn() -> V + Send + Sync + 'static,
    {
        self.add_property(name, TypeKey::of::<V>(), Box::new(StaticAccess::<V, G, fn(V)>::new(get, None)))
    }

    fn add_property(mut self, name: &str, key: TypeKey, accessor: Box<dyn PropertyAccess>) -> Self {
        let ty = self.type_name();
        let Some(data) = self.data() else { return self };
        if data.properties.iter().any(|p| p.name == name) {
            self.fail(RegistrationError::DuplicateProperty { ty, name: name.to_string() });
            return self;
        }
        data.properties.push(Property::new(name, key, accessor));
        let slot = data.properties.len() - 1;
        self.last = Member::Property(slot);
        self
    }

    /// A method taking `&self` or `&mut self` and up to six arguments.
    pub fn method<M, F: IntoMethod<T, M>>(self, name: &str, f: F) -> Self {
        self.add_method(name, Callable::new(F::signature(), f.into_invoker()))
    }

    /// A method with no receiver.
    pub fn static_method<M, F: IntoFunction<M>>(self, name: &str, f: F) -> Self {
        self.add_method(name, Callable::new(F::signature(), f.into_invoker()))
    }

    /// A method of any arity taking pre-bound erased arguments.
    ///
    /// `signature` lists the exact parameter keys; arguments are bound to
    /// them before `f` runs.
    pub fn method_variadic<F>(self, name: &str, signature: Signature, f: F) -> Self
    where
        F: Fn(Receiver<'_>, &[&dyn Value]) -> Option<Variant<'static>> + Send + Sync + 'static,
    {
        self.add_method(name, Callable::new(signature, Box::new(VariadicFn(f))))
    }

    fn add_method(mut self, name: &str, callable: Callable) -> Self {
        let ty = self.type_name();
        let Some(data) = self.data() else { return self };
        if data.methods.iter().any(|m| m.name == name && m.callable.same_parameters(&callable)) {
            self.fail(RegistrationError::DuplicateMethod { ty, name: name.to_string() });
            return self;
        }
        data.methods.push(Method::new(name, callable));
        let slot = data.methods.len() - 1;
        self.last = Member::Method(slot);
        self
    }

    /// Declare `B` as a base stored inside `T`.
    pub fn base<B: Value>(self, get: fn(&T) -> &B, get_mut: fn(&mut T) -> &mut B) -> Self {
        self.add_base(BaseEdge::field::<T, B>(get, get_mut))
    }

    /// Declare `B` as a shared base. Every shared edge to the same base
    /// denotes one subobject.
    pub fn virtual_base<B: Value>(self, get: fn(&T) -> &B) -> Self {
        self.add_base(BaseEdge::shared::<T, B>(get, None))
    }

    /// A shared base that can also be reached mutably when `get_mut` allows it.
    pub fn virtual_base_mut<B: Value>(self, get: fn(&T) -> &B, get_mut: fn(&mut T) -> Option<&mut B>) -> Self {
        self.add_base(BaseEdge::shared::<T, B>(get, Some(get_mut)))
    }

    fn add_base(mut self, edge: BaseEdge) -> Self {
        let ty = self.type_name();
        let Some(data) = self.data() else { return self };
        if data.bases.iter().any(|b| b.key == edge.key) {
            let base = edge.key.rust_name().to_string();
            self.fail(RegistrationError::DuplicateBase { ty, base });
            return self;
        }
        data.bases.push(edge);
        self
    }

    /// Use `PartialEq` for variant equality.
    pub fn comparable(mut self) -> Self
    where
        T: PartialEq,
    {
        if let Some(data) = self.data() {
            data.eq = Some(eq_by::<T>);
            data.flags.insert(TypeFlags::EQUALITY);
        }
        self
    }

    /// Use `PartialOrd` for variant ordering.
    pub fn ordered(mut self) -> Self
    where
        T: PartialOrd,
    {
        if let Some(data) = self.data() {
            data.cmp = Some(cmp_by::<T>);
            data.flags.insert(TypeFlags::ORDERING);
        }
        self
    }

    /// A direct conversion to `U`, tried before any builtin rule.
    pub fn conversion<U, F>(mut self, f: F) -> Self
    where
        U: Value,
        F: Fn(&T) -> Option<U> + Send + Sync + 'static,
    {
        let converter = Converter {
            target: TypeKey::of::<U>(),
            func: Box::new(move |value| {
                let converted = f(value.downcast_ref::<T>()?)?;
                Some(Box::new(converted) as Box<dyn Value>)
            }),
        };
        if let Some(data) = self.data() {
            data.converters.retain(|c| c.target != converter.target);
            data.converters.push(converter);
        }
        self
    }

    /// Attach metadata to the last registered member, or to the type.
    pub fn metadata<V: Value>(mut self, key: &str, value: V) -> Self {
        let last = self.last;
        let value = Variant::new(value).into_owned();
        let Some(data) = self.data() else { return self };
        let metadata = match last {
            Member::Type => Some(&mut data.metadata),
            Member::Property(i) => data.properties.get_mut(i).map(|p| &mut p.metadata),
            Member::Method(i) => data.methods.get_mut(i).map(|m| &mut m.metadata),
            Member::Constructor(i) => data.constructors.get_mut(i).map(|c| &mut c.metadata),
        };
        if let Some(metadata) = metadata {
            metadata.insert(key.to_string(), value);
        }
        self
    }

    /// Attach metadata to the type itself regardless of the last member.
    pub fn class_metadata<V: Value>(mut self, key: &str, value: V) -> Self {
        let value = Variant::new(value).into_owned();
        if let Some(data) = self.data() {
            data.metadata.insert(key.to_string(), value);
        }
        self
    }

    pub fn access(mut self, level: AccessLevel) -> Self {
        let last = self.last;
        if let Some(data) = self.data() {
            match last {
                Member::Type => {}
                Member::Property(i) => data.properties.get_mut(i).into_iter().for_each(|p| p.access = level),
                Member::Method(i) => data.methods.get_mut(i).into_iter().for_each(|m| m.access = level),
                Member::Constructor(i) => data.constructors.get_mut(i).into_iter().for_each(|c| c.access = level),
            }
        }
        self
    }

    fn last_callable(&mut self) -> Option<(String, &mut Callable)> {
        let last = self.last;
        let data = self.data()?;
        match last {
            Member::Method(i) => data.methods.get_mut(i).map(|m| (m.name.clone(), &mut m.callable)),
            Member::Constructor(i) => data.constructors.get_mut(i).map(|c| ("constructor".to_string(), &mut c.callable)),
            Member::Type | Member::Property(_) => None,
        }
    }

    /// Name the parameters of the last method or constructor.
    pub fn parameter_names(mut self, names: &[&str]) -> Self {
        if let Some((_, callable)) = self.last_callable() {
            for (param, name) in callable.params.iter_mut().zip(names) {
                param.name = Some(name.to_string());
            }
        }
        self
    }

    /// Defaults for the trailing parameters of the last method or constructor.
    ///
    /// Each default must have the exact parameter type.
    pub fn default_arguments(mut self, defaults: Vec<Variant<'static>>) -> Self {
        let ty = self.type_name();
        let mut problems = Vec::new();
        if let Some((member, callable)) = self.last_callable() {
            let count = callable.params.len();
            if defaults.len() > count {
                problems.push(RegistrationError::InvalidDefaultArgument { ty, member, index: count });
            } else {
                let first = count - defaults.len();
                for (offset, value) in defaults.into_iter().enumerate() {
                    let Some(param) = callable.params.get_mut(first + offset) else { continue };
                    if value.type_key() == Some(param.key) {
                        param.default = Some(value.into_owned());
                    } else {
                        problems.push(RegistrationError::InvalidDefaultArgument {
                            ty: ty.clone(),
                            member: member.clone(),
                            index: param.index,
                        });
                    }
                }
            }
        }
        self.builder.errors.extend(problems);
        self
    }
}

/// Adds entries to one enumeration.
pub struct EnumBuilder<'r, E> {
    builder: &'r mut RegistryBuilder,
    index: Option<usize>,
    underlying: fn(&E) -> i64,
}

impl<'r, E: Value + PartialEq> EnumBuilder<'r, E> {
    pub fn value(self, name: &str, value: E) -> Self {
        let underlying = (self.underlying)(&value);
        let Some(data) = self.index.and_then(|i| self.builder.types.get_mut(i)) else {
            return self;
        };
        let Some(table) = data.enumeration.as_mut() else { return self };
        if table.by_name(name).is_some() {
            let error = RegistrationError::DuplicateEnumEntry { ty: data.name.clone(), name: name.to_string() };
            self.builder.errors.add(error);
            return self;
        }
        table.entries.push(EnumEntry { name: name.to_string(), value: Variant::new(value), underlying });
        self
    }

    pub fn metadata<V: Value>(self, key: &str, value: V) -> Self {
        let value = Variant::new(value).into_owned();
        if let Some(data) = self.index.and_then(|i| self.builder.types.get_mut(i)) {
            data.metadata.insert(key.to_string(), value);
        }
        self
    }
}
