//! Polymorphic relationship resolver.
//!
//! Base relationships are recorded as edges whose adjuster is a projection
//! from the derived value to its base subobject. At freeze the edge set is
//! validated as a DAG and every (derived, ancestor) pair gets one
//! precomputed hop path, so resolution is a table lookup followed by a
//! handful of projections.
//!
//! Downcasts and cross-casts never walk edges backwards: an
//! [`Instance`](crate::Instance) keeps its most-derived origin and re-projects
//! from there.

mod graph;


pub use graph::RelationGraph;
pub(crate) use graph::Hop;

use crate::core::registry::Registry;
use crate::core::types::Type;
use crate::variant::{TypeKey, Value};
use tracing::trace;

/// How a base subobject is located inside its derived value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// The base is stored inline; its location is a constant offset.
    Field,
    /// The base is shared and located at runtime (for example behind an `Arc`).
    /// All virtual edges to the same base denote one subobject.
    Virtual,
}

/// Erased adjuster of a base edge.
pub(crate) trait Projection: Send + Sync {
    fn project<'a>(&self, derived: &'a dyn Value) -> Option<&'a dyn Value>;
    fn project_mut<'a>(&self, derived: &'a mut dyn Value) -> Option<&'a mut dyn Value>;
}

pub(crate) struct FieldProjection<D, B> {
    get: fn(&D) -> &B,
    get_mut: fn(&mut D) -> &mut B,
}

impl<D, B> FieldProjection<D, B> {
    pub(crate) fn new(get: fn(&D) -> &B, get_mut: fn(&mut D) -> &mut B) -> Self {
        Self { get, get_mut }
    }
}

impl<D: Value, B: Value> Projection for FieldProjection<D, B> {
    fn project<'a>(&self, derived: &'a dyn Value) -> Option<&'a dyn Value> {
        let derived = derived.downcast_ref::<D>()?;
        Some((self.get)(derived) as &dyn Value)
    }

    fn project_mut<'a>(&self, derived: &'a mut dyn Value) -> Option<&'a mut dyn Value> {
        let derived = derived.downcast_mut::<D>()?;
        Some((self.get_mut)(derived) as &mut dyn Value)
    }
}

/// Virtual bases may refuse mutable access, e.g. when shared through an `Arc`
/// that is not uniquely owned.
pub(crate) struct VirtualProjection<D, B> {
    get: fn(&D) -> &B,
    get_mut: Option<fn(&mut D) -> Option<&mut B>>,
}

impl<D, B> VirtualProjection<D, B> {
    pub(crate) fn new(get: fn(&D) -> &B, get_mut: Option<fn(&mut D) -> Option<&mut B>>) -> Self {
        Self { get, get_mut }
    }
}

impl<D: Value, B: Value> Projection for VirtualProjection<D, B> {
    fn project<'a>(&self, derived: &'a dyn Value) -> Option<&'a dyn Value> {
        let derived = derived.downcast_ref::<D>()?;
        Some((self.get)(derived) as &dyn Value)
    }

    fn project_mut<'a>(&self, derived: &'a mut dyn Value) -> Option<&'a mut dyn Value> {
        let get_mut = self.get_mut?;
        let derived = derived.downcast_mut::<D>()?;
        get_mut(derived).map(|base| base as &mut dyn Value)
    }
}

/// One entry of a type's ordered base list.
pub(crate) struct BaseEdge {
    pub(crate) key: TypeKey,
    pub(crate) base: Type,
    pub(crate) kind: EdgeKind,
    pub(crate) projection: Box<dyn Projection>,
}

impl BaseEdge {
    pub(crate) fn field<D: Value, B: Value>(get: fn(&D) -> &B, get_mut: fn(&mut D) -> &mut B) -> Self {
        Self {
            key: TypeKey::of::<B>(),
            base: Type::invalid(),
            kind: EdgeKind::Field,
            projection: Box::new(FieldProjection::new(get, get_mut)),
        }
    }

    pub(crate) fn shared<D: Value, B: Value>(
        get: fn(&D) -> &B,
        get_mut: Option<fn(&mut D) -> Option<&mut B>>,
    ) -> Self {
        Self {
            key: TypeKey::of::<B>(),
            base: Type::invalid(),
            kind: EdgeKind::Virtual,
            projection: Box::new(VirtualProjection::new(get, get_mut)),
        }
    }
}

impl Registry {
    /// True when `from` equals `to` or has `to` as an ancestor.
    pub fn is_related(&self, from: Type, to: Type) -> bool {
        from.index().is_some() && self.relations.is_related(from, to)
    }

    fn edge(&self, hop: Hop) -> Option<&BaseEdge> {
        self.data(hop.derived)?.bases.get(hop.slot)
    }

    /// View `object` as its ancestor `to`.
    ///
    /// Returns `None` when the dynamic type of `object` does not derive from `to`.
    pub fn upcast<'a>(&self, object: &'a dyn Value, to: Type) -> Option<&'a dyn Value> {
        let target = self.data(to)?;
        if object.type_key() == target.key {
            return Some(object);
        }
        let from = self.type_of_key(object.type_key());
        let path = self.relations.path(from, to)?;
        trace!(target: "rtreflect::relations", from = %from, to = %to, hops = path.len(), "upcast");
        let mut current = object;
        for hop in path {
            current = self.edge(*hop)?.projection.project(current)?;
        }
        Some(current)
    }

    /// Mutable [`Registry::upcast`]. Virtual hops without mutable access yield `None`.
    pub fn upcast_mut<'a>(&self, object: &'a mut dyn Value, to: Type) -> Option<&'a mut dyn Value> {
        let target = self.data(to)?;
        if object.type_key() == target.key {
            return Some(object);
        }
        let from = self.type_of_key(object.type_key());
        let path = self.relations.path(from, to)?;
        let mut current = object;
        for hop in path {
            current = self.edge(*hop)?.projection.project_mut(current)?;
        }
        Some(current)
    }
}
