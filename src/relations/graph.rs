//! Base-edge graph validation and path precomputation.

use super::{BaseEdge, EdgeKind};
use crate::core::types::{Type, TypeData};
use crate::errors::RegistrationError;
use petgraph::algo::{all_simple_paths, is_cyclic_directed, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::warn;

/// One step of an upcast: follow base slot `slot` of `derived`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Hop {
    pub(crate) derived: Type,
    pub(crate) slot: usize,
}

type HopPath = SmallVec<[Hop; 4]>;

/// Two paths denote the same subobject when they enter the same virtual base
/// (or none) and continue through identical field hops from there.
#[derive(Debug, PartialEq, Eq)]
struct Subobject {
    anchor: Option<Type>,
    suffix: HopPath,
}

/// The frozen inheritance DAG with one precomputed path per (derived, ancestor) pair.
pub struct RelationGraph {
    graph: DiGraph<Type, Hop>,
    paths: HashMap<(Type, Type), HopPath>,
}

impl RelationGraph {
    /// Validate the base edges of `types` and precompute upcast paths.
    ///
    /// Node `i` of the graph is the type at index `i`.
    pub(crate) fn build(types: &[TypeData]) -> Result<Self, Vec<RegistrationError>> {
        let mut graph = DiGraph::with_capacity(types.len(), types.len());
        for index in 0..types.len() {
            graph.add_node(Type::from_index(index));
        }
        for (index, data) in types.iter().enumerate() {
            for (slot, edge) in data.bases.iter().enumerate() {
                if let Some(base) = edge.base.index() {
                    let hop = Hop { derived: Type::from_index(index), slot };
                    graph.add_edge(NodeIndex::new(index), NodeIndex::new(base), hop);
                }
            }
        }

        if is_cyclic_directed(&graph) {
            let errors = tarjan_scc(&graph)
                .into_iter()
                .filter(|scc| scc.len() > 1 || scc.iter().any(|n| graph.contains_edge(*n, *n)))
                .map(|scc| {
                    let mut chain: Vec<String> = scc.iter().map(|n| types[n.index()].name.clone()).collect();
                    if let Some(first) = chain.first().cloned() {
                        chain.push(first);
                    }
                    warn!(target: "rtreflect::relations", chain = %chain.join(" -> "), "cyclic hierarchy rejected");
                    RegistrationError::CyclicHierarchy { chain }
                })
                .collect();
            return Err(errors);
        }

        let mut paths = HashMap::new();
        let mut errors = Vec::new();
        for from in graph.node_indices() {
            let mut dfs = Dfs::new(&graph, from);
            while let Some(to) = dfs.next(&graph) {
                if to == from {
                    continue;
                }
                match Self::unique_path(&graph, types, from, to) {
                    Some(path) => {
                        paths.insert((graph[from], graph[to]), path);
                    }
                    None => {
                        let derived = types[from.index()].name.clone();
                        let base = types[to.index()].name.clone();
                        warn!(target: "rtreflect::relations", %derived, %base, "ambiguous base rejected");
                        errors.push(RegistrationError::AmbiguousBase { derived, base });
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(Self { graph, paths })
        } else {
            Err(errors)
        }
    }

    /// Shortest path from `from` to `to`, or `None` when the paths reach
    /// distinct subobjects.
    fn unique_path(
        graph: &DiGraph<Type, Hop>,
        types: &[TypeData],
        from: NodeIndex,
        to: NodeIndex,
    ) -> Option<HopPath> {
        let mut chosen: Option<(HopPath, Subobject)> = None;
        for nodes in all_simple_paths::<Vec<NodeIndex>, _>(graph, from, to, 0, None) {
            let hops: HopPath = nodes
                .windows(2)
                .filter_map(|pair| graph.find_edge(pair[0], pair[1]).map(|e| graph[e]))
                .collect();
            let subobject = subobject_of(&hops, types);
            if let Some((best, existing)) = chosen.as_mut() {
                if *existing != subobject {
                    return None;
                }
                if hops.len() < best.len() {
                    *best = hops;
                }
            } else {
                chosen = Some((hops, subobject));
            }
        }
        chosen.map(|(path, _)| path)
    }

    pub fn is_related(&self, from: Type, to: Type) -> bool {
        from == to || self.paths.contains_key(&(from, to))
    }

    pub(crate) fn path(&self, from: Type, to: Type) -> Option<&[Hop]> {
        self.paths.get(&(from, to)).map(|p| p.as_slice())
    }

    /// Every ancestor of `ty`, in no particular order.
    pub fn ancestors(&self, ty: Type) -> Vec<Type> {
        self.paths.keys().filter(|(from, _)| *from == ty).map(|(_, to)| *to).collect()
    }

    pub fn type_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

fn edge_at(types: &[TypeData], hop: Hop) -> Option<&BaseEdge> {
    types.get(hop.derived.index()?)?.bases.get(hop.slot)
}

fn subobject_of(hops: &[Hop], types: &[TypeData]) -> Subobject {
    let mut anchor = None;
    let mut suffix = HopPath::new();
    for hop in hops {
        match edge_at(types, *hop) {
            Some(edge) if edge.kind == EdgeKind::Virtual => {
                anchor = Some(edge.base);
                suffix.clear();
            }
            _ => suffix.push(*hop),
        }
    }
    Subobject { anchor, suffix }
}
