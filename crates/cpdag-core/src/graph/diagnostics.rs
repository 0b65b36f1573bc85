//! Post-orientation diagnostics.
//!
//! Exposes helpers used by the pipeline and the CLI report:
//! - [`colliders`] for v-structure listings
//! - [`directed_cycles`] for sanity checks on the directed part
//! - [`GraphSummary`] for one-line summaries

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use super::OrientedGraph;

/// Counts describing an oriented graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    /// Number of variables.
    pub nodes: usize,
    /// Number of skeleton edges.
    pub edges: usize,
    /// Edges with a single arc.
    pub directed: usize,
    /// Edges with both arcs.
    pub undirected: usize,
    /// Unshielded colliders `a → c ← b`.
    pub colliders: usize,
    /// Strongly connected components (size > 1) of the directed part.
    pub directed_cycles: usize,
}

impl GraphSummary {
    /// Summarize `graph`.
    #[must_use]
    pub fn of(graph: &OrientedGraph) -> Self {
        let undirected = graph.undirected_count();
        let edges = graph.skeleton().edge_count();
        Self {
            nodes: graph.len(),
            edges,
            directed: edges - undirected,
            undirected,
            colliders: colliders(graph).len(),
            directed_cycles: directed_cycles(graph).len(),
        }
    }
}

/// Export the directed-only arcs as a petgraph graph.
///
/// Node weights are variable indices; node `i` has `NodeIndex::new(i)`.
/// Undirected edges are omitted.
#[must_use]
pub fn to_petgraph(graph: &OrientedGraph) -> DiGraph<usize, ()> {
    let mut out = DiGraph::<usize, ()>::with_capacity(graph.len(), graph.directed_count());
    for v in 0..graph.len() {
        out.add_node(v);
    }
    for (source, target) in graph.arcs_column_major() {
        if graph.is_directed(source, target) {
            out.add_edge(NodeIndex::new(source), NodeIndex::new(target), ());
        }
    }
    out
}

/// Unshielded colliders `(a, c, b)` meaning `a → c ← b` with `a < b` and
/// `a`, `b` non-adjacent. Sorted ascending.
#[must_use]
pub fn colliders(graph: &OrientedGraph) -> Vec<(usize, usize, usize)> {
    let mut found = Vec::new();
    for c in 0..graph.len() {
        let parents: Vec<usize> = graph.directed_parents(c).collect();
        for (idx, &a) in parents.iter().enumerate() {
            for &b in &parents[idx + 1..] {
                if !graph.adjacent(a, b) {
                    found.push((a, c, b));
                }
            }
        }
    }
    found.sort_unstable();
    found
}

/// Strongly connected components of the directed part with more than one
/// member, each sorted ascending, the list sorted ascending.
///
/// Empty for every output of consistent separation sets.
#[must_use]
pub fn directed_cycles(graph: &OrientedGraph) -> Vec<Vec<usize>> {
    let directed = to_petgraph(graph);
    let mut cycles: Vec<Vec<usize>> = tarjan_scc(&directed)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| {
            let mut members: Vec<usize> = component.into_iter().map(NodeIndex::index).collect();
            members.sort_unstable();
            members
        })
        .collect();
    cycles.sort_unstable();
    cycles
}
