//! Partially oriented graph over a fixed skeleton.
//!
//! # Overview
//!
//! [`OrientedGraph`] is an arena of `n × n` arc-presence bits indexed by
//! `(source, target)`. Each skeleton edge `{i, j}` starts out as two arcs
//! (`i → j` and `j → i`, i.e. undirected). Orientation only ever removes
//! the reverse arc of a still-undirected edge, so:
//!
//! - no arc exists outside the skeleton;
//! - every skeleton edge keeps at least one arc.
//!
//! Both properties are enforced by [`OrientedGraph::try_orient`], the single
//! mutation entry point. It re-checks that the edge is bidirectional right
//! before committing, which is how conflicting orientations resolve to
//! "first writer wins".
//!
//! ## Pipeline
//!
//! ```text
//! Skeleton
//!    ↓  OrientedGraph::from_skeleton()   (all edges bidirectional)
//!    ↓  orient::vstructure               (colliders)
//!    ↓  orient::rules                    (Meek rules 1-3 to fixpoint)
//!    ↓  encode::EdgeMarkMatrix::from_graph()
//! ```

pub mod diagnostics;

use fixedbitset::FixedBitSet;

use crate::error::{OrientError, Result};
use crate::skeleton::Skeleton;

/// Outcome of a single [`OrientedGraph::try_orient`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The edge was undirected; the reverse arc has been removed.
    Applied,
    /// The edge already points the requested way.
    AlreadyOriented,
    /// The edge already points the other way; nothing changed.
    Conflict,
}

/// Arc-presence arena over a read-only skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrientedGraph {
    skeleton: Skeleton,
    arcs: FixedBitSet,
}

impl OrientedGraph {
    /// Start orientation: every skeleton edge becomes a pair of arcs.
    #[must_use]
    pub fn from_skeleton(skeleton: &Skeleton) -> Self {
        let n = skeleton.len();
        let mut arcs = FixedBitSet::with_capacity(n * n);
        for (i, j) in skeleton.edges() {
            arcs.insert(i * n + j);
            arcs.insert(j * n + i);
        }
        Self {
            skeleton: skeleton.clone(),
            arcs,
        }
    }

    /// Number of variables.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.skeleton.len()
    }

    /// Returns `true` when the graph has no variables.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.skeleton.is_empty()
    }

    /// The skeleton this graph orients.
    #[must_use]
    pub const fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Immutable copy used as the read side of a rule pass.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Whether the arc `from → to` is present.
    #[must_use]
    pub fn has_arc(&self, from: usize, to: usize) -> bool {
        let n = self.len();
        from < n && to < n && self.arcs.contains(from * n + to)
    }

    /// Whether `i` and `j` are adjacent in the (unchanging) skeleton.
    #[must_use]
    pub fn adjacent(&self, i: usize, j: usize) -> bool {
        self.skeleton.adjacent(i, j)
    }

    /// Both arcs present.
    #[must_use]
    pub fn is_undirected(&self, i: usize, j: usize) -> bool {
        self.has_arc(i, j) && self.has_arc(j, i)
    }

    /// Only `from → to` present.
    #[must_use]
    pub fn is_directed(&self, from: usize, to: usize) -> bool {
        self.has_arc(from, to) && !self.has_arc(to, from)
    }

    /// Total number of arcs.
    #[must_use]
    pub fn arc_count(&self) -> usize {
        self.arcs.count_ones(..)
    }

    /// Number of edges still carrying both arcs.
    #[must_use]
    pub fn undirected_count(&self) -> usize {
        self.skeleton
            .edges()
            .filter(|&(i, j)| self.is_undirected(i, j))
            .count()
    }

    /// Number of edges carrying a single arc.
    #[must_use]
    pub fn directed_count(&self) -> usize {
        self.skeleton.edge_count() - self.undirected_count()
    }

    /// All arcs sorted by `target * n + source`.
    #[must_use]
    pub fn arcs_column_major(&self) -> Vec<(usize, usize)> {
        let n = self.len();
        let mut arcs = Vec::with_capacity(self.arc_count());
        for target in 0..n {
            for source in 0..n {
                if self.has_arc(source, target) {
                    arcs.push((source, target));
                }
            }
        }
        arcs
    }

    /// Targets of arcs leaving `v`, ascending.
    pub fn successors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(move |&u| self.has_arc(v, u))
    }

    /// Sources of arcs entering `v`, ascending.
    pub fn predecessors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(move |&u| self.has_arc(u, v))
    }

    /// Vertices joined to `v` by an undirected edge, ascending.
    pub fn undirected_neighbors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(move |&u| self.is_undirected(v, u))
    }

    /// Vertices `u` with `u → v` oriented, ascending.
    pub fn directed_parents(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(move |&u| self.is_directed(u, v))
    }

    /// Orient `from → to` if, and only if, the edge is still undirected.
    ///
    /// This is the re-check-then-commit step: the bidirectional test and the
    /// removal of `to → from` happen together, so a candidate computed from
    /// an older snapshot can never flip or delete an edge.
    ///
    /// # Errors
    ///
    /// Returns [`OrientError::EdgeNotInSkeleton`] when `{from, to}` is not a
    /// skeleton edge.
    pub fn try_orient(&mut self, from: usize, to: usize) -> Result<Commit> {
        if !self.adjacent(from, to) {
            return Err(OrientError::EdgeNotInSkeleton { from, to });
        }
        if self.is_undirected(from, to) {
            let n = self.len();
            self.arcs.set(to * n + from, false);
            Ok(Commit::Applied)
        } else if self.has_arc(from, to) {
            Ok(Commit::AlreadyOriented)
        } else {
            Ok(Commit::Conflict)
        }
    }

    /// BLAKE3 content hash of the arc set, formatted `blake3:<hex>`.
    ///
    /// Two graphs over the same number of variables hash equal iff their
    /// arc sets are equal.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.len() as u64).to_le_bytes());
        for (source, target) in self.arcs_column_major() {
            hasher.update(&(source as u64).to_le_bytes());
            hasher.update(&(target as u64).to_le_bytes());
        }
        format!("blake3:{}", hasher.finalize())
    }
}
