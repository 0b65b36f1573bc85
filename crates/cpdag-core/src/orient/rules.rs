//! Meek rule propagation to a fixpoint.
//!
//! # Algorithm
//!
//! A *pass* runs Rule 1, Rule 2 and Rule 3 in that order. Each rule:
//!
//! 1. takes an immutable snapshot of the pass buffer (so it sees what the
//!    earlier rules of the same pass committed);
//! 2. evaluates its candidates against the snapshot only, visiting arcs in
//!    column-major order (`target * n + source`) and neighbors ascending;
//! 3. commits the candidates one by one through
//!    [`OrientedGraph::try_orient`], which re-checks that the edge is still
//!    undirected. A candidate whose edge was oriented meanwhile is
//!    suppressed: first writer wins.
//!
//! The pass buffer replaces the caller's graph only when the pass is
//! complete, so an observer that stops the run between passes always sees a
//! consistent state. The loop ends after the first pass that applies
//! nothing; it terminates because every application removes one arc.
//!
//! # Rules
//!
//! ```text
//! Rule 1   v1 → v2 - v3, v1 ⟂ v3         ⇒  v2 → v3
//! Rule 2   v1 → v3 → v2, v1 - v2         ⇒  v1 → v2
//! Rule 3   v1 - v3 → v2 ← v4 - v1,
//!          v1 - v2, v3 ⟂ v4               ⇒  v1 → v2
//! ```
//! (`⟂` = non-adjacent.)

use std::fmt;
use std::ops::ControlFlow;

use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::error::Result;
use crate::graph::{Commit, OrientedGraph};

/// The three orientation-propagation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeekRule {
    /// Rule 1: do not create a new collider.
    AvoidCollider,
    /// Rule 2: do not create a directed cycle.
    AvoidCycle,
    /// Rule 3: two non-adjacent parents reachable through undirected edges.
    Diamond,
}

impl MeekRule {
    /// Rules in application order within a pass.
    pub const ALL: [Self; 3] = [Self::AvoidCollider, Self::AvoidCycle, Self::Diamond];

    /// Conventional rule number (1-3).
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::AvoidCollider => 1,
            Self::AvoidCycle => 2,
            Self::Diamond => 3,
        }
    }

    /// Candidate orientations `(from, to)` this rule would apply to `graph`.
    #[must_use]
    pub fn candidates(self, graph: &OrientedGraph) -> Vec<(usize, usize)> {
        match self {
            Self::AvoidCollider => avoid_collider_candidates(graph),
            Self::AvoidCycle => avoid_cycle_candidates(graph),
            Self::Diamond => diamond_candidates(graph),
        }
    }
}

impl fmt::Display for MeekRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.number())
    }
}

/// One committed orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Orientation {
    pub rule: MeekRule,
    pub from: usize,
    pub to: usize,
    /// 1-based pass number.
    pub pass: usize,
}

/// State after one full pass, handed to the observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub pass: usize,
    /// Orientations committed in this pass.
    pub applied: usize,
    /// Candidates dropped because their edge was oriented the other way.
    pub suppressed: usize,
    /// [`OrientedGraph::fingerprint`] after the pass.
    pub fingerprint: String,
}

/// What the propagation run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropagationReport {
    /// Passes executed, including the final no-change pass.
    pub passes: usize,
    pub orientations: Vec<Orientation>,
    pub suppressed: usize,
    /// `false` when the observer stopped the run before the fixpoint.
    pub completed: bool,
}

/// Apply Meek rules 1-3 until no rule fires.
///
/// # Errors
///
/// Returns [`crate::error::OrientError::EdgeNotInSkeleton`] if a rule ever
/// targets a pair outside the skeleton, which indicates a corrupted graph.
pub fn propagate(graph: &mut OrientedGraph) -> Result<PropagationReport> {
    propagate_with(graph, |_| ControlFlow::Continue(()))
}

/// [`propagate`] with an observer called after every full pass.
///
/// Returning [`ControlFlow::Break`] stops the run after the pass that was
/// just reported; the graph then holds that pass's complete result and the
/// report has `completed == false`.
///
/// # Errors
///
/// See [`propagate`].
#[instrument(skip_all, fields(nodes = graph.len(), arcs = graph.arc_count()))]
pub fn propagate_with<F>(graph: &mut OrientedGraph, mut observer: F) -> Result<PropagationReport>
where
    F: FnMut(&PassSummary) -> ControlFlow<()>,
{
    let mut report = PropagationReport::default();

    loop {
        let pass = report.passes + 1;
        let mut next = graph.snapshot();
        let mut applied = 0;
        let mut suppressed = 0;

        for rule in MeekRule::ALL {
            let snapshot = next.snapshot();
            for (from, to) in rule.candidates(&snapshot) {
                match next.try_orient(from, to)? {
                    Commit::Applied => {
                        trace!(%rule, from, to, pass, "orientation applied");
                        report.orientations.push(Orientation {
                            rule,
                            from,
                            to,
                            pass,
                        });
                        applied += 1;
                    }
                    Commit::AlreadyOriented => {}
                    Commit::Conflict => {
                        trace!(%rule, from, to, pass, "orientation suppressed");
                        suppressed += 1;
                    }
                }
            }
        }

        *graph = next;
        report.passes = pass;
        report.suppressed += suppressed;

        let summary = PassSummary {
            pass,
            applied,
            suppressed,
            fingerprint: graph.fingerprint(),
        };
        debug!(
            pass,
            applied,
            suppressed,
            fingerprint = %summary.fingerprint,
            "propagation pass complete"
        );

        let flow = observer(&summary);
        if applied == 0 {
            report.completed = true;
            break;
        }
        if flow.is_break() {
            debug!(pass, "propagation stopped by observer");
            break;
        }
    }

    Ok(report)
}

/// Rule 1: `v1 → v2`, `v2 - v3`, `v1` and `v3` non-adjacent ⇒ `v2 → v3`.
fn avoid_collider_candidates(graph: &OrientedGraph) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for (v1, v2) in graph.arcs_column_major() {
        if graph.has_arc(v2, v1) {
            continue;
        }
        for v3 in graph.successors(v2) {
            if v3 != v1 && graph.has_arc(v3, v2) && !graph.adjacent(v1, v3) {
                out.push((v2, v3));
            }
        }
    }
    out
}

/// Rule 2: `v1 → v3 → v2` and `v1 - v2` ⇒ `v1 → v2`.
fn avoid_cycle_candidates(graph: &OrientedGraph) -> Vec<(usize, usize)> {
    graph
        .arcs_column_major()
        .into_iter()
        .filter(|&(v1, v2)| graph.has_arc(v2, v1))
        .filter(|&(v1, v2)| {
            graph
                .successors(v1)
                .any(|v3| graph.is_directed(v1, v3) && graph.is_directed(v3, v2))
        })
        .collect()
}

/// Rule 3: `v1 - v2`; among the undirected neighbors of `v1` that are
/// oriented parents of `v2`, some pair is non-adjacent ⇒ `v1 → v2`.
fn diamond_candidates(graph: &OrientedGraph) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for (v1, v2) in graph.arcs_column_major() {
        if !graph.has_arc(v2, v1) {
            continue;
        }
        let common: Vec<usize> = graph
            .undirected_neighbors(v1)
            .filter(|&v3| graph.is_directed(v3, v2))
            .collect();
        let has_open_pair = common.iter().enumerate().any(|(idx, &v3)| {
            common[idx + 1..]
                .iter()
                .any(|&v4| !graph.adjacent(v3, v4))
        });
        if has_open_pair {
            out.push((v1, v2));
        }
    }
    out
}
