//! Collider (v-structure) orientation.
//!
//! # Algorithm
//!
//! For every unshielded triple `v1 - v2 - v3` (ascending `v1`, `v2`, `v3`)
//! whose middle vertex is *not* in `sepset(v1, v3)`, orient
//! `v1 → v2 ← v3` by removing the arcs `v2 → v1` and `v2 → v3`. Triples
//! with `v2` in the separation set are left alone for rule propagation.
//!
//! # Conflicts
//!
//! Inconsistent separation sets can ask for `v1 → v2` after an earlier
//! collider already fixed `v2 → v1`. Removing `v2 → v1` then would delete
//! the edge, so the removal is skipped and recorded as a conflict.

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::graph::{Commit, OrientedGraph};
use crate::sepset::SeparationSets;
use crate::skeleton::Skeleton;

/// One arc that could not be oriented into a collider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColliderConflict {
    /// The unshielded triple that requested the collider.
    pub triple: (usize, usize, usize),
    /// Requested arc `from → to`; the edge already points `to → from`.
    pub from: usize,
    pub to: usize,
}

/// What the collider phase did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VStructureReport {
    /// Triples `(v1, v2, v3)` oriented as `v1 → v2 ← v3`, in processing order.
    pub colliders: Vec<(usize, usize, usize)>,
    /// Arcs skipped because the edge was already oriented the other way.
    pub conflicts: Vec<ColliderConflict>,
}

/// Build the initial oriented graph and mark every collider.
///
/// The separation sets must already be validated against `skeleton`.
///
/// # Errors
///
/// Returns [`crate::error::OrientError::MissingSepset`] when an unshielded
/// pair has no separation set.
pub fn orient_v_structures(
    skeleton: &Skeleton,
    sepsets: &SeparationSets,
) -> Result<(OrientedGraph, VStructureReport)> {
    let mut graph = OrientedGraph::from_skeleton(skeleton);
    let mut report = VStructureReport::default();

    for (v1, v2, v3) in skeleton.unshielded_triples() {
        if sepsets.separates_with(v1, v3, v2)? {
            trace!(v1, v2, v3, "middle vertex separates; triple left unoriented");
            continue;
        }

        let mut oriented = false;
        for (tail, head) in [(v1, v2), (v3, v2)] {
            match graph.try_orient(tail, head)? {
                Commit::Applied => oriented = true,
                Commit::AlreadyOriented => {}
                Commit::Conflict => {
                    warn!(v1, v2, v3, tail, head, "collider conflicts with an earlier orientation");
                    report.conflicts.push(ColliderConflict {
                        triple: (v1, v2, v3),
                        from: tail,
                        to: head,
                    });
                }
            }
        }
        if oriented {
            report.colliders.push((v1, v2, v3));
        }
    }

    debug!(
        colliders = report.colliders.len(),
        conflicts = report.conflicts.len(),
        "v-structure phase complete"
    );
    Ok((graph, report))
}
