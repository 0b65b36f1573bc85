//! Skeleton orientation: colliders, then Meek rules, then encoding.
//!
//! [`orient`] is the single entry point used by the dispatcher and the CLI.
//! The phases are public for callers that need to observe or stop
//! propagation ([`rules::propagate_with`]).

pub mod rules;
pub mod vstructure;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::encode::EdgeMarkMatrix;
use crate::error::Result;
use crate::graph::OrientedGraph;
use crate::graph::diagnostics::{GraphSummary, directed_cycles};
use crate::sepset::SeparationSets;
use crate::skeleton::Skeleton;

pub use rules::{MeekRule, Orientation, PassSummary, PropagationReport, propagate, propagate_with};
pub use vstructure::{ColliderConflict, VStructureReport, orient_v_structures};

/// Per-phase account of one orientation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrientationReport {
    pub vstructures: VStructureReport,
    pub propagation: PropagationReport,
    pub summary: GraphSummary,
}

/// Everything [`orient`] produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrientationOutcome {
    pub graph: OrientedGraph,
    pub matrix: EdgeMarkMatrix,
    pub report: OrientationReport,
    /// [`OrientedGraph::fingerprint`] of the final graph.
    pub fingerprint: String,
}

/// Orient `skeleton` using `sepsets` and encode the result.
///
/// # Errors
///
/// Any violation reported by [`SeparationSets::validate`]; the engine never
/// starts on inconsistent input.
#[instrument(skip_all, fields(nodes = skeleton.len(), edges = skeleton.edge_count()))]
pub fn orient(skeleton: &Skeleton, sepsets: &SeparationSets) -> Result<OrientationOutcome> {
    sepsets.validate(skeleton)?;

    let (mut graph, vstructures) = orient_v_structures(skeleton, sepsets)?;
    let propagation = propagate(&mut graph)?;

    let summary = GraphSummary::of(&graph);
    if summary.directed_cycles > 0 {
        warn!(
            cycles = ?directed_cycles(&graph),
            "oriented graph contains directed cycles; separation sets are inconsistent"
        );
    }

    let matrix = EdgeMarkMatrix::from_graph(&graph);
    let fingerprint = graph.fingerprint();
    info!(
        colliders = vstructures.colliders.len(),
        propagated = propagation.orientations.len(),
        passes = propagation.passes,
        directed = summary.directed,
        undirected = summary.undirected,
        %fingerprint,
        "orientation complete"
    );

    Ok(OrientationOutcome {
        graph,
        matrix,
        report: OrientationReport {
            vstructures,
            propagation,
            summary,
        },
        fingerprint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrientError;

    #[test]
    fn collider_then_rule_one() {
        // 0 → 2 ← 1 collider, then 2 - 3 becomes 2 → 3.
        let skeleton = Skeleton::from_edges(4, &[(0, 2), (1, 2), (2, 3)]).expect("valid");
        let mut sepsets = SeparationSets::new(4);
        sepsets.insert(0, 1, []);
        sepsets.insert(0, 3, [2]);
        sepsets.insert(1, 3, [2]);

        let outcome = orient(&skeleton, &sepsets).expect("orient");
        assert!(outcome.graph.is_directed(0, 2));
        assert!(outcome.graph.is_directed(1, 2));
        assert!(outcome.graph.is_directed(2, 3));
        assert_eq!(outcome.report.summary.undirected, 0);
        assert_eq!(outcome.report.vstructures.colliders, vec![(0, 2, 1)]);
        assert_eq!(outcome.matrix.get(2, 3), -1);
        assert_eq!(outcome.matrix.get(3, 2), 1);
        assert!(outcome.report.propagation.completed);
    }

    #[test]
    fn rejects_inconsistent_sepsets_before_orienting() {
        let skeleton = Skeleton::from_edges(3, &[(0, 1), (1, 2)]).expect("valid");
        let sepsets = SeparationSets::new(3);
        assert_eq!(
            orient(&skeleton, &sepsets).map(|outcome| outcome.matrix),
            Err(OrientError::MissingSepset { i: 0, j: 2 })
        );
    }

    #[test]
    fn fingerprint_matches_graph() {
        let skeleton = Skeleton::from_edges(2, &[(0, 1)]).expect("valid");
        let outcome = orient(&skeleton, &SeparationSets::new(2)).expect("orient");
        assert_eq!(outcome.fingerprint, outcome.graph.fingerprint());
        assert_eq!(outcome.matrix.to_rows(), vec![vec![0, -1], vec![-1, 0]]);
    }
}
