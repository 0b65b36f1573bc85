use std::collections::BTreeSet;
use std::ops::ControlFlow;

use cpdag_core::encode::EdgeMarkMatrix;
use cpdag_core::graph::diagnostics::{colliders, directed_cycles};
use cpdag_core::orient::{orient, propagate, propagate_with};
use proptest::prelude::*;

use generators::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn orientation_is_deterministic(case in arb_case(8)) {
        let first = orient(&case.skeleton, &case.sepsets).expect("valid case");
        let second = orient(&case.skeleton, &case.sepsets).expect("valid case");
        prop_assert_eq!(&first.matrix, &second.matrix);
        prop_assert_eq!(first.fingerprint, second.fingerprint);
        prop_assert_eq!(first.report, second.report);
    }

    #[test]
    fn skeleton_is_preserved(case in arb_case(8)) {
        let outcome = orient(&case.skeleton, &case.sepsets).expect("valid case");
        let n = case.skeleton.len();
        for i in 0..n {
            for j in 0..n {
                prop_assert_eq!(outcome.matrix.adjacent(i, j), case.skeleton.adjacent(i, j));
                if case.skeleton.adjacent(i, j) {
                    prop_assert!(outcome.graph.has_arc(i, j) || outcome.graph.has_arc(j, i));
                }
            }
        }
    }

    #[test]
    fn fixpoint_is_idempotent(case in arb_case(8)) {
        let outcome = orient(&case.skeleton, &case.sepsets).expect("valid case");
        let mut graph = outcome.graph.clone();
        let again = propagate(&mut graph).expect("propagate");
        prop_assert!(again.orientations.is_empty());
        prop_assert_eq!(graph, outcome.graph);
    }

    #[test]
    fn encoding_round_trips(case in arb_case(8)) {
        let outcome = orient(&case.skeleton, &case.sepsets).expect("valid case");
        let decoded = outcome.matrix.to_oriented_graph().expect("decode");
        prop_assert_eq!(&decoded, &outcome.graph);

        let rows = outcome.matrix.to_rows();
        prop_assert_eq!(EdgeMarkMatrix::from_rows(&rows).expect("valid rows"), outcome.matrix);
    }

    #[test]
    fn stopping_between_passes_then_resuming_reaches_same_fixpoint(case in arb_case(8)) {
        let outcome = orient(&case.skeleton, &case.sepsets).expect("valid case");

        let (mut graph, _) = cpdag_core::orient::orient_v_structures(&case.skeleton, &case.sepsets)
            .expect("valid case");
        propagate_with(&mut graph, |_| ControlFlow::Break(())).expect("first pass");
        propagate(&mut graph).expect("resume");
        prop_assert_eq!(graph, outcome.graph);
    }

    #[test]
    fn dag_sepsets_recover_dag_orientations(case in arb_dag_case(8)) {
        let dag = case.dag.clone().expect("dag case");
        let outcome = orient(&case.skeleton, &case.sepsets).expect("valid case");
        let graph = &outcome.graph;

        for &(from, to) in &dag {
            prop_assert!(
                !graph.is_directed(to, from),
                "edge {} -> {} oriented against the generating DAG",
                from,
                to
            );
        }
        prop_assert!(directed_cycles(graph).is_empty());
        prop_assert!(outcome.report.vstructures.conflicts.is_empty());
        prop_assert_eq!(outcome.report.propagation.suppressed, 0);
    }

    #[test]
    fn dag_sepsets_create_no_new_colliders(case in arb_dag_case(8)) {
        let dag = case.dag.clone().expect("dag case");
        let outcome = orient(&case.skeleton, &case.sepsets).expect("valid case");

        let mut expected = BTreeSet::new();
        for &(a, c) in &dag {
            for &(b, c2) in &dag {
                if c == c2 && a < b && !case.skeleton.adjacent(a, b) {
                    expected.insert((a, c, b));
                }
            }
        }
        let found: BTreeSet<_> = colliders(&outcome.graph).into_iter().collect();
        prop_assert_eq!(found, expected);
    }
}
