//! End-to-end orientation scenarios on small hand-built inputs.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cpdag_core::backend::{
    Availability, BackendOutput, CausalBackend, Dataset, DiscoveryParams, Dispatcher,
    IndependenceTest,
};
use cpdag_core::config::DiscoveryConfig;
use cpdag_core::error::{ErrorKind, OrientError};
use cpdag_core::oracle::{CiOutcome, CiRecord};
use cpdag_core::orient::{MeekRule, orient};
use cpdag_core::sepset::{SeparationSets, TENSOR_SENTINEL};
use cpdag_core::skeleton::Skeleton;

const A: usize = 0;
const B: usize = 1;
const C: usize = 2;
const D: usize = 3;

fn chain_skeleton() -> Skeleton {
    Skeleton::from_matrix(&[vec![0, 1, 0], vec![1, 0, 1], vec![0, 1, 0]]).expect("valid matrix")
}

#[test]
fn empty_sepset_orients_collider_into_middle() {
    let mut sepsets = SeparationSets::new(3);
    sepsets.insert(0, 2, []);

    let outcome = orient(&chain_skeleton(), &sepsets).expect("orient");
    let m = &outcome.matrix;
    // Arrowheads at X2 on both edges.
    assert_eq!((m.get(0, 1), m.get(1, 0)), (-1, 1));
    assert_eq!((m.get(2, 1), m.get(1, 2)), (-1, 1));
    assert_eq!(m.to_rows(), vec![vec![0, -1, 0], vec![1, 0, 1], vec![0, -1, 0]]);
}

#[test]
fn middle_vertex_in_sepset_leaves_chain_undirected() {
    let mut sepsets = SeparationSets::new(3);
    sepsets.insert(0, 2, [1]);

    let outcome = orient(&chain_skeleton(), &sepsets).expect("orient");
    assert_eq!(
        outcome.matrix.to_rows(),
        vec![vec![0, -1, 0], vec![-1, 0, -1], vec![0, -1, 0]]
    );
    assert_eq!(outcome.report.summary.undirected, 2);
}

#[test]
fn rule_one_propagates_past_collider() {
    // D → B ← A collider; B - C with A, D non-adjacent to C.
    let skeleton = Skeleton::from_edges(4, &[(A, B), (D, B), (B, C)]).expect("valid");
    let mut sepsets = SeparationSets::new(4);
    sepsets.insert(A, D, []);
    sepsets.insert(A, C, [B]);
    sepsets.insert(C, D, [B]);

    let outcome = orient(&skeleton, &sepsets).expect("orient");
    assert!(outcome.graph.is_directed(A, B));
    assert!(outcome.graph.is_directed(B, C));
    assert_eq!((outcome.matrix.get(B, C), outcome.matrix.get(C, B)), (-1, 1));
    assert!(
        outcome
            .report
            .propagation
            .orientations
            .iter()
            .any(|o| o.rule == MeekRule::AvoidCollider && (o.from, o.to) == (B, C))
    );
}

#[test]
fn rule_two_closes_directed_path() {
    // D → C ← A collider, D ⟂ B given C gives C → B, then A → C → B with
    // A - B yields A → B.
    let skeleton = Skeleton::from_edges(4, &[(A, B), (A, C), (B, C), (C, D)]).expect("valid");
    let mut sepsets = SeparationSets::new(4);
    sepsets.insert(A, D, []);
    sepsets.insert(B, D, [C]);

    let outcome = orient(&skeleton, &sepsets).expect("orient");
    assert!(outcome.graph.is_directed(A, C));
    assert!(outcome.graph.is_directed(C, B));
    assert!(outcome.graph.is_directed(A, B));
    assert!(
        outcome
            .report
            .propagation
            .orientations
            .iter()
            .any(|o| o.rule == MeekRule::AvoidCycle && (o.from, o.to) == (A, B))
    );
    assert_eq!(outcome.report.summary.directed_cycles, 0);
}

struct CountingBackend {
    calls: Arc<AtomicUsize>,
}

impl CausalBackend for CountingBackend {
    fn test(&self) -> IndependenceTest {
        IndependenceTest::FisherZ
    }

    fn name(&self) -> &str {
        "counting"
    }

    fn probe(&self) -> Availability {
        Availability::Ready
    }

    fn discover(
        &self,
        _data: &Dataset,
        _params: &DiscoveryParams,
    ) -> cpdag_core::Result<BackendOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(BackendOutput::Skeleton {
            skeleton: Skeleton::empty(2),
            sepsets: {
                let mut sepsets = SeparationSets::new(2);
                sepsets.insert(0, 1, []);
                sepsets
            },
        })
    }
}

#[test]
fn kernel_identifier_is_rejected_before_any_work() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register(Box::new(CountingBackend {
            calls: Arc::clone(&calls),
        }))
        .expect("register");
    let data = Dataset::from_rows(&[vec![1.0, 2.0], vec![2.0, 1.0]]).expect("rectangular");

    let err = dispatcher
        .dispatch("kci", &data, &DiscoveryConfig::default())
        .expect_err("kci is unsupported");
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(matches!(err, OrientError::UnsupportedTest { .. }));
    let message = err.to_string();
    for id in ["fisherz", "chisq", "cmiknn"] {
        assert!(message.contains(id), "{message} should name {id}");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let ok = dispatcher
        .dispatch("fisherz", &data, &DiscoveryConfig::default())
        .expect("fisherz dispatches");
    assert_eq!(ok.matrix.to_rows(), vec![vec![0, 0], vec![0, 0]]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn tensor_and_record_inputs_agree() {
    let s = TENSOR_SENTINEL;
    let mut tensor = vec![vec![vec![s, s]; 3]; 3];
    tensor[0][2] = vec![s, s];
    let from_tensor = SeparationSets::from_tensor(&chain_skeleton(), &tensor).expect("tensor");

    let records = vec![
        CiRecord::new(0, 1, vec![], CiOutcome::Dependent),
        CiRecord::new(0, 2, vec![], CiOutcome::Inconclusive).with_p_value(0.2),
        CiRecord::new(1, 2, vec![], CiOutcome::Dependent),
    ];
    let from_records = SeparationSets::from_records(&chain_skeleton(), records).expect("records");

    assert_eq!(from_tensor, from_records);
    let a = orient(&chain_skeleton(), &from_tensor).expect("orient");
    let b = orient(&chain_skeleton(), &from_records).expect("orient");
    assert_eq!(a.matrix, b.matrix);
    assert_eq!(a.report.vstructures.colliders, vec![(0, 1, 2)]);
}

#[test]
fn tensor_middle_vertex_in_reverse_row_blocks_collider() {
    // 0 - 1 - 2 plus isolated 3; [0][2] names 3, [2][0] names the middle vertex.
    let skeleton = Skeleton::from_edges(4, &[(0, 1), (1, 2)]).expect("valid");
    let s = TENSOR_SENTINEL;
    let mut tensor = vec![vec![vec![s]; 4]; 4];
    tensor[0][2] = vec![3];
    tensor[2][0] = vec![1];

    let sepsets = SeparationSets::from_tensor(&skeleton, &tensor).expect("tensor");
    let outcome = orient(&skeleton, &sepsets).expect("orient");
    assert!(outcome.report.vstructures.colliders.is_empty());
    assert_eq!(
        outcome.matrix.to_rows(),
        vec![
            vec![0, -1, 0, 0],
            vec![-1, 0, -1, 0],
            vec![0, -1, 0, 0],
            vec![0, 0, 0, 0],
        ]
    );
}
