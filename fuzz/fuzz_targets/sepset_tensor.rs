#![no_main]

use cpdag_core::orient::orient;
use cpdag_core::sepset::SeparationSets;
use cpdag_core::skeleton::Skeleton;
use libfuzzer_sys::fuzz_target;

// Arbitrary skeleton/tensor pairs must either be rejected or orient
// without losing a skeleton edge.
fuzz_target!(|data: &[u8]| {
    let Ok((matrix, tensor)) =
        serde_json::from_slice::<(Vec<Vec<u8>>, Vec<Vec<Vec<i64>>>)>(data)
    else {
        return;
    };
    if matrix.len() > 32 {
        return;
    }
    let Ok(skeleton) = Skeleton::from_matrix(&matrix) else {
        return;
    };
    let Ok(sepsets) = SeparationSets::from_tensor(&skeleton, &tensor) else {
        return;
    };
    let Ok(outcome) = orient(&skeleton, &sepsets) else {
        return;
    };
    for (i, j) in skeleton.edges() {
        assert!(outcome.matrix.adjacent(i, j));
        assert!(outcome.graph.has_arc(i, j) || outcome.graph.has_arc(j, i));
    }
});
