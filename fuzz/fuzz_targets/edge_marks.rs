#![no_main]

use cpdag_core::encode::EdgeMarkMatrix;
use libfuzzer_sys::fuzz_target;

// Any matrix that decodes must re-encode to itself.
fuzz_target!(|data: &[u8]| {
    let Ok(rows) = serde_json::from_slice::<Vec<Vec<i8>>>(data) else {
        return;
    };
    let Ok(matrix) = EdgeMarkMatrix::from_rows(&rows) else {
        return;
    };
    let graph = matrix.to_oriented_graph().expect("validated matrix decodes");
    assert_eq!(EdgeMarkMatrix::from_graph(&graph), matrix);
});
