//! Edge-mark matrix encoding of an oriented graph.
//!
//! # Encoding
//!
//! | arcs present     | `m[i][j]` | `m[j][i]` |
//! |------------------|-----------|-----------|
//! | none             | `0`       | `0`       |
//! | `i → j`, `j → i` | `-1`      | `-1`      |
//! | `i → j` only     | `-1`      | `1`       |
//!
//! `-1` is a tail mark at the row vertex, `1` an arrowhead at the row
//! vertex. This is the widely used PDAG text convention that downstream
//! evaluation compares bit for bit; decoding is exact.

use serde::{Deserialize, Serialize};

use crate::error::{OrientError, Result};
use crate::graph::OrientedGraph;
use crate::skeleton::Skeleton;

/// No edge.
pub const NO_EDGE: i8 = 0;
/// Tail mark.
pub const TAIL: i8 = -1;
/// Arrowhead mark.
pub const ARROW: i8 = 1;

/// `n × n` edge-mark matrix, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<i8>>", try_from = "Vec<Vec<i8>>")]
pub struct EdgeMarkMatrix {
    n: usize,
    marks: Vec<i8>,
}

impl EdgeMarkMatrix {
    /// Encode `graph`.
    #[must_use]
    pub fn from_graph(graph: &OrientedGraph) -> Self {
        let n = graph.len();
        let mut marks = vec![NO_EDGE; n * n];
        for (i, j) in graph.skeleton().edges() {
            let (ij, ji) = match (graph.has_arc(i, j), graph.has_arc(j, i)) {
                (true, false) => (TAIL, ARROW),
                (false, true) => (ARROW, TAIL),
                _ => (TAIL, TAIL),
            };
            marks[i * n + j] = ij;
            marks[j * n + i] = ji;
        }
        Self { n, marks }
    }

    /// Validate and wrap nested rows.
    ///
    /// # Errors
    ///
    /// Returns [`OrientError::MalformedEdgeMarks`] when the matrix is not
    /// square, holds values outside `{-1, 0, 1}`, has a non-zero diagonal,
    /// or pairs entries inconsistently (anything other than `0/0`,
    /// `-1/-1`, `-1/1`, `1/-1`).
    pub fn from_rows(rows: &[Vec<i8>]) -> Result<Self> {
        let n = rows.len();
        let mut marks = Vec::with_capacity(n * n);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(malformed(format!("row {i} has {} entries, expected {n}", row.len())));
            }
            marks.extend_from_slice(row);
        }

        let matrix = Self { n, marks };
        for i in 0..n {
            if matrix.get(i, i) != NO_EDGE {
                return Err(malformed(format!("diagonal entry ({i}, {i}) is not 0")));
            }
            for j in (i + 1)..n {
                match (matrix.get(i, j), matrix.get(j, i)) {
                    (NO_EDGE, NO_EDGE) | (TAIL, TAIL) | (TAIL, ARROW) | (ARROW, TAIL) => {}
                    (a, b) => {
                        return Err(malformed(format!(
                            "entries ({i}, {j}) = {a} and ({j}, {i}) = {b} do not form an edge mark"
                        )));
                    }
                }
            }
        }
        Ok(matrix)
    }

    /// Number of variables.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.n
    }

    /// Returns `true` for the `0 × 0` matrix.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Mark at row `i`, column `j`.
    ///
    /// # Panics
    ///
    /// Panics when `i` or `j` is out of range.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> i8 {
        assert!(i < self.n && j < self.n, "index ({i}, {j}) out of range");
        self.marks[i * self.n + j]
    }

    /// Whether `i` and `j` share an edge of any kind.
    #[must_use]
    pub fn adjacent(&self, i: usize, j: usize) -> bool {
        i < self.n && j < self.n && self.marks[i * self.n + j] != NO_EDGE
    }

    /// Whether the edge `i → j` is oriented (arrowhead at `j`).
    #[must_use]
    pub fn is_directed(&self, i: usize, j: usize) -> bool {
        i < self.n && j < self.n && self.marks[j * self.n + i] == ARROW
    }

    /// Nested row view.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<i8>> {
        if self.n == 0 {
            return Vec::new();
        }
        self.marks.chunks(self.n).map(<[i8]>::to_vec).collect()
    }

    /// Decode back into arc form.
    ///
    /// # Errors
    ///
    /// Infallible for matrices built by this module; kept fallible because
    /// decoding goes through [`OrientedGraph::try_orient`].
    pub fn to_oriented_graph(&self) -> Result<OrientedGraph> {
        let n = self.n;
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if self.adjacent(i, j) {
                    edges.push((i, j));
                }
            }
        }
        let skeleton = Skeleton::from_edges(n, &edges)?;
        let mut graph = OrientedGraph::from_skeleton(&skeleton);
        for (i, j) in edges {
            if self.is_directed(i, j) {
                graph.try_orient(i, j)?;
            } else if self.is_directed(j, i) {
                graph.try_orient(j, i)?;
            }
        }
        Ok(graph)
    }
}

impl From<EdgeMarkMatrix> for Vec<Vec<i8>> {
    fn from(matrix: EdgeMarkMatrix) -> Self {
        matrix.to_rows()
    }
}

impl TryFrom<Vec<Vec<i8>>> for EdgeMarkMatrix {
    type Error = OrientError;

    fn try_from(rows: Vec<Vec<i8>>) -> Result<Self> {
        Self::from_rows(&rows)
    }
}

fn malformed(reason: String) -> OrientError {
    OrientError::MalformedEdgeMarks { reason }
}
