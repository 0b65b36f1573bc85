//! Undirected adjacency skeleton over variable indices.
//!
//! The skeleton is produced once by an external search procedure and is a
//! read-only input to orientation. Adjacency is stored as an `n × n` bit
//! matrix; construction enforces symmetry and the absence of self loops so
//! every later stage can rely on `adjacent(i, j) == adjacent(j, i)`.

use fixedbitset::FixedBitSet;

use crate::error::{OrientError, Result};

/// Symmetric boolean adjacency relation over `n` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    n: usize,
    bits: FixedBitSet,
}

impl Skeleton {
    /// Create a skeleton with `n` variables and no edges.
    #[must_use]
    pub fn empty(n: usize) -> Self {
        Self {
            n,
            bits: FixedBitSet::with_capacity(n * n),
        }
    }

    /// Build a skeleton from an `n × n` 0/1 matrix.
    ///
    /// # Errors
    ///
    /// Returns [`OrientError::MalformedSkeleton`] when the matrix is not
    /// square, contains values other than 0 and 1, has a non-zero diagonal
    /// or is not symmetric.
    pub fn from_matrix(rows: &[Vec<u8>]) -> Result<Self> {
        let n = rows.len();
        let mut skeleton = Self::empty(n);

        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(malformed(format!(
                    "row {i} has {} entries, expected {n}",
                    row.len()
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                match value {
                    0 => {}
                    1 if i == j => {
                        return Err(malformed(format!("self loop on variable {i}")));
                    }
                    1 => skeleton.bits.insert(i * n + j),
                    other => {
                        return Err(malformed(format!(
                            "entry ({i}, {j}) is {other}, expected 0 or 1"
                        )));
                    }
                }
            }
        }

        for i in 0..n {
            for j in (i + 1)..n {
                if skeleton.adjacent(i, j) != skeleton.adjacent(j, i) {
                    return Err(malformed(format!("entries ({i}, {j}) and ({j}, {i}) disagree")));
                }
            }
        }

        Ok(skeleton)
    }

    /// Build a skeleton from an undirected edge list.
    ///
    /// Duplicate edges (in either orientation) collapse to one.
    ///
    /// # Errors
    ///
    /// Returns [`OrientError::MalformedSkeleton`] for self loops or endpoints
    /// outside `[0, n)`.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Result<Self> {
        let mut skeleton = Self::empty(n);
        for &(i, j) in edges {
            if i >= n || j >= n {
                return Err(malformed(format!("edge ({i}, {j}) out of range for {n} variables")));
            }
            if i == j {
                return Err(malformed(format!("self loop on variable {i}")));
            }
            skeleton.bits.insert(i * n + j);
            skeleton.bits.insert(j * n + i);
        }
        Ok(skeleton)
    }

    /// Number of variables.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.n
    }

    /// Returns `true` when the skeleton has no variables.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Whether `i` and `j` are adjacent. Out-of-range indices are never adjacent.
    #[must_use]
    pub fn adjacent(&self, i: usize, j: usize) -> bool {
        i < self.n && j < self.n && self.bits.contains(i * self.n + j)
    }

    /// Neighbors of `v` in ascending index order.
    pub fn neighbors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.n).filter(move |&u| self.adjacent(v, u))
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.bits.count_ones(..) / 2
    }

    /// Undirected edges as `(i, j)` with `i < j`, ascending.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.n).flat_map(move |i| {
            ((i + 1)..self.n)
                .filter(move |&j| self.adjacent(i, j))
                .map(move |j| (i, j))
        })
    }

    /// All unshielded triples `(v1, v2, v3)` in ascending `v1`, `v2`, `v3` order.
    ///
    /// Both `(a, b, c)` and `(c, b, a)` are produced for every unshielded
    /// pair of neighbors `a`, `c` of `b`.
    #[must_use]
    pub fn unshielded_triples(&self) -> Vec<(usize, usize, usize)> {
        let mut triples = Vec::new();
        for v1 in 0..self.n {
            for v2 in self.neighbors(v1) {
                for v3 in self.neighbors(v2) {
                    if v3 != v1 && !self.adjacent(v1, v3) {
                        triples.push((v1, v2, v3));
                    }
                }
            }
        }
        triples
    }

    /// Dense 0/1 matrix view, the inverse of [`Skeleton::from_matrix`].
    #[must_use]
    pub fn to_matrix(&self) -> Vec<Vec<u8>> {
        (0..self.n)
            .map(|i| (0..self.n).map(|j| u8::from(self.adjacent(i, j))).collect())
            .collect()
    }
}

fn malformed(reason: String) -> OrientError {
    OrientError::MalformedSkeleton { reason }
}
