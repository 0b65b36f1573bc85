//! Separation-set store.
//!
//! For every unordered pair `{i, j}` that is not adjacent in the skeleton the
//! store holds the conditioning set that rendered the pair independent. A
//! pair carries at most one set: the first one recorded wins, matching the
//! way a PC-style skeleton search stops testing a pair once it has been
//! separated. Lookup is symmetric.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{OrientError, Result};
use crate::oracle::CiRecord;
use crate::skeleton::Skeleton;

/// Padding value used by the dense tensor form.
pub const TENSOR_SENTINEL: i64 = -1;

/// Symmetric map from unordered variable pairs to conditioning sets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeparationSets {
    n: usize,
    sets: BTreeMap<(usize, usize), Vec<usize>>,
}

impl SeparationSets {
    /// Empty store for `n` variables.
    #[must_use]
    pub const fn new(n: usize) -> Self {
        Self {
            n,
            sets: BTreeMap::new(),
        }
    }

    /// Record `set` as the separation set of `{i, j}`.
    ///
    /// Returns `false`, leaving the store untouched, when the pair already
    /// has a set. Members are stored sorted and deduplicated; range checks
    /// happen in [`SeparationSets::validate`].
    pub fn insert(&mut self, i: usize, j: usize, set: impl IntoIterator<Item = usize>) -> bool {
        let key = pair_key(i, j);
        if self.sets.contains_key(&key) {
            return false;
        }
        let mut members: Vec<usize> = set.into_iter().collect();
        members.sort_unstable();
        members.dedup();
        self.sets.insert(key, members);
        true
    }

    /// Separation set of `{i, j}`, if one was recorded.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<&[usize]> {
        self.sets.get(&pair_key(i, j)).map(Vec::as_slice)
    }

    /// Whether `v` belongs to the separation set of `{i, j}`.
    ///
    /// # Errors
    ///
    /// Returns [`OrientError::MissingSepset`] when the pair has no set.
    pub fn separates_with(&self, i: usize, j: usize, v: usize) -> Result<bool> {
        let (lo, hi) = pair_key(i, j);
        self.get(lo, hi)
            .map(|set| set.binary_search(&v).is_ok())
            .ok_or(OrientError::MissingSepset { i: lo, j: hi })
    }

    /// Number of variables the store was built for.
    #[must_use]
    pub const fn variable_count(&self) -> usize {
        self.n
    }

    /// Number of recorded pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Returns `true` when no pair has a set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Recorded pairs `(i, j, set)` with `i < j`, ascending.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, &[usize])> + '_ {
        self.sets.iter().map(|(&(i, j), set)| (i, j, set.as_slice()))
    }

    /// Build the store from the dense `n × n × k_max` tensor form.
    ///
    /// Entries equal to [`TENSOR_SENTINEL`] are padding. For each
    /// non-adjacent pair `i < j` the separation set is the union of rows
    /// `[i][j]` and `[j][i]`, so a vertex recorded under either orientation
    /// counts as a member. Rows of adjacent pairs must be empty.
    ///
    /// # Errors
    ///
    /// Returns [`OrientError::MalformedSkeleton`] when the tensor shape does
    /// not match the skeleton, [`OrientError::InvalidSepsetMember`] for
    /// negative non-sentinel or out-of-range members, and
    /// [`OrientError::SepsetOnAdjacentPair`] for populated rows of adjacent
    /// pairs.
    pub fn from_tensor(skeleton: &Skeleton, tensor: &[Vec<Vec<i64>>]) -> Result<Self> {
        let n = skeleton.len();
        if tensor.len() != n || tensor.iter().any(|plane| plane.len() != n) {
            return Err(OrientError::MalformedSkeleton {
                reason: format!("separation-set tensor is not {n} x {n} x k"),
            });
        }

        let mut store = Self::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                let forward = tensor_row(&tensor[i][j], i, j, n)?;
                let backward = tensor_row(&tensor[j][i], i, j, n)?;

                if skeleton.adjacent(i, j) {
                    if !forward.is_empty() || !backward.is_empty() {
                        return Err(OrientError::SepsetOnAdjacentPair { i, j });
                    }
                    continue;
                }

                if !forward.is_empty() && !backward.is_empty() && forward != backward {
                    debug!(i, j, ?forward, ?backward, "asymmetric separation-set rows merged");
                }
                store.insert(i, j, forward.into_iter().chain(backward));
            }
        }

        debug!(pairs = store.len(), "separation sets loaded from tensor");
        Ok(store)
    }

    /// Build the store from a skeleton-search test log.
    ///
    /// Records are consumed in order; the first record that treats a pair as
    /// independent (see [`crate::oracle::CiOutcome::treats_as_independent`])
    /// supplies its conditioning set. Dependent records are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`OrientError::IndependenceOnAdjacentPair`] when the log
    /// separates a pair the skeleton keeps adjacent, and
    /// [`OrientError::InvalidSepsetMember`] for endpoints out of range.
    pub fn from_records<I>(skeleton: &Skeleton, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = CiRecord>,
    {
        let n = skeleton.len();
        let mut store = Self::new(n);
        for record in records {
            let (i, j) = pair_key(record.x, record.y);
            if j >= n || i == j {
                return Err(OrientError::InvalidSepsetMember {
                    i,
                    j,
                    member: to_member(j),
                });
            }
            if !record.outcome.treats_as_independent() {
                continue;
            }
            if skeleton.adjacent(i, j) {
                return Err(OrientError::IndependenceOnAdjacentPair { i, j });
            }
            if !store.insert(i, j, record.conditioning) {
                debug!(i, j, "pair already separated; later record ignored");
            }
        }
        Ok(store)
    }

    /// Check the store against the skeleton it is paired with.
    ///
    /// # Errors
    ///
    /// - [`OrientError::MalformedSkeleton`] when the variable counts differ.
    /// - [`OrientError::MissingSepset`] for a non-adjacent pair without a set.
    /// - [`OrientError::SepsetOnAdjacentPair`] for an adjacent pair with a set.
    /// - [`OrientError::InvalidSepsetMember`] for out-of-range members, a
    ///   member equal to one of the pair's endpoints, or a pair whose
    ///   endpoints coincide.
    pub fn validate(&self, skeleton: &Skeleton) -> Result<()> {
        let n = skeleton.len();
        if self.n != n {
            return Err(OrientError::MalformedSkeleton {
                reason: format!(
                    "separation sets cover {} variables, skeleton has {n}",
                    self.n
                ),
            });
        }

        for i in 0..n {
            for j in (i + 1)..n {
                match (skeleton.adjacent(i, j), self.get(i, j)) {
                    (true, Some(_)) => return Err(OrientError::SepsetOnAdjacentPair { i, j }),
                    (false, None) => return Err(OrientError::MissingSepset { i, j }),
                    (false, Some(set)) => {
                        if let Some(&bad) = set.iter().find(|&&v| v >= n || v == i || v == j) {
                            return Err(OrientError::InvalidSepsetMember {
                                i,
                                j,
                                member: to_member(bad),
                            });
                        }
                    }
                    (true, None) => {}
                }
            }
        }

        // Self pairs and keys outside [0, n) cannot be reached by the scan above.
        if let Some((&(i, j), _)) = self.sets.iter().find(|((i, j), _)| i == j || *j >= n) {
            return Err(OrientError::InvalidSepsetMember {
                i,
                j,
                member: to_member(j),
            });
        }

        Ok(())
    }
}

const fn pair_key(i: usize, j: usize) -> (usize, usize) {
    if i <= j { (i, j) } else { (j, i) }
}

fn to_member(v: usize) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn tensor_row(row: &[i64], i: usize, j: usize, n: usize) -> Result<Vec<usize>> {
    row.iter()
        .copied()
        .filter(|&v| v != TENSOR_SENTINEL)
        .map(|v| {
            usize::try_from(v)
                .ok()
                .filter(|&u| u < n)
                .ok_or(OrientError::InvalidSepsetMember { i, j, member: v })
        })
        .collect()
}
