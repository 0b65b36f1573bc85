//! Independence-test backends and the data they consume.
//!
//! A backend turns a [`Dataset`] into either a skeleton with separation sets
//! (which the orientation pipeline then orients) or a finished edge-mark
//! matrix. Each backend is bound to one [`IndependenceTest`] and reports its
//! own availability through [`CausalBackend::probe`], so callers can refuse
//! a run before any computation starts.
//!
//! # Acceleration policy
//!
//! | test        | identifier | accelerated | CPU fallback      |
//! |-------------|------------|-------------|-------------------|
//! | Fisher-Z    | `fisherz`  | yes         | allowed           |
//! | chi-square  | `chisq`    | yes         | allowed           |
//! | kernel CI   | `kci`      | not shipped | never (rejected)  |
//! | CMI-kNN     | `cmiknn`   | yes         | never (GPU-only)  |

pub mod dispatch;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::encode::EdgeMarkMatrix;
use crate::error::{OrientError, Result};
use crate::sepset::SeparationSets;
use crate::skeleton::Skeleton;

pub use dispatch::{BackendStatus, DiscoveryResult, Dispatcher, Plan};

/// Identifiers accepted by [`IndependenceTest::parse_supported`], as shown
/// in error messages.
pub const SUPPORTED_TEST_LIST: &str = "fisherz, chisq, cmiknn";

// ---------------------------------------------------------------------------
// Independence tests
// ---------------------------------------------------------------------------

/// Closed set of conditional-independence tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndependenceTest {
    /// Partial-correlation test for continuous data.
    FisherZ,
    /// Chi-square test for discrete data.
    ChiSquare,
    /// Kernel-based test. Recognized, never dispatched.
    KernelCi,
    /// k-nearest-neighbor conditional mutual information.
    CmiKnn,
}

/// Whether a test may run on a CPU implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// An explicitly registered CPU fallback may be used.
    CpuAllowed,
    /// Accelerated only; a failed probe is fatal.
    GpuOnly,
}

impl IndependenceTest {
    /// Every test, in listing order.
    pub const ALL: [Self; 4] = [Self::FisherZ, Self::ChiSquare, Self::KernelCi, Self::CmiKnn];

    /// Tests that can be dispatched.
    pub const SUPPORTED: [Self; 3] = [Self::FisherZ, Self::ChiSquare, Self::CmiKnn];

    /// Short identifier used in configuration files.
    #[must_use]
    pub const fn identifier(self) -> &'static str {
        match self {
            Self::FisherZ => "fisherz",
            Self::ChiSquare => "chisq",
            Self::KernelCi => "kci",
            Self::CmiKnn => "cmiknn",
        }
    }

    /// Descriptive name, also accepted when parsing.
    #[must_use]
    pub const fn long_name(self) -> &'static str {
        match self {
            Self::FisherZ => "parametric-correlation",
            Self::ChiSquare => "discrete-chi-square",
            Self::KernelCi => "kernel-ci-gpu",
            Self::CmiKnn => "knn-cmi-gpu",
        }
    }

    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::KernelCi)
    }

    #[must_use]
    pub const fn fallback_policy(self) -> FallbackPolicy {
        match self {
            Self::FisherZ | Self::ChiSquare => FallbackPolicy::CpuAllowed,
            Self::KernelCi | Self::CmiKnn => FallbackPolicy::GpuOnly,
        }
    }

    /// Whether the kernel bandwidth parameter applies.
    #[must_use]
    pub const fn uses_bandwidth(self) -> bool {
        matches!(self, Self::KernelCi)
    }

    /// Parse and require the test to be dispatchable.
    ///
    /// # Errors
    ///
    /// [`OrientError::UnknownTest`] for unrecognized identifiers and
    /// [`OrientError::UnsupportedTest`] for recognized tests that cannot be
    /// dispatched. Both messages list the supported identifiers.
    pub fn parse_supported(raw: &str) -> Result<Self> {
        let test: Self = raw.parse()?;
        if test.is_supported() {
            Ok(test)
        } else {
            Err(OrientError::UnsupportedTest {
                given: raw.trim().to_string(),
            })
        }
    }
}

impl fmt::Display for IndependenceTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for IndependenceTest {
    type Err = OrientError;

    fn from_str(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|test| normalized == test.identifier() || normalized == test.long_name())
            .ok_or_else(|| OrientError::UnknownTest {
                given: raw.trim().to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Backend inputs
// ---------------------------------------------------------------------------

/// Row-major `n_samples × n_vars` observation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    n_samples: usize,
    n_vars: usize,
    values: Vec<f64>,
}

impl Dataset {
    /// Build from sample rows.
    ///
    /// # Errors
    ///
    /// [`OrientError::InvalidDataset`] for no rows, zero-width rows, or
    /// rows of differing length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(OrientError::InvalidDataset {
                reason: "no samples".to_string(),
            });
        };
        let n_vars = first.len();
        if n_vars == 0 {
            return Err(OrientError::InvalidDataset {
                reason: "samples have no variables".to_string(),
            });
        }
        let mut values = Vec::with_capacity(rows.len() * n_vars);
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != n_vars {
                return Err(OrientError::InvalidDataset {
                    reason: format!("sample {idx} has {} values, expected {n_vars}", row.len()),
                });
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            n_samples: rows.len(),
            n_vars,
            values,
        })
    }

    #[must_use]
    pub const fn n_samples(&self) -> usize {
        self.n_samples
    }

    #[must_use]
    pub const fn n_vars(&self) -> usize {
        self.n_vars
    }

    /// Values of one sample.
    #[must_use]
    pub fn sample(&self, idx: usize) -> Option<&[f64]> {
        let start = idx.checked_mul(self.n_vars)?;
        let end = start.checked_add(self.n_vars)?;
        self.values.get(start..end)
    }

    /// Values of one variable across all samples.
    pub fn column(&self, var: usize) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .skip(var)
            .step_by(self.n_vars)
            .copied()
            .take(if var < self.n_vars { self.n_samples } else { 0 })
    }
}

/// Validated parameters handed to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiscoveryParams {
    /// Significance level, in `(0, 1)`.
    pub alpha: f64,
    /// Maximum conditioning-set size.
    pub depth: usize,
    /// Kernel bandwidth, finite and positive.
    pub gamma: f64,
}

impl DiscoveryParams {
    /// Sentinel depth meaning "condition on up to all other variables".
    pub const ALL_VARIABLES: i64 = -1;

    /// Validate raw parameters for a dataset of `n_vars` variables.
    ///
    /// A depth of `-1` resolves to `n_vars - 2`, the largest conditioning set
    /// a pair can have; larger depths are clamped to it.
    ///
    /// # Errors
    ///
    /// [`OrientError::InvalidAlpha`], [`OrientError::InvalidDepth`] or
    /// [`OrientError::InvalidBandwidth`].
    pub fn resolve(alpha: f64, depth: i64, gamma: f64, n_vars: usize) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(OrientError::InvalidAlpha { alpha });
        }
        if !(gamma.is_finite() && gamma > 0.0) {
            return Err(OrientError::InvalidBandwidth { gamma });
        }
        let max_depth = n_vars.saturating_sub(2);
        let depth = match depth {
            Self::ALL_VARIABLES => max_depth,
            d if d < 0 => return Err(OrientError::InvalidDepth { depth: d }),
            d => usize::try_from(d).map_or(max_depth, |d| d.min(max_depth)),
        };
        Ok(Self { alpha, depth, gamma })
    }
}

// ---------------------------------------------------------------------------
// Backend contract
// ---------------------------------------------------------------------------

/// Result of [`CausalBackend::probe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Availability {
    Ready,
    Unavailable { reason: String },
}

impl Availability {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// What a backend produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOutput {
    /// Skeleton search only; the dispatcher runs orientation.
    Skeleton {
        skeleton: Skeleton,
        sepsets: SeparationSets,
    },
    /// The backend oriented the graph itself.
    Oriented(EdgeMarkMatrix),
}

/// One implementation of one independence test.
pub trait CausalBackend: Send + Sync {
    /// The test this backend implements.
    fn test(&self) -> IndependenceTest;

    /// Human-readable backend name used in logs and errors.
    fn name(&self) -> &str;

    /// Cheap readiness check. Must not run any discovery work.
    fn probe(&self) -> Availability;

    /// Run skeleton discovery (and possibly orientation) on `data`.
    ///
    /// # Errors
    ///
    /// Backend-specific failures, reported as [`OrientError`].
    fn discover(&self, data: &Dataset, params: &DiscoveryParams) -> Result<BackendOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parses_identifiers_and_long_names() {
        assert_eq!("fisherz".parse(), Ok(IndependenceTest::FisherZ));
        assert_eq!(" ChiSq ".parse(), Ok(IndependenceTest::ChiSquare));
        assert_eq!("knn-cmi-gpu".parse(), Ok(IndependenceTest::CmiKnn));
        assert_eq!("kernel-ci-gpu".parse(), Ok(IndependenceTest::KernelCi));
        assert!(matches!(
            "pearson".parse::<IndependenceTest>(),
            Err(OrientError::UnknownTest { .. })
        ));
    }

    #[test]
    fn kernel_test_is_recognized_but_unsupported() {
        let err = IndependenceTest::parse_supported("kci").expect_err("unsupported");
        assert_eq!(
            err,
            OrientError::UnsupportedTest {
                given: "kci".to_string()
            }
        );
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(
            IndependenceTest::parse_supported("cmiknn"),
            Ok(IndependenceTest::CmiKnn)
        );
    }

    #[test]
    fn supported_list_matches_constant() {
        let ids: Vec<&str> = IndependenceTest::SUPPORTED
            .iter()
            .map(|test| test.identifier())
            .collect();
        assert_eq!(ids.join(", "), SUPPORTED_TEST_LIST);
        assert!(IndependenceTest::SUPPORTED.iter().all(|t| t.is_supported()));
    }

    #[test]
    fn gpu_only_tests() {
        assert_eq!(IndependenceTest::CmiKnn.fallback_policy(), FallbackPolicy::GpuOnly);
        assert_eq!(IndependenceTest::KernelCi.fallback_policy(), FallbackPolicy::GpuOnly);
        assert_eq!(IndependenceTest::FisherZ.fallback_policy(), FallbackPolicy::CpuAllowed);
    }

    #[test]
    fn dataset_rejects_ragged_rows() {
        assert!(matches!(
            Dataset::from_rows(&[vec![1.0, 2.0], vec![3.0]]),
            Err(OrientError::InvalidDataset { .. })
        ));
        assert!(Dataset::from_rows(&[]).is_err());
        assert!(Dataset::from_rows(&[vec![]]).is_err());
    }

    #[test]
    fn dataset_accessors() {
        let data = Dataset::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]])
            .expect("rectangular");
        assert_eq!(data.n_samples(), 3);
        assert_eq!(data.n_vars(), 2);
        assert_eq!(data.sample(1), Some(&[3.0, 4.0][..]));
        assert_eq!(data.sample(3), None);
        assert_eq!(data.sample(usize::MAX / 2), None);
        assert_eq!(data.sample(usize::MAX), None);
        assert_eq!(data.column(1).collect::<Vec<_>>(), vec![2.0, 4.0, 6.0]);
        assert_eq!(data.column(2).count(), 0);
    }

    #[test]
    fn params_resolve_depth() {
        let all = DiscoveryParams::resolve(0.05, -1, 1.0, 6).expect("valid");
        assert_eq!(all.depth, 4);
        let clamped = DiscoveryParams::resolve(0.05, 10, 1.0, 6).expect("valid");
        assert_eq!(clamped.depth, 4);
        let exact = DiscoveryParams::resolve(0.05, 2, 1.0, 6).expect("valid");
        assert_eq!(exact.depth, 2);
        assert_eq!(
            DiscoveryParams::resolve(0.05, -3, 1.0, 6),
            Err(OrientError::InvalidDepth { depth: -3 })
        );
    }

    #[test]
    fn params_reject_bad_alpha_and_gamma() {
        for alpha in [0.0, 1.0, -0.5, f64::NAN] {
            assert!(matches!(
                DiscoveryParams::resolve(alpha, -1, 1.0, 4),
                Err(OrientError::InvalidAlpha { .. })
            ));
        }
        for gamma in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            assert!(matches!(
                DiscoveryParams::resolve(0.05, -1, gamma, 4),
                Err(OrientError::InvalidBandwidth { .. })
            ));
        }
    }
}
