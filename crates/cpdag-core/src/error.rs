use std::fmt;
use std::path::PathBuf;

use crate::backend::{IndependenceTest, SUPPORTED_TEST_LIST};

/// Broad error taxonomy used for propagation decisions by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad identifier or parameter supplied by the caller.
    Configuration,
    /// A requested backend cannot run in this process.
    ResourceUnavailable,
    /// The upstream provider broke the input contract.
    InvariantViolation,
}

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UnknownTest,
    UnsupportedTest,
    InvalidParameter,
    InvalidDataset,
    ConfigParseError,
    FallbackNotPermitted,
    BackendNotRegistered,
    BackendUnavailable,
    MalformedSkeleton,
    MissingSepset,
    MalformedSepset,
    EdgeNotInSkeleton,
    MalformedEdgeMarks,
    BackendContract,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UnknownTest => "E1001",
            Self::UnsupportedTest => "E1002",
            Self::InvalidParameter => "E1003",
            Self::InvalidDataset => "E1004",
            Self::ConfigParseError => "E1005",
            Self::FallbackNotPermitted => "E1006",
            Self::BackendNotRegistered => "E2001",
            Self::BackendUnavailable => "E2002",
            Self::MalformedSkeleton => "E3001",
            Self::MissingSepset => "E3002",
            Self::MalformedSepset => "E3003",
            Self::EdgeNotInSkeleton => "E3004",
            Self::MalformedEdgeMarks => "E3005",
            Self::BackendContract => "E3006",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::UnknownTest => "Unknown independence test",
            Self::UnsupportedTest => "Unsupported independence test",
            Self::InvalidParameter => "Invalid discovery parameter",
            Self::InvalidDataset => "Invalid dataset shape",
            Self::ConfigParseError => "Config file parse error",
            Self::FallbackNotPermitted => "CPU fallback not permitted",
            Self::BackendNotRegistered => "No backend registered",
            Self::BackendUnavailable => "Backend unavailable",
            Self::MalformedSkeleton => "Malformed skeleton",
            Self::MissingSepset => "Missing separation set",
            Self::MalformedSepset => "Malformed separation set",
            Self::EdgeNotInSkeleton => "Edge not in skeleton",
            Self::MalformedEdgeMarks => "Malformed edge-mark matrix",
            Self::BackendContract => "Backend output violates contract",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::UnknownTest | Self::UnsupportedTest => {
                Some("Use one of the supported test identifiers: fisherz, chisq, cmiknn.")
            }
            Self::InvalidParameter => {
                Some("Use alpha in (0, 1), depth >= 0 or -1 for all variables, gamma > 0.")
            }
            Self::InvalidDataset => Some("Provide a non-empty rectangular sample matrix."),
            Self::ConfigParseError => Some("Fix the TOML syntax and retry."),
            Self::FallbackNotPermitted => {
                Some("GPU-only tests cannot carry a CPU fallback; register a GPU backend instead.")
            }
            Self::BackendNotRegistered => Some("Register a backend for this test before dispatch."),
            Self::BackendUnavailable => {
                Some("Build or load the native acceleration modules, or pick a CPU-capable test.")
            }
            Self::MalformedSkeleton
            | Self::MissingSepset
            | Self::MalformedSepset
            | Self::MalformedEdgeMarks
            | Self::BackendContract => {
                Some("Re-run the skeleton search; the upstream output is inconsistent.")
            }
            Self::EdgeNotInSkeleton => None,
        }
    }

    /// Taxonomy bucket of this code.
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::UnknownTest
            | Self::UnsupportedTest
            | Self::InvalidParameter
            | Self::InvalidDataset
            | Self::ConfigParseError
            | Self::FallbackNotPermitted => ErrorKind::Configuration,
            Self::BackendNotRegistered | Self::BackendUnavailable => {
                ErrorKind::ResourceUnavailable
            }
            Self::MalformedSkeleton
            | Self::MissingSepset
            | Self::MalformedSepset
            | Self::EdgeNotInSkeleton
            | Self::MalformedEdgeMarks
            | Self::BackendContract => ErrorKind::InvariantViolation,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by the orientation engine and the backend dispatcher.
///
/// Every variant carries the pair, identifier or backend needed to diagnose
/// it. None of them are retried locally.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrientError {
    #[error("unknown independence test '{given}'; supported: {}", SUPPORTED_TEST_LIST)]
    UnknownTest { given: String },

    #[error("independence test '{given}' is not supported; use one of: {}", SUPPORTED_TEST_LIST)]
    UnsupportedTest { given: String },

    #[error("invalid depth {depth}: use a non-negative size or -1 for all variables")]
    InvalidDepth { depth: i64 },

    #[error("invalid significance level {alpha}: must lie strictly between 0 and 1")]
    InvalidAlpha { alpha: f64 },

    #[error("invalid kernel bandwidth {gamma}: must be finite and positive")]
    InvalidBandwidth { gamma: f64 },

    #[error("invalid dataset: {reason}")]
    InvalidDataset { reason: String },

    #[error("failed to parse config {}: {reason}", path.display())]
    ConfigParse { path: PathBuf, reason: String },

    #[error("test '{test}' is GPU-only and cannot register a CPU fallback")]
    FallbackNotPermitted { test: IndependenceTest },

    #[error("no backend registered for test '{test}'")]
    BackendNotRegistered { test: IndependenceTest },

    #[error("backend '{backend}' for test '{test}' is unavailable: {reason}")]
    BackendUnavailable {
        test: IndependenceTest,
        backend: String,
        reason: String,
    },

    #[error("malformed skeleton: {reason}")]
    MalformedSkeleton { reason: String },

    #[error("non-adjacent pair ({i}, {j}) has no recorded separation set")]
    MissingSepset { i: usize, j: usize },

    #[error("adjacent pair ({i}, {j}) must not carry a separation set")]
    SepsetOnAdjacentPair { i: usize, j: usize },

    #[error("separation set of ({i}, {j}) contains invalid member {member}")]
    InvalidSepsetMember { i: usize, j: usize, member: i64 },

    #[error("independence recorded for ({i}, {j}) but the pair is adjacent in the skeleton")]
    IndependenceOnAdjacentPair { i: usize, j: usize },

    #[error("arc {from} -> {to} is not part of the skeleton")]
    EdgeNotInSkeleton { from: usize, to: usize },

    #[error("malformed edge-mark matrix: {reason}")]
    MalformedEdgeMarks { reason: String },

    #[error("backend '{backend}' returned unusable output: {reason}")]
    BackendContract { backend: String, reason: String },
}

impl OrientError {
    /// Stable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownTest { .. } => ErrorCode::UnknownTest,
            Self::UnsupportedTest { .. } => ErrorCode::UnsupportedTest,
            Self::InvalidDepth { .. }
            | Self::InvalidAlpha { .. }
            | Self::InvalidBandwidth { .. } => ErrorCode::InvalidParameter,
            Self::InvalidDataset { .. } => ErrorCode::InvalidDataset,
            Self::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Self::FallbackNotPermitted { .. } => ErrorCode::FallbackNotPermitted,
            Self::BackendNotRegistered { .. } => ErrorCode::BackendNotRegistered,
            Self::BackendUnavailable { .. } => ErrorCode::BackendUnavailable,
            Self::MalformedSkeleton { .. } => ErrorCode::MalformedSkeleton,
            Self::MissingSepset { .. } => ErrorCode::MissingSepset,
            Self::SepsetOnAdjacentPair { .. }
            | Self::InvalidSepsetMember { .. }
            | Self::IndependenceOnAdjacentPair { .. } => ErrorCode::MalformedSepset,
            Self::EdgeNotInSkeleton { .. } => ErrorCode::EdgeNotInSkeleton,
            Self::MalformedEdgeMarks { .. } => ErrorCode::MalformedEdgeMarks,
            Self::BackendContract { .. } => ErrorCode::BackendContract,
        }
    }

    /// Taxonomy bucket of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.code().kind()
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = OrientError> = std::result::Result<T, E>;
