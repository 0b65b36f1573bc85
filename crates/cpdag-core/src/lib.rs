//! cpdag-core library.
//!
//! Orients an undirected skeleton into a CPDAG: colliders from separation
//! sets, then Meek rules 1-3 to a fixpoint, then the edge-mark matrix
//! encoding. The [`backend`] module dispatches discovery runs to pluggable
//! independence-test implementations and feeds their skeletons through the
//! same pipeline.
//!
//! # Conventions
//!
//! - **Errors**: [`error::OrientError`] with stable codes; no panics on bad
//!   input.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).
//! - **Indices**: variables are `usize` in `[0, n)`; names live at the I/O
//!   boundary only.

#![forbid(unsafe_code)]

pub mod backend;
pub mod config;
pub mod encode;
pub mod error;
pub mod graph;
pub mod oracle;
pub mod orient;
pub mod sepset;
pub mod skeleton;

pub use encode::EdgeMarkMatrix;
pub use error::{ErrorCode, ErrorKind, OrientError, Result};
pub use graph::OrientedGraph;
pub use orient::{OrientationOutcome, OrientationReport, orient};
pub use sepset::SeparationSets;
pub use skeleton::Skeleton;
