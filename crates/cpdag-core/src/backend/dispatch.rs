//! Backend registry and run dispatch.
//!
//! Every check that can fail without touching the data (identifier,
//! parameters, registration, availability) happens in
//! [`Dispatcher::prepare`], before any backend work starts. Only then does
//! [`Dispatcher::dispatch`] call into the backend and, for skeleton outputs,
//! the orientation pipeline.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::{
    Availability, BackendOutput, CausalBackend, Dataset, DiscoveryParams, FallbackPolicy,
    IndependenceTest,
};
use crate::config::DiscoveryConfig;
use crate::encode::EdgeMarkMatrix;
use crate::error::{OrientError, Result};
use crate::orient::{OrientationReport, orient};

/// Registry with one primary slot and one optional CPU fallback per test.
#[derive(Default)]
pub struct Dispatcher {
    primary: BTreeMap<IndependenceTest, Box<dyn CausalBackend>>,
    fallback: BTreeMap<IndependenceTest, Box<dyn CausalBackend>>,
}

/// A fully checked run, ready to execute.
pub struct Plan<'a> {
    pub test: IndependenceTest,
    pub params: DiscoveryParams,
    pub backend: &'a dyn CausalBackend,
    pub used_fallback: bool,
}

/// Output of [`Dispatcher::dispatch`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryResult {
    pub test: IndependenceTest,
    pub backend: String,
    pub used_fallback: bool,
    pub matrix: EdgeMarkMatrix,
    /// Present when the backend returned a skeleton and orientation ran here.
    pub orientation: Option<OrientationReport>,
}

/// Registration and readiness of one test, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendStatus {
    pub test: IndependenceTest,
    pub identifier: &'static str,
    pub long_name: &'static str,
    pub supported: bool,
    pub policy: FallbackPolicy,
    /// Name of the registered primary backend.
    pub primary: Option<String>,
    pub availability: Option<Availability>,
    /// Name of the registered CPU fallback.
    pub fallback: Option<String>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `backend` as the primary implementation of its test,
    /// replacing any earlier one.
    ///
    /// # Errors
    ///
    /// [`OrientError::UnsupportedTest`] when the test cannot be dispatched.
    pub fn register(&mut self, backend: Box<dyn CausalBackend>) -> Result<()> {
        let test = backend.test();
        if !test.is_supported() {
            return Err(OrientError::UnsupportedTest {
                given: test.identifier().to_string(),
            });
        }
        debug!(%test, backend = backend.name(), "registering backend");
        if let Some(previous) = self.primary.insert(test, backend) {
            debug!(%test, replaced = previous.name(), "primary backend replaced");
        }
        Ok(())
    }

    /// Install `backend` as the CPU fallback of its test.
    ///
    /// # Errors
    ///
    /// [`OrientError::FallbackNotPermitted`] for GPU-only tests.
    pub fn register_fallback(&mut self, backend: Box<dyn CausalBackend>) -> Result<()> {
        let test = backend.test();
        if test.fallback_policy() == FallbackPolicy::GpuOnly {
            return Err(OrientError::FallbackNotPermitted { test });
        }
        debug!(%test, backend = backend.name(), "registering CPU fallback");
        self.fallback.insert(test, backend);
        Ok(())
    }

    /// Run every upfront check and pick the backend.
    ///
    /// The primary backend is used when its probe reports ready. Otherwise
    /// the registered CPU fallback is used, with a warning, if the test
    /// allows one and `config.allow_cpu_fallback` is set.
    ///
    /// # Errors
    ///
    /// - [`OrientError::UnknownTest`] / [`OrientError::UnsupportedTest`]
    /// - [`OrientError::InvalidAlpha`], [`OrientError::InvalidDepth`],
    ///   [`OrientError::InvalidBandwidth`]
    /// - [`OrientError::BackendNotRegistered`] when no usable backend exists
    /// - [`OrientError::BackendUnavailable`] when the primary probe fails and
    ///   no fallback may be used
    pub fn prepare(&self, id: &str, n_vars: usize, config: &DiscoveryConfig) -> Result<Plan<'_>> {
        let test = IndependenceTest::parse_supported(id)?;
        let params = config.params(n_vars)?;
        let fallback = self.usable_fallback(test, config);

        let Some(primary) = self.primary.get(&test) else {
            return fallback
                .map(|backend| {
                    warn!(
                        %test,
                        fallback = backend.name(),
                        "no primary backend registered; using CPU fallback"
                    );
                    Plan {
                        test,
                        params,
                        backend,
                        used_fallback: true,
                    }
                })
                .ok_or(OrientError::BackendNotRegistered { test });
        };

        match primary.probe() {
            Availability::Ready => Ok(Plan {
                test,
                params,
                backend: &**primary,
                used_fallback: false,
            }),
            Availability::Unavailable { reason } => match fallback {
                Some(backend) => {
                    warn!(
                        %test,
                        primary = primary.name(),
                        fallback = backend.name(),
                        %reason,
                        "accelerated backend unavailable; using CPU fallback"
                    );
                    Ok(Plan {
                        test,
                        params,
                        backend,
                        used_fallback: true,
                    })
                }
                None => Err(OrientError::BackendUnavailable {
                    test,
                    backend: primary.name().to_string(),
                    reason,
                }),
            },
        }
    }

    /// Prepare, run the backend and orient its output.
    ///
    /// # Errors
    ///
    /// Everything [`Dispatcher::prepare`] reports, errors from the backend
    /// itself, [`OrientError::BackendContract`] when the output does not
    /// cover the dataset's variables, and orientation errors for skeleton
    /// outputs with inconsistent separation sets.
    #[instrument(skip_all, fields(test = id, samples = data.n_samples(), vars = data.n_vars()))]
    pub fn dispatch(
        &self,
        id: &str,
        data: &Dataset,
        config: &DiscoveryConfig,
    ) -> Result<DiscoveryResult> {
        let n_vars = data.n_vars();
        let plan = self.prepare(id, n_vars, config)?;
        let backend_name = plan.backend.name().to_string();
        info!(
            test = %plan.test,
            backend = %backend_name,
            alpha = plan.params.alpha,
            depth = plan.params.depth,
            used_fallback = plan.used_fallback,
            "dispatching discovery"
        );

        let (matrix, orientation) = match plan.backend.discover(data, &plan.params)? {
            BackendOutput::Skeleton { skeleton, sepsets } => {
                if skeleton.len() != n_vars {
                    return Err(contract(
                        &backend_name,
                        format!(
                            "skeleton covers {} variables, dataset has {n_vars}",
                            skeleton.len()
                        ),
                    ));
                }
                let outcome = orient(&skeleton, &sepsets)?;
                (outcome.matrix, Some(outcome.report))
            }
            BackendOutput::Oriented(matrix) => {
                if matrix.len() != n_vars {
                    return Err(contract(
                        &backend_name,
                        format!("matrix covers {} variables, dataset has {n_vars}", matrix.len()),
                    ));
                }
                debug!(backend = %backend_name, "backend returned an oriented graph");
                (matrix, None)
            }
        };

        Ok(DiscoveryResult {
            test: plan.test,
            backend: backend_name,
            used_fallback: plan.used_fallback,
            matrix,
            orientation,
        })
    }

    /// Status of every known test, in [`IndependenceTest::ALL`] order.
    #[must_use]
    pub fn describe(&self) -> Vec<BackendStatus> {
        IndependenceTest::ALL
            .into_iter()
            .map(|test| {
                let primary = self.primary.get(&test);
                BackendStatus {
                    test,
                    identifier: test.identifier(),
                    long_name: test.long_name(),
                    supported: test.is_supported(),
                    policy: test.fallback_policy(),
                    primary: primary.map(|backend| backend.name().to_string()),
                    availability: primary.map(|backend| backend.probe()),
                    fallback: self.fallback.get(&test).map(|backend| backend.name().to_string()),
                }
            })
            .collect()
    }

    fn usable_fallback(
        &self,
        test: IndependenceTest,
        config: &DiscoveryConfig,
    ) -> Option<&dyn CausalBackend> {
        if test.fallback_policy() != FallbackPolicy::CpuAllowed || !config.allow_cpu_fallback {
            return None;
        }
        let backend = self.fallback.get(&test)?;
        match backend.probe() {
            Availability::Ready => Some(&**backend),
            Availability::Unavailable { reason } => {
                debug!(%test, fallback = backend.name(), %reason, "CPU fallback not ready");
                None
            }
        }
    }
}

fn contract(backend: &str, reason: String) -> OrientError {
    OrientError::BackendContract {
        backend: backend.to_string(),
        reason,
    }
}
