//! Outcome records of conditional-independence tests.
//!
//! The tests themselves run outside this crate (partial correlation,
//! chi-square, kernel or k-NN mutual information, possibly on a GPU). A
//! skeleton provider may hand back its test log as a list of [`CiRecord`]s,
//! which [`crate::sepset::SeparationSets::from_records`] turns into the
//! separation-set store.

use serde::{Deserialize, Serialize};

/// Decision of one conditional-independence test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiOutcome {
    /// Null hypothesis (conditional independence) accepted.
    Independent,
    /// Null hypothesis rejected.
    Dependent,
    /// The test could not decide (degenerate statistic, too few samples).
    Inconclusive,
}

impl CiOutcome {
    /// Whether the pair is treated as independent.
    ///
    /// `Inconclusive` counts as independent: the skeleton search removed the
    /// edge on that result, so the orientation stage must agree with it.
    #[must_use]
    pub const fn treats_as_independent(self) -> bool {
        matches!(self, Self::Independent | Self::Inconclusive)
    }
}

/// Evidence reported alongside a decision.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistic: Option<f64>,
}

/// One oracle call: `x ⫫ y | conditioning`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CiRecord {
    pub x: usize,
    pub y: usize,
    pub conditioning: Vec<usize>,
    pub outcome: CiOutcome,
    #[serde(default)]
    pub evidence: Evidence,
}

impl CiRecord {
    /// Record without evidence.
    #[must_use]
    pub const fn new(x: usize, y: usize, conditioning: Vec<usize>, outcome: CiOutcome) -> Self {
        Self {
            x,
            y,
            conditioning,
            outcome,
            evidence: Evidence {
                p_value: None,
                statistic: None,
            },
        }
    }

    /// Attach a p-value.
    #[must_use]
    pub const fn with_p_value(mut self, p_value: f64) -> Self {
        self.evidence.p_value = Some(p_value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inconclusive_counts_as_independent() {
        assert!(CiOutcome::Independent.treats_as_independent());
        assert!(CiOutcome::Inconclusive.treats_as_independent());
        assert!(!CiOutcome::Dependent.treats_as_independent());
    }

    #[test]
    fn record_deserializes_without_evidence() {
        let record: CiRecord = serde_json::from_str(
            r#"{"x": 0, "y": 2, "conditioning": [1], "outcome": "inconclusive"}"#,
        )
        .expect("valid record");
        assert_eq!(record.outcome, CiOutcome::Inconclusive);
        assert_eq!(record.evidence, Evidence::default());
    }

    #[test]
    fn p_value_is_attached() {
        let record = CiRecord::new(0, 1, vec![], CiOutcome::Dependent).with_p_value(0.001);
        assert_eq!(record.evidence.p_value, Some(0.001));
    }
}
