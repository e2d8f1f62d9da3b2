//! Per-session outcome tallies.

use std::collections::BTreeMap;
use veriface_verification::VerificationOutcome;

/// Count of verification outcomes, by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutcomeStats {
    counts: BTreeMap<&'static str, u64>,
}

impl OutcomeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: VerificationOutcome) {
        *self.counts.entry(outcome.as_str()).or_insert(0) += 1;
    }

    pub fn get(&self, outcome: VerificationOutcome) -> u64 {
        self.counts.get(outcome.as_str()).copied().unwrap_or(0)
    }

    /// Total verifications run.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Every kind with its count, zeros included.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        VerificationOutcome::ALL
            .iter()
            .map(|o| (o.as_str(), self.get(*o)))
            .collect()
    }
}
