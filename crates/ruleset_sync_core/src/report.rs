//! Run results and the reporting seam.

use crate::reconciler::Outcome;

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;

/// The outcome of one target, tagged with its position in the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutcome {
    /// Zero-based position of the target in the produced sequence.
    pub index: usize,
    /// The target exactly as it was produced, even when malformed.
    pub target: String,
    pub outcome: Outcome,
}

/// Aggregate result of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Targets never started because the run was cancelled.
    pub not_attempted: usize,
    pub cancelled: bool,
    /// Per-target records in production order.
    pub records: Vec<TargetOutcome>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record and updates the counts.
    pub fn record(&mut self, outcome: TargetOutcome) {
        match outcome.outcome {
            Outcome::Applied { .. } => self.applied += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
        self.records.push(outcome);
    }

    /// Number of targets that were reconciled.
    pub fn attempted(&self) -> usize {
        self.applied + self.skipped + self.failed
    }

    /// True when no target failed. Cancellation is reported separately.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Consumer of run results.
///
/// `on_outcome` is called once per attempted target, as soon as the outcome can
/// be emitted in production order. `on_complete` is called exactly once, at the
/// end of the run.
pub trait Reporter {
    fn on_outcome(&mut self, outcome: &TargetOutcome);

    fn on_complete(&mut self, summary: &RunSummary);
}
