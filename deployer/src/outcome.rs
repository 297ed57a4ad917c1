//! Per-step outcome reporting
//!
//! Every orchestrated step resolves to one of three outcomes: it was a
//! no-op because its postcondition already held, it mutated the host, or
//! it failed. The orchestrators collect these into a trace so a run is
//! auditable even when every step succeeds.

use serde::Serialize;
use tracing::info;

/// Outcome of a single orchestrated step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum StepOutcome {
    /// Idempotent no-op: the postcondition already held
    Skipped { reason: String },

    /// The step mutated the host
    Applied,

    /// The step failed; the run aborts here
    Failed { reason: String },
}

impl StepOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        StepOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        StepOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepOutcome::Skipped { reason } => write!(f, "skipped ({})", reason),
            StepOutcome::Applied => write!(f, "applied"),
            StepOutcome::Failed { reason } => write!(f, "failed ({})", reason),
        }
    }
}

/// One entry in an orchestrator run trace
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: &'static str,
    pub outcome: StepOutcome,
}

/// Ordered trace of step outcomes for one orchestrator run
#[derive(Debug, Default)]
pub struct StepTrace {
    reports: Vec<StepReport>,
}

impl StepTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a step outcome and emit it to the log
    pub fn record(&mut self, step: &'static str, outcome: StepOutcome) {
        info!(step, outcome = %outcome, "step finished");
        self.reports.push(StepReport { step, outcome });
    }

    pub fn reports(&self) -> &[StepReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        assert_eq!(StepOutcome::Applied.to_string(), "applied");
        assert_eq!(
            StepOutcome::skipped("deploy key already present").to_string(),
            "skipped (deploy key already present)"
        );
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(StepOutcome::skipped("already cloned")).unwrap();
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(json["reason"], "already cloned");

        let json = serde_json::to_value(StepOutcome::Applied).unwrap();
        assert_eq!(json["outcome"], "applied");
    }

    #[test]
    fn test_trace_accumulates_in_order() {
        let mut trace = StepTrace::new();
        trace.record("probe host", StepOutcome::Applied);
        trace.record("provision deploy key", StepOutcome::skipped("key exists"));

        assert_eq!(trace.len(), 2);
        assert_eq!(trace.reports()[0].step, "probe host");
        assert_eq!(trace.reports()[1].step, "provision deploy key");
        assert!(!trace.reports()[1].outcome.is_failed());
    }
}
