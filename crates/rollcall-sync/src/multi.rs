//! Multi-source fan-out reporting
//!
//! One canonical record is pushed to several sources in sequence; each
//! source gets its own envelope, and one source failing must not stop
//! the rest. The report collects both and summarizes for the caller.

use serde::{Deserialize, Serialize};

use rollcall_core::{OutcomeKind, Source, UpsertOutcome};

use crate::error::SyncError;

/// One source's share of a fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOutcome<T> {
    /// The source reconciled with.
    pub source: Source,
    /// Its envelope.
    pub outcome: UpsertOutcome<T>,
}

/// A terminal error from one source during fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFailure {
    /// The source that failed.
    pub source: Source,
    /// Classification code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Per-source results of pushing one record to many sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiSourceReport<T> {
    /// Envelopes from sources that answered.
    pub outcomes: Vec<SourceOutcome<T>>,
    /// Terminal errors from sources that did not.
    pub errors: Vec<SourceFailure>,
}

impl<T> MultiSourceReport<T> {
    /// Create an empty report.
    pub fn new() -> Self {
        Self {
            outcomes: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Record one source's envelope.
    pub fn record(&mut self, source: Source, outcome: UpsertOutcome<T>) {
        self.outcomes.push(SourceOutcome { source, outcome });
    }

    /// Record one source's terminal error.
    pub fn record_error(&mut self, source: Source, error: &SyncError) {
        self.errors.push(SourceFailure {
            source,
            code: error.error_code().to_string(),
            message: error.to_string(),
        });
    }

    /// Summarize for logging and queue payloads.
    pub fn summary(&self) -> FanOutSummary {
        let mut summary = FanOutSummary::default();
        for entry in &self.outcomes {
            summary.processed += 1;
            match entry.outcome.outcome {
                OutcomeKind::Success => summary.succeeded += 1,
                OutcomeKind::NoChange => summary.no_change += 1,
                OutcomeKind::Failure => summary.rejected += 1,
            }
        }
        summary.processed += self.errors.len();
        summary.errored = self.errors.len();
        summary
    }

    /// True when every source answered with a non-failure envelope.
    pub fn is_converged(&self) -> bool {
        self.errors.is_empty()
            && self
                .outcomes
                .iter()
                .all(|entry| entry.outcome.outcome != OutcomeKind::Failure)
    }
}

impl<T> Default for MultiSourceReport<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts of a fan-out run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanOutSummary {
    /// Sources attempted.
    pub processed: usize,
    /// Writes that succeeded.
    pub succeeded: usize,
    /// Sources already in agreement.
    pub no_change: usize,
    /// Updates the target rejected (swallowed).
    pub rejected: usize,
    /// Sources that failed terminally.
    pub errored: usize,
}
