//! Outcome envelope
//!
//! The structured, non-exception result of a reconciliation call.
//! Recoverable divergences (no-change, swallowed update failures) are
//! reported here instead of as errors, so an at-least-once caller can
//! redeliver safely.

use serde::{Deserialize, Serialize};

/// What the reconciliation did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordEvent {
    /// A record was created at the target.
    Created,
    /// An existing record was updated (or would have been).
    Updated,
    /// A record was deleted at the target.
    Deleted,
}

impl std::fmt::Display for RecordEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordEvent::Created => write!(f, "created"),
            RecordEvent::Updated => write!(f, "updated"),
            RecordEvent::Deleted => write!(f, "deleted"),
        }
    }
}

/// How the event went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeKind {
    /// The action was performed.
    Success,
    /// Source and target already agreed; nothing was written.
    NoChange,
    /// The target refused the write; deliberately not escalated.
    Failure,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeKind::Success => write!(f, "success"),
            OutcomeKind::NoChange => write!(f, "no-change"),
            OutcomeKind::Failure => write!(f, "failure"),
        }
    }
}

/// The envelope returned by every upsert entry point.
///
/// Built once at the end of an orchestration, immediately returned,
/// never stored. `record` is the resulting record: the persisted copy
/// on success, the pre-existing copy on no-change or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertOutcome<T> {
    /// What happened.
    pub event: RecordEvent,
    /// How it went.
    pub outcome: OutcomeKind,
    /// The resulting record.
    pub record: T,
}

impl<T> UpsertOutcome<T> {
    /// A record was created.
    pub fn created(record: T) -> Self {
        Self {
            event: RecordEvent::Created,
            outcome: OutcomeKind::Success,
            record,
        }
    }

    /// An existing record was updated.
    pub fn updated(record: T) -> Self {
        Self {
            event: RecordEvent::Updated,
            outcome: OutcomeKind::Success,
            record,
        }
    }

    /// The copies already agreed; no write was made.
    pub fn no_change(record: T) -> Self {
        Self {
            event: RecordEvent::Updated,
            outcome: OutcomeKind::NoChange,
            record,
        }
    }

    /// The update was rejected by the target and swallowed.
    pub fn update_failed(record: T) -> Self {
        Self {
            event: RecordEvent::Updated,
            outcome: OutcomeKind::Failure,
            record,
        }
    }

    /// A record was deleted.
    pub fn deleted(record: T) -> Self {
        Self {
            event: RecordEvent::Deleted,
            outcome: OutcomeKind::Success,
            record,
        }
    }

    /// True when nothing was written because nothing differed.
    pub fn is_no_change(&self) -> bool {
        self.outcome == OutcomeKind::NoChange
    }

    /// Map the record, keeping event and outcome.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> UpsertOutcome<U> {
        UpsertOutcome {
            event: self.event,
            outcome: self.outcome,
            record: f(self.record),
        }
    }
}
