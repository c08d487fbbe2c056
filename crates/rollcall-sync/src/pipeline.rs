//! Result pipeline combinators
//!
//! Reconciliation steps are plain `Result`-returning functions composed
//! with `?`; the first failure short-circuits the rest. This module adds
//! the two combinators that contract depends on being used consistently:
//! tagging a step with its action-context label for diagnostics, and
//! replacing one specific recoverable error kind with a designated
//! fallback value. Everything else propagates untouched.

use tracing::warn;

use crate::error::{SyncError, SyncResult};

/// Extension combinators for reconciliation steps.
pub trait ResultExt<T> {
    /// Tag a failed step with its action-context label.
    ///
    /// The label is emitted via `tracing` for operator diagnostics and
    /// carries no semantics; the error passes through unchanged.
    fn action(self, label: &str) -> SyncResult<T>;

    /// Replace `NotFound` with a fallback value.
    ///
    /// This is how an optional lookup miss becomes "no record yet"
    /// instead of aborting the orchestration. Any other error still
    /// short-circuits.
    fn recover_not_found_with<F: FnOnce() -> T>(self, fallback: F) -> SyncResult<T>;

    /// Replace `UpdateRejected` with a fallback value.
    ///
    /// This is how a refused update becomes a failure outcome on the
    /// envelope rather than an escalated error that an at-least-once
    /// caller would redeliver forever.
    fn recover_update_rejected_with<F: FnOnce() -> T>(self, fallback: F) -> SyncResult<T>;
}

impl<T> ResultExt<T> for SyncResult<T> {
    fn action(self, label: &str) -> SyncResult<T> {
        if let Err(err) = &self {
            warn!(action = label, error = %err, code = err.error_code(), "action failed");
        }
        self
    }

    fn recover_not_found_with<F: FnOnce() -> T>(self, fallback: F) -> SyncResult<T> {
        match self {
            Err(err) if err.is_not_found() => Ok(fallback()),
            other => other,
        }
    }

    fn recover_update_rejected_with<F: FnOnce() -> T>(self, fallback: F) -> SyncResult<T> {
        match self {
            Err(err) if err.is_update_rejected() => Ok(fallback()),
            other => other,
        }
    }
}
