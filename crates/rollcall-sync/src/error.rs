//! Reconciliation error types
//!
//! The error taxonomy the orchestrator branches on. Terminal errors
//! propagate to the boundary so infrastructure retry/alerting can act;
//! the recoverable kinds (`NotFound`, `UpdateRejected`) only ever become
//! benign outcomes through the explicit pipeline combinators in
//! [`crate::pipeline`].

use thiserror::Error;

use rollcall_core::{CoreError, Source};

/// Error that can occur during reconciliation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Inbound payload failed validation. Terminal, non-retryable.
    #[error("invalid request: {message}")]
    RequestInvalid { message: String },

    /// An internal invariant was violated by code calling the engine
    /// incorrectly. Terminal; surfaced, never suppressed.
    #[error("internal request invalid: {message}")]
    InternalRequestInvalid { message: String },

    /// A remote system returned data that fails its schema contract.
    /// The backend is reachable but lying about its shape. Terminal.
    #[error("invalid data from {source_system}: {message}")]
    SourceInvalid {
        source_system: Source,
        message: String,
    },

    /// A lookup round trip succeeded but found nothing.
    /// Recoverable where the record is optional; terminal where the
    /// caller asserted it must exist.
    #[error("{entity} not found: {identifier}")]
    NotFound {
        entity: &'static str,
        identifier: String,
    },

    /// Attempted to create a record that already exists. Terminal.
    #[error("{entity} already exists: {identifier}")]
    Conflict {
        entity: &'static str,
        identifier: String,
    },

    /// The target refused an update (validation mismatch, stale data).
    /// Deliberately not escalated; converted into a failure outcome so
    /// an at-least-once caller does not retry forever.
    #[error("{entity} update rejected: {message}")]
    UpdateRejected {
        entity: &'static str,
        message: String,
    },

    /// The source system could not be reached, or answered with a
    /// server-side failure. Distinct from `NotFound` by construction.
    #[error("{source_system} unavailable: {message}")]
    SourceUnavailable {
        source_system: Source,
        message: String,
    },

    /// The source system rejected our credentials.
    #[error("{source_system} rejected credentials")]
    Unauthorized { source_system: Source },

    /// The adapter does not support this identifier kind.
    /// A configuration/programmer error, never a not-found.
    #[error("{source_system} does not support lookup by {identifier}")]
    UnsupportedIdentifier {
        source_system: Source,
        identifier: &'static str,
    },

    /// The adapter does not implement this operation.
    #[error("{source_system} does not support {operation}")]
    UnsupportedOperation {
        source_system: Source,
        operation: &'static str,
    },

    /// The canonical store failed.
    #[error("store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SyncError {
    /// Check if this is a not-found, the kind the CREATE branch recovers.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound { .. })
    }

    /// Check if this is a rejected update, the kind the upsert entry
    /// points convert into a failure outcome.
    pub fn is_update_rejected(&self) -> bool {
        matches!(self, SyncError::UpdateRejected { .. })
    }

    /// Check if this error is terminal for the invocation.
    ///
    /// Terminal errors propagate to the boundary; the rest are only
    /// recoverable through the explicit pipeline combinators.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            SyncError::NotFound { .. } | SyncError::UpdateRejected { .. }
        )
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::RequestInvalid { .. } => "REQUEST_INVALID",
            SyncError::InternalRequestInvalid { .. } => "INTERNAL_REQUEST_INVALID",
            SyncError::SourceInvalid { .. } => "SOURCE_INVALID",
            SyncError::NotFound { .. } => "NOT_FOUND",
            SyncError::Conflict { .. } => "CONFLICT",
            SyncError::UpdateRejected { .. } => "UPDATE_REJECTED",
            SyncError::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            SyncError::Unauthorized { .. } => "UNAUTHORIZED",
            SyncError::UnsupportedIdentifier { .. } => "UNSUPPORTED_IDENTIFIER",
            SyncError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            SyncError::Store { .. } => "STORE_ERROR",
        }
    }

    // Convenience constructors

    /// Create a request-invalid error.
    pub fn request_invalid(message: impl Into<String>) -> Self {
        SyncError::RequestInvalid {
            message: message.into(),
        }
    }

    /// Create an internal-request-invalid error.
    pub fn internal(message: impl Into<String>) -> Self {
        SyncError::InternalRequestInvalid {
            message: message.into(),
        }
    }

    /// Create a source-invalid error.
    pub fn source_invalid(source: Source, message: impl Into<String>) -> Self {
        SyncError::SourceInvalid {
            source_system: source,
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(entity: &'static str, identifier: impl Into<String>) -> Self {
        SyncError::NotFound {
            entity,
            identifier: identifier.into(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(entity: &'static str, identifier: impl Into<String>) -> Self {
        SyncError::Conflict {
            entity,
            identifier: identifier.into(),
        }
    }

    /// Create an update-rejected error.
    pub fn update_rejected(entity: &'static str, message: impl Into<String>) -> Self {
        SyncError::UpdateRejected {
            entity,
            message: message.into(),
        }
    }

    /// Create a source-unavailable error.
    pub fn unavailable(source: Source, message: impl Into<String>) -> Self {
        SyncError::SourceUnavailable {
            source_system: source,
            message: message.into(),
        }
    }

    /// Create an unsupported-identifier error.
    pub fn unsupported_identifier(source: Source, identifier: &'static str) -> Self {
        SyncError::UnsupportedIdentifier {
            source_system: source,
            identifier,
        }
    }

    /// Create an unsupported-operation error.
    pub fn unsupported_operation(source: Source, operation: &'static str) -> Self {
        SyncError::UnsupportedOperation {
            source_system: source,
            operation,
        }
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        SyncError::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Create a store error with source.
    pub fn store_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SyncError::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<CoreError> for SyncError {
    /// Validation failures on the request surface default to
    /// `RequestInvalid`; adapters validating remote payloads map
    /// explicitly to `SourceInvalid` instead.
    fn from(err: CoreError) -> Self {
        SyncError::request_invalid(err.to_string())
    }
}

/// Result type for reconciliation operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        let recoverable = vec![
            SyncError::not_found("member", "crm#S1"),
            SyncError::update_rejected("member", "stale"),
        ];
        for err in recoverable {
            assert!(!err.is_terminal(), "expected {} to be recoverable", err.error_code());
        }
    }

    #[test]
    fn test_terminal_kinds() {
        let terminal = vec![
            SyncError::request_invalid("bad"),
            SyncError::internal("bad"),
            SyncError::source_invalid(Source::Crm, "bad shape"),
            SyncError::conflict("member", "ada@example.com"),
            SyncError::unavailable(Source::Auth, "503"),
            SyncError::Unauthorized { source_system: Source::Crm },
            SyncError::unsupported_identifier(Source::CoursePlatform, "slug"),
            SyncError::unsupported_operation(Source::Crm, "delete"),
            SyncError::store("down"),
        ];
        for err in terminal {
            assert!(err.is_terminal(), "expected {} to be terminal", err.error_code());
        }
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::not_found("member-source", "crm#S1");
        assert_eq!(err.to_string(), "member-source not found: crm#S1");

        let err = SyncError::unsupported_identifier(Source::CoursePlatform, "slug");
        assert_eq!(
            err.to_string(),
            "course-platform does not support lookup by slug"
        );
    }

    #[test]
    fn test_from_core_error() {
        let err: SyncError = rollcall_core::CoreError::invalid("email", "missing @").into();
        assert_eq!(err.error_code(), "REQUEST_INVALID");
    }
}
