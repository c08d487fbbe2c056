//! Validation error type for canonical values.

use thiserror::Error;

/// Error raised when untyped input fails validation into a canonical value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A field value failed its validation rules.
    #[error("invalid {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl CoreError {
    /// Create a validation error for the named field.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        CoreError::Invalid {
            field,
            message: message.into(),
        }
    }

    /// The field that failed validation.
    pub fn field(&self) -> &'static str {
        match self {
            CoreError::Invalid { field, .. } => field,
        }
    }
}

/// Result type for canonical value construction.
pub type CoreResult<T> = Result<T, CoreError>;
