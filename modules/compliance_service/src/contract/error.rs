//! Contract error types for compliance service
//!
//! These errors are transport-agnostic and used for inter-module communication.

use thiserror::Error;

/// Validation failure on a single input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Compliance service domain errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComplianceError {
    /// Resource not found
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Resource type (document, watchlist_report, ...)
        resource: String,
        /// Resource identifier
        id: String,
    },
    /// Input rejected
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field_errors: Vec<FieldError>,
    },
    /// Duplicate or otherwise conflicting state
    #[error("Conflict: {reason}")]
    Conflict { reason: String },
    /// Internal error
    #[error("Internal error")]
    Internal,
}

impl ComplianceError {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    /// Validation error for one field
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Validation {
            message: format!("{}: {}", field, message),
            field_errors: vec![FieldError::new(field, message)],
        }
    }

    /// Validation error collecting several field errors; `Ok` when empty
    pub fn from_field_errors(field_errors: Vec<FieldError>) -> Result<(), Self> {
        if field_errors.is_empty() {
            return Ok(());
        }
        let message = field_errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join(", ");
        Err(Self::Validation {
            message,
            field_errors,
        })
    }

    /// Log an infrastructure failure and collapse it to `Internal`
    pub fn internal(error: anyhow::Error) -> Self {
        tracing::error!(error = ?error, "internal error");
        Self::Internal
    }
}
