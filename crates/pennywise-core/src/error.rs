//! Error types for pennywise-core
//!
//! The projector and the query engine never fail. Errors come from entry
//! validation and from the document store: unknown ids, bad drafts and
//! snapshot persistence.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    OperationNotFound,
    CategoryNotFound,
    ValidationError,
    IoError,
    SnapshotError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::OperationNotFound => write!(f, "OPERATION_NOT_FOUND"),
            ErrorCode::CategoryNotFound => write!(f, "CATEGORY_NOT_FOUND"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
            ErrorCode::SnapshotError => write!(f, "SNAPSHOT_ERROR"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Offending draft field, for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            field: None,
            suggestions: vec![],
        }
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref field) = self.field {
            write!(f, " (field: {})", field)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - the request was rejected, nothing changed
    Warning,
    /// Error - the store may not have persisted a change
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Main error type for pennywise-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Operation not found: {id}")]
    OperationNotFound { id: String },

    #[error("Category not found: {id}")]
    CategoryNotFound { id: String },

    #[error("Invalid {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Snapshot error: {message}")]
    SnapshotError { message: String },
}

impl CoreError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        CoreError::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::OperationNotFound { .. } => ErrorCode::OperationNotFound,
            CoreError::CategoryNotFound { .. } => ErrorCode::CategoryNotFound,
            CoreError::ValidationError { .. } => ErrorCode::ValidationError,
            CoreError::IoError(_) => ErrorCode::IoError,
            CoreError::SnapshotError { .. } => ErrorCode::SnapshotError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::OperationNotFound { .. } => ErrorSeverity::Info,
            CoreError::CategoryNotFound { .. } => ErrorSeverity::Info,
            CoreError::ValidationError { .. } => ErrorSeverity::Warning,
            CoreError::IoError(_) => ErrorSeverity::Error,
            CoreError::SnapshotError { .. } => ErrorSeverity::Error,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::OperationNotFound { .. } => details.with_suggestion(
                "The operation may have been deleted; reload the list.".to_string(),
            ),
            CoreError::CategoryNotFound { .. } => details.with_suggestion(
                "The category may have been deleted; reload the categories.".to_string(),
            ),
            CoreError::ValidationError { field, .. } => details.with_field(field),
            CoreError::SnapshotError { .. } => details.with_suggestion(
                "Check that the snapshot file is valid JSON.".to_string(),
            ),
            CoreError::IoError(_) => details.with_suggestion(
                "Check that the data directory exists and is writable.".to_string(),
            ),
        }
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::SnapshotError {
            message: error.to_string(),
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::OperationNotFound.to_string(), "OPERATION_NOT_FOUND");
        assert_eq!(ErrorCode::ValidationError.to_string(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_core_error_code_and_severity() {
        let error = CoreError::OperationNotFound { id: "x".to_string() };
        assert_eq!(error.code(), ErrorCode::OperationNotFound);
        assert_eq!(error.severity(), ErrorSeverity::Info);

        let error = CoreError::validation("amount", "must be positive");
        assert_eq!(error.code(), ErrorCode::ValidationError);
        assert_eq!(error.severity(), ErrorSeverity::Warning);
        assert_eq!(error.to_string(), "Invalid amount: must be positive");
    }

    #[test]
    fn test_validation_details_carry_field() {
        let details = CoreError::validation("description", "is required").to_details();
        assert_eq!(details.field.as_deref(), Some("description"));
        assert!(details.to_string().contains("field: description"));
    }

    #[test]
    fn test_not_found_details_have_suggestion() {
        let details = CoreError::CategoryNotFound { id: "c9".to_string() }.to_details();
        assert_eq!(details.code, ErrorCode::CategoryNotFound);
        assert!(!details.suggestions.is_empty());
        assert!(details.message.contains("c9"));
    }

    #[test]
    fn test_json_error_maps_to_snapshot_error() {
        let err: CoreError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.code(), ErrorCode::SnapshotError);
    }
}
