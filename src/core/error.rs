//! Structured error types.
//!
//! Expected edge cases in the idea model (empty text, dangling links, cycles)
//! are not errors; they surface as unchanged state. Errors are reserved for
//! the outer surfaces: storage, command-line lookups and refused operations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// System-level errors (IO, serialization, locking)
    System,
    /// User input errors (unknown ids, invalid names)
    User,
    /// Operations refused to keep a minimum invariant (e.g. last project)
    Capacity,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Capacity => write!(f, "capacity"),
        }
    }
}

/// Structured error with full context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThinktreeError {
    /// Error category for classification.
    pub category: ErrorCategory,
    /// Unique error code within category.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Component that originated the error.
    pub origin: String,
    /// Whether this error is potentially recoverable.
    pub recoverable: bool,
    /// Hint for recovery action.
    pub recovery_hint: Option<String>,
    /// Additional context key-value pairs.
    pub context: HashMap<String, String>,
}

impl ThinktreeError {
    /// Creates a new error with the given parameters.
    #[must_use]
    pub fn new(
        category: ErrorCategory,
        code: impl Into<String>,
        message: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code: code.into(),
            message: message.into(),
            origin: origin.into(),
            recoverable: false,
            recovery_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets whether the error is recoverable.
    #[must_use]
    pub fn recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }

    /// Sets the recovery hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.recovery_hint = Some(hint.into());
        self
    }

    /// Adds context to the error.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Creates a system error.
    #[must_use]
    pub fn system(
        code: impl Into<String>,
        message: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self::new(ErrorCategory::System, code, message, origin)
    }

    /// Creates a user input error.
    #[must_use]
    pub fn user(
        code: impl Into<String>,
        message: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self::new(ErrorCategory::User, code, message, origin).recoverable(true)
    }

    /// Creates a capacity guard error: the operation was refused, nothing changed.
    #[must_use]
    pub fn capacity(
        code: impl Into<String>,
        message: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self::new(ErrorCategory::Capacity, code, message, origin).recoverable(true)
    }
}

impl std::fmt::Display for ThinktreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.category, self.code, self.message)
    }
}

impl std::error::Error for ThinktreeError {}

/// Result type using `ThinktreeError`.
pub type Result<T> = std::result::Result<T, ThinktreeError>;

/// Exit codes for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    NotFound = 2,
    Conflict = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ThinktreeError::system("io_error", "Failed to read file", "storage:file");
        assert!(err.to_string().contains("system"));
        assert!(err.to_string().contains("io_error"));
    }

    #[test]
    fn error_with_context() {
        let err = ThinktreeError::user(
            "invalid_project_name",
            "Project name cannot be empty",
            "registry:rename_project",
        )
        .with_context("field", "name")
        .with_hint("Provide a non-empty project name");

        assert_eq!(err.context.get("field"), Some(&"name".to_string()));
        assert!(err.recovery_hint.is_some());
        assert!(err.recoverable);
    }

    #[test]
    fn capacity_errors_are_recoverable() {
        let err = ThinktreeError::capacity(
            "last_project",
            "Cannot delete the only project",
            "registry:delete_project",
        );
        assert_eq!(err.category, ErrorCategory::Capacity);
        assert!(err.recoverable);
        assert!(err.to_string().starts_with("[capacity:last_project]"));
    }

    #[test]
    fn error_serialization() {
        let err = ThinktreeError::user("idea_not_found", "Idea 7 not found", "registry:idea")
            .with_context("idea", "7");

        let json = serde_json::to_string(&err).expect("serialize");
        let restored: ThinktreeError = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(restored.category, ErrorCategory::User);
        assert_eq!(restored.code, "idea_not_found");
    }
}
