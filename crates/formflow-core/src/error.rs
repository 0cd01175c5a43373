//! Error types for the form engine.
//!
//! Nothing here is fatal to a session: every error leaves FormState and the
//! current section untouched so the user can correct input and retry.

use std::time::Duration;

use serde::Serialize;

use crate::schema::ShapeParams;

/// Why a field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Required,
    Format,
    Length,
    Option,
    Age,
}

/// A single field failure, ready to show next to the control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{field_id}: {message}")]
pub struct FieldError {
    pub field_id: String,
    pub kind: ViolationKind,
    pub message: String,
}

/// Structural problems that make a schema unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("schema has no sections")]
    NoSections,

    #[error("duplicate section title: {title}")]
    DuplicateSectionTitle { title: String },

    #[error("duplicate field id: {field_id}")]
    DuplicateFieldId { field_id: String },

    #[error("duplicate data-test-id: {binding_id}")]
    DuplicateBinding { binding_id: String },

    #[error("field {field_id} declares no options")]
    MissingOptions { field_id: String },

    #[error("field {field_id} declares option {value} twice")]
    DuplicateOption { field_id: String, value: String },

    #[error("field {field_id} has an invalid pattern: {reason}")]
    InvalidPattern { field_id: String, reason: String },
}

/// Schema loading errors. Cloneable so concurrent waiters on one fetch all
/// receive the same outcome.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    /// Transport-level failure reported by the fetcher.
    #[error("schema fetch failed: {message}")]
    Fetch { message: String, retryable: bool },

    #[error("schema fetch timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("invalid schema: {0}")]
    InvalidSchema(#[from] SchemaError),

    /// A newer request started while this one was in flight; its result was dropped.
    #[error("schema request for {params} was superseded by a newer request")]
    Superseded { params: ShapeParams },
}

impl LoadError {
    /// Whether invoking the loader again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch { retryable, .. } => *retryable,
            Self::Timeout { .. } | Self::Superseded { .. } => true,
            Self::InvalidResponse { .. } | Self::InvalidSchema(_) => false,
        }
    }
}

/// Result type for schema loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// Refused section transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// Validation failed; the navigator stays on `section`.
    #[error("section {section} has {} invalid field(s)", .errors.len())]
    Blocked {
        section: usize,
        errors: Vec<FieldError>,
    },

    #[error("already on the first section")]
    AtFirstSection,

    #[error("already on the last section; submit instead")]
    AtLastSection,

    #[error("submit is only available on the last section (current: {section})")]
    NotLastSection { section: usize },

    #[error("section {index} out of range (form has {count})")]
    OutOfRange { index: usize, count: usize },

    #[error("form already submitted")]
    AlreadySubmitted,
}

/// Rejected edits to form state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("unknown field: {field_id}")]
    UnknownField { field_id: String },

    #[error("no control bound to data-test-id {binding_id}")]
    UnknownControl { binding_id: String },

    #[error("field {field_id} expects a {expected} value")]
    TypeMismatch {
        field_id: String,
        expected: &'static str,
    },
}

/// Final submission failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// The final sweep found invalid fields; nothing was sent.
    #[error("{} field(s) failed final validation", .0.len())]
    Invalid(Vec<FieldError>),

    #[error("submission transport failed: {message}")]
    Transport { message: String, retryable: bool },
}

impl SubmissionError {
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Invalid(errors) => errors,
            Self::Transport { .. } => &[],
        }
    }
}

/// Any error surfaced by [`crate::FormSession`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

impl SessionError {
    /// Per-field errors carried by a blocked transition or failed final sweep.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Navigation(NavigationError::Blocked { errors, .. }) => errors,
            Self::Submission(e) => e.field_errors(),
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_retryable() {
        assert!(LoadError::Timeout {
            after: Duration::from_secs(1)
        }
        .is_retryable());
        assert!(LoadError::Fetch {
            message: "503".into(),
            retryable: true
        }
        .is_retryable());
        assert!(!LoadError::InvalidSchema(SchemaError::NoSections).is_retryable());
    }

    #[test]
    fn test_blocked_message_counts_errors() {
        let err = NavigationError::Blocked {
            section: 2,
            errors: vec![
                FieldError {
                    field_id: "a".into(),
                    kind: ViolationKind::Required,
                    message: "This field is required".into(),
                },
                FieldError {
                    field_id: "b".into(),
                    kind: ViolationKind::Format,
                    message: "Invalid format".into(),
                },
            ],
        };
        assert_eq!(err.to_string(), "section 2 has 2 invalid field(s)");
        assert_eq!(SessionError::from(err).field_errors().len(), 2);
    }
}
