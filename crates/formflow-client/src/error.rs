//! Error types for the form server client.

use std::time::Duration;

use formflow_core::{LoadError, SubmissionError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Endpoint returned 404.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// Rate limit exceeded.
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// 5xx from the server.
    #[error("server error: HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// Any other non-2xx status.
    #[error("request rejected: HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Connection, timeout or body read failure.
    #[error("network error: {message}")]
    Network { message: String },

    /// 2xx response whose body could not be decoded.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("configuration error: {message}")]
    Config { message: String },
}

impl ClientError {
    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Server { .. } | Self::Network { .. }
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

impl From<ClientError> for LoadError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidResponse { message } => LoadError::InvalidResponse { message },
            other => LoadError::Fetch {
                retryable: other.is_retryable(),
                message: other.to_string(),
            },
        }
    }
}

impl From<ClientError> for SubmissionError {
    fn from(err: ClientError) -> Self {
        SubmissionError::Transport {
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ClientError::Server {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(ClientError::RateLimited { retry_after: None }.is_retryable());
        assert!(!ClientError::NotFound { url: "/x".into() }.is_retryable());
        assert!(!ClientError::Rejected {
            status: 400,
            message: String::new()
        }
        .is_retryable());
    }

    #[test]
    fn test_into_load_error() {
        let err: LoadError = ClientError::NotFound {
            url: "http://localhost/api/form".into(),
        }
        .into();
        assert!(matches!(err, LoadError::Fetch { retryable: false, .. }));

        let err: LoadError = ClientError::InvalidResponse {
            message: "missing field `sections`".into(),
        }
        .into();
        assert!(matches!(err, LoadError::InvalidResponse { .. }));
    }

    #[test]
    fn test_into_submission_error() {
        let err: SubmissionError = ClientError::Network {
            message: "connection refused".into(),
        }
        .into();
        assert!(matches!(
            err,
            SubmissionError::Transport { retryable: true, ref message } if message.contains("connection refused")
        ));
    }
}
