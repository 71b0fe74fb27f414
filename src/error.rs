//! Error types for the submission flow.
//!
//! Backend failures keep their cause internally but all present the same
//! message to users.

use std::time::Duration;
use thiserror::Error;

pub const BACKEND_UNREACHABLE: &str = "Could not reach the backend.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing value for {field}")]
    Missing { field: &'static str },
    #[error("{field} must be an integer, got {value:?}")]
    NotAnInteger { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend responded with status {0}")]
    Status(u16),
    #[error("malformed response payload: {0}")]
    Decode(String),
    #[error("backend did not respond within {0:?}")]
    Timeout(Duration),
}

impl BackendError {
    /// Every backend failure collapses to one user-facing message.
    pub fn user_message(&self) -> &'static str {
        BACKEND_UNREACHABLE
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else if e.is_timeout() {
            BackendError::Transport(format!("timed out: {e}"))
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("a submission is already in flight")]
    Busy,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SubmitError {
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Invalid(e) => format!("Invalid input: {e}"),
            SubmitError::Busy => "A simulation is already running.".into(),
            SubmitError::Backend(e) => e.user_message().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_failures_share_one_message() {
        let errors = [
            BackendError::Transport("connection refused".into()),
            BackendError::Status(500),
            BackendError::Decode("expected value".into()),
            BackendError::Timeout(Duration::from_secs(60)),
        ];
        for e in errors {
            assert_eq!(SubmitError::from(e).user_message(), BACKEND_UNREACHABLE);
        }
    }

    #[test]
    fn validation_failures_name_the_field() {
        let e = SubmitError::from(ValidationError::NotAnInteger {
            field: "crew",
            value: "abc".into(),
        });
        assert_eq!(
            e.user_message(),
            "Invalid input: crew must be an integer, got \"abc\""
        );
    }
}
