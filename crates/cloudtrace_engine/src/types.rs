use std::fmt;

use cloudtrace_core::{StatusSnapshot, ValidationError};
use thiserror::Error;

/// Acknowledgement body returned by `POST /benchmark`; its shape is not relied upon.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted(pub serde_json::Value);

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Answer to the one-shot check made when the dashboard opens.
    InitialStatus {
        snapshot: StatusSnapshot,
        observed_at: f64,
    },
    StatusCheckFailed(ApiError),
    /// Answer to a poll tick.
    Status {
        snapshot: StatusSnapshot,
        observed_at: f64,
    },
    StartAccepted(Accepted),
    StartFailed(SubmissionError),
    /// The engine thread could not start; no command will be answered.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
    /// `message` field of a JSON error body, when the server sent one.
    pub server_message: Option<String>,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            server_message: None,
        }
    }

    pub(crate) fn with_server_message(mut self, message: Option<String>) -> Self {
        self.server_message = message;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "invalid response body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Why `StatusPoller::start` did not start a job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("server rejected benchmark start (status {status})")]
    Rejected {
        status: u16,
        message: Option<String>,
    },
    #[error("could not reach benchmark server: {0}")]
    Transport(ApiError),
}

impl SubmissionError {
    /// Text suitable for the error banner, if there is anything better than the generic fallback.
    pub fn user_message(&self) -> Option<String> {
        match self {
            SubmissionError::Validation(err) => Some(err.to_string()),
            SubmissionError::Rejected { message, .. } => message.clone(),
            SubmissionError::Transport(_) => None,
        }
    }
}

impl From<ApiError> for SubmissionError {
    fn from(err: ApiError) -> Self {
        match err.kind {
            FailureKind::HttpStatus(status) => SubmissionError::Rejected {
                status,
                message: err.server_message,
            },
            _ => SubmissionError::Transport(err),
        }
    }
}
