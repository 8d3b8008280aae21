use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

pub const TIMEOUT_MESSAGE: &str =
    "Request timed out. Please check if the backend server is running.";
pub const FALLBACK_MESSAGE: &str = "An error occurred";

/// How a remote call failed, as observed by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestFailure {
    #[error("request timed out")]
    Timeout,
    #[error("backend unreachable")]
    Unreachable,
    #[error("server rejected request with status {status}")]
    Rejected { status: u16, detail: Option<String> },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("{}", .0.as_deref().unwrap_or(FALLBACK_MESSAGE))]
    Other(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    NetworkUnreachable,
    ServerRejected,
    ValidationFailed,
    MalformedResponse,
    Other,
}

/// A failure ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailed, reason)
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, reason)
    }
}

/// Maps transport failures to user-facing messages. Pure; never retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClassifier {
    base_url: String,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

impl ErrorClassifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn classify(&self, failure: &RequestFailure) -> ClientError {
        match failure {
            RequestFailure::Timeout => ClientError::new(ErrorKind::Timeout, TIMEOUT_MESSAGE),
            RequestFailure::Unreachable => ClientError::new(
                ErrorKind::NetworkUnreachable,
                format!(
                    "Cannot connect to backend server. Make sure it's running on {}.",
                    self.base_url
                ),
            ),
            RequestFailure::Rejected {
                detail: Some(detail),
                ..
            } => ClientError::new(ErrorKind::ServerRejected, detail.clone()),
            RequestFailure::Rejected {
                status,
                detail: None,
            } => ClientError::new(
                ErrorKind::ServerRejected,
                format!("Request failed with status code {status}"),
            ),
            RequestFailure::Malformed(message) => {
                ClientError::new(ErrorKind::MalformedResponse, non_empty_or_fallback(message))
            }
            RequestFailure::Other(message) => ClientError::new(
                ErrorKind::Other,
                non_empty_or_fallback(message.as_deref().unwrap_or_default()),
            ),
        }
    }

    pub fn message(&self, failure: &RequestFailure) -> String {
        self.classify(failure).message
    }
}

fn non_empty_or_fallback(message: &str) -> String {
    if message.trim().is_empty() {
        FALLBACK_MESSAGE.to_string()
    } else {
        message.to_string()
    }
}
