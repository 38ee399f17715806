//! Error types for harborline-client.
//!
//! The executor is the single place status codes are classified; callers
//! branch on [`ErrorKind`] or the envelope's status discriminator, never
//! on raw status codes. Each kind has a stable Display prefix so logs
//! can be pattern-matched while the server's own text stays visible.

use crate::response::Envelope;

/// Result type alias for harborline-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for harborline-client operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Diagnostic envelope for terminal HTTP failures, carrying the
    /// original status code and raw server body.
    envelope: Option<Envelope>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            source: None,
            envelope: None,
        }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            envelope: None,
        }
    }

    /// Attach the diagnostic envelope for a terminal HTTP failure.
    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = Some(envelope);
        self
    }

    /// The diagnostic envelope, if this error carries one.
    pub fn envelope(&self) -> Option<&Envelope> {
        self.envelope.as_ref()
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Returns true if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication(_))
    }

    /// Returns true if the caller's cancellation signal ended the request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Missing or invalid configuration; never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// Token exchange or 401-refresh failure; fatal after one refresh attempt.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// HTTP 403; fatal.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// HTTP 404; fatal.
    #[error("not found: {0}")]
    NotFound(String),

    /// Other 4xx; fatal, message includes the server body.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Retryable HTTP failure (5xx or other unexpected >= 300).
    #[error("HTTP error: {status} {message}")]
    Http { status: u16, message: String },

    /// Connection error; retryable.
    #[error("connection error: {0}")]
    Connection(String),

    /// Request timeout; retryable.
    #[error("request timeout")]
    Timeout,

    /// Malformed body on a success status; retryable.
    #[error("JSON error: {0}")]
    Json(String),

    /// Attempt budget spent without a terminal outcome.
    #[error("max retries exceeded after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// Caller cancelled during backoff or transport wait.
    #[error("request cancelled")]
    Cancelled,

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ErrorKind {
    /// Returns true if this error kind is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::Timeout => true,
            ErrorKind::Connection(_) => true,
            ErrorKind::Json(_) => true,
            ErrorKind::Http { status, .. } => {
                matches!(classify_status(*status), StatusClass::Retryable)
            }
            _ => false,
        }
    }
}

/// What the executor should do with an HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx: decode the body and finish.
    Success,
    /// 401: refresh the token and retry once per refresh, else fail.
    Unauthorized,
    /// 403: terminal, permission denied.
    Forbidden,
    /// 404: terminal, not found.
    NotFound,
    /// Other 4xx: terminal, invalid request.
    ClientError,
    /// 5xx and any other >= 300: retry with backoff.
    Retryable,
}

impl StatusClass {
    /// Returns true if the status ends the retry loop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StatusClass::Retryable)
    }
}

/// Classify an HTTP status code for the retry loop.
///
/// Pure, so the terminal/retryable split is testable without a mock.
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        0..=299 => StatusClass::Success,
        401 => StatusClass::Unauthorized,
        403 => StatusClass::Forbidden,
        404 => StatusClass::NotFound,
        400..=499 => StatusClass::ClientError,
        _ => StatusClass::Retryable,
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            ErrorKind::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ErrorKind::Other(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::Config(format!("invalid URL: {}", err)), err)
    }
}

impl From<harborline_auth::Error> for Error {
    fn from(err: harborline_auth::Error) -> Self {
        match err.kind {
            harborline_auth::ErrorKind::Config(ref msg) => {
                let msg = msg.clone();
                Error::with_source(ErrorKind::Config(msg), err)
            }
            _ => {
                let msg = err.to_string();
                Error::with_source(ErrorKind::Authentication(msg), err)
            }
        }
    }
}
