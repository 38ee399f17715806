//! Error types for harborline-auth.
//!
//! Error messages are designed to avoid exposing credential data.

/// Result type alias for harborline-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for harborline-auth operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }
}

/// The kind of error that occurred.
///
/// Error messages avoid including credential values.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// No usable credentials are configured.
    #[error("configuration error: {0}")]
    Config(String),

    /// The token endpoint rejected the exchange.
    #[error("token exchange failed ({status}): {message}")]
    TokenExchange { status: u16, message: String },

    /// The token endpoint answered 200 but the body carried no usable token.
    #[error("token endpoint response is missing an access_token")]
    MissingAccessToken,

    /// HTTP error while reaching the token endpoint.
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Form serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Sanitize the error message to avoid exposing URLs with secrets
        let message = err.to_string();
        let sanitized = if message.contains("access_token") || message.contains("client_secret") {
            "HTTP request failed (details redacted for security)".to_string()
        } else {
            message
        };
        Error::with_source(ErrorKind::Http(sanitized), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        Error::with_source(ErrorKind::Serialization(err.to_string()), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        let err = ErrorKind::MissingAccessToken;
        assert_eq!(
            err.to_string(),
            "token endpoint response is missing an access_token"
        );

        let err = ErrorKind::TokenExchange {
            status: 401,
            message: "invalid_grant".to_string(),
        };
        assert_eq!(err.to_string(), "token exchange failed (401): invalid_grant");
    }

    // Prefixes stay lowercase (acronyms aside) across the workspace so
    // log pattern-matching sees one register
    #[test]
    fn test_display_prefix_register() {
        let kinds = [
            ErrorKind::Config("x".into()).to_string(),
            ErrorKind::TokenExchange {
                status: 500,
                message: "x".into(),
            }
            .to_string(),
            ErrorKind::MissingAccessToken.to_string(),
            ErrorKind::Serialization("x".into()).to_string(),
        ];
        for msg in kinds {
            assert!(
                msg.starts_with(|c: char| c.is_lowercase()),
                "prefix not lowercase: {msg}"
            );
        }
    }

    #[test]
    fn test_error_messages_dont_contain_credentials() {
        let err = Error::new(ErrorKind::Config("no OIDC grant configured".to_string()));
        let msg = err.to_string();
        assert!(!msg.contains("password"));
        assert!(!msg.contains("client_secret"));
    }
}
