//! Response envelope: the uniform success/error result every caller sees.

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Server error bodies are truncated to this many bytes before being
/// stored in an envelope or embedded in an error message.
pub(crate) const MAX_ERROR_BODY: usize = 2048;

/// Status discriminator for an [`Envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStatus {
    Ok,
    Error,
}

/// The uniform result shape returned by the request executor.
///
/// Constructed once per terminal outcome and never mutated. Callers
/// other than test doubles never synthesize one themselves.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Whether the request reached a successful outcome.
    pub status: EnvelopeStatus,
    /// Decoded response body; `Null` for error envelopes.
    pub data: serde_json::Value,
    /// Raw server error message, truncated at the transport bound.
    pub error: Option<String>,
    /// Original HTTP status code.
    pub http_code: u16,
}

impl Envelope {
    /// Build a success envelope from a decoded body.
    pub fn ok(data: serde_json::Value, http_code: u16) -> Self {
        Self {
            status: EnvelopeStatus::Ok,
            data,
            error: None,
            http_code,
        }
    }

    /// Build an error envelope from a raw server body.
    pub fn error(http_code: u16, message: impl AsRef<str>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            data: serde_json::Value::Null,
            error: Some(truncate_body(message.as_ref())),
            http_code,
        }
    }

    /// Returns true if this is a success envelope.
    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Ok
    }

    /// The error message, if this is an error envelope with one.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Deserialize the decoded data into a typed value.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.data.clone()).map_err(Error::from)
    }
}

/// Truncate a server body at the transport bound, keeping UTF-8 intact.
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    } else {
        body.to_string()
    }
}
