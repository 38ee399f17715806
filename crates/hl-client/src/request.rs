//! Logical request: the (method, URL, body) triple prior to transport framing.

use bytes::Bytes;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl RequestMethod {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A logical request handed to [`HarborClient::execute`](crate::HarborClient::execute).
///
/// The URL is expected to be fully qualified with escaped path segments
/// and query string already in place; the executor does not rewrite it.
/// Immutable once constructed.
#[derive(Debug)]
pub struct ApiRequest {
    pub(crate) method: RequestMethod,
    pub(crate) url: String,
    pub(crate) body: Option<Bytes>,
    pub(crate) cancel: Option<CancellationToken>,
}

impl ApiRequest {
    /// Create a new request.
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            cancel: None,
        }
    }

    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(RequestMethod::Get, url)
    }

    /// Create a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(RequestMethod::Post, url)
    }

    /// Create a PUT request.
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(RequestMethod::Put, url)
    }

    /// Create a PATCH request.
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(RequestMethod::Patch, url)
    }

    /// Create a DELETE request.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(RequestMethod::Delete, url)
    }

    /// Set a raw body. Sent with `Content-Type: application/json`.
    pub fn body_bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize a value as the JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(Bytes::from(serde_json::to_vec(body)?));
        Ok(self)
    }

    /// Attach a cancellation token observed during backoff sleeps and
    /// in-flight sends. Cancelling it aborts the whole retry loop.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// The request method.
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// The fully-qualified URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}
