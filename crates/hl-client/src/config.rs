//! Client configuration.
//!
//! An immutable snapshot supplied at construction time. Credential
//! priority is fixed: client-credentials grant > password grant >
//! static token, enforced by the provider's strategy order.

use std::time::Duration;

use harborline_auth::OidcConfig;

use crate::error::{Error, ErrorKind, Result};

/// Configuration for a [`HarborClient`](crate::HarborClient).
///
/// The static token is redacted in Debug output.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the Harborline API, without a trailing slash.
    pub base_url: String,
    /// Organization (tenant) identifier.
    pub org_id: String,
    /// Default data dock identifier used by query builders.
    pub data_dock_id: String,
    /// Statically configured bearer token, lowest-priority credential.
    token: Option<String>,
    /// Accept invalid TLS certificates (local development only).
    pub accept_invalid_certs: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Maximum retry count; a request makes at most `max_retries + 1` attempts.
    pub max_retries: u32,
    /// User-Agent header value.
    pub user_agent: String,
    /// OIDC credentials for token acquisition and 401 refresh.
    pub oidc: Option<OidcConfig>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("org_id", &self.org_id)
            .field("data_dock_id", &self.data_dock_id)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_retries", &self.max_retries)
            .field("user_agent", &self.user_agent)
            .field("oidc", &self.oidc)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new config builder for the given API base URL.
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }

    /// The statically configured token, if any.
    pub(crate) fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    base_url: String,
    org_id: String,
    data_dock_id: String,
    token: Option<String>,
    accept_invalid_certs: bool,
    timeout: Duration,
    connect_timeout: Duration,
    max_retries: u32,
    user_agent: String,
    oidc: Option<OidcConfig>,
}

impl ClientConfigBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            org_id: String::new(),
            data_dock_id: String::new(),
            token: None,
            accept_invalid_certs: false,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            user_agent: crate::USER_AGENT.to_string(),
            oidc: None,
        }
    }

    /// Set the organization identifier.
    pub fn org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = org_id.into();
        self
    }

    /// Set the default data dock identifier.
    pub fn data_dock_id(mut self, data_dock_id: impl Into<String>) -> Self {
        self.data_dock_id = data_dock_id.into();
        self
    }

    /// Set a static bearer token (lowest-priority credential source).
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Accept invalid TLS certificates. Only for local development.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the maximum retry count.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set a custom User-Agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Configure OIDC credentials for token acquisition and refresh.
    pub fn oidc(mut self, oidc: OidcConfig) -> Self {
        self.oidc = Some(oidc);
        self
    }

    /// Build the configuration, validating the base URL.
    pub fn build(self) -> Result<ClientConfig> {
        let base_url = self.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::new(ErrorKind::Config(
                "base URL is required".to_string(),
            )));
        }
        url::Url::parse(&base_url)?;

        Ok(ClientConfig {
            base_url,
            org_id: self.org_id,
            data_dock_id: self.data_dock_id,
            token: self.token.filter(|t| !t.is_empty()),
            accept_invalid_certs: self.accept_invalid_certs,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            max_retries: self.max_retries,
            user_agent: self.user_agent,
            oidc: self.oidc,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ClientConfig::builder("https://api.harborline.cloud")
            .build()
            .unwrap();

        assert_eq!(config.base_url, "https://api.harborline.cloud");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert!(config.user_agent.contains("harborline-api"));
        assert!(config.token().is_none());
        assert!(config.oidc.is_none());
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let config = ClientConfig::builder("https://api.harborline.cloud/")
            .build()
            .unwrap();
        assert_eq!(config.base_url, "https://api.harborline.cloud");
    }

    #[test]
    fn test_builder_rejects_invalid_base_url() {
        assert!(ClientConfig::builder("not a url").build().is_err());
        assert!(ClientConfig::builder("").build().is_err());
    }

    #[test]
    fn test_builder_full() {
        let config = ClientConfig::builder("https://api.harborline.cloud")
            .org_id("org-1")
            .data_dock_id("dock-1")
            .token("tok")
            .timeout(Duration::from_secs(5))
            .max_retries(1)
            .build()
            .unwrap();

        assert_eq!(config.org_id, "org-1");
        assert_eq!(config.data_dock_id, "dock-1");
        assert_eq!(config.token(), Some("tok"));
        assert_eq!(config.max_retries, 1);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::builder("https://api.harborline.cloud")
            .token("super-secret")
            .build()
            .unwrap();

        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_empty_token_treated_as_absent() {
        let config = ClientConfig::builder("https://api.harborline.cloud")
            .token("")
            .build()
            .unwrap();
        assert!(config.token().is_none());
    }
}
