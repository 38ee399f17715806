//! OIDC credential configuration and grant strategy selection.
//!
//! The set of configured credentials determines which grants are usable.
//! Priority is fixed: client credentials first, password grant as the
//! fallback. `OidcConfig::strategies` materializes that order as a list
//! so both the initial acquisition and the 401-refresh path walk the
//! same sequence.

/// OIDC configuration for a Harborline identity realm.
///
/// Sensitive fields (`client_secret`, `password`) are redacted in Debug
/// output to prevent accidental exposure in logs.
#[derive(Clone)]
pub struct OidcConfig {
    /// Base URL of the OIDC issuer (without the realm path).
    pub issuer_url: String,
    /// Realm name under the issuer.
    pub realm: String,
    /// OAuth2 client id.
    pub client_id: String,
    client_secret: Option<String>,
    /// Username for the resource-owner password grant.
    pub username: Option<String>,
    password: Option<String>,
}

impl std::fmt::Debug for OidcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcConfig")
            .field("issuer_url", &self.issuer_url)
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl OidcConfig {
    /// Create a new OIDC config for the given issuer and realm.
    pub fn new(issuer_url: impl Into<String>, realm: impl Into<String>) -> Self {
        Self {
            issuer_url: issuer_url.into().trim_end_matches('/').to_string(),
            realm: realm.into(),
            client_id: String::new(),
            client_secret: None,
            username: None,
            password: None,
        }
    }

    /// Set the OAuth2 client id.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Set the client secret (enables the client-credentials grant).
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Set username and password (enables the password grant).
    pub fn with_password_grant(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Get the client secret (for internal use).
    pub(crate) fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub(crate) fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// The token endpoint URL for this issuer/realm.
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.issuer_url, self.realm
        )
    }

    /// Returns true if the client-credentials grant can be attempted.
    pub fn has_client_credentials(&self) -> bool {
        !self.client_id.is_empty() && self.client_secret.is_some()
    }

    /// Returns true if the password grant can be attempted.
    pub fn has_password_credentials(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty())
            && self.password.is_some()
    }

    /// Usable grant strategies in priority order.
    ///
    /// Client credentials win over the password grant; the returned order
    /// is the order exchanges are attempted in.
    pub fn strategies(&self) -> Vec<GrantStrategy> {
        let mut strategies = Vec::new();
        if self.has_client_credentials() {
            strategies.push(GrantStrategy::ClientCredentials);
        }
        if self.has_password_credentials() {
            strategies.push(GrantStrategy::Password);
        }
        strategies
    }
}

/// A single OIDC grant the provider knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantStrategy {
    /// Machine-to-machine flow using client id + secret.
    ClientCredentials,
    /// Resource-owner password flow using username + password.
    Password,
}

impl GrantStrategy {
    /// The `grant_type` value sent on the wire.
    pub fn grant_type(&self) -> &'static str {
        match self {
            GrantStrategy::ClientCredentials => "client_credentials",
            GrantStrategy::Password => "password",
        }
    }

    /// Compose the form body for this grant from the configured credentials.
    pub(crate) fn form(&self, config: &OidcConfig) -> Vec<(&'static str, String)> {
        match self {
            GrantStrategy::ClientCredentials => vec![
                ("grant_type", self.grant_type().to_string()),
                ("client_id", config.client_id.clone()),
                (
                    "client_secret",
                    config.client_secret().unwrap_or_default().to_string(),
                ),
            ],
            GrantStrategy::Password => vec![
                ("grant_type", self.grant_type().to_string()),
                ("client_id", config.client_id.clone()),
                (
                    "username",
                    config.username.clone().unwrap_or_default(),
                ),
                ("password", config.password().unwrap_or_default().to_string()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_endpoint() {
        let oidc = OidcConfig::new("https://id.harborline.cloud/", "harborline");
        assert_eq!(
            oidc.token_endpoint(),
            "https://id.harborline.cloud/realms/harborline/protocol/openid-connect/token"
        );
    }

    #[test]
    fn test_strategy_priority_order() {
        let oidc = OidcConfig::new("https://id.example.com", "r")
            .with_client_id("cid")
            .with_client_secret("secret")
            .with_password_grant("user", "pass");

        assert_eq!(
            oidc.strategies(),
            vec![GrantStrategy::ClientCredentials, GrantStrategy::Password]
        );
    }

    #[test]
    fn test_password_only() {
        let oidc = OidcConfig::new("https://id.example.com", "r")
            .with_client_id("cid")
            .with_password_grant("user", "pass");

        assert_eq!(oidc.strategies(), vec![GrantStrategy::Password]);
    }

    #[test]
    fn test_no_credentials_no_strategies() {
        let oidc = OidcConfig::new("https://id.example.com", "r");
        assert!(oidc.strategies().is_empty());
    }

    #[test]
    fn test_client_credentials_form() {
        let oidc = OidcConfig::new("https://id.example.com", "r")
            .with_client_id("cid")
            .with_client_secret("secret");

        let form = GrantStrategy::ClientCredentials.form(&oidc);
        assert!(form.contains(&("grant_type", "client_credentials".to_string())));
        assert!(form.contains(&("client_id", "cid".to_string())));
        assert!(form.contains(&("client_secret", "secret".to_string())));
    }

    #[test]
    fn test_password_form() {
        let oidc = OidcConfig::new("https://id.example.com", "r")
            .with_client_id("cid")
            .with_password_grant("demo", "hunter2");

        let form = GrantStrategy::Password.form(&oidc);
        assert!(form.contains(&("grant_type", "password".to_string())));
        assert!(form.contains(&("username", "demo".to_string())));
        assert!(form.contains(&("password", "hunter2".to_string())));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let oidc = OidcConfig::new("https://id.example.com", "r")
            .with_client_id("cid")
            .with_client_secret("very-secret")
            .with_password_grant("demo", "hunter2");

        let debug = format!("{:?}", oidc);
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
