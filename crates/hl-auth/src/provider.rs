//! Token provider: cached bearer token plus on-demand OIDC refresh.
//!
//! The cached token is read lock-free on the request hot path (a short
//! `RwLock` read). Refreshes serialize on an async mutex held for the
//! whole exchange round trip, so two callers hitting a 401 in the same
//! expiry window converge on a single token exchange: the second caller
//! waits on the gate, observes that the token changed while it waited,
//! and reuses the fresh one instead of exchanging again.

use std::sync::RwLock;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::credentials::OidcConfig;
use crate::error::{Error, ErrorKind, Result};

/// Token-endpoint error bodies are truncated to this many bytes before
/// they are embedded in error messages.
const MAX_ERROR_BODY: usize = 2048;

/// Produces and refreshes bearer tokens for a single client instance.
///
/// Owns the token cache; there is no process-global state, so unrelated
/// client instances never share credentials.
pub struct TokenProvider {
    oidc: Option<OidcConfig>,
    static_token: Option<String>,
    token: RwLock<String>,
    refresh_gate: tokio::sync::Mutex<()>,
    // Dedicated transport for the token endpoint, separate from the main
    // request pool, so a refresh can never deadlock behind a request that
    // is itself waiting on the refresh.
    http: reqwest::Client,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("oidc", &self.oidc)
            .field("static_token", &self.static_token.as_ref().map(|_| "[REDACTED]"))
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl TokenProvider {
    /// Create a provider from the configured credential sources.
    ///
    /// `timeout` and `accept_invalid_certs` mirror the owning client's
    /// transport settings.
    pub fn new(
        oidc: Option<OidcConfig>,
        static_token: Option<String>,
        timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self {
            oidc,
            static_token: static_token.filter(|t| !t.is_empty()),
            token: RwLock::new(String::new()),
            refresh_gate: tokio::sync::Mutex::new(()),
            http,
        })
    }

    /// The currently cached token, empty if none has been acquired yet.
    pub fn current(&self) -> String {
        self.token
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    /// Seed the token cache, e.g. when resuming a session with a
    /// previously issued token.
    pub fn prime(&self, token: &str) {
        self.store(token);
    }

    fn store(&self, token: &str) {
        let mut slot = self
            .token
            .write()
            .unwrap_or_else(|poison| poison.into_inner());
        *slot = token.to_string();
    }

    /// Returns true if an OIDC grant is configured, i.e. a 401 can be
    /// answered with a token refresh.
    pub fn has_refresh_scheme(&self) -> bool {
        self.oidc
            .as_ref()
            .is_some_and(|oidc| !oidc.strategies().is_empty())
    }

    /// Get a bearer token for outbound requests.
    ///
    /// Returns the cached token if one exists; otherwise acquires one via
    /// the highest-priority configured grant, falling back to the static
    /// token. An empty return means no credential source yielded a token
    /// and must be treated as a configuration error by the caller.
    pub async fn bearer_token(&self) -> String {
        let cached = self.current();
        if !cached.is_empty() {
            return cached;
        }

        if self.has_refresh_scheme() {
            match self.refresh().await {
                Ok(token) => return token,
                Err(err) => {
                    warn!(error = %err, "initial token acquisition failed, falling back to static token");
                }
            }
        }

        if let Some(token) = &self.static_token {
            self.store(token);
            return token.clone();
        }

        String::new()
    }

    /// Re-acquire a token, trying each configured grant in priority order.
    ///
    /// Serialized: the gate is held across the whole exchange round trip.
    /// A caller that waited out another refresh reuses its result.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<String> {
        let stale = self.current();
        let _gate = self.refresh_gate.lock().await;

        let now = self.current();
        if now != stale && !now.is_empty() {
            debug!("token already refreshed by a concurrent caller");
            return Ok(now);
        }

        let oidc = self.oidc.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::Config(
                "no OIDC credentials configured for refresh".to_string(),
            ))
        })?;

        let strategies = oidc.strategies();
        if strategies.is_empty() {
            return Err(Error::new(ErrorKind::Config(
                "no OIDC grant is configured".to_string(),
            )));
        }

        let mut last_err = None;
        for strategy in strategies {
            match self.exchange(oidc, &strategy.form(oidc)).await {
                Ok(token) => {
                    debug!(grant = strategy.grant_type(), "token exchange succeeded");
                    self.store(&token);
                    return Ok(token);
                }
                Err(err) => {
                    warn!(
                        grant = strategy.grant_type(),
                        error = %err,
                        "token exchange failed, trying next grant"
                    );
                    last_err = Some(err);
                }
            }
        }

        // strategies was non-empty, so at least one error was recorded
        Err(last_err.expect("at least one grant was attempted"))
    }

    /// Perform one token-endpoint call with the given form body.
    #[instrument(skip(self, form))]
    async fn exchange(&self, oidc: &OidcConfig, form: &[(&str, String)]) -> Result<String> {
        let body = serde_urlencoded::to_string(form)?;

        let response = self
            .http
            .post(oidc.token_endpoint())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if status != 200 {
            return Err(Error::new(ErrorKind::TokenExchange {
                status,
                message: truncate_body(&body),
            }));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)?;
        match parsed.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(Error::new(ErrorKind::MissingAccessToken)),
        }
    }
}

/// Token endpoint success body; only `access_token` is of interest.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

fn truncate_body(body: &str) -> String {
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
