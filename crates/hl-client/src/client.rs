//! The request executor: one logical HTTP call with bounded resilience.
//!
//! Per invocation the loop walks attempts 0..=max_retries:
//! backoff (cancellable, skipped on attempt 0 and after a 401 refresh),
//! build + send, then classify the status. Transport errors, 5xx, and
//! malformed success bodies are retried; 401 triggers one token refresh
//! per occurrence; 403/404/other 4xx are terminal. A cancelled caller
//! ends the loop immediately and never counts as exhaustion.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use harborline_auth::TokenProvider;

use crate::config::ClientConfig;
use crate::error::{classify_status, Error, ErrorKind, Result, StatusClass};
use crate::request::ApiRequest;
use crate::response::{truncate_body, Envelope};
use crate::retry::Backoff;

/// HTTP client for the Harborline API with retry, token refresh, and
/// error classification.
///
/// Cheap to clone; clones share the transport pool and the token cache.
#[derive(Debug, Clone)]
pub struct HarborClient {
    http: reqwest::Client,
    config: ClientConfig,
    tokens: Arc<TokenProvider>,
    backoff: Backoff,
}

impl HarborClient {
    /// Create a new client from the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        let tokens = TokenProvider::new(
            config.oidc.clone(),
            config.token().map(str::to_string),
            config.timeout,
            config.accept_invalid_certs,
        )?;

        Ok(Self {
            http,
            config,
            tokens: Arc::new(tokens),
            backoff: Backoff::default(),
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the token provider, e.g. to prime it with a resumed session token.
    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    /// Execute a logical request to completion.
    ///
    /// Returns an ok envelope on a decoded 2xx. Terminal HTTP failures
    /// return a classified error that carries the diagnostic envelope
    /// (see [`Error::envelope`]). Transient failures are retried up to
    /// `max_retries` times before surfacing as `RetriesExhausted`.
    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    pub async fn execute(&self, request: &ApiRequest) -> Result<Envelope> {
        let mut last_err: Option<Error> = None;
        let mut last_envelope: Option<Envelope> = None;
        let mut skip_backoff = false;

        let mut attempt: u32 = 0;
        while attempt <= self.config.max_retries {
            if attempt > 0 && !skip_backoff {
                self.sleep(self.backoff.delay(attempt), request.cancel.as_ref())
                    .await?;
            }
            skip_backoff = false;

            let token = self.tokens.bearer_token().await;
            if token.is_empty() {
                return Err(Error::new(ErrorKind::Config(
                    "no bearer token available: configure a static token or OIDC credentials"
                        .to_string(),
                )));
            }

            let outcome = match request.cancel.as_ref() {
                Some(cancel) => tokio::select! {
                    _ = cancel.cancelled() => return Err(Error::new(ErrorKind::Cancelled)),
                    outcome = self.send_once(request, &token) => outcome,
                },
                None => self.send_once(request, &token).await,
            };

            let response = match outcome {
                Ok(response) => response,
                Err(err) => {
                    warn!(attempt, error = %err, "transport error");
                    last_err = Some(err);
                    attempt += 1;
                    continue;
                }
            };

            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();

            match classify_status(status) {
                StatusClass::Success => match serde_json::from_str::<serde_json::Value>(&body) {
                    Ok(data) => {
                        debug!(status, attempt, "request succeeded");
                        return Ok(Envelope::ok(data, status));
                    }
                    Err(err) => {
                        // Malformed success body: treated as transient
                        warn!(status, attempt, error = %err, "unparseable response body");
                        last_err = Some(Error::from(err));
                        attempt += 1;
                        continue;
                    }
                },
                StatusClass::Unauthorized => {
                    let envelope = Envelope::error(status, &body);
                    if self.tokens.has_refresh_scheme() {
                        // The exchange round trip is cancellable like any
                        // other outbound wait
                        let refreshed = match request.cancel.as_ref() {
                            Some(cancel) => tokio::select! {
                                _ = cancel.cancelled() => {
                                    return Err(Error::new(ErrorKind::Cancelled))
                                }
                                refreshed = self.tokens.refresh() => refreshed,
                            },
                            None => self.tokens.refresh().await,
                        };
                        match refreshed {
                            Ok(_) => {
                                debug!(attempt, "token refreshed after 401");
                                last_envelope = Some(envelope);
                                // Retry with the new token right away; the
                                // refresh round trip replaces the backoff
                                skip_backoff = true;
                                attempt += 1;
                                continue;
                            }
                            Err(err) => {
                                return Err(Error::from(err).with_envelope(envelope));
                            }
                        }
                    }
                    return Err(Error::new(ErrorKind::Authentication(
                        "server rejected the bearer token and no OIDC credentials are configured"
                            .to_string(),
                    ))
                    .with_envelope(envelope));
                }
                StatusClass::Forbidden => {
                    return Err(
                        Error::new(ErrorKind::PermissionDenied(truncate_body(&body)))
                            .with_envelope(Envelope::error(status, &body)),
                    );
                }
                StatusClass::NotFound => {
                    return Err(Error::new(ErrorKind::NotFound(truncate_body(&body)))
                        .with_envelope(Envelope::error(status, &body)));
                }
                StatusClass::ClientError => {
                    return Err(Error::new(ErrorKind::InvalidRequest(truncate_body(&body)))
                        .with_envelope(Envelope::error(status, &body)));
                }
                StatusClass::Retryable => {
                    warn!(status, attempt, "retryable server status");
                    last_envelope = Some(Envelope::error(status, &body));
                    last_err = Some(Error::new(ErrorKind::Http {
                        status,
                        message: truncate_body(&body),
                    }));
                    attempt += 1;
                }
            }
        }

        let attempts = self.config.max_retries + 1;
        if let Some(envelope) = last_envelope {
            let last = envelope
                .error_message()
                .unwrap_or("unspecified server error")
                .to_string();
            return Err(
                Error::new(ErrorKind::RetriesExhausted { attempts, last }).with_envelope(envelope)
            );
        }

        let last = last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt completed".to_string());
        Err(Error::new(ErrorKind::RetriesExhausted { attempts, last }))
    }

    /// Execute a GraphQL query against the organization's endpoint.
    pub async fn graphql(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<Envelope> {
        if self.config.org_id.is_empty() {
            return Err(Error::new(ErrorKind::Config(
                "organization id is required for GraphQL requests".to_string(),
            )));
        }
        if query.is_empty() {
            return Err(Error::new(ErrorKind::InvalidRequest(
                "GraphQL query cannot be empty".to_string(),
            )));
        }

        let mut payload = serde_json::json!({ "query": query });
        if let Some(vars) = variables {
            payload["variables"] = vars;
        }

        let url = format!("{}/{}/graphql", self.config.base_url, self.config.org_id);
        let request = ApiRequest::post(url).json(&payload)?;
        self.execute(&request).await
    }

    /// Issue one outbound call with the given bearer token.
    async fn send_once(&self, request: &ApiRequest, token: &str) -> Result<reqwest::Response> {
        let mut req = self
            .http
            .request(request.method.to_reqwest(), &request.url)
            .bearer_auth(token);

        if let Some(body) = &request.body {
            req = req
                .header("Content-Type", "application/json")
                .body(body.clone());
        }

        debug!(method = ?request.method, url = %request.url, "sending request");
        Ok(req.send().await?)
    }

    /// Backoff sleep that observes the caller's cancellation signal.
    async fn sleep(&self, delay: Duration, cancel: Option<&CancellationToken>) -> Result<()> {
        match cancel {
            Some(cancel) => tokio::select! {
                _ = cancel.cancelled() => Err(Error::new(ErrorKind::Cancelled)),
                _ = tokio::time::sleep(delay) => Ok(()),
            },
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ApiRequest;
    use harborline_auth::OidcConfig;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_with(server: &MockServer, max_retries: u32) -> HarborClient {
        let config = ClientConfig::builder(server.uri())
            .org_id("org-1")
            .token("test-token")
            .max_retries(max_retries)
            .build()
            .unwrap();
        HarborClient::new(config).unwrap()
    }

    fn oidc_client_with(server: &MockServer, max_retries: u32) -> HarborClient {
        let oidc = OidcConfig::new(server.uri(), "harborline")
            .with_client_id("svc")
            .with_client_secret("s3cret");
        let config = ClientConfig::builder(server.uri())
            .org_id("org-1")
            .max_retries(max_retries)
            .oidc(oidc)
            .build()
            .unwrap();
        HarborClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_ok_envelope_round_trip() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": "success" })),
            )
            .mount(&server)
            .await;

        let client = client_with(&server, 0);
        let envelope = client
            .execute(&ApiRequest::get(format!("{}/data", server.uri())))
            .await
            .unwrap();

        assert!(envelope.is_success());
        assert_eq!(envelope.http_code, 200);
        assert_eq!(envelope.data, serde_json::json!({ "data": "success" }));
    }

    #[tokio::test]
    async fn test_always_500_makes_n_plus_1_attempts() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_with(&server, 2);
        let err = client
            .execute(&ApiRequest::get(format!("{}/flaky", server.uri())))
            .await
            .unwrap_err();

        assert!(
            matches!(err.kind, ErrorKind::RetriesExhausted { attempts: 3, .. }),
            "unexpected kind: {:?}",
            err.kind
        );
        let envelope = err.envelope().unwrap();
        assert_eq!(envelope.http_code, 500);
        assert_eq!(envelope.error_message(), Some("boom"));
    }

    #[tokio::test]
    async fn test_500_then_200_recovers() {
        let server = MockServer::start().await;
        let calls = std::sync::Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        Mock::given(method("GET"))
            .and(path("/recover"))
            .respond_with(move |_: &wiremock::Request| {
                if calls_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                    ResponseTemplate::new(500)
                } else {
                    ResponseTemplate::new(200)
                        .set_body_json(serde_json::json!({ "data": "success" }))
                }
            })
            .mount(&server)
            .await;

        let client = client_with(&server, 1);
        let envelope = client
            .execute(&ApiRequest::get(format!("{}/recover", server.uri())))
            .await
            .unwrap();

        assert!(envelope.is_success());
        assert_eq!(envelope.data["data"], "success");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_403_terminates_after_one_attempt() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/secret"))
            .respond_with(ResponseTemplate::new(403).set_body_string("no access"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with(&server, 5);
        let err = client
            .execute(&ApiRequest::get(format!("{}/secret", server.uri())))
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::PermissionDenied(_)));
        assert_eq!(err.envelope().unwrap().http_code, 403);
    }

    #[tokio::test]
    async fn test_404_terminates_after_one_attempt() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such table"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with(&server, 5);
        let err = client
            .execute(&ApiRequest::get(format!("{}/missing", server.uri())))
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::NotFound(_)));
        assert!(err.to_string().contains("no such table"));
    }

    #[tokio::test]
    async fn test_400_returns_invalid_request_with_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad column"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with(&server, 3);
        let err = client
            .execute(&ApiRequest::get(format!("{}/bad", server.uri())))
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::InvalidRequest(_)));
        assert!(err.to_string().contains("bad column"));
        assert_eq!(err.envelope().unwrap().http_code, 400);
    }

    #[tokio::test]
    async fn test_no_credentials_fails_without_network() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = ClientConfig::builder(server.uri()).build().unwrap();
        let client = HarborClient::new(config).unwrap();
        let err = client
            .execute(&ApiRequest::get(format!("{}/data", server.uri())))
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::Config(_)));
    }

    #[tokio::test]
    async fn test_401_refreshes_once_and_retries_without_backoff() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/realms/harborline/protocol/openid-connect/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "fresh-token" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/data"))
            .and(header("Authorization", "Bearer stale-token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/data"))
            .and(header("Authorization", "Bearer fresh-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": "success" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = oidc_client_with(&server, 3);
        client.tokens().prime("stale-token");

        let started = Instant::now();
        let envelope = client
            .execute(&ApiRequest::get(format!("{}/data", server.uri())))
            .await
            .unwrap();

        assert!(envelope.is_success());
        // The refresh path must not insert the 100ms backoff sleep
        assert!(
            started.elapsed() < Duration::from_millis(100),
            "401 retry took {:?}",
            started.elapsed()
        );
    }

    #[tokio::test]
    async fn test_401_without_oidc_is_terminal() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with(&server, 3);
        let err = client
            .execute(&ApiRequest::get(format!("{}/data", server.uri())))
            .await
            .unwrap_err();

        assert!(err.is_auth_error());
        assert_eq!(err.envelope().unwrap().http_code, 401);
    }

    #[tokio::test]
    async fn test_concurrent_401s_trigger_single_refresh() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/realms/harborline/protocol/openid-connect/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "fresh-token" }))
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/data"))
            .and(header("Authorization", "Bearer stale-token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/data"))
            .and(header("Authorization", "Bearer fresh-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": "success" })),
            )
            .mount(&server)
            .await;

        let client = oidc_client_with(&server, 3);
        client.tokens().prime("stale-token");

        let url = format!("{}/data", server.uri());
        let first = ApiRequest::get(url.clone());
        let second = ApiRequest::get(url);
        let (a, b) = tokio::join!(client.execute(&first), client.execute(&second));

        assert!(a.unwrap().is_success());
        assert!(b.unwrap().is_success());
        // expect(1) on the token mock verifies a single exchange on drop
    }

    #[tokio::test]
    async fn test_cancellation_during_backoff() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_with(&server, 8);
        let cancel = CancellationToken::new();
        let request = ApiRequest::get(format!("{}/flaky", server.uri()))
            .with_cancellation(cancel.clone());

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(150)).await;
                cancel.cancel();
            })
        };

        let started = Instant::now();
        let err = client.execute(&request).await.unwrap_err();
        canceller.await.unwrap();

        assert!(err.is_cancelled(), "unexpected kind: {:?}", err.kind);
        // Cancelled promptly, long before the attempt budget could drain
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_cancellation_during_token_refresh() {
        let server = MockServer::start().await;

        // Stalled token endpoint: the exchange would take 2s to finish
        Mock::given(method("POST"))
            .and(path("/realms/harborline/protocol/openid-connect/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "fresh-token" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&server)
            .await;

        let client = oidc_client_with(&server, 3);
        client.tokens().prime("stale-token");

        let cancel = CancellationToken::new();
        let request = ApiRequest::get(format!("{}/data", server.uri()))
            .with_cancellation(cancel.clone());

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                cancel.cancel();
            })
        };

        let started = Instant::now();
        let err = client.execute(&request).await.unwrap_err();
        canceller.await.unwrap();

        assert!(err.is_cancelled(), "unexpected kind: {:?}", err.kind);
        // Must return as soon as the signal fires, not after the exchange
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "cancellation was deferred for {:?}",
            started.elapsed()
        );
    }

    #[tokio::test]
    async fn test_unparseable_success_body_is_retried() {
        let server = MockServer::start().await;
        let calls = std::sync::Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        Mock::given(method("GET"))
            .and(path("/garbled"))
            .respond_with(move |_: &wiremock::Request| {
                if calls_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                    ResponseTemplate::new(200).set_body_string("not json at all")
                } else {
                    ResponseTemplate::new(200)
                        .set_body_json(serde_json::json!({ "data": "success" }))
                }
            })
            .mount(&server)
            .await;

        let client = client_with(&server, 1);
        let envelope = client
            .execute(&ApiRequest::get(format!("{}/garbled", server.uri())))
            .await
            .unwrap();

        assert!(envelope.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_graphql_request_shape() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/org-1/graphql"))
            .and(wiremock::matchers::body_partial_json(
                serde_json::json!({ "query": "{ harbors { id } }" }),
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "data": { "harbors": [] } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with(&server, 0);
        let envelope = client.graphql("{ harbors { id } }", None).await.unwrap();
        assert!(envelope.is_success());
    }

    #[tokio::test]
    async fn test_graphql_requires_org_id() {
        let server = MockServer::start().await;
        let config = ClientConfig::builder(server.uri())
            .token("t")
            .build()
            .unwrap();
        let client = HarborClient::new(config).unwrap();

        let err = client.graphql("{ harbors { id } }", None).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
    }
}
