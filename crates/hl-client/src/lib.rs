//! # harborline-client
//!
//! Request execution core for the Harborline API.
//!
//! This crate provides the single HTTP call pipeline every higher-level
//! builder goes through:
//! - Bounded retries with exponential backoff
//! - Token refresh and retry on 401 (without an extra backoff cycle)
//! - Error classification by status code
//! - Cancellation-aware sleeps and sends
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (harborline-query builders, direct callers)                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     HarborClient                            │
//! │  - Retry loop with backoff and attempt budget               │
//! │  - 401 → TokenProvider::refresh → retry                     │
//! │  - Terminal 4xx → classified error + diagnostic envelope    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TokenProvider                           │
//! │  (harborline-auth: OIDC grants, serialized refresh)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use harborline_client::{ApiRequest, ClientConfig, HarborClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), harborline_client::Error> {
//!     let config = ClientConfig::builder("https://api.harborline.cloud")
//!         .org_id("my-org")
//!         .token("bearer-token")
//!         .build()?;
//!
//!     let client = HarborClient::new(config)?;
//!
//!     let url = format!("{}/my-org/harbors", client.config().base_url);
//!     let envelope = client.execute(&ApiRequest::get(url)).await?;
//!     println!("{}", envelope.data);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod retry;

pub use client::HarborClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{classify_status, Error, ErrorKind, Result, StatusClass};
pub use request::{ApiRequest, RequestMethod};
pub use response::{Envelope, EnvelopeStatus};
pub use retry::Backoff;

// Re-export the auth surface callers need when configuring OIDC
pub use harborline_auth::{GrantStrategy, OidcConfig, TokenProvider};

// Re-export so builders and callers share one token type
pub use tokio_util::sync::CancellationToken;

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("harborline-api/", env!("CARGO_PKG_VERSION"));
