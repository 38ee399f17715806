//! # harborline-api
//!
//! Client library for the Harborline data platform.
//!
//! Harborline exposes a REST/GraphQL surface over a resource hierarchy
//! (organization → harbor → data dock → catalog → schema → table). This
//! library provides typed, chainable access to that surface with built-in
//! token management, retry logic, and error classification.
//!
//! ## Crates
//!
//! - **harborline-client** - Request execution core: retry with backoff,
//!   token refresh on 401, error classification, response envelopes
//! - **harborline-auth** - OIDC credential management: client-credentials
//!   and password grants, serialized token refresh
//! - **harborline-query** - Resource navigation: fluent query builder,
//!   full-text search, progressive hierarchy traversal
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use harborline_api::client::{ClientConfig, HarborClient};
//! use harborline_api::query::{NavigatorExt, Operator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder("https://api.harborline.cloud")
//!         .org_id("my-org")
//!         .token("bearer-token")
//!         .build()?;
//!
//!     let client = HarborClient::new(config)?;
//!
//!     let orders = client
//!         .query()
//!         .data_dock("dock-id")
//!         .catalog("sales")
//!         .schema("public")
//!         .table("orders")
//!         .filter("status", Operator::Eq, "shipped")
//!         .limit(10)
//!         .get()
//!         .await?;
//!
//!     println!("{}", orders.data);
//!     Ok(())
//! }
//! ```

// Re-export member crates for convenient access
#[cfg(feature = "auth")]
pub use harborline_auth as auth;
#[cfg(feature = "client")]
pub use harborline_client as client;
#[cfg(feature = "query")]
pub use harborline_query as query;
