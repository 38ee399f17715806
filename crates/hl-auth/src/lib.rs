//! # harborline-auth
//!
//! OIDC-based credential management for the Harborline platform.
//!
//! ## Security
//!
//! - Secrets and passwords are redacted in Debug output
//! - Tracing spans skip credential parameters
//! - Token-exchange errors never echo the submitted credentials
//!
//! ## Supported Grants
//!
//! - **Client Credentials** - machine-to-machine, client id + secret
//! - **Resource Owner Password** - username/password fallback for
//!   environments without a service client
//!
//! Grants are attempted in a fixed priority order (client credentials
//! first), both when acquiring the initial token and when a 401 forces
//! a refresh.
//!
//! ## Example
//!
//! ```rust,ignore
//! use harborline_auth::{OidcConfig, TokenProvider};
//! use std::time::Duration;
//!
//! let oidc = OidcConfig::new("https://id.harborline.cloud", "harborline")
//!     .with_client_id("service-client")
//!     .with_client_secret("s3cret");
//!
//! let provider = TokenProvider::new(Some(oidc), None, Duration::from_secs(30), false)?;
//! let token = provider.bearer_token().await;
//! ```

mod credentials;
mod error;
mod provider;

pub use credentials::{GrantStrategy, OidcConfig};
pub use error::{Error, ErrorKind, Result};
pub use provider::TokenProvider;
