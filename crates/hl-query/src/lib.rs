//! Query, search, and resource-navigation builders for the Harborline API.
//!
//! Everything in this crate is a thin parameter accumulator over
//! [`HarborClient::execute`]: builders collect identifiers and query
//! parameters, validate at the terminal operation, and hand a fully
//! built request to the executor. They never interpret status codes
//! themselves.
//!
//! # Example
//!
//! ```rust,ignore
//! use harborline_client::{ClientConfig, HarborClient};
//! use harborline_query::NavigatorExt;
//!
//! let config = ClientConfig::builder("https://api.example.com")
//!     .org_id("my-org")
//!     .data_dock_id("dock-1")
//!     .token("secret")
//!     .build()?;
//! let client = HarborClient::new(config)?;
//!
//! let rows = client
//!     .query()
//!     .catalog("sales")
//!     .schema("public")
//!     .table("orders")
//!     .select(["id", "total"])
//!     .filter("total", Operator::Ge, "100")
//!     .order_by("id", Direction::Desc)
//!     .limit(50)
//!     .get()
//!     .await?;
//! ```

pub mod nav;
pub mod query;
pub mod search;

pub use nav::{CatalogScope, DataDockScope, HarborScope, OrgScope, SchemaScope};
pub use query::{Direction, Operator, QueryBuilder};
pub use search::SearchBuilder;

// Builders surface failures through the client's error taxonomy.
pub use harborline_client::{Error, ErrorKind, Result};

use harborline_client::HarborClient;

/// Entry points hanging off [`HarborClient`] for the builder surface.
pub trait NavigatorExt {
    /// Start a fluent table query. The data dock defaults to the
    /// client configuration's `data_dock_id`.
    fn query(&self) -> QueryBuilder;

    /// Start a full-text search. The data dock defaults to the
    /// client configuration's `data_dock_id`.
    fn search(&self) -> SearchBuilder;

    /// Enter the organization from the client configuration.
    fn org(&self) -> OrgScope;

    /// Enter a specific organization.
    fn org_with(&self, org_id: impl Into<String>) -> OrgScope;

    /// Jump straight to a data dock without walking the hierarchy.
    fn data_dock(&self, data_dock_id: impl Into<String>) -> DataDockScope;
}

impl NavigatorExt for HarborClient {
    fn query(&self) -> QueryBuilder {
        QueryBuilder::new(self.clone())
    }

    fn search(&self) -> SearchBuilder {
        SearchBuilder::new(self.clone())
    }

    fn org(&self) -> OrgScope {
        let org_id = self.config().org_id.clone();
        OrgScope::new(self.clone(), org_id)
    }

    fn org_with(&self, org_id: impl Into<String>) -> OrgScope {
        OrgScope::new(self.clone(), org_id.into())
    }

    fn data_dock(&self, data_dock_id: impl Into<String>) -> DataDockScope {
        DataDockScope::new(self.clone(), data_dock_id.into())
    }
}
