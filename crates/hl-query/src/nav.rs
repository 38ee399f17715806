//! Progressive navigation over the resource hierarchy:
//! organization → harbor → data dock → catalog → schema → table.
//!
//! Each scope is a cheap value holding the identifiers collected so
//! far. Navigation methods return the next scope; action methods build
//! a request and hand it to the executor. The final step,
//! [`SchemaScope::table`], hands off to a [`QueryBuilder`] so the
//! hierarchy flows straight into a query chain.

use serde::Deserialize;

use harborline_client::{ApiRequest, Envelope, Error, ErrorKind, HarborClient, Result};

use crate::query::QueryBuilder;
use crate::search::SearchBuilder;

/// Organization scope.
#[derive(Debug, Clone)]
pub struct OrgScope {
    client: HarborClient,
    org_id: String,
}

impl OrgScope {
    pub(crate) fn new(client: HarborClient, org_id: String) -> Self {
        Self { client, org_id }
    }

    /// Enter a harbor in this organization.
    pub fn harbor(&self, harbor_id: impl Into<String>) -> HarborScope {
        HarborScope {
            client: self.client.clone(),
            harbor_id: harbor_id.into(),
        }
    }

    /// List all harbors in this organization.
    pub async fn list_harbors(&self) -> Result<Envelope> {
        let url = format!("{}/{}/harbors", self.base(), self.escaped_org()?);
        self.client.execute(&ApiRequest::get(url)).await
    }

    /// Create a new harbor.
    pub async fn create_harbor(&self, name: &str) -> Result<Envelope> {
        let url = format!("{}/{}/harbors", self.base(), self.escaped_org()?);
        let request = ApiRequest::post(url).json(&serde_json::json!({ "name": name }))?;
        self.client.execute(&request).await
    }

    /// List all data docks across every harbor in this organization.
    pub async fn list_data_docks(&self) -> Result<Envelope> {
        let url = format!("{}/{}/data-docks", self.base(), self.escaped_org()?);
        self.client.execute(&ApiRequest::get(url)).await
    }

    /// Trigger a catalog refresh on every data dock in this organization.
    pub async fn refresh_all_data_docks(&self) -> Result<Envelope> {
        let url = format!("{}/{}/data-docks/refresh", self.base(), self.escaped_org()?);
        self.client.execute(&ApiRequest::post(url)).await
    }

    fn base(&self) -> &str {
        &self.client.config().base_url
    }

    fn escaped_org(&self) -> Result<String> {
        if self.org_id.is_empty() {
            return Err(Error::new(ErrorKind::InvalidRequest(
                "organization id is required".to_string(),
            )));
        }
        Ok(urlencoding::encode(&self.org_id).into_owned())
    }
}

/// Harbor scope.
#[derive(Debug, Clone)]
pub struct HarborScope {
    client: HarborClient,
    harbor_id: String,
}

impl HarborScope {
    /// Enter a data dock in this harbor.
    pub fn data_dock(&self, data_dock_id: impl Into<String>) -> DataDockScope {
        DataDockScope::new(self.client.clone(), data_dock_id.into())
    }

    /// List all data docks in this harbor.
    pub async fn list_data_docks(&self) -> Result<Envelope> {
        let url = format!(
            "{}/harbors/{}/data-docks",
            self.client.config().base_url,
            urlencoding::encode(&self.harbor_id),
        );
        self.client.execute(&ApiRequest::get(url)).await
    }

    /// Create a data dock in this harbor. The harbor id is merged into
    /// the submitted configuration.
    pub async fn create_data_dock(&self, config: serde_json::Value) -> Result<Envelope> {
        let mut config = config;
        config["harbor_id"] = serde_json::Value::String(self.harbor_id.clone());

        let url = format!("{}/data-docks", self.client.config().base_url);
        let request = ApiRequest::post(url).json(&config)?;
        self.client.execute(&request).await
    }

    /// Delete this harbor.
    pub async fn delete(&self) -> Result<Envelope> {
        let url = format!(
            "{}/harbors/{}",
            self.client.config().base_url,
            urlencoding::encode(&self.harbor_id),
        );
        self.client.execute(&ApiRequest::delete(url)).await
    }
}

/// Data dock scope.
#[derive(Debug, Clone)]
pub struct DataDockScope {
    client: HarborClient,
    data_dock_id: String,
}

impl DataDockScope {
    pub(crate) fn new(client: HarborClient, data_dock_id: String) -> Self {
        Self {
            client,
            data_dock_id,
        }
    }

    /// Enter a catalog in this data dock.
    pub fn catalog(&self, name: impl Into<String>) -> CatalogScope {
        CatalogScope {
            client: self.client.clone(),
            data_dock_id: self.data_dock_id.clone(),
            catalog: name.into(),
        }
    }

    /// Start a full-text search scoped to this data dock.
    pub fn search(&self, query: impl Into<String>) -> SearchBuilder {
        SearchBuilder::new(self.client.clone())
            .data_dock(self.data_dock_id.clone())
            .query(query)
    }

    /// Get this data dock's details.
    pub async fn get(&self) -> Result<Envelope> {
        self.client.execute(&ApiRequest::get(self.url(""))).await
    }

    /// Update this data dock's configuration.
    pub async fn update(&self, config: &serde_json::Value) -> Result<Envelope> {
        let request = ApiRequest::patch(self.url("")).json(config)?;
        self.client.execute(&request).await
    }

    /// Delete this data dock.
    pub async fn delete(&self) -> Result<Envelope> {
        self.client.execute(&ApiRequest::delete(self.url(""))).await
    }

    /// Get the full catalog metadata (catalogs, schemas, tables, columns).
    pub async fn get_catalog(&self) -> Result<Envelope> {
        self.client
            .execute(&ApiRequest::get(self.url("/catalog")))
            .await
    }

    /// Trigger catalog introspection so the metadata reflects the
    /// current state of the underlying store.
    pub async fn refresh_catalog(&self) -> Result<Envelope> {
        self.client
            .execute(&ApiRequest::post(self.url("/catalog/refresh")))
            .await
    }

    /// Bring the data dock online.
    pub async fn wake_up(&self) -> Result<Envelope> {
        self.client
            .execute(&ApiRequest::post(self.url("/wake-up")))
            .await
    }

    /// Put the data dock to sleep.
    pub async fn sleep(&self) -> Result<Envelope> {
        self.client
            .execute(&ApiRequest::post(self.url("/sleep")))
            .await
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/data-docks/{}{}",
            self.client.config().base_url,
            urlencoding::encode(&self.data_dock_id),
            suffix,
        )
    }
}

/// Catalog scope.
#[derive(Debug, Clone)]
pub struct CatalogScope {
    client: HarborClient,
    data_dock_id: String,
    catalog: String,
}

impl CatalogScope {
    /// Enter a schema in this catalog.
    pub fn schema(&self, name: impl Into<String>) -> SchemaScope {
        SchemaScope {
            client: self.client.clone(),
            data_dock_id: self.data_dock_id.clone(),
            catalog: self.catalog.clone(),
            schema: name.into(),
        }
    }

    /// List schema names in this catalog, extracted from the data
    /// dock's catalog metadata.
    pub async fn list_schemas(&self) -> Result<Vec<String>> {
        let listing = fetch_catalog_listing(&self.client, &self.data_dock_id).await?;
        Ok(listing
            .catalog(&self.catalog)
            .map(|c| c.schemas.iter().map(|s| s.schema_name.clone()).collect())
            .unwrap_or_default())
    }
}

/// Schema scope.
#[derive(Debug, Clone)]
pub struct SchemaScope {
    client: HarborClient,
    data_dock_id: String,
    catalog: String,
    schema: String,
}

impl SchemaScope {
    /// Hand off to a query builder pre-seeded with this schema's
    /// coordinates; chain query methods and a terminal operation.
    pub fn table(&self, name: impl Into<String>) -> QueryBuilder {
        QueryBuilder::new(self.client.clone())
            .data_dock(self.data_dock_id.clone())
            .catalog(self.catalog.clone())
            .schema(self.schema.clone())
            .table(name)
    }

    /// List table names in this schema, extracted from the data dock's
    /// catalog metadata.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let listing = fetch_catalog_listing(&self.client, &self.data_dock_id).await?;
        Ok(listing
            .catalog(&self.catalog)
            .and_then(|c| c.schemas.iter().find(|s| s.schema_name == self.schema))
            .map(|s| s.tables.iter().map(|t| t.table_name.clone()).collect())
            .unwrap_or_default())
    }
}

// Catalog metadata shape returned by `GET /data-docks/{id}/catalog`.

#[derive(Debug, Clone, Deserialize)]
struct CatalogListing {
    #[serde(default)]
    catalogs: Vec<CatalogMeta>,
}

impl CatalogListing {
    fn catalog(&self, name: &str) -> Option<&CatalogMeta> {
        self.catalogs.iter().find(|c| c.catalog_name == name)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogMeta {
    catalog_name: String,
    #[serde(default)]
    schemas: Vec<SchemaMeta>,
}

#[derive(Debug, Clone, Deserialize)]
struct SchemaMeta {
    schema_name: String,
    #[serde(default)]
    tables: Vec<TableMeta>,
}

#[derive(Debug, Clone, Deserialize)]
struct TableMeta {
    table_name: String,
}

async fn fetch_catalog_listing(
    client: &HarborClient,
    data_dock_id: &str,
) -> Result<CatalogListing> {
    let url = format!(
        "{}/data-docks/{}/catalog",
        client.config().base_url,
        urlencoding::encode(data_dock_id),
    );
    let envelope = client.execute(&ApiRequest::get(url)).await?;
    envelope.data_as()
}
