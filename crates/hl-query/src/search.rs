//! Full-text search builder.
//!
//! Issues `POST <base>/api/search` with a JSON body naming the table to
//! search, the columns to index, and a result limit (default 20).

use tracing::debug;

use harborline_client::{ApiRequest, Envelope, Error, ErrorKind, HarborClient, Result};

/// Builder for a full-text search over one table.
///
/// Created via [`NavigatorExt::search`](crate::NavigatorExt::search) or
/// [`DataDockScope::search`](crate::DataDockScope::search).
#[derive(Debug, Clone)]
pub struct SearchBuilder {
    client: HarborClient,
    problems: Vec<String>,

    query: String,
    data_dock_id: String,
    catalog: String,
    schema: String,
    table: String,
    columns_to_index: Vec<String>,
    limit: u32,
}

const DEFAULT_LIMIT: u32 = 20;

impl SearchBuilder {
    pub(crate) fn new(client: HarborClient) -> Self {
        let data_dock_id = client.config().data_dock_id.clone();
        Self {
            client,
            problems: Vec::new(),
            query: String::new(),
            data_dock_id,
            catalog: String::new(),
            schema: String::new(),
            table: String::new(),
            columns_to_index: Vec::new(),
            limit: DEFAULT_LIMIT,
        }
    }

    /// Set the search query string.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        if query.is_empty() {
            self.problems.push("search query cannot be empty".to_string());
        }
        self.query = query;
        self
    }

    /// Target a data dock other than the configured default.
    pub fn data_dock(mut self, data_dock_id: impl Into<String>) -> Self {
        let data_dock_id = data_dock_id.into();
        if data_dock_id.is_empty() {
            self.problems.push("data dock ID cannot be empty".to_string());
        }
        self.data_dock_id = data_dock_id;
        self
    }

    /// Set the catalog name.
    pub fn catalog(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if name.is_empty() {
            self.problems.push("catalog name cannot be empty".to_string());
        }
        self.catalog = name;
        self
    }

    /// Set the schema name.
    pub fn schema(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if name.is_empty() {
            self.problems.push("schema name cannot be empty".to_string());
        }
        self.schema = name;
        self
    }

    /// Set the table name.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if name.is_empty() {
            self.problems.push("table name cannot be empty".to_string());
        }
        self.table = name;
        self
    }

    /// Add columns to index for the search. May be called multiple times.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns_to_index
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Maximum number of results to return. Defaults to 20.
    pub fn limit(mut self, n: u32) -> Self {
        if n == 0 {
            self.problems.push("limit must be greater than 0".to_string());
            return self;
        }
        self.limit = n;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.problems.is_empty() {
            return Err(Error::new(ErrorKind::InvalidRequest(format!(
                "search builder validation failed: {}",
                self.problems.join("; ")
            ))));
        }
        let required = [
            (&self.query, "search query is required"),
            (&self.data_dock_id, "data dock ID is required"),
            (&self.catalog, "catalog name is required"),
            (&self.schema, "schema name is required"),
            (&self.table, "table name is required"),
        ];
        for (value, message) in required {
            if value.is_empty() {
                return Err(Error::new(ErrorKind::InvalidRequest(message.to_string())));
            }
        }
        if self.columns_to_index.is_empty() {
            return Err(Error::new(ErrorKind::InvalidRequest(
                "at least one column must be specified".to_string(),
            )));
        }
        Ok(())
    }

    /// Execute the search.
    pub async fn execute(self) -> Result<Envelope> {
        self.validate()?;

        let body = serde_json::json!({
            "query": self.query,
            "data_dock_id": self.data_dock_id,
            "catalog": self.catalog,
            "schema": self.schema,
            "table": self.table,
            "limit": self.limit,
            "columns_to_index": self.columns_to_index,
        });

        let url = format!("{}/api/search", self.client.config().base_url);
        debug!(%url, table = %self.table, "executing search");
        let request = ApiRequest::post(url).json(&body)?;
        self.client.execute(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NavigatorExt;
    use harborline_client::ClientConfig;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(base_url: &str) -> HarborClient {
        let config = ClientConfig::builder(base_url)
            .data_dock_id("dock-1")
            .token("test-token")
            .build()
            .unwrap();
        HarborClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_execute_sends_expected_body() {
        let server = MockServer::start().await;

        let expected = serde_json::json!({
            "query": "red herring",
            "data_dock_id": "dock-1",
            "catalog": "sales",
            "schema": "public",
            "table": "orders",
            "limit": 20,
            "columns_to_index": ["notes", "summary"],
        });

        Mock::given(method("POST"))
            .and(path("/api/search"))
            .and(body_json(&expected))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "hits": [] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let envelope = client
            .search()
            .query("red herring")
            .catalog("sales")
            .schema("public")
            .table("orders")
            .columns(["notes", "summary"])
            .execute()
            .await
            .unwrap();

        assert!(envelope.is_success());
    }

    #[tokio::test]
    async fn test_requires_columns() {
        let client = client_for("http://localhost:9");
        let err = client
            .search()
            .query("anything")
            .catalog("c")
            .schema("s")
            .table("t")
            .execute()
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::InvalidRequest(_)));
        assert!(err.to_string().contains("at least one column"));
    }

    #[tokio::test]
    async fn test_requires_query() {
        let client = client_for("http://localhost:9");
        let err = client
            .search()
            .catalog("c")
            .schema("s")
            .table("t")
            .columns(["notes"])
            .execute()
            .await
            .unwrap_err();

        assert!(err.to_string().contains("search query is required"));
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected() {
        let client = client_for("http://localhost:9");
        let err = client
            .search()
            .query("anything")
            .catalog("c")
            .schema("s")
            .table("t")
            .columns(["notes"])
            .limit(0)
            .execute()
            .await
            .unwrap_err();

        assert!(err.to_string().contains("limit must be greater than 0"));
    }
}
