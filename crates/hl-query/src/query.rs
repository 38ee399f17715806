//! Fluent table query builder.
//!
//! Accumulates hierarchy identifiers and query parameters, then issues
//! a request to `<base>/<dock>/openapi/<catalog>/<schema>/<table>`.
//! Filters become `column[op]=value` parameters, ordering becomes
//! `order=col.asc,col2.desc`, and paging uses `_limit`/`_offset`.
//!
//! Builder mistakes (empty names, unknown directions) are recorded as
//! they happen and surfaced together at the terminal operation, so a
//! chain never panics mid-construction.

use serde::Serialize;
use tracing::debug;

use harborline_client::{ApiRequest, Envelope, Error, ErrorKind, HarborClient, Result};

/// Comparison operator for a query filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    In,
}

impl Operator {
    /// The wire form used in the `column[op]=value` parameter name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
        }
    }
}

/// Sort direction for an `order_by` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn suffix(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone)]
struct Filter {
    column: String,
    operator: Operator,
    value: String,
}

#[derive(Debug, Clone)]
struct OrderClause {
    column: String,
    direction: Direction,
}

/// Fluent query builder over one table.
///
/// Created via [`NavigatorExt::query`](crate::NavigatorExt::query) or
/// [`SchemaScope::table`](crate::SchemaScope::table).
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    client: HarborClient,
    problems: Vec<String>,

    data_dock_id: String,
    catalog: String,
    schema: String,
    table: String,

    select: Vec<String>,
    filters: Vec<Filter>,
    order_by: Vec<OrderClause>,
    limit: Option<u32>,
    offset: Option<u32>,
    raw_params: Vec<(String, String)>,
}

impl QueryBuilder {
    pub(crate) fn new(client: HarborClient) -> Self {
        let data_dock_id = client.config().data_dock_id.clone();
        Self {
            client,
            problems: Vec::new(),
            data_dock_id,
            catalog: String::new(),
            schema: String::new(),
            table: String::new(),
            select: Vec::new(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            raw_params: Vec::new(),
        }
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

    /// Add columns to retrieve. May be called multiple times.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Add a filter condition, sent as `column[op]=value`.
    pub fn filter(
        mut self,
        column: impl Into<String>,
        operator: Operator,
        value: impl ToString,
    ) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            operator,
            value: value.to_string(),
        });
        self
    }

    /// Add a sort clause. May be called multiple times.
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderClause {
            column: column.into(),
            direction,
        });
        self
    }

    /// Maximum number of rows to return.
    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Number of rows to skip.
    pub fn offset(mut self, n: u32) -> Self {
        self.offset = Some(n);
        self
    }

    /// Escape hatch: append a custom query parameter verbatim.
    pub fn raw_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.raw_params.push((key.into(), value.into()));
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.problems.is_empty() {
            return Err(Error::new(ErrorKind::InvalidRequest(format!(
                "query builder validation failed: {}",
                self.problems.join("; ")
            ))));
        }
        if self.data_dock_id.is_empty() {
            return Err(invalid("data dock ID is required"));
        }
        if self.catalog.is_empty() {
            return Err(invalid("catalog name is required"));
        }
        if self.schema.is_empty() {
            return Err(invalid("schema name is required"));
        }
        if self.table.is_empty() {
            return Err(invalid("table name is required"));
        }
        Ok(())
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}/openapi/{}/{}/{}",
            self.client.config().base_url,
            urlencoding::encode(&self.data_dock_id),
            urlencoding::encode(&self.catalog),
            urlencoding::encode(&self.schema),
            urlencoding::encode(&self.table),
        )
    }

    fn params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self.raw_params.clone();

        if !self.select.is_empty() {
            params.push(("select".to_string(), self.select.join(",")));
        }

        for filter in &self.filters {
            params.push((
                format!("{}[{}]", filter.column, filter.operator.as_str()),
                filter.value.clone(),
            ));
        }

        if !self.order_by.is_empty() {
            let order = self
                .order_by
                .iter()
                .map(|o| format!("{}.{}", o.column, o.direction.suffix()))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_string(), order));
        }

        if let Some(limit) = self.limit {
            params.push(("_limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("_offset".to_string(), offset.to_string()));
        }

        params
    }

    fn url_with(&self, params: Vec<(String, String)>) -> String {
        let endpoint = self.endpoint();
        if params.is_empty() {
            return endpoint;
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        format!("{endpoint}?{query}")
    }

    /// Execute the query and return matching rows.
    pub async fn get(self) -> Result<Envelope> {
        self.validate()?;
        let url = self.url_with(self.params());
        debug!(%url, "executing table query");
        self.client.execute(&ApiRequest::get(url)).await
    }

    /// Count rows matching the query without fetching them.
    pub async fn count(self) -> Result<u64> {
        self.validate()?;
        let mut params = self.params();
        params.retain(|(key, _)| key != "_limit");
        params.push(("count".to_string(), "exact".to_string()));
        params.push(("_limit".to_string(), "0".to_string()));

        let url = self.url_with(params);
        let envelope = self.client.execute(&ApiRequest::get(url)).await?;

        envelope
            .data
            .get("count")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| {
                Error::new(ErrorKind::Other(
                    "unable to extract count from response".to_string(),
                ))
            })
    }

    /// Insert rows via POST.
    pub async fn insert<T: Serialize>(self, data: &T) -> Result<Envelope> {
        self.validate()?;
        let request = ApiRequest::post(self.endpoint()).json(data)?;
        self.client.execute(&request).await
    }

    /// Update rows matching the query via PUT.
    pub async fn update<T: Serialize>(self, data: &T) -> Result<Envelope> {
        self.validate()?;
        let url = self.url_with(self.params());
        let request = ApiRequest::put(url).json(data)?;
        self.client.execute(&request).await
    }

    /// Delete rows matching the query.
    pub async fn delete(self) -> Result<Envelope> {
        self.validate()?;
        let url = self.url_with(self.params());
        self.client.execute(&ApiRequest::delete(url)).await
    }
}

fn invalid(message: &str) -> Error {
    Error::new(ErrorKind::InvalidRequest(message.to_string()))
}
