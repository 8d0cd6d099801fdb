// # PostgREST Record Store
//
// This crate provides a RecordStore backed by a PostgREST HTTP API, which
// is what Supabase projects expose under `/rest/v1`.
//
// ## Behavior
//
// - One HTTP request per store call, no retries (failures go back to the
//   synchronizer, which swallows and reports them)
// - HTTP timeout configured (30 seconds)
// - Status codes mapped to typed errors (401/403, 404, 409, 429, 5xx)
// - Conditional updates through extra `column=eq.value` filters
// - Optional schema profile via `Accept-Profile` / `Content-Profile`
//
// ## Security Requirements
//
// - API key NEVER appears in logs or Debug output
// - API key MUST be provided via configuration (environment in the binary)
// - Store creation fails fast if the key is empty
//
// ## API Reference
//
// - List rows:   GET    `/rest/v1/{table}?select=*&order={column}.{asc|desc}`
// - Insert row:  POST   `/rest/v1/{table}` with `Prefer: return=representation`
// - Update row:  PATCH  `/rest/v1/{table}?id=eq.{id}` with `Prefer: return=representation`
// - Delete row:  DELETE `/rest/v1/{table}?id=eq.{id}`

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use shelfsync_core::config::StoreConfig;
use shelfsync_core::traits::{Condition, Order, Record, RecordStore, RecordStoreFactory, Table};
use shelfsync_core::{Error, RecordId, Result, StoreRegistry};
use std::sync::Arc;
use std::time::Duration;

/// Path prefix of the PostgREST API on a Supabase project
const REST_PREFIX: &str = "/rest/v1";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Error payload returned by PostgREST
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// PostgREST record store
///
/// Stateless apart from the HTTP client: every call is a single request and
/// nothing is cached between calls.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API key.
pub struct PostgrestRecordStore {
    /// Project URL without trailing slash
    base_url: String,

    /// API key, sent as `apikey` header and bearer token
    /// ⚠️ NEVER log this value
    api_key: String,

    /// Schema profile, when not the default `public`
    schema: Option<String>,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for PostgrestRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestRecordStore")
            .field("base_url", &self.base_url)
            .field("api_key", &"<REDACTED>")
            .field("schema", &self.schema)
            .finish()
    }
}

impl PostgrestRecordStore {
    /// Create a new PostgREST record store
    ///
    /// # Parameters
    ///
    /// - `url`: Project URL, e.g. `https://xyz.supabase.co`
    /// - `api_key`: Project API key (anon or service role)
    /// - `schema`: Optional schema profile
    ///
    /// # Security
    ///
    /// The API key will NEVER be logged or displayed in error messages.
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        schema: Option<String>,
    ) -> Result<Self> {
        let url = url.into();
        let api_key = api_key.into();

        if api_key.is_empty() {
            return Err(Error::config("PostgREST API key cannot be empty"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::config(format!(
                "PostgREST URL must start with http:// or https://, got '{}'",
                url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            api_key,
            schema,
            client,
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}{}/{}", self.base_url, REST_PREFIX, table.name())
    }

    /// Start a request with authentication and profile headers
    fn request(&self, method: Method, table: Table) -> RequestBuilder {
        let is_read = method == Method::GET || method == Method::HEAD;
        let mut request = self
            .client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key);

        if let Some(schema) = &self.schema {
            let header = if is_read { "Accept-Profile" } else { "Content-Profile" };
            request = request.header(header, schema);
        }
        request
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("{}: HTTP request failed: {}", context, e)))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        Err(status_error(status, &body, context))
    }

    async fn rows(response: Response, context: &str) -> Result<Vec<Record>> {
        response
            .json::<Vec<Record>>()
            .await
            .map_err(|e| Error::http(format!("{}: failed to parse response: {}", context, e)))
    }
}

#[async_trait]
impl RecordStore for PostgrestRecordStore {
    /// ```http
    /// GET /rest/v1/livros?select=*&order=titulo.asc
    /// ```
    async fn list(&self, table: Table, order: &Order) -> Result<Vec<Record>> {
        let context = format!("list {}", table);
        tracing::debug!("PostgREST {} ordered by {}", context, order_param(order));

        let request = self
            .request(Method::GET, table)
            .query(&[("select", "*".to_string()), ("order", order_param(order))]);
        let response = self.send(request, &context).await?;
        Self::rows(response, &context).await
    }

    /// ```http
    /// POST /rest/v1/emprestimos
    /// Prefer: return=representation
    /// ```
    async fn insert(&self, table: Table, fields: Record) -> Result<Record> {
        let context = format!("insert into {}", table);
        tracing::debug!("PostgREST {}", context);

        let request = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&fields);
        let response = self.send(request, &context).await?;

        Self::rows(response, &context)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::store(format!("{}: no row returned", context)))
    }

    /// ```http
    /// PATCH /rest/v1/livros?id=eq.7
    /// Prefer: return=representation
    /// ```
    async fn update(&self, table: Table, id: &RecordId, fields: Record) -> Result<Record> {
        let context = format!("update {}/{}", table, id);
        tracing::debug!("PostgREST {}", context);

        let request = self
            .request(Method::PATCH, table)
            .query(&[("id", eq_filter(&id_value(id)))])
            .header("Prefer", "return=representation")
            .json(&fields);
        let response = self.send(request, &context).await?;

        Self::rows(response, &context)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("{}/{}", table, id)))
    }

    /// ```http
    /// DELETE /rest/v1/membros?id=eq.7
    /// ```
    async fn delete(&self, table: Table, id: &RecordId) -> Result<()> {
        let context = format!("delete {}/{}", table, id);
        tracing::debug!("PostgREST {}", context);

        let request = self
            .request(Method::DELETE, table)
            .query(&[("id", eq_filter(&id_value(id)))]);
        self.send(request, &context).await?;
        Ok(())
    }

    /// ```http
    /// PATCH /rest/v1/livros?id=eq.7&disponivel=eq.2
    /// Prefer: return=representation
    /// ```
    ///
    /// An empty representation means no row matched every filter.
    async fn update_if(
        &self,
        table: Table,
        id: &RecordId,
        conditions: &[Condition],
        fields: Record,
    ) -> Result<Option<Record>> {
        let context = format!("conditional update {}/{}", table, id);
        tracing::debug!("PostgREST {} ({} conditions)", context, conditions.len());

        let request = self
            .request(Method::PATCH, table)
            .query(&filters(id, conditions))
            .header("Prefer", "return=representation")
            .json(&fields);
        let response = self.send(request, &context).await?;

        let row = Self::rows(response, &context).await?.into_iter().next();
        if row.is_none() {
            tracing::debug!("PostgREST {}: condition not met", context);
        }
        Ok(row)
    }

    fn store_name(&self) -> &'static str {
        "postgrest"
    }
}

/// `order` query parameter for a list call
fn order_param(order: &Order) -> String {
    let direction = if order.ascending { "asc" } else { "desc" };
    format!("{}.{}", order.column, direction)
}

fn id_value(id: &RecordId) -> Value {
    match id {
        RecordId::Int(id) => Value::from(*id),
        RecordId::Text(id) => Value::from(id.as_str()),
    }
}

/// Equality filter operand for a column value
fn eq_filter(value: &Value) -> String {
    match value {
        Value::Null => "is.null".to_string(),
        Value::String(s) => format!("eq.{}", s),
        other => format!("eq.{}", other),
    }
}

/// Row filter plus one filter per condition
fn filters(id: &RecordId, conditions: &[Condition]) -> Vec<(String, String)> {
    std::iter::once(("id".to_string(), eq_filter(&id_value(id))))
        .chain(
            conditions
                .iter()
                .map(|c| (c.column.clone(), eq_filter(&c.equals))),
        )
        .collect()
}

/// Map a non-success status to a typed error
fn status_error(status: StatusCode, body: &str, context: &str) -> Error {
    let detail = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => {
            let mut detail = parsed.message;
            if let Some(code) = parsed.code {
                detail = format!("{} [{}]", detail, code);
            }
            if let Some(hint) = parsed.hint {
                detail = format!("{} (hint: {})", detail, hint);
            }
            detail
        }
        Err(_) => body.to_string(),
    };

    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid API key or insufficient permissions. Status: {}",
            context, status
        )),
        404 => Error::not_found(format!("{}: {}", context, detail)),
        409 => Error::conflict(format!("{}: {}", context, detail)),
        429 => Error::rate_limited(format!(
            "{}: rate limit exceeded, retry later. Status: {}",
            context, status
        )),
        500..=599 => Error::store(format!(
            "{}: server error (transient): {} - {}",
            context, status, detail
        )),
        _ => Error::http(format!("{}: {} - {}", context, status, detail)),
    }
}

/// Factory for creating PostgREST record stores
pub struct PostgrestFactory;

#[async_trait]
impl RecordStoreFactory for PostgrestFactory {
    async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
        match config {
            StoreConfig::Postgrest {
                url,
                api_key,
                schema,
            } => {
                if api_key.is_empty() {
                    return Err(Error::config("PostgREST API key is required"));
                }
                tracing::debug!("Creating PostgREST store for {}", url);
                Ok(Arc::new(PostgrestRecordStore::new(
                    url.clone(),
                    api_key.clone(),
                    schema.clone(),
                )?))
            }
            _ => Err(Error::config("Invalid config for PostgREST record store")),
        }
    }
}

/// Register the PostgREST store with a registry
///
/// # Example
///
/// ```rust
/// use shelfsync_core::StoreRegistry;
///
/// let registry = StoreRegistry::with_builtin();
/// shelfsync_postgrest::register(&registry);
/// assert!(registry.has_store("postgrest"));
/// ```
pub fn register(registry: &StoreRegistry) {
    registry.register_store("postgrest", Box::new(PostgrestFactory));
}
