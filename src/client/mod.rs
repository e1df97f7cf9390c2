//! Backend access: the two endpoints this crate talks to.

use crate::catalog::{parse_columns, ColumnDescriptor};
use crate::config::Settings;
use crate::errors::{Error, FetchError};
use crate::query::SearchQuery;
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SEARCH_PATH: &str = "/api/v0/advanced/search";

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub fn columns_path(schema: &str, table: &str) -> String {
    format!(
        "/api/v0/schema/{}/tables/{}/columns",
        utf8_percent_encode(schema, PATH_SEGMENT),
        utf8_percent_encode(table, PATH_SEGMENT)
    )
}

/// Row-major result of a search query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

impl SearchResponse {
    pub fn first_cell(&self) -> Option<&Value> {
        self.data.first().and_then(|row| row.first())
    }

    /// The scalar of a `count(*)` query. Numeric strings are accepted.
    pub fn count(&self) -> Result<u64, FetchError> {
        let cell = self
            .first_cell()
            .ok_or_else(|| FetchError::ParseError("count result is empty".to_string()))?;
        match cell {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| FetchError::ParseError(format!("count result {} is not a count", cell)))
    }
}

/// What the adapter needs from the backend. `HttpBackend` is the real one.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn columns(&self, schema: &str, table: &str)
        -> Result<Vec<ColumnDescriptor>, FetchError>;

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, FetchError>;
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    csrf_token: String,
    cookie: Option<String>,
}

impl HttpBackend {
    pub fn new(settings: &Settings, csrf_token: impl Into<String>) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::Config(format!("cannot build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            csrf_token: csrf_token.into(),
            cookie: settings.cookie.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_cookie(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.cookie {
            Some(cookie) => request.header(reqwest::header::COOKIE, cookie),
            None => request,
        }
    }
}

async fn read_body(response: reqwest::Response) -> Result<String, FetchError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(FetchError::classify(status.as_u16(), body));
    }
    Ok(body)
}

#[async_trait]
impl Backend for HttpBackend {
    async fn columns(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, FetchError> {
        let url = self.url(&columns_path(schema, table));
        tracing::debug!(%url, "fetching column metadata");
        let response = self.with_cookie(self.client.get(&url)).send().await?;
        parse_columns(&read_body(response).await?)
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, FetchError> {
        let query = query.to_json()?;
        tracing::debug!(%query, "issuing search");
        let form = [
            ("csrfmiddlewaretoken", self.csrf_token.as_str()),
            ("query", query.as_str()),
        ];
        let response = self
            .with_cookie(self.client.post(self.url(SEARCH_PATH)).form(&form))
            .send()
            .await?;
        Ok(serde_json::from_str(&read_body(response).await?)?)
    }
}
