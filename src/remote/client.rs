//! Data service HTTP client
//!
//! Async client for the hosted relational data API. Tables are addressed as
//! `<base>/rest/v1/<table>`; filters travel as query-string pairs built by
//! [`Query`].

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::query::Query;
use super::types::{parse_content_range_total, ApiErrorResponse};
use crate::config::StoreConfig;
use crate::core::error::{StoreError, StoreResult};

/// HTTP client for the hosted data API
#[derive(Debug, Clone)]
pub struct DataApiClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl DataApiClient {
    /// Create new client from store config
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        let url = config.url.as_ref().ok_or_else(|| {
            StoreError::Config(
                "Data service URL not configured. Set store.url in config.".to_string(),
            )
        })?;

        Self::new(url, config.resolved_api_key(), config.timeout_secs)
    }

    /// Create new client with explicit parameters
    pub fn new(base_url: &str, api_key: Option<String>, timeout_secs: u64) -> StoreResult<Self> {
        let mut parsed = Url::parse(base_url)
            .map_err(|e| StoreError::Config(format!("Invalid data service URL {}: {}", base_url, e)))?;

        // Url::join replaces the last segment unless the path ends with '/'
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: parsed,
            api_key,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the URL for a table with query-string filters
    pub fn table_url(&self, table: &str, query: &Query) -> StoreResult<Url> {
        let mut url = self
            .base_url
            .join(&format!("rest/v1/{}", table))
            .map_err(|e| StoreError::Config(format!("Invalid table path {}: {}", table, e)))?;

        if !query.pairs().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.pairs() {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Add api key headers if set
    fn auth(&self, builder: RequestBuilder) -> RequestBuilder {
        if let Some(ref key) = self.api_key {
            builder.header("apikey", key).bearer_auth(key)
        } else {
            builder
        }
    }

    // ============== Reads ==============

    pub async fn select<T: DeserializeOwned>(&self, table: &str, query: &Query) -> StoreResult<Vec<T>> {
        let url = self.table_url(table, query)?;
        debug!(%url, "select");

        let resp = self.auth(self.client.get(url)).send().await?;
        Self::handle_response(resp).await
    }

    /// Exact row count for a filter, read from `Content-Range`
    pub async fn count(&self, table: &str, query: &Query) -> StoreResult<u64> {
        let url = self.table_url(table, query)?;
        debug!(%url, "count");

        let resp = self
            .auth(self.client.head(url))
            .header("Prefer", "count=exact")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(StoreError::Remote {
                status: resp.status().as_u16(),
                message: format!("count on {} failed", table),
            });
        }

        resp.headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| {
                StoreError::InvalidData(format!("missing Content-Range total for {}", table))
            })
    }

    // ============== Writes ==============

    /// Insert one row and return it as stored
    pub async fn insert<B, T>(&self, table: &str, body: &B) -> StoreResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.table_url(table, &Query::new().select("*"))?;
        debug!(%url, "insert");

        let resp = self
            .auth(self.client.post(url))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        let mut rows: Vec<T> = Self::handle_response(resp).await?;
        if rows.is_empty() {
            return Err(StoreError::InvalidData(format!(
                "insert into {} returned no row",
                table
            )));
        }
        Ok(rows.swap_remove(0))
    }

    /// Patch every row matching the filter; returns the updated rows
    pub async fn update<B, T>(&self, table: &str, query: &Query, body: &B) -> StoreResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.table_url(table, query)?;
        debug!(%url, "update");

        let resp = self
            .auth(self.client.patch(url))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        Self::handle_response(resp).await
    }

    // ============== Helpers ==============

    async fn handle_response<T: DeserializeOwned>(resp: Response) -> StoreResult<T> {
        if !resp.status().is_success() {
            return Err(Self::extract_error(resp).await);
        }

        Ok(resp.json().await?)
    }

    async fn extract_error(resp: Response) -> StoreError {
        let status = resp.status().as_u16();
        let message = match resp.json::<ApiErrorResponse>().await {
            Ok(err) => err.describe(),
            Err(_) => "Unknown error".to_string(),
        };
        StoreError::Remote { status, message }
    }
}
