//! HTTP client for the hosted, PostgREST-compatible data store.

use std::time::Duration;

use appdesk_core::config::DataStoreConfig;
use appdesk_core::types::Table;
use appdesk_core::{AppDeskError, AppDeskResult};
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::query::Query;
use crate::store::DataStore;

/// Talks to `<url>/rest/v1/<table>` with the project API key sent both as
/// `apikey` and as a bearer token.
#[derive(Clone)]
pub struct RestDataStore {
    http: reqwest::Client,
    base: Url,
    api_key: String,
}

impl RestDataStore {
    pub fn new(config: &DataStoreConfig) -> AppDeskResult<Self> {
        let mut base = Url::parse(&config.url)
            .map_err(|e| AppDeskError::Config(format!("data_store.url: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppDeskError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base,
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, table: Table) -> AppDeskResult<Url> {
        self.base
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| AppDeskError::Config(format!("data_store.url: {e}")))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, table: Table, request: RequestBuilder) -> AppDeskResult<Response> {
        let resp = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| AppDeskError::Http(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().await.unwrap_or_default();
        warn!(table = %table, status = status.as_u16(), message = %message, "Data store request failed");
        Err(AppDeskError::DataStore {
            status: status.as_u16(),
            message,
        })
    }

    /// Rows of a `return=representation` response.
    async fn representation(resp: Response) -> AppDeskResult<Vec<Value>> {
        resp.json().await.map_err(|e| AppDeskError::Http(e.to_string()))
    }
}

fn id_filter(id: Uuid) -> [(&'static str, String); 1] {
    [("id", format!("eq.{id}"))]
}

impl DataStore for RestDataStore {
    async fn select(&self, table: Table, query: &Query) -> AppDeskResult<Vec<Value>> {
        let request = self.http.get(self.endpoint(table)?).query(&query.to_params());
        let rows = Self::representation(self.send(table, request).await?).await?;
        debug!(table = %table, rows = rows.len(), "Rows selected");
        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Value) -> AppDeskResult<Value> {
        let request = self
            .http
            .post(self.endpoint(table)?)
            .header("Prefer", "return=representation")
            .json(&row);
        let rows = Self::representation(self.send(table, request).await?).await?;
        rows.into_iter().next().ok_or_else(|| AppDeskError::DataStore {
            status: 200,
            message: format!("{table}: insert returned no row"),
        })
    }

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> AppDeskResult<Value> {
        let request = self
            .http
            .patch(self.endpoint(table)?)
            .query(&id_filter(id))
            .header("Prefer", "return=representation")
            .json(&patch);
        let rows = Self::representation(self.send(table, request).await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppDeskError::not_found(table.as_str(), id))
    }

    async fn delete(&self, table: Table, id: Uuid) -> AppDeskResult<()> {
        let request = self.http.delete(self.endpoint(table)?).query(&id_filter(id));
        self.send(table, request).await?;
        Ok(())
    }
}
