//! Remote data gateway.
//!
//! A thin pass-through to the hosted backend's collection API. Every call
//! returns a `Result`; network-level failures map to
//! [`SyncError::Connectivity`] so the coordinator can fall back to the
//! local cache. The gateway itself carries no retry logic — retries belong
//! to the coordinator via the offline queue.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use planner_types::{Collection, RecordId, RecordPayload};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::debug;

/// Collection-oriented create/read/update/delete boundary.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Inserts a record, returning the stored form.
    async fn create(&self, record: &RecordPayload) -> SyncResult<RecordPayload>;

    /// Applies a partial diff to an existing record, returning the updated
    /// form.
    async fn update(
        &self,
        collection: Collection,
        id: RecordId,
        patch: &serde_json::Value,
    ) -> SyncResult<RecordPayload>;

    /// Deletes a record. Deleting an already-absent record is not an error.
    async fn delete(&self, collection: Collection, id: RecordId) -> SyncResult<()>;

    /// Fetches a single record, `None` if the backend has no such row.
    async fn fetch_one(
        &self,
        collection: Collection,
        id: RecordId,
    ) -> SyncResult<Option<RecordPayload>>;

    /// Lists records of a collection for one family, with optional
    /// exact-match field filters, ordered by creation timestamp descending.
    async fn list(
        &self,
        collection: Collection,
        family_id: RecordId,
        filters: &[(String, serde_json::Value)],
    ) -> SyncResult<Vec<RecordPayload>>;
}

/// `{ data, error }` envelope returned by every backend endpoint.
#[derive(Deserialize)]
struct ApiEnvelope<T> {
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    fn into_result(self) -> SyncResult<T> {
        if let Some(message) = self.error {
            return Err(SyncError::Api(message));
        }
        self.data
            .ok_or_else(|| SyncError::Api("response envelope carried no data".to_string()))
    }
}

/// HTTP gateway against the hosted backend's REST surface.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    bearer_token: RwLock<Option<String>>,
}

impl HttpGateway {
    pub fn new(config: &SyncConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bearer_token: RwLock::new(None),
        }
    }

    /// Sets the bearer token attached to subsequent requests (restored
    /// session or fresh sign-in).
    pub async fn set_token(&self, token: impl Into<String>) {
        *self.bearer_token.write().await = Some(token.into());
    }

    pub async fn clear_token(&self) {
        *self.bearer_token.write().await = None;
    }

    fn url(&self, collection: Collection) -> String {
        format!("{}/api/{}", self.base_url, collection.as_str())
    }

    fn record_url(&self, collection: Collection, id: RecordId) -> String {
        format!("{}/api/{}/{id}", self.base_url, collection.as_str())
    }

    async fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.bearer_token.read().await.as_deref() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn read_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> SyncResult<T> {
        let resp = resp
            .error_for_status()
            .map_err(|e| SyncError::Api(e.to_string()))?;
        let envelope: ApiEnvelope<T> = resp.json().await?;
        envelope.into_result()
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn create(&self, record: &RecordPayload) -> SyncResult<RecordPayload> {
        let url = self.url(record.collection());
        debug!("POST {url}");
        let req = self.apply_auth(self.client.post(&url)).await;
        let resp = req.json(record).send().await?;
        Self::read_envelope(resp).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: RecordId,
        patch: &serde_json::Value,
    ) -> SyncResult<RecordPayload> {
        let url = self.record_url(collection, id);
        debug!("PATCH {url}");
        let req = self.apply_auth(self.client.patch(&url)).await;
        let resp = req.json(patch).send().await?;
        Self::read_envelope(resp).await
    }

    async fn delete(&self, collection: Collection, id: RecordId) -> SyncResult<()> {
        let url = self.record_url(collection, id);
        debug!("DELETE {url}");
        let req = self.apply_auth(self.client.delete(&url)).await;
        let resp = req.send().await?;
        resp.error_for_status()
            .map_err(|e| SyncError::Api(e.to_string()))?;
        Ok(())
    }

    async fn fetch_one(
        &self,
        collection: Collection,
        id: RecordId,
    ) -> SyncResult<Option<RecordPayload>> {
        let url = self.record_url(collection, id);
        debug!("GET {url}");
        let req = self.apply_auth(self.client.get(&url)).await;
        let resp = req.send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::read_envelope(resp).await?))
    }

    async fn list(
        &self,
        collection: Collection,
        family_id: RecordId,
        filters: &[(String, serde_json::Value)],
    ) -> SyncResult<Vec<RecordPayload>> {
        let url = self.url(collection);
        debug!("GET {url} (family {family_id})");
        let mut params: Vec<(String, String)> =
            vec![("family_id".to_string(), family_id.to_string())];
        for (field, value) in filters {
            params.push((field.clone(), query_param(value)));
        }
        let req = self.apply_auth(self.client.get(&url)).await;
        let resp = req.query(&params).send().await?;
        Self::read_envelope(resp).await
    }
}

/// Renders a filter value as a query-string parameter (strings unquoted).
fn query_param(value: &serde_json::Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}
