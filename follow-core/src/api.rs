use std::collections::HashMap;

use reqwest::{Client, ClientBuilder, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::error::ClientError;
use crate::models::{ApiResponse, EntryModel, FeedId, FeedViewType, SubscriptionModel};

/// Thin client over the feed service's HTTP API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ClientError> {
        let client = ClientBuilder::new()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Self::with_client(client, &config.base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        // Url::join drops the last path segment unless the base ends with a slash
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base.join(path)?;
        debug!(%method, %url, "api request");
        Ok(self.client.request(method, url))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "api request rejected");
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        let body: ApiResponse<T> = serde_json::from_slice(&bytes)?;
        if body.code != 0 {
            return Err(ClientError::Api {
                code: body.code,
                message: body.message,
            });
        }
        Ok(body.data)
    }

    async fn send_unit(&self, request: RequestBuilder) -> Result<(), ClientError> {
        self.send::<serde_json::Value>(request).await.map(|_| ())
    }

    /// `GET subscriptions?view=<view>`
    pub async fn subscriptions(
        &self,
        view: Option<FeedViewType>,
    ) -> Result<Vec<SubscriptionModel>, ClientError> {
        let mut request = self.request(Method::GET, "subscriptions")?;
        if let Some(view) = view {
            request = request.query(&[("view", view.to_string())]);
        }
        Ok(self.send(request).await?.unwrap_or_default())
    }

    /// `POST entries` filtered by feed and/or view.
    pub async fn entries(
        &self,
        feed_id: Option<&str>,
        view: Option<FeedViewType>,
    ) -> Result<Vec<EntryModel>, ClientError> {
        let request = self
            .request(Method::POST, "entries")?
            .json(&json!({ "feedId": feed_id, "view": view }));
        Ok(self.send(request).await?.unwrap_or_default())
    }

    /// `GET reads?view=<view>`: unread counters keyed by feed id.
    pub async fn unread_counts(
        &self,
        view: Option<FeedViewType>,
    ) -> Result<HashMap<FeedId, u32>, ClientError> {
        let mut request = self.request(Method::GET, "reads")?;
        if let Some(view) = view {
            request = request.query(&[("view", view.to_string())]);
        }
        Ok(self.send(request).await?.unwrap_or_default())
    }

    pub async fn collect(&self, entry_id: &str) -> Result<(), ClientError> {
        let request = self
            .request(Method::POST, "collections")?
            .json(&json!({ "entryId": entry_id }));
        self.send_unit(request).await
    }

    pub async fn uncollect(&self, entry_id: &str) -> Result<(), ClientError> {
        let request = self
            .request(Method::DELETE, "collections")?
            .json(&json!({ "entryId": entry_id }));
        self.send_unit(request).await
    }

    pub async fn mark_read(&self, entry_ids: &[String]) -> Result<(), ClientError> {
        let request = self
            .request(Method::POST, "reads")?
            .json(&json!({ "entryIds": entry_ids }));
        self.send_unit(request).await
    }

    pub async fn mark_unread(&self, entry_id: &str) -> Result<(), ClientError> {
        let request = self
            .request(Method::DELETE, "reads")?
            .json(&json!({ "entryId": entry_id }));
        self.send_unit(request).await
    }

    /// `POST reads/all`: server-side mark-all-read, optionally scoped to a view.
    pub async fn mark_all_read(&self, view: Option<FeedViewType>) -> Result<(), ClientError> {
        let request = self
            .request(Method::POST, "reads/all")?
            .json(&json!({ "view": view }));
        self.send_unit(request).await
    }
}
