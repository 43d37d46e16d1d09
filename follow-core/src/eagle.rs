use std::collections::HashMap;
use std::sync::Arc;

use reqwest::{Client, ClientBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::EagleConfig;
use crate::error::ClientError;
use crate::events::{EventBus, StoreEvent};
use crate::models::{EntryId, FeedViewType};

#[derive(Debug, Clone, Serialize)]
struct EagleHeaders<'a> {
    referer: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct EagleItem<'a> {
    url: &'a str,
    website: &'a str,
    headers: EagleHeaders<'a>,
}

#[derive(Debug, Clone, Serialize)]
struct AddFromUrls<'a> {
    items: Vec<EagleItem<'a>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EagleResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl EagleResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Client for the Eagle desktop helper listening on a fixed local port.
#[derive(Debug, Clone)]
pub struct EagleClient {
    client: Client,
    base: Url,
}

impl EagleClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::new(),
            base: Url::parse(base_url)?,
        })
    }

    pub fn from_config(config: &EagleConfig) -> Result<Self, ClientError> {
        let client = ClientBuilder::new()
            .timeout(config.probe_timeout())
            .build()?;
        Ok(Self {
            client,
            base: Url::parse(&config.endpoint)?,
        })
    }

    /// Whether the helper is running. An unauthorized answer counts as present.
    pub async fn probe(&self) -> bool {
        let response = match self.client.get(self.base.clone()).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "eagle not reachable");
                return false;
            }
        };
        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return true;
        }
        // The helper also reports auth failures as `{ "code": 401 }` in the body
        match response.json::<Value>().await {
            Ok(body) => body.get("code").and_then(Value::as_i64) == Some(401),
            Err(_) => false,
        }
    }

    /// Sends every image of an entry to the helper, tagged with the entry's page.
    pub async fn save(&self, url: &str, images: &[String]) -> Result<EagleResponse, ClientError> {
        let endpoint = self.base.join("/api/item/addFromURLs")?;
        let body = AddFromUrls {
            items: images
                .iter()
                .map(|image| EagleItem {
                    url: image,
                    website: url,
                    headers: EagleHeaders { referer: url },
                })
                .collect(),
        };
        let response = self.client.post(endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "eagle rejected images");
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }
        let parsed: EagleResponse = response.json().await?;
        info!(count = images.len(), status = %parsed.status, "images sent to eagle");
        Ok(parsed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Loading,
    Ready(bool),
}

type ProbeKey = (EntryId, Option<FeedViewType>);

/// Probe results cached per entry/view pair for the lifetime of the cache.
#[derive(Clone)]
pub struct EagleProbeCache {
    client: EagleClient,
    states: Arc<RwLock<HashMap<ProbeKey, ProbeState>>>,
    bus: Option<EventBus>,
}

impl EagleProbeCache {
    pub fn new(client: EagleClient) -> Self {
        Self {
            client,
            states: Arc::new(RwLock::new(HashMap::new())),
            bus: None,
        }
    }

    /// Announces finished background probes as [`StoreEvent::EagleProbed`].
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn client(&self) -> &EagleClient {
        &self.client
    }

    pub async fn state(&self, entry_id: &str, view: Option<FeedViewType>) -> Option<ProbeState> {
        self.states
            .read()
            .await
            .get(&(entry_id.to_owned(), view))
            .copied()
    }

    /// Returns the cached state, starting a background probe on first sight of the key.
    pub async fn ensure(&self, entry_id: &str, view: Option<FeedViewType>) -> ProbeState {
        let key = (entry_id.to_owned(), view);
        {
            let mut states = self.states.write().await;
            if let Some(state) = states.get(&key) {
                return *state;
            }
            states.insert(key.clone(), ProbeState::Loading);
        }
        let cache = self.clone();
        tokio::spawn(async move {
            let available = cache.client.probe().await;
            cache
                .states
                .write()
                .await
                .insert(key.clone(), ProbeState::Ready(available));
            if let Some(bus) = &cache.bus {
                let (entry_id, view) = key;
                bus.publish(StoreEvent::EagleProbed {
                    entry_id,
                    view,
                    available,
                })
                .await;
            }
        });
        ProbeState::Loading
    }

    /// Probes now (or reuses the cached answer) and waits for the result.
    pub async fn resolve(&self, entry_id: &str, view: Option<FeedViewType>) -> bool {
        let key = (entry_id.to_owned(), view);
        if let Some(ProbeState::Ready(available)) = self.states.read().await.get(&key) {
            return *available;
        }
        let available = self.client.probe().await;
        self.states
            .write()
            .await
            .insert(key, ProbeState::Ready(available));
        available
    }
}
