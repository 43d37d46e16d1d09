use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::events::{EventBus, StoreEvent};
use crate::models::{FeedId, FeedViewType, SubscriptionModel};

pub type SharedSubscriptions = Arc<RwLock<HashMap<FeedId, SubscriptionModel>>>;

/// Subscriptions keyed by feed id, mirrored from the server.
#[derive(Clone)]
pub struct SubscriptionStore {
    data: SharedSubscriptions,
    api: ApiClient,
    bus: EventBus,
}

impl SubscriptionStore {
    pub fn new(api: ApiClient, bus: EventBus) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            api,
            bus,
        }
    }

    /// Fetches the subscriptions of `view` and replaces the whole mapping with them.
    ///
    /// The new mapping is built before the store is touched and swapped in with a
    /// single write, so readers never observe a partially filled store.
    pub async fn fetch_by_view(
        &self,
        view: Option<FeedViewType>,
    ) -> Result<Vec<SubscriptionModel>, ClientError> {
        let fetched = self.api.subscriptions(view).await?;
        let next: HashMap<FeedId, SubscriptionModel> = fetched
            .iter()
            .map(|subscription| (subscription.feeds.id.clone(), subscription.clone()))
            .collect();
        let count = next.len();
        *self.data.write().await = next;
        info!(?view, count, "subscriptions replaced");
        self.bus
            .publish(StoreEvent::SubscriptionsReplaced { view, count })
            .await;
        Ok(fetched)
    }

    /// Inserts or replaces one record. Last write wins; fields are not merged.
    pub async fn upsert(&self, feed_id: &str, subscription: SubscriptionModel) {
        self.data
            .write()
            .await
            .insert(feed_id.to_owned(), subscription);
        self.bus
            .publish(StoreEvent::SubscriptionUpserted {
                feed_id: feed_id.to_owned(),
            })
            .await;
    }

    /// Local cascade only: every held feed of `view` gets its unread counter zeroed
    /// and its held entries marked read by the listeners of [`StoreEvent::FeedMarkedRead`].
    pub async fn mark_read_by_view(&self, view: FeedViewType) -> Vec<FeedId> {
        let feed_ids: Vec<FeedId> = {
            let data = self.data.read().await;
            data.iter()
                .filter(|(_, subscription)| subscription.view == view)
                .map(|(feed_id, _)| feed_id.clone())
                .collect()
        };
        debug!(%view, feeds = feed_ids.len(), "marking view read");
        for feed_id in &feed_ids {
            self.bus
                .publish(StoreEvent::FeedMarkedRead {
                    feed_id: feed_id.clone(),
                })
                .await;
        }
        feed_ids
    }

    pub async fn reset(&self) {
        self.data.write().await.clear();
        self.bus.publish(StoreEvent::SubscriptionsCleared).await;
    }

    pub async fn get(&self, feed_id: &str) -> Option<SubscriptionModel> {
        self.data.read().await.get(feed_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    pub async fn feed_ids(&self) -> Vec<FeedId> {
        let mut ids: Vec<FeedId> = self.data.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Subscriptions of `view` (all of them for `None`), sorted by title.
    pub async fn list(&self, view: Option<FeedViewType>) -> Vec<SubscriptionModel> {
        let mut list: Vec<SubscriptionModel> = self
            .data
            .read()
            .await
            .values()
            .filter(|subscription| view.map_or(true, |v| subscription.view == v))
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            a.display_title()
                .to_lowercase()
                .cmp(&b.display_title().to_lowercase())
        });
        list
    }
}
