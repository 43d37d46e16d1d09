use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::events::{EventBus, StoreEvent, StoreListener};
use crate::models::FeedId;

/// Per-feed unread counters.
#[derive(Clone)]
pub struct UnreadStore {
    data: Arc<RwLock<HashMap<FeedId, u32>>>,
    bus: EventBus,
}

impl UnreadStore {
    pub fn new(bus: EventBus) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            bus,
        }
    }

    pub async fn get(&self, feed_id: &str) -> u32 {
        self.data.read().await.get(feed_id).copied().unwrap_or(0)
    }

    pub async fn snapshot(&self) -> HashMap<FeedId, u32> {
        self.data.read().await.clone()
    }

    pub async fn update_by_feed_id(&self, feed_id: &str, count: u32) {
        self.data.write().await.insert(feed_id.to_owned(), count);
        self.bus
            .publish(StoreEvent::UnreadChanged {
                feed_id: feed_id.to_owned(),
                count,
            })
            .await;
    }

    /// Adds `delta` to the counter, clamping at zero.
    ///
    /// Returns the change actually applied, which differs from `delta` when clamped.
    pub async fn increment_by_feed_id(&self, feed_id: &str, delta: i64) -> i64 {
        let (count, applied) = {
            let mut data = self.data.write().await;
            let slot = data.entry(feed_id.to_owned()).or_default();
            let previous = i64::from(*slot);
            let next = (previous + delta).clamp(0, i64::from(u32::MAX));
            *slot = next as u32;
            (*slot, next - previous)
        };
        self.bus
            .publish(StoreEvent::UnreadChanged {
                feed_id: feed_id.to_owned(),
                count,
            })
            .await;
        applied
    }

    /// Swaps in a full set of counters from the server.
    pub async fn replace_all(&self, counts: HashMap<FeedId, u32>) {
        let changed: Vec<(FeedId, u32)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
        *self.data.write().await = counts;
        for (feed_id, count) in changed {
            self.bus
                .publish(StoreEvent::UnreadChanged { feed_id, count })
                .await;
        }
    }

    pub async fn reset(&self) {
        self.data.write().await.clear();
    }
}

#[async_trait]
impl StoreListener for UnreadStore {
    async fn on_event(&self, event: &StoreEvent) {
        if let StoreEvent::FeedMarkedRead { feed_id } = event {
            debug!(feed_id = %feed_id, "resetting unread counter");
            self.data.write().await.insert(feed_id.clone(), 0);
        }
    }
}
