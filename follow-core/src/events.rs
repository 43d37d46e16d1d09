use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use crate::models::{EntryId, FeedId, FeedViewType};

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    SubscriptionsReplaced {
        view: Option<FeedViewType>,
        count: usize,
    },
    SubscriptionUpserted {
        feed_id: FeedId,
    },
    SubscriptionsCleared,
    /// Every entry of the feed is now considered read.
    FeedMarkedRead {
        feed_id: FeedId,
    },
    EntryUpdated {
        entry_id: EntryId,
    },
    UnreadChanged {
        feed_id: FeedId,
        count: u32,
    },
    /// Background reachability check of the Eagle helper finished.
    EagleProbed {
        entry_id: EntryId,
        view: Option<FeedViewType>,
        available: bool,
    },
}

/// Consumer of store events, registered on an [`EventBus`].
#[async_trait]
pub trait StoreListener: Send + Sync {
    async fn on_event(&self, event: &StoreEvent);
}

/// Delivers store events to registered listeners in order, then to broadcast subscribers.
#[derive(Clone)]
pub struct EventBus {
    listeners: Arc<RwLock<Vec<Arc<dyn StoreListener>>>>,
    notifier: broadcast::Sender<StoreEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (notifier, _) = broadcast::channel(capacity.max(1));
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
            notifier,
        }
    }

    pub fn register(&self, listener: Arc<dyn StoreListener>) {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        listeners.push(listener);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.notifier.subscribe()
    }

    pub async fn publish(&self, event: StoreEvent) {
        let listeners = {
            let guard = self.listeners.read().unwrap_or_else(|e| e.into_inner());
            guard.clone()
        };
        for listener in listeners {
            listener.on_event(&event).await;
        }
        if self.notifier.send(event).is_err() {
            debug!("no event subscribers");
        }
    }
}
