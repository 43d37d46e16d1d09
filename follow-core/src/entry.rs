use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::events::{EventBus, StoreEvent, StoreListener};
use crate::models::{EntryId, EntryModel, EntryPatch, FeedId};

#[derive(Debug, Clone)]
struct TrackedEntry {
    model: EntryModel,
    revision: u64,
}

#[derive(Debug, Default)]
struct EntryState {
    entries: HashMap<EntryId, TrackedEntry>,
    // feed_id -> entry ids, in arrival order
    by_feed: HashMap<FeedId, Vec<EntryId>>,
    next_revision: u64,
}

impl EntryState {
    fn bump(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }

    fn patch_feed(&mut self, feed_id: &str, patch: &EntryPatch) -> Vec<EntryId> {
        let ids = self.by_feed.get(feed_id).cloned().unwrap_or_default();
        let mut touched = Vec::with_capacity(ids.len());
        for id in ids {
            let revision = self.bump();
            if let Some(tracked) = self.entries.get_mut(&id) {
                patch.apply(&mut tracked.model);
                tracked.revision = revision;
                touched.push(id);
            }
        }
        touched
    }
}

/// Result of an optimistic write: how to undo it and the revision it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPatch {
    pub inverse: EntryPatch,
    pub revision: u64,
}

/// Entries keyed by entry id, with a per-feed index.
///
/// Every write bumps the entry's revision so that a later revert can tell
/// whether someone else wrote the entry in the meantime.
#[derive(Clone)]
pub struct EntryStore {
    inner: Arc<RwLock<EntryState>>,
    bus: EventBus,
}

impl EntryStore {
    pub fn new(bus: EventBus) -> Self {
        Self {
            inner: Arc::new(RwLock::new(EntryState::default())),
            bus,
        }
    }

    /// Replaces each entry with the server's copy.
    pub async fn upsert_many(&self, entries: Vec<EntryModel>) {
        let ids: Vec<EntryId> = {
            let mut state = self.inner.write().await;
            let mut ids = Vec::with_capacity(entries.len());
            for model in entries {
                let id = model.entries.id.clone();
                let feed_id = model.feeds.id.clone();
                let revision = state.bump();
                let previous = state
                    .entries
                    .insert(id.clone(), TrackedEntry { model, revision });
                if let Some(previous) = previous {
                    if previous.model.feeds.id != feed_id {
                        if let Some(list) = state.by_feed.get_mut(&previous.model.feeds.id) {
                            list.retain(|existing| existing != &id);
                        }
                    }
                }
                let list = state.by_feed.entry(feed_id).or_default();
                if !list.contains(&id) {
                    list.push(id.clone());
                }
                ids.push(id);
            }
            ids
        };
        for entry_id in ids {
            self.bus.publish(StoreEvent::EntryUpdated { entry_id }).await;
        }
    }

    pub async fn get(&self, entry_id: &str) -> Option<EntryModel> {
        self.inner
            .read()
            .await
            .entries
            .get(entry_id)
            .map(|tracked| tracked.model.clone())
    }

    pub async fn revision(&self, entry_id: &str) -> Option<u64> {
        self.inner
            .read()
            .await
            .entries
            .get(entry_id)
            .map(|tracked| tracked.revision)
    }

    pub async fn by_feed(&self, feed_id: &str) -> Vec<EntryModel> {
        let state = self.inner.read().await;
        state
            .by_feed
            .get(feed_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.entries.get(id))
                    .map(|tracked| tracked.model.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Applies `patch` to the held entry. Returns `None` when the entry is unknown.
    pub async fn optimistic_update(&self, entry_id: &str, patch: &EntryPatch) -> Option<AppliedPatch> {
        let applied = {
            let mut state = self.inner.write().await;
            let revision = state.bump();
            let tracked = state.entries.get_mut(entry_id)?;
            let inverse = patch.apply(&mut tracked.model);
            tracked.revision = revision;
            AppliedPatch { inverse, revision }
        };
        self.bus
            .publish(StoreEvent::EntryUpdated {
                entry_id: entry_id.to_owned(),
            })
            .await;
        Some(applied)
    }

    /// Applies `patch` to every held entry of the feed. Returns how many were written.
    pub async fn optimistic_update_many_by_feed_id(&self, feed_id: &str, patch: &EntryPatch) -> usize {
        let touched = self.inner.write().await.patch_feed(feed_id, patch);
        let count = touched.len();
        for entry_id in touched {
            self.bus.publish(StoreEvent::EntryUpdated { entry_id }).await;
        }
        count
    }

    /// Undoes an optimistic write unless the entry was written again since.
    pub async fn revert_if_unchanged(&self, entry_id: &str, applied: &AppliedPatch) -> bool {
        let reverted = {
            let mut state = self.inner.write().await;
            let revision = state.bump();
            match state.entries.get_mut(entry_id) {
                Some(tracked) if tracked.revision == applied.revision => {
                    applied.inverse.apply(&mut tracked.model);
                    tracked.revision = revision;
                    true
                }
                _ => false,
            }
        };
        if reverted {
            self.bus
                .publish(StoreEvent::EntryUpdated {
                    entry_id: entry_id.to_owned(),
                })
                .await;
        }
        reverted
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    pub async fn reset(&self) {
        let mut state = self.inner.write().await;
        state.entries.clear();
        state.by_feed.clear();
    }
}

#[async_trait]
impl StoreListener for EntryStore {
    async fn on_event(&self, event: &StoreEvent) {
        if let StoreEvent::FeedMarkedRead { feed_id } = event {
            let touched = self
                .optimistic_update_many_by_feed_id(feed_id, &EntryPatch::read(true))
                .await;
            debug!(feed_id = %feed_id, touched, "entries marked read");
        }
    }
}
