use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::entry::{AppliedPatch, EntryStore};
use crate::models::{EntryId, EntryPatch, FeedId};
use crate::unread::UnreadStore;

/// Ticket for an optimistic write awaiting its server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHandle {
    pub id: u64,
    pub entry_id: EntryId,
}

#[derive(Debug, Clone)]
struct PendingMutation {
    entry_id: EntryId,
    feed_id: FeedId,
    applied: AppliedPatch,
    unread_delta: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Confirmed,
    Reverted,
    /// The request failed but the local value was kept (policy or a newer write).
    Kept,
    Unknown,
}

/// Applies entry patches ahead of the network and settles them once the request completes.
#[derive(Clone)]
pub struct Reconciler {
    entries: EntryStore,
    unread: UnreadStore,
    pending: Arc<Mutex<HashMap<u64, PendingMutation>>>,
    next_id: Arc<AtomicU64>,
    rollback_on_failure: bool,
}

impl Reconciler {
    pub fn new(entries: EntryStore, unread: UnreadStore, rollback_on_failure: bool) -> Self {
        Self {
            entries,
            unread,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            rollback_on_failure,
        }
    }

    pub fn rollback_on_failure(&self) -> bool {
        self.rollback_on_failure
    }

    /// Applies `patch` locally. A change of the read flag moves the feed's unread counter by one.
    ///
    /// Returns `None` when the entry is not held; there is nothing to settle then.
    pub async fn apply(&self, feed_id: &str, entry_id: &str, patch: EntryPatch) -> Option<PendingHandle> {
        let applied = self.entries.optimistic_update(entry_id, &patch).await?;
        let wanted = match (patch.read, applied.inverse.read) {
            (Some(next), Some(previous)) if next != previous => {
                if next {
                    -1
                } else {
                    1
                }
            }
            _ => 0,
        };
        // A counter already at zero absorbs the decrement; only undo what moved.
        let unread_delta = if wanted != 0 {
            self.unread.increment_by_feed_id(feed_id, wanted).await
        } else {
            0
        };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.pending.lock().await.insert(
            id,
            PendingMutation {
                entry_id: entry_id.to_owned(),
                feed_id: feed_id.to_owned(),
                applied,
                unread_delta,
            },
        );
        debug!(id, entry_id, "optimistic update applied");
        Some(PendingHandle {
            id,
            entry_id: entry_id.to_owned(),
        })
    }

    pub async fn confirm(&self, handle: &PendingHandle) -> Reconciliation {
        match self.pending.lock().await.remove(&handle.id) {
            Some(_) => Reconciliation::Confirmed,
            None => Reconciliation::Unknown,
        }
    }

    /// Settles a failed request. The local write is undone only when rollback is
    /// enabled and no later write touched the entry.
    pub async fn fail(&self, handle: &PendingHandle) -> Reconciliation {
        let Some(mutation) = self.pending.lock().await.remove(&handle.id) else {
            return Reconciliation::Unknown;
        };
        if !self.rollback_on_failure {
            return Reconciliation::Kept;
        }
        if !self
            .entries
            .revert_if_unchanged(&mutation.entry_id, &mutation.applied)
            .await
        {
            debug!(entry_id = %mutation.entry_id, "entry changed since optimistic write, keeping it");
            return Reconciliation::Kept;
        }
        if mutation.unread_delta != 0 {
            self.unread
                .increment_by_feed_id(&mutation.feed_id, -mutation.unread_delta)
                .await;
        }
        info!(entry_id = %mutation.entry_id, "optimistic update reverted");
        Reconciliation::Reverted
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}
