use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::eagle::{EagleProbeCache, ProbeState};
use crate::entry::EntryStore;
use crate::error::{ClientError, TaskError};
use crate::models::{CollectionStatus, EntryModel, EntryPatch, FeedId, FeedViewType};
use crate::notify::{Toaster, LONG, SHORT};
use crate::optimistic::{Reconciler, Reconciliation};
use crate::platform::Platform;
use crate::subscription::SubscriptionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryActionKind {
    Star,
    Unstar,
    CopyLink,
    OpenInBrowser,
    SaveImagesToEagle,
    Share,
    MarkAsRead,
    MarkAsUnread,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionIcon {
    /// Icon font class.
    Class(&'static str),
    /// Bundled asset path.
    Asset(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryAction {
    pub kind: EntryActionKind,
    pub name: &'static str,
    pub icon: ActionIcon,
    pub disabled: bool,
}

/// Ordered actions for `entry` in `view`.
///
/// Empty without a view or an entry URL. Mutually exclusive pairs are both
/// present; only `disabled` tells them apart. `eagle` is the probe state of
/// the local helper (`None` or `Loading` keep the Eagle action disabled).
pub fn entry_actions(
    entry: Option<&EntryModel>,
    view: Option<FeedViewType>,
    eagle: Option<ProbeState>,
) -> Vec<EntryAction> {
    let (Some(entry), Some(_)) = (entry, view) else {
        return Vec::new();
    };
    if entry.url().is_none() {
        return Vec::new();
    }
    let eagle_available = matches!(eagle, Some(ProbeState::Ready(true)));

    // Every view shares the same list for now.
    vec![
        EntryAction {
            kind: EntryActionKind::Star,
            name: "Star",
            icon: ActionIcon::Class("i-mingcute-star-line"),
            disabled: entry.is_starred(),
        },
        EntryAction {
            kind: EntryActionKind::Unstar,
            name: "Unstar",
            icon: ActionIcon::Class("i-mingcute-star-fill"),
            disabled: !entry.is_starred(),
        },
        EntryAction {
            kind: EntryActionKind::CopyLink,
            name: "Copy Link",
            icon: ActionIcon::Class("i-mingcute-link-line"),
            disabled: false,
        },
        EntryAction {
            kind: EntryActionKind::OpenInBrowser,
            name: "Open in Browser",
            icon: ActionIcon::Class("i-mingcute-world-2-line"),
            disabled: false,
        },
        EntryAction {
            kind: EntryActionKind::SaveImagesToEagle,
            name: "Save Images to Eagle",
            icon: ActionIcon::Asset("/eagle.svg"),
            disabled: !eagle_available || entry.images().is_empty(),
        },
        EntryAction {
            kind: EntryActionKind::Share,
            name: "Share",
            icon: ActionIcon::Class("i-mingcute-share-2-line"),
            disabled: false,
        },
        EntryAction {
            kind: EntryActionKind::MarkAsRead,
            name: "Mark as Read",
            icon: ActionIcon::Class("i-mingcute-round-fill"),
            disabled: entry.read,
        },
        EntryAction {
            kind: EntryActionKind::MarkAsUnread,
            name: "Mark as Unread",
            icon: ActionIcon::Class("i-mingcute-round-line"),
            disabled: !entry.read,
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Succeeded,
    Failed(Reconciliation),
}

/// A request dispatched after its optimistic write. Dropping it does not cancel the request.
#[derive(Debug)]
pub struct MutationHandle {
    join: JoinHandle<MutationOutcome>,
}

impl MutationHandle {
    pub async fn wait(self) -> Result<MutationOutcome, TaskError> {
        Ok(self.join.await?)
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Runs entry actions: optimistic writes through the [`Reconciler`], requests on the API.
#[derive(Clone)]
pub struct EntryActions {
    api: ApiClient,
    entries: EntryStore,
    subscriptions: SubscriptionStore,
    reconciler: Reconciler,
    eagle: EagleProbeCache,
    toaster: Toaster,
    platform: Arc<dyn Platform>,
}

impl EntryActions {
    pub fn new(
        api: ApiClient,
        entries: EntryStore,
        subscriptions: SubscriptionStore,
        reconciler: Reconciler,
        eagle: EagleProbeCache,
        toaster: Toaster,
        platform: Arc<dyn Platform>,
    ) -> Self {
        Self {
            api,
            entries,
            subscriptions,
            reconciler,
            eagle,
            toaster,
            platform,
        }
    }

    /// Action list for the current state of `entry`, probing Eagle once per entry/view.
    pub async fn list(&self, entry: Option<&EntryModel>, view: Option<FeedViewType>) -> Vec<EntryAction> {
        let eagle = match (entry, view) {
            (Some(entry), Some(view)) if entry.url().is_some() => {
                Some(self.eagle.ensure(entry.id(), Some(view)).await)
            }
            _ => None,
        };
        entry_actions(entry, view, eagle)
    }

    /// Runs `kind` against `entry`. Returns a handle when a request was dispatched.
    pub async fn invoke(&self, kind: EntryActionKind, entry: &EntryModel) -> Option<MutationHandle> {
        match kind {
            EntryActionKind::Star => Some(self.star(entry).await),
            EntryActionKind::Unstar => Some(self.unstar(entry).await),
            EntryActionKind::CopyLink => {
                self.copy_link(entry);
                None
            }
            EntryActionKind::OpenInBrowser => {
                self.open_in_browser(entry);
                None
            }
            EntryActionKind::SaveImagesToEagle => self.save_to_eagle(entry),
            EntryActionKind::Share => {
                self.share(entry);
                None
            }
            EntryActionKind::MarkAsRead => Some(self.mark_read(entry).await),
            EntryActionKind::MarkAsUnread => Some(self.mark_unread(entry).await),
        }
    }

    pub async fn star(&self, entry: &EntryModel) -> MutationHandle {
        let patch = EntryPatch::collections(Some(CollectionStatus {
            created_at: Utc::now(),
        }));
        let api = self.api.clone();
        let entry_id = entry.id().to_owned();
        self.mutate(entry, patch, Some("Collected."), async move {
            api.collect(&entry_id).await
        })
        .await
    }

    pub async fn unstar(&self, entry: &EntryModel) -> MutationHandle {
        let api = self.api.clone();
        let entry_id = entry.id().to_owned();
        self.mutate(
            entry,
            EntryPatch::collections(None),
            Some("Uncollected."),
            async move { api.uncollect(&entry_id).await },
        )
        .await
    }

    pub async fn mark_read(&self, entry: &EntryModel) -> MutationHandle {
        let api = self.api.clone();
        let entry_ids = vec![entry.id().to_owned()];
        self.mutate(entry, EntryPatch::read(true), None, async move {
            api.mark_read(&entry_ids).await
        })
        .await
    }

    pub async fn mark_unread(&self, entry: &EntryModel) -> MutationHandle {
        let api = self.api.clone();
        let entry_id = entry.id().to_owned();
        self.mutate(entry, EntryPatch::read(false), None, async move {
            api.mark_unread(&entry_id).await
        })
        .await
    }

    async fn mutate<F>(
        &self,
        entry: &EntryModel,
        patch: EntryPatch,
        success_message: Option<&'static str>,
        request: F,
    ) -> MutationHandle
    where
        F: std::future::Future<Output = Result<(), ClientError>> + Send + 'static,
    {
        let pending = self
            .reconciler
            .apply(entry.feed_id(), entry.id(), patch)
            .await;
        let reconciler = self.reconciler.clone();
        let toaster = self.toaster.clone();
        let entry_id = entry.id().to_owned();
        let join = tokio::spawn(async move {
            match request.await {
                Ok(()) => {
                    if let Some(pending) = &pending {
                        reconciler.confirm(pending).await;
                    }
                    if let Some(message) = success_message {
                        toaster.toast(message, SHORT);
                    }
                    MutationOutcome::Succeeded
                }
                Err(err) => {
                    warn!(entry_id = %entry_id, error = %err, "entry mutation failed");
                    let settled = match &pending {
                        Some(pending) => reconciler.fail(pending).await,
                        None => Reconciliation::Unknown,
                    };
                    MutationOutcome::Failed(settled)
                }
            }
        });
        MutationHandle { join }
    }

    pub fn copy_link(&self, entry: &EntryModel) {
        let Some(url) = entry.url() else {
            return;
        };
        match self.platform.write_clipboard(url) {
            Ok(()) => {
                self.toaster.toast("Link copied to clipboard.", SHORT);
            }
            Err(err) => warn!(error = %err, "failed to copy link"),
        }
    }

    pub fn open_in_browser(&self, entry: &EntryModel) {
        let Some(url) = entry.url() else {
            return;
        };
        if let Err(err) = self.platform.open_external(url) {
            warn!(error = %err, %url, "failed to open entry");
        }
    }

    pub fn share(&self, entry: &EntryModel) {
        let Some(url) = entry.url() else {
            return;
        };
        if let Err(err) = self.platform.show_share_menu(url) {
            warn!(error = %err, %url, "failed to share entry");
        }
    }

    pub fn save_to_eagle(&self, entry: &EntryModel) -> Option<MutationHandle> {
        let url = entry.url()?.to_owned();
        let images = entry.images().to_vec();
        if images.is_empty() {
            return None;
        }
        let eagle = self.eagle.client().clone();
        let toaster = self.toaster.clone();
        let join = tokio::spawn(async move {
            match eagle.save(&url, &images).await {
                Ok(response) if response.is_success() => {
                    toaster.toast("Saved to Eagle.", LONG);
                    MutationOutcome::Succeeded
                }
                Ok(response) => {
                    warn!(status = %response.status, "eagle refused images");
                    toaster.toast("Failed to save to Eagle.", LONG);
                    MutationOutcome::Failed(Reconciliation::Unknown)
                }
                Err(err) => {
                    warn!(error = %err, "failed to save to eagle");
                    toaster.toast("Failed to save to Eagle.", LONG);
                    MutationOutcome::Failed(Reconciliation::Unknown)
                }
            }
        });
        Some(MutationHandle { join })
    }

    /// Fetches entries from the server and stores them.
    pub async fn fetch_entries(
        &self,
        feed_id: Option<&str>,
        view: Option<FeedViewType>,
    ) -> Result<Vec<EntryModel>, ClientError> {
        let entries = self.api.entries(feed_id, view).await?;
        self.entries.upsert_many(entries.clone()).await;
        Ok(entries)
    }

    /// Marks a whole view read on the server, then cascades locally.
    pub async fn mark_all_read_by_view(&self, view: FeedViewType) -> Result<Vec<FeedId>, ClientError> {
        self.api.mark_all_read(Some(view)).await?;
        let feeds = self.subscriptions.mark_read_by_view(view).await;
        info!(%view, feeds = feeds.len(), "view marked read");
        Ok(feeds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryContent, FeedModel};

    fn entry(url: Option<&str>) -> EntryModel {
        EntryModel {
            entries: EntryContent {
                id: "e1".into(),
                title: Some("Hello".into()),
                url: url.map(str::to_owned),
                description: None,
                images: None,
                published_at: None,
            },
            feeds: FeedModel::with_id("f1"),
            read: false,
            collections: None,
        }
    }

    fn kinds(actions: &[EntryAction]) -> Vec<EntryActionKind> {
        actions.iter().map(|action| action.kind).collect()
    }

    #[test]
    fn empty_without_url_view_or_entry() {
        for view in FeedViewType::ALL {
            assert!(entry_actions(Some(&entry(None)), Some(view), None).is_empty());
            assert!(entry_actions(Some(&entry(Some(""))), Some(view), None).is_empty());
        }
        assert!(entry_actions(Some(&entry(Some("https://a"))), None, None).is_empty());
        assert!(entry_actions(None, Some(FeedViewType::Articles), None).is_empty());
    }

    #[test]
    fn fixed_order_with_both_sides_of_each_toggle() {
        let actions = entry_actions(
            Some(&entry(Some("https://a"))),
            Some(FeedViewType::Pictures),
            None,
        );
        assert_eq!(
            kinds(&actions),
            vec![
                EntryActionKind::Star,
                EntryActionKind::Unstar,
                EntryActionKind::CopyLink,
                EntryActionKind::OpenInBrowser,
                EntryActionKind::SaveImagesToEagle,
                EntryActionKind::Share,
                EntryActionKind::MarkAsRead,
                EntryActionKind::MarkAsUnread,
            ]
        );
        let disabled: Vec<bool> = actions.iter().map(|action| action.disabled).collect();
        assert_eq!(
            disabled,
            vec![false, true, false, false, true, false, false, true]
        );
    }

    #[test]
    fn eagle_needs_helper_and_images() {
        let mut with_images = entry(Some("https://a"));
        with_images.entries.images = Some(vec!["https://a/1.png".into()]);
        let view = Some(FeedViewType::Articles);

        let eagle = |state| {
            entry_actions(Some(&with_images), view, state)
                .into_iter()
                .find(|action| action.kind == EntryActionKind::SaveImagesToEagle)
                .map(|action| action.disabled)
        };
        assert_eq!(eagle(Some(ProbeState::Ready(true))), Some(false));
        assert_eq!(eagle(Some(ProbeState::Ready(false))), Some(true));
        assert_eq!(eagle(Some(ProbeState::Loading)), Some(true));

        let without_images = entry(Some("https://a"));
        let action = entry_actions(Some(&without_images), view, Some(ProbeState::Ready(true)))
            .into_iter()
            .find(|action| action.kind == EntryActionKind::SaveImagesToEagle)
            .unwrap();
        assert!(action.disabled);
    }
}
