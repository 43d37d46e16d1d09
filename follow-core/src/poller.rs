use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::config::RefreshConfig;
use crate::error::{ClientError, TaskError};
use crate::models::FeedViewType;
use crate::subscription::SubscriptionStore;
use crate::unread::UnreadStore;

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub view: Option<FeedViewType>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            view: None,
        }
    }
}

impl From<&RefreshConfig> for PollConfig {
    fn from(config: &RefreshConfig) -> Self {
        Self {
            interval: config.interval(),
            view: config.view,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    pub subscriptions: usize,
    pub unread_feeds: usize,
}

pub struct PollerHandle {
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl PollerHandle {
    pub async fn stop(self) -> Result<(), TaskError> {
        let _ = self.cancel_tx.send(());
        self.join.await.map_err(TaskError::from)
    }
}

/// Refetches the subscriptions of `view` and the unread counters.
pub async fn poll_once(
    subscriptions: &SubscriptionStore,
    unread: &UnreadStore,
    api: &ApiClient,
    view: Option<FeedViewType>,
) -> Result<PollSummary, ClientError> {
    let fetched = subscriptions.fetch_by_view(view).await?;
    let counts = api.unread_counts(view).await?;
    let unread_feeds = counts.len();
    match view {
        None => unread.replace_all(counts).await,
        Some(_) => {
            for (feed_id, count) in counts {
                unread.update_by_feed_id(&feed_id, count).await;
            }
        }
    }
    Ok(PollSummary {
        subscriptions: fetched.len(),
        unread_feeds,
    })
}

pub fn spawn_poller(
    subscriptions: SubscriptionStore,
    unread: UnreadStore,
    api: ApiClient,
    config: PollConfig,
) -> PollerHandle {
    let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel_rx.recv() => {
                    info!("poller shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    match poll_once(&subscriptions, &unread, &api, config.view).await {
                        Ok(summary) => {
                            info!(subscriptions = summary.subscriptions, unread_feeds = summary.unread_feeds, "refreshed");
                        }
                        Err(err) => {
                            warn!(error = %err, "refresh failed");
                        }
                    }
                }
            }
        }
    });

    PollerHandle { cancel_tx, join }
}
