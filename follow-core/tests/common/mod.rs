#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use follow_core::{
    ApiClient, AppConfig, EagleClient, EntryContent, EntryModel, FeedModel, FeedViewType,
    Platform, PlatformError, Session, SubscriptionModel,
};
use wiremock::MockServer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    Clipboard(String),
    Open(String),
    Share(String),
}

#[derive(Default)]
pub struct RecordingPlatform {
    calls: Mutex<Vec<PlatformCall>>,
}

impl RecordingPlatform {
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Platform for RecordingPlatform {
    fn write_clipboard(&self, text: &str) -> Result<(), PlatformError> {
        self.calls
            .lock()
            .unwrap()
            .push(PlatformCall::Clipboard(text.to_string()));
        Ok(())
    }

    fn open_external(&self, url: &str) -> Result<(), PlatformError> {
        self.calls
            .lock()
            .unwrap()
            .push(PlatformCall::Open(url.to_string()));
        Ok(())
    }

    fn show_share_menu(&self, url: &str) -> Result<(), PlatformError> {
        self.calls
            .lock()
            .unwrap()
            .push(PlatformCall::Share(url.to_string()));
        Ok(())
    }
}

pub struct Harness {
    pub session: Session,
    pub platform: Arc<RecordingPlatform>,
}

impl Harness {
    pub fn new(server: &MockServer, rollback_on_failure: bool) -> Self {
        let mut config = AppConfig::default();
        config.optimistic.rollback_on_failure = rollback_on_failure;
        let platform = Arc::new(RecordingPlatform::default());
        let session = Session::with_clients(
            &config,
            ApiClient::new(&server.uri()).unwrap(),
            EagleClient::new(&server.uri()).unwrap(),
            None,
            platform.clone(),
        );
        Self { session, platform }
    }
}

pub fn subscription(feed_id: &str, view: FeedViewType) -> SubscriptionModel {
    SubscriptionModel {
        feed_id: feed_id.to_string(),
        view,
        category: None,
        title: None,
        feeds: FeedModel {
            title: Some(format!("Feed {feed_id}")),
            url: format!("https://{feed_id}.example/rss"),
            ..FeedModel::with_id(feed_id)
        },
    }
}

pub fn subscription_json(feed_id: &str, view: u8) -> serde_json::Value {
    serde_json::json!({
        "feedId": feed_id,
        "view": view,
        "feeds": { "id": feed_id, "url": format!("https://{feed_id}.example/rss") }
    })
}

pub fn entry(entry_id: &str, feed_id: &str, read: bool) -> EntryModel {
    EntryModel {
        entries: EntryContent {
            id: entry_id.to_string(),
            title: Some(format!("Entry {entry_id}")),
            url: Some(format!("https://{feed_id}.example/{entry_id}")),
            description: None,
            images: None,
            published_at: None,
        },
        feeds: FeedModel::with_id(feed_id),
        read,
        collections: None,
    }
}
