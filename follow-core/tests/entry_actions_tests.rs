mod common;

use std::time::Duration;

use follow_core::{
    entry_actions, CollectionStatus, EntryActionKind, FeedViewType, MutationOutcome,
    Reconciliation,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{entry, subscription, Harness, PlatformCall};

fn ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": 0 }))
}

fn is_disabled(entry: &follow_core::EntryModel, kind: EntryActionKind) -> bool {
    entry_actions(Some(entry), Some(FeedViewType::Articles), None)
        .into_iter()
        .find(|action| action.kind == kind)
        .map(|action| action.disabled)
        .unwrap()
}

#[tokio::test]
async fn star_applies_before_the_request_resolves() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collections"))
        .and(body_json(json!({ "entryId": "e1" })))
        .respond_with(ok().set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server, true);
    let entries = &harness.session.stores.entries;
    entries.upsert_many(vec![entry("e1", "f1", false)]).await;
    let before = entries.get("e1").await.unwrap();
    assert!(!is_disabled(&before, EntryActionKind::Star));

    let handle = harness.session.actions.star(&before).await;

    let optimistic = entries.get("e1").await.unwrap();
    assert!(optimistic.collections.is_some());
    assert!(!handle.is_finished());
    assert!(is_disabled(&optimistic, EntryActionKind::Star));
    assert!(!is_disabled(&optimistic, EntryActionKind::Unstar));
    assert!(harness.session.toaster.messages().is_empty());

    assert_eq!(handle.wait().await.unwrap(), MutationOutcome::Succeeded);
    assert_eq!(harness.session.toaster.messages(), vec!["Collected.".to_string()]);
    assert_eq!(harness.session.reconciler.pending_count().await, 0);
}

#[tokio::test]
async fn unstar_clears_collection_and_confirms() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/collections"))
        .and(body_json(json!({ "entryId": "e1" })))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server, true);
    let mut starred = entry("e1", "f1", false);
    starred.collections = Some(CollectionStatus {
        created_at: chrono::Utc::now(),
    });
    let entries = &harness.session.stores.entries;
    entries.upsert_many(vec![starred.clone()]).await;

    let outcome = harness
        .session
        .actions
        .invoke(EntryActionKind::Unstar, &starred)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(outcome, MutationOutcome::Succeeded);
    assert!(entries.get("e1").await.unwrap().collections.is_none());
    assert_eq!(harness.session.toaster.messages(), vec!["Uncollected.".to_string()]);
}

#[tokio::test]
async fn failed_star_is_reverted_when_rollback_is_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collections"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, true);
    let entries = &harness.session.stores.entries;
    entries.upsert_many(vec![entry("e1", "f1", false)]).await;
    let current = entries.get("e1").await.unwrap();

    let outcome = harness.session.actions.star(&current).await.wait().await.unwrap();
    assert_eq!(outcome, MutationOutcome::Failed(Reconciliation::Reverted));
    assert!(entries.get("e1").await.unwrap().collections.is_none());
    assert!(harness.session.toaster.messages().is_empty());
}

#[tokio::test]
async fn failed_star_is_kept_when_rollback_is_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collections"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, false);
    let entries = &harness.session.stores.entries;
    entries.upsert_many(vec![entry("e1", "f1", false)]).await;
    let current = entries.get("e1").await.unwrap();

    let outcome = harness.session.actions.star(&current).await.wait().await.unwrap();
    assert_eq!(outcome, MutationOutcome::Failed(Reconciliation::Kept));
    assert!(entries.get("e1").await.unwrap().collections.is_some());
}

#[tokio::test]
async fn newer_server_copy_wins_over_a_failed_optimistic_write() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reads"))
        .respond_with(ResponseTemplate::new(503).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, true);
    let entries = &harness.session.stores.entries;
    entries.upsert_many(vec![entry("e1", "f1", false)]).await;
    let current = entries.get("e1").await.unwrap();

    let handle = harness.session.actions.mark_read(&current).await;
    // A fetch lands while the request is in flight and already says "read".
    entries.upsert_many(vec![entry("e1", "f1", true)]).await;

    let outcome = handle.wait().await.unwrap();
    assert_eq!(outcome, MutationOutcome::Failed(Reconciliation::Kept));
    assert!(entries.get("e1").await.unwrap().read);
}

#[tokio::test]
async fn read_and_unread_move_the_unread_counter_silently() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reads"))
        .and(body_json(json!({ "entryIds": ["e1"] })))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/reads"))
        .and(body_json(json!({ "entryId": "e1" })))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server, true);
    let stores = &harness.session.stores;
    stores
        .entries
        .upsert_many(vec![entry("e1", "f1", false), entry("e2", "f1", false)])
        .await;
    stores.unread.update_by_feed_id("f1", 2).await;

    let current = stores.entries.get("e1").await.unwrap();
    let handle = harness.session.actions.mark_read(&current).await;
    assert!(stores.entries.get("e1").await.unwrap().read);
    assert_eq!(stores.unread.get("f1").await, 1);
    assert_eq!(handle.wait().await.unwrap(), MutationOutcome::Succeeded);

    let current = stores.entries.get("e1").await.unwrap();
    assert!(is_disabled(&current, EntryActionKind::MarkAsRead));
    let handle = harness.session.actions.mark_unread(&current).await;
    assert!(!stores.entries.get("e1").await.unwrap().read);
    assert_eq!(stores.unread.get("f1").await, 2);
    assert_eq!(handle.wait().await.unwrap(), MutationOutcome::Succeeded);

    assert!(harness.session.toaster.messages().is_empty());
}

#[tokio::test]
async fn failed_read_restores_the_counter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reads"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, true);
    let stores = &harness.session.stores;
    stores.entries.upsert_many(vec![entry("e1", "f1", false)]).await;
    stores.unread.update_by_feed_id("f1", 1).await;

    let current = stores.entries.get("e1").await.unwrap();
    let outcome = harness.session.actions.mark_read(&current).await.wait().await.unwrap();
    assert_eq!(outcome, MutationOutcome::Failed(Reconciliation::Reverted));
    assert!(!stores.entries.get("e1").await.unwrap().read);
    assert_eq!(stores.unread.get("f1").await, 1);
}

#[tokio::test]
async fn failed_read_on_a_zero_counter_leaves_it_at_zero() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reads"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, true);
    let stores = &harness.session.stores;
    stores
        .entries
        .upsert_many(vec![entry("e1", "f1", false), entry("e2", "f2", false)])
        .await;
    stores.unread.update_by_feed_id("f1", 0).await;

    let current = stores.entries.get("e1").await.unwrap();
    let outcome = harness.session.actions.mark_read(&current).await.wait().await.unwrap();
    assert_eq!(outcome, MutationOutcome::Failed(Reconciliation::Reverted));
    assert!(!stores.entries.get("e1").await.unwrap().read);
    assert_eq!(stores.unread.get("f1").await, 0);

    // Counter never loaded for f2.
    let current = stores.entries.get("e2").await.unwrap();
    let outcome = harness.session.actions.mark_read(&current).await.wait().await.unwrap();
    assert_eq!(outcome, MutationOutcome::Failed(Reconciliation::Reverted));
    assert_eq!(stores.unread.get("f2").await, 0);
}

#[tokio::test]
async fn link_actions_hand_off_to_the_platform() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server, true);
    let item = entry("e1", "f1", false);
    let url = item.url().unwrap().to_string();

    for kind in [
        EntryActionKind::CopyLink,
        EntryActionKind::OpenInBrowser,
        EntryActionKind::Share,
    ] {
        assert!(harness.session.actions.invoke(kind, &item).await.is_none());
    }

    assert_eq!(
        harness.platform.calls(),
        vec![
            PlatformCall::Clipboard(url.clone()),
            PlatformCall::Open(url.clone()),
            PlatformCall::Share(url),
        ]
    );
    assert_eq!(
        harness.session.toaster.messages(),
        vec!["Link copied to clipboard.".to_string()]
    );

    let mut no_url = entry("e2", "f1", false);
    no_url.entries.url = None;
    harness.session.actions.copy_link(&no_url);
    harness.session.actions.open_in_browser(&no_url);
    assert_eq!(harness.platform.calls().len(), 3);
}

#[tokio::test]
async fn mark_all_read_by_view_posts_then_cascades() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reads/all"))
        .and(body_json(json!({ "view": 0 })))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server, true);
    let stores = &harness.session.stores;
    stores
        .subscriptions
        .upsert("f1", subscription("f1", FeedViewType::Articles))
        .await;
    stores
        .subscriptions
        .upsert("f2", subscription("f2", FeedViewType::Videos))
        .await;
    stores
        .entries
        .upsert_many(vec![entry("e1", "f1", false), entry("e2", "f2", false)])
        .await;
    stores.unread.update_by_feed_id("f1", 1).await;
    stores.unread.update_by_feed_id("f2", 1).await;

    let feeds = harness
        .session
        .actions
        .mark_all_read_by_view(FeedViewType::Articles)
        .await
        .unwrap();
    assert_eq!(feeds, vec!["f1".to_string()]);
    assert!(stores.entries.get("e1").await.unwrap().read);
    assert!(!stores.entries.get("e2").await.unwrap().read);
    assert_eq!(stores.unread.get("f1").await, 0);
    assert_eq!(stores.unread.get("f2").await, 1);
}

#[tokio::test]
async fn fetch_entries_fills_the_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/entries"))
        .and(body_json(json!({ "feedId": "f1", "view": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": [{
                "entries": { "id": "e9", "url": "https://f1.example/e9", "images": ["https://img/1.png"] },
                "feeds": { "id": "f1", "url": "https://f1.example/rss" },
                "read": false
            }]
        })))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, true);
    let fetched = harness
        .session
        .actions
        .fetch_entries(Some("f1"), None)
        .await
        .unwrap();
    assert_eq!(fetched.len(), 1);
    let stored = harness.session.stores.entries.by_feed("f1").await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].images().to_vec(), vec!["https://img/1.png".to_string()]);
}
