mod common;

use follow_core::{
    run_menu_action, ApiClient, AppConfig, EagleClient, ImageOptions, ImageProxy, ImageState,
    ClickOutcome, LoadError, MenuAction, PreviewRequest, ProxySize, Session,
};
use std::sync::Arc;

use common::{PlatformCall, RecordingPlatform};

fn session(platform: Arc<RecordingPlatform>) -> Session {
    Session::with_clients(
        &AppConfig::default(),
        ApiClient::new("http://127.0.0.1:9").unwrap(),
        EagleClient::new("http://127.0.0.1:9").unwrap(),
        Some(ImageProxy::new("https://proxy.test/").unwrap()),
        platform,
    )
}

fn thumbnail() -> ImageOptions {
    ImageOptions {
        proxy: Some(ProxySize {
            width: 100,
            height: 100,
        }),
        ..Default::default()
    }
}

#[test]
fn failed_proxy_is_shared_across_elements_of_a_session() {
    let session = session(Arc::new(RecordingPlatform::default()));
    let src = "http://x/a.png".to_string();

    let mut first = session.image(Some(src.clone()), thumbnail());
    assert_eq!(first.state(), ImageState::LoadingProxied);
    let proxied = first.current_src().unwrap().to_string();
    first.on_error(LoadError {
        src: proxied,
        reason: "502".into(),
    });
    assert_eq!(first.current_src(), Some("http://x/a.png"));

    let second = session.image(Some(src.clone()), thumbnail());
    assert_eq!(second.state(), ImageState::LoadingOriginal);
    assert_eq!(second.current_src(), Some("http://x/a.png"));

    let other = session.image(Some("http://x/b.png".into()), thumbnail());
    assert_eq!(other.state(), ImageState::LoadingProxied);

    let fresh = self::session(Arc::new(RecordingPlatform::default()));
    assert!(fresh.failed_proxies.is_empty());
}

#[test]
fn menu_actions_use_the_original_address() {
    let platform = Arc::new(RecordingPlatform::default());
    let session = session(platform.clone());
    let element = session.image(Some("http://x/a.png".into()), thumbnail());

    let menu = element.context_menu().unwrap();
    for item in &menu {
        run_menu_action(&item.action, platform.as_ref(), &session.toaster);
    }

    assert_eq!(menu[0].action, MenuAction::OpenInNewWindow("http://x/a.png".into()));
    assert_eq!(
        platform.calls(),
        vec![
            PlatformCall::Open("http://x/a.png".into()),
            PlatformCall::Clipboard("http://x/a.png".into()),
        ]
    );
    assert_eq!(
        session.toaster.messages(),
        vec!["Address copied to clipboard.".to_string()]
    );
}

#[test]
fn preview_loads_the_original_at_full_size() {
    let session = session(Arc::new(RecordingPlatform::default()));
    let thumb = session.image(
        Some("http://x/a.png".into()),
        ImageOptions {
            popper: true,
            ..thumbnail()
        },
    );
    assert_ne!(thumb.current_src(), Some("http://x/a.png"));

    let ClickOutcome::Preview(request) = thumb.on_click() else {
        panic!("popper image should open a preview");
    };
    let preview = session.preview_image(&request).unwrap();
    assert_eq!(preview.state(), ImageState::LoadingOriginal);
    assert_eq!(preview.current_src(), Some("http://x/a.png"));
    assert!(preview.context_menu().is_none());

    let out_of_range = PreviewRequest {
        images: request.images.clone(),
        index: 3,
    };
    assert!(session.preview_image(&out_of_range).is_none());
}
