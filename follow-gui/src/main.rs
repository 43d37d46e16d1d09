mod app;
mod images;
mod platform;

use std::sync::Arc;

use eframe::{egui, NativeOptions};
use follow_core::{spawn_poller, AppConfig, PollConfig, Session};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use crate::app::{AppInit, FollowApp};
use crate::platform::DesktopPlatform;

fn main() -> eframe::Result<()> {
    init_tracing();

    let runtime = Arc::new(Runtime::new().expect("failed to initialise Tokio runtime"));
    let config = AppConfig::load();
    let session = Session::new(&config, Arc::new(DesktopPlatform)).expect("failed to build API client");
    let image_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::limited(5))
        .user_agent(config.api.user_agent.clone())
        .timeout(config.api.request_timeout())
        .build()
        .expect("failed to build HTTP client");

    let poller = {
        let guard = runtime.enter();
        let handle = spawn_poller(
            session.stores.subscriptions.clone(),
            session.stores.unread.clone(),
            session.api.clone(),
            PollConfig::from(&config.refresh),
        );
        drop(guard);
        handle
    };

    let init = AppInit {
        runtime,
        session,
        poller,
        image_client,
        config,
    };

    eframe::run_native(
        "Follow",
        NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([1100.0, 760.0])
                .with_min_inner_size([720.0, 480.0]),
            ..Default::default()
        },
        Box::new(move |cc| Box::new(FollowApp::new(init, &cc.egui_ctx))),
    )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
