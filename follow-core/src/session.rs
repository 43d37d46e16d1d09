use std::sync::Arc;

use tracing::info;

use crate::actions::EntryActions;
use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::eagle::{EagleClient, EagleProbeCache};
use crate::entry::EntryStore;
use crate::error::ClientError;
use crate::events::EventBus;
use crate::image::{FailedProxyCache, ImageElement, ImageOptions, ImageProxy, PreviewRequest};
use crate::notify::Toaster;
use crate::optimistic::Reconciler;
use crate::platform::Platform;
use crate::subscription::SubscriptionStore;
use crate::unread::UnreadStore;

/// Stores sharing one event bus, with the cross-store listeners registered.
#[derive(Clone)]
pub struct Stores {
    pub bus: EventBus,
    pub subscriptions: SubscriptionStore,
    pub entries: EntryStore,
    pub unread: UnreadStore,
}

impl Stores {
    pub fn new(api: ApiClient) -> Self {
        let bus = EventBus::default();
        let subscriptions = SubscriptionStore::new(api, bus.clone());
        let entries = EntryStore::new(bus.clone());
        let unread = UnreadStore::new(bus.clone());
        bus.register(Arc::new(entries.clone()));
        bus.register(Arc::new(unread.clone()));
        Self {
            bus,
            subscriptions,
            entries,
            unread,
        }
    }

    /// Drops every cached record (logout).
    pub async fn reset(&self) {
        self.subscriptions.reset().await;
        self.entries.reset().await;
        self.unread.reset().await;
    }
}

/// Everything one signed-in client session needs.
#[derive(Clone)]
pub struct Session {
    pub api: ApiClient,
    pub stores: Stores,
    pub reconciler: Reconciler,
    pub actions: EntryActions,
    pub toaster: Toaster,
    pub failed_proxies: FailedProxyCache,
    pub image_proxy: Option<ImageProxy>,
}

impl Session {
    pub fn new(config: &AppConfig, platform: Arc<dyn Platform>) -> Result<Self, ClientError> {
        let api = ApiClient::from_config(&config.api)?;
        let eagle = EagleClient::from_config(&config.eagle)?;
        Ok(Self::with_clients(
            config,
            api,
            eagle,
            ImageProxy::from_config(&config.image_proxy),
            platform,
        ))
    }

    pub fn with_clients(
        config: &AppConfig,
        api: ApiClient,
        eagle: EagleClient,
        image_proxy: Option<ImageProxy>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        let stores = Stores::new(api.clone());
        let toaster = Toaster::new();
        let reconciler = Reconciler::new(
            stores.entries.clone(),
            stores.unread.clone(),
            config.optimistic.rollback_on_failure,
        );
        let actions = EntryActions::new(
            api.clone(),
            stores.entries.clone(),
            stores.subscriptions.clone(),
            reconciler.clone(),
            EagleProbeCache::new(eagle).with_bus(stores.bus.clone()),
            toaster.clone(),
            platform,
        );
        info!(base = %api.base_url(), "session ready");
        Self {
            api,
            stores,
            reconciler,
            actions,
            toaster,
            failed_proxies: FailedProxyCache::new(),
            image_proxy,
        }
    }

    pub fn image(&self, src: Option<String>, options: ImageOptions) -> ImageElement {
        ImageElement::new(
            src,
            options,
            self.image_proxy.as_ref(),
            self.failed_proxies.clone(),
        )
    }

    /// Full-size element for the image a preview points at, loaded from the original address.
    pub fn preview_image(&self, request: &PreviewRequest) -> Option<ImageElement> {
        let src = request.images.get(request.index)?.clone();
        let options = ImageOptions {
            proxy: None,
            disable_context_menu: true,
            popper: false,
        };
        Some(self.image(Some(src), options))
    }

    pub async fn logout(&self) {
        self.stores.reset().await;
        info!("session cleared");
    }
}
