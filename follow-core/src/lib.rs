pub mod actions;
pub mod api;
pub mod config;
pub mod eagle;
pub mod entry;
pub mod error;
pub mod events;
pub mod image;
pub mod models;
pub mod notify;
pub mod optimistic;
pub mod platform;
pub mod poller;
pub mod session;
pub mod subscription;
pub mod unread;

pub use actions::{entry_actions, ActionIcon, EntryAction, EntryActionKind, EntryActions, MutationHandle, MutationOutcome};
pub use api::ApiClient;
pub use config::AppConfig;
pub use eagle::{EagleClient, EagleProbeCache, EagleResponse, ProbeState};
pub use entry::{AppliedPatch, EntryStore};
pub use error::{ClientError, ConfigError, PlatformError, TaskError};
pub use events::{EventBus, StoreEvent, StoreListener};
pub use image::{
    run_menu_action, ClickOutcome, FailedProxyCache, ImageElement, ImageOptions, ImageProxy,
    ImageState, LoadError, MenuAction, MenuItem, MenuItemKind, PreviewRequest, ProxySize,
};
pub use models::{
    CollectionStatus, EntryContent, EntryModel, EntryPatch, FeedId, FeedModel, FeedViewType,
    SubscriptionModel,
};
pub use notify::{Toast, Toaster};
pub use optimistic::{PendingHandle, Reconciler, Reconciliation};
pub use platform::Platform;
pub use poller::{poll_once, spawn_poller, PollConfig, PollSummary, PollerHandle};
pub use session::{Session, Stores};
pub use subscription::SubscriptionStore;
pub use unread::UnreadStore;
