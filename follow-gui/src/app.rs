use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui::{self, Color32, RichText, Rounding, Stroke};
use follow_core::{
    run_menu_action, ActionIcon, AppConfig, ClickOutcome, EntryAction, EntryModel, FeedId,
    FeedViewType, ImageOptions, PollerHandle, PreviewRequest, ProxySize, Session,
    StoreEvent, SubscriptionModel,
};
use reqwest::Client;
use tokio::runtime::Runtime;
use tokio::sync::broadcast;
use tracing::warn;

use crate::images::ImageLoader;
use crate::platform::DesktopPlatform;

pub struct AppInit {
    pub runtime: Arc<Runtime>,
    pub session: Session,
    pub poller: PollerHandle,
    pub image_client: Client,
    pub config: AppConfig,
}

#[derive(Debug, Clone)]
enum AppView {
    EntryList,
    EntryDetail(String),
}

pub struct FollowApp {
    runtime: Arc<Runtime>,
    session: Session,
    poller: Option<PollerHandle>,
    config: AppConfig,
    view: FeedViewType,
    current_view: AppView,
    subscriptions: Vec<SubscriptionModel>,
    unread: HashMap<FeedId, u32>,
    selected_feed: Option<FeedId>,
    entries: Vec<EntryModel>,
    images: ImageLoader,
    preview: Option<PreviewRequest>,
    platform: DesktopPlatform,
    events: broadcast::Receiver<StoreEvent>,
    dirty: bool,
}

impl FollowApp {
    pub fn new(init: AppInit, ctx: &egui::Context) -> Self {
        let view = init.config.refresh.view.unwrap_or(FeedViewType::Articles);
        let events = init.session.stores.bus.subscribe();
        let mut app = Self {
            images: ImageLoader::new(init.runtime.clone(), init.image_client),
            runtime: init.runtime,
            session: init.session,
            poller: Some(init.poller),
            config: init.config,
            view,
            current_view: AppView::EntryList,
            subscriptions: Vec::new(),
            unread: HashMap::new(),
            selected_feed: None,
            entries: Vec::new(),
            preview: None,
            platform: DesktopPlatform,
            events,
            dirty: true,
        };
        app.apply_theme(ctx);
        app.forward_store_events(ctx);
        app.switch_view(view);
        app
    }

    /// Repaints whenever a store changes, including from background tasks.
    fn forward_store_events(&self, ctx: &egui::Context) {
        let mut events = self.session.stores.bus.subscribe();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            loop {
                match events.recv().await {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => ctx.request_repaint(),
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    fn apply_theme(&self, ctx: &egui::Context) {
        let theme = &self.config.theme;
        let mut style = (*ctx.style()).clone();
        style.visuals.dark_mode = true;
        style.visuals.panel_fill = theme.panel_color32();
        style.visuals.window_fill = theme.background_color32();
        style.visuals.override_text_color = Some(theme.text_color32());
        style.visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, theme.accent_color32());
        style.visuals.widgets.active.bg_fill = theme.accent_color32();
        style.visuals.selection.stroke = Stroke::new(1.0, theme.accent_color32());
        style.visuals.widgets.inactive.rounding = Rounding::same(3.0);
        style.visuals.widgets.hovered.rounding = Rounding::same(3.0);
        style.spacing.item_spacing = egui::vec2(10.0, 8.0);
        style.spacing.button_padding = egui::vec2(10.0, 6.0);
        for font in style.text_styles.values_mut() {
            font.size = font.size.max(self.config.ui.font_size);
        }
        ctx.set_style(style);
    }

    fn switch_view(&mut self, view: FeedViewType) {
        self.view = view;
        self.selected_feed = None;
        self.current_view = AppView::EntryList;
        let stores = self.session.stores.clone();
        let api = self.session.api.clone();
        self.runtime.spawn(async move {
            if let Err(err) = follow_core::poll_once(&stores.subscriptions, &stores.unread, &api, Some(view)).await {
                warn!(error = %err, %view, "failed to load view");
            }
        });
        self.dirty = true;
    }

    fn select_feed(&mut self, feed_id: FeedId) {
        self.selected_feed = Some(feed_id.clone());
        self.current_view = AppView::EntryList;
        let actions = self.session.actions.clone();
        self.runtime.spawn(async move {
            if let Err(err) = actions.fetch_entries(Some(&feed_id), None).await {
                warn!(error = %err, feed_id = %feed_id, "failed to load entries");
            }
        });
        self.dirty = true;
    }

    fn mark_view_read(&self) {
        let actions = self.session.actions.clone();
        let view = self.view;
        self.runtime.spawn(async move {
            if let Err(err) = actions.mark_all_read_by_view(view).await {
                warn!(error = %err, %view, "failed to mark view read");
            }
        });
    }

    fn reload_snapshots(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        let stores = &self.session.stores;
        let view = self.view;
        let selected = self.selected_feed.clone();
        let (subscriptions, unread, entries) = self.runtime.block_on(async {
            let subscriptions = stores.subscriptions.list(Some(view)).await;
            let unread = stores.unread.snapshot().await;
            let entries = match &selected {
                Some(feed_id) => stores.entries.by_feed(feed_id).await,
                None => Vec::new(),
            };
            (subscriptions, unread, entries)
        });
        self.subscriptions = subscriptions;
        self.unread = unread;
        self.entries = entries;
    }

    fn draw_subscriptions(&mut self, ui: &mut egui::Ui) {
        let mut next_view = None;
        egui::ComboBox::from_label("View")
            .selected_text(self.view.label())
            .show_ui(ui, |ui| {
                for view in FeedViewType::ALL {
                    if ui.selectable_label(self.view == view, view.label()).clicked() {
                        next_view = Some(view);
                    }
                }
            });
        if let Some(view) = next_view.filter(|v| *v != self.view) {
            self.switch_view(view);
        }

        if ui.button("Mark all as read").clicked() {
            self.mark_view_read();
        }
        ui.separator();

        let mut clicked = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            if self.subscriptions.is_empty() {
                ui.label(RichText::new("No subscriptions").weak());
            }
            for subscription in &self.subscriptions {
                let feed_id = &subscription.feeds.id;
                let count = self.unread.get(feed_id).copied().unwrap_or(0);
                let label = if count > 0 {
                    format!("{}  ({count})", subscription.display_title())
                } else {
                    subscription.display_title().to_owned()
                };
                let selected = self.selected_feed.as_ref() == Some(feed_id);
                if ui.selectable_label(selected, label).clicked() {
                    clicked = Some(feed_id.clone());
                }
            }
        });
        if let Some(feed_id) = clicked {
            self.select_feed(feed_id);
        }
    }

    fn draw_entry_list(&mut self, ui: &mut egui::Ui) {
        if self.selected_feed.is_none() {
            ui.label(RichText::new("Select a feed").weak());
            return;
        }
        let starred = self.config.theme.starred_color32();
        let mut opened = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for entry in &self.entries {
                let title = entry.entries.title.as_deref().unwrap_or("(untitled)");
                let mut text = RichText::new(title);
                if !entry.read {
                    text = text.strong();
                }
                ui.horizontal(|ui| {
                    if entry.is_starred() {
                        ui.label(RichText::new("★").color(starred));
                    }
                    if ui.link(text).clicked() {
                        opened = Some(entry.entries.id.clone());
                    }
                });
            }
        });
        if let Some(entry_id) = opened {
            self.images.clear();
            self.current_view = AppView::EntryDetail(entry_id);
        }
    }

    fn draw_entry_detail(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, entry_id: &str) {
        if ui.button("← Back").clicked() {
            self.current_view = AppView::EntryList;
            return;
        }
        let Some(entry) = self.entries.iter().find(|e| e.entries.id == entry_id).cloned() else {
            ui.label(RichText::new("Entry not loaded").weak());
            return;
        };
        ui.heading(entry.entries.title.as_deref().unwrap_or("(untitled)"));
        if let Some(published) = entry.entries.published_at {
            ui.label(RichText::new(published.format("%Y-%m-%d %H:%M").to_string()).weak());
        }

        let actions = self
            .runtime
            .block_on(self.session.actions.list(Some(&entry), Some(self.view)));
        ui.horizontal_wrapped(|ui| {
            for action in &actions {
                if ui
                    .add_enabled(!action.disabled, egui::Button::new(action_label(action)))
                    .clicked()
                {
                    // Fire and forget; the store already holds the optimistic value.
                    let _ = self
                        .runtime
                        .block_on(self.session.actions.invoke(action.kind, &entry));
                }
            }
        });
        ui.separator();

        if let Some(description) = &entry.entries.description {
            ui.label(description);
        }
        self.draw_images(ui, ctx, &entry);
    }

    fn draw_images(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, entry: &EntryModel) {
        let size = self.config.ui.thumbnail_size;
        let options = ImageOptions {
            proxy: Some(ProxySize {
                width: size,
                height: size,
            }),
            disable_context_menu: false,
            popper: true,
        };
        for src in entry.images() {
            let session = &self.session;
            self.images
                .track(src, || session.image(Some(src.clone()), options), ctx);
        }
        ui.horizontal_wrapped(|ui| {
            for src in entry.images() {
                let Some(slot) = self.images.slot(src) else {
                    continue;
                };
                if slot.element.is_hidden() {
                    continue;
                }
                let Some(texture) = &slot.texture else {
                    ui.add_sized([size as f32, size as f32], egui::Spinner::new());
                    continue;
                };
                let response = ui.add(
                    egui::Image::new(texture)
                        .max_width(size as f32)
                        .sense(egui::Sense::click()),
                );
                if response.clicked() {
                    if let ClickOutcome::Preview(request) = slot.element.on_click() {
                        self.preview = Some(request);
                    }
                }
                if let Some(menu) = slot.element.context_menu() {
                    let platform = &self.platform;
                    let toaster = &self.session.toaster;
                    response.context_menu(|ui| {
                        for item in &menu {
                            if ui.button(item.label).clicked() {
                                run_menu_action(&item.action, platform, toaster);
                                ui.close_menu();
                            }
                        }
                    });
                }
            }
        });
    }

    fn draw_preview(&mut self, ctx: &egui::Context) {
        let Some(request) = &self.preview else {
            return;
        };
        let mut open = true;
        let key = request
            .images
            .get(request.index)
            .map(|src| format!("preview:{src}"));
        if let Some(key) = &key {
            if self.images.slot(key).is_none() {
                if let Some(element) = self.session.preview_image(request) {
                    self.images.track(key, || element, ctx);
                }
            }
        }
        egui::Window::new("Preview")
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .default_size(ctx.screen_rect().size() * 0.9)
            .show(ctx, |ui| {
                let slot = key.as_deref().and_then(|key| self.images.slot(key));
                match slot {
                    Some(slot) if slot.element.is_hidden() => {
                        ui.label(RichText::new("Image unavailable").weak());
                    }
                    Some(slot) => match &slot.texture {
                        Some(texture) => {
                            ui.add(egui::Image::new(texture).shrink_to_fit());
                        }
                        None => {
                            ui.spinner();
                        }
                    },
                    None => {
                        ui.spinner();
                    }
                }
            });
        if !open {
            self.preview = None;
        }
    }

    fn draw_toasts(&self, ctx: &egui::Context) {
        let now = Instant::now();
        self.session.toaster.prune(now);
        let toasts = self.session.toaster.active(now);
        if toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -16.0))
            .show(ctx, |ui| {
                for toast in &toasts {
                    egui::Frame::popup(ui.style())
                        .stroke(Stroke::new(1.0, self.config.theme.accent_color32()))
                        .show(ui, |ui| {
                            ui.label(RichText::new(&toast.message).color(Color32::WHITE));
                        });
                }
            });
        ctx.request_repaint_after(Duration::from_millis(200));
    }
}

fn action_label(action: &EntryAction) -> String {
    let glyph = match action.icon {
        ActionIcon::Class("i-mingcute-star-line") => "☆",
        ActionIcon::Class("i-mingcute-star-fill") => "★",
        ActionIcon::Class("i-mingcute-link-line") => "🔗",
        ActionIcon::Class("i-mingcute-world-2-line") => "🌐",
        ActionIcon::Class("i-mingcute-share-2-line") => "↗",
        ActionIcon::Class("i-mingcute-round-fill") => "●",
        ActionIcon::Class("i-mingcute-round-line") => "○",
        ActionIcon::Class(_) => "•",
        ActionIcon::Asset(_) => "🦅",
    };
    format!("{glyph} {}", action.name)
}

impl eframe::App for FollowApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        loop {
            match self.events.try_recv() {
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => self.dirty = true,
                Err(_) => break,
            }
        }
        self.images.poll(ctx);
        self.reload_snapshots();

        egui::SidePanel::left("subscriptions")
            .resizable(true)
            .default_width(self.config.ui.left_panel_width)
            .show(ctx, |ui| self.draw_subscriptions(ui));

        egui::CentralPanel::default().show(ctx, |ui| match self.current_view.clone() {
            AppView::EntryList => self.draw_entry_list(ui),
            AppView::EntryDetail(entry_id) => self.draw_entry_detail(ui, ctx, &entry_id),
        });

        self.draw_preview(ctx);
        self.draw_toasts(ctx);
    }

    fn on_exit(&mut self) {
        if let Some(poller) = self.poller.take() {
            if let Err(err) = self.runtime.block_on(poller.stop()) {
                warn!(error = %err, "poller did not stop cleanly");
            }
        }
    }
}
