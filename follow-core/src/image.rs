//! Image element: proxied loading with a one-shot fallback to the original
//! address, a session-wide record of addresses the proxy failed on, click to
//! preview and a right-click menu.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};
use url::Url;

use crate::config::ImageProxyConfig;
use crate::notify::{Toaster, SHORT};
use crate::platform::Platform;

/// Resizing proxy in front of remote images.
#[derive(Debug, Clone)]
pub struct ImageProxy {
    endpoint: Url,
}

impl ImageProxy {
    pub fn new(endpoint: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
        })
    }

    pub fn from_config(config: &ImageProxyConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        match Self::new(&config.endpoint) {
            Ok(proxy) => Some(proxy),
            Err(err) => {
                warn!(error = %err, endpoint = %config.endpoint, "invalid image proxy endpoint");
                None
            }
        }
    }

    pub fn url(&self, src: &str, size: ProxySize) -> String {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("url", src)
            .append_pair("width", &size.width.to_string())
            .append_pair("height", &size.height.to_string());
        url.into()
    }
}

/// Addresses the proxy failed on during this session. Only ever grows.
#[derive(Debug, Clone, Default)]
pub struct FailedProxyCache {
    inner: Arc<RwLock<HashSet<String>>>,
}

impl FailedProxyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, src: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(src)
    }

    pub fn insert(&self, src: &str) -> bool {
        self.inner
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(src.to_owned())
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxySize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageOptions {
    pub proxy: Option<ProxySize>,
    pub disable_context_menu: bool,
    /// Clicking opens a full-screen preview.
    pub popper: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    LoadingProxied,
    LoadingOriginal,
    FailedHidden,
    Shown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub src: String,
    pub reason: String,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load {}: {}", self.src, self.reason)
    }
}

pub type ErrorCallback = Box<dyn FnMut(&LoadError) + Send>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRequest {
    pub images: Vec<String>,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Click consumed: show the preview instead of propagating.
    Preview(PreviewRequest),
    Propagate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItemKind {
    Text,
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    OpenInNewWindow(String),
    CopyAddress(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub kind: MenuItemKind,
    pub label: &'static str,
    pub icon: Option<&'static str>,
    pub action: MenuAction,
}

pub struct ImageElement {
    src: Option<String>,
    current: Option<String>,
    state: ImageState,
    options: ImageOptions,
    failed: FailedProxyCache,
    on_error: Option<ErrorCallback>,
}

impl fmt::Debug for ImageElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageElement")
            .field("src", &self.src)
            .field("current", &self.current)
            .field("state", &self.state)
            .field("options", &self.options)
            .finish()
    }
}

impl ImageElement {
    pub fn new(
        src: Option<String>,
        options: ImageOptions,
        proxy: Option<&ImageProxy>,
        failed: FailedProxyCache,
    ) -> Self {
        let src = src.filter(|s| !s.is_empty());
        let (current, state) = match (&src, proxy, options.proxy) {
            (None, _, _) => (None, ImageState::FailedHidden),
            (Some(src), Some(proxy), Some(size)) if !failed.contains(src) => {
                (Some(proxy.url(src, size)), ImageState::LoadingProxied)
            }
            (Some(src), _, _) => (Some(src.clone()), ImageState::LoadingOriginal),
        };
        Self {
            src,
            current,
            state,
            options,
            failed,
            on_error: None,
        }
    }

    pub fn with_on_error(mut self, callback: impl FnMut(&LoadError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> ImageState {
        self.state
    }

    pub fn is_hidden(&self) -> bool {
        self.state == ImageState::FailedHidden
    }

    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    /// Address to request right now; `None` once hidden.
    pub fn current_src(&self) -> Option<&str> {
        if self.is_hidden() {
            None
        } else {
            self.current.as_deref()
        }
    }

    pub fn on_load(&mut self) {
        if matches!(
            self.state,
            ImageState::LoadingProxied | ImageState::LoadingOriginal
        ) {
            self.state = ImageState::Shown;
        }
    }

    pub fn on_error(&mut self, error: LoadError) {
        if self.is_hidden() || self.current.as_deref() != Some(error.src.as_str()) {
            debug!(src = %error.src, "ignoring stale image error");
            return;
        }
        let Some(src) = self.src.clone() else {
            return;
        };
        if self.current.as_deref() != Some(src.as_str()) {
            debug!(%src, "proxy failed, falling back to original");
            self.failed.insert(&src);
            self.current = Some(src);
            self.state = ImageState::LoadingOriginal;
        } else {
            warn!(%error, "image hidden");
            self.state = ImageState::FailedHidden;
            if let Some(callback) = self.on_error.as_mut() {
                callback(&error);
            }
        }
    }

    pub fn on_click(&self) -> ClickOutcome {
        match (&self.src, self.options.popper) {
            (Some(src), true) => ClickOutcome::Preview(PreviewRequest {
                images: vec![src.clone()],
                index: 0,
            }),
            _ => ClickOutcome::Propagate,
        }
    }

    /// Items of the right-click menu, or `None` to leave the event alone.
    pub fn context_menu(&self) -> Option<Vec<MenuItem>> {
        if self.options.disable_context_menu {
            return None;
        }
        let src = self.src.clone()?;
        Some(vec![
            MenuItem {
                kind: MenuItemKind::Text,
                label: "Open Image in New Window",
                icon: None,
                action: MenuAction::OpenInNewWindow(src.clone()),
            },
            MenuItem {
                kind: MenuItemKind::Text,
                label: "Copy Image Address",
                icon: None,
                action: MenuAction::CopyAddress(src),
            },
        ])
    }
}

pub fn run_menu_action(action: &MenuAction, platform: &dyn Platform, toaster: &Toaster) {
    match action {
        MenuAction::OpenInNewWindow(src) => {
            if let Err(err) = platform.open_external(src) {
                warn!(error = %err, %src, "failed to open image");
            }
        }
        MenuAction::CopyAddress(src) => match platform.write_clipboard(src) {
            Ok(()) => {
                toaster.toast("Address copied to clipboard.", SHORT);
            }
            Err(err) => warn!(error = %err, "failed to copy image address"),
        },
    }
}
