use follow_core::{Platform, PlatformError};
use tracing::debug;
use url::Url;

/// Clipboard through `arboard`, links through the system browser.
#[derive(Debug, Default)]
pub struct DesktopPlatform;

impl Platform for DesktopPlatform {
    fn write_clipboard(&self, text: &str) -> Result<(), PlatformError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| PlatformError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|e| PlatformError::Clipboard(e.to_string()))
    }

    fn open_external(&self, url: &str) -> Result<(), PlatformError> {
        debug!(%url, "opening in browser");
        webbrowser::open(url).map_err(|e| PlatformError::Open(format!("{url}: {e}")))
    }

    // No native share sheet on desktop Linux; hand the link to the mail client.
    fn show_share_menu(&self, url: &str) -> Result<(), PlatformError> {
        let mut mailto = Url::parse("mailto:").map_err(|_| PlatformError::Unsupported)?;
        mailto.query_pairs_mut().append_pair("body", url);
        webbrowser::open(mailto.as_str()).map_err(|e| PlatformError::Open(e.to_string()))
    }
}
