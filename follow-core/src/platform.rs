use crate::error::PlatformError;

/// Host services the client hands work off to.
pub trait Platform: Send + Sync {
    fn write_clipboard(&self, text: &str) -> Result<(), PlatformError>;

    /// Opens `url` outside the application (browser or new window).
    fn open_external(&self, url: &str) -> Result<(), PlatformError>;

    fn show_share_menu(&self, url: &str) -> Result<(), PlatformError>;
}
