use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::models::FeedViewType;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub image_proxy: ImageProxyConfig,
    pub eagle: EagleConfig,
    pub optimistic: OptimisticConfig,
    pub refresh: RefreshConfig,
    pub theme: ThemeConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageProxyConfig {
    pub endpoint: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EagleConfig {
    pub endpoint: String,
    pub probe_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimisticConfig {
    /// Revert an optimistic write when its request fails.
    pub rollback_on_failure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_seconds: u64,
    pub view: Option<FeedViewType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub background_color: [u8; 3],
    pub panel_color: [u8; 3],
    pub accent_color: [u8; 3],
    pub text_color: [u8; 3],
    pub starred_color: [u8; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub font_size: f32,
    pub left_panel_width: f32,
    pub thumbnail_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.follow.is".to_string(),
            request_timeout_seconds: 10,
            user_agent: "Follow/0.1 (desktop)".to_string(),
        }
    }
}

impl Default for ImageProxyConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://thumbor.follow.is".to_string(),
            enabled: true,
        }
    }
}

impl Default for EagleConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:41595".to_string(),
            probe_timeout_ms: 1500,
        }
    }
}

impl Default for OptimisticConfig {
    fn default() -> Self {
        Self {
            rollback_on_failure: true,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
            view: None,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            background_color: [30, 30, 30],
            panel_color: [37, 37, 38],
            accent_color: [255, 92, 0],
            text_color: [204, 204, 204],
            starred_color: [249, 115, 22],
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            left_panel_width: 280.0,
            thumbnail_size: 320,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl EagleConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(1))
    }
}

impl AppConfig {
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("follow"))
    }

    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Loads the user configuration, writing defaults when it is missing or unreadable.
    pub fn load() -> Self {
        let path = match Self::config_file_path() {
            Ok(path) => path,
            Err(err) => {
                warn!(error = %err, "using default configuration");
                return Self::default();
            }
        };
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, path = %path.display(), "failed to load configuration, using defaults");
                let config = Self::default();
                if let Err(save_err) = config.save_to(&path) {
                    warn!(error = %save_err, "failed to write default configuration");
                }
                config
            }
        }
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::config_file_path()?)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Atomic write
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        std::fs::rename(&tmp, path)?;
        info!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

fn color(rgb: [u8; 3]) -> egui::Color32 {
    egui::Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

impl ThemeConfig {
    pub fn background_color32(&self) -> egui::Color32 {
        color(self.background_color)
    }

    pub fn panel_color32(&self) -> egui::Color32 {
        color(self.panel_color)
    }

    pub fn accent_color32(&self) -> egui::Color32 {
        color(self.accent_color)
    }

    pub fn text_color32(&self) -> egui::Color32 {
        color(self.text_color)
    }

    pub fn starred_color32(&self) -> egui::Color32 {
        color(self.starred_color)
    }
}
