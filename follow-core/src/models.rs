use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type FeedId = String;
pub type EntryId = String;

/// Display category partitioning feeds and entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FeedViewType {
    Articles,
    SocialMedia,
    Pictures,
    Videos,
    Audios,
    Notifications,
}

impl FeedViewType {
    pub const ALL: [FeedViewType; 6] = [
        FeedViewType::Articles,
        FeedViewType::SocialMedia,
        FeedViewType::Pictures,
        FeedViewType::Videos,
        FeedViewType::Audios,
        FeedViewType::Notifications,
    ];

    pub fn index(self) -> u8 {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            FeedViewType::Articles => "Articles",
            FeedViewType::SocialMedia => "Social Media",
            FeedViewType::Pictures => "Pictures",
            FeedViewType::Videos => "Videos",
            FeedViewType::Audios => "Audios",
            FeedViewType::Notifications => "Notifications",
        }
    }
}

impl From<FeedViewType> for u8 {
    fn from(view: FeedViewType) -> Self {
        match view {
            FeedViewType::Articles => 0,
            FeedViewType::SocialMedia => 1,
            FeedViewType::Pictures => 2,
            FeedViewType::Videos => 3,
            FeedViewType::Audios => 4,
            FeedViewType::Notifications => 5,
        }
    }
}

impl TryFrom<u8> for FeedViewType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        FeedViewType::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| format!("unknown view {value}"))
    }
}

impl fmt::Display for FeedViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedModel {
    pub id: FeedId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl FeedModel {
    pub fn with_id(id: impl Into<FeedId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            url: String::new(),
            site_url: None,
            image: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionModel {
    pub feed_id: FeedId,
    pub view: FeedViewType,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub feeds: FeedModel,
}

impl SubscriptionModel {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.feeds.title.as_deref())
            .unwrap_or(&self.feeds.url)
    }
}

/// Starred status of an entry. Absent means not starred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStatus {
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryContent {
    pub id: EntryId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryModel {
    pub entries: EntryContent,
    pub feeds: FeedModel,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub collections: Option<CollectionStatus>,
}

impl EntryModel {
    pub fn id(&self) -> &str {
        &self.entries.id
    }

    pub fn feed_id(&self) -> &str {
        &self.feeds.id
    }

    pub fn url(&self) -> Option<&str> {
        self.entries.url.as_deref().filter(|url| !url.is_empty())
    }

    pub fn images(&self) -> &[String] {
        self.entries.images.as_deref().unwrap_or_default()
    }

    pub fn is_starred(&self) -> bool {
        self.collections.is_some()
    }
}

/// Shallow field replacement applied to an entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryPatch {
    pub read: Option<bool>,
    pub collections: Option<Option<CollectionStatus>>,
}

impl EntryPatch {
    pub fn read(read: bool) -> Self {
        Self {
            read: Some(read),
            ..Default::default()
        }
    }

    pub fn collections(collections: Option<CollectionStatus>) -> Self {
        Self {
            collections: Some(collections),
            ..Default::default()
        }
    }

    /// Applies the patch and returns the patch that undoes it.
    pub fn apply(&self, entry: &mut EntryModel) -> EntryPatch {
        let mut inverse = EntryPatch::default();
        if let Some(read) = self.read {
            inverse.read = Some(entry.read);
            entry.read = read;
        }
        if let Some(collections) = &self.collections {
            inverse.collections = Some(entry.collections.take());
            entry.collections = collections.clone();
        }
        inverse
    }
}

/// Envelope wrapping every API response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub code: i64,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}
