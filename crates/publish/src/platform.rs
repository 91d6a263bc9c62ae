//! Per-platform publishing constraints.

use serde::{Deserialize, Serialize};

/// Social platforms a campaign can target.
///
/// Only [`Platform::Instagram`] is publishable through this service; the
/// rest exist so campaign content can be validated against the right
/// limits before an operator exports it manually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Instagram,
    InstagramStory,
    Tiktok,
    Facebook,
    Pinterest,
}

impl Platform {
    /// Hard caption length limit enforced by the platform.
    #[must_use]
    pub fn caption_limit(&self) -> usize {
        match self {
            Self::Instagram | Self::InstagramStory => 2200,
            Self::Tiktok => 2200,
            Self::Facebook => 63_206,
            Self::Pinterest => 500,
        }
    }

    /// Aspect-ratio label used in UI copy and validation messages.
    #[must_use]
    pub fn aspect_ratio(&self) -> &'static str {
        match self {
            Self::Instagram => "1:1",
            Self::InstagramStory | Self::Tiktok => "9:16",
            Self::Facebook => "1.91:1",
            Self::Pinterest => "2:3",
        }
    }

    /// Whether this service can publish directly to the platform.
    #[must_use]
    pub fn is_publishable(&self) -> bool {
        matches!(self, Self::Instagram)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::InstagramStory => "instagram_story",
            Self::Tiktok => "tiktok",
            Self::Facebook => "facebook",
            Self::Pinterest => "pinterest",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instagram" => Ok(Self::Instagram),
            "instagram_story" => Ok(Self::InstagramStory),
            "tiktok" => Ok(Self::Tiktok),
            "facebook" => Ok(Self::Facebook),
            "pinterest" => Ok(Self::Pinterest),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}
