use {
    serde::{Deserialize, Serialize},
    vetrina_oauth::Provider,
    vetrina_publish::Platform,
};

/// Per-provider connection state on a user record.
///
/// `connected == true` implies `access_token.is_some()`; the store's write
/// API moves the flag and the fields together so the invariant holds for
/// every reader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub connected: bool,
    /// Encrypted credential blob (vault output), never plaintext.
    pub access_token: Option<String>,
    /// Provider-side account identifier.
    pub account_id: Option<String>,
    pub username: Option<String>,
}

/// A brand user and their provider connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub instagram: Connection,
    pub shopify: Connection,
}

impl User {
    #[must_use]
    pub fn connection(&self, provider: Provider) -> &Connection {
        match provider {
            Provider::Instagram => &self.instagram,
            Provider::Shopify => &self.shopify,
        }
    }
}

/// Campaign lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Published,
}

impl CampaignStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            other => Err(format!("unknown campaign status: {other}")),
        }
    }
}

/// A marketing campaign and its publish state.
///
/// `published_to_instagram == true` implies `instagram_post_id.is_some()`.
/// The post id is a historical record: it survives a later disconnect of
/// the owning user's Instagram account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub user_id: String,
    pub headline: String,
    pub body: String,
    pub cta: String,
    pub hashtags: Vec<String>,
    pub image_url: Option<String>,
    pub platform: Platform,
    pub status: CampaignStatus,
    pub published_to_instagram: bool,
    pub instagram_post_id: Option<String>,
}

impl Campaign {
    /// A fresh draft targeting `platform`.
    #[must_use]
    pub fn draft(id: impl Into<String>, user_id: impl Into<String>, platform: Platform) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            headline: String::new(),
            body: String::new(),
            cta: String::new(),
            hashtags: Vec::new(),
            image_url: None,
            platform,
            status: CampaignStatus::Draft,
            published_to_instagram: false,
            instagram_post_id: None,
        }
    }
}
