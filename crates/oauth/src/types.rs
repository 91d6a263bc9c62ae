use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// External providers a user can connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Instagram,
    Shopify,
}

impl Provider {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Shopify => "shopify",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instagram" => Ok(Self::Instagram),
            "shopify" => Ok(Self::Shopify),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Endpoint and credential configuration for one provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub identity_url: String,
    pub scopes: Vec<String>,
}

impl ProviderConfig {
    /// Instagram Graph-style defaults with injected app credentials.
    pub fn instagram(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret: Secret::new(client_secret),
            redirect_uri,
            auth_url: "https://api.instagram.com/oauth/authorize".into(),
            token_url: "https://api.instagram.com/oauth/access_token".into(),
            identity_url: "https://graph.instagram.com/me".into(),
            scopes: vec!["user_profile".into(), "user_media".into()],
        }
    }

    /// Shopify app defaults. The shop domain is part of the per-merchant
    /// authorize URL, so `auth_url`/`token_url` hold the path template.
    pub fn shopify(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret: Secret::new(client_secret),
            redirect_uri,
            auth_url: "https://accounts.shopify.com/oauth/authorize".into(),
            token_url: "https://accounts.shopify.com/oauth/token".into(),
            identity_url: "https://accounts.shopify.com/oauth/userinfo".into(),
            scopes: vec!["read_products".into()],
        }
    }
}

/// Result of a successful code exchange.
#[derive(Clone)]
pub struct ExchangedToken {
    pub access_token: Secret<String>,
    /// Provider-side user identifier returned by the token endpoint.
    pub provider_user_id: String,
}

impl ExchangedToken {
    #[must_use]
    pub fn token(&self) -> &str {
        self.access_token.expose_secret()
    }
}

impl std::fmt::Debug for ExchangedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangedToken")
            .field("access_token", &"[REDACTED]")
            .field("provider_user_id", &self.provider_user_id)
            .finish()
    }
}

/// Identity of the authorized provider account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderIdentity {
    pub account_id: String,
    pub username: String,
}
