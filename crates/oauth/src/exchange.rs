//! Authorization-code exchange against the provider token endpoint.

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    std::time::Duration,
    tracing::{debug, warn},
    url::Url,
};

use crate::{
    error::{OAuthError, Result},
    types::{ExchangedToken, Provider, ProviderConfig, ProviderIdentity},
};

/// Provider-facing half of the connect flow.
///
/// Implementations must not mutate any local state; connecting a user is
/// the orchestrator's job. The demo implementation is selected at
/// construction time by configuration, never in response to an error.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    fn provider(&self) -> Provider;

    /// Build the provider authorization URL embedding `state`.
    fn authorization_url(&self, state: &str) -> Result<String>;

    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<ExchangedToken>;

    /// Fetch the identity of the account the token authorizes.
    async fn fetch_identity(&self, access_token: &str) -> Result<ProviderIdentity>;
}

// ── Live implementation ─────────────────────────────────────────────────────

/// Real token exchange over HTTPS.
pub struct HttpExchange {
    provider: Provider,
    config: ProviderConfig,
    client: reqwest::Client,
}

impl HttpExchange {
    /// Build an exchange client with an explicit request timeout.
    pub fn new(provider: Provider, config: ProviderConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OAuthError::config(format!("http client: {e}")))?;
        Ok(Self {
            provider,
            config,
            client,
        })
    }
}

#[async_trait]
impl TokenExchange for HttpExchange {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn authorization_url(&self, state: &str) -> Result<String> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| OAuthError::config(format!("invalid auth_url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("state", state);
        if !self.config.scopes.is_empty() {
            url.query_pairs_mut()
                .append_pair("scope", &self.config.scopes.join(","));
        }
        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<ExchangedToken> {
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(OAuthError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let message = truncated_body(response).await;
            warn!(provider = %self.provider, status = status.as_u16(), "token exchange rejected");
            return Err(OAuthError::Exchange {
                status: status.as_u16(),
                message,
            });
        }

        let body: serde_json::Value = response.json().await.map_err(OAuthError::Network)?;
        let access_token = body["access_token"]
            .as_str()
            .ok_or_else(|| OAuthError::MalformedResponse("missing access_token".into()))?
            .to_string();
        let provider_user_id = json_id(&body["user_id"])
            .ok_or_else(|| OAuthError::MalformedResponse("missing user_id".into()))?;

        debug!(provider = %self.provider, "authorization code exchanged");
        Ok(ExchangedToken {
            access_token: Secret::new(access_token),
            provider_user_id,
        })
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<ProviderIdentity> {
        let response = self
            .client
            .get(&self.config.identity_url)
            .query(&[("fields", "id,username"), ("access_token", access_token)])
            .send()
            .await
            .map_err(OAuthError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let message = truncated_body(response).await;
            return Err(OAuthError::Exchange {
                status: status.as_u16(),
                message,
            });
        }

        let body: serde_json::Value = response.json().await.map_err(OAuthError::Network)?;
        let account_id = json_id(&body["id"])
            .ok_or_else(|| OAuthError::MalformedResponse("missing account id".into()))?;
        let username = body["username"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(ProviderIdentity {
            account_id,
            username,
        })
    }
}

// ── Demo implementation ─────────────────────────────────────────────────────

/// Offline stand-in used when no provider app credentials are configured.
///
/// Selected only through the `demo_mode` configuration flag so the rest of
/// the pipeline stays exercisable without a live provider app. Returns
/// clearly labeled placeholder values and never talks to the network.
pub struct DemoExchange {
    provider: Provider,
}

impl DemoExchange {
    pub fn new(provider: Provider) -> Self {
        warn!(provider = %provider, "demo oauth exchange active; tokens are placeholders");
        Self { provider }
    }
}

#[async_trait]
impl TokenExchange for DemoExchange {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn authorization_url(&self, state: &str) -> Result<String> {
        Ok(format!(
            "https://demo.vetrina.invalid/oauth/authorize?provider={}&state={state}",
            self.provider
        ))
    }

    async fn exchange_code(&self, _code: &str) -> Result<ExchangedToken> {
        Ok(ExchangedToken {
            access_token: Secret::new(format!("demo-token-{}", uuid::Uuid::new_v4())),
            provider_user_id: "demo-account".into(),
        })
    }

    async fn fetch_identity(&self, _access_token: &str) -> Result<ProviderIdentity> {
        Ok(ProviderIdentity {
            account_id: "demo-account".into(),
            username: format!("vetrina.demo.{}", self.provider),
        })
    }
}

/// Read at most 300 chars of an error body for diagnostics.
async fn truncated_body(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    match body.char_indices().nth(300) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body,
    }
}

/// Provider ids arrive as JSON numbers or strings depending on the API
/// version; normalize to a string.
fn json_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
