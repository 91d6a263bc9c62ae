//! Integration orchestrator: the one place that sequences vault, oauth,
//! store, and publisher calls.

use {
    serde::Serialize,
    std::{collections::HashMap, sync::Arc},
    tracing::{error, info, warn},
    vetrina_oauth::{Provider, StateSigner, TokenExchange},
    vetrina_publish::{
        MediaPublisher, Platform, PublishRequest, PublishedPost, format_caption,
        validate_media_url,
    },
    vetrina_store::{CampaignStore, UserStore},
    vetrina_vault::CredentialVault,
};

use crate::error::{IntegrationError, Result};

/// What the client needs to start the connect flow.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationUrl {
    pub auth_url: String,
    pub state: String,
}

/// Outcome of a completed connect flow.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionResult {
    pub provider: Provider,
    pub account_id: String,
    pub username: String,
}

/// Orchestrates provider integrations over injected collaborators.
///
/// Holds no global state: every collaborator is passed in at construction,
/// and every public operation is independent so concurrent requests for
/// different users never contend inside this type.
pub struct IntegrationService {
    users: Arc<dyn UserStore>,
    campaigns: Arc<dyn CampaignStore>,
    vault: CredentialVault,
    exchanges: HashMap<Provider, Arc<dyn TokenExchange>>,
    publisher: Arc<dyn MediaPublisher>,
    signer: StateSigner,
}

impl IntegrationService {
    pub fn new(
        users: Arc<dyn UserStore>,
        campaigns: Arc<dyn CampaignStore>,
        vault: CredentialVault,
        publisher: Arc<dyn MediaPublisher>,
        signer: StateSigner,
    ) -> Self {
        Self {
            users,
            campaigns,
            vault,
            exchanges: HashMap::new(),
            publisher,
            signer,
        }
    }

    /// Register the token exchange for a provider.
    #[must_use]
    pub fn with_exchange(mut self, exchange: Arc<dyn TokenExchange>) -> Self {
        self.exchanges.insert(exchange.provider(), exchange);
        self
    }

    fn exchange(&self, provider: Provider) -> Result<&Arc<dyn TokenExchange>> {
        self.exchanges
            .get(&provider)
            .ok_or_else(|| IntegrationError::Configuration(format!("{provider} not configured")))
    }

    /// Build the provider authorization URL with a freshly issued state.
    ///
    /// Ensures the user row exists so the later callback always has a row
    /// to write the connection onto.
    pub async fn authorization_url(
        &self,
        user_id: &str,
        provider: Provider,
    ) -> Result<AuthorizationUrl> {
        let exchange = self.exchange(provider)?;
        self.users.create(user_id).await?;

        let state = self.signer.issue(user_id);
        let auth_url = exchange.authorization_url(&state)?;
        Ok(AuthorizationUrl { auth_url, state })
    }

    /// Complete the connect flow from the provider callback.
    ///
    /// State verification comes first: an invalid state rejects the
    /// callback before the authorization code is ever sent upstream. On
    /// success the encrypted token, account identity, and connected flag
    /// are persisted in a single store write.
    pub async fn connect(
        &self,
        user_id: &str,
        provider: Provider,
        code: &str,
        state: &str,
    ) -> Result<ConnectionResult> {
        let exchange = self.exchange(provider)?;
        self.signer.verify(state, user_id)?;

        let token = exchange.exchange_code(code).await?;
        let identity = exchange.fetch_identity(token.token()).await?;
        let blob = self.vault.encrypt(token.token())?;

        self.users.create(user_id).await?;
        self.users
            .set_connected(user_id, provider, &blob, &identity.account_id, &identity.username)
            .await?;

        info!(user = user_id, provider = %provider, account = %identity.account_id, "provider connected");
        Ok(ConnectionResult {
            provider,
            account_id: identity.account_id,
            username: identity.username,
        })
    }

    /// Drop a provider connection. Idempotent: disconnecting an already
    /// disconnected provider succeeds without complaint.
    pub async fn disconnect(&self, user_id: &str, provider: Provider) -> Result<()> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| IntegrationError::not_found("user", user_id))?;

        if !user.connection(provider).connected {
            return Ok(());
        }

        self.users.clear_connection(user_id, provider).await?;
        info!(user = user_id, provider = %provider, "provider disconnected");
        Ok(())
    }

    /// Publish a campaign to its owner's Instagram account.
    ///
    /// All preconditions are checked before any provider traffic; a
    /// campaign that fails one costs zero outbound calls. After a
    /// successful remote publish the local record must transition exactly
    /// once, and a failed transition surfaces as a partial publish rather
    /// than a silent success or a remote retry.
    pub async fn publish_campaign(&self, campaign_id: &str) -> Result<PublishedPost> {
        let campaign = self
            .campaigns
            .get(campaign_id)
            .await?
            .ok_or_else(|| IntegrationError::not_found("campaign", campaign_id))?;

        if campaign.published_to_instagram {
            return Err(IntegrationError::conflict("campaign is already published"));
        }
        if campaign.platform != Platform::Instagram {
            return Err(IntegrationError::precondition(format!(
                "campaign targets {}, only instagram campaigns can be published",
                campaign.platform
            )));
        }
        let image_url = campaign
            .image_url
            .as_deref()
            .ok_or_else(|| IntegrationError::precondition("campaign has no image"))?;
        if !validate_media_url(image_url) {
            return Err(IntegrationError::precondition(
                "campaign image URL is not a supported image",
            ));
        }

        let user = self
            .users
            .get(&campaign.user_id)
            .await?
            .ok_or_else(|| IntegrationError::precondition("campaign owner does not exist"))?;
        let connection = user.connection(Provider::Instagram);
        let blob = match (&connection.connected, &connection.access_token) {
            (true, Some(blob)) => blob,
            _ => {
                return Err(IntegrationError::precondition(
                    "owner has no connected instagram account",
                ));
            },
        };

        let access_token = self.vault.decrypt(blob)?;
        let caption = format_caption(
            &campaign.headline,
            &campaign.body,
            &campaign.cta,
            &campaign.hashtags,
            campaign.platform,
        );

        let post = self
            .publisher
            .publish(PublishRequest {
                caption,
                image_url: image_url.to_string(),
                access_token,
            })
            .await
            .map_err(|e| {
                let err = IntegrationError::from(e);
                warn!(campaign = campaign_id, code = err.error_code(), "publish failed");
                err
            })?;

        match self.campaigns.mark_published(campaign_id, &post.post_id).await {
            Ok(true) => {
                info!(campaign = campaign_id, post = %post.post_id, "campaign published");
                Ok(post)
            },
            Ok(false) => {
                error!(
                    campaign = campaign_id,
                    post = %post.post_id,
                    "post published remotely but another writer owns the local record"
                );
                Err(IntegrationError::PartialPublish {
                    post_id: post.post_id,
                })
            },
            Err(e) => {
                error!(
                    campaign = campaign_id,
                    post = %post.post_id,
                    error = %e,
                    "post published remotely but local state update failed"
                );
                Err(IntegrationError::PartialPublish {
                    post_id: post.post_id,
                })
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        async_trait::async_trait,
        secrecy::Secret,
        std::sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        vetrina_oauth::{ExchangedToken, OAuthError, ProviderIdentity},
        vetrina_publish::PublishError,
        vetrina_store::{Campaign, Connection, User},
    };

    use super::*;

    // ── Mock collaborators ──────────────────────────────────────────────────

    #[derive(Default)]
    struct MockUserStore {
        users: Mutex<HashMap<String, User>>,
    }

    #[async_trait]
    impl UserStore for MockUserStore {
        async fn get(&self, user_id: &str) -> anyhow::Result<Option<User>> {
            Ok(self.users.lock().unwrap().get(user_id).cloned())
        }

        async fn create(&self, user_id: &str) -> anyhow::Result<()> {
            self.users
                .lock()
                .unwrap()
                .entry(user_id.to_string())
                .or_insert_with(|| User {
                    id: user_id.to_string(),
                    instagram: Connection::default(),
                    shopify: Connection::default(),
                });
            Ok(())
        }

        async fn set_connected(
            &self,
            user_id: &str,
            provider: Provider,
            token_blob: &str,
            account_id: &str,
            username: &str,
        ) -> anyhow::Result<()> {
            let mut users = self.users.lock().unwrap();
            let user = users.get_mut(user_id).expect("user row exists");
            let conn = match provider {
                Provider::Instagram => &mut user.instagram,
                Provider::Shopify => &mut user.shopify,
            };
            *conn = Connection {
                connected: true,
                access_token: Some(token_blob.to_string()),
                account_id: Some(account_id.to_string()),
                username: Some(username.to_string()),
            };
            Ok(())
        }

        async fn clear_connection(&self, user_id: &str, provider: Provider) -> anyhow::Result<()> {
            let mut users = self.users.lock().unwrap();
            if let Some(user) = users.get_mut(user_id) {
                let conn = match provider {
                    Provider::Instagram => &mut user.instagram,
                    Provider::Shopify => &mut user.shopify,
                };
                *conn = Connection::default();
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockCampaignStore {
        campaigns: Mutex<HashMap<String, Campaign>>,
        refuse_mark: bool,
        fail_mark: bool,
        mark_calls: AtomicUsize,
    }

    #[async_trait]
    impl CampaignStore for MockCampaignStore {
        async fn get(&self, campaign_id: &str) -> anyhow::Result<Option<Campaign>> {
            Ok(self.campaigns.lock().unwrap().get(campaign_id).cloned())
        }

        async fn upsert(&self, campaign: &Campaign) -> anyhow::Result<()> {
            self.campaigns
                .lock()
                .unwrap()
                .insert(campaign.id.clone(), campaign.clone());
            Ok(())
        }

        async fn mark_published(&self, campaign_id: &str, post_id: &str) -> anyhow::Result<bool> {
            self.mark_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_mark {
                anyhow::bail!("database unavailable");
            }
            if self.refuse_mark {
                return Ok(false);
            }
            let mut campaigns = self.campaigns.lock().unwrap();
            match campaigns.get_mut(campaign_id) {
                Some(c) if !c.published_to_instagram => {
                    c.published_to_instagram = true;
                    c.instagram_post_id = Some(post_id.to_string());
                    Ok(true)
                },
                _ => Ok(false),
            }
        }
    }

    struct MockExchange {
        exchange_calls: AtomicUsize,
    }

    impl MockExchange {
        fn new() -> Self {
            Self {
                exchange_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TokenExchange for MockExchange {
        fn provider(&self) -> Provider {
            Provider::Instagram
        }

        fn authorization_url(&self, state: &str) -> vetrina_oauth::Result<String> {
            Ok(format!("https://provider.test/authorize?state={state}"))
        }

        async fn exchange_code(&self, code: &str) -> vetrina_oauth::Result<ExchangedToken> {
            self.exchange_calls.fetch_add(1, Ordering::SeqCst);
            if code == "bad-code" {
                return Err(OAuthError::Exchange {
                    status: 400,
                    message: "code expired".into(),
                });
            }
            Ok(ExchangedToken {
                access_token: Secret::new("live-token-123".into()),
                provider_user_id: "17841400000".into(),
            })
        }

        async fn fetch_identity(&self, _token: &str) -> vetrina_oauth::Result<ProviderIdentity> {
            Ok(ProviderIdentity {
                account_id: "17841400000".into(),
                username: "vetrina.brand".into(),
            })
        }
    }

    struct MockPublisher {
        calls: AtomicUsize,
        fail_with: Mutex<Option<PublishError>>,
        last_caption: Mutex<Option<String>>,
    }

    impl MockPublisher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_with: Mutex::new(None),
                last_caption: Mutex::new(None),
            }
        }

        fn failing(error: PublishError) -> Self {
            let publisher = Self::new();
            *publisher.fail_with.lock().unwrap() = Some(error);
            publisher
        }
    }

    #[async_trait]
    impl MediaPublisher for MockPublisher {
        async fn publish(
            &self,
            request: PublishRequest,
        ) -> std::result::Result<PublishedPost, PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_caption.lock().unwrap() = Some(request.caption);
            if let Some(error) = self.fail_with.lock().unwrap().take() {
                return Err(error);
            }
            Ok(PublishedPost {
                post_id: "18000000001".into(),
                permalink: "https://www.instagram.com/p/18000000001/".into(),
            })
        }
    }

    // ── Fixtures ────────────────────────────────────────────────────────────

    struct Fixture {
        users: Arc<MockUserStore>,
        campaigns: Arc<MockCampaignStore>,
        exchange: Arc<MockExchange>,
        publisher: Arc<MockPublisher>,
        service: IntegrationService,
    }

    fn fixture() -> Fixture {
        fixture_with(MockCampaignStore::default(), MockPublisher::new())
    }

    fn fixture_with(campaigns: MockCampaignStore, publisher: MockPublisher) -> Fixture {
        let users = Arc::new(MockUserStore::default());
        let campaigns = Arc::new(campaigns);
        let exchange = Arc::new(MockExchange::new());
        let publisher = Arc::new(publisher);
        let service = IntegrationService::new(
            users.clone(),
            campaigns.clone(),
            CredentialVault::new("unit-test-secret").unwrap(),
            publisher.clone(),
            StateSigner::new("session-secret"),
        )
        .with_exchange(exchange.clone());
        Fixture {
            users,
            campaigns,
            exchange,
            publisher,
            service,
        }
    }

    fn publishable_campaign(id: &str, user_id: &str) -> Campaign {
        let mut c = Campaign::draft(id, user_id, Platform::Instagram);
        c.headline = "Linen Shirts".into();
        c.body = "New drop".into();
        c.cta = "Shop now".into();
        c.hashtags = vec!["linen".into(), "slowfashion".into()];
        c.image_url = Some("https://cdn.test/drop.jpg".into());
        c
    }

    async fn connect_user(f: &Fixture, user_id: &str) {
        let auth = f
            .service
            .authorization_url(user_id, Provider::Instagram)
            .await
            .unwrap();
        f.service
            .connect(user_id, Provider::Instagram, "good-code", &auth.state)
            .await
            .unwrap();
    }

    // ── Connect flow ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn authorization_url_embeds_state_and_creates_user() {
        let f = fixture();
        let auth = f
            .service
            .authorization_url("brand_1", Provider::Instagram)
            .await
            .unwrap();
        assert!(auth.auth_url.contains(&auth.state));
        assert!(f.users.get("brand_1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn connect_stores_encrypted_token() {
        let f = fixture();
        connect_user(&f, "brand_1").await;

        let user = f.users.get("brand_1").await.unwrap().unwrap();
        assert!(user.instagram.connected);
        let blob = user.instagram.access_token.unwrap();
        assert_ne!(blob, "live-token-123");
        let vault = CredentialVault::new("unit-test-secret").unwrap();
        assert_eq!(vault.decrypt(&blob).unwrap(), "live-token-123");
        assert_eq!(user.instagram.username.as_deref(), Some("vetrina.brand"));
    }

    #[tokio::test]
    async fn tampered_state_rejects_before_exchange() {
        let f = fixture();
        let auth = f
            .service
            .authorization_url("brand_1", Provider::Instagram)
            .await
            .unwrap();
        let mut bad_state = auth.state.clone();
        bad_state.push('0');

        let err = f
            .service
            .connect("brand_1", Provider::Instagram, "good-code", &bad_state)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_state");
        assert_eq!(f.exchange.exchange_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn state_bound_to_other_user_is_rejected() {
        let f = fixture();
        let auth = f
            .service
            .authorization_url("brand_1", Provider::Instagram)
            .await
            .unwrap();
        let err = f
            .service
            .connect("brand_2", Provider::Instagram, "good-code", &auth.state)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_state");
        assert_eq!(f.exchange.exchange_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejected_code_maps_to_oauth_exchange() {
        let f = fixture();
        let auth = f
            .service
            .authorization_url("brand_1", Provider::Instagram)
            .await
            .unwrap();
        let err = f
            .service
            .connect("brand_1", Provider::Instagram, "bad-code", &auth.state)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "oauth_exchange");
        let user = f.users.get("brand_1").await.unwrap().unwrap();
        assert!(!user.instagram.connected);
    }

    #[tokio::test]
    async fn unconfigured_provider_is_a_configuration_error() {
        let f = fixture();
        let err = f
            .service
            .authorization_url("brand_1", Provider::Shopify)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "configuration");
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let f = fixture();
        connect_user(&f, "brand_1").await;

        f.service
            .disconnect("brand_1", Provider::Instagram)
            .await
            .unwrap();
        let user = f.users.get("brand_1").await.unwrap().unwrap();
        assert!(!user.instagram.connected);
        assert!(user.instagram.access_token.is_none());

        // second disconnect is a no-op success
        f.service
            .disconnect("brand_1", Provider::Instagram)
            .await
            .unwrap();
    }

    // ── Publish flow ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn publish_happy_path_marks_campaign() {
        let f = fixture();
        connect_user(&f, "brand_1").await;
        f.campaigns
            .upsert(&publishable_campaign("camp_1", "brand_1"))
            .await
            .unwrap();

        let post = f.service.publish_campaign("camp_1").await.unwrap();
        assert_eq!(post.post_id, "18000000001");

        let campaign = f.campaigns.get("camp_1").await.unwrap().unwrap();
        assert!(campaign.published_to_instagram);
        assert_eq!(campaign.instagram_post_id.as_deref(), Some("18000000001"));

        let caption = f.publisher.last_caption.lock().unwrap().clone().unwrap();
        assert_eq!(caption, "Linen Shirts\n\nNew drop\n\nShop now\n\n#linen #slowfashion");
    }

    #[tokio::test]
    async fn publish_preconditions_cost_zero_provider_calls() {
        let f = fixture();
        connect_user(&f, "brand_1").await;

        let mut no_image = publishable_campaign("no_image", "brand_1");
        no_image.image_url = None;
        let mut bad_image = publishable_campaign("bad_image", "brand_1");
        bad_image.image_url = Some("https://cdn.test/clip.mp4".into());
        let mut wrong_platform = publishable_campaign("wrong_platform", "brand_1");
        wrong_platform.platform = Platform::Pinterest;
        for c in [&no_image, &bad_image, &wrong_platform] {
            f.campaigns.upsert(c).await.unwrap();
        }

        for id in ["no_image", "bad_image", "wrong_platform"] {
            let err = f.service.publish_campaign(id).await.unwrap_err();
            assert_eq!(err.error_code(), "precondition", "campaign {id}");
        }
        assert_eq!(f.publisher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn publish_requires_connected_owner() {
        let f = fixture();
        f.users.create("brand_1").await.unwrap();
        f.campaigns
            .upsert(&publishable_campaign("camp_1", "brand_1"))
            .await
            .unwrap();

        let err = f.service.publish_campaign("camp_1").await.unwrap_err();
        assert_eq!(err.error_code(), "precondition");
        assert_eq!(f.publisher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn already_published_campaign_is_a_conflict() {
        let f = fixture();
        connect_user(&f, "brand_1").await;
        let mut campaign = publishable_campaign("camp_1", "brand_1");
        campaign.published_to_instagram = true;
        campaign.instagram_post_id = Some("17999".into());
        f.campaigns.upsert(&campaign).await.unwrap();

        let err = f.service.publish_campaign("camp_1").await.unwrap_err();
        assert_eq!(err.error_code(), "conflict");
        assert_eq!(f.publisher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_campaign_is_not_found() {
        let f = fixture();
        let err = f.service.publish_campaign("ghost").await.unwrap_err();
        assert_eq!(err.error_code(), "not_found");
    }

    #[tokio::test]
    async fn undecryptable_token_requires_reconnect() {
        let f = fixture();
        connect_user(&f, "brand_1").await;
        // corrupt the stored credential the way a rotated secret would
        f.users
            .set_connected(
                "brand_1",
                Provider::Instagram,
                "bm90LWEtcmVhbC1ibG9i",
                "17841400000",
                "vetrina.brand",
            )
            .await
            .unwrap();
        f.campaigns
            .upsert(&publishable_campaign("camp_1", "brand_1"))
            .await
            .unwrap();

        let err = f.service.publish_campaign("camp_1").await.unwrap_err();
        assert_eq!(err.error_code(), "decryption");
        assert_eq!(f.publisher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn container_failure_is_retry_safe_publish_error() {
        let f = fixture_with(
            MockCampaignStore::default(),
            MockPublisher::failing(PublishError::Container {
                status: 400,
                message: "unsupported image".into(),
            }),
        );
        connect_user(&f, "brand_1").await;
        f.campaigns
            .upsert(&publishable_campaign("camp_1", "brand_1"))
            .await
            .unwrap();

        let err = f.service.publish_campaign("camp_1").await.unwrap_err();
        assert_eq!(err.error_code(), "publish");
        // no local mutation on a failed publish
        let campaign = f.campaigns.get("camp_1").await.unwrap().unwrap();
        assert!(!campaign.published_to_instagram);
        assert_eq!(f.campaigns.mark_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn publish_step_failure_is_not_retry_safe() {
        let f = fixture_with(
            MockCampaignStore::default(),
            MockPublisher::failing(PublishError::PublishStep {
                container_id: "c-9".into(),
                status: 500,
                message: "server error".into(),
            }),
        );
        connect_user(&f, "brand_1").await;
        f.campaigns
            .upsert(&publishable_campaign("camp_1", "brand_1"))
            .await
            .unwrap();

        let err = f.service.publish_campaign("camp_1").await.unwrap_err();
        assert_eq!(err.error_code(), "publish_unretryable");
    }

    #[tokio::test]
    async fn lost_mark_published_race_is_a_partial_publish() {
        let f = fixture_with(
            MockCampaignStore {
                refuse_mark: true,
                ..MockCampaignStore::default()
            },
            MockPublisher::new(),
        );
        connect_user(&f, "brand_1").await;
        f.campaigns
            .upsert(&publishable_campaign("camp_1", "brand_1"))
            .await
            .unwrap();

        let err = f.service.publish_campaign("camp_1").await.unwrap_err();
        match err {
            IntegrationError::PartialPublish { post_id } => {
                assert_eq!(post_id, "18000000001");
            },
            other => panic!("expected partial publish, got {other:?}"),
        }
        // the remote call happened exactly once; no retry on the failure
        assert_eq!(f.publisher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn store_failure_after_remote_success_is_a_partial_publish() {
        let f = fixture_with(
            MockCampaignStore {
                fail_mark: true,
                ..MockCampaignStore::default()
            },
            MockPublisher::new(),
        );
        connect_user(&f, "brand_1").await;
        f.campaigns
            .upsert(&publishable_campaign("camp_1", "brand_1"))
            .await
            .unwrap();

        let err = f.service.publish_campaign("camp_1").await.unwrap_err();
        match err {
            IntegrationError::PartialPublish { post_id } => {
                assert_eq!(post_id, "18000000001");
            },
            other => panic!("expected partial publish, got {other:?}"),
        }
        assert_eq!(f.publisher.calls.load(Ordering::SeqCst), 1);
    }
}
