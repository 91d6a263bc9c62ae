//! Publisher trait and the demo implementation.

use {async_trait::async_trait, tracing::warn};

use crate::error::PublishError;

/// Everything the provider needs to publish one piece of media.
#[derive(Clone)]
pub struct PublishRequest {
    pub caption: String,
    pub image_url: String,
    /// Decrypted provider access token. Passed by reference through the
    /// call and never stored here.
    pub access_token: String,
}

impl std::fmt::Debug for PublishRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishRequest")
            .field("caption", &self.caption)
            .field("image_url", &self.image_url)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Remote outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PublishedPost {
    /// Provider-side post id — the system of record for the publish.
    pub post_id: String,
    /// Human-viewable link to the post.
    pub permalink: String,
}

/// Provider publish call. Implementations perform outbound HTTP only and
/// mutate no local state; persisting the outcome is the orchestrator's
/// responsibility.
#[async_trait]
pub trait MediaPublisher: Send + Sync {
    async fn publish(&self, request: PublishRequest) -> Result<PublishedPost, PublishError>;
}

/// Offline publisher selected by the `demo_mode` configuration flag.
///
/// Fabricates clearly labeled post ids so the pipeline can be exercised
/// without a provider app. Never selected in response to a runtime error.
pub struct DemoPublisher;

impl DemoPublisher {
    pub fn new() -> Self {
        warn!("demo publisher active; posts are not sent anywhere");
        Self
    }
}

impl Default for DemoPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaPublisher for DemoPublisher {
    async fn publish(&self, _request: PublishRequest) -> Result<PublishedPost, PublishError> {
        let post_id = format!("demo-{}", uuid::Uuid::new_v4());
        let permalink = format!("https://demo.vetrina.invalid/p/{post_id}/");
        Ok(PublishedPost { post_id, permalink })
    }
}
