//! Instagram Graph-style two-phase publisher.
//!
//! Publishing is: create a media container from the image URL and caption,
//! then publish the container. A permalink is fetched best-effort
//! afterwards; failing that, a deterministic link is derived from the post
//! id so a permalink hiccup never fails an otherwise successful publish.

use {
    async_trait::async_trait,
    std::time::Duration,
    tracing::{debug, warn},
};

use crate::{
    error::{PublishError, PublishPhase},
    publisher::{MediaPublisher, PublishRequest, PublishedPost},
};

/// Real publisher talking to a Graph-style media API.
pub struct InstagramPublisher {
    base_url: String,
    client: reqwest::Client,
}

impl InstagramPublisher {
    /// Build a publisher with an explicit request timeout.
    pub fn new(timeout: Duration) -> Result<Self, PublishError> {
        Self::with_base_url("https://graph.instagram.com", timeout)
    }

    /// Point the publisher at a different API host (tests).
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| PublishError::Network {
                phase: PublishPhase::Container,
                source,
            })?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn create_container(&self, request: &PublishRequest) -> Result<String, PublishError> {
        let response = self
            .client
            .post(format!("{}/me/media", self.base_url))
            .json(&serde_json::json!({
                "image_url": request.image_url,
                "caption": request.caption,
                "access_token": request.access_token,
            }))
            .send()
            .await
            .map_err(|source| PublishError::Network {
                phase: PublishPhase::Container,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Container {
                status: status.as_u16(),
                message: truncated_body(response).await,
            });
        }

        extract_id(response, PublishPhase::Container).await
    }

    async fn publish_container(
        &self,
        container_id: &str,
        access_token: &str,
    ) -> Result<String, PublishError> {
        let response = self
            .client
            .post(format!("{}/me/media_publish", self.base_url))
            .json(&serde_json::json!({
                "creation_id": container_id,
                "access_token": access_token,
            }))
            .send()
            .await
            .map_err(|source| PublishError::Network {
                phase: PublishPhase::Publish,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::PublishStep {
                container_id: container_id.to_string(),
                status: status.as_u16(),
                message: truncated_body(response).await,
            });
        }

        extract_id(response, PublishPhase::Publish).await
    }

    /// Best-effort permalink lookup. Never fails the publish.
    async fn fetch_permalink(&self, post_id: &str, access_token: &str) -> Option<String> {
        let response = self
            .client
            .get(format!("{}/{post_id}", self.base_url))
            .query(&[("fields", "permalink"), ("access_token", access_token)])
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body: serde_json::Value = response.json().await.ok()?;
        body["permalink"].as_str().map(str::to_string)
    }
}

#[async_trait]
impl MediaPublisher for InstagramPublisher {
    async fn publish(&self, request: PublishRequest) -> Result<PublishedPost, PublishError> {
        let container_id = self.create_container(&request).await?;
        debug!(container_id = %container_id, "media container created");

        let post_id = self
            .publish_container(&container_id, &request.access_token)
            .await?;

        let permalink = match self.fetch_permalink(&post_id, &request.access_token).await {
            Some(link) => link,
            None => {
                warn!(post_id = %post_id, "permalink lookup failed, using derived link");
                format!("https://www.instagram.com/p/{post_id}/")
            },
        };

        Ok(PublishedPost { post_id, permalink })
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

async fn extract_id(
    response: reqwest::Response,
    phase: PublishPhase,
) -> Result<String, PublishError> {
    let body: serde_json::Value =
        response
            .json()
            .await
            .map_err(|source| PublishError::Network { phase, source })?;
    match &body["id"] {
        serde_json::Value::String(s) if !s.is_empty() => Ok(s.clone()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        _ => Err(PublishError::Malformed {
            phase,
            message: "missing id".into(),
        }),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn publisher(server: &mockito::ServerGuard) -> InstagramPublisher {
        InstagramPublisher::with_base_url(server.url(), Duration::from_secs(5)).unwrap()
    }

    fn request() -> PublishRequest {
        PublishRequest {
            caption: "New drop\n\nLinen set\n\nShop now".into(),
            image_url: "https://cdn.x.com/drop.jpg".into(),
            access_token: "IGQV-abc".into(),
        }
    }

    #[tokio::test]
    async fn two_phase_publish_success() {
        let mut server = mockito::Server::new_async().await;
        let container = server
            .mock("POST", "/me/media")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "image_url": "https://cdn.x.com/drop.jpg",
                "access_token": "IGQV-abc",
            })))
            .with_status(200)
            .with_body(r#"{"id":"container-9"}"#)
            .create_async()
            .await;
        let publish = server
            .mock("POST", "/me/media_publish")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "creation_id": "container-9",
            })))
            .with_status(200)
            .with_body(r#"{"id":"17900001"}"#)
            .create_async()
            .await;
        let permalink = server
            .mock("GET", "/17900001")
            .match_query(mockito::Matcher::Regex("fields=permalink".into()))
            .with_status(200)
            .with_body(r#"{"permalink":"https://www.instagram.com/p/XYZ123/"}"#)
            .create_async()
            .await;

        let post = publisher(&server).publish(request()).await.unwrap();
        assert_eq!(post.post_id, "17900001");
        assert_eq!(post.permalink, "https://www.instagram.com/p/XYZ123/");
        container.assert_async().await;
        publish.assert_async().await;
        permalink.assert_async().await;
    }

    #[tokio::test]
    async fn permalink_failure_falls_back_to_derived_link() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/me/media")
            .with_status(200)
            .with_body(r#"{"id":"c-1"}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/me/media_publish")
            .with_status(200)
            .with_body(r#"{"id":"17900002"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/17900002")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let post = publisher(&server).publish(request()).await.unwrap();
        assert_eq!(post.permalink, "https://www.instagram.com/p/17900002/");
    }

    #[tokio::test]
    async fn container_rejection_is_retry_safe() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/me/media")
            .with_status(400)
            .with_body(r#"{"error":{"message":"Invalid image URL"}}"#)
            .create_async()
            .await;

        let err = publisher(&server).publish(request()).await.unwrap_err();
        match &err {
            PublishError::Container { status, message } => {
                assert_eq!(*status, 400);
                assert!(message.contains("Invalid image URL"));
            },
            other => panic!("expected Container error, got {other:?}"),
        }
        assert!(err.retry_safe());
    }

    #[tokio::test]
    async fn publish_step_failure_carries_container_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/me/media")
            .with_status(200)
            .with_body(r#"{"id":"container-5"}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/me/media_publish")
            .with_status(500)
            .with_body(r#"{"error":{"message":"transient"}}"#)
            .create_async()
            .await;

        let err = publisher(&server).publish(request()).await.unwrap_err();
        match &err {
            PublishError::PublishStep { container_id, .. } => {
                assert_eq!(container_id, "container-5");
            },
            other => panic!("expected PublishStep error, got {other:?}"),
        }
        assert!(!err.retry_safe());
    }

    #[tokio::test]
    async fn numeric_ids_are_normalized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/me/media")
            .with_status(200)
            .with_body(r#"{"id":123}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/me/media_publish")
            .with_status(200)
            .with_body(r#"{"id":456}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/456")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let post = publisher(&server).publish(request()).await.unwrap();
        assert_eq!(post.post_id, "456");
    }

    #[tokio::test]
    async fn network_failure_during_container_step() {
        let publisher =
            InstagramPublisher::with_base_url("http://127.0.0.1:9", Duration::from_millis(500))
                .unwrap();
        let err = publisher.publish(request()).await.unwrap_err();
        assert!(matches!(
            err,
            PublishError::Network {
                phase: PublishPhase::Container,
                ..
            }
        ));
        assert!(err.retry_safe());
    }
}
