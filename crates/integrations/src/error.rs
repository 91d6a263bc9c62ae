//! Orchestrator error taxonomy.
//!
//! Every variant maps to a stable machine-readable code via
//! [`IntegrationError::error_code`]; the HTTP layer keys its status mapping
//! off the code, never off display text. Raw provider response bodies are
//! wrapped before they reach a variant so they are never surfaced to
//! clients.

use {
    vetrina_oauth::OAuthError,
    vetrina_publish::PublishError,
    vetrina_vault::VaultError,
};

pub type Result<T> = std::result::Result<T, IntegrationError>;

#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    /// The service is missing configuration for the requested operation
    /// (unconfigured provider, bad endpoint).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The callback `state` failed verification. The authorization code is
    /// never sent to the provider in this case.
    #[error("invalid oauth state: {reason}")]
    InvalidState { reason: String },

    /// The provider rejected or failed the code exchange.
    #[error("oauth exchange failed: {message}")]
    OAuthExchange { message: String },

    /// A stored credential could not be decrypted. The credential is
    /// unusable and the user must reconnect the provider.
    #[error("stored credential could not be decrypted; reconnect required")]
    Decryption,

    /// A publish precondition failed before any provider call was made.
    #[error("precondition failed: {message}")]
    Precondition { message: String },

    /// The operation lost a race with another writer (campaign already
    /// published).
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// The provider publish call failed. `retry_safe` is false once a
    /// media container may exist upstream, where a blind retry risks a
    /// duplicate post.
    #[error("publish failed: {source}")]
    Publish {
        retry_safe: bool,
        #[source]
        source: PublishError,
    },

    /// The post went out but recording it locally failed. The remote post
    /// id is carried so an operator can reconcile by hand; the publish is
    /// never retried from this state.
    #[error("post {post_id} published but local state update failed")]
    PartialPublish { post_id: String },

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl IntegrationError {
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            id: id.into(),
        }
    }

    /// Stable machine-readable code for API responses and logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::InvalidState { .. } => "invalid_state",
            Self::OAuthExchange { .. } => "oauth_exchange",
            Self::Decryption => "decryption",
            Self::Precondition { .. } => "precondition",
            Self::Conflict { .. } => "conflict",
            Self::Publish { retry_safe, .. } => {
                if *retry_safe {
                    "publish"
                } else {
                    "publish_unretryable"
                }
            },
            Self::PartialPublish { .. } => "partial_publish",
            Self::NotFound { .. } => "not_found",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<OAuthError> for IntegrationError {
    fn from(e: OAuthError) -> Self {
        match e {
            OAuthError::InvalidState { reason } => Self::InvalidState { reason },
            OAuthError::Exchange { status, .. } => Self::OAuthExchange {
                message: format!("provider rejected the request (status {status})"),
            },
            OAuthError::Network(_) => Self::OAuthExchange {
                message: "provider unreachable".into(),
            },
            OAuthError::MalformedResponse(_) => Self::OAuthExchange {
                message: "malformed provider response".into(),
            },
            OAuthError::Config(message) => Self::Configuration(message),
        }
    }
}

impl From<PublishError> for IntegrationError {
    fn from(e: PublishError) -> Self {
        Self::Publish {
            retry_safe: e.retry_safe(),
            source: e,
        }
    }
}

impl From<VaultError> for IntegrationError {
    fn from(e: VaultError) -> Self {
        match e {
            // Any failure reading a stored blob means the credential is
            // unusable, whatever the low-level cause.
            VaultError::Decryption | VaultError::Malformed(_) => Self::Decryption,
            VaultError::MissingSecret => {
                Self::Configuration("encryption secret not configured".into())
            },
            VaultError::Cipher(message) => Self::Configuration(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            IntegrationError::Decryption.error_code(),
            "decryption"
        );
        assert_eq!(
            IntegrationError::precondition("no image").error_code(),
            "precondition"
        );
        assert_eq!(
            IntegrationError::PartialPublish {
                post_id: "123".into()
            }
            .error_code(),
            "partial_publish"
        );
    }

    #[test]
    fn publish_code_tracks_retry_safety() {
        let safe: IntegrationError = PublishError::Container {
            status: 400,
            message: "bad image".into(),
        }
        .into();
        assert_eq!(safe.error_code(), "publish");

        let unsafe_retry: IntegrationError = PublishError::PublishStep {
            container_id: "c-1".into(),
            status: 500,
            message: "server error".into(),
        }
        .into();
        assert_eq!(unsafe_retry.error_code(), "publish_unretryable");
    }

    #[test]
    fn oauth_errors_never_carry_raw_provider_bodies() {
        let err: IntegrationError = OAuthError::Exchange {
            status: 400,
            message: "{\"error_message\": \"secret leaked body\"}".into(),
        }
        .into();
        assert!(!err.to_string().contains("secret leaked body"));
        assert_eq!(err.error_code(), "oauth_exchange");
    }
}
