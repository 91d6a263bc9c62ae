//! OAuth error types.

pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors produced during the OAuth connect flow.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// The callback `state` is expired, bound to a different user, or
    /// carries a bad signature. The callback must be rejected.
    #[error("invalid oauth state: {reason}")]
    InvalidState { reason: String },

    /// The provider rejected the code or token request.
    #[error("token exchange rejected by provider (status {status})")]
    Exchange { status: u16, message: String },

    /// The request never produced a provider response (timeout, DNS,
    /// connection refused). Distinct from [`OAuthError::Exchange`] so
    /// callers don't treat an outage as a rejected code.
    #[error("provider unreachable: {0}")]
    Network(#[source] reqwest::Error),

    /// The provider answered 2xx but the body is missing required fields.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Provider endpoints or credentials are misconfigured.
    #[error("oauth configuration error: {0}")]
    Config(String),
}

impl OAuthError {
    #[must_use]
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Exchange {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => Self::Network(e),
        }
    }
}
