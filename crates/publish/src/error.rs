//! Publisher error types.

/// Which step of the two-phase publish flow an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishPhase {
    /// Creating the media container.
    Container,
    /// Publishing an already-created container.
    Publish,
}

impl std::fmt::Display for PublishPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Container => "container",
            Self::Publish => "publish",
        })
    }
}

/// Errors from the provider publish call.
///
/// The two-phase Instagram flow makes retry safety asymmetric: a failed
/// container creation left nothing behind and may be retried, while any
/// failure after the container exists must not be blindly retried (a
/// second attempt can produce a duplicate post). The variants keep that
/// distinction explicit for the caller.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Media container creation was rejected. Nothing was created
    /// upstream; the operation is safe to retry.
    #[error("media container creation failed (status {status}): {message}")]
    Container { status: u16, message: String },

    /// The container exists but the publish step was rejected. NOT safe
    /// to retry without provider-side deduplication; the orphaned
    /// container id is carried for diagnostics.
    #[error("publish step failed for container {container_id} (status {status}): {message}")]
    PublishStep {
        container_id: String,
        status: u16,
        message: String,
    },

    /// No provider response at all (timeout, connection failure) in the
    /// given phase. This layer never retries; the phase tells the caller
    /// whether a retry risks a duplicate post.
    #[error("provider unreachable during {phase} step: {source}")]
    Network {
        phase: PublishPhase,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered 2xx but the body is missing required fields.
    #[error("malformed provider response during {phase} step: {message}")]
    Malformed {
        phase: PublishPhase,
        message: String,
    },
}

impl PublishError {
    /// Whether a retry is known to be free of duplicate-post risk.
    #[must_use]
    pub fn retry_safe(&self) -> bool {
        match self {
            Self::Container { .. } => true,
            Self::PublishStep { .. } => false,
            // Before the container exists nothing can be duplicated. A
            // network error on the publish step is ambiguous — the request
            // may have gone through — so the answer is no.
            Self::Network { phase, .. } | Self::Malformed { phase, .. } => {
                *phase == PublishPhase::Container
            },
        }
    }
}
