//! Signed, expiring `state` values for the OAuth redirect round-trip.
//!
//! Wire format: `{user_id}_{unix_seconds}_{hex hmac-sha256}`. The signature
//! covers `{user_id}_{unix_seconds}` and is keyed by the session secret, so
//! a callback state cannot be forged for another user or replayed outside
//! the validity window.

use {
    hmac::{Hmac, Mac},
    sha2::Sha256,
    std::time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::error::{OAuthError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Default validity window for a state value.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// Issues and verifies callback state values.
#[derive(Clone)]
pub struct StateSigner {
    key: Vec<u8>,
    max_age: Duration,
}

impl StateSigner {
    pub fn new(session_secret: &str) -> Self {
        Self {
            key: session_secret.as_bytes().to_vec(),
            max_age: DEFAULT_MAX_AGE,
        }
    }

    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Issue a state value bound to `user_id` and the current time.
    pub fn issue(&self, user_id: &str) -> String {
        self.issue_at(user_id, now_secs())
    }

    fn issue_at(&self, user_id: &str, timestamp: u64) -> String {
        let payload = format!("{user_id}_{timestamp}");
        let sig = self.sign(&payload);
        format!("{payload}_{sig}")
    }

    /// Verify a state value from the callback.
    ///
    /// Checks, in order: structure, signature, user binding, expiry. Any
    /// failure is an [`OAuthError::InvalidState`] and the callback must be
    /// rejected without touching the provider.
    pub fn verify(&self, state: &str, expected_user_id: &str) -> Result<()> {
        // user ids may themselves contain underscores; the timestamp and
        // signature are always the last two segments.
        let mut parts = state.rsplitn(3, '_');
        let (sig, timestamp, user_id) = match (parts.next(), parts.next(), parts.next()) {
            (Some(sig), Some(ts), Some(user)) => (sig, ts, user),
            _ => return Err(OAuthError::invalid_state("unexpected format")),
        };

        let payload = format!("{user_id}_{timestamp}");
        let expected_sig = self.sign(&payload);
        if !constant_time_eq(sig.as_bytes(), expected_sig.as_bytes()) {
            return Err(OAuthError::invalid_state("signature mismatch"));
        }

        if user_id != expected_user_id {
            return Err(OAuthError::invalid_state("state bound to another user"));
        }

        let timestamp: u64 = timestamp
            .parse()
            .map_err(|_| OAuthError::invalid_state("bad timestamp"))?;
        if now_secs().saturating_sub(timestamp) > self.max_age.as_secs() {
            return Err(OAuthError::invalid_state("state expired"));
        }

        Ok(())
    }

    fn sign(&self, payload: &str) -> String {
        // HMAC accepts any key length, so this only fails on an
        // implementation change; an empty signature never verifies.
        let mut mac = match HmacSha256::new_from_slice(&self.key) {
            Ok(m) => m,
            Err(_) => return String::new(),
        };
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> StateSigner {
        StateSigner::new("session-secret")
    }

    #[test]
    fn issued_state_starts_with_user_prefix() {
        let state = signer().issue("user-42");
        assert!(state.starts_with("user-42_"));
    }

    #[test]
    fn round_trip_verifies() {
        let s = signer();
        let state = s.issue("user-42");
        s.verify(&state, "user-42").unwrap();
    }

    #[test]
    fn wrong_user_rejected() {
        let s = signer();
        let state = s.issue("user-42");
        assert!(matches!(
            s.verify(&state, "user-7"),
            Err(OAuthError::InvalidState { .. })
        ));
    }

    #[test]
    fn user_id_with_underscores_round_trips() {
        let s = signer();
        let state = s.issue("team_alpha_3");
        s.verify(&state, "team_alpha_3").unwrap();
    }

    #[test]
    fn forged_signature_rejected() {
        let s = signer();
        let state = s.issue("user-42");
        // 'x' is never a hex digit, so the forged signature always differs.
        let forged = format!("{}x", &state[..state.len() - 1]);
        assert!(s.verify(&forged, "user-42").is_err());

        // Unsigned legacy format is rejected outright.
        assert!(s.verify("user-42_1700000000", "user-42").is_err());
    }

    #[test]
    fn state_signed_with_other_secret_rejected() {
        let state = StateSigner::new("other-secret").issue("user-42");
        assert!(signer().verify(&state, "user-42").is_err());
    }

    #[test]
    fn expired_state_rejected() {
        let s = signer().with_max_age(Duration::from_secs(600));
        let old = now_secs() - 601;
        let state = s.issue_at("user-42", old);
        assert!(matches!(
            s.verify(&state, "user-42"),
            Err(OAuthError::InvalidState { reason }) if reason.contains("expired")
        ));
    }

    #[test]
    fn state_within_window_accepted() {
        let s = signer().with_max_age(Duration::from_secs(600));
        let state = s.issue_at("user-42", now_secs() - 599);
        s.verify(&state, "user-42").unwrap();
    }

    #[test]
    fn malformed_state_rejected() {
        let s = signer();
        assert!(s.verify("no-separators", "user-42").is_err());
        assert!(s.verify("", "user-42").is_err());
    }
}
