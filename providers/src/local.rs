//! On-device model provider.
//!
//! The host environment owns the actual model binding; this trait is the
//! seam the session router talks through. The probe returns the raw state
//! token so availability mapping stays in one place
//! ([`sidekick_types::LocalAvailability::from_probe_token`]).

use anyhow::Result;

use sidekick_types::LocalAvailability;

/// Sampling parameters for a new on-device session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionParams {
    pub temperature: f32,
    pub top_k: u32,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 8,
        }
    }
}

/// Opaque handle to an active on-device conversation.
///
/// At most one is cached per page lifetime; the router treats it as
/// effectively immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSession {
    token: String,
}

impl LocalSession {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// The on-device language model capability.
pub trait LocalModel {
    /// Availability probe; returns the backend's raw state token.
    fn probe(&self) -> impl Future<Output = Result<String>> + Send;

    /// Create a conversation session. For a backend in the
    /// download-required state this is also what triggers the download.
    fn create_session(
        &self,
        params: SessionParams,
    ) -> impl Future<Output = Result<LocalSession>> + Send;

    /// Send one prompt through an existing session.
    fn prompt(
        &self,
        session: &LocalSession,
        input: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Probe the backend and map the token onto the availability machine.
/// A probe that throws is a transient error, not a terminal state.
pub async fn probe_availability<M: LocalModel>(model: &M) -> LocalAvailability {
    match model.probe().await {
        Ok(token) => LocalAvailability::from_probe_token(&token),
        Err(e) => {
            tracing::warn!(%e, "Local model availability probe failed");
            LocalAvailability::Error(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LocalModel, LocalSession, SessionParams, probe_availability};
    use anyhow::{Result, anyhow};
    use sidekick_types::LocalAvailability;

    struct FixedProbe(&'static str);

    impl LocalModel for FixedProbe {
        async fn probe(&self) -> Result<String> {
            if self.0 == "boom" {
                return Err(anyhow!("probe exploded"));
            }
            Ok(self.0.to_string())
        }

        async fn create_session(&self, _params: SessionParams) -> Result<LocalSession> {
            Ok(LocalSession::new("s1"))
        }

        async fn prompt(&self, _session: &LocalSession, input: &str) -> Result<String> {
            Ok(input.to_string())
        }
    }

    #[tokio::test]
    async fn probe_maps_tokens() {
        assert_eq!(
            probe_availability(&FixedProbe("readily")).await,
            LocalAvailability::Ready
        );
        assert_eq!(
            probe_availability(&FixedProbe("after-download")).await,
            LocalAvailability::DownloadRequired
        );
    }

    #[tokio::test]
    async fn probe_failure_is_transient_error() {
        let state = probe_availability(&FixedProbe("boom")).await;
        match state {
            LocalAvailability::Error(message) => assert!(message.contains("probe exploded")),
            other => panic!("expected error state, got {other:?}"),
        }
    }

    #[test]
    fn default_session_params() {
        let params = SessionParams::default();
        assert!((params.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(params.top_k, 8);
    }
}
