//! Routing between the on-device model and the hosted completion API.
//!
//! The router owns at most one on-device session per page lifetime. The
//! session is created lazily behind a [`OnceCell`], so concurrent first
//! submissions converge on a single creation instead of racing duplicate
//! sessions. Nothing here retries: a failed ask surfaces to the sidebar and
//! retry is a user decision.

use anyhow::anyhow;
use thiserror::Error;
use tokio::sync::OnceCell;

use sidekick_providers::{
    CompletionOptions, LocalModel, LocalSession, RemoteClient, RemoteError, SessionParams,
    probe_availability,
};
use sidekick_types::{ApiCredential, LocalAvailability, Preferences, Provider};

use crate::sidebar::AiStatus;

#[derive(Debug, Error)]
pub enum AskError {
    /// Neither provider is usable; terminal until settings change.
    #[error("no usable AI provider: {0}")]
    ProviderUnavailable(String),
    /// The on-device model wants an explicit download step first.
    #[error("AI model needs to be downloaded first")]
    ModelDownloadRequired,
    #[error("API credential not configured")]
    MissingCredential,
    /// The underlying transport or model call failed; safe to retry.
    #[error("AI request failed: {0}")]
    RequestFailed(anyhow::Error),
}

/// Uniform "ask the model" entry point over both providers.
pub struct SessionRouter<M: LocalModel> {
    local: M,
    provider: Provider,
    remote: RemoteClient,
    session: OnceCell<LocalSession>,
}

impl<M: LocalModel> SessionRouter<M> {
    #[must_use]
    pub fn new(local: M, preferences: &Preferences, credential: Option<ApiCredential>) -> Self {
        Self {
            local,
            provider: preferences.provider,
            remote: RemoteClient::new(preferences.remote_model.clone(), credential),
            session: OnceCell::new(),
        }
    }

    /// Swap the remote endpoint (tests).
    #[must_use]
    pub fn with_remote_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.remote = self.remote.with_base_url(base_url);
        self
    }

    #[must_use]
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Apply changed settings. The availability of the newly selected
    /// provider must be re-checked by the caller; the cached on-device
    /// session survives a round trip through the remote provider.
    pub fn apply_settings(&mut self, preferences: &Preferences, credential: Option<ApiCredential>) {
        self.provider = preferences.provider;
        self.remote = RemoteClient::new(preferences.remote_model.clone(), credential);
    }

    /// Send one prompt to the configured provider.
    pub async fn ask(&self, prompt: &str) -> Result<String, AskError> {
        match self.provider {
            Provider::Remote => {
                if !self.remote.is_configured() {
                    return Err(AskError::MissingCredential);
                }
                self.remote
                    .complete(prompt, &CompletionOptions::default())
                    .await
                    .map_err(|e| match e {
                        RemoteError::MissingCredential => AskError::MissingCredential,
                        other => AskError::RequestFailed(anyhow!(other)),
                    })
            }
            Provider::Local => {
                let session = self.local_session().await?;
                self.local
                    .prompt(session, prompt)
                    .await
                    .map_err(AskError::RequestFailed)
            }
        }
    }

    /// The page's single on-device session, created on first use.
    async fn local_session(&self) -> Result<&LocalSession, AskError> {
        self.session
            .get_or_try_init(|| async {
                match probe_availability(&self.local).await {
                    LocalAvailability::Ready => self
                        .local
                        .create_session(SessionParams::default())
                        .await
                        .map_err(AskError::RequestFailed),
                    LocalAvailability::DownloadRequired => Err(AskError::ModelDownloadRequired),
                    LocalAvailability::Unavailable => Err(AskError::ProviderUnavailable(
                        "AI model not available on this device".to_string(),
                    )),
                    LocalAvailability::Error(message) => {
                        Err(AskError::RequestFailed(anyhow!(message)))
                    }
                }
            })
            .await
    }

    /// Probe the on-device model regardless of the selected provider
    /// (the background process's capability check).
    pub async fn probe_local(&self) -> LocalAvailability {
        probe_availability(&self.local).await
    }

    /// Probe the active provider and report a sidebar status.
    pub async fn check_availability(&self) -> AiStatus {
        match self.provider {
            Provider::Remote => {
                if self.remote.is_configured() {
                    AiStatus::Ready {
                        detail: Some("remote API configured".to_string()),
                    }
                } else {
                    AiStatus::Unavailable {
                        detail: Some("API credential not configured".to_string()),
                    }
                }
            }
            Provider::Local => match probe_availability(&self.local).await {
                LocalAvailability::Ready => AiStatus::ready(),
                LocalAvailability::DownloadRequired => AiStatus::DownloadRequired,
                LocalAvailability::Unavailable => AiStatus::Unavailable { detail: None },
                LocalAvailability::Error(message) => AiStatus::Error {
                    detail: Some(message),
                },
            },
        }
    }

    /// Explicit user-triggered model download. Creating the session is what
    /// drives the download; the result is cached like any lazy creation.
    pub async fn start_model_download(&self) -> Result<(), AskError> {
        self.session
            .get_or_try_init(|| async {
                self.local
                    .create_session(SessionParams::default())
                    .await
                    .map_err(AskError::RequestFailed)
            })
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::{AskError, SessionRouter};
    use anyhow::{Result, anyhow};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use sidekick_providers::{LocalModel, LocalSession, SessionParams};
    use sidekick_types::{Preferences, Provider};

    /// Scripted on-device backend: fixed probe token, counted creations.
    struct Scripted {
        token: &'static str,
        created: AtomicUsize,
    }

    impl Scripted {
        fn new(token: &'static str) -> Self {
            Self {
                token,
                created: AtomicUsize::new(0),
            }
        }
    }

    impl LocalModel for Scripted {
        async fn probe(&self) -> Result<String> {
            Ok(self.token.to_string())
        }

        async fn create_session(&self, _params: SessionParams) -> Result<LocalSession> {
            let n = self.created.fetch_add(1, Ordering::SeqCst);
            Ok(LocalSession::new(format!("session-{n}")))
        }

        async fn prompt(&self, session: &LocalSession, input: &str) -> Result<String> {
            if input.contains("fail") {
                return Err(anyhow!("model rejected prompt"));
            }
            Ok(format!("[{}] {input}", session.token()))
        }
    }

    fn local_router(token: &'static str) -> SessionRouter<Scripted> {
        SessionRouter::new(Scripted::new(token), &Preferences::default(), None)
    }

    #[tokio::test]
    async fn local_session_is_created_once_and_reused() {
        let router = local_router("available");
        let first = router.ask("one").await.unwrap();
        let second = router.ask("two").await.unwrap();
        assert_eq!(first, "[session-0] one");
        assert_eq!(second, "[session-0] two");
        assert_eq!(router.local.created.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn download_required_fails_without_prompt_call() {
        let router = local_router("after-download");
        let err = router.ask("hello").await.unwrap_err();
        assert!(matches!(err, AskError::ModelDownloadRequired));
        assert_eq!(router.local.created.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unavailable_is_provider_unavailable() {
        let router = local_router("no");
        let err = router.ask("hello").await.unwrap_err();
        assert!(matches!(err, AskError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn unknown_probe_token_is_retryable_failure() {
        let router = local_router("weird-state");
        let err = router.ask("hello").await.unwrap_err();
        assert!(matches!(err, AskError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn remote_without_credential_fails_fast() {
        let preferences = Preferences {
            provider: Provider::Remote,
            ..Preferences::default()
        };
        let router = SessionRouter::new(Scripted::new("available"), &preferences, None);
        let err = router.ask("hello").await.unwrap_err();
        assert!(matches!(err, AskError::MissingCredential));
    }

    #[tokio::test]
    async fn explicit_download_creates_and_caches_the_session() {
        let router = local_router("after-download");
        router.start_model_download().await.unwrap();
        // The downloaded session is reused by subsequent asks even though
        // the probe still reports download-required.
        let answer = router.ask("hello").await.unwrap();
        assert_eq!(answer, "[session-0] hello");
    }

    #[tokio::test]
    async fn settings_change_switches_provider() {
        let mut router = local_router("available");
        assert!(router.ask("ok").await.is_ok());

        let preferences = Preferences {
            provider: Provider::Remote,
            ..Preferences::default()
        };
        router.apply_settings(&preferences, None);
        assert_eq!(router.provider(), Provider::Remote);
        assert!(matches!(
            router.ask("ok").await.unwrap_err(),
            AskError::MissingCredential
        ));
    }

    #[tokio::test]
    async fn concurrent_first_asks_share_one_session() {
        let router = local_router("available");
        let (a, b) = tokio::join!(router.ask("a"), router.ask("b"));
        assert_eq!(a.unwrap(), "[session-0] a");
        assert_eq!(b.unwrap(), "[session-0] b");
        assert_eq!(router.local.created.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
