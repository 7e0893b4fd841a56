//! Resolved configuration types shared across crates.
//!
//! Raw TOML deserialization structs stay private in `sidekick-config`; the
//! loader resolves them into these types at the parse boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::Provider;

/// Identifier of the hosted model used by the remote client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteModel(String);

impl RemoteModel {
    pub const DEFAULT: &'static str = "gpt-4o-mini";

    /// Empty or whitespace-only names fall back to the default model.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.trim().is_empty() {
            Self::default()
        } else {
            Self(name)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RemoteModel {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for RemoteModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("API credential must not be empty")]
    Empty,
}

/// API credential for the remote provider.
///
/// Local-only scope; never synced. `Debug` and `Display` never reveal the
/// secret - callers must go through [`ApiCredential::expose_secret`].
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredential(String);

impl ApiCredential {
    pub fn new(secret: impl Into<String>) -> Result<Self, CredentialError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(CredentialError::Empty);
        }
        Ok(Self(secret))
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiCredential(***)")
    }
}

/// Theme preference for the injected surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Auto,
    Light,
    Dark,
}

/// Synced user preferences.
///
/// The API credential is deliberately absent: it lives in the local-only
/// secret scope and travels separately (see `sidekick-config`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub provider: Provider,
    pub remote_model: RemoteModel,
    pub auto_show_sidebar: bool,
    pub save_history: bool,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            provider: Provider::Local,
            remote_model: RemoteModel::default(),
            auto_show_sidebar: false,
            save_history: true,
            theme: Theme::Auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiCredential, Preferences, RemoteModel, Theme};
    use crate::provider::Provider;

    #[test]
    fn remote_model_blank_falls_back_to_default() {
        assert_eq!(RemoteModel::new("   ").as_str(), RemoteModel::DEFAULT);
        assert_eq!(RemoteModel::new("gpt-4o").as_str(), "gpt-4o");
    }

    #[test]
    fn credential_rejects_empty() {
        assert!(ApiCredential::new("").is_err());
        assert!(ApiCredential::new("  ").is_err());
        assert!(ApiCredential::new("sk-test").is_ok());
    }

    #[test]
    fn credential_debug_redacts() {
        let cred = ApiCredential::new("sk-secret").unwrap();
        let debug = format!("{cred:?}");
        assert!(!debug.contains("sk-secret"));
        assert_eq!(cred.expose_secret(), "sk-secret");
    }

    #[test]
    fn preferences_default_is_local_with_history() {
        let prefs = Preferences::default();
        assert_eq!(prefs.provider, Provider::Local);
        assert!(prefs.save_history);
        assert!(!prefs.auto_show_sidebar);
        assert_eq!(prefs.theme, Theme::Auto);
    }

    #[test]
    fn preferences_deserialize_fills_missing_fields() {
        let prefs: Preferences =
            serde_json::from_value(serde_json::json!({ "provider": "remote" })).unwrap();
        assert_eq!(prefs.provider, Provider::Remote);
        assert_eq!(prefs.remote_model.as_str(), RemoteModel::DEFAULT);
    }
}
