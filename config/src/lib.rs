//! Persisted configuration for Sidekick.
//!
//! Two storage scopes, mirroring the host environment's split between
//! synced preferences and local-only secrets:
//!
//! - `preferences.toml` - provider choice, remote model, sidebar/history
//!   flags, theme. Safe to sync between machines.
//! - `secrets.toml` - the remote API credential. Never leaves the machine.
//!
//! Loads are forgiving: a missing file yields defaults, a malformed file is
//! logged and replaced by defaults on the next save. Saves rewrite the whole
//! document.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sidekick_types::{ApiCredential, Preferences};

const PREFERENCES_FILE: &str = "preferences.toml";
const SECRETS_FILE: &str = "secrets.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Platform config directory for Sidekick, if one can be resolved.
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("sidekick"))
}

/// Raw secret scope. Kept private; resolved into [`ApiCredential`] at the
/// parse boundary so an empty key on disk never masquerades as a credential.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawSecrets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
}

/// File-backed settings store over both scopes.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    preferences_path: PathBuf,
    secrets_path: PathBuf,
}

impl SettingsStore {
    /// Store rooted at an explicit directory (tests, portable installs).
    #[must_use]
    pub fn at(dir: &Path) -> Self {
        Self {
            preferences_path: dir.join(PREFERENCES_FILE),
            secrets_path: dir.join(SECRETS_FILE),
        }
    }

    /// Store at the platform config directory.
    #[must_use]
    pub fn from_platform_dirs() -> Option<Self> {
        config_dir().map(|dir| Self::at(&dir))
    }

    #[must_use]
    pub fn preferences_path(&self) -> &Path {
        &self.preferences_path
    }

    /// Load synced preferences, falling back to defaults on any failure.
    #[must_use]
    pub fn load_preferences(&self) -> Preferences {
        match fs::read_to_string(&self.preferences_path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(prefs) => prefs,
                Err(e) => {
                    tracing::warn!(
                        path = %self.preferences_path.display(),
                        %e,
                        "Malformed preferences file; using defaults"
                    );
                    Preferences::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Preferences::default(),
            Err(e) => {
                tracing::warn!(
                    path = %self.preferences_path.display(),
                    %e,
                    "Failed to read preferences; using defaults"
                );
                Preferences::default()
            }
        }
    }

    pub fn save_preferences(&self, preferences: &Preferences) -> Result<(), ConfigError> {
        let body = toml::to_string_pretty(preferences)?;
        self.write_file(&self.preferences_path, &body)
    }

    /// Load the local-only API credential, if one is configured.
    #[must_use]
    pub fn load_credential(&self) -> Option<ApiCredential> {
        let raw = match fs::read_to_string(&self.secrets_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.secrets_path.display(), %e, "Failed to read secrets");
                return None;
            }
        };
        let secrets: RawSecrets = match toml::from_str(&raw) {
            Ok(secrets) => secrets,
            Err(e) => {
                tracing::warn!(path = %self.secrets_path.display(), %e, "Malformed secrets file");
                return None;
            }
        };
        secrets.api_key.and_then(|key| ApiCredential::new(key).ok())
    }

    pub fn save_credential(&self, credential: &ApiCredential) -> Result<(), ConfigError> {
        let body = toml::to_string_pretty(&RawSecrets {
            api_key: Some(credential.expose_secret().to_string()),
        })?;
        self.write_file(&self.secrets_path, &body)
    }

    pub fn clear_credential(&self) -> Result<(), ConfigError> {
        let body = toml::to_string_pretty(&RawSecrets::default())?;
        self.write_file(&self.secrets_path, &body)
    }

    fn write_file(&self, path: &Path, body: &str) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, body).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SettingsStore;
    use sidekick_types::{ApiCredential, Preferences, Provider, RemoteModel, Theme};
    use tempfile::TempDir;

    fn store() -> (TempDir, SettingsStore) {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::at(dir.path());
        (dir, store)
    }

    #[test]
    fn missing_files_yield_defaults() {
        let (_dir, store) = store();
        assert_eq!(store.load_preferences(), Preferences::default());
        assert!(store.load_credential().is_none());
    }

    #[test]
    fn preferences_round_trip() {
        let (_dir, store) = store();
        let prefs = Preferences {
            provider: Provider::Remote,
            remote_model: RemoteModel::new("gpt-4o"),
            auto_show_sidebar: true,
            save_history: false,
            theme: Theme::Dark,
        };
        store.save_preferences(&prefs).unwrap();
        assert_eq!(store.load_preferences(), prefs);
    }

    #[test]
    fn malformed_preferences_fall_back_to_defaults() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("preferences.toml"), "provider = 42").unwrap();
        assert_eq!(store.load_preferences(), Preferences::default());
    }

    #[test]
    fn credential_round_trip_and_clear() {
        let (_dir, store) = store();
        let cred = ApiCredential::new("sk-test-123").unwrap();
        store.save_credential(&cred).unwrap();
        let loaded = store.load_credential().unwrap();
        assert_eq!(loaded.expose_secret(), "sk-test-123");

        store.clear_credential().unwrap();
        assert!(store.load_credential().is_none());
    }

    #[test]
    fn blank_key_on_disk_is_not_a_credential() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("secrets.toml"), "api_key = \"  \"").unwrap();
        assert!(store.load_credential().is_none());
    }

    #[test]
    fn credential_is_not_written_to_preferences_scope() {
        let (dir, store) = store();
        let cred = ApiCredential::new("sk-private").unwrap();
        store.save_credential(&cred).unwrap();
        store.save_preferences(&Preferences::default()).unwrap();

        let prefs_raw = std::fs::read_to_string(dir.path().join("preferences.toml")).unwrap();
        assert!(!prefs_raw.contains("sk-private"));
    }
}
