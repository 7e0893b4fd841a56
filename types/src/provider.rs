//! Model provider enumeration and on-device availability states.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which backend answers prompts for the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// On-device language model, no network round trip.
    #[default]
    Local,
    /// Hosted completion API reached over authenticated HTTP.
    Remote,
}

const PROVIDER_PARSE_VALUES: &[&str] = &["local", "builtin", "on-device", "remote", "hosted"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid provider value '{raw}'; expected one of: {expected:?}")]
pub struct ProviderParseError {
    raw: String,
    expected: &'static [&'static str],
}

impl ProviderParseError {
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl Provider {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Local => "local",
            Provider::Remote => "remote",
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Local => "On-device AI",
            Provider::Remote => "Hosted AI",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ProviderParseError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "builtin" | "on-device" => Ok(Provider::Local),
            "remote" | "hosted" => Ok(Provider::Remote),
            _ => Err(ProviderParseError {
                raw: s.trim().to_string(),
                expected: PROVIDER_PARSE_VALUES,
            }),
        }
    }
}

/// Availability of the on-device model, as reported by its probe.
///
/// `Unavailable` is terminal for the current page load; `Error` is a
/// transient probe failure and safe to re-check on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAvailability {
    /// A session can be created immediately.
    Ready,
    /// First use must trigger an explicit model download.
    DownloadRequired,
    /// Hardware or eligibility failure; retrying won't help this page load.
    Unavailable,
    /// Probe threw or returned a token we don't recognize.
    Error(String),
}

impl LocalAvailability {
    /// Map a raw probe token onto the availability state machine.
    ///
    /// Both the legacy token set (`readily`, `after-download`, `no`) and
    /// the current one (`available`, `downloadable`, `unavailable`) are
    /// accepted; anything else is a transient [`LocalAvailability::Error`].
    #[must_use]
    pub fn from_probe_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "available" | "readily" => LocalAvailability::Ready,
            "after-download" | "downloadable" => LocalAvailability::DownloadRequired,
            "no" | "unavailable" => LocalAvailability::Unavailable,
            other => LocalAvailability::Error(format!("unexpected availability state: {other}")),
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, LocalAvailability::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::{LocalAvailability, Provider};

    #[test]
    fn provider_parse_accepts_aliases() {
        assert_eq!(Provider::parse("builtin").unwrap(), Provider::Local);
        assert_eq!(Provider::parse(" Remote ").unwrap(), Provider::Remote);
        assert_eq!(Provider::parse("hosted").unwrap(), Provider::Remote);
    }

    #[test]
    fn provider_parse_rejects_unknown() {
        assert!(Provider::parse("cloud").is_err());
        assert!(Provider::parse("").is_err());
    }

    mod probe_tokens {
        use super::LocalAvailability;

        #[test]
        fn both_ready_spellings() {
            assert_eq!(
                LocalAvailability::from_probe_token("available"),
                LocalAvailability::Ready
            );
            assert_eq!(
                LocalAvailability::from_probe_token("readily"),
                LocalAvailability::Ready
            );
        }

        #[test]
        fn download_required_spellings() {
            assert_eq!(
                LocalAvailability::from_probe_token("after-download"),
                LocalAvailability::DownloadRequired
            );
            assert_eq!(
                LocalAvailability::from_probe_token("downloadable"),
                LocalAvailability::DownloadRequired
            );
        }

        #[test]
        fn unavailable_is_terminal() {
            let state = LocalAvailability::from_probe_token("no");
            assert_eq!(state, LocalAvailability::Unavailable);
            assert!(state.is_terminal());
        }

        #[test]
        fn unknown_token_is_transient_error() {
            let state = LocalAvailability::from_probe_token("maybe-later");
            assert!(matches!(state, LocalAvailability::Error(_)));
            assert!(!state.is_terminal());
        }
    }
}
