//! Host-environment command vocabulary.
//!
//! The privileged background process and the page-level logic exchange
//! these commands as tagged JSON. Storage commands are served by the
//! background process against the persisted configuration stores; the
//! page-level [`crate::Assistant`] handles the rest.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sidekick_types::{LocalAvailability, Preferences, QuickAction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostCommand {
    ContextMenuClick {
        menu_item_id: String,
        #[serde(default)]
        selection_text: String,
        #[serde(default)]
        page_url: String,
    },
    KeyboardShortcut {
        command: String,
    },
    SettingsChanged {
        settings: Preferences,
    },
    #[serde(rename = "checkPromptAPI")]
    CheckPromptApi,
    GetStorageData {
        keys: Vec<String>,
    },
    SetStorageData {
        data: Map<String, Value>,
    },
}

/// The two global keyboard shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutCommand {
    ToggleSidebar,
    QuickPrompt,
}

impl ShortcutCommand {
    #[must_use]
    pub fn parse(command: &str) -> Option<Self> {
        match command {
            "toggle-sidebar" => Some(ShortcutCommand::ToggleSidebar),
            "quick-prompt" => Some(ShortcutCommand::QuickPrompt),
            _ => None,
        }
    }
}

/// Map a context-menu entry id onto its quick action.
#[must_use]
pub fn menu_action(menu_item_id: &str) -> Option<QuickAction> {
    match menu_item_id {
        "ai-summarize" => Some(QuickAction::Summarize),
        "ai-explain" => Some(QuickAction::Explain),
        "ai-improve" => Some(QuickAction::Improve),
        "ai-translate" => Some(QuickAction::Translate),
        _ => None,
    }
}

/// Reply to a `checkPromptAPI` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResponse {
    #[must_use]
    pub fn from_availability(availability: &LocalAvailability) -> Self {
        match availability {
            LocalAvailability::Ready => Self {
                available: true,
                state: Some("ready".to_string()),
                error: None,
            },
            LocalAvailability::DownloadRequired => Self {
                available: true,
                state: Some("download-required".to_string()),
                error: None,
            },
            LocalAvailability::Unavailable => Self {
                available: false,
                state: Some("unavailable".to_string()),
                error: Some("Model not available on this device".to_string()),
            },
            LocalAvailability::Error(message) => Self {
                available: false,
                state: Some("error".to_string()),
                error: Some(message.clone()),
            },
        }
    }
}
