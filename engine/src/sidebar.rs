//! Sidebar shell state.
//!
//! Visibility is a two-state toggle with an orthogonal minimized flag; both
//! are idempotent for a target state. The response area renders exactly one
//! view at a time, replaced wholesale - there is no partial update path.

/// Status badge for the active AI provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiStatus {
    Checking,
    Ready { detail: Option<String> },
    DownloadRequired,
    Downloading,
    Unavailable { detail: Option<String> },
    Error { detail: Option<String> },
}

impl AiStatus {
    #[must_use]
    pub fn ready() -> Self {
        AiStatus::Ready { detail: None }
    }

    /// Single-line rendering for the status area.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            AiStatus::Checking => "Checking AI availability...".to_string(),
            AiStatus::Ready { detail: None } => "AI Ready".to_string(),
            AiStatus::Ready {
                detail: Some(detail),
            } => format!("AI Ready ({detail})"),
            AiStatus::DownloadRequired => "AI model download required".to_string(),
            AiStatus::Downloading => "Downloading AI model...".to_string(),
            AiStatus::Unavailable { detail } => format!(
                "AI unavailable: {}",
                detail.as_deref().unwrap_or("hardware requirements not met")
            ),
            AiStatus::Error { detail } => format!(
                "AI error: {}",
                detail.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Mutually exclusive content of the response area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseView {
    Status(AiStatus),
    Loading,
    Response(String),
    Error(String),
}

/// The persistent panel's state. Owned exclusively by the app; everything
/// else asks for changes through it.
#[derive(Debug)]
pub struct Sidebar {
    visible: bool,
    minimized: bool,
    view: ResponseView,
}

impl Sidebar {
    #[must_use]
    pub fn new() -> Self {
        Self {
            visible: false,
            minimized: false,
            view: ResponseView::Status(AiStatus::Checking),
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    #[must_use]
    pub fn view(&self) -> &ResponseView {
        &self.view
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn show(&mut self) {
        self.set_visible(true);
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn toggle_minimized(&mut self) {
        self.minimized = !self.minimized;
    }

    pub fn update_status(&mut self, status: AiStatus) {
        self.view = ResponseView::Status(status);
    }

    pub fn show_loading(&mut self) {
        self.view = ResponseView::Loading;
    }

    pub fn display_response(&mut self, response: impl Into<String>) {
        self.view = ResponseView::Response(response.into());
    }

    pub fn display_error(&mut self, message: impl Into<String>) {
        self.view = ResponseView::Error(message.into());
    }
}

impl Default for Sidebar {
    fn default() -> Self {
        Self::new()
    }
}
