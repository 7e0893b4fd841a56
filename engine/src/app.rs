//! The per-page assistant: one object owning every surface's state.
//!
//! Control flow mirrors a navigation lifecycle: [`Assistant::on_navigation`]
//! re-analyzes the page and resets all transient state, user events feed the
//! overlay/selection machines, and assist actions flow
//! build prompt -> loading -> ask -> render (or fill back into the field).
//!
//! Every model-call failure lands in the sidebar as a dismissible error;
//! cosmetic failures (no overlay anchor, unknown menu entry) log and no-op.

use std::time::Duration;

use sidekick_analysis::{
    DetectedInput, InputId, MutationNotice, PageAnalysis, PageSnapshot, RescanDebouncer,
    conversation_context, detect_inputs, page_context,
};
use sidekick_providers::LocalModel;
use sidekick_types::{ApiCredential, AssistAction, InputPurpose, Preferences, QuickAction, Rect,
    SelectionAction, Viewport};

use crate::article::ArticlePresenter;
use crate::commands::{HostCommand, ProbeResponse, ShortcutCommand, menu_action};
use crate::overlay::{OverlayRegistry, actions_for};
use crate::prompt::{PromptContext, build_prompt, quick_action_prompt, selection_prompt};
use crate::selection::SelectionButtons;
use crate::session::{AskError, SessionRouter};
use crate::sidebar::{AiStatus, Sidebar};

/// A model answer destined for the tracked input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillBack {
    pub input: InputId,
    pub text: String,
}

pub struct Assistant<M: LocalModel> {
    router: SessionRouter<M>,
    sidebar: Sidebar,
    overlays: OverlayRegistry,
    selection: SelectionButtons,
    article: ArticlePresenter,
    rescan: RescanDebouncer,
    preferences: Preferences,
    credential: Option<ApiCredential>,
    analysis: Option<PageAnalysis>,
    inputs: Vec<DetectedInput>,
}

impl<M: LocalModel> Assistant<M> {
    #[must_use]
    pub fn new(local: M, preferences: Preferences, credential: Option<ApiCredential>) -> Self {
        Self {
            router: SessionRouter::new(local, &preferences, credential.clone()),
            sidebar: Sidebar::new(),
            overlays: OverlayRegistry::new(),
            selection: SelectionButtons::new(),
            article: ArticlePresenter::new(),
            rescan: RescanDebouncer::default(),
            preferences,
            credential,
            analysis: None,
            inputs: Vec::new(),
        }
    }

    /// Swap the remote endpoint (tests).
    #[must_use]
    pub fn with_remote_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.router = self.router.with_remote_base_url(base_url);
        self
    }

    #[must_use]
    pub fn sidebar(&self) -> &Sidebar {
        &self.sidebar
    }

    pub fn sidebar_mut(&mut self) -> &mut Sidebar {
        &mut self.sidebar
    }

    #[must_use]
    pub fn overlays(&self) -> &OverlayRegistry {
        &self.overlays
    }

    #[must_use]
    pub fn selection_buttons(&self) -> &SelectionButtons {
        &self.selection
    }

    #[must_use]
    pub fn article_overlay(&self) -> &ArticlePresenter {
        &self.article
    }

    #[must_use]
    pub fn analysis(&self) -> Option<&PageAnalysis> {
        self.analysis.as_ref()
    }

    #[must_use]
    pub fn inputs(&self) -> &[DetectedInput] {
        &self.inputs
    }

    /// A navigation happened: analyze the new document, re-detect inputs,
    /// and reset every transient surface. The prior page's overlays,
    /// selection buttons, and pending rescans never leak across.
    pub fn on_navigation(&mut self, snapshot: &PageSnapshot) {
        self.overlays.close_all();
        self.selection = SelectionButtons::new();
        self.article.dismiss();
        self.rescan.cancel();

        let analysis = sidekick_analysis::analyze(snapshot);
        self.inputs = detect_inputs(snapshot);
        tracing::debug!(
            url = %analysis.url,
            kind = analysis.content_kind.as_str(),
            inputs = self.inputs.len(),
            "Page analyzed"
        );

        if self.preferences.auto_show_sidebar {
            self.sidebar.show();
        }
        if analysis.is_long_article {
            self.article.show(snapshot, &analysis.reading_time);
        }
        self.analysis = Some(analysis);
    }

    /// Probe the configured provider and surface its status.
    pub async fn check_ai(&mut self) {
        let status = self.router.check_availability().await;
        self.sidebar.update_status(status);
    }

    /// Submit one prompt and render its outcome.
    ///
    /// Requests are not cancelled by newer ones; when several overlap, the
    /// sidebar shows whichever settled most recently.
    pub async fn run_prompt(&mut self, prompt: &str) -> Result<String, AskError> {
        self.sidebar.show_loading();
        match self.router.ask(prompt).await {
            Ok(response) => {
                self.sidebar.display_response(response.clone());
                Ok(response)
            }
            Err(e) => {
                self.sidebar.display_error(e.to_string());
                Err(e)
            }
        }
    }

    /// User-triggered download of the on-device model.
    pub async fn download_model(&mut self) {
        self.sidebar.update_status(AiStatus::Downloading);
        match self.router.start_model_download().await {
            Ok(()) => self.sidebar.update_status(AiStatus::ready()),
            Err(e) => self.sidebar.update_status(AiStatus::Error {
                detail: Some(format!("Failed to download model: {e}")),
            }),
        }
    }

    fn tracked_input(&self, input: InputId) -> Option<&DetectedInput> {
        self.inputs
            .iter()
            .filter(|detected| detected.is_relevant)
            .find(|detected| detected.id == input || detected.fields.contains(&input))
    }

    /// A tracked input gained focus: show its overlay (closing any other).
    /// Untracked elements are ignored.
    pub fn on_input_focus(
        &mut self,
        input: InputId,
        input_rect: Rect,
        viewport: Viewport,
        current_text: &str,
    ) -> bool {
        let Some((purpose, has_long_text)) = self
            .tracked_input(input)
            .map(|detected| (detected.purpose, detected.has_long_text))
        else {
            tracing::debug!(%input, "Focused element is not a tracked input");
            return false;
        };
        let actions = actions_for(purpose, has_long_text, !current_text.trim().is_empty());
        self.overlays.show(input, purpose, actions, input_rect, viewport);
        true
    }

    pub fn on_input_blur(&mut self, input: InputId) {
        self.overlays.blur(input);
    }

    pub fn on_input_keystroke(&mut self, input: InputId, input_rect: Rect, viewport: Viewport) {
        self.overlays.keystroke(input, input_rect, viewport);
    }

    /// Run an overlay action for a tracked input. On success, actions in
    /// the fill-back set return the cleaned text to write into the field.
    pub async fn handle_assist_action(
        &mut self,
        action: AssistAction,
        input: InputId,
        current_text: &str,
        custom_instruction: Option<&str>,
        snapshot: &PageSnapshot,
    ) -> Option<FillBack> {
        let (purpose, label) = self
            .tracked_input(input)
            .map_or((InputPurpose::GeneralText, String::new()), |detected| {
                (detected.purpose, detected.label.clone())
            });

        let conversation = conversation_context(snapshot);
        let context = PromptContext {
            page_title: snapshot.title(),
            input_label: label,
            conversation: (!conversation.is_empty()).then_some(conversation),
            page: Some(page_context(snapshot)),
        };
        let prompt = build_prompt(action, purpose, current_text.trim(), &context, custom_instruction);

        self.sidebar.show();
        let result = self.run_prompt(&prompt).await;
        self.overlays.close(input);

        match result {
            Ok(response) if action.fills_input() => Some(FillBack {
                input,
                text: clean_fill_text(&response),
            }),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(%e, action = action.as_str(), "Form assistance failed");
                None
            }
        }
    }

    /// Floating selection-button action: the buttons are removed first,
    /// then the prompt runs in the sidebar.
    pub async fn handle_selection_action(&mut self, action: SelectionAction, selected_text: &str) {
        self.selection.on_action();
        self.sidebar.show();
        let _ = self.run_prompt(&selection_prompt(action, selected_text)).await;
    }

    /// Sidebar quick action (also backs the context menu and the article
    /// overlay buttons).
    pub async fn handle_quick_action(&mut self, action: QuickAction, selection: Option<&str>) {
        if matches!(action, QuickAction::AutoSummarize | QuickAction::Tldr) {
            self.article.dismiss();
        }
        let Some(analysis) = &self.analysis else {
            tracing::debug!("Quick action before any navigation; ignoring");
            return;
        };
        match quick_action_prompt(action, analysis, selection) {
            Some(prompt) => {
                self.sidebar.show();
                let _ = self.run_prompt(&prompt).await;
            }
            None => {
                self.sidebar.show();
                self.sidebar
                    .display_error("Please select some text first, or open an article page.");
            }
        }
    }

    /// Command from the privileged background process.
    pub async fn handle_host_command(&mut self, command: HostCommand) -> Option<ProbeResponse> {
        match command {
            HostCommand::ContextMenuClick {
                menu_item_id,
                selection_text,
                ..
            } => {
                let Some(action) = menu_action(&menu_item_id) else {
                    tracing::warn!(menu_item_id, "Unknown context menu entry");
                    return None;
                };
                let selection = Some(selection_text.as_str()).filter(|text| !text.trim().is_empty());
                self.handle_quick_action(action, selection).await;
                None
            }
            HostCommand::KeyboardShortcut { command } => {
                match ShortcutCommand::parse(&command) {
                    Some(ShortcutCommand::ToggleSidebar) => self.sidebar.toggle(),
                    Some(ShortcutCommand::QuickPrompt) => {
                        tracing::debug!("Quick prompt awaits a selection from the host");
                    }
                    None => tracing::warn!(command, "Unknown keyboard shortcut"),
                }
                None
            }
            HostCommand::SettingsChanged { settings } => {
                self.apply_settings(settings).await;
                None
            }
            HostCommand::CheckPromptApi => {
                let availability = self.router.probe_local().await;
                Some(ProbeResponse::from_availability(&availability))
            }
            HostCommand::GetStorageData { .. } | HostCommand::SetStorageData { .. } => {
                // Served by the background process against the config store.
                tracing::debug!("Storage command ignored by page-level logic");
                None
            }
        }
    }

    /// Quick prompt shortcut: runs the raw selection as the prompt.
    pub async fn quick_prompt_from_selection(&mut self, selected_text: &str) {
        let prompt = selected_text.trim();
        if prompt.is_empty() {
            return;
        }
        self.sidebar.show();
        let _ = self.run_prompt(prompt).await;
    }

    /// Apply changed settings and re-check the (possibly new) provider.
    pub async fn apply_settings(&mut self, settings: Preferences) {
        let provider_changed = settings.provider != self.preferences.provider;
        self.preferences = settings;
        self.router
            .apply_settings(&self.preferences, self.credential.clone());
        if provider_changed {
            self.check_ai().await;
        }
    }

    /// Replace the stored credential (local-only scope) and re-route.
    pub async fn set_credential(&mut self, credential: Option<ApiCredential>) {
        self.credential = credential;
        self.router
            .apply_settings(&self.preferences, self.credential.clone());
        self.check_ai().await;
    }

    /// Selection changed in the page.
    pub fn on_selection_change(&mut self, selected_text: &str, rect: Option<Rect>) {
        self.selection.on_selection_change(selected_text, rect);
    }

    /// Mutation observer notice from the host page.
    pub fn on_mutation(&mut self, notice: &MutationNotice) {
        self.rescan.notice(notice);
    }

    /// Advance every timer-driven surface by `delta`.
    ///
    /// `focused` is the input currently holding focus; `selection_is_empty`
    /// reflects the live selection; `snapshot` feeds the debounced
    /// re-detection when the mutation window elapses.
    pub fn tick(
        &mut self,
        delta: Duration,
        focused: Option<InputId>,
        selection_is_empty: bool,
        snapshot: &PageSnapshot,
    ) {
        let closed = self.overlays.advance(delta, focused);
        if !closed.is_empty() {
            tracing::debug!(count = closed.len(), "Form overlays auto-dismissed");
        }
        self.article.advance(delta);
        self.selection.advance(delta, selection_is_empty);
        if self.rescan.advance(delta) {
            self.inputs = detect_inputs(snapshot);
            tracing::debug!(inputs = self.inputs.len(), "Inputs re-detected after DOM mutation");
        }
    }
}

/// Strip the wrapping quotes models like to add around fill-back text.
fn clean_fill_text(response: &str) -> String {
    let text = response.trim();
    let text = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(text);
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::clean_fill_text;

    #[test]
    fn fill_text_strips_wrapping_quotes() {
        assert_eq!(clean_fill_text("\"hello\""), "hello");
        assert_eq!(clean_fill_text("  plain  "), "plain");
        // Interior quotes survive.
        assert_eq!(clean_fill_text("say \"hi\" now"), "say \"hi\" now");
    }
}
