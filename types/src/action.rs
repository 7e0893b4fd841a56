//! Closed action and purpose vocabularies for the assist surfaces.
//!
//! Overlay menus, prompt templates, and the fill-back decision all key off
//! these enums; adding a variant means adding a template, so the sets stay
//! closed on purpose.

use serde::{Deserialize, Serialize};

/// An action offered by the form-assist overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistAction {
    ImproveSearch,
    SuggestSearch,
    AdvancedSearch,
    DraftTweet,
    MakeEngaging,
    AddHashtags,
    DraftMessage,
    ImproveText,
    AdjustTone,
    WriteReview,
    ProfessionalTone,
    PolishText,
    ExpandIdeas,
    ImproveQuestion,
    MakeSpecific,
    AddContext,
    GetSuggestions,
    CustomPrompt,
    Default,
}

impl AssistAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistAction::ImproveSearch => "improve_search",
            AssistAction::SuggestSearch => "suggest_search",
            AssistAction::AdvancedSearch => "advanced_search",
            AssistAction::DraftTweet => "draft_tweet",
            AssistAction::MakeEngaging => "make_engaging",
            AssistAction::AddHashtags => "add_hashtags",
            AssistAction::DraftMessage => "draft_message",
            AssistAction::ImproveText => "improve_text",
            AssistAction::AdjustTone => "adjust_tone",
            AssistAction::WriteReview => "write_review",
            AssistAction::ProfessionalTone => "professional_tone",
            AssistAction::PolishText => "polish_text",
            AssistAction::ExpandIdeas => "expand_ideas",
            AssistAction::ImproveQuestion => "improve_question",
            AssistAction::MakeSpecific => "make_specific",
            AssistAction::AddContext => "add_context",
            AssistAction::GetSuggestions => "get_suggestions",
            AssistAction::CustomPrompt => "custom_prompt",
            AssistAction::Default => "default",
        }
    }

    /// Whether the model's answer replaces the tracked input's content.
    ///
    /// Every action in this set templates a "return only the final text"
    /// instruction so the response can be written back verbatim.
    #[must_use]
    pub fn fills_input(&self) -> bool {
        matches!(
            self,
            AssistAction::ImproveSearch
                | AssistAction::SuggestSearch
                | AssistAction::AdvancedSearch
                | AssistAction::DraftTweet
                | AssistAction::MakeEngaging
                | AssistAction::AddHashtags
                | AssistAction::DraftMessage
                | AssistAction::ImproveText
                | AssistAction::AdjustTone
                | AssistAction::ProfessionalTone
                | AssistAction::PolishText
                | AssistAction::ExpandIdeas
                | AssistAction::ImproveQuestion
                | AssistAction::MakeSpecific
                | AssistAction::AddContext
                | AssistAction::CustomPrompt
        )
    }
}

/// What a tracked editable surface is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputPurpose {
    Search,
    SocialPost,
    MessageComposition,
    AiChat,
    ReviewWriting,
    JobApplication,
    SupportRequest,
    Bio,
    Comment,
    GeneralText,
}

impl InputPurpose {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            InputPurpose::Search => "search",
            InputPurpose::SocialPost => "social_post",
            InputPurpose::MessageComposition => "message_composition",
            InputPurpose::AiChat => "ai_chat",
            InputPurpose::ReviewWriting => "review_writing",
            InputPurpose::JobApplication => "job_application",
            InputPurpose::SupportRequest => "support_request",
            InputPurpose::Bio => "bio",
            InputPurpose::Comment => "comment",
            InputPurpose::GeneralText => "general_text",
        }
    }
}

/// Actions on the floating buttons shown over a text selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionAction {
    Explain,
    Define,
    Eli5,
    Summary,
}

/// Quick actions exposed in the sidebar and the host context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickAction {
    Summarize,
    Explain,
    Improve,
    Translate,
    AutoSummarize,
    Tldr,
}

#[cfg(test)]
mod tests {
    use super::{AssistAction, InputPurpose};

    #[test]
    fn custom_prompt_fills_input() {
        assert!(AssistAction::CustomPrompt.fills_input());
    }

    #[test]
    fn advisory_actions_do_not_fill_input() {
        assert!(!AssistAction::WriteReview.fills_input());
        assert!(!AssistAction::GetSuggestions.fills_input());
        assert!(!AssistAction::Default.fills_input());
    }

    #[test]
    fn serde_round_trips_snake_case() {
        let json = serde_json::to_string(&AssistAction::ImproveText).unwrap();
        assert_eq!(json, "\"improve_text\"");
        let back: AssistAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AssistAction::ImproveText);
    }

    #[test]
    fn purpose_as_str_matches_serde_tag() {
        let json = serde_json::to_string(&InputPurpose::AiChat).unwrap();
        assert_eq!(json.trim_matches('"'), InputPurpose::AiChat.as_str());
    }
}
