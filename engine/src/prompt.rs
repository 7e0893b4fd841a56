//! Prompt construction.
//!
//! Pure templating: the same inputs always produce the same string. Each
//! prompt embeds a context header (page title + field label) and, when
//! available, a conversation block and a page block. Actions whose answer
//! is written back into the field instruct the model to return only the
//! final text.

use std::fmt::Write;

use sidekick_analysis::{ConversationContext, PageAnalysis, PageContext, Platform, ThreadKind};
use sidekick_types::{AssistAction, InputPurpose, QuickAction, SelectionAction, truncate_chars};

const MESSAGE_EXCERPT_LIMIT: usize = 200;
const DESCRIPTION_LIMIT: usize = 200;
const PAGE_CONTENT_LIMIT: usize = 1500;
const HEADING_LIMIT: usize = 5;

/// Everything the templates can draw on for one assist request.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub page_title: String,
    pub input_label: String,
    pub conversation: Option<ConversationContext>,
    pub page: Option<PageContext>,
}

impl PromptContext {
    fn header(&self) -> String {
        let label = if self.input_label.is_empty() {
            "text input"
        } else {
            &self.input_label
        };
        format!("Context: {} - {label}", self.page_title)
    }
}

/// Build the instruction string for a form-assist action.
#[must_use]
pub fn build_prompt(
    action: AssistAction,
    _purpose: InputPurpose,
    current_text: &str,
    context: &PromptContext,
    custom_instruction: Option<&str>,
) -> String {
    let conversation = context
        .conversation
        .as_ref()
        .map(conversation_block)
        .unwrap_or_default();
    let page = context.page.as_ref().map(page_block).unwrap_or_default();
    // Context header plus the optional conversation/page blocks, shared by
    // every template.
    let base = format!("{}{conversation}{page}", context.header());

    if action == AssistAction::CustomPrompt
        && let Some(instruction) = custom_instruction
    {
        return custom_prompt(current_text, context, &base, instruction);
    }

    match action {
        AssistAction::ImproveSearch => format!(
            "{base}\n\nPlease improve this search query to get better results:\n\n\"{current_text}\"\n\nReturn ONLY the improved search query, no explanations."
        ),
        AssistAction::SuggestSearch => format!(
            "{base}\n\nBased on this search intent: \"{}\"\n\nSuggest 3-5 alternative search terms or queries that might help find what I'm looking for. Return ONLY the suggested queries, one per line, no explanations.",
            if current_text.is_empty() { "general search" } else { current_text }
        ),
        AssistAction::AdvancedSearch => format!(
            "{base}\n\nConvert this search into an advanced query with operators (quotes, minus signs, OR):\n\n\"{current_text}\"\n\nReturn ONLY the advanced query, no explanations."
        ),
        AssistAction::DraftTweet => format!(
            "{base}\n\nPlease help draft an engaging tweet. {}Keep it under 280 characters. Return ONLY the tweet text, no explanations.",
            if current_text.is_empty() {
                "Create an engaging tweet that could spark conversation. ".to_string()
            } else {
                format!("Topic/idea: \"{current_text}\"\n\nCreate a compelling tweet based on this. ")
            }
        ),
        AssistAction::MakeEngaging => format!(
            "{base}\n\nPlease rewrite this to be more engaging and likely to get interaction:\n\n\"{current_text}\"\n\nKeep it under 280 characters. Return ONLY the rewritten text, no explanations."
        ),
        AssistAction::AddHashtags => format!(
            "{base}\n\nPlease add 2-3 popular and relevant hashtags to this tweet:\n\n\"{current_text}\"\n\nReturn ONLY the tweet with hashtags, no explanations."
        ),
        AssistAction::DraftMessage => format!(
            "{base}\n\n{}\n\nReturn ONLY the final message text, no explanations.",
            if current_text.is_empty() {
                "Create a professional message that fits the conversation above.".to_string()
            } else {
                format!("Improve this message: \"{current_text}\"")
            }
        ),
        AssistAction::ImproveText => format!(
            "{base}\n\nImprove this text for clarity, grammar, and flow:\n\n\"{current_text}\"\n\nReturn ONLY the improved text, no explanations."
        ),
        AssistAction::AdjustTone => format!(
            "{base}\n\nRewrite this text with a more professional and friendly tone:\n\n\"{current_text}\"\n\nReturn ONLY the rewritten text, no explanations."
        ),
        AssistAction::WriteReview => format!(
            "{base}\n\nPlease help write a balanced, helpful review. {}",
            if current_text.is_empty() {
                "Create a review template with pros, cons, and overall thoughts.".to_string()
            } else {
                format!("Current thoughts: \"{current_text}\"\n\nExpand this into a well-structured review.")
            }
        ),
        AssistAction::ProfessionalTone => format!(
            "{base}\n\nRewrite this text with a professional, business-appropriate tone:\n\n\"{current_text}\"\n\nReturn ONLY the rewritten text, no explanations."
        ),
        AssistAction::PolishText => format!(
            "{base}\n\nPolish this text for grammar, clarity, and readability:\n\n\"{current_text}\"\n\nReturn ONLY the polished text, no explanations."
        ),
        AssistAction::ExpandIdeas => format!(
            "{base}\n\nExpand on these ideas with more detail and examples:\n\n\"{current_text}\"\n\nReturn ONLY the expanded text, no explanations."
        ),
        AssistAction::ImproveQuestion => format!(
            "{base}\n\nImprove this question to get a better AI response:\n\n\"{current_text}\"\n\nMake it more specific, clear, and likely to get a helpful answer. Return ONLY the improved question, no explanations."
        ),
        AssistAction::MakeSpecific => format!(
            "{base}\n\nMake this question more specific and detailed:\n\n\"{current_text}\"\n\nAdd relevant context and specifics that will help get a better answer. Return ONLY the improved question, no explanations."
        ),
        AssistAction::AddContext => format!(
            "{base}\n\nAdd helpful context to this question:\n\n\"{current_text}\"\n\nInclude background information that would help an AI provide a better response. Return ONLY the question with added context, no explanations."
        ),
        AssistAction::GetSuggestions => format!(
            "{base}\n\nWhat are some helpful suggestions for writing effective content for this type of form field?"
        ),
        AssistAction::CustomPrompt | AssistAction::Default => format!(
            "{base}\n\nPlease provide helpful assistance for this form field.{}",
            if current_text.is_empty() {
                String::new()
            } else {
                format!(" Current content: \"{current_text}\"")
            }
        ),
    }
}

fn custom_prompt(
    current_text: &str,
    context: &PromptContext,
    base: &str,
    instruction: &str,
) -> String {
    let clarification = match context.conversation.as_ref() {
        Some(conv) if conv.thread_kind == ThreadKind::Recruitment => {
            "This is a professional business communication context. "
        }
        Some(conv) if conv.platform == Platform::LinkedIn => {
            "This is a professional LinkedIn message. "
        }
        _ => "",
    };

    let task = if current_text.is_empty() {
        format!(
            "Task: You are helping write a professional response message. {clarification}Create a message that responds appropriately to the conversation above.\n\nUser instruction: {instruction}{}",
            instruction_examples(instruction)
        )
    } else {
        format!(
            "Task: You are helping write a professional response message. {clarification}Modify this text: \"{current_text}\"\n\nUser instruction: {instruction}"
        )
    };

    format!(
        "{base}\n\n{task}\n\nWrite a polite, professional message that fulfills the user's request. Return ONLY the final message text that can be sent directly. No explanations, no quotes, no introductions - just the message itself."
    )
}

/// Clarifying examples keyed by keywords in the user's instruction.
fn instruction_examples(instruction: &str) -> &'static str {
    let lower = instruction.to_lowercase();
    if lower.contains("reject") || lower.contains("decline") {
        "\n\nCommon professional responses include politely declining job offers, meeting requests, proposals, or invitations while maintaining good relationships."
    } else if lower.contains("accept") || lower.contains("agree") {
        "\n\nCommon professional responses include accepting offers, confirming meetings, or agreeing to proposals."
    } else if lower.contains("reschedule") || lower.contains("postpone") {
        "\n\nCommon professional responses include requesting to reschedule meetings or calls due to conflicts."
    } else {
        ""
    }
}

fn conversation_block(context: &ConversationContext) -> String {
    if context.is_empty() {
        return String::new();
    }

    let mut block = String::new();
    let _ = writeln!(block, "Platform: {}", context.platform.as_str());
    if context.platform == Platform::LinkedIn {
        let kind = match context.thread_kind {
            ThreadKind::Recruitment => "recruitment",
            ThreadKind::Networking => "networking",
            ThreadKind::General => "general",
        };
        let _ = writeln!(block, "Conversation type: {kind}");
    }
    if !context.participants.is_empty() {
        let _ = writeln!(block, "Participants: {}", context.participants.join(", "));
    }
    if let Some(subject) = &context.subject {
        let _ = writeln!(block, "Subject: {subject}");
    }
    if !context.messages.is_empty() {
        block.push_str("\nRecent conversation:\n");
        for message in &context.messages {
            let content = message.content.trim();
            if content.is_empty() {
                continue;
            }
            let sender = message.sender.as_deref().unwrap_or("Unknown");
            let excerpt = truncate_chars(content, MESSAGE_EXCERPT_LIMIT);
            let ellipsis = if excerpt.len() < content.len() { "..." } else { "" };
            let _ = writeln!(block, "{sender}: {excerpt}{ellipsis}");
        }
    }
    if let Some(reply_to) = &context.reply_to {
        let _ = writeln!(
            block,
            "\nReplying to post: {}",
            truncate_chars(reply_to, MESSAGE_EXCERPT_LIMIT)
        );
    }

    format!("\nConversation Context:\n{block}")
}

fn page_block(page: &PageContext) -> String {
    let mut block = String::new();
    if !page.page_kind.is_empty() {
        let _ = writeln!(block, "Page type: {}", page.page_kind);
    }
    if let Some(description) = &page.description {
        let _ = writeln!(
            block,
            "Page description: {}",
            truncate_chars(description, DESCRIPTION_LIMIT)
        );
    }
    if !page.headings.is_empty() {
        let headings: Vec<&str> = page
            .headings
            .iter()
            .take(HEADING_LIMIT)
            .map(String::as_str)
            .collect();
        let _ = writeln!(block, "Page headings: {}", headings.join(", "));
    }
    let content = if page.main_content.len() > 100 {
        Some(&page.main_content)
    } else if page.visible_text.len() > 100 {
        Some(&page.visible_text)
    } else {
        None
    };
    if let Some(content) = content {
        let _ = writeln!(
            block,
            "\nMain page content:\n{}",
            truncate_chars(content, PAGE_CONTENT_LIMIT)
        );
    }

    if block.is_empty() {
        String::new()
    } else {
        format!("\nPage Context:\n{block}")
    }
}

/// Prompt for a floating selection-button action.
#[must_use]
pub fn selection_prompt(action: SelectionAction, selected_text: &str) -> String {
    match action {
        SelectionAction::Explain => {
            format!("Please explain this text in detail:\n\n\"{selected_text}\"")
        }
        SelectionAction::Define => format!(
            "Please define and explain the key terms in this text:\n\n\"{selected_text}\""
        ),
        SelectionAction::Eli5 => format!(
            "Please explain this text like I'm 5 years old (use simple language):\n\n\"{selected_text}\""
        ),
        SelectionAction::Summary => {
            format!("Please summarize this text with the key points:\n\n\"{selected_text}\"")
        }
    }
}

/// Prompt for a sidebar quick action or context-menu entry. Returns `None`
/// when the action needs a selection (or article text) that isn't there.
#[must_use]
pub fn quick_action_prompt(
    action: QuickAction,
    analysis: &PageAnalysis,
    selection: Option<&str>,
) -> Option<String> {
    let selection = selection.map(str::trim).filter(|text| !text.is_empty());
    match action {
        QuickAction::Summarize => Some(selection.map_or_else(
            || {
                format!(
                    "Please summarize this webpage:\n\nTitle: {}\nURL: {}\n\nContent: {}",
                    analysis.title, analysis.url, analysis.main_content
                )
            },
            |text| format!("Please summarize this text: \"{text}\""),
        )),
        QuickAction::Explain => Some(selection.map_or_else(
            || {
                format!(
                    "Please explain what this webpage is about:\n\nTitle: {}\nContent: {}",
                    analysis.title, analysis.main_content
                )
            },
            |text| format!("Please explain this text: \"{text}\""),
        )),
        QuickAction::Improve => selection.map(|text| format!("Please improve this text: \"{text}\"")),
        QuickAction::Translate => {
            selection.map(|text| format!("Please translate this text to English:\n\n\"{text}\""))
        }
        QuickAction::AutoSummarize => {
            if analysis.article_text.is_empty() {
                return None;
            }
            Some(format!(
                "Please provide a comprehensive summary of this article:\n\nTitle: {}\n\nContent: {}\n\nPlease include:\n- Main topic and key points\n- Important conclusions\n- Any actionable insights",
                analysis.title, analysis.article_text
            ))
        }
        QuickAction::Tldr => {
            if analysis.article_text.is_empty() {
                return None;
            }
            Some(format!(
                "Please provide a very brief TL;DR (Too Long; Didn't Read) summary of this article in 2-3 sentences:\n\nTitle: {}\n\nContent: {}",
                analysis.title, analysis.article_text
            ))
        }
    }
}
