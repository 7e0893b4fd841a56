//! Messaging-thread context extraction.
//!
//! Derived on demand at prompt-construction time from the live snapshot,
//! never cached. Each platform gets its own selector table; unknown hosts
//! fall back to generic chat-container probing.

use scraper::{ElementRef, Selector};
use url::Url;

use sidekick_types::truncate_chars;

use crate::{PageSnapshot, element_text, select_first};

const LINKEDIN_MESSAGE_LIMIT: usize = 5;
const GMAIL_MESSAGE_LIMIT: usize = 3;
const GENERIC_MESSAGE_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    LinkedIn,
    Twitter,
    Gmail,
    Facebook,
    Generic,
}

impl Platform {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "linkedin",
            Platform::Twitter => "twitter",
            Platform::Gmail => "gmail",
            Platform::Facebook => "facebook",
            Platform::Generic => "generic",
        }
    }

    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        let host = url.host_str().unwrap_or_default().to_lowercase();
        if host.contains("linkedin.com") {
            Platform::LinkedIn
        } else if host.contains("twitter.com") || host == "x.com" || host.ends_with(".x.com") {
            Platform::Twitter
        } else if host.contains("gmail.com") || host.contains("mail.google.com") {
            Platform::Gmail
        } else if host.contains("facebook.com") || host.contains("messenger.com") {
            Platform::Facebook
        } else {
            Platform::Generic
        }
    }
}

/// What kind of thread this looks like, used to slant prompt phrasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadKind {
    Recruitment,
    Networking,
    #[default]
    General,
}

#[derive(Debug, Clone, Default)]
pub struct ThreadMessage {
    pub sender: Option<String>,
    pub content: String,
    pub time: Option<String>,
}

/// Conversation surrounding the focused composer, if any.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub platform: Platform,
    pub messages: Vec<ThreadMessage>,
    pub participants: Vec<String>,
    pub subject: Option<String>,
    pub thread_kind: ThreadKind,
    /// Original post being replied to (microblog surfaces).
    pub reply_to: Option<String>,
}

impl ConversationContext {
    fn empty(platform: Platform) -> Self {
        Self {
            platform,
            messages: Vec::new(),
            participants: Vec::new(),
            subject: None,
            thread_kind: ThreadKind::General,
            reply_to: None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
            && self.participants.is_empty()
            && self.subject.is_none()
            && self.reply_to.is_none()
    }
}

#[must_use]
pub fn conversation_context(snapshot: &PageSnapshot) -> ConversationContext {
    match Platform::from_url(snapshot.url()) {
        Platform::LinkedIn => linkedin_context(snapshot),
        Platform::Twitter => twitter_context(snapshot),
        Platform::Gmail => gmail_context(snapshot),
        platform @ (Platform::Facebook | Platform::Generic) => {
            generic_context(snapshot, platform)
        }
    }
}

fn linkedin_context(snapshot: &PageSnapshot) -> ConversationContext {
    let mut context = ConversationContext::empty(Platform::LinkedIn);

    if let Ok(selector) = Selector::parse(".msg-s-message-list__event, .message-event") {
        let events: Vec<ElementRef<'_>> = snapshot.document().select(&selector).collect();
        let skip = events.len().saturating_sub(LINKEDIN_MESSAGE_LIMIT);
        for event in events.into_iter().skip(skip) {
            let sender = child_text(event, ".msg-s-message-list__name, .message-event__name");
            let content = child_text(event, ".msg-s-event-listitem__body, .message-event__body");
            let time = child_text(event, ".msg-s-message-list__time-heading, .message-event__time");
            if let Some(content) = content {
                context.messages.push(ThreadMessage {
                    sender,
                    content,
                    time,
                });
            }
        }
    }

    if let Ok(selector) = Selector::parse(".msg-entity-lockup__entity-title, .conversation-participant")
    {
        context.participants = snapshot
            .document()
            .select(&selector)
            .map(element_text)
            .filter(|name| !name.is_empty())
            .collect();
    }

    context.subject = select_first(
        snapshot.document(),
        ".msg-overlay-conversation-bubble__details-title, .conversation-header",
    )
    .map(element_text)
    .filter(|subject| !subject.is_empty());

    context.thread_kind = classify_thread(&context.messages);
    context
}

fn classify_thread(messages: &[ThreadMessage]) -> ThreadKind {
    let any_keyword = |keywords: &[&str]| {
        messages.iter().any(|msg| {
            let content = msg.content.to_lowercase();
            keywords.iter().any(|kw| content.contains(kw))
        })
    };
    if any_keyword(&["opportunity", "position", "role"]) {
        ThreadKind::Recruitment
    } else if any_keyword(&["connect", "network"]) {
        ThreadKind::Networking
    } else {
        ThreadKind::General
    }
}

fn twitter_context(snapshot: &PageSnapshot) -> ConversationContext {
    let mut context = ConversationContext::empty(Platform::Twitter);
    context.reply_to = select_first(
        snapshot.document(),
        "[data-testid=\"tweet\"] .tweet-text, .original-tweet",
    )
    .map(element_text)
    .filter(|text| !text.is_empty());
    context
}

fn gmail_context(snapshot: &PageSnapshot) -> ConversationContext {
    let mut context = ConversationContext::empty(Platform::Gmail);

    context.subject = select_first(snapshot.document(), ".hP, [data-legacy-thread-id] .bog")
        .map(element_text)
        .filter(|subject| !subject.is_empty());

    if let Ok(selector) = Selector::parse(".ii.gt .a3s, .message-content") {
        let bodies: Vec<String> = snapshot
            .document()
            .select(&selector)
            .map(element_text)
            .filter(|content| content.len() > 20)
            .collect();
        let skip = bodies.len().saturating_sub(GMAIL_MESSAGE_LIMIT);
        for content in bodies.into_iter().skip(skip) {
            context.messages.push(ThreadMessage {
                sender: None,
                content: truncate_chars(&content, 500).to_string(),
                time: None,
            });
        }
    }

    context
}

fn generic_context(snapshot: &PageSnapshot, platform: Platform) -> ConversationContext {
    let mut context = ConversationContext::empty(platform);

    let Some(container) =
        select_first(snapshot.document(), ".chat, .conversation, .messages, .thread")
    else {
        return context;
    };
    let Ok(selector) = Selector::parse(".message, .chat-message, .msg") else {
        return context;
    };

    let bodies: Vec<String> = container
        .select(&selector)
        .map(element_text)
        .filter(|content| content.len() > 10)
        .collect();
    let skip = bodies.len().saturating_sub(GENERIC_MESSAGE_LIMIT);
    for content in bodies.into_iter().skip(skip) {
        context.messages.push(ThreadMessage {
            sender: None,
            content: truncate_chars(&content, 300).to_string(),
            time: None,
        });
    }

    context
}

fn child_text(element: ElementRef<'_>, selectors: &str) -> Option<String> {
    let selector = Selector::parse(selectors).ok()?;
    element
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}
