//! Page content classification and article extraction.
//!
//! Classification is a prioritized rule list evaluated top-to-bottom: URL
//! rules, then title rules, then body/selector probes, defaulting to
//! [`ContentKind::Webpage`]. The rules live in declarative tables so they
//! can be unit-tested without a live document.

use scraper::{ElementRef, Selector};
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use sidekick_types::truncate_chars;

use crate::{PageSnapshot, collect_text, element_text, select_count, select_first};

pub const MAIN_CONTENT_LIMIT: usize = 2000;
pub const ARTICLE_TEXT_LIMIT: usize = 3000;
pub const VISIBLE_TEXT_LIMIT: usize = 3000;

const WORDS_PER_MINUTE: usize = 200;
const LONG_ARTICLE_MIN_WORDS: usize = 800;
const MIN_ARTICLE_TEXT_CHARS: usize = 500;
const FALLBACK_PARAGRAPH_COUNT: usize = 10;
const MIN_FALLBACK_PARAGRAPH_CHARS: usize = 50;

/// Coarse classification of what the current page is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Code,
    Forum,
    Documentation,
    Email,
    Article,
    Webpage,
}

impl ContentKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Code => "code",
            ContentKind::Forum => "forum",
            ContentKind::Documentation => "documentation",
            ContentKind::Email => "email",
            ContentKind::Article => "article",
            ContentKind::Webpage => "webpage",
        }
    }
}

/// URL-substring rules, highest priority.
const URL_KIND_RULES: &[(&str, ContentKind)] = &[
    ("github.com", ContentKind::Code),
    ("stackoverflow.com", ContentKind::Forum),
    ("reddit.com", ContentKind::Forum),
];

/// Title-substring rules, checked after URL rules.
const TITLE_KIND_RULES: &[(&str, ContentKind)] =
    &[("documentation", ContentKind::Documentation), ("docs", ContentKind::Documentation)];

/// Structural containers that mark a page as an article.
const ARTICLE_STRUCTURE_SELECTOR: &str = "article, .article, .post, .entry, .content";

/// Ordered container candidates for the main-content excerpt.
const MAIN_CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    ".content",
    ".main-content",
    "#content",
    ".post-content",
    ".entry-content",
];

/// Ordered candidates for summarizable article text.
const ARTICLE_TEXT_SELECTORS: &[&str] = &[
    "article",
    ".article-content",
    ".post-content",
    ".entry-content",
    ".content",
    "main p",
    ".article p",
];

/// Immutable description of the current page, produced once per navigation.
#[derive(Debug, Clone, Serialize)]
pub struct PageAnalysis {
    pub title: String,
    pub url: String,
    pub content_kind: ContentKind,
    pub word_count: usize,
    pub has_code: bool,
    pub language: String,
    pub main_content: String,
    pub is_long_article: bool,
    pub reading_time: String,
    pub article_text: String,
}

/// Analyze the snapshot. Pure read: repeated calls on one snapshot are equal.
#[must_use]
pub fn analyze(snapshot: &PageSnapshot) -> PageAnalysis {
    let body_text = snapshot.body_text();
    let word_count = body_text.unicode_words().count();

    PageAnalysis {
        title: snapshot.title(),
        url: snapshot.url().to_string(),
        content_kind: classify(snapshot, &body_text),
        word_count,
        has_code: select_first(snapshot.document(), "pre, code, .highlight").is_some(),
        language: snapshot.language(),
        main_content: extract_main_content(snapshot, &body_text),
        is_long_article: is_long_article(snapshot, word_count),
        reading_time: reading_time_label(word_count),
        article_text: extract_article_text(snapshot),
    }
}

fn classify(snapshot: &PageSnapshot, body_text: &str) -> ContentKind {
    let url = snapshot.url().as_str();
    for (needle, kind) in URL_KIND_RULES {
        if url.contains(needle) {
            return *kind;
        }
    }

    let title = snapshot.title().to_lowercase();
    for (needle, kind) in TITLE_KIND_RULES {
        if title.contains(needle) {
            return *kind;
        }
    }

    if body_text.to_lowercase().contains("email") || url.contains("mail") {
        return ContentKind::Email;
    }
    if select_first(snapshot.document(), "article").is_some() {
        return ContentKind::Article;
    }
    if select_first(snapshot.document(), "pre, code").is_some() {
        return ContentKind::Code;
    }

    ContentKind::Webpage
}

/// Word count >= 800 and either a structural content container or enough
/// heading/paragraph density. The second path keeps sites without semantic
/// markup eligible.
#[must_use]
pub fn is_long_article(snapshot: &PageSnapshot, word_count: usize) -> bool {
    if word_count < LONG_ARTICLE_MIN_WORDS {
        return false;
    }
    let has_structure = select_first(snapshot.document(), ARTICLE_STRUCTURE_SELECTOR).is_some();
    let heading_count = select_count(snapshot.document(), "h1, h2, h3");
    let paragraph_count = select_count(snapshot.document(), "p");
    has_structure || (heading_count >= 3 && paragraph_count >= 5)
}

/// Display label at 200 words per minute; under one minute floors to
/// `"< 1 min read"`.
#[must_use]
pub fn reading_time_label(word_count: usize) -> String {
    if word_count < WORDS_PER_MINUTE {
        return "< 1 min read".to_string();
    }
    let minutes = word_count.div_ceil(WORDS_PER_MINUTE);
    if minutes == 1 {
        "1 min read".to_string()
    } else {
        format!("{minutes} min read")
    }
}

fn extract_main_content(snapshot: &PageSnapshot, body_text: &str) -> String {
    for selectors in MAIN_CONTENT_SELECTORS {
        if let Some(element) = select_first(snapshot.document(), selectors) {
            let text = element_text(element);
            if !text.is_empty() {
                return truncate_chars(&text, MAIN_CONTENT_LIMIT).to_string();
            }
        }
    }
    truncate_chars(body_text, MAIN_CONTENT_LIMIT).to_string()
}

/// Article text for summarization: first selector whose concatenated
/// paragraph text clears the minimum, else the longest leading paragraphs.
fn extract_article_text(snapshot: &PageSnapshot) -> String {
    for selectors in ARTICLE_TEXT_SELECTORS {
        let Ok(selector) = Selector::parse(selectors) else {
            continue;
        };
        let mut text = String::new();
        for element in snapshot.document().select(&selector) {
            if is_article_text_element(element) {
                let part = element_text(element);
                if !part.is_empty() {
                    text.push_str(&part);
                    text.push_str("\n\n");
                }
            }
        }
        let text = text.trim();
        if text.len() > MIN_ARTICLE_TEXT_CHARS {
            return truncate_chars(text, ARTICLE_TEXT_LIMIT).to_string();
        }
    }

    // Fallback: the first substantial paragraphs anywhere on the page.
    let Ok(selector) = Selector::parse("p") else {
        return String::new();
    };
    let mut text = String::new();
    for element in snapshot.document().select(&selector).take(FALLBACK_PARAGRAPH_COUNT) {
        let part = element_text(element);
        if part.len() > MIN_FALLBACK_PARAGRAPH_CHARS {
            text.push_str(&part);
            text.push_str("\n\n");
        }
    }
    truncate_chars(text.trim(), ARTICLE_TEXT_LIMIT).to_string()
}

fn is_article_text_element(element: ElementRef<'_>) -> bool {
    let tag = element.value().name();
    tag == "p"
        || tag == "article"
        || element
            .value()
            .attr("class")
            .is_some_and(|class| class.split_whitespace().any(|token| token == "content"))
}

/// Broader page context embedded into assist prompts.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub page_kind: String,
    pub description: Option<String>,
    pub headings: Vec<String>,
    pub main_content: String,
    pub visible_text: String,
}

/// Container candidates for the prompt-context excerpt, including the
/// platform-specific surfaces the generic list misses.
const CONTEXT_CONTENT_SELECTORS: &[&str] = &[
    "main",
    ".main-content",
    "#main",
    ".content",
    "article",
    ".post",
    ".page-content",
    ".artdeco-card",
    ".msg-overlay-conversation-bubble",
    "[data-testid=\"primaryColumn\"]",
    ".ii.gt",
];

#[must_use]
pub fn page_context(snapshot: &PageSnapshot) -> PageContext {
    let mut main_content = String::new();
    for selectors in CONTEXT_CONTENT_SELECTORS {
        if let Some(element) = select_first(snapshot.document(), selectors) {
            let text = element_text(element);
            if text.len() > 100 {
                main_content = truncate_chars(&text, MAIN_CONTENT_LIMIT).to_string();
                break;
            }
        }
    }

    let mut headings = Vec::new();
    if let Ok(selector) = Selector::parse("h1, h2, h3, h4") {
        headings = snapshot
            .document()
            .select(&selector)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .take(10)
            .collect();
    }

    PageContext {
        page_kind: page_kind(snapshot).to_string(),
        description: meta_description(snapshot),
        headings,
        main_content,
        visible_text: visible_text(snapshot),
    }
}

fn meta_description(snapshot: &PageSnapshot) -> Option<String> {
    for selectors in [
        "meta[name=\"description\"]",
        "meta[property=\"og:description\"]",
        "meta[name=\"twitter:description\"]",
    ] {
        if let Some(content) = select_first(snapshot.document(), selectors)
            .and_then(|el| el.value().attr("content"))
            .filter(|content| !content.is_empty())
        {
            return Some(content.to_string());
        }
    }
    None
}

/// Host/path page-kind table for the platforms the assist prompts care about.
#[must_use]
pub fn page_kind(snapshot: &PageSnapshot) -> &'static str {
    let host = snapshot.url().host_str().unwrap_or_default().to_lowercase();
    let path = snapshot.url().path().to_lowercase();
    let fragment = snapshot.url().fragment().unwrap_or_default().to_lowercase();

    if host.contains("linkedin.com") {
        return if path.contains("/messaging/") {
            "linkedin-messaging"
        } else if path.contains("/in/") {
            "linkedin-profile"
        } else if path.contains("/jobs/") {
            "linkedin-jobs"
        } else if path.contains("/feed/") {
            "linkedin-feed"
        } else {
            "linkedin-general"
        };
    }
    if host.contains("twitter.com") || host == "x.com" || host.ends_with(".x.com") {
        return if path.contains("/messages/") {
            "twitter-messages"
        } else if path.contains("/compose/") {
            "twitter-compose"
        } else {
            "twitter-feed"
        };
    }
    if host.contains("mail.google.com") || host.contains("gmail.com") {
        return if fragment.contains("compose") {
            "gmail-compose"
        } else if fragment.contains("inbox") {
            "gmail-inbox"
        } else {
            "gmail-general"
        };
    }

    if select_first(snapshot.document(), "form[action*=\"login\"]").is_some() {
        return "login-page";
    }
    if select_first(snapshot.document(), "form[action*=\"contact\"]").is_some() {
        return "contact-page";
    }
    if select_first(snapshot.document(), "article, .article, .post").is_some() {
        return "article-page";
    }
    if select_first(snapshot.document(), ".product, .item, .listing").is_some() {
        return "product-page";
    }
    "general-page"
}

/// Body text with navigation chrome stripped, for prompt context.
fn visible_text(snapshot: &PageSnapshot) -> String {
    let Some(body) = select_first(snapshot.document(), "body") else {
        return String::new();
    };
    let mut out = String::new();
    collect_text(body, &mut out, &|el| {
        if matches!(
            el.value().name(),
            "script" | "style" | "noscript" | "nav" | "header" | "footer"
        ) {
            return true;
        }
        el.value().attr("class").is_some_and(|class| {
            class
                .split_whitespace()
                .any(|token| matches!(token, "ad" | "advertisement" | "sidebar" | "menu"))
        })
    });
    truncate_chars(&crate::collapse_whitespace(&out), VISIBLE_TEXT_LIMIT).to_string()
}
