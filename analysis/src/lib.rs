//! Read-only analysis of the host page.
//!
//! Everything in this crate operates on a [`PageSnapshot`]: a parsed HTML
//! document plus the page URL. Snapshots are taken once per navigation (and
//! again when the mutation debouncer fires); analysis never mutates the
//! document and never caches across snapshots.
//!
//! - [`page`] - content classification, reading time, article extraction
//! - [`detect`] - editable-surface enumeration and purpose classification
//! - [`conversation`] - messaging-thread context for prompt construction
//! - [`rescan`] - the debounced reaction to DOM mutation notices

pub mod conversation;
pub mod detect;
pub mod page;
pub mod rescan;

use scraper::{ElementRef, Html, Selector};
use url::Url;

pub use conversation::{ConversationContext, Platform, ThreadKind, ThreadMessage, conversation_context};
pub use detect::{DetectedInput, InputId, InputKind, detect_inputs};
pub use page::{ContentKind, PageAnalysis, PageContext, analyze, page_context};
pub use rescan::{MutationNotice, RescanDebouncer};

/// Parsed document state for one navigation.
pub struct PageSnapshot {
    document: Html,
    url: Url,
}

impl PageSnapshot {
    #[must_use]
    pub fn parse(html: &str, url: Url) -> Self {
        Self {
            document: Html::parse_document(html),
            url,
        }
    }

    #[must_use]
    pub fn document(&self) -> &Html {
        &self.document
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Page title from `<title>`, whitespace-collapsed.
    #[must_use]
    pub fn title(&self) -> String {
        select_first(&self.document, "title")
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .unwrap_or_default()
    }

    /// Language from `<html lang>`, defaulting to `"en"`.
    #[must_use]
    pub fn language(&self) -> String {
        select_first(&self.document, "html")
            .and_then(|el| el.value().attr("lang"))
            .filter(|lang| !lang.is_empty())
            .map_or_else(|| "en".to_string(), String::from)
    }

    /// All body text, whitespace-collapsed, with script/style stripped.
    #[must_use]
    pub fn body_text(&self) -> String {
        let Some(body) = select_first(&self.document, "body") else {
            return String::new();
        };
        let mut out = String::new();
        collect_text(body, &mut out, &|el| {
            matches!(el.value().name(), "script" | "style" | "noscript")
        });
        collapse_whitespace(&out)
    }
}

/// First element matching a fixed selector string.
pub(crate) fn select_first<'a>(document: &'a Html, selectors: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selectors).ok()?;
    document.select(&selector).next()
}

/// Whether anything on the page matches the selector list.
#[must_use]
pub fn has_element(snapshot: &PageSnapshot, selectors: &str) -> bool {
    select_first(&snapshot.document, selectors).is_some()
}

pub(crate) fn select_count(document: &Html, selectors: &str) -> usize {
    Selector::parse(selectors)
        .map(|selector| document.select(&selector).count())
        .unwrap_or(0)
}

/// Recursively collect text, skipping subtrees where `skip` matches.
pub(crate) fn collect_text(
    element: ElementRef<'_>,
    out: &mut String,
    skip: &dyn Fn(ElementRef<'_>) -> bool,
) {
    if skip(element) {
        return;
    }
    for child in element.children() {
        if let Some(el) = ElementRef::wrap(child) {
            collect_text(el, out, skip);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        }
    }
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Inner text of an element, collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

#[cfg(test)]
pub(crate) fn snapshot(html: &str, url: &str) -> PageSnapshot {
    PageSnapshot::parse(html, Url::parse(url).expect("test url"))
}

#[cfg(test)]
mod tests {
    use super::snapshot;

    #[test]
    fn title_and_language() {
        let snap = snapshot(
            "<html lang=\"de\"><head><title>  A   Title </title></head><body></body></html>",
            "https://example.com/",
        );
        assert_eq!(snap.title(), "A Title");
        assert_eq!(snap.language(), "de");
    }

    #[test]
    fn language_defaults_to_english() {
        let snap = snapshot("<html><body></body></html>", "https://example.com/");
        assert_eq!(snap.language(), "en");
    }

    #[test]
    fn body_text_skips_script_and_style() {
        let snap = snapshot(
            "<html><body><p>visible</p><script>var x = 1;</script><style>p{}</style></body></html>",
            "https://example.com/",
        );
        assert_eq!(snap.body_text(), "visible");
    }
}
