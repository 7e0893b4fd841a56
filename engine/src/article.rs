//! Floating article overlay for long-form pages.
//!
//! Injected once per navigation when the page qualifies as a long article
//! and a visible anchor exists. No anchor means the overlay is silently
//! skipped - cosmetic feature, logged only.

use std::time::Duration;

use sidekick_analysis::{PageSnapshot, has_element};
use sidekick_types::{CountdownTimer, QuickAction};

/// Idle auto-dismiss interval for the article overlay.
pub const ARTICLE_OVERLAY_IDLE: Duration = Duration::from_secs(15);
/// Auto-dismiss interval after the pointer leaves the overlay.
pub const ARTICLE_OVERLAY_AFTER_LEAVE: Duration = Duration::from_secs(10);

/// Anchor candidates in priority order; the overlay positions itself
/// relative to the first match.
pub const ARTICLE_ANCHOR_SELECTORS: &[&str] = &[
    "article h1",
    "h1.title",
    "h1.post-title",
    "h1.entry-title",
    ".article-title",
    "article",
    ".article",
    ".post",
    ".entry",
    "main h1",
    "h1",
];

/// The two actions the overlay offers.
#[must_use]
pub fn article_actions() -> [QuickAction; 2] {
    [QuickAction::AutoSummarize, QuickAction::Tldr]
}

/// First matching anchor selector for this page, if any.
#[must_use]
pub fn find_article_anchor(snapshot: &PageSnapshot) -> Option<&'static str> {
    ARTICLE_ANCHOR_SELECTORS
        .iter()
        .find(|selectors| has_element(snapshot, selectors))
        .copied()
}

#[derive(Debug)]
struct ArticleOverlay {
    reading_time: String,
    anchor: &'static str,
    auto_hide: CountdownTimer,
    hovered: bool,
}

/// Show/hide lifecycle of the article overlay. At most one exists.
#[derive(Debug, Default)]
pub struct ArticlePresenter {
    overlay: Option<ArticleOverlay>,
}

impl ArticlePresenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.overlay.is_some()
    }

    #[must_use]
    pub fn reading_time(&self) -> Option<&str> {
        self.overlay
            .as_ref()
            .map(|overlay| overlay.reading_time.as_str())
    }

    #[must_use]
    pub fn anchor(&self) -> Option<&'static str> {
        self.overlay.as_ref().map(|overlay| overlay.anchor)
    }

    /// Show the overlay for a qualifying page. Replaces any prior overlay.
    /// Returns false (and logs) when no anchor exists.
    pub fn show(&mut self, snapshot: &PageSnapshot, reading_time: &str) -> bool {
        let Some(anchor) = find_article_anchor(snapshot) else {
            tracing::debug!("No suitable anchor for article overlay; skipping");
            self.overlay = None;
            return false;
        };
        let mut auto_hide = CountdownTimer::idle();
        auto_hide.arm(ARTICLE_OVERLAY_IDLE);
        self.overlay = Some(ArticleOverlay {
            reading_time: reading_time.to_string(),
            anchor,
            auto_hide,
            hovered: false,
        });
        true
    }

    pub fn pointer_enter(&mut self) {
        if let Some(overlay) = &mut self.overlay {
            overlay.hovered = true;
            overlay.auto_hide.disarm();
        }
    }

    pub fn pointer_leave(&mut self) {
        if let Some(overlay) = &mut self.overlay {
            overlay.hovered = false;
            overlay.auto_hide.arm(ARTICLE_OVERLAY_AFTER_LEAVE);
        }
    }

    pub fn dismiss(&mut self) {
        self.overlay = None;
    }

    /// Advance the auto-hide countdown; returns true when the overlay
    /// dismissed itself this tick.
    pub fn advance(&mut self, delta: Duration) -> bool {
        let Some(overlay) = &mut self.overlay else {
            return false;
        };
        if overlay.auto_hide.advance(delta) && !overlay.hovered {
            self.overlay = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::{ARTICLE_OVERLAY_AFTER_LEAVE, ARTICLE_OVERLAY_IDLE, ArticlePresenter};
    use crate::test_support::article_snapshot;
    use sidekick_analysis::PageSnapshot;
    use std::time::Duration;
    use url::Url;

    fn bare_snapshot() -> PageSnapshot {
        PageSnapshot::parse(
            "<html><body><div>nothing anchorable</div></body></html>",
            Url::parse("https://example.com/").unwrap(),
        )
    }

    #[test]
    fn shows_against_article_heading() {
        let mut presenter = ArticlePresenter::new();
        assert!(presenter.show(&article_snapshot(), "4 min read"));
        assert_eq!(presenter.anchor(), Some("article h1"));
        assert_eq!(presenter.reading_time(), Some("4 min read"));
    }

    #[test]
    fn missing_anchor_is_a_silent_skip() {
        let mut presenter = ArticlePresenter::new();
        assert!(!presenter.show(&bare_snapshot(), "4 min read"));
        assert!(!presenter.is_shown());
    }

    #[test]
    fn idle_timeout_dismisses() {
        let mut presenter = ArticlePresenter::new();
        presenter.show(&article_snapshot(), "4 min read");
        assert!(!presenter.advance(Duration::from_secs(14)));
        assert!(presenter.advance(Duration::from_secs(1)));
        assert!(!presenter.is_shown());
    }

    #[test]
    fn hover_pauses_then_leave_rearms_shorter() {
        let mut presenter = ArticlePresenter::new();
        presenter.show(&article_snapshot(), "4 min read");
        presenter.pointer_enter();
        assert!(!presenter.advance(ARTICLE_OVERLAY_IDLE));
        presenter.pointer_leave();
        assert!(!presenter.advance(Duration::from_secs(9)));
        assert!(presenter.advance(ARTICLE_OVERLAY_AFTER_LEAVE));
    }
}
