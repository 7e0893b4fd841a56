//! Debounced reaction to DOM mutation notices.
//!
//! Dynamically-rendered editors (chat apps mounting their composer after
//! initial load) must be picked up without re-scanning on every unrelated
//! DOM churn. Mutation notices are filtered for relevance, batched over a
//! fixed window, and drained into a single detection pass when the window
//! elapses. Cancelling clears the pending batch and the timer.

use std::time::Duration;

use scraper::{ElementRef, Html};

use sidekick_types::CountdownTimer;

use crate::detect::is_field_element;

/// Attribute changes that can turn an existing node into an editor.
pub const WATCHED_ATTRIBUTES: &[&str] = &["contenteditable", "role", "data-placeholder"];

/// A change notification from the host page's mutation observer.
#[derive(Debug, Clone)]
pub enum MutationNotice {
    /// A subtree was inserted; carries the inserted markup.
    NodesAdded(String),
    /// An attribute changed somewhere in the document.
    AttributeChanged(String),
}

impl MutationNotice {
    /// Whether this change can affect input detection at all.
    #[must_use]
    pub fn qualifies(&self) -> bool {
        match self {
            MutationNotice::NodesAdded(markup) => {
                let fragment = Html::parse_fragment(markup);
                subtree_has_field(fragment.root_element())
            }
            MutationNotice::AttributeChanged(name) => {
                WATCHED_ATTRIBUTES.contains(&name.to_lowercase().as_str())
            }
        }
    }
}

fn subtree_has_field(element: ElementRef<'_>) -> bool {
    if is_field_element(element) {
        return true;
    }
    element
        .children()
        .any(|child| ElementRef::wrap(child).is_some_and(subtree_has_field))
}

/// Batches qualifying mutation notices over a fixed window.
#[derive(Debug)]
pub struct RescanDebouncer {
    window: Duration,
    timer: CountdownTimer,
    pending: usize,
}

impl RescanDebouncer {
    pub const DEFAULT_WINDOW: Duration = Duration::from_millis(500);

    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            timer: CountdownTimer::idle(),
            pending: 0,
        }
    }

    /// Record a mutation notice. Qualifying notices (re-)arm the window;
    /// everything else is dropped without touching the timer.
    pub fn notice(&mut self, notice: &MutationNotice) -> bool {
        if !notice.qualifies() {
            return false;
        }
        self.pending += 1;
        self.timer.arm(self.window);
        true
    }

    /// Advance time. Returns true when the window elapses with notices
    /// pending - the caller runs one detection pass over a fresh snapshot.
    pub fn advance(&mut self, delta: Duration) -> bool {
        if self.timer.advance(delta) && self.pending > 0 {
            self.pending = 0;
            return true;
        }
        false
    }

    /// Drop the pending batch; the armed window is cleared with it.
    pub fn cancel(&mut self) {
        self.pending = 0;
        self.timer.disarm();
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
    }
}

impl Default for RescanDebouncer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::{MutationNotice, RescanDebouncer};
    use std::time::Duration;

    fn added(markup: &str) -> MutationNotice {
        MutationNotice::NodesAdded(markup.to_string())
    }

    #[test]
    fn editable_subtree_qualifies() {
        assert!(added("<div><textarea></textarea></div>").qualifies());
        assert!(added("<div contenteditable=\"true\"></div>").qualifies());
        assert!(added("<div role=\"textbox\"></div>").qualifies());
    }

    #[test]
    fn inert_subtree_does_not_qualify() {
        assert!(!added("<div><span>hello</span></div>").qualifies());
        assert!(!added("<img src=\"x.png\">").qualifies());
    }

    #[test]
    fn watched_attributes_qualify() {
        assert!(MutationNotice::AttributeChanged("contenteditable".into()).qualifies());
        assert!(MutationNotice::AttributeChanged("Role".into()).qualifies());
        assert!(!MutationNotice::AttributeChanged("style".into()).qualifies());
    }

    #[test]
    fn fires_once_after_window() {
        let mut debouncer = RescanDebouncer::default();
        assert!(debouncer.notice(&added("<textarea></textarea>")));
        assert!(!debouncer.advance(Duration::from_millis(400)));
        assert!(debouncer.advance(Duration::from_millis(100)));
        // Batch drained; nothing further fires.
        assert!(!debouncer.advance(Duration::from_secs(10)));
    }

    #[test]
    fn further_notices_extend_the_window() {
        let mut debouncer = RescanDebouncer::default();
        debouncer.notice(&added("<textarea></textarea>"));
        assert!(!debouncer.advance(Duration::from_millis(400)));
        debouncer.notice(&added("<div role=\"textbox\"></div>"));
        // The original deadline has passed, but the window was re-armed.
        assert!(!debouncer.advance(Duration::from_millis(400)));
        assert!(debouncer.advance(Duration::from_millis(100)));
    }

    #[test]
    fn unrelated_churn_never_arms() {
        let mut debouncer = RescanDebouncer::default();
        assert!(!debouncer.notice(&added("<div><p>text</p></div>")));
        assert!(!debouncer.notice(&MutationNotice::AttributeChanged("class".into())));
        assert!(!debouncer.advance(Duration::from_secs(60)));
    }

    #[test]
    fn cancel_clears_pending_batch() {
        let mut debouncer = RescanDebouncer::default();
        debouncer.notice(&added("<textarea></textarea>"));
        assert_eq!(debouncer.pending(), 1);
        debouncer.cancel();
        assert_eq!(debouncer.pending(), 0);
        assert!(!debouncer.advance(Duration::from_secs(1)));
    }
}
