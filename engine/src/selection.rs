//! Floating selection-action buttons.
//!
//! Buttons appear over a meaningful text selection, track its bounding
//! rectangle, and are always fully removed (never merely hidden) before a
//! new set can be created. The `presenting` flag prevents duplicate
//! concurrent button sets.

use std::time::Duration;

use sidekick_types::{CountdownTimer, Rect, SelectionAction};

/// Minimum selection length before buttons appear.
pub const SELECTION_MIN_CHARS: usize = 5;
/// Auto-hide interval after the buttons appear.
pub const SELECTION_AUTO_HIDE: Duration = Duration::from_secs(10);
/// Re-check interval while the selection persists past the auto-hide.
pub const SELECTION_RECHECK: Duration = Duration::from_secs(5);

const BUTTONS_HALF_WIDTH: f64 = 100.0;
const BUTTONS_OFFSET_ABOVE: f64 = 45.0;

/// The fixed button set.
#[must_use]
pub fn selection_actions() -> [SelectionAction; 4] {
    [
        SelectionAction::Explain,
        SelectionAction::Define,
        SelectionAction::Eli5,
        SelectionAction::Summary,
    ]
}

/// What a selection-change event did to the presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionUpdate {
    Shown,
    Repositioned,
    Removed,
    Unchanged,
}

/// Centered above the selection rectangle.
#[must_use]
pub fn buttons_position(selection: Rect) -> (f64, f64) {
    (
        selection.left + selection.width / 2.0 - BUTTONS_HALF_WIDTH,
        selection.top - BUTTONS_OFFSET_ABOVE,
    )
}

#[derive(Debug, Default)]
pub struct SelectionButtons {
    presenting: bool,
    position: Option<(f64, f64)>,
    auto_hide: CountdownTimer,
}

impl SelectionButtons {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_presenting(&self) -> bool {
        self.presenting
    }

    #[must_use]
    pub fn position(&self) -> Option<(f64, f64)> {
        self.position
    }

    /// React to a selection change. An empty selection removes the buttons
    /// immediately; a meaningful one shows them (if none are up) or tracks
    /// the new rectangle (if they are).
    pub fn on_selection_change(&mut self, selected_text: &str, rect: Option<Rect>) -> SelectionUpdate {
        let text = selected_text.trim();

        if text.is_empty() {
            return if self.remove() {
                SelectionUpdate::Removed
            } else {
                SelectionUpdate::Unchanged
            };
        }

        if text.len() <= SELECTION_MIN_CHARS {
            return SelectionUpdate::Unchanged;
        }
        let Some(rect) = rect else {
            return SelectionUpdate::Unchanged;
        };

        if self.presenting {
            self.position = Some(buttons_position(rect));
            return SelectionUpdate::Repositioned;
        }

        self.presenting = true;
        self.position = Some(buttons_position(rect));
        self.auto_hide.arm(SELECTION_AUTO_HIDE);
        SelectionUpdate::Shown
    }

    /// An action was clicked: the buttons are removed before the prompt
    /// runs, so the next selection starts from a clean slate.
    pub fn on_action(&mut self) {
        self.remove();
    }

    /// Advance the auto-hide machinery. When the countdown elapses the
    /// buttons are removed only if the selection is gone; otherwise the
    /// check repeats on the shorter interval.
    pub fn advance(&mut self, delta: Duration, selection_is_empty: bool) -> SelectionUpdate {
        if !self.auto_hide.advance(delta) {
            return SelectionUpdate::Unchanged;
        }
        if selection_is_empty {
            if self.remove() {
                return SelectionUpdate::Removed;
            }
            return SelectionUpdate::Unchanged;
        }
        self.auto_hide.arm(SELECTION_RECHECK);
        SelectionUpdate::Unchanged
    }

    /// Full removal; returns whether anything was actually up.
    fn remove(&mut self) -> bool {
        self.auto_hide.disarm();
        self.position = None;
        let was_presenting = self.presenting;
        self.presenting = false;
        was_presenting
    }
}
