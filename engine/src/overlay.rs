//! Form-assist overlay lifecycle.
//!
//! The registry is the single writer for overlay state and enforces the
//! global invariant on every show request: at most one form overlay is
//! visible at a time. Focusing a new tracked input closes all others
//! before its overlay is created.
//!
//! Lifecycle timers (all advanced by explicit deltas, never wall clocks):
//!
//! - blur hides after a short grace period, unless the pointer is over the
//!   overlay or its custom-instruction field holds focus
//! - idle auto-dismiss after [`FORM_OVERLAY_IDLE`], re-armed to the shorter
//!   [`FORM_OVERLAY_AFTER_LEAVE`] when the pointer leaves, and reset to the
//!   full interval by every keystroke in the tracked input

use std::collections::HashMap;
use std::time::Duration;

use sidekick_analysis::InputId;
use sidekick_types::{AssistAction, CountdownTimer, InputPurpose, Rect, Viewport};

/// Idle auto-dismiss interval. Per-surface on purpose; see the article and
/// selection presenters for their own values.
pub const FORM_OVERLAY_IDLE: Duration = Duration::from_secs(30);
/// Auto-dismiss interval once the pointer has left the overlay.
pub const FORM_OVERLAY_AFTER_LEAVE: Duration = Duration::from_secs(10);
/// Grace period between input blur and the overlay hiding.
pub const BLUR_GRACE: Duration = Duration::from_millis(150);

const OVERLAY_WIDTH: f64 = 280.0;
const OVERLAY_HEIGHT: f64 = 150.0;
const EDGE_MARGIN: f64 = 20.0;
const ANCHOR_GAP: f64 = 30.0;
const DRAG_MARGIN: f64 = 10.0;

/// One menu entry on the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayAction {
    pub label: &'static str,
    pub action: AssistAction,
}

const fn entry(label: &'static str, action: AssistAction) -> OverlayAction {
    OverlayAction { label, action }
}

/// Action menu for a tracked input, at most three entries.
#[must_use]
pub fn actions_for(
    purpose: InputPurpose,
    is_long_text: bool,
    has_content: bool,
) -> Vec<OverlayAction> {
    let mut actions = match purpose {
        InputPurpose::Search => vec![
            entry("Better Search", AssistAction::ImproveSearch),
            entry("Suggest Terms", AssistAction::SuggestSearch),
            entry("Advanced Query", AssistAction::AdvancedSearch),
        ],
        InputPurpose::SocialPost => vec![
            entry("Draft Tweet", AssistAction::DraftTweet),
            entry("Make Engaging", AssistAction::MakeEngaging),
            entry("Add Hashtags", AssistAction::AddHashtags),
        ],
        InputPurpose::MessageComposition => vec![
            entry("Draft Message", AssistAction::DraftMessage),
            entry("Adjust Tone", AssistAction::AdjustTone),
        ],
        InputPurpose::AiChat => vec![
            entry("Improve Question", AssistAction::ImproveQuestion),
            entry("Make Specific", AssistAction::MakeSpecific),
            entry("Add Context", AssistAction::AddContext),
        ],
        InputPurpose::ReviewWriting => vec![entry("Write Review", AssistAction::WriteReview)],
        InputPurpose::JobApplication => {
            vec![entry("Professional Tone", AssistAction::ProfessionalTone)]
        }
        InputPurpose::SupportRequest | InputPurpose::Bio | InputPurpose::Comment
        | InputPurpose::GeneralText => {
            if is_long_text {
                vec![
                    entry("Improve Text", AssistAction::ImproveText),
                    entry("Expand Ideas", AssistAction::ExpandIdeas),
                ]
            } else {
                Vec::new()
            }
        }
    };

    if has_content && is_long_text {
        actions.push(entry("Polish Text", AssistAction::PolishText));
    }
    if actions.is_empty() {
        actions.push(entry("Get Suggestions", AssistAction::GetSuggestions));
    }
    actions.truncate(3);
    actions
}

/// Where the overlay lands relative to its input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPlacement {
    pub left: f64,
    pub top: f64,
    /// Fell back to the fixed top-right corner instead of hugging the input.
    pub repositioned: bool,
}

/// Pick a placement from the input's rect and the viewport.
///
/// Large inputs (full-page composers) always pin to the top-right corner;
/// single-line inputs prefer sitting beside the field; textareas try right,
/// then left, then the corner.
#[must_use]
pub fn place_overlay(input: Rect, viewport: Viewport) -> OverlayPlacement {
    let corner = OverlayPlacement {
        left: viewport.width - OVERLAY_WIDTH - EDGE_MARGIN,
        top: EDGE_MARGIN,
        repositioned: true,
    };

    let is_large = input.area() > viewport.area() * 0.2 || input.height > viewport.height * 0.5;
    if is_large {
        return corner;
    }

    let fits_right = input.right() + OVERLAY_WIDTH + ANCHOR_GAP < viewport.width;
    let fits_left = input.left - OVERLAY_WIDTH - ANCHOR_GAP > 0.0;

    if input.height < 60.0 {
        // Single line: align with the top of the field.
        let top = (input.top - 10.0).max(10.0);
        if fits_right {
            return OverlayPlacement {
                left: input.right() + ANCHOR_GAP,
                top,
                repositioned: false,
            };
        }
        if fits_left {
            return OverlayPlacement {
                left: input.left - OVERLAY_WIDTH - ANCHOR_GAP,
                top,
                repositioned: false,
            };
        }
        return corner;
    }

    let fits_below = input.top + OVERLAY_HEIGHT < viewport.height;
    let top = input.top.max(10.0);
    if fits_right && fits_below {
        return OverlayPlacement {
            left: input.right() + ANCHOR_GAP,
            top,
            repositioned: false,
        };
    }
    if fits_left && fits_below {
        return OverlayPlacement {
            left: input.left - OVERLAY_WIDTH - ANCHOR_GAP,
            top,
            repositioned: false,
        };
    }
    corner
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    start_x: f64,
    start_y: f64,
    origin_left: f64,
    origin_top: f64,
}

/// State of one visible overlay.
#[derive(Debug)]
pub struct FormOverlay {
    purpose: InputPurpose,
    actions: Vec<OverlayAction>,
    placement: OverlayPlacement,
    hovered: bool,
    custom_focused: bool,
    auto_hide: CountdownTimer,
    blur_grace: CountdownTimer,
    drag: Option<DragState>,
}

impl FormOverlay {
    fn new(purpose: InputPurpose, actions: Vec<OverlayAction>, placement: OverlayPlacement) -> Self {
        let mut auto_hide = CountdownTimer::idle();
        auto_hide.arm(FORM_OVERLAY_IDLE);
        Self {
            purpose,
            actions,
            placement,
            hovered: false,
            custom_focused: false,
            auto_hide,
            blur_grace: CountdownTimer::idle(),
            drag: None,
        }
    }

    #[must_use]
    pub fn purpose(&self) -> InputPurpose {
        self.purpose
    }

    #[must_use]
    pub fn actions(&self) -> &[OverlayAction] {
        &self.actions
    }

    #[must_use]
    pub fn placement(&self) -> OverlayPlacement {
        self.placement
    }

    #[must_use]
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }
}

/// Single-owner registry mapping tracked inputs to their overlay state.
#[derive(Debug, Default)]
pub struct OverlayRegistry {
    overlays: HashMap<InputId, FormOverlay>,
}

impl OverlayRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.overlays.len()
    }

    #[must_use]
    pub fn get(&self, input: InputId) -> Option<&FormOverlay> {
        self.overlays.get(&input)
    }

    /// Show an overlay for a freshly focused input, closing all others
    /// first. Re-focusing an input that already has an overlay keeps it
    /// (and cancels any pending blur grace).
    pub fn show(
        &mut self,
        input: InputId,
        purpose: InputPurpose,
        actions: Vec<OverlayAction>,
        input_rect: Rect,
        viewport: Viewport,
    ) {
        self.overlays.retain(|id, _| *id == input);

        if let Some(existing) = self.overlays.get_mut(&input) {
            existing.blur_grace.disarm();
            existing.auto_hide.arm(FORM_OVERLAY_IDLE);
            return;
        }

        let placement = place_overlay(input_rect, viewport);
        self.overlays
            .insert(input, FormOverlay::new(purpose, actions, placement));
        debug_assert!(self.overlays.len() <= 1);
    }

    /// The tracked input lost focus: start the grace countdown.
    pub fn blur(&mut self, input: InputId) {
        if let Some(overlay) = self.overlays.get_mut(&input) {
            overlay.blur_grace.arm(BLUR_GRACE);
        }
    }

    /// A keystroke inside the tracked input resets the idle countdown.
    pub fn keystroke(&mut self, input: InputId, input_rect: Rect, viewport: Viewport) {
        if let Some(overlay) = self.overlays.get_mut(&input) {
            overlay.auto_hide.arm(FORM_OVERLAY_IDLE);
            // Content growth moves the field; track it unless dragged away.
            if overlay.drag.is_none() && !overlay.placement.repositioned {
                overlay.placement = place_overlay(input_rect, viewport);
            }
        }
    }

    pub fn pointer_enter(&mut self, input: InputId) {
        if let Some(overlay) = self.overlays.get_mut(&input) {
            overlay.hovered = true;
            overlay.auto_hide.disarm();
        }
    }

    pub fn pointer_leave(&mut self, input: InputId) {
        if let Some(overlay) = self.overlays.get_mut(&input) {
            overlay.hovered = false;
            overlay.auto_hide.arm(FORM_OVERLAY_AFTER_LEAVE);
        }
    }

    pub fn custom_field_focus(&mut self, input: InputId, focused: bool) {
        if let Some(overlay) = self.overlays.get_mut(&input) {
            overlay.custom_focused = focused;
            if focused {
                overlay.auto_hide.disarm();
            }
        }
    }

    pub fn start_drag(&mut self, input: InputId, x: f64, y: f64) {
        if let Some(overlay) = self.overlays.get_mut(&input) {
            overlay.drag = Some(DragState {
                start_x: x,
                start_y: y,
                origin_left: overlay.placement.left,
                origin_top: overlay.placement.top,
            });
        }
    }

    /// Move a dragged overlay, clamped inside the viewport.
    pub fn drag_to(&mut self, input: InputId, x: f64, y: f64, viewport: Viewport) {
        if let Some(overlay) = self.overlays.get_mut(&input)
            && let Some(drag) = overlay.drag
        {
            let max_left = viewport.width - OVERLAY_WIDTH - DRAG_MARGIN;
            let max_top = viewport.height - OVERLAY_HEIGHT - DRAG_MARGIN;
            overlay.placement.left = (drag.origin_left + x - drag.start_x)
                .clamp(DRAG_MARGIN, max_left.max(DRAG_MARGIN));
            overlay.placement.top = (drag.origin_top + y - drag.start_y)
                .clamp(DRAG_MARGIN, max_top.max(DRAG_MARGIN));
        }
    }

    pub fn end_drag(&mut self, input: InputId) {
        if let Some(overlay) = self.overlays.get_mut(&input) {
            overlay.drag = None;
        }
    }

    pub fn close(&mut self, input: InputId) {
        self.overlays.remove(&input);
    }

    pub fn close_all(&mut self) {
        self.overlays.clear();
    }

    /// Advance lifecycle timers. Returns the inputs whose overlays closed.
    ///
    /// `focused` is the input that currently holds keyboard focus, if any:
    /// an elapsed idle countdown only dismisses when the tracked input is
    /// not focused and the overlay isn't hovered, and an elapsed blur grace
    /// is ignored while the pointer or custom field would keep it open.
    pub fn advance(&mut self, delta: Duration, focused: Option<InputId>) -> Vec<InputId> {
        let mut closed = Vec::new();
        for (input, overlay) in &mut self.overlays {
            let idle_elapsed = overlay.auto_hide.advance(delta);
            let grace_elapsed = overlay.blur_grace.advance(delta);

            let kept_open = overlay.hovered || overlay.custom_focused;
            let input_focused = focused == Some(*input);

            if grace_elapsed && !kept_open && !input_focused {
                closed.push(*input);
                continue;
            }
            if idle_elapsed && !kept_open && !input_focused {
                closed.push(*input);
            }
        }
        for input in &closed {
            self.overlays.remove(input);
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BLUR_GRACE, FORM_OVERLAY_AFTER_LEAVE, FORM_OVERLAY_IDLE, OverlayRegistry, actions_for,
        place_overlay,
    };
    use sidekick_analysis::InputId;
    use sidekick_types::{InputPurpose, Rect, Viewport};
    use std::time::Duration;

    const VIEWPORT: Viewport = Viewport::new(1280.0, 720.0);

    fn small_rect() -> Rect {
        Rect::new(100.0, 100.0, 200.0, 30.0)
    }

    fn show(registry: &mut OverlayRegistry, input: InputId) {
        let actions = actions_for(InputPurpose::GeneralText, true, false);
        registry.show(input, InputPurpose::GeneralText, actions, small_rect(), VIEWPORT);
    }

    #[test]
    fn at_most_one_overlay_regardless_of_focus_order() {
        let mut registry = OverlayRegistry::new();
        for i in 0..5 {
            show(&mut registry, InputId(i));
            assert_eq!(registry.visible_count(), 1);
        }
        assert!(registry.get(InputId(4)).is_some());
        assert!(registry.get(InputId(0)).is_none());
    }

    #[test]
    fn refocus_keeps_existing_overlay() {
        let mut registry = OverlayRegistry::new();
        show(&mut registry, InputId(1));
        registry.blur(InputId(1));
        show(&mut registry, InputId(1));
        // Grace was cancelled by the re-show.
        assert!(registry.advance(BLUR_GRACE, None).is_empty());
        assert_eq!(registry.visible_count(), 1);
    }

    #[test]
    fn blur_hides_after_grace_period() {
        let mut registry = OverlayRegistry::new();
        show(&mut registry, InputId(1));
        registry.blur(InputId(1));
        assert!(registry.advance(Duration::from_millis(100), None).is_empty());
        let closed = registry.advance(Duration::from_millis(60), None);
        assert_eq!(closed, vec![InputId(1)]);
        assert_eq!(registry.visible_count(), 0);
    }

    #[test]
    fn hover_blocks_blur_hide() {
        let mut registry = OverlayRegistry::new();
        show(&mut registry, InputId(1));
        registry.pointer_enter(InputId(1));
        registry.blur(InputId(1));
        assert!(registry.advance(BLUR_GRACE, None).is_empty());
        assert_eq!(registry.visible_count(), 1);
    }

    #[test]
    fn custom_field_focus_blocks_blur_hide() {
        let mut registry = OverlayRegistry::new();
        show(&mut registry, InputId(1));
        registry.custom_field_focus(InputId(1), true);
        registry.blur(InputId(1));
        assert!(registry.advance(BLUR_GRACE, None).is_empty());
    }

    #[test]
    fn idle_timeout_dismisses_unfocused_overlay() {
        let mut registry = OverlayRegistry::new();
        show(&mut registry, InputId(1));
        let closed = registry.advance(FORM_OVERLAY_IDLE, None);
        assert_eq!(closed, vec![InputId(1)]);
    }

    #[test]
    fn idle_timeout_spares_focused_input() {
        let mut registry = OverlayRegistry::new();
        show(&mut registry, InputId(1));
        assert!(registry.advance(FORM_OVERLAY_IDLE, Some(InputId(1))).is_empty());
    }

    #[test]
    fn pointer_leave_shortens_the_countdown() {
        let mut registry = OverlayRegistry::new();
        show(&mut registry, InputId(1));
        registry.pointer_enter(InputId(1));
        registry.pointer_leave(InputId(1));
        assert!(registry.advance(Duration::from_secs(9), None).is_empty());
        let closed = registry.advance(FORM_OVERLAY_AFTER_LEAVE, None);
        assert_eq!(closed, vec![InputId(1)]);
    }

    #[test]
    fn keystroke_resets_idle_countdown() {
        let mut registry = OverlayRegistry::new();
        show(&mut registry, InputId(1));
        registry.advance(Duration::from_secs(29), Some(InputId(1)));
        registry.keystroke(InputId(1), small_rect(), VIEWPORT);
        // 29s in plus 2s would have crossed the original deadline.
        assert!(registry.advance(Duration::from_secs(2), None).is_empty());
        assert_eq!(registry.visible_count(), 1);
    }

    mod placement {
        use super::{VIEWPORT, place_overlay};
        use sidekick_types::Rect;

        #[test]
        fn single_line_prefers_right_of_input() {
            let placement = place_overlay(Rect::new(100.0, 200.0, 300.0, 30.0), VIEWPORT);
            assert!(!placement.repositioned);
            assert_eq!(placement.left, 430.0);
        }

        #[test]
        fn single_line_near_right_edge_goes_left() {
            let placement = place_overlay(Rect::new(950.0, 200.0, 300.0, 30.0), VIEWPORT);
            assert!(!placement.repositioned);
            assert!(placement.left < 950.0);
        }

        #[test]
        fn huge_composer_pins_to_corner() {
            let placement = place_overlay(Rect::new(0.0, 0.0, 1200.0, 600.0), VIEWPORT);
            assert!(placement.repositioned);
            assert_eq!(placement.top, 20.0);
        }

        #[test]
        fn cramped_viewport_falls_back_to_corner() {
            let viewport = sidekick_types::Viewport::new(400.0, 300.0);
            let placement = place_overlay(Rect::new(50.0, 100.0, 300.0, 100.0), viewport);
            assert!(placement.repositioned);
        }
    }

    mod dragging {
        use super::{OverlayRegistry, VIEWPORT, show};
        use sidekick_analysis::InputId;

        #[test]
        fn drag_moves_and_clamps() {
            let mut registry = OverlayRegistry::new();
            show(&mut registry, InputId(1));
            let before = registry.get(InputId(1)).unwrap().placement();

            registry.start_drag(InputId(1), 500.0, 500.0);
            registry.drag_to(InputId(1), 520.0, 480.0, VIEWPORT);
            let moved = registry.get(InputId(1)).unwrap().placement();
            assert_eq!(moved.left, before.left + 20.0);
            assert_eq!(moved.top, before.top - 20.0);

            // Way off-screen drags clamp to the margin.
            registry.drag_to(InputId(1), -5000.0, -5000.0, VIEWPORT);
            let clamped = registry.get(InputId(1)).unwrap().placement();
            assert_eq!(clamped.left, 10.0);
            assert_eq!(clamped.top, 10.0);
            registry.end_drag(InputId(1));
        }
    }

    mod menus {
        use super::actions_for;
        use sidekick_types::{AssistAction, InputPurpose};

        #[test]
        fn search_menu() {
            let actions = actions_for(InputPurpose::Search, false, false);
            assert_eq!(actions.len(), 3);
            assert_eq!(actions[0].action, AssistAction::ImproveSearch);
        }

        #[test]
        fn menus_are_capped_at_three() {
            for purpose in [
                InputPurpose::Search,
                InputPurpose::SocialPost,
                InputPurpose::MessageComposition,
                InputPurpose::AiChat,
                InputPurpose::ReviewWriting,
                InputPurpose::GeneralText,
            ] {
                assert!(actions_for(purpose, true, true).len() <= 3);
            }
        }

        #[test]
        fn content_adds_polish_for_long_text() {
            let actions = actions_for(InputPurpose::MessageComposition, true, true);
            assert!(actions.iter().any(|a| a.action == AssistAction::PolishText));
        }

        #[test]
        fn empty_menu_falls_back_to_suggestions() {
            let actions = actions_for(InputPurpose::GeneralText, false, false);
            assert_eq!(actions.len(), 1);
            assert_eq!(actions[0].action, AssistAction::GetSuggestions);
        }
    }

    #[test]
    fn close_all_empties_registry() {
        let mut registry = OverlayRegistry::new();
        show(&mut registry, InputId(3));
        registry.close_all();
        assert_eq!(registry.visible_count(), 0);
    }
}
