//! Sidekick's coordination layer.
//!
//! # Architecture
//!
//! - [`session`] - routes prompts to the on-device model or the hosted API,
//!   owning the page's single lazily-created local session
//! - [`prompt`] - pure templating from actions and page/conversation context
//! - [`sidebar`] - the persistent panel's visibility and render states
//! - [`overlay`] - the form-assist overlay registry (global at-most-one
//!   invariant lives here)
//! - [`selection`] - floating selection-action buttons
//! - [`article`] - the long-article overlay
//! - [`commands`] - the host-environment command vocabulary
//! - [`app`] - [`Assistant`], the per-page aggregate wiring it all together
//!
//! Everything timer-driven advances by explicit `Duration` deltas, so the
//! whole layer is deterministic under test. All model-call failures are
//! rendered by the sidebar; none escape as panics or silent broken states.

pub mod app;
pub mod article;
pub mod commands;
pub mod overlay;
pub mod prompt;
pub mod selection;
pub mod session;
pub mod sidebar;

pub use app::{Assistant, FillBack};
pub use commands::{HostCommand, ProbeResponse, ShortcutCommand};
pub use overlay::{OverlayRegistry, actions_for, place_overlay};
pub use prompt::{PromptContext, build_prompt, quick_action_prompt, selection_prompt};
pub use selection::{SelectionButtons, SelectionUpdate};
pub use session::{AskError, SessionRouter};
pub use sidebar::{AiStatus, ResponseView, Sidebar};
