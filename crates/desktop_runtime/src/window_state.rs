//! Per-window state machine: `normal`, `minimized`, `maximized`, `fullscreen`, `hidden`.
//!
//! Every pair of states is a legal request. Same-state requests are no-ops, concealing the active
//! window releases focus, and restoring never grants focus on its own.

use desktop_app_contract::AppLifecycleEvent;

use crate::{
    error::DesktopError,
    model::{WindowId, WindowPatch, WindowState},
    store::WindowTable,
    window_manager::{reassign_focus, FocusFallback},
};

/// Classification of a requested state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Target equals the current state.
    Unchanged,
    /// Visible window becomes minimized or hidden.
    Conceal,
    /// Minimized or hidden window becomes visible.
    Restore,
    /// Visible window changes bounds mode (normal, maximized, fullscreen) or a concealed window
    /// switches between minimized and hidden.
    Resize,
}

impl Transition {
    pub fn classify(from: WindowState, to: WindowState) -> Self {
        match (from.is_concealed(), to.is_concealed()) {
            _ if from == to => Self::Unchanged,
            (false, true) => Self::Conceal,
            (true, false) => Self::Restore,
            _ => Self::Resize,
        }
    }
}

/// Outcome of [`apply_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub window_id: WindowId,
    pub from: WindowState,
    pub to: WindowState,
    pub transition: Transition,
}

impl StateChange {
    /// Lifecycle event a hosted app observes for this change, if any.
    pub fn lifecycle_event(&self) -> Option<AppLifecycleEvent> {
        match (self.transition, self.to) {
            (Transition::Unchanged, _) => None,
            (_, WindowState::Minimized) => Some(AppLifecycleEvent::Minimized),
            (_, WindowState::Hidden) => Some(AppLifecycleEvent::Hidden),
            (Transition::Restore, _) => Some(AppLifecycleEvent::Restored),
            _ => None,
        }
    }
}

/// Moves `window_id` to `target`.
///
/// Switching between maximized and fullscreen passes through normal, so the observable result is
/// always exactly `target`. `z` is never touched here.
///
/// # Errors
///
/// Returns [`DesktopError::NotFound`] when the window is absent.
pub fn apply_state(
    table: &mut WindowTable,
    window_id: WindowId,
    target: WindowState,
    fallback: FocusFallback,
) -> Result<StateChange, DesktopError> {
    let from = table.require(window_id)?.state;
    let transition = Transition::classify(from, target);
    let change = StateChange {
        window_id,
        from,
        to: target,
        transition,
    };
    if transition == Transition::Unchanged {
        return Ok(change);
    }

    let was_active = table.active_id() == Some(window_id);
    table.update(window_id, &WindowPatch::state(target))?;
    if transition == Transition::Conceal && was_active {
        reassign_focus(table, fallback)?;
    }
    Ok(change)
}
