//! Focus and stacking engine.
//!
//! Stacking values come from [`WindowTable::allocate_z`], a counter that only grows, so `z` is
//! unique among open windows and the most recently raised window is unambiguously frontmost.

use serde::{Deserialize, Serialize};

use crate::{
    error::DesktopError,
    model::{WindowId, WindowPatch, WindowState},
    store::WindowTable,
};

/// Rule used to pick the next active window after the active one closes or is concealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FocusFallback {
    /// Highest `z` among focusable windows.
    #[default]
    HighestZ,
    /// Latest `created_at` among focusable windows.
    MostRecentlyCreated,
    /// Leave the desktop without an active window.
    None,
}

/// What [`focus_window`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusChange {
    pub previous: Option<WindowId>,
    /// State the window was promoted from, when it had to be made visible first.
    pub restored_from: Option<WindowState>,
    pub raised: bool,
}

impl FocusChange {
    pub fn is_noop(&self, window_id: WindowId) -> bool {
        self.previous == Some(window_id) && self.restored_from.is_none() && !self.raised
    }
}

/// Focuses and raises `window_id`.
///
/// Concealed windows are promoted to [`WindowState::Normal`] first. Focusing the active window
/// that is already frontmost changes nothing.
///
/// # Errors
///
/// Returns [`DesktopError::NotFound`] when the window is absent.
pub fn focus_window(table: &mut WindowTable, window_id: WindowId) -> Result<FocusChange, DesktopError> {
    let window = table.require(window_id)?;
    let previous = table.active_id();
    let restored_from = window.state.is_concealed().then_some(window.state);
    let frontmost = table.max_z() == Some(window.z);

    let mut patch = WindowPatch::default();
    if restored_from.is_some() {
        patch = patch.with_state(WindowState::Normal);
    }
    let raised = !frontmost;
    if raised {
        patch = patch.with_z(table.allocate_z());
    }
    table.update(window_id, &patch)?;
    table.set_active(Some(window_id))?;

    Ok(FocusChange {
        previous,
        restored_from,
        raised,
    })
}

/// Picks the replacement focus target according to `policy`, ignoring `exclude`.
pub fn select_focus_candidate(
    table: &WindowTable,
    policy: FocusFallback,
    exclude: Option<WindowId>,
) -> Option<WindowId> {
    let focusable = table
        .windows()
        .filter(|w| w.state.is_focusable() && Some(w.id) != exclude);
    match policy {
        FocusFallback::HighestZ => focusable.max_by_key(|w| w.z).map(|w| w.id),
        FocusFallback::MostRecentlyCreated => focusable
            .max_by_key(|w| (w.created_at, w.id))
            .map(|w| w.id),
        FocusFallback::None => None,
    }
}

/// Re-establishes focus after the active window closed or was concealed.
///
/// Does nothing when a focusable window is still active. The chosen replacement is raised only
/// when a visible window sits above it.
pub fn reassign_focus(table: &mut WindowTable, policy: FocusFallback) -> Result<Option<WindowId>, DesktopError> {
    if let Some(active) = table.active_id() {
        if table.get(active).is_some_and(|w| w.state.is_focusable()) {
            return Ok(Some(active));
        }
    }

    let Some(candidate) = select_focus_candidate(table, policy, None) else {
        table.set_active(None)?;
        return Ok(None);
    };

    let candidate_z = table.require(candidate)?.z;
    let covered = table
        .windows()
        .any(|w| w.state.is_focusable() && w.z > candidate_z);
    if covered {
        let z = table.allocate_z();
        table.update(candidate, &WindowPatch::z(z))?;
    }
    table.set_active(Some(candidate))?;
    Ok(Some(candidate))
}

/// Cycles focus to the back-most focusable window (Alt-Tab style).
///
/// Returns the newly focused window, or `None` when nothing else can take focus.
pub fn focus_next(table: &mut WindowTable) -> Result<Option<WindowId>, DesktopError> {
    let active = table.active_id();
    let Some(target) = table
        .windows()
        .filter(|w| w.state.is_focusable() && Some(w.id) != active)
        .min_by_key(|w| w.z)
        .map(|w| w.id)
    else {
        return Ok(None);
    };
    focus_window(table, target)?;
    Ok(Some(target))
}
