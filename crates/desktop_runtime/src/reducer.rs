//! Reducer actions, runtime effects, and the transition entry point for the window manager.

use desktop_app_contract::ApplicationId;
use platform_host::Clock;

use crate::{
    apps::AppRegistry,
    config::WindowManagerConfig,
    error::DesktopError,
    lifecycle::{self, LaunchOutcome, LaunchRequest},
    model::{WindowId, WindowState},
    store::WindowTable,
    window_manager::{focus_next, focus_window},
    window_state::{apply_state, StateChange, Transition},
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Actions accepted by [`reduce_desktop`].
pub enum DesktopAction {
    /// Open an app (or restore its singleton window).
    Launch(LaunchRequest),
    /// Close a window by id.
    Close {
        /// Window to close.
        window_id: WindowId,
    },
    /// Open a sibling window of a multi-instance app.
    Duplicate {
        /// Template window.
        window_id: WindowId,
    },
    /// Focus (and raise) a window by id.
    Focus {
        /// Window to focus.
        window_id: WindowId,
    },
    /// Move a window to a new visibility/bounds state.
    SetState {
        /// Target window.
        window_id: WindowId,
        /// Requested state.
        state: WindowState,
    },
    /// Title reported by the hosted app.
    SetTitle {
        /// Reporting window.
        window_id: WindowId,
        /// New display title.
        title: String,
    },
    /// Taskbar click: restore a concealed window, minimize the focused one, otherwise focus.
    ToggleTaskbarWindow {
        /// Window associated with the taskbar button.
        window_id: WindowId,
    },
    /// Cycle focus to the back-most focusable window.
    FocusNext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Observable consequences of a committed action, in the order they happened.
pub enum RuntimeEffect {
    /// A new window was created.
    WindowOpened {
        /// New window.
        window_id: WindowId,
        /// App bound to the window.
        app_id: ApplicationId,
    },
    /// A window was removed.
    WindowClosed {
        /// Removed window.
        window_id: WindowId,
    },
    /// A window changed state.
    StateChanged(StateChange),
    /// A window's display title changed.
    TitleChanged {
        /// Retitled window.
        window_id: WindowId,
    },
    /// `active_id` moved.
    FocusChanged {
        /// Previously active window.
        previous: Option<WindowId>,
        /// Newly active window.
        current: Option<WindowId>,
    },
}

/// Collaborators the reducer reads but never mutates.
pub struct ReduceContext<'a> {
    pub registry: &'a AppRegistry,
    pub clock: &'a dyn Clock,
    pub config: &'a WindowManagerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// Result of a successful [`reduce_desktop`] call.
pub struct Reduction {
    /// Window created, reused or focused by the action, when there is one.
    pub window_id: Option<WindowId>,
    pub effects: Vec<RuntimeEffect>,
}

/// Applies a [`DesktopAction`] to the window table and collects the resulting effects.
///
/// Callers run it against a draft table so a failed action leaves no trace.
///
/// # Errors
///
/// Returns the [`DesktopError`] of the underlying lifecycle, focus or state operation.
pub fn reduce_desktop(
    table: &mut WindowTable,
    ctx: &ReduceContext<'_>,
    action: DesktopAction,
) -> Result<Reduction, DesktopError> {
    let previous_active = table.active_id();
    let mut reduction = Reduction::default();

    match action {
        DesktopAction::Launch(request) => {
            let outcome =
                lifecycle::launch(table, ctx.registry, ctx.clock, ctx.config, request)?;
            match outcome {
                LaunchOutcome::Created(window_id) => {
                    push_opened(table, &mut reduction, window_id);
                }
                LaunchOutcome::Reused {
                    window_id,
                    restored_from: Some(from),
                } => {
                    reduction.effects.push(restored(window_id, from));
                }
                LaunchOutcome::Reused { .. } => {}
            }
            reduction.window_id = Some(outcome.window_id());
        }
        DesktopAction::Close { window_id } => {
            lifecycle::close(table, window_id, ctx.config)?;
            reduction
                .effects
                .push(RuntimeEffect::WindowClosed { window_id });
        }
        DesktopAction::Duplicate { window_id } => {
            let copy =
                lifecycle::duplicate(table, ctx.registry, ctx.clock, ctx.config, window_id)?;
            push_opened(table, &mut reduction, copy);
            reduction.window_id = Some(copy);
        }
        DesktopAction::Focus { window_id } => {
            let change = focus_window(table, window_id)?;
            if let Some(from) = change.restored_from {
                reduction.effects.push(restored(window_id, from));
            }
            reduction.window_id = Some(window_id);
        }
        DesktopAction::SetState { window_id, state } => {
            push_state_change(
                &mut reduction,
                apply_state(table, window_id, state, ctx.config.focus_fallback)?,
            );
        }
        DesktopAction::SetTitle { window_id, title } => {
            if lifecycle::set_title(table, ctx.registry, window_id, &title)? {
                reduction
                    .effects
                    .push(RuntimeEffect::TitleChanged { window_id });
            }
        }
        DesktopAction::ToggleTaskbarWindow { window_id } => {
            let window_state = table.require(window_id)?.state;
            if window_state.is_concealed() {
                return reduce_desktop(table, ctx, DesktopAction::Focus { window_id });
            }
            if previous_active == Some(window_id) {
                return reduce_desktop(
                    table,
                    ctx,
                    DesktopAction::SetState {
                        window_id,
                        state: WindowState::Minimized,
                    },
                );
            }
            return reduce_desktop(table, ctx, DesktopAction::Focus { window_id });
        }
        DesktopAction::FocusNext => {
            reduction.window_id = focus_next(table)?;
        }
    }

    let current_active = table.active_id();
    if current_active != previous_active {
        reduction.effects.push(RuntimeEffect::FocusChanged {
            previous: previous_active,
            current: current_active,
        });
    }
    Ok(reduction)
}

fn push_opened(table: &WindowTable, reduction: &mut Reduction, window_id: WindowId) {
    if let Some(window) = table.get(window_id) {
        reduction.effects.push(RuntimeEffect::WindowOpened {
            window_id,
            app_id: window.app_id.clone(),
        });
    }
}

fn push_state_change(reduction: &mut Reduction, change: StateChange) {
    if change.from != change.to {
        reduction.effects.push(RuntimeEffect::StateChanged(change));
    }
}

fn restored(window_id: WindowId, from: WindowState) -> RuntimeEffect {
    RuntimeEffect::StateChanged(StateChange {
        window_id,
        from,
        to: WindowState::Normal,
        transition: Transition::Restore,
    })
}
