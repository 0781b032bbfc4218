//! Runtime app-session state owned by the desktop shell.
//!
//! Each open window has a session cell holding the latest [`AppLifecycleEvent`] its hosted app
//! should observe. Sessions are derived from reducer effects and dropped when the window closes.

use std::{cell::Cell, collections::HashMap, rc::Rc};

use desktop_app_contract::AppLifecycleEvent;

use crate::{model::WindowId, reducer::RuntimeEffect, store::WindowTable};

#[derive(Debug, Clone)]
/// Shared lifecycle cell for one window.
pub struct WindowAppSession {
    lifecycle: Rc<Cell<AppLifecycleEvent>>,
}

impl WindowAppSession {
    fn mounted() -> Self {
        Self {
            lifecycle: Rc::new(Cell::new(AppLifecycleEvent::Mounted)),
        }
    }

    pub fn lifecycle(&self) -> AppLifecycleEvent {
        self.lifecycle.get()
    }

    fn set(&self, event: AppLifecycleEvent) {
        self.lifecycle.set(event);
    }
}

#[derive(Debug, Default)]
/// Runtime-owned app sessions keyed by window.
pub struct AppRuntimeState {
    sessions: HashMap<WindowId, WindowAppSession>,
}

impl AppRuntimeState {
    pub fn ensure_session(&mut self, window_id: WindowId) -> WindowAppSession {
        self.sessions
            .entry(window_id)
            .or_insert_with(WindowAppSession::mounted)
            .clone()
    }

    pub fn session(&self, window_id: WindowId) -> Option<&WindowAppSession> {
        self.sessions.get(&window_id)
    }

    pub fn lifecycle(&self, window_id: WindowId) -> Option<AppLifecycleEvent> {
        self.session(window_id).map(WindowAppSession::lifecycle)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Folds committed effects into the session table, in order.
    pub fn apply_effects(&mut self, effects: &[RuntimeEffect]) {
        for effect in effects {
            match effect {
                RuntimeEffect::WindowOpened { window_id, .. } => {
                    self.ensure_session(*window_id);
                }
                RuntimeEffect::WindowClosed { window_id } => {
                    if let Some(session) = self.sessions.remove(window_id) {
                        session.set(AppLifecycleEvent::Closed);
                    }
                }
                RuntimeEffect::StateChanged(change) => {
                    if let Some(event) = change.lifecycle_event() {
                        self.ensure_session(change.window_id).set(event);
                    }
                }
                RuntimeEffect::FocusChanged { previous, current } => {
                    if let Some(session) = previous.and_then(|id| self.sessions.get(&id)) {
                        if !session.lifecycle().is_concealed() {
                            session.set(AppLifecycleEvent::Blurred);
                        }
                    }
                    if let Some(id) = current {
                        self.ensure_session(*id).set(AppLifecycleEvent::Focused);
                    }
                }
                RuntimeEffect::TitleChanged { .. } => {}
            }
        }
    }

    /// Drops sessions for windows that are no longer in `table`.
    pub fn sync_windows(&mut self, table: &WindowTable) {
        self.sessions.retain(|window_id, session| {
            let alive = table.contains(*window_id);
            if !alive {
                session.set(AppLifecycleEvent::Closed);
            }
            alive
        });
    }
}
