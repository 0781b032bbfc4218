//! Desktop API facade: the only mutation surface exposed to the dock, menu bar, search, panels and
//! hosted apps.
//!
//! Every call runs one [`DesktopAction`] through [`reduce_desktop`] against a draft table, commits
//! on success, and only then notifies subscribers. Notification happens after the facade releases
//! its internal borrow, so listeners may call back into the API.
//!
//! Notifications are delivered strictly in commit order. A change committed by a listener is
//! queued and delivered once the current notification has reached every listener, so the last
//! snapshot each listener sees is always the committed state.

use std::{
    cell::RefCell,
    collections::VecDeque,
    rc::Rc,
};

use desktop_app_contract::AppLifecycleEvent;
use platform_host::{Clock, SystemClock};
use tracing::{debug, error};

use crate::{
    app_runtime::{AppRuntimeState, WindowAppSession},
    apps::{AppRegistry, RegistryError},
    config::WindowManagerConfig,
    error::DesktopError,
    lifecycle::LaunchRequest,
    model::{DesktopSnapshot, WindowId, WindowState},
    reducer::{reduce_desktop, DesktopAction, ReduceContext, Reduction},
    store::{Notification, Subscription, WindowStore},
};

struct DesktopRuntime {
    store: WindowStore,
    registry: Rc<AppRegistry>,
    clock: Rc<dyn Clock>,
    config: WindowManagerConfig,
    app_runtime: AppRuntimeState,
}

/// Committed notifications awaiting delivery.
#[derive(Default)]
struct Outbox {
    delivering: bool,
    pending: VecDeque<Notification>,
}

/// Clears the delivering flag even when a listener panics.
struct DrainGuard<'a>(&'a RefCell<Outbox>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.borrow_mut().delivering = false;
    }
}

/// Cheap-to-clone handle to one window manager instance.
///
/// Single-threaded by construction (`!Send`); every method runs to completion synchronously.
#[derive(Clone)]
pub struct DesktopApi {
    inner: Rc<RefCell<DesktopRuntime>>,
    outbox: Rc<RefCell<Outbox>>,
}

impl std::fmt::Debug for DesktopApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let runtime = self.inner.borrow();
        f.debug_struct("DesktopApi")
            .field("windows", &runtime.store.table().len())
            .field("active_id", &runtime.store.table().active_id())
            .field("config", &runtime.config)
            .finish()
    }
}

impl DesktopApi {
    /// Creates a window manager over `registry` using the system clock.
    pub fn new(registry: AppRegistry, config: WindowManagerConfig) -> Self {
        Self::with_clock(registry, config, Rc::new(SystemClock))
    }

    /// Creates a window manager with an injected time source.
    pub fn with_clock(
        registry: AppRegistry,
        config: WindowManagerConfig,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let store = WindowStore::new(registry.list().to_vec());
        Self {
            inner: Rc::new(RefCell::new(DesktopRuntime {
                store,
                registry: Rc::new(registry),
                clock,
                config,
                app_runtime: AppRuntimeState::default(),
            })),
            outbox: Rc::new(RefCell::new(Outbox::default())),
        }
    }

    /// Creates a window manager over the built-in app catalog.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the embedded catalog is inconsistent.
    pub fn builtin(config: WindowManagerConfig) -> Result<Self, RegistryError> {
        Ok(Self::new(AppRegistry::builtin()?, config))
    }

    /// Opens an app, or restores and focuses its running singleton window.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::AppNotFound`] for unknown apps.
    pub fn launch(&self, app_id: impl AsRef<str>) -> Result<WindowId, DesktopError> {
        self.launch_with(LaunchRequest::new(app_id.as_ref()))
    }

    /// Opens an app with extra launch options such as a title override.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::AppNotFound`] for unknown apps and
    /// [`DesktopError::WindowLimitReached`] at the configured cap.
    pub fn launch_with(&self, request: LaunchRequest) -> Result<WindowId, DesktopError> {
        self.dispatch_for_window(DesktopAction::Launch(request))
    }

    /// Closes a window.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::NotFound`] when the window is not open.
    pub fn close(&self, window_id: WindowId) -> Result<(), DesktopError> {
        self.dispatch(DesktopAction::Close { window_id }).map(|_| ())
    }

    /// Opens a sibling window of a multi-instance app and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::NotFound`] or [`DesktopError::SingletonViolation`].
    pub fn duplicate(&self, window_id: WindowId) -> Result<WindowId, DesktopError> {
        self.dispatch_for_window(DesktopAction::Duplicate { window_id })
    }

    /// Focuses and raises a window, making it visible first when needed.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::NotFound`] when the window is not open.
    pub fn focus(&self, window_id: WindowId) -> Result<(), DesktopError> {
        self.dispatch(DesktopAction::Focus { window_id }).map(|_| ())
    }

    /// Moves a window to `state`. Repeating the current state is accepted and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::NotFound`] when the window is not open.
    pub fn set_state(&self, window_id: WindowId, state: WindowState) -> Result<(), DesktopError> {
        self.dispatch(DesktopAction::SetState { window_id, state })
            .map(|_| ())
    }

    /// Records a display title reported by the hosted app.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::NotFound`] when the window is not open.
    pub fn set_title(&self, window_id: WindowId, title: impl Into<String>) -> Result<(), DesktopError> {
        self.dispatch(DesktopAction::SetTitle {
            window_id,
            title: title.into(),
        })
        .map(|_| ())
    }

    /// Taskbar button semantics: restore, minimize when focused, otherwise focus.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::NotFound`] when the window is not open.
    pub fn toggle_taskbar(&self, window_id: WindowId) -> Result<(), DesktopError> {
        self.dispatch(DesktopAction::ToggleTaskbarWindow { window_id })
            .map(|_| ())
    }

    /// Cycles focus to the back-most focusable window and returns it.
    ///
    /// # Errors
    ///
    /// Only fails on internal invariant breaches.
    pub fn focus_next(&self) -> Result<Option<WindowId>, DesktopError> {
        self.dispatch(DesktopAction::FocusNext)
            .map(|reduction| reduction.window_id)
    }

    /// Returns the current snapshot.
    pub fn get_state(&self) -> DesktopSnapshot {
        self.inner.borrow().store.snapshot()
    }

    /// Registers `listener` to run after every committed change.
    pub fn subscribe(&self, listener: impl Fn(&DesktopSnapshot) + 'static) -> Subscription {
        self.inner.borrow().store.subscribe(listener)
    }

    pub fn registry(&self) -> Rc<AppRegistry> {
        self.inner.borrow().registry.clone()
    }

    pub fn config(&self) -> WindowManagerConfig {
        self.inner.borrow().config.clone()
    }

    /// Hands a hosted app its own window id plus this facade.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::NotFound`] when the window is not open.
    pub fn attach(&self, window_id: WindowId) -> Result<AppHandle, DesktopError> {
        let mut runtime = self.inner.borrow_mut();
        runtime.store.table().require(window_id)?;
        let session = runtime.app_runtime.ensure_session(window_id);
        Ok(AppHandle {
            window_id,
            api: self.clone(),
            session,
        })
    }

    /// Latest lifecycle event recorded for a window's hosted app.
    pub fn lifecycle(&self, window_id: WindowId) -> Option<AppLifecycleEvent> {
        self.inner.borrow().app_runtime.lifecycle(window_id)
    }

    fn dispatch_for_window(&self, action: DesktopAction) -> Result<WindowId, DesktopError> {
        let reduction = self.dispatch_checked(action, true)?;
        reduction.window_id.ok_or(DesktopError::InvariantBreach(MISSING_WINDOW_ID))
    }

    fn dispatch(&self, action: DesktopAction) -> Result<Reduction, DesktopError> {
        self.dispatch_checked(action, false)
    }

    /// Reduces and commits one action. With `expects_window`, a reduction that names no window is
    /// rolled back as an invariant breach.
    fn dispatch_checked(
        &self,
        action: DesktopAction,
        expects_window: bool,
    ) -> Result<Reduction, DesktopError> {
        let (reduction, notification) = {
            let mut guard = self.inner.borrow_mut();
            let runtime = &mut *guard;
            let ctx = ReduceContext {
                registry: &runtime.registry,
                clock: runtime.clock.as_ref(),
                config: &runtime.config,
            };
            let label = action_label(&action);
            match runtime
                .store
                .transact(|table| {
                    let reduction = reduce_desktop(table, &ctx, action)?;
                    if expects_window && reduction.window_id.is_none() {
                        return Err(DesktopError::InvariantBreach(MISSING_WINDOW_ID));
                    }
                    Ok(reduction)
                })
            {
                Ok((reduction, notification)) => {
                    runtime.app_runtime.apply_effects(&reduction.effects);
                    runtime.app_runtime.sync_windows(runtime.store.table());
                    debug!(
                        action = label,
                        window_id = ?reduction.window_id,
                        effects = reduction.effects.len(),
                        changed = notification.is_some(),
                        "desktop action committed"
                    );
                    (reduction, notification)
                }
                Err(err) => {
                    if err.is_fatal() {
                        error!(action = label, %err, "window table invariant breached");
                    } else {
                        debug!(action = label, %err, "desktop action rejected");
                    }
                    return Err(err);
                }
            }
        };

        if let Some(notification) = notification {
            self.publish(notification);
        }
        Ok(reduction)
    }

    /// Queues `notification` and, unless a delivery is already running further up the stack,
    /// drains the queue in commit order.
    fn publish(&self, notification: Notification) {
        {
            let mut outbox = self.outbox.borrow_mut();
            outbox.pending.push_back(notification);
            if outbox.delivering {
                return;
            }
            outbox.delivering = true;
        }

        let _draining = DrainGuard(self.outbox.as_ref());
        loop {
            let next = self.outbox.borrow_mut().pending.pop_front();
            let Some(notification) = next else {
                break;
            };
            notification.deliver();
        }
    }
}

const MISSING_WINDOW_ID: &str = "window-creating action produced no window id";

fn action_label(action: &DesktopAction) -> &'static str {
    match action {
        DesktopAction::Launch(_) => "launch",
        DesktopAction::Close { .. } => "close",
        DesktopAction::Duplicate { .. } => "duplicate",
        DesktopAction::Focus { .. } => "focus",
        DesktopAction::SetState { .. } => "set_state",
        DesktopAction::SetTitle { .. } => "set_title",
        DesktopAction::ToggleTaskbarWindow { .. } => "toggle_taskbar",
        DesktopAction::FocusNext => "focus_next",
    }
}

/// What a hosted app receives: its own window id and the facade, never the store.
#[derive(Debug, Clone)]
pub struct AppHandle {
    window_id: WindowId,
    api: DesktopApi,
    session: WindowAppSession,
}

impl AppHandle {
    pub fn window_id(&self) -> WindowId {
        self.window_id
    }

    /// Latest lifecycle event; `Closed` once the window is gone.
    pub fn lifecycle(&self) -> AppLifecycleEvent {
        self.session.lifecycle()
    }

    /// Reports a new display title.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::NotFound`] after the window closed.
    pub fn set_title(&self, title: impl Into<String>) -> Result<(), DesktopError> {
        self.api.set_title(self.window_id, title)
    }

    /// Requests focus for the app's own window.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::NotFound`] after the window closed.
    pub fn focus(&self) -> Result<(), DesktopError> {
        self.api.focus(self.window_id)
    }

    /// Closes the app's own window.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::NotFound`] when the window already closed.
    pub fn close(&self) -> Result<(), DesktopError> {
        self.api.close(self.window_id)
    }

    pub fn api(&self) -> &DesktopApi {
        &self.api
    }
}
