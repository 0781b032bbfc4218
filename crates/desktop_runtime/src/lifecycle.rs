//! Lifecycle controller: launch, close, duplicate and title reports.

use platform_host::Clock;
use serde::{Deserialize, Serialize};

use crate::{
    apps::AppRegistry,
    config::WindowManagerConfig,
    error::DesktopError,
    model::{AppMeta, WindowId, WindowInstance, WindowPatch, WindowState},
    store::WindowTable,
    window_manager::{focus_window, reassign_focus},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Intent to open an app, as issued by the dock, search or deep links.
pub struct LaunchRequest {
    pub app_id: String,
    /// Overrides the registry title for a newly created window.
    pub title: Option<String>,
}

impl LaunchRequest {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// A new window was created and focused.
    Created(WindowId),
    /// A singleton app was already running; its window was restored and focused.
    Reused {
        window_id: WindowId,
        restored_from: Option<WindowState>,
    },
}

impl LaunchOutcome {
    pub fn window_id(self) -> WindowId {
        match self {
            Self::Created(window_id) | Self::Reused { window_id, .. } => window_id,
        }
    }
}

/// Opens `request.app_id`, or restores the live instance of a singleton app.
///
/// Exactly one window is active when this returns `Ok`. A title override is ignored when an
/// existing singleton window is reused.
///
/// # Errors
///
/// Returns [`DesktopError::AppNotFound`] for unknown apps and
/// [`DesktopError::WindowLimitReached`] when the configured cap is hit.
pub fn launch(
    table: &mut WindowTable,
    registry: &AppRegistry,
    clock: &dyn Clock,
    config: &WindowManagerConfig,
    request: LaunchRequest,
) -> Result<LaunchOutcome, DesktopError> {
    let meta = registry.require(&request.app_id)?;

    if meta.singleton {
        let existing = table
            .windows()
            .find(|w| w.app_id == meta.id)
            .map(|w| w.id);
        if let Some(window_id) = existing {
            let change = focus_window(table, window_id)?;
            return Ok(LaunchOutcome::Reused {
                window_id,
                restored_from: change.restored_from,
            });
        }
    }

    let title = request
        .title
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| meta.title.clone());
    open_instance(table, meta, clock, config, title).map(LaunchOutcome::Created)
}

/// Removes a window. When it was active, focus moves to the configured fallback.
///
/// # Errors
///
/// Returns [`DesktopError::NotFound`] when the window is absent.
pub fn close(
    table: &mut WindowTable,
    window_id: WindowId,
    config: &WindowManagerConfig,
) -> Result<WindowInstance, DesktopError> {
    let was_active = table.active_id() == Some(window_id);
    let removed = table.remove(window_id)?;
    if was_active {
        reassign_focus(table, config.focus_fallback)?;
    }
    Ok(removed)
}

/// Opens a sibling window of the same app with a fresh id, `z` and creation time.
///
/// The sibling starts with the template's current title; copying hosted content is up to the app.
///
/// # Errors
///
/// Returns [`DesktopError::NotFound`] for a missing template, [`DesktopError::SingletonViolation`]
/// for single-instance apps, and [`DesktopError::WindowLimitReached`] at the configured cap.
pub fn duplicate(
    table: &mut WindowTable,
    registry: &AppRegistry,
    clock: &dyn Clock,
    config: &WindowManagerConfig,
    window_id: WindowId,
) -> Result<WindowId, DesktopError> {
    let template = table.require(window_id)?;
    let meta = registry.require(template.app_id.as_str())?;
    if meta.singleton {
        return Err(DesktopError::SingletonViolation(meta.id.clone()));
    }
    let title = template.title.clone();
    open_instance(table, meta, clock, config, title)
}

/// Applies a title reported by the hosted app. Blank titles fall back to the registry title.
///
/// Returns whether the title changed.
///
/// # Errors
///
/// Returns [`DesktopError::NotFound`] when the window is absent.
pub fn set_title(
    table: &mut WindowTable,
    registry: &AppRegistry,
    window_id: WindowId,
    title: &str,
) -> Result<bool, DesktopError> {
    let window = table.require(window_id)?;
    let title = match title.trim() {
        "" => registry
            .get(&window.app_id)
            .map(|meta| meta.title.clone())
            .unwrap_or_else(|| window.app_id.to_string()),
        trimmed => trimmed.to_string(),
    };
    table.update(window_id, &WindowPatch::title(title))
}

fn open_instance(
    table: &mut WindowTable,
    meta: &AppMeta,
    clock: &dyn Clock,
    config: &WindowManagerConfig,
    title: String,
) -> Result<WindowId, DesktopError> {
    if let Some(limit) = config.max_windows {
        if table.len() >= limit {
            return Err(DesktopError::WindowLimitReached { limit });
        }
    }

    let window_id = table.allocate_window_id();
    let z = table.allocate_z();
    table.insert(WindowInstance {
        id: window_id,
        app_id: meta.id.clone(),
        title,
        state: WindowState::Normal,
        z,
        created_at: clock.now_ms(),
    })?;
    focus_window(table, window_id)?;
    Ok(window_id)
}

#[cfg(test)]
mod tests {
    use desktop_app_contract::ApplicationId;
    use platform_host::ManualClock;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::window_state::apply_state;

    struct Fixture {
        table: WindowTable,
        registry: AppRegistry,
        clock: ManualClock,
        config: WindowManagerConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = AppRegistry::from_entries([
                AppMeta::new(ApplicationId::new("solitaire").unwrap(), "Solitaire").singleton(true),
                AppMeta::new(ApplicationId::new("browser").unwrap(), "Browser"),
            ])
            .expect("registry");
            Self {
                table: WindowTable::default(),
                registry,
                clock: ManualClock::new(1_000),
                config: WindowManagerConfig::default(),
            }
        }

        fn launch(&mut self, app_id: &str) -> Result<LaunchOutcome, DesktopError> {
            self.clock.advance(10);
            launch(
                &mut self.table,
                &self.registry,
                &self.clock,
                &self.config,
                LaunchRequest::new(app_id),
            )
        }
    }

    #[test]
    fn launch_creates_focused_normal_window() {
        let mut fx = Fixture::new();
        let id = fx.launch("browser").unwrap().window_id();
        let window = fx.table.get(id).unwrap();

        assert_eq!(window.state, WindowState::Normal);
        assert_eq!(window.title, "Browser");
        assert_eq!(window.created_at, 1_010);
        assert_eq!(fx.table.active_id(), Some(id));
    }

    #[test]
    fn launch_unknown_app_fails_without_mutation() {
        let mut fx = Fixture::new();
        let before = fx.table.clone();
        assert_eq!(
            fx.launch("minesweeper"),
            Err(DesktopError::AppNotFound("minesweeper".to_string()))
        );
        assert_eq!(fx.table, before);
    }

    #[test]
    fn singleton_launch_restores_existing_instance() {
        let mut fx = Fixture::new();
        let first = fx.launch("solitaire").unwrap().window_id();
        apply_state(
            &mut fx.table,
            first,
            WindowState::Minimized,
            fx.config.focus_fallback,
        )
        .unwrap();

        let outcome = fx.launch("solitaire").unwrap();

        assert_eq!(
            outcome,
            LaunchOutcome::Reused {
                window_id: first,
                restored_from: Some(WindowState::Minimized),
            }
        );
        assert_eq!(fx.table.len(), 1);
        assert_eq!(fx.table.active_id(), Some(first));
        assert_eq!(fx.table.get(first).unwrap().state, WindowState::Normal);
    }

    #[test]
    fn title_override_applies_to_new_windows() {
        let mut fx = Fixture::new();
        let outcome = launch(
            &mut fx.table,
            &fx.registry,
            &fx.clock,
            &fx.config,
            LaunchRequest::new("browser").with_title("Docs"),
        )
        .unwrap();
        assert_eq!(fx.table.get(outcome.window_id()).unwrap().title, "Docs");
    }

    #[test]
    fn close_active_hands_focus_to_highest_remaining() {
        let mut fx = Fixture::new();
        let a = fx.launch("browser").unwrap().window_id();
        let b = fx.launch("browser").unwrap().window_id();
        let c = fx.launch("solitaire").unwrap().window_id();
        apply_state(&mut fx.table, b, WindowState::Hidden, fx.config.focus_fallback).unwrap();
        assert_eq!(fx.table.active_id(), Some(c));

        let closed = close(&mut fx.table, c, &fx.config).unwrap();

        assert_eq!(closed.id, c);
        assert_eq!(fx.table.active_id(), Some(a));
    }

    #[test]
    fn closing_inactive_window_keeps_focus() {
        let mut fx = Fixture::new();
        let a = fx.launch("browser").unwrap().window_id();
        let b = fx.launch("browser").unwrap().window_id();
        close(&mut fx.table, a, &fx.config).unwrap();
        assert_eq!(fx.table.active_id(), Some(b));
        assert_eq!(
            close(&mut fx.table, a, &fx.config),
            Err(DesktopError::NotFound(a))
        );
    }

    #[test]
    fn duplicate_clones_template_with_fresh_identity() {
        let mut fx = Fixture::new();
        let template = fx.launch("browser").unwrap().window_id();
        set_title(&mut fx.table, &fx.registry, template, "News - Browser").unwrap();
        fx.clock.advance(5);

        let copy = duplicate(&mut fx.table, &fx.registry, &fx.clock, &fx.config, template).unwrap();

        let original = fx.table.get(template).unwrap().clone();
        let sibling = fx.table.get(copy).unwrap();
        assert_ne!(copy, template);
        assert_eq!(sibling.app_id, original.app_id);
        assert_eq!(sibling.title, "News - Browser");
        assert!(sibling.z > original.z);
        assert!(sibling.created_at > original.created_at);
        assert_eq!(fx.table.active_id(), Some(copy));
    }

    #[test]
    fn duplicate_singleton_is_rejected() {
        let mut fx = Fixture::new();
        let id = fx.launch("solitaire").unwrap().window_id();
        let err = duplicate(&mut fx.table, &fx.registry, &fx.clock, &fx.config, id).unwrap_err();
        assert!(matches!(err, DesktopError::SingletonViolation(app) if app.as_str() == "solitaire"));
    }

    #[test]
    fn window_limit_blocks_new_windows_but_not_singleton_reuse() {
        let mut fx = Fixture::new();
        fx.config.max_windows = Some(1);
        fx.launch("solitaire").unwrap();
        assert_eq!(
            fx.launch("browser"),
            Err(DesktopError::WindowLimitReached { limit: 1 })
        );
        assert!(fx.launch("solitaire").is_ok());
    }

    #[test]
    fn blank_title_report_falls_back_to_registry_title() {
        let mut fx = Fixture::new();
        let id = fx.launch("browser").unwrap().window_id();
        assert!(set_title(&mut fx.table, &fx.registry, id, "  Inbox  ").unwrap());
        assert_eq!(fx.table.get(id).unwrap().title, "Inbox");
        assert!(set_title(&mut fx.table, &fx.registry, id, "   ").unwrap());
        assert_eq!(fx.table.get(id).unwrap().title, "Browser");
        assert!(!set_title(&mut fx.table, &fx.registry, id, "Browser").unwrap());
    }
}
