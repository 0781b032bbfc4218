use std::{cell::Cell, rc::Rc};

use desktop_runtime::{
    shell, AppLifecycleEvent, AppRegistry, ApplicationId, DesktopApi, DesktopError, FocusFallback,
    WindowManagerConfig, WindowState,
};
use platform_host::ManualClock;
use pretty_assertions::assert_eq;

fn desktop(config: WindowManagerConfig) -> (DesktopApi, ManualClock) {
    let clock = ManualClock::new(1_700_000_000_000);
    let api = DesktopApi::with_clock(
        AppRegistry::builtin().expect("builtin registry"),
        config,
        Rc::new(clock.clone()),
    );
    (api, clock)
}

fn counter(api: &DesktopApi) -> Rc<Cell<usize>> {
    let calls = Rc::new(Cell::new(0));
    let seen = calls.clone();
    // Kept registered for the lifetime of the api.
    let _ = api.subscribe(move |_| seen.set(seen.get() + 1));
    calls
}

#[test]
fn solitaire_and_viewer_scenario() {
    let (api, _clock) = desktop(WindowManagerConfig::default());

    let a = api.launch("solitaire").unwrap();
    let state = api.get_state();
    assert_eq!(state.window(a).unwrap().state, WindowState::Normal);
    assert_eq!(state.active_id, Some(a));

    assert_eq!(api.launch("solitaire").unwrap(), a);
    assert_eq!(api.get_state().windows_for_app(&ApplicationId::new("solitaire").unwrap()).count(), 1);
    assert_eq!(api.get_state().active_id, Some(a));

    let b = api.launch("gltf-viewer").unwrap();
    let state = api.get_state();
    assert!(state.window(b).unwrap().z > state.window(a).unwrap().z);
    assert_eq!(state.active_id, Some(b));

    api.set_state(a, WindowState::Minimized).unwrap();
    assert_eq!(api.get_state().active_id, Some(b));

    api.focus(a).unwrap();
    let state = api.get_state();
    assert_eq!(state.window(a).unwrap().state, WindowState::Normal);
    assert!(state.window(a).unwrap().z > state.window(b).unwrap().z);
    assert_eq!(state.active_id, Some(a));

    api.close(a).unwrap();
    let state = api.get_state();
    assert_eq!(state.active_id, Some(b));
    assert!(state.window(a).is_none());
}

#[test]
fn repeated_state_request_notifies_once() {
    let (api, _clock) = desktop(WindowManagerConfig::default());
    let id = api.launch("browser").unwrap();
    let calls = counter(&api);

    api.set_state(id, WindowState::Maximized).unwrap();
    let once = api.get_state();
    api.set_state(id, WindowState::Maximized).unwrap();

    assert_eq!(api.get_state(), once);
    assert_eq!(calls.get(), 1);
}

#[test]
fn maximized_and_fullscreen_switch_directly() {
    let (api, _clock) = desktop(WindowManagerConfig::default());
    let id = api.launch("image-editor").unwrap();
    let z = api.get_state().window(id).unwrap().z;

    api.set_state(id, WindowState::Maximized).unwrap();
    api.set_state(id, WindowState::Fullscreen).unwrap();

    let state = api.get_state();
    assert_eq!(state.window(id).unwrap().state, WindowState::Fullscreen);
    assert_eq!(state.window(id).unwrap().z, z);
    assert_eq!(state.active_id, Some(id));
}

#[test]
fn restoring_minimized_window_does_not_grant_focus() {
    let (api, _clock) = desktop(WindowManagerConfig::default());
    let id = api.launch("scatterplot").unwrap();
    api.set_state(id, WindowState::Minimized).unwrap();
    assert_eq!(api.get_state().active_id, None);

    api.set_state(id, WindowState::Normal).unwrap();

    assert_eq!(api.get_state().active_id, None);
    assert_eq!(api.get_state().window(id).unwrap().state, WindowState::Normal);
}

#[test]
fn hidden_window_restores_to_maximized_without_focus() {
    let (api, _clock) = desktop(WindowManagerConfig::default());
    let a = api.launch("browser").unwrap();
    let b = api.launch("browser").unwrap();
    api.set_state(a, WindowState::Hidden).unwrap();

    api.set_state(a, WindowState::Maximized).unwrap();

    let state = api.get_state();
    assert_eq!(state.window(a).unwrap().state, WindowState::Maximized);
    assert_eq!(state.active_id, Some(b));
}

#[test]
fn failures_leave_state_and_listeners_untouched() {
    let (api, _clock) = desktop(WindowManagerConfig::default());
    let solo = api.launch("terminal").unwrap();
    let before = api.get_state();
    let calls = counter(&api);

    assert_eq!(
        api.launch("does-not-exist"),
        Err(DesktopError::AppNotFound("does-not-exist".to_string()))
    );
    assert!(matches!(
        api.duplicate(solo),
        Err(DesktopError::SingletonViolation(_))
    ));
    let missing = desktop_runtime::WindowId(404);
    assert_eq!(api.close(missing), Err(DesktopError::NotFound(missing)));
    assert_eq!(
        api.set_state(missing, WindowState::Hidden),
        Err(DesktopError::NotFound(missing))
    );

    assert_eq!(api.get_state(), before);
    assert_eq!(calls.get(), 0);
}

#[test]
fn duplicate_gets_fresh_identity_and_focus() {
    let (api, clock) = desktop(WindowManagerConfig::default());
    let template = api.launch("browser").unwrap();
    clock.advance(250);

    let copy = api.duplicate(template).unwrap();

    let state = api.get_state();
    let (original, sibling) = (state.window(template).unwrap(), state.window(copy).unwrap());
    assert_ne!(copy, template);
    assert_eq!(sibling.app_id, original.app_id);
    assert_eq!(sibling.created_at, original.created_at + 250);
    assert_eq!(state.active_id, Some(copy));
    assert_eq!(state.frontmost().map(|w| w.id), Some(copy));
}

#[test]
fn unsubscribed_listener_stops_receiving() {
    let (api, _clock) = desktop(WindowManagerConfig::default());
    let calls = Rc::new(Cell::new(0));
    let seen = calls.clone();
    let subscription = api.subscribe(move |_| seen.set(seen.get() + 1));

    let id = api.launch("browser").unwrap();
    subscription.unsubscribe();
    subscription.unsubscribe();
    api.close(id).unwrap();

    assert_eq!(calls.get(), 1);
}

#[test]
fn fallback_policy_controls_focus_after_close() {
    let scenario = |policy| {
        let (api, clock) = desktop(WindowManagerConfig {
            focus_fallback: policy,
            ..WindowManagerConfig::default()
        });
        let a = api.launch("browser").unwrap();
        clock.advance(10);
        let b = api.launch("browser").unwrap();
        clock.advance(10);
        let c = api.launch("browser").unwrap();
        api.focus(a).unwrap();
        api.focus(b).unwrap();
        api.close(b).unwrap();
        (api.get_state().active_id, a, c)
    };

    let (active, a, _) = scenario(FocusFallback::HighestZ);
    assert_eq!(active, Some(a));
    let (active, _, c) = scenario(FocusFallback::MostRecentlyCreated);
    assert_eq!(active, Some(c));
    let (active, _, _) = scenario(FocusFallback::None);
    assert_eq!(active, None);
}

#[test]
fn window_cap_rejects_extra_windows() {
    let (api, _clock) = desktop(WindowManagerConfig {
        max_windows: Some(2),
        ..WindowManagerConfig::default()
    });
    let first = api.launch("browser").unwrap();
    api.duplicate(first).unwrap();
    assert_eq!(
        api.launch("scatterplot"),
        Err(DesktopError::WindowLimitReached { limit: 2 })
    );
    assert_eq!(api.get_state().windows.len(), 2);
}

#[test]
fn taskbar_toggle_round_trip() {
    let (api, _clock) = desktop(WindowManagerConfig::default());
    let a = api.launch("browser").unwrap();
    let b = api.launch("scatterplot").unwrap();

    api.toggle_taskbar(b).unwrap();
    assert_eq!(api.get_state().window(b).unwrap().state, WindowState::Minimized);
    assert_eq!(api.get_state().active_id, Some(a));

    api.toggle_taskbar(b).unwrap();
    assert_eq!(api.get_state().active_id, Some(b));
    assert_eq!(api.focus_next().unwrap(), Some(a));
}

#[test]
fn hosted_app_observes_lifecycle_through_handle() {
    let (api, _clock) = desktop(WindowManagerConfig::default());
    let editor = api.launch("image-editor").unwrap();
    let handle = api.attach(editor).unwrap();
    let other = api.launch("browser").unwrap();
    assert_eq!(handle.lifecycle(), AppLifecycleEvent::Blurred);

    api.set_state(editor, WindowState::Hidden).unwrap();
    assert_eq!(handle.lifecycle(), AppLifecycleEvent::Hidden);
    assert_eq!(api.get_state().active_id, Some(other));

    handle.focus().unwrap();
    assert_eq!(handle.lifecycle(), AppLifecycleEvent::Focused);

    handle.close().unwrap();
    assert_eq!(handle.lifecycle(), AppLifecycleEvent::Closed);
    assert_eq!(api.get_state().active_id, Some(other));
}

#[test]
fn config_file_drives_policy() {
    let config = WindowManagerConfig::from_toml_str("focus_fallback = \"none\"\n").unwrap();
    let (api, _clock) = desktop(config);
    let a = api.launch("browser").unwrap();
    api.launch("browser").unwrap();
    api.focus(a).unwrap();
    api.set_state(a, WindowState::Minimized).unwrap();
    assert_eq!(api.get_state().active_id, None);
}

#[test]
fn command_surface_replays_scenario() {
    let (api, _clock) = desktop(WindowManagerConfig::default());
    for line in [
        "apps open solitaire",
        "apps open solitaire",
        "apps open gltf-viewer",
        "windows minimize win-1",
        "windows focus win-1",
        "windows close win-1",
    ] {
        shell::execute(&api, line).unwrap_or_else(|err| panic!("`{line}` failed: {err}"));
    }

    let state = api.get_state();
    assert_eq!(state.windows.len(), 1);
    assert_eq!(state.active_id.map(|id| id.to_string()), Some("win-2".to_string()));
}

#[test]
fn recording_listener_ends_on_committed_state_after_nested_launch() {
    let (api, _clock) = desktop(WindowManagerConfig::default());
    let nested = api.clone();
    let _launcher = api.subscribe(move |snapshot| {
        if snapshot.windows.len() == 1 {
            nested.launch("gltf-viewer").expect("nested launch");
        }
    });
    let last = Rc::new(std::cell::RefCell::new(None));
    let sink = last.clone();
    let _recorder = api.subscribe(move |snapshot| *sink.borrow_mut() = Some(snapshot.clone()));

    api.launch("solitaire").unwrap();

    assert_eq!(api.get_state().windows.len(), 2);
    assert_eq!(*last.borrow(), Some(api.get_state()));
}

#[test]
fn most_recently_created_fallback_prefers_higher_id_on_equal_timestamps() {
    let (api, _clock) = desktop(WindowManagerConfig {
        focus_fallback: FocusFallback::MostRecentlyCreated,
        ..WindowManagerConfig::default()
    });
    let a = api.launch("browser").unwrap();
    api.launch("browser").unwrap();
    let c = api.launch("browser").unwrap();

    api.focus(a).unwrap();
    api.close(a).unwrap();

    assert_eq!(api.get_state().active_id, Some(c));
}
