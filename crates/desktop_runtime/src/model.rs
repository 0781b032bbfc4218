use std::{fmt, str::FromStr};

use desktop_app_contract::{ApplicationId, WindowRuntimeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_WINDOW_WIDTH: u32 = 640;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 480;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "win-{}", self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid window id `{0}`; expected `<n>` or `win-<n>`")]
pub struct ParseWindowIdError(pub String);

impl FromStr for WindowId {
    type Err = ParseWindowIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix("win-").unwrap_or(trimmed);
        digits
            .parse::<u64>()
            .map(WindowId)
            .map_err(|_| ParseWindowIdError(raw.to_string()))
    }
}

impl From<WindowId> for WindowRuntimeId {
    fn from(value: WindowId) -> Self {
        value.0
    }
}

/// Visibility/bounds state of a managed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowState {
    #[default]
    Normal,
    Minimized,
    Maximized,
    Fullscreen,
    Hidden,
}

impl WindowState {
    pub const ALL: [WindowState; 5] = [
        Self::Normal,
        Self::Minimized,
        Self::Maximized,
        Self::Fullscreen,
        Self::Hidden,
    ];

    /// Whether a window in this state may hold focus.
    pub const fn is_focusable(self) -> bool {
        matches!(self, Self::Normal | Self::Maximized | Self::Fullscreen)
    }

    pub const fn is_concealed(self) -> bool {
        !self.is_focusable()
    }

    pub const fn token(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Minimized => "minimized",
            Self::Maximized => "maximized",
            Self::Fullscreen => "fullscreen",
            Self::Hidden => "hidden",
        }
    }
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown window state `{0}`; expected one of normal, minimized, maximized, fullscreen, hidden")]
pub struct ParseWindowStateError(pub String);

impl FromStr for WindowState {
    type Err = ParseWindowStateError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.token() == raw.trim())
            .ok_or_else(|| ParseWindowStateError(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

/// Registry metadata for an installable application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMeta {
    pub id: ApplicationId,
    pub title: String,
    pub icon: String,
    pub singleton: bool,
    pub default_size: WindowSize,
    pub show_in_launcher: bool,
}

impl AppMeta {
    pub fn new(id: ApplicationId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            icon: String::new(),
            singleton: false,
            default_size: WindowSize::default(),
            show_in_launcher: true,
        }
    }

    pub fn singleton(mut self, singleton: bool) -> Self {
        self.singleton = singleton;
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn default_size(mut self, width: u32, height: u32) -> Self {
        self.default_size = WindowSize { width, height };
        self
    }
}

/// One live window bound to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInstance {
    pub id: WindowId,
    pub app_id: ApplicationId,
    pub title: String,
    pub state: WindowState,
    pub z: u64,
    pub created_at: u64,
}

/// Partial update merged into an existing [`WindowInstance`].
///
/// `id`, `app_id` and `created_at` are immutable and therefore not patchable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowPatch {
    pub title: Option<String>,
    pub state: Option<WindowState>,
    pub z: Option<u64>,
}

impl WindowPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn state(state: WindowState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    pub fn z(z: u64) -> Self {
        Self {
            z: Some(z),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: WindowState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_z(mut self, z: u64) -> Self {
        self.z = Some(z);
        self
    }

    /// Merges the patch into `window`, returning `true` when any field changed.
    pub fn apply_to(&self, window: &mut WindowInstance) -> bool {
        let mut changed = false;
        if let Some(title) = &self.title {
            if window.title != *title {
                window.title.clone_from(title);
                changed = true;
            }
        }
        if let Some(state) = self.state {
            changed |= window.state != state;
            window.state = state;
        }
        if let Some(z) = self.z {
            changed |= window.z != z;
            window.z = z;
        }
        changed
    }
}

/// Immutable read of the whole window manager at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopSnapshot {
    pub apps: Vec<AppMeta>,
    /// Open windows ordered back-to-front (ascending `z`).
    pub windows: Vec<WindowInstance>,
    pub active_id: Option<WindowId>,
}

impl DesktopSnapshot {
    pub fn window(&self, window_id: WindowId) -> Option<&WindowInstance> {
        self.windows.iter().find(|w| w.id == window_id)
    }

    pub fn active_window(&self) -> Option<&WindowInstance> {
        self.active_id.and_then(|id| self.window(id))
    }

    /// Highest-`z` window regardless of state.
    pub fn frontmost(&self) -> Option<&WindowInstance> {
        self.windows.iter().max_by_key(|w| w.z)
    }

    pub fn windows_for_app<'a>(
        &'a self,
        app_id: &'a ApplicationId,
    ) -> impl Iterator<Item = &'a WindowInstance> + 'a {
        self.windows.iter().filter(move |w| &w.app_id == app_id)
    }

    pub fn max_z(&self) -> Option<u64> {
        self.windows.iter().map(|w| w.z).max()
    }

    /// Windows in front-to-back stacking order.
    pub fn front_to_back(&self) -> impl Iterator<Item = &WindowInstance> {
        self.windows.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn window(state: WindowState) -> WindowInstance {
        WindowInstance {
            id: WindowId(1),
            app_id: ApplicationId::new("browser").expect("app id"),
            title: "Browser".to_string(),
            state,
            z: 1,
            created_at: 10,
        }
    }

    #[test]
    fn window_id_parses_plain_and_prefixed_forms() {
        assert_eq!("7".parse::<WindowId>(), Ok(WindowId(7)));
        assert_eq!("win-12".parse::<WindowId>(), Ok(WindowId(12)));
        assert!("win-".parse::<WindowId>().is_err());
        assert!("seven".parse::<WindowId>().is_err());
        assert_eq!(WindowId(3).to_string(), "win-3");
    }

    #[test]
    fn window_state_tokens_round_trip() {
        for state in WindowState::ALL {
            assert_eq!(state.token().parse::<WindowState>(), Ok(state));
        }
        assert_eq!(
            "iconified".parse::<WindowState>(),
            Err(ParseWindowStateError("iconified".to_string()))
        );
        assert!(WindowState::Fullscreen.is_focusable());
        assert!(WindowState::Hidden.is_concealed());
    }

    #[test]
    fn patch_reports_change_only_when_fields_differ() {
        let mut win = window(WindowState::Normal);
        assert!(!WindowPatch::state(WindowState::Normal).apply_to(&mut win));
        assert!(!WindowPatch::title("Browser").apply_to(&mut win));
        assert!(WindowPatch::title("Docs - Browser")
            .with_state(WindowState::Maximized)
            .apply_to(&mut win));
        assert_eq!(win.title, "Docs - Browser");
        assert_eq!(win.state, WindowState::Maximized);
        assert_eq!(win.created_at, 10);
    }
}
