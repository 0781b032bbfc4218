//! Line-oriented command surface over the [`DesktopApi`] used by the terminal app and the console
//! host.

use serde::{Deserialize, Serialize};
use tabled::{builder::Builder, settings::Style};
use thiserror::Error;

use crate::{
    api::DesktopApi,
    error::DesktopError,
    lifecycle::LaunchRequest,
    model::{WindowId, WindowState},
};

/// Structured shell error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShellErrorCode {
    /// User input violated command usage.
    Usage,
    /// The command, app or window was not found.
    NotFound,
    /// The window manager refused the operation.
    Rejected,
}

/// Error emitted by command parsing or execution.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ShellError {
    pub code: ShellErrorCode,
    pub message: String,
}

impl ShellError {
    pub fn new(code: ShellErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Converts the error into a conventional exit code.
    pub fn exit_code(&self) -> i32 {
        match self.code {
            ShellErrorCode::Usage => 2,
            ShellErrorCode::NotFound => 3,
            ShellErrorCode::Rejected => 4,
        }
    }
}

impl From<DesktopError> for ShellError {
    fn from(err: DesktopError) -> Self {
        let code = match err {
            DesktopError::AppNotFound(_) | DesktopError::NotFound(_) => ShellErrorCode::NotFound,
            DesktopError::SingletonViolation(_)
            | DesktopError::DuplicateId(_)
            | DesktopError::InvariantBreach(_)
            | DesktopError::WindowLimitReached { .. } => ShellErrorCode::Rejected,
        };
        Self::new(code, err.to_string())
    }
}

const HELP: &[(&str, &str)] = &[
    ("apps list", "List registered apps."),
    ("apps open <app-id>", "Launch an app or restore its singleton window."),
    ("windows list", "List open windows, frontmost first."),
    ("windows focus <window-id>", "Focus and raise a window."),
    ("windows close <window-id>", "Close a window."),
    ("windows minimize <window-id>", "Minimize a window."),
    ("windows maximize <window-id>", "Maximize a window."),
    ("windows fullscreen <window-id>", "Make a window fullscreen."),
    ("windows hide <window-id>", "Hide a window without closing it."),
    ("windows restore <window-id>", "Return a window to its normal state."),
    ("windows duplicate <window-id>", "Open a sibling window of the same app."),
    ("windows title <window-id> <title...>", "Set a window title."),
    ("snapshot", "Print the desktop snapshot as JSON."),
    ("help", "Show this help."),
];

/// Runs one command line against `api` and returns its textual output.
///
/// Blank lines produce empty output.
///
/// # Errors
///
/// Returns [`ShellError`] for malformed input, unknown targets or rejected operations.
pub fn execute(api: &DesktopApi, line: &str) -> Result<String, ShellError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        [] => Ok(String::new()),
        ["help"] => Ok(help_text()),
        ["snapshot"] => serde_json::to_string_pretty(&api.get_state())
            .map_err(|err| ShellError::new(ShellErrorCode::Rejected, err.to_string())),
        ["apps", "list"] => Ok(apps_table(api)),
        ["apps", "open", app_id] => {
            let window_id = api.launch(app_id)?;
            Ok(format!("apps open {app_id} -> {window_id}"))
        }
        ["apps", "open", app_id, title @ ..] => {
            let window_id = api.launch_with(LaunchRequest::new(*app_id).with_title(title.join(" ")))?;
            Ok(format!("apps open {app_id} -> {window_id}"))
        }
        ["windows", "list"] => Ok(windows_table(api)),
        ["windows", "duplicate", raw] => {
            let window_id = parse_window_id(raw)?;
            let copy = api.duplicate(window_id)?;
            Ok(format!("windows duplicate {window_id} -> {copy}"))
        }
        ["windows", "title", raw, title @ ..] if !title.is_empty() => {
            let window_id = parse_window_id(raw)?;
            api.set_title(window_id, title.join(" "))?;
            Ok(format!("windows title {window_id}"))
        }
        ["windows", verb, raw] => {
            let window_id = parse_window_id(raw)?;
            match *verb {
                "focus" => api.focus(window_id)?,
                "close" => api.close(window_id)?,
                "minimize" => api.set_state(window_id, WindowState::Minimized)?,
                "maximize" => api.set_state(window_id, WindowState::Maximized)?,
                "fullscreen" => api.set_state(window_id, WindowState::Fullscreen)?,
                "hide" => api.set_state(window_id, WindowState::Hidden)?,
                "restore" => api.set_state(window_id, WindowState::Normal)?,
                "title" => {
                    return Err(usage_error(format!("usage: {}", usage_for("windows", verb))))
                }
                _ => return Err(unknown_command(line)),
            }
            Ok(format!("windows {verb} {window_id}"))
        }
        ["apps" | "windows", sub, ..] if is_known(words[0], sub) => {
            Err(usage_error(format!("usage: {}", usage_for(words[0], sub))))
        }
        _ => Err(unknown_command(line)),
    }
}

fn help_text() -> String {
    let mut builder = Builder::default();
    builder.push_record(["command", "summary"]);
    for (usage, summary) in HELP {
        builder.push_record([*usage, *summary]);
    }
    let mut table = builder.build();
    table.with(Style::psql());
    table.to_string()
}

fn apps_table(api: &DesktopApi) -> String {
    let registry = api.registry();
    let mut builder = Builder::default();
    builder.push_record(["app_id", "title", "singleton", "launcher", "size"]);
    for app in registry.list() {
        builder.push_record([
            app.id.to_string(),
            app.title.clone(),
            yes_no(app.singleton).to_string(),
            yes_no(app.show_in_launcher).to_string(),
            format!("{}x{}", app.default_size.width, app.default_size.height),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::psql());
    table.to_string()
}

fn windows_table(api: &DesktopApi) -> String {
    let snapshot = api.get_state();
    if snapshot.windows.is_empty() {
        return "no open windows".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(["id", "app_id", "title", "state", "z", "focused"]);
    for window in snapshot.front_to_back() {
        builder.push_record([
            window.id.to_string(),
            window.app_id.to_string(),
            window.title.clone(),
            window.state.to_string(),
            window.z.to_string(),
            yes_no(snapshot.active_id == Some(window.id)).to_string(),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::psql());
    table.to_string()
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn parse_window_id(raw: &str) -> Result<WindowId, ShellError> {
    raw.parse::<WindowId>()
        .map_err(|err| usage_error(err.to_string()))
}

fn is_known(namespace: &str, sub: &str) -> bool {
    HELP.iter()
        .any(|(usage, _)| usage.starts_with(&format!("{namespace} {sub}")))
}

fn usage_for(namespace: &str, sub: &str) -> &'static str {
    let prefix = format!("{namespace} {sub}");
    HELP.iter()
        .find(|(usage, _)| usage.starts_with(&prefix))
        .map_or("help", |(usage, _)| *usage)
}

fn usage_error(message: impl Into<String>) -> ShellError {
    ShellError::new(ShellErrorCode::Usage, message)
}

fn unknown_command(line: &str) -> ShellError {
    ShellError::new(
        ShellErrorCode::NotFound,
        format!("unknown command `{}`; try `help`", line.trim()),
    )
}
