//! Shared contract types between the desktop window manager runtime and hosted apps.
//!
//! Hosted apps never see the window table. They are identified by a canonical string
//! [`ApplicationId`], receive their own [`WindowRuntimeId`], and observe a stream of
//! [`AppLifecycleEvent`] values emitted by the window manager.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier for a runtime-managed window.
pub type WindowRuntimeId = u64;

/// Maximum accepted length of an application id.
pub const MAX_APPLICATION_ID_LEN: usize = 120;
const MAX_SEGMENT_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Rejection returned by [`ApplicationId::new`].
#[error("invalid application id `{raw}`; expected lowercase kebab-case segments")]
pub struct InvalidApplicationId {
    /// Raw input that failed validation.
    pub raw: String,
}

/// Stable identifier for an app package/module (for example `solitaire` or `gltf-viewer`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Returns an app identifier when `raw` conforms to the kebab-case segment policy.
    ///
    /// Segments may optionally be namespaced with dots (`games.solitaire`).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidApplicationId`] when `raw` is empty, too long, or contains a malformed
    /// segment.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidApplicationId> {
        let raw = raw.into();
        if is_valid_application_id(&raw) {
            Ok(Self(raw))
        } else {
            Err(InvalidApplicationId { raw })
        }
    }

    /// Returns the string form of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ApplicationId {
    type Err = InvalidApplicationId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ApplicationId {
    type Error = InvalidApplicationId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ApplicationId> for String {
    fn from(value: ApplicationId) -> Self {
        value.0
    }
}

fn is_valid_application_id(raw: &str) -> bool {
    if raw.is_empty() || raw.len() > MAX_APPLICATION_ID_LEN {
        return false;
    }

    raw.split('.').all(|part| {
        if part.is_empty() || part.len() > MAX_SEGMENT_LEN || part.ends_with('-') {
            return false;
        }
        let bytes = part.as_bytes();
        bytes[0].is_ascii_lowercase()
            && bytes
                .iter()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Lifecycle events emitted by the desktop window manager to a hosted app.
pub enum AppLifecycleEvent {
    /// App has been bound to a managed window.
    Mounted,
    /// Window became focused.
    Focused,
    /// Window lost focus.
    Blurred,
    /// Window was minimized.
    Minimized,
    /// Window was hidden without being closed.
    Hidden,
    /// Window was restored from a minimized or hidden state.
    Restored,
    /// Window was closed and its instance released.
    Closed,
}

impl AppLifecycleEvent {
    /// Returns a stable string token for logging and debugging hooks.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Mounted => "mounted",
            Self::Focused => "focused",
            Self::Blurred => "blurred",
            Self::Minimized => "minimized",
            Self::Hidden => "hidden",
            Self::Restored => "restored",
            Self::Closed => "closed",
        }
    }

    /// Returns `true` when the app's window is not visible after this event.
    pub const fn is_concealed(self) -> bool {
        matches!(self, Self::Minimized | Self::Hidden | Self::Closed)
    }
}
