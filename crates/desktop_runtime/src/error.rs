//! Error taxonomy for window manager operations.

use desktop_app_contract::ApplicationId;
use thiserror::Error;

use crate::model::WindowId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Synchronous failures returned by every window manager operation.
///
/// A failed operation never leaves a partial mutation behind.
pub enum DesktopError {
    /// The app id is not present in the registry.
    #[error("app `{0}` is not registered")]
    AppNotFound(String),
    /// The referenced window is not (or no longer) open.
    #[error("window {0} not found")]
    NotFound(WindowId),
    /// A second instance was requested for a single-instance app.
    #[error("app `{0}` only allows a single instance")]
    SingletonViolation(ApplicationId),
    /// Insert collided with a live window id.
    #[error("window id {0} is already in use")]
    DuplicateId(WindowId),
    /// Internal bookkeeping contradicted itself; indicates a bug.
    #[error("window manager invariant breached: {0}")]
    InvariantBreach(&'static str),
    /// The configured window cap is reached.
    #[error("window limit of {limit} reached")]
    WindowLimitReached {
        /// Configured maximum number of open windows.
        limit: usize,
    },
}

impl DesktopError {
    /// Returns `true` for internal invariant breaches that indicate a bug rather than a stale or
    /// invalid request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DuplicateId(_) | Self::InvariantBreach(_))
    }

    pub(crate) fn app_not_found(app_id: impl AsRef<str>) -> Self {
        Self::AppNotFound(app_id.as_ref().to_string())
    }
}
