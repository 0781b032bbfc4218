//! Window-manager core for the desktop shell.
//!
//! The [`DesktopApi`] facade is the single mutation surface. It drives the lifecycle controller,
//! focus engine and window state machine through [`reduce_desktop`], commits the result into the
//! [`WindowStore`], and notifies subscribers with a fresh [`DesktopSnapshot`].

pub mod api;
pub mod app_runtime;
pub mod apps;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
#[cfg(feature = "csr")]
pub mod reactive;
pub mod reducer;
pub mod shell;
pub mod store;
pub mod window_manager;
pub mod window_state;

pub use api::{AppHandle, DesktopApi};
pub use apps::{AppRegistry, RegistryError};
pub use config::{ConfigError, WindowManagerConfig, CONFIG_PATH_ENV};
pub use desktop_app_contract::{AppLifecycleEvent, ApplicationId};
pub use error::DesktopError;
pub use lifecycle::{LaunchOutcome, LaunchRequest};
pub use model::*;
pub use reducer::{reduce_desktop, DesktopAction, RuntimeEffect};
pub use shell::{ShellError, ShellErrorCode};
pub use store::{Subscription, SubscriptionGuard, WindowStore, WindowTable};
pub use window_manager::FocusFallback;
