//! Application registry: immutable metadata for every app the shell can launch.

use std::collections::BTreeSet;

use desktop_app_contract::{ApplicationId, InvalidApplicationId};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    error::DesktopError,
    model::{AppMeta, WindowSize},
};

mod generated {
    include!(concat!(env!("OUT_DIR"), "/app_catalog_generated.rs"));
}

pub use generated::APP_MANIFEST_CATALOG_JSON;

#[derive(Debug, Deserialize)]
struct WindowDefaults {
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct AppManifest {
    app_id: String,
    display_name: String,
    icon: String,
    single_instance: bool,
    show_in_launcher: bool,
    window_defaults: WindowDefaults,
}

#[derive(Debug, Error)]
/// Failures while building an [`AppRegistry`].
pub enum RegistryError {
    /// The catalog JSON could not be decoded.
    #[error("app catalog is malformed: {0}")]
    Catalog(#[from] serde_json::Error),
    /// An entry carried an id outside the contract policy.
    #[error(transparent)]
    InvalidAppId(#[from] InvalidApplicationId),
    /// Two entries share an id.
    #[error("app `{0}` is registered twice")]
    DuplicateApp(ApplicationId),
    /// An entry declared a zero-sized default window.
    #[error("app `{0}` declares an empty default window size")]
    EmptyWindowSize(ApplicationId),
}

/// Read-only mapping of app ids to [`AppMeta`], fixed at boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRegistry {
    apps: Vec<AppMeta>,
}

impl AppRegistry {
    /// Loads the catalog compiled from `manifests/*.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the embedded catalog is inconsistent.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_catalog_json(APP_MANIFEST_CATALOG_JSON)
    }

    /// Parses a JSON array of app manifests.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on malformed JSON, invalid ids, duplicates or empty sizes.
    pub fn from_catalog_json(raw: &str) -> Result<Self, RegistryError> {
        let manifests: Vec<AppManifest> = serde_json::from_str(raw)?;
        let entries = manifests
            .into_iter()
            .map(|manifest| {
                Ok(AppMeta {
                    id: ApplicationId::new(manifest.app_id)?,
                    title: manifest.display_name,
                    icon: manifest.icon,
                    singleton: manifest.single_instance,
                    default_size: WindowSize {
                        width: manifest.window_defaults.width,
                        height: manifest.window_defaults.height,
                    },
                    show_in_launcher: manifest.show_in_launcher,
                })
            })
            .collect::<Result<Vec<_>, RegistryError>>()?;
        Self::from_entries(entries)
    }

    /// Builds a registry from explicit entries, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateApp`] or [`RegistryError::EmptyWindowSize`].
    pub fn from_entries(entries: impl IntoIterator<Item = AppMeta>) -> Result<Self, RegistryError> {
        let mut seen = BTreeSet::new();
        let mut apps = Vec::new();
        for entry in entries {
            if entry.default_size.width == 0 || entry.default_size.height == 0 {
                return Err(RegistryError::EmptyWindowSize(entry.id));
            }
            if !seen.insert(entry.id.clone()) {
                return Err(RegistryError::DuplicateApp(entry.id));
            }
            apps.push(entry);
        }
        Ok(Self { apps })
    }

    pub fn get(&self, app_id: &ApplicationId) -> Option<&AppMeta> {
        self.apps.iter().find(|entry| &entry.id == app_id)
    }

    /// Looks up an app by its raw string id.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::AppNotFound`] for unknown or malformed ids.
    pub fn require(&self, app_id: &str) -> Result<&AppMeta, DesktopError> {
        self.apps
            .iter()
            .find(|entry| entry.id.as_str() == app_id)
            .ok_or_else(|| DesktopError::app_not_found(app_id))
    }

    pub fn list(&self) -> &[AppMeta] {
        &self.apps
    }

    pub fn launcher_apps(&self) -> Vec<&AppMeta> {
        self.apps
            .iter()
            .filter(|entry| entry.show_in_launcher)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}
