use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use desktop_app_contract::ApplicationId;
use serde::{Deserialize, Serialize};

const MANIFEST_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WindowDefaults {
    width: u32,
    height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct AppManifest {
    schema_version: u32,
    app_id: String,
    display_name: String,
    icon: String,
    single_instance: bool,
    show_in_launcher: bool,
    window_defaults: WindowDefaults,
}

fn app_manifest_paths(root: &Path) -> Vec<PathBuf> {
    let dir = root.join("manifests");
    println!("cargo:rerun-if-changed={}", dir.display());
    let entries = fs::read_dir(&dir)
        .unwrap_or_else(|err| panic!("failed to list {}: {err}", dir.display()));
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();
    paths
}

fn main() {
    let crate_root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let mut manifests = Vec::<AppManifest>::new();
    let mut seen = BTreeSet::new();

    for path in app_manifest_paths(&crate_root) {
        println!("cargo:rerun-if-changed={}", path.display());
        let raw = fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
        let manifest: AppManifest = toml::from_str(&raw)
            .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()));
        if manifest.schema_version != MANIFEST_SCHEMA_VERSION {
            panic!(
                "manifest schema mismatch in {}: expected {MANIFEST_SCHEMA_VERSION} found {}",
                path.display(),
                manifest.schema_version
            );
        }
        if let Err(err) = ApplicationId::new(manifest.app_id.as_str()) {
            panic!("{err} in {}", path.display());
        }
        if manifest.window_defaults.width == 0 || manifest.window_defaults.height == 0 {
            panic!("zero-sized window defaults in {}", path.display());
        }
        if !seen.insert(manifest.app_id.clone()) {
            panic!("duplicate app id `{}` in {}", manifest.app_id, path.display());
        }
        manifests.push(manifest);
    }

    manifests.sort_by(|a, b| a.app_id.cmp(&b.app_id));
    let json = serde_json::to_string_pretty(&manifests).expect("serialize app manifest catalog");
    let generated = format!(
        "/// Build-time generated app manifest catalog JSON.\n\
pub const APP_MANIFEST_CATALOG_JSON: &str = r##\"{}\"##;\n",
        json
    );

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR"));
    let out_file = out_dir.join("app_catalog_generated.rs");
    fs::write(&out_file, generated)
        .unwrap_or_else(|err| panic!("failed to write {}: {err}", out_file.display()));
}
