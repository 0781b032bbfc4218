//! Headless desktop console.
//!
//! Boots the window manager over the built-in app catalog and reads shell commands from stdin,
//! one per line. Try `help`.

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use desktop_runtime::{shell, DesktopApi, WindowManagerConfig, CONFIG_PATH_ENV};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "desktop-console")]
#[command(version, about = "Drive the desktop window manager from a terminal")]
struct Cli {
    /// Window manager config file (TOML)
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    /// Print the snapshot JSON after every successful command
    #[arg(long)]
    echo_snapshot: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<WindowManagerConfig> {
    match path {
        Some(path) => WindowManagerConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(WindowManagerConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = load_config(cli.config.as_ref())?;
    info!(
        focus_fallback = ?config.focus_fallback,
        max_windows = ?config.max_windows,
        "starting desktop console"
    );

    let api = DesktopApi::builtin(config).context("loading built-in app catalog")?;
    let _observer = api
        .subscribe(|snapshot| {
            debug!(
                windows = snapshot.windows.len(),
                active = ?snapshot.active_id,
                "desktop changed"
            );
        })
        .into_guard();

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        match shell::execute(&api, &line) {
            Ok(output) => {
                if !output.is_empty() {
                    writeln!(stdout, "{output}")?;
                }
                if cli.echo_snapshot && !line.trim().is_empty() {
                    writeln!(stdout, "{}", shell::execute(&api, "snapshot")?)?;
                }
            }
            Err(err) => {
                warn!(code = ?err.code, command = line.trim(), "{err}");
                eprintln!("error: {err}");
            }
        }
        stdout.flush()?;
    }

    info!(windows = api.get_state().windows.len(), "stdin closed; exiting");
    Ok(())
}
