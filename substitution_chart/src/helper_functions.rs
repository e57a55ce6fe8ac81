use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// System commands that hand a file to the desktop's default viewer.
const VIEWER_COMMANDS: [&str; 2] = ["xdg-open", "open"];

pub fn project_root() -> PathBuf {
    match env::var_os("PROJECT_ROOT") {
        Some(val) => PathBuf::from(val),
        None => {
            // Fall back to current directory if PROJECT_ROOT not set
            env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        }
    }
}

fn find_viewer(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().find_map(|cmd| which::which(cmd).ok())
}

fn has_display() -> bool {
    if !cfg!(target_os = "linux") {
        return true;
    }
    env::var_os("DISPLAY").is_some() || env::var_os("WAYLAND_DISPLAY").is_some()
}

/// Opens `path` in the system viewer and waits for the opener to exit.
///
/// Headless sessions, or machines without an opener, skip the display step.
pub fn open_in_viewer(path: &Path) -> Result<()> {
    if !has_display() {
        info!("No display available, skipping preview of {}", path.display());
        return Ok(());
    }
    let Some(viewer) = find_viewer(&VIEWER_COMMANDS) else {
        info!("No viewer command found, skipping preview of {}", path.display());
        return Ok(());
    };

    info!("Opening {} with {}", path.display(), viewer.display());
    let status = Command::new(&viewer)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to launch {}", viewer.display()))?;

    if !status.success() {
        warn!("Viewer {} exited with status {}", viewer.display(), status);
    }
    Ok(())
}
