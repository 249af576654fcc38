use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

/// Per-platform configuration directory for the console, created on first
/// use. Explicit paths from flags or env vars always win over this.
pub fn config_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("org", "mailsift", "mailsift")
        .context("resolve platform config directory")?;
    let dir = dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create config dir {}", dir.display()))?;
    Ok(dir)
}
