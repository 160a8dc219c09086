pub mod commit;
pub mod daemon;
pub mod diff;
pub mod forget;
pub mod init;
pub mod restore;
pub mod snapshot;
pub mod status;
pub mod timeline;
pub mod verify;
pub mod watch;

use anyhow::{Context, Result};
use filegit_core::{Config, Repository, TimelineEntry};
use std::path::{Path, PathBuf};

pub fn config(home: Option<PathBuf>) -> Config {
    match home {
        Some(root) => Config::from_root(root),
        None => Config::discover(),
    }
}

pub fn open_repo(config: Config) -> Result<Repository> {
    if !config.is_initialized() {
        anyhow::bail!(
            "No filegit repository at {:?}. Run 'filegit init' first.",
            config.root
        );
    }
    Repository::open(config).context("Failed to open repository")
}

/// Files are keyed by absolute path. Existing files are canonicalized so a
/// symlinked or relative spelling maps to the same history; a missing file
/// is only made absolute.
pub fn resolve_file(file: PathBuf) -> Result<PathBuf> {
    if file.exists() {
        return std::fs::canonicalize(&file)
            .with_context(|| format!("Failed to resolve {:?}", file));
    }
    absolute(&file)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Ok(cwd.join(path))
    }
}

/// Picks timeline position `index` (0 is the newest entry).
pub fn pick_entry(
    repo: &Repository,
    file: &Path,
    index: usize,
) -> Result<TimelineEntry> {
    let mut entries = repo.timeline(file)?;
    if entries.is_empty() {
        anyhow::bail!("No history for {}", file.display());
    }
    if index >= entries.len() {
        anyhow::bail!(
            "Entry {} out of range, {} has {} entries",
            index,
            file.display(),
            entries.len()
        );
    }
    Ok(entries.swap_remove(index))
}
