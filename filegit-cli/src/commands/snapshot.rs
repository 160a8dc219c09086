use anyhow::Result;
use colored::Colorize;
use filegit_core::{CommitKind, Config, SnapshotOutcome};
use std::path::PathBuf;

pub fn run(config: Config, file: PathBuf) -> Result<()> {
    let repo = super::open_repo(config)?;
    let file = super::resolve_file(file)?;

    match repo.maybe_snapshot(&file, CommitKind::Auto)? {
        SnapshotOutcome::Created(commit) => {
            println!("{}", "✓ Snapshot recorded".green().bold());
            println!("  {}: {}", "Commit ID".bold(), commit.id);
            println!("  {}: {}", "Digest".bold(), commit.digest.short().cyan());
            println!(
                "Run {} to attach a message",
                format!("filegit commit {} -m \"message\"", commit.id).cyan()
            );
        }
        SnapshotOutcome::NoChange(latest) => {
            println!(
                "{} (latest commit {}, {})",
                "No changes since the last snapshot".yellow(),
                latest.id,
                latest.digest.short()
            );
        }
        SnapshotOutcome::FileMissing => {
            anyhow::bail!("File not found: {}", file.display());
        }
    }

    Ok(())
}
