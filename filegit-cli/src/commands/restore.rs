use anyhow::Result;
use colored::Colorize;
use filegit_core::Config;
use std::path::PathBuf;

pub fn run(config: Config, file: PathBuf, digest: String) -> Result<()> {
    let repo = super::open_repo(config)?;
    let file = super::resolve_file(file)?;
    let target = repo.resolve_digest(&file, &digest)?;

    if let Some(state) = repo.file_state(&file)? {
        if state == filegit_core::FileState::Modified {
            println!(
                "{}",
                "⚠ Uncommitted changes will be overwritten (no snapshot is taken first)"
                    .yellow()
            );
        }
    }

    repo.restore(&file, &target)?;

    println!("{}", "✓ File restored".green().bold());
    println!("  {}: {}", "File".bold(), file.display());
    println!("  {}: {}", "Version".bold(), target.short().cyan());

    Ok(())
}
