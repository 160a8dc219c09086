use anyhow::Result;
use colored::Colorize;
use filegit_core::Config;

pub fn run(config: Config) -> Result<()> {
    let repo = super::open_repo(config)?;
    let report = repo.verify()?;

    println!("{}", "Store Verification".bold().cyan());
    println!("  {}: {}", "Commits checked".bold(), report.commits_checked);
    println!("  {}: {}", "Blobs checked".bold(), report.blobs_checked);
    println!("  {}: {}", "Orphaned blobs".bold(), report.orphaned);
    println!();

    for (id, digest) in &report.dangling {
        println!(
            "  {} commit {} references missing blob {}",
            "✗".red(),
            id,
            digest.short()
        );
    }
    for digest in &report.corrupt {
        println!("  {} blob {} is corrupt", "✗".red(), digest.short());
    }

    if report.is_healthy() {
        println!("{}", "✓ Store is consistent".green().bold());
        Ok(())
    } else {
        anyhow::bail!(
            "{} dangling commit(s), {} corrupt blob(s)",
            report.dangling.len(),
            report.corrupt.len()
        )
    }
}
