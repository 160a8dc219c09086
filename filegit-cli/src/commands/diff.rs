use crate::display;
use anyhow::Result;
use colored::Colorize;
use filegit_core::diff::EntryDiff;
use filegit_core::Config;
use std::io::Write;
use std::path::PathBuf;

pub fn run(config: Config, file: PathBuf, entry: usize, context: usize) -> Result<()> {
    let repo = super::open_repo(config)?;
    let file = super::resolve_file(file)?;
    let picked = super::pick_entry(&repo, &file, entry)?;

    let label = match picked.commit() {
        Some(commit) => format!("commit {}", commit.id),
        None => "uncommitted changes".to_string(),
    };
    println!(
        "{} {} {}",
        "Diff of".bold(),
        label.yellow(),
        format!("({})", picked.digest.short()).dimmed()
    );
    println!();

    match repo.diff_entry(&file, &picked)? {
        EntryDiff::FirstVersion => {
            println!("{}", "[first version, nothing to compare]".dimmed());
        }
        EntryDiff::Binary => {
            println!("{}", "Binary content differs".yellow());
        }
        EntryDiff::Text(diff) => {
            if diff.is_empty() {
                println!("{}", "No textual changes".dimmed());
                return Ok(());
            }
            display::print_unified(&diff.format_unified(context));
            let (additions, deletions) = diff.stats();
            println!();
            println!(
                "{} {}, {} {}",
                additions.to_string().green(),
                "additions".green(),
                deletions.to_string().red(),
                "deletions".red()
            );
        }
    }

    Ok(())
}

/// Writes the raw bytes of an entry to stdout.
pub fn show(config: Config, file: PathBuf, entry: usize) -> Result<()> {
    let repo = super::open_repo(config)?;
    let file = super::resolve_file(file)?;
    let picked = super::pick_entry(&repo, &file, entry)?;

    let content = repo.entry_content(&file, &picked)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&content)?;
    stdout.flush()?;

    Ok(())
}
