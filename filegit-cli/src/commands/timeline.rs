use crate::display;
use anyhow::Result;
use colored::Colorize;
use filegit_core::Config;
use std::path::PathBuf;

pub fn run(config: Config, file: PathBuf, limit: Option<usize>, json: bool) -> Result<()> {
    let repo = super::open_repo(config)?;
    let file = super::resolve_file(file)?;
    let entries = repo.timeline(&file)?;

    let to_show = limit.unwrap_or(entries.len()).min(entries.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&entries[..to_show])?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{} {}", "No history for".yellow(), file.display());
        return Ok(());
    }

    println!("{} {}", "Timeline of".bold().cyan(), file.display());
    println!();

    for (position, entry) in entries.iter().take(to_show).enumerate() {
        let id = entry
            .commit()
            .map(|c| format!("#{}", c.id))
            .unwrap_or_default();
        let message = entry
            .commit()
            .and_then(|c| c.message())
            .unwrap_or_default();

        println!(
            "{:>3} {:<6} {} {} {:<6} {}",
            position.to_string().dimmed(),
            display::marker(entry),
            display::local_time(&entry.timestamp),
            entry.digest.short().cyan(),
            id.yellow(),
            message
        );
    }

    if entries.len() > to_show {
        println!();
        println!(
            "{}",
            format!("... and {} more entries", entries.len() - to_show).dimmed()
        );
        println!("Use {} to see more", "--limit N".cyan());
    }

    Ok(())
}
