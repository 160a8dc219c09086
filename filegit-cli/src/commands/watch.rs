use anyhow::Result;
use colored::Colorize;
use filegit_core::Config;
use std::path::PathBuf;

pub fn add(config: Config, file: PathBuf) -> Result<()> {
    let repo = super::open_repo(config)?;
    let file = super::resolve_file(file)?;

    if !file.exists() {
        println!(
            "{} {}",
            "⚠ File does not exist yet:".yellow(),
            file.display()
        );
    }

    if repo.watch(&file)? {
        println!("{} {}", "✓ Watching".green().bold(), file.display());
        restart_hint();
    } else {
        println!("{} {}", "Already watching".yellow(), file.display());
    }

    Ok(())
}

pub fn remove(config: Config, file: PathBuf) -> Result<()> {
    let repo = super::open_repo(config)?;
    let file = super::resolve_file(file)?;

    if repo.unwatch(&file)? {
        println!("{} {}", "✓ Stopped watching".green().bold(), file.display());
        restart_hint();
    } else {
        println!("{} {}", "Not watched:".yellow(), file.display());
    }

    Ok(())
}

pub fn list(config: Config) -> Result<()> {
    let repo = super::open_repo(config)?;
    let watchlist = repo.watchlist()?;

    if watchlist.is_empty() {
        println!("{}", "Watchlist is empty".yellow());
        println!("Run {} to add a file", "filegit watch <file>".cyan());
        return Ok(());
    }

    let unwatchable = filegit_daemon::daemon::unwatchable(&watchlist);

    println!(
        "{} {}",
        "Watched files".bold().cyan(),
        format!("({})", watchlist.len()).dimmed()
    );
    for path in watchlist.iter() {
        if unwatchable.contains(path) {
            println!(
                "  {} {}",
                path.display(),
                "(directory missing, not watched)".red()
            );
        } else if !path.exists() {
            println!("  {} {}", path.display(), "(missing)".yellow());
        } else {
            println!("  {}", path.display());
        }
    }

    Ok(())
}

fn restart_hint() {
    println!(
        "{}",
        "Restart the daemon for the change to take effect: filegit daemon stop && filegit daemon start"
            .dimmed()
    );
}
