use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;
use filegit_core::Config;
use std::path::PathBuf;

pub fn run(config: Config, file: PathBuf, yes: bool) -> Result<()> {
    let repo = super::open_repo(config)?;
    let file = super::resolve_file(file)?;

    let count = repo.history(&file)?.len();
    if count == 0 {
        println!("{} {}", "No history for".yellow(), file.display());
        return Ok(());
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete all {} commit(s) for {}?",
                count,
                file.display()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Aborted".yellow());
            return Ok(());
        }
    }

    let removed = repo.forget(&file)?;
    println!(
        "{} {}",
        format!("✓ Removed {} commit(s) for", removed).green().bold(),
        file.display()
    );

    Ok(())
}
