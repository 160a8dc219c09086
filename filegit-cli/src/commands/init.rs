use anyhow::{Context, Result};
use colored::Colorize;
use filegit_core::{Config, Repository};

pub fn run(config: Config) -> Result<()> {
    let existed = config.is_initialized();
    let repo = Repository::init(config).context("Failed to initialize repository")?;
    let config = repo.config();

    if existed {
        println!(
            "{} {}",
            "Repository already initialized at".yellow(),
            config.root.display()
        );
        return Ok(());
    }

    println!("{}", "✓ Initialized filegit repository".green().bold());
    println!("  {}: {}", "Objects".bold(), config.objects_dir.display());
    println!("  {}: {}", "Index".bold(), config.index_path.display());
    println!("  {}: {}", "Watchlist".bold(), config.watchlist_path.display());
    println!("  {}: {}", "Settings".bold(), config.settings_path.display());

    Ok(())
}
