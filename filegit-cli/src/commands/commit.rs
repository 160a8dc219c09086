use anyhow::Result;
use colored::Colorize;
use filegit_core::Config;

pub fn run(config: Config, id: i64, message: String) -> Result<()> {
    let repo = super::open_repo(config)?;

    let commit = match repo.promote(id, &message) {
        Ok(commit) => commit,
        Err(e) if e.is_warning() => {
            println!("{} {}", "⚠".yellow(), e.to_string().yellow());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", "✓ Commit created successfully!".green().bold());
    println!("  {}: {}", "Commit ID".bold(), commit.id);
    println!("  {}: {}", "File".bold(), commit.file_path.display());
    println!("  {}: {}", "Digest".bold(), commit.digest.short().cyan());
    println!("  {}: {}", "Message".bold(), commit.message().unwrap_or_default());

    Ok(())
}
