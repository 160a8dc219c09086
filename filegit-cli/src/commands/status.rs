use crate::display;
use anyhow::Result;
use colored::Colorize;
use filegit_core::Config;

pub fn run(config: Config) -> Result<()> {
    let repo = super::open_repo(config)?;
    let files = repo.tracked_files()?;

    if files.is_empty() {
        println!("{}", "No tracked files".yellow());
        println!("Run {} to record a first version", "filegit snapshot <file>".cyan());
        return Ok(());
    }

    println!(
        "{} {}",
        "Tracked files".bold().cyan(),
        format!("({})", files.len()).dimmed()
    );
    println!();

    for summary in &files {
        let state = match repo.file_state(&summary.file_path)? {
            Some(state) => display::file_state(state),
            None => continue,
        };
        println!(
            "  {:<14} {} {} {}",
            state,
            summary.file_path.display(),
            format!("{} commit(s),", summary.commit_count).dimmed(),
            format!("last {}", display::local_time(&summary.latest_timestamp)).dimmed()
        );
    }

    Ok(())
}
