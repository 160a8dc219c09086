use colored::{ColoredString, Colorize};
use filegit_core::{FileState, TimelineEntry};

pub const DATE_FORMAT: &str = "%y-%m-%d %H:%M:%S";

pub fn marker(entry: &TimelineEntry) -> ColoredString {
    let marker = entry.marker();
    match entry.commit() {
        None => marker.yellow().bold(),
        Some(c) if c.is_manual() => marker.green().bold(),
        Some(_) => marker.dimmed(),
    }
}

pub fn file_state(state: FileState) -> ColoredString {
    match state {
        FileState::UpToDate => "[up-to-date]".green(),
        FileState::Modified => "[MODIFIED]".yellow(),
        FileState::Deleted => "[DELETED]".red(),
    }
}

pub fn local_time(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.with_timezone(&chrono::Local)
        .format(DATE_FORMAT)
        .to_string()
}

/// Colors an already rendered unified diff.
pub fn print_unified(unified: &str) {
    for line in unified.lines() {
        let styled = if line.starts_with("+++") || line.starts_with("---") {
            line.bold()
        } else if line.starts_with("@@") {
            line.cyan()
        } else if line.starts_with('+') {
            line.green()
        } else if line.starts_with('-') {
            line.red()
        } else {
            line.normal()
        };
        println!("{}", styled);
    }
}
