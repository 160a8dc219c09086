use anyhow::{Context, Result};
use colored::Colorize;
use filegit_core::Config;
use filegit_daemon::pidfile::{self, read_pid};
use filegit_daemon::{shutdown_on_signal, FilegitDaemon};
use std::fs::OpenOptions;
use std::path::Path;
use std::process::{Command, Stdio};

/// Spawns `filegit daemon run` detached from the terminal.
pub fn start(config: Config) -> Result<()> {
    if !config.is_initialized() {
        anyhow::bail!("No filegit repository at {:?}. Run 'filegit init' first.", config.root);
    }

    if let Ok(Some(pid)) = read_pid(&config.pid_path) {
        if pidfile::is_alive(pid) {
            println!("{} (PID: {})", "Daemon already running".yellow(), pid);
            return Ok(());
        }
    }

    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .with_context(|| format!("Could not open log file {:?}", config.log_path))?;
    let log_err = log.try_clone()?;

    let exe = std::env::current_exe().context("Could not locate the filegit executable")?;
    let mut command = Command::new(exe);
    command
        .arg("--home")
        .arg(&config.root)
        .args(["daemon", "run"])
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err));

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let child = command.spawn().context("Failed to spawn daemon")?;

    println!("{}", "🚀 Daemon started".bold().cyan());
    println!("   {}: {}", "PID".bold(), child.id());
    println!("   {}: {}", "Log".bold(), config.log_path.display());

    Ok(())
}

pub fn stop(config: Config) -> Result<()> {
    let pid = match read_pid(&config.pid_path) {
        Ok(Some(pid)) => pid,
        Ok(None) => {
            println!("{}", "Daemon is not running".yellow());
            return Ok(());
        }
        Err(e) => {
            std::fs::remove_file(&config.pid_path)
                .with_context(|| format!("Failed to remove {:?}", config.pid_path))?;
            println!("{} ({})", "Removed unusable pid file".yellow(), e);
            return Ok(());
        }
    };

    if !pidfile::is_alive(pid) {
        std::fs::remove_file(&config.pid_path)
            .with_context(|| format!("Failed to remove {:?}", config.pid_path))?;
        println!("{} (PID {} was not running)", "Removed stale pid file".yellow(), pid);
        return Ok(());
    }

    pidfile::terminate(pid)?;
    println!("{} (PID: {})", "✓ Daemon stopped".green().bold(), pid);

    Ok(())
}

pub fn status(config: Config, lines: usize) -> Result<()> {
    match read_pid(&config.pid_path) {
        Ok(Some(pid)) if pidfile::is_alive(pid) => {
            println!("{} (PID: {})", "● Daemon running".green().bold(), pid);
        }
        Ok(Some(pid)) => {
            println!(
                "{} (stale pid file for PID {})",
                "○ Daemon not running".red().bold(),
                pid
            );
        }
        Ok(None) => println!("{}", "○ Daemon not running".red().bold()),
        Err(e) => println!("{} ({})", "○ Daemon not running".red().bold(), e),
    }

    let tail = tail_lines(&config.log_path, lines)?;
    if !tail.is_empty() {
        println!();
        println!("{}", "Recent log:".bold());
        for line in tail {
            println!("  {}", line.dimmed());
        }
    }

    Ok(())
}

/// Body of the detached process started by [`start`].
pub async fn run_foreground(config: Config) -> Result<()> {
    let daemon = FilegitDaemon::new(config)?;
    daemon.run(shutdown_on_signal()?).await
}

fn tail_lines(path: &Path, count: usize) -> Result<Vec<String>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).context("Failed to read daemon log"),
    };

    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(count);
    Ok(all[start..].iter().map(|l| l.to_string()).collect())
}
