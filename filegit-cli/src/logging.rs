//! Logging setup for the two ways the binary runs: as a short-lived command
//! (stderr, quiet by default) and as the daemon (appends to `daemon.log`).

use anyhow::{Context, Result};
use filegit_core::Config;
use tracing_subscriber::EnvFilter;

pub fn init_cli_logging(verbose: bool) {
    let default = if verbose {
        "filegit=debug,filegit_core=debug,filegit_daemon=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Daemon output goes to `daemon.log`, at the level from `config.toml` unless
/// `RUST_LOG` says otherwise.
pub fn init_daemon_logging(config: &Config) -> Result<()> {
    let settings = config.load_settings()?;

    std::fs::create_dir_all(&config.root)
        .with_context(|| format!("Could not create {:?}", config.root))?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .with_context(|| format!("Could not open log file {:?}", config.log_path))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(file)
        .init();

    Ok(())
}
