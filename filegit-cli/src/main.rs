use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod display;
mod logging;

use commands::{commit, daemon, diff, forget, init, restore, snapshot, status, timeline, verify, watch};

#[derive(Parser)]
#[command(name = "filegit")]
#[command(version, about = "Per-file version control with automatic snapshots", long_about = None)]
struct Cli {
    /// State directory (defaults to ~/.filegit)
    #[arg(long, global = true, env = "FILEGIT_HOME")]
    home: Option<PathBuf>,

    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the object store, index and watchlist
    Init,

    /// Record the current content of a file as a new snapshot
    Snapshot {
        /// File to snapshot
        file: PathBuf,
    },

    /// Attach a message to a snapshot, making it a manual commit
    Commit {
        /// Commit ID (as shown by `timeline`)
        id: i64,

        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Show the history of a file, newest first
    Timeline {
        /// File to inspect
        file: PathBuf,

        /// Number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what changed in a timeline entry relative to the entry before it
    Diff {
        /// File to inspect
        file: PathBuf,

        /// Timeline position (0 is the newest entry)
        #[arg(short, long, default_value = "0")]
        entry: usize,

        /// Lines of context around each change
        #[arg(short = 'U', long, default_value_t = filegit_core::diff::DEFAULT_CONTEXT)]
        context: usize,
    },

    /// Print the content of a timeline entry
    Show {
        /// File to inspect
        file: PathBuf,

        /// Timeline position (0 is the newest entry)
        #[arg(short, long, default_value = "0")]
        entry: usize,
    },

    /// Overwrite a file with a stored version
    Restore {
        /// File to restore
        file: PathBuf,

        /// Digest (or unique prefix) of the version to restore
        digest: String,
    },

    /// Delete all history for a file
    Forget {
        /// File whose history should be removed
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List tracked files and whether they changed since their last snapshot
    Status,

    /// Add a file to the daemon's watchlist
    Watch {
        /// File to watch
        file: PathBuf,
    },

    /// Remove a file from the daemon's watchlist
    Unwatch {
        /// File to stop watching
        file: PathBuf,
    },

    /// Show the watchlist
    WatchList,

    /// Check that every commit points at an intact blob
    Verify,

    /// Manage the background watcher
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
}

#[derive(Subcommand)]
enum DaemonAction {
    /// Start the watcher in the background
    Start,
    /// Ask the running watcher to stop
    Stop,
    /// Show whether the watcher is running and its latest log lines
    Status {
        /// Number of log lines to show
        #[arg(short = 'n', long, default_value = "10")]
        lines: usize,
    },
    /// Run the watcher in the foreground
    #[command(hide = true)]
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = commands::config(cli.home);

    let in_daemon = matches!(
        cli.command,
        Commands::Daemon {
            action: DaemonAction::Run
        }
    );
    if in_daemon {
        logging::init_daemon_logging(&config)?;
    } else {
        logging::init_cli_logging(cli.verbose);
    }

    match cli.command {
        Commands::Init => init::run(config)?,
        Commands::Snapshot { file } => snapshot::run(config, file)?,
        Commands::Commit { id, message } => commit::run(config, id, message)?,
        Commands::Timeline { file, limit, json } => timeline::run(config, file, limit, json)?,
        Commands::Diff {
            file,
            entry,
            context,
        } => diff::run(config, file, entry, context)?,
        Commands::Show { file, entry } => diff::show(config, file, entry)?,
        Commands::Restore { file, digest } => restore::run(config, file, digest)?,
        Commands::Forget { file, yes } => forget::run(config, file, yes)?,
        Commands::Status => status::run(config)?,
        Commands::Watch { file } => watch::add(config, file)?,
        Commands::Unwatch { file } => watch::remove(config, file)?,
        Commands::WatchList => watch::list(config)?,
        Commands::Verify => verify::run(config)?,
        Commands::Daemon { action } => match action {
            DaemonAction::Start => daemon::start(config)?,
            DaemonAction::Stop => daemon::stop(config)?,
            DaemonAction::Status { lines } => daemon::status(config, lines)?,
            DaemonAction::Run => daemon::run_foreground(config).await?,
        },
    }

    Ok(())
}
