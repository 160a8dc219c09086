use crate::pidfile::PidFile;
use crate::watcher::FileWatcher;
use filegit_core::{CommitKind, Config, Repository, Settings, SnapshotOutcome, Watchlist};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Long-running process that turns change notifications into auto snapshots.
pub struct FilegitDaemon {
    repo: Arc<Mutex<Repository>>,
    pid_path: PathBuf,
    settings: Settings,
    watchlist: Watchlist,
}

impl FilegitDaemon {
    /// Opens the repository and loads the watchlist. The watchlist is not
    /// re-read afterwards; restart the daemon to apply edits.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let settings = config.load_settings()?;
        let pid_path = config.pid_path.clone();
        let repo = Repository::open(config)?;
        let watchlist = repo.watchlist()?;

        Ok(Self {
            repo: Arc::new(Mutex::new(repo)),
            pid_path,
            settings,
            watchlist,
        })
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }

    /// Runs until `shutdown` fires. A snapshot already in progress finishes
    /// before the loop exits.
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let _pid_file = PidFile::acquire(&self.pid_path)?;

        info!("Daemon started (PID: {})", std::process::id());
        info!("Watching {} file(s)", self.watchlist.len());

        let (tx, mut rx) = mpsc::channel(100);
        let debounce = Duration::from_millis(self.settings.watcher.debounce_ms);
        let _watcher = FileWatcher::new(&self.watchlist, debounce, tx)?;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                changed = rx.recv() => match changed {
                    Some(path) => self.handle_change(path).await,
                    None => {
                        warn!("Watcher channel closed");
                        break;
                    }
                },
            }
        }

        info!("Daemon stopped");
        Ok(())
    }

    async fn handle_change(&self, path: PathBuf) {
        // Give the writer a moment to finish; the event is only a hint.
        tokio::time::sleep(Duration::from_millis(self.settings.watcher.settle_ms)).await;

        // Hashing, the blob write and the SQLite insert (which may wait on the
        // busy timeout) all block.
        let repo = Arc::clone(&self.repo);
        let target = path.clone();
        let outcome = tokio::task::spawn_blocking(move || snapshot(&repo, &target)).await;

        match outcome {
            Ok(Ok(SnapshotOutcome::Created(commit))) => {
                info!("Snapshot for {}: {}", path.display(), commit.digest.short());
            }
            Ok(Ok(SnapshotOutcome::NoChange(_))) => debug!("Unchanged: {:?}", path),
            Ok(Ok(SnapshotOutcome::FileMissing)) => {
                debug!("Vanished before snapshot: {:?}", path)
            }
            Ok(Err(e)) => error!("Error creating snapshot for {}: {}", path.display(), e),
            Err(e) => error!("Snapshot task for {} failed: {}", path.display(), e),
        }
    }
}

fn snapshot(repo: &Mutex<Repository>, path: &Path) -> anyhow::Result<SnapshotOutcome> {
    let repo = repo
        .lock()
        .map_err(|_| anyhow::anyhow!("repository lock poisoned"))?;
    Ok(repo.maybe_snapshot(path, CommitKind::Auto)?)
}

/// Token cancelled on SIGTERM or SIGINT.
pub fn shutdown_on_signal() -> anyhow::Result<CancellationToken> {
    let token = CancellationToken::new();
    let trigger = token.clone();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM"),
                _ = sigint.recv() => info!("Received SIGINT"),
            }
            trigger.cancel();
        });
    }

    #[cfg(not(unix))]
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C");
        }
        trigger.cancel();
    });

    Ok(token)
}

/// Watchlisted paths whose parent directory is missing and so cannot be watched.
pub fn unwatchable(watchlist: &Watchlist) -> Vec<PathBuf> {
    watchlist
        .iter()
        .filter(|p| p.parent().map_or(true, |dir| !dir.is_dir()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Config) {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_root(temp_dir.path().join("state"));
        let repo = Repository::init(config.clone()).unwrap();
        fs::write(
            &config.settings_path,
            "[watcher]\ndebounce_ms = 50\nsettle_ms = 10\n",
        )
        .unwrap();
        drop(repo);
        (temp_dir, config)
    }

    #[tokio::test]
    async fn test_daemon_requires_init() {
        let temp_dir = TempDir::new().unwrap();
        let result = FilegitDaemon::new(Config::from_root(temp_dir.path().join("missing")));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_handle_change_snapshots_once() {
        let (temp_dir, config) = setup();
        let file = temp_dir.path().join("notes.txt");
        fs::write(&file, "hello").unwrap();

        let daemon = FilegitDaemon::new(config.clone()).unwrap();
        daemon.handle_change(file.clone()).await;
        daemon.handle_change(file.clone()).await;

        let repo = Repository::open(config).unwrap();
        let history = repo.history(&file).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, CommitKind::Auto);
    }

    #[tokio::test]
    async fn test_handle_change_of_deleted_file_is_quiet() {
        let (temp_dir, config) = setup();
        let daemon = FilegitDaemon::new(config.clone()).unwrap();

        daemon.handle_change(temp_dir.path().join("gone.txt")).await;

        assert!(Repository::open(config).unwrap().tracked_files().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel_and_releases_pid_file() {
        let (temp_dir, config) = setup();
        let file = temp_dir.path().join("watched.txt");
        fs::write(&file, "v1").unwrap();
        Repository::open(config.clone()).unwrap().watch(&file).unwrap();

        let daemon = FilegitDaemon::new(config.clone()).unwrap();
        assert!(daemon.watchlist().contains(&file));

        let token = CancellationToken::new();
        let cancel_soon = {
            let token = token.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                token.cancel();
            }
        };

        let (result, ()) = tokio::join!(daemon.run(token), cancel_soon);
        result.unwrap();

        assert!(!config.pid_path.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_edit_of_watched_file_is_snapshotted() {
        let (temp_dir, config) = setup();
        let file = fs::canonicalize(temp_dir.path()).unwrap().join("watched.txt");
        fs::write(&file, "v1").unwrap();
        let repo = Repository::open(config.clone()).unwrap();
        repo.watch(&file).unwrap();

        let token = CancellationToken::new();
        let daemon = FilegitDaemon::new(config.clone()).unwrap();
        let handle = tokio::spawn(daemon.run(token.clone()));

        tokio::time::sleep(Duration::from_millis(300)).await;
        fs::write(&file, "v2").unwrap();

        let mut recorded = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if repo.history(&file).unwrap().len() == 1 {
                recorded = true;
                break;
            }
        }

        token.cancel();
        handle.await.unwrap().unwrap();

        assert!(recorded, "no auto snapshot was recorded");
        let history = repo.history(&file).unwrap();
        assert_eq!(history[0].digest, filegit_core::Digest::of(b"v2"));
    }

    #[test]
    fn test_unwatchable_paths() {
        let temp_dir = TempDir::new().unwrap();
        let mut list = Watchlist::default();
        list.add(temp_dir.path().join("ok.txt"));
        list.add(PathBuf::from("/no/such/dir/file.txt"));

        assert_eq!(unwatchable(&list), vec![PathBuf::from("/no/such/dir/file.txt")]);
    }
}
