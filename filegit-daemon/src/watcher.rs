use filegit_core::Watchlist;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, FileIdMap};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Watches the parent directories of every watchlisted file and forwards the
/// watchlisted paths that may have changed.
///
/// The watchlist is captured at construction; later edits are not picked up.
pub struct FileWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher, FileIdMap>,
    watched_dirs: usize,
}

impl FileWatcher {
    pub fn new(
        watchlist: &Watchlist,
        debounce: Duration,
        tx: mpsc::Sender<PathBuf>,
    ) -> anyhow::Result<Self> {
        let filter = watchlist.clone();

        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events {
                        for path in Self::relevant_paths(&event.event, &filter) {
                            if let Err(e) = tx.blocking_send(path) {
                                error!("Failed to send event: {}", e);
                            }
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        error!("Watch error: {:?}", error);
                    }
                }
            }
        })?;

        let mut watched_dirs = 0;
        for dir in watchlist.parent_dirs() {
            if !dir.is_dir() {
                warn!("Directory not found, cannot watch: {:?}", dir);
                continue;
            }
            debouncer
                .watcher()
                .watch(&dir, RecursiveMode::NonRecursive)?;
            debouncer.cache().add_root(&dir, RecursiveMode::NonRecursive);
            watched_dirs += 1;
        }

        info!(
            "File watcher started for {} file(s) in {} directory(ies)",
            watchlist.len(),
            watched_dirs
        );

        Ok(Self {
            _debouncer: debouncer,
            watched_dirs,
        })
    }

    pub fn watched_dirs(&self) -> usize {
        self.watched_dirs
    }

    /// Paths in `event` that are watchlisted and whose content may differ.
    fn relevant_paths(event: &Event, watchlist: &Watchlist) -> Vec<PathBuf> {
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => {}
            _ => return Vec::new(),
        }

        let mut paths: Vec<PathBuf> = event
            .paths
            .iter()
            .filter(|p| watchlist.contains(p))
            .cloned()
            .collect();
        paths.dedup();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind, RenameMode};
    use tempfile::TempDir;

    fn watchlist(paths: &[&str]) -> Watchlist {
        let mut list = Watchlist::default();
        for p in paths {
            list.add(PathBuf::from(p));
        }
        list
    }

    #[test]
    fn test_modify_of_watched_file() {
        let list = watchlist(&["/docs/notes.txt"]);
        let event = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from("/docs/notes.txt"))
            .add_path(PathBuf::from("/docs/other.txt"));

        assert_eq!(
            FileWatcher::relevant_paths(&event, &list),
            vec![PathBuf::from("/docs/notes.txt")]
        );
    }

    #[test]
    fn test_rename_into_place_counts() {
        let list = watchlist(&["/docs/notes.txt"]);
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/docs/.notes.txt.swp"))
            .add_path(PathBuf::from("/docs/notes.txt"));

        assert_eq!(
            FileWatcher::relevant_paths(&event, &list),
            vec![PathBuf::from("/docs/notes.txt")]
        );

        let created = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/docs/notes.txt"));
        assert_eq!(FileWatcher::relevant_paths(&created, &list).len(), 1);
    }

    #[test]
    fn test_remove_and_access_ignored() {
        let list = watchlist(&["/docs/notes.txt"]);
        let removed = Event::new(EventKind::Remove(RemoveKind::File))
            .add_path(PathBuf::from("/docs/notes.txt"));
        let accessed = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/docs/notes.txt"));

        assert!(FileWatcher::relevant_paths(&removed, &list).is_empty());
        assert!(FileWatcher::relevant_paths(&accessed, &list).is_empty());
    }

    #[tokio::test]
    async fn test_missing_directories_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let mut list = Watchlist::default();
        list.add(temp_dir.path().join("present.txt"));
        list.add(PathBuf::from("/definitely/not/here/file.txt"));

        let (tx, _rx) = mpsc::channel(8);
        let watcher = FileWatcher::new(&list, Duration::from_millis(50), tx).unwrap();

        assert_eq!(watcher.watched_dirs(), 1);
    }
}
