//! The snapshot engine: the single entry point the CLI and the daemon use to
//! read and mutate a filegit repository.

use crate::config::{Config, Settings};
use crate::detector;
use crate::diff::EntryDiff;
use crate::error::{Error, Result};
use crate::index::CommitIndex;
use crate::models::{Commit, CommitKind, Digest, FileSummary};
use crate::store::ObjectStore;
use crate::timeline::{self, TimelineEntry};
use crate::watchlist::Watchlist;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Created(Commit),
    NoChange(Commit),
    FileMissing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub commits_checked: usize,
    pub blobs_checked: usize,
    /// Commits whose digest has no blob. Must always be empty.
    pub dangling: Vec<(i64, Digest)>,
    pub corrupt: Vec<Digest>,
    pub orphaned: usize,
}

impl VerifyReport {
    pub fn is_healthy(&self) -> bool {
        self.dangling.is_empty() && self.corrupt.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    UpToDate,
    Modified,
    Deleted,
}

pub struct Repository {
    config: Config,
    store: ObjectStore,
    index: CommitIndex,
}

impl Repository {
    pub fn init(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.root)?;
        let store = ObjectStore::new(&config.objects_dir)?;
        let index = CommitIndex::new(&config.index_path)?;

        if !config.watchlist_path.exists() {
            Watchlist::default().save(&config.watchlist_path)?;
        }
        if !config.settings_path.exists() {
            fs::write(&config.settings_path, Settings::default_file_contents())?;
        }

        info!("Initialized filegit repository at {:?}", config.root);
        Ok(Self {
            config,
            store,
            index,
        })
    }

    pub fn open(config: Config) -> Result<Self> {
        if !config.is_initialized() {
            return Err(Error::NotInitialized(config.root.clone()));
        }

        let store = ObjectStore::new(&config.objects_dir)?;
        let index = CommitIndex::new(&config.index_path)?;

        Ok(Self {
            config,
            store,
            index,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn index(&self) -> &CommitIndex {
        &self.index
    }

    /// Records a new commit for `path` if its content differs from the newest
    /// commit. The blob is written before the index row, so a crash in between
    /// leaves an orphaned blob rather than a commit pointing at nothing.
    pub fn maybe_snapshot(&self, path: &Path, kind: CommitKind) -> Result<SnapshotOutcome> {
        let Some(content) = detector::read_current(path)? else {
            debug!("Snapshot skipped, {:?} does not exist", path);
            return Ok(SnapshotOutcome::FileMissing);
        };

        let current = Digest::of(&content);
        if let Some(latest) = self.index.latest(path)? {
            if latest.digest == current {
                debug!("No change in {:?} since commit {}", path, latest.id);
                return Ok(SnapshotOutcome::NoChange(latest));
            }
        }

        let digest = self.store.put(&content)?;
        let commit = self.index.record(path, &digest, Utc::now(), &kind)?;

        info!(
            "Snapshot {} of {:?}: {} ({})",
            commit.id,
            path,
            digest.short(),
            kind.as_str()
        );
        Ok(SnapshotOutcome::Created(commit))
    }

    pub fn restore(&self, path: &Path, digest: &Digest) -> Result<()> {
        let content = self.store.get(digest)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let tmp_path = path.with_file_name(format!(".{}.filegit-restore", file_name));
        fs::write(&tmp_path, &content)?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        info!("Restored {:?} to {}", path, digest.short());
        Ok(())
    }

    pub fn forget(&self, path: &Path) -> Result<usize> {
        let removed = self.index.forget(path)?;
        info!("Forgot {} commit(s) for {:?}", removed, path);
        Ok(removed)
    }

    pub fn promote(&self, commit_id: i64, message: &str) -> Result<Commit> {
        let commit = self.index.promote(commit_id, message)?;
        info!("Commit {} promoted to manual", commit.id);
        Ok(commit)
    }

    pub fn history(&self, path: &Path) -> Result<Vec<Commit>> {
        self.index.history(path)
    }

    pub fn timeline(&self, path: &Path) -> Result<Vec<TimelineEntry>> {
        let history = self.index.history(path)?;
        let current = detector::current_digest(path)?;
        Ok(timeline::build(history, current, Utc::now()))
    }

    pub fn entry_content(&self, path: &Path, entry: &TimelineEntry) -> Result<Vec<u8>> {
        if entry.is_uncommitted() {
            detector::read_current(path)?.ok_or_else(|| Error::FileMissing(path.to_path_buf()))
        } else {
            self.store.get(&entry.digest)
        }
    }

    pub fn diff_entry(&self, path: &Path, entry: &TimelineEntry) -> Result<EntryDiff> {
        let new = self.entry_content(path, entry)?;
        let old = match &entry.predecessor {
            Some(digest) => Some(self.store.get(digest)?),
            None => None,
        };

        Ok(EntryDiff::between(
            &path.to_string_lossy(),
            old.as_deref(),
            &new,
        ))
    }

    pub fn resolve_digest(&self, path: &Path, reference: &str) -> Result<Digest> {
        if Digest::is_valid(reference) {
            return Digest::parse(reference);
        }
        if reference.len() < 4 {
            return Err(Error::InvalidDigest(reference.to_string()));
        }

        let mut matches: Vec<Digest> = self
            .index
            .history(path)?
            .into_iter()
            .map(|c| c.digest)
            .filter(|d| d.as_str().starts_with(reference))
            .collect();
        matches.sort();
        matches.dedup();

        match matches.len() {
            0 => Err(Error::ObjectNotFound(reference.to_string())),
            1 => Ok(matches.remove(0)),
            n => Err(Error::InvalidState(format!(
                "digest prefix '{}' is ambiguous ({} matches)",
                reference, n
            ))),
        }
    }

    pub fn file_state(&self, path: &Path) -> Result<Option<FileState>> {
        let Some(latest) = self.index.latest(path)? else {
            return Ok(None);
        };
        Ok(Some(match detector::current_digest(path)? {
            None => FileState::Deleted,
            Some(current) if current == latest.digest => FileState::UpToDate,
            Some(_) => FileState::Modified,
        }))
    }

    pub fn tracked_files(&self) -> Result<Vec<FileSummary>> {
        self.index.tracked_files()
    }

    pub fn watchlist(&self) -> Result<Watchlist> {
        Watchlist::load(&self.config.watchlist_path)
    }

    pub fn watch(&self, path: &Path) -> Result<bool> {
        let mut list = self.watchlist()?;
        let added = list.add(path.to_path_buf());
        if added {
            list.save(&self.config.watchlist_path)?;
            info!("Watching {:?}", path);
        }
        Ok(added)
    }

    pub fn unwatch(&self, path: &Path) -> Result<bool> {
        let mut list = self.watchlist()?;
        let removed = list.remove(path);
        if removed {
            list.save(&self.config.watchlist_path)?;
            info!("Stopped watching {:?}", path);
        }
        Ok(removed)
    }

    pub fn verify(&self) -> Result<VerifyReport> {
        let mut report = VerifyReport::default();

        let referenced = self.index.referenced_digests()?;
        report.commits_checked = referenced.len();
        for (id, digest) in &referenced {
            if !self.store.exists(digest) {
                warn!("Commit {} references missing blob {}", id, digest);
                report.dangling.push((*id, digest.clone()));
            }
        }

        let stored = self.store.digests()?;
        report.blobs_checked = stored.len();
        for digest in &stored {
            if !self.store.verify_blob(digest)? {
                warn!("Blob {} does not match its digest", digest);
                report.corrupt.push(digest.clone());
            }
        }

        report.orphaned = stored
            .iter()
            .filter(|d| !referenced.iter().any(|(_, r)| r == *d))
            .count();

        Ok(report)
    }
}
