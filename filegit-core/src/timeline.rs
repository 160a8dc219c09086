//! Per-file history as presented to users: the working copy (when it has
//! drifted from the last commit) followed by every commit, newest first.

use crate::models::{Commit, Digest};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "commit", rename_all = "lowercase")]
pub enum EntrySource {
    /// The live file, which differs from the newest commit. Never persisted.
    Uncommitted,
    Commit(Commit),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub source: EntrySource,
    pub digest: Digest,
    /// Digest of the next-older entry, used as the left side of its diff.
    pub predecessor: Option<Digest>,
    pub timestamp: DateTime<Utc>,
}

impl TimelineEntry {
    pub fn is_uncommitted(&self) -> bool {
        matches!(self.source, EntrySource::Uncommitted)
    }

    pub fn commit(&self) -> Option<&Commit> {
        match &self.source {
            EntrySource::Commit(commit) => Some(commit),
            EntrySource::Uncommitted => None,
        }
    }

    pub fn marker(&self) -> &'static str {
        match &self.source {
            EntrySource::Uncommitted => "(temp)",
            EntrySource::Commit(c) if c.is_manual() => "(*)",
            EntrySource::Commit(_) => "(')",
        }
    }
}

/// Assembles a timeline from a newest-first history and the live file digest.
pub fn build(
    history: Vec<Commit>,
    current: Option<Digest>,
    now: DateTime<Utc>,
) -> Vec<TimelineEntry> {
    let head = history.first().map(|c| c.digest.clone());
    let predecessors: Vec<Option<Digest>> = history
        .iter()
        .skip(1)
        .map(|c| Some(c.digest.clone()))
        .chain(std::iter::once(None))
        .collect();

    let mut entries = Vec::with_capacity(history.len() + 1);

    if let Some(current) = current {
        if Some(&current) != head.as_ref() {
            entries.push(TimelineEntry {
                source: EntrySource::Uncommitted,
                digest: current,
                predecessor: head,
                timestamp: now,
            });
        }
    }

    for (commit, predecessor) in history.into_iter().zip(predecessors) {
        entries.push(TimelineEntry {
            digest: commit.digest.clone(),
            timestamp: commit.timestamp,
            predecessor,
            source: EntrySource::Commit(commit),
        });
    }

    entries
}
