use crate::error::{Error, Result};
use crate::models::{
    format_timestamp, parse_naive_timestamp, parse_timestamp, Commit, CommitKind, Digest,
    FileSummary,
};
use chrono::{DateTime, Local, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const SCHEMA_VERSION: i32 = 1;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const COMMIT_COLUMNS: &str = "id, file_path, object_hash, message, timestamp, type";

const NON_CANONICAL_TIMESTAMP: &str = "timestamp NOT GLOB \
    '[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]T[0-9][0-9]:[0-9][0-9]:[0-9][0-9].[0-9][0-9][0-9][0-9][0-9][0-9]Z'";

/// Durable, per-file commit history backed by SQLite.
///
/// The foreground CLI and the daemon each hold their own connection; write
/// serialization between them is left to SQLite (WAL mode plus a busy timeout).
pub struct CommitIndex {
    conn: Connection,
}

impl CommitIndex {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("Index journal mode: {}", mode);

        let mut index = Self { conn };
        index.initialize()?;
        Ok(index)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut index = Self { conn };
        index.initialize()?;
        Ok(index)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS commits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_path TEXT NOT NULL,
                object_hash TEXT NOT NULL,
                message TEXT,
                timestamp TEXT NOT NULL,
                type TEXT NOT NULL DEFAULT 'auto'
            );

            CREATE INDEX IF NOT EXISTS idx_commits_file_timestamp
                ON commits(file_path, timestamp);
            "#,
        )?;

        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version == 0 {
            self.conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }

        self.normalize_timestamps(&Local)?;
        Ok(())
    }

    /// Rewrites every timestamp into the fixed-width UTC form that the
    /// `ORDER BY timestamp` queries rely on. Offset-less values, as written by
    /// earlier versions of the tool, are read as wall-clock time in `tz`.
    pub(crate) fn normalize_timestamps<Tz: TimeZone>(&mut self, tz: &Tz) -> Result<usize> {
        let stale: Vec<(i64, String)> = {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT id, timestamp FROM commits WHERE {NON_CANONICAL_TIMESTAMP}"
            ))?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };
        if stale.is_empty() {
            return Ok(0);
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut fixed = 0;
        for (id, raw) in &stale {
            match parse_timestamp(raw).or_else(|| parse_naive_timestamp(raw, tz)) {
                Some(ts) => {
                    fixed += tx.execute(
                        "UPDATE commits SET timestamp = ?1 WHERE id = ?2 AND timestamp = ?3",
                        params![format_timestamp(&ts), id, raw],
                    )?;
                }
                None => warn!("Commit {} has an unreadable timestamp {:?}", id, raw),
            }
        }
        tx.commit()?;

        if fixed > 0 {
            info!("Normalized {} commit timestamp(s)", fixed);
        }
        Ok(fixed)
    }

    pub fn record(
        &self,
        path: &Path,
        digest: &Digest,
        timestamp: DateTime<Utc>,
        kind: &CommitKind,
    ) -> Result<Commit> {
        self.conn.execute(
            "INSERT INTO commits (file_path, object_hash, message, timestamp, type)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                path.to_string_lossy().as_ref(),
                digest.as_str(),
                kind.message(),
                format_timestamp(&timestamp),
                kind.as_str(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        Ok(Commit {
            id,
            file_path: path.to_path_buf(),
            digest: digest.clone(),
            timestamp,
            kind: kind.clone(),
        })
    }

    pub fn promote(&self, commit_id: i64, message: &str) -> Result<Commit> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::invalid_state("commit message must not be empty"));
        }

        let updated = self.conn.execute(
            "UPDATE commits SET type = 'manual', message = ?1 WHERE id = ?2 AND type = 'auto'",
            params![message, commit_id],
        )?;

        if updated == 0 {
            let existing = self.get(commit_id)?;
            return Err(Error::InvalidState(format!(
                "commit {} is already a manual commit",
                existing.id
            )));
        }

        self.get(commit_id)
    }

    pub fn get(&self, commit_id: i64) -> Result<Commit> {
        self.conn
            .query_row(
                &format!("SELECT {COMMIT_COLUMNS} FROM commits WHERE id = ?1"),
                params![commit_id],
                commit_from_row,
            )
            .optional()?
            .ok_or(Error::CommitNotFound(commit_id))
    }

    pub fn latest(&self, path: &Path) -> Result<Option<Commit>> {
        let commit = self
            .conn
            .query_row(
                &format!(
                    "SELECT {COMMIT_COLUMNS} FROM commits WHERE file_path = ?1
                     ORDER BY timestamp DESC, id DESC LIMIT 1"
                ),
                params![path.to_string_lossy().as_ref()],
                commit_from_row,
            )
            .optional()?;

        Ok(commit)
    }

    pub fn history(&self, path: &Path) -> Result<Vec<Commit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COMMIT_COLUMNS} FROM commits WHERE file_path = ?1
             ORDER BY timestamp DESC, id DESC"
        ))?;

        let commits = stmt
            .query_map(params![path.to_string_lossy().as_ref()], commit_from_row)?
            .collect::<rusqlite::Result<Vec<Commit>>>()?;

        Ok(commits)
    }

    pub fn forget(&self, path: &Path) -> Result<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM commits WHERE file_path = ?1",
            params![path.to_string_lossy().as_ref()],
        )?;
        Ok(deleted)
    }

    pub fn tracked_files(&self) -> Result<Vec<FileSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.file_path, COUNT(*), MAX(c.timestamp),
                    (SELECT l.object_hash FROM commits l WHERE l.file_path = c.file_path
                     ORDER BY l.timestamp DESC, l.id DESC LIMIT 1)
             FROM commits c
             GROUP BY c.file_path
             ORDER BY c.file_path",
        )?;

        let files = stmt
            .query_map([], |row| {
                let file_path: String = row.get(0)?;
                let commit_count: i64 = row.get(1)?;
                let timestamp: String = row.get(2)?;
                let digest: String = row.get(3)?;

                Ok(FileSummary {
                    file_path: PathBuf::from(file_path),
                    commit_count: commit_count as usize,
                    latest_digest: digest_column(3, &digest)?,
                    latest_timestamp: timestamp_column(2, &timestamp)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<FileSummary>>>()?;

        Ok(files)
    }

    pub fn referenced_digests(&self) -> Result<Vec<(i64, Digest)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, object_hash FROM commits ORDER BY id")?;

        let rows = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                let digest: String = row.get(1)?;
                Ok((id, digest_column(1, &digest)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }
}

fn commit_from_row(row: &Row) -> rusqlite::Result<Commit> {
    let id: i64 = row.get(0)?;
    let file_path: String = row.get(1)?;
    let object_hash: String = row.get(2)?;
    let message: Option<String> = row.get(3)?;
    let timestamp: String = row.get(4)?;
    let kind: String = row.get(5)?;

    let kind = CommitKind::from_columns(&kind, message)
        .ok_or_else(|| conversion_error(5, format!("unknown commit type '{kind}'")))?;

    Ok(Commit {
        id,
        file_path: PathBuf::from(file_path),
        digest: digest_column(2, &object_hash)?,
        timestamp: timestamp_column(4, &timestamp)?,
        kind,
    })
}

fn digest_column(idx: usize, value: &str) -> rusqlite::Result<Digest> {
    Digest::parse(value).map_err(|_| conversion_error(idx, format!("invalid digest '{value}'")))
}

fn timestamp_column(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    parse_timestamp(value)
        .ok_or_else(|| conversion_error(idx, format!("invalid timestamp '{value}'")))
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}
