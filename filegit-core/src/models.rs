use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::io::Read;
use std::path::PathBuf;

/// Hex length of a SHA-256 digest.
pub const DIGEST_LEN: usize = 64;

/// Lowercase hex SHA-256 of a blob's bytes; doubles as its storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    pub fn of(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        Self(hex::encode(hasher.finalize()))
    }

    pub fn from_reader<R: Read>(mut reader: R) -> std::io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Self(hex::encode(hasher.finalize())))
    }

    pub fn parse(s: &str) -> Result<Self> {
        if Self::is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::InvalidDigest(s.to_string()))
        }
    }

    pub fn is_valid(s: &str) -> bool {
        s.len() == DIGEST_LEN
            && s
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl TryFrom<String> for Digest {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a commit came to be. Promotion only ever goes `Auto` -> `Manual`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CommitKind {
    Auto,
    Manual { message: String },
}

impl CommitKind {
    pub fn as_str(&self) -> &str {
        match self {
            CommitKind::Auto => "auto",
            CommitKind::Manual { .. } => "manual",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            CommitKind::Auto => None,
            CommitKind::Manual { message } => Some(message),
        }
    }

    /// Rebuilds the kind from the flat `type` and `message` columns.
    pub fn from_columns(kind: &str, message: Option<String>) -> Option<Self> {
        match kind {
            "auto" => Some(CommitKind::Auto),
            "manual" => Some(CommitKind::Manual {
                message: message.unwrap_or_default(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: i64,
    pub file_path: PathBuf,
    pub digest: Digest,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: CommitKind,
}

impl Commit {
    pub fn is_manual(&self) -> bool {
        matches!(self.kind, CommitKind::Manual { .. })
    }

    pub fn message(&self) -> Option<&str> {
        self.kind.message()
    }
}

/// One row of `filegit status`: a path that has at least one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub file_path: PathBuf,
    pub commit_count: usize,
    pub latest_digest: Digest,
    pub latest_timestamp: DateTime<Utc>,
}

/// Timestamps are stored as fixed-width UTC strings so they sort lexically.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Only timestamps carrying an offset are accepted; see
/// [`parse_naive_timestamp`] for offset-less ones.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Reads an offset-less ISO-8601 timestamp as wall-clock time in `tz`.
pub fn parse_naive_timestamp<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    let local = naive.and_local_timezone(tz.clone()).earliest()?;
    Some(local.with_timezone(&Utc))
}
