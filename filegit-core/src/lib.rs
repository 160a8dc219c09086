//! # filegit-core
//!
//! Core library for filegit - per-file version control with automatic snapshots.
//!
//! File contents live in a content-addressed object store and every version of
//! a tracked file is recorded as a row in a SQLite commit index. The
//! [`Repository`] ties the two together and is what both the CLI and the
//! background daemon call.

pub mod config;
pub mod detector;
pub mod diff;
pub mod engine;
pub mod error;
pub mod index;
pub mod models;
pub mod store;
pub mod timeline;
pub mod watchlist;

pub use config::{Config, Settings};
pub use engine::{FileState, Repository, SnapshotOutcome, VerifyReport};
pub use error::{Error, Result};
pub use models::{Commit, CommitKind, Digest, FileSummary};
pub use timeline::{EntrySource, TimelineEntry};
pub use watchlist::Watchlist;
