use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Commit not found: {0}")]
    CommitNotFound(i64),

    #[error("File missing: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    #[error("filegit is not initialized at {} (run 'filegit init')", .0.display())]
    NotInitialized(PathBuf),
}

impl Error {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// True for the errors a caller should present as a warning rather than a failure.
    pub fn is_warning(&self) -> bool {
        matches!(self, Error::InvalidState(_) | Error::FileMissing(_))
    }
}
