//! Error types for keeper operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the store, registry and export
#[derive(Error, Debug)]
pub enum KeeperError {
    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("An account named '{0}' already exists")]
    DuplicateName(String),

    #[error("Account name cannot be empty")]
    InvalidName,

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Not a directory: {}", .0.display())]
    InvalidDirectory(PathBuf),

    #[error("Cannot open storage at {}: {source}", path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, KeeperError>;
