//! Error types for the ios-chat-archiver library.
//!
//! This module provides custom error types using `thiserror`. Setup errors
//! (missing backup, unreadable databases, unwritable output) are fatal to
//! the run; [`MessageError`] covers the per-message conditions that only
//! drop the affected message.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the ios-chat-archiver application.
#[derive(Error, Debug)]
pub enum ArchiverError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The given backup directory does not exist
    #[error("Backup directory not found: {}", .0.display())]
    BackupRootNotFound(PathBuf),

    /// A content-keyed file is absent from the backup store
    #[error("File not found in backup store: {0}")]
    StoreFileNotFound(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with ArchiverError
pub type Result<T> = std::result::Result<T, ArchiverError>;

impl From<anyhow::Error> for ArchiverError {
    fn from(err: anyhow::Error) -> Self {
        ArchiverError::Other(err.to_string())
    }
}

/// Reasons a single message is dropped during assembly.
///
/// These never abort the conversation; the message is logged with its full
/// record and skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// The sender's handle id has no row in the handle table
    #[error("no contact for sender handle {0}")]
    UnknownHandle(i64),

    /// A stored date offset cannot be represented as a local time
    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(i64),
}
