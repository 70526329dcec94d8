//! iOS Backup Chat Archiver
//!
//! A Rust library for turning the SMS/iMessage history inside an iOS
//! backup into one HTML document per conversation, with attachments
//! copied into a sibling directory and linked from the document.
//!
//! # Pipeline
//!
//! - Extract: read-only queries against the backup's messages and contacts
//!   databases ([`db`])
//! - Assemble: join handles, contacts, messages, and attachments into
//!   per-chat ordered streams ([`assemble`])
//! - Render: write each conversation's document and copy its attachments
//!   out of the backup store ([`html`])

/// Conversation assembly and name resolution
pub mod assemble;
/// Backup-store access and attachment key derivation
pub mod backup;
/// Configuration management
pub mod config;
/// Read-only extraction from the backup databases
pub mod db;
/// Error types
pub mod error;
/// HTML document rendering
pub mod html;
/// Logging setup and utilities
pub mod logging;
/// Run counters
pub mod metrics;
/// Data models and structures
pub mod models;
/// Phone-number normalization
pub mod normalize;
/// Fixed backup database schema
pub mod schema;

// Re-export key components for easier access
pub use backup::{BackupStore, DirBackupStore};
pub use error::{ArchiverError, Result};
pub use models::{Conversation, MessageRecord, RunReport};
