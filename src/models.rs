//! Data models for conversation archiving.
//!
//! The backup databases are read into the typed records here rather than
//! dynamically-keyed row maps, so a column mix-up fails at compile time.
//! Entities are immutable once the extractor returns them.

use crate::error::MessageError;

/// One message row joined with its chat, typed.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    /// Message ROWID; messages are ordered by this within a chat
    pub message_id: i64,
    /// Internal integer id of the owning chat
    pub chat_id: i64,
    /// String identifier shared by the SMS and iMessage sides of a chat
    pub chat_identifier: String,
    /// Sender's handle id; 0 is a sentinel for "unknown/self"
    pub handle_id: i64,
    /// Message body, absent for attachment-only messages
    pub text: Option<String>,
    /// `SMS` or `iMessage`
    pub service: String,
    /// Sent time, in seconds since the 2001-01-01T00:00:00Z anchor
    pub date: i64,
    /// Read time in seconds since the anchor; 0 when unknown
    pub date_read: i64,
    /// True when the device owner sent the message
    pub is_from_me: bool,
    /// True when the message was read (or the backup recorded it as such)
    pub is_read: bool,
}

/// An attachment joined to its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    /// Content-derived backup-store key; `None` when the device path had an
    /// unrecognized root
    pub backup_key: Option<String>,
    /// Basename of the file on the device filesystem
    pub original_name: String,
}

impl AttachmentRef {
    /// Name the copied file gets inside the conversation's attachment
    /// directory. The key prefix keeps same-named originals from different
    /// messages from colliding.
    #[must_use]
    pub fn unique_name(&self) -> String {
        match &self.backup_key {
            Some(key) => format!("{key}-{}", self.original_name),
            None => self.original_name.clone(),
        }
    }
}

/// Who sent a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sender {
    /// The device owner
    Me,
    /// A resolved participant, keeping the raw contact it resolved from
    Them {
        /// Display name after address-book resolution
        name: String,
        /// Raw contact key (normalized number or email)
        contact: String,
    },
}

/// A message after sender resolution and timestamp formatting.
#[derive(Debug, Clone)]
pub struct ArchivedMessage {
    /// Message ROWID, kept for logging
    pub message_id: i64,
    /// Resolved sender
    pub sender: Sender,
    /// `SMS` or `iMessage`
    pub service: String,
    /// Local-time sent timestamp, `YYYY-MM-DD HH:MM:SS <tz>`
    pub sent_time: String,
    /// Message body, absent for attachment-only messages
    pub text: Option<String>,
    /// Attachments joined to this message, in query order
    pub attachments: Vec<AttachmentRef>,
    /// Local-time read timestamp; present only for read iMessages with a
    /// known read time
    pub read_time: Option<String>,
}

/// A message the assembler had to drop, with the reason.
#[derive(Debug, Clone)]
pub struct MessageFailure {
    /// The offending record, kept whole for the log dump
    pub record: MessageRecord,
    /// Why assembly failed
    pub reason: MessageError,
}

/// Outcome of assembling one message.
pub type MessageOutcome = std::result::Result<ArchivedMessage, MessageFailure>;

/// A fully assembled conversation, ready to render.
#[derive(Debug)]
pub struct Conversation {
    /// String identifier of the chat
    pub chat_identifier: String,
    /// Deduplicated participant display names, first-occurrence order
    pub participants: Vec<String>,
    /// Shared filesystem base for the document and its attachment directory
    pub file_base: String,
    /// Per-message outcomes, ascending message id order
    pub messages: Vec<MessageOutcome>,
}

/// Counters accumulated over a whole run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Conversation documents written
    pub conversations_written: usize,
    /// Messages rendered into documents
    pub messages_archived: usize,
    /// Messages dropped by per-message failure isolation
    pub messages_skipped: usize,
    /// Attachment files copied next to their documents
    pub attachments_copied: usize,
    /// Attachments referenced but absent from the backup store
    pub attachments_missing: usize,
}
