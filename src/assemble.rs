//! Joining extracted maps into renderable conversations.
//!
//! The assembler resolves handles through two namespaces — raw handle
//! contact, then address-book display name — and turns each chat's message
//! rows into per-message outcomes. A message that cannot be assembled is
//! logged with its full record and recorded as a failure; the rest of the
//! conversation is unaffected.

use std::collections::{BTreeMap, HashMap};

use chrono::{Local, TimeZone};
use tracing::{error, warn};

use crate::error::MessageError;
use crate::models::{
    ArchivedMessage, AttachmentRef, Conversation, MessageFailure, MessageOutcome, MessageRecord,
    Sender,
};

/// Unix timestamp of the instant message dates are offset from
/// (2001-01-01T00:00:00Z).
pub const DATE_ANCHOR_UNIX_SECS: i64 = 978_307_200;

/// The one service whose read receipts are meaningful.
const READ_RECEIPT_SERVICE: &str = "iMessage";

/// Resolves names and assembles conversations from the extractor's maps.
pub struct Assembler<'a> {
    handle_contacts: &'a HashMap<i64, String>,
    contact_names: &'a HashMap<String, String>,
}

impl<'a> Assembler<'a> {
    /// Build an assembler over the two lookup maps.
    #[must_use]
    pub fn new(
        handle_contacts: &'a HashMap<i64, String>,
        contact_names: &'a HashMap<String, String>,
    ) -> Self {
        Self {
            handle_contacts,
            contact_names,
        }
    }

    /// Assemble every chat in the conversations map, in identifier order.
    #[must_use]
    pub fn assemble_all(
        &self,
        conversations: &BTreeMap<String, Vec<MessageRecord>>,
        participants: &BTreeMap<String, Vec<i64>>,
        attachments: &BTreeMap<i64, Vec<AttachmentRef>>,
    ) -> Vec<Conversation> {
        conversations
            .iter()
            .map(|(chat_identifier, records)| {
                let handles = participants
                    .get(chat_identifier)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                self.assemble_chat(chat_identifier, records, handles, attachments)
            })
            .collect()
    }

    fn assemble_chat(
        &self,
        chat_identifier: &str,
        records: &[MessageRecord],
        participant_handles: &[i64],
        attachments: &BTreeMap<i64, Vec<AttachmentRef>>,
    ) -> Conversation {
        let participants = self.participant_names(chat_identifier, participant_handles);
        let file_base = file_base(chat_identifier, &participants);
        let messages = records
            .iter()
            .map(|record| self.assemble_message(record, attachments))
            .collect();
        Conversation {
            chat_identifier: chat_identifier.to_string(),
            participants,
            file_base,
            messages,
        }
    }

    /// Resolve and dedup participant display names, keeping first-occurrence
    /// order. A number texted over both SMS and iMessage gets two handles
    /// that resolve to the same name; they must collapse to one entry.
    fn participant_names(&self, chat_identifier: &str, handles: &[i64]) -> Vec<String> {
        let mut names = Vec::new();
        for handle_id in handles {
            let Some(contact) = self.handle_contacts.get(handle_id) else {
                warn!(chat_identifier, handle_id, "participant handle has no handle row");
                continue;
            };
            let name = self.resolve_contact(contact);
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Address-book display name for a raw contact key, falling back to the
    /// key itself when the contact is not in the book.
    fn resolve_contact(&self, contact: &str) -> String {
        self.contact_names
            .get(contact)
            .cloned()
            .unwrap_or_else(|| contact.to_string())
    }

    fn assemble_message(
        &self,
        record: &MessageRecord,
        attachments: &BTreeMap<i64, Vec<AttachmentRef>>,
    ) -> MessageOutcome {
        self.build_message(record, attachments).map_err(|reason| {
            error!(?record, %reason, "skipping message");
            MessageFailure {
                record: record.clone(),
                reason,
            }
        })
    }

    fn build_message(
        &self,
        record: &MessageRecord,
        attachments: &BTreeMap<i64, Vec<AttachmentRef>>,
    ) -> std::result::Result<ArchivedMessage, MessageError> {
        let sender = if record.is_from_me {
            Sender::Me
        } else {
            let contact = self
                .handle_contacts
                .get(&record.handle_id)
                .ok_or(MessageError::UnknownHandle(record.handle_id))?;
            Sender::Them {
                name: self.resolve_contact(contact),
                contact: contact.clone(),
            }
        };

        let sent_time = format_chat_time(record.date)
            .ok_or(MessageError::TimestampOutOfRange(record.date))?;

        let wants_read_time = record.service == READ_RECEIPT_SERVICE
            && record.is_read
            && record.date_read != 0;
        let read_time = if wants_read_time {
            Some(
                format_chat_time(record.date_read)
                    .ok_or(MessageError::TimestampOutOfRange(record.date_read))?,
            )
        } else {
            None
        };

        Ok(ArchivedMessage {
            message_id: record.message_id,
            sender,
            service: record.service.clone(),
            sent_time,
            text: record.text.clone(),
            attachments: attachments
                .get(&record.message_id)
                .cloned()
                .unwrap_or_default(),
            read_time,
        })
    }
}

/// Render a stored chat date offset as local time,
/// `YYYY-MM-DD HH:MM:SS <tz>`.
#[must_use]
pub fn format_chat_time(offset_secs: i64) -> Option<String> {
    let unix = DATE_ANCHOR_UNIX_SECS.checked_add(offset_secs)?;
    let instant = Local.timestamp_opt(unix, 0).single()?;
    Some(instant.format("%Y-%m-%d %H:%M:%S %Z").to_string())
}

/// `<chat-identifier>_<dash-joined-names>`, the shared base for the
/// document and its attachment directory. Spaces inside a name become
/// dashes; names are joined with underscores.
#[must_use]
pub fn file_base(chat_identifier: &str, participants: &[String]) -> String {
    let joined = participants
        .iter()
        .map(|name| name.replace(' ', "-"))
        .collect::<Vec<_>>()
        .join("_");
    format!("{chat_identifier}_{joined}")
}
