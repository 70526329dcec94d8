//! Read-only extraction from the backup's SQLite stores.
//!
//! Five independent operations, each a single connect-query-close cycle
//! against one of the two databases. The stores are static snapshots, so
//! nothing retries; any SQLite failure (including a missing table or
//! column) is fatal to the run.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use rusqlite::{Connection, OpenFlags, Row};
use tracing::debug;

use crate::backup::derive_backup_key;
use crate::error::Result;
use crate::models::{AttachmentRef, MessageRecord};
use crate::normalize::normalize_phone_number;
use crate::schema::{
    ab_multi_value, ab_person, attachment, chat, chat_handle_join, chat_message_join, handle,
    message, message_attachment_join,
};

/// Raw date values above this are nanosecond-scale and get divided down.
pub const NANOSECOND_THRESHOLD: i64 = 1_000_000_000;

/// Placeholder contact for the handle id 0 that some schema versions put on
/// a message without a matching handle row.
pub const UNKNOWN_HANDLE_CONTACT: &str = "me-or-null";

/// Scale a raw date column to seconds.
///
/// Newer backup schema versions store nanoseconds, older ones seconds; the
/// scales differ enough that magnitude alone tells them apart. Sent and
/// read dates are scaled independently.
#[must_use]
pub const fn scale_to_seconds(raw: i64) -> i64 {
    if raw > NANOSECOND_THRESHOLD {
        raw / NANOSECOND_THRESHOLD
    } else {
        raw
    }
}

fn open_read_only(path: &Path) -> Result<Connection> {
    Ok(Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?)
}

/// Map every handle row to its raw contact string.
///
/// Stored numbers keep their leading `+` in the handle table; it is
/// stripped here so keys line up with the normalized contacts map.
pub fn handle_to_contact(db_path: &Path) -> Result<HashMap<i64, String>> {
    let conn = open_read_only(db_path)?;
    let sql = format!(
        "SELECT {rowid}, {id} FROM {table}",
        rowid = handle::ROWID,
        id = handle::ID,
        table = handle::TABLE,
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;

    let mut map = HashMap::new();
    for row in rows {
        let (handle_id, contact) = row?;
        let contact = contact.strip_prefix('+').unwrap_or(&contact).to_string();
        map.insert(handle_id, contact);
    }
    // iOS 10 sometimes records handle 0 on a message with no handle row.
    map.entry(0).or_insert_with(|| UNKNOWN_HANDLE_CONTACT.to_string());
    debug!(handles = map.len(), "loaded handle table");
    Ok(map)
}

/// Map each chat identifier to its participant handle ids, in query order.
pub fn contacts_in_chat(db_path: &Path) -> Result<BTreeMap<String, Vec<i64>>> {
    let conn = open_read_only(db_path)?;
    let sql = format!(
        "SELECT {j}.{chat_id}, {j}.{handle_id}, {c}.{ident} \
         FROM {j} \
         INNER JOIN {c} ON {j}.{chat_id} = {c}.{rowid} \
         ORDER BY {c}.{ident} ASC",
        j = chat_handle_join::TABLE,
        chat_id = chat_handle_join::CHAT_ID,
        handle_id = chat_handle_join::HANDLE_ID,
        c = chat::TABLE,
        ident = chat::CHAT_IDENTIFIER,
        rowid = chat::ROWID,
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(1)?, row.get::<_, String>(2)?))
    })?;

    let mut participants: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for row in rows {
        let (handle_id, chat_identifier) = row?;
        participants.entry(chat_identifier).or_default().push(handle_id);
    }
    debug!(chats = participants.len(), "loaded chat participants");
    Ok(participants)
}

/// Map each chat identifier to its messages, ascending message id order.
///
/// Timestamp downscaling happens here, per row and per field, so everything
/// downstream sees seconds.
pub fn chat_conversations(db_path: &Path) -> Result<BTreeMap<String, Vec<MessageRecord>>> {
    let conn = open_read_only(db_path)?;
    let sql = format!(
        "SELECT {m}.{text}, {m}.{handle_id}, {m}.{service}, {m}.{date}, {m}.{date_read}, \
                {m}.{from_me}, {m}.{is_read}, {j}.{chat_id}, {j}.{message_id}, {c}.{ident} \
         FROM {m} \
         INNER JOIN {j} ON {m}.{rowid} = {j}.{message_id} \
         INNER JOIN {c} ON {j}.{chat_id} = {c}.{chat_rowid} \
         ORDER BY {j}.{message_id} ASC",
        m = message::TABLE,
        text = message::TEXT,
        handle_id = message::HANDLE_ID,
        service = message::SERVICE,
        date = message::DATE,
        date_read = message::DATE_READ,
        from_me = message::IS_FROM_ME,
        is_read = message::IS_READ,
        rowid = message::ROWID,
        j = chat_message_join::TABLE,
        chat_id = chat_message_join::CHAT_ID,
        message_id = chat_message_join::MESSAGE_ID,
        c = chat::TABLE,
        ident = chat::CHAT_IDENTIFIER,
        chat_rowid = chat::ROWID,
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_message_record)?;

    let mut conversations: BTreeMap<String, Vec<MessageRecord>> = BTreeMap::new();
    for row in rows {
        let record = row?;
        conversations
            .entry(record.chat_identifier.clone())
            .or_default()
            .push(record);
    }
    debug!(chats = conversations.len(), "loaded conversations");
    Ok(conversations)
}

fn map_message_record(row: &Row) -> rusqlite::Result<MessageRecord> {
    Ok(MessageRecord {
        text: row.get(0)?,
        handle_id: row.get(1)?,
        service: row.get(2)?,
        date: scale_to_seconds(row.get(3)?),
        date_read: scale_to_seconds(row.get(4)?),
        is_from_me: row.get(5)?,
        is_read: row.get(6)?,
        chat_id: row.get(7)?,
        message_id: row.get(8)?,
        chat_identifier: row.get(9)?,
    })
}

/// Map each message id to its attachment descriptors.
pub fn message_attachments(db_path: &Path) -> Result<BTreeMap<i64, Vec<AttachmentRef>>> {
    let conn = open_read_only(db_path)?;
    let sql = format!(
        "SELECT {j}.{message_id}, {a}.{filename} \
         FROM {j} \
         INNER JOIN {a} ON {j}.{attachment_id} = {a}.{rowid}",
        j = message_attachment_join::TABLE,
        message_id = message_attachment_join::MESSAGE_ID,
        attachment_id = message_attachment_join::ATTACHMENT_ID,
        a = attachment::TABLE,
        filename = attachment::FILENAME,
        rowid = attachment::ROWID,
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;

    let mut attachments: BTreeMap<i64, Vec<AttachmentRef>> = BTreeMap::new();
    for row in rows {
        let (message_id, device_path) = row?;
        let original_name = device_path
            .rsplit('/')
            .next()
            .unwrap_or(device_path.as_str())
            .to_string();
        attachments.entry(message_id).or_default().push(AttachmentRef {
            backup_key: derive_backup_key(&device_path),
            original_name,
        });
    }
    debug!(messages = attachments.len(), "loaded attachment table");
    Ok(attachments)
}

/// Map normalized contact keys (phone or email) to display names.
///
/// Two passes over the multi-value table, one per property type. A row
/// resolves to "First Last" when either name part is present, else the
/// organization; rows with neither are skipped so lookups fall back to the
/// raw contact key.
pub fn contacts_map(db_path: &Path) -> Result<HashMap<String, String>> {
    let conn = open_read_only(db_path)?;
    let mut contacts = HashMap::new();
    load_contact_values(&conn, ab_multi_value::PROPERTY_EMAIL, false, &mut contacts)?;
    load_contact_values(&conn, ab_multi_value::PROPERTY_PHONE, true, &mut contacts)?;
    debug!(contacts = contacts.len(), "loaded address book");
    Ok(contacts)
}

fn load_contact_values(
    conn: &Connection,
    property: i64,
    normalize: bool,
    contacts: &mut HashMap<String, String>,
) -> Result<()> {
    let sql = format!(
        "SELECT {mv}.{value}, {p}.{first}, {p}.{last}, {p}.{org} \
         FROM {mv} \
         LEFT JOIN {p} ON {mv}.{record_id} = {p}.{rowid} \
         WHERE {mv}.{prop} = ?",
        mv = ab_multi_value::TABLE,
        value = ab_multi_value::VALUE,
        record_id = ab_multi_value::RECORD_ID,
        prop = ab_multi_value::PROPERTY,
        p = ab_person::TABLE,
        rowid = ab_person::ROWID,
        first = ab_person::FIRST,
        last = ab_person::LAST,
        org = ab_person::ORGANIZATION,
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([property], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;

    for row in rows {
        let (value, first, last, organization) = row?;
        let Some(display) = display_name(first, last, organization) else {
            continue;
        };
        let key = if normalize {
            normalize_phone_number(&value)
        } else {
            value
        };
        contacts.insert(key, display);
    }
    Ok(())
}

/// "First Last" when either part is present, else the organization.
fn display_name(
    first: Option<String>,
    last: Option<String>,
    organization: Option<String>,
) -> Option<String> {
    let names: Vec<String> = [first, last].into_iter().flatten().collect();
    if names.is_empty() {
        organization
    } else {
        Some(names.join(" "))
    }
}
