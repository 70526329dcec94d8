use std::fs;
use std::path::Path;

use rusqlite::Connection;
use tempfile::tempdir;

use ios_chat_archiver::assemble::Assembler;
use ios_chat_archiver::backup::{DirBackupStore, CONTACTS_DB_KEY, MESSAGES_DB_KEY};
use ios_chat_archiver::db;
use ios_chat_archiver::html::DocumentRenderer;
use ios_chat_archiver::models::RunReport;

// sha1("MediaDomain-Library/SMS/Attachments/ab/01/IMG_0001.jpg")
const ATTACHMENT_KEY: &str = "e444b210441957833254a444b25bdc4f264d2d22";

/// Lay out a backup with the messages database flat in the root and the
/// contacts database in the two-character shard layout, so both lookup
/// paths get exercised.
fn build_backup(root: &Path, with_unknown_sender: bool) {
    let messages_path = root.join(MESSAGES_DB_KEY);
    let conn = Connection::open(&messages_path).expect("create messages db");
    conn.execute_batch(
        "CREATE TABLE handle (ROWID INTEGER PRIMARY KEY, id TEXT NOT NULL);
         CREATE TABLE chat (ROWID INTEGER PRIMARY KEY, chat_identifier TEXT NOT NULL);
         CREATE TABLE chat_handle_join (chat_id INTEGER NOT NULL, handle_id INTEGER NOT NULL);
         CREATE TABLE message (ROWID INTEGER PRIMARY KEY, text TEXT, handle_id INTEGER NOT NULL,
                               service TEXT NOT NULL, date INTEGER NOT NULL,
                               date_read INTEGER NOT NULL, is_from_me INTEGER NOT NULL,
                               is_read INTEGER NOT NULL);
         CREATE TABLE chat_message_join (chat_id INTEGER NOT NULL, message_id INTEGER NOT NULL);
         CREATE TABLE attachment (ROWID INTEGER PRIMARY KEY, filename TEXT NOT NULL);
         CREATE TABLE message_attachment_join (message_id INTEGER NOT NULL,
                                               attachment_id INTEGER NOT NULL);

         INSERT INTO handle (ROWID, id) VALUES (1, '+12223334444');
         INSERT INTO handle (ROWID, id) VALUES (2, '12223334444');

         INSERT INTO chat (ROWID, chat_identifier) VALUES (100, 'chat100');
         INSERT INTO chat_handle_join (chat_id, handle_id) VALUES (100, 1);
         INSERT INTO chat_handle_join (chat_id, handle_id) VALUES (100, 2);

         INSERT INTO message (ROWID, text, handle_id, service, date, date_read,
                              is_from_me, is_read)
             VALUES (1, 'Hi there' || char(10) || 'second line', 0, 'iMessage',
                     443000000, 0, 1, 0);
         INSERT INTO message (ROWID, text, handle_id, service, date, date_read,
                              is_from_me, is_read)
             VALUES (2, 'Look at this', 1, 'iMessage', 443000100, 443000200, 0, 1);
         INSERT INTO chat_message_join (chat_id, message_id) VALUES (100, 1);
         INSERT INTO chat_message_join (chat_id, message_id) VALUES (100, 2);

         INSERT INTO attachment (ROWID, filename)
             VALUES (5, '~/Library/SMS/Attachments/ab/01/IMG_0001.jpg');
         INSERT INTO message_attachment_join (message_id, attachment_id) VALUES (2, 5);",
    )
    .expect("populate messages db");
    if with_unknown_sender {
        conn.execute_batch(
            "INSERT INTO message (ROWID, text, handle_id, service, date, date_read,
                                  is_from_me, is_read)
                 VALUES (3, 'mystery', 9, 'SMS', 443000300, 0, 0, 0);
             INSERT INTO chat_message_join (chat_id, message_id) VALUES (100, 3);",
        )
        .expect("insert unknown-sender message");
    }
    drop(conn);

    let contacts_shard = root.join(&CONTACTS_DB_KEY[..2]);
    fs::create_dir(&contacts_shard).expect("create contacts shard");
    let conn = Connection::open(contacts_shard.join(CONTACTS_DB_KEY)).expect("create contacts db");
    conn.execute_batch(
        "CREATE TABLE ABPerson (ROWID INTEGER PRIMARY KEY, first TEXT, last TEXT,
                                organization TEXT);
         CREATE TABLE ABMultiValue (UID INTEGER PRIMARY KEY, record_id INTEGER NOT NULL,
                                    property INTEGER NOT NULL, value TEXT NOT NULL);

         INSERT INTO ABPerson (ROWID, first, last, organization)
             VALUES (1, 'Ada', 'Lovelace', NULL);
         INSERT INTO ABMultiValue (UID, record_id, property, value)
             VALUES (1, 1, 3, '(222) 333-4444');",
    )
    .expect("populate contacts db");
    drop(conn);
}

/// The full pipeline the binary runs: open the store, extract, assemble,
/// render every conversation.
fn archive(root: &Path, out: &Path) -> RunReport {
    let store = DirBackupStore::open(root).expect("open backup");
    let messages_db = store.messages_db().expect("locate messages db");
    let contacts_db = store.contacts_db().expect("locate contacts db");

    let participants = db::contacts_in_chat(&messages_db).expect("participants");
    let handle_contacts = db::handle_to_contact(&messages_db).expect("handles");
    let conversations = db::chat_conversations(&messages_db).expect("conversations");
    let attachments = db::message_attachments(&messages_db).expect("attachments");
    let contact_names = db::contacts_map(&contacts_db).expect("contacts");

    let assembler = Assembler::new(&handle_contacts, &contact_names);
    let assembled = assembler.assemble_all(&conversations, &participants, &attachments);

    let renderer = DocumentRenderer::new(&store, out);
    let mut report = RunReport::default();
    for conversation in &assembled {
        renderer.render(conversation, &mut report).expect("render");
    }
    report
}

#[test]
fn absent_attachment_file_becomes_a_notice() {
    let backup = tempdir().expect("backup dir");
    let out = tempdir().expect("output dir");
    build_backup(backup.path(), false);

    let report = archive(backup.path(), out.path());

    // Both handles resolve to Ada, so the base name carries her once.
    let document = out.path().join("chat100_Ada-Lovelace.html");
    let html = fs::read_to_string(&document).expect("read document");

    assert_eq!(html.matches("<div class=\"message\">").count(), 2);
    assert!(html.contains("<title>Conversation with Ada Lovelace</title>"));
    assert!(html.contains("<dt class=\"sender_me\">Me [iMessage]</dt>"));
    assert!(html.contains("<dt class=\"sender_them\">Ada Lovelace (12223334444) [iMessage]</dt>"));
    assert!(html.contains("Hi there<br>second line"));
    assert!(html.contains("Read at:"));

    // The only attachment markup is the missing notice.
    let notice = format!("Missing attachment ({ATTACHMENT_KEY}-IMG_0001.jpg).");
    assert!(html.contains(&notice));
    assert_eq!(html.matches("class=\"attachment\"").count(), 1);

    // The attachment directory exists but holds nothing.
    let attachment_dir = out.path().join("chat100_Ada-Lovelace");
    assert!(attachment_dir.is_dir());
    assert_eq!(fs::read_dir(&attachment_dir).expect("read dir").count(), 0);

    assert_eq!(
        report,
        RunReport {
            conversations_written: 1,
            messages_archived: 2,
            messages_skipped: 0,
            attachments_copied: 0,
            attachments_missing: 1,
        }
    );
}

#[test]
fn present_attachment_is_copied_linked_and_inlined() {
    let backup = tempdir().expect("backup dir");
    let out = tempdir().expect("output dir");
    build_backup(backup.path(), false);

    // Store the attachment under the shard layout.
    let shard = backup.path().join(&ATTACHMENT_KEY[..2]);
    fs::create_dir(&shard).expect("create shard");
    fs::write(shard.join(ATTACHMENT_KEY), b"jpeg bytes").expect("write attachment");

    let report = archive(backup.path(), out.path());

    let unique_name = format!("{ATTACHMENT_KEY}-IMG_0001.jpg");
    let copied = out.path().join("chat100_Ada-Lovelace").join(&unique_name);
    assert_eq!(fs::read(&copied).expect("read copy"), b"jpeg bytes");

    let html = fs::read_to_string(out.path().join("chat100_Ada-Lovelace.html"))
        .expect("read document");
    let link = format!("chat100_Ada-Lovelace/{unique_name}");
    assert!(html.contains(&format!("<img src=\"{link}\" width=50% />")));
    assert!(html.contains(&format!("<a href=\"{link}\">({unique_name})</a>")));
    assert!(!html.contains("Missing attachment"));

    assert_eq!(report.attachments_copied, 1);
    assert_eq!(report.attachments_missing, 0);
}

#[test]
fn unknown_sender_skips_that_message_only() {
    let backup = tempdir().expect("backup dir");
    let out = tempdir().expect("output dir");
    build_backup(backup.path(), true);

    let report = archive(backup.path(), out.path());

    let html = fs::read_to_string(out.path().join("chat100_Ada-Lovelace.html"))
        .expect("read document");
    assert_eq!(html.matches("<div class=\"message\">").count(), 2);
    assert!(html.contains("Hi there"));
    assert!(html.contains("Look at this"));
    assert!(!html.contains("mystery"));

    assert_eq!(report.messages_archived, 2);
    assert_eq!(report.messages_skipped, 1);
}
