//! HTML document rendering and attachment copying.
//!
//! One document per conversation plus a same-named attachment directory.
//! The CSS class names (`sender_me`, `sender_them`, `text`, `attachment`,
//! `readtime`) are part of the output contract. Each message block is
//! built in full before anything is written, so a failure mid-message
//! (say, a copy error) drops that block cleanly instead of leaving a
//! half-written one.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, error};

use crate::backup::BackupStore;
use crate::error::Result;
use crate::models::{ArchivedMessage, AttachmentRef, Conversation, RunReport, Sender};

/// Extensions inlined as images, matched case-insensitively.
const IMAGE_EXTENSIONS: [&str; 5] = ["jpeg", "jpg", "png", "gif", "svg"];

const DOCUMENT_STYLE: &str = "    <style>
        .message {margin: 10 0 10 0;}
        dt.sender_me {font-weight: bold;
                      color: blue;
                      text-decoration: underline;}
        dt.sender_them {font-weight: bold;
                        color: red;
                        text-decoration: underline;}
        dd.text {margin: 0;}
        dd.attachment {margin: 0;}
        dd.readtime {margin: 0;
                     font-size: 80%;
                     font-style: italic;
                     color: grey;}
    </style>
    </head>
    <body>
    <dl>
";

const DOCUMENT_END: &str = "
    </dl>
    </body>
</html>
";

/// Writes one document plus attachment directory per conversation.
pub struct DocumentRenderer<'a, S: BackupStore> {
    store: &'a S,
    output_dir: &'a Path,
}

impl<'a, S: BackupStore> DocumentRenderer<'a, S> {
    /// Build a renderer copying attachments out of `store` into
    /// subdirectories of `output_dir`.
    pub fn new(store: &'a S, output_dir: &'a Path) -> Self {
        Self { store, output_dir }
    }

    /// Render a conversation document and copy its attachments.
    ///
    /// The attachment directory is created even when nothing ends up in it.
    pub fn render(&self, conversation: &Conversation, report: &mut RunReport) -> Result<()> {
        let document_path = self
            .output_dir
            .join(format!("{}.html", conversation.file_base));
        let attachment_dir = self.output_dir.join(&conversation.file_base);
        fs::create_dir_all(&attachment_dir)?;

        let file = File::create(&document_path)?;
        let mut writer = BufWriter::new(file);
        self.write_document(&mut writer, conversation, &attachment_dir, report)?;
        writer.flush()?;

        report.conversations_written += 1;
        debug!(path = %document_path.display(), "wrote conversation document");
        Ok(())
    }

    fn write_document(
        &self,
        writer: &mut impl Write,
        conversation: &Conversation,
        attachment_dir: &Path,
        report: &mut RunReport,
    ) -> Result<()> {
        write_header(writer, &conversation.participants.join(", "))?;

        for outcome in &conversation.messages {
            let Ok(message) = outcome else {
                // Already logged by the assembler.
                report.messages_skipped += 1;
                continue;
            };
            match self.message_block(message, &conversation.file_base, attachment_dir, report) {
                Ok(block) => {
                    writer.write_all(block.as_bytes())?;
                    report.messages_archived += 1;
                }
                Err(err) => {
                    error!(message_id = message.message_id, %err, "failed to render message");
                    report.messages_skipped += 1;
                }
            }
        }

        writer.write_all(DOCUMENT_END.as_bytes())?;
        Ok(())
    }

    /// Build one `<div class="message">` block, copying attachments as a
    /// side effect.
    fn message_block(
        &self,
        message: &ArchivedMessage,
        file_base: &str,
        attachment_dir: &Path,
        report: &mut RunReport,
    ) -> Result<String> {
        let mut parts: Vec<String> = Vec::new();

        match &message.sender {
            Sender::Me => {
                parts.push(format!("<dt class=\"sender_me\">Me [{}]</dt>", message.service));
            }
            Sender::Them { name, contact } => {
                parts.push(format!(
                    "<dt class=\"sender_them\">{name} ({contact}) [{}]</dt>",
                    message.service
                ));
            }
        }

        match &message.text {
            None => parts.push(format!(
                "<dd class=\"text\">[{}] [no text]</dd>",
                message.sent_time
            )),
            Some(text) => parts.push(format!(
                "<dd class=\"text\">[{}] {}</dd>",
                message.sent_time,
                text.replace('\n', "<br>")
            )),
        }

        for attachment in &message.attachments {
            self.attachment_parts(attachment, file_base, attachment_dir, &mut parts, report)?;
        }

        if let Some(read_time) = &message.read_time {
            parts.push(format!("<dd class=\"readtime\">Read at: {read_time}</dd>"));
        }

        Ok(format!("<div class=\"message\">\n{}\n</div>\n", parts.join("\n")))
    }

    /// Copy one attachment and push its markup: an inline image when the
    /// extension says so, always a link, or a missing-attachment notice
    /// when the backup store has no such file.
    fn attachment_parts(
        &self,
        attachment: &AttachmentRef,
        file_base: &str,
        attachment_dir: &Path,
        parts: &mut Vec<String>,
        report: &mut RunReport,
    ) -> Result<()> {
        let unique_name = attachment.unique_name();

        let located = attachment
            .backup_key
            .as_deref()
            .filter(|key| self.store.locate(key).is_some());
        let Some(key) = located else {
            parts.push(format!(
                "<dd class=\"attachment\">Missing attachment ({unique_name}).</dd>"
            ));
            report.attachments_missing += 1;
            return Ok(());
        };

        self.store.copy_to(key, &attachment_dir.join(&unique_name))?;
        report.attachments_copied += 1;

        let link = format!("{file_base}/{unique_name}");
        if is_image(&unique_name) {
            parts.push(format!(
                "<dd class=\"attachment\"><img src=\"{link}\" width=50% /></dd>"
            ));
        }
        parts.push(format!(
            "<dd class=\"attachment\"><a href=\"{link}\">({unique_name})</a></dd>"
        ));
        Ok(())
    }
}

fn write_header(writer: &mut impl Write, participants: &str) -> std::io::Result<()> {
    writeln!(writer, "<html>")?;
    writeln!(writer, "    <head>")?;
    writeln!(writer, "    <title>Conversation with {participants}</title>")?;
    writer.write_all(DOCUMENT_STYLE.as_bytes())
}

fn is_image(name: &str) -> bool {
    name.rsplit('.')
        .next()
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
