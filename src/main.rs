//! Command-line entry point for the archiver.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use ios_chat_archiver::assemble::Assembler;
use ios_chat_archiver::backup::DirBackupStore;
use ios_chat_archiver::config::AppConfig;
use ios_chat_archiver::db;
use ios_chat_archiver::html::DocumentRenderer;
use ios_chat_archiver::logging::{init_logging, OperationTimer, Verbosity};
use ios_chat_archiver::metrics::MetricsCollector;
use ios_chat_archiver::models::RunReport;

/// Archive the SMS/iMessage history in an iOS backup as per-conversation
/// HTML documents with copied attachments.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the backup directory (usually under
    /// ~/Library/Application Support/MobileSync/Backup)
    backup_dir: PathBuf,

    /// Directory where the archive will be stored
    #[arg(short, long)]
    outdir: Option<String>,

    /// File to write logs. If unspecified, stderr
    #[arg(short, long)]
    logfile: Option<PathBuf>,

    /// Turn on debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Turn off all logging. This beats all other log options
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging; the guard keeps the file writer alive
    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);
    let log_file = cli
        .logfile
        .clone()
        .or_else(|| config.logging.file.as_deref().map(PathBuf::from));
    let _log_guard = init_logging(verbosity, log_file.as_deref())?;

    info!("Starting iOS chat archiver");

    let metrics = MetricsCollector::default();
    metrics.describe();

    // Resolve and create the output directory
    let output_dir = expand_home(cli.outdir.as_deref().unwrap_or(&config.output.directory));
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let report = run(&cli.backup_dir, &output_dir)?;
    metrics.record_run(&report);

    info!(
        conversations = report.conversations_written,
        messages = report.messages_archived,
        skipped = report.messages_skipped,
        attachments_copied = report.attachments_copied,
        attachments_missing = report.attachments_missing,
        "Archive complete"
    );
    Ok(())
}

/// Extract, assemble, and render the whole backup, one conversation at a
/// time.
fn run(backup_dir: &Path, output_dir: &Path) -> Result<RunReport> {
    let store = DirBackupStore::open(backup_dir)?;
    let messages_db = store.messages_db()?;
    let contacts_db = store.contacts_db()?;
    debug!(
        messages_db = %messages_db.display(),
        contacts_db = %contacts_db.display(),
        "located backup databases"
    );

    let timer = OperationTimer::new("extract");
    let participants = db::contacts_in_chat(&messages_db)?;
    let handle_contacts = db::handle_to_contact(&messages_db)?;
    let conversations = db::chat_conversations(&messages_db)?;
    let attachments = db::message_attachments(&messages_db)?;
    let contact_names = db::contacts_map(&contacts_db)?;
    timer.finish();
    info!(
        chats = conversations.len(),
        handles = handle_contacts.len(),
        contacts = contact_names.len(),
        "Extraction complete"
    );

    let assembler = Assembler::new(&handle_contacts, &contact_names);
    let assembled = assembler.assemble_all(&conversations, &participants, &attachments);

    let timer = OperationTimer::new("render");
    let renderer = DocumentRenderer::new(&store, output_dir);
    let mut report = RunReport::default();
    for conversation in &assembled {
        renderer.render(conversation, &mut report)?;
    }
    timer.finish();

    Ok(report)
}

/// Expand a leading `~/` against the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map_or_else(|| PathBuf::from(path), |home| home.join(rest)),
        None => PathBuf::from(path),
    }
}
