//! Backup-store access and attachment key derivation.
//!
//! An iOS backup flattens device files into content-keyed names: the file's
//! device path has its domain root rewritten and the result is SHA-1
//! hashed. Older backups keep every file directly in the backup root; newer
//! ones shard files into subdirectories named after the first two
//! characters of the key. The [`BackupStore`] trait keeps the rest of the
//! crate agnostic of which layout it is talking to.

use std::fs;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};
use tracing::warn;

use crate::error::{ArchiverError, Result};

/// Backup-store name of the SMS/iMessage database.
pub const MESSAGES_DB_KEY: &str = "3d0d7e5fb2ce288813306e4d4636395e047a3d28";
/// Backup-store name of the address book database.
pub const CONTACTS_DB_KEY: &str = "31bb7ba8914766d4ba40d6dfb6113c8b614be442";

/// Device-root prefixes that map into the backup's media domain.
const DEVICE_ROOTS: [&str; 2] = ["/var/mobile/", "~/"];
/// Domain prefix the backup tool substitutes for the device root.
const MEDIA_DOMAIN: &str = "MediaDomain-";

/// Derive the backup-store name of a device file.
///
/// The device root must be removed as an exact prefix — the remainder of
/// the path is hashed verbatim, so eating even one extra character produces
/// a key the store has never heard of. Paths outside the recognized roots
/// log a warning and derive `None`, which surfaces downstream as a missing
/// attachment.
#[must_use]
pub fn derive_backup_key(device_path: &str) -> Option<String> {
    let Some(relative) = DEVICE_ROOTS
        .iter()
        .find_map(|root| device_path.strip_prefix(root))
    else {
        warn!(path = device_path, "bad filename in the attachments table");
        return None;
    };

    let mut hasher = Sha1::new();
    hasher.update(MEDIA_DOMAIN.as_bytes());
    hasher.update(relative.as_bytes());
    Some(hex::encode(hasher.finalize()))
}

/// Read and copy access to the files of one backup.
pub trait BackupStore {
    /// Find a stored file by its content key, trying the flat layout first
    /// and the two-character shard layout second.
    fn locate(&self, key: &str) -> Option<PathBuf>;

    /// Copy the stored file named `key` to `dest`.
    fn copy_to(&self, key: &str, dest: &Path) -> Result<()>;
}

/// A backup rooted at a local directory.
#[derive(Debug, Clone)]
pub struct DirBackupStore {
    root: PathBuf,
}

impl DirBackupStore {
    /// Open a backup directory, verifying it exists.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ArchiverError::BackupRootNotFound(root));
        }
        Ok(Self { root })
    }

    /// Path of the messages database inside this backup.
    pub fn messages_db(&self) -> Result<PathBuf> {
        self.locate(MESSAGES_DB_KEY)
            .ok_or_else(|| ArchiverError::StoreFileNotFound(MESSAGES_DB_KEY.to_string()))
    }

    /// Path of the address book database inside this backup.
    pub fn contacts_db(&self) -> Result<PathBuf> {
        self.locate(CONTACTS_DB_KEY)
            .ok_or_else(|| ArchiverError::StoreFileNotFound(CONTACTS_DB_KEY.to_string()))
    }
}

impl BackupStore for DirBackupStore {
    fn locate(&self, key: &str) -> Option<PathBuf> {
        if key.len() < 2 {
            return None;
        }
        let flat = self.root.join(key);
        if flat.is_file() {
            return Some(flat);
        }
        let sharded = self.root.join(&key[..2]).join(key);
        sharded.is_file().then_some(sharded)
    }

    fn copy_to(&self, key: &str, dest: &Path) -> Result<()> {
        let source = self
            .locate(key)
            .ok_or_else(|| ArchiverError::StoreFileNotFound(key.to_string()))?;
        fs::copy(&source, dest)?;
        Ok(())
    }
}
