//! # Backup Object Storage
//!
//! Backup files on disk, one namespace (directory) per admin.
//!
//! ```text
//! <root>/
//! └── <admin id>/
//!     ├── madeh-hardware-backup-2024-06-15-090507.json
//!     └── madeh-hardware-backup-2024-06-16-174210.json
//! ```

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use madeh_core::backup::{is_backup_file_name, BackupDocument, BackupInfo};
use madeh_core::CoreError;

#[derive(Debug, Clone)]
pub struct BackupStore {
    root: PathBuf,
}

impl BackupStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BackupStore { root: root.into() }
    }

    /// Writes a backup under the admin's namespace.
    pub async fn save(&self, admin_id: &str, document: &BackupDocument) -> DbResult<BackupInfo> {
        let dir = self.namespace(admin_id)?;
        fs::create_dir_all(&dir).await?;

        let name = document.file_name();
        let json = document.to_json()?;
        let path = dir.join(&name);
        fs::write(&path, json.as_bytes()).await?;

        info!(admin_id = %admin_id, name = %name, bytes = json.len(), "Backup stored");

        Ok(BackupInfo {
            name,
            size_bytes: json.len() as u64,
            modified_at: Some(Utc::now()),
        })
    }

    /// Lists the admin's backups, newest first.
    ///
    /// Never fails: a storage error is logged and yields an empty list.
    pub async fn list(&self, admin_id: &str) -> Vec<BackupInfo> {
        match self.try_list(admin_id).await {
            Ok(list) => list,
            Err(err) => {
                warn!(admin_id = %admin_id, error = %err, "Listing backups failed");
                Vec::new()
            }
        }
    }

    async fn try_list(&self, admin_id: &str) -> DbResult<Vec<BackupInfo>> {
        let dir = self.namespace(admin_id)?;
        let mut entries = fs::read_dir(&dir).await?;
        let mut backups = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_backup_file_name(&name) {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            backups.push(BackupInfo {
                name,
                size_bytes: metadata.len(),
                modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        // Names embed the timestamp, so name order is time order.
        backups.sort_by(|a, b| b.name.cmp(&a.name));
        debug!(admin_id = %admin_id, count = backups.len(), "Listed backups");
        Ok(backups)
    }

    /// Reads and parses a stored backup.
    pub async fn load(&self, admin_id: &str, name: &str) -> DbResult<BackupDocument> {
        if !is_backup_file_name(name) {
            return Err(DbError::not_found("Backup", name));
        }
        let path = self.namespace(admin_id)?.join(name);

        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(DbError::not_found("Backup", name));
            }
            Err(err) => return Err(err.into()),
        };

        Ok(BackupDocument::from_json(&text)?)
    }

    fn namespace(&self, admin_id: &str) -> DbResult<PathBuf> {
        let safe = !admin_id.is_empty()
            && admin_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !safe {
            return Err(CoreError::InvalidBackup(format!("invalid namespace '{admin_id}'")).into());
        }
        Ok(self.root.join(admin_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
