//! # Backup Document
//!
//! Whole-table snapshot of the catalog and sales history.
//!
//! ```json
//! {
//!   "createdAt": "2024-06-15T09:00:00Z",
//!   "data": {
//!     "products": [...],
//!     "purchases": [...],
//!     "purchase_items": [...]
//!   }
//! }
//! ```
//!
//! Restore order is products → purchases → purchase_items so every foreign key
//! resolves as rows land.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{Product, Purchase, PurchaseItem};

/// File name prefix for stored backups.
pub const BACKUP_FILE_PREFIX: &str = "madeh-hardware-backup-";

/// Table contents of a backup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BackupData {
    pub products: Vec<Product>,
    pub purchases: Vec<Purchase>,
    pub purchase_items: Vec<PurchaseItem>,
}

/// A complete backup document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub data: BackupData,
}

impl BackupDocument {
    pub fn new(data: BackupData) -> Self {
        BackupDocument {
            created_at: Utc::now(),
            data,
        }
    }

    /// Parses a backup, rejecting documents without all three tables.
    pub fn from_json(text: &str) -> CoreResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| CoreError::InvalidBackup(e.to_string()))?;
        Self::from_value(value)
    }

    /// Same as [`from_json`](Self::from_json) for an already-parsed body.
    pub fn from_value(value: serde_json::Value) -> CoreResult<Self> {
        let data = value
            .get("data")
            .ok_or_else(|| CoreError::InvalidBackup("missing data section".to_string()))?;

        for table in ["products", "purchases", "purchase_items"] {
            if !data.get(table).is_some_and(serde_json::Value::is_array) {
                return Err(CoreError::InvalidBackup(format!("missing {table} array")));
            }
        }

        serde_json::from_value(value).map_err(|e| CoreError::InvalidBackup(e.to_string()))
    }

    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::InvalidBackup(e.to_string()))
    }

    /// Storage name, `madeh-hardware-backup-YYYY-MM-DD-HHMMSS.json`.
    pub fn file_name(&self) -> String {
        format!(
            "{}{}.json",
            BACKUP_FILE_PREFIX,
            self.created_at.format("%Y-%m-%d-%H%M%S")
        )
    }
}

/// Whether a stored object name looks like one of our backups.
///
/// Rejects path separators so a name can be joined onto a directory safely.
pub fn is_backup_file_name(name: &str) -> bool {
    name.starts_with(BACKUP_FILE_PREFIX)
        && name.ends_with(".json")
        && !name.contains(|c: char| c == '/' || c == '\\')
        && !name.contains("..")
}

/// A stored backup as listed to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BackupInfo {
    pub name: String,
    pub size_bytes: u64,
    #[ts(as = "Option<String>")]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Rows written by a restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RestoreReport {
    pub products: usize,
    pub purchases: usize,
    pub purchase_items: usize,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rejects_missing_tables() {
        let err = BackupDocument::from_json(r#"{"createdAt":"2024-06-15T09:00:00Z","data":{"products":[],"purchases":[]}}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid backup: missing purchase_items array");

        let err = BackupDocument::from_json(r#"{"createdAt":"2024-06-15T09:00:00Z"}"#).unwrap_err();
        assert!(matches!(err, CoreError::InvalidBackup(_)));

        assert!(BackupDocument::from_json("not json").is_err());
    }

    #[test]
    fn test_parses_empty_backup() {
        let doc = BackupDocument::from_json(
            r#"{"createdAt":"2024-06-15T09:00:00Z","data":{"products":[],"purchases":[],"purchase_items":[]}}"#,
        )
        .unwrap();
        assert_eq!(doc.data, BackupData::default());
    }

    #[test]
    fn test_file_name() {
        let doc = BackupDocument {
            created_at: Utc.with_ymd_and_hms(2024, 6, 15, 9, 5, 7).unwrap(),
            data: BackupData::default(),
        };
        let name = doc.file_name();
        assert_eq!(name, "madeh-hardware-backup-2024-06-15-090507.json");
        assert!(is_backup_file_name(&name));
        assert!(!is_backup_file_name("../madeh-hardware-backup-x.json"));
        assert!(!is_backup_file_name("notes.txt"));
    }

    #[test]
    fn test_uses_camel_case_created_at() {
        let json = BackupDocument::new(BackupData::default()).to_json().unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"purchase_items\""));
    }
}
