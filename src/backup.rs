//! # Backup Module
//!
//! Questo modulo crea e rilegge i backup JSON dei media inutilizzati.
//!
//! ## Responsabilità:
//! - Snapshot di ogni media inutilizzato in un `BackupEntry`
//! - Scrittura atomica di `image_backup_<timestamp>.json`
//! - Caricamento dell'ultimo backup per l'esecuzione live
//!
//! ## Garanzia di sicurezza:
//! - `BackupFile` si ottiene solo scrivendo o caricando un backup completo
//! - Il `DeletionExecutor` accetta solo un `BackupFile`: nessuna cancellazione
//!   senza un backup per lo stesso identico insieme di id
//!
//! ## Esempio struttura backup:
//! ```json
//! [
//!   {
//!     "id": 1234,
//!     "title": "header-old",
//!     "source_url": "https://example.com.au/wp-content/uploads/2021/03/header-old.jpg",
//!     "date": "2021-03-04T10:11:12",
//!     "file_size": 482133,
//!     "mime_type": "image/jpeg",
//!     "backup_timestamp": "2024-05-01T14:22:03.123456+10:00",
//!     "reason": "unused_image_cleanup"
//!   }
//! ]
//! ```

use crate::error::{CleanupError, Result};
use crate::media::MediaLibrary;
use crate::storage::FileManager;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const BACKUP_PREFIX: &str = "image_backup";
pub const BACKUP_REASON: &str = "unused_image_cleanup";

/// Durable snapshot of one unused media item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    pub id: u64,
    pub title: String,
    pub source_url: String,
    pub date: String,
    pub file_size: u64,
    pub mime_type: String,
    pub backup_timestamp: String,
    pub reason: String,
}

/// A completed backup on disk together with its entries
#[derive(Debug, Clone)]
pub struct BackupFile {
    path: PathBuf,
    entries: Vec<BackupEntry>,
}

impl BackupFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[BackupEntry] {
        &self.entries
    }

    pub fn ids(&self) -> BTreeSet<u64> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.file_size).sum()
    }

    pub fn entry(&self, id: u64) -> Option<&BackupEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

/// Back up the given media ids into a new timestamped file in `dir`
///
/// Ids missing from the library are not backed up and therefore never
/// reach the deletion executor.
pub fn write_backup(dir: &Path, library: &MediaLibrary, ids: &BTreeSet<u64>) -> Result<BackupFile> {
    let backup_timestamp = Local::now().to_rfc3339();

    let entries: Vec<BackupEntry> = ids
        .iter()
        .filter_map(|id| {
            let record = library.get(id);
            if record.is_none() {
                warn!("Media {} not in library, excluded from backup", id);
            }
            record
        })
        .map(|record| BackupEntry {
            id: record.id,
            title: record.title.clone(),
            source_url: record.source_url.clone(),
            date: record.date.clone(),
            file_size: record.file_size,
            mime_type: record.mime_type.clone(),
            backup_timestamp: backup_timestamp.clone(),
            reason: BACKUP_REASON.to_string(),
        })
        .collect();

    let json = serde_json::to_string_pretty(&entries)?;
    let name = FileManager::timestamped_name(BACKUP_PREFIX, "json");
    let path = FileManager::write_atomic(dir, &name, json.as_bytes())?;

    info!("💾 Backup created: {} ({} images)", path.display(), entries.len());
    Ok(BackupFile { path, entries })
}

/// Read and validate a backup file
pub fn load_backup(path: &Path) -> Result<BackupFile> {
    let malformed = |reason: String| CleanupError::MalformedBackup {
        path: path.to_path_buf(),
        reason,
    };

    let content = std::fs::read_to_string(path).map_err(|e| malformed(e.to_string()))?;
    let entries: Vec<BackupEntry> =
        serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))?;

    let mut seen = HashSet::new();
    for entry in &entries {
        if entry.id == 0 {
            return Err(malformed("entry with id 0".to_string()));
        }
        if !seen.insert(entry.id) {
            return Err(malformed(format!("duplicate id {}", entry.id)));
        }
    }

    Ok(BackupFile {
        path: path.to_path_buf(),
        entries,
    })
}

/// Load the most recent backup in `dir`
pub fn load_latest_backup(dir: &Path) -> Result<BackupFile> {
    let prefix = format!("{}_", BACKUP_PREFIX);
    let path = FileManager::find_latest(dir, &prefix, "json")?
        .ok_or_else(|| CleanupError::MissingBackup(dir.to_path_buf()))?;
    info!("📋 Using backup file: {}", path.display());
    load_backup(&path)
}
