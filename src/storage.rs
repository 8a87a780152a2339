//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file prodotti dal cleanup.
//!
//! ## Responsabilità:
//! - Scrittura atomica di backup, report e log di verifica
//! - Nomi file con timestamp (`<prefisso>_YYYYMMDD_HHMMSS.<ext>`)
//! - Ricerca dell'ultimo file prodotto (ordinamento per nome)
//! - Formattazione human-readable delle dimensioni
//!
//! ## Sicurezza operazioni:
//! - Il contenuto viene scritto in un file temporaneo nella stessa directory,
//!   sincronizzato su disco e poi rinominato: un file con il nome finale è
//!   sempre completo
//! - Un file esistente non viene mai sovrascritto; in caso di collisione
//!   viene aggiunto un suffisso `_NNN` a tre cifre, così l'ordinamento per
//!   nome resta cronologico
//!
//! ## Esempio:
//! ```
//! use wp_image_cleanup::storage::FileManager;
//!
//! # fn main() -> wp_image_cleanup::error::Result<()> {
//! let dir = tempfile::tempdir()?;
//! let name = FileManager::timestamped_name("image_backup", "json");
//! let path = FileManager::write_atomic(dir.path(), &name, b"[]")?;
//! let latest = FileManager::find_latest(dir.path(), "image_backup_", "json")?;
//! assert_eq!(latest, Some(path));
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use chrono::Local;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

const MAX_NAME_ATTEMPTS: usize = 999;

/// Manages file operations for backups, reports and verification logs
pub struct FileManager;

impl FileManager {
    /// `<prefix>_YYYYMMDD_HHMMSS.<ext>` in local time
    pub fn timestamped_name(prefix: &str, ext: &str) -> String {
        format!("{}_{}.{}", prefix, Local::now().format("%Y%m%d_%H%M%S"), ext)
    }

    /// Durably write `contents` to `dir/name`, never leaving a partial file
    pub fn write_atomic(dir: &Path, name: &str, contents: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(contents)?;
        temp.as_file().sync_all()?;

        let (stem, ext) = split_name(name);
        let mut candidate = dir.join(name);
        let mut attempt = 0;

        loop {
            match temp.persist_noclobber(&candidate) {
                Ok(_) => break,
                Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists
                    && attempt < MAX_NAME_ATTEMPTS =>
                {
                    attempt += 1;
                    temp = e.file;
                    candidate = dir.join(format!("{}_{:03}{}", stem, attempt, ext));
                }
                Err(e) => return Err(e.error.into()),
            }
        }

        debug!("Wrote {}", candidate.display());
        Ok(candidate)
    }

    /// Most recent `<prefix>*.<ext>` file in `dir`, by name ordering
    pub fn find_latest(dir: &Path, prefix: &str, ext: &str) -> Result<Option<PathBuf>> {
        if !dir.is_dir() {
            return Ok(None);
        }

        let suffix = format!(".{}", ext);
        let latest = WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                let name = e.file_name().to_string_lossy();
                name.starts_with(prefix) && name.ends_with(&suffix)
            })
            .map(|e| e.into_path())
            .max_by(|a, b| a.file_name().cmp(&b.file_name()));

        Ok(latest)
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
        _ => (name, ""),
    }
}
