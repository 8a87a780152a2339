//! # Report Module
//!
//! Questo modulo genera il report testuale di una analisi.
//!
//! ## Contenuto del report:
//! - Sito, data di generazione e modalità (DRY RUN / LIVE DELETION)
//! - Totali: immagini, usate, inutilizzate, da cancellare, URL referenziati,
//!   spazio recuperabile
//! - Dettaglio per ogni media da cancellare (id, titolo, URL, dimensione, data, post)
//!
//! I totali usano tutti i media inutilizzati; il dettaglio e lo spazio
//! recuperabile solo quelli che questa run cancella (in `execute` è il
//! sottoinsieme ancora inutilizzato del backup revisionato).
//!
//! Il file `cleanup_report_<timestamp>.txt` viene scritto atomicamente.

use crate::error::Result;
use crate::media::{MediaLibrary, MediaRecord};
use crate::storage::FileManager;
use chrono::Local;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

pub const REPORT_PREFIX: &str = "cleanup_report";

/// Input of a cleanup report
pub struct ReportInput<'a> {
    pub site: &'a str,
    pub dry_run: bool,
    pub library: &'a MediaLibrary,
    /// All media found unused by the analysis
    pub unused: &'a BTreeSet<u64>,
    /// Media this run backs up and deletes
    pub scheduled: &'a BTreeSet<u64>,
    pub referenced_urls: usize,
}

impl ReportInput<'_> {
    fn reclaimable(&self) -> u64 {
        self.scheduled
            .iter()
            .filter_map(|id| self.library.get(id))
            .map(|record| record.file_size)
            .sum()
    }
}

/// Render the report text
pub fn render_report(input: &ReportInput<'_>) -> String {
    input.to_string()
}

impl fmt::Display for ReportInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "WordPress Image Cleanup Report")?;
        writeln!(f, "{}\n", "=".repeat(50))?;
        writeln!(f, "Site: {}", self.site)?;
        writeln!(f, "Generated: {}", Local::now().to_rfc3339())?;
        writeln!(
            f,
            "Mode: {}\n",
            if self.dry_run { "DRY RUN" } else { "LIVE DELETION" }
        )?;

        writeln!(f, "Summary:")?;
        writeln!(f, "  Total Images: {}", self.library.len())?;
        writeln!(
            f,
            "  Used Images: {}",
            self.library.len().saturating_sub(self.unused.len())
        )?;
        writeln!(f, "  Unused Images: {}", self.unused.len())?;
        writeln!(f, "  Scheduled for Deletion: {}", self.scheduled.len())?;
        writeln!(f, "  Referenced URLs: {}", self.referenced_urls)?;
        writeln!(f, "  Reclaimable: {}\n", FileManager::format_size(self.reclaimable()))?;

        if self.scheduled.is_empty() {
            return Ok(());
        }

        writeln!(f, "Images to Delete:")?;
        writeln!(f, "{}", "-".repeat(30))?;
        for id in self.scheduled {
            writeln!(f, "ID: {}", id)?;
            match self.library.get(id) {
                Some(record) => write_item(f, record)?,
                None => writeln!(f, "  (not in media library)")?,
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

fn write_item(f: &mut fmt::Formatter<'_>, record: &MediaRecord) -> fmt::Result {
    writeln!(f, "  Title: {}", non_empty(&record.title, "No title"))?;
    writeln!(f, "  URL: {}", non_empty(&record.source_url, "No URL"))?;
    writeln!(f, "  Size: {} bytes", record.file_size)?;
    writeln!(f, "  Date: {}", non_empty(&record.date, "Unknown"))?;
    writeln!(f, "  Attached Post: {}", record.post)
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// Write the report into a new timestamped file in `dir`
pub fn write_report(dir: &Path, input: &ReportInput<'_>) -> Result<PathBuf> {
    let name = FileManager::timestamped_name(REPORT_PREFIX, "txt");
    let path = FileManager::write_atomic(dir, &name, render_report(input).as_bytes())?;
    info!("📊 Report generated: {}", path.display());
    Ok(path)
}
