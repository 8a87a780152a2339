//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche di cancellazione.
//!
//! ## Responsabilità:
//! - Progress bar visual con `indicatif` per feedback real-time
//! - Spinner per la paginazione (durata indeterminata)
//! - `DeletionOutcome`: conteggi total/deleted/failed/skipped di una esecuzione
//!
//! ## Invariante:
//! - `deleted + failed + skipped == total` a fine esecuzione, anche se interrotta
//!   (gli id non processati dopo un'interruzione contano come `skipped`)
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:42] [========================>---------------] 24/40 (60%) ✅ 1234
//! ```

use crate::storage::FileManager;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

/// Manages progress reporting for deletions and fetches
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();

        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }

        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));

        spinner
    }
}

/// Aggregated counts of one deletion run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    pub total: usize,
    pub deleted: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Bytes reclaimed by the successful deletions
    pub freed_bytes: u64,
    /// Set when the run was cancelled before processing every id
    pub interrupted: bool,
}

impl DeletionOutcome {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn add_deleted(&mut self, file_size: u64) {
        self.deleted += 1;
        self.freed_bytes += file_size;
    }

    pub fn add_failed(&mut self) {
        self.failed += 1;
    }

    pub fn add_skipped(&mut self, count: usize) {
        self.skipped += count;
    }

    pub fn processed(&self) -> usize {
        self.deleted + self.failed + self.skipped
    }

    pub fn is_complete(&self) -> bool {
        self.processed() == self.total
    }

    pub fn success_rate(&self) -> f64 {
        if self.total > 0 {
            (self.deleted as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Total: {} | Deleted: {} | Failed: {} | Skipped: {} | Freed: {} ({:.1}% success)",
            self.total,
            self.deleted,
            self.failed,
            self.skipped,
            FileManager::format_size(self.freed_bytes),
            self.success_rate()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_counts_balance() {
        let mut outcome = DeletionOutcome::new(5);
        outcome.add_deleted(2048);
        outcome.add_deleted(1024);
        outcome.add_failed();
        assert!(!outcome.is_complete());

        outcome.add_skipped(2);
        assert!(outcome.is_complete());
        assert_eq!(outcome.freed_bytes, 3072);
        assert_eq!(outcome.success_rate(), 40.0);
    }

    #[test]
    fn test_empty_outcome() {
        let outcome = DeletionOutcome::new(0);
        assert!(outcome.is_complete());
        assert_eq!(outcome.success_rate(), 0.0);
        assert!(outcome.format_summary().contains("Total: 0"));
    }
}
