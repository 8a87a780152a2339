//! # Deletion Executor Module
//!
//! Questo modulo esegue le cancellazioni a batch con rate limiting.
//!
//! ## Responsabilità:
//! - `delete_one()`: una singola cancellazione permanente (o simulata in dry run)
//! - `delete_batch()`: tutti gli id di un `BackupFile`, a batch, con pause
//! - Aggregazione dei risultati in `DeletionOutcome`
//!
//! ## Regole:
//! - Dry run: nessuna chiamata di rete, ogni id risulta cancellato
//! - Live: `DELETE ?force=true`; 2xx → deleted, qualsiasi altro esito → failed
//! - Un fallimento non interrompe il batch e non viene ritentato nella stessa run
//! - Pausa breve dopo ogni cancellazione, pausa lunga tra batch
//! - Interruzione (Ctrl-C): gli id già processati restano tali, i rimanenti
//!   vengono contati come `skipped`, nessun rollback

use crate::backup::BackupFile;
use crate::client::SiteApi;
use crate::progress::{DeletionOutcome, ProgressManager};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Shared flag raised when the user asks to stop
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Rate-limited, dry-run-gated media deletion
pub struct DeletionExecutor<'a> {
    api: &'a dyn SiteApi,
    dry_run: bool,
    request_delay: Duration,
    batch_pause: Duration,
    cancel: CancelFlag,
}

impl<'a> DeletionExecutor<'a> {
    pub fn new(api: &'a dyn SiteApi, dry_run: bool, request_delay: Duration, batch_pause: Duration) -> Self {
        Self {
            api,
            dry_run,
            request_delay,
            batch_pause,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Delete a single media item; returns whether it is gone
    pub async fn delete_one(&self, media_id: u64, title: &str) -> bool {
        if self.dry_run {
            info!("🔄 DRY RUN: Would delete image {}", media_id);
            return true;
        }

        match self.api.delete_media(media_id).await {
            Ok(()) => {
                info!("✅ Deleted: {} (ID: {})", title, media_id);
                true
            }
            Err(e) => {
                error!("❌ Failed to delete {} (ID: {}): {}", title, media_id, e);
                false
            }
        }
    }

    /// Delete every media item recorded in `backup`
    pub async fn delete_batch(&self, backup: &BackupFile, batch_size: usize) -> DeletionOutcome {
        let entries = backup.entries();
        let batch_size = batch_size.max(1);
        let mut outcome = DeletionOutcome::new(entries.len());

        if entries.is_empty() {
            return outcome;
        }

        let progress = ProgressManager::new(entries.len() as u64);
        let batch_count = entries.len().div_ceil(batch_size);

        'batches: for (index, batch) in entries.chunks(batch_size).enumerate() {
            info!("🗑️ Processing batch {}: {} images", index + 1, batch.len());

            for entry in batch {
                if self.cancel.is_cancelled() {
                    break 'batches;
                }

                if self.delete_one(entry.id, &entry.title).await {
                    outcome.add_deleted(entry.file_size);
                    progress.update(&format!("✅ {}", entry.id));
                } else {
                    outcome.add_failed();
                    progress.update(&format!("❌ {}", entry.id));
                }

                tokio::time::sleep(self.request_delay).await;
            }

            if index + 1 < batch_count && !self.cancel.is_cancelled() {
                info!("⏸️ Pausing between batches...");
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        let remaining = outcome.total - outcome.processed();
        if remaining > 0 {
            warn!("⚠️ Deletion interrupted, {} images left untouched", remaining);
            outcome.add_skipped(remaining);
            outcome.interrupted = true;
        }

        progress.finish(&outcome.format_summary());
        outcome
    }
}
