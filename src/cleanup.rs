//! # Cleanup Orchestrator Module
//!
//! Questo è il modulo principale che orchestra tutto il processo di cleanup.
//!
//! ## Responsabilità:
//! - Coordinamento di fetcher, resolver, backup, report e deletion executor
//! - Ogni fase riceve e restituisce valori espliciti (`Inventory`, `Analysis`),
//!   nessuno stato condiviso mutabile
//! - Verifica di connettività prima di ogni percorso distruttivo
//!
//! ## Flusso di esecuzione (`run`):
//! 1. **Connectivity**: root API, media API, probe permesso DELETE
//! 2. **Inventory**: tutta la media library + riferimenti da posts/pages
//! 3. **Resolution**: insieme degli id inutilizzati
//! 4. **Backup**: snapshot JSON completo e sincronizzato su disco
//! 5. **Report**: riepilogo testuale
//! 6. **Deletion**: simulata in dry run, reale altrimenti
//!
//! ## Esecuzione da backup (`execute_from_backup`):
//! - Si cancellano solo gli id presenti nel backup revisionato E ancora
//!   inutilizzati secondo una analisi fresca
//! - Id del backup non più inutilizzati → `stale`, mai cancellati
//! - Nuovi inutilizzati assenti dal backup → ignorati fino alla prossima analisi
//! - Viene scritto un nuovo backup per l'esatto insieme da cancellare
//!
//! ## Ordinamento garantito:
//! backup → report → qualsiasi tentativo di cancellazione
//!
//! ## Interruzione:
//! - Controllata dopo la connettività e dopo l'analisi: se l'utente ha
//!   interrotto, la run termina con `RunResult::Interrupted` senza scrivere
//!   backup o report
//! - Durante la cancellazione gli id rimanenti contano come `skipped`
//!
//! ## Esempio:
//! ```ignore
//! let client = WordPressClient::new(&config)?;
//! let cleanup = ImageCleanup::new(&client, &config);
//! let result = cleanup.run(true).await?; // dry run
//! ```

use crate::{
    backup::{write_backup, BackupFile},
    client::{check_connection, SiteApi},
    config::Config,
    deleter::{CancelFlag, DeletionExecutor},
    error::Result,
    fetcher::ContentFetcher,
    media::{MediaLibrary, ReferenceSet},
    progress::DeletionOutcome,
    report::{write_report, ReportInput},
    resolver::resolve_unused,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};

/// Everything fetched from the site for one run
#[derive(Debug, Clone)]
pub struct Inventory {
    pub library: MediaLibrary,
    pub references: ReferenceSet,
}

/// Inventory plus the unused ids derived from it
#[derive(Debug, Clone)]
pub struct Analysis {
    pub inventory: Inventory,
    pub unused: BTreeSet<u64>,
}

impl Analysis {
    pub fn total_images(&self) -> usize {
        self.inventory.library.len()
    }
}

#[derive(Debug)]
pub enum AnalysisOutcome {
    NoMedia,
    NoUnused { total_images: usize },
    Ready(Analysis),
}

/// What a completed run produced
#[derive(Debug)]
pub struct CleanupSummary {
    pub total_images: usize,
    /// Every image currently unused, which may exceed the backed-up set
    /// when executing an older backup
    pub unused_images: usize,
    pub backup: BackupFile,
    pub report_file: PathBuf,
    pub deletion: DeletionOutcome,
    pub dry_run: bool,
    /// Backed-up ids that are in use again and were left alone
    pub stale: Vec<u64>,
}

#[derive(Debug)]
pub enum RunResult {
    NoMedia,
    NoUnused { total_images: usize },
    /// Every id of the reviewed backup is in use again
    NothingToDelete { stale: Vec<u64> },
    /// Stopped by the user before any backup was written
    Interrupted,
    Completed(CleanupSummary),
}

/// Main cleanup orchestrator
pub struct ImageCleanup<'a> {
    api: &'a dyn SiteApi,
    config: &'a Config,
    cancel: CancelFlag,
}

impl<'a> ImageCleanup<'a> {
    pub fn new(api: &'a dyn SiteApi, config: &'a Config) -> Self {
        Self {
            api,
            config,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    fn fetcher(&self) -> ContentFetcher<'a> {
        ContentFetcher::new(self.api, self.config.page_size, self.config.request_delay())
            .with_cancel_flag(self.cancel.clone())
    }

    fn interrupted(&self) -> bool {
        let cancelled = self.cancel.is_cancelled();
        if cancelled {
            warn!("⚠️ Interrupted by user, no backup written and nothing deleted");
        }
        cancelled
    }

    /// Fetch the media library and, if not empty, all content references
    pub async fn collect_inventory(&self) -> Inventory {
        let fetcher = self.fetcher();
        let library = fetcher.fetch_all_media().await;
        let references = if library.is_empty() {
            ReferenceSet::new()
        } else {
            fetcher.fetch_all_content(&library).await
        };
        Inventory { library, references }
    }

    /// Read-only analysis: inventory and unused resolution
    pub async fn analyse(&self) -> AnalysisOutcome {
        let inventory = self.collect_inventory().await;

        if inventory.library.is_empty() {
            warn!("No media found");
            return AnalysisOutcome::NoMedia;
        }

        let unused = resolve_unused(&inventory.library, &inventory.references);
        if unused.is_empty() {
            info!("✅ No unused images found!");
            return AnalysisOutcome::NoUnused {
                total_images: inventory.library.len(),
            };
        }

        AnalysisOutcome::Ready(Analysis { inventory, unused })
    }

    /// Full pipeline; `dry_run` simulates the deletions
    pub async fn run(&self, dry_run: bool) -> Result<RunResult> {
        info!(
            "🚀 Starting image cleanup ({})",
            if dry_run { "DRY RUN" } else { "LIVE MODE" }
        );

        check_connection(self.api).await?;
        if self.interrupted() {
            return Ok(RunResult::Interrupted);
        }

        let outcome = self.analyse().await;
        if self.interrupted() {
            return Ok(RunResult::Interrupted);
        }

        let analysis = match outcome {
            AnalysisOutcome::NoMedia => return Ok(RunResult::NoMedia),
            AnalysisOutcome::NoUnused { total_images } => {
                return Ok(RunResult::NoUnused { total_images })
            }
            AnalysisOutcome::Ready(analysis) => analysis,
        };

        let ids = analysis.unused.clone();
        let summary = self.backup_report_delete(&analysis, &ids, dry_run, Vec::new()).await?;

        info!("✅ Cleanup process completed!");
        Ok(RunResult::Completed(summary))
    }

    /// Live deletion of the ids recorded in a reviewed backup
    pub async fn execute_from_backup(&self, reviewed: &BackupFile) -> Result<RunResult> {
        info!(
            "🚀 Executing deletion from backup {} ({} images)",
            reviewed.path().display(),
            reviewed.len()
        );

        check_connection(self.api).await?;
        if self.interrupted() {
            return Ok(RunResult::Interrupted);
        }

        let outcome = self.analyse().await;
        if self.interrupted() {
            return Ok(RunResult::Interrupted);
        }

        let analysis = match outcome {
            AnalysisOutcome::NoMedia => return Ok(RunResult::NoMedia),
            AnalysisOutcome::NoUnused { .. } => {
                return Ok(RunResult::NothingToDelete {
                    stale: reviewed.ids().into_iter().collect(),
                })
            }
            AnalysisOutcome::Ready(analysis) => analysis,
        };

        let (ids, stale) = partition_reviewed(&reviewed.ids(), &analysis.unused);
        for id in &stale {
            warn!("Media {} from backup is no longer unused, skipping", id);
        }

        if ids.is_empty() {
            return Ok(RunResult::NothingToDelete { stale });
        }

        let summary = self.backup_report_delete(&analysis, &ids, false, stale).await?;
        info!("✅ Cleanup process completed!");
        Ok(RunResult::Completed(summary))
    }

    async fn backup_report_delete(
        &self,
        analysis: &Analysis,
        ids: &BTreeSet<u64>,
        dry_run: bool,
        stale: Vec<u64>,
    ) -> Result<CleanupSummary> {
        let backup = write_backup(&self.config.output_dir, &analysis.inventory.library, ids)?;

        let report_file = write_report(
            &self.config.output_dir,
            &ReportInput {
                site: self.api.base_url().as_str(),
                dry_run,
                library: &analysis.inventory.library,
                unused: &analysis.unused,
                scheduled: ids,
                referenced_urls: analysis.inventory.references.len(),
            },
        )?;

        let executor = DeletionExecutor::new(
            self.api,
            dry_run,
            self.config.request_delay(),
            self.config.batch_pause(),
        )
        .with_cancel_flag(self.cancel.clone());
        let deletion = executor.delete_batch(&backup, self.config.batch_size).await;

        Ok(CleanupSummary {
            total_images: analysis.total_images(),
            unused_images: analysis.unused.len(),
            backup,
            report_file,
            deletion,
            dry_run,
            stale,
        })
    }
}

/// Split reviewed ids into (still unused, in use again)
pub fn partition_reviewed(reviewed: &BTreeSet<u64>, unused: &BTreeSet<u64>) -> (BTreeSet<u64>, Vec<u64>) {
    let still_unused = reviewed.intersection(unused).copied().collect();
    let stale = reviewed.difference(unused).copied().collect();
    (still_unused, stale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::load_backup;
    use crate::error::CleanupError;
    use crate::testing::{content, raw_media, FakeSite};
    use tempfile::TempDir;

    const A: &str = "https://example.com/wp-content/uploads/a.jpg";
    const B: &str = "https://example.com/wp-content/uploads/b.jpg";
    const B_VARIANT: &str = "https://example.com/wp-content/uploads/b-300x200.jpg";

    fn config(dir: &TempDir) -> Config {
        Config {
            site_url: "https://example.com".to_string(),
            username: "admin".to_string(),
            application_password: "secret".to_string(),
            request_delay_ms: 0,
            batch_pause_ms: 0,
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    fn scenario_site() -> FakeSite {
        let mut site = FakeSite::new("https://example.com");
        site.media = vec![
            raw_media(1, "https://example.com/wp-content/uploads/attached.jpg", 42),
            raw_media(2, A, 0),
            raw_media(3, B, 0),
            raw_media(4, B_VARIANT, 0),
        ];
        site.posts = vec![content(100, &format!(r#"<img src="{}">"#, A))];
        site
    }

    #[tokio::test]
    async fn test_dry_run_backs_up_and_simulates() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let site = scenario_site();

        let result = ImageCleanup::new(&site, &config).run(true).await.unwrap();

        let RunResult::Completed(summary) = result else {
            panic!("expected a completed run");
        };
        assert_eq!(summary.total_images, 4);
        assert_eq!(summary.unused_images, 2);
        assert_eq!(summary.backup.ids(), BTreeSet::from([3, 4]));
        assert_eq!(summary.deletion.deleted, 2);
        assert!(summary.dry_run);
        assert!(summary.report_file.exists());
        assert!(site.delete_attempts().is_empty());
    }

    #[tokio::test]
    async fn test_referenced_original_leaves_nothing_unused() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let mut site = scenario_site();
        site.pages = vec![content(200, &format!(r#"<img src="{}">"#, B))];

        let result = ImageCleanup::new(&site, &config).run(true).await.unwrap();

        assert!(matches!(result, RunResult::NoUnused { total_images: 4 }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_library_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let site = FakeSite::new("https://example.com");

        let result = ImageCleanup::new(&site, &config).run(true).await.unwrap();

        assert!(matches!(result, RunResult::NoMedia));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_connectivity_failure_aborts_before_fetching() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let mut site = scenario_site();
        site.root_status = 503;

        let err = ImageCleanup::new(&site, &config).run(false).await.unwrap_err();

        assert!(matches!(err, CleanupError::Connectivity(_)));
        assert!(site.media_requests.lock().unwrap().is_empty());
        assert!(site.delete_attempts().is_empty());
    }

    #[tokio::test]
    async fn test_live_run_deletes_exactly_the_backed_up_ids() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let site = scenario_site();

        let RunResult::Completed(summary) =
            ImageCleanup::new(&site, &config).run(false).await.unwrap()
        else {
            panic!("expected a completed run");
        };

        let on_disk = load_backup(summary.backup.path()).unwrap();
        let attempted: BTreeSet<u64> = site.delete_attempts().into_iter().collect();
        assert_eq!(on_disk.ids(), attempted);
        assert_eq!(summary.deletion.deleted, site.deleted().len());
    }

    #[tokio::test]
    async fn test_execute_from_backup_skips_stale_ids() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let mut site = scenario_site();

        let RunResult::Completed(first) = ImageCleanup::new(&site, &config).run(true).await.unwrap() else {
            panic!("expected a completed run");
        };
        assert_eq!(first.backup.ids(), BTreeSet::from([3, 4]));

        // Media 4 gets attached to a post after the review
        site.media[3] = raw_media(4, B_VARIANT, 77);

        let RunResult::Completed(second) = ImageCleanup::new(&site, &config)
            .execute_from_backup(&first.backup)
            .await
            .unwrap()
        else {
            panic!("expected a completed run");
        };

        assert_eq!(second.stale, vec![4]);
        assert_eq!(second.backup.ids(), BTreeSet::from([3]));
        assert_ne!(second.backup.path(), first.backup.path());
        assert!(!second.dry_run);
        assert_eq!(site.deleted(), vec![3]);
    }

    #[tokio::test]
    async fn test_execute_from_backup_with_everything_in_use() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let mut site = scenario_site();

        let RunResult::Completed(first) = ImageCleanup::new(&site, &config).run(true).await.unwrap() else {
            panic!("expected a completed run");
        };

        site.pages = vec![content(200, &format!(r#"<img src="{}">"#, B))];
        let result = ImageCleanup::new(&site, &config)
            .execute_from_backup(&first.backup)
            .await
            .unwrap();

        match result {
            RunResult::NothingToDelete { stale } => assert_eq!(stale, vec![3, 4]),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(site.delete_attempts().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_execute_writes_nothing_and_stops_fetching() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let site = scenario_site();

        let RunResult::Completed(first) = ImageCleanup::new(&site, &config).run(true).await.unwrap() else {
            panic!("expected a completed run");
        };
        let files_before = std::fs::read_dir(dir.path()).unwrap().count();
        site.media_requests.lock().unwrap().clear();
        site.content_requests.lock().unwrap().clear();

        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = ImageCleanup::new(&site, &config)
            .with_cancel_flag(cancel)
            .execute_from_backup(&first.backup)
            .await
            .unwrap();

        assert!(matches!(result, RunResult::Interrupted));
        // Only the connectivity check touched the media endpoint
        assert_eq!(*site.media_requests.lock().unwrap(), vec![1]);
        assert!(site.content_requests.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), files_before);
        assert!(site.delete_attempts().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_fetch_skips_backup_and_deletion() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            page_size: 2,
            ..config(&dir)
        };
        let cancel = CancelFlag::new();
        let mut site = scenario_site();
        site.cancel_on_media_page = Some((2, cancel.clone()));

        let result = ImageCleanup::new(&site, &config)
            .with_cancel_flag(cancel)
            .run(false)
            .await
            .unwrap();

        assert!(matches!(result, RunResult::Interrupted));
        assert!(site.content_requests.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(site.delete_attempts().is_empty());
    }

    #[tokio::test]
    async fn test_execute_report_counts_every_unused_image() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let mut site = scenario_site();

        let RunResult::Completed(first) = ImageCleanup::new(&site, &config).run(true).await.unwrap() else {
            panic!("expected a completed run");
        };

        // 4 gets attached, 5 is uploaded and never used
        site.media[3] = raw_media(4, B_VARIANT, 77);
        site.media.push(raw_media(5, "https://example.com/wp-content/uploads/e.jpg", 0));

        let RunResult::Completed(second) = ImageCleanup::new(&site, &config)
            .execute_from_backup(&first.backup)
            .await
            .unwrap()
        else {
            panic!("expected a completed run");
        };

        assert_eq!(second.total_images, 5);
        assert_eq!(second.unused_images, 2);
        assert_eq!(second.backup.ids(), BTreeSet::from([3]));
        assert_eq!(site.deleted(), vec![3]);

        let report = std::fs::read_to_string(&second.report_file).unwrap();
        assert!(report.contains("Used Images: 3"));
        assert!(report.contains("Unused Images: 2"));
        assert!(report.contains("Scheduled for Deletion: 1"));
        assert!(report.contains("ID: 3\n"));
        assert!(!report.contains("ID: 5\n"));
    }

    #[test]
    fn test_partition_reviewed() {
        let reviewed = BTreeSet::from([1, 2, 3]);
        let unused = BTreeSet::from([2, 3, 9]);
        let (ids, stale) = partition_reviewed(&reviewed, &unused);
        assert_eq!(ids, BTreeSet::from([2, 3]));
        assert_eq!(stale, vec![1]);
    }
}
