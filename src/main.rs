//! # WordPress Image Cleanup - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Caricamento della configurazione (file JSON + override da CLI / env)
//! - Inizializzazione del sistema di logging con `tracing`
//! - Dispatch dei sottocomandi e riepilogo finale per l'utente
//!
//! ## Sottocomandi:
//! - `analyse`: dry run completo, scrive backup e report, non cancella nulla
//! - `execute`: usa l'ultimo backup, verifica la connessione, cancella davvero
//! - `verify`: health check del sito dopo la cancellazione
//! - `init-config`: scrive un file di configurazione di esempio
//!
//! ## Exit code:
//! - 0 anche con fallimenti parziali (contati e loggati) o interruzione
//! - 130 se un secondo Ctrl-C interrompe `execute` immediatamente
//! - 1 solo per configurazione invalida, backup mancante/corrotto o
//!   connessione fallita (nessuna operazione distruttiva eseguita)
//!
//! ## Esempio di utilizzo:
//! ```bash
//! wp-image-cleanup --site-url https://example.com.au --username admin analyse
//! wp-image-cleanup execute
//! wp-image-cleanup verify
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

use wp_image_cleanup::{
    backup::load_backup,
    logging::init_logging,
    storage::FileManager,
    verifier::write_verification_log,
    BackupFile, CancelFlag, CleanupError, CleanupSummary, Config, ImageCleanup, RunResult,
    SiteVerifier, WordPressClient,
};

/// Conventional 128 + SIGINT
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(name = "wp-image-cleanup")]
#[command(about = "Find and safely remove unused images from a WordPress media library")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// WordPress site URL
    #[arg(long, env = "WP_SITE_URL", global = true)]
    site_url: Option<String>,

    /// WordPress username
    #[arg(short, long, env = "WP_USERNAME", global = true)]
    username: Option<String>,

    /// WordPress application password
    #[arg(long, env = "WP_APPLICATION_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Directory for backup, report and verification files
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Append-only log file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Dry run: find unused images, write backup and report
    Analyse,
    /// Delete the images listed in the latest (or given) backup
    Execute {
        /// Backup file to execute instead of the most recent one
        #[arg(long)]
        backup: Option<PathBuf>,
    },
    /// Check site health after a cleanup
    Verify,
    /// Write a configuration template
    InitConfig {
        /// Destination (defaults to the user config directory)
        path: Option<PathBuf>,
    },
}

impl Args {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref site_url) = self.site_url {
            config.site_url = site_url.clone();
        }
        if let Some(ref username) = self.username {
            config.username = username.clone();
        }
        if let Some(ref password) = self.password {
            config.application_password = password.clone();
        }
        if let Some(ref output_dir) = self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(ref log_file) = self.log_file {
            config.log_file = log_file.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(Config::default_path);
    let mut config = match config_path {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    args.apply_overrides(&mut config);

    if let Command::InitConfig { ref path } = args.command {
        let path = path
            .clone()
            .or(config_path)
            .ok_or_else(|| anyhow::anyhow!("Could not determine a config location"))?;
        config.save_to_file(&path).await?;
        println!("Configuration template written to {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    init_logging(args.verbose, &config.log_file)?;

    if let Err(e) = config.validate() {
        error!("❌ {}", e);
        return Ok(ExitCode::FAILURE);
    }

    let client = WordPressClient::new(&config)?;
    info!("Site: {}", config.site_url);

    match args.command {
        Command::Analyse => analyse(&client, &config).await,
        Command::Execute { backup } => execute(&client, &config, backup).await,
        Command::Verify => verify(&client, &config).await,
        Command::InitConfig { .. } => Ok(ExitCode::SUCCESS),
    }
}

async fn analyse(client: &WordPressClient, config: &Config) -> Result<ExitCode> {
    info!("⚠️ Starting with DRY RUN mode for safety");
    let cleanup = ImageCleanup::new(client, config);

    let result = tokio::select! {
        result = cleanup.run(true) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("⚠️ Analysis interrupted by user, nothing was deleted");
            return Ok(ExitCode::SUCCESS);
        }
    };

    match result {
        Ok(RunResult::Completed(summary)) => {
            print_analysis(&summary);
            Ok(ExitCode::SUCCESS)
        }
        Ok(other) => {
            print_early_result(&other);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => fail(e),
    }
}

async fn execute(client: &WordPressClient, config: &Config, backup: Option<PathBuf>) -> Result<ExitCode> {
    let reviewed = match backup {
        Some(path) => load_backup(&path),
        None => wp_image_cleanup::load_latest_backup(&config.output_dir),
    };
    let reviewed = match reviewed {
        Ok(reviewed) => reviewed,
        Err(e) => {
            error!("❌ {}", e);
            error!("Please run the analysis first.");
            return Ok(ExitCode::FAILURE);
        }
    };

    print_backup_preview(&reviewed);

    let cancel = CancelFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("⚠️ Interrupt received, finishing the current request then stopping (Ctrl-C again to abort)");
        signal_flag.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            error!("❌ Second interrupt, aborting immediately");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });

    info!("⏳ Starting deletion process with safety controls...");
    let result = ImageCleanup::new(client, config)
        .with_cancel_flag(cancel)
        .execute_from_backup(&reviewed)
        .await;

    match result {
        Ok(RunResult::Completed(summary)) => {
            print_deletion(&summary, &reviewed);
            Ok(ExitCode::SUCCESS)
        }
        Ok(other) => {
            print_early_result(&other);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => fail(e),
    }
}

async fn verify(client: &WordPressClient, config: &Config) -> Result<ExitCode> {
    let verifier = SiteVerifier::new(client);

    let report = tokio::select! {
        report = verifier.check_health() => report,
        _ = tokio::signal::ctrl_c() => {
            warn!("⚠️ Verification interrupted by user");
            return Ok(ExitCode::SUCCESS);
        }
    };

    if let Err(e) = write_verification_log(&config.output_dir, &report) {
        error!("Could not save verification log: {}", e);
    }

    info!("=== Site Verification ===");
    info!("Health: {} ({})", report.health_status, report.summary);
    info!("📋 {}", report.health_status.recommendation());
    Ok(ExitCode::SUCCESS)
}

fn fail(e: CleanupError) -> Result<ExitCode> {
    match e {
        CleanupError::Connectivity(_) => {
            error!("❌ {}", e);
            error!("Aborting before any deletion.");
            Ok(ExitCode::FAILURE)
        }
        other => Err(other.into()),
    }
}

fn print_early_result(result: &RunResult) {
    match result {
        RunResult::NoMedia => warn!("❌ No media found"),
        RunResult::NoUnused { total_images } => {
            info!("✅ No unused images found among {} images - your site is clean!", total_images)
        }
        RunResult::NothingToDelete { stale } => {
            warn!(
                "Every image in the backup is in use again ({} skipped), nothing deleted",
                stale.len()
            )
        }
        RunResult::Interrupted => {
            warn!("⚠️ Interrupted by user before any backup was written, nothing deleted")
        }
        RunResult::Completed(_) => {}
    }
}

fn print_analysis(summary: &CleanupSummary) {
    info!("=== Analysis Results ===");
    info!("Total Images: {}", summary.total_images);
    info!("Unused Images: {}", summary.unused_images);
    info!("Reclaimable: {}", FileManager::format_size(summary.backup.total_size()));
    info!("Backup File: {}", summary.backup.path().display());
    info!("Report File: {}", summary.report_file.display());
    info!("📋 Review the report, then run `wp-image-cleanup execute` to delete");
}

fn print_backup_preview(backup: &BackupFile) {
    info!(
        "📋 Backup {} lists {} unused images ({})",
        backup.path().display(),
        backup.len(),
        FileManager::format_size(backup.total_size())
    );
    for (i, entry) in backup.entries().iter().take(5).enumerate() {
        info!("  {}. {} ({})", i + 1, entry.title, FileManager::format_size(entry.file_size));
    }
    if backup.len() > 5 {
        info!("  ... and {} more images", backup.len() - 5);
    }
}

fn print_deletion(summary: &CleanupSummary, reviewed: &BackupFile) {
    let outcome = &summary.deletion;

    info!("=== Deletion Completed ===");
    info!("Total Images Processed: {}", outcome.total);
    info!("Successfully Deleted: {}", outcome.deleted);
    info!("Failed to Delete: {}", outcome.failed);
    info!("Skipped: {}", outcome.skipped);
    info!("Storage Freed: {}", FileManager::format_size(outcome.freed_bytes));
    info!("Success Rate: {:.1}%", outcome.success_rate());

    if !summary.stale.is_empty() {
        info!("In use again since review (kept): {}", summary.stale.len());
    }
    if outcome.failed > 0 {
        warn!("⚠️ {} images failed to delete, check the log for details", outcome.failed);
    }
    if outcome.interrupted {
        warn!("⚠️ Deletion interrupted by user. Images already processed stay deleted.");
    }

    info!("💾 Original backup preserved: {}", reviewed.path().display());
    info!("💾 New backup created: {}", summary.backup.path().display());
    info!("💡 Run `wp-image-cleanup verify` to check site health");
}
