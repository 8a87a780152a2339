//! # WordPress Image Cleanup Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per i test di integrazione
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom per diverse operazioni
//! - `client`: Trait `SiteApi` e client REST `reqwest`
//! - `media`: Modello dati (media, contenuti, riferimenti)
//! - `fetcher`: Paginazione di media e contenuti
//! - `extractor`: Riferimenti a immagini dentro l'HTML
//! - `resolver`: Identificazione dei media inutilizzati
//! - `storage`: Scrittura atomica e ricerca file
//! - `backup` / `report`: Artefatti scritti prima di ogni cancellazione
//! - `deleter`: Cancellazioni a batch con dry run
//! - `cleanup`: Orchestratore del processo
//! - `verifier`: Health check post-cleanup
//! - `progress`: Progress bar e statistiche
//! - `logging`: Setup di `tracing`
//!
//! ## Utilizzo:
//! ```no_run
//! use wp_image_cleanup::{Config, ImageCleanup, WordPressClient};
//!
//! # async fn analyse() -> wp_image_cleanup::error::Result<()> {
//! let config = Config {
//!     site_url: "https://example.com".to_string(),
//!     username: "admin".to_string(),
//!     application_password: "xxxx xxxx xxxx".to_string(),
//!     ..Default::default()
//! };
//! let client = WordPressClient::new(&config)?;
//! let result = ImageCleanup::new(&client, &config).run(true).await?;
//! # let _ = result;
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod cleanup;
pub mod client;
pub mod config;
pub mod deleter;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod logging;
pub mod media;
pub mod progress;
pub mod report;
pub mod resolver;
pub mod storage;
pub mod verifier;

#[cfg(test)]
mod testing;

pub use backup::{load_latest_backup, BackupEntry, BackupFile};
pub use cleanup::{CleanupSummary, ImageCleanup, RunResult};
pub use client::{check_connection, SiteApi, WordPressClient};
pub use config::Config;
pub use deleter::{CancelFlag, DeletionExecutor};
pub use error::CleanupError;
pub use media::{MediaLibrary, MediaRecord, ReferenceSet};
pub use progress::DeletionOutcome;
pub use verifier::{HealthTier, SiteVerifier, VerificationReport};
