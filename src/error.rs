//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `CleanupError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Io` / `Json`: Errori di I/O e serializzazione (backup, report, config)
//! - `Http` / `Status`: Errori di trasporto o risposte non-2xx dalla REST API
//! - `Url`: URL del sito non valido
//! - `Connectivity`: Probe di connessione fallito, nessuna operazione distruttiva
//! - `MissingBackup` / `MalformedBackup`: Stato persistito assente o corrotto
//! - `Validation`: Errori di validazione input
//!
//! ## Politica:
//! - Connectivity e backup corrotti interrompono l'esecuzione
//! - Errori su singole pagine o singole cancellazioni vengono loggati e contati
//!
//! ## Esempio:
//! ```ignore
//! if !status.is_success() {
//!     return Err(CleanupError::Status { status: status.as_u16(), url });
//! }
//! ```

use std::path::PathBuf;

/// Custom error types for the image cleanup pipeline
#[derive(thiserror::Error, Debug)]
pub enum CleanupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Connectivity check failed: {0}")]
    Connectivity(String),

    #[error("No backup file found in {}", .0.display())]
    MissingBackup(PathBuf),

    #[error("Invalid backup file {}: {reason}", path.display())]
    MalformedBackup { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, CleanupError>;
