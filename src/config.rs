//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con sito, credenziali e parametri di rate limiting
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default prudenti per il rate limiting
//!
//! ## Parametri di configurazione:
//! - `site_url`: URL base del sito WordPress
//! - `username` / `application_password`: Credenziali (Application Password)
//! - `page_size`: Elementi per pagina nella paginazione REST (1-100, default: 50)
//! - `request_delay_ms`: Pausa dopo ogni richiesta (default: 500ms)
//! - `batch_size`: Cancellazioni per batch (default: 10)
//! - `batch_pause_ms`: Pausa tra batch (default: 2000ms)
//! - `request_timeout_secs`: Timeout HTTP (default: 30s)
//! - `output_dir`: Directory per backup, report e log di verifica (default: ".")
//! - `log_file`: File di log append-only (default: "image_cleanup.log")
//!
//! La modalità (dry run o cancellazione reale) dipende dal sottocomando,
//! non dalla configurazione.
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     site_url: "https://example.com.au".to_string(),
//!     username: "admin".to_string(),
//!     application_password: "xxxx xxxx xxxx".to_string(),
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::error::{CleanupError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Largest `per_page` value accepted by the WordPress REST API
pub const MAX_PAGE_SIZE: u32 = 100;

/// Configuration for the cleanup run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the WordPress site
    pub site_url: String,
    /// WordPress user owning the application password
    pub username: String,
    /// WordPress application password
    pub application_password: String,
    /// Items requested per page when listing media and content
    pub page_size: u32,
    /// Delay after every page fetch and every deletion, in milliseconds
    pub request_delay_ms: u64,
    /// Number of deletions per batch
    pub batch_size: usize,
    /// Pause between deletion batches, in milliseconds
    pub batch_pause_ms: u64,
    /// HTTP request timeout, in seconds
    pub request_timeout_secs: u64,
    /// Directory receiving backup, report and verification files
    pub output_dir: PathBuf,
    /// Append-only log file
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            username: String::new(),
            application_password: String::new(),
            page_size: 50,
            request_delay_ms: 500,
            batch_size: 10,
            batch_pause_ms: 2000,
            request_timeout_secs: 30,
            output_dir: PathBuf::from("."),
            log_file: PathBuf::from("image_cleanup.log"),
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;

        if self.username.trim().is_empty() {
            return Err(CleanupError::Validation("Username must not be empty".to_string()));
        }

        if self.application_password.trim().is_empty() {
            return Err(CleanupError::Validation(
                "Application password must not be empty".to_string(),
            ));
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(CleanupError::Validation(format!(
                "Page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        if self.batch_size == 0 {
            return Err(CleanupError::Validation(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(CleanupError::Validation(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Parsed site URL, without trailing slash in its path
    pub fn base_url(&self) -> Result<Url> {
        let trimmed = self.site_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(CleanupError::Validation("Site URL must not be empty".to_string()));
        }

        let url = Url::parse(trimmed)?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(CleanupError::Validation(format!(
                "Site URL must be an http(s) URL with a host: {}",
                self.site_url
            )));
        }

        Ok(url)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Default config location: `<config_dir>/wp-image-cleanup/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wp-image-cleanup").join("config.json"))
    }

    /// Load configuration from file
    ///
    /// A missing file yields the defaults; validation is left to the caller
    /// because CLI flags may still fill in the credentials.
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
