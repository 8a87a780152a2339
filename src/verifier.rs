//! # Site Verifier Module
//!
//! Questo modulo verifica la salute del sito dopo una cancellazione.
//!
//! ## Responsabilità:
//! - Probe in sola lettura contro il sito live (nessun uso del backup)
//! - Calcolo del livello di salute (`HealthTier`) dai check superati
//! - Salvataggio di `site_verification_<timestamp>.json`
//!
//! ## Check (ognuno vale uno):
//! - `api_access`: la root della REST API risponde 200
//! - `recent_posts`: gli ultimi 5 post sono elencabili
//! - `images_loading`: almeno una immagine in evidenza risponde 200 a HEAD
//! - `homepage_loading`: la homepage risponde 200
//! - `no_broken_links`: nessun pattern noto di immagine rotta nella homepage
//!
//! ## Tempo di caricamento:
//! - Good (< 5s), Acceptable (< 10s), Slow: riportato ma non conteggiato
//!
//! ## Livelli:
//! - Tutti superati → Excellent, uno in meno → Good, due in meno → Fair,
//!   altrimenti → Poor

use crate::client::SiteApi;
use crate::error::Result;
use crate::storage::FileManager;
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

pub const VERIFICATION_PREFIX: &str = "site_verification";
const RECENT_POSTS: u32 = 5;
const GOOD_LOAD_TIME: Duration = Duration::from_secs(5);
const ACCEPTABLE_LOAD_TIME: Duration = Duration::from_secs(10);

static BROKEN_IMAGE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)alt="[^"]*"\s+src="""#,
        r#"(?i)src="[^"]*404[^"]*""#,
        r#"(?i)src="[^"]*error[^"]*""#,
        r#"(?i)src="[^"]*missing[^"]*""#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid broken image pattern"))
    .collect()
});

/// Outcome of each independent probe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthChecks {
    pub api_access: bool,
    pub recent_posts: bool,
    pub images_loading: bool,
    pub no_broken_links: bool,
    pub homepage_loading: bool,
}

impl HealthChecks {
    pub const TOTAL: usize = 5;

    pub fn passed(&self) -> usize {
        [
            self.api_access,
            self.recent_posts,
            self.images_loading,
            self.no_broken_links,
            self.homepage_loading,
        ]
        .iter()
        .filter(|&&ok| ok)
        .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl HealthTier {
    /// Threshold ladder over the number of passed checks
    pub fn from_passed(passed: usize, total: usize) -> Self {
        let missing = total.saturating_sub(passed);
        match missing {
            0 => Self::Excellent,
            1 => Self::Good,
            2 => Self::Fair,
            _ => Self::Poor,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::Excellent => "No action required - site is performing excellently",
            Self::Good => "Minor monitoring recommended, but site is healthy",
            Self::Fair => "Review any failed checks and monitor site performance",
            Self::Poor => "Immediate attention required - consider restoring from backup",
        }
    }
}

impl fmt::Display for HealthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadBand {
    Good,
    Acceptable,
    Slow,
}

impl LoadBand {
    pub fn classify(elapsed: Duration) -> Self {
        if elapsed < GOOD_LOAD_TIME {
            Self::Good
        } else if elapsed < ACCEPTABLE_LOAD_TIME {
            Self::Acceptable
        } else {
            Self::Slow
        }
    }
}

/// Result of one verification run, persisted as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub site: String,
    pub checks: HealthChecks,
    pub health_status: HealthTier,
    pub summary: String,
    pub load_time_secs: Option<f64>,
    pub load_band: Option<LoadBand>,
}

/// True when the HTML carries a known broken-image marker
pub fn has_broken_images(html: &str) -> bool {
    BROKEN_IMAGE_PATTERNS.iter().any(|pattern| pattern.is_match(html))
}

/// Read-only health probes against the live site
pub struct SiteVerifier<'a> {
    api: &'a dyn SiteApi,
}

impl<'a> SiteVerifier<'a> {
    pub fn new(api: &'a dyn SiteApi) -> Self {
        Self { api }
    }

    pub async fn check_health(&self) -> VerificationReport {
        info!("🔍 Verifying site health after image cleanup...");
        let mut checks = HealthChecks::default();

        match self.api.api_root_status().await {
            Ok(200) => {
                checks.api_access = true;
                info!("✅ WordPress API accessible");
            }
            Ok(status) => error!("❌ WordPress API issue: {}", status),
            Err(e) => error!("❌ WordPress API error: {}", e),
        }

        match self.api.recent_posts(RECENT_POSTS).await {
            Ok(posts) if !posts.is_empty() => {
                checks.recent_posts = true;
                info!("✅ Recent posts accessible ({} found)", posts.len());

                let mut working_images = 0;
                for url in posts.iter().filter_map(|post| post.embedded_featured_url()) {
                    match self.api.head_status(url).await {
                        Ok(200) => working_images += 1,
                        Ok(status) => warn!("Featured image {} returned {}", url, status),
                        Err(e) => warn!("Featured image {} unreachable: {}", url, e),
                    }
                }

                if working_images > 0 {
                    checks.images_loading = true;
                    info!("✅ Featured images loading ({} verified)", working_images);
                } else {
                    warn!("⚠️ No working featured images found (may be normal after cleanup)");
                }
            }
            Ok(_) => warn!("⚠️ No recent posts found"),
            Err(e) => error!("❌ Posts check error: {}", e),
        }

        let homepage = self.api.base_url().to_string();
        let mut load_time = None;
        match self.api.get_page(&homepage).await {
            Ok(page) if page.status == 200 => {
                checks.homepage_loading = true;
                load_time = Some(page.elapsed);

                if has_broken_images(&page.body) {
                    warn!("⚠️ Possible broken images detected on homepage");
                } else {
                    checks.no_broken_links = true;
                    info!("✅ Homepage loads without obvious broken images");
                }
            }
            Ok(page) => {
                load_time = Some(page.elapsed);
                error!("❌ Homepage loading issue: {}", page.status);
            }
            Err(e) => error!("❌ Homepage check error: {}", e),
        }

        let load_band = load_time.map(LoadBand::classify);
        match (load_time, load_band) {
            (Some(t), Some(LoadBand::Good)) => info!("✅ Site loading time: {:.2}s", t.as_secs_f64()),
            (Some(t), Some(LoadBand::Acceptable)) => {
                warn!("⚠️ Site loading time: {:.2}s (acceptable)", t.as_secs_f64())
            }
            (Some(t), _) => warn!("❌ Site loading time: {:.2}s (slow)", t.as_secs_f64()),
            (None, _) => warn!("⚠️ Could not measure load time"),
        }

        let passed = checks.passed();
        let tier = HealthTier::from_passed(passed, HealthChecks::TOTAL);
        info!("📊 Site Health: {}/{} checks passed ({})", passed, HealthChecks::TOTAL, tier);

        VerificationReport {
            timestamp: Local::now().to_rfc3339(),
            site: homepage,
            summary: format!("{}/{} checks passed", passed, HealthChecks::TOTAL),
            checks,
            health_status: tier,
            load_time_secs: load_time.map(|t| t.as_secs_f64()),
            load_band,
        }
    }
}

/// Persist a verification run as `site_verification_<timestamp>.json`
pub fn write_verification_log(dir: &Path, report: &VerificationReport) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(report)?;
    let name = FileManager::timestamped_name(VERIFICATION_PREFIX, "json");
    let path = FileManager::write_atomic(dir, &name, json.as_bytes())?;
    info!("💾 Verification log saved: {}", path.display());
    Ok(path)
}
