//! # WordPress REST Client Module
//!
//! Questo modulo incapsula tutte le chiamate HTTP verso il sito WordPress.
//!
//! ## Responsabilità:
//! - Definisce il trait `SiteApi`, unico punto di contatto con la rete
//! - Implementa `WordPressClient` con `reqwest` (basic auth, timeout, User-Agent)
//! - Legge l'header `X-WP-TotalPages` per la paginazione
//! - Converte risposte non-2xx in `CleanupError::Status`
//! - Fornisce `check_connection()` da eseguire prima di ogni operazione distruttiva
//!
//! ## Endpoint usati:
//! - `GET  /wp-json/wp/v2/` (root API)
//! - `GET  /wp-json/wp/v2/media` (solo immagini, ordinate per data)
//! - `GET  /wp-json/wp/v2/{posts,pages}` (solo pubblicati, con `_embed`)
//! - `OPTIONS /wp-json/wp/v2/media/999999` (probe permesso DELETE)
//! - `DELETE /wp-json/wp/v2/media/{id}?force=true` (cancellazione permanente)
//!
//! ## Probe non autenticati:
//! - Homepage e URL delle immagini vengono richiesti senza credenziali,
//!   come li vedrebbe un visitatore

use crate::config::Config;
use crate::error::{CleanupError, Result};
use crate::media::{RawContent, RawMedia};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ALLOW};
use reqwest::{Client, Method, RequestBuilder, Response};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("wp-image-cleanup/", env!("CARGO_PKG_VERSION"));
const TOTAL_PAGES_HEADER: &str = "X-WP-TotalPages";
const DELETE_PROBE_ID: u64 = 999_999;

/// Published content types scanned for image references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Posts,
    Pages,
}

impl ContentKind {
    pub const ALL: [ContentKind; 2] = [ContentKind::Posts, ContentKind::Pages];

    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Pages => "pages",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// One page of a paginated listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Value of `X-WP-TotalPages`, 1 when the header is absent
    pub total_pages: u32,
}

/// Homepage probe result
#[derive(Debug, Clone)]
pub struct PageFetch {
    pub status: u16,
    pub body: String,
    pub elapsed: Duration,
}

/// Everything the cleanup needs from a WordPress site
#[async_trait]
pub trait SiteApi: Send + Sync {
    /// Public base URL of the site
    fn base_url(&self) -> &Url;

    /// Status code of `GET /wp-json/wp/v2/`
    async fn api_root_status(&self) -> Result<u16>;

    async fn media_page(&self, page: u32, per_page: u32) -> Result<Page<RawMedia>>;

    async fn content_page(&self, kind: ContentKind, page: u32, per_page: u32)
        -> Result<Page<RawContent>>;

    /// `Allow` header returned by an OPTIONS request on a media item
    async fn allowed_methods(&self, media_id: u64) -> Result<String>;

    /// Permanently delete a media item (bypasses the trash)
    async fn delete_media(&self, media_id: u64) -> Result<()>;

    /// Most recent published posts with embedded featured media
    async fn recent_posts(&self, count: u32) -> Result<Vec<RawContent>>;

    /// Unauthenticated HEAD status of an arbitrary URL
    async fn head_status(&self, url: &str) -> Result<u16>;

    /// Unauthenticated GET of an arbitrary page
    async fn get_page(&self, url: &str) -> Result<PageFetch>;
}

/// `reqwest` implementation of [`SiteApi`]
pub struct WordPressClient {
    http: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl WordPressClient {
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config.base_url()?;
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url,
            username: config.username.clone(),
            password: config.application_password.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/wp-json/wp/v2/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path
        )
    }

    fn authed(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .basic_auth(&self.username, Some(&self.password))
    }

    async fn send_checked(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CleanupError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(response)
    }

    async fn fetch_page<T>(&self, request: RequestBuilder) -> Result<Page<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.send_checked(request).await?;
        let total_pages = total_pages(response.headers());
        let items = response.json::<Vec<T>>().await?;
        Ok(Page { items, total_pages })
    }
}

/// Parse `X-WP-TotalPages`, defaulting to a single page
pub fn total_pages(headers: &HeaderMap) -> u32 {
    headers
        .get(TOTAL_PAGES_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(1)
}

#[async_trait]
impl SiteApi for WordPressClient {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn api_root_status(&self) -> Result<u16> {
        let response = self.authed(Method::GET, "").send().await?;
        Ok(response.status().as_u16())
    }

    async fn media_page(&self, page: u32, per_page: u32) -> Result<Page<RawMedia>> {
        let request = self.authed(Method::GET, "media").query(&[
            ("media_type", "image".to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
            ("orderby", "date".to_string()),
            ("order", "desc".to_string()),
        ]);
        self.fetch_page(request).await
    }

    async fn content_page(
        &self,
        kind: ContentKind,
        page: u32,
        per_page: u32,
    ) -> Result<Page<RawContent>> {
        let request = self.authed(Method::GET, kind.endpoint()).query(&[
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
            ("status", "publish".to_string()),
            ("_embed", "true".to_string()),
        ]);
        self.fetch_page(request).await
    }

    async fn allowed_methods(&self, media_id: u64) -> Result<String> {
        let response = self
            .authed(Method::OPTIONS, &format!("media/{}", media_id))
            .send()
            .await?;
        Ok(response
            .headers()
            .get(ALLOW)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string())
    }

    async fn delete_media(&self, media_id: u64) -> Result<()> {
        let request = self
            .authed(Method::DELETE, &format!("media/{}", media_id))
            .query(&[("force", "true")]);
        self.send_checked(request).await?;
        Ok(())
    }

    async fn recent_posts(&self, count: u32) -> Result<Vec<RawContent>> {
        let request = self.authed(Method::GET, "posts").query(&[
            ("per_page", count.to_string()),
            ("_embed", "true".to_string()),
        ]);
        let page: Page<RawContent> = self.fetch_page(request).await?;
        Ok(page.items)
    }

    async fn head_status(&self, url: &str) -> Result<u16> {
        let response = self.http.head(url).send().await?;
        Ok(response.status().as_u16())
    }

    async fn get_page(&self, url: &str) -> Result<PageFetch> {
        let started = Instant::now();
        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(PageFetch {
            status,
            body,
            elapsed: started.elapsed(),
        })
    }
}

/// Verify API reachability and media access before any destructive work
pub async fn check_connection(api: &dyn SiteApi) -> Result<()> {
    let status = api
        .api_root_status()
        .await
        .map_err(|e| CleanupError::Connectivity(format!("API root unreachable: {}", e)))?;
    if status != 200 {
        return Err(CleanupError::Connectivity(format!(
            "API connection failed: {}",
            status
        )));
    }

    api.media_page(1, 1)
        .await
        .map_err(|e| CleanupError::Connectivity(format!("Media API access failed: {}", e)))?;

    match api.allowed_methods(DELETE_PROBE_ID).await {
        Ok(allow) if allow.to_ascii_uppercase().contains("DELETE") => {
            debug!("DELETE permitted on media endpoint");
        }
        Ok(_) => warn!("DELETE permission may not be available"),
        Err(e) => warn!("Could not probe DELETE permission: {}", e),
    }

    info!("✅ WordPress API connection and permissions verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSite;
    use reqwest::header::HeaderValue;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_total_pages_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(total_pages(&headers), 1);

        headers.insert(TOTAL_PAGES_HEADER, HeaderValue::from_static("7"));
        assert_eq!(total_pages(&headers), 7);

        headers.insert(TOTAL_PAGES_HEADER, HeaderValue::from_static("seven"));
        assert_eq!(total_pages(&headers), 1);
    }

    #[test]
    fn test_endpoint_keeps_subdirectory_installs() {
        let config = Config {
            site_url: "https://example.com/blog/".to_string(),
            username: "admin".to_string(),
            application_password: "secret".to_string(),
            ..Default::default()
        };
        let client = WordPressClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("media/5"),
            "https://example.com/blog/wp-json/wp/v2/media/5"
        );
    }

    #[tokio::test]
    async fn test_check_connection_passes_on_healthy_site() {
        let site = FakeSite::new("https://example.com");
        assert_ok!(check_connection(&site).await);
    }

    #[tokio::test]
    async fn test_check_connection_fails_on_bad_root() {
        let mut site = FakeSite::new("https://example.com");
        site.root_status = 401;
        let err = assert_err!(check_connection(&site).await);
        assert!(matches!(err, CleanupError::Connectivity(_)));
    }

    #[tokio::test]
    async fn test_missing_delete_permission_is_only_a_warning() {
        let mut site = FakeSite::new("https://example.com");
        site.allow_header = "GET, POST".to_string();
        assert_ok!(check_connection(&site).await);
    }

    #[tokio::test]
    async fn test_check_connection_fails_when_media_listing_fails() {
        let mut site = FakeSite::new("https://example.com");
        site.fail_media_pages.insert(1);
        let err = assert_err!(check_connection(&site).await);
        assert!(matches!(err, CleanupError::Connectivity(_)));
    }
}
