//! In-memory [`SiteApi`] used by the unit tests.

use crate::client::{ContentKind, Page, PageFetch, SiteApi};
use crate::deleter::CancelFlag;
use crate::error::{CleanupError, Result};
use crate::media::{Embedded, EmbeddedMedia, MediaRecord, RawContent, RawMedia, RawMediaDetails, Rendered};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

pub struct FakeSite {
    base: Url,
    pub root_status: u16,
    pub allow_header: String,
    pub media: Vec<RawMedia>,
    pub posts: Vec<RawContent>,
    pub pages: Vec<RawContent>,
    pub fail_media_pages: HashSet<u32>,
    pub fail_content_pages: HashSet<(ContentKind, u32)>,
    /// Reported instead of the real page count when set
    pub total_pages_override: Option<u32>,
    pub failing_deletes: HashSet<u64>,
    pub head_statuses: HashMap<String, u16>,
    pub homepage_status: u16,
    pub homepage_body: String,
    pub homepage_elapsed: Duration,
    pub deleted: Mutex<Vec<u64>>,
    pub delete_attempts: Mutex<Vec<u64>>,
    pub media_requests: Mutex<Vec<u32>>,
    pub content_requests: Mutex<Vec<(ContentKind, u32)>>,
    /// Raised when the given media page is requested
    pub cancel_on_media_page: Option<(u32, CancelFlag)>,
    /// Raised once this many delete calls have been made
    pub cancel_after_deletes: Option<(usize, CancelFlag)>,
}

impl FakeSite {
    pub fn new(base: &str) -> Self {
        Self {
            base: Url::parse(base).expect("valid test url"),
            root_status: 200,
            allow_header: "GET, POST, PUT, PATCH, DELETE".to_string(),
            media: Vec::new(),
            posts: Vec::new(),
            pages: Vec::new(),
            fail_media_pages: HashSet::new(),
            fail_content_pages: HashSet::new(),
            total_pages_override: None,
            failing_deletes: HashSet::new(),
            head_statuses: HashMap::new(),
            homepage_status: 200,
            homepage_body: "<html><body><img alt=\"logo\" src=\"/logo.png\"></body></html>".to_string(),
            homepage_elapsed: Duration::from_millis(300),
            deleted: Mutex::new(Vec::new()),
            delete_attempts: Mutex::new(Vec::new()),
            media_requests: Mutex::new(Vec::new()),
            content_requests: Mutex::new(Vec::new()),
            cancel_on_media_page: None,
            cancel_after_deletes: None,
        }
    }

    pub fn deleted(&self) -> Vec<u64> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn delete_attempts(&self) -> Vec<u64> {
        self.delete_attempts.lock().unwrap().clone()
    }

    fn paginate<T: Clone>(&self, items: &[T], page: u32, per_page: u32) -> Page<T> {
        let per_page = per_page.max(1) as usize;
        let real_total = items.len().div_ceil(per_page).max(1) as u32;
        let start = (page.saturating_sub(1) as usize) * per_page;
        let items = items.iter().skip(start).take(per_page).cloned().collect();
        Page {
            items,
            total_pages: self.total_pages_override.unwrap_or(real_total),
        }
    }
}

fn status_error(status: u16, path: &str) -> CleanupError {
    CleanupError::Status {
        status,
        url: format!("https://fake.test/{}", path),
    }
}

#[async_trait]
impl SiteApi for FakeSite {
    fn base_url(&self) -> &Url {
        &self.base
    }

    async fn api_root_status(&self) -> Result<u16> {
        Ok(self.root_status)
    }

    async fn media_page(&self, page: u32, per_page: u32) -> Result<Page<RawMedia>> {
        self.media_requests.lock().unwrap().push(page);
        if let Some((at_page, flag)) = &self.cancel_on_media_page {
            if *at_page == page {
                flag.cancel();
            }
        }
        if self.fail_media_pages.contains(&page) {
            return Err(status_error(500, "media"));
        }
        Ok(self.paginate(&self.media, page, per_page))
    }

    async fn content_page(
        &self,
        kind: ContentKind,
        page: u32,
        per_page: u32,
    ) -> Result<Page<RawContent>> {
        self.content_requests.lock().unwrap().push((kind, page));
        if self.fail_content_pages.contains(&(kind, page)) {
            return Err(status_error(503, kind.endpoint()));
        }
        let items = match kind {
            ContentKind::Posts => &self.posts,
            ContentKind::Pages => &self.pages,
        };
        Ok(self.paginate(items, page, per_page))
    }

    async fn allowed_methods(&self, _media_id: u64) -> Result<String> {
        Ok(self.allow_header.clone())
    }

    async fn delete_media(&self, media_id: u64) -> Result<()> {
        let attempts = {
            let mut attempts = self.delete_attempts.lock().unwrap();
            attempts.push(media_id);
            attempts.len()
        };
        if let Some((after, flag)) = &self.cancel_after_deletes {
            if attempts >= *after {
                flag.cancel();
            }
        }
        if self.failing_deletes.contains(&media_id) {
            return Err(status_error(403, "media"));
        }
        self.deleted.lock().unwrap().push(media_id);
        Ok(())
    }

    async fn recent_posts(&self, count: u32) -> Result<Vec<RawContent>> {
        if self.root_status != 200 {
            return Err(status_error(self.root_status, "posts"));
        }
        Ok(self.posts.iter().take(count as usize).cloned().collect())
    }

    async fn head_status(&self, url: &str) -> Result<u16> {
        Ok(self.head_statuses.get(url).copied().unwrap_or(404))
    }

    async fn get_page(&self, _url: &str) -> Result<PageFetch> {
        Ok(PageFetch {
            status: self.homepage_status,
            body: self.homepage_body.clone(),
            elapsed: self.homepage_elapsed,
        })
    }
}

pub fn raw_media(id: u64, url: &str, post: u64) -> RawMedia {
    RawMedia {
        id,
        title: Rendered {
            rendered: format!("Image {}", id),
        },
        source_url: url.to_string(),
        date: "2024-03-01T09:30:00".to_string(),
        modified: "2024-03-01T09:30:00".to_string(),
        post: (post != 0).then_some(post),
        media_details: RawMediaDetails { filesize: 1024 * id },
        mime_type: "image/jpeg".to_string(),
        ..Default::default()
    }
}

pub fn record(id: u64, url: &str, post: u64) -> MediaRecord {
    MediaRecord::from(raw_media(id, url, post))
}

pub fn content(id: u64, html: &str) -> RawContent {
    RawContent {
        id,
        content: Rendered {
            rendered: html.to_string(),
        },
        ..Default::default()
    }
}

pub fn content_with_featured(id: u64, featured_id: u64, featured_url: &str) -> RawContent {
    RawContent {
        id,
        featured_media: featured_id,
        embedded: Some(Embedded {
            featured_media: vec![EmbeddedMedia {
                id: featured_id,
                source_url: featured_url.to_string(),
            }],
        }),
        ..Default::default()
    }
}
