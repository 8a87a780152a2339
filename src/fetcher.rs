//! # Content Fetcher Module
//!
//! Questo modulo scarica l'inventario media e tutti i contenuti pubblicati.
//!
//! ## Responsabilità:
//! - Paginazione completa di `/media` → `MediaLibrary`
//! - Paginazione di posts e pages → `ReferenceSet`
//! - Pausa fissa dopo ogni pagina per rispettare il rate limit
//!
//! ## Terminazione della paginazione:
//! - Pagina corrente >= `X-WP-TotalPages`
//! - Pagina vuota (anche se il totale dichiarato è sbagliato)
//! - Errore HTTP o di trasporto: si ferma e restituisce il parziale (fail soft)
//! - Interruzione dell'utente (`CancelFlag`), controllata prima di ogni pagina
//!
//! ## Riferimenti raccolti per ogni contenuto:
//! - Immagine in evidenza (`featured_media`) se presente nella library
//! - `<img src>` e shortcode `[gallery]` nel body
//! - `<img src>` e shortcode `[gallery]` nell'excerpt

use crate::client::{ContentKind, SiteApi};
use crate::deleter::CancelFlag;
use crate::extractor::ReferenceExtractor;
use crate::media::{MediaLibrary, MediaRecord, RawContent, ReferenceSet};
use crate::progress::ProgressManager;
use std::time::Duration;
use tracing::{error, info, warn};

/// Paginated reader over the site's media and content
pub struct ContentFetcher<'a> {
    api: &'a dyn SiteApi,
    page_size: u32,
    request_delay: Duration,
    cancel: CancelFlag,
}

impl<'a> ContentFetcher<'a> {
    pub fn new(api: &'a dyn SiteApi, page_size: u32, request_delay: Duration) -> Self {
        Self {
            api,
            page_size,
            request_delay,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch every image in the media library
    pub async fn fetch_all_media(&self) -> MediaLibrary {
        info!("📁 Fetching all media items...");
        let spinner = ProgressManager::spinner("Fetching media library");

        let mut library = MediaLibrary::new();
        let mut page = 1;

        loop {
            if self.cancel.is_cancelled() {
                warn!("⚠️ Media fetch interrupted at page {}", page);
                break;
            }

            let result = match self.api.media_page(page, self.page_size).await {
                Ok(result) => result,
                Err(e) => {
                    error!("Error fetching media page {}: {}", page, e);
                    break;
                }
            };

            if result.items.is_empty() {
                break;
            }

            let count = result.items.len();
            for raw in result.items {
                if raw.id == 0 {
                    warn!("Skipping media item without id");
                    continue;
                }
                let record = MediaRecord::from(raw);
                library.insert(record.id, record);
            }

            info!("📁 Fetched page {}: {} items", page, count);
            spinner.set_message(format!("Fetching media library ({} items)", library.len()));

            if page >= result.total_pages {
                break;
            }

            page += 1;
            tokio::time::sleep(self.request_delay).await;
        }

        spinner.finish_and_clear();
        info!("📁 Total media items found: {}", library.len());
        library
    }

    /// Scan all published posts and pages for image references
    pub async fn fetch_all_content(&self, library: &MediaLibrary) -> ReferenceSet {
        info!("📄 Analysing all content for image usage...");

        let mut references = ReferenceSet::new();
        for kind in ContentKind::ALL {
            references.merge(self.analyse_content_type(kind, library).await);
        }

        info!("📄 Found {} image references in content", references.len());
        references
    }

    async fn analyse_content_type(&self, kind: ContentKind, library: &MediaLibrary) -> ReferenceSet {
        let extractor = ReferenceExtractor::new(self.api.base_url(), library);
        let spinner = ProgressManager::spinner(&format!("Analysing {}", kind));

        let mut references = ReferenceSet::new();
        let mut page = 1;

        loop {
            if self.cancel.is_cancelled() {
                warn!("⚠️ Analysis of {} interrupted at page {}", kind, page);
                break;
            }

            let result = match self.api.content_page(kind, page, self.page_size).await {
                Ok(result) => result,
                Err(e) => {
                    error!("Error analysing {} page {}: {}", kind, page, e);
                    break;
                }
            };

            if result.items.is_empty() {
                break;
            }

            for item in &result.items {
                references.merge(collect_item_references(item, &extractor, library));
            }

            info!("📄 Analysed {} page {}: {} items", kind, page, result.items.len());

            if page >= result.total_pages {
                break;
            }

            page += 1;
            tokio::time::sleep(self.request_delay).await;
        }

        spinner.finish_and_clear();
        references
    }
}

fn collect_item_references(
    item: &RawContent,
    extractor: &ReferenceExtractor<'_>,
    library: &MediaLibrary,
) -> ReferenceSet {
    let mut references = ReferenceSet::new();

    if item.featured_media != 0 {
        if let Some(record) = library.get(&item.featured_media) {
            references.insert_media(record);
        }
    }

    for html in [&item.content.rendered, &item.excerpt.rendered] {
        if !html.is_empty() {
            references.merge(extractor.extract(html));
        }
    }

    references
}
