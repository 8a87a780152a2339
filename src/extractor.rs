//! # Reference Extractor Module
//!
//! Questo modulo estrae i riferimenti a immagini da frammenti HTML.
//!
//! ## Responsabilità:
//! - Trova gli attributi `src` dei tag `<img>` tramite regex
//! - Risolve gli URL relativi (che iniziano con `/`) rispetto all'URL del sito
//! - Mantiene solo gli URL dello stesso host del sito (embed esterni ignorati)
//! - Interpreta gli shortcode `[gallery ids="1,2,3"]` usando la media library
//!
//! ## Limiti noti:
//! - Euristica best-effort: immagini referenziate da blocchi o shortcode dinamici
//!   diversi dai due pattern riconosciuti non vengono trovate
//! - Shortcode malformati o parziali vengono ignorati senza errori

use crate::media::{MediaLibrary, ReferenceSet};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static IMG_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img[^>]*src=["']([^"']+)["'][^>]*>"#).expect("valid img pattern")
});

static GALLERY_IDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\[gallery[^\]]*ids="([^"]+)""#).expect("valid gallery pattern")
});

/// Extracts same-site image references from rendered HTML
pub struct ReferenceExtractor<'a> {
    site: &'a Url,
    library: &'a MediaLibrary,
}

impl<'a> ReferenceExtractor<'a> {
    pub fn new(site: &'a Url, library: &'a MediaLibrary) -> Self {
        Self { site, library }
    }

    /// Collect every image reference found in `html`
    pub fn extract(&self, html: &str) -> ReferenceSet {
        let mut refs = ReferenceSet::new();

        for url in extract_image_urls(html, self.site) {
            refs.insert_url(url);
        }

        for id in extract_gallery_ids(html) {
            if let Some(record) = self.library.get(&id) {
                refs.insert_media(record);
            }
        }

        refs
    }
}

/// Image `src` values pointing at the site's own host
pub fn extract_image_urls(html: &str, site: &Url) -> Vec<String> {
    IMG_SRC
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .filter_map(|src| normalise_src(src.as_str().trim(), site))
        .collect()
}

fn normalise_src(src: &str, site: &Url) -> Option<String> {
    if src.starts_with('/') {
        let resolved = site.join(src).ok()?;
        return same_host(&resolved, site).then(|| resolved.to_string());
    }

    // Kept verbatim so it matches the media `source_url` byte for byte
    let parsed = Url::parse(src).ok()?;
    same_host(&parsed, site).then(|| src.to_string())
}

fn same_host(url: &Url, site: &Url) -> bool {
    url.host_str() == site.host_str() && url.port() == site.port()
}

/// Numeric ids listed in `[gallery ids="..."]` shortcodes
pub fn extract_gallery_ids(html: &str) -> Vec<u64> {
    GALLERY_IDS
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .flat_map(|ids| ids.as_str().split(','))
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|id| id.parse().ok())
        .collect()
}
