//! # Media Data Model Module
//!
//! Questo modulo definisce il modello dati per media e riferimenti.
//!
//! ## Responsabilità:
//! - `RawMedia` / `RawContent`: forma JSON della REST API, con default espliciti
//! - `MediaRecord`: snapshot tipizzato e immutabile di un media
//! - `MediaLibrary`: mappa ordinata id → `MediaRecord`
//! - `ReferenceSet`: URL e id referenziati dai contenuti pubblicati
//!
//! ## Default per campi assenti:
//! - Stringhe mancanti → stringa vuota
//! - Numeri mancanti (`post`, `filesize`) → 0
//! - `post == 0` significa media non allegato ad alcun contenuto

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// `{ "rendered": "..." }` wrapper used by WordPress for HTML fields
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Rendered {
    pub rendered: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMediaDetails {
    pub filesize: u64,
}

/// Media item as returned by `/wp/v2/media`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMedia {
    pub id: u64,
    pub title: Rendered,
    pub source_url: String,
    pub date: String,
    pub modified: String,
    /// Attached post id, `null` when unattached
    pub post: Option<u64>,
    #[serde(deserialize_with = "lenient_details")]
    pub media_details: RawMediaDetails,
    pub mime_type: String,
    pub alt_text: String,
    pub caption: Rendered,
    pub description: Rendered,
}

// PHP serialises an empty details map as `[]`
fn lenient_details<'de, D>(deserializer: D) -> Result<RawMediaDetails, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddedMedia {
    pub id: u64,
    pub source_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Embedded {
    #[serde(rename = "wp:featuredmedia")]
    pub featured_media: Vec<EmbeddedMedia>,
}

/// Post or page as returned by `/wp/v2/posts` and `/wp/v2/pages`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawContent {
    pub id: u64,
    pub content: Rendered,
    pub excerpt: Rendered,
    pub featured_media: u64,
    #[serde(rename = "_embedded")]
    pub embedded: Option<Embedded>,
}

impl RawContent {
    /// Source URL of the embedded featured image, if the API embedded one
    pub fn embedded_featured_url(&self) -> Option<&str> {
        self.embedded
            .as_ref()
            .and_then(|e| e.featured_media.first())
            .map(|m| m.source_url.as_str())
            .filter(|url| !url.is_empty())
    }
}

/// Immutable snapshot of one media asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRecord {
    pub id: u64,
    pub title: String,
    pub source_url: String,
    pub date: String,
    pub modified: String,
    /// Attached post id (0 = unattached)
    pub post: u64,
    pub file_size: u64,
    pub mime_type: String,
    pub alt_text: String,
    pub caption: String,
    pub description: String,
}

impl MediaRecord {
    pub fn is_attached(&self) -> bool {
        self.post != 0
    }
}

impl From<RawMedia> for MediaRecord {
    fn from(raw: RawMedia) -> Self {
        Self {
            id: raw.id,
            title: raw.title.rendered,
            source_url: raw.source_url,
            date: raw.date,
            modified: raw.modified,
            post: raw.post.unwrap_or(0),
            file_size: raw.media_details.filesize,
            mime_type: raw.mime_type,
            alt_text: raw.alt_text,
            caption: raw.caption.rendered,
            description: raw.description.rendered,
        }
    }
}

/// All media of a site, keyed by id
pub type MediaLibrary = BTreeMap<u64, MediaRecord>;

/// URLs and media ids referenced by published content
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    pub urls: HashSet<String>,
    pub media_ids: HashSet<u64>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a referenced URL; empty URLs never count as a reference
    pub fn insert_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        if !url.is_empty() {
            self.urls.insert(url);
        }
    }

    /// Record a media id referenced by content, together with its URL
    pub fn insert_media(&mut self, record: &MediaRecord) {
        self.media_ids.insert(record.id);
        self.insert_url(record.source_url.clone());
    }

    pub fn merge(&mut self, other: ReferenceSet) {
        self.urls.extend(other.urls);
        self.media_ids.extend(other.media_ids);
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
