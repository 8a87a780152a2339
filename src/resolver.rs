//! # Usage Resolver Module
//!
//! Questo modulo decide, per ogni media, se è utilizzato oppure no.
//!
//! ## Regole (in ordine):
//! 1. Media allegato a un post (`post != 0`) → usato
//! 2. `source_url` presente letteralmente nel `ReferenceSet` → usato
//! 3. `source_url` alias di una variante di dimensione referenziata → usato
//! 4. Altrimenti → inutilizzato
//!
//! ## Alias di variante:
//! Due URL rappresentano la stessa immagine se, dopo aver rimosso i suffissi
//! `-<W>x<H>` e `-scaled`, le stringhe risultanti coincidono. Altre convenzioni
//! (es. `-thumbnail`) non sono riconosciute: ampliarle cambierebbe cosa viene
//! cancellato.
//!
//! ## Edge case:
//! - Un media con `source_url` vuoto è inutilizzato a meno che non sia allegato

use crate::media::{MediaLibrary, ReferenceSet};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

static SIZE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-\d+x\d+").expect("valid size suffix pattern"));

const SCALED_SUFFIX: &str = "-scaled";

/// Strip every size-variant marker from an image URL
pub fn normalise_variant(url: &str) -> String {
    let without_size: Cow<'_, str> = SIZE_SUFFIX.replace_all(url, "");
    without_size.replace(SCALED_SUFFIX, "")
}

/// True when both URLs point at size variants of the same upload
pub fn are_same_image(a: &str, b: &str) -> bool {
    normalise_variant(a) == normalise_variant(b)
}

/// Ids of media that are neither attached nor referenced by any content
pub fn resolve_unused(library: &MediaLibrary, references: &ReferenceSet) -> BTreeSet<u64> {
    info!("🔍 Identifying unused images...");

    // Comparing normalised forms through a set is equivalent to the pairwise
    // `are_same_image` check against every referenced URL
    let referenced_bases: HashSet<String> =
        references.urls.iter().map(|url| normalise_variant(url)).collect();

    let unused: BTreeSet<u64> = library
        .values()
        .filter(|record| {
            if record.is_attached() {
                return false;
            }
            if record.source_url.is_empty() {
                return true;
            }
            if references.contains_url(&record.source_url) {
                return false;
            }
            if referenced_bases.contains(&normalise_variant(&record.source_url)) {
                debug!("Media {} used through a size variant", record.id);
                return false;
            }
            true
        })
        .map(|record| record.id)
        .collect();

    info!("🔍 Found {} unused images", unused.len());
    unused
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;

    const A: &str = "https://example.com/wp-content/uploads/2024/01/a.jpg";
    const B: &str = "https://example.com/wp-content/uploads/2024/01/b.jpg";
    const B_VARIANT: &str = "https://example.com/wp-content/uploads/2024/01/b-300x200.jpg";

    fn library() -> MediaLibrary {
        [
            record(1, "https://example.com/wp-content/uploads/attached.jpg", 55),
            record(2, A, 0),
            record(3, B, 0),
            record(4, B_VARIANT, 0),
        ]
        .into_iter()
        .map(|r| (r.id, r))
        .collect()
    }

    #[test]
    fn test_same_image_variants() {
        assert!(are_same_image(B, B_VARIANT));
        assert!(are_same_image(B_VARIANT, B));
        assert!(are_same_image(
            "https://example.com/uploads/photo-scaled.jpg",
            "https://example.com/uploads/photo.jpg"
        ));
        assert!(are_same_image(
            "https://example.com/uploads/photo-1024x768-scaled.jpg",
            "https://example.com/uploads/photo-150x150.jpg"
        ));
        assert!(!are_same_image(A, B));
    }

    #[test]
    fn test_other_size_names_are_not_aliases() {
        assert!(!are_same_image(
            "https://example.com/uploads/photo-thumbnail.jpg",
            "https://example.com/uploads/photo.jpg"
        ));
    }

    #[test]
    fn test_unreferenced_original_and_variant_are_unused() {
        let mut refs = ReferenceSet::new();
        refs.insert_url(A);

        let unused = resolve_unused(&library(), &refs);
        assert_eq!(unused, BTreeSet::from([3, 4]));
    }

    #[test]
    fn test_referenced_original_collapses_variant() {
        let mut refs = ReferenceSet::new();
        refs.insert_url(A);
        refs.insert_url(B);

        assert!(resolve_unused(&library(), &refs).is_empty());
    }

    #[test]
    fn test_referenced_variant_keeps_original() {
        let mut refs = ReferenceSet::new();
        refs.insert_url(A);
        refs.insert_url("https://example.com/wp-content/uploads/2024/01/b-1024x683.jpg");

        assert!(resolve_unused(&library(), &refs).is_empty());
    }

    #[test]
    fn test_attached_media_is_never_unused() {
        let refs = ReferenceSet::new();
        let unused = resolve_unused(&library(), &refs);
        assert!(!unused.contains(&1));
        assert_eq!(unused, BTreeSet::from([2, 3, 4]));
    }

    #[test]
    fn test_empty_source_url_is_unused_unless_attached() {
        let mut lib = MediaLibrary::new();
        lib.insert(8, record(8, "", 0));
        lib.insert(9, record(9, "", 3));
        let mut refs = ReferenceSet::new();
        refs.insert_url(A);

        assert_eq!(resolve_unused(&lib, &refs), BTreeSet::from([8]));
    }
}
