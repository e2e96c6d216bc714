//! Trait definition and types for external book sources.
//!
//! This module defines the [`SourceAdapter`] trait that all metadata backends
//! (Google Books, Open Library, Mercado Editorial, etc.) must implement,
//! along with the canonical result shape returned by identifier searches.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// User-Agent sent with every outbound provider request. Several providers
/// (Open Library in particular) reject anonymous clients.
pub const USER_AGENT: &str = concat!("bookbinder/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Immutable identity of an external source, registered at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Unique, lowercase key identifying this source (e.g. `"google_books"`).
    pub key: String,
    /// Human-readable display name.
    pub name: String,
    /// Home page of the provider.
    pub home_url: String,
    /// Base query URL used for identifier searches.
    pub search_url: String,
    /// Locale the provider is queried in (BCP-47 tag).
    pub locale: String,
    /// Human-readable description keyed by locale tag.
    pub description: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// Canonical results
// ---------------------------------------------------------------------------

/// Role a contributor played in producing a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributorRole {
    Author,
    Translator,
    Illustrator,
    Editor,
    Other,
}

/// A single `{name, role}` contributor pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    pub role: ContributorRole,
}

impl Contributor {
    /// Convenience constructor for the most common role.
    pub fn author<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            role: ContributorRole::Author,
        }
    }
}

/// A single result returned from an identifier search, mapped from the
/// provider's native schema into the canonical shape.
///
/// Results are produced fresh per query and never persisted by this crate;
/// the caller decides whether to materialize one into a catalog entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalBookResult {
    /// Provider-scoped identifier for this record.
    pub provider_id: String,
    /// Normalized identifier (ISBN digits, possibly trailing `X`), if the
    /// provider reported one.
    pub isbn: Option<String>,
    /// Display title.
    pub title: String,
    /// Contributors with their roles.
    pub contributors: Vec<Contributor>,
    /// Publisher name, if known.
    pub publisher: Option<String>,
    /// Synopsis / description text, if available.
    pub synopsis: Option<String>,
    /// Page count; 0 means unknown.
    pub page_count: u32,
    /// URL of the original-resolution cover image, if available.
    pub cover_url: Option<String>,
    /// URL of the provider's page for this record.
    pub page_url: String,
    /// Key of the source that produced this result.
    pub source_key: String,
}

// ---------------------------------------------------------------------------
// Adapter trait
// ---------------------------------------------------------------------------

/// Async capability implemented by every external source.
///
/// Each adapter wraps a single provider API and is its own failure domain:
/// a transport error, rate-limit response, or malformed payload surfaces as
/// [`Error::SourceUnavailable`](crate::error::Error::SourceUnavailable) for
/// that adapter only. A well-formed response containing no matches is an
/// empty `Ok` list, not an error.
///
/// Adapters are wrapped in an `Arc` and shared across tasks.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Identity of this source.
    fn descriptor(&self) -> &SourceDescriptor;

    /// Returns `true` when the adapter is configured and should be queried.
    /// Disabled adapters are reported as skipped by the aggregator.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Search the provider for records matching `identifier` (an ISBN).
    ///
    /// The returned list contains no two entries with the same provider id.
    async fn search_by_identifier(&self, identifier: &str) -> Result<Vec<ExternalBookResult>>;
}

impl std::fmt::Debug for dyn SourceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceAdapter")
            .field("key", &self.descriptor().key)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Shared mapping helpers
// ---------------------------------------------------------------------------

/// Split a provider contributor string on the configured delimiters (comma
/// and ampersand) and trim each name. Empty fragments are dropped.
pub(crate) fn split_contributors(raw: &str, role: ContributorRole) -> Vec<Contributor> {
    raw.split([',', '&'])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Contributor {
            name: name.to_string(),
            role,
        })
        .collect()
}

/// Normalize an ISBN-ish string to digits (plus a trailing check `X`).
/// Returns `None` when nothing identifier-like remains.
pub(crate) fn normalize_isbn(raw: &str) -> Option<String> {
    let normalized: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    match normalized.len() {
        10 | 13 => Some(normalized),
        _ => None,
    }
}

/// Drop entries whose provider id was already seen, preserving order.
/// A single provider must not return the same book twice.
pub(crate) fn dedup_by_provider_id(results: Vec<ExternalBookResult>) -> Vec<ExternalBookResult> {
    let mut seen = std::collections::HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.provider_id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(provider_id: &str) -> ExternalBookResult {
        ExternalBookResult {
            provider_id: provider_id.to_string(),
            isbn: None,
            title: "Title".to_string(),
            contributors: Vec::new(),
            publisher: None,
            synopsis: None,
            page_count: 0,
            cover_url: None,
            page_url: String::new(),
            source_key: "test".to_string(),
        }
    }

    #[test]
    fn split_on_comma_and_ampersand() {
        let contributors = split_contributors("Neil Gaiman, Terry Pratchett", ContributorRole::Author);
        assert_eq!(
            contributors,
            vec![
                Contributor::author("Neil Gaiman"),
                Contributor::author("Terry Pratchett"),
            ]
        );

        let contributors = split_contributors("A. Author & B. Author", ContributorRole::Author);
        assert_eq!(contributors.len(), 2);
        assert_eq!(contributors[0].name, "A. Author");
        assert_eq!(contributors[1].name, "B. Author");
    }

    #[test]
    fn split_drops_empty_fragments() {
        let contributors = split_contributors("Solo Author, ", ContributorRole::Translator);
        assert_eq!(contributors.len(), 1);
        assert_eq!(contributors[0].name, "Solo Author");
        assert_eq!(contributors[0].role, ContributorRole::Translator);
    }

    #[test]
    fn isbn_normalization() {
        assert_eq!(
            normalize_isbn("978-85-457-0287-0"),
            Some("9788545702870".to_string())
        );
        assert_eq!(normalize_isbn("0-8044-2957-x"), Some("080442957X".to_string()));
        assert_eq!(normalize_isbn("not an isbn"), None);
        assert_eq!(normalize_isbn("12345"), None);
        assert_eq!(normalize_isbn(""), None);
    }

    #[test]
    fn provider_id_dedup_keeps_first() {
        let deduped = dedup_by_provider_id(vec![result("a"), result("b"), result("a")]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].provider_id, "a");
        assert_eq!(deduped[1].provider_id, "b");
    }
}
