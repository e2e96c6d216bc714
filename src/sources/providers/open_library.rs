//! Open Library source adapter.
//!
//! Queries the Open Library Books API (`jscmd=data`) by ISBN. Open Library
//! requires a descriptive User-Agent and keys its response object by the
//! requested bib key (`"ISBN:<identifier>"`).

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::OpenLibraryConfig;
use crate::error::{Error, Result};
use crate::sources::adapter::{
    dedup_by_provider_id, normalize_isbn, split_contributors, ContributorRole,
    ExternalBookResult, SourceAdapter, SourceDescriptor, USER_AGENT,
};

const OPEN_LIBRARY_BASE_URL: &str = "https://openlibrary.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Open Library API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
struct BookRecord {
    key: Option<String>,
    url: Option<String>,
    title: Option<String>,
    #[serde(default)]
    authors: Vec<NamedEntry>,
    #[serde(default)]
    publishers: Vec<NamedEntry>,
    number_of_pages: Option<u32>,
    #[serde(default)]
    identifiers: Identifiers,
    cover: Option<Cover>,
    #[serde(default)]
    excerpts: Vec<Excerpt>,
}

#[derive(Debug, Deserialize)]
struct NamedEntry {
    name: String,
}

#[derive(Debug, Deserialize, Default)]
struct Identifiers {
    #[serde(default)]
    isbn_13: Vec<String>,
    #[serde(default)]
    isbn_10: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Cover {
    large: Option<String>,
    medium: Option<String>,
    small: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Excerpt {
    text: Option<String>,
}

// ---------------------------------------------------------------------------
// Adapter implementation
// ---------------------------------------------------------------------------

/// Open Library source adapter.
pub struct OpenLibraryAdapter {
    client: reqwest::Client,
    config: OpenLibraryConfig,
    descriptor: SourceDescriptor,
    base_url: String,
}

impl OpenLibraryAdapter {
    /// Create a new Open Library adapter.
    pub fn new(config: OpenLibraryConfig) -> Self {
        Self::with_base_url(config, OPEN_LIBRARY_BASE_URL)
    }

    /// Create an adapter talking to a non-default endpoint. Used by tests to
    /// point the adapter at a local mock server.
    pub fn with_base_url(config: OpenLibraryConfig, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build reqwest client");

        let mut description = HashMap::new();
        description.insert(
            "en".to_string(),
            "Internet Archive's open book catalog".to_string(),
        );

        Self {
            client,
            config,
            descriptor: SourceDescriptor {
                key: "open_library".to_string(),
                name: "Open Library".to_string(),
                home_url: "https://openlibrary.org".to_string(),
                search_url: format!("{base_url}/api/books"),
                locale: "en".to_string(),
                description,
            },
            base_url: base_url.to_string(),
        }
    }

    fn map_record(&self, identifier: &str, record: BookRecord) -> ExternalBookResult {
        let provider_id = record
            .key
            .clone()
            .or_else(|| record.url.clone())
            .unwrap_or_else(|| format!("ISBN:{identifier}"));

        let contributors = record
            .authors
            .iter()
            .flat_map(|author| split_contributors(&author.name, ContributorRole::Author))
            .collect();

        let isbn = record
            .identifiers
            .isbn_13
            .first()
            .or_else(|| record.identifiers.isbn_10.first())
            .and_then(|raw| normalize_isbn(raw))
            .or_else(|| normalize_isbn(identifier));

        let cover_url = record
            .cover
            .and_then(|c| c.large.or(c.medium).or(c.small));

        let page_url = record
            .url
            .unwrap_or_else(|| format!("{}/isbn/{identifier}", self.base_url));

        let synopsis = record
            .excerpts
            .into_iter()
            .find_map(|e| e.text)
            .filter(|text| !text.is_empty());

        ExternalBookResult {
            provider_id,
            isbn,
            title: record.title.unwrap_or_default(),
            contributors,
            publisher: record.publishers.first().map(|p| p.name.clone()),
            synopsis,
            page_count: record.number_of_pages.unwrap_or(0),
            cover_url,
            page_url,
            source_key: self.descriptor.key.clone(),
        }
    }
}

#[async_trait]
impl SourceAdapter for OpenLibraryAdapter {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn search_by_identifier(&self, identifier: &str) -> Result<Vec<ExternalBookResult>> {
        let url = format!(
            "{}/api/books?bibkeys=ISBN:{identifier}&format=json&jscmd=data",
            self.base_url
        );
        debug!(url = %url, "Open Library book lookup");

        let key = &self.descriptor.key;
        // The response is an object keyed by bib key; an ISBN with no match
        // yields an empty object, which is not a failure.
        let body: HashMap<String, BookRecord> = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Open Library request failed: {url}"))
            .map_err(|e| Error::source_unavailable(key, e))?
            .error_for_status()
            .context("Open Library request returned error status")
            .map_err(|e| Error::source_unavailable(key, e))?
            .json()
            .await
            .context("failed to parse Open Library response")
            .map_err(|e| Error::source_unavailable(key, e))?;

        let results = body
            .into_values()
            .map(|record| self.map_record(identifier, record))
            .collect();

        Ok(dedup_by_provider_id(results))
    }
}
