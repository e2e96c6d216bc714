//! Google Books source adapter.
//!
//! Queries the Google Books v1 volumes API by ISBN.
//!
//! Features:
//! - Token-bucket rate limiting at 2 requests / second via [`governor`].
//! - 10-second request timeout.
//! - Cover URLs are cleaned of the `edge=curl` page-fold effect so the
//!   original-resolution asset is referenced.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use tracing::debug;

use crate::config::GoogleBooksConfig;
use crate::error::{Error, Result};
use crate::sources::adapter::{
    dedup_by_provider_id, normalize_isbn, split_contributors, ContributorRole,
    ExternalBookResult, SourceAdapter, SourceDescriptor, USER_AGENT,
};

const GOOGLE_BOOKS_BASE_URL: &str = "https://www.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Google Books API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    id: String,
    volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    publisher: Option<String>,
    description: Option<String>,
    page_count: Option<u32>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
    image_links: Option<ImageLinks>,
    canonical_volume_link: Option<String>,
    info_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    thumbnail: Option<String>,
    small_thumbnail: Option<String>,
}

// ---------------------------------------------------------------------------
// Adapter implementation
// ---------------------------------------------------------------------------

/// Google Books source adapter.
pub struct GoogleBooksAdapter {
    client: reqwest::Client,
    config: GoogleBooksConfig,
    descriptor: SourceDescriptor,
    base_url: String,
    rate_limiter: RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl GoogleBooksAdapter {
    /// Create a new Google Books adapter.
    pub fn new(config: GoogleBooksConfig, locale: &str) -> Self {
        Self::with_base_url(config, locale, GOOGLE_BOOKS_BASE_URL)
    }

    /// Create an adapter talking to a non-default endpoint. Used by tests to
    /// point the adapter at a local mock server.
    pub fn with_base_url(config: GoogleBooksConfig, locale: &str, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build reqwest client");

        let quota = Quota::per_second(NonZeroU32::new(2).unwrap());

        let mut description = HashMap::new();
        description.insert(
            "en".to_string(),
            "Google's index of volumes, queried by ISBN".to_string(),
        );
        description.insert(
            "pt-BR".to_string(),
            "Índice de volumes do Google, consultado por ISBN".to_string(),
        );

        Self {
            client,
            descriptor: SourceDescriptor {
                key: "google_books".to_string(),
                name: "Google Books".to_string(),
                home_url: "https://books.google.com".to_string(),
                search_url: format!("{base_url}/books/v1/volumes"),
                locale: locale.to_string(),
                description,
            },
            config,
            base_url: base_url.to_string(),
            rate_limiter: RateLimiter::direct(quota),
        }
    }

    fn query_url(&self, identifier: &str) -> String {
        let mut url = format!("{}/books/v1/volumes?q=isbn:{identifier}", self.base_url);
        if let Some(ref key) = self.config.api_key {
            if !key.is_empty() {
                url.push_str("&key=");
                url.push_str(key);
            }
        }
        if let Some(ref country) = self.config.country {
            if !country.is_empty() {
                url.push_str("&country=");
                url.push_str(country);
            }
        }
        url
    }

    fn map_volume(&self, volume: Volume) -> ExternalBookResult {
        let info = volume.volume_info;

        let contributors = info
            .authors
            .iter()
            .flat_map(|raw| split_contributors(raw, ContributorRole::Author))
            .collect();

        let isbn = pick_isbn(&info.industry_identifiers);

        let cover_url = info
            .image_links
            .as_ref()
            .and_then(|links| links.thumbnail.as_ref().or(links.small_thumbnail.as_ref()))
            .map(|url| strip_curl_edge(url));

        let page_url = info
            .canonical_volume_link
            .or(info.info_link)
            .unwrap_or_else(|| format!("https://books.google.com/books?id={}", volume.id));

        ExternalBookResult {
            provider_id: volume.id,
            isbn,
            title: info.title.unwrap_or_default(),
            contributors,
            publisher: info.publisher,
            synopsis: info.description,
            page_count: info.page_count.unwrap_or(0),
            cover_url,
            page_url,
            source_key: self.descriptor.key.clone(),
        }
    }
}

#[async_trait]
impl SourceAdapter for GoogleBooksAdapter {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn search_by_identifier(&self, identifier: &str) -> Result<Vec<ExternalBookResult>> {
        self.rate_limiter.until_ready().await;

        let url = self.query_url(identifier);
        debug!(url = %url, "Google Books volume search");

        let key = &self.descriptor.key;
        let body: VolumesResponse = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Google Books request failed: {url}"))
            .map_err(|e| Error::source_unavailable(key, e))?
            .error_for_status()
            .context("Google Books request returned error status")
            .map_err(|e| Error::source_unavailable(key, e))?
            .json()
            .await
            .context("failed to parse Google Books volumes response")
            .map_err(|e| Error::source_unavailable(key, e))?;

        let results = body
            .items
            .into_iter()
            .map(|volume| self.map_volume(volume))
            .collect();

        Ok(dedup_by_provider_id(results))
    }
}

/// Select the best identifier from the volume's industry identifiers:
/// ISBN-13 preferred, then ISBN-10.
fn pick_isbn(identifiers: &[IndustryIdentifier]) -> Option<String> {
    identifiers
        .iter()
        .find(|id| id.kind == "ISBN_13")
        .or_else(|| identifiers.iter().find(|id| id.kind == "ISBN_10"))
        .and_then(|id| normalize_isbn(&id.identifier))
}

/// Strip the `edge=curl` transformation parameter Google applies to
/// thumbnails so the URL points at the clean, original asset.
fn strip_curl_edge(url: &str) -> String {
    url.replace("&edge=curl", "").replace("edge=curl&", "")
}
