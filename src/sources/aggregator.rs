//! Settle-all aggregation across external sources.
//!
//! The [`Aggregator`] fans an identifier search out to a selected subset of
//! registered adapters, waits for every branch to settle (success, failure,
//! or timeout), and merges fulfilled branches into one deduplicated result
//! list plus a per-source status map. One failing or slow source never
//! aborts the batch; callers inspect the status map to distinguish "no
//! results" from "sources unavailable".

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::adapter::{ExternalBookResult, SourceAdapter};
use super::registry::SourceRegistry;

/// Settlement outcome for a single source within one aggregation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    /// The source answered; its results (possibly zero) are in the list.
    Success,
    /// The source errored or timed out; it contributed nothing.
    Failure,
    /// The source is registered but disabled; it was not queried.
    Skipped,
}

/// Combined outcome of one aggregation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationOutcome {
    /// Deduplicated results in source-registration order, then
    /// provider-native order within each source.
    pub results: Vec<ExternalBookResult>,
    /// Exactly one entry per requested source key.
    pub statuses: BTreeMap<String, SourceStatus>,
}

impl AggregationOutcome {
    /// `true` when every queried source failed (skipped sources ignored).
    pub fn all_failed(&self) -> bool {
        let queried: Vec<_> = self
            .statuses
            .values()
            .filter(|s| **s != SourceStatus::Skipped)
            .collect();
        !queried.is_empty() && queried.iter().all(|s| **s == SourceStatus::Failure)
    }
}

/// Fans identifier searches out across a shared [`SourceRegistry`].
pub struct Aggregator {
    registry: Arc<SourceRegistry>,
    per_source_timeout: Duration,
}

impl Aggregator {
    /// Create an aggregator over `registry` with the given per-branch timeout.
    pub fn new(registry: Arc<SourceRegistry>, per_source_timeout: Duration) -> Self {
        Self {
            registry,
            per_source_timeout,
        }
    }

    /// Search `identifier` across the sources named by `source_keys`.
    ///
    /// An empty `source_keys` selects every registered source. Duplicate
    /// requested keys are collapsed so the status map carries exactly one
    /// entry per key. An unknown key fails with
    /// [`Error::UnknownSourceKey`] before any source is contacted.
    ///
    /// All selected, enabled adapters are invoked concurrently; each branch
    /// is independently bounded by the per-source timeout and settles on its
    /// own. Cancelling the returned future drops every in-flight branch.
    pub async fn aggregate(
        &self,
        identifier: &str,
        source_keys: &[String],
    ) -> Result<AggregationOutcome> {
        let selected = self.select(source_keys)?;

        let mut statuses = BTreeMap::new();
        let mut branches = Vec::new();

        for adapter in &selected {
            let key = adapter.descriptor().key.clone();
            if !adapter.is_enabled() {
                debug!(key = %key, "source disabled, skipping");
                statuses.insert(key, SourceStatus::Skipped);
                continue;
            }
            branches.push(self.query_source(Arc::clone(adapter), key, identifier));
        }

        // Settle-all: join every branch and record its outcome; a branch
        // failure is data, not an early exit.
        let settled = join_all(branches).await;

        let mut results = Vec::new();
        for (key, outcome) in settled {
            match outcome {
                Ok(list) => {
                    statuses.insert(key, SourceStatus::Success);
                    results.extend(list);
                }
                Err(error) => {
                    warn!(key = %key, error = %error, "source failed during aggregation");
                    statuses.insert(key, SourceStatus::Failure);
                }
            }
        }

        Ok(AggregationOutcome {
            results: merge(results),
            statuses,
        })
    }

    /// Resolve the requested keys into adapters, in registration order.
    fn select(&self, source_keys: &[String]) -> Result<Vec<Arc<dyn SourceAdapter>>> {
        if source_keys.is_empty() {
            return Ok(self.registry.adapters().map(Arc::clone).collect());
        }

        // Validate every key up front; unknown keys are a caller error.
        let mut requested = HashSet::new();
        for key in source_keys {
            self.registry.get(key)?;
            requested.insert(key.as_str());
        }

        // Walk registration order so the merged results stay stable.
        Ok(self
            .registry
            .adapters()
            .filter(|a| requested.contains(a.descriptor().key.as_str()))
            .map(Arc::clone)
            .collect())
    }

    /// Run a single branch: one adapter call bounded by the per-source
    /// timeout, with the timeout modeled as a failure outcome.
    async fn query_source(
        &self,
        adapter: Arc<dyn SourceAdapter>,
        key: String,
        identifier: &str,
    ) -> (String, Result<Vec<ExternalBookResult>>) {
        let outcome = match tokio::time::timeout(
            self.per_source_timeout,
            adapter.search_by_identifier(identifier),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::source_unavailable(
                &key,
                anyhow::anyhow!("timed out after {:?}", self.per_source_timeout),
            )),
        };
        (key, outcome)
    }
}

/// Deduplicate merged results: across sources by normalized ISBN when
/// present (the first source to report an ISBN wins), and defensively by
/// `(source_key, provider_id)`. Within one source the ISBN is not a dedup
/// key, since a source may legitimately report several editions for the same
/// query. Results without an ISBN are never matched across sources (no
/// title-similarity matching).
fn merge(results: Vec<ExternalBookResult>) -> Vec<ExternalBookResult> {
    let mut isbn_owner: std::collections::HashMap<String, String> = std::collections::HashMap::new();
    let mut seen_ids = HashSet::new();
    let mut merged = Vec::with_capacity(results.len());

    for result in results {
        if !seen_ids.insert((result.source_key.clone(), result.provider_id.clone())) {
            continue;
        }
        if let Some(ref isbn) = result.isbn {
            match isbn_owner.get(isbn) {
                Some(owner) if *owner != result.source_key => continue,
                _ => {
                    isbn_owner.insert(isbn.clone(), result.source_key.clone());
                }
            }
        }
        merged.push(result);
    }

    merged
}
