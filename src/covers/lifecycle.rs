//! Cover artifact lifecycle: synchronous create/replace, idempotent
//! event-driven cleanup, and the reconciliation sweep.
//!
//! Creation is called directly by the upload path (the caller needs the
//! outcome before acknowledging the upload); deletion additionally runs as a
//! consumer of book deletion events, where it is fire-and-forget. Creation
//! and deletion for the same book id are serialized through a per-id lock;
//! distinct ids are fully independent.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::{DomainEvent, EntityKind, EventHandler};

use super::pipeline;
use super::storage::{CoverStorage, ThumbnailSize};

/// Entity-existence check consumed from the primary-entity layer.
#[async_trait]
pub trait BookLookup: Send + Sync {
    /// Whether a book with this id exists.
    async fn exists(&self, book_id: &str) -> anyhow::Result<bool>;
}

/// Paths of a freshly written artifact set.
#[derive(Debug, Clone, Serialize)]
pub struct StoredCover {
    pub book_id: String,
    pub primary_path: PathBuf,
    pub thumbnail_paths: Vec<PathBuf>,
}

/// Result of one reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Artifact sets removed because their owning book no longer exists.
    pub orphans_removed: usize,
    /// Partial sets removed so the next upload rebuilds them whole.
    pub incomplete_removed: usize,
}

/// Manages the lifecycle of derived cover artifacts for books.
pub struct CoverLifecycleManager {
    storage: CoverStorage,
    books: Arc<dyn BookLookup>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl CoverLifecycleManager {
    /// Create a manager over `storage`, validating ownership through `books`.
    pub fn new(storage: CoverStorage, books: Arc<dyn BookLookup>) -> Self {
        Self {
            storage,
            books,
            locks: DashMap::new(),
        }
    }

    /// Per-id lock serializing create against delete for the same book.
    fn lock_for(&self, book_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(book_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Create or fully regenerate the artifact set for `book_id` from raw
    /// uploaded bytes.
    ///
    /// Fails with [`Error::ReferencedEntityNotFound`] when the book does not
    /// exist and with [`Error::UnsupportedImageFormat`] /
    /// [`Error::CorruptImageData`] when the upload cannot be decoded; in
    /// every failure case nothing is written. Thumbnails are derived from
    /// the canonical primary, not from the raw upload, so all variants share
    /// one source of truth.
    pub async fn create_or_replace(&self, book_id: &str, raw: &[u8]) -> Result<StoredCover> {
        let exists = self
            .books
            .exists(book_id)
            .await
            .map_err(|e| Error::Io(std::io::Error::other(format!("book lookup failed: {e}"))))?;
        if !exists {
            return Err(Error::entity_not_found(book_id));
        }

        // Derive everything before touching the filesystem so a decode
        // failure leaves no partial set behind.
        let canonical = pipeline::to_canonical(raw)?;
        let mut thumbnails = Vec::with_capacity(ThumbnailSize::all().len());
        for size in ThumbnailSize::all() {
            thumbnails.push((*size, pipeline::resize(&canonical, size.target_width())?));
        }

        let lock = self.lock_for(book_id);
        let _guard = lock.lock().await;
        self.storage.write_set(book_id, &canonical, &thumbnails)?;

        info!(
            book_id = book_id,
            bytes = raw.len(),
            variants = thumbnails.len(),
            "cover artifact set written"
        );

        Ok(StoredCover {
            book_id: book_id.to_string(),
            primary_path: self.storage.primary_path(book_id),
            thumbnail_paths: ThumbnailSize::all()
                .iter()
                .map(|size| self.storage.thumbnail_path(book_id, *size))
                .collect(),
        })
    }

    /// Remove the artifact set for `book_id`.
    ///
    /// Idempotent and best-effort: an absent set is a success, and per-file
    /// I/O failures are logged without propagating; cleanup must never fail
    /// the entity deletion that already committed. Returns the number of
    /// files removed.
    pub async fn delete(&self, book_id: &str) -> usize {
        let lock = self.lock_for(book_id);
        let _guard = lock.lock().await;
        let removed = self.storage.remove_set(book_id);

        if removed > 0 {
            info!(book_id = book_id, removed, "cover artifact set deleted");
        } else {
            debug!(book_id = book_id, "no cover artifacts to delete");
        }
        removed
    }

    /// Path of the primary cover, when the artifact set is complete.
    pub fn primary_path(&self, book_id: &str) -> Option<PathBuf> {
        self.storage
            .is_complete(book_id)
            .then(|| self.storage.primary_path(book_id))
    }

    /// Reconcile on-disk artifacts against the set of live book ids.
    ///
    /// Removes sets orphaned by missed deletion events or a crash, and
    /// removes incomplete sets left by a mid-pipeline crash (the next upload
    /// rebuilds them). Safe to run repeatedly and concurrently with normal
    /// operation: each touched id goes through its per-id lock.
    pub async fn sweep(&self, live_ids: &HashSet<String>) -> Result<SweepReport> {
        let mut report = SweepReport::default();

        for book_id in self.storage.entity_ids()? {
            if !live_ids.contains(&book_id) {
                self.delete(&book_id).await;
                report.orphans_removed += 1;
            } else if !self.storage.is_complete(&book_id) {
                warn!(book_id = %book_id, "incomplete cover artifact set, removing");
                self.delete(&book_id).await;
                report.incomplete_removed += 1;
            }
        }

        info!(
            orphans = report.orphans_removed,
            incomplete = report.incomplete_removed,
            "cover artifact sweep finished"
        );
        Ok(report)
    }

    /// Build the event handler that cleans up covers when books are deleted.
    /// Subscribe it with
    /// [`EventSelector::deletions_of(EntityKind::Book)`](crate::events::EventSelector::deletions_of).
    pub fn cleanup_handler(self: &Arc<Self>) -> Arc<CoverCleanupHandler> {
        Arc::new(CoverCleanupHandler {
            manager: Arc::clone(self),
        })
    }
}

/// Event consumer removing cover artifacts for deleted books.
///
/// Idempotent under at-least-once delivery: redelivered deletions find
/// nothing left to remove and succeed.
pub struct CoverCleanupHandler {
    manager: Arc<CoverLifecycleManager>,
}

#[async_trait]
impl EventHandler for CoverCleanupHandler {
    fn name(&self) -> &'static str {
        "cover-cleanup"
    }

    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()> {
        match event {
            DomainEvent::EntityDeleted {
                entity: EntityKind::Book,
                id,
                ..
            } => {
                self.manager.delete(id).await;
                Ok(())
            }
            // Subscribed via selector; anything else reaching us is ignored.
            _ => Ok(()),
        }
    }
}
