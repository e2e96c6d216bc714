//! Deterministic on-disk layout for cover artifact sets.
//!
//! Each owning book id maps to `{root}/{book_id}/` holding the canonical
//! primary file plus one file per thumbnail size. Every path is computable
//! from the id alone, so existence checks and cleanup need no index.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::Result;

/// Fixed thumbnail variant set derived for every cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThumbnailSize {
    /// 150px target width.
    Small,
    /// 300px target width.
    Medium,
}

impl ThumbnailSize {
    /// Target width in pixels for this variant.
    pub fn target_width(self) -> u32 {
        match self {
            Self::Small => 150,
            Self::Medium => 300,
        }
    }

    /// Filename suffix for this variant.
    fn suffix(self) -> &'static str {
        match self {
            Self::Small => "_small",
            Self::Medium => "_medium",
        }
    }

    /// All thumbnail variants.
    pub fn all() -> &'static [ThumbnailSize] {
        &[ThumbnailSize::Small, ThumbnailSize::Medium]
    }
}

/// Filesystem layout manager for cover artifact sets.
pub struct CoverStorage {
    root: PathBuf,
}

impl CoverStorage {
    /// Create a storage rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Directory holding one book's artifact set.
    pub fn entity_dir(&self, book_id: &str) -> PathBuf {
        self.root.join(book_id)
    }

    /// Path of the canonical primary file.
    pub fn primary_path(&self, book_id: &str) -> PathBuf {
        self.entity_dir(book_id).join("cover.jpg")
    }

    /// Path of one thumbnail variant.
    pub fn thumbnail_path(&self, book_id: &str, size: ThumbnailSize) -> PathBuf {
        self.entity_dir(book_id)
            .join(format!("cover{}.jpg", size.suffix()))
    }

    /// Every path in the artifact set, primary first.
    pub fn all_paths(&self, book_id: &str) -> Vec<PathBuf> {
        let mut paths = vec![self.primary_path(book_id)];
        for size in ThumbnailSize::all() {
            paths.push(self.thumbnail_path(book_id, *size));
        }
        paths
    }

    /// `true` when the primary file and every thumbnail exist. A partial set
    /// is not considered valid and is repaired by the reconciliation sweep.
    pub fn is_complete(&self, book_id: &str) -> bool {
        self.all_paths(book_id).iter().all(|p| p.exists())
    }

    /// `true` when any artifact file exists for the id.
    pub fn has_any(&self, book_id: &str) -> bool {
        self.all_paths(book_id).iter().any(|p| p.exists())
    }

    /// Write a complete artifact set, creating the directory lazily.
    /// Existing files are overwritten (regeneration is always full).
    pub fn write_set(
        &self,
        book_id: &str,
        primary: &[u8],
        thumbnails: &[(ThumbnailSize, Vec<u8>)],
    ) -> Result<()> {
        let dir = self.entity_dir(book_id);
        std::fs::create_dir_all(&dir)?;

        std::fs::write(self.primary_path(book_id), primary)?;
        for (size, bytes) in thumbnails {
            std::fs::write(self.thumbnail_path(book_id, *size), bytes)?;
        }
        Ok(())
    }

    /// Best-effort removal of the whole artifact set.
    ///
    /// Missing files count as already deleted; per-file I/O failures are
    /// logged and skipped rather than propagated. Returns how many files
    /// were actually removed.
    pub fn remove_set(&self, book_id: &str) -> usize {
        let mut removed = 0;
        for path in self.all_paths(book_id) {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(
                        book_id = book_id,
                        path = %path.display(),
                        error = %e,
                        "failed to remove cover artifact"
                    );
                }
            }
        }

        // Drop the now-empty directory; a leftover dir is harmless if this
        // fails (e.g. a foreign file was placed inside).
        let _ = std::fs::remove_dir(self.entity_dir(book_id));

        removed
    }

    /// Book ids that currently have an artifact directory, for the
    /// reconciliation sweep. A missing root means no artifacts at all.
    pub fn entity_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
