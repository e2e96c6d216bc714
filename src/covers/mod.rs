//! Derived cover artifacts: derivation pipeline, on-disk layout, and
//! lifecycle management.
//!
//! A book's cover artifact set (canonical primary plus a fixed set of
//! thumbnails) is derived from uploaded bytes, stored under a deterministic
//! per-book path, and torn down when the owning book is deleted, either
//! through a direct call or as a reaction to a deletion event on the bus.

pub mod lifecycle;
pub mod pipeline;
pub mod storage;

pub use lifecycle::{
    BookLookup, CoverCleanupHandler, CoverLifecycleManager, StoredCover, SweepReport,
};
pub use storage::{CoverStorage, ThumbnailSize};
