//! Bookbinder - metadata aggregation and cover artifact core for a book
//! catalog.
//!
//! Two subsystems share one hard problem, coordinating independently
//! failing asynchronous work into a consistent, idempotent outcome:
//!
//! - [`sources`]: fan an ISBN search out across external metadata providers,
//!   settle every branch (success, failure, or timeout), and merge partial
//!   results into one deduplicated list with a per-source status map.
//! - [`events`] + [`covers`]: an at-least-once domain-event bus driving the
//!   lifecycle of derived cover artifacts (thumbnail derivation on upload,
//!   idempotent cleanup on deletion, reconciliation sweep for crash
//!   recovery).
//!
//! Primary-entity storage, HTTP transport, and authorization live outside
//! this crate; they are reached only through narrow traits such as
//! [`covers::BookLookup`].

pub mod config;
pub mod covers;
pub mod error;
pub mod events;
pub mod sources;

pub use error::{Error, Result};
