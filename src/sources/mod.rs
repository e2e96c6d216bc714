//! External source system: adapters, registry, and the settle-all aggregator.
//!
//! External book providers are polymorphic over a single capability
//! (searching by identifier) expressed by the [`SourceAdapter`] trait.
//! Adapters are registered once at startup into a [`SourceRegistry`], and the
//! [`Aggregator`] fans requests out across them with per-source failure
//! containment.
//!
//! # Module layout
//!
//! - [`adapter`] -- Trait definition, descriptors, and the canonical result shape.
//! - [`providers`] -- Concrete adapters (Google Books, Open Library, Mercado Editorial).
//! - [`registry`] -- Immutable-after-init source catalog.
//! - [`aggregator`] -- Concurrent fan-out with settle-all semantics.

pub mod adapter;
pub mod aggregator;
pub mod providers;
pub mod registry;

pub use adapter::{
    Contributor, ContributorRole, ExternalBookResult, SourceAdapter, SourceDescriptor,
};
pub use aggregator::{AggregationOutcome, Aggregator, SourceStatus};
pub use registry::{registry_from_config, SourceRegistry};
