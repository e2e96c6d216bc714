//! Crate-wide error types.
//!
//! The taxonomy distinguishes failures that are contained locally (a single
//! source failing during aggregation, a single event handler erroring) from
//! failures that make a requested operation unsatisfiable (unknown source
//! key, missing owning entity, undecodable image).

/// Error type for bookbinder operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An external source could not be queried: transport error, HTTP error
    /// status (including rate limiting), or a payload that failed to parse.
    ///
    /// The aggregator contains this per source; it is surfaced through the
    /// per-source status map, never as a batch failure.
    #[error("source '{key}' unavailable: {cause}")]
    SourceUnavailable {
        /// Key of the failing source.
        key: String,
        /// Underlying cause chain.
        #[source]
        cause: anyhow::Error,
    },

    /// A source key was registered twice. Configuration error, fatal at
    /// registry assembly time.
    #[error("duplicate source key: {0}")]
    DuplicateSourceKey(String),

    /// A requested source key is not in the registry. Fatal at request
    /// validation time, before any fan-out starts.
    #[error("unknown source key: {0}")]
    UnknownSourceKey(String),

    /// The entity that would own a derived artifact does not exist.
    #[error("referenced entity not found: {0}")]
    ReferencedEntityNotFound(String),

    /// Uploaded bytes are not in any recognized image format.
    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    /// Uploaded bytes are in a recognized format but cannot be decoded.
    #[error("corrupt image data: {0}")]
    CorruptImageData(String),

    /// The event bus could not durably enqueue an event.
    #[error("event bus is closed")]
    BusClosed,

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a `SourceUnavailable` error for the given source key.
    pub fn source_unavailable<E: Into<anyhow::Error>>(key: &str, cause: E) -> Self {
        Self::SourceUnavailable {
            key: key.to_string(),
            cause: cause.into(),
        }
    }

    /// Create an `UnknownSourceKey` error.
    pub fn unknown_source<S: Into<String>>(key: S) -> Self {
        Self::UnknownSourceKey(key.into())
    }

    /// Create a `ReferencedEntityNotFound` error.
    pub fn entity_not_found<S: Into<String>>(id: S) -> Self {
        Self::ReferencedEntityNotFound(id.into())
    }
}

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
