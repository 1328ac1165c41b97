//! Error types for the cache crate.
//!
//! Rust error handling concepts demonstrated:
//! - thiserror for defining custom error types
//! - Enum variants for different error cases
//! - Wrapping an anyhow::Error from the caller-supplied fetch function
//! - Automatic `Display` and `Error` trait implementations

use thiserror::Error;

/// Errors that can surface from cache operations.
///
/// Only some of these reach callers: a corrupt on-disk document never does
/// (the namespace degrades to empty with a logged warning), while fetch
/// failures always do, because a failed fetch must never be cached.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The underlying fetch function failed. Propagated to the caller,
    /// never cached, so an immediate retry re-invokes the fetch.
    #[error("Fetch for key '{key}' failed")]
    Fetch {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// The underlying fetch exceeded its timeout. Treated exactly like a
    /// failed fetch: propagated, not cached.
    #[error("Fetch for key '{key}' timed out after {timeout_seconds}s")]
    FetchTimeout { key: String, timeout_seconds: u64 },

    /// Waiting for another caller's in-flight fetch of the same key
    /// exceeded the bound. Propagated so callers never hang indefinitely.
    #[error("Timed out after {waited_seconds}s waiting for in-flight fetch of key '{key}'")]
    LockTimeout { key: String, waited_seconds: u64 },

    /// A value could not be serialized for storage
    #[error("Serialization failure in namespace '{namespace}'")]
    Serialization {
        namespace: String,
        #[source]
        source: serde_json::Error,
    },

    /// I/O error while persisting or reading a namespace document
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// True when the underlying fetch itself failed (error or timeout),
    /// as opposed to a cache-side failure
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            CacheError::Fetch { .. } | CacheError::FetchTimeout { .. }
        )
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CacheError>;
