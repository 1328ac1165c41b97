//! The upstream catalog abstraction.
//!
//! Everything the service knows about the outside world comes through
//! [`MediaFetcher`]. Production wires in real API clients; tests and
//! the bundled demo use [`SampleCatalog`](crate::catalog::SampleCatalog).
//! The cache layer sits in front of whichever implementation is active,
//! so implementations can be slow or rate limited without hurting the
//! request path.

use async_trait::async_trait;
use media::{MediaItem, MediaRef, MediaRequest};

/// A source of catalog data.
///
/// Rust concept: `#[async_trait]` lets us put async methods in a trait
/// object (`Arc<dyn MediaFetcher>`), so the service can swap sources at
/// runtime.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Look up items matching a request.
    ///
    /// Errors propagate to the caller and are never cached; a failed
    /// lookup is retried on the next request.
    async fn fetch(&self, request: &MediaRequest) -> anyhow::Result<Vec<MediaItem>>;

    /// Look up a rating for one item. `Ok(None)` means the source has
    /// no rating, which is a cacheable answer.
    async fn fetch_rating(&self, item: &MediaRef) -> anyhow::Result<Option<f32>>;
}
