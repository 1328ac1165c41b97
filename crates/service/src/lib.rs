//! # Service Crate
//!
//! The application layer: answers media requests through the cache,
//! folds in user profiles, and keeps the cache warm in the background.
//!
//! ## Main Components
//!
//! - **`MediaFetcher`**: The upstream abstraction; everything external
//!   comes through this trait
//! - **`SampleCatalog`**: Built-in fetcher for demos and tests, with
//!   simulated latency and call counting
//! - **`MediaService`**: The request path (discover, ratings,
//!   personalized recommendations, feedback)
//! - **`CacheWarmer`**: Best-effort background pre-fetching through the
//!   same cached path live requests use
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cache::{CacheConfig, CacheManager};
//! use media::{MediaRequest, MediaType};
//! use personalization::PersonalizationStore;
//! use service::{MediaService, SampleCatalog};
//! use std::sync::Arc;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let cache = Arc::new(CacheManager::open(CacheConfig::from_env())?);
//! let profiles = Arc::new(PersonalizationStore::open("profiles")?);
//! let service = MediaService::new(cache, profiles, Arc::new(SampleCatalog::new()));
//!
//! let request = MediaRequest::discover(MediaType::Movie, "sci-fi");
//! let recommendation = service.recommend("user42", &request, 5).await?;
//! # let _ = recommendation;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod fetch;
pub mod service;
pub mod warmer;

pub use catalog::SampleCatalog;
pub use fetch::MediaFetcher;
pub use service::{
    MediaService, Recommendation, API_CACHE_NAMESPACE, DEFAULT_RECOMMENDATION_LIMIT,
    RATING_CACHE_NAMESPACE,
};
pub use warmer::{CacheWarmer, WarmSeed, WARM_SEEDS_ENV};
